//! Extraction service adapter: free-form text to billing party fields.
//!
//! A single request/response against a hosted, OpenAI-compatible chat
//! endpoint with a fixed output schema. The adapter is invoked by the
//! editing form; the export pipeline never calls it. It either returns a
//! [`PartyInfo`]-shaped record (unknown fields as empty strings) or fails
//! with a "not configured" or generic failure condition.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::PartyInfo;

/// Instructs the model to extract structured billing data as strict JSON.
const SYSTEM_PROMPT: &str = r#"You are an expert data extraction assistant.
Given unstructured text (an email signature, a request for an invoice, or a raw address block), extract the billing information for the "Bill To" section of an invoice and return ONLY valid JSON.

The JSON must match this schema exactly:
{
  "companyName": "full name of the person or company",
  "email": "email address for billing",
  "addressLine1": "street address or first part of the address",
  "addressLine2": "city, state, zip, country combined into a single string",
  "vatNumber": "VAT number or tax id if present"
}

Notes:
- If parts of the address are missing, format what is available.
- Use an empty string for fields you cannot determine.
- Return ONLY the JSON object, no markdown fences, no commentary."#;

/// Environment variable holding the service credential by default.
pub const DEFAULT_API_KEY_ENV: &str = "EXTRACT_API_KEY";

/// Endpoint configuration for the extraction service.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Base URL of an OpenAI-compatible API (up to and including `/v1`).
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable the credential is read from.
    pub api_key_env: String,
    /// Sampling temperature; low for factual extraction.
    pub temperature: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            temperature: 0.1,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Parse the model's reply into a party record, tolerating markdown fences
/// around the JSON object.
fn parse_party_json(content: &str) -> Result<PartyInfo> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end_matches("```"))
        .unwrap_or(trimmed)
        .trim();
    serde_json::from_str(body)
        .map_err(|e| Error::ExtractionFailed(format!("unusable response: {}", e)))
}

/// Client for the extraction service.
pub struct ExtractionClient {
    client: Client,
    config: ExtractionConfig,
    api_key: String,
}

impl ExtractionClient {
    /// Build a client, reading the credential from the configured
    /// environment variable. Missing credential or an invalid base URL is
    /// a "not configured" condition, not a transport failure.
    pub fn from_env(config: ExtractionConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            Error::ExtractionNotConfigured(format!("{} is not set", config.api_key_env))
        })?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: ExtractionConfig, api_key: String) -> Result<Self> {
        url::Url::parse(&config.base_url).map_err(|e| {
            Error::ExtractionNotConfigured(format!("bad base url '{}': {}", config.base_url, e))
        })?;
        Ok(Self {
            client: Client::new(),
            config,
            api_key,
        })
    }

    /// Send the raw text and return the extracted party record.
    pub async fn extract_party_info(&self, raw_text: &str) -> Result<PartyInfo> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: raw_text.to_string(),
                },
            ],
            temperature: self.config.temperature,
        };

        log::info!(
            "extracting party info via {} ({})",
            self.config.base_url,
            self.config.model
        );
        let response = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.config.base_url.trim_end_matches('/')
            ))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ExtractionFailed(format!(
                "service returned {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::ExtractionFailed(format!("malformed response: {}", e)))?;
        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| Error::ExtractionFailed("response had no choices".to_string()))?;
        parse_party_json(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let party = parse_party_json(
            r#"{"companyName": "Tech Corp GmbH", "email": "a@b.de", "addressLine1": "Musterstr. 12", "addressLine2": "Berlin, Germany", "vatNumber": ""}"#,
        )
        .expect("parse");
        assert_eq!(party.company_name, "Tech Corp GmbH");
        assert_eq!(party.vat_number.as_deref(), Some(""));
    }

    #[test]
    fn tolerates_markdown_fences() {
        let party = parse_party_json(
            "```json\n{\"companyName\": \"X\", \"email\": \"\", \"addressLine1\": \"\", \"addressLine2\": \"\"}\n```",
        )
        .expect("parse");
        assert_eq!(party.company_name, "X");
        assert!(party.vat_number.is_none());
    }

    #[test]
    fn commentary_is_a_failure() {
        assert!(matches!(
            parse_party_json("Sure! Here is the data you asked for."),
            Err(Error::ExtractionFailed(_))
        ));
    }

    #[test]
    fn missing_credential_is_not_configured() {
        let config = ExtractionConfig {
            api_key_env: "INVOICEPRESS_TEST_UNSET_KEY".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            ExtractionClient::from_env(config),
            Err(Error::ExtractionNotConfigured(_))
        ));
    }

    #[test]
    fn invalid_base_url_is_not_configured() {
        let config = ExtractionConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            ExtractionClient::with_api_key(config, "k".to_string()),
            Err(Error::ExtractionNotConfigured(_))
        ));
    }
}
