#![cfg(feature = "extract")]

use std::io::Read;

use invoicepress::extract::{ExtractionClient, ExtractionConfig};
use invoicepress::Error;

fn json_header() -> tiny_http::Header {
    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .expect("static header")
}

#[tokio::test]
async fn extracts_party_from_stub_service() {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("bind stub server");
    let addr = server.server_addr();

    let handle = std::thread::spawn(move || {
        let mut request = server.recv().expect("one request");
        let mut body = String::new();
        request.as_reader().read_to_string(&mut body).ok();
        // The adapter must send a chat-completions payload with the text.
        assert!(body.contains("\"messages\""));
        assert!(body.contains("Musterstra"));

        let content = "{\"companyName\": \"Tech Corp GmbH\", \"email\": \"accounts@techcorp.de\", \
                       \"addressLine1\": \"Musterstra\\u00dfe 12\", \"addressLine2\": \"10115 Berlin, Germany\", \
                       \"vatNumber\": \"\"}";
        let reply = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        });
        let response = tiny_http::Response::from_string(reply.to_string()).with_header(json_header());
        request.respond(response).expect("respond");
    });

    let config = ExtractionConfig {
        base_url: format!("http://{}/v1", addr),
        model: "stub-model".to_string(),
        ..Default::default()
    };
    let client = ExtractionClient::with_api_key(config, "stub-key".to_string()).expect("client");
    let party = client
        .extract_party_info(
            "Hi! Please bill Tech Corp GmbH, Musterstra\u{df}e 12, 10115 Berlin. \
             Reach accounting at accounts@techcorp.de.",
        )
        .await
        .expect("extraction");

    assert_eq!(party.company_name, "Tech Corp GmbH");
    assert_eq!(party.email, "accounts@techcorp.de");
    assert_eq!(party.address_line2, "10115 Berlin, Germany");
    assert_eq!(party.vat_number.as_deref(), Some(""));
    handle.join().expect("stub server thread");
}

#[tokio::test]
async fn service_error_is_a_generic_failure() {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("bind stub server");
    let addr = server.server_addr();

    let handle = std::thread::spawn(move || {
        let request = server.recv().expect("one request");
        let response =
            tiny_http::Response::from_string("{\"error\": \"overloaded\"}").with_status_code(500);
        request.respond(response).expect("respond");
    });

    let config = ExtractionConfig {
        base_url: format!("http://{}/v1", addr),
        ..Default::default()
    };
    let client = ExtractionClient::with_api_key(config, "stub-key".to_string()).expect("client");
    let err = client
        .extract_party_info("anything")
        .await
        .expect_err("server failure surfaces");
    assert!(matches!(err, Error::ExtractionFailed(_)));
    assert!(err.to_string().contains("500"));
    handle.join().expect("stub server thread");
}
