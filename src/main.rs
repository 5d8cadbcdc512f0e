use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use invoicepress::export::{failure_notice, DirectorySink, ExportOptions};
use invoicepress::{EditorSession, ExportPipeline, InvoiceData, SurfaceHost};

#[derive(Parser)]
#[command(
    name = "invoicepress",
    version,
    about = "Edit invoices and export them as fixed-page PDFs"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render an invoice record and export it as a PDF
    Export {
        /// Invoice record as JSON; uses the built-in sample when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Directory the artifact is saved into
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
        /// Refuse to rasterize images hosted on other origins
        #[arg(long)]
        no_remote_images: bool,
    },
    /// Print the default invoice record as JSON
    Sample,
    /// Extract billing fields from free-form text via the configured service
    #[cfg(feature = "extract")]
    Extract {
        /// Raw text; read from stdin when omitted
        text: Option<String>,
        /// Base URL of an OpenAI-compatible API
        #[arg(long)]
        base_url: Option<String>,
        /// Model to query
        #[arg(long)]
        model: Option<String>,
    },
}

fn load_invoice(input: Option<&PathBuf>) -> anyhow::Result<InvoiceData> {
    match input {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
        }
        None => Ok(InvoiceData::sample()),
    }
}

async fn run_export(
    input: Option<PathBuf>,
    out_dir: PathBuf,
    no_remote_images: bool,
) -> anyhow::Result<()> {
    let data = load_invoice(input.as_ref())?;
    let options = ExportOptions {
        allow_remote_images: !no_remote_images,
        ..Default::default()
    };
    let host = Arc::new(SurfaceHost::new());
    let pipeline = Arc::new(ExportPipeline::new(
        Arc::new(DirectorySink::new(out_dir)),
        options,
    ));
    let session = EditorSession::with_data(data, host, pipeline);

    match session.export().await {
        Ok(receipt) => {
            match receipt.path {
                Some(path) => println!("{}", path.display()),
                None => println!("{}", receipt.filename),
            }
            Ok(())
        }
        Err(err) => anyhow::bail!(failure_notice(&err)),
    }
}

#[cfg(feature = "extract")]
async fn run_extract(
    text: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
) -> anyhow::Result<()> {
    use invoicepress::extract::{ExtractionClient, ExtractionConfig};

    let raw = match text {
        Some(text) => text,
        None => std::io::read_to_string(std::io::stdin()).context("reading stdin")?,
    };
    let mut config = ExtractionConfig::default();
    if let Some(base_url) = base_url {
        config.base_url = base_url;
    }
    if let Some(model) = model {
        config.model = model;
    }
    let client = ExtractionClient::from_env(config)?;
    let party = client.extract_party_info(&raw).await?;
    println!("{}", serde_json::to_string_pretty(&party)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Export { input, out_dir, no_remote_images } => {
            run_export(input, out_dir, no_remote_images).await
        }
        Command::Sample => {
            println!("{}", serde_json::to_string_pretty(&InvoiceData::sample())?);
            Ok(())
        }
        #[cfg(feature = "extract")]
        Command::Extract { text, base_url, model } => run_extract(text, base_url, model).await,
    }
}
