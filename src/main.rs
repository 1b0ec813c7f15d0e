use std::io::{self, Read};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use clerk::app::AppState;
use clerk::config::{timeout_from_secs, ClerkConfig};
use clerk::form::FormState;
use clerk::llm::GenerationClient;
use clerk::model::MessageVariant;
use clerk::render::{clipboard_text, render_response};

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    /// Only the active variant's body
    Body,
}

#[derive(Parser)]
#[command(name = "clerk")]
#[command(about = "Draft one message for every platform from a single intent")]
struct Cli {
    /// Form state JSON file (use "-" for stdin)
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Print the built request input and exit without calling the model
    #[arg(long)]
    dry_run: bool,

    /// Model name (overrides CLERK_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// Endpoint base URL (overrides CLERK_BASE_URL)
    #[arg(short, long)]
    base_url: Option<String>,

    /// Request timeout in seconds (overrides CLERK_TIMEOUT_SECS)
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Variant tab to expand in text output
    #[arg(long, default_value = "0")]
    tab: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: Format,

    /// Copy the active variant's body to the system clipboard
    #[arg(long)]
    copy: bool,
}

fn copy_to_clipboard(variant: &MessageVariant) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
    clipboard
        .set_text(clipboard_text(variant))
        .context("failed to write clipboard")?;
    Ok(())
}

fn read_form(path: &str) -> Result<FormState> {
    let raw = if path == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read form from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read form file {path}"))?
    };
    if raw.trim().is_empty() {
        return Ok(FormState::default());
    }
    serde_json::from_str(&raw).context("failed to parse form JSON")
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = ClerkConfig::from_env()?;
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    if let Some(secs) = cli.timeout {
        config.timeout = timeout_from_secs(secs)?;
    }
    tracing::debug!(?config, "loaded configuration");

    let mut app = AppState::new(read_form(&cli.input)?);
    let input = app.submit()?;

    if cli.dry_run {
        println!("{}", serde_json::to_string_pretty(&input)?);
        return Ok(ExitCode::SUCCESS);
    }

    let client = GenerationClient::from_config(&config)?;
    let outcome = client.generate(&input).await;
    app.complete(outcome);

    if let Some(message) = app.error_message() {
        eprintln!("{message}");
        return Ok(ExitCode::FAILURE);
    }
    if !app.select_tab(cli.tab) {
        tracing::warn!(tab = cli.tab, "no such tab, showing the first one");
    }
    let response = app
        .result()
        .ok_or_else(|| anyhow!("generation finished without a result"))?;

    match cli.format {
        Format::Text => print!("{}", render_response(response, app.active_tab)),
        Format::Json => println!("{}", serde_json::to_string_pretty(response)?),
        Format::Body => {
            if let Some(variant) = app.active_variant() {
                println!("{}", clipboard_text(variant));
            }
        }
    }

    if cli.copy {
        match app.active_variant() {
            Some(variant) => match copy_to_clipboard(variant) {
                Ok(()) => tracing::info!(platform = %variant.platform, "copied body to clipboard"),
                Err(e) => tracing::warn!("copy failed: {e:#}"),
            },
            None => tracing::warn!("nothing to copy"),
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    clerk::logging::init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
