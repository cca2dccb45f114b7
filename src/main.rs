use anyhow::{Result, Context};
use clap::Parser;
use log::{info, error};
use std::path::Path;
use std::process::ExitCode;

use inbox_summarizer::auth::{credentials, CredentialManager, GoogleAuthFlow};
use inbox_summarizer::config::Config;
use inbox_summarizer::gmail_client::GmailClient;
use inbox_summarizer::pipeline::{completion_message, SummaryPipeline};
use inbox_summarizer::store::SummaryStore;
use inbox_summarizer::summarizer::GeminiClient;

#[derive(Parser)]
#[command(name = "inbox-summarizer")]
#[command(about = "Summarizes unread Gmail messages with Gemini and appends them to a JSON file")]
#[command(version)]
struct Args {
    /// Check the configuration without connecting to any service
    #[arg(long)]
    check_config: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load the .env file if there is one
    dotenv::dotenv().ok();

    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::new() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Invalid configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.check_config {
        print_config(&config);
        return ExitCode::SUCCESS;
    }

    info!("🚀 Starting inbox summarizer");

    match outcome(run(&config).await) {
        Ok(message) => {
            println!("{}", message);
            ExitCode::SUCCESS
        }
        Err(report) => {
            error!("❌ {}", report);
            ExitCode::FAILURE
        }
    }
}

/// Line printed on success, or the single error report for a failed run
fn outcome(result: Result<usize>) -> std::result::Result<String, String> {
    result
        .map(completion_message)
        .map_err(|e| format!("Run failed: {:#}", e))
}

async fn run(config: &Config) -> Result<usize> {
    let manager = CredentialManager::new(
        &config.gmail.token_cache_path,
        GoogleAuthFlow::new(&config.gmail.credentials_path, &config.gmail.token_cache_path),
    );
    let session = manager.acquire().await
        .context("Gmail authentication failed")?;

    let gmail = GmailClient::new(&session)
        .context("Unable to connect to Gmail API")?;
    let gemini = GeminiClient::new(&config.gemini);
    let store = SummaryStore::new(&config.store.path);

    SummaryPipeline::new(gmail, gemini, store).run().await
}

fn print_config(config: &Config) {
    let presence = |path: &str| if Path::new(path).exists() { "found" } else { "missing" };

    println!("✅ Configuration is valid!");
    println!("🔑 Client secret: {} ({})", config.gmail.credentials_path, presence(&config.gmail.credentials_path));

    match credentials::load_record(Path::new(&config.gmail.token_cache_path)) {
        Some(record) => println!(
            "💾 Token cache: {} (expires {}, refresh token: {})",
            config.gmail.token_cache_path,
            record.expires_at,
            if record.can_refresh() { "yes" } else { "no" }
        ),
        None => println!("💾 Token cache: {} (none, browser authorization needed)", config.gmail.token_cache_path),
    }

    println!("🤖 Gemini model: {} (API key set)", config.gemini.model);

    let store = SummaryStore::new(&config.store.path);
    match store.load() {
        Ok(document) => println!("📁 Summary store: {} ({} entries)", config.store.path, document.summaries.len()),
        Err(e) => println!("📁 Summary store: {} (unreadable: {:#})", config.store.path, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_success_message() {
        assert_eq!(outcome(Ok(3)), Ok("Processed 3 emails".to_string()));
    }

    #[test]
    fn test_outcome_reports_whole_error_chain_once() {
        let err = anyhow::anyhow!("token refresh failed: invalid_grant").context("Gmail authentication failed");

        let report = outcome(Err(err)).unwrap_err();

        assert_eq!(report, "Run failed: Gmail authentication failed: token refresh failed: invalid_grant");
        assert_eq!(report.matches("invalid_grant").count(), 1);
    }
}
