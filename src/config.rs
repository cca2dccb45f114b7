use anyhow::Result;
use serde::Deserialize;

pub const DEFAULT_CREDENTIALS_PATH: &str = "credentials.json";
pub const DEFAULT_TOKEN_CACHE_PATH: &str = "token.json";
pub const DEFAULT_STORE_PATH: &str = "email_summaries.json";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub gmail: GmailConfig,
    pub gemini: GeminiConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GmailConfig {
    pub credentials_path: String,
    pub token_cache_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub path: String,
}

impl Config {
    pub fn new() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// `new()` uses the process environment; tests pass a closure over a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::check_required_vars(&lookup)?;

        let var_or = |name: &str, default: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Config {
            gmail: GmailConfig {
                credentials_path: var_or("GMAIL_CREDENTIALS_PATH", DEFAULT_CREDENTIALS_PATH),
                token_cache_path: var_or("GMAIL_TOKEN_CACHE_PATH", DEFAULT_TOKEN_CACHE_PATH),
            },
            gemini: GeminiConfig {
                api_key: lookup("GOOGLE_API_KEY").unwrap_or_default(),
                model: var_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            },
            store: StoreConfig {
                path: var_or("SUMMARY_STORE_PATH", DEFAULT_STORE_PATH),
            },
        })
    }

    fn check_required_vars<F>(lookup: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required_vars = ["GOOGLE_API_KEY"];

        let missing_vars: Vec<&str> = required_vars
            .iter()
            .copied()
            .filter(|var| lookup(var).map_or(true, |value| value.trim().is_empty()))
            .collect();

        if !missing_vars.is_empty() {
            anyhow::bail!(
                "Missing environment variables: {}\n\
                 \n\
                 💡 Solutions:\n\
                 1. Create a .env file next to the binary:\n\
                    GOOGLE_API_KEY=your-gemini-api-key\n\
                 \n\
                 2. Or export the variables manually:\n\
                    export GOOGLE_API_KEY=your-gemini-api-key\n\
                    export GMAIL_CREDENTIALS_PATH=/path/to/credentials.json\n\
                    cargo run",
                missing_vars.join(", ")
            );
        }

        Ok(())
    }
}
