use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use automation::{MessagingSettings, Pacer, ScrapeSettings};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub export_dir: PathBuf,
    pub country_code: String,
    pub scrape_delay_ms: u64,
    pub message_interval_ms: u64,
    pub results_timeout_secs: u64,
    pub detail_timeout_secs: u64,
    pub browser_headless: bool,
    pub search_url: String,
    pub whatsapp_api_url: String,
    pub whatsapp_session_id: String,
    pub whatsapp_api_key: Option<String>,
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            export_dir: env::var("EXPORT_DIR")
                .unwrap_or_else(|_| "./exports".to_string())
                .into(),
            country_code: env::var("COUNTRY_CODE").unwrap_or_else(|_| "55".to_string()),
            scrape_delay_ms: env::var("SCRAPE_DELAY_MS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .context("SCRAPE_DELAY_MS must be a number of milliseconds")?,
            message_interval_ms: env::var("MESSAGE_INTERVAL_MS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .context("MESSAGE_INTERVAL_MS must be a number of milliseconds")?,
            results_timeout_secs: env::var("RESULTS_TIMEOUT_SECS")
                .unwrap_or_else(|_| "150".to_string())
                .parse()
                .context("RESULTS_TIMEOUT_SECS must be a number of seconds")?,
            detail_timeout_secs: env::var("DETAIL_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("DETAIL_TIMEOUT_SECS must be a number of seconds")?,
            browser_headless: env::var("BROWSER_HEADLESS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            search_url: env::var("SEARCH_URL")
                .unwrap_or_else(|_| "https://www.google.com.br/maps".to_string()),
            whatsapp_api_url: env::var("WHATSAPP_API_URL")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
            whatsapp_session_id: env::var("WHATSAPP_SESSION_ID")
                .unwrap_or_else(|_| "default".to_string()),
            whatsapp_api_key: env::var("WHATSAPP_API_KEY").ok(),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or_default(),
        })
    }

    pub fn scrape_settings(&self) -> ScrapeSettings {
        ScrapeSettings {
            results_timeout: Duration::from_secs(self.results_timeout_secs),
            detail_timeout: Duration::from_secs(self.detail_timeout_secs),
            pacing: Pacer::new(Duration::from_millis(self.scrape_delay_ms)),
            country_code: self.country_code.clone(),
            ..Default::default()
        }
    }

    pub fn messaging_settings(&self) -> MessagingSettings {
        MessagingSettings {
            pacing: Pacer::new(Duration::from_millis(self.message_interval_ms)),
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}
