use secrecy::{ExposeSecret, SecretBox};
use std::env;
use thiserror::Error;
use url::Url;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid API key format for {service}: {reason}")]
    InvalidKeyFormat { service: String, reason: String },
    #[error("Invalid URL in {var}: {reason}")]
    InvalidUrl { var: String, reason: String },
}

/// Configuration for the chat-completion backend
#[derive(Debug)]
pub struct ApiConfig {
    pub openai_key: SecretBox<String>,
    pub base_url: Url,
}

impl ApiConfig {
    /// Load API configuration from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (for development)
        dotenvy::dotenv().ok();

        let openai_key = Self::load_api_key("OPENAI_API_KEY", "OpenAI")?;
        let base_url = Self::load_base_url("OPENAI_BASE_URL")?;

        Ok(Self {
            openai_key,
            base_url,
        })
    }

    /// Load and validate a single API key from environment
    fn load_api_key(env_var: &str, service_name: &str) -> Result<SecretBox<String>, ConfigError> {
        let key = env::var(env_var).map_err(|_| ConfigError::MissingEnvVar(env_var.to_string()))?;

        if key.trim().is_empty() {
            return Err(ConfigError::InvalidKeyFormat {
                service: service_name.to_string(),
                reason: "API key cannot be empty".to_string(),
            });
        }

        Self::validate_key_format(&key, service_name)?;

        Ok(SecretBox::new(Box::new(key)))
    }

    fn load_base_url(env_var: &str) -> Result<Url, ConfigError> {
        let raw = env::var(env_var).unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string());
        Url::parse(raw.trim_end_matches('/')).map_err(|e| ConfigError::InvalidUrl {
            var: env_var.to_string(),
            reason: e.to_string(),
        })
    }

    /// Validate API key format for each service
    fn validate_key_format(key: &str, service: &str) -> Result<(), ConfigError> {
        if service == "OpenAI" && !key.starts_with("sk-") {
            return Err(ConfigError::InvalidKeyFormat {
                service: service.to_string(),
                reason: "OpenAI keys should start with 'sk-'".to_string(),
            });
        }
        Ok(())
    }

    /// Get OpenAI API key (use only when making API calls)
    pub fn openai_key(&self) -> &str {
        self.openai_key.expose_secret()
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }
}

/// Load configuration with helpful error messages for development
pub fn load_config() -> Result<ApiConfig, ConfigError> {
    match ApiConfig::load() {
        Ok(config) => {
            log::info!("Successfully loaded API configuration");
            Ok(config)
        }
        Err(ConfigError::MissingEnvVar(var)) => {
            log::error!("Missing required environment variable: {}", var);
            log::error!("Create a .env file in the project root with:");
            log::error!("{}=your_api_key_here", var);
            Err(ConfigError::MissingEnvVar(var))
        }
        Err(e) => {
            log::error!("Configuration error: {}", e);
            Err(e)
        }
    }
}
