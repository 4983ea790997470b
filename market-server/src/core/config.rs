use crate::auth::JwtConfig;

/// Server configuration
///
/// Every field can be overridden through environment variables:
///
/// | Variable | Default | Purpose |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | database and log files |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | PAYMENT_KEY_ID | (empty) | payment gateway key id |
/// | PAYMENT_KEY_SECRET | (empty) | HMAC secret for signature verification |
/// | EMAIL_API_URL | (unset) | HTTP mail gateway; unset disables email |
/// | EMAIL_API_KEY | (unset) | mail gateway bearer token |
/// | EMAIL_FROM | orders@market.local | sender address |
/// | LLM_API_URL | (unset) | OpenAI-compatible chat endpoint |
/// | LLM_API_KEY | (unset) | chat endpoint token |
/// | LLM_MODEL | gpt-3.5-turbo | chat model name |
/// | SUBSCRIPTION_RUN_TIME | 02:00 | daily scheduler run time (UTC, HH:MM) |
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the embedded database and logs
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Runtime environment: development | staging | production
    pub environment: String,

    // === Payment gateway ===
    pub payment_key_id: String,
    pub payment_key_secret: String,

    // === Email gateway (optional) ===
    pub email_api_url: Option<String>,
    pub email_api_key: Option<String>,
    pub email_from: String,

    // === Chatbot LLM backend (optional) ===
    pub llm_api_url: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_model: String,

    // === Subscription scheduler ===
    /// Daily run time, "HH:MM" in UTC
    pub subscription_run_time: String,
}

impl Config {
    /// Load configuration from environment variables, with defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),

            payment_key_id: std::env::var("PAYMENT_KEY_ID").unwrap_or_default(),
            payment_key_secret: std::env::var("PAYMENT_KEY_SECRET").unwrap_or_default(),

            email_api_url: std::env::var("EMAIL_API_URL").ok(),
            email_api_key: std::env::var("EMAIL_API_KEY").ok(),
            email_from: std::env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "orders@market.local".into()),

            llm_api_url: std::env::var("LLM_API_URL").ok(),
            llm_api_key: std::env::var("LLM_API_KEY").ok(),
            llm_model: std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".into()),

            subscription_run_time: std::env::var("SUBSCRIPTION_RUN_TIME")
                .unwrap_or_else(|_| "02:00".into()),
        }
    }

    /// Override the mutable parts, used by tests
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// Database directory under the working dir
    pub fn database_dir(&self) -> std::path::PathBuf {
        std::path::PathBuf::from(&self.work_dir).join("database")
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
