use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum Deployment {
    Local,
    Dev,
    Stage,
    Prod,
}

impl Deployment {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Self::Dev,
            "stage" | "staging" => Self::Stage,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // API settings
    pub api_host: String,
    pub api_port: u16,

    // Rate limiting (peripheral endpoints)
    pub disable_rate_limiting: bool,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,

    // Login sessions
    pub session_ttl_seconds: u64,
    pub session_max_entries: u64,
    pub session_cookie_name: String,

    // Notification relay
    pub mail_relay_url: Option<String>,
    pub mail_relay_token: Option<String>,
    pub mail_from: String,
    pub mail_from_name: String,

    /// Front end page that model links point to
    pub public_app_url: String,

    // Compute jobs, program followed by its leading arguments
    pub build_model_command: Vec<String>,
    pub classify_command: Vec<String>,
    pub job_temp_dir: Option<PathBuf>,

    // Application metadata
    pub deployment: Deployment,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if required environment variables are not set,
    /// `ConfigError::Invalid` if a command line is empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            // Database
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,

            // API settings
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),

            // Rate limiting
            disable_rate_limiting: env::var("DISABLE_RATE_LIMITING")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            rate_limit_per_second: env::var("RATE_LIMIT_PER_SECOND")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(1),
            rate_limit_burst: env::var("RATE_LIMIT_BURST")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),

            // Login sessions
            session_ttl_seconds: env::var("SESSION_TTL_SECONDS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .unwrap_or(86_400), // 1 day
            session_max_entries: env::var("SESSION_MAX_ENTRIES")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()
                .unwrap_or(10_000),
            session_cookie_name: env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| "datalab_session".to_string()),

            // Notification relay
            mail_relay_url: env::var("MAIL_RELAY_URL").ok().filter(|s| !s.is_empty()),
            mail_relay_token: env::var("MAIL_RELAY_TOKEN").ok().filter(|s| !s.is_empty()),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "no-reply@localhost".to_string()),
            mail_from_name: env::var("MAIL_FROM_NAME").unwrap_or_else(|_| "KI-App".to_string()),

            public_app_url: env::var("PUBLIC_APP_URL")
                .unwrap_or_else(|_| "http://localhost:8080/build".to_string()),

            // Compute jobs
            build_model_command: parse_command(
                "BUILD_MODEL_COMMAND",
                &env::var("BUILD_MODEL_COMMAND")
                    .unwrap_or_else(|_| "python3.9 buildModel.py".to_string()),
            )?,
            classify_command: parse_command(
                "CLASSIFY_COMMAND",
                &env::var("CLASSIFY_COMMAND")
                    .unwrap_or_else(|_| "python3.9 classify.py".to_string()),
            )?,
            job_temp_dir: env::var("JOB_TEMP_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),

            // Application metadata
            deployment: Deployment::from_str(
                &env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            ),
        })
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

/// Split a command line on whitespace. Quoting is not supported.
///
/// # Errors
///
/// Returns `ConfigError::Invalid` when the line holds no program.
pub fn parse_command(key: &'static str, line: &str) -> Result<Vec<String>, ConfigError> {
    let parts: Vec<String> = line.split_whitespace().map(str::to_string).collect();
    if parts.is_empty() {
        return Err(ConfigError::Invalid(key, "empty command".to_string()));
    }
    Ok(parts)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
