use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "edublog", about = "Blogging platform backend")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub media: MediaConfig,
    pub mail: MailConfig,
    pub otp: OtpConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub uri: String,
    pub name: String,
}

/// Cloudinary credentials. Secrets normally arrive through the
/// CLOUDINARY_* environment variables rather than the config file.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct MediaConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

/// Gmail OAuth2 credentials for OTP delivery. Secrets normally arrive
/// through the environment (CLIENT_ID, CLIENT_SECRET, REFRESH_TOKEN, ...).
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct MailConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub refresh_token: String,
    pub sender: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct OtpConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://127.0.0.1:27017".to_string(),
            name: "edublog".to_string(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "https://developers.google.com/oauthplayground".to_string(),
            refresh_token: String::new(),
            sender: String::new(),
        }
    }
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window_secs: 900,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let config_path = cli.config.clone().unwrap_or_else(Self::default_path);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }

        config.apply_env();

        Ok(config)
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .expect("Could not determine home directory")
            .join(".edublog")
            .join("config.toml")
    }

    /// Environment variables override file values. Names follow the
    /// deployment convention for this service.
    fn apply_env(&mut self) {
        env_override(&mut self.database.uri, "MONGODB_URI");
        env_override(&mut self.database.name, "MONGODB_DB");
        env_override(&mut self.media.cloud_name, "CLOUDINARY_CLOUD_NAME");
        env_override(&mut self.media.api_key, "CLOUDINARY_API_KEY");
        env_override(&mut self.media.api_secret, "CLOUDINARY_API_SECRET");
        env_override(&mut self.mail.client_id, "CLIENT_ID");
        env_override(&mut self.mail.client_secret, "CLIENT_SECRET");
        env_override(&mut self.mail.redirect_uri, "REDIRECT_URI");
        env_override(&mut self.mail.refresh_token, "REFRESH_TOKEN");
        env_override(&mut self.mail.sender, "EMAIL_USER");
    }
}

fn env_override(target: &mut String, key: &str) {
    if let Ok(value) = std::env::var(key) {
        if !value.is_empty() {
            *target = value;
        }
    }
}
