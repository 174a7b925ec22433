use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// handraise classroom server
#[derive(Parser, Serialize, Deserialize, Clone, Debug)]
#[command(
    name = "handraise-server",
    version,
    about = "Anonymous classroom interaction server"
)]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "HANDRAISE_PORT", default_value = "3000")]
    pub port: u16,

    /// Bind address
    #[arg(long, env = "HANDRAISE_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Path to TOML config file
    #[arg(long, default_value = "./handraise.toml")]
    pub config: String,

    /// Enable structured JSON logging (for Docker/production)
    #[arg(long, env = "HANDRAISE_JSON_LOGS")]
    pub json_logs: bool,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    pub generate_config: bool,

    /// Credential required to join as teacher
    #[arg(
        long,
        env = "HANDRAISE_TEACHER_PASSWORD",
        default_value = "teacher123",
        hide_env_values = true
    )]
    pub teacher_password: String,

    /// Data directory for uploaded media
    #[arg(long, env = "HANDRAISE_DATA_DIR", default_value = "./data")]
    pub data_dir: String,

    /// Directory of static client assets served at /
    #[arg(long, env = "HANDRAISE_PUBLIC_DIR", default_value = "./public")]
    pub public_dir: String,

    /// Maximum upload size in megabytes
    #[arg(long, env = "HANDRAISE_MAX_UPLOAD_SIZE_MB", default_value = "25")]
    pub max_upload_size_mb: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            bind_address: "0.0.0.0".to_string(),
            config: "./handraise.toml".to_string(),
            json_logs: false,
            generate_config: false,
            teacher_password: "teacher123".to_string(),
            data_dir: "./data".to_string(),
            public_dir: "./public".to_string(),
            max_upload_size_mb: 25,
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (HANDRAISE_*) < CLI args
    pub fn load() -> Result<Self, figment::Error> {
        let cli = Config::parse();
        let config_path = cli.config.clone();

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("HANDRAISE_"))
            .merge(Serialized::defaults(cli))
            .extract()
    }
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# handraise server configuration
# Place this file at ./handraise.toml or specify with --config <path>
# All settings can be overridden via environment variables (HANDRAISE_PORT,
# etc.) or CLI flags (--port, etc.)

# Server port (default: 3000)
# port = 3000

# Bind address (default: 0.0.0.0 — all interfaces)
# bind_address = "0.0.0.0"

# Enable structured JSON logging for Docker/production
# json_logs = false

# Credential required to join as teacher.
# CHANGE THIS: the built-in default is only suitable for local demos.
# teacher_password = "teacher123"

# Data directory for uploaded media (stored under <data_dir>/uploads)
# data_dir = "./data"

# Directory of static client assets served at /
# public_dir = "./public"

# Maximum upload size in megabytes (default: 25)
# max_upload_size_mb = 25
"#
    .to_string()
}
