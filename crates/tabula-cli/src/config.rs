use std::env;
use std::path::PathBuf;

/// Shell configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Fallback log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Command file to run; stdin when absent
    pub script: Option<PathBuf>,
    /// Echo each command before its output
    pub echo: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            script: None,
            echo: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let log_level = env::var("TABULA_LOG").unwrap_or_else(|_| "info".to_string());
        let script = env::var("TABULA_SCRIPT")
            .ok()
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);
        let echo = match env::var("TABULA_ECHO") {
            Ok(value) => parse_flag(&value)?,
            Err(_) => false,
        };

        Ok(Self {
            log_level,
            script,
            echo,
        })
    }
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "" | "0" | "false" | "no" => Ok(false),
        other => anyhow::bail!("Invalid boolean flag: {}", other),
    }
}
