use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};

use crate::timefmt::DisplayZone;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";
const ENV_FILE: &str = ".env";

/// Process configuration, read from the environment once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub rounds_path: PathBuf,
    pub dictionary_path: PathBuf,
    pub listen_addr: SocketAddr,
    pub display_zone: DisplayZone,
    pub summary_template: Option<String>,
}

impl AppConfig {
    /// Process environment, with `.env` in the working directory filling in unset keys
    pub fn from_env() -> anyhow::Result<Self> {
        let file_vars = read_env_file(Path::new(ENV_FILE))?;
        Self::from_lookup(with_env_file(|key| std::env::var(key).ok(), file_vars))
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).ok_or_else(|| anyhow!("{key} must be set"));

        let rounds_path = PathBuf::from(required("ROUNDS_PATH")?);
        let dictionary_path = PathBuf::from(required("DICTIONARY_PATH")?);

        let listen_addr = get("LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("LISTEN_ADDR is not a valid socket address")?;

        let display_zone = match get("DISPLAY_UTC_OFFSET") {
            Some(offset) => DisplayZone::parse_offset(&offset)
                .ok_or_else(|| anyhow!("DISPLAY_UTC_OFFSET {offset:?} is not a UTC offset"))?,
            None => DisplayZone::Local,
        };

        Ok(Self {
            rounds_path,
            dictionary_path,
            listen_addr,
            display_zone,
            summary_template: get("ROUND_SUMMARY_TEMPLATE"),
        })
    }
}

/// `KEY=value` pairs from a dotenv file. A missing file reads as empty.
pub fn read_env_file(path: &Path) -> anyhow::Result<HashMap<String, String>> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(err) if err.not_found() => {
            tracing::debug!(path = %path.display(), "no env file");
            return Ok(HashMap::new());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to open {}", path.display()));
        }
    };

    iter.collect::<Result<HashMap<_, _>, _>>()
        .with_context(|| format!("failed to parse {}", path.display()))
}

/// Layer file variables under a lookup. The lookup wins where both define a key.
fn with_env_file(
    process: impl Fn(&str) -> Option<String>,
    file_vars: HashMap<String, String>,
) -> impl Fn(&str) -> Option<String> {
    move |key| process(key).or_else(|| file_vars.get(key).cloned())
}
