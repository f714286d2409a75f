use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::Context;

const DEFAULT_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_AI_DELAY_MS: u64 = 300;
const DEFAULT_STATIC_DIR: &str = "static";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Pause before the computer answers a move.
    pub ai_delay: Duration,
    pub static_dir: PathBuf,
    /// Fixed seed for the computer's moves; entropy when unset.
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            ai_delay: Duration::from_millis(DEFAULT_AI_DELAY_MS),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            seed: None,
        }
    }
}

impl ServerConfig {
    /// Reads `POWER4_ADDR`, `POWER4_AI_DELAY_MS`, `POWER4_STATIC_DIR` and
    /// `POWER4_SEED`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let addr = lookup("POWER4_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr
            .parse::<SocketAddr>()
            .with_context(|| format!("POWER4_ADDR is not a socket address: {addr}"))?;

        let ai_delay = match lookup("POWER4_AI_DELAY_MS") {
            Some(ms) => Duration::from_millis(
                ms.parse::<u64>()
                    .with_context(|| format!("POWER4_AI_DELAY_MS is not a number: {ms}"))?,
            ),
            None => Duration::from_millis(DEFAULT_AI_DELAY_MS),
        };

        let static_dir = lookup("POWER4_STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));

        let seed = lookup("POWER4_SEED")
            .map(|s| {
                s.parse::<u64>()
                    .with_context(|| format!("POWER4_SEED is not a u64: {s}"))
            })
            .transpose()?;

        Ok(Self {
            addr,
            ai_delay,
            static_dir,
            seed,
        })
    }
}
