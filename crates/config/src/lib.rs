//! # execunit-config — centralized tunables and tracing bootstrap
//!
//! Ambient plumbing the CORE protocol crates need but the protocol itself
//! does not specify: connect timeout, pump join deadline, default
//! response-wait timeout, max frame length, and a `tracing_subscriber`
//! bootstrap for whatever binary embeds this channel. The CORE library
//! crates (`execunit-tlv`, `execunit-transport`, `execunit-listener`,
//! `execunit-command`) only ever emit `tracing` events — they never install
//! a subscriber themselves.

mod error;

pub use error::ConfigError;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for one channel endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChannelConfig {
    /// Name of the local endpoint to connect to (opaque to the CORE).
    pub endpoint: String,
    /// Timeout for the initial `connect`.
    pub connect_timeout_ms: u64,
    /// Bound on how long `close` waits for the pump thread to join before
    /// giving up.
    pub pump_join_timeout_ms: u64,
    /// Default timeout for a general-purpose `wait_for_response` call. The
    /// two named Listener request APIs (`get_metadata`, `get_data_to_send`)
    /// always wait forever regardless of this value.
    pub default_response_timeout_ms: u64,
    /// Upper bound an embedding binary may choose to enforce on an accepted
    /// frame's declared length before allocating a buffer for it.
    pub max_frame_len: u32,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            connect_timeout_ms: 5_000,
            pump_join_timeout_ms: 2_000,
            default_response_timeout_ms: 30_000,
            max_frame_len: 16 * 1024 * 1024,
        }
    }
}

impl ChannelConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn pump_join_timeout(&self) -> Duration {
        Duration::from_millis(self.pump_join_timeout_ms)
    }

    pub fn default_response_timeout(&self) -> Duration {
        Duration::from_millis(self.default_response_timeout_ms)
    }

    /// Load configuration from a TOML file, falling back to defaults for
    /// any field the file omits, with `EXECUNIT_*` environment overrides
    /// (e.g. `EXECUNIT_ENDPOINT`) layered on top.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let settings = config_crate::Config::builder()
            .add_source(config_crate::File::with_name(path).required(false))
            .add_source(config_crate::Environment::with_prefix("EXECUNIT"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

/// Install a `tracing_subscriber` `fmt` layer with an env filter. Intended
/// for binaries/tests that embed this channel, never called by the CORE
/// library crates themselves.
pub fn init_tracing(env_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter.to_string())
        .try_init()
        .ok();
}
