//! Simulator configuration.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use vcm_protocol::FIRST_VCM_SEQUENCE;

use crate::error::{EngineError, EngineResult};

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:50000";

/// Top-level configuration for `vcmsim`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// UDP address the simulator listens on
    pub bind_address: SocketAddr,
    /// Per-peer session settings
    pub session: SessionConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 50000)),
            session: SessionConfig::default(),
        }
    }
}

/// Settings applied to every session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// SSID broadcast period
    pub broadcast_interval_ms: u64,
    /// How long a burst waits for an IHU response before moving on
    pub response_timeout_ms: u64,
    /// Sequence number of the first simulator-initiated request
    pub first_sequence: u8,
    /// Datagrams buffered per session before new ones are dropped
    pub inbound_queue_depth: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            broadcast_interval_ms: 5_000,
            response_timeout_ms: 10_000,
            first_sequence: FIRST_VCM_SEQUENCE,
            inbound_queue_depth: 64,
        }
    }
}

impl SessionConfig {
    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_millis(self.broadcast_interval_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    /// Set the broadcast period
    pub fn with_broadcast_interval(mut self, interval: Duration) -> Self {
        self.broadcast_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the response timeout
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for a zero interval, timeout or
    /// queue depth.
    pub fn validate(&self) -> EngineResult<()> {
        if self.broadcast_interval_ms == 0 {
            return Err(EngineError::InvalidConfig(
                "session.broadcast_interval_ms must be non-zero".to_string(),
            ));
        }
        if self.response_timeout_ms == 0 {
            return Err(EngineError::InvalidConfig(
                "session.response_timeout_ms must be non-zero".to_string(),
            ));
        }
        if self.inbound_queue_depth == 0 {
            return Err(EngineError::InvalidConfig(
                "session.inbound_queue_depth must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl SimulatorConfig {
    /// Load a configuration file. `.json` files are parsed as JSON, anything
    /// else as YAML. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if the file cannot be read,
    /// [`EngineError::ConfigParse`] if it does not parse, and
    /// [`EngineError::InvalidConfig`] if it fails validation.
    pub fn load(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config: Self = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        config.validate()?;

        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] when the session settings are
    /// out of range.
    pub fn validate(&self) -> EngineResult<()> {
        self.session.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_defaults() -> TestResult {
        let config = SimulatorConfig::default();
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS.parse::<SocketAddr>()?);
        assert_eq!(config.session.broadcast_interval(), Duration::from_secs(5));
        assert_eq!(config.session.response_timeout(), Duration::from_secs(10));
        assert_eq!(config.session.first_sequence, 0x50);
        config.validate()?;
        Ok(())
    }

    #[test]
    fn test_load_yaml_partial() -> TestResult {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile()?;
        writeln!(file, "bind_address: \"127.0.0.1:50001\"")?;
        writeln!(file, "session:")?;
        writeln!(file, "  broadcast_interval_ms: 250")?;

        let config = SimulatorConfig::load(file.path())?;
        assert_eq!(config.bind_address, "127.0.0.1:50001".parse::<SocketAddr>()?);
        assert_eq!(config.session.broadcast_interval_ms, 250);
        assert_eq!(config.session.response_timeout_ms, 10_000);
        Ok(())
    }

    #[test]
    fn test_load_json() -> TestResult {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile()?;
        write!(file, r#"{{"session": {{"first_sequence": 16}}}}"#)?;

        let config = SimulatorConfig::load(file.path())?;
        assert_eq!(config.session.first_sequence, 16);
        assert_eq!(config.bind_address, SimulatorConfig::default().bind_address);
        Ok(())
    }

    #[test]
    fn test_load_rejects_zero_timeout() -> TestResult {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile()?;
        writeln!(file, "session:")?;
        writeln!(file, "  response_timeout_ms: 0")?;

        let result = SimulatorConfig::load(file.path());
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
        Ok(())
    }

    #[test]
    fn test_load_reports_parse_errors() -> TestResult {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile()?;
        write!(file, "{{ not json")?;

        let result = SimulatorConfig::load(file.path());
        assert!(matches!(result, Err(EngineError::ConfigParse(_))));
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        let result = SimulatorConfig::load(Path::new("/nonexistent/vcmsim.yaml"));
        assert!(matches!(result, Err(EngineError::Io(_))));
    }

    #[test]
    fn test_builder_durations() {
        let session = SessionConfig::default()
            .with_broadcast_interval(Duration::from_millis(200))
            .with_response_timeout(Duration::from_millis(300));
        assert_eq!(session.broadcast_interval_ms, 200);
        assert_eq!(session.response_timeout_ms, 300);
    }
}
