use std::{collections::HashSet, error::Error, fmt, fs, io, path::Path, time::Duration};

use serde::Deserialize;

/// The participant set used when none is configured.
pub const DEFAULT_PARTICIPANTS: [&str; 3] = ["soft", "web", "hard"];

/// How long `StartAggregation` waits for a round to fill up by default.
pub const DEFAULT_AGGREGATION_TIMEOUT: Duration = Duration::from_secs(60);

/// How often the barrier checks the staging area by default.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(10);

/// Startup configuration of a coordinator, static for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// The closed, ordered participant set.
    pub participants: Vec<String>,
    /// The barrier's deadline.
    pub aggregation_timeout: Duration,
    /// The barrier's poll interval.
    pub check_interval: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            participants: DEFAULT_PARTICIPANTS.map(String::from).to_vec(),
            aggregation_timeout: DEFAULT_AGGREGATION_TIMEOUT,
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }
}

/// The on-disk shape of the configuration, every field falls back to its default.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    participants: Option<Vec<String>>,
    aggregation_timeout_secs: Option<u64>,
    check_interval_secs: Option<u64>,
}

impl CoordinatorConfig {
    /// Parses a JSON configuration, filling absent fields with their defaults.
    ///
    /// # Returns
    /// The validated configuration or a `ConfigErr`.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigErr> {
        let file: ConfigFile = serde_json::from_str(json)?;
        let defaults = Self::default();

        let config = Self {
            participants: file.participants.unwrap_or(defaults.participants),
            aggregation_timeout: file
                .aggregation_timeout_secs
                .map_or(defaults.aggregation_timeout, Duration::from_secs),
            check_interval: file
                .check_interval_secs
                .map_or(defaults.check_interval, Duration::from_secs),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reads and parses the JSON configuration file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigErr> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks the participant set and the barrier timings.
    ///
    /// # Returns
    /// A `ConfigErr::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigErr> {
        if self.participants.is_empty() {
            return Err(ConfigErr::Invalid("participant set is empty".into()));
        }

        let mut seen = HashSet::with_capacity(self.participants.len());
        for node in &self.participants {
            if node.is_empty() {
                return Err(ConfigErr::Invalid("participant ids can't be empty".into()));
            }

            if !seen.insert(node.as_str()) {
                return Err(ConfigErr::Invalid(format!("participant {node} is duplicated")));
            }
        }

        if self.check_interval.is_zero() {
            return Err(ConfigErr::Invalid("check interval must be positive".into()));
        }

        Ok(())
    }
}

/// Error returned when a configuration can't be read or is invalid.
#[derive(Debug)]
pub enum ConfigErr {
    Io(io::Error),
    Json(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for ConfigErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config: {e}"),
            Self::Json(e) => write!(f, "malformed config: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl Error for ConfigErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}

impl From<io::Error> for ConfigErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<ConfigErr> for io::Error {
    fn from(value: ConfigErr) -> Self {
        match value {
            ConfigErr::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidInput, other),
        }
    }
}
