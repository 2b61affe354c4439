//! Optimizer configuration.

/// Environment variable that turns on the liveness dump.
pub const DUMP_LIVENESS_ENV: &str = "USCC_DUMP_LIVENESS";

/// Options threaded explicitly through analyses and transforms.
///
/// Only affects diagnostics; analysis results never depend on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OptConfig {
    /// Print per-block IN/OUT sets to stdout after every liveness run.
    pub dump_liveness: bool,
}

impl OptConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_dump_liveness(mut self, enabled: bool) -> Self {
        self.dump_liveness = enabled;
        self
    }

    /// Read options from the environment.
    ///
    /// `USCC_DUMP_LIVENESS` enables the dump when set to anything other
    /// than an empty string or `0`.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(DUMP_LIVENESS_ENV).ok().as_deref())
    }

    fn from_env_value(dump_liveness: Option<&str>) -> Self {
        let enabled = dump_liveness.is_some_and(|v| !v.is_empty() && v != "0");
        Self::new().with_dump_liveness(enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::OptConfig;

    #[test]
    fn default_is_quiet() {
        assert!(!OptConfig::default().dump_liveness);
        assert_eq!(OptConfig::new(), OptConfig::default());
    }

    #[test]
    fn env_value_parsing() {
        assert!(!OptConfig::from_env_value(None).dump_liveness);
        assert!(!OptConfig::from_env_value(Some("")).dump_liveness);
        assert!(!OptConfig::from_env_value(Some("0")).dump_liveness);
        assert!(OptConfig::from_env_value(Some("1")).dump_liveness);
        assert!(OptConfig::from_env_value(Some("yes")).dump_liveness);
    }
}
