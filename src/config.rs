//! Environment-driven configuration.

use std::env;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_LIGHT_DEADLINE: Duration = Duration::from_secs(5);
const DEFAULT_STANDARD_DEADLINE: Duration = Duration::from_secs(8);
const DEFAULT_HEAVY_DEADLINE: Duration = Duration::from_secs(10);

/// Errors raised while loading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("environment variable `{0}` is not set")]
    MissingVar(&'static str),

    /// A variable is set but does not parse.
    #[error("environment variable `{name}` has invalid value {value:?}: {reason}")]
    InvalidVar {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
        /// What was expected.
        reason: &'static str,
    },
}

/// How much time an operation may spend inside its store transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineClass {
    /// Task and project creation, reads.
    Light,
    /// Task updates and deletes, invitation writes and listings.
    Standard,
    /// Invitation acceptance.
    Heavy,
}

/// Deadlines per [`DeadlineClass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationDeadlines {
    /// Deadline for [`DeadlineClass::Light`] operations.
    pub light: Duration,
    /// Deadline for [`DeadlineClass::Standard`] operations.
    pub standard: Duration,
    /// Deadline for [`DeadlineClass::Heavy`] operations.
    pub heavy: Duration,
}

impl OperationDeadlines {
    /// Returns the deadline for `class`.
    #[must_use]
    pub const fn for_class(&self, class: DeadlineClass) -> Duration {
        match class {
            DeadlineClass::Light => self.light,
            DeadlineClass::Standard => self.standard,
            DeadlineClass::Heavy => self.heavy,
        }
    }

    /// Uses the same deadline for every class.
    #[must_use]
    pub const fn uniform(deadline: Duration) -> Self {
        Self {
            light: deadline,
            standard: deadline,
            heavy: deadline,
        }
    }
}

impl Default for OperationDeadlines {
    fn default() -> Self {
        Self {
            light: DEFAULT_LIGHT_DEADLINE,
            standard: DEFAULT_STANDARD_DEADLINE,
            heavy: DEFAULT_HEAVY_DEADLINE,
        }
    }
}

/// Runtime configuration for a board deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    /// `PostgreSQL` connection URL.
    pub database_url: String,
    /// Maximum connections held by the pool.
    pub pool_max_size: u32,
    /// Per-operation transaction deadlines.
    pub deadlines: OperationDeadlines,
}

impl BoardConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the database URL is missing or a
    /// numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the database URL is missing or a
    /// numeric variable does not parse.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("FORGEBOARD_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingVar("FORGEBOARD_DATABASE_URL"))?;

        let pool_max_size = match lookup("FORGEBOARD_POOL_MAX_SIZE") {
            None => DEFAULT_POOL_MAX_SIZE,
            Some(raw) => parse_positive("FORGEBOARD_POOL_MAX_SIZE", &raw)?,
        };

        let deadlines = OperationDeadlines {
            light: deadline_var(&lookup, "FORGEBOARD_DEADLINE_LIGHT_MS", DEFAULT_LIGHT_DEADLINE)?,
            standard: deadline_var(
                &lookup,
                "FORGEBOARD_DEADLINE_STANDARD_MS",
                DEFAULT_STANDARD_DEADLINE,
            )?,
            heavy: deadline_var(&lookup, "FORGEBOARD_DEADLINE_HEAVY_MS", DEFAULT_HEAVY_DEADLINE)?,
        };

        Ok(Self {
            database_url,
            pool_max_size,
            deadlines,
        })
    }
}

fn deadline_var<L>(
    lookup: &L,
    name: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError>
where
    L: Fn(&str) -> Option<String>,
{
    lookup(name).map_or(Ok(default), |raw| {
        parse_positive::<u64>(name, &raw).map(Duration::from_millis)
    })
}

fn parse_positive<N>(name: &'static str, raw: &str) -> Result<N, ConfigError>
where
    N: std::str::FromStr + PartialEq + Default,
{
    let invalid = || ConfigError::InvalidVar {
        name,
        value: raw.to_owned(),
        reason: "expected a positive integer",
    };
    let value: N = raw.trim().parse().map_err(|_| invalid())?;
    if value == N::default() {
        return Err(invalid());
    }
    Ok(value)
}

#[cfg(test)]
#[expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[rstest]
    fn defaults_apply_when_only_the_url_is_set() {
        let config = BoardConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")]))
            .expect("config should load");

        assert_eq!(config.database_url, "postgres://x");
        assert_eq!(config.pool_max_size, DEFAULT_POOL_MAX_SIZE);
        assert_eq!(config.deadlines, OperationDeadlines::default());
    }

    #[rstest]
    fn prefixed_url_wins_over_generic_url() {
        let config = BoardConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://generic"),
            ("FORGEBOARD_DATABASE_URL", "postgres://board"),
        ]))
        .expect("config should load");

        assert_eq!(config.database_url, "postgres://board");
    }

    #[rstest]
    fn deadlines_are_read_in_milliseconds() {
        let config = BoardConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("FORGEBOARD_DEADLINE_LIGHT_MS", "250"),
            ("FORGEBOARD_DEADLINE_HEAVY_MS", "20000"),
        ]))
        .expect("config should load");

        assert_eq!(config.deadlines.light, Duration::from_millis(250));
        assert_eq!(config.deadlines.standard, DEFAULT_STANDARD_DEADLINE);
        assert_eq!(config.deadlines.heavy, Duration::from_secs(20));
    }

    #[rstest]
    fn missing_url_is_reported() {
        let err = BoardConfig::from_lookup(lookup_from(&[])).expect_err("url is required");
        assert_eq!(err, ConfigError::MissingVar("FORGEBOARD_DATABASE_URL"));
    }

    #[rstest]
    #[case("FORGEBOARD_POOL_MAX_SIZE", "zero")]
    #[case("FORGEBOARD_POOL_MAX_SIZE", "0")]
    #[case("FORGEBOARD_DEADLINE_STANDARD_MS", "-5")]
    fn malformed_numbers_are_rejected(#[case] name: &str, #[case] value: &str) {
        let err = BoardConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            (name, value),
        ]))
        .expect_err("value should be rejected");

        assert!(matches!(err, ConfigError::InvalidVar { value: raw, .. } if raw == value));
    }

    #[rstest]
    fn deadline_classes_map_to_their_durations() {
        let deadlines = OperationDeadlines::default();
        assert_eq!(deadlines.for_class(DeadlineClass::Light), Duration::from_secs(5));
        assert_eq!(deadlines.for_class(DeadlineClass::Standard), Duration::from_secs(8));
        assert_eq!(deadlines.for_class(DeadlineClass::Heavy), Duration::from_secs(10));
    }
}
