//! Typed environment binding.
//!
//! Configuration structs implement [`FromEnv`] and pull their fields out of
//! an [`EnvReader`] with typed getters. The reader records every missing or
//! malformed variable instead of stopping at the first one, so a single
//! startup failure lists everything that needs fixing.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigError;

/// Types that can be built from environment variables.
///
/// # Example
///
/// ```
/// use daedalus_config::{EnvReader, FromEnv};
///
/// struct Database {
///     url: String,
///     pool: u32,
/// }
///
/// impl FromEnv for Database {
///     fn from_env(env: &mut EnvReader) -> Self {
///         Self {
///             url: env.string("DATABASE_URL", None),
///             pool: env.int("DATABASE_POOL", Some(4)),
///         }
///     }
/// }
///
/// let db: Database = EnvReader::from_pairs([("DATABASE_URL", "postgres://db")])
///     .load()
///     .unwrap();
/// assert_eq!(db.url, "postgres://db");
/// assert_eq!(db.pool, 4);
/// ```
pub trait FromEnv: Sized {
    /// Reads every field from `env`. Problems are recorded on the reader.
    fn from_env(env: &mut EnvReader) -> Self;
}

/// A snapshot of environment variables with error collection.
#[derive(Debug, Default)]
pub struct EnvReader {
    vars: HashMap<String, String>,
    errors: Vec<ConfigError>,
}

impl EnvReader {
    /// Snapshots the process environment.
    #[must_use]
    pub fn from_process() -> Self {
        Self::from_pairs(std::env::vars())
    }

    /// Builds a reader over explicit pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            errors: Vec::new(),
        }
    }

    /// Fills in variables from a `.env` file.
    ///
    /// Variables already present win over the file. A missing file is not
    /// an error.
    pub fn with_dotenv_file(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let iter = match dotenvy::from_path_iter(path) {
            Ok(iter) => iter,
            Err(err) if err.not_found() => {
                tracing::debug!(path = %path.display(), "No dotenv file");
                return Ok(self);
            }
            Err(source) => {
                return Err(ConfigError::Dotenv {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        for item in iter {
            let (key, value) = item.map_err(|source| ConfigError::Dotenv {
                path: path.to_path_buf(),
                source,
            })?;
            self.vars.entry(key).or_insert(value);
        }
        Ok(self)
    }

    /// Reads a string. Without a default, a missing variable is an error.
    pub fn string(&mut self, key: &str, default: Option<&str>) -> String {
        match (self.vars.get(key).map(String::as_str), default) {
            (Some(value), _) => value.to_string(),
            (None, Some(default)) => default.to_string(),
            (None, None) => {
                self.errors.push(ConfigError::missing_var(key));
                String::new()
            }
        }
    }

    /// Reads an optional string.
    pub fn optional(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    /// Reads an integer (or anything else that parses from a string).
    pub fn int<T>(&mut self, key: &str, default: Option<T>) -> T
    where
        T: FromStr + Default,
    {
        let Some(raw) = self.vars.get(key).map(String::as_str) else {
            return default.unwrap_or_else(|| {
                self.errors.push(ConfigError::missing_var(key));
                T::default()
            });
        };

        match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                let reason = format!("expected integer, got {raw:?}");
                self.errors.push(ConfigError::env_parse_error(key, reason));
                default.unwrap_or_default()
            }
        }
    }

    /// Reads a boolean. Accepts `true/false`, `1/0`, `yes/no` and `on/off`.
    pub fn bool(&mut self, key: &str, default: Option<bool>) -> bool {
        let Some(raw) = self.vars.get(key).map(String::as_str) else {
            return default.unwrap_or_else(|| {
                self.errors.push(ConfigError::missing_var(key));
                false
            });
        };

        parse_bool(raw).unwrap_or_else(|| {
            let reason = format!("expected boolean, got {raw:?}");
            self.errors.push(ConfigError::env_parse_error(key, reason));
            default.unwrap_or_default()
        })
    }

    /// Records a custom problem found while building a value.
    pub fn report(&mut self, error: ConfigError) {
        self.errors.push(error);
    }

    /// Builds `T` and returns every problem found along the way.
    pub fn load<T: FromEnv>(mut self) -> Result<T, ConfigError> {
        let value = T::from_env(&mut self);
        match ConfigError::collect(self.errors) {
            None => Ok(value),
            Some(err) => Err(err),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Loads `.env` from the working directory, then binds `T` from the
/// process environment.
pub fn load<T: FromEnv>() -> Result<T, ConfigError> {
    EnvReader::from_process().with_dotenv_file(".env")?.load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[derive(Debug)]
    struct Sample {
        name: String,
        port: u16,
        verbose: bool,
    }

    impl FromEnv for Sample {
        fn from_env(env: &mut EnvReader) -> Self {
            Self {
                name: env.string("NAME", None),
                port: env.int("PORT", Some(8080)),
                verbose: env.bool("VERBOSE", Some(false)),
            }
        }
    }

    #[test]
    fn test_defaults_apply() {
        let sample: Sample = EnvReader::from_pairs([("NAME", "svc")]).load().unwrap();
        assert_eq!(sample.name, "svc");
        assert_eq!(sample.port, 8080);
        assert!(!sample.verbose);
    }

    #[test]
    fn test_values_override_defaults() {
        let sample: Sample =
            EnvReader::from_pairs([("NAME", "svc"), ("PORT", "9000"), ("VERBOSE", "on")])
                .load()
                .unwrap();
        assert_eq!(sample.port, 9000);
        assert!(sample.verbose);
    }

    #[test]
    fn test_all_errors_collected() {
        let err = EnvReader::from_pairs([("PORT", "eighty"), ("VERBOSE", "maybe")])
            .load::<Sample>()
            .unwrap_err();

        let ConfigError::Multiple(errors) = err else {
            panic!("expected several errors");
        };
        assert_eq!(errors.len(), 3);
        assert!(matches!(&errors[0], ConfigError::MissingVar { var } if var == "NAME"));
        assert!(matches!(&errors[1], ConfigError::EnvParseError { var, .. } if var == "PORT"));
        assert!(matches!(&errors[2], ConfigError::EnvParseError { var, .. } if var == "VERBOSE"));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("no"), Some(false));
        assert_eq!(parse_bool("nope"), None);
    }

    #[test]
    fn test_dotenv_fills_missing_only() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "NAME=from-file").unwrap();
        writeln!(file, "PORT=7000").unwrap();

        let sample: Sample = EnvReader::from_pairs([("PORT", "9000")])
            .with_dotenv_file(file.path())
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(sample.name, "from-file");
        assert_eq!(sample.port, 9000);
    }

    #[test]
    fn test_missing_dotenv_is_ignored() {
        let reader = EnvReader::from_pairs([("NAME", "x")])
            .with_dotenv_file("/definitely/not/here/.env")
            .unwrap();
        assert_eq!(reader.optional("NAME").as_deref(), Some("x"));
    }
}
