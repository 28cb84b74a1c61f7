//! Editor configuration from environment variables.
//!
//! | Variable                    | Default           |
//! |-----------------------------|-------------------|
//! | `SHEETKEEPER_DATA_PATH`     | `characters.json` |
//! | `SHEETKEEPER_CATALOG_PATH`  | built-in catalog  |
//! | `SHEETKEEPER_HISTORY_LIMIT` | 100               |

use std::path::PathBuf;

use sheetkeeper_domain::DEFAULT_MAX_HISTORY;

pub const DATA_PATH_VAR: &str = "SHEETKEEPER_DATA_PATH";
pub const CATALOG_PATH_VAR: &str = "SHEETKEEPER_CATALOG_PATH";
pub const HISTORY_LIMIT_VAR: &str = "SHEETKEEPER_HISTORY_LIMIT";

const DEFAULT_DATA_PATH: &str = "characters.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    pub data_path: PathBuf,
    pub catalog_path: Option<PathBuf>,
    pub history_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            catalog_path: None,
            history_limit: DEFAULT_MAX_HISTORY,
        }
    }
}

impl EditorConfig {
    /// Load `.env.local` then `.env` from the working directory into the
    /// process environment. Variables already set are kept.
    ///
    /// Call before installing the tracing subscriber. Read the config only
    /// once the subscriber is in place.
    pub fn load_dotenv() {
        for filename in [".env.local", ".env"] {
            let path = std::path::Path::new(filename);
            if path.exists() {
                let _ = dotenvy::from_path(path);
            }
        }
    }

    /// Read the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let data_path = read(DATA_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));
        let catalog_path = read(CATALOG_PATH_VAR).map(PathBuf::from);
        let history_limit = match read(HISTORY_LIMIT_VAR) {
            None => DEFAULT_MAX_HISTORY,
            Some(raw) => match raw.parse::<usize>() {
                Ok(limit) if limit > 0 => limit,
                _ => {
                    tracing::warn!(
                        value = %raw,
                        default = DEFAULT_MAX_HISTORY,
                        "Invalid {}, using default",
                        HISTORY_LIMIT_VAR
                    );
                    DEFAULT_MAX_HISTORY
                }
            },
        };

        Self {
            data_path,
            catalog_path,
            history_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    fn config_from(pairs: &[(&str, &str)]) -> EditorConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EditorConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(config_from(&[]), EditorConfig::default());
    }

    #[test]
    fn reads_all_variables() {
        let config = config_from(&[
            (DATA_PATH_VAR, "/tmp/party.json"),
            (CATALOG_PATH_VAR, "races.json"),
            (HISTORY_LIMIT_VAR, "25"),
        ]);
        assert_eq!(config.data_path, PathBuf::from("/tmp/party.json"));
        assert_eq!(config.catalog_path, Some(PathBuf::from("races.json")));
        assert_eq!(config.history_limit, 25);
    }

    #[test]
    fn invalid_history_limit_falls_back() {
        assert_eq!(config_from(&[(HISTORY_LIMIT_VAR, "lots")]).history_limit, DEFAULT_MAX_HISTORY);
        assert_eq!(config_from(&[(HISTORY_LIMIT_VAR, "0")]).history_limit, DEFAULT_MAX_HISTORY);
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("log buffer").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn invalid_history_limit_is_logged_once_a_subscriber_is_installed() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let config = tracing::subscriber::with_default(subscriber, || {
            config_from(&[(HISTORY_LIMIT_VAR, "-3")])
        });

        assert_eq!(config.history_limit, DEFAULT_MAX_HISTORY);
        let output = String::from_utf8(log.0.lock().expect("log buffer").clone()).expect("utf8");
        assert!(output.contains("WARN"));
        assert!(output.contains(HISTORY_LIMIT_VAR));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config_from(&[(DATA_PATH_VAR, "  "), (CATALOG_PATH_VAR, "")]);
        assert_eq!(config.data_path, PathBuf::from(DEFAULT_DATA_PATH));
        assert!(config.catalog_path.is_none());
    }
}
