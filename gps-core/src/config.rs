//! Configuration file management for gps-tracker.
//!
//! Reads/writes `~/.gps-tracker/config.yaml` with the device listener
//! address, framing mode, dashboard address, and history capacity.

use std::path::{Path, PathBuf};

use crate::framing::{Framing, DEFAULT_MAX_LINE};
use crate::history::DEFAULT_CAPACITY;
use crate::types::{Result, TrackerError};

/// Full configuration structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub device: DeviceConfig,
    pub dashboard: DashboardConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConfig {
    pub host: String,
    pub port: u16,
    pub framing: Framing,
    /// Idle time after which an unterminated message is delivered.
    pub flush_ms: u64,
    pub max_line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryConfig {
    pub capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            device: DeviceConfig {
                host: "0.0.0.0".into(),
                port: 1234,
                framing: Framing::Lines,
                flush_ms: 100,
                max_line: DEFAULT_MAX_LINE,
            },
            dashboard: DashboardConfig {
                host: "0.0.0.0".into(),
                port: 5000,
            },
            history: HistoryConfig {
                capacity: DEFAULT_CAPACITY,
            },
        }
    }
}

impl DeviceConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DashboardConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Get the config directory path (`~/.gps-tracker/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".gps-tracker")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `~/.gps-tracker/config.yaml`.
///
/// Returns default config if file doesn't exist.
pub fn load_config() -> Config {
    load_config_from(&config_file())
}

/// Load config from a path, falling back to defaults.
pub fn load_config_from(path: &Path) -> Config {
    read_config(path).unwrap_or_default()
}

/// Load config from a path the user named; a missing or unreadable file
/// is an error.
pub fn read_config(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| TrackerError::Config(format!("cannot read {}: {e}", path.display())))?;
    Ok(parse_config(&text))
}

/// Save config to `~/.gps-tracker/config.yaml`.
pub fn save_config(config: &Config) -> Result<PathBuf> {
    let path = config_file();
    save_config_to(config, &path)?;
    Ok(path)
}

/// Save config to an explicit path, creating parent directories.
pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, serialize_config(config))?;
    Ok(())
}

/// Parse simple YAML-like config text. Unknown keys and bad values keep defaults.
pub fn parse_config(text: &str) -> Config {
    let mut config = Config::default();
    let mut current_section: Option<String> = None;

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let is_indented = line.starts_with("  ") || line.starts_with('\t');

        let Some((key, val)) = stripped.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let val = val.trim();

        if !is_indented {
            current_section = val.is_empty().then(|| key.to_string());
            continue;
        }

        let Some(section) = current_section.as_deref() else {
            continue;
        };

        match (section, key) {
            ("device", "host") => {
                if let Some(v) = parse_string_value(val) {
                    config.device.host = v;
                }
            }
            ("device", "port") => {
                if let Some(v) = parse_number(val) {
                    config.device.port = v;
                }
            }
            ("device", "framing") => {
                if let Some(v) = parse_string_value(val).and_then(|s| s.parse().ok()) {
                    config.device.framing = v;
                }
            }
            ("device", "flush_ms") => {
                if let Some(v) = parse_number(val) {
                    config.device.flush_ms = v;
                }
            }
            ("device", "max_line") => {
                if let Some(v) = parse_number(val) {
                    config.device.max_line = v;
                }
            }
            ("dashboard", "host") => {
                if let Some(v) = parse_string_value(val) {
                    config.dashboard.host = v;
                }
            }
            ("dashboard", "port") => {
                if let Some(v) = parse_number(val) {
                    config.dashboard.port = v;
                }
            }
            ("history", "capacity") => {
                if let Some(v) = parse_number::<usize>(val) {
                    config.history.capacity = v.max(1);
                }
            }
            _ => {}
        }
    }

    config
}

fn parse_string_value(val: &str) -> Option<String> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    // Strip quotes
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return Some(val[1..val.len() - 1].to_string());
    }
    Some(val.to_string())
}

fn parse_number<T: std::str::FromStr>(val: &str) -> Option<T> {
    parse_string_value(val)?.parse().ok()
}

/// Serialize config to YAML-like text.
pub fn serialize_config(config: &Config) -> String {
    let lines = [
        "# gps-tracker configuration".to_string(),
        String::new(),
        "device:".into(),
        format!("  host: \"{}\"", config.device.host),
        format!("  port: {}", config.device.port),
        format!("  framing: \"{}\"", config.device.framing),
        format!("  flush_ms: {}", config.device.flush_ms),
        format!("  max_line: {}", config.device.max_line),
        String::new(),
        "dashboard:".into(),
        format!("  host: \"{}\"", config.dashboard.host),
        format!("  port: {}", config.dashboard.port),
        String::new(),
        "history:".into(),
        format!("  capacity: {}", config.history.capacity),
    ];

    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.device.port, 1234);
        assert_eq!(config.dashboard.port, 5000);
        assert_eq!(config.history.capacity, 50);
        assert_eq!(config.device.framing, Framing::Lines);
        assert_eq!(config.device.addr(), "0.0.0.0:1234");
    }

    #[test]
    fn test_parse_config() {
        let text = r#"
device:
  host: "127.0.0.1"
  port: 4321
  framing: per-read
  flush_ms: 250
  max_line: 512

dashboard:
  host: '0.0.0.0'
  port: 8080

history:
  capacity: 10
"#;
        let config = parse_config(text);
        assert_eq!(config.device.host, "127.0.0.1");
        assert_eq!(config.device.port, 4321);
        assert_eq!(config.device.framing, Framing::PerRead);
        assert_eq!(config.device.flush_ms, 250);
        assert_eq!(config.device.max_line, 512);
        assert_eq!(config.dashboard.host, "0.0.0.0");
        assert_eq!(config.dashboard.port, 8080);
        assert_eq!(config.history.capacity, 10);
    }

    #[test]
    fn test_parse_config_null_and_bad_values() {
        let text = r#"
device:
  host: null
  port: not-a-port
  framing: ~

history:
  capacity: 0
"#;
        let config = parse_config(text);
        let defaults = Config::default();
        assert_eq!(config.device.host, defaults.device.host);
        assert_eq!(config.device.port, defaults.device.port);
        assert_eq!(config.device.framing, Framing::Lines);
        assert_eq!(config.history.capacity, 1);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let text = "webhook: \"https://example.com\"\nextra:\n  key: 1\ndevice:\n  port: 9\n";
        let config = parse_config(text);
        assert_eq!(config.device.port, 9);
    }

    #[test]
    fn test_roundtrip() {
        let mut config = Config::default();
        config.device.port = 7000;
        config.device.framing = Framing::PerRead;
        config.dashboard.host = "127.0.0.1".into();
        config.history.capacity = 25;
        let parsed = parse_config(&serialize_config(&config));
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let mut config = Config::default();
        config.dashboard.port = 5050;

        save_config_to(&config, &path).unwrap();
        assert_eq!(load_config_from(&path), config);
    }

    #[test]
    fn test_read_config_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        match read_config(&path) {
            Err(TrackerError::Config(msg)) => assert!(msg.contains("absent.yaml")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_save_into_file_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();
        let result = save_config_to(&Config::default(), &blocker.join("config.yaml"));
        assert!(matches!(result, Err(TrackerError::Io(_))));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.yaml"));
        assert_eq!(config, Config::default());
    }
}
