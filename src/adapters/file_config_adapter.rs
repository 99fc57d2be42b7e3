//! INI file configuration adapter.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[data]
symbol = BTCUSDT
history_days = 365
cache_dir = data/cache

[train]
train_fraction = 0.8
cv_splits = 5
artifact_dir = model/saved

[web]
listen = 127.0.0.1:8000
mock_when_untrained = true
"#;

    #[test]
    fn reads_strings_ints_and_doubles() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_string("data", "symbol"),
            Some("BTCUSDT".to_string())
        );
        assert_eq!(adapter.get_int("data", "history_days", 0), 365);
        assert_eq!(adapter.get_double("train", "train_fraction", 0.0), 0.8);
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let adapter = FileConfigAdapter::from_string("[data]\n").unwrap();
        assert_eq!(adapter.get_string("data", "symbol"), None);
        assert_eq!(adapter.get_int("data", "history_days", 180), 180);
        assert_eq!(adapter.get_double("train", "train_fraction", 0.8), 0.8);
        assert!(adapter.get_bool("web", "mock_when_untrained", true));
    }

    #[test]
    fn non_numeric_values_fall_back_to_defaults() {
        let adapter =
            FileConfigAdapter::from_string("[data]\nhistory_days = lots\n").unwrap();
        assert_eq!(adapter.get_int("data", "history_days", 90), 90);
    }

    #[test]
    fn bool_accepts_common_spellings() {
        let adapter =
            FileConfigAdapter::from_string("[web]\na = yes\nb = 0\nc = TRUE\n").unwrap();
        assert!(adapter.get_bool("web", "a", false));
        assert!(!adapter.get_bool("web", "b", true));
        assert!(adapter.get_bool("web", "c", false));
    }

    #[test]
    fn from_file_round_trips() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", SAMPLE).unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("web", "listen"),
            Some("127.0.0.1:8000".to_string())
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(FileConfigAdapter::from_file("/nonexistent/coincast.ini").is_err());
    }
}
