//! Process configuration, read from the environment (after `.env`).

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Also persist pending changes, so a restart keeps the unpublished audit trail.
    pub persist_drafts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8083, data_dir: PathBuf::from("./data"), persist_drafts: false }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|e| anyhow::anyhow!("invalid PORT '{raw}': {e}"))?,
            None => defaults.port,
        };
        let persist_drafts = match lookup("MENU_PERSIST_DRAFTS").as_deref() {
            Some("1" | "true" | "TRUE" | "yes") => true,
            Some("0" | "false" | "FALSE" | "no") | None => false,
            Some(other) => anyhow::bail!("invalid MENU_PERSIST_DRAFTS '{other}'"),
        };
        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            data_dir: lookup("MENU_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            persist_drafts,
        })
    }

    pub fn bind_addr(&self) -> String { format!("{}:{}", self.host, self.port) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.bind_addr(), "0.0.0.0:8083");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[("PORT", "9000"), ("MENU_DATA_DIR", "/tmp/menu"), ("MENU_PERSIST_DRAFTS", "true")])).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/menu"));
        assert!(config.persist_drafts);
    }

    #[test]
    fn test_invalid_port() {
        assert!(Config::from_lookup(lookup(&[("PORT", "eighty")])).is_err());
        assert!(Config::from_lookup(lookup(&[("MENU_PERSIST_DRAFTS", "maybe")])).is_err());
    }
}
