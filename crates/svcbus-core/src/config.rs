use serde::Deserialize;

/// Configuration every binding (client, server, gateway) is handed at
/// startup.
///
/// This struct is consumed, not defined, by the core: the TOML/env parser
/// that produces it is an external collaborator (out of scope), but the
/// shape and its defaults are part of the surface every binding links
/// against.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Path to the log file, or `None` for stderr-only logging.
    pub log_file: Option<String>,
    /// Minimum severity to emit (`"error"`, `"warn"`, `"info"`, `"debug"`,
    /// `"internal"`).
    pub log_level: String,
    /// Maximum length, in bytes, of a single log record before truncation.
    pub log_length: usize,
    /// Identifier this process presents to the broker on connect.
    pub client_id: String,
    /// Broker host.
    pub bus_host: String,
    /// Broker port.
    pub bus_port: u16,
    /// Broker login user.
    pub bus_user: String,
    /// Broker login password.
    pub bus_pass: String,
    /// Locale applied to outbound messages when the caller does not set one.
    pub default_locale: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            log_level: "info".to_string(),
            log_length: 1536,
            client_id: "svcbus-client".to_string(),
            bus_host: "127.0.0.1".to_string(),
            bus_port: 6379,
            bus_user: String::new(),
            bus_pass: String::new(),
            default_locale: "en-US".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_opensrf_conventions() {
        let cfg = BootstrapConfig::default();
        assert_eq!(cfg.default_locale, "en-US");
        assert_eq!(cfg.log_length, 1536);
        assert!(cfg.log_file.is_none());
    }

    #[test]
    fn deserializes_partial_toml_over_defaults() {
        let cfg: BootstrapConfig = toml_like_from_str(r#"bus_host = "bus.example.com""#);
        assert_eq!(cfg.bus_host, "bus.example.com");
        assert_eq!(cfg.default_locale, "en-US");
    }

    // Minimal stand-in so this test doesn't pull in a TOML dependency just
    // for one assertion; real bindings deserialize from their own config
    // crate of choice (toml, config, serde_json, ...).
    fn toml_like_from_str(body: &str) -> BootstrapConfig {
        let mut cfg = BootstrapConfig::default();
        for line in body.lines() {
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"');
                if key == "bus_host" {
                    cfg.bus_host = value.to_string();
                }
            }
        }
        cfg
    }
}
