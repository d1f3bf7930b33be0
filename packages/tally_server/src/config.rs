use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

// =============================================================================
// File config (figment-deserialized from defaults / tally.toml / env vars)
// =============================================================================
//
//   tally.toml:      [server]
//                    port = 9000
//
//   env var:         TALLY_SERVER__PORT=9000   (double underscore = nesting)

/// Top-level tunable configuration, deserialized by figment.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerFileConfig,
}

/// Server tuning knobs (lives under `[server]` in tally.toml).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerFileConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Status updates buffered per participant before the oldest is overwritten.
    #[serde(default = "default_send_channel_capacity")]
    pub send_channel_capacity: usize,
}

impl Default for ServerFileConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            send_channel_capacity: default_send_channel_capacity(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_send_channel_capacity() -> usize {
    64
}

/// Build a figment that layers: defaults → tally.toml → TALLY_* env vars.
///
/// Env vars use double-underscore for nesting into sections:
///   `TALLY_SERVER__HOST=127.0.0.1`  →  `server.host = "127.0.0.1"`
pub fn load_config(config_path: &Path) -> figment::Figment {
    use figment::{
        Figment,
        providers::{Env, Format, Serialized, Toml},
    };

    Figment::from(Serialized::defaults(FileConfig::default()))
        .merge(Toml::file(config_path))
        .merge(Env::prefixed("TALLY_").split("__"))
}

/// Command-line values that take priority over file and env config.
#[derive(Clone, Debug, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
}

// =============================================================================
// Runtime config (derived from FileConfig, used throughout the server)
// =============================================================================

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Per-participant outbound buffer size
    pub send_channel_capacity: usize,
}

impl ServerConfig {
    pub fn from_file(fc: &ServerFileConfig, overrides: &CliOverrides) -> Result<Self> {
        let host = overrides.host.as_deref().unwrap_or(&fc.host);
        let port = overrides.port.unwrap_or(fc.port);
        let bind_addr = format!("{}:{}", host, port)
            .parse::<SocketAddr>()
            .with_context(|| format!("Invalid bind address {}:{}", host, port))?;

        if fc.send_channel_capacity == 0 {
            bail!("server.send_channel_capacity must be at least 1");
        }

        Ok(Self {
            bind_addr,
            send_channel_capacity: fc.send_channel_capacity,
        })
    }

    /// Load defaults, the optional config file and env vars, then apply CLI overrides.
    pub fn load(config_path: &Path, overrides: &CliOverrides) -> Result<Self> {
        let fc: FileConfig = load_config(config_path)
            .extract()
            .context("Failed to load configuration")?;
        Self::from_file(&fc.server, overrides)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], default_port()).into(),
            send_channel_capacity: default_send_channel_capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    // ── defaults ────────────────────────────────────────────────────────

    #[test]
    fn test_server_file_config_defaults() {
        let d = ServerFileConfig::default();
        assert_eq!(d.host, "0.0.0.0");
        assert_eq!(d.port, 8000);
        assert_eq!(d.send_channel_capacity, 64);
    }

    #[test]
    fn test_server_config_default_matches_file_default() {
        let from_file =
            ServerConfig::from_file(&ServerFileConfig::default(), &CliOverrides::default())
                .unwrap();
        let direct = ServerConfig::default();
        assert_eq!(from_file.bind_addr, direct.bind_addr);
        assert_eq!(from_file.send_channel_capacity, direct.send_channel_capacity);
    }

    // ── ServerConfig::from_file ─────────────────────────────────────────

    #[test]
    fn test_cli_overrides_win() {
        let overrides = CliOverrides {
            host: Some("127.0.0.1".to_string()),
            port: Some(0),
        };
        let sc = ServerConfig::from_file(&ServerFileConfig::default(), &overrides).unwrap();
        assert_eq!(sc.bind_addr, "127.0.0.1:0".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_invalid_host_rejected() {
        let fc = ServerFileConfig {
            host: "not a host".to_string(),
            ..Default::default()
        };
        assert!(ServerConfig::from_file(&fc, &CliOverrides::default()).is_err());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let fc = ServerFileConfig {
            send_channel_capacity: 0,
            ..Default::default()
        };
        let err = ServerConfig::from_file(&fc, &CliOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("send_channel_capacity"));
    }

    // ── figment layering ────────────────────────────────────────────────

    #[test]
    fn test_missing_file_uses_defaults() {
        Jail::expect_with(|_jail| {
            let sc = ServerConfig::load(Path::new("tally.toml"), &CliOverrides::default())
                .expect("defaults load");
            assert_eq!(sc.bind_addr, "0.0.0.0:8000".parse::<SocketAddr>().unwrap());
            Ok(())
        });
    }

    #[test]
    fn test_toml_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "tally.toml",
                r#"
                    [server]
                    host = "127.0.0.1"
                    port = 9000
                    send_channel_capacity = 8
                "#,
            )?;
            let sc = ServerConfig::load(Path::new("tally.toml"), &CliOverrides::default())
                .expect("toml load");
            assert_eq!(sc.bind_addr, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
            assert_eq!(sc.send_channel_capacity, 8);

            jail.set_env("TALLY_SERVER__PORT", "9100");
            let sc = ServerConfig::load(Path::new("tally.toml"), &CliOverrides::default())
                .expect("env load");
            assert_eq!(sc.bind_addr, "127.0.0.1:9100".parse::<SocketAddr>().unwrap());

            let overrides = CliOverrides {
                host: None,
                port: Some(9200),
            };
            let sc = ServerConfig::load(Path::new("tally.toml"), &overrides).expect("cli load");
            assert_eq!(sc.bind_addr.port(), 9200);
            Ok(())
        });
    }
}
