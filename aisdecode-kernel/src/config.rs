/**
 * CONFIGURATION - Défauts, fichier YAML optionnel, ligne de commande
 *
 * RÔLE : Produit des `Settings` immuables pour toute la vie du process.
 *
 * FONCTIONNEMENT :
 * - Trois couches, la dernière gagne : défauts < fichier YAML < flags / variables AISDECODE_*
 * - Un fichier nommé explicitement mais absent ou invalide est une erreur fatale
 * - Validation : intervalle > 0, profondeur de file > 0, agrégateurs `host:port`
 */

use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::{EngineOptions, DEFAULT_QUEUE_DEPTH};
use crate::relay::{parse_aggregator_list, RelayError};

pub const DEFAULT_BAUD: u32 = 38400;
pub const DEFAULT_WS_PORT: u16 = 8100;
pub const DEFAULT_UDP_PORT: u16 = 8101;
pub const DEFAULT_DEDUPE_WINDOW_MS: u64 = 1000;
pub const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_EXPIRE_AFTER: &str = "60m";
pub const STATE_FILE_NAME: &str = "state.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid duration for {key} '{value}': {source}")]
    Duration {
        key: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Aggregator(#[from] RelayError),
}

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "aisdecode", version, about = "AIS vessel-state fusion and distribution service")]
pub struct Args {
    /// Optional YAML config file
    #[arg(long, env = "AISDECODE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Serial device to read sentences from
    #[arg(long, env = "AISDECODE_SERIAL_PORT")]
    pub serial_port: Option<PathBuf>,

    #[arg(long, env = "AISDECODE_BAUD")]
    pub baud: Option<u32>,

    /// HTTP + WebSocket port
    #[arg(long, env = "AISDECODE_WS_PORT")]
    pub ws_port: Option<u16>,

    /// Static files directory
    #[arg(long, env = "AISDECODE_WEB_ROOT")]
    pub web_root: Option<PathBuf>,

    #[arg(long, env = "AISDECODE_UDP_LISTEN_PORT")]
    pub udp_listen_port: Option<u16>,

    /// Comma-separated host:port list of downstream aggregators
    #[arg(long, env = "AISDECODE_AGGREGATOR")]
    pub aggregator: Option<String>,

    /// Dedupe window in milliseconds (0 disables)
    #[arg(long, env = "AISDECODE_DEDUPE_WINDOW")]
    pub dedupe_window: Option<u64>,

    /// Publish interval in seconds
    #[arg(long, env = "AISDECODE_UPDATE_INTERVAL")]
    pub update_interval: Option<u64>,

    /// Maximum vessel age, e.g. "60m" or "2h"
    #[arg(long, env = "AISDECODE_EXPIRE_AFTER")]
    pub expire_after: Option<String>,

    /// Disable state persistence
    #[arg(long, env = "AISDECODE_NO_STATE")]
    pub no_state: bool,

    #[arg(long, env = "AISDECODE_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    #[arg(long, env = "AISDECODE_PUSH_QUEUE_DEPTH")]
    pub push_queue_depth: Option<usize>,

    #[arg(long, env = "AISDECODE_DEBUG")]
    pub debug: bool,

    /// Log every decoded message
    #[arg(long, env = "AISDECODE_SHOW_DECODES")]
    pub show_decodes: bool,

    /// Log every published snapshot
    #[arg(long, env = "AISDECODE_DUMP_VESSEL_DATA")]
    pub dump_vessel_data: bool,
}

/// Contenu du fichier YAML ; toutes les clés sont optionnelles.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub serial_port: Option<PathBuf>,
    pub baud: Option<u32>,
    pub ws_port: Option<u16>,
    pub web_root: Option<PathBuf>,
    pub udp_listen_port: Option<u16>,
    pub aggregator: Option<String>,
    pub dedupe_window: Option<u64>,
    pub update_interval: Option<u64>,
    pub expire_after: Option<String>,
    pub no_state: Option<bool>,
    pub state_file: Option<PathBuf>,
    pub push_queue_depth: Option<usize>,
    pub debug: Option<bool>,
    pub show_decodes: Option<bool>,
    pub dump_vessel_data: Option<bool>,
}

impl FileConfig {
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let txt = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(&txt, path)
    }

    fn parse(txt: &str, path: &Path) -> Result<Self, ConfigError> {
        if txt.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(txt).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub serial_port: Option<PathBuf>,
    pub baud: u32,
    pub ws_port: u16,
    pub web_root: PathBuf,
    pub udp_listen_port: u16,
    pub aggregators: Vec<String>,
    pub dedupe_window: Duration,
    pub update_interval: Duration,
    pub expire_after: Duration,
    /// `None` quand la persistance est désactivée
    pub state_file: Option<PathBuf>,
    pub push_queue_depth: usize,
    pub debug: bool,
    pub show_decodes: bool,
    pub dump_vessel_data: bool,
}

impl Settings {
    pub async fn load(args: Args) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path).await?,
            None => FileConfig::default(),
        };
        Self::resolve(args, file)
    }

    pub fn resolve(args: Args, file: FileConfig) -> Result<Self, ConfigError> {
        let web_root = args
            .web_root
            .or(file.web_root)
            .unwrap_or_else(|| PathBuf::from("."));

        let no_state = args.no_state || file.no_state.unwrap_or(false);
        let state_file = if no_state {
            None
        } else {
            Some(
                args.state_file
                    .or(file.state_file)
                    .unwrap_or_else(|| web_root.join(STATE_FILE_NAME)),
            )
        };

        let update_secs = args
            .update_interval
            .or(file.update_interval)
            .unwrap_or(DEFAULT_UPDATE_INTERVAL_SECS);
        if update_secs == 0 {
            return Err(ConfigError::Invalid(
                "update-interval must be greater than 0".into(),
            ));
        }

        let push_queue_depth = args
            .push_queue_depth
            .or(file.push_queue_depth)
            .unwrap_or(DEFAULT_QUEUE_DEPTH);
        if push_queue_depth == 0 {
            return Err(ConfigError::Invalid(
                "push-queue-depth must be greater than 0".into(),
            ));
        }

        let expire_after = args
            .expire_after
            .or(file.expire_after)
            .unwrap_or_else(|| DEFAULT_EXPIRE_AFTER.to_string());
        let expire_after = humantime::parse_duration(&expire_after).map_err(|source| {
            ConfigError::Duration {
                key: "expire-after",
                value: expire_after.clone(),
                source,
            }
        })?;

        let aggregators = match args.aggregator.or(file.aggregator) {
            Some(list) => parse_aggregator_list(&list)?,
            None => Vec::new(),
        };

        Ok(Self {
            serial_port: args.serial_port.or(file.serial_port),
            baud: args.baud.or(file.baud).unwrap_or(DEFAULT_BAUD),
            ws_port: args.ws_port.or(file.ws_port).unwrap_or(DEFAULT_WS_PORT),
            udp_listen_port: args
                .udp_listen_port
                .or(file.udp_listen_port)
                .unwrap_or(DEFAULT_UDP_PORT),
            aggregators,
            dedupe_window: Duration::from_millis(
                args.dedupe_window
                    .or(file.dedupe_window)
                    .unwrap_or(DEFAULT_DEDUPE_WINDOW_MS),
            ),
            update_interval: Duration::from_secs(update_secs),
            expire_after,
            state_file,
            push_queue_depth,
            debug: args.debug || file.debug.unwrap_or(false),
            show_decodes: args.show_decodes || file.show_decodes.unwrap_or(false),
            dump_vessel_data: args.dump_vessel_data || file.dump_vessel_data.unwrap_or(false),
            web_root,
        })
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            dedupe_window: self.dedupe_window,
            expire_after: self.expire_after,
            queue_depth: self.push_queue_depth,
            show_decodes: self.show_decodes,
            dump_vessel_data: self.dump_vessel_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(Args::default(), FileConfig::default()).unwrap();
        assert_eq!(settings.baud, 38400);
        assert_eq!(settings.ws_port, 8100);
        assert_eq!(settings.udp_listen_port, 8101);
        assert_eq!(settings.dedupe_window, Duration::from_millis(1000));
        assert_eq!(settings.update_interval, Duration::from_secs(10));
        assert_eq!(settings.expire_after, Duration::from_secs(3600));
        assert_eq!(settings.state_file, Some(PathBuf::from("./state.json")));
        assert_eq!(settings.push_queue_depth, 64);
        assert!(settings.aggregators.is_empty());
        assert!(settings.serial_port.is_none());
    }

    #[test]
    fn test_flags_override_file() {
        let file = FileConfig::parse(
            "ws-port: 9000\nweb-root: /srv/ais\nexpire-after: 2h\nshow-decodes: true\n",
            Path::new("aisdecode.yaml"),
        )
        .unwrap();
        let args = Args::parse_from(["aisdecode", "--ws-port", "9100", "--dedupe-window", "0"]);
        let settings = Settings::resolve(args, file).unwrap();

        assert_eq!(settings.ws_port, 9100);
        assert_eq!(settings.web_root, PathBuf::from("/srv/ais"));
        assert_eq!(settings.state_file, Some(PathBuf::from("/srv/ais/state.json")));
        assert_eq!(settings.expire_after, Duration::from_secs(7200));
        assert!(settings.dedupe_window.is_zero());
        assert!(settings.show_decodes);
    }

    #[test]
    fn test_no_state_disables_persistence() {
        let args = Args::parse_from(["aisdecode", "--no-state", "--state-file", "/tmp/x.json"]);
        let settings = Settings::resolve(args, FileConfig::default()).unwrap();
        assert_eq!(settings.state_file, None);
    }

    #[test]
    fn test_validation_errors() {
        let args = Args {
            update_interval: Some(0),
            ..Args::default()
        };
        assert!(matches!(
            Settings::resolve(args, FileConfig::default()),
            Err(ConfigError::Invalid(_))
        ));

        let args = Args {
            expire_after: Some("soon".into()),
            ..Args::default()
        };
        assert!(matches!(
            Settings::resolve(args, FileConfig::default()),
            Err(ConfigError::Duration { .. })
        ));

        let args = Args {
            aggregator: Some("localhost".into()),
            ..Args::default()
        };
        assert!(matches!(
            Settings::resolve(args, FileConfig::default()),
            Err(ConfigError::Aggregator(_))
        ));
    }

    #[test]
    fn test_unknown_file_keys_are_rejected() {
        let err = FileConfig::parse("ws_prot: 1\n", Path::new("bad.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_missing_explicit_config_file_is_fatal() {
        let args = Args {
            config: Some(PathBuf::from("/nonexistent/aisdecode.yaml")),
            ..Args::default()
        };
        assert!(matches!(
            Settings::load(args).await,
            Err(ConfigError::Read { .. })
        ));
    }
}
