//! Solver configuration.
//!
//! Read from a TOML file; any key left out takes its value from the
//! defaults compiled into the crate (`conf/default.toml`):
//!
//! ```toml
//! stop-max-bytes = 1000000
//!
//! [popeye]
//! sticky-options = ["NoBoard"]
//!
//! [popeye.executable]
//! unix = "py -maxmem 512M"
//! windows = "pywin64.exe -maxmem 512M"
//!
//! [chest]
//! hash-size-mb = 64
//!
//! [chest.executable]
//! unix = "chest"
//! windows = "chest.exe"
//! ```
//!
//! Executables are keyed by OS family, or by OS name for a more specific
//! entry, and may carry leading arguments.

use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use include_flate::flate;
use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};

flate!(static DEFAULT_TOML: str from "conf/default.toml");

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unable to write configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("no {engine} executable configured for {os}")]
    MissingExecutable { engine: String, os: String },
}

/// Command lines per OS family or OS name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Executables(pub IndexMap<String, String>);

impl Executables {
    /// The command line for the running OS; an entry for the OS name takes
    /// precedence over one for its family.
    pub fn for_host(&self) -> Option<&str> {
        use std::env::consts::{FAMILY, OS};
        self.0
            .get(OS)
            .or_else(|| self.0.get(FAMILY))
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PopeyeConfig {
    pub executable: Executables,
    /// Appended to the options of every problem.
    #[serde(default)]
    pub sticky_options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChestConfig {
    pub executable: Executables,
    pub hash_size_mb: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Output size at which a running solver is stopped.
    pub stop_max_bytes: usize,
    pub popeye: PopeyeConfig,
    pub chest: ChestConfig,
}

static DEFAULTS: LazyLock<toml::Table> =
    LazyLock::new(|| DEFAULT_TOML.parse().unwrap_or_default());

impl Default for Config {
    fn default() -> Self {
        Self {
            stop_max_bytes: 1_000_000,
            popeye: PopeyeConfig {
                executable: Executables(IndexMap::from([
                    ("unix".into(), "py -maxmem 512M".into()),
                    ("windows".into(), "pywin64.exe -maxmem 512M".into()),
                ])),
                sticky_options: vec!["NoBoard".into()],
            },
            chest: ChestConfig {
                executable: Executables(IndexMap::from([
                    ("unix".into(), "chest".into()),
                    ("windows".into(), "chest.exe".into()),
                ])),
                hash_size_mb: 64,
            },
        }
    }
}

/// Recursively fill in keys missing from `user`.
fn merge(user: &mut toml::Table, defaults: &toml::Table) {
    for (key, value) in defaults {
        match (user.get_mut(key), value) {
            (None, _) => {
                user.insert(key.clone(), value.clone());
            }
            (Some(toml::Value::Table(u)), toml::Value::Table(d)) => merge(u, d),
            _ => {}
        }
    }
}

impl Config {
    /// The compiled-in defaults as TOML text, e.g. to seed a user file.
    pub fn default_toml() -> &'static str {
        &DEFAULT_TOML
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let mut table: toml::Table = text.parse()?;
        merge(&mut table, &DEFAULTS);
        let config: Self = toml::Value::Table(table).try_into()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        info!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            debug!("no configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_toml()?).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })
    }
}

#[test]
fn embedded_defaults() {
    assert_eq!(Config::from_toml(Config::default_toml()).unwrap(), Config::default());
    assert_eq!(Config::from_toml("").unwrap(), Config::default());
}

#[test]
fn partial_file() {
    let config = Config::from_toml(
        r#"
        stop-max-bytes = 4096

        [chest.executable]
        linux = "/opt/chest/chest"
        "#,
    )
    .unwrap();
    assert_eq!(config.stop_max_bytes, 4096);
    assert_eq!(config.chest.hash_size_mb, 64);
    assert_eq!(config.chest.executable.0.len(), 3);
    assert_eq!(config.popeye.sticky_options, ["NoBoard"]);
    if cfg!(target_os = "linux") {
        assert_eq!(config.chest.executable.for_host(), Some("/opt/chest/chest"));
    }

    assert!(matches!(
        Config::from_toml("stop-max-bytes = \"lots\""),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn save_and_load() {
    let path = std::env::temp_dir().join(format!("stipulate-config-{}.toml", rand::random::<u64>()));
    let mut config = Config::default();
    config.popeye.sticky_options.push("MaxSolutions 10".into());
    config.save(&path).unwrap();
    let loaded = Config::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(Config::load_or_default(&path).unwrap(), Config::default());
    assert!(matches!(Config::load(&path), Err(ConfigError::Io { .. })));
}
