//! Talking to the external solvers.
//!
//! Two engines are supported: a fast orthodox solver ([`chest`]) and a full
//! fairy solver ([`popeye`]). Both read a problem from a text file whose
//! path is passed on the command line; encoding is a pure function of the
//! board, the problem and the configuration.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::{
    config::{Config, ConfigError},
    model::Board,
    notation::stipulation::UnsupportedStipulation,
};

pub mod catalogue;
pub mod chest;
pub mod popeye;
pub mod problem;

pub use problem::{Problem, Twins, has_fairy_elements};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("unsupported position: {0}")]
    UnsupportedPosition(String),
    #[error("unsupported stipulation {0:?}")]
    UnsupportedStipulation(String),
    #[error("unknown condition {0:?}")]
    UnknownCondition(String),
}

impl From<UnsupportedStipulation> for EncodeError {
    fn from(err: UnsupportedStipulation) -> Self {
        Self::UnsupportedStipulation(err.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash,
    EnumString, Display, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SolverEngine {
    Chest,
    Popeye,
}

impl SolverEngine {
    /// The input file contents for this engine.
    pub fn encode(self, board: &Board, problem: &Problem, config: &Config) -> Result<String, EncodeError> {
        match self {
            Self::Chest => chest::encode(board, problem),
            Self::Popeye => popeye::encode(board, problem, &config.popeye.sticky_options),
        }
    }

    /// Program and leading arguments; the input file path goes last.
    pub fn command(self, config: &Config) -> Result<(String, Vec<String>), ConfigError> {
        let executable = match self {
            Self::Chest => &config.chest.executable,
            Self::Popeye => &config.popeye.executable,
        };
        let line = executable
            .for_host()
            .ok_or_else(|| ConfigError::MissingExecutable {
                engine: self.to_string(),
                os: std::env::consts::FAMILY.to_string(),
            })?;
        let mut words = line.split_whitespace().map(String::from);
        let program = words.next().ok_or_else(|| ConfigError::MissingExecutable {
            engine: self.to_string(),
            os: std::env::consts::FAMILY.to_string(),
        })?;
        let mut args: Vec<String> = words.collect();
        if self == Self::Chest {
            args.extend(["-r".into(), "-LS".into(), format!("-M{}", config.chest.hash_size_mb)]);
        }
        Ok((program, args))
    }
}

#[test]
fn engine_names() {
    assert_eq!("Popeye".parse::<SolverEngine>(), Ok(SolverEngine::Popeye));
    assert_eq!(SolverEngine::Chest.to_string(), "chest");
}

#[cfg(unix)]
#[test]
fn commands() {
    let config = Config::default();
    let (program, args) = SolverEngine::Chest.command(&config).unwrap();
    assert_eq!(program, "chest");
    assert_eq!(args, ["-r", "-LS", "-M64"]);
    let (program, args) = SolverEngine::Popeye.command(&config).unwrap();
    assert_eq!(program, "py");
    assert_eq!(args, ["-maxmem", "512M"]);

    let mut config = Config::default();
    config.chest.executable.0.clear();
    assert!(matches!(
        SolverEngine::Chest.command(&config),
        Err(ConfigError::MissingExecutable { engine, .. }) if engine == "chest"
    ));
}

#[test]
fn engines_share_the_problem() {
    let board = Board::from_fen("4k3/8/4K3/8/8/8/8/7R");
    let problem = Problem::with_stipulation("#2");
    let config = Config::default();
    let chest = SolverEngine::Chest.encode(&board, &problem, &config).unwrap();
    let popeye = SolverEngine::Popeye.encode(&board, &problem, &config).unwrap();
    assert!(chest.starts_with("LE\nf 4k3/8/4K3/8/8/8/8/7R\n"));
    assert!(popeye.contains("\nOption NoBoard\n"));
    assert!(popeye.contains("\n  white Ke6 Rh1\n  black Ke8\n"), "{popeye}");
}
