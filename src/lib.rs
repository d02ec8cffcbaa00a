/// Configuration of the external solvers.
pub mod config;
/// Modeling a fairy chess problem position.
pub mod model;
/// Reading and writing positions and stipulations as text.
pub mod notation;
/// The position being edited and its change notifications.
pub mod position;
/// Input formats of the external solvers.
pub mod protocol;
/// Supervising a running solver.
pub mod solver;

pub use config::{Config, ConfigError};
pub use model::{Board, Color, Piece, Role, Square};
pub use position::{Change, Position};
pub use protocol::{EncodeError, Problem, SolverEngine};
pub use solver::{SolverError, SolverJob, SolverProcess, SolverReport, SolverState};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] notation::algebraic::DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// From a FEN line to a finished solver run.
#[cfg(unix)]
#[tokio::test]
async fn solve_with_stand_in_engine() {
    let mut position = Position::default();
    position.set_fen("4k3/8/4K3/8/8/8/8/7R");
    position.set_stipulation("#2");

    let mut config = Config::from_toml(
        r#"
        [popeye.executable]
        unix = "cat"
        "#,
    )
    .unwrap();
    config.popeye.sticky_options.clear();
    let job = position.job(SolverEngine::Popeye, &config).unwrap();
    assert_eq!(job.program, "cat");
    assert!(job.args.is_empty());

    let mut solver = SolverProcess::from_config(&config);
    let report = solver.run(job).await.unwrap();
    assert_eq!(report.state, SolverState::Finished);
    assert_eq!(
        report.output,
        "BeginProblem\n\
         Stipulation #2\n\
         Pieces\n\
         \x20 white Ke6 Rh1\n\
         \x20 black Ke8\n\
         EndProblem\n"
    );
}
