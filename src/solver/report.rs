use std::path::PathBuf;

use crate::{model::Board, protocol::Problem, solver::SolverState};

/// Turns raw solver output into solutions.
///
/// Decoding needs the position the solver was given, since the output
/// refers to pieces by square and the position may have been edited while
/// the solver ran.
pub trait SolutionDecoder {
    type Solution;
    type Error;

    fn decode(&self, output: &str, board: &Board, problem: &Problem) -> Result<Self::Solution, Self::Error>;
}

/// What a finished or cancelled run leaves behind.
#[derive(Debug, Clone)]
pub struct SolverReport {
    /// [`SolverState::Finished`] or [`SolverState::Cancelled`].
    pub state: SolverState,
    /// Exit code of a finished run.
    pub exit_code: Option<i32>,
    /// Standard output and error, interleaved as they arrived.
    pub output: String,
    /// Where the input was staged; the file no longer exists.
    pub input_file: PathBuf,
    pub board: Board,
    pub problem: Problem,
}

impl SolverReport {
    /// Decode the output of a run that ended by itself; cancelled runs
    /// have truncated output and yield `None`.
    pub fn solution<D: SolutionDecoder>(&self, decoder: &D) -> Option<Result<D::Solution, D::Error>> {
        self.state
            .is_finished()
            .then(|| decoder.decode(&self.output, &self.board, &self.problem))
    }
}

#[cfg(test)]
struct LineCount;

#[cfg(test)]
impl SolutionDecoder for LineCount {
    type Solution = usize;
    type Error = std::convert::Infallible;

    fn decode(&self, output: &str, board: &Board, _: &Problem) -> Result<usize, Self::Error> {
        Ok(output.lines().count() + board.len())
    }
}

#[test]
fn decode_finished_only() {
    let mut report = SolverReport {
        state: SolverState::Finished,
        exit_code: Some(0),
        output: "1.Ka1-b2 !\n2.Kb2-c3 #\n".into(),
        input_file: PathBuf::new(),
        board: Board::from_fen("8/8/8/8/8/8/8/K7"),
        problem: Problem::default(),
    };
    assert_eq!(report.solution(&LineCount), Some(Ok(3)));
    report.state = SolverState::Cancelled;
    assert_eq!(report.solution(&LineCount), None);
}
