//! The position being edited.
//!
//! A [`Position`] owns one board and its problem data. Every edit is
//! announced on a broadcast channel, so views (diagram, FEN line, piece
//! count, ...) can refresh without the editor knowing about them.

use tokio::sync::broadcast;

use crate::{
    config::Config,
    model::{Board, MirrorAxis, Piece, Rotation, Square},
    notation::algebraic::{Algebraic, DecodeError},
    protocol::{Problem, SolverEngine, Twins, has_fairy_elements},
    solver::SolverJob,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Board,
    Problem,
}

#[derive(Debug)]
pub struct Position {
    board: Board,
    problem: Problem,
    changes: broadcast::Sender<Change>,
}

impl Default for Position {
    fn default() -> Self {
        Self::new(Board::new(), Problem::default())
    }
}

impl Position {
    pub fn new(board: Board, problem: Problem) -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            board,
            problem,
            changes,
        }
    }

    pub fn from_algebraic(algebraic: &Algebraic, problem: Problem) -> Result<Self, DecodeError> {
        Ok(Self::new(Board::from_algebraic(algebraic)?, problem))
    }

    /// Receive a [`Change`] after every edit. Slow receivers may miss
    /// notifications but can always re-read the position.
    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.changes.subscribe()
    }

    fn notify(&self, change: Change) {
        // no receivers is fine
        let _ = self.changes.send(change);
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn edit_board<T>(&mut self, edit: impl FnOnce(&mut Board) -> T) -> T {
        let result = edit(&mut self.board);
        self.notify(Change::Board);
        result
    }

    pub fn edit_problem<T>(&mut self, edit: impl FnOnce(&mut Problem) -> T) -> T {
        let result = edit(&mut self.problem);
        self.notify(Change::Problem);
        result
    }

    pub fn add(&mut self, piece: Piece, sq: Square) {
        self.edit_board(|b| b.add(piece, sq))
    }

    pub fn drop(&mut self, sq: Square) -> Option<Piece> {
        self.edit_board(|b| b.drop(sq))
    }

    pub fn clear(&mut self) {
        self.edit_board(Board::clear)
    }

    pub fn shift(&mut self, dx: i8, dy: i8) {
        self.edit_board(|b| b.shift(dx, dy))
    }

    pub fn rotate(&mut self, rotation: Rotation) {
        self.edit_board(|b| b.rotate(rotation))
    }

    pub fn mirror(&mut self, axis: MirrorAxis) {
        self.edit_board(|b| b.mirror(axis))
    }

    pub fn invert_colors(&mut self) {
        self.edit_board(Board::invert_colors)
    }

    /// Replace the board with the one an (X-)FEN string describes.
    pub fn set_fen(&mut self, fen: &str) {
        let board = Board::from_fen(fen);
        self.edit_board(|b| *b = board)
    }

    pub fn set_algebraic(&mut self, algebraic: &Algebraic) -> Result<(), DecodeError> {
        let board = Board::from_algebraic(algebraic)?;
        self.edit_board(|b| *b = board);
        Ok(())
    }

    pub fn set_stipulation(&mut self, stipulation: &str) {
        let stipulation = stipulation.trim();
        self.edit_problem(|p| {
            p.stipulation = (!stipulation.is_empty()).then(|| stipulation.to_string())
        })
    }

    pub fn toggle_option(&mut self, token: &str) {
        self.edit_problem(|p| p.toggle_option(token))
    }

    pub fn set_twins(&mut self, twins: Twins) {
        self.edit_problem(|p| p.twins = twins)
    }

    pub fn fen(&self) -> String {
        self.board.to_fen()
    }

    pub fn algebraic(&self) -> Algebraic {
        self.board.to_algebraic()
    }

    pub fn pieces_count(&self) -> String {
        self.board.pieces_count()
    }

    pub fn has_fairy_elements(&self) -> bool {
        has_fairy_elements(&self.board, &self.problem)
    }

    /// Input text for an engine, e.g. to show the user what will be solved.
    pub fn engine_input(&self, engine: SolverEngine, config: &Config) -> Result<String, crate::Error> {
        Ok(engine.encode(&self.board, &self.problem, config)?)
    }

    /// A job solving a snapshot of this position.
    pub fn job(&self, engine: SolverEngine, config: &Config) -> Result<SolverJob, crate::Error> {
        SolverJob::prepare(engine, &self.board, &self.problem, config)
    }
}

#[test]
fn edits_are_announced() {
    use crate::model::Color;
    let mut position = Position::default();
    let mut changes = position.subscribe();
    position.set_fen("4k3/8/8/8/8/8/8/4K2R");
    position.set_stipulation(" #2 ");
    position.rotate(Rotation::R180);
    assert_eq!(position.drop(Square::a8), Some(Piece::orthodox("R", Color::WHITE)));

    assert_eq!(changes.try_recv(), Ok(Change::Board));
    assert_eq!(changes.try_recv(), Ok(Change::Problem));
    assert_eq!(changes.try_recv(), Ok(Change::Board));
    assert_eq!(changes.try_recv(), Ok(Change::Board));
    assert!(changes.try_recv().is_err());

    assert_eq!(position.fen(), "3K4/8/8/8/8/8/8/3k4");
    assert_eq!(position.pieces_count(), "1+1");
    assert_eq!(position.problem().stipulation.as_deref(), Some("#2"));
    position.set_stipulation("");
    assert_eq!(position.problem().stipulation, None);
}

#[test]
fn fairy_elements_and_input() {
    let mut position = Position::from_algebraic(
        &Algebraic::new().with("white", &["Ke1"]).with("black", &["Ke8"]),
        Problem::with_stipulation("#2"),
    )
    .unwrap();
    let config = Config::default();
    assert!(!position.has_fairy_elements());
    assert!(position.engine_input(SolverEngine::Chest, &config).is_ok());

    position.toggle_option("Madrasi");
    assert!(position.has_fairy_elements());
    assert!(matches!(
        position.engine_input(SolverEngine::Chest, &config),
        Err(crate::Error::Encode(_))
    ));
    let input = position.engine_input(SolverEngine::Popeye, &config).unwrap();
    assert!(input.contains("\nCondition Madrasi\n"), "{input}");

    let job = position.job(SolverEngine::Popeye, &config).unwrap();
    assert_eq!(job.input, input);
    assert_eq!(job.board, *position.board());
}
