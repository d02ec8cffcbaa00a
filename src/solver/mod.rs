//! # Running a solver
//!
//! A [`SolverProcess`] supervises one external engine at a time:
//!
//! ```text
//! Idle -> Running -> Finished | Failed | Cancelled
//! ```
//!
//! The input is staged in a temporary file whose path becomes the last
//! command line argument. While the engine runs, a task reads standard
//! output and error into one buffer, forwarding every chunk to an optional
//! observer. Solvers can print an unbounded amount of text, so once the
//! buffer grows past a configured size the run cancels itself.
//!
//! A run that is cancelled, by request or because of its output size, is
//! always reported as cancelled, even though the engine dies from a
//! signal. The staged file is removed exactly once whichever way the run
//! ends.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use log::{debug, info, warn};
use strum::{Display, EnumIs};
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::{Child, Command},
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    model::Board,
    protocol::{Problem, SolverEngine},
};

mod report;
mod staging;

pub use report::{SolutionDecoder, SolverReport};
pub use staging::StagedInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIs, Display)]
pub enum SolverState {
    #[default]
    Idle,
    Running,
    Finished,
    Failed,
    Cancelled,
}

/// A chunk of engine output, as it arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverEvent {
    Stdout(String),
    Stderr(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("a solver is already running")]
    AlreadyRunning,
    #[error("no solver has been started")]
    NotStarted,
    #[error("unable to stage solver input: {0}")]
    Staging(#[source] std::io::Error),
    #[error("unable to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} failed: {detail}")]
    Runtime { program: String, detail: String },
}

/// Everything needed to run an engine once.
#[derive(Debug, Clone)]
pub struct SolverJob {
    pub program: String,
    pub args: Vec<String>,
    pub input: String,
    /// The position the input was encoded from.
    pub board: Board,
    pub problem: Problem,
}

impl SolverJob {
    pub fn prepare(engine: SolverEngine, board: &Board, problem: &Problem, config: &Config) -> Result<Self, crate::Error> {
        let input = engine.encode(board, problem, config)?;
        let (program, args) = engine.command(config)?;
        Ok(Self {
            program,
            args,
            input,
            board: board.clone(),
            problem: problem.clone(),
        })
    }
}

const CHUNK: usize = 4096;

#[derive(Debug)]
pub struct SolverProcess {
    max_output: usize,
    state: Arc<watch::Sender<SolverState>>,
    observer: Option<mpsc::Sender<SolverEvent>>,
    staging_dir: Option<PathBuf>,
    cancel: CancellationToken,
    program: String,
    task: Option<JoinHandle<Result<SolverReport, SolverError>>>,
}

impl SolverProcess {
    /// A supervisor stopping runs once their output exceeds `max_output`
    /// bytes.
    pub fn new(max_output: usize) -> Self {
        let (state, _) = watch::channel(SolverState::Idle);
        Self {
            max_output,
            state: Arc::new(state),
            observer: None,
            staging_dir: None,
            cancel: CancellationToken::new(),
            program: String::new(),
            task: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.stop_max_bytes)
    }

    /// Forward output chunks to `observer`. A full channel slows reading
    /// down rather than dropping output; cancelling still kills the engine
    /// right away.
    pub fn with_observer(mut self, observer: mpsc::Sender<SolverEvent>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Stage input files in `dir` instead of the system temporary
    /// directory.
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    pub fn state(&self) -> SolverState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SolverState> {
        self.state.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    pub async fn start(&mut self, job: SolverJob) -> Result<(), SolverError> {
        if self.is_running() {
            return Err(SolverError::AlreadyRunning);
        }
        self.state.send_replace(SolverState::Idle);
        self.task = None;
        self.cancel = CancellationToken::new();
        self.program = job.program.clone();

        let staged = match &self.staging_dir {
            Some(dir) => StagedInput::create_in(dir, &job.input).await,
            None => StagedInput::create(&job.input).await,
        };
        let staged = match staged {
            Ok(staged) => staged,
            Err(e) => {
                self.state.send_replace(SolverState::Failed);
                return Err(SolverError::Staging(e));
            }
        };

        let child = Command::new(&job.program)
            .args(&job.args)
            .arg(staged.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();
        let child = match child {
            Ok(child) => child,
            Err(source) => {
                warn!("unable to start {}: {source}", job.program);
                self.state.send_replace(SolverState::Failed);
                return Err(SolverError::Spawn {
                    program: job.program,
                    source,
                });
            }
        };
        info!("started {} on {}", job.program, staged.path().display());

        self.state.send_replace(SolverState::Running);
        let supervisor = Supervisor {
            child,
            staged,
            job,
            max_output: self.max_output,
            cancel: self.cancel.clone(),
            observer: self.observer.clone(),
            state: self.state.clone(),
        };
        self.task = Some(tokio::spawn(supervisor.run()));
        Ok(())
    }

    /// Request the running engine to be killed. The run ends as
    /// [`SolverState::Cancelled`]; see [`SolverProcess::wait`].
    pub fn cancel(&self) {
        if self.is_running() {
            info!("cancelling {}", self.program);
        }
        self.cancel.cancel();
    }

    /// Wait for the current run to end.
    pub async fn wait(&mut self) -> Result<SolverReport, SolverError> {
        let task = self.task.take().ok_or(SolverError::NotStarted)?;
        match task.await {
            Ok(result) => result,
            Err(e) => {
                self.state.send_replace(SolverState::Failed);
                Err(SolverError::Runtime {
                    program: self.program.clone(),
                    detail: e.to_string(),
                })
            }
        }
    }

    pub async fn run(&mut self, job: SolverJob) -> Result<SolverReport, SolverError> {
        self.start(job).await?;
        self.wait().await
    }
}

impl Drop for SolverProcess {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Read a chunk from a pipe that may already be closed. A closed pipe
/// never becomes ready.
async fn read_chunk<R: AsyncRead + Unpin>(pipe: &mut Option<R>, buf: &mut [u8]) -> std::io::Result<usize> {
    match pipe {
        Some(pipe) => pipe.read(buf).await,
        None => std::future::pending().await,
    }
}

/// Decodes a byte stream chunk by chunk, holding back a character split
/// across two reads until its remaining bytes arrive.
#[derive(Debug, Default)]
struct TextChunks {
    pending: Vec<u8>,
}

impl TextChunks {
    fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let cut = self.pending.len() - incomplete_tail(&self.pending);
        let text = String::from_utf8_lossy(&self.pending[..cut]).into_owned();
        self.pending.drain(..cut);
        text
    }

    /// Whatever is held back, once the stream has ended.
    fn finish(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        text
    }
}

/// Length of a UTF-8 sequence at the end of `bytes` that was started but
/// not completed.
fn incomplete_tail(bytes: &[u8]) -> usize {
    for back in 1..=bytes.len().min(3) {
        let b = bytes[bytes.len() - back];
        if b & 0xC0 == 0x80 {
            continue;
        }
        let width = match b {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if back < width { back } else { 0 };
    }
    0
}

struct Supervisor {
    child: Child,
    staged: StagedInput,
    job: SolverJob,
    max_output: usize,
    cancel: CancellationToken,
    observer: Option<mpsc::Sender<SolverEvent>>,
    state: Arc<watch::Sender<SolverState>>,
}

impl Supervisor {
    async fn run(mut self) -> Result<SolverReport, SolverError> {
        let result = self.supervise().await;
        self.staged.remove();
        let state = match &result {
            Ok(report) => report.state,
            Err(e) => {
                warn!("{e}");
                SolverState::Failed
            }
        };
        info!("{} ended: {state}", self.job.program);
        self.state.send_replace(state);
        result
    }

    async fn supervise(&mut self) -> Result<SolverReport, SolverError> {
        let cancel = self.cancel.clone();
        let observer = self.observer.clone();
        let mut stdout = self.child.stdout.take();
        let mut stderr = self.child.stderr.take();
        let mut out_buf = [0u8; CHUNK];
        let mut err_buf = [0u8; CHUNK];
        let mut out_text = TextChunks::default();
        let mut err_text = TextChunks::default();
        let mut output = Vec::new();

        while stdout.is_some() || stderr.is_some() {
            let (from_stderr, read) = tokio::select! {
                biased;
                _ = cancel.cancelled() => return self.kill(output).await,
                read = read_chunk(&mut stdout, &mut out_buf), if stdout.is_some() => (false, read),
                read = read_chunk(&mut stderr, &mut err_buf), if stderr.is_some() => (true, read),
            };
            let n = read.unwrap_or_else(|e| {
                debug!("unable to read from {}: {e}", self.job.program);
                0
            });
            if n == 0 {
                if from_stderr {
                    stderr = None;
                } else {
                    stdout = None;
                }
            }
            let (chunk, text) = if from_stderr {
                (&err_buf[..n], &mut err_text)
            } else {
                (&out_buf[..n], &mut out_text)
            };
            output.extend_from_slice(chunk);
            let text = if n == 0 { text.finish() } else { text.push(chunk) };

            if let Some(observer) = observer.as_ref().filter(|_| !text.is_empty()) {
                let event = if from_stderr {
                    SolverEvent::Stderr(text)
                } else {
                    SolverEvent::Stdout(text)
                };
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return self.kill(output).await,
                    // a dropped observer does not stop the run
                    _ = observer.send(event) => {}
                }
            }
            if output.len() > self.max_output && !cancel.is_cancelled() {
                info!(
                    "{} printed more than {} bytes, stopping",
                    self.job.program, self.max_output
                );
                cancel.cancel();
            }
        }

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => return self.kill(output).await,
            status = self.child.wait() => status.map_err(|e| self.runtime(e.to_string()))?,
        };
        match status.code() {
            Some(code) => {
                debug!("{} exited with {code}", self.job.program);
                Ok(self.report(SolverState::Finished, Some(code), output))
            }
            None => Err(self.runtime(format!("terminated abnormally ({status})"))),
        }
    }

    async fn kill(&mut self, output: Vec<u8>) -> Result<SolverReport, SolverError> {
        if let Err(e) = self.child.start_kill() {
            debug!("unable to kill {}: {e}", self.job.program);
        }
        if let Err(e) = self.child.wait().await {
            debug!("unable to reap {}: {e}", self.job.program);
        }
        Ok(self.report(SolverState::Cancelled, None, output))
    }

    fn runtime(&self, detail: String) -> SolverError {
        SolverError::Runtime {
            program: self.job.program.clone(),
            detail,
        }
    }

    fn report(&self, state: SolverState, exit_code: Option<i32>, output: Vec<u8>) -> SolverReport {
        SolverReport {
            state,
            exit_code,
            output: String::from_utf8_lossy(&output).into_owned(),
            input_file: self.staged.path().to_owned(),
            board: self.job.board.clone(),
            problem: self.job.problem.clone(),
        }
    }
}

#[cfg(all(test, unix))]
fn shell(script: &str) -> SolverJob {
    SolverJob {
        program: "sh".into(),
        args: vec!["-c".into(), script.into(), "sh".into()],
        input: "BeginProblem\nEndProblem\n".into(),
        board: Board::from_fen("8/8/8/8/8/8/8/K7"),
        problem: Problem::with_stipulation("#2"),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn natural_exit() {
    let mut process = SolverProcess::new(1 << 20);
    assert_eq!(process.state(), SolverState::Idle);
    let report = process.run(shell("cat \"$1\"; echo oops >&2; exit 3")).await.unwrap();
    assert_eq!(report.state, SolverState::Finished);
    assert_eq!(report.exit_code, Some(3));
    assert!(report.output.contains("BeginProblem\nEndProblem\n"), "{}", report.output);
    assert!(report.output.contains("oops"), "{}", report.output);
    assert_eq!(report.board.len(), 1);
    assert!(!report.input_file.exists());
    assert_eq!(process.state(), SolverState::Finished);
}

#[cfg(unix)]
#[tokio::test]
async fn observer_sees_output() {
    let (tx, mut rx) = mpsc::channel(4);
    let mut process = SolverProcess::new(1 << 20).with_observer(tx);
    process.start(shell("echo solution")).await.unwrap();
    let report = process.wait().await.unwrap();
    drop(process);
    let mut seen = String::new();
    while let Some(event) = rx.recv().await {
        if let SolverEvent::Stdout(text) = event {
            seen.push_str(&text);
        }
    }
    assert_eq!(seen, "solution\n");
    assert_eq!(report.output, seen);
}

#[cfg(unix)]
#[tokio::test]
async fn output_bound_cancels() {
    let mut process = SolverProcess::new(64 * 1024);
    let mut states = process.subscribe();
    let report = process.run(shell("exec yes solution")).await.unwrap();
    assert_eq!(report.state, SolverState::Cancelled);
    assert!(report.output.len() > 64 * 1024);
    assert!(report.output.starts_with("solution\n"));
    assert!(!report.input_file.exists());
    assert_eq!(*states.borrow_and_update(), SolverState::Cancelled);
}

#[cfg(unix)]
#[tokio::test]
async fn cancel_is_not_failure() {
    let mut process = SolverProcess::new(1 << 20);
    process.start(shell("echo started; exec sleep 30")).await.unwrap();
    assert!(process.is_running());
    assert!(matches!(
        process.start(shell("true")).await,
        Err(SolverError::AlreadyRunning)
    ));
    let mut states = process.subscribe();
    process.cancel();
    let report = process.wait().await.unwrap();
    assert_eq!(report.state, SolverState::Cancelled);
    assert_eq!(report.exit_code, None);
    assert!(!report.input_file.exists());
    assert_eq!(*states.borrow_and_update(), SolverState::Cancelled);

    // the supervisor can be reused
    let report = process.run(shell("true")).await.unwrap();
    assert_eq!(report.state, SolverState::Finished);
}

/// A fresh directory to stage into, so a test can see what is left behind.
#[cfg(test)]
fn staging_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("stipulate-staging-{:016x}", rand::random::<u64>()));
    std::fs::create_dir(&dir).unwrap();
    dir
}

#[cfg(test)]
fn staged_files(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[cfg(unix)]
#[tokio::test]
async fn missing_program() {
    let dir = staging_dir();
    let mut process = SolverProcess::new(1024).with_staging_dir(&dir);
    let mut job = shell("true");
    job.program = "/nonexistent/solver".into();
    match process.start(job).await {
        Err(SolverError::Spawn { program, .. }) => assert_eq!(program, "/nonexistent/solver"),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(process.state(), SolverState::Failed);
    assert!(matches!(process.wait().await, Err(SolverError::NotStarted)));
    assert_eq!(staged_files(&dir), 0);
    std::fs::remove_dir(&dir).unwrap();
}

#[cfg(unix)]
#[tokio::test]
async fn killed_from_outside() {
    let dir = staging_dir();
    let mut process = SolverProcess::new(1024).with_staging_dir(&dir);
    let report = process.run(shell("kill -9 $$")).await;
    assert!(matches!(report, Err(SolverError::Runtime { program, .. }) if program == "sh"));
    assert_eq!(process.state(), SolverState::Failed);
    assert_eq!(staged_files(&dir), 0);
    std::fs::remove_dir(&dir).unwrap();
}

#[cfg(unix)]
#[tokio::test]
async fn staged_where_asked() {
    let dir = staging_dir();
    let mut process = SolverProcess::new(1024).with_staging_dir(&dir);
    let report = process.run(shell("ls \"$(dirname \"$1\")\"")).await.unwrap();
    assert!(report.input_file.starts_with(&dir));
    assert!(report.output.starts_with("stipulate-"), "{}", report.output);
    assert_eq!(staged_files(&dir), 0);
    std::fs::remove_dir(&dir).unwrap();
}

#[cfg(unix)]
#[tokio::test]
async fn cancel_with_unread_observer() {
    use std::time::Duration;
    let (tx, _rx) = mpsc::channel(1);
    let dir = staging_dir();
    let mut process = SolverProcess::new(1 << 30)
        .with_observer(tx)
        .with_staging_dir(&dir);
    process.start(shell("exec yes solution")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    process.cancel();
    let report = tokio::time::timeout(Duration::from_secs(5), process.wait())
        .await
        .expect("engine still running after cancel")
        .unwrap();
    assert_eq!(report.state, SolverState::Cancelled);
    assert_eq!(staged_files(&dir), 0);
    std::fs::remove_dir(&dir).unwrap();
}

#[test]
fn split_characters_are_held_back() {
    let bytes = "é♞x".as_bytes();
    let mut text = TextChunks::default();
    assert_eq!(text.push(&bytes[..1]), "");
    assert_eq!(text.push(&bytes[1..3]), "é");
    assert_eq!(text.push(&bytes[3..4]), "");
    assert_eq!(text.push(&bytes[4..]), "♞x");
    assert_eq!(text.finish(), "");

    // a stream ending inside a character still yields something
    assert_eq!(text.push(&bytes[2..4]), "");
    assert_eq!(text.finish(), "\u{FFFD}");
    assert_eq!(incomplete_tail(b"abc"), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn observer_gets_whole_characters() {
    let (tx, mut rx) = mpsc::channel(16);
    let mut process = SolverProcess::new(1 << 20).with_observer(tx);
    // the knight's three bytes arrive in two writes
    let report = process
        .run(shell("printf '\\342\\231'; sleep 0.1; printf '\\236\\n'"))
        .await
        .unwrap();
    drop(process);
    let mut events = vec![];
    while let Some(SolverEvent::Stdout(text)) = rx.recv().await {
        events.push(text);
    }
    assert_eq!(events.concat(), "♞\n");
    assert!(!events.concat().contains('\u{FFFD}'));
    assert_eq!(report.output, "♞\n");
}
