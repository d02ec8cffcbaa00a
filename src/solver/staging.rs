use std::path::{Path, PathBuf};

use log::debug;
use tokio::{fs::OpenOptions, io::AsyncWriteExt};

/// Attempts at finding an unused file name.
const ATTEMPTS: usize = 16;

/// A solver input file, removed when the guard is dropped or
/// [`StagedInput::remove`] is called, whichever comes first.
#[derive(Debug)]
pub struct StagedInput {
    path: PathBuf,
    removed: bool,
}

impl StagedInput {
    /// Stage in the system temporary directory.
    pub async fn create(contents: &str) -> std::io::Result<Self> {
        Self::create_in(&std::env::temp_dir(), contents).await
    }

    /// Stage in `dir` under a fresh random name.
    pub async fn create_in(dir: &Path, contents: &str) -> std::io::Result<Self> {
        let mut last = None;
        for _ in 0..ATTEMPTS {
            let path = dir.join(format!("stipulate-{:016x}.inp", rand::random::<u64>()));
            match Self::create_at(path, contents).await {
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => last = Some(e),
                result => return result,
            }
        }
        Err(last.unwrap_or_else(|| std::io::ErrorKind::AlreadyExists.into()))
    }

    /// Stage at exactly `path`, which must not exist yet.
    pub async fn create_at(path: PathBuf, contents: &str) -> std::io::Result<Self> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        // from here on the file is ours to remove
        let staged = Self {
            path,
            removed: false,
        };
        file.write_all(contents.as_bytes()).await?;
        file.flush().await?;
        debug!("staged solver input at {}", staged.path.display());
        Ok(staged)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file. Failures are logged and otherwise ignored.
    pub fn remove(&mut self) {
        if std::mem::replace(&mut self.removed, true) {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("removed {}", self.path.display()),
            Err(e) => debug!("unable to remove {}: {e}", self.path.display()),
        }
    }
}

impl Drop for StagedInput {
    fn drop(&mut self) {
        self.remove();
    }
}

#[tokio::test]
async fn removed_once() {
    let mut staged = StagedInput::create("BeginProblem\nEndProblem\n").await.unwrap();
    let path = staged.path().to_owned();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "BeginProblem\nEndProblem\n");
    staged.remove();
    assert!(!path.exists());
    // a file reappearing under the same name is not touched again
    std::fs::write(&path, "").unwrap();
    drop(staged);
    assert!(path.exists());
    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn removed_on_drop() {
    let staged = StagedInput::create("").await.unwrap();
    let path = staged.path().to_owned();
    drop(staged);
    assert!(!path.exists());
}

#[tokio::test]
async fn existing_files_are_left_alone() {
    let path = std::env::temp_dir().join(format!("stipulate-taken-{:016x}.inp", rand::random::<u64>()));
    std::fs::write(&path, "someone else's").unwrap();
    let err = StagedInput::create_at(path.clone(), "BeginProblem\n").await.unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "someone else's");
    std::fs::remove_file(&path).unwrap();

    let a = StagedInput::create("a").await.unwrap();
    let b = StagedInput::create("b").await.unwrap();
    assert_ne!(a.path(), b.path());
    assert_eq!(std::fs::read_to_string(b.path()).unwrap(), "b");
}
