use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A scratch access log in a private temp directory.
pub struct TestLog {
    _dir: TempDir,
    path: PathBuf,
}

impl TestLog {
    pub fn create() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("access.log");
        File::create(&path).expect("create log file");
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one line, newline included.
    pub fn append(&self, line: &str) {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .expect("open log for append");
        writeln!(file, "{line}").expect("append log line");
    }

    /// Rewrites the file from scratch, the way logrotate's truncating mode
    /// does.
    pub fn rewrite(&self, line: &str) {
        let mut file = File::create(&self.path).expect("truncate log file");
        writeln!(file, "{line}").expect("write log line");
    }
}
