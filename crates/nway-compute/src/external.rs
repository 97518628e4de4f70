//! External strategy: run a diff command (or user callback) over temporary
//! snapshot files and read its output back.
//!
//! Each computation writes both documents to fresh temp files with canonical
//! `\n` line endings, runs the configured command with its output redirected
//! to a third temp file, and parses the result with [`crate::format`]. The
//! whole temp directory is removed on every exit path, including failure.

use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use nway_types::DiffOptions;

use crate::error::{ComputeError, ComputeResult};
use crate::format::parse_diff_output;

/// A user-supplied diff function.
///
/// Receives the original-document path, the new-document path, and the path
/// the output must be written to, in one of the two recognized formats.
pub type DiffCallback = Arc<dyn Fn(&Path, &Path, &Path) -> io::Result<()> + Send + Sync>;

/// External diff runner: configured command or user callback.
#[derive(Clone)]
pub struct ExternalDiff {
    /// The diff program to spawn (ignored when `callback` is set).
    command: String,
    /// User callback replacing the spawned process.
    callback: Option<DiffCallback>,
    /// Cached capability probe result: whether `-a` is accepted.
    ///
    /// Probed at most once per computer, which in practice means once per
    /// process; probe *failure* is not cached so a fixed configuration can
    /// recover.
    a_works: Arc<OnceLock<bool>>,
}

impl std::fmt::Debug for ExternalDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalDiff")
            .field("command", &self.command)
            .field("callback", &self.callback.is_some())
            .field("a_works", &self.a_works.get())
            .finish()
    }
}

impl Default for ExternalDiff {
    fn default() -> Self {
        Self::new("diff")
    }
}

impl ExternalDiff {
    /// Use the given diff program.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            callback: None,
            a_works: Arc::new(OnceLock::new()),
        }
    }

    /// Use a callback instead of spawning a process.
    pub fn with_callback(callback: DiffCallback) -> Self {
        Self {
            command: String::new(),
            callback: Some(callback),
            a_works: Arc::new(OnceLock::new()),
        }
    }

    /// Returns `true` when a user callback replaces the spawned process.
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Diff two documents, given as line slices, returning parsed hunks.
    pub fn diff(
        &self,
        orig: &[String],
        new: &[String],
        opts: &DiffOptions,
    ) -> ComputeResult<Vec<nway_types::Hunk>> {
        if self.callback.is_none() {
            self.probe()?;
        }

        let dir = tempfile::Builder::new().prefix("nway-diff-").tempdir()?;
        let path_orig = dir.path().join("orig");
        let path_new = dir.path().join("new");
        let path_out = dir.path().join("out");

        write_snapshot(&path_orig, orig)?;
        write_snapshot(&path_new, new)?;

        match &self.callback {
            Some(callback) => {
                callback(&path_orig, &path_new, &path_out).map_err(|e| {
                    ComputeError::ComputationFailed(format!("diff callback failed: {e}"))
                })?;
            }
            None => {
                self.run_command(&path_orig, &path_new, &path_out, opts)?;
            }
        }

        let output = fs::read_to_string(&path_out).map_err(|e| {
            ComputeError::ComputationFailed(format!("cannot read diff output: {e}"))
        })?;
        let hunks = parse_diff_output(&output);
        debug!(hunks = hunks.len(), "external diff complete");
        Ok(hunks)
        // `dir` dropped here removes all three files, also on the error paths
        // above via unwinding of the TempDir.
    }

    /// One-time capability probe: diff two synthetic one-line files and check
    /// for the expected `1c1` hunk, first with `-a`, then without.
    fn probe(&self) -> ComputeResult<()> {
        if self.a_works.get().is_some() {
            return Ok(());
        }

        let dir = tempfile::Builder::new().prefix("nway-probe-").tempdir()?;
        let path_orig = dir.path().join("orig");
        let path_new = dir.path().join("new");
        let path_out = dir.path().join("out");
        write_snapshot(&path_orig, &["line1".to_string()])?;
        write_snapshot(&path_new, &["line2".to_string()])?;

        for try_a in [true, false] {
            let ok = self
                .spawn(&path_orig, &path_new, &path_out, try_a, &[])
                .is_ok()
                && fs::read_to_string(&path_out)
                    .map(|out| out.starts_with("1c1"))
                    .unwrap_or(false);
            if ok {
                let _ = self.a_works.set(try_a);
                debug!(command = %self.command, a_works = try_a, "diff probe succeeded");
                return Ok(());
            }
        }

        warn!(command = %self.command, "diff probe failed, cannot create diffs");
        Err(ComputeError::ComputationFailed(format!(
            "diff command {:?} does not produce usable output",
            self.command
        )))
    }

    fn run_command(
        &self,
        orig: &Path,
        new: &Path,
        out: &Path,
        opts: &DiffOptions,
    ) -> ComputeResult<()> {
        let mut flags: Vec<&str> = Vec::new();
        if opts.iwhite {
            flags.push("-b");
        }
        if opts.icase {
            flags.push("-i");
        }
        let use_a = self.a_works.get().copied().unwrap_or(false);
        self.spawn(orig, new, out, use_a, &flags)
    }

    fn spawn(
        &self,
        orig: &Path,
        new: &Path,
        out: &Path,
        use_a: bool,
        flags: &[&str],
    ) -> ComputeResult<()> {
        let out_file = File::create(out)?;
        let mut cmd = Command::new(&self.command);
        if use_a {
            cmd.arg("-a");
        }
        cmd.args(flags)
            .arg(orig)
            .arg(new)
            .stdout(Stdio::from(out_file))
            .stderr(Stdio::null());

        // Exit status 1 just means "differences found"; the output file is
        // parsed regardless, as a misbehaving command yields zero hunks.
        let status = cmd.status().map_err(|e| {
            ComputeError::ComputationFailed(format!(
                "cannot run diff command {:?}: {e}",
                self.command
            ))
        })?;
        if status.code().map_or(true, |c| c > 1) {
            debug!(command = %self.command, ?status, "diff command reported trouble");
        }
        Ok(())
    }
}

/// Write one document snapshot with canonical `\n` line endings, regardless
/// of the document's own line-ending convention.
fn write_snapshot(path: &Path, lines: &[String]) -> ComputeResult<()> {
    let mut text = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        text.push_str(line.strip_suffix('\r').unwrap_or(line));
        text.push('\n');
    }
    fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nway_types::Hunk;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn callback_output_is_parsed() {
        let external = ExternalDiff::with_callback(Arc::new(|_orig, _new, out| {
            fs::write(out, "2c2\n< y\n---\n> Y\n")
        }));
        let hunks = external
            .diff(
                &lines(&["x", "y", "z"]),
                &lines(&["x", "Y", "z"]),
                &DiffOptions::default(),
            )
            .unwrap();
        assert_eq!(hunks, vec![Hunk::new(2, 1, 2, 1)]);
    }

    #[test]
    fn callback_sees_snapshot_files() {
        let external = ExternalDiff::with_callback(Arc::new(|orig, new, out| {
            assert_eq!(fs::read_to_string(orig)?, "a\nb\n");
            assert_eq!(fs::read_to_string(new)?, "a\nc\n");
            fs::write(out, "")
        }));
        let hunks = external
            .diff(&lines(&["a", "b"]), &lines(&["a", "c"]), &DiffOptions::default())
            .unwrap();
        assert!(hunks.is_empty());
    }

    #[test]
    fn callback_failure_is_computation_failed() {
        let external = ExternalDiff::with_callback(Arc::new(|_, _, _| {
            Err(io::Error::other("scripted failure"))
        }));
        let err = external
            .diff(&lines(&["a"]), &lines(&["b"]), &DiffOptions::default())
            .unwrap_err();
        assert!(matches!(err, ComputeError::ComputationFailed(_)));
    }

    #[test]
    fn probe_failure_is_computation_failed() {
        let external = ExternalDiff::new("/nonexistent/definitely-not-a-diff");
        let err = external
            .diff(&lines(&["a"]), &lines(&["b"]), &DiffOptions::default())
            .unwrap_err();
        assert!(matches!(err, ComputeError::ComputationFailed(_)));
    }

    #[test]
    fn snapshot_normalizes_line_endings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap");
        write_snapshot(&path, &lines(&["a\r", "b"])).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\n");
    }
}
