//! Child process supervision for external collaborators.
//!
//! Routing daemons, ping servers, and probes are plain child processes
//! with stdout/stderr redirected to per-process log files. The harness
//! never interprets their output beyond liveness; probes' stdout doubles
//! as the observation log the core collector reads back.

use std::fs::{self, File};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use thiserror::Error;

/// An external collaborator exited or could not be driven.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("{name} exited unexpectedly with {status}")]
    Exited {
        name: String,
        status: std::process::ExitStatus,
    },
    #[error("failed to spawn {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// A set of named child processes with a shared lifecycle.
#[derive(Debug, Default)]
pub struct ProcSet {
    children: Vec<(String, Child)>,
}

impl ProcSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `program args…` with stdout and stderr appended to
    /// `log_path` (parent directories are created as needed).
    pub fn spawn(
        &mut self,
        name: &str,
        program: &Path,
        args: &[&str],
        log_path: &Path,
    ) -> Result<(), ProcessError> {
        let spawn_err = |source| ProcessError::Spawn {
            name: name.to_string(),
            source,
        };

        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent).map_err(spawn_err)?;
        }
        let log = File::create(log_path).map_err(spawn_err)?;
        let err_log = log.try_clone().map_err(spawn_err)?;

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(err_log))
            .spawn()
            .map_err(spawn_err)?;

        tracing::debug!(name, pid = child.id(), "collaborator started");
        self.children.push((name.to_string(), child));
        Ok(())
    }

    /// Surface the first child that has exited. Collaborators are
    /// long-running; any exit during a run is a failure.
    pub fn check(&mut self) -> Result<(), ProcessError> {
        for (name, child) in &mut self.children {
            match child.try_wait() {
                Ok(Some(status)) => {
                    return Err(ProcessError::Exited {
                        name: name.clone(),
                        status,
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(name = %name, error = %e, "liveness check failed");
                }
            }
        }
        Ok(())
    }

    /// Kill and reap every child. Safe to call more than once.
    pub fn stop(&mut self) {
        for (name, mut child) in self.children.drain(..) {
            if child.kill().is_err() {
                tracing::debug!(name = %name, "kill failed, child already gone");
            }
            let _ = child.wait();
        }
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Drop for ProcSet {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Run `op` up to `attempts` times with a fixed pause between tries.
///
/// External tooling (namespace plumbing, qdisc updates) occasionally
/// fails transiently right after process churn.
pub fn with_retries<T>(
    label: &str,
    attempts: u32,
    backoff: Duration,
    mut op: impl FnMut() -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let mut last = None;
    for attempt in 1..=attempts {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::warn!(label, attempt, error = %format!("{e:#}"), "attempt failed");
                last = Some(e);
                if attempt < attempts {
                    std::thread::sleep(backoff);
                }
            }
        }
    }
    Err(last.unwrap_or_else(|| anyhow::anyhow!("{label}: no attempts made")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static LOG_SEQ: AtomicU32 = AtomicU32::new(0);

    fn scratch_log() -> std::path::PathBuf {
        let seq = LOG_SEQ.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("rb_proc_{}_{}.log", std::process::id(), seq))
    }

    #[test]
    fn short_lived_child_fails_the_liveness_check() {
        let log = scratch_log();
        let mut procs = ProcSet::new();
        procs
            .spawn("one-shot", Path::new("true"), &[], &log)
            .unwrap();

        // Give the process time to exit
        std::thread::sleep(Duration::from_millis(300));
        let err = procs.check().unwrap_err();
        assert!(matches!(err, ProcessError::Exited { name, .. } if name == "one-shot"));

        let _ = fs::remove_file(&log);
    }

    #[test]
    fn running_child_passes_and_stop_reaps_it() {
        let log = scratch_log();
        let mut procs = ProcSet::new();
        procs
            .spawn("sleeper", Path::new("sleep"), &["5"], &log)
            .unwrap();

        assert!(procs.check().is_ok());
        assert_eq!(procs.len(), 1);

        procs.stop();
        assert!(procs.is_empty());
        // Idempotent
        procs.stop();

        let _ = fs::remove_file(&log);
    }

    #[test]
    fn spawn_failure_names_the_collaborator() {
        let log = scratch_log();
        let mut procs = ProcSet::new();
        let err = procs
            .spawn(
                "ghost",
                Path::new("/nonexistent/routebench-test-binary"),
                &[],
                &log,
            )
            .unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { name, .. } if name == "ghost"));

        let _ = fs::remove_file(&log);
    }

    #[test]
    fn retries_stop_after_first_success() {
        let mut calls = 0u32;
        let result = with_retries("flaky", 5, Duration::ZERO, || {
            calls += 1;
            if calls < 3 {
                anyhow::bail!("not yet")
            }
            Ok(calls)
        });
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls, 3);
    }

    #[test]
    fn retries_surface_the_last_error_when_exhausted() {
        let mut calls = 0u32;
        let result: anyhow::Result<()> = with_retries("doomed", 3, Duration::ZERO, || {
            calls += 1;
            anyhow::bail!("failure {calls}")
        });
        assert_eq!(calls, 3);
        assert_eq!(result.unwrap_err().to_string(), "failure 3");
    }
}
