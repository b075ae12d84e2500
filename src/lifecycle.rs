//! Run-scoped cleanup and the final status line.
//!
//! A [`Lifecycle`] is created before anything else happens and finished exactly once on the way
//! out, whichever way that is. It owns every temporary file of the run.

use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use derive_more::Display;
use itertools::Itertools;
use owo_colors::{OwoColorize, Stream};
use tempfile::TempPath;
use tracing::{debug, warn};

/// Exit code reported when the run ends by unwinding instead of through [`Lifecycle::finish`].
const PANIC_EXIT_CODE: i32 = 101;

#[derive(Debug, Display, Clone, Copy, Eq, PartialEq)]
pub enum Severity {
    #[display("INFO")]
    Info,
    #[display("ERROR")]
    Error,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StatusLine {
    pub severity: Severity,
    pub user: String,
    pub host: String,
    pub exit_code: i32,
    pub invocation: String,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}@{} exit={} {}",
            self.severity, self.user, self.host, self.exit_code, self.invocation
        )
    }
}

pub struct Lifecycle {
    invocation: Vec<String>,
    probe: Option<TempPath>,
    finished: bool,
}

impl Lifecycle {
    /// `invocation` is the program name followed by all original arguments.
    pub fn register(invocation: impl IntoIterator<Item = String>) -> Self {
        Self {
            invocation: invocation.into_iter().collect(),
            probe: None,
            finished: false,
        }
    }

    /// Creates the probe file inside `dir`. Any previous probe file is removed first.
    pub fn create_probe_file(&mut self, dir: &Path) -> io::Result<(File, PathBuf)> {
        self.remove_probe();
        let (file, path) = tempfile::Builder::new()
            .prefix(".jdklink-probe-")
            .suffix(".headers")
            .tempfile_in(dir)?
            .into_parts();
        debug!("Created probe file {}", path.display());
        let owned = path.to_path_buf();
        self.probe = Some(path);
        Ok((file, owned))
    }

    #[cfg(test)]
    pub fn probe_path(&self) -> Option<&Path> {
        self.probe.as_deref()
    }

    /// Removes temporary files and prints the status line. Safe to call more than once: cleanup
    /// is repeated (and finds nothing), the line is only printed the first time.
    pub fn finish(&mut self, exit_code: i32) -> StatusLine {
        self.remove_probe();
        let line = self.status_line(exit_code);
        if !self.finished {
            self.finished = true;
            match line.severity {
                Severity::Info => eprintln!(
                    "{}",
                    line.if_supports_color(Stream::Stderr, |s| s.green())
                ),
                Severity::Error => {
                    eprintln!("{}", line.if_supports_color(Stream::Stderr, |s| s.red()))
                }
            }
        }
        line
    }

    pub fn status_line(&self, exit_code: i32) -> StatusLine {
        StatusLine {
            severity: if exit_code == 0 {
                Severity::Info
            } else {
                Severity::Error
            },
            user: current_user(),
            host: current_host(),
            exit_code,
            invocation: self.invocation.iter().join(" "),
        }
    }

    fn remove_probe(&mut self) {
        let Some(probe) = self.probe.take() else {
            return;
        };
        if !probe.exists() {
            debug!("Probe file {} is already gone", probe.display());
            // Nothing left to delete; don't let the drop try again.
            let _ = probe.keep();
            return;
        }
        debug!("Removing probe file {}", probe.display());
        let path = probe.to_path_buf();
        if let Err(e) = probe.close() {
            warn!("Failed to remove probe file {}: {}", path.display(), e);
        }
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        if !self.finished {
            let code = if std::thread::panicking() {
                PANIC_EXIT_CODE
            } else {
                0
            };
            self.finish(code);
        }
    }
}

fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

fn current_host() -> String {
    ["/proc/sys/kernel/hostname", "/etc/hostname"]
        .iter()
        .find_map(|path| {
            std::fs::read_to_string(path)
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| "unknown".to_string())
}
