use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SymlinkError {
    #[error("{} exists and is not a symbolic link", .0.display())]
    NotALink(PathBuf),
    #[error("failed to inspect {}", .path.display())]
    Inspect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to remove stale link {}", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to create link {} -> {}", .link.display(), .target.display())]
    Create {
        link: PathBuf,
        target: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum LinkState {
    Missing,
    /// Already points at the wanted target.
    Current,
    /// Points somewhere else.
    Stale(PathBuf),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum LinkOutcome {
    Created,
    Unchanged,
    Repointed { previous: PathBuf },
}

/// Name of the stable link for a major version, e.g. `jdk-17`.
pub fn link_name(version: &str) -> String {
    format!("jdk-{}", version)
}

pub fn link_state(link: &Path, target: &Path) -> Result<LinkState, SymlinkError> {
    let inspect = |source| SymlinkError::Inspect {
        path: link.to_path_buf(),
        source,
    };
    let metadata = match link.symlink_metadata() {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LinkState::Missing),
        Err(e) => return Err(inspect(e)),
    };
    if !metadata.file_type().is_symlink() {
        return Err(SymlinkError::NotALink(link.to_path_buf()));
    }
    let current = std::fs::read_link(link).map_err(inspect)?;
    if current == target {
        Ok(LinkState::Current)
    } else {
        Ok(LinkState::Stale(current))
    }
}

/// Makes `link` point at `target`. A link that is already correct is left alone, a stale one is
/// removed and recreated. Anything that is not a symlink is never touched.
pub fn point_link(link: &Path, target: &Path) -> Result<LinkOutcome, SymlinkError> {
    let outcome = match link_state(link, target)? {
        LinkState::Current => {
            debug!("{} already points to {}", link.display(), target.display());
            return Ok(LinkOutcome::Unchanged);
        }
        LinkState::Missing => LinkOutcome::Created,
        LinkState::Stale(previous) => {
            debug!(
                "Removing stale link {} -> {}",
                link.display(),
                previous.display()
            );
            std::fs::remove_file(link).map_err(|source| SymlinkError::Remove {
                path: link.to_path_buf(),
                source,
            })?;
            LinkOutcome::Repointed { previous }
        }
    };
    debug!(
        "Creating symlink from '{}' to '{}'",
        target.display(),
        link.display()
    );
    std::os::unix::fs::symlink(target, link).map_err(|source| SymlinkError::Create {
        link: link.to_path_buf(),
        target: target.to_path_buf(),
        source,
    })?;
    Ok(outcome)
}
