use std::io;
use std::path::{Path, PathBuf};

use error_stack::{Report, ResultExt};
use tracing::{info, warn};

use crate::api::def::{BinaryResponse, JdkBinaryApi};
use crate::error::{ESResult, JdklinkError};
use crate::probe::{attachment_filename, validate_artifact_filename, CONTENT_DISPOSITION};
use crate::progress::download_progress;
use crate::tui::{announce, note};

/// Makes sure `dir/filename` exists, downloading the latest binary for `version` if it doesn't.
/// Returns the archive path and whether it was downloaded by this call.
pub fn ensure_archive(
    api: &impl JdkBinaryApi,
    version: &str,
    dir: &Path,
    filename: &str,
) -> ESResult<(PathBuf, bool), JdklinkError> {
    let path = dir.join(filename);
    let downloaded = if path.exists() {
        note(format!(
            "{} is already downloaded, skipping download",
            path.display()
        ));
        false
    } else {
        let url = api
            .binary_url(version)
            .change_context(JdklinkError::Transport)?;
        announce(format!("GET {}", url));
        let response = api
            .get_latest_jdk_binary(version)
            .change_context(JdklinkError::Transport)
            .attach_with(|| format!("GET {}", url))?;
        let saved = save_binary(response, dir)?;
        if saved != path {
            warn!(
                "Server named the download {}, expected {}",
                saved.display(),
                path.display()
            );
        }
        true
    };

    let metadata = std::fs::metadata(&path)
        .change_context(JdklinkError::Filesystem)
        .attach_with(|| format!("Archive {} is missing", path.display()))?;
    if !metadata.is_file() {
        return Err(Report::new(JdklinkError::Filesystem)
            .attach(format!("{} is not a regular file", path.display())));
    }
    eprintln!("{} ({} bytes)", path.display(), metadata.len());
    Ok((path, downloaded))
}

/// Streams the body into `dir`, under the name from the response's own `Content-Disposition`.
/// The file only appears under that name once the body was read completely.
fn save_binary(mut response: BinaryResponse, dir: &Path) -> ESResult<PathBuf, JdklinkError> {
    let header = response
        .head
        .header(CONTENT_DISPOSITION)
        .ok_or_else(|| {
            Report::new(JdklinkError::Parse)
                .attach("Download response has no Content-Disposition header")
        })?;
    let filename = attachment_filename(header)
        .change_context(JdklinkError::Parse)
        .attach_with(|| format!("Content-Disposition: {}", header))?
        .ok_or_else(|| {
            Report::new(JdklinkError::Parse)
                .attach(format!("Not an attachment with a filename: {}", header))
        })?;
    let filename = validate_artifact_filename(filename).change_context(JdklinkError::Parse)?;
    let target = dir.join(&filename);

    let mut partial = tempfile::Builder::new()
        .prefix(".jdklink-download-")
        .tempfile_in(dir)
        .change_context(JdklinkError::Filesystem)
        .attach_with(|| format!("Failed to create a temporary file in {}", dir.display()))?;

    let bar = download_progress(response.content_length, &filename);
    let copied = io::copy(&mut response.body, &mut bar.wrap_write(partial.as_file_mut()))
        .change_context(JdklinkError::Transport)
        .attach_with(|| format!("Failed to download {}", filename))?;
    bar.finish_and_clear();
    info!("Downloaded {} bytes", copied);

    if let Some(expected) = response.content_length {
        if copied != expected {
            return Err(Report::new(JdklinkError::Transport).attach(format!(
                "Download of {} ended after {} of {} bytes",
                filename, copied, expected
            )));
        }
    }

    partial
        .persist(&target)
        .change_context(JdklinkError::Filesystem)
        .attach_with(|| format!("Failed to move download to {}", target.display()))?;
    Ok(target)
}
