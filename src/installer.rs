use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use error_stack::{Report, ResultExt};
use tracing::{info, warn};

use crate::api::def::JdkBinaryApi;
use crate::archive::{self, ArchiveError, ArchiveKind};
use crate::config::InstallSettings;
use crate::download::ensure_archive;
use crate::error::{ESResult, JdklinkError, UserMessage};
use crate::lifecycle::Lifecycle;
use crate::probe::{self, FilenameError};
use crate::symlink::{self, LinkOutcome};
use crate::tui::{announce, note};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InstallOutcome {
    pub archive: PathBuf,
    /// Name of the unpacked JDK directory inside the install directory.
    pub jdk_dir_name: String,
    pub link: PathBuf,
    pub downloaded: bool,
    pub extracted: bool,
    pub link_outcome: LinkOutcome,
}

/// Runs the whole install: locate, download, inspect, extract, link. Every step is skipped if its
/// result is already on disk, so re-running with the same settings is cheap.
pub fn install(
    api: &impl JdkBinaryApi,
    settings: &InstallSettings,
    lifecycle: &mut Lifecycle,
) -> ESResult<InstallOutcome, JdklinkError> {
    let filename = locate_artifact(api, settings, lifecycle)?;
    info!("Latest JDK {} artifact is {}", settings.version, filename);

    let kind = ArchiveKind::from_file_name(&filename).ok_or_else(|| {
        Report::new(ArchiveError::UnknownFormat(filename.clone()))
            .change_context(JdklinkError::Archive)
    })?;

    let (archive, downloaded) =
        ensure_archive(api, &settings.version, &settings.install_dir, &filename)?;

    let jdk_dir_name = archive::top_level_dir(&archive, kind)
        .change_context(JdklinkError::Archive)
        .attach_with(|| format!("Failed to inspect {}", archive.display()))?;
    let jdk_dir = settings.install_dir.join(&jdk_dir_name);

    let extracted = if jdk_dir.is_dir() {
        note(format!(
            "{} already exists, not extracting over it",
            jdk_dir.display()
        ));
        false
    } else {
        announce(format!(
            "Extracting {} into {}",
            archive.display(),
            settings.install_dir.display()
        ));
        archive::extract(&archive, kind, &settings.install_dir)
            .change_context(JdklinkError::Archive)
            .attach_with(|| format!("Failed to extract {}", archive.display()))?;
        true
    };

    let link = settings.link_path();
    announce(format!("Linking {} -> {}", link.display(), jdk_dir_name));
    let link_outcome = symlink::point_link(&link, Path::new(&jdk_dir_name))
        .change_context(JdklinkError::Filesystem)?;
    match &link_outcome {
        LinkOutcome::Created => info!("Created {}", link.display()),
        LinkOutcome::Unchanged => note(format!("{} was already up to date", link.display())),
        LinkOutcome::Repointed { previous } => {
            info!("Moved {} off {}", link.display(), previous.display())
        }
    }

    Ok(InstallOutcome {
        archive,
        jdk_dir_name,
        link,
        downloaded,
        extracted,
        link_outcome,
    })
}

/// HEADs the binary URL, captures the response head in the probe file and reads the artifact
/// filename back out of it.
fn locate_artifact(
    api: &impl JdkBinaryApi,
    settings: &InstallSettings,
    lifecycle: &mut Lifecycle,
) -> ESResult<String, JdklinkError> {
    let url = api
        .binary_url(&settings.version)
        .change_context(JdklinkError::Transport)?;
    announce(format!("HEAD {}", url));
    let head = api
        .get_latest_jdk_head(&settings.version)
        .change_context(JdklinkError::Transport)
        .attach_with(|| format!("HEAD {}", url))?;

    let (file, probe_path) = lifecycle
        .create_probe_file(&settings.install_dir)
        .change_context(JdklinkError::Filesystem)
        .attach("Failed to create the probe file")?;
    let mut writer = BufWriter::new(file);
    probe::write_head(&head, &mut writer, true)
        .and_then(|()| writer.flush())
        .change_context(JdklinkError::Filesystem)
        .attach_with(|| format!("Failed to write {}", probe_path.display()))?;
    drop(writer);

    let captured = std::fs::read_to_string(&probe_path)
        .change_context(JdklinkError::Filesystem)
        .attach_with(|| format!("Failed to read {}", probe_path.display()))?;
    if !head.is_success() {
        warn!("API answered {}", head);
    }
    probe::extract_attachment_filename(&captured).map_err(|e| {
        let no_artifact = matches!(e, FilenameError::NoAttachment);
        let report = Report::new(e)
            .change_context(JdklinkError::Parse)
            .attach(format!("Response: {}", head));
        if no_artifact {
            report.attach_opaque(UserMessage {
                message: format!(
                    "No JDK {} binary is available from {} (answered {} {})",
                    settings.version, url, head.status, head.reason
                ),
            })
        } else {
            report
        }
    })
}
