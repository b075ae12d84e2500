//! Inspecting and unpacking downloaded JDK archives.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::io::BufReader;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Component, Path, PathBuf};

use console::Term;
use derive_more::Display;
use flate2::read::GzDecoder;
use thiserror::Error;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

#[derive(Debug, Display, Clone, Copy, Eq, PartialEq)]
pub enum ArchiveKind {
    #[display("tar.gz")]
    TarGz,
    #[display("zip")]
    Zip,
}

impl ArchiveKind {
    pub fn from_file_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveKind::TarGz)
        } else if name.ends_with(".zip") {
            Some(ArchiveKind::Zip)
        } else {
            None
        }
    }
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("don't know how to handle {0}")]
    UnknownFormat(String),
    #[error("failed to open {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to list archive entries")]
    ListEntries(#[source] io::Error),
    #[error("failed to read zip archive")]
    Zip(#[from] ZipError),
    #[error("failed to unpack {}", .0.display())]
    Unpack(PathBuf, #[source] io::Error),
    #[error("archive has no named entries")]
    Empty,
    #[error("archive entry {} escapes the target directory", .0.display())]
    PathLeft(PathBuf),
}

/// Name of the directory the archive unpacks into, taken from the first named entry. Entries are
/// read lazily and reading stops there.
pub fn top_level_dir(archive: &Path, kind: ArchiveKind) -> Result<String, ArchiveError> {
    let file = open(archive)?;
    match kind {
        ArchiveKind::TarGz => {
            let mut tar = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
            for entry in tar.entries().map_err(ArchiveError::ListEntries)? {
                let entry = entry.map_err(ArchiveError::ListEntries)?;
                let path = entry.path().map_err(ArchiveError::ListEntries)?;
                if let Some(top) = top_level_of(&path) {
                    return top;
                }
            }
        }
        ArchiveKind::Zip => {
            let mut zip = ZipArchive::new(BufReader::new(file))?;
            for i in 0..zip.len() {
                let entry = zip.by_index_raw(i)?;
                if let Some(top) = top_level_of(Path::new(entry.name())) {
                    return top;
                }
            }
        }
    }
    Err(ArchiveError::Empty)
}

/// First normal component of an entry path. `None` for entries like `./`.
fn top_level_of(path: &Path) -> Option<Result<String, ArchiveError>> {
    for component in path.components() {
        match component {
            Component::CurDir => continue,
            Component::Normal(name) => return Some(Ok(name.to_string_lossy().into_owned())),
            _ => return Some(Err(ArchiveError::PathLeft(path.to_path_buf()))),
        }
    }
    None
}

/// Unpacks the whole archive into `dest`.
pub fn extract(archive: &Path, kind: ArchiveKind, dest: &Path) -> Result<(), ArchiveError> {
    let file = open(archive)?;
    match kind {
        ArchiveKind::TarGz => unarchive_tar_gz(file, dest),
        ArchiveKind::Zip => unarchive_zip(file, dest),
    }
}

/// Single refreshed stderr line naming the entry being extracted. Silent when stderr is not a
/// terminal.
struct LiveLine {
    term: Term,
}

impl LiveLine {
    fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    fn show(&self, path: &Path) {
        if self.term.is_term() {
            let _ = self.term.clear_line();
            let _ = self.term.write_str(&format!("Extracting {}", path.display()));
        }
    }

    fn clear(&self) {
        if self.term.is_term() {
            let _ = self.term.clear_line();
        }
    }
}

fn unarchive_tar_gz(file: File, dest: &Path) -> Result<(), ArchiveError> {
    let line = LiveLine::new();
    let mut tar = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    tar.set_preserve_permissions(true);
    tar.set_overwrite(true);
    for entry in tar.entries().map_err(ArchiveError::ListEntries)? {
        let mut entry = entry.map_err(ArchiveError::ListEntries)?;
        let path = entry
            .path()
            .map_err(ArchiveError::ListEntries)?
            .into_owned();
        line.show(&path);
        let contained = entry
            .unpack_in(dest)
            .map_err(|e| ArchiveError::Unpack(path.clone(), e))?;
        if !contained {
            return Err(ArchiveError::PathLeft(path));
        }
    }
    line.clear();
    debug!("Unpacked into {}", dest.display());
    Ok(())
}

fn unarchive_zip(file: File, dest: &Path) -> Result<(), ArchiveError> {
    let line = LiveLine::new();
    let mut zip = ZipArchive::new(BufReader::new(file))?;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let name = PathBuf::from(entry.name());
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| ArchiveError::PathLeft(name.clone()))?;
        line.show(&name);
        let unpack = |e: io::Error| ArchiveError::Unpack(name.clone(), e);
        let target = dest.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(unpack)?;
            continue;
        }
        if !entry.is_file() {
            debug!("Skipping {}, not a regular file", name.display());
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(unpack)?;
        }
        let mut options = OpenOptions::new();
        options.create(true).write(true).truncate(true);
        if let Some(mode) = entry.unix_mode() {
            options.mode(mode);
        }
        let mut out = options.open(&target).map_err(unpack)?;
        io::copy(&mut entry, &mut out).map_err(unpack)?;
    }
    line.clear();
    debug!("Unpacked into {}", dest.display());
    Ok(())
}

fn open(archive: &Path) -> Result<File, ArchiveError> {
    File::open(archive).map_err(|source| ArchiveError::Open {
        path: archive.to_path_buf(),
        source,
    })
}
