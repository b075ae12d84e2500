use crate::error::{ESResult, JdklinkError, UserMessage};
use crate::symlink::link_name;
use error_stack::{Report, ResultExt};
use std::path::PathBuf;
use url::Url;

/// Everything a run needs, validated. Built from the command line only.
#[derive(Debug, Clone)]
pub struct InstallSettings {
    /// Directory that receives the archive, the unpacked JDK and the link.
    pub install_dir: PathBuf,
    /// Major version, passed to the API as-is.
    pub version: String,
    pub api_base_url: Url,
}

impl InstallSettings {
    pub fn new(
        install_dir: PathBuf,
        version: String,
        api_base_url: Url,
    ) -> ESResult<InstallSettings, JdklinkError> {
        if api_base_url.scheme() != "https" {
            return Err(Report::new(JdklinkError::Usage).attach_opaque(UserMessage {
                message: format!("API base URL must use https: {}", api_base_url),
            }));
        }
        let metadata = std::fs::metadata(&install_dir)
            .change_context(JdklinkError::Filesystem)
            .attach_opaque(UserMessage {
                message: format!(
                    "Install directory {} is not accessible",
                    install_dir.display()
                ),
            })?;
        if !metadata.is_dir() {
            return Err(
                Report::new(JdklinkError::Filesystem).attach_opaque(UserMessage {
                    message: format!("{} is not a directory", install_dir.display()),
                }),
            );
        }
        Ok(InstallSettings {
            install_dir,
            version,
            api_base_url,
        })
    }

    pub fn link_path(&self) -> PathBuf {
        self.install_dir.join(link_name(&self.version))
    }
}
