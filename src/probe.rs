//! Capturing the head of the binary response and recovering the artifact filename from it.

use std::io;
use std::io::Write;

use thiserror::Error;
use tracing::debug;

use crate::api::def::ResponseHead;
use crate::content_disposition_parser::{self, ContentDispositionError};

pub const CONTENT_DISPOSITION: &str = "content-disposition";

#[derive(Debug, Error)]
pub enum FilenameError {
    #[error("no content-disposition attachment header with a filename")]
    NoAttachment,
    #[error("malformed content-disposition header")]
    Malformed(#[source] ContentDispositionError),
    #[error("refusing artifact filename {0:?}")]
    Unsafe(String),
}

/// Writes the status line and headers the way they came over the wire, CRLF terminated.
/// With `echo`, every line is also printed to stderr as it is written.
pub fn write_head(head: &ResponseHead, out: &mut impl Write, echo: bool) -> io::Result<()> {
    let mut write_line = |line: String| -> io::Result<()> {
        if echo {
            eprintln!("{}", line);
        }
        write!(out, "{}\r\n", line)
    };
    write_line(head.to_string())?;
    for (name, value) in &head.headers {
        write_line(format!("{}: {}", name, value))?;
    }
    write!(out, "\r\n")
}

/// Finds the first `Content-Disposition: attachment` header line in a captured header block and
/// returns its filename.
pub fn extract_attachment_filename(header_block: &str) -> Result<String, FilenameError> {
    let mut malformed = None;
    for line in header_block.lines() {
        let line = line.trim_end_matches('\r');
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case(CONTENT_DISPOSITION) {
            continue;
        }
        match attachment_filename(value) {
            Ok(Some(filename)) => return validate_artifact_filename(filename),
            Ok(None) => debug!("Ignoring non-attachment header: {}", line),
            Err(e) => {
                debug!("Ignoring malformed header {:?}: {}", line, e);
                malformed.get_or_insert(e);
            }
        }
    }
    Err(malformed.map_or(FilenameError::NoAttachment, FilenameError::Malformed))
}

/// The filename of a `Content-Disposition` value, if it is an attachment that names one.
pub fn attachment_filename(value: &str) -> Result<Option<String>, ContentDispositionError> {
    let disposition = content_disposition_parser::parse(value)?;
    Ok(disposition
        .is_attachment()
        .then_some(disposition.filename)
        .flatten())
}

/// Server-supplied names end up as paths in the install directory, so only plain file names made
/// of a conservative character set are accepted.
pub fn validate_artifact_filename(filename: String) -> Result<String, FilenameError> {
    let plain = !filename.is_empty()
        && !filename.starts_with(['.', '-'])
        && filename
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._+-".contains(c));
    if plain {
        Ok(filename)
    } else {
        Err(FilenameError::Unsafe(filename))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const JDK8_NAME: &str = "OpenJDK8U-jdk_x64_linux_hotspot_8u312b07.tar.gz";

    fn head(headers: &[(&str, &str)]) -> ResponseHead {
        ResponseHead {
            version: "HTTP/1.1".to_string(),
            status: 200,
            reason: "OK".to_string(),
            headers: headers
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_write_head() {
        let mut out = Vec::new();
        write_head(
            &head(&[("content-type", "application/octet-stream"), ("x-a", "b")]),
            &mut out,
            false,
        )
        .unwrap();
        assert_eq!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/octet-stream\r\nx-a: b\r\n\r\n",
            String::from_utf8(out).unwrap()
        );
    }

    #[test]
    fn test_extract_from_captured_head() {
        let mut out = Vec::new();
        write_head(
            &head(&[
                ("content-type", "application/octet-stream"),
                (
                    "content-disposition",
                    &format!("attachment; filename={}", JDK8_NAME),
                ),
            ]),
            &mut out,
            false,
        )
        .unwrap();
        let captured = String::from_utf8(out).unwrap();
        assert_eq!(JDK8_NAME, extract_attachment_filename(&captured).unwrap());
    }

    #[test]
    fn test_extract_case_insensitive_and_stray_cr() {
        let block = format!(
            "HTTP/2 302\r\nlocation: https://example\r\n\r\nHTTP/2 200\r\nCONTENT-DISPOSITION: attachment; filename={}\r\r\n",
            JDK8_NAME
        );
        assert_eq!(JDK8_NAME, extract_attachment_filename(&block).unwrap());
    }

    #[test]
    fn test_extract_skips_inline() {
        let block = "Content-Disposition: inline; filename=page.html\r\n\
                     Content-Disposition: attachment; filename=jdk.zip\r\n";
        assert_eq!("jdk.zip", extract_attachment_filename(block).unwrap());
    }

    #[test]
    fn test_extract_missing() {
        let block = "HTTP/1.1 404 Not Found\r\ncontent-type: application/json\r\n\r\n";
        assert!(matches!(
            extract_attachment_filename(block),
            Err(FilenameError::NoAttachment)
        ));
    }

    #[test]
    fn test_extract_malformed_only() {
        let block = "content-disposition: attachment; filename=\"unterminated\r\n";
        assert!(matches!(
            extract_attachment_filename(block),
            Err(FilenameError::Malformed(
                ContentDispositionError::UnterminatedQuote
            ))
        ));
    }

    #[test]
    fn test_rejects_unsafe_names() {
        for name in ["../jdk.tar.gz", "a/b.tar.gz", ".hidden.tar.gz", "", "-rf.zip", "a b.zip"] {
            assert!(
                matches!(
                    validate_artifact_filename(name.to_string()),
                    Err(FilenameError::Unsafe(_))
                ),
                "{:?} was accepted",
                name
            );
        }
        assert_eq!(
            "OpenJDK17U-jdk_x64_linux_hotspot_17.0.9_9.tar.gz",
            validate_artifact_filename("OpenJDK17U-jdk_x64_linux_hotspot_17.0.9_9.tar.gz".into())
                .unwrap()
        );
    }

    #[test]
    fn test_quoted_traversal_rejected() {
        let block = "content-disposition: attachment; filename=\"../../etc/profile.tar.gz\"\r\n";
        assert!(matches!(
            extract_attachment_filename(block),
            Err(FilenameError::Unsafe(_))
        ));
    }
}
