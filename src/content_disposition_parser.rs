//! Parser for `Content-Disposition` header values (RFC 6266).
//!
//! Only the disposition type and the `filename` / `filename*` parameters are kept, everything else
//! is parsed for well-formedness and dropped.

use thiserror::Error;

const FILENAME: &str = "filename";
const FILENAME_EXT: &str = "filename*";

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ContentDisposition {
    /// Disposition type, lowercased.
    pub disposition: String,
    /// `filename*` if present and decodable, otherwise `filename`.
    pub filename: Option<String>,
}

impl ContentDisposition {
    pub fn is_attachment(&self) -> bool {
        self.disposition == "attachment"
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ContentDispositionError {
    #[error("missing disposition type")]
    MissingType,
    #[error("not a valid token: {0:?}")]
    InvalidToken(String),
    #[error("unterminated quoted string")]
    UnterminatedQuote,
    #[error("parameter {0:?} has no value")]
    MissingValue(String),
    #[error("expected ';' before {0:?}")]
    ExpectedSeparator(String),
    #[error("unsupported extended parameter value: {0:?}")]
    UnsupportedExtValue(String),
}

pub fn parse(header: &str) -> Result<ContentDisposition, ContentDispositionError> {
    let mut cursor = Cursor {
        rest: header.trim(),
    };
    let disposition = cursor.take_until(&[';']).trim_end();
    if disposition.is_empty() {
        return Err(ContentDispositionError::MissingType);
    }
    check_token(disposition)?;

    let mut filename = None;
    let mut filename_ext = None;
    loop {
        cursor.skip_ws();
        if cursor.rest.is_empty() {
            break;
        }
        if !cursor.eat(';') {
            return Err(ContentDispositionError::ExpectedSeparator(
                cursor.rest.to_string(),
            ));
        }
        cursor.skip_ws();
        if cursor.rest.is_empty() {
            // Trailing separators are common enough to accept.
            break;
        }
        let name = cursor.take_until(&['=', ';']).trim_end();
        check_token(name)?;
        if !cursor.eat('=') {
            return Err(ContentDispositionError::MissingValue(name.to_string()));
        }
        cursor.skip_ws();
        let value = if cursor.eat('"') {
            cursor.quoted()?
        } else {
            let value = cursor.take_until(&[';']).trim_end();
            check_token(value)?;
            value.to_string()
        };
        let name = name.to_ascii_lowercase();
        if name == FILENAME {
            filename.get_or_insert(value);
        } else if name == FILENAME_EXT {
            filename_ext.get_or_insert(decode_ext_value(&value)?);
        }
    }

    Ok(ContentDisposition {
        disposition: disposition.to_ascii_lowercase(),
        filename: filename_ext.or(filename),
    })
}

struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start_matches([' ', '\t']);
    }

    fn eat(&mut self, c: char) -> bool {
        match self.rest.strip_prefix(c) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn take_until(&mut self, stop: &[char]) -> &'a str {
        let end = self.rest.find(stop).unwrap_or(self.rest.len());
        let (taken, rest) = self.rest.split_at(end);
        self.rest = rest;
        taken
    }

    /// Reads the remainder of a quoted string, the opening quote already consumed.
    fn quoted(&mut self) -> Result<String, ContentDispositionError> {
        let rest = self.rest;
        let mut out = String::new();
        let mut chars = rest.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.rest = &rest[i + 1..];
                    return Ok(out);
                }
                '\\' => match chars.next() {
                    Some((_, escaped)) => out.push(escaped),
                    None => break,
                },
                c => out.push(c),
            }
        }
        Err(ContentDispositionError::UnterminatedQuote)
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

fn check_token(value: &str) -> Result<(), ContentDispositionError> {
    if value.is_empty() || !value.chars().all(is_token_char) {
        return Err(ContentDispositionError::InvalidToken(value.to_string()));
    }
    Ok(())
}

/// Decodes an RFC 5987 `charset'language'value`. Only UTF-8 is supported.
fn decode_ext_value(value: &str) -> Result<String, ContentDispositionError> {
    let unsupported = || ContentDispositionError::UnsupportedExtValue(value.to_string());
    let mut parts = value.splitn(3, '\'');
    let (Some(charset), Some(_language), Some(encoded)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(unsupported());
    };
    if !charset.eq_ignore_ascii_case("utf-8") {
        return Err(unsupported());
    }
    percent_decode(encoded).ok_or_else(unsupported)
}

fn percent_decode(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = value.get(i + 1..i + 3)?;
            if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod test {
    use super::*;

    fn filename_of(header: &str) -> Option<String> {
        parse(header).unwrap().filename
    }

    #[test]
    fn test_token_filename() {
        let cd = parse("attachment; filename=OpenJDK8U-jdk_x64_linux_hotspot_8u312b07.tar.gz")
            .unwrap();
        assert!(cd.is_attachment());
        assert_eq!(
            Some("OpenJDK8U-jdk_x64_linux_hotspot_8u312b07.tar.gz".to_string()),
            cd.filename
        );
    }

    #[test]
    fn test_quoted_filename() {
        assert_eq!(
            Some("my \"jdk\"; build.zip".to_string()),
            filename_of(r#"attachment; filename="my \"jdk\"; build.zip""#)
        );
    }

    #[test]
    fn test_case_and_whitespace() {
        let cd = parse("  Attachment ;FileName = jdk.tar.gz ;\r\n").unwrap();
        assert!(cd.is_attachment());
        assert_eq!(Some("jdk.tar.gz".to_string()), cd.filename);
    }

    #[test]
    fn test_inline_without_filename() {
        let cd = parse("inline").unwrap();
        assert!(!cd.is_attachment());
        assert_eq!(None, cd.filename);
    }

    #[test]
    fn test_extended_filename_preferred() {
        assert_eq!(
            Some("jdk €.tar.gz".to_string()),
            filename_of("attachment; filename=jdk.tar.gz; filename*=UTF-8''jdk%20%E2%82%AC.tar.gz")
        );
    }

    #[test]
    fn test_unsupported_charset() {
        assert_eq!(
            Err(ContentDispositionError::UnsupportedExtValue(
                "ISO-8859-1'en'jdk%A3.tar.gz".to_string()
            )),
            parse("attachment; filename*=ISO-8859-1'en'jdk%A3.tar.gz")
        );
    }

    #[test]
    fn test_percent_escape_needs_two_hex_digits() {
        for value in ["UTF-8''a%+1.zip", "UTF-8''a%-1.zip", "UTF-8''a%4.zip", "UTF-8''a%zz.zip"] {
            assert_eq!(
                Err(ContentDispositionError::UnsupportedExtValue(value.to_string())),
                parse(&format!("attachment; filename*={}", value)),
                "{}",
                value
            );
        }
        assert_eq!(
            Some("a+b.zip".to_string()),
            filename_of("attachment; filename*=utf-8''a%2Bb.zip")
        );
    }

    #[test]
    fn test_malformed() {
        assert_eq!(Err(ContentDispositionError::MissingType), parse("; filename=a"));
        assert_eq!(
            Err(ContentDispositionError::UnterminatedQuote),
            parse("attachment; filename=\"a.tar.gz")
        );
        assert_eq!(
            Err(ContentDispositionError::MissingValue("filename".to_string())),
            parse("attachment; filename")
        );
        assert_eq!(
            Err(ContentDispositionError::InvalidToken("a b.zip".to_string())),
            parse("attachment; filename=a b.zip")
        );
    }
}
