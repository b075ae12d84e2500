use std::fmt;
use std::io::Read;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum JdkFetchError {
    #[error("error in HTTP I/O")]
    HttpIo(#[from] ureq::Error),
    #[error("error from upstream: {message}")]
    Upstream { message: String },
    #[error("cannot build API URL: {message}")]
    InvalidUrl { message: String },
}

pub type JdkFetchResult<T> = Result<T, JdkFetchError>;

/// Status line and headers of a response, in the order the server sent them.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResponseHead {
    /// Protocol version, e.g. `HTTP/1.1`.
    pub version: String,
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
}

impl ResponseHead {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First value of the header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for ResponseHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.version, self.status, self.reason)
    }
}

/// A successful binary response whose body has not been read yet.
pub struct BinaryResponse {
    pub head: ResponseHead,
    pub content_length: Option<u64>,
    pub body: Box<dyn Read>,
}

pub trait JdkBinaryApi {
    /// The URL serving the latest GA binary for the `version` major release.
    fn binary_url(&self, version: &str) -> JdkFetchResult<Url>;

    /// Fetch only the headers of the binary response, following redirects.
    /// Non-success statuses are returned, not treated as errors.
    fn get_latest_jdk_head(&self, version: &str) -> JdkFetchResult<ResponseHead>;

    /// Start downloading the binary. Fails if the final response is not a success.
    fn get_latest_jdk_binary(&self, version: &str) -> JdkFetchResult<BinaryResponse>;
}
