use std::fmt::Display;

use crate::api::def::JdkFetchError;

pub fn handle_response_fail(
    response: ureq::http::Response<ureq::Body>,
    message: impl Display,
) -> JdkFetchError {
    let status = response.status();
    match response.into_body().read_to_string() {
        Ok(upstream_error) => JdkFetchError::Upstream {
            message: format!("{}: {} ({})", message, status, upstream_error.trim()),
        },
        Err(error) => JdkFetchError::HttpIo(error),
    }
}
