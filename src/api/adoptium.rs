use tracing::debug;
use url::Url;

use crate::api::def::{BinaryResponse, JdkBinaryApi, JdkFetchError, JdkFetchResult, ResponseHead};
use crate::api::http_failure::handle_response_fail;
use crate::http_client::new_http_client;

pub const ADOPTIUM_BASE_URL: &str = "https://api.adoptium.net/v3";

// Only Linux x64 hotspot builds from Eclipse are installed.
const OS: &str = "linux";
const ARCH: &str = "x64";
const IMAGE_TYPE: &str = "jdk";
const JVM_IMPL: &str = "hotspot";
const HEAP_SIZE: &str = "normal";
const VENDOR: &str = "eclipse";

pub struct AdoptiumApi {
    client: ureq::Agent,
    base_url: Url,
}

impl AdoptiumApi {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: new_http_client(),
            base_url,
        }
    }
}

impl JdkBinaryApi for AdoptiumApi {
    fn binary_url(&self, version: &str) -> JdkFetchResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| JdkFetchError::InvalidUrl {
                message: format!("{} cannot be a base URL", self.base_url),
            })?
            .pop_if_empty()
            .extend([
                "binary", "latest", version, "ga", OS, ARCH, IMAGE_TYPE, JVM_IMPL, HEAP_SIZE,
                VENDOR,
            ]);
        url.query_pairs_mut().clear().append_pair("project", "jdk");
        Ok(url)
    }

    fn get_latest_jdk_head(&self, version: &str) -> JdkFetchResult<ResponseHead> {
        let url = self.binary_url(version)?;
        debug!("Sending HEAD {}", url);
        let response = self.client.head(url.as_str()).call()?;
        Ok(response_head(&response))
    }

    fn get_latest_jdk_binary(&self, version: &str) -> JdkFetchResult<BinaryResponse> {
        let url = self.binary_url(version)?;
        debug!("Sending GET {}", url);
        let response = self.client.get(url.as_str()).call()?;
        if !response.status().is_success() {
            return Err(handle_response_fail(response, "Failed to get JDK binary"));
        }
        let head = response_head(&response);
        let content_length = response.body().content_length();
        Ok(BinaryResponse {
            head,
            content_length,
            body: Box::new(response.into_body().into_reader()),
        })
    }
}

fn response_head<B>(response: &ureq::http::Response<B>) -> ResponseHead {
    let status = response.status();
    ResponseHead {
        version: format!("{:?}", response.version()),
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or_default().to_string(),
        headers: response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
    }
}
