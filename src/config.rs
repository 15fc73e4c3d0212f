//! Client configuration
use std::env;
use std::time::Duration;

/// The public LinkedIn REST origin
pub const DEFAULT_API_URL: &str = "https://api.linkedin.com";
/// The version path prepended to every REST resource
pub const DEFAULT_API_VERSION: &str = "/v2";
/// Bounds a single API call that has no deadline of its own
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the client sends its requests.
///
/// The configuration is fixed when the client is built and never changes
/// afterwards.  Overriding the origin is mostly useful for testing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// The API origin, e.g. `https://api.linkedin.com`
    pub api_url: String,
    /// The version path, e.g. `/v2`
    pub api_version: String,
    /// Bounds a registration or status call made outside of [`upload`]
    ///
    /// [`upload`]: crate::assets::AssetsApi::upload
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Reads `LINKEDIN_API_URL` and `LINKEDIN_API_VERSION`, falling back to the defaults
    pub fn from_env() -> Self {
        Self {
            api_url: env::var("LINKEDIN_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            api_version: env::var("LINKEDIN_API_VERSION")
                .map(|version| normalize_version(&version))
                .unwrap_or_else(|_| DEFAULT_API_VERSION.to_string()),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Joins the origin, the version path and a resource path
    pub fn resource_url(&self, resource: &str) -> String {
        url_join(url_join(self.api_url.clone(), self.api_version.clone()), resource.to_string())
    }
}

fn normalize_version(version: &str) -> String {
    if version.starts_with('/') {
        version.to_string()
    } else {
        format!("/{version}")
    }
}

pub(crate) fn url_join(left: String, right: String) -> String {
    if right.is_empty() {
        left
    } else if left.ends_with('/') {
        if let Some(stripped) = right.strip_prefix('/') {
            left + stripped
        } else {
            left + &right
        }
    } else if right.starts_with('/') {
        left + &right
    } else {
        left + "/" + &right
    }
}
