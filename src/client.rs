//! The HTTP client shared by every LinkedIn API call
use std::sync::Arc;

use log::debug;
use once_cell::sync::Lazy;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use crate::{
    auth::{get_token, TokenProvider},
    config::ClientConfig,
    error::{LinkedInError, Result},
};

static GLOBAL_CLIENT: Lazy<Client> = Lazy::new(Client::new);

/// A client for the LinkedIn v2 REST API
///
/// Without a token provider the client reads the access token from the
/// `LINKEDIN_ACCESS_TOKEN` environment variable on every request.  Applications
/// that manage tokens themselves should supply a [`TokenProvider`].
///
/// The client holds no per-request state, so one instance can serve any number
/// of concurrent uploads.
#[derive(Debug, Clone)]
pub struct LinkedInClient {
    /// A token provider to use to obtain a token to authenticate with the API
    token_provider: Option<Arc<dyn TokenProvider>>,
    /// Where requests are sent
    config: ClientConfig,
    /// The transport, shared with every other client unless replaced
    http_client: Client,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

impl Default for LinkedInClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkedInClient {
    /// Creates a new client that authenticates with `LINKEDIN_ACCESS_TOKEN`
    pub fn new() -> Self {
        Self {
            token_provider: None,
            config: ClientConfig::from_env(),
            http_client: GLOBAL_CLIENT.clone(),
        }
    }

    /// Creates a new client that asks `token_provider` for access tokens
    pub fn with_token_provider(token_provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            token_provider: Some(token_provider),
            ..Self::new()
        }
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the shared transport, e.g. to configure proxies or TLS
    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_client = http_client;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub(crate) fn get_api_url(&self, resource: &str) -> String {
        self.config.resource_url(resource)
    }

    pub(crate) fn add_format_header(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("x-li-format", "json")
    }

    pub(crate) async fn add_authorization_header(
        &self,
        request: RequestBuilder,
        operation: &str,
    ) -> Result<RequestBuilder> {
        let token = get_token(self.token_provider.as_deref(), operation).await?;
        Ok(request.bearer_auth(token))
    }

    pub(crate) async fn handle_error(response: Response) -> LinkedInError {
        let status = response.status();
        debug!("{} answered {}", response.url(), status);
        match status {
            StatusCode::UNAUTHORIZED => return LinkedInError::Unauthorized(),
            StatusCode::FORBIDDEN => return LinkedInError::Forbidden(),
            StatusCode::NOT_FOUND => return LinkedInError::NotFound(),
            StatusCode::TOO_MANY_REQUESTS => return LinkedInError::TooManyRequests(),
            _ => {}
        }
        if status.is_server_error() {
            return LinkedInError::unknown_error(status);
        }
        match response.json::<ApiErrorBody>().await {
            Ok(ApiErrorBody {
                message: Some(message),
            }) if status == StatusCode::BAD_REQUEST => LinkedInError::BadRequest(message),
            Ok(ApiErrorBody {
                message: Some(message),
            }) => LinkedInError::UnknownError(status.as_u16(), message),
            _ => LinkedInError::unknown_error(status),
        }
    }
}

/// Returns the id at the end of a URN, e.g. `C5522AQHn46pwH96hxQ` for
/// `urn:li:digitalmediaAsset:C5522AQHn46pwH96hxQ`.  Plain ids are returned as is.
pub fn urn_to_id(urn: &str) -> &str {
    urn.rsplit(':').next().unwrap_or(urn)
}

/// Builds a URN such as `urn:li:person:12345` from a resource type and an id
pub fn id_to_urn(resource: &str, id: &str) -> String {
    ["urn", "li", resource, id].join(":")
}

#[cfg(test)]
mod tests {
    use std::env;

    use serial_test::serial;

    use super::*;
    use crate::auth::StaticTokenProvider;

    #[test]
    fn converts_between_urns_and_ids() {
        assert_eq!(urn_to_id("urn:li:digitalmediaAsset:ABC"), "ABC");
        assert_eq!(urn_to_id("ABC"), "ABC");
        assert_eq!(id_to_urn("person", "12345"), "urn:li:person:12345");
    }

    #[test]
    #[serial]
    fn picks_up_config_from_env() {
        env::set_var("LINKEDIN_API_URL", "http://localhost:4010");
        let client = LinkedInClient::new();
        env::remove_var("LINKEDIN_API_URL");

        assert_eq!(
            client.get_api_url("/assets/ABC"),
            "http://localhost:4010/v2/assets/ABC"
        );
    }

    async fn error_for(status: usize, body: &str) -> LinkedInError {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;
        let response = Client::new().get(server.url()).send().await.unwrap();
        LinkedInClient::handle_error(response).await
    }

    #[tokio::test]
    async fn classifies_api_errors() {
        assert!(matches!(
            error_for(401, r#"{"serviceErrorCode":65600,"message":"Invalid access token","status":401}"#).await,
            LinkedInError::Unauthorized()
        ));
        assert!(matches!(error_for(403, "{}").await, LinkedInError::Forbidden()));
        assert!(matches!(error_for(429, "{}").await, LinkedInError::TooManyRequests()));
        assert!(matches!(
            error_for(400, r#"{"message":"owner is invalid","status":400}"#).await,
            LinkedInError::BadRequest(msg) if msg == "owner is invalid"
        ));
        assert!(matches!(
            error_for(503, "not json").await,
            LinkedInError::UnknownError(503, _)
        ));
    }

    #[tokio::test]
    async fn attaches_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_header("authorization", "Bearer abc")
            .match_header("x-li-format", "json")
            .with_status(200)
            .create_async()
            .await;

        let client = LinkedInClient::with_token_provider(Arc::new(
            StaticTokenProvider::new("abc").unwrap(),
        ));
        let request = client.add_format_header(client.http_client().get(server.url()));
        let request = client
            .add_authorization_header(request, "status")
            .await
            .unwrap();
        request.send().await.unwrap();

        mock.assert_async().await;
    }
}
