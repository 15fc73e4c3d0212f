//! Authentication utilities for working with the API
use std::env;

use async_trait::async_trait;

use crate::error::{LinkedInError, Result};

/// Environment variable consulted when a client has no token provider
pub const ACCESS_TOKEN_ENV: &str = "LINKEDIN_ACCESS_TOKEN";

/// A trait for providing an OAuth2 bearer token to authenticate with the LinkedIn API.
///
/// Obtaining the token (the authorization code flow, refreshing) is left to the
/// application.  The provider is asked for a token before every request so an
/// implementation may hand out a freshly refreshed token when the old one expires.
///
/// The operation (e.g. registerUpload, upload, status) is provided in case the
/// application keeps different tokens for different scopes.
#[async_trait]
pub trait TokenProvider: std::fmt::Debug + Send + Sync {
    async fn get_token(&self, operation: &str) -> Result<String>;
}

pub(crate) async fn get_token(provider: Option<&dyn TokenProvider>, operation: &str) -> Result<String> {
    if let Some(provider) = provider {
        provider.get_token(operation).await
    } else {
        env::var(ACCESS_TOKEN_ENV).map_err(|_| LinkedInError::NotAuthenticated())
    }
}

/// A token provider that hands out a fixed access token.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(LinkedInError::NotAuthenticated());
        }
        Ok(Self { token })
    }
}

// Custom implementation of Debug to avoid printing the token
impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"**********")
            .finish()
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self, _operation: &str) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// A token provider that reads the token from an environment variable.
///
/// This is useful for testing but should not be used for real applications.
pub struct EnvTokenProvider {
    token: String,
}

impl std::fmt::Debug for EnvTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvTokenProvider")
            .field("token", &"**********")
            .finish()
    }
}

impl EnvTokenProvider {
    pub fn try_new(env_var: &str) -> Result<Self> {
        let token = env::var(env_var).map_err(|_| LinkedInError::NotAuthenticated())?;
        Ok(Self { token })
    }
}

#[async_trait]
impl TokenProvider for EnvTokenProvider {
    async fn get_token(&self, _operation: &str) -> Result<String> {
        Ok(self.token.clone())
    }
}
