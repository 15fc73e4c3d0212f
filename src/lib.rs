//! The [LinkedIn Assets API](https://learn.microsoft.com/en-us/linkedin/marketing/integrations/community-management/shares/vector-asset-api)
//! lets applications upload images and videos that can later be attached to shares.
//!
//! This crate supplies a rust client for the upload workflow: registering an
//! upload, sending the content to the one-time upload URL and waiting until
//! LinkedIn has processed the asset.
//!
//! The simplest way in is a [`LinkedInClient`] that reads the OAuth2 access token
//! from the `LINKEDIN_ACCESS_TOKEN` environment variable:
//!
//! [`LinkedInClient`]: crate::client::LinkedInClient
//!
//! ```ignore
//! use linkedin_assets::assets::{AssetsApi, UploadRequest};
//! use linkedin_assets::client::LinkedInClient;
//!
//! let client = LinkedInClient::new();
//!
//! let request = UploadRequest::new("urn:li:person:12345", "https://example.org/elvis.jpg");
//! let asset = client.upload(request).await?;
//! println!("uploaded {asset}");
//! ```
//!
//! Applications that obtain and refresh tokens themselves implement a
//! [`TokenProvider`] and hand it to the client:
//!
//! [`TokenProvider`]: crate::auth::TokenProvider
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use async_trait::async_trait;
//! use linkedin_assets::assets::{AssetRecipe, AssetsApi, UploadOptions, UploadRequest};
//! use linkedin_assets::auth::TokenProvider;
//! use linkedin_assets::client::LinkedInClient;
//! use linkedin_assets::error::LinkedInError;
//!
//! #[derive(Debug)]
//! struct SessionTokenProvider {
//!     session: MySession,
//! }
//!
//! #[async_trait]
//! impl TokenProvider for SessionTokenProvider {
//!     async fn get_token(&self, _operation: &str) -> Result<String, LinkedInError> {
//!         // Refresh the token here if it is about to expire
//!         Ok(self.session.access_token().await)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let provider = Arc::new(SessionTokenProvider { session: login().await });
//!     let client = LinkedInClient::with_token_provider(provider);
//!
//!     let request = UploadRequest::new("urn:li:organization:2414183", "./clip.mp4").with_options(
//!         UploadOptions {
//!             recipe: AssetRecipe::FeedshareVideo,
//!             poll_interval: Duration::from_secs(30),
//!             timeout: Duration::from_secs(900),
//!             ..Default::default()
//!         },
//!     );
//!     match client.upload(request).await {
//!         Ok(asset) => println!("{asset} is ready"),
//!         Err(err) => eprintln!("upload failed: {err} (last status {:?})", err.last_status()),
//!     }
//! }
//! ```
//!
//! An upload that was interrupted, e.g. by a restart, can be picked up again with
//! [`AssetsApi::check_status`] or [`AssetsApi::await_completion`].
//!
//! [`AssetsApi::check_status`]: crate::assets::AssetsApi::check_status
//! [`AssetsApi::await_completion`]: crate::assets::AssetsApi::await_completion

pub mod assets;
pub mod auth;
pub mod client;
pub mod config;
pub mod content;
pub mod error;
pub mod poller;
