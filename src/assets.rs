//! Uploading images and videos through the LinkedIn Assets API
//!
//! An upload happens in three steps: an upload slot is registered for the
//! owner, the content is PUT to the one-time URL of the slot, and the asset
//! status is polled until LinkedIn has finished processing it.
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;

use crate::{
    client::{urn_to_id, LinkedInClient},
    content::{ContentSource, LoadedContent},
    error::{LinkedInError, Result},
    poller::{self, AssetStatusSource},
};

/// Seconds an upload may take before it is abandoned
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;
/// Seconds between two status checks
pub const DEFAULT_POLL_SLEEP_SECONDS: u64 = 10;

/// The upload mechanism the registration response is expected to offer
pub const UPLOAD_MECHANISM: &str = "com.linkedin.digitalmedia.uploading.MediaUploadHttpRequest";

const JSON_CONTENT_TYPE: &str = "application/json";
const USER_GENERATED_CONTENT: &str = "urn:li:userGeneratedContent";

/// How LinkedIn should process the uploaded content
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AssetRecipe {
    /// An image attached to a feed share
    #[default]
    FeedshareImage,
    /// A video attached to a feed share
    FeedshareVideo,
}

impl AssetRecipe {
    pub fn urn(&self) -> &'static str {
        match self {
            AssetRecipe::FeedshareImage => "urn:li:digitalmediaRecipe:feedshare-image",
            AssetRecipe::FeedshareVideo => "urn:li:digitalmediaRecipe:feedshare-video",
        }
    }
}

/// Options for the upload operation
#[derive(Clone, Debug)]
pub struct UploadOptions {
    /// Bounds the whole upload: reading the content, registering, sending
    /// the content and waiting for processing
    pub timeout: Duration,
    /// How long to wait between two status checks
    pub poll_interval: Duration,
    /// A file name that replaces the one derived from the source when
    /// working out the content type
    pub disposition_filename: Option<String>,
    /// The processing recipe, an image by default
    pub recipe: AssetRecipe,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_SLEEP_SECONDS),
            disposition_filename: None,
            recipe: AssetRecipe::default(),
        }
    }
}

/// Everything needed to upload one asset
#[derive(Clone, Debug)]
pub struct UploadRequest {
    /// The URN of the owning person or organization, e.g. `urn:li:person:12345`
    pub owner: String,
    /// Where the content is read from
    pub source: ContentSource,
    pub options: UploadOptions,
}

impl UploadRequest {
    pub fn new(owner: impl Into<String>, source: impl Into<ContentSource>) -> Self {
        Self {
            owner: owner.into(),
            source: source.into(),
            options: UploadOptions::default(),
        }
    }

    pub fn with_options(self, options: UploadOptions) -> Self {
        Self { options, ..self }
    }
}

/// A registered upload: the asset that will be created and the one-time URL
/// its content must be sent to.
///
/// A slot is consumed by [`AssetsApi::transmit`]; a failed transmission needs
/// a fresh slot.
#[derive(Debug, PartialEq, Eq)]
pub struct UploadSlot {
    /// The asset URN, e.g. `urn:li:digitalmediaAsset:C5522AQHn46pwH96hxQ`
    pub asset_id: String,
    pub upload_url: String,
    /// Headers LinkedIn listed next to the upload URL, informational only and
    /// not sent with the content
    pub headers: HashMap<String, String>,
    pub media_artifact: Option<String>,
}

/// The states an asset goes through
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetStatusCode {
    /// Registered, the content has not arrived yet
    WaitingUpload,
    /// The content arrived and is being processed
    Processing,
    /// Processing failed for good
    Incomplete,
    /// The content was rejected, e.g. an unsupported format
    ClientError,
    /// Ready to be used in a share
    Available,
    /// A status this client does not know about
    #[serde(other)]
    Unknown,
}

impl AssetStatusCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatusCode::WaitingUpload => "WAITING_UPLOAD",
            AssetStatusCode::Processing => "PROCESSING",
            AssetStatusCode::Incomplete => "INCOMPLETE",
            AssetStatusCode::ClientError => "CLIENT_ERROR",
            AssetStatusCode::Available => "AVAILABLE",
            AssetStatusCode::Unknown => "UNKNOWN",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AssetStatusCode::Incomplete | AssetStatusCode::ClientError | AssetStatusCode::Available
        )
    }
}

impl fmt::Display for AssetStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A snapshot of an asset's status as reported by the API
#[derive(Clone, Debug)]
pub struct AssetStatus {
    pub asset: String,
    pub code: AssetStatusCode,
    /// The response body the code was read from
    pub raw: Value,
    pub observed_at: DateTime<Utc>,
}

impl AssetStatus {
    pub fn new(asset: impl Into<String>, code: AssetStatusCode, raw: Value) -> Self {
        Self {
            asset: asset.into(),
            code,
            raw,
            observed_at: Utc::now(),
        }
    }

    /// Reads the status of the first recipe from an asset response body
    pub fn from_response(asset: &str, raw: Value) -> Result<Self> {
        let response = serde_json::from_value::<AssetStatusResponse>(raw.clone())
            .map_err(|err| LinkedInError::ResponseMalformed(format!("asset status: {err}")))?;
        let recipe = response.recipes.into_iter().next().ok_or_else(|| {
            LinkedInError::ResponseMalformed(format!("asset {asset} reported no recipes"))
        })?;
        Ok(Self::new(asset, recipe.status, raw))
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} for {} ({})", self.code, self.asset, self.raw)
    }
}

#[derive(Debug, Deserialize)]
struct AssetStatusResponse {
    #[serde(default)]
    recipes: Vec<AssetRecipeStatus>,
}

#[derive(Debug, Deserialize)]
struct AssetRecipeStatus {
    status: AssetStatusCode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterUploadBody<'a> {
    register_upload_request: RegisterUploadRequest<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterUploadRequest<'a> {
    owner: &'a str,
    recipes: Vec<&'static str>,
    service_relationships: Vec<ServiceRelationship>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceRelationship {
    identifier: &'static str,
    relationship_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct RegisterUploadResponse {
    value: Option<RegisterUploadValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterUploadValue {
    asset: Option<String>,
    media_artifact: Option<String>,
    upload_mechanism: Option<HashMap<String, UploadMechanism>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadMechanism {
    upload_url: Option<String>,
    #[serde(default)]
    headers: HashMap<String, String>,
}

impl RegisterUploadResponse {
    fn into_slot(self) -> Result<UploadSlot> {
        let value = self
            .value
            .ok_or_else(|| LinkedInError::RegistrationFailed("response has no value".to_string()))?;
        let mut mechanisms = value.upload_mechanism.ok_or_else(|| {
            LinkedInError::RegistrationFailed("response has no uploadMechanism".to_string())
        })?;
        let mechanism = mechanisms.remove(UPLOAD_MECHANISM).ok_or_else(|| {
            LinkedInError::RegistrationFailed(format!("response does not offer {UPLOAD_MECHANISM}"))
        })?;
        let upload_url = mechanism
            .upload_url
            .ok_or_else(|| LinkedInError::RegistrationFailed("response has no uploadUrl".to_string()))?;
        let asset_id = value
            .asset
            .ok_or_else(|| LinkedInError::RegistrationFailed("response has no asset".to_string()))?;

        Ok(UploadSlot {
            asset_id,
            upload_url,
            headers: mechanism.headers,
            media_artifact: value.media_artifact,
        })
    }
}

/// Functions of the LinkedIn Assets API
#[async_trait]
pub trait AssetsApi {
    /// Reserves an upload slot for an asset owned by `owner`
    ///
    /// # Arguments
    ///
    /// * `owner` - The URN of the owning person or organization
    /// * `recipe` - How LinkedIn should process the content
    ///
    /// # Returns
    ///
    /// The asset URN and the one-time URL to send the content to
    async fn register_upload(&self, owner: &str, recipe: AssetRecipe) -> Result<UploadSlot>;

    /// Sends the content of an asset to the URL of a registered slot
    ///
    /// The slot is used up whatever the outcome.  Nothing is retried; after a
    /// failure a new slot has to be registered.
    ///
    /// # Arguments
    ///
    /// * `slot` - The slot returned by `register_upload`
    /// * `content` - The content to send, see [`LoadedContent`]
    /// * `timeout` - Bounds connecting and transferring together
    async fn transmit(&self, slot: UploadSlot, content: &LoadedContent, timeout: Duration) -> Result<()>;

    /// Fetches the current status of an asset once
    ///
    /// This can be used to pick up waiting for an asset again, e.g. after a restart.
    async fn check_status(&self, asset: &str) -> Result<AssetStatus>;

    /// Waits until an asset is available or has failed, see [`poller::await_completion`]
    async fn await_completion(
        &self,
        asset: &str,
        poll_interval: Duration,
        overall_timeout: Duration,
    ) -> Result<AssetStatus>;

    /// Uploads an image or video and waits until LinkedIn has processed it
    ///
    /// # Returns
    ///
    /// The URN of the available asset, ready to be referenced from a share
    async fn upload(&self, request: UploadRequest) -> Result<String>;
}

impl LinkedInClient {
    async fn register_upload_within(
        &self,
        owner: &str,
        recipe: AssetRecipe,
        timeout: Duration,
    ) -> Result<UploadSlot> {
        if owner.is_empty() {
            return Err(LinkedInError::required("owner"));
        }

        let api_url = self.get_api_url("/assets?action=registerUpload");
        let mut request = self.http_client().post(api_url);
        request = self.add_format_header(request);
        request = self.add_authorization_header(request, "registerUpload").await?;
        request = request
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header(ACCEPT, JSON_CONTENT_TYPE)
            .timeout(timeout)
            .json(&RegisterUploadBody {
                register_upload_request: RegisterUploadRequest {
                    owner,
                    recipes: vec![recipe.urn()],
                    service_relationships: vec![ServiceRelationship {
                        identifier: USER_GENERATED_CONTENT,
                        relationship_type: "OWNER",
                    }],
                },
            });

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                LinkedInError::UploadTimeout { last_status: None }
            } else {
                LinkedInError::RegistrationFailed(format!("request not answered: {err}"))
            }
        })?;
        if !response.status().is_success() {
            let err = Self::handle_error(response).await;
            return Err(LinkedInError::RegistrationFailed(err.to_string()));
        }

        let body = response.json::<RegisterUploadResponse>().await.map_err(|err| {
            if err.is_timeout() {
                LinkedInError::UploadTimeout { last_status: None }
            } else {
                LinkedInError::RegistrationFailed(format!("unreadable response: {err}"))
            }
        })?;
        let slot = body.into_slot()?;
        debug!("registered upload of {} for {}", slot.asset_id, owner);
        Ok(slot)
    }

    async fn check_status_within(&self, asset: &str, timeout: Duration) -> Result<AssetStatus> {
        if asset.is_empty() {
            return Err(LinkedInError::required("asset"));
        }

        let api_url = self.get_api_url(&format!("/assets/{}", urn_to_id(asset)));
        let mut request = self.http_client().get(api_url);
        request = self.add_format_header(request);
        request = self.add_authorization_header(request, "status").await?;
        request = request.timeout(timeout);

        let response = request.send().await.map_err(status_transport_error)?;
        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        let raw = response
            .json::<Value>()
            .await
            .map_err(|err| match status_transport_error(err) {
                LinkedInError::StatusCheckFailed { message, .. } => {
                    LinkedInError::ResponseMalformed(format!("asset status: {message}"))
                }
                other => other,
            })?;
        AssetStatus::from_response(asset, raw)
    }
}

fn status_transport_error(err: reqwest::Error) -> LinkedInError {
    if err.is_timeout() {
        LinkedInError::UploadTimeout { last_status: None }
    } else {
        LinkedInError::StatusCheckFailed {
            message: err.to_string(),
            last_status: None,
        }
    }
}

/// Time left until `deadline`, or a timeout once it has passed
fn remaining(deadline: Instant) -> Result<Duration> {
    let left = deadline.saturating_duration_since(Instant::now());
    if left.is_zero() {
        Err(LinkedInError::UploadTimeout { last_status: None })
    } else {
        Ok(left)
    }
}

#[async_trait]
impl AssetsApi for LinkedInClient {
    async fn register_upload(&self, owner: &str, recipe: AssetRecipe) -> Result<UploadSlot> {
        self.register_upload_within(owner, recipe, self.config().request_timeout)
            .await
    }

    async fn transmit(&self, slot: UploadSlot, content: &LoadedContent, timeout: Duration) -> Result<()> {
        let mut request = self.http_client().put(&slot.upload_url);
        request = self.add_format_header(request);
        request = self.add_authorization_header(request, "upload").await?;
        request = request
            .header(CONTENT_TYPE, content.content_type.as_str())
            .header(CONTENT_LENGTH, content.len())
            .timeout(timeout)
            .body(content.data.clone());

        debug!(
            "sending {} bytes of {} for {}",
            content.len(),
            content.content_type,
            slot.asset_id
        );
        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                LinkedInError::UploadTimeout { last_status: None }
            } else {
                LinkedInError::UploadFailed {
                    status: err.status().map(|status| status.as_u16()),
                    message: err.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("upload of {} was refused with {}", slot.asset_id, status);
            return Err(LinkedInError::UploadFailed {
                status: Some(status.as_u16()),
                message: if body.is_empty() {
                    status.canonical_reason().unwrap_or("Unknown Error").to_string()
                } else {
                    body
                },
            });
        }
        Ok(())
    }

    async fn check_status(&self, asset: &str) -> Result<AssetStatus> {
        self.check_status_within(asset, self.config().request_timeout)
            .await
    }

    async fn await_completion(
        &self,
        asset: &str,
        poll_interval: Duration,
        overall_timeout: Duration,
    ) -> Result<AssetStatus> {
        poller::await_completion(self, asset, poll_interval, overall_timeout).await
    }

    async fn upload(&self, request: UploadRequest) -> Result<String> {
        let UploadRequest {
            owner,
            source,
            options,
        } = request;

        // Every stage only gets what is left of the overall timeout
        let deadline = Instant::now() + options.timeout;

        // A source that cannot be read should not leave a registered slot behind
        let content = source
            .load(
                self.http_client(),
                remaining(deadline)?,
                options.disposition_filename.as_deref(),
            )
            .await?;

        let slot = self
            .register_upload_within(&owner, options.recipe, remaining(deadline)?)
            .await?;
        let asset = slot.asset_id.clone();
        self.transmit(slot, &content, remaining(deadline)?).await?;
        self.await_completion(&asset, options.poll_interval, remaining(deadline)?)
            .await?;

        info!("asset {} is available", asset);
        Ok(asset)
    }
}

#[async_trait]
impl AssetStatusSource for LinkedInClient {
    async fn fetch_status(&self, asset: &str) -> Result<AssetStatus> {
        self.check_status(asset).await
    }
}
