//! Waiting for an uploaded asset to finish processing
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::time::{sleep, timeout};

use crate::{
    assets::{AssetStatus, AssetStatusCode},
    error::{LinkedInError, Result},
};

/// Anything that can report the current status of an asset
#[async_trait]
pub trait AssetStatusSource: Send + Sync {
    async fn fetch_status(&self, asset: &str) -> Result<AssetStatus>;
}

/// Polls `source` until the asset reaches a terminal state.
///
/// The server needs a moment to notice freshly uploaded bytes, so the first
/// fetch happens only after one `poll_interval`.  That first wait and the
/// polling loop together are bounded by `overall_timeout`; when it runs out the
/// call fails with [`LinkedInError::UploadTimeout`] carrying the last status
/// seen, whatever it was.
///
/// Dropping the returned future abandons the wait.
pub async fn await_completion<S>(
    source: &S,
    asset: &str,
    poll_interval: Duration,
    overall_timeout: Duration,
) -> Result<AssetStatus>
where
    S: AssetStatusSource + ?Sized,
{
    let mut last_status = None;
    let outcome = timeout(
        overall_timeout,
        poll_until_terminal(source, asset, poll_interval, &mut last_status),
    )
    .await;

    match outcome {
        Ok(result) => result,
        Err(_) => {
            warn!(
                "gave up on asset {} after {:?}, last status {:?}",
                asset,
                overall_timeout,
                last_status.as_ref().map(|status: &AssetStatus| status.code)
            );
            Err(LinkedInError::UploadTimeout { last_status })
        }
    }
}

async fn poll_until_terminal<S>(
    source: &S,
    asset: &str,
    poll_interval: Duration,
    last_status: &mut Option<AssetStatus>,
) -> Result<AssetStatus>
where
    S: AssetStatusSource + ?Sized,
{
    let mut attempt = 0u32;
    loop {
        sleep(poll_interval).await;

        attempt += 1;
        let status = source
            .fetch_status(asset)
            .await
            .map_err(|err| err.with_last_status(last_status.as_ref()))?;
        debug!("asset {} poll #{}: {}", asset, attempt, status.code);

        match status.code {
            AssetStatusCode::Available => return Ok(status),
            AssetStatusCode::Incomplete => return Err(LinkedInError::UploadIncomplete(status)),
            AssetStatusCode::ClientError => return Err(LinkedInError::UploadClientError(status)),
            AssetStatusCode::WaitingUpload | AssetStatusCode::Processing => {}
            AssetStatusCode::Unknown => {
                warn!("asset {} reported an unrecognized status: {}", asset, status.raw);
            }
        }

        *last_status = Some(status);
    }
}
