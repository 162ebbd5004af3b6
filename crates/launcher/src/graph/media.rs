//! Media upload and video readiness polling.

use reqwest::multipart::{Form, Part};
use tracing::{debug, instrument};

use super::{
    CreatedObject, GraphClient, GraphError, ImageUploadResponse, VideoState, VideoStatusResponse,
};
use campaign_launcher_core::{
    AdAccountId, AssetSource, CreativeAsset, ImageHash, MediaKind, UploadedMedia, VideoId,
};

impl GraphClient {
    /// Upload a creative asset to one ad account.
    ///
    /// Images return their content hash. Videos are polled until transcoding
    /// finishes, at most `video_poll().max_attempts` times.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::MediaProcessing` if the platform rejects a video,
    /// `GraphError::MediaTimeout` if it never becomes ready, or any API error.
    #[instrument(skip(self, asset), fields(account = %account, kind = %asset.kind, name = %asset.display_name))]
    pub async fn upload_media(
        &self,
        account: &AdAccountId,
        asset: &CreativeAsset,
    ) -> Result<UploadedMedia, GraphError> {
        match asset.kind {
            MediaKind::Image => {
                let path = format!("{account}/adimages");
                let response: ImageUploadResponse = self.send_asset(&path, asset).await?;
                let hash = response
                    .images
                    .into_values()
                    .next()
                    .map(|entry| entry.hash)
                    .ok_or(GraphError::MissingId { object: "image" })?;
                debug!(%hash, "image uploaded");
                Ok(UploadedMedia::image(account.clone(), ImageHash::new(hash)))
            }
            MediaKind::Video => {
                let path = format!("{account}/advideos");
                let response: CreatedObject = self.send_asset(&path, asset).await?;
                let video_id = response.id.ok_or(GraphError::MissingId { object: "video" })?;
                debug!(%video_id, "video uploaded, waiting for processing");
                self.wait_for_video(account, VideoId::new(video_id)).await
            }
        }
    }

    /// Poll a video until it is ready or rejected.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::MediaProcessing` on the error state and
    /// `GraphError::MediaTimeout` once the attempts are exhausted.
    #[instrument(skip(self), fields(video_id = %video_id))]
    pub async fn wait_for_video(
        &self,
        account: &AdAccountId,
        video_id: VideoId,
    ) -> Result<UploadedMedia, GraphError> {
        let policy = self.video_poll();

        for attempt in 1..=policy.max_attempts {
            let status: VideoStatusResponse = self
                .get(video_id.as_str(), &[("fields", "status,picture")])
                .await?;

            match status.state() {
                VideoState::Ready => {
                    return Ok(UploadedMedia::video(
                        account.clone(),
                        video_id,
                        status.picture.unwrap_or_default(),
                    ));
                }
                VideoState::Error => {
                    return Err(GraphError::MediaProcessing {
                        video_id: video_id.into_inner(),
                    });
                }
                VideoState::Processing => {
                    debug!(attempt, "video still processing");
                    if attempt < policy.max_attempts {
                        tokio::time::sleep(policy.interval).await;
                    }
                }
            }
        }

        Err(GraphError::MediaTimeout {
            video_id: video_id.into_inner(),
            attempts: policy.max_attempts,
        })
    }

    /// Send asset content: multipart `file` for local bytes, `url` parameter
    /// for remote assets.
    async fn send_asset<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        asset: &CreativeAsset,
    ) -> Result<T, GraphError> {
        match &asset.source {
            AssetSource::LocalFile { file_name, bytes } => {
                let length = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
                // Bytes clones share the buffer, so each account reads the full content.
                let part = Part::stream_with_length(bytes.clone(), length)
                    .file_name(file_name.clone())
                    .mime_str(&asset.mime_type)?;
                self.post_multipart(path, Form::new().part("file", part))
                    .await
            }
            AssetSource::RemoteUrl(url) => self.post_form(path, &[("url", url.clone())]).await,
        }
    }
}
