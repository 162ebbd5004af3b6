//! Media uploaded to one ad account.

use serde::{Deserialize, Serialize};

use crate::types::{AdAccountId, ImageHash, VideoId};

/// Account-scoped reference to an uploaded asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaRef {
    Image { hash: ImageHash },
    Video { video_id: VideoId, thumbnail_url: String },
}

/// Result of uploading a creative asset to one ad account.
///
/// The platform issues identifiers that only resolve inside the account they
/// were uploaded to, so the account travels with the reference and is
/// checked again when the creative is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedMedia {
    pub account_id: AdAccountId,
    pub media: MediaRef,
}

impl UploadedMedia {
    #[must_use]
    pub const fn image(account_id: AdAccountId, hash: ImageHash) -> Self {
        Self {
            account_id,
            media: MediaRef::Image { hash },
        }
    }

    #[must_use]
    pub const fn video(account_id: AdAccountId, video_id: VideoId, thumbnail_url: String) -> Self {
        Self {
            account_id,
            media: MediaRef::Video {
                video_id,
                thumbnail_url,
            },
        }
    }

    /// Whether this media can be referenced from `account`.
    #[must_use]
    pub fn belongs_to(&self, account: &AdAccountId) -> bool {
        &self.account_id == account
    }
}
