use async_trait::async_trait;
use crate::error::MediaResult;

/// Object storage collaborator.
///
/// Implementations report failures as [`crate::error::MediaError::Upload`].
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> MediaResult<()>;

    fn public_url(&self, bucket: &str, path: &str) -> String;
}
