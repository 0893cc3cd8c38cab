use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use studio_atoms::media::ObjectStorage;
use studio_atoms::{MediaError, MediaResult};

// Optimized uploads get fresh uuid keys, so they never change in place
const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// S3-backed object storage for optimized uploads
#[derive(Clone)]
pub struct S3Storage {
    client: S3Client,
    region: String,
    public_base_url: Option<String>,
}

impl S3Storage {
    pub fn new(client: S3Client, region: &str, public_base_url: Option<String>) -> Self {
        Self {
            client,
            region: region.to_string(),
            public_base_url,
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> MediaResult<()> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(path)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .cache_control(IMMUTABLE_CACHE_CONTROL)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("S3 put_object failed for {}/{}: {}", bucket, path, e);
                MediaError::upload(format!("S3 put failed: {}", e))
            })?;

        tracing::info!("📤 Stored {} ({} bytes, {})", path, size, content_type);
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        public_object_url(self.public_base_url.as_deref(), bucket, &self.region, path)
    }
}

pub fn public_object_url(base_url: Option<&str>, bucket: &str, region: &str, path: &str) -> String {
    match base_url {
        Some(base) => format!("{}/{}", base.trim_end_matches('/'), path),
        None => format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_use_cdn_when_configured() {
        assert_eq!(
            public_object_url(Some("https://cdn.example.com/"), "b", "r", "blog/a.webp"),
            "https://cdn.example.com/blog/a.webp"
        );
        assert_eq!(
            public_object_url(None, "studio-media", "ap-southeast-2", "case-studies/gallery/x.webp"),
            "https://studio-media.s3.ap-southeast-2.amazonaws.com/case-studies/gallery/x.webp"
        );
    }
}
