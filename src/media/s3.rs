//! S3-compatible media backend. Credentials come from the AWS default provider chain.

use super::{join_url, MediaStore, StoredMedia, UploadedFile};
use crate::error::MediaError;
use async_trait::async_trait;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

pub struct S3MediaStore {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3MediaStore {
    /// Build a client for `bucket`. A custom `endpoint` (MinIO, R2, ...) switches to path-style addressing.
    pub async fn connect(bucket: &str, region: &str, endpoint: Option<&str>, public_base_url: &str) -> Self {
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(url) = endpoint {
            builder = builder.endpoint_url(url).force_path_style(true);
        }
        tracing::info!(bucket = %bucket, region = %region, endpoint = ?endpoint, "s3 media store ready");
        Self {
            client: Client::from_conf(builder.build()),
            bucket: bucket.to_string(),
            public_base_url: public_base_url.to_string(),
        }
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn put(&self, key: &str, file: &UploadedFile) -> Result<StoredMedia, MediaError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(&file.content_type)
            .body(ByteStream::from(file.bytes.clone()))
            .send()
            .await
            .map_err(|e| MediaError::Backend(DisplayErrorContext(&e).to_string()))?;
        Ok(StoredMedia {
            url: join_url(&self.public_base_url, key),
            key: key.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), MediaError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| MediaError::Backend(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }
}
