//! Cloud upload of exported topic maps.
//!
//! `S3Uploader` puts the file at `<folder>/<filename>` and hands back a
//! presigned GET URL as the shareable link.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

pub const DEFAULT_FOLDER: &str = "Topic Maps";
/// Longest expiry S3 accepts for a presigned URL.
const SHARE_URL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid upload folder '{0}'")]
    InvalidFolder(String),

    #[error("upload failed: {0}")]
    Put(String),

    #[error("could not create share link: {0}")]
    ShareLink(String),
}

/// Where an upload landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub location: String,
    pub share_url: String,
}

#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(
        &self,
        folder: &str,
        filename: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<UploadReceipt, UploadError>;
}

/// Normalises a caller-supplied folder into an object key prefix.
///
/// Blank input selects [`DEFAULT_FOLDER`]. Empty segments are dropped; `.` and
/// `..` segments and control characters are rejected.
pub fn sanitize_folder(folder: &str) -> Result<String, UploadError> {
    let invalid = || UploadError::InvalidFolder(folder.to_string());
    if folder.chars().any(char::is_control) {
        return Err(invalid());
    }

    let mut segments = Vec::new();
    for segment in folder.split('/').map(str::trim).filter(|s| !s.is_empty()) {
        if segment == "." || segment == ".." {
            return Err(invalid());
        }
        segments.push(segment);
    }

    if segments.is_empty() {
        Ok(DEFAULT_FOLDER.to_string())
    } else {
        Ok(segments.join("/"))
    }
}

#[derive(Clone)]
pub struct S3Uploader {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Uploader {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl Uploader for S3Uploader {
    async fn upload(
        &self,
        folder: &str,
        filename: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<UploadReceipt, UploadError> {
        let key = format!("{}/{filename}", sanitize_folder(folder)?);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| UploadError::Put(e.to_string()))?;

        let presigning = PresigningConfig::expires_in(SHARE_URL_TTL)
            .map_err(|e| UploadError::ShareLink(e.to_string()))?;
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .presigned(presigning)
            .await
            .map_err(|e| UploadError::ShareLink(e.to_string()))?;

        let location = format!("s3://{}/{key}", self.bucket);
        info!("Uploaded topic map to {location}");

        Ok(UploadReceipt {
            location,
            share_url: presigned.uri().to_string(),
        })
    }
}
