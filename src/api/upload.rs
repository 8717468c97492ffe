//! Logo uploads through presigned storage URLs
//!
//! The server hands out a short-lived write URL plus the public URL the
//! object will be served from. The file bytes go straight to storage and
//! never pass through the API server.

use super::{require_data, ApiClient};
use crate::constants::MAX_LOGO_BYTES;
use crate::error::ApiError;
use crate::types::{DeleteImageRequest, PresignRequest, PresignedUpload};
use reqwest::header::CONTENT_TYPE;
use std::path::Path;
use tracing::{debug, info};

/// Image file picked from disk, ready to upload
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Read `path` and check it is an image of at most 5 MiB.
    pub async fn read(path: &Path) -> Result<Self, ApiError> {
        let content_type = mime_for_path(path)
            .ok_or_else(|| ApiError::InvalidFile("Please select an image file".into()))?;

        let file_err = |source| ApiError::File {
            path: path.to_path_buf(),
            source,
        };
        let len = tokio::fs::metadata(path).await.map_err(file_err)?.len();
        if len > MAX_LOGO_BYTES {
            return Err(ApiError::InvalidFile("File size must be less than 5MB".into()));
        }
        let bytes = tokio::fs::read(path).await.map_err(file_err)?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "logo".to_string());

        Self::from_bytes(name, content_type.to_string(), bytes)
    }

    pub fn from_bytes(name: String, content_type: String, bytes: Vec<u8>) -> Result<Self, ApiError> {
        if !content_type.starts_with("image/") {
            return Err(ApiError::InvalidFile("Please select an image file".into()));
        }
        if bytes.len() as u64 > MAX_LOGO_BYTES {
            return Err(ApiError::InvalidFile("File size must be less than 5MB".into()));
        }
        Ok(Self {
            name,
            content_type,
            bytes,
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// MIME type of an image file, judged by its extension
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "avif" => "image/avif",
        _ => return None,
    };
    Some(mime)
}

#[derive(Clone)]
pub struct UploadApi {
    client: ApiClient,
}

impl UploadApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn presign(&self, file: &ImageFile) -> Result<PresignedUpload, ApiError> {
        let request = PresignRequest {
            file_name: file.name.clone(),
            file_size: file.size(),
            content_type: file.content_type.clone(),
        };
        let response = self
            .client
            .post::<PresignedUpload, _>(&["api", "upload", "presigned-url"], &request)
            .await?;
        let upload = require_data(response)?;
        debug!(key = %upload.key, expires_in = upload.expires_in, "Got presigned upload URL");
        Ok(upload)
    }

    /// PUT the raw bytes to the presigned URL. One attempt only.
    pub async fn put_object(&self, upload: &PresignedUpload, file: &ImageFile) -> Result<(), ApiError> {
        let url = url::Url::parse(&upload.upload_url)?;
        let content_type = upload.content_type().unwrap_or(&file.content_type).to_string();

        let response = self
            .client
            .http()
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .body(file.bytes.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Server { status, body: None });
        }
        Ok(())
    }

    /// Presign, transfer, and return the public URL of the stored image.
    pub async fn upload_image(&self, file: &ImageFile) -> Result<String, ApiError> {
        let upload = self.presign(file).await?;
        self.put_object(&upload, file).await?;
        info!(key = %upload.key, size = file.size(), "Image uploaded");
        Ok(upload.file_url)
    }

    /// Read the image at `path` and upload it.
    pub async fn upload_file(&self, path: &Path) -> Result<String, ApiError> {
        let file = ImageFile::read(path).await?;
        self.upload_image(&file).await
    }

    pub async fn delete_image(&self, image_url: &str) -> Result<(), ApiError> {
        let body = DeleteImageRequest {
            image_url: image_url.to_string(),
        };
        self.client
            .delete::<serde_json::Value, _>(&["api", "upload", "image"], Some(&body))
            .await?;
        info!(image_url, "Image deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::client_for;
    use httpmock::prelude::*;
    use serde_json::json;

    fn png(bytes: &[u8]) -> ImageFile {
        ImageFile::from_bytes("logo.png".into(), "image/png".into(), bytes.to_vec()).unwrap()
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(mime_for_path(Path::new("a/b/Logo.PNG")), Some("image/png"));
        assert_eq!(mime_for_path(Path::new("x.jpeg")), Some("image/jpeg"));
        assert_eq!(mime_for_path(Path::new("icon.svg")), Some("image/svg+xml"));
        assert_eq!(mime_for_path(Path::new("notes.txt")), None);
        assert_eq!(mime_for_path(Path::new("README")), None);
    }

    #[test]
    fn rejects_non_images_and_large_files() {
        let err = ImageFile::from_bytes("a.pdf".into(), "application/pdf".into(), vec![1]).unwrap_err();
        assert_eq!(err.display_message(), "Please select an image file");

        let big = vec![0u8; MAX_LOGO_BYTES as usize + 1];
        let err = ImageFile::from_bytes("a.png".into(), "image/png".into(), big).unwrap_err();
        assert_eq!(err.display_message(), "File size must be less than 5MB");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn read_checks_extension_before_touching_disk() {
        let err = ImageFile::read(Path::new("/definitely/not/here.txt")).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidFile(_)));

        let err = ImageFile::read(Path::new("/definitely/not/here.png")).await.unwrap_err();
        assert!(matches!(err, ApiError::File { .. }));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upload_image_presigns_then_puts_bytes() {
        let server = MockServer::start_async().await;
        let presign = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/upload/presigned-url")
                    .json_body(json!({"fileName": "logo.png", "fileSize": 3, "contentType": "image/png"}));
                then.status(200).json_body(json!({
                    "success": true,
                    "data": {
                        "uploadUrl": server.url("/bucket/logos/abc.png?sig=1"),
                        "fileUrl": "https://cdn.example.com/logos/abc.png",
                        "key": "logos/abc.png",
                        "expiresIn": 300,
                        "instructions": {"method": "PUT", "headers": {"Content-Type": "image/png"}}
                    }
                }));
            })
            .await;
        let put = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/bucket/logos/abc.png")
                    .query_param("sig", "1")
                    .header("content-type", "image/png")
                    .body("abc");
                then.status(200);
            })
            .await;

        let api = UploadApi::new(client_for(&server));
        let url = api.upload_image(&png(b"abc")).await.unwrap();

        presign.assert_async().await;
        put.assert_async().await;
        assert_eq!(url, "https://cdn.example.com/logos/abc.png");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rejected_transfer_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/upload/presigned-url");
                then.status(200).json_body(json!({
                    "success": true,
                    "data": {
                        "uploadUrl": server.url("/bucket/x.png"),
                        "fileUrl": "https://cdn.example.com/x.png",
                        "key": "x.png",
                        "expiresIn": 300
                    }
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path("/bucket/x.png");
                then.status(403).body("<Error>SignatureDoesNotMatch</Error>");
            })
            .await;

        let api = UploadApi::new(client_for(&server));
        let err = api.upload_image(&png(b"xyz")).await.unwrap_err();
        assert_eq!(err.status(), Some(reqwest::StatusCode::FORBIDDEN));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_image_sends_url_in_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(DELETE)
                    .path("/api/upload/image")
                    .json_body(json!({"imageUrl": "https://cdn.example.com/x.png"}));
                then.status(200).json_body(json!({"success": true, "message": "deleted"}));
            })
            .await;

        let api = UploadApi::new(client_for(&server));
        api.delete_image("https://cdn.example.com/x.png").await.unwrap();
        mock.assert_async().await;
    }
}
