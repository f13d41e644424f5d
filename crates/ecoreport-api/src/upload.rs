//! Image upload storage.
//!
//! Uploads land on local disk under a generated filename; the random name
//! is the only collision guard concurrent uploads need.

use ecoreport_core::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// Upload size cap, matching the client contract.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Multipart field name the clients upload under.
pub const UPLOAD_FIELD: &str = "image";

#[derive(Debug)]
pub struct StoredImage {
    pub filename: String,
    pub path: PathBuf,
}

/// Validate and persist one uploaded image.
///
/// Only `image/*` MIME types are accepted and the payload may not exceed
/// [`MAX_UPLOAD_BYTES`]. The stored filename is a fresh UUID with the
/// original extension preserved.
pub async fn store_image(
    uploads_dir: &Path,
    original_name: Option<&str>,
    content_type: Option<&str>,
    data: &[u8],
) -> Result<StoredImage> {
    match content_type {
        Some(mime) if mime.starts_with("image/") => {}
        _ => return Err(Error::Upload("Only image files are allowed".to_string())),
    }

    if data.len() > MAX_UPLOAD_BYTES {
        return Err(Error::Upload(format!(
            "File exceeds the {} MB limit",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }

    let extension = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();

    let filename = format!("{}{extension}", Uuid::new_v4());
    let path = uploads_dir.join(&filename);

    tokio::fs::create_dir_all(uploads_dir).await?;
    tokio::fs::write(&path, data).await?;

    info!("Stored upload {} ({} bytes)", filename, data.len());

    Ok(StoredImage { filename, path })
}

/// Publicly fetchable URL for a stored image, built from the request's
/// scheme and host.
pub fn public_url(scheme: &str, host: &str, filename: &str) -> String {
    format!("{scheme}://{host}/uploads/{filename}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_image_under_generated_name() {
        let dir = tempfile::tempdir().unwrap();

        let stored = store_image(
            dir.path(),
            Some("photo.jpg"),
            Some("image/jpeg"),
            b"fake-jpeg-bytes",
        )
        .await
        .unwrap();

        assert!(stored.filename.ends_with(".jpg"));
        assert_ne!(stored.filename, "photo.jpg");
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"fake-jpeg-bytes");
    }

    #[tokio::test]
    async fn two_uploads_never_collide() {
        let dir = tempfile::tempdir().unwrap();

        let a = store_image(dir.path(), Some("a.png"), Some("image/png"), b"a")
            .await
            .unwrap();
        let b = store_image(dir.path(), Some("a.png"), Some("image/png"), b"b")
            .await
            .unwrap();

        assert_ne!(a.filename, b.filename);
    }

    #[tokio::test]
    async fn rejects_non_image_mime() {
        let dir = tempfile::tempdir().unwrap();

        let err = store_image(dir.path(), Some("notes.txt"), Some("text/plain"), b"hi")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Only image files are allowed"));

        let err = store_image(dir.path(), Some("mystery"), None, b"hi")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Only image files are allowed"));
    }

    #[tokio::test]
    async fn rejects_oversized_payload() {
        let dir = tempfile::tempdir().unwrap();
        let big = vec![0u8; MAX_UPLOAD_BYTES + 1];

        let err = store_image(dir.path(), Some("big.jpg"), Some("image/jpeg"), &big)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("limit"));
    }

    #[test]
    fn public_url_uses_request_host() {
        assert_eq!(
            public_url("http", "localhost:3000", "abc.jpg"),
            "http://localhost:3000/uploads/abc.jpg"
        );
    }
}
