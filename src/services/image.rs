use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

/// URL prefix the images directory is served under.
pub const MEDIA_PREFIX: &str = "/media";

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Invalid image: {0}")]
    InvalidDataUri(String),

    #[error("Failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

pub enum ImageFolder {
    Recipes,
    Avatars,
}

impl ImageFolder {
    const fn as_str(&self) -> &'static str {
        match self {
            Self::Recipes => "recipes",
            Self::Avatars => "avatars",
        }
    }
}

/// Public URL of a stored image path such as `recipes/<uuid>.png`.
#[must_use]
pub fn media_url(stored: &str) -> String {
    format!("{MEDIA_PREFIX}/{}", stored.trim_start_matches('/'))
}

/// Splits `data:image/<ext>;base64,<payload>` into extension and bytes.
pub fn decode_data_uri(data: &str) -> Result<(String, Vec<u8>), ImageError> {
    let rest = data
        .trim()
        .strip_prefix("data:image/")
        .ok_or_else(|| ImageError::InvalidDataUri("expected a data:image/ URI".to_string()))?;

    let (extension, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| ImageError::InvalidDataUri("expected base64 encoding".to_string()))?;

    let extension = extension.to_ascii_lowercase();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ImageError::InvalidDataUri(format!(
            "unsupported image type: {extension}"
        )));
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| ImageError::InvalidDataUri(format!("bad base64 payload: {e}")))?;

    if bytes.is_empty() {
        return Err(ImageError::InvalidDataUri("image is empty".to_string()));
    }

    Ok((extension, bytes))
}

#[derive(Clone)]
pub struct ImageService {
    root: PathBuf,
}

impl ImageService {
    #[must_use]
    pub fn new(images_path: impl Into<PathBuf>) -> Self {
        Self {
            root: images_path.into(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Decodes a data URI and writes it under `folder`. Returns the stored
    /// path relative to the images root.
    pub async fn save_data_uri(
        &self,
        data: &str,
        folder: ImageFolder,
    ) -> Result<String, ImageError> {
        let (extension, bytes) = decode_data_uri(data)?;

        let dir = self.root.join(folder.as_str());
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
        }

        let filename = format!("{}.{}", uuid::Uuid::new_v4(), extension);
        let file_path = dir.join(&filename);

        fs::write(&file_path, &bytes).await?;
        info!(path = %file_path.display(), size = bytes.len(), "Stored image");

        Ok(format!("{}/{}", folder.as_str(), filename))
    }

    /// Best effort; a missing file is not an error.
    pub async fn remove(&self, stored: &str) {
        let path = self.root.join(stored);
        if let Err(e) = fs::remove_file(&path).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %path.display(), error = %e, "Failed to remove image");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent PNG
    const PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn test_decode_data_uri() {
        let (ext, bytes) = decode_data_uri(PNG).unwrap();
        assert_eq!(ext, "png");
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert!(decode_data_uri("iVBORw0KGgo=").is_err());
        assert!(decode_data_uri("data:image/png,raw").is_err());
        assert!(decode_data_uri("data:image/svg;base64,PHN2Zz4=").is_err());
        assert!(decode_data_uri("data:image/png;base64,!!!").is_err());
    }

    #[test]
    fn test_media_url() {
        assert_eq!(media_url("recipes/a.png"), "/media/recipes/a.png");
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let root = std::env::temp_dir().join(format!("foodgram-img-{}", uuid::Uuid::new_v4()));
        let service = ImageService::new(&root);

        let stored = service
            .save_data_uri(PNG, ImageFolder::Recipes)
            .await
            .unwrap();
        assert!(stored.starts_with("recipes/"));
        assert!(stored.ends_with(".png"));
        assert!(root.join(&stored).exists());

        service.remove(&stored).await;
        assert!(!root.join(&stored).exists());

        let _ = std::fs::remove_dir_all(root);
    }
}
