use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

const MAX_DIMENSION: u32 = 800;
const THUMB_DIMENSION: u32 = 200;
const JPEG_QUALITY: u8 = 85;
const THUMB_QUALITY: u8 = 80;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Failed to process image: {0}")]
    Process(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image URL outside user directory")]
    OutsideUserDir,

    #[error("Image task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub struct ImageService {
    uploads_root: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Bottle,
    Swatch,
    NailArt,
}

impl ImageKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bottle => "bottle",
            Self::Swatch => "swatch",
            Self::NailArt => "nail-art",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "bottle" => Some(Self::Bottle),
            "swatch" => Some(Self::Swatch),
            "nail-art" => Some(Self::NailArt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredImage {
    pub image_url: String,
    pub thumbnail_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserImage {
    pub filename: String,
    pub image_url: String,
    pub thumbnail_url: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ImageService {
    #[must_use]
    pub fn new(uploads_root: impl Into<PathBuf>) -> Self {
        Self {
            uploads_root: uploads_root.into(),
        }
    }

    /// Decodes, resizes and stores one image plus its thumbnail.
    /// The main copy fits within 800x800 without enlarging, the
    /// thumbnail is a 200x200 center crop. Both are re-encoded as JPEG.
    pub async fn store(
        &self,
        bytes: Vec<u8>,
        user_id: i32,
        kind: ImageKind,
    ) -> Result<StoredImage, ImageError> {
        let filename = format!("{}.jpg", Uuid::new_v4());
        let dir = self.user_dir(user_id, kind);
        fs::create_dir_all(&dir).await?;

        let image_path = dir.join(&filename);
        let thumb_path = dir.join(format!("thumb_{filename}"));

        tokio::task::spawn_blocking(move || -> Result<(), ImageError> {
            let img = image::load_from_memory(&bytes)?;

            let main = if img.width() > MAX_DIMENSION || img.height() > MAX_DIMENSION {
                img.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Lanczos3)
            } else {
                img.clone()
            };
            write_jpeg(&main, &image_path, JPEG_QUALITY)?;

            let thumb = img.resize_to_fill(THUMB_DIMENSION, THUMB_DIMENSION, FilterType::Lanczos3);
            write_jpeg(&thumb, &thumb_path, THUMB_QUALITY)?;

            Ok(())
        })
        .await??;

        info!(user_id, kind = kind.as_str(), %filename, "Stored image");

        Ok(StoredImage {
            image_url: public_url(user_id, kind, &filename),
            thumbnail_url: public_url(user_id, kind, &format!("thumb_{filename}")),
        })
    }

    /// Deletes a stored image and its thumbnail. The URL must point
    /// inside the calling user's directory; missing files are fine.
    pub async fn delete(&self, user_id: i32, image_url: &str) -> Result<(), ImageError> {
        let prefix = format!("/uploads/users/{user_id}/");
        let relative = image_url
            .strip_prefix(&prefix)
            .ok_or(ImageError::OutsideUserDir)?;

        if relative.contains("..") {
            return Err(ImageError::OutsideUserDir);
        }

        let path = self
            .uploads_root
            .join("users")
            .join(user_id.to_string())
            .join(relative);

        remove_quietly(&path).await;

        if let (Some(parent), Some(name)) = (path.parent(), path.file_name().and_then(|n| n.to_str()))
            && !name.starts_with("thumb_")
        {
            remove_quietly(&parent.join(format!("thumb_{name}"))).await;
        }

        Ok(())
    }

    /// Non-thumbnail images stored for a user, optionally limited to
    /// one kind.
    pub async fn list(
        &self,
        user_id: i32,
        kind: Option<ImageKind>,
    ) -> Result<Vec<UserImage>, ImageError> {
        let kinds = kind.map_or_else(
            || vec![ImageKind::Bottle, ImageKind::Swatch, ImageKind::NailArt],
            |k| vec![k],
        );

        let mut found = Vec::new();
        for kind in kinds {
            let dir = self.user_dir(user_id, kind);
            let Ok(mut entries) = fs::read_dir(&dir).await else {
                continue;
            };

            while let Some(entry) = entries.next_entry().await? {
                let Ok(name) = entry.file_name().into_string() else {
                    continue;
                };
                if name.starts_with("thumb_") {
                    continue;
                }
                found.push(UserImage {
                    image_url: public_url(user_id, kind, &name),
                    thumbnail_url: public_url(user_id, kind, &format!("thumb_{name}")),
                    kind: kind.as_str().to_string(),
                    filename: name,
                });
            }
        }

        Ok(found)
    }

    fn user_dir(&self, user_id: i32, kind: ImageKind) -> PathBuf {
        self.uploads_root
            .join("users")
            .join(user_id.to_string())
            .join(kind.as_str())
    }
}

fn public_url(user_id: i32, kind: ImageKind, filename: &str) -> String {
    format!("/uploads/users/{user_id}/{}/{filename}", kind.as_str())
}

fn write_jpeg(img: &DynamicImage, path: &Path, quality: u8) -> Result<(), ImageError> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    img.to_rgb8().write_with_encoder(encoder)?;
    Ok(())
}

async fn remove_quietly(path: &Path) {
    if let Err(err) = fs::remove_file(path).await
        && err.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), %err, "Failed to remove image file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::new_rgb8(width, height);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn temp_service() -> (ImageService, PathBuf) {
        let root = std::env::temp_dir().join(format!("lacquer-test-{}", Uuid::new_v4()));
        (ImageService::new(root.clone()), root)
    }

    #[tokio::test]
    async fn test_store_writes_image_and_thumbnail() {
        let (service, root) = temp_service();

        let stored = service
            .store(png_bytes(1200, 900), 7, ImageKind::Bottle)
            .await
            .unwrap();

        assert!(stored.image_url.starts_with("/uploads/users/7/bottle/"));
        assert!(stored.image_url.ends_with(".jpg"));
        assert!(stored.thumbnail_url.contains("/thumb_"));

        let listed = service.list(7, Some(ImageKind::Bottle)).await.unwrap();
        assert_eq!(listed.len(), 1);

        // Main copy must have been shrunk to fit 800x800.
        let path = root
            .join("users")
            .join("7")
            .join("bottle")
            .join(&listed[0].filename);
        let saved = image::open(&path).unwrap();
        assert!(saved.width() <= 800 && saved.height() <= 800);

        tokio::fs::remove_dir_all(&root).await.ok();
    }

    #[tokio::test]
    async fn test_store_rejects_garbage() {
        let (service, root) = temp_service();
        let result = service.store(b"not an image".to_vec(), 1, ImageKind::Swatch).await;
        assert!(matches!(result, Err(ImageError::Process(_))));
        tokio::fs::remove_dir_all(&root).await.ok();
    }

    #[tokio::test]
    async fn test_delete_scopes_to_user() {
        let (service, root) = temp_service();

        let stored = service
            .store(png_bytes(100, 100), 3, ImageKind::Swatch)
            .await
            .unwrap();

        // A different user may not delete it.
        assert!(matches!(
            service.delete(4, &stored.image_url).await,
            Err(ImageError::OutsideUserDir)
        ));

        // The owner may, and a second delete is quiet.
        service.delete(3, &stored.image_url).await.unwrap();
        service.delete(3, &stored.image_url).await.unwrap();
        assert!(service.list(3, None).await.unwrap().is_empty());

        tokio::fs::remove_dir_all(&root).await.ok();
    }

    #[test]
    fn test_image_kind_parse() {
        assert_eq!(ImageKind::parse("bottle"), Some(ImageKind::Bottle));
        assert_eq!(ImageKind::parse("nail-art"), Some(ImageKind::NailArt));
        assert_eq!(ImageKind::parse("selfie"), None);
    }
}
