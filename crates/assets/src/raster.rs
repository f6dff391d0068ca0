use image::RgbaImage;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Errors from image loading.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image decode error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("unsupported image source: {0}")]
    Unsupported(String),
}

/// A decoded RGBA image plus the reference it was loaded from.
///
/// Cloning is cheap; pixel data is shared.
#[derive(Debug, Clone)]
pub struct Image {
    source: String,
    pixels: Arc<RgbaImage>,
}

impl Image {
    pub fn new(source: impl Into<String>, pixels: RgbaImage) -> Self {
        Self {
            source: source.into(),
            pixels: Arc::new(pixels),
        }
    }

    /// A transparent image of the given size.
    pub fn blank(source: impl Into<String>, width: u32, height: u32) -> Self {
        Self::new(source, RgbaImage::new(width, height))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Height over width; 1.0 for a degenerate zero-width image.
    pub fn aspect(&self) -> f32 {
        if self.width() == 0 {
            1.0
        } else {
            self.height() as f32 / self.width() as f32
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Decode PNG bytes into an RGBA image.
pub fn decode_png(source: impl Into<String>, bytes: &[u8]) -> Result<Image, AssetError> {
    let decoded = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)?;
    Ok(Image::new(source, decoded.to_rgba8()))
}

/// Read and decode an image file.
pub fn load_image(source: impl Into<String>, path: impl AsRef<Path>) -> Result<Image, AssetError> {
    let bytes = std::fs::read(path.as_ref())?;
    decode_png(source, &bytes)
}

/// Map an image reference from the server onto a file under `root`.
///
/// Leading slashes are stripped so `/sprites/fox.png` stays inside the root.
/// Remote URLs and references that climb out of the root are rejected.
pub fn resolve_source(root: &Path, source: &str) -> Result<PathBuf, AssetError> {
    if source.contains("://") {
        return Err(AssetError::Unsupported(source.to_owned()));
    }
    let relative = Path::new(source.trim_start_matches('/'));
    let escapes = relative.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(AssetError::Unsupported(source.to_owned()));
    }
    Ok(root.join(relative))
}
