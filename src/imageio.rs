/// Image loading shared by the palette and editor screens
///
/// Files are accepted by extension before any decoding starts; decode work
/// runs on a blocking thread so the UI stays responsive.

use std::path::{Path, PathBuf};
use tokio::task;

/// Extensions accepted by the image pickers
pub const IMAGE_EXTENSIONS: [&str; 8] = ["png", "jpg", "jpeg", "gif", "webp", "bmp", "tif", "tiff"];

/// Check whether a file looks like an image by its extension.
/// This runs before any decoding, so a bad pick is rejected cheaply.
pub fn is_image_file(path: &Path) -> bool {
    match path.extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// A decoded image held as raw RGBA bytes
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    /// Interleaved RGBA, 4 bytes per pixel
    pub pixels: Vec<u8>,
}

impl LoadedImage {
    /// Handle for displaying this image in an iced image widget
    pub fn handle(&self) -> iced::widget::image::Handle {
        iced::widget::image::Handle::from_rgba(self.width, self.height, self.pixels.clone())
    }

    /// Reconstruct an image buffer for further processing
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }
}

/// Load and decode an image file in the background.
/// Runs in a blocking thread because decoding is CPU-intensive.
pub async fn load_image(path: PathBuf) -> Result<LoadedImage, String> {
    task::spawn_blocking(move || load_image_blocking(&path))
        .await
        .map_err(|e| format!("Task join error: {}", e))?
}

fn load_image_blocking(path: &Path) -> Result<LoadedImage, String> {
    if !is_image_file(path) {
        return Err("Please choose an image file".to_string());
    }

    let img = image::open(path).map_err(|e| format!("Failed to decode image: {}", e))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    println!("🖼️  Loaded image: {}x{} ({})", width, height, path.display());

    Ok(LoadedImage {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_accepts_images() {
        assert!(is_image_file(Path::new("photo.png")));
        assert!(is_image_file(Path::new("photo.JPG")));
        assert!(is_image_file(Path::new("dir/photo.webp")));
    }

    #[test]
    fn extension_check_rejects_non_images() {
        assert!(!is_image_file(Path::new("notes.txt")));
        assert!(!is_image_file(Path::new("song.mp3")));
        assert!(!is_image_file(Path::new("no_extension")));
    }

    #[test]
    fn missing_file_reports_error() {
        let err = load_image_blocking(Path::new("/nonexistent/photo.png"));
        assert!(err.is_err());
    }
}
