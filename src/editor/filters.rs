/// Filter parameters for the image editor
///
/// This struct stores the five adjustments the editor exposes. The values
/// map 1:1 onto the standard CSS filter primitives and are applied in the
/// same order CSS applies them: grayscale, sepia, invert, brightness,
/// contrast. Presets serialize to JSON for save/load.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// All filter parameters for an image
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    /// Grayscale amount (0.0 to 100.0)
    /// - 0.0 = original colors, 100.0 = fully desaturated
    pub grayscale: f32,

    /// Sepia amount (0.0 to 100.0)
    /// - 0.0 = no tint, 100.0 = full sepia tone
    pub sepia: f32,

    /// Invert amount (0.0 to 100.0)
    /// - 0.0 = original, 100.0 = fully inverted
    pub invert: f32,

    /// Brightness (0.0 to 200.0)
    /// - 100.0 = no change, 0.0 = black, 200.0 = doubled
    pub brightness: f32,

    /// Contrast (0.0 to 200.0)
    /// - 100.0 = no change, 0.0 = flat gray, 200.0 = doubled
    pub contrast: f32,
}

impl Default for FilterParams {
    /// Create default parameters (no adjustments)
    fn default() -> Self {
        Self {
            grayscale: 0.0,
            sepia: 0.0,
            invert: 0.0,
            brightness: 100.0,
            contrast: 100.0,
        }
    }
}

impl FilterParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert to JSON string for preset storage
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from a JSON preset
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check if this represents an unedited image (all values at default)
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Reset all adjustments to default
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Apply the filter chain to an RGBA image, returning a new buffer.
///
/// Channel math follows the CSS filter definitions: grayscale, sepia and
/// invert interpolate toward the filtered value, brightness multiplies, and
/// contrast pivots around mid-gray. Alpha is left untouched.
pub fn apply_filters(image: &RgbaImage, params: &FilterParams) -> RgbaImage {
    if params.is_identity() {
        return image.clone();
    }

    let gray = (params.grayscale / 100.0).clamp(0.0, 1.0);
    let sepia = (params.sepia / 100.0).clamp(0.0, 1.0);
    let invert = (params.invert / 100.0).clamp(0.0, 1.0);
    let brightness = (params.brightness / 100.0).max(0.0);
    let contrast = (params.contrast / 100.0).max(0.0);

    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let mut r = r as f32 / 255.0;
        let mut g = g as f32 / 255.0;
        let mut b = b as f32 / 255.0;

        // Grayscale: interpolate toward Rec.709 luma
        if gray > 0.0 {
            let luma = 0.2126 * r + 0.7152 * g + 0.0722 * b;
            r += (luma - r) * gray;
            g += (luma - g) * gray;
            b += (luma - b) * gray;
        }

        // Sepia: interpolate toward the sepia matrix result
        if sepia > 0.0 {
            let sr = 0.393 * r + 0.769 * g + 0.189 * b;
            let sg = 0.349 * r + 0.686 * g + 0.168 * b;
            let sb = 0.272 * r + 0.534 * g + 0.131 * b;
            r += (sr - r) * sepia;
            g += (sg - g) * sepia;
            b += (sb - b) * sepia;
        }

        // Invert: interpolate toward the complement
        if invert > 0.0 {
            r += (1.0 - 2.0 * r) * invert;
            g += (1.0 - 2.0 * g) * invert;
            b += (1.0 - 2.0 * b) * invert;
        }

        // Brightness: linear multiplier
        r *= brightness;
        g *= brightness;
        b *= brightness;

        // Contrast: pivot around mid-gray
        r = (r - 0.5) * contrast + 0.5;
        g = (g - 0.5) * contrast + 0.5;
        b = (b - 0.5) * contrast + 0.5;

        pixel.0 = [
            (r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (b.clamp(0.0, 1.0) * 255.0).round() as u8,
            a,
        ];
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_image() -> RgbaImage {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, image::Rgba([200, 50, 100, 255]));
        img.put_pixel(1, 0, image::Rgba([0, 255, 0, 255]));
        img.put_pixel(0, 1, image::Rgba([10, 10, 10, 128]));
        img.put_pixel(1, 1, image::Rgba([255, 255, 255, 0]));
        img
    }

    #[test]
    fn test_default_is_identity() {
        let params = FilterParams::default();
        assert!(params.is_identity());

        let img = test_image();
        assert_eq!(apply_filters(&img, &params), img);
    }

    #[test]
    fn test_serialization() {
        let mut params = FilterParams::default();
        params.grayscale = 40.0;
        params.brightness = 150.0;

        let json = params.to_json().unwrap();
        let restored = FilterParams::from_json(&json).unwrap();

        assert_eq!(params, restored);
        assert!(!restored.is_identity());
    }

    #[test]
    fn test_reset() {
        let mut params = FilterParams::default();
        params.invert = 100.0;
        assert!(!params.is_identity());

        params.reset();
        assert!(params.is_identity());
    }

    #[test]
    fn full_grayscale_equalizes_channels() {
        let mut params = FilterParams::default();
        params.grayscale = 100.0;

        let out = apply_filters(&test_image(), &params);
        for pixel in out.pixels() {
            let [r, g, b, _] = pixel.0;
            assert!(r.abs_diff(g) <= 1, "channels differ: {:?}", pixel.0);
            assert!(g.abs_diff(b) <= 1, "channels differ: {:?}", pixel.0);
        }
    }

    #[test]
    fn full_invert_flips_channels() {
        let mut params = FilterParams::default();
        params.invert = 100.0;

        let mut img = RgbaImage::new(1, 1);
        img.put_pixel(0, 0, image::Rgba([255, 0, 100, 200]));

        let out = apply_filters(&img, &params);
        let [r, g, b, a] = out.get_pixel(0, 0).0;
        assert_eq!(r, 0);
        assert_eq!(g, 255);
        assert_eq!(b, 155);
        assert_eq!(a, 200); // alpha untouched
    }

    #[test]
    fn zero_brightness_is_black() {
        let mut params = FilterParams::default();
        params.brightness = 0.0;

        let out = apply_filters(&test_image(), &params);
        for pixel in out.pixels() {
            let [r, g, b, _] = pixel.0;
            assert_eq!((r, g, b), (0, 0, 0));
        }
    }

    #[test]
    fn zero_contrast_is_mid_gray() {
        let mut params = FilterParams::default();
        params.contrast = 0.0;

        let out = apply_filters(&test_image(), &params);
        for pixel in out.pixels() {
            let [r, g, b, _] = pixel.0;
            assert_eq!((r, g, b), (128, 128, 128));
        }
    }
}
