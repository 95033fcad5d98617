/// Color extraction and gradient synthesis
///
/// This module turns a downsampled RGBA pixel buffer into a small ordered
/// palette of hex colors suitable for gradient stops:
/// - Transparent pixels are ignored (alpha below 50%)
/// - Channels are quantized to 16 levels so similar colors group together
/// - The most frequent quantized colors win, ranked by pixel count
/// - The final palette is sorted by hue for a pleasing left-to-right gradient

use std::collections::HashMap;

/// Default number of colors extracted from an image
pub const DEFAULT_PALETTE_SIZE: usize = 8;

/// Pixels with alpha below this byte value are skipped (50% opacity)
const ALPHA_THRESHOLD: u8 = 128;

/// Quantization step: 256 / 16 levels per channel
const QUANT_STEP: u8 = 16;

/// Quantize a channel value down to its 16-level bucket.
/// Idempotent: quantizing an already-quantized value is a no-op.
pub fn quantize_channel(value: u8) -> u8 {
    (value / QUANT_STEP) * QUANT_STEP
}

/// Extract the most significant colors from an RGBA byte buffer.
///
/// The buffer is expected to be a small, already-downsampled image
/// (interleaved RGBA, 4 bytes per pixel). Returns up to `max_colors`
/// lowercase `#rrggbb` strings sorted ascending by hue.
///
/// An image with fewer distinct quantized colors than requested simply
/// returns fewer colors. A fully transparent buffer returns an empty list.
pub fn extract_palette(rgba: &[u8], max_colors: usize) -> Vec<String> {
    // Frequency histogram over quantized colors.
    // The second tuple field records first-seen order so that frequency
    // ties rank in encounter order, keeping the output deterministic.
    let mut histogram: HashMap<[u8; 3], (usize, usize)> = HashMap::new();
    let mut next_rank = 0usize;

    for pixel in rgba.chunks_exact(4) {
        if pixel[3] < ALPHA_THRESHOLD {
            continue;
        }

        let key = [
            quantize_channel(pixel[0]),
            quantize_channel(pixel[1]),
            quantize_channel(pixel[2]),
        ];

        let entry = histogram.entry(key).or_insert_with(|| {
            next_rank += 1;
            (0, next_rank)
        });
        entry.0 += 1;
    }

    // Rank by descending frequency, then first-seen order
    let mut ranked: Vec<([u8; 3], (usize, usize))> = histogram.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));

    let mut colors: Vec<String> = ranked
        .into_iter()
        .take(max_colors)
        .map(|(rgb, _)| rgb_to_hex(rgb[0], rgb[1], rgb[2]))
        .collect();

    sort_colors_by_hue(&mut colors);
    colors
}

/// Convert an RGB triple to a lowercase `#rrggbb` string.
pub fn rgb_to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// Parse a `#rrggbb` string back into an RGB triple.
/// Returns None for anything that isn't a 7-character hex color.
pub fn hex_to_rgb(hex: &str) -> Option<[u8; 3]> {
    if hex.len() != 7 || !hex.starts_with('#') {
        return None;
    }
    let r = u8::from_str_radix(&hex[1..3], 16).ok()?;
    let g = u8::from_str_radix(&hex[3..5], 16).ok()?;
    let b = u8::from_str_radix(&hex[5..7], 16).ok()?;
    Some([r, g, b])
}

/// Convert a hex color to HSL. Hue and the other components are in [0, 1].
/// Achromatic colors (r == g == b) report hue 0.
pub fn hex_to_hsl(hex: &str) -> (f32, f32, f32) {
    let [r, g, b] = match hex_to_rgb(hex) {
        Some(rgb) => rgb,
        None => return (0.0, 0.0, 0.0),
    };

    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        // Achromatic
        return (0.0, 0.0, l);
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let mut h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    h /= 6.0;

    (h, s, l)
}

/// Stably sort colors ascending by hue.
pub fn sort_colors_by_hue(colors: &mut [String]) {
    colors.sort_by(|a, b| {
        let (ha, _, _) = hex_to_hsl(a);
        let (hb, _, _) = hex_to_hsl(b);
        ha.partial_cmp(&hb).unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Build a CSS background value from gradient stops.
///
/// Zero colors yields the sentinel "none", a single color yields that color
/// verbatim (a flat fill, not a gradient expression), and two or more yield
/// a left-to-right linear gradient listing the stops in input order.
pub fn gradient_css(colors: &[String]) -> String {
    match colors {
        [] => "none".to_string(),
        [only] => only.clone(),
        many => format!("linear-gradient(to right, {})", many.join(", ")),
    }
}
