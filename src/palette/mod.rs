/// Color gradient screen
///
/// Pick an image, extract its dominant colors, and preview them as gradient
/// stops. Clicking a swatch or the gradient bar copies ready-to-paste CSS to
/// the clipboard. Extraction runs on a downsampled copy in the background so
/// large photos never stall the UI.

pub mod extract;

use std::path::PathBuf;
use std::time::Duration;

use iced::widget::{button, column, container, image as image_widget, row, text};
use iced::{Alignment, Background, Border, Color, Element, Length, Task, Theme};
use rfd::FileDialog;
use tokio::task;

use crate::imageio::{self, LoadedImage, IMAGE_EXTENSIONS};
use extract::{gradient_css, hex_to_rgb, DEFAULT_PALETTE_SIZE};

/// How long the "copied" confirmation stays up
const COPIED_DISMISS: Duration = Duration::from_secs(2);

/// How long error banners stay up
const ERROR_DISMISS: Duration = Duration::from_secs(5);

/// Extraction runs on a copy no larger than this on either side
const ANALYSIS_SIZE: u32 = 100;

/// A loaded image with its extracted gradient stops
#[derive(Debug, Clone)]
pub struct Analysis {
    image: LoadedImage,
    colors: Vec<String>,
}

impl Analysis {
    pub fn new(image: LoadedImage, colors: Vec<String>) -> Self {
        Analysis { image, colors }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    PickImage,
    Analyzed(Result<Analysis, String>),
    CopyColor(String),
    CopyGradient,
    DismissCopied(u64),
    DismissError(u64),
}

#[derive(Debug, Default)]
pub struct GradientMaker {
    image: Option<LoadedImage>,
    /// Extracted stops, sorted by hue
    colors: Vec<String>,
    /// CSS background value for the current stops
    gradient: String,
    processing: bool,
    copied: Option<String>,
    copied_seq: u64,
    error: Option<String>,
    error_seq: u64,
}

impl GradientMaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently extracted gradient stops
    pub fn palette(&self) -> &[String] {
        &self.colors
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PickImage => {
                if self.processing {
                    return Task::none();
                }

                let picked = FileDialog::new()
                    .set_title("Select an Image")
                    .add_filter("Images", &IMAGE_EXTENSIONS)
                    .pick_file();

                match picked {
                    Some(path) if imageio::is_image_file(&path) => {
                        self.processing = true;
                        Task::perform(analyze_image(path), Message::Analyzed)
                    }
                    Some(_) => self.show_error("Please choose an image file"),
                    None => Task::none(),
                }
            }

            Message::Analyzed(result) => {
                self.processing = false;
                match result {
                    Ok(analysis) => {
                        println!("🎨 Extracted {} gradient stops", analysis.colors.len());
                        self.gradient = gradient_css(&analysis.colors);
                        self.image = Some(analysis.image);
                        self.colors = analysis.colors;
                        Task::none()
                    }
                    Err(err) => self.show_error(err),
                }
            }

            Message::CopyColor(hex) => {
                let css = format!("background: {};", hex);
                let notice = self.show_copied(format!("Copied {}", hex));
                Task::batch([iced::clipboard::write(css), notice])
            }

            Message::CopyGradient => {
                if self.colors.is_empty() {
                    return Task::none();
                }
                let css = format!("background: {};", self.gradient);
                let notice = self.show_copied("Copied gradient CSS".to_string());
                Task::batch([iced::clipboard::write(css), notice])
            }

            Message::DismissCopied(seq) => {
                if seq == self.copied_seq {
                    self.copied = None;
                }
                Task::none()
            }

            Message::DismissError(seq) => {
                if seq == self.error_seq {
                    self.error = None;
                }
                Task::none()
            }
        }
    }

    fn show_copied(&mut self, label: String) -> Task<Message> {
        self.copied = Some(label);
        self.copied_seq += 1;
        let seq = self.copied_seq;
        Task::perform(tokio::time::sleep(COPIED_DISMISS), move |_| {
            Message::DismissCopied(seq)
        })
    }

    fn show_error(&mut self, message: impl Into<String>) -> Task<Message> {
        self.error = Some(message.into());
        self.error_seq += 1;
        let seq = self.error_seq;
        Task::perform(tokio::time::sleep(ERROR_DISMISS), move |_| {
            Message::DismissError(seq)
        })
    }

    pub fn view(&self) -> Element<Message> {
        let mut content = column![
            text("Color Gradient Maker").size(32),
            button("Choose Image")
                .on_press_maybe((!self.processing).then_some(Message::PickImage))
                .padding(10),
        ]
        .spacing(16);

        if self.processing {
            content = content.push(text("Analyzing image...").size(16));
        }
        if let Some(error) = &self.error {
            content = content.push(text(error).size(16));
        }
        if let Some(copied) = &self.copied {
            content = content.push(text(copied).size(16));
        }

        if let Some(image) = &self.image {
            content = content.push(
                image_widget(image.handle())
                    .width(Length::Fixed(360.0))
                    .height(Length::Fixed(240.0)),
            );
        }

        if !self.colors.is_empty() {
            // Swatch row: each swatch copies its own color
            let mut swatches = row![].spacing(8);
            for hex in &self.colors {
                swatches = swatches.push(swatch_button(hex));
            }
            content = content.push(swatches);

            // Gradient preview as equal-width stop bands
            let mut bands = row![];
            for hex in &self.colors {
                bands = bands.push(stop_band(hex));
            }
            content = content.push(
                container(bands)
                    .width(Length::Fixed(480.0))
                    .height(Length::Fixed(48.0)),
            );

            content = content.push(
                row![
                    button("Copy Gradient CSS").on_press(Message::CopyGradient),
                    text(&self.gradient).size(13),
                ]
                .spacing(12)
                .align_y(Alignment::Center),
            );
        }

        container(content.padding(24))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

/// A clickable swatch filled with its color
fn swatch_button(hex: &str) -> Element<'static, Message> {
    let rgb = hex_to_rgb(hex).unwrap_or([0, 0, 0]);
    let fill = Color::from_rgb8(rgb[0], rgb[1], rgb[2]);
    let label = readable_text_color(rgb);

    button(text(hex.to_string()).size(13))
        .padding([18, 10])
        .style(move |_theme: &Theme, _status| button::Style {
            background: Some(Background::Color(fill)),
            text_color: label,
            border: Border {
                radius: 6.0.into(),
                ..Border::default()
            },
            ..button::Style::default()
        })
        .on_press(Message::CopyColor(hex.to_string()))
        .into()
}

/// One fixed-width band of the gradient preview
fn stop_band(hex: &str) -> Element<'static, Message> {
    let rgb = hex_to_rgb(hex).unwrap_or([0, 0, 0]);
    let fill = Color::from_rgb8(rgb[0], rgb[1], rgb[2]);

    container(text(""))
        .width(Length::Fill)
        .height(Length::Fill)
        .style(move |_theme: &Theme| container::Style {
            background: Some(Background::Color(fill)),
            ..container::Style::default()
        })
        .into()
}

/// Black or white, whichever reads better over the given fill
fn readable_text_color(rgb: [u8; 3]) -> Color {
    let luma =
        0.2126 * rgb[0] as f32 + 0.7152 * rgb[1] as f32 + 0.0722 * rgb[2] as f32;
    if luma > 140.0 {
        Color::BLACK
    } else {
        Color::WHITE
    }
}

/// Load an image and extract its gradient stops in the background.
/// Extraction happens on a downsampled copy; the full-resolution image is
/// kept only for the preview.
async fn analyze_image(path: PathBuf) -> Result<Analysis, String> {
    let image = imageio::load_image(path).await?;

    task::spawn_blocking(move || {
        let rgba = image
            .to_rgba_image()
            .ok_or_else(|| "Image buffer has invalid dimensions".to_string())?;

        let small = image::DynamicImage::ImageRgba8(rgba)
            .resize(ANALYSIS_SIZE, ANALYSIS_SIZE, image::imageops::FilterType::Triangle)
            .to_rgba8();

        let colors = extract::extract_palette(small.as_raw(), DEFAULT_PALETTE_SIZE);
        Ok(Analysis { image, colors })
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn copy_dismissal_ignores_stale_sequence() {
        let mut screen = GradientMaker::new();

        let _ = screen.update(Message::CopyColor("#ff0000".to_string()));
        assert_eq!(screen.copied.as_deref(), Some("Copied #ff0000"));

        // A second copy supersedes the first timer
        let _ = screen.update(Message::CopyColor("#00ff00".to_string()));
        let _ = screen.update(Message::DismissCopied(1));
        assert_eq!(screen.copied.as_deref(), Some("Copied #00ff00"));

        let _ = screen.update(Message::DismissCopied(2));
        assert!(screen.copied.is_none());
    }

    #[test]
    fn gradient_copy_requires_stops() {
        let mut screen = GradientMaker::new();
        let _ = screen.update(Message::CopyGradient);
        assert!(screen.copied.is_none());
    }

    #[test]
    fn analysis_result_replaces_previous_palette() {
        let mut screen = GradientMaker::new();
        screen.colors = vec!["#101010".to_string()];
        screen.gradient = "#101010".to_string();
        screen.processing = true;

        let analysis = Analysis {
            image: LoadedImage {
                width: 1,
                height: 1,
                pixels: vec![255, 0, 0, 255],
            },
            colors: vec!["#f00000".to_string(), "#00f000".to_string()],
        };
        let _ = screen.update(Message::Analyzed(Ok(analysis)));

        assert!(!screen.processing);
        assert_eq!(screen.colors.len(), 2);
        assert_eq!(
            screen.gradient,
            "linear-gradient(to right, #f00000, #00f000)"
        );
    }

    #[tokio::test]
    async fn failed_analysis_shows_error() {
        let mut screen = GradientMaker::new();
        screen.processing = true;

        let _ = screen.update(Message::Analyzed(Err("Failed to decode image".to_string())));

        assert!(!screen.processing);
        assert_eq!(screen.error.as_deref(), Some("Failed to decode image"));
    }
}
