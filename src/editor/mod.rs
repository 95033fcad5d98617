/// Image filter editor screen
///
/// Pick an image and adjust five CSS-style filters with live preview. The
/// preview works on a downscaled copy so slider drags stay responsive; the
/// export path re-applies the filters at full resolution. Filter settings
/// save and load as JSON presets.

pub mod filters;

use std::path::PathBuf;
use std::time::Duration;

use iced::widget::image::Handle;
use iced::widget::{button, column, container, image as image_widget, row, slider, text};
use iced::{Alignment, Element, Length, Task};
use rfd::FileDialog;
use tokio::task;

use crate::imageio::{self, LoadedImage, IMAGE_EXTENSIONS};
use filters::{apply_filters, FilterParams};

/// How long error banners stay up
const ERROR_DISMISS: Duration = Duration::from_secs(5);

/// Longest side of the preview copy
const PREVIEW_SIZE: u32 = 1024;

/// An image prepared for editing: the original plus a downscaled preview base
#[derive(Debug, Clone)]
pub struct EditorImage {
    original: LoadedImage,
    preview_base: LoadedImage,
}

#[derive(Debug, Clone)]
pub enum Message {
    PickImage,
    Loaded(Result<EditorImage, String>),
    GrayscaleChanged(f32),
    SepiaChanged(f32),
    InvertChanged(f32),
    BrightnessChanged(f32),
    ContrastChanged(f32),
    PreviewRendered(u64, Result<Handle, String>),
    Reset,
    ExportPng,
    ExportFinished(Result<String, String>),
    SavePreset,
    PresetSaved(Result<String, String>),
    LoadPreset,
    PresetLoaded(Result<FilterParams, String>),
    DismissError(u64),
}

#[derive(Debug, Default)]
pub struct FilterEditor {
    image: Option<EditorImage>,
    params: FilterParams,
    /// Current preview frame, already filtered
    preview: Option<Handle>,
    /// Bumped per preview request so stale frames are dropped
    preview_seq: u64,
    loading: bool,
    exporting: bool,
    feedback: String,
    error: Option<String>,
    error_seq: u64,
}

impl FilterEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PickImage => {
                if self.loading {
                    return Task::none();
                }

                let picked = FileDialog::new()
                    .set_title("Select an Image")
                    .add_filter("Images", &IMAGE_EXTENSIONS)
                    .pick_file();

                match picked {
                    Some(path) if imageio::is_image_file(&path) => {
                        self.loading = true;
                        Task::perform(load_for_editing(path), Message::Loaded)
                    }
                    Some(_) => self.show_error("Please choose an image file"),
                    None => Task::none(),
                }
            }

            Message::Loaded(result) => {
                self.loading = false;
                match result {
                    Ok(image) => {
                        self.preview = Some(image.preview_base.handle());
                        self.image = Some(image);
                        self.params.reset();
                        self.feedback = String::new();
                        Task::none()
                    }
                    Err(err) => self.show_error(err),
                }
            }

            Message::GrayscaleChanged(v) => {
                self.params.grayscale = v;
                self.request_preview()
            }
            Message::SepiaChanged(v) => {
                self.params.sepia = v;
                self.request_preview()
            }
            Message::InvertChanged(v) => {
                self.params.invert = v;
                self.request_preview()
            }
            Message::BrightnessChanged(v) => {
                self.params.brightness = v;
                self.request_preview()
            }
            Message::ContrastChanged(v) => {
                self.params.contrast = v;
                self.request_preview()
            }

            Message::PreviewRendered(seq, result) => {
                // Drop frames from superseded slider positions
                if seq != self.preview_seq {
                    return Task::none();
                }
                match result {
                    Ok(handle) => {
                        self.preview = Some(handle);
                        Task::none()
                    }
                    Err(err) => self.show_error(err),
                }
            }

            Message::Reset => {
                self.params.reset();
                self.feedback = String::new();
                self.request_preview()
            }

            Message::ExportPng => {
                let image = match &self.image {
                    Some(image) => image.original.clone(),
                    None => return self.show_error("Please choose an image first"),
                };
                if self.exporting {
                    return Task::none();
                }

                let default_name = format!(
                    "filtered-{}.png",
                    chrono::Local::now().format("%Y%m%d-%H%M%S")
                );
                let picked = FileDialog::new()
                    .set_title("Save Filtered Image")
                    .add_filter("PNG Image", &["png"])
                    .set_file_name(&default_name)
                    .save_file();

                match picked {
                    Some(path) => {
                        self.exporting = true;
                        self.feedback = "Exporting full-resolution image...".to_string();
                        Task::perform(
                            export_png(image, self.params, path),
                            Message::ExportFinished,
                        )
                    }
                    None => Task::none(),
                }
            }

            Message::ExportFinished(result) => {
                self.exporting = false;
                match result {
                    Ok(path) => {
                        println!("💾 Exported filtered image to {}", path);
                        self.feedback = format!("Saved to {}", path);
                        Task::none()
                    }
                    Err(err) => {
                        self.feedback = String::new();
                        self.show_error(err)
                    }
                }
            }

            Message::SavePreset => {
                let json = match self.params.to_json() {
                    Ok(json) => json,
                    Err(err) => {
                        return self.show_error(format!("Failed to serialize preset: {}", err))
                    }
                };

                let picked = FileDialog::new()
                    .set_title("Save Filter Preset")
                    .add_filter("JSON Preset", &["json"])
                    .set_file_name("filter-preset.json")
                    .save_file();

                match picked {
                    Some(path) => Task::perform(write_preset(path, json), Message::PresetSaved),
                    None => Task::none(),
                }
            }

            Message::PresetSaved(result) => match result {
                Ok(path) => {
                    self.feedback = format!("Preset saved to {}", path);
                    Task::none()
                }
                Err(err) => self.show_error(err),
            },

            Message::LoadPreset => {
                let picked = FileDialog::new()
                    .set_title("Load Filter Preset")
                    .add_filter("JSON Preset", &["json"])
                    .pick_file();

                match picked {
                    Some(path) => Task::perform(read_preset(path), Message::PresetLoaded),
                    None => Task::none(),
                }
            }

            Message::PresetLoaded(result) => match result {
                Ok(params) => {
                    self.params = params;
                    self.feedback = "Preset loaded.".to_string();
                    self.request_preview()
                }
                Err(err) => self.show_error(err),
            },

            Message::DismissError(seq) => {
                if seq == self.error_seq {
                    self.error = None;
                }
                Task::none()
            }
        }
    }

    /// Kick off a background re-filter of the preview base.
    /// The newest request wins; older frames are discarded on arrival.
    fn request_preview(&mut self) -> Task<Message> {
        let base = match &self.image {
            Some(image) => image.preview_base.clone(),
            None => return Task::none(),
        };

        self.preview_seq += 1;
        let seq = self.preview_seq;
        let params = self.params;

        Task::perform(render_preview(base, params), move |result| {
            Message::PreviewRendered(seq, result)
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
            text("Image Filter Editor").size(32),
            button("Choose Image")
                .on_press_maybe((!self.loading).then_some(Message::PickImage))
                .padding(10),
        ]
        .spacing(16);

        if self.loading {
            content = content.push(text("Loading image...").size(16));
        }
        if let Some(error) = &self.error {
            content = content.push(text(error).size(16));
        }
        if !self.feedback.is_empty() {
            content = content.push(text(&self.feedback).size(14));
        }

        if let Some(preview) = &self.preview {
            content = content.push(
                image_widget(preview.clone())
                    .width(Length::Fixed(512.0))
                    .height(Length::Fixed(384.0)),
            );
        }

        if self.image.is_some() {
            content = content.push(filter_slider(
                "Grayscale",
                self.params.grayscale,
                100.0,
                Message::GrayscaleChanged,
            ));
            content = content.push(filter_slider(
                "Sepia",
                self.params.sepia,
                100.0,
                Message::SepiaChanged,
            ));
            content = content.push(filter_slider(
                "Invert",
                self.params.invert,
                100.0,
                Message::InvertChanged,
            ));
            content = content.push(filter_slider(
                "Brightness",
                self.params.brightness,
                200.0,
                Message::BrightnessChanged,
            ));
            content = content.push(filter_slider(
                "Contrast",
                self.params.contrast,
                200.0,
                Message::ContrastChanged,
            ));

            content = content.push(
                row![
                    button("Reset").on_press(Message::Reset),
                    button("Export PNG").on_press_maybe(
                        (!self.exporting).then_some(Message::ExportPng)
                    ),
                    button("Save Preset").on_press(Message::SavePreset),
                    button("Load Preset").on_press(Message::LoadPreset),
                ]
                .spacing(12),
            );
        }

        container(content.padding(24))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

/// One labelled filter slider row
fn filter_slider<'a>(
    label: &'a str,
    value: f32,
    max: f32,
    on_change: fn(f32) -> Message,
) -> Element<'a, Message> {
    row![
        text(label).size(14).width(Length::Fixed(90.0)),
        slider(0.0..=max, value, on_change).width(Length::Fixed(300.0)),
        text(format!("{:.0}", value)).size(14),
    ]
    .spacing(12)
    .align_y(Alignment::Center)
    .into()
}

/// Load an image and prepare its downscaled preview base
async fn load_for_editing(path: PathBuf) -> Result<EditorImage, String> {
    let original = imageio::load_image(path).await?;

    task::spawn_blocking(move || {
        let preview_base = if original.width <= PREVIEW_SIZE && original.height <= PREVIEW_SIZE {
            original.clone()
        } else {
            let rgba = original
                .to_rgba_image()
                .ok_or_else(|| "Image buffer has invalid dimensions".to_string())?;
            let small = image::DynamicImage::ImageRgba8(rgba)
                .resize(PREVIEW_SIZE, PREVIEW_SIZE, image::imageops::FilterType::Triangle)
                .to_rgba8();
            let (width, height) = small.dimensions();
            LoadedImage {
                width,
                height,
                pixels: small.into_raw(),
            }
        };

        Ok(EditorImage {
            original,
            preview_base,
        })
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))?
}

/// Filter the preview base off the UI thread
async fn render_preview(base: LoadedImage, params: FilterParams) -> Result<Handle, String> {
    task::spawn_blocking(move || {
        let rgba = base
            .to_rgba_image()
            .ok_or_else(|| "Image buffer has invalid dimensions".to_string())?;
        let filtered = apply_filters(&rgba, &params);
        let (width, height) = filtered.dimensions();
        Ok(Handle::from_rgba(width, height, filtered.into_raw()))
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))?
}

/// Apply the filters at full resolution and save as PNG
async fn export_png(
    original: LoadedImage,
    params: FilterParams,
    path: PathBuf,
) -> Result<String, String> {
    task::spawn_blocking(move || {
        let rgba = original
            .to_rgba_image()
            .ok_or_else(|| "Image buffer has invalid dimensions".to_string())?;
        let filtered = apply_filters(&rgba, &params);
        filtered
            .save(&path)
            .map_err(|e| format!("Failed to save image: {}", e))?;
        Ok(path.display().to_string())
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))?
}

/// Write a preset JSON file
async fn write_preset(path: PathBuf, json: String) -> Result<String, String> {
    task::spawn_blocking(move || {
        std::fs::write(&path, json).map_err(|e| format!("Failed to save preset: {}", e))?;
        Ok(path.display().to_string())
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))?
}

/// Read and parse a preset JSON file
async fn read_preset(path: PathBuf) -> Result<FilterParams, String> {
    task::spawn_blocking(move || {
        let json =
            std::fs::read_to_string(&path).map_err(|e| format!("Failed to read preset: {}", e))?;
        FilterParams::from_json(&json).map_err(|e| format!("Invalid preset file: {}", e))
    })
    .await
    .map_err(|e| format!("Task join error: {}", e))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded_image() -> EditorImage {
        let image = LoadedImage {
            width: 2,
            height: 1,
            pixels: vec![255, 0, 0, 255, 0, 255, 0, 255],
        };
        EditorImage {
            original: image.clone(),
            preview_base: image,
        }
    }

    #[test]
    fn slider_changes_update_params() {
        let mut editor = FilterEditor::new();
        editor.image = Some(loaded_image());

        let _ = editor.update(Message::GrayscaleChanged(40.0));
        let _ = editor.update(Message::BrightnessChanged(150.0));

        assert_eq!(editor.params.grayscale, 40.0);
        assert_eq!(editor.params.brightness, 150.0);
        assert!(!editor.params.is_identity());
    }

    #[test]
    fn stale_preview_frames_are_dropped() {
        let mut editor = FilterEditor::new();
        editor.image = Some(loaded_image());

        // Two requests in flight; only the second may land
        let _ = editor.update(Message::GrayscaleChanged(10.0));
        let _ = editor.update(Message::GrayscaleChanged(20.0));
        assert_eq!(editor.preview_seq, 2);

        let stale = Handle::from_rgba(1, 1, vec![0, 0, 0, 255]);
        let _ = editor.update(Message::PreviewRendered(1, Ok(stale)));
        assert!(editor.preview.is_none());

        let fresh = Handle::from_rgba(1, 1, vec![255, 255, 255, 255]);
        let _ = editor.update(Message::PreviewRendered(2, Ok(fresh)));
        assert!(editor.preview.is_some());
    }

    #[test]
    fn reset_restores_identity() {
        let mut editor = FilterEditor::new();
        editor.image = Some(loaded_image());
        editor.params.invert = 100.0;
        editor.params.contrast = 30.0;

        let _ = editor.update(Message::Reset);

        assert!(editor.params.is_identity());
    }

    #[test]
    fn loading_an_image_resets_filters() {
        let mut editor = FilterEditor::new();
        editor.params.sepia = 80.0;
        editor.loading = true;

        let _ = editor.update(Message::Loaded(Ok(loaded_image())));

        assert!(!editor.loading);
        assert!(editor.params.is_identity());
        assert!(editor.preview.is_some());
    }

    #[test]
    fn loaded_preset_applies_to_params() {
        let mut editor = FilterEditor::new();
        editor.image = Some(loaded_image());

        let mut params = FilterParams::default();
        params.sepia = 60.0;
        let _ = editor.update(Message::PresetLoaded(Ok(params)));

        assert_eq!(editor.params.sepia, 60.0);
    }

    #[tokio::test]
    async fn export_without_image_is_an_error() {
        let mut editor = FilterEditor::new();
        let _ = editor.update(Message::ExportPng);
        assert_eq!(editor.error.as_deref(), Some("Please choose an image first"));
    }
}
