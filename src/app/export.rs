use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, anyhow};
use eframe::egui::{self, ColorImage, Context, Rect};
use tracing::{info, warn};

use super::ViewModel;

pub(super) const EXPORT_FILE_NAME: &str = "wallet-connections.png";

pub(super) struct ExportState {
    dir: PathBuf,
    /// Canvas region of the last frame, in points.
    canvas_rect: Option<Rect>,
    awaiting_screenshot: bool,
}

impl ExportState {
    pub(super) fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            canvas_rect: None,
            awaiting_screenshot: false,
        }
    }

    pub(super) fn is_busy(&self) -> bool {
        self.awaiting_screenshot
    }

    pub(super) fn set_canvas_rect(&mut self, rect: Rect) {
        self.canvas_rect = Some(rect);
    }
}

/// RGBA pixels to PNG bytes.
pub(super) fn encode_png(capture: &ColorImage) -> anyhow::Result<Vec<u8>> {
    let [width, height] = capture.size;
    let mut rgba = Vec::with_capacity(capture.pixels.len() * 4);
    for pixel in &capture.pixels {
        rgba.extend_from_slice(&pixel.to_srgba_unmultiplied());
    }

    let buffer = image::RgbaImage::from_raw(width as u32, height as u32, rgba)
        .ok_or_else(|| anyhow!("pixel buffer does not match a {width}x{height} image"))?;
    let mut bytes = Cursor::new(Vec::new());
    buffer
        .write_to(&mut bytes, image::ImageFormat::Png)
        .context("failed to encode PNG")?;
    Ok(bytes.into_inner())
}

pub(super) fn save_png(dir: &Path, png: &[u8]) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export directory {}", dir.display()))?;
    let path = dir.join(EXPORT_FILE_NAME);
    fs::write(&path, png).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

impl ViewModel {
    pub(in crate::app) fn request_export(&mut self, ctx: &Context) {
        if self.export.awaiting_screenshot {
            return;
        }
        if self.export.canvas_rect.is_none() {
            self.notify(ctx, "Nothing to export yet", true);
            return;
        }

        self.export.awaiting_screenshot = true;
        ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(egui::UserData::default()));
    }

    /// Picks up a screenshot requested by `request_export` and writes the
    /// canvas region of it to disk.
    pub(in crate::app) fn collect_screenshot(&mut self, ctx: &Context) {
        if !self.export.awaiting_screenshot {
            return;
        }

        let screenshot = ctx.input(|input| {
            input.raw.events.iter().find_map(|event| match event {
                egui::Event::Screenshot { image, .. } => Some(Arc::clone(image)),
                _ => None,
            })
        });
        let Some(screenshot) = screenshot else {
            return;
        };
        self.export.awaiting_screenshot = false;

        let result = self.export.canvas_rect.map_or_else(
            || Err(anyhow!("graph canvas is not visible")),
            |rect| {
                let canvas = screenshot.region(&rect, Some(ctx.pixels_per_point()));
                let png = encode_png(&canvas)?;
                save_png(&self.export.dir, &png)
            },
        );

        match result {
            Ok(path) => {
                info!(path = %path.display(), "exported graph image");
                self.notify(ctx, format!("Saved {}", path.display()), false);
            }
            Err(error) => {
                warn!(error = %format!("{error:#}"), "graph export failed");
                self.notify(ctx, format!("Export failed: {error}"), true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::Color32;

    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[test]
    fn encoded_canvas_starts_with_the_png_signature() {
        let capture = ColorImage::filled([12, 7], Color32::from_rgb(19, 23, 29));

        let png = encode_png(&capture).expect("encode");

        assert_eq!(&png[..8], &PNG_SIGNATURE);
        let decoded = image::load_from_memory(&png).expect("decode").to_rgba8();
        assert_eq!(decoded.dimensions(), (12, 7));
        assert_eq!(decoded.get_pixel(3, 3).0, [19, 23, 29, 255]);
    }

    #[test]
    fn export_lands_in_the_configured_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("exports");
        let png = encode_png(&ColorImage::filled([2, 2], Color32::WHITE)).expect("encode");

        let path = save_png(&target, &png).expect("save");

        assert_eq!(path, target.join(EXPORT_FILE_NAME));
        assert_eq!(fs::read(&path).expect("read back"), png);
    }
}
