use std::collections::VecDeque;

use eframe::egui::{
    ColorImage, Rect, Response, Sense, TextureHandle, TextureOptions, Ui, Widget, pos2, vec2,
};
use eframe::epaint::Color32;
use rtlscope_messages::{DbRange, DisplaySettings};

use crate::colormap::heat;

/// Spectrum lines kept for display.
const MAX_LINES: usize = 400;

/// Waterfall display widget that renders a scrolling spectrogram.
///
/// Newest line on top. Pixels are recomputed in `insert_spectrum_line()`,
/// and the texture is only re-uploaded after new data arrived.
pub struct Waterfall {
    lines: VecDeque<Vec<Color32>>,
    width: usize,
    range: DbRange,
    /// Scale colors from the range seen so far instead of `range`
    autoscale: bool,
    seen: Option<DbRange>,
    needs_gpu_upload: bool,
    /// Cached texture handle to avoid re-uploading on every frame
    texture: Option<TextureHandle>,
    name: String,
}

impl Waterfall {
    pub fn new(settings: &DisplaySettings) -> Self {
        Self {
            lines: VecDeque::with_capacity(MAX_LINES),
            width: 0,
            range: settings.y_range,
            autoscale: settings.autoscale,
            seen: None,
            needs_gpu_upload: false,
            texture: None,
            name: format!("waterfall: {}", settings.title),
        }
    }

    /// Insert a new line of dB values at the top of the waterfall.
    pub fn insert_spectrum_line(&mut self, bins: &[f32]) {
        if bins.is_empty() {
            return;
        }
        if bins.len() != self.width {
            self.lines.clear();
            self.width = bins.len();
        }

        let range = if self.autoscale {
            self.widen_seen(bins)
        } else {
            self.range
        };
        self.lines
            .push_front(bins.iter().map(|&db| heat(range.normalize(db))).collect());
        self.lines.truncate(MAX_LINES);
        self.needs_gpu_upload = true;
    }

    fn widen_seen(&mut self, bins: &[f32]) -> DbRange {
        let (min, max) = bins
            .iter()
            .filter(|v| v.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let seen = self.seen.get_or_insert(DbRange { min, max });
        seen.min = seen.min.min(min);
        seen.max = seen.max.max(max);
        *seen
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Color of bin `x` in line `y`, 0 being the newest.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Color32> {
        self.lines.get(y)?.get(x).copied()
    }

    fn image(&self) -> ColorImage {
        let height = self.lines.len();
        ColorImage {
            size: [self.width, height],
            source_size: vec2(self.width as f32, height as f32),
            pixels: self.lines.iter().flatten().copied().collect(),
        }
    }
}

impl Widget for &mut Waterfall {
    fn ui(self, ui: &mut Ui) -> Response {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::hover());

        if self.lines.is_empty() {
            ui.painter().text(
                rect.center(),
                eframe::egui::Align2::CENTER_CENTER,
                "Waiting for spectrum data...",
                eframe::egui::FontId::proportional(14.0),
                ui.visuals().weak_text_color(),
            );
            return response;
        }

        if self.needs_gpu_upload {
            let image = self.image();
            match &mut self.texture {
                Some(texture) => texture.set(image, TextureOptions::LINEAR),
                None => {
                    self.texture =
                        Some(ui.ctx().load_texture(&self.name, image, TextureOptions::LINEAR));
                }
            }
            self.needs_gpu_upload = false;
        }

        if let Some(texture) = &self.texture {
            // Lines fill the display from the top; older history scrolls off.
            let shown = (self.lines.len() as f32).min(rect.height()).max(1.0);
            let uv_bottom = shown / self.lines.len() as f32;
            let image_rect =
                Rect::from_min_size(rect.min, vec2(rect.width(), rect.height().min(shown)));
            ui.painter().image(
                texture.id(),
                image_rect,
                Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, uv_bottom)),
                Color32::WHITE,
            );
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtlscope_messages::RadioConfig;

    fn waterfall() -> Waterfall {
        Waterfall::new(&DisplaySettings::waterfall(&RadioConfig::default()))
    }

    #[test]
    fn test_newest_line_on_top() {
        let mut w = waterfall();
        w.insert_spectrum_line(&[-140.0, 10.0]);
        w.insert_spectrum_line(&[10.0, -140.0]);

        assert_eq!(w.len(), 2);
        assert_eq!(w.pixel(0, 0), Some(heat(1.0)));
        assert_eq!(w.pixel(0, 1), Some(heat(0.0)));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut w = waterfall();
        for _ in 0..MAX_LINES + 25 {
            w.insert_spectrum_line(&[0.0; 8]);
        }
        assert_eq!(w.len(), MAX_LINES);
        assert_eq!(w.image().pixels.len(), MAX_LINES * 8);
    }

    #[test]
    fn test_width_change_restarts_history() {
        let mut w = waterfall();
        w.insert_spectrum_line(&[0.0; 8]);
        w.insert_spectrum_line(&[0.0; 4]);
        assert_eq!(w.len(), 1);
        assert_eq!(w.image().size, [4, 1]);
    }
}
