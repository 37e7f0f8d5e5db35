use eframe::egui::{
    ColorImage, Rect, Response, Sense, TextureHandle, TextureOptions, Ui, UiBuilder, Widget, pos2,
    vec2,
};
use eframe::epaint::Color32;
use rtlscope_messages::{DbRange, DisplaySettings};

use crate::colormap::heat;
use crate::waterfall::Waterfall;

/// Vertical resolution of the persistence histogram.
const LEVELS: usize = 128;
/// Hit weight kept per frame.
const DECAY: f32 = 0.9;

/// Persistence histogram over a waterfall.
///
/// Every bin of every frame deposits a hit at its level; hits fade with
/// each new frame, so frequently visited levels glow.
pub struct Phosphor {
    hits: Vec<f32>,
    width: usize,
    range: DbRange,
    title: String,
    waterfall: Waterfall,
    needs_gpu_upload: bool,
    texture: Option<TextureHandle>,
}

impl Phosphor {
    pub fn new(settings: &DisplaySettings) -> Self {
        Self {
            hits: Vec::new(),
            width: 0,
            range: settings.y_range,
            title: settings.title.clone(),
            waterfall: Waterfall::new(settings),
            needs_gpu_upload: false,
            texture: None,
        }
    }

    pub fn push(&mut self, bins: &[f32]) {
        if bins.is_empty() {
            return;
        }
        if bins.len() != self.width {
            self.width = bins.len();
            self.hits = vec![0.0; self.width * LEVELS];
        }

        for h in &mut self.hits {
            *h *= DECAY;
        }
        for (x, &db) in bins.iter().enumerate() {
            let level = (self.range.normalize(db) * (LEVELS - 1) as f32).round() as usize;
            // Row 0 is the top of the image, the strongest level.
            let row = LEVELS - 1 - level;
            self.hits[row * self.width + x] += 1.0;
        }

        self.waterfall.insert_spectrum_line(bins);
        self.needs_gpu_upload = true;
    }

    /// Accumulated hits at bin `x`, level row `row` (0 = top).
    pub fn hits(&self, x: usize, row: usize) -> f32 {
        self.hits.get(row * self.width + x).copied().unwrap_or(0.0)
    }

    fn image(&self) -> ColorImage {
        // Steady state of a bin hit every frame.
        let full = 1.0 / (1.0 - DECAY);
        let pixels = self
            .hits
            .iter()
            .map(|&h| {
                if h < 0.01 {
                    Color32::BLACK
                } else {
                    heat(h / full)
                }
            })
            .collect();
        ColorImage {
            size: [self.width, LEVELS],
            source_size: vec2(self.width as f32, LEVELS as f32),
            pixels,
        }
    }
}

impl Widget for &mut Phosphor {
    fn ui(self, ui: &mut Ui) -> Response {
        ui.label(&self.title);
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::hover());
        let split = rect.top() + rect.height() * 0.6;
        let histogram = Rect::from_min_max(rect.min, pos2(rect.right(), split));
        let below = Rect::from_min_max(pos2(rect.left(), split), rect.max);

        if self.needs_gpu_upload && self.width > 0 {
            let image = self.image();
            match &mut self.texture {
                Some(texture) => texture.set(image, TextureOptions::LINEAR),
                None => {
                    self.texture = Some(ui.ctx().load_texture(
                        format!("phosphor: {}", self.title),
                        image,
                        TextureOptions::LINEAR,
                    ));
                }
            }
            self.needs_gpu_upload = false;
        }

        ui.painter().rect_filled(histogram, 0.0, Color32::BLACK);
        if let Some(texture) = &self.texture {
            ui.painter().image(
                texture.id(),
                histogram,
                Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        ui.scope_builder(UiBuilder::new().max_rect(below), |ui| {
            ui.add(&mut self.waterfall);
        });

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtlscope_messages::RadioConfig;

    #[test]
    fn test_hits_land_on_level_and_decay() {
        let mut p = Phosphor::new(&DisplaySettings::phosphor(&RadioConfig::default()));
        p.push(&[10.0, -140.0]);
        assert_eq!(p.hits(0, 0), 1.0);
        assert_eq!(p.hits(1, LEVELS - 1), 1.0);

        p.push(&[-140.0, -140.0]);
        assert!((p.hits(0, 0) - DECAY).abs() < 1e-6);
        assert!((p.hits(1, LEVELS - 1) - (DECAY + 1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_image_dark_where_never_hit() {
        let mut p = Phosphor::new(&DisplaySettings::phosphor(&RadioConfig::default()));
        p.push(&[10.0]);
        let image = p.image();
        assert_eq!(image.size, [1, LEVELS]);
        assert_ne!(image.pixels[0], Color32::BLACK);
        assert_eq!(image.pixels[LEVELS - 1], Color32::BLACK);
    }
}
