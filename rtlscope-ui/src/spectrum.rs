use eframe::egui::{Align2, FontId, Pos2, Rect, Response, Sense, Shape, Stroke, Ui, Widget, pos2};
use eframe::epaint::Color32;
use rtlscope_messages::{DbRange, DisplaySettings};

use crate::control_panel::SpectrumControls;

const GRID_DIVISIONS: usize = 10;
const TRACE_COLOR: Color32 = Color32::from_rgb(0, 200, 255);
const HOLD_COLOR: Color32 = Color32::from_rgb(255, 170, 0);

/// Frequency-domain trace of the latest frame.
pub struct SpectrumPlot {
    settings: DisplaySettings,
    latest: Vec<f32>,
    max_hold: Vec<f32>,
    pub controls: SpectrumControls,
}

impl SpectrumPlot {
    pub fn new(settings: DisplaySettings) -> Self {
        let controls = SpectrumControls::new(settings.autoscale);
        Self {
            settings,
            latest: Vec::new(),
            max_hold: Vec::new(),
            controls,
        }
    }

    pub fn push(&mut self, bins: Vec<f32>) {
        if self.max_hold.len() != bins.len() || self.controls.take_clear() {
            self.max_hold = bins.clone();
        } else {
            for (held, &v) in self.max_hold.iter_mut().zip(&bins) {
                *held = held.max(v);
            }
        }
        self.latest = bins;
    }

    pub fn max_hold(&self) -> &[f32] {
        &self.max_hold
    }

    /// Vertical range currently drawn.
    pub fn y_range(&self) -> DbRange {
        if !self.controls.autoscale {
            return self.settings.y_range;
        }
        let (min, max) = self
            .latest
            .iter()
            .filter(|v| v.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if min.is_finite() && max > min {
            DbRange {
                min: min - 5.0,
                max: max + 5.0,
            }
        } else {
            self.settings.y_range
        }
    }

    fn trace(&self, bins: &[f32], rect: Rect, range: DbRange) -> Vec<Pos2> {
        let step = rect.width() / (bins.len().max(2) - 1) as f32;
        bins.iter()
            .enumerate()
            .map(|(i, &db)| {
                pos2(
                    rect.left() + i as f32 * step,
                    rect.bottom() - range.normalize(db) * rect.height(),
                )
            })
            .collect()
    }

    fn draw_grid(&self, ui: &Ui, rect: Rect, range: DbRange) {
        let painter = ui.painter();
        let grid = Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color);
        let text = ui.visuals().weak_text_color();
        let font = FontId::proportional(11.0);
        let (low, high) = self.settings.frequency_span();

        for i in 0..=GRID_DIVISIONS {
            let f = i as f32 / GRID_DIVISIONS as f32;
            let x = rect.left() + f * rect.width();
            let y = rect.bottom() - f * rect.height();
            if self.settings.grid {
                painter.line_segment([pos2(x, rect.top()), pos2(x, rect.bottom())], grid);
                painter.line_segment([pos2(rect.left(), y), pos2(rect.right(), y)], grid);
            }
            if self.settings.axis_labels && i % 2 == 0 {
                let mhz = (low + f64::from(f) * (high - low)) / 1e6;
                painter.text(
                    pos2(x, rect.bottom() - 2.0),
                    Align2::CENTER_BOTTOM,
                    format!("{mhz:.3}"),
                    font.clone(),
                    text,
                );
                let db = range.min + f * range.span();
                painter.text(
                    pos2(rect.left() + 2.0, y),
                    Align2::LEFT_CENTER,
                    format!("{db:.0}"),
                    font.clone(),
                    text,
                );
            }
        }

        if self.settings.axis_labels {
            if let Some(label) = &self.settings.y_label {
                painter.text(
                    rect.left_top() + eframe::egui::vec2(4.0, 4.0),
                    Align2::LEFT_TOP,
                    label.to_string(),
                    font.clone(),
                    text,
                );
            }
            painter.text(
                rect.right_bottom() - eframe::egui::vec2(4.0, 14.0),
                Align2::RIGHT_BOTTOM,
                "Frequency (MHz)",
                font,
                text,
            );
        }
    }
}

impl Widget for &mut SpectrumPlot {
    fn ui(self, ui: &mut Ui) -> Response {
        ui.label(&self.settings.title);
        if self.settings.control_panel {
            ui.add(&mut self.controls);
        }

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::hover());
        let range = self.y_range();
        self.draw_grid(ui, rect, range);

        if self.latest.is_empty() {
            return response;
        }
        let painter = ui.painter_at(rect);
        if self.controls.max_hold {
            painter.add(Shape::line(
                self.trace(&self.max_hold, rect, range),
                Stroke::new(1.0, HOLD_COLOR),
            ));
        }
        painter.add(Shape::line(
            self.trace(&self.latest, rect, range),
            Stroke::new(1.5, TRACE_COLOR),
        ));

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtlscope_messages::RadioConfig;

    fn plot() -> SpectrumPlot {
        SpectrumPlot::new(DisplaySettings::spectrum(&RadioConfig::default()))
    }

    #[test]
    fn test_max_hold_keeps_peaks() {
        let mut p = plot();
        p.push(vec![-100.0, -20.0, -100.0]);
        p.push(vec![-30.0, -90.0, -100.0]);
        assert_eq!(p.max_hold(), [-30.0, -20.0, -100.0]);
    }

    #[test]
    fn test_fixed_range_unless_autoscaled() {
        let mut p = plot();
        p.push(vec![-60.0, -40.0]);
        assert_eq!(p.y_range(), DbRange { min: -140.0, max: 10.0 });

        p.controls.autoscale = true;
        assert_eq!(p.y_range(), DbRange { min: -65.0, max: -35.0 });
    }

    #[test]
    fn test_trace_spans_rect() {
        let p = plot();
        let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 150.0));
        let points = p.trace(&[-140.0, 10.0, -65.0], rect, p.y_range());
        assert_eq!(points[0], pos2(0.0, 150.0));
        assert_eq!(points[1], pos2(50.0, 0.0));
        assert_eq!(points[2], pos2(100.0, 75.0));
    }
}
