use eframe::egui::{Response, Ui, Widget};

/// Toolbar above the spectrum trace.
#[derive(Debug, Clone, Default)]
pub struct SpectrumControls {
    pub max_hold: bool,
    pub autoscale: bool,
    clear_requested: bool,
}

impl SpectrumControls {
    pub fn new(autoscale: bool) -> Self {
        Self {
            autoscale,
            ..Self::default()
        }
    }

    /// Returns whether "Clear" was clicked since the last call.
    pub fn take_clear(&mut self) -> bool {
        std::mem::take(&mut self.clear_requested)
    }
}

impl Widget for &mut SpectrumControls {
    fn ui(self, ui: &mut Ui) -> Response {
        ui.horizontal(|ui| {
            ui.checkbox(&mut self.max_hold, "Max hold");
            if ui.button("Clear").clicked() {
                self.clear_requested = true;
            }
            ui.separator();
            ui.checkbox(&mut self.autoscale, "Auto-scale");
        })
        .response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_is_consumed_once() {
        let mut controls = SpectrumControls::new(false);
        controls.clear_requested = true;
        assert!(controls.take_clear());
        assert!(!controls.take_clear());
    }
}
