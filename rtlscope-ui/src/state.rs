use flume::Receiver;
use rtlscope_messages::{SpectrumFrame, Surface, SurfaceKind};

use crate::phosphor::Phosphor;
use crate::spectrum::SpectrumPlot;
use crate::waterfall::Waterfall;

pub(crate) enum Panel {
    Spectrum(SpectrumPlot),
    Waterfall(Waterfall),
    Phosphor(Phosphor),
}

/// One surface of the window with its frame feed.
pub(crate) struct SurfacePanel {
    frames: Receiver<SpectrumFrame>,
    pub panel: Panel,
    /// False once the sink side has gone away
    pub live: bool,
}

impl SurfacePanel {
    pub fn new(surface: Surface) -> Self {
        let panel = match surface.kind {
            SurfaceKind::Spectrum => Panel::Spectrum(SpectrumPlot::new(surface.settings)),
            SurfaceKind::Waterfall => Panel::Waterfall(Waterfall::new(&surface.settings)),
            SurfaceKind::Phosphor => Panel::Phosphor(Phosphor::new(&surface.settings)),
        };
        Self {
            frames: surface.frames,
            panel,
            live: true,
        }
    }

    /// Apply every queued frame. Returns how many there were.
    pub fn drain(&mut self) -> usize {
        let mut n = 0;
        loop {
            match self.frames.try_recv() {
                Ok(frame) => {
                    n += 1;
                    match &mut self.panel {
                        Panel::Spectrum(plot) => plot.push(frame.bins),
                        Panel::Waterfall(waterfall) => waterfall.insert_spectrum_line(&frame.bins),
                        Panel::Phosphor(phosphor) => phosphor.push(&frame.bins),
                    }
                }
                Err(flume::TryRecvError::Empty) => break,
                Err(flume::TryRecvError::Disconnected) => {
                    self.live = false;
                    break;
                }
            }
        }
        n
    }

    pub fn show(&mut self, ui: &mut eframe::egui::Ui) {
        match &mut self.panel {
            Panel::Spectrum(plot) => ui.add(plot),
            Panel::Waterfall(waterfall) => ui.add(waterfall),
            Panel::Phosphor(phosphor) => ui.add(phosphor),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtlscope_messages::{DisplaySettings, RadioConfig, surface_channel};

    #[test]
    fn test_drain_feeds_waterfall_until_disconnect() {
        let settings = DisplaySettings::waterfall(&RadioConfig::default());
        let (tx, surface) = surface_channel(SurfaceKind::Waterfall, settings);
        let mut panel = SurfacePanel::new(surface);

        tx.send(SpectrumFrame { bins: vec![0.0; 4] }).unwrap();
        tx.send(SpectrumFrame { bins: vec![0.0; 4] }).unwrap();
        assert_eq!(panel.drain(), 2);
        assert!(panel.live);

        drop(tx);
        assert_eq!(panel.drain(), 0);
        assert!(!panel.live);
        let Panel::Waterfall(waterfall) = &panel.panel else {
            panic!("expected a waterfall panel");
        };
        assert_eq!(waterfall.len(), 2);
    }
}
