use crate::DisplaySettings;

/// Frames a display may fall behind by before new ones are dropped.
const FRAME_QUEUE_DEPTH: usize = 4;

/// One power spectrum in dB, DC in the middle bin.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumFrame {
    pub bins: Vec<f32>,
}

/// Kind of visual a surface draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// Persistence histogram above a waterfall, the GPU display.
    Phosphor,
    /// Spectrum trace.
    Spectrum,
    /// Scrolling time × frequency heatmap.
    Waterfall,
}

/// A display's receiving end: what the window embeds.
#[derive(Debug)]
pub struct Surface {
    pub kind: SurfaceKind,
    pub settings: DisplaySettings,
    pub frames: flume::Receiver<SpectrumFrame>,
}

/// Create the frame channel joining a sink block to its surface.
pub fn surface_channel(
    kind: SurfaceKind,
    settings: DisplaySettings,
) -> (flume::Sender<SpectrumFrame>, Surface) {
    let (tx, rx) = flume::bounded(FRAME_QUEUE_DEPTH);
    (
        tx,
        Surface {
            kind,
            settings,
            frames: rx,
        },
    )
}
