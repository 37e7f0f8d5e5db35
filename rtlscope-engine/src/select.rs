//! Visualization sink selection.
//!
//! The variant is chosen once, trying the GPU displays first and the
//! standard FFT + waterfall pair last.

use log::{info, warn};
use rtlscope_messages::{
    DisplaySettings, GpuCapability, RadioConfig, RendererSupport, SinkVariant, SpectrumFrame,
    Surface, SurfaceKind, surface_channel,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("{0} renderer is not compiled into this build")]
    RendererMissing(&'static str),
    #[error("invalid display settings: {0}")]
    InvalidSettings(String),
}

/// Engine side of one display: what the sink block is built from.
#[derive(Debug, Clone)]
pub struct SinkPlan {
    pub kind: SurfaceKind,
    pub settings: DisplaySettings,
    pub frames: flume::Sender<SpectrumFrame>,
}

/// Sinks for the flowgraph together with the surfaces the window embeds.
#[derive(Debug)]
pub struct SinkSet {
    pub sinks: Vec<SinkPlan>,
    pub surfaces: Vec<Surface>,
}

impl SinkSet {
    /// Add a sink and its surface, joined by a fresh frame channel.
    pub fn push(&mut self, kind: SurfaceKind, settings: DisplaySettings) {
        let (frames, surface) = surface_channel(kind, settings.clone());
        self.sinks.push(SinkPlan {
            kind,
            settings,
            frames,
        });
        self.surfaces.push(surface);
    }

    pub fn single(kind: SurfaceKind, settings: DisplaySettings) -> Self {
        let mut set = Self {
            sinks: Vec::new(),
            surfaces: Vec::new(),
        };
        set.push(kind, settings);
        set
    }
}

/// Constructors for the three visualization variants.
pub trait SinkFactory {
    fn gpu_primary(&mut self, config: &RadioConfig) -> Result<SinkSet, SinkError>;
    fn gpu_fallback(&mut self, config: &RadioConfig) -> Result<SinkSet, SinkError>;
    fn standard(&mut self, config: &RadioConfig) -> Result<SinkSet, SinkError>;
}

#[derive(Debug)]
pub struct Selection {
    pub variant: SinkVariant,
    pub sinks: SinkSet,
}

/// Build the preferred sink set the current machine supports.
///
/// GPU constructors are only called when `gpu` is available. Only a failure
/// of the standard set is returned as an error.
pub fn select_sinks(
    gpu: &GpuCapability,
    factory: &mut dyn SinkFactory,
    config: &RadioConfig,
) -> Result<Selection, SinkError> {
    if gpu.is_available() {
        match factory.gpu_primary(config) {
            Ok(sinks) => {
                info!("Using GPU-accelerated spectrum display");
                return Ok(Selection {
                    variant: SinkVariant::GpuPrimary,
                    sinks,
                });
            }
            Err(e) => warn!("GPU spectrum display failed: {e}"),
        }
        match factory.gpu_fallback(config) {
            Ok(sinks) => {
                info!("Using GPU spectrum display (OpenGL fallback)");
                return Ok(Selection {
                    variant: SinkVariant::GpuFallback,
                    sinks,
                });
            }
            Err(e) => warn!("GPU fallback display failed: {e}"),
        }
    }

    let sinks = factory.standard(config)?;
    info!("Using standard FFT and waterfall displays");
    Ok(Selection {
        variant: SinkVariant::Standard,
        sinks,
    })
}

/// The production factory: displays are eframe surfaces, available
/// according to the renderers compiled in.
#[derive(Debug, Clone, Copy)]
pub struct DisplaySinkFactory {
    support: RendererSupport,
}

impl DisplaySinkFactory {
    pub fn new(support: RendererSupport) -> Self {
        Self { support }
    }
}

fn validate(settings: &DisplaySettings) -> Result<(), SinkError> {
    if !settings.fft_size.is_power_of_two() {
        return Err(SinkError::InvalidSettings(format!(
            "FFT size {} is not a power of two",
            settings.fft_size
        )));
    }
    if settings.bandwidth.as_hz() <= 0.0 {
        return Err(SinkError::InvalidSettings(format!(
            "bandwidth {} must be positive",
            settings.bandwidth
        )));
    }
    Ok(())
}

impl SinkFactory for DisplaySinkFactory {
    fn gpu_primary(&mut self, config: &RadioConfig) -> Result<SinkSet, SinkError> {
        if !self.support.wgpu {
            return Err(SinkError::RendererMissing("wgpu"));
        }
        let settings = DisplaySettings::phosphor(config);
        validate(&settings)?;
        Ok(SinkSet::single(SurfaceKind::Phosphor, settings))
    }

    fn gpu_fallback(&mut self, config: &RadioConfig) -> Result<SinkSet, SinkError> {
        if !self.support.glow {
            return Err(SinkError::RendererMissing("glow"));
        }
        let settings = DisplaySettings::phosphor(config);
        validate(&settings)?;
        Ok(SinkSet::single(SurfaceKind::Phosphor, settings))
    }

    fn standard(&mut self, config: &RadioConfig) -> Result<SinkSet, SinkError> {
        let spectrum = DisplaySettings::spectrum(config);
        let waterfall = DisplaySettings::waterfall(config);
        validate(&spectrum)?;
        validate(&waterfall)?;

        let mut set = SinkSet::single(SurfaceKind::Spectrum, spectrum);
        set.push(SurfaceKind::Waterfall, waterfall);
        Ok(set)
    }
}
