use crate::{Decibels, GpuCapability, Hertz, RadioConfig, SinkVariant};

/// What the running scope was started with, shown in the window status line.
#[derive(Debug, Clone)]
pub struct ScopeStatus {
    /// Hardware device index
    pub device_index: u32,
    /// Center frequency
    pub center_frequency: Hertz,
    /// Sample rate
    pub sample_rate: Hertz,
    /// RF gain
    pub gain: Decibels,
    /// Tuner chip reported by the driver, if any
    pub tuner: Option<String>,
    /// Visualization path chosen at startup
    pub variant: SinkVariant,
    /// GPU probe outcome
    pub gpu: GpuCapability,
}

impl ScopeStatus {
    pub fn new(
        config: &RadioConfig,
        tuner: Option<String>,
        variant: SinkVariant,
        gpu: GpuCapability,
    ) -> Self {
        Self {
            device_index: config.device_index,
            center_frequency: config.center_frequency,
            sample_rate: config.sample_rate,
            gain: config.gain,
            tuner,
            variant,
            gpu,
        }
    }
}
