use log::info;
use rtlscope_messages::{GpuCapability, RadioConfig, SinkVariant, Surface};
use thiserror::Error;

use crate::driver::{DriverError, RadioDevice, RadioDriver};
use crate::flowgraph::Flowgraph;
use crate::select::{SinkError, SinkFactory, select_sinks};

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("failed to open RTL-SDR device #{index}")]
    Open {
        index: u32,
        #[source]
        source: DriverError,
    },
    #[error("failed to configure RTL-SDR device #{index}")]
    Configure {
        index: u32,
        #[source]
        source: DriverError,
    },
    #[error("failed to create visualization")]
    Visualization(#[from] SinkError),
    #[error("failed to build flowgraph")]
    Flowgraph(#[source] anyhow::Error),
}

/// A pipeline ready to start, plus what the window needs to show it.
pub struct Assembly {
    pub variant: SinkVariant,
    pub flowgraph: Flowgraph,
    pub surfaces: Vec<Surface>,
    pub tuner: Option<String>,
}

/// Apply `config` to an open device. Values are passed through unchanged.
pub fn configure_device(
    device: &mut dyn RadioDevice,
    config: &RadioConfig,
) -> Result<(), DriverError> {
    device.set_sample_rate(config.sample_rate)?;
    device.set_center_freq(config.center_frequency)?;
    device.set_freq_corr(config.freq_correction_ppm)?;
    device.set_gain(config.gain)?;
    device.set_if_gain(config.if_gain)?;
    device.set_bb_gain(config.bb_gain)?;
    device.set_antenna(&config.antenna)?;
    device.set_bandwidth(config.bandwidth)?;
    Ok(())
}

/// Open and configure the radio, pick the visualization and connect them.
pub fn assemble(
    config: &RadioConfig,
    driver: &dyn RadioDriver,
    gpu: &GpuCapability,
    factory: &mut dyn SinkFactory,
) -> Result<Assembly, AssemblyError> {
    let index = config.device_index;
    let mut device = driver
        .open(index)
        .map_err(|source| AssemblyError::Open { index, source })?;
    info!("Using RTL-SDR device #{index}");
    configure_device(device.as_mut(), config)
        .map_err(|source| AssemblyError::Configure { index, source })?;

    let tuner = device.tuner_type();
    if let Some(tuner) = &tuner {
        info!("Tuner type: {tuner}");
    }

    let selection = select_sinks(gpu, factory, config)?;
    let flowgraph =
        Flowgraph::build(device, &selection.sinks.sinks).map_err(AssemblyError::Flowgraph)?;
    info!("Flowgraph connected successfully");

    Ok(Assembly {
        variant: selection.variant,
        flowgraph,
        surfaces: selection.sinks.surfaces,
        tuner,
    })
}
