//! Values shared between the rtlscope engine, the UI and the launcher binary.
//!
//! Everything here is plain configuration or message data: it is built once at
//! startup and only read afterwards.

mod capability;
mod config;
mod display;
mod frame;
mod state;
mod units;

pub use capability::{
    DisabledGpu, GpuCapability, GpuProbe, RendererChoice, RendererSupport, SinkVariant,
};
pub use config::RadioConfig;
pub use display::{
    AxisLabel, DbRange, DisplaySettings, FFT_AVERAGING, FFT_SIZE, UPDATE_INTERVAL, WindowFunction,
    Y_RANGE,
};
pub use frame::{Surface, SurfaceKind, SpectrumFrame, surface_channel};
pub use state::ScopeStatus;
pub use units::{Decibels, Hertz};
