use crate::{Decibels, Hertz};

/// Receiver settings supplied once at startup.
///
/// Built from the command line and shared read-only afterwards; nothing in the
/// workspace mutates a `RadioConfig` once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct RadioConfig {
    /// Tuner center frequency
    pub center_frequency: Hertz,
    /// Sample rate, also used as the display bandwidth
    pub sample_rate: Hertz,
    /// RF gain
    pub gain: Decibels,
    /// Hardware device index
    pub device_index: u32,
    /// Frequency correction in PPM
    pub freq_correction_ppm: i32,
    /// IF gain stage
    pub if_gain: Decibels,
    /// Baseband gain stage
    pub bb_gain: Decibels,
    /// Antenna port name, empty for the device default
    pub antenna: String,
    /// Tuner filter bandwidth, 0 selects it automatically
    pub bandwidth: Hertz,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            center_frequency: Hertz::mhz(100.0),
            sample_rate: Hertz::mhz(2.0),
            gain: Decibels(20.0),
            device_index: 0,
            freq_correction_ppm: 0,
            if_gain: Decibels(20.0),
            bb_gain: Decibels(20.0),
            antenna: String::new(),
            bandwidth: Hertz(0.0),
        }
    }
}
