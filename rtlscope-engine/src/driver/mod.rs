//! Radio-source driver seam.
//!
//! The pipeline only talks to hardware through [`RadioDriver`] and
//! [`RadioDevice`]. The production implementation wraps `librtlsdr`
//! ([`rtlsdr`]); tests substitute their own.

pub mod rtlsdr;

use std::sync::Arc;

use num_complex::Complex;
use rtlscope_messages::{Decibels, Hertz};
use thiserror::Error;

use crate::bootstrap::LibrarySearchPath;

pub use self::rtlsdr::{RtlSdrDriver, RtlSdrLoader};

/// Errors reported by a radio driver.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The native driver library could not be loaded from any candidate path.
    #[error("{library} not found (tried {tried:?})")]
    LibraryNotFound {
        library: &'static str,
        tried: Vec<String>,
    },

    /// The library loaded but lacks a required entry point.
    #[error("symbol {symbol} missing from {library}")]
    MissingSymbol {
        library: String,
        symbol: String,
        #[source]
        source: libloading::Error,
    },

    /// Nothing is attached at this index. Enumeration treats this as the end
    /// of the device list.
    #[error("no device at index {0}")]
    DeviceNotPresent(u32),

    /// A device exists at this index but could not be opened.
    #[error("failed to open device #{index}: error code {code}")]
    OpenFailed { index: u32, code: i32 },

    /// A device call returned an error status.
    #[error("{operation} failed: error code {code}")]
    OperationFailed { operation: &'static str, code: i32 },

    /// A setting cannot be represented by the hardware.
    #[error("{setting} {value} is out of range for this device")]
    OutOfRange { setting: &'static str, value: String },
}

impl DriverError {
    pub fn is_not_present(&self) -> bool {
        matches!(self, Self::DeviceNotPresent(_))
    }
}

/// Entry point of a loaded driver library.
pub trait RadioDriver: Send + Sync {
    /// Short driver name for status lines.
    fn name(&self) -> &str;

    /// Open the device at `index`.
    ///
    /// Must return [`DriverError::DeviceNotPresent`] when no device exists at
    /// that index, so callers can tell a gap from a faulty device.
    fn open(&self, index: u32) -> Result<Box<dyn RadioDevice>, DriverError>;

    /// Human-readable name of the device at `index`, when the driver knows it.
    fn device_name(&self, _index: u32) -> Option<String> {
        None
    }
}

/// An open radio receiver.
///
/// Closing happens on drop.
pub trait RadioDevice: Send {
    fn set_sample_rate(&mut self, rate: Hertz) -> Result<(), DriverError>;
    fn set_center_freq(&mut self, freq: Hertz) -> Result<(), DriverError>;
    fn set_freq_corr(&mut self, ppm: i32) -> Result<(), DriverError>;
    fn set_gain(&mut self, gain: Decibels) -> Result<(), DriverError>;
    fn set_if_gain(&mut self, gain: Decibels) -> Result<(), DriverError>;
    fn set_bb_gain(&mut self, gain: Decibels) -> Result<(), DriverError>;
    fn set_antenna(&mut self, antenna: &str) -> Result<(), DriverError>;
    fn set_bandwidth(&mut self, bandwidth: Hertz) -> Result<(), DriverError>;

    /// Tuner chip name, if the driver can report it.
    fn tuner_type(&self) -> Option<String> {
        None
    }

    /// Discard samples buffered before streaming starts.
    fn reset_buffer(&mut self) -> Result<(), DriverError> {
        Ok(())
    }

    /// Blocking read of interleaved unsigned 8-bit I/Q bytes.
    /// Returns the number of bytes written into `buf`.
    fn read_sync(&mut self, buf: &mut [u8]) -> Result<usize, DriverError>;
}

/// Loads a [`RadioDriver`] from the resolved library search path.
pub trait DriverLoader {
    fn load(&self, search: &LibrarySearchPath) -> Result<Arc<dyn RadioDriver>, DriverError>;
}

/// Convert one unsigned 8-bit sample (128 = zero) to the -1.0..=1.0 range.
#[inline]
pub fn u8_to_f32(sample: u8) -> f32 {
    (f32::from(sample) - 127.5) / 127.5
}

/// Convert interleaved `[I0, Q0, I1, Q1, ...]` bytes into complex samples.
/// A trailing odd byte is ignored.
pub fn convert_samples(raw: &[u8]) -> Vec<Complex<f32>> {
    raw.chunks_exact(2)
        .map(|iq| Complex::new(u8_to_f32(iq[0]), u8_to_f32(iq[1])))
        .collect()
}
