use std::time::Duration;

use crate::{Hertz, RadioConfig};

/// FFT length used by every display.
pub const FFT_SIZE: usize = 2048;
/// Minimum time between two frames sent to a display.
pub const UPDATE_INTERVAL: Duration = Duration::from_millis(50);
/// Exponential averaging factor of the FFT display.
pub const FFT_AVERAGING: f32 = 0.2;
/// Fixed vertical range of all displays.
pub const Y_RANGE: DbRange = DbRange {
    min: -140.0,
    max: 10.0,
};

/// Taper applied to each block of samples before the FFT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowFunction {
    BlackmanHarris,
}

/// Closed range of dB values mapped onto a display axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbRange {
    pub min: f32,
    pub max: f32,
}

impl DbRange {
    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    /// Position of `db` inside the range, clamped to 0.0..=1.0.
    pub fn normalize(&self, db: f32) -> f32 {
        if self.span() <= f32::EPSILON {
            return 0.5;
        }
        ((db - self.min) / self.span()).clamp(0.0, 1.0)
    }
}

/// Axis caption split into quantity and unit.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisLabel {
    pub text: String,
    pub unit: String,
}

impl std::fmt::Display for AxisLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.text, self.unit)
    }
}

/// How one display surface is configured.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySettings {
    pub title: String,
    pub fft_size: usize,
    pub window: WindowFunction,
    pub center_frequency: Hertz,
    pub bandwidth: Hertz,
    pub update_interval: Duration,
    pub y_range: DbRange,
    pub y_label: Option<AxisLabel>,
    pub grid: bool,
    pub axis_labels: bool,
    pub autoscale: bool,
    /// Exponential averaging factor in (0, 1], `None` disables averaging
    pub averaging: Option<f32>,
    pub control_panel: bool,
}

impl DisplaySettings {
    fn base(title: &str, config: &RadioConfig) -> Self {
        Self {
            title: title.to_string(),
            fft_size: FFT_SIZE,
            window: WindowFunction::BlackmanHarris,
            center_frequency: config.center_frequency,
            bandwidth: config.sample_rate,
            update_interval: UPDATE_INTERVAL,
            y_range: Y_RANGE,
            y_label: None,
            grid: true,
            axis_labels: true,
            autoscale: false,
            averaging: None,
            control_panel: false,
        }
    }

    /// Frequency-domain (FFT) display of the standard visualization.
    pub fn spectrum(config: &RadioConfig) -> Self {
        Self {
            y_label: Some(AxisLabel {
                text: String::from("Relative Gain"),
                unit: String::from("dB"),
            }),
            averaging: Some(FFT_AVERAGING),
            control_panel: true,
            ..Self::base("RTL-SDR Spectrum", config)
        }
    }

    /// Waterfall display of the standard visualization.
    pub fn waterfall(config: &RadioConfig) -> Self {
        Self::base("RTL-SDR Waterfall", config)
    }

    /// Combined persistence + waterfall display of the GPU visualization.
    /// Its frequency range is the tuner's (center, sample rate).
    pub fn phosphor(config: &RadioConfig) -> Self {
        Self::base("RTL-SDR Phosphor", config)
    }

    /// Lowest and highest frequency shown, in Hz.
    pub fn frequency_span(&self) -> (f64, f64) {
        let half = self.bandwidth.as_hz() / 2.0;
        let center = self.center_frequency.as_hz();
        (center - half, center + half)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_displays_share_fixed_settings() {
        let config = RadioConfig::default();
        for settings in [
            DisplaySettings::spectrum(&config),
            DisplaySettings::waterfall(&config),
        ] {
            assert_eq!(settings.fft_size, 2048);
            assert_eq!(settings.window, WindowFunction::BlackmanHarris);
            assert_eq!(settings.center_frequency, Hertz(100e6));
            assert_eq!(settings.bandwidth, Hertz(2e6));
            assert_eq!(settings.update_interval, Duration::from_millis(50));
            assert_eq!(settings.y_range, DbRange { min: -140.0, max: 10.0 });
            assert!(settings.grid);
            assert!(settings.axis_labels);
        }
    }

    #[test]
    fn test_only_spectrum_averages() {
        let config = RadioConfig::default();
        assert_eq!(DisplaySettings::spectrum(&config).averaging, Some(0.2));
        assert_eq!(DisplaySettings::waterfall(&config).averaging, None);
        assert!(!DisplaySettings::spectrum(&config).autoscale);
    }

    #[test]
    fn test_frequency_span_is_centered() {
        let settings = DisplaySettings::phosphor(&RadioConfig::default());
        assert_eq!(settings.frequency_span(), (99e6, 101e6));
    }

    #[test]
    fn test_db_range_normalize_clamps() {
        assert_eq!(Y_RANGE.normalize(-140.0), 0.0);
        assert_eq!(Y_RANGE.normalize(10.0), 1.0);
        assert_eq!(Y_RANGE.normalize(50.0), 1.0);
        assert!((Y_RANGE.normalize(-65.0) - 0.5).abs() < 1e-6);
    }
}
