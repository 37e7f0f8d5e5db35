/// Frequency in Hertz.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Hertz(pub f64);

impl std::fmt::Display for Hertz {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.abs() >= 1e6 {
            write!(f, "{:.3} MHz", self.as_mhz())
        } else if self.0.abs() >= 1e3 {
            write!(f, "{:.3} kHz", self.0 / 1e3)
        } else {
            write!(f, "{} Hz", self.0)
        }
    }
}

impl Hertz {
    pub const fn mhz(mhz: f64) -> Self {
        Self(mhz * 1e6)
    }

    pub const fn as_hz(self) -> f64 {
        self.0
    }

    pub const fn as_mhz(self) -> f64 {
        self.0 / 1e6
    }
}

/// Level or gain in decibels (dB).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Decibels(pub f64);

impl std::fmt::Display for Decibels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} dB", self.0)
    }
}

impl Decibels {
    /// Gain in tenths of a dB, the unit RTL2832 tuners work in.
    pub fn as_tenths(self) -> i32 {
        (self.0 * 10.0).round() as i32
    }

    pub const fn as_db(self) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hertz_display_picks_unit() {
        assert_eq!(Hertz(100e6).to_string(), "100.000 MHz");
        assert_eq!(Hertz(250e3).to_string(), "250.000 kHz");
        assert_eq!(Hertz(12.0).to_string(), "12 Hz");
    }

    #[test]
    fn test_decibels_tenths_round() {
        assert_eq!(Decibels(20.0).as_tenths(), 200);
        assert_eq!(Decibels(49.64).as_tenths(), 496);
        assert_eq!(Decibels(-1.0).as_tenths(), -10);
    }

    #[test]
    fn test_decibels_display() {
        assert_eq!(Decibels(38.6).to_string(), "38.6 dB");
    }
}
