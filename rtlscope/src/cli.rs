use clap::{ArgAction, Parser};
use rtlscope_messages::{Decibels, Hertz, RadioConfig};

/// RTL-SDR spectrum analyzer.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Center frequency in Hz
    #[arg(short = 'f', long = "freq", default_value_t = 100e6)]
    pub freq: f64,

    /// Sample rate in Hz
    #[arg(short = 's', long = "samp-rate", default_value_t = 2e6)]
    pub samp_rate: f64,

    /// RF gain in dB
    #[arg(short = 'g', long, default_value_t = 20.0)]
    pub gain: f64,

    /// Device index
    #[arg(short = 'd', long, default_value_t = 0)]
    pub device: u32,

    /// List attached RTL-SDR devices and exit
    #[arg(long)]
    pub detect: bool,

    /// Frequency correction in ppm
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub ppm: i32,

    /// IF gain in dB (E4000 tuners only)
    #[arg(long, default_value_t = 20.0)]
    pub if_gain: f64,

    /// Baseband gain in dB
    #[arg(long, default_value_t = 20.0)]
    pub bb_gain: f64,

    /// Antenna port
    #[arg(long, default_value = "")]
    pub antenna: String,

    /// Tuner bandwidth in Hz, 0 for automatic
    #[arg(long, default_value_t = 0.0)]
    pub bandwidth: f64,

    /// Skip the GPU display and use the standard FFT + waterfall
    #[arg(long)]
    pub no_gpu: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn radio_config(&self) -> RadioConfig {
        RadioConfig {
            center_frequency: Hertz(self.freq),
            sample_rate: Hertz(self.samp_rate),
            gain: Decibels(self.gain),
            device_index: self.device,
            freq_correction_ppm: self.ppm,
            if_gain: Decibels(self.if_gain),
            bb_gain: Decibels(self.bb_gain),
            antenna: self.antenna.clone(),
            bandwidth: Hertz(self.bandwidth),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_defaults_match_radio_defaults() {
        let args = Args::try_parse_from(["rtlscope"]).unwrap();
        assert_eq!(args.radio_config(), RadioConfig::default());
        assert!(!args.detect);
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_short_flags() {
        let args = Args::try_parse_from([
            "rtlscope", "-f", "433.92e6", "-s", "2.4e6", "-g", "38.6", "-d", "1", "-vv",
        ])
        .unwrap();
        let config = args.radio_config();
        assert_eq!(config.center_frequency, Hertz(433.92e6));
        assert_eq!(config.sample_rate, Hertz(2.4e6));
        assert_eq!(config.gain, Decibels(38.6));
        assert_eq!(config.device_index, 1);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_extended_flags() {
        let args = Args::try_parse_from([
            "rtlscope",
            "--ppm",
            "-7",
            "--if-gain",
            "10",
            "--bb-gain",
            "5",
            "--antenna",
            "RX",
            "--bandwidth",
            "1.5e6",
            "--no-gpu",
            "--detect",
        ])
        .unwrap();
        let config = args.radio_config();
        assert_eq!(config.freq_correction_ppm, -7);
        assert_eq!(config.if_gain, Decibels(10.0));
        assert_eq!(config.bb_gain, Decibels(5.0));
        assert_eq!(config.antenna, "RX");
        assert_eq!(config.bandwidth, Hertz(1.5e6));
        assert!(args.no_gpu);
        assert!(args.detect);
    }

    #[test]
    fn test_invalid_arguments_rejected() {
        let err = Args::try_parse_from(["rtlscope", "--freq", "lots"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert_eq!(err.exit_code(), 2);

        let err = Args::try_parse_from(["rtlscope", "--device", "-1"]).unwrap_err();
        assert_ne!(err.exit_code(), 0);
    }
}
