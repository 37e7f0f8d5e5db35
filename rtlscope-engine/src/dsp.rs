//! Windowed power spectrum used by the sink blocks.

use std::f32::consts::PI;
use std::sync::Arc;
use std::time::{Duration, Instant};

use num_complex::Complex;
use rtlscope_messages::{DisplaySettings, WindowFunction};
use rustfft::{Fft, FftPlanner};

/// Floor added before taking the log so empty bins stay finite.
const POWER_FLOOR: f32 = 1e-20;

/// Window coefficients of length `n`.
pub fn window(kind: WindowFunction, n: usize) -> Vec<f32> {
    if n <= 1 {
        return vec![1.0; n];
    }
    let m = (n - 1) as f32;
    (0..n)
        .map(|i| {
            let x = 2.0 * PI * i as f32 / m;
            match kind {
                WindowFunction::BlackmanHarris => {
                    0.35875 - 0.48829 * x.cos() + 0.14128 * (2.0 * x).cos()
                        - 0.01168 * (3.0 * x).cos()
                }
            }
        })
        .collect()
}

/// Turns blocks of IQ samples into FFT-shifted dB spectra.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    /// 1 / (sum of window)^2, normalizes a full-scale tone to 0 dB
    scale: f32,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    averaging: Option<f32>,
    average: Option<Vec<f32>>,
    interval: Duration,
    last_emit: Option<Instant>,
}

impl SpectrumAnalyzer {
    pub fn new(settings: &DisplaySettings) -> Self {
        let n = settings.fft_size;
        let fft = FftPlanner::<f32>::new().plan_fft_forward(n);
        let window = window(settings.window, n);
        let sum: f32 = window.iter().sum();
        let scale = if sum > 0.0 { 1.0 / (sum * sum) } else { 1.0 };
        let scratch = vec![Complex::default(); fft.get_inplace_scratch_len()];

        Self {
            fft,
            window,
            scale,
            buffer: vec![Complex::default(); n],
            scratch,
            averaging: settings.averaging,
            average: None,
            interval: settings.update_interval,
            last_emit: None,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.window.len()
    }

    /// Whether a frame may be emitted at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.last_emit
            .is_none_or(|last| now.duration_since(last) >= self.interval)
    }

    /// Compute one spectrum from the first `fft_size()` samples and mark it
    /// emitted at `now`.
    pub fn process(&mut self, samples: &[Complex<f32>], now: Instant) -> Vec<f32> {
        for ((out, s), w) in self.buffer.iter_mut().zip(samples).zip(&self.window) {
            *out = *s * *w;
        }
        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        let mut db: Vec<f32> = self
            .buffer
            .iter()
            .map(|c| 10.0 * (c.norm_sqr() * self.scale + POWER_FLOOR).log10())
            .collect();

        // DC to the middle bin.
        let n = db.len();
        db.rotate_left(n / 2);

        let db = match (self.averaging, self.average.take()) {
            (Some(alpha), Some(mut avg)) => {
                for (a, x) in avg.iter_mut().zip(&db) {
                    *a += alpha * (x - *a);
                }
                avg
            }
            _ => db,
        };
        if self.averaging.is_some() {
            self.average = Some(db.clone());
        }

        self.last_emit = Some(now);
        db
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtlscope_messages::RadioConfig;

    fn tone(n: usize, bin: isize) -> Vec<Complex<f32>> {
        (0..n)
            .map(|i| {
                let phase = 2.0 * PI * bin as f32 * i as f32 / n as f32;
                Complex::new(phase.cos(), phase.sin())
            })
            .collect()
    }

    #[test]
    fn test_blackman_harris_shape() {
        let w = window(WindowFunction::BlackmanHarris, 2048);
        assert!((w[0] - 6e-5).abs() < 1e-5);
        assert!((w[2047] - w[0]).abs() < 1e-6);
        let peak = w.iter().cloned().fold(f32::MIN, f32::max);
        assert!((peak - 1.0).abs() < 1e-3);
        assert!(w[512] < w[1023]);
    }

    #[test]
    fn test_tone_lands_on_shifted_bin() {
        let settings = DisplaySettings::waterfall(&RadioConfig::default());
        let mut analyzer = SpectrumAnalyzer::new(&settings);
        let spectrum = analyzer.process(&tone(2048, 100), Instant::now());

        let (peak, level) = spectrum
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap();
        assert_eq!(peak, 1024 + 100);
        assert!(level.abs() < 0.5, "full-scale tone at {level} dB");
    }

    #[test]
    fn test_averaging_converges() {
        let settings = DisplaySettings::spectrum(&RadioConfig::default());
        let mut analyzer = SpectrumAnalyzer::new(&settings);
        let now = Instant::now();
        let quiet = vec![Complex::new(1e-4, 0.0); 2048];
        let loud = tone(2048, -300);

        let first = analyzer.process(&quiet, now)[1024 - 300];
        let mut last = first;
        for _ in 0..60 {
            last = analyzer.process(&loud, now)[1024 - 300];
        }
        let target = SpectrumAnalyzer::new(&DisplaySettings::waterfall(&RadioConfig::default()))
            .process(&loud, now)[1024 - 300];

        assert!(first < target - 20.0);
        assert!((last - target).abs() < 0.1);
    }

    #[test]
    fn test_update_interval_throttles() {
        let settings = DisplaySettings::waterfall(&RadioConfig::default());
        let mut analyzer = SpectrumAnalyzer::new(&settings);
        let t0 = Instant::now();
        assert!(analyzer.is_due(t0));
        analyzer.process(&tone(2048, 0), t0);
        assert!(!analyzer.is_due(t0 + Duration::from_millis(20)));
        assert!(analyzer.is_due(t0 + Duration::from_millis(50)));
    }
}
