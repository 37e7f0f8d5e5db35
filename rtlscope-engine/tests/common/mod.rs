// Hand-written fakes shared by the integration tests.
#![allow(dead_code)]

use std::f64::consts::PI;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{Result, bail};
use rtlscope_engine::{
    DriverError, PipelineControl, RadioDevice, RadioDriver, SinkError, SinkFactory, SinkSet,
};
use rtlscope_messages::{Decibels, DisplaySettings, Hertz, RadioConfig, SurfaceKind};

pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

fn record(log: &CallLog, call: String) {
    log.lock().unwrap().push(call);
}

/// Device that records every setter and streams a complex tone.
pub struct FakeDevice {
    log: CallLog,
    /// Tone frequency as a fraction of the sample rate
    tone: f64,
    phase: f64,
    pub fail_on: Option<&'static str>,
}

impl FakeDevice {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            tone: 0.125,
            phase: 0.0,
            fail_on: None,
        }
    }

    fn call(&mut self, name: &'static str, value: String) -> Result<(), DriverError> {
        record(&self.log, format!("{name}({value})"));
        if self.fail_on == Some(name) {
            return Err(DriverError::OperationFailed {
                operation: name,
                code: -1,
            });
        }
        Ok(())
    }
}

impl RadioDevice for FakeDevice {
    fn set_sample_rate(&mut self, rate: Hertz) -> Result<(), DriverError> {
        self.call("set_sample_rate", rate.as_hz().to_string())
    }

    fn set_center_freq(&mut self, freq: Hertz) -> Result<(), DriverError> {
        self.call("set_center_freq", freq.as_hz().to_string())
    }

    fn set_freq_corr(&mut self, ppm: i32) -> Result<(), DriverError> {
        self.call("set_freq_corr", ppm.to_string())
    }

    fn set_gain(&mut self, gain: Decibels) -> Result<(), DriverError> {
        self.call("set_gain", gain.as_db().to_string())
    }

    fn set_if_gain(&mut self, gain: Decibels) -> Result<(), DriverError> {
        self.call("set_if_gain", gain.as_db().to_string())
    }

    fn set_bb_gain(&mut self, gain: Decibels) -> Result<(), DriverError> {
        self.call("set_bb_gain", gain.as_db().to_string())
    }

    fn set_antenna(&mut self, antenna: &str) -> Result<(), DriverError> {
        self.call("set_antenna", antenna.to_string())
    }

    fn set_bandwidth(&mut self, bandwidth: Hertz) -> Result<(), DriverError> {
        self.call("set_bandwidth", bandwidth.as_hz().to_string())
    }

    fn tuner_type(&self) -> Option<String> {
        Some(String::from("R820T"))
    }

    fn read_sync(&mut self, buf: &mut [u8]) -> Result<usize, DriverError> {
        thread::sleep(Duration::from_millis(1));
        for pair in buf.chunks_exact_mut(2) {
            pair[0] = (127.5 + 100.0 * self.phase.cos()).round() as u8;
            pair[1] = (127.5 + 100.0 * self.phase.sin()).round() as u8;
            self.phase = (self.phase + 2.0 * PI * self.tone) % (2.0 * PI);
        }
        Ok(buf.len() / 2 * 2)
    }
}

/// Driver with devices at indices `0..present`.
pub struct FakeDriver {
    pub log: CallLog,
    pub present: u32,
    /// Indices that exist but refuse to open
    pub broken: Vec<u32>,
}

impl FakeDriver {
    pub fn with_devices(present: u32) -> Self {
        Self {
            log: new_log(),
            present,
            broken: Vec::new(),
        }
    }
}

impl RadioDriver for FakeDriver {
    fn name(&self) -> &str {
        "fake"
    }

    fn open(&self, index: u32) -> Result<Box<dyn RadioDevice>, DriverError> {
        record(&self.log, format!("open({index})"));
        if index >= self.present {
            return Err(DriverError::DeviceNotPresent(index));
        }
        if self.broken.contains(&index) {
            return Err(DriverError::OpenFailed { index, code: -3 });
        }
        Ok(Box::new(FakeDevice::new(Arc::clone(&self.log))))
    }
}

/// Sink factory whose GPU constructors fail on request.
pub struct FakeFactory {
    pub log: CallLog,
    pub primary_ok: bool,
    pub fallback_ok: bool,
}

impl FakeFactory {
    pub fn new(primary_ok: bool, fallback_ok: bool) -> Self {
        Self {
            log: new_log(),
            primary_ok,
            fallback_ok,
        }
    }
}

impl SinkFactory for FakeFactory {
    fn gpu_primary(&mut self, config: &RadioConfig) -> Result<SinkSet, SinkError> {
        record(&self.log, String::from("gpu_primary"));
        if !self.primary_ok {
            return Err(SinkError::RendererMissing("wgpu"));
        }
        Ok(SinkSet::single(
            SurfaceKind::Phosphor,
            DisplaySettings::phosphor(config),
        ))
    }

    fn gpu_fallback(&mut self, config: &RadioConfig) -> Result<SinkSet, SinkError> {
        record(&self.log, String::from("gpu_fallback"));
        if !self.fallback_ok {
            return Err(SinkError::RendererMissing("glow"));
        }
        Ok(SinkSet::single(
            SurfaceKind::Phosphor,
            DisplaySettings::phosphor(config),
        ))
    }

    fn standard(&mut self, config: &RadioConfig) -> Result<SinkSet, SinkError> {
        record(&self.log, String::from("standard"));
        let mut set = SinkSet::single(SurfaceKind::Spectrum, DisplaySettings::spectrum(config));
        set.push(SurfaceKind::Waterfall, DisplaySettings::waterfall(config));
        Ok(set)
    }
}

/// Pipeline that only records how it is driven.
pub struct FakePipeline {
    pub log: CallLog,
    pub fail_start: bool,
}

impl PipelineControl for FakePipeline {
    fn start(&mut self) -> Result<()> {
        record(&self.log, String::from("start"));
        if self.fail_start {
            bail!("no device");
        }
        Ok(())
    }

    fn stop(&mut self) {
        record(&self.log, String::from("stop"));
    }

    fn wait(&mut self) -> Result<()> {
        record(&self.log, String::from("wait"));
        Ok(())
    }
}
