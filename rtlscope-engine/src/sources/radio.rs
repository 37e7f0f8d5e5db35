use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use flume::{Receiver, SendTimeoutError, Sender, TryRecvError};
use log::{debug, error};
use num_complex::Complex;
use rustradio::block::{Block, BlockRet};
use rustradio::stream::{ReadStream, WriteStream};
use rustradio::{Error, rustradio_macros};

use crate::driver::{RadioDevice, convert_samples};

/// Bytes per `read_sync` call: 8192 complex samples.
const READ_SIZE: usize = 16 * 1024;

/// Source block emitting the IQ samples a [`RadioReader`] pulls off the device.
#[derive(rustradio_macros::Block)]
#[rustradio(new)]
pub struct RadioSource {
    #[rustradio(out)]
    dst: WriteStream<Complex<f32>>,
    samples: Receiver<Vec<Complex<f32>>>,
    pending: Vec<Complex<f32>>,
}

impl RadioSource {
    pub fn from_receiver(samples: Receiver<Vec<Complex<f32>>>) -> (Self, ReadStream<Complex<f32>>) {
        Self::new(samples, Vec::new())
    }
}

impl Block for RadioSource {
    fn work(&mut self) -> Result<BlockRet<'_>, Error> {
        if self.pending.is_empty() {
            match self.samples.try_recv() {
                Ok(block) => self.pending = block,
                Err(TryRecvError::Empty) => return Ok(BlockRet::Pending),
                Err(TryRecvError::Disconnected) => return Ok(BlockRet::EOF),
            }
        }

        let mut o = self.dst.write_buf()?;
        let n = o.len().min(self.pending.len());
        if n == 0 {
            return Ok(BlockRet::Pending);
        }
        o.slice()[..n].copy_from_slice(&self.pending[..n]);
        o.produce(n, &[]);
        self.pending.drain(..n);

        Ok(BlockRet::Again)
    }
}

/// Blocking loop moving samples from the device into a channel.
pub struct RadioReader {
    device: Box<dyn RadioDevice>,
    samples: Sender<Vec<Complex<f32>>>,
    stop: Arc<AtomicBool>,
}

impl RadioReader {
    pub fn new(
        device: Box<dyn RadioDevice>,
        samples: Sender<Vec<Complex<f32>>>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            device,
            samples,
            stop,
        }
    }

    /// Read until stopped, the device fails or the source block goes away.
    /// The device is closed when this returns.
    pub fn run(mut self) {
        if let Err(e) = self.device.reset_buffer() {
            error!("Failed to reset sample buffer: {e}");
            return;
        }

        let mut raw = vec![0u8; READ_SIZE];
        while !self.stop.load(Ordering::Relaxed) {
            let n = match self.device.read_sync(&mut raw) {
                Ok(n) => n,
                Err(e) => {
                    error!("Sample read failed: {e}");
                    break;
                }
            };
            let mut block = convert_samples(&raw[..n]);

            loop {
                match self.samples.send_timeout(block, Duration::from_millis(100)) {
                    Ok(()) => break,
                    Err(SendTimeoutError::Timeout(b)) => {
                        if self.stop.load(Ordering::Relaxed) {
                            break;
                        }
                        block = b;
                    }
                    Err(SendTimeoutError::Disconnected(_)) => {
                        debug!("Sample consumer gone, stopping reader");
                        return;
                    }
                }
            }
        }
        debug!("Radio reader stopped");
    }
}
