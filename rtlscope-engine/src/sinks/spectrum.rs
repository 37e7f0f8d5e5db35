use std::time::Instant;

use flume::{Sender, TrySendError};
use num_complex::Complex;
use rustradio::block::{Block, BlockRet};
use rustradio::stream::ReadStream;
use rustradio::{Error, rustradio_macros};

use rtlscope_messages::SpectrumFrame;

use crate::dsp::SpectrumAnalyzer;

/// A sink block that turns IQ samples into spectrum frames for one display.
#[derive(rustradio_macros::Block)]
#[rustradio(new)]
pub struct SpectrumSink {
    #[rustradio(in)]
    src: ReadStream<Complex<f32>>,
    analyzer: SpectrumAnalyzer,
    frames: Sender<SpectrumFrame>,
}

impl Block for SpectrumSink {
    fn work(&mut self) -> Result<BlockRet<'_>, Error> {
        let (input, _tags) = self.src.read_buf()?;

        let n = self.analyzer.fft_size();
        if input.len() < n {
            return Ok(BlockRet::Pending);
        }

        // Whole frames between updates are discarded; only the newest is shown.
        let frames = input.len() / n;
        let now = Instant::now();
        if self.analyzer.is_due(now) {
            let newest: Vec<Complex<f32>> =
                input.iter().skip((frames - 1) * n).take(n).copied().collect();
            let bins = self.analyzer.process(&newest, now);

            // Never block the pipeline on a slow display.
            match self.frames.try_send(SpectrumFrame { bins }) {
                Ok(()) | Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Disconnected(_)) => return Ok(BlockRet::EOF),
            }
        }

        input.consume(frames * n);
        Ok(BlockRet::Again)
    }
}
