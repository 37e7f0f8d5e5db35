use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use anyhow::{Result, anyhow, bail};
use log::debug;
use num_complex::Complex;
use rustradio::blocks::Tee;
use rustradio::graph::{CancellationToken, Graph, GraphRunner};
use rustradio::stream::ReadStream;

use crate::dsp::SpectrumAnalyzer;
use crate::driver::RadioDevice;
use crate::select::SinkPlan;
use crate::sinks::SpectrumSink;
use crate::sources::{RadioReader, RadioSource};

/// Sample blocks buffered between the reader thread and the source block.
const SAMPLE_QUEUE_DEPTH: usize = 16;

/// What the lifecycle controller drives.
pub trait PipelineControl: Send {
    /// Begin processing. Called once.
    fn start(&mut self) -> Result<()>;
    /// Ask every processing thread to finish. Does not block.
    fn stop(&mut self);
    /// Block until processing has finished.
    fn wait(&mut self) -> Result<()>;
}

/// Block counts of an assembled flowgraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    pub sources: usize,
    pub tees: usize,
    pub sinks: usize,
}

impl Topology {
    pub fn blocks(&self) -> usize {
        self.sources + self.tees + self.sinks
    }
}

fn add_sink(graph: &mut Graph, input: ReadStream<Complex<f32>>, plan: &SinkPlan) {
    let sink = SpectrumSink::new(
        input,
        SpectrumAnalyzer::new(&plan.settings),
        plan.frames.clone(),
    );
    graph.add(Box::new(sink));
}

/// One radio source feeding one or more spectrum sinks.
///
/// Runs as two threads once started: the device reader and the
/// rustradio graph.
pub struct Flowgraph {
    graph: Option<Graph>,
    reader: Option<RadioReader>,
    cancel_token: CancellationToken,
    stop: Arc<AtomicBool>,
    topology: Topology,
    reader_handle: Option<JoinHandle<()>>,
    graph_handle: Option<JoinHandle<std::result::Result<(), rustradio::Error>>>,
}

impl Flowgraph {
    /// Connect `device` to one sink per plan. Two or more sinks share the
    /// source through a chain of tees.
    pub fn build(device: Box<dyn RadioDevice>, sinks: &[SinkPlan]) -> Result<Self> {
        let (sample_tx, sample_rx) = flume::bounded(SAMPLE_QUEUE_DEPTH);
        let stop = Arc::new(AtomicBool::new(false));
        let reader = RadioReader::new(device, sample_tx, Arc::clone(&stop));

        let mut graph = Graph::new();
        let (source, mut prev) = RadioSource::from_receiver(sample_rx);
        graph.add(Box::new(source));

        let Some((last, teed)) = sinks.split_last() else {
            bail!("flowgraph needs at least one sink");
        };
        for plan in teed {
            let (tee, out, rest) = Tee::new(prev);
            graph.add(Box::new(tee));
            add_sink(&mut graph, out, plan);
            prev = rest;
        }
        add_sink(&mut graph, prev, last);

        let topology = Topology {
            sources: 1,
            tees: teed.len(),
            sinks: sinks.len(),
        };
        debug!("Built flowgraph {topology:?}");

        Ok(Self {
            cancel_token: graph.cancel_token(),
            graph: Some(graph),
            reader: Some(reader),
            stop,
            topology,
            reader_handle: None,
            graph_handle: None,
        })
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }
}

impl PipelineControl for Flowgraph {
    fn start(&mut self) -> Result<()> {
        let (Some(mut graph), Some(reader)) = (self.graph.take(), self.reader.take()) else {
            bail!("flowgraph already started");
        };

        self.reader_handle = Some(
            thread::Builder::new()
                .name("radio-reader".into())
                .spawn(move || reader.run())?,
        );
        self.graph_handle = Some(
            thread::Builder::new()
                .name("flowgraph".into())
                .spawn(move || graph.run())?,
        );
        Ok(())
    }

    fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        self.cancel_token.cancel();
    }

    fn wait(&mut self) -> Result<()> {
        if let Some(handle) = self.reader_handle.take() {
            handle
                .join()
                .map_err(|_| anyhow!("radio reader thread panicked"))?;
        }
        if let Some(handle) = self.graph_handle.take() {
            handle
                .join()
                .map_err(|_| anyhow!("flowgraph thread panicked"))?
                .map_err(|e| anyhow!("flowgraph failed: {e}"))?;
        }
        Ok(())
    }
}
