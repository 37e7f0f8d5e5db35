mod spectrum;

pub use spectrum::SpectrumSink;
