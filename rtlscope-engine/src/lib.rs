//! Radio side of rtlscope: locating and driving the RTL-SDR, building the
//! rustradio flowgraph that feeds the displays, and stopping it again.

pub mod assembler;
pub mod bootstrap;
pub mod discovery;
pub mod driver;
pub mod dsp;
pub mod flowgraph;
pub mod lifecycle;
pub mod probe;
pub mod select;
mod sinks;
mod sources;

pub use assembler::{Assembly, AssemblyError, assemble, configure_device};
pub use bootstrap::LibrarySearchPath;
pub use discovery::{DeviceEntry, MAX_PROBED_DEVICES, enumerate};
pub use driver::{
    DriverError, DriverLoader, RadioDevice, RadioDriver, RtlSdrDriver, RtlSdrLoader,
};
pub use flowgraph::{Flowgraph, PipelineControl, Topology};
pub use lifecycle::{Lifecycle, LifecycleError, LifecycleState};
pub use probe::{ProbeError, ProbeReport, probe};
pub use select::{
    DisplaySinkFactory, Selection, SinkError, SinkFactory, SinkPlan, SinkSet, select_sinks,
};
