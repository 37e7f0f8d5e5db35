use std::sync::Arc;

use log::info;
use rtlscope_messages::{GpuCapability, GpuProbe};
use thiserror::Error;

use crate::bootstrap::LibrarySearchPath;
use crate::driver::{DriverError, DriverLoader, RadioDriver};

/// Capabilities acquired at startup.
pub struct ProbeReport {
    pub gpu: GpuCapability,
    pub driver: Arc<dyn RadioDriver>,
}

impl std::fmt::Debug for ProbeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeReport")
            .field("gpu", &self.gpu)
            .field("driver", &self.driver.name())
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("radio driver unavailable")]
    Driver(#[source] DriverError),
}

/// Acquire the GPU visualization capability (optional) and the radio
/// driver (required), in that order.
pub fn probe(
    search: &LibrarySearchPath,
    gpu: &dyn GpuProbe,
    loader: &dyn DriverLoader,
) -> Result<ProbeReport, ProbeError> {
    let gpu = gpu.probe();
    match &gpu {
        GpuCapability::Available { adapter } => {
            info!("GPU acceleration available ({adapter})");
        }
        GpuCapability::Unavailable { reason } => {
            info!("GPU acceleration unavailable: {reason}");
            info!("Falling back to standard visualization");
        }
    }

    let driver = loader.load(search).map_err(ProbeError::Driver)?;
    info!("{} driver loaded", driver.name());

    Ok(ProbeReport { gpu, driver })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtlscope_messages::DisabledGpu;
    use std::cell::Cell;

    struct MissingLibrary<'a> {
        calls: &'a Cell<usize>,
    }

    impl DriverLoader for MissingLibrary<'_> {
        fn load(&self, _: &LibrarySearchPath) -> Result<Arc<dyn RadioDriver>, DriverError> {
            self.calls.set(self.calls.get() + 1);
            Err(DriverError::LibraryNotFound {
                library: "librtlsdr",
                tried: vec![String::from("librtlsdr.so.0")],
            })
        }
    }

    #[test]
    fn test_missing_driver_is_fatal_and_not_retried() {
        let calls = Cell::new(0);
        let search = LibrarySearchPath::resolve(None, None);
        let err = probe(&search, &DisabledGpu, &MissingLibrary { calls: &calls }).unwrap_err();

        assert_eq!(calls.get(), 1);
        let ProbeError::Driver(inner) = err;
        assert!(matches!(inner, DriverError::LibraryNotFound { .. }));
    }
}
