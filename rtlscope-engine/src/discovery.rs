//! Device enumeration for `--detect`.

use log::{info, warn};

use crate::driver::RadioDriver;

/// Highest number of hardware indices probed.
pub const MAX_PROBED_DEVICES: u32 = 10;

/// A device that opened successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    pub index: u32,
    pub label: String,
}

/// Open each index from 0 up to `limit`, closing every handle again.
///
/// Stops at the first index the driver reports as not present. Other open
/// errors are logged and the next index is tried.
pub fn enumerate(driver: &dyn RadioDriver, limit: u32) -> Vec<DeviceEntry> {
    info!("Detecting RTL-SDR devices...");
    let mut found = Vec::new();

    for index in 0..limit {
        match driver.open(index) {
            Ok(device) => {
                drop(device);
                let label = driver
                    .device_name(index)
                    .unwrap_or_else(|| format!("RTL-SDR #{index}"));
                info!("Found device #{index}: {label}");
                found.push(DeviceEntry { index, label });
            }
            Err(e) if e.is_not_present() => {
                if index == 0 {
                    info!("No RTL-SDR devices found");
                }
                break;
            }
            Err(e) => {
                warn!("Error checking device #{index}: {e}");
            }
        }
    }

    found
}
