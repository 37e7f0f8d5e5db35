//! `librtlsdr` driver, loaded at runtime.
//!
//! The library is opened with `libloading` from the candidates of a
//! [`LibrarySearchPath`], so a missing driver is a reportable error instead
//! of a loader failure at process start.

use std::ffi::{CStr, c_char, c_int, c_uint, c_void};
use std::path::PathBuf;
use std::ptr;
use std::sync::Arc;

use libloading::Library;
use log::{debug, info};
use rtlscope_messages::{Decibels, Hertz};

use super::{DriverError, DriverLoader, RadioDevice, RadioDriver};
use crate::bootstrap::LibrarySearchPath;

type DevHandle = *mut c_void;

#[cfg(target_os = "linux")]
const LIB_NAMES: &[&str] = &["librtlsdr.so.0", "librtlsdr.so"];
#[cfg(target_os = "macos")]
const LIB_NAMES: &[&str] = &["librtlsdr.0.dylib", "librtlsdr.dylib"];
#[cfg(target_os = "windows")]
const LIB_NAMES: &[&str] = &["rtlsdr.dll", "librtlsdr.dll"];
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const LIB_NAMES: &[&str] = &["librtlsdr.so"];

/// `rtlsdr_set_freq_correction` returns this when the value is unchanged.
const FREQ_CORR_UNCHANGED: c_int = -2;

/// Entry points resolved from the library. Only valid while the owning
/// [`RtlSdrLibrary`] keeps the `Library` loaded.
#[derive(Clone, Copy)]
struct Api {
    get_device_count: unsafe extern "C" fn() -> c_uint,
    get_device_name: unsafe extern "C" fn(c_uint) -> *const c_char,
    open: unsafe extern "C" fn(*mut DevHandle, c_uint) -> c_int,
    close: unsafe extern "C" fn(DevHandle) -> c_int,
    set_center_freq: unsafe extern "C" fn(DevHandle, c_uint) -> c_int,
    set_sample_rate: unsafe extern "C" fn(DevHandle, c_uint) -> c_int,
    set_freq_correction: unsafe extern "C" fn(DevHandle, c_int) -> c_int,
    set_tuner_gain_mode: unsafe extern "C" fn(DevHandle, c_int) -> c_int,
    set_tuner_gain: unsafe extern "C" fn(DevHandle, c_int) -> c_int,
    get_tuner_gains: unsafe extern "C" fn(DevHandle, *mut c_int) -> c_int,
    set_tuner_if_gain: unsafe extern "C" fn(DevHandle, c_int, c_int) -> c_int,
    set_tuner_bandwidth: unsafe extern "C" fn(DevHandle, c_uint) -> c_int,
    get_tuner_type: unsafe extern "C" fn(DevHandle) -> c_int,
    reset_buffer: unsafe extern "C" fn(DevHandle) -> c_int,
    read_sync: unsafe extern "C" fn(DevHandle, *mut c_void, c_int, *mut c_int) -> c_int,
}

/// Look up `name` (NUL terminated) and copy the function pointer out.
///
/// # Safety
/// `T` must match the C signature of the symbol.
unsafe fn symbol<T: Copy>(
    lib: &Library,
    path: &str,
    name: &'static [u8],
) -> Result<T, DriverError> {
    // SAFETY: the caller guarantees that `T` is the symbol's real type.
    let sym = unsafe { lib.get::<T>(name) }.map_err(|source| DriverError::MissingSymbol {
        library: path.to_string(),
        symbol: String::from_utf8_lossy(name.strip_suffix(b"\0").unwrap_or(name)).into_owned(),
        source,
    })?;
    Ok(*sym)
}

impl Api {
    /// # Safety
    /// `lib` must be a build of librtlsdr.
    unsafe fn resolve(lib: &Library, path: &str) -> Result<Self, DriverError> {
        // SAFETY: signatures follow rtl-sdr.h.
        unsafe {
            Ok(Self {
                get_device_count: symbol(lib, path, b"rtlsdr_get_device_count\0")?,
                get_device_name: symbol(lib, path, b"rtlsdr_get_device_name\0")?,
                open: symbol(lib, path, b"rtlsdr_open\0")?,
                close: symbol(lib, path, b"rtlsdr_close\0")?,
                set_center_freq: symbol(lib, path, b"rtlsdr_set_center_freq\0")?,
                set_sample_rate: symbol(lib, path, b"rtlsdr_set_sample_rate\0")?,
                set_freq_correction: symbol(lib, path, b"rtlsdr_set_freq_correction\0")?,
                set_tuner_gain_mode: symbol(lib, path, b"rtlsdr_set_tuner_gain_mode\0")?,
                set_tuner_gain: symbol(lib, path, b"rtlsdr_set_tuner_gain\0")?,
                get_tuner_gains: symbol(lib, path, b"rtlsdr_get_tuner_gains\0")?,
                set_tuner_if_gain: symbol(lib, path, b"rtlsdr_set_tuner_if_gain\0")?,
                set_tuner_bandwidth: symbol(lib, path, b"rtlsdr_set_tuner_bandwidth\0")?,
                get_tuner_type: symbol(lib, path, b"rtlsdr_get_tuner_type\0")?,
                reset_buffer: symbol(lib, path, b"rtlsdr_reset_buffer\0")?,
                read_sync: symbol(lib, path, b"rtlsdr_read_sync\0")?,
            })
        }
    }
}

/// A loaded copy of librtlsdr.
pub struct RtlSdrLibrary {
    api: Api,
    path: PathBuf,
    // Keeps the function pointers in `api` valid.
    _lib: Library,
}

impl std::fmt::Debug for RtlSdrLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RtlSdrLibrary").field("path", &self.path).finish()
    }
}

impl RtlSdrLibrary {
    /// Load the first candidate that opens and exports the full API.
    pub fn load(search: &LibrarySearchPath) -> Result<Self, DriverError> {
        let mut tried = Vec::new();
        for name in LIB_NAMES {
            for candidate in search.candidates(name) {
                let shown = candidate.display().to_string();
                // SAFETY: librtlsdr runs no initialisation code on load.
                let lib = match unsafe { Library::new(&candidate) } {
                    Ok(lib) => lib,
                    Err(e) => {
                        debug!("Could not load {shown}: {e}");
                        tried.push(shown);
                        continue;
                    }
                };
                // SAFETY: the library was found under an rtlsdr file name.
                let api = match unsafe { Api::resolve(&lib, &shown) } {
                    Ok(api) => api,
                    Err(e) => {
                        // An older or unrelated build; a later candidate may be complete.
                        debug!("Skipping {shown}: {e}");
                        tried.push(shown);
                        continue;
                    }
                };
                info!("Loaded RTL-SDR library: {shown}");
                return Ok(Self {
                    api,
                    path: candidate,
                    _lib: lib,
                });
            }
        }
        Err(DriverError::LibraryNotFound {
            library: "librtlsdr",
            tried,
        })
    }

    fn device_count(&self) -> u32 {
        // SAFETY: takes no arguments.
        unsafe { (self.api.get_device_count)() }
    }
}

/// [`RadioDriver`] over a loaded librtlsdr.
#[derive(Debug, Clone)]
pub struct RtlSdrDriver {
    lib: Arc<RtlSdrLibrary>,
}

impl RtlSdrDriver {
    pub fn new(lib: RtlSdrLibrary) -> Self {
        Self { lib: Arc::new(lib) }
    }
}

impl RadioDriver for RtlSdrDriver {
    fn name(&self) -> &str {
        "RTL-SDR"
    }

    fn open(&self, index: u32) -> Result<Box<dyn RadioDevice>, DriverError> {
        if index >= self.lib.device_count() {
            return Err(DriverError::DeviceNotPresent(index));
        }

        let mut handle: DevHandle = ptr::null_mut();
        // SAFETY: `handle` is a valid out pointer.
        let ret = unsafe { (self.lib.api.open)(&mut handle, index) };
        if ret < 0 || handle.is_null() {
            return Err(DriverError::OpenFailed { index, code: ret });
        }

        let mut gains = [0 as c_int; 64];
        // SAFETY: librtlsdr writes at most one entry per supported gain step,
        // fewer than 64 for every known tuner.
        let count = unsafe { (self.lib.api.get_tuner_gains)(handle, gains.as_mut_ptr()) };
        let gains = usize::try_from(count)
            .map(|n| gains[..n.min(gains.len())].to_vec())
            .unwrap_or_default();

        debug!("Opened RTL-SDR #{index} with {} gain steps", gains.len());
        Ok(Box::new(RtlSdrDevice {
            lib: Arc::clone(&self.lib),
            handle,
            index,
            gains,
        }))
    }

    fn device_name(&self, index: u32) -> Option<String> {
        // SAFETY: returns a static string or NULL.
        let name = unsafe { (self.lib.api.get_device_name)(index) };
        if name.is_null() {
            return None;
        }
        // SAFETY: non-null results are NUL-terminated static strings.
        let name = unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned();
        (!name.is_empty()).then_some(name)
    }
}

/// Loads librtlsdr and wraps it as a [`RadioDriver`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RtlSdrLoader;

impl DriverLoader for RtlSdrLoader {
    fn load(&self, search: &LibrarySearchPath) -> Result<Arc<dyn RadioDriver>, DriverError> {
        let lib = RtlSdrLibrary::load(search)?;
        Ok(Arc::new(RtlSdrDriver::new(lib)))
    }
}

/// An open RTL2832U device.
struct RtlSdrDevice {
    lib: Arc<RtlSdrLibrary>,
    handle: DevHandle,
    index: u32,
    /// Supported tuner gains in tenths of a dB
    gains: Vec<i32>,
}

// SAFETY: a librtlsdr handle may be used from any thread as long as calls are
// not concurrent, which `&mut self` on every mutating call guarantees.
unsafe impl Send for RtlSdrDevice {}

fn check(operation: &'static str, code: c_int) -> Result<(), DriverError> {
    if code < 0 {
        Err(DriverError::OperationFailed { operation, code })
    } else {
        Ok(())
    }
}

fn to_u32(setting: &'static str, value: Hertz) -> Result<u32, DriverError> {
    let hz = value.as_hz().round();
    if (0.0..=f64::from(u32::MAX)).contains(&hz) {
        Ok(hz as u32)
    } else {
        Err(DriverError::OutOfRange {
            setting,
            value: value.to_string(),
        })
    }
}

impl RtlSdrDevice {
    fn nearest_gain(&self, tenths: i32) -> i32 {
        self.gains
            .iter()
            .copied()
            .min_by_key(|g| (g - tenths).abs())
            .unwrap_or(tenths)
    }

    fn tuner_code(&self) -> c_int {
        // SAFETY: `handle` is open for the lifetime of `self`.
        unsafe { (self.lib.api.get_tuner_type)(self.handle) }
    }
}

impl RadioDevice for RtlSdrDevice {
    fn set_sample_rate(&mut self, rate: Hertz) -> Result<(), DriverError> {
        let rate = to_u32("sample rate", rate)?;
        // SAFETY: `handle` is open.
        check("set_sample_rate", unsafe { (self.lib.api.set_sample_rate)(self.handle, rate) })
    }

    fn set_center_freq(&mut self, freq: Hertz) -> Result<(), DriverError> {
        let freq = to_u32("center frequency", freq)?;
        // SAFETY: `handle` is open.
        check("set_center_freq", unsafe { (self.lib.api.set_center_freq)(self.handle, freq) })
    }

    fn set_freq_corr(&mut self, ppm: i32) -> Result<(), DriverError> {
        // SAFETY: `handle` is open.
        let ret = unsafe { (self.lib.api.set_freq_correction)(self.handle, ppm) };
        if ret == FREQ_CORR_UNCHANGED {
            return Ok(());
        }
        check("set_freq_correction", ret)
    }

    fn set_gain(&mut self, gain: Decibels) -> Result<(), DriverError> {
        let tenths = self.nearest_gain(gain.as_tenths());
        // SAFETY: `handle` is open.
        check("set_tuner_gain_mode", unsafe {
            (self.lib.api.set_tuner_gain_mode)(self.handle, 1)
        })?;
        // SAFETY: `handle` is open.
        check("set_tuner_gain", unsafe { (self.lib.api.set_tuner_gain)(self.handle, tenths) })?;
        debug!("RTL-SDR #{} gain {} -> {} tenths dB", self.index, gain, tenths);
        Ok(())
    }

    fn set_if_gain(&mut self, gain: Decibels) -> Result<(), DriverError> {
        // Only the E4000 exposes an adjustable IF stage.
        if self.tuner_code() != 1 {
            debug!("IF gain ignored: tuner has no adjustable IF stage");
            return Ok(());
        }
        // SAFETY: `handle` is open; stage 1 exists on the E4000.
        check("set_tuner_if_gain", unsafe {
            (self.lib.api.set_tuner_if_gain)(self.handle, 1, gain.as_tenths())
        })
    }

    fn set_bb_gain(&mut self, gain: Decibels) -> Result<(), DriverError> {
        debug!("Baseband gain {gain} ignored: RTL2832 has no baseband gain stage");
        Ok(())
    }

    fn set_antenna(&mut self, antenna: &str) -> Result<(), DriverError> {
        match antenna {
            "" | "RX" => Ok(()),
            other => Err(DriverError::OutOfRange {
                setting: "antenna",
                value: other.to_string(),
            }),
        }
    }

    fn set_bandwidth(&mut self, bandwidth: Hertz) -> Result<(), DriverError> {
        let bw = to_u32("bandwidth", bandwidth)?;
        // SAFETY: `handle` is open.
        check("set_tuner_bandwidth", unsafe {
            (self.lib.api.set_tuner_bandwidth)(self.handle, bw)
        })
    }

    fn tuner_type(&self) -> Option<String> {
        let name = match self.tuner_code() {
            1 => "E4000",
            2 => "FC0012",
            3 => "FC0013",
            4 => "FC2580",
            5 => "R820T",
            6 => "R828D",
            _ => return None,
        };
        Some(name.to_string())
    }

    fn reset_buffer(&mut self) -> Result<(), DriverError> {
        // SAFETY: `handle` is open.
        check("reset_buffer", unsafe { (self.lib.api.reset_buffer)(self.handle) })
    }

    fn read_sync(&mut self, buf: &mut [u8]) -> Result<usize, DriverError> {
        let len = c_int::try_from(buf.len()).unwrap_or(c_int::MAX);
        let mut n_read: c_int = 0;
        // SAFETY: `buf` is valid for `len` bytes and `n_read` is a valid out pointer.
        let ret = unsafe {
            (self.lib.api.read_sync)(self.handle, buf.as_mut_ptr().cast(), len, &mut n_read)
        };
        check("read_sync", ret)?;
        Ok(usize::try_from(n_read).unwrap_or(0))
    }
}

impl Drop for RtlSdrDevice {
    fn drop(&mut self) {
        debug!("Closing RTL-SDR #{}", self.index);
        // SAFETY: `handle` came from rtlsdr_open and is closed exactly once.
        unsafe { (self.lib.api.close)(self.handle) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_u32_rejects_out_of_range() {
        assert_eq!(to_u32("f", Hertz(100e6)).unwrap(), 100_000_000);
        assert!(to_u32("f", Hertz(5e9)).is_err());
        assert!(to_u32("f", Hertz(-1.0)).is_err());
    }

    #[test]
    fn test_missing_library_lists_tried_paths() {
        let search = LibrarySearchPath::resolve(None, None);
        // Only meaningful on machines without librtlsdr.
        if let Err(DriverError::LibraryNotFound { tried, .. }) = RtlSdrLibrary::load(&search) {
            assert_eq!(tried.len(), LIB_NAMES.len());
        }
    }

    /// Some shared library that exports none of the rtlsdr API.
    #[cfg(target_os = "linux")]
    fn unrelated_library() -> Option<PathBuf> {
        [
            "/lib/x86_64-linux-gnu/libm.so.6",
            "/usr/lib/x86_64-linux-gnu/libm.so.6",
            "/lib/aarch64-linux-gnu/libm.so.6",
            "/usr/lib64/libm.so.6",
            "/lib64/libm.so.6",
            "/usr/lib/libm.so.6",
        ]
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_incomplete_library_is_skipped() {
        let Some(libm) = unrelated_library() else {
            return;
        };
        let root = tempfile::tempdir().unwrap();
        let mut copies = Vec::new();
        for dir in ["a", "b"] {
            let dir = root.path().join(dir);
            std::fs::create_dir_all(&dir).unwrap();
            let copy = dir.join(LIB_NAMES[0]);
            std::fs::copy(&libm, &copy).unwrap();
            copies.push(copy);
        }
        let inherited =
            std::env::join_paths([root.path().join("a"), root.path().join("b")]).unwrap();
        let search = LibrarySearchPath::resolve(None, Some(&inherited));

        match RtlSdrLibrary::load(&search) {
            Err(DriverError::LibraryNotFound { tried, .. }) => {
                for copy in &copies {
                    assert!(
                        tried.contains(&copy.display().to_string()),
                        "{copy:?} not in {tried:?}"
                    );
                }
            }
            // A real librtlsdr installed on the system; the copies must not win.
            Ok(lib) => assert!(!lib.path.starts_with(root.path())),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
}
