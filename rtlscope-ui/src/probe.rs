use rtlscope_messages::{GpuCapability, GpuProbe};

/// Asks wgpu for an adapter the window could render with.
#[derive(Debug, Clone, Copy, Default)]
pub struct WgpuProbe;

#[cfg(feature = "wgpu")]
impl GpuProbe for WgpuProbe {
    fn probe(&self) -> GpuCapability {
        use eframe::wgpu;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: None,
        }));
        match adapter {
            Ok(adapter) => {
                let info = adapter.get_info();
                log::debug!("wgpu adapter: {info:?}");
                GpuCapability::Available {
                    adapter: format!("{} ({:?})", info.name, info.backend),
                }
            }
            Err(e) => GpuCapability::Unavailable {
                reason: e.to_string(),
            },
        }
    }
}

#[cfg(not(feature = "wgpu"))]
impl GpuProbe for WgpuProbe {
    fn probe(&self) -> GpuCapability {
        GpuCapability::Unavailable {
            reason: String::from("built without wgpu support"),
        }
    }
}
