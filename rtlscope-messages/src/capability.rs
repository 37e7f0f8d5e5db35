/// Outcome of probing for a GPU the spectrum renderer can use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpuCapability {
    /// A GPU adapter was acquired.
    Available { adapter: String },
    /// No usable adapter; the standard visualization will be used.
    Unavailable { reason: String },
}

impl GpuCapability {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }
}

impl std::fmt::Display for GpuCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available { adapter } => write!(f, "GPU: {adapter}"),
            Self::Unavailable { reason } => write!(f, "no GPU ({reason})"),
        }
    }
}

/// Something that can tell whether GPU rendering is possible on this machine.
pub trait GpuProbe {
    fn probe(&self) -> GpuCapability;
}

/// Probe used when GPU rendering was switched off or is not needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGpu;

impl GpuProbe for DisabledGpu {
    fn probe(&self) -> GpuCapability {
        GpuCapability::Unavailable {
            reason: String::from("disabled"),
        }
    }
}

/// The closed set of visualization paths, selected once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkVariant {
    /// Phosphor display rendered on the GPU.
    GpuPrimary,
    /// Phosphor display through the OpenGL renderer.
    GpuFallback,
    /// Separate FFT and waterfall displays.
    Standard,
}

impl SinkVariant {
    pub fn label(&self) -> &'static str {
        match self {
            Self::GpuPrimary => "GPU phosphor",
            Self::GpuFallback => "GPU phosphor (OpenGL fallback)",
            Self::Standard => "standard FFT + waterfall",
        }
    }

    /// Renderer the window must be opened with for this variant.
    pub fn renderer(&self) -> RendererChoice {
        match self {
            Self::GpuPrimary => RendererChoice::Wgpu,
            Self::GpuFallback => RendererChoice::Glow,
            Self::Standard => RendererChoice::Default,
        }
    }
}

/// Window renderer backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererChoice {
    Wgpu,
    Glow,
    /// Whatever the GUI toolkit picks first.
    Default,
}

/// Renderer backends compiled into the running binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RendererSupport {
    pub wgpu: bool,
    pub glow: bool,
}
