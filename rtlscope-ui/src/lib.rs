mod colormap;
mod control_panel;
mod phosphor;
mod probe;
mod spectrum;
mod state;
mod waterfall;

use std::time::Duration;

use eframe::egui;
use rtlscope_messages::{RendererChoice, RendererSupport, ScopeStatus, SinkVariant, Surface};
use state::SurfacePanel;

pub use probe::WgpuProbe;

/// Window title of the analyzer.
pub const WINDOW_TITLE: &str = "RTL-SDR Spectrum Analyzer";
/// Initial inner size of the window.
pub const WINDOW_SIZE: [f32; 2] = [1200.0, 800.0];

/// Everything the window shows, stacked top to bottom in `surfaces` order.
pub struct WindowLayout {
    pub title: String,
    pub size: [f32; 2],
    pub renderer: RendererChoice,
    pub status: ScopeStatus,
    pub surfaces: Vec<Surface>,
}

impl WindowLayout {
    pub fn new(renderer: RendererChoice, status: ScopeStatus, surfaces: Vec<Surface>) -> Self {
        Self {
            title: WINDOW_TITLE.to_string(),
            size: WINDOW_SIZE,
            renderer,
            status,
            surfaces,
        }
    }
}

/// Renderers compiled into this build.
pub fn renderer_support() -> RendererSupport {
    RendererSupport {
        wgpu: cfg!(feature = "wgpu"),
        glow: cfg!(feature = "glow"),
    }
}

/// Main application struct implementing the egui App trait.
struct ScopeApp {
    status: ScopeStatus,
    panels: Vec<SurfacePanel>,
    repaint_interval: Duration,
}

impl ScopeApp {
    fn new(status: ScopeStatus, surfaces: Vec<Surface>) -> Self {
        let repaint_interval = surfaces
            .iter()
            .map(|s| s.settings.update_interval)
            .min()
            .unwrap_or(Duration::from_millis(50));
        Self {
            status,
            panels: surfaces.into_iter().map(SurfacePanel::new).collect(),
            repaint_interval,
        }
    }

    fn status_line(&self) -> String {
        let s = &self.status;
        let mut line = format!(
            "Device #{}  |  {}  |  {:.3} MS/s  |  Gain {:.1} dB  |  {}",
            s.device_index,
            s.center_frequency,
            s.sample_rate.as_mhz(),
            s.gain.as_db(),
            s.variant.label(),
        );
        if let Some(tuner) = &s.tuner {
            line.push_str(&format!("  |  Tuner {tuner}"));
        }
        line.push_str(&format!("  |  {}", s.gpu));
        line
    }
}

impl eframe::App for ScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        for panel in &mut self.panels {
            panel.drain();
        }
        let stalled = self.panels.iter().all(|p| !p.live);

        egui::TopBottomPanel::top("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.status_line());
                if stalled {
                    ui.colored_label(ui.visuals().warn_fg_color, "Pipeline stopped");
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let n = self.panels.len().max(1) as f32;
            let spacing = ui.spacing().item_spacing.y;
            let height = ((ui.available_height() - spacing * (n - 1.0)) / n).max(0.0);
            for panel in &mut self.panels {
                let size = egui::vec2(ui.available_width(), height);
                ui.allocate_ui(size, |ui| {
                    ui.set_min_size(size);
                    panel.show(ui);
                });
            }
        });

        ctx.request_repaint_after(self.repaint_interval);
    }
}

#[allow(unreachable_patterns)]
fn native_renderer(choice: RendererChoice) -> Option<eframe::Renderer> {
    match choice {
        #[cfg(feature = "wgpu")]
        RendererChoice::Wgpu => Some(eframe::Renderer::Wgpu),
        #[cfg(feature = "glow")]
        RendererChoice::Glow => Some(eframe::Renderer::Glow),
        _ => None,
    }
}

/// Visualization path a renderer stands for in the status line.
fn variant_for(renderer: RendererChoice) -> SinkVariant {
    match renderer {
        RendererChoice::Wgpu => SinkVariant::GpuPrimary,
        RendererChoice::Glow => SinkVariant::GpuFallback,
        RendererChoice::Default => SinkVariant::Standard,
    }
}

/// Renderers to try in order, starting at `first` and skipping those not
/// compiled in.
fn renderer_chain(first: RendererChoice, support: RendererSupport) -> Vec<RendererChoice> {
    use RendererChoice::{Default, Glow, Wgpu};

    let order: &[RendererChoice] = match first {
        Wgpu => &[Wgpu, Glow, Default],
        Glow => &[Glow, Default],
        Default => &[Default],
    };
    order
        .iter()
        .copied()
        .filter(|r| match r {
            Wgpu => support.wgpu,
            Glow => support.glow,
            Default => true,
        })
        .collect()
}

/// Try `launch` with each renderer of `chain` until one opens the window.
///
/// `launch` takes the app out of the slot once the window exists. A failure
/// that leaves the app in place happened during renderer setup and moves on
/// to the next renderer; any later failure is returned as is.
fn launch_with_fallback<F>(
    chain: &[RendererChoice],
    app: ScopeApp,
    mut launch: F,
) -> anyhow::Result<RendererChoice>
where
    F: FnMut(RendererChoice, &mut Option<ScopeApp>) -> anyhow::Result<()>,
{
    let mut slot = Some(app);
    let mut last_err = None;

    for &renderer in chain {
        if let Some(app) = slot.as_mut() {
            app.status.variant = variant_for(renderer);
        }
        match launch(renderer, &mut slot) {
            Ok(()) => return Ok(renderer),
            Err(e) if slot.is_some() => {
                log::warn!("Could not open window with {renderer:?} renderer: {e:#}");
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("no renderer available")))
}

type DynError = Box<dyn std::error::Error + Send + Sync>;

fn take_app(slot: &mut Option<ScopeApp>) -> Result<Box<dyn eframe::App>, DynError> {
    match slot.take() {
        Some(app) => Ok(Box::new(app)),
        None => Err("window already created".into()),
    }
}

/// Entry point for the UI module.
///
/// Runs the eframe application on the main thread (blocking) until the
/// window is closed. If the renderer picked for the layout cannot be set up,
/// the remaining compiled renderers are tried before giving up.
pub fn run(layout: WindowLayout) -> anyhow::Result<()> {
    let WindowLayout {
        title,
        size,
        renderer,
        status,
        surfaces,
    } = layout;
    let chain = renderer_chain(renderer, renderer_support());
    let app = ScopeApp::new(status, surfaces);

    let used = launch_with_fallback(&chain, app, |renderer, slot| {
        let mut options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size(size)
                .with_title(&title),
            ..Default::default()
        };
        if let Some(renderer) = native_renderer(renderer) {
            options.renderer = renderer;
        }
        log::debug!("Opening window with {:?} renderer", options.renderer);

        eframe::run_native(&title, options, Box::new(|_cc| take_app(slot)))
            .map_err(|e| anyhow::anyhow!("{}", e))
    })?;
    log::debug!("Window closed ({used:?} renderer)");

    Ok(())
}
