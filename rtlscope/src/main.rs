mod cli;

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::{LevelFilter, error, info};

use rtlscope_engine::{
    DeviceEntry, DisplaySinkFactory, LibrarySearchPath, Lifecycle, MAX_PROBED_DEVICES,
    RadioDriver, RtlSdrLoader, assemble, enumerate, probe,
};
use rtlscope_messages::{DisabledGpu, GpuProbe, RadioConfig, ScopeStatus};
use rtlscope_ui::{WgpuProbe, WindowLayout};

use cli::Args;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::builder()
        .format(|buf, record| {
            writeln!(
                buf,
                "{:<5} [{}] {}",
                record.level(),
                record.module_path().unwrap_or(""),
                record.args()
            )
        })
        .target(env_logger::Target::Stdout)
        .filter_level(LevelFilter::Warn)
        .filter_module("rtlscope", level)
        .filter_module("rtlscope_engine", level)
        .filter_module("rtlscope_ui", level)
        .filter_module("wgpu_core", LevelFilter::Warn)
        .filter_module("wgpu_hal", LevelFilter::Error)
        .filter_module("naga", LevelFilter::Warn)
        .parse_default_env()
        .init();
}

fn detect_report(devices: &[DeviceEntry]) -> Vec<String> {
    if devices.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![format!("Found {} RTL-SDR device(s):", devices.len())];
    lines.extend(
        devices
            .iter()
            .map(|d| format!("  Device #{}: {}", d.index, d.label)),
    );
    lines.push(String::new());
    lines.push(String::from(
        "To use a specific device, run with the -d/--device option.",
    ));
    lines
}

/// `--detect`: list the attached devices. Opens and closes each one; never
/// configures a device or builds a pipeline.
fn detect(driver: &dyn RadioDriver, out: &mut dyn Write) -> anyhow::Result<()> {
    let devices = enumerate(driver, MAX_PROBED_DEVICES);
    for line in detect_report(&devices) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn banner(config: &RadioConfig) -> Vec<String> {
    vec![
        String::from("Starting RTL-SDR Spectrum Analyzer with:"),
        format!("  Device Index: {}", config.device_index),
        format!(
            "  Center Frequency: {:.3} MHz",
            config.center_frequency.as_mhz()
        ),
        format!("  Sample Rate: {:.3} MHz", config.sample_rate.as_mhz()),
        format!("  Gain: {} dB", config.gain.as_db()),
        String::from("Press Ctrl+C to exit"),
    ]
}

fn run(args: Args) -> anyhow::Result<()> {
    let search = LibrarySearchPath::from_env();

    // Detection never opens a window, so the GPU is not probed for it.
    let gpu_probe: Box<dyn GpuProbe> = if args.no_gpu || args.detect {
        Box::new(DisabledGpu)
    } else {
        Box::new(WgpuProbe)
    };
    let report = probe(&search, gpu_probe.as_ref(), &RtlSdrLoader)
        .context("Failed to initialize RTL-SDR support")?;

    if args.detect {
        return detect(report.driver.as_ref(), &mut std::io::stdout().lock());
    }

    let config = args.radio_config();
    let mut factory = DisplaySinkFactory::new(rtlscope_ui::renderer_support());
    let assembly = assemble(&config, report.driver.as_ref(), &report.gpu, &mut factory)?;
    let status = ScopeStatus::new(
        &config,
        assembly.tuner.clone(),
        assembly.variant,
        report.gpu.clone(),
    );
    info!("Visualization: {}", assembly.variant.label());

    let lifecycle = Arc::new(Lifecycle::new(Box::new(assembly.flowgraph), |code| {
        std::process::exit(code)
    }));
    {
        let lifecycle = Arc::clone(&lifecycle);
        ctrlc::set_handler(move || lifecycle.shutdown())
            .context("Failed to install signal handler")?;
    }

    for line in banner(&config) {
        println!("{line}");
    }
    lifecycle.start()?;

    // Blocks until the window is closed.
    let layout = WindowLayout::new(assembly.variant.renderer(), status, assembly.surfaces);
    if let Err(err) = rtlscope_ui::run(layout) {
        error!("{err:?}");
        lifecycle.shutdown_with_status(1);
    }
    lifecycle.shutdown();
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:?}");
            ExitCode::FAILURE
        }
    }
}
