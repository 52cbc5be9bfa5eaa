//! Processor network inspector
//!
//! Builds `Buffer Source -> Statistics -> Report`, evaluates it several times
//! and changes one property between passes, logging which processors the
//! invalidation protocol re-runs.
//!
//! Run with: cargo run -p ivw_inspect
//!       or: RUST_LOG=debug cargo run -p ivw_inspect -- inspect.toml

mod config;
mod error;
mod network;
mod processors;

use config::InspectConfig;
use error::Result;
use ivw_format::DataFormatId;
use ivw_processor::connect;
use ivw_property::Property;
use network::Network;
use processors::{BufferSource, Report, Statistics};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = InspectConfig::load();
    config.print_summary();

    if let Err(e) = run(&config) {
        log::error!("Inspection failed: {}", e);
        std::process::exit(1);
    }
}

/// Handles to the properties edited between passes
struct Knobs {
    scale: Property<f64>,
    format: Property<DataFormatId>,
    fov: Property<f32>,
    near: Property<f32>,
}

impl Knobs {
    /// Change something different on every pass
    fn turn(&self, pass: usize) -> Result<()> {
        match pass % 3 {
            0 => {
                let scale = self.scale.get() * 2.0;
                log::info!("Pass {}: scale -> {}", pass, scale);
                self.scale.set(scale)?;
            }
            1 => {
                // The fov child only reaches perspective cameras
                let fov = if self.fov.get() == 90.0 { 45.0 } else { 90.0 };
                let near = self.near.get() * 0.5;
                log::info!("Pass {}: camera fov -> {}, near -> {}", pass, fov, near);
                self.fov.set(fov)?;
                self.near.set(near)?;
            }
            _ => {
                let format = match self.format.get() {
                    DataFormatId::Float64 => DataFormatId::Float32,
                    _ => DataFormatId::Float64,
                };
                log::info!("Pass {}: format -> {}", pass, format);
                self.format.set(format)?;
            }
        }
        Ok(())
    }
}

fn run(config: &InspectConfig) -> Result<()> {
    let source = BufferSource::new(&config.pipeline)?;
    let stats = Statistics::new()?;
    let report = Report::new(&config.camera)?;
    connect(source.outport(), stats.inport())?;
    connect(stats.outport(), report.inport())?;

    let knobs = Knobs {
        scale: source.scale().clone(),
        format: source.format().clone(),
        fov: report.camera().fov().clone(),
        near: report.camera().near().clone(),
    };

    let mut network = Network::new();
    network.add(Box::new(source));
    network.add(Box::new(stats));
    network.add(Box::new(report));

    for pass in 0..config.pipeline.passes {
        if pass > 0 {
            knobs.turn(pass - 1)?;
        }
        let evaluated = network.evaluate()?;
        log::info!(
            "Pass {}: evaluated {} of {} processor(s)",
            pass,
            evaluated,
            network.len()
        );
    }
    Ok(())
}
