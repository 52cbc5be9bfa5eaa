//! Demo processors: generate a buffer, summarize it, report the summary

use crate::config::PipelineConfig;
use crate::error::Result;
use ivw_camera::prelude::Vec3;
use ivw_camera::{CameraConfig, CameraProperty};
use ivw_core::InvalidationLevel;
use ivw_format::{DataFormatBase, DataFormatId};
use ivw_processor::{
    CodeState, Inport, JobError, JobPool, Outport, PoolOptions, Processor, ProcessorBase,
    ProcessorError, ProcessorInfo, Progress, Stop,
};
use ivw_property::{Property, PropertyError};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Raw elements of a single format
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    pub format: DataFormatId,
    pub data: Vec<u8>,
}

impl Buffer {
    pub fn len(&self) -> usize {
        let size = DataFormatBase::get_by_id(self.format).size();
        if size == 0 {
            0
        } else {
            self.data.len() / size
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Writes `i * scale` into element `i`
pub struct BufferSource {
    base: ProcessorBase,
    outport: Outport<Buffer>,
    format: Property<DataFormatId>,
    count: Property<usize>,
    scale: Property<f64>,
}

impl BufferSource {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let base = ProcessorBase::new("Buffer Source");
        let outport = Outport::new("buffer");
        let format = Property::new("format", "Format", config.format)
            .with_invalidation_level(InvalidationLevel::InvalidResources);
        let count = Property::new("count", "Count", config.count).with_range(1, 1 << 20);
        let scale = Property::new("scale", "Scale", config.scale);

        base.add_outport(&outport)?;
        base.add_property(&format)?;
        base.add_property(&count)?;
        base.add_property(&scale)?;
        Ok(Self {
            base,
            outport,
            format,
            count,
            scale,
        })
    }

    pub fn outport(&self) -> &Outport<Buffer> {
        &self.outport
    }

    pub fn format(&self) -> &Property<DataFormatId> {
        &self.format
    }

    pub fn count(&self) -> &Property<usize> {
        &self.count
    }

    pub fn scale(&self) -> &Property<f64> {
        &self.scale
    }
}

impl Processor for BufferSource {
    fn base(&self) -> &ProcessorBase {
        &self.base
    }

    fn info(&self) -> ProcessorInfo {
        ProcessorInfo::new("org.inviwo.BufferSource", "Buffer Source")
            .category("Data Input")
            .code_state(CodeState::Stable)
            .tags("CPU, Buffer")
    }

    fn initialize_resources(&mut self) -> ivw_processor::Result<()> {
        let format = DataFormatBase::get_by_id(self.format.get());
        log::info!(
            "{}: element format {} ({} bytes, {} component(s))",
            self.identifier(),
            format,
            format.size(),
            format.components()
        );
        Ok(())
    }

    fn process(&mut self) -> ivw_processor::Result<()> {
        let format = DataFormatBase::get_by_id(self.format.get());
        let (count, scale) = (self.count.get(), self.scale.get());
        if format.size() == 0 {
            return Err(ProcessorError::Process {
                processor: self.identifier(),
                message: format!("cannot generate {} data", format),
            });
        }
        let mut data = vec![0u8; count * format.size()];
        for (i, element) in data.chunks_exact_mut(format.size()).enumerate() {
            format.f64_to_value(i as f64 * scale, element)?;
        }
        self.outport.set_data(Buffer {
            format: format.id(),
            data,
        });
        Ok(())
    }
}

/// Summary of a buffer's first components
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

fn compute_stats(
    format: DataFormatId,
    data: &[u8],
    normalized: bool,
    stop: &Stop,
    progress: &Progress,
) -> std::result::Result<Stats, JobError> {
    let format = DataFormatBase::get_by_id(format);
    let size = format.size();
    if size == 0 {
        return Err(format!("cannot summarize {} data", format).into());
    }
    let n = data.len() / size;
    let mut stats = Stats {
        count: n,
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
        mean: 0.0,
    };
    let mut sum = 0.0;
    for (i, element) in data.chunks_exact(size).enumerate() {
        if stop.is_stopped() {
            return Err("statistics job stopped".into());
        }
        let value = if normalized {
            format.value_to_normalized_f64(element)?
        } else {
            format.value_to_f64(element)?
        };
        stats.min = stats.min.min(value);
        stats.max = stats.max.max(value);
        sum += value;
        progress.set_step(i + 1, n);
    }
    if n > 0 {
        stats.mean = sum / n as f64;
    } else {
        stats.min = 0.0;
        stats.max = 0.0;
    }
    Ok(stats)
}

/// Min, max and mean of the incoming buffer, computed on a worker thread
pub struct Statistics {
    base: ProcessorBase,
    inport: Inport<Buffer>,
    outport: Outport<Stats>,
    normalized: Property<bool>,
    pool: JobPool<Stats>,
    result: Rc<RefCell<Option<Stats>>>,
    failure: Rc<RefCell<Option<String>>>,
}

impl Statistics {
    pub const JOB_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new() -> Result<Self> {
        let base = ProcessorBase::new("Statistics");
        let inport = Inport::new("buffer");
        let outport = Outport::new("stats");
        let normalized = Property::new("normalized", "Normalized", false);
        base.add_inport(&inport)?;
        base.add_outport(&outport)?;
        base.add_property(&normalized)?;

        let failure = Rc::new(RefCell::new(None));
        let mut pool = JobPool::new(PoolOptions::default());
        let slot = Rc::clone(&failure);
        pool.set_error_handler(move |e| *slot.borrow_mut() = Some(e.to_string()));
        Ok(Self {
            base,
            inport,
            outport,
            normalized,
            pool,
            result: Rc::new(RefCell::new(None)),
            failure,
        })
    }

    pub fn inport(&self) -> &Inport<Buffer> {
        &self.inport
    }

    pub fn outport(&self) -> &Outport<Stats> {
        &self.outport
    }

    pub fn normalized(&self) -> &Property<bool> {
        &self.normalized
    }
}

impl Processor for Statistics {
    fn base(&self) -> &ProcessorBase {
        &self.base
    }

    fn info(&self) -> ProcessorInfo {
        ProcessorInfo::new("org.inviwo.BufferStatistics", "Statistics")
            .category("Information")
            .tags("CPU, Buffer")
    }

    fn process(&mut self) -> ivw_processor::Result<()> {
        let buffer = self.inport.data().ok_or_else(|| ProcessorError::Process {
            processor: self.identifier(),
            message: "no input buffer".to_string(),
        })?;
        let (format, data) = (buffer.format, buffer.data.clone());
        let normalized = self.normalized.get();

        let slot = Rc::clone(&self.result);
        self.pool.dispatch_one(
            move |stop, progress| compute_stats(format, &data, normalized, &stop, &progress),
            move |stats| *slot.borrow_mut() = Some(stats),
        );
        self.pool.wait(Self::JOB_TIMEOUT);

        let stats = self.result.borrow_mut().take();
        let failure = self.failure.borrow_mut().take();
        let stats = stats.ok_or_else(|| ProcessorError::Process {
            processor: self.identifier(),
            message: failure.unwrap_or_else(|| "statistics job timed out".to_string()),
        })?;
        self.outport.set_data(stats);
        Ok(())
    }
}

/// Sink that logs the statistics and the camera it would render them with
pub struct Report {
    base: ProcessorBase,
    inport: Inport<Stats>,
    camera: CameraProperty,
    last: Option<Stats>,
}

impl Report {
    pub fn new(camera: &CameraConfig) -> Result<Self> {
        let base = ProcessorBase::new("Report");
        let inport = Inport::new("stats");
        let property = CameraProperty::new(
            "camera",
            "Camera",
            camera.look_from,
            camera.look_to,
            camera.look_up,
        )?;
        property.set_camera(&camera.build())?;
        base.add_inport(&inport)?;
        base.add_property(&property)?;
        Ok(Self {
            base,
            inport,
            camera: property,
            last: None,
        })
    }

    pub fn inport(&self) -> &Inport<Stats> {
        &self.inport
    }

    pub fn camera(&self) -> &CameraProperty {
        &self.camera
    }

    pub fn last(&self) -> Option<Stats> {
        self.last
    }
}

impl Processor for Report {
    fn base(&self) -> &ProcessorBase {
        &self.base
    }

    fn info(&self) -> ProcessorInfo {
        ProcessorInfo::new("org.inviwo.Report", "Report")
            .category("Output")
            .code_state(CodeState::Experimental)
    }

    fn process(&mut self) -> ivw_processor::Result<()> {
        self.last = self.inport.data().map(|s| *s);
        if let Some(stats) = &self.last {
            let json = serde_json::to_string(stats).map_err(PropertyError::from)?;
            log::info!("{}: {}", self.identifier(), json);
        }

        let camera = self.camera.camera();
        let corner = camera.world_position_from_ndc(Vec3::new(-1.0, -1.0, -1.0));
        log::info!(
            "{}: {} camera, near-plane corner at ({:.3}, {:.3}, {:.3}), projection computed {} time(s)",
            self.identifier(),
            camera.kind(),
            corner.x,
            corner.y,
            corner.z,
            camera.projection_cache().recompute_count()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ivw_processor::connect;

    fn source(format: DataFormatId, count: usize, scale: f64) -> BufferSource {
        BufferSource::new(&PipelineConfig {
            format,
            count,
            scale,
            passes: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_source_writes_scaled_values() {
        let mut src = source(DataFormatId::Int16, 4, -2.0);
        src.process().unwrap();
        let buffer = src.outport().data().unwrap();
        assert_eq!(buffer.len(), 4);
        let format = DataFormatBase::get_by_id(DataFormatId::Int16);
        let values: Vec<f64> = buffer
            .data
            .chunks_exact(2)
            .map(|e| format.value_to_f64(e).unwrap())
            .collect();
        assert_eq!(values, vec![0.0, -2.0, -4.0, -6.0]);
    }

    #[test]
    fn test_source_rejects_unspecialized_format() {
        let mut src = source(DataFormatId::NotSpecialized, 4, 1.0);
        assert!(matches!(src.process(), Err(ProcessorError::Process { .. })));
    }

    #[test]
    fn test_format_change_requests_resources() {
        let src = source(DataFormatId::Float32, 4, 1.0);
        src.format().set(DataFormatId::UInt8).unwrap();
        assert_eq!(src.invalidation_level(), InvalidationLevel::InvalidResources);
    }

    #[test]
    fn test_compute_stats() {
        let format = DataFormatBase::get_by_id(DataFormatId::UInt8);
        let data = [0u8, 51, 255];
        let (stop, progress) = (Stop::default(), Progress::default());
        let stats = compute_stats(format.id(), &data, false, &stop, &progress).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 255.0);
        assert_eq!(stats.mean, 102.0);

        let normalized = compute_stats(format.id(), &data, true, &stop, &progress).unwrap();
        assert_eq!(normalized.max, 1.0);
        assert!((normalized.mean - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_statistics_runs_job_and_publishes() {
        let mut src = source(DataFormatId::Float64, 5, 1.0);
        let mut stats = Statistics::new().unwrap();
        connect(src.outport(), stats.inport()).unwrap();
        src.process().unwrap();
        src.set_valid();
        assert!(stats.is_ready());

        stats.process().unwrap();
        let out = stats.outport().data().unwrap();
        assert_eq!(out.count, 5);
        assert_eq!(out.max, 4.0);
        assert_eq!(out.mean, 2.0);
    }

    #[test]
    fn test_report_keeps_configured_camera() {
        let config = CameraConfig {
            near: 0.5,
            far: 50.0,
            ..CameraConfig::default()
        };
        let report = Report::new(&config).unwrap();
        let camera = report.camera().camera();
        assert_eq!(camera.near_plane_dist(), 0.5);
        assert_eq!(camera.far_plane_dist(), 50.0);
        assert!(report.base().is_sink());
    }
}
