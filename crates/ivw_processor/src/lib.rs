//! # ivw_processor - Processors and Ports
//!
//! The contract between processors and the network evaluator:
//!
//! - [`Processor::is_ready`]: every required inport has valid data upstream
//! - [`Processor::is_modified`]: something changed since the last evaluation
//! - [`Processor::process`] then [`Processor::set_valid`]
//!
//! Ports are typed ([`Inport<T>`], [`Outport<T>`]) so a connection between
//! mismatched data types does not compile. [`JobPool`] moves expensive work
//! to background threads and hands results back on the evaluator thread.

pub mod error;
pub mod info;
pub mod pool;
pub mod ports;
pub mod processor;

pub use error::{ProcessorError, Result};
pub use info::{CodeState, ProcessorInfo};
pub use pool::{JobError, JobId, JobPool, PoolOptions, Progress, Stop};
pub use ports::{connect, disconnect, Inport, InportObject, Outport, OutportObject};
pub use processor::{unique_identifier, Processor, ProcessorBase, DEFAULT_PORT_GROUP};

pub mod prelude {
    pub use crate::error::{ProcessorError, Result};
    pub use crate::info::{CodeState, ProcessorInfo};
    pub use crate::pool::{JobPool, PoolOptions, Progress, Stop};
    pub use crate::ports::{connect, disconnect, Inport, InportObject, Outport, OutportObject};
    pub use crate::processor::{unique_identifier, Processor, ProcessorBase};
    pub use ivw_core::InvalidationLevel;
}
