//! Minimal in-order evaluator for a linear processor network

use crate::error::Result;
use ivw_core::InvalidationLevel;
use ivw_processor::{unique_identifier, Processor};

/// Processors in topological order
#[derive(Default)]
pub struct Network {
    processors: Vec<Box<dyn Processor>>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a processor after the existing ones, renaming it if its identifier
    /// is taken. Returns the final identifier.
    pub fn add(&mut self, processor: Box<dyn Processor>) -> String {
        let identifier = unique_identifier(&processor.identifier(), |candidate| {
            self.processors.iter().any(|p| p.identifier() == candidate)
        });
        processor.base().set_identifier(identifier.as_str());
        processor
            .base()
            .invalidate(InvalidationLevel::InvalidResources, None);
        log::debug!("Added processor {}", identifier);
        self.processors.push(processor);
        identifier
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    pub fn processor(&self, identifier: &str) -> Option<&dyn Processor> {
        self.processors
            .iter()
            .find(|p| p.identifier() == identifier)
            .map(|p| p.as_ref())
    }

    /// One pass over the network. Returns how many processors ran.
    pub fn evaluate(&mut self) -> Result<usize> {
        let mut evaluated = 0;
        for processor in &mut self.processors {
            if !processor.is_ready() {
                log::debug!("{} is not ready", processor.identifier());
                continue;
            }
            if !processor.is_modified() {
                log::trace!("{} is unchanged", processor.identifier());
                continue;
            }
            if processor.invalidation_level() >= InvalidationLevel::InvalidResources {
                processor.initialize_resources()?;
            }
            processor.process()?;
            processor.set_valid();
            processor.base().take_evaluation_request();
            log::info!("Evaluated {}", processor.identifier());
            evaluated += 1;
        }
        Ok(evaluated)
    }
}
