use super::DetectionEngine;
use crate::{Result, codec::RasterImage};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// Owns the single engine instance and serializes access to it.
pub struct InferenceGate {
    engine: Mutex<Box<dyn DetectionEngine>>,
}

impl InferenceGate {
    pub fn new(engine: Box<dyn DetectionEngine>) -> Self {
        Self {
            engine: Mutex::new(engine),
        }
    }

    /// Runs detect then draw under one lock acquisition. Blocks the calling
    /// thread while another request holds the engine.
    pub fn process(&self, image: &mut RasterImage) -> Result<bool> {
        let mut engine = self.engine.lock().unwrap_or_else(|poisoned| {
            warn!("Engine lock was poisoned by a panicking request, recovering");
            PoisonError::into_inner(poisoned)
        });

        let objects = engine.detect_objects(image)?;
        debug!("Detected {} objects", objects.len());
        let annotated = engine.draw_object_labels(image, &objects)?;

        Ok(annotated)
    }
}
