mod gate;

pub use gate::InferenceGate;

use crate::{Result, codec::RasterImage};
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct DetectedObject {
    pub class_id: u32,
    pub label: String,
    pub score: f32,
    pub bbox: [f32; 4], // [x_min, y_min, x_max, y_max]
}

/// Engine output, handed back to the same engine for drawing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionResult {
    pub items: Vec<DetectedObject>,
}

impl DetectionResult {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A stateful detection backend. Implementations need not be `Sync`; the
/// [`InferenceGate`] admits one caller at a time.
#[cfg_attr(test, mockall::automock)]
pub trait DetectionEngine: Send {
    fn detect_objects(&mut self, image: &RasterImage) -> Result<DetectionResult>;

    /// Returns `true` when the image was modified.
    fn draw_object_labels(
        &mut self,
        image: &mut RasterImage,
        objects: &DetectionResult,
    ) -> Result<bool>;
}

/// Engine used when no detection backend is linked in. Finds nothing.
#[derive(Debug, Default)]
pub struct NullEngine;

impl NullEngine {
    pub fn new(model_path: Option<&str>) -> Self {
        if let Some(path) = model_path {
            warn!(
                "No detection backend linked, model {} will not be loaded",
                path
            );
        }
        Self
    }
}

impl DetectionEngine for NullEngine {
    fn detect_objects(&mut self, _image: &RasterImage) -> Result<DetectionResult> {
        Ok(DetectionResult::default())
    }

    fn draw_object_labels(
        &mut self,
        _image: &mut RasterImage,
        _objects: &DetectionResult,
    ) -> Result<bool> {
        Ok(false)
    }
}
