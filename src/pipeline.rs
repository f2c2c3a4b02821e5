use crate::{
    Result, codec::RasterImage, config::PipelineConfig, engine::InferenceGate,
};
use std::{sync::Arc, time::Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Empty,
    TooSmall { width: u32, height: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    Annotated,
    Unchanged,
    Rejected(RejectReason),
}

impl PipelineOutcome {
    pub fn annotated(self) -> bool {
        matches!(self, Self::Annotated)
    }
}

/// Validates decoded images and drives accepted ones through the gate.
pub struct ImagePipeline {
    gate: Arc<InferenceGate>,
    config: PipelineConfig,
}

impl ImagePipeline {
    pub fn new(gate: Arc<InferenceGate>, config: PipelineConfig) -> Self {
        Self { gate, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn validate(&self, image: &RasterImage) -> std::result::Result<(), RejectReason> {
        if image.is_empty() {
            return Err(RejectReason::Empty);
        }

        if image.width() < self.config.min_width || image.height() < self.config.min_height {
            return Err(RejectReason::TooSmall {
                width: image.width(),
                height: image.height(),
            });
        }

        Ok(())
    }

    /// Single pass through the gate; engine faults are returned, not retried.
    pub fn run(&self, image: &mut RasterImage) -> Result<PipelineOutcome> {
        let start = Instant::now();

        if let Err(reason) = self.validate(image) {
            match reason {
                RejectReason::Empty => warn!("Image is empty"),
                RejectReason::TooSmall { width, height } => warn!(
                    "Image is too small: {}x{} (minimum {}x{})",
                    width, height, self.config.min_width, self.config.min_height
                ),
            }
            return Ok(PipelineOutcome::Rejected(reason));
        }

        let annotated = self.gate.process(image)?;

        info!(
            "Time taken: {:.3} seconds (annotated: {})",
            start.elapsed().as_secs_f64(),
            annotated
        );

        Ok(if annotated {
            PipelineOutcome::Annotated
        } else {
            PipelineOutcome::Unchanged
        })
    }
}
