use async_trait::async_trait;
use axum::body::Bytes;
use image::Rgb;
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};
use vision_gate::{
    Error, Result,
    codec::RasterImage,
    engine::{DetectedObject, DetectionEngine, DetectionResult},
    fetch::{FetchedContent, RemoteFetcher},
};

pub const MARK_COLOR: Rgb<u8> = Rgb([255, 0, 255]);

/// Observations shared between a [`RecordingEngine`] and the test body.
#[derive(Debug, Default)]
pub struct EngineLog {
    active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub detect_calls: AtomicUsize,
    pub draw_calls: AtomicUsize,
    pub intervals: Mutex<Vec<(Instant, Instant)>>,
    started: Mutex<Option<Instant>>,
}

impl EngineLog {
    pub fn detect_calls(&self) -> usize {
        self.detect_calls.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// True when no two detect+draw intervals overlap.
    pub fn intervals_disjoint(&self) -> bool {
        let mut intervals = self.intervals.lock().unwrap().clone();
        intervals.sort_by_key(|(start, _)| *start);
        intervals.windows(2).all(|pair| pair[0].1 <= pair[1].0)
    }
}

/// Engine that reports one object, optionally marks the top-left pixel, and
/// records when each detect+draw pair ran.
pub struct RecordingEngine {
    pub log: Arc<EngineLog>,
    pub delay: Duration,
    pub annotate: bool,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self {
            log: Arc::new(EngineLog::default()),
            delay: Duration::ZERO,
            annotate: true,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn without_annotation(mut self) -> Self {
        self.annotate = false;
        self
    }

    pub fn log(&self) -> Arc<EngineLog> {
        self.log.clone()
    }
}

impl DetectionEngine for RecordingEngine {
    fn detect_objects(&mut self, _image: &RasterImage) -> Result<DetectionResult> {
        let active = self.log.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.max_active.fetch_max(active, Ordering::SeqCst);
        self.log.detect_calls.fetch_add(1, Ordering::SeqCst);
        *self.log.started.lock().unwrap() = Some(Instant::now());

        thread::sleep(self.delay);

        Ok(DetectionResult {
            items: vec![DetectedObject {
                class_id: 0,
                label: "person".to_string(),
                score: 0.87,
                bbox: [0.0, 0.0, 0.25, 0.25],
            }],
        })
    }

    fn draw_object_labels(
        &mut self,
        image: &mut RasterImage,
        objects: &DetectionResult,
    ) -> Result<bool> {
        self.log.draw_calls.fetch_add(1, Ordering::SeqCst);
        if self.annotate && !objects.is_empty() {
            image.as_rgb_mut().put_pixel(0, 0, MARK_COLOR);
        }

        let start = self.log.started.lock().unwrap().take().unwrap_or_else(Instant::now);
        self.log
            .intervals
            .lock()
            .unwrap()
            .push((start, Instant::now()));
        self.log.active.fetch_sub(1, Ordering::SeqCst);

        Ok(self.annotate)
    }
}

/// Engine whose detection step always faults.
pub struct FaultyEngine {
    pub message: String,
}

impl DetectionEngine for FaultyEngine {
    fn detect_objects(&mut self, _image: &RasterImage) -> Result<DetectionResult> {
        Err(Error::engine(self.message.clone()))
    }

    fn draw_object_labels(
        &mut self,
        _image: &mut RasterImage,
        _objects: &DetectionResult,
    ) -> Result<bool> {
        unreachable!("draw is never reached after a failed detection")
    }
}

/// Engine that panics on its first detection and behaves afterwards.
#[derive(Default)]
pub struct PanicOnceEngine {
    panicked: AtomicBool,
}

impl DetectionEngine for PanicOnceEngine {
    fn detect_objects(&mut self, _image: &RasterImage) -> Result<DetectionResult> {
        if !self.panicked.swap(true, Ordering::SeqCst) {
            panic!("engine crashed mid-inference");
        }
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

/// Fetcher that answers every URL with the same canned response.
pub struct StaticFetcher {
    pub content: FetchedContent,
    pub requested: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<Bytes>) -> Self {
        Self {
            content: FetchedContent {
                status,
                content_type: content_type.map(str::to_string),
                body: body.into(),
            },
            requested: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RemoteFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedContent> {
        self.requested.lock().unwrap().push(url.to_string());
        Ok(self.content.clone())
    }
}
