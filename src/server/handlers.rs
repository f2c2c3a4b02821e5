use super::types::FetchQuery;
use crate::{
    Error, Result, codec,
    config::{Config, FetchConfig, OutputFormat},
    engine::{DetectionEngine, InferenceGate},
    fetch::RemoteFetcher,
    pipeline::{ImagePipeline, PipelineOutcome, RejectReason},
};
use axum::{
    body::Bytes,
    extract::{
        Query, State,
        rejection::{BytesRejection, QueryRejection},
    },
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, info};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ImagePipeline>,
    pub fetcher: Arc<dyn RemoteFetcher>,
    pub fetch: Arc<FetchConfig>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(
        config: &Config,
        engine: Box<dyn DetectionEngine>,
        fetcher: Arc<dyn RemoteFetcher>,
    ) -> Self {
        let gate = Arc::new(InferenceGate::new(engine));
        Self {
            pipeline: Arc::new(ImagePipeline::new(gate, config.pipeline.clone())),
            fetcher,
            fetch: Arc::new(config.fetch.clone()),
            max_body_bytes: config.server.max_body_bytes,
        }
    }

    fn output_format(&self) -> OutputFormat {
        self.pipeline.config().output_format
    }

    /// Decode, run the pipeline and re-encode on the blocking pool. Rejected
    /// images are re-encoded as they are.
    async fn annotate(&self, bytes: Bytes) -> Result<(PipelineOutcome, Vec<u8>)> {
        let pipeline = self.pipeline.clone();
        let format = self.output_format();

        tokio::task::spawn_blocking(move || {
            let mut image = codec::decode_image(&bytes);
            let outcome = pipeline.run(&mut image)?;
            debug!("Pipeline outcome: {:?}", outcome);
            Ok((outcome, codec::encode_image(&image, format)?))
        })
        .await
        .map_err(|e| Error::engine(format!("Processing task failed: {}", e)))?
    }
}

fn image_response(body: Vec<u8>, format: OutputFormat) -> Response {
    ([(CONTENT_TYPE, format.content_type())], body).into_response()
}

pub async fn preflight() -> Response {
    ([(CONTENT_TYPE, "text/plain")], "OK").into_response()
}

pub async fn fetch_and_process(
    State(state): State<AppState>,
    query: std::result::Result<Query<FetchQuery>, QueryRejection>,
) -> Result<Response> {
    let Query(query) = query.map_err(|e| Error::fetch(format!("Invalid query string: {}", e)))?;
    let url = query
        .q
        .filter(|q| !q.is_empty())
        .ok_or_else(|| Error::fetch("Missing 'q' query parameter"))?;
    info!("URL: {}", url);

    let fetched = state.fetcher.fetch(&url).await?;
    let content_type = fetched
        .content_type
        .clone()
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());

    if !fetched.is_usable() || !state.fetch.accepts(&content_type) {
        debug!(
            "Passing through status {} body of type {}",
            fetched.status, content_type
        );
        return Ok(([(CONTENT_TYPE, content_type)], fetched.body).into_response());
    }

    info!("Handling: {}", content_type);
    let (outcome, encoded) = state.annotate(fetched.body.clone()).await?;

    // Undecodable content goes back as it came
    if outcome == PipelineOutcome::Rejected(RejectReason::Empty) {
        debug!("Fetched {} did not decode, passing it through", content_type);
        return Ok(([(CONTENT_TYPE, content_type)], fetched.body).into_response());
    }

    Ok(image_response(encoded, state.output_format()))
}

pub async fn upload_and_process(
    State(state): State<AppState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Response> {
    let body = body.map_err(|e| Error::fetch(format!("Unreadable upload body: {}", e)))?;
    debug!("Received {} byte upload", body.len());

    let decoded = codec::decode_base64(&body);
    let (_, encoded) = state.annotate(Bytes::from(decoded)).await?;
    Ok(image_response(encoded, state.output_format()))
}
