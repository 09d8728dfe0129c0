pub mod engine;
mod parse;
pub mod prompt;
mod request;
mod session;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cuesight_core::{BallKind, GameVariant, SceneError, Table};

pub use engine::{LlmGenerator, Timeout};
pub use parse::{sanitize, sanitize_with_report, PartialField};
pub use prompt::Prompt;
pub use request::{build_request, AnalyzePayload, BallInput};
pub use session::Session;

/// A point on the table as sent to the UI: `[x, y]`.
pub type Point = [f64; 2];

pub const FALLBACK_TEXT: &str = "Analysis complete.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BallDescriptor {
    pub kind: BallKind,
    pub x: i64,
    pub y: i64,
    pub label: String,
}

/// Snapshot of a scene ready for the model; coordinates are already rounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub cue_ball: BallDescriptor,
    pub game_type: GameVariant,
    pub balls: Vec<BallDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub text: String,
    pub stroke_point: Option<Point>,
    pub path: Vec<Point>,
}

impl AnalysisResult {
    /// Placeholder shown in place of an analysis when the call fails.
    pub fn failed(err: &AnalysisError) -> Self {
        AnalysisResult {
            text: err.user_message().to_string(),
            stroke_point: None,
            path: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("unreadable analysis request: {0}")]
    InvalidRequest(String),
    #[error("cue ball not found: {0}")]
    InvalidCueBall(String),
    #[error("invalid layout: {0}")]
    InvalidScene(SceneError),
    #[error("model call failed: {0}")]
    TransportFailure(String),
    #[error("model response is not a JSON object: {0}")]
    MalformedResponse(String),
}

impl AnalysisError {
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::InvalidRequest(_) => "invalid_request",
            AnalysisError::InvalidCueBall(_) => "invalid_cue_ball",
            AnalysisError::InvalidScene(_) => "invalid_scene",
            AnalysisError::TransportFailure(_) => "transport_failure",
            AnalysisError::MalformedResponse(_) => "malformed_response",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            AnalysisError::InvalidCueBall(_) => {
                "Analysis failed: select a white or yellow cue ball that is on the table."
            }
            AnalysisError::InvalidScene(_) => {
                "Analysis failed: the ball layout does not fit this game type."
            }
            AnalysisError::InvalidRequest(_)
            | AnalysisError::TransportFailure(_)
            | AnalysisError::MalformedResponse(_) => {
                "Analysis failed: please check the layout and try again."
            }
        }
    }
}

impl From<SceneError> for AnalysisError {
    fn from(err: SceneError) -> Self {
        match err {
            SceneError::InvalidCueBall(ident) => AnalysisError::InvalidCueBall(ident),
            other => AnalysisError::InvalidScene(other),
        }
    }
}

/// The outbound model capability: one prompt in, raw text out.
#[async_trait]
pub trait Generate: Send + Sync {
    async fn generate(&self, prompt: &Prompt) -> Result<String, AnalysisError>;
}

/// Run one analysis: prompt the model with `request` and sanitize its reply
/// into `table` bounds.
pub async fn analyze<G>(
    request: &AnalysisRequest,
    table: Table,
    generator: &G,
) -> Result<AnalysisResult, AnalysisError>
where
    G: Generate + ?Sized,
{
    let prompt = prompt::instruction(request, table);

    tracing::info!(
        game_type = %request.game_type,
        balls = request.balls.len(),
        "requesting shot analysis"
    );

    let raw = generator.generate(&prompt).await?;
    tracing::debug!("raw model output:\n{raw}");

    let result = sanitize(&raw, table)?;
    tracing::info!(
        has_stroke_point = result.stroke_point.is_some(),
        path_points = result.path.len(),
        "analysis sanitized"
    );
    Ok(result)
}
