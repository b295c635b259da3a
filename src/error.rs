use thiserror::Error;

/// Message prefix the renderer emits for near-zero plot widths; a pixel of resize fixes it.
const AX_DTICK_PREFIX: &str = "ax.dtick error";

/// Main library error type.
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("invalid visualization options: {0}")]
    Options(#[from] serde_json::Error),

    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

/// Errors raised by a chart surface while plotting or applying layout patches.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("{0}")]
    Plot(String),

    #[error("layout negotiation did not settle after {0} rounds")]
    Unsettled(usize),
}

impl RenderError {
    pub fn plot(msg: impl Into<String>) -> Self {
        RenderError::Plot(msg.into())
    }

    /// The one renderer quirk that is swallowed instead of reported.
    pub fn is_benign(&self) -> bool {
        matches!(self, RenderError::Plot(msg) if msg.starts_with(AX_DTICK_PREFIX))
    }
}

pub type Result<T> = std::result::Result<T, ChartError>;
