use thiserror::Error;

/// Errors raised while building a [`Theme`](crate::Theme) or querying its tokens.
#[derive(Error, Debug)]
pub enum ThemeError {
    #[error("theme overrides must be a JSON object")]
    OverridesNotObject,
    #[error("malformed theme overrides: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("breakpoint `{key}` must be a non-negative whole number of pixels (got {value})")]
    InvalidBreakpoint { key: String, value: f64 },
    #[error("at least one breakpoint needs to be provided")]
    NoBreakpoints,
    #[error("unknown breakpoint `{0}`")]
    UnknownBreakpoint(String),
    #[error("breakpoint `{start}` must be smaller than `{end}`")]
    InvertedBreakpoints { start: String, end: String },
    #[error("could not parse color `{0}`")]
    InvalidColor(String),
    #[error("invalid typography: {0}")]
    InvalidTypography(&'static str),
}
