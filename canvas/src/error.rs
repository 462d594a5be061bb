//! Error types for document loading, export, configuration and rendering.

/// Failure of a load, export or configuration step.
///
/// Every variant is terminal for the single invocation that produced it and
/// leaves the engine in its previous state.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    /// The document text is not well-formed markup.
    #[error("document is not well-formed markup: {0}")]
    ParseFailure(#[from] markup::MarkupError),
    /// The underlying file could not be read.
    #[error("failed to read document: {0}")]
    ReadFailure(String),
    /// The export target could not be written.
    #[error("failed to write document: {0}")]
    WriteFailure(String),
    /// A configuration value is out of range.
    #[error("invalid viewer config: {0}")]
    InvalidConfig(String),
    /// Configuration JSON could not be decoded.
    #[error("failed to parse viewer config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

/// Failure inside a renderer backend.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("graphics context is unavailable")]
    ContextUnavailable,
    #[error("shader failed to compile: {0}")]
    ShaderCompile(String),
    #[error("shader program failed to link: {0}")]
    ProgramLink(String),
    #[error("failed to allocate a GPU buffer")]
    BufferAllocation,
    #[error("uniform `{0}` not found in program")]
    MissingUniform(String),
    #[error("attribute `{0}` not found in program")]
    MissingAttribute(String),
    #[error("point and color buffers differ in length ({points} vs {colors})")]
    BufferMismatch { points: usize, colors: usize },
    #[error("graphics call failed: {0}")]
    Backend(String),
}
