use thiserror::Error;

/// Failure talking to the model collaborator.
///
/// Extraction never fails: text the extractor cannot understand simply yields
/// no commands.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AiError {
    #[error("model client misconfigured: {0}")]
    Config(String),

    #[error("model request failed: {0}")]
    Transport(String),

    #[error("model API error: {0}")]
    Api(String),

    #[error("unexpected model response: {0}")]
    UnexpectedResponse(String),
}
