//! Errors for the notation codec. Every variant names the malformed
//! substring so a caller (or a log line) can show the offending text.

#[derive(Debug, thiserror::Error)]
pub enum NotationError {
    #[error("unknown piece name {0:?}")]
    UnknownPieceName(String),

    #[error("unknown piece token {0:?}")]
    UnknownPieceToken(String),

    #[error("malformed position entry {0:?}")]
    MalformedPosition(String),

    #[error("coordinate {0:?} is not an integer pair")]
    NonIntegerCoordinate(String),

    #[error("malformed move {0:?}")]
    MalformedMove(String),

    #[error("malformed header line {0:?}")]
    MalformedHeader(String),

    #[error("unterminated {{...}} block starting at {0:?}")]
    UnterminatedBrace(String),

    #[error("unterminated [...] block starting at {0:?}")]
    UnterminatedBracket(String),

    #[error("invalid JSON in other-rules blob: {0}")]
    InvalidJson(#[from] serde_json::Error),
}
