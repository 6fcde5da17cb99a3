/// Errors that can occur while archiving a completed game or updating the
/// stats file. Both archive and stats failures are logged by the caller and
/// never propagated past it (§4.4, §7): the game is still removed either way.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The transcript could not be rendered from the game record.
    #[error("notation encode failed: {0}")]
    Notation(#[from] chesscoord_notation::NotationError),

    /// The append-only log file could not be opened or written to.
    #[error("archive log write failed: {0}")]
    LogWrite(#[source] std::io::Error),

    /// The stats file could not be read, parsed, or written.
    #[error("stats file read/write failed: {0}")]
    StatsIo(#[source] std::io::Error),

    /// The stats file on disk was not valid JSON in the expected shape.
    #[error("stats file malformed: {0}")]
    StatsMalformed(#[from] serde_json::Error),
}
