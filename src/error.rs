use thiserror::Error;

pub type Result<T> = std::result::Result<T, RaceError>;

#[derive(Debug, Error)]
pub enum RaceError {
    #[error("passage corpus `{0}` not found")]
    MissingCorpus(String),

    #[error("passage corpus `{0}` has no passages")]
    EmptyCorpus(String),

    #[error("unable to parse passage corpus: {0}")]
    CorpusFormat(#[from] serde_json::Error),

    /// Words per minute is undefined when no time passed between start and stop
    #[error("race stopped {elapsed_ms} ms after it started, wpm is undefined")]
    ZeroElapsed { elapsed_ms: i64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
