use thiserror::Error;

/// Errors produced by the haven core and its collaborators.
#[derive(Debug, Error)]
pub enum HavenError {
    /// The corpus source is missing or malformed.
    #[error("corpus source error: {0}")]
    DataSource(String),

    /// A vectorizer was fit against zero corpus entries.
    #[error("cannot fit matcher on an empty corpus")]
    EmptyCorpus,

    /// A query string could not be encoded as a vector.
    #[error("vectorization error: {0}")]
    Vectorization(String),

    /// Chat store failure.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Encryption or decryption failure. Decryption failures are surfaced,
    /// never silently replaced with the raw input.
    #[error("cipher error: {0}")]
    Cipher(String),

    /// Signed-token verification failure.
    #[error("token error: {0}")]
    Token(String),

    /// LLM or resource endpoint failure.
    #[error("http error: {0}")]
    Http(String),

    /// Configuration problem (bad key material, unknown strategy, ...).
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, HavenError>;
