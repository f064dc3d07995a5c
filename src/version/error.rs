use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("Empty version string")]
    EmptyVersion,

    #[error("Malformed range token {token:?} in {range:?}")]
    MalformedRange { token: String, range: String },
}
