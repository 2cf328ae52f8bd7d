use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("network error: {0}")]
    Network(String),

    #[error("generator returned an error: {0}")]
    Api(String),

    #[error("could not parse generator response: {0}")]
    InvalidResponse(String),

    #[error("unknown generator provider: {0}")]
    UnknownProvider(String),
}

impl From<reqwest::Error> for GeneratorError {
    fn from(err: reqwest::Error) -> Self {
        GeneratorError::Network(err.to_string())
    }
}

impl From<GeneratorError> for hr_rag_core::Error {
    fn from(err: GeneratorError) -> Self {
        hr_rag_core::Error::upstream("generator", err.to_string())
    }
}
