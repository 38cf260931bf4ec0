use thiserror::Error;

use crate::persist::PersistError;

/// Errors that abort a whole run. Nothing is written when one of these is returned.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing or malformed market list, thresholds or run settings
    #[error("configuration error: {0}")]
    Configuration(String),

    /// HTTP failure, non-2xx status or timeout while fetching a descriptor
    #[error("transport error for {descriptor}: {source}")]
    Transport {
        descriptor: String,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a GraphQL `errors` array
    #[error("graphql errors for {descriptor}: {messages}")]
    GraphQl { descriptor: String, messages: String },

    /// The endpoint answered but the market or reserve was null
    #[error("{kind} not found for {descriptor}")]
    NotFound {
        descriptor: String,
        kind: &'static str,
    },

    #[error("sink error: {0}")]
    Sink(#[from] PersistError),
}

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        PipelineError::Configuration(msg.into())
    }

    /// Process exit status for this failure class.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::Configuration(_) => 2,
            PipelineError::Transport { .. } => 3,
            PipelineError::GraphQl { .. } | PipelineError::NotFound { .. } => 4,
            PipelineError::Sink(_) => 5,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_per_class() {
        let config = PipelineError::config("no markets");
        let graphql = PipelineError::GraphQl { descriptor: "chainId=1 market=0xabc".into(), messages: "boom".into() };
        let missing = PipelineError::NotFound { descriptor: "chainId=1 market=0xabc".into(), kind: "market" };
        let sink = PipelineError::Sink(PersistError::MissingCredential("rest_url"));

        assert_eq!(config.exit_code(), 2);
        assert_eq!(graphql.exit_code(), 4);
        assert_eq!(missing.exit_code(), 4);
        assert_eq!(sink.exit_code(), 5);
    }

    #[test]
    fn protocol_errors_name_the_descriptor() {
        let err = PipelineError::NotFound { descriptor: "chainId=8453 market=0xdead".into(), kind: "market" };
        assert_eq!(err.to_string(), "market not found for chainId=8453 market=0xdead");
    }
}
