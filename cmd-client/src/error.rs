use cmd_core::CmdError;

/// Error type for service requests.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed before a response arrived
    #[error("HTTP error: {0}")]
    Http(String),
    /// Failed to decode the response body
    #[error("Parse error: {0}")]
    Parse(String),
    /// Server returned a non-success status
    #[error("{message}")]
    ServerError { status: u16, message: String },
    /// A required field was absent from the response
    #[error("{0} not received.")]
    MissingField(&'static str),
    /// Failure inside a locally served operation
    #[error(transparent)]
    Core(#[from] CmdError),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Parse(err.to_string())
        } else {
            ClientError::Http(err.to_string())
        }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::Http(format!("Invalid service URL: {err}"))
    }
}

impl From<ClientError> for CmdError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Core(inner) => inner,
            ClientError::Parse(_) | ClientError::MissingField(_) => {
                CmdError::ParseFailure(err.to_string())
            }
            ClientError::Http(_) | ClientError::ServerError { .. } => {
                CmdError::FetchFailure(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_maps_to_fetch_failure() {
        let err: CmdError = ClientError::ServerError {
            status: 404,
            message: "Isochrone file not found or server error (404)".to_string(),
        }
        .into();
        match err {
            CmdError::FetchFailure(msg) => {
                assert_eq!(msg, "Isochrone file not found or server error (404)")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_missing_field_maps_to_parse_failure() {
        let err: CmdError = ClientError::MissingField("Finder chart URL").into();
        assert!(
            matches!(err, CmdError::ParseFailure(ref m) if m == "Finder chart URL not received.")
        );
    }

    #[test]
    fn test_core_error_passes_through() {
        let err: CmdError = ClientError::Core(CmdError::InvalidInput("bad".into())).into();
        assert!(matches!(err, CmdError::InvalidInput(_)));
    }
}
