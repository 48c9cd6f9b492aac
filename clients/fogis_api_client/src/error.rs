use thiserror::Error;

pub type Result<T, E = FogisError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum FogisError {
    #[error("login failed: {0}")]
    LoginFailed(#[from] LoginFailure),

    #[error("request failed ({context}): {source}")]
    RequestFailed {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid response data: {0}")]
    DataError(String),

    #[error("request for {endpoint} violates its contract at {path}: {message}")]
    ContractViolation {
        endpoint: String,
        path: String,
        message: String,
    },

    #[error("response from {endpoint} violates its contract at {path}: {message}")]
    UpstreamContractViolation {
        endpoint: String,
        path: String,
        message: String,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Why a login handshake could not produce a session.
///
/// `NoCredentials` and `InvalidCredentials` point at the caller's input;
/// `LoginFormNotFound` and `MissingToken` mean the upstream page changed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoginFailure {
    #[error("no username/password available for login")]
    NoCredentials,

    #[error("login form not found: {0}")]
    LoginFormNotFound(String),

    #[error("login page is missing the {0} token")]
    MissingToken(String),

    #[error("invalid credentials or login form changed")]
    InvalidCredentials,
}

impl FogisError {
    pub(crate) fn request(context: impl Into<String>, source: reqwest::Error) -> Self {
        FogisError::RequestFailed {
            context: context.into(),
            source,
        }
    }

    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            FogisError::ContractViolation { .. } | FogisError::UpstreamContractViolation { .. }
        )
    }
}
