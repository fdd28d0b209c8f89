use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// No valid session; nothing was sent
    #[error("Sign in to chat")]
    SignInRequired,

    /// A turn is already in flight
    #[error("A response is still streaming")]
    Busy,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Server returned {status}")]
    Status { status: u16 },

    #[error("Malformed event stream: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Request(err.to_string())
    }
}
