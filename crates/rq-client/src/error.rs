use derive_more::From;
use orion_error::{ErrorCode, StructError, UvsReason};

#[derive(Debug, Clone, PartialEq, thiserror::Error, From)]
pub enum ClientReason {
    #[error("configuration error")]
    Config,
    #[error("schema error")]
    Schema,
    #[error("translation error")]
    Translate,
    #[error("{0}")]
    Uvs(UvsReason),
}

impl ErrorCode for ClientReason {
    fn error_code(&self) -> i32 {
        match self {
            Self::Config => 3001,
            Self::Schema => 3002,
            Self::Translate => 3003,
            Self::Uvs(u) => u.error_code(),
        }
    }
}

pub type ClientError = StructError<ClientReason>;
pub type ClientResult<T> = Result<T, ClientError>;
