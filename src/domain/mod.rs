use thiserror::Error;
use validator::ValidationErrors;

pub mod alert;
pub mod reminder;
pub mod session;
pub mod task;
pub mod user;

#[cfg(test)]
pub mod test_util;

#[derive(Error, Debug)]
pub enum Error {
    #[error("input was invalid: {0}")]
    Invalid(ValidationErrors),
    #[error("there is no active session")]
    NotLoggedIn,
    #[error("the session is no longer authorized")]
    Unauthorized,
    #[error("requested data does not exist")]
    DoesNotExist,
    #[error("failed to {action} due to a communication failure: {cause}")]
    RequestFailure {
        action: String,
        #[source]
        cause: anyhow::Error,
    },
}

impl From<ValidationErrors> for Error {
    fn from(value: ValidationErrors) -> Self {
        Self::Invalid(value)
    }
}

/// Failure reported by a driven port talking to the task API
#[derive(Error, Debug)]
pub enum DrivenPortError {
    #[error("the API rejected the session token")]
    Unauthorized,
    #[error("the requested data does not exist")]
    DoesNotExist,
    #[error("a communication failure occurred: {0}")]
    CommsFailure(#[from] anyhow::Error),
}

impl DrivenPortError {
    /// Converts this DrivenPortError to a domain error with some extra info on the [action]
    /// being taken when communicating over the port
    fn into_error_trying_to(self, action: &str) -> Error {
        match self {
            Self::Unauthorized => Error::Unauthorized,
            Self::DoesNotExist => Error::DoesNotExist,
            Self::CommsFailure(err) => Error::RequestFailure {
                action: action.into(),
                cause: err,
            },
        }
    }
}
