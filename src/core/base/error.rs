use thiserror::Error;

/// `DispatchError` reports misuse of the dispatcher itself, never a collaborator fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// An endpoint with the same name has been registered before.
    #[error("endpoint `{0}` is already registered")]
    DuplicateEndpoint(String),
    /// The caller invoked a name that was never registered.
    #[error("endpoint `{0}` is not registered")]
    UnknownEndpoint(String),
    #[error("invalid endpoint `{name}`: {reason}")]
    InvalidEndpoint { name: String, reason: String },
}

pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            DispatchError::DuplicateEndpoint("email".into()).to_string(),
            "endpoint `email` is already registered"
        );
        assert_eq!(
            DispatchError::UnknownEndpoint("sms".into()).to_string(),
            "endpoint `sms` is not registered"
        );
        let err = DispatchError::InvalidEndpoint {
            name: "pay".into(),
            reason: "zero failure_threshold".into(),
        };
        assert_eq!(err.to_string(), "invalid endpoint `pay`: zero failure_threshold");
    }

    #[test]
    fn into_anyhow() {
        let err: crate::Error = DispatchError::UnknownEndpoint("sms".into()).into();
        assert_eq!(
            err.downcast_ref::<DispatchError>(),
            Some(&DispatchError::UnknownEndpoint("sms".into()))
        );
    }
}
