//! Validation of a "forward to" field.

use derive_more::{Display, Error as StdError};
use service::domain::user::{email, Email};

use crate::{AsError, Error};

/// Validates the provided value of a "forward to" field.
///
/// Returns the addresses to forward to, in their original order.
///
/// # Errors
///
/// - If the value holds no addresses.
/// - If any address isn't a valid [`Email`].
pub fn validate(value: &email::Value) -> Result<Vec<Email>, ValidationError> {
    let addresses = value.normalize();
    if addresses.is_empty() {
        return Err(ValidationError::Required);
    }
    addresses
        .into_iter()
        .map(|a| Email::new(a.clone()).ok_or(ValidationError::InvalidEmail(a)))
        .collect()
}

/// Error of a "forward to" field validation.
///
/// Blocks saving of the host form until resolved.
#[derive(Clone, Debug, Display, Eq, PartialEq, StdError)]
pub enum ValidationError {
    /// No addresses are provided.
    #[display("at least one recipient is required")]
    Required,

    /// Provided address isn't a valid [`Email`].
    #[display("`{_0}` is not a valid email address")]
    InvalidEmail(#[error(not(source))] String),
}

impl AsError for ValidationError {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error {
            code: match self {
                Self::Required => "FORWARD_TO_REQUIRED",
                Self::InvalidEmail(_) => "FORWARD_TO_INVALID_EMAIL",
            },
            backtrace: None,
            message: self.to_string(),
        })
    }
}
