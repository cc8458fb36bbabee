//! [`Error`]-related definitions.

use std::fmt;

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use derive_more::Error as StdError;
use itertools::Itertools as _;
use serde::Serialize;
use service::{
    command::{
        advance_order_status, checkout, confirm_payment, create_menu_item,
        create_order, delete_menu_item, set_menu_item_availability,
        set_order_status, update_menu_item,
    },
    infra::{database, payment},
};
use tracerr::{Trace, Traced};

/// REST API [`Error`].
#[derive(Clone, Debug, StdError)]
pub struct Error {
    /// [`Error`] code.
    pub code: Code,

    /// [`http::StatusCode`] of this [`Error`].
    pub status_code: http::StatusCode,

    /// Backtrace of this [`Error`].
    #[error(not(backtrace))]
    pub backtrace: Option<Trace>,

    /// [`Error`] message.
    pub message: String,
}

impl Error {
    /// Creates a new [`Error`] representing an internal server error.
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self {
            code: "INTERNAL_SERVER_ERROR",
            status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            backtrace: None,
        }
    }

    /// Creates a new [`Error`] representing a user-correctable request
    /// validation failure.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            code: "VALIDATION",
            status_code: http::StatusCode::BAD_REQUEST,
            message: message.into(),
            backtrace: None,
        }
    }

    /// Creates a new [`Error`] representing a missing entity.
    #[must_use]
    pub fn not_found(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            status_code: http::StatusCode::NOT_FOUND,
            message: message.into(),
            backtrace: None,
        }
    }

    /// Creates a new [`Error`] representing a missing operator-provided
    /// credential.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self {
            code: "CONFIGURATION",
            status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            backtrace: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            code,
            status_code: _,
            backtrace,
            message,
        } = self;

        write!(
            f,
            "[{code}]: {message}{}",
            backtrace
                .iter()
                .format_with("\n", |trace, f| f(&format_args!("{trace}"))),
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        /// Body of an [`Error`] response.
        #[derive(Serialize)]
        struct Body<'a> {
            /// Human-readable description of the [`Error`].
            error: &'a str,

            /// Machine-readable [`Code`] of the [`Error`].
            code: Code,
        }

        let body = Json(Body {
            error: &self.message,
            code: self.code,
        });
        (self.status_code, body).into_response()
    }
}

/// [`Error`] code.
pub type Code = &'static str;

/// Helper trait for converting types into [`Error`]s.
pub trait AsError {
    /// Tries to convert the type into an [`Error`].
    ///
    /// [`None`] is returned if the type cannot be converted into an [`Error`].
    fn try_as_error(&self) -> Option<Error>;

    /// Converts the type into an [`Error`].
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error()
            .unwrap_or_else(|| Error::internal(&self))
    }

    /// Converts the type into an [`Error`] by consuming it.
    fn into_error(self) -> Error
    where
        Self: fmt::Display + Sized,
    {
        self.as_error()
    }
}

impl<E: AsError> AsError for Traced<E> {
    fn try_as_error(&self) -> Option<Error> {
        let mut error = self.as_ref().try_as_error()?;
        error.backtrace = Some(self.trace().clone());
        Some(error)
    }
}

/// Logs the provided error with its original cause, then converts it into
/// an [`Error`] response.
///
/// The response [`Error`] carries only the public-facing message, so the
/// underlying cause survives in the logs alone.
pub fn log<E>(err: Traced<E>) -> Error
where
    E: AsError + fmt::Display,
{
    let error = err.as_error();
    if error.status_code.is_server_error() {
        tracing::error!("{err}");
    } else {
        tracing::warn!("{err}");
    }
    error
}

impl AsError for database::Error {
    fn try_as_error(&self) -> Option<Error> {
        // Internal detail never leaks to the caller.
        Some(Error {
            code: "PERSISTENCE",
            status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
            message: "Failed to access the data store".to_owned(),
            backtrace: None,
        })
    }
}

impl AsError for payment::Error {
    fn try_as_error(&self) -> Option<Error> {
        use payment::Error as E;

        Some(match self {
            E::Http(_) | E::BadStatus { .. } => Error {
                code: "PAYMENT_PROVIDER",
                status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
                message: "Payment provider request failed".to_owned(),
                backtrace: None,
            },
            E::MalformedSignature
            | E::StaleSignature
            | E::SignatureMismatch
            | E::MalformedPayload(_) => Error {
                code: "INVALID_SIGNATURE",
                status_code: http::StatusCode::BAD_REQUEST,
                message: "Invalid webhook signature".to_owned(),
                backtrace: None,
            },
        })
    }
}

impl AsError for create_order::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use create_order::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::NoItems => Some(Error::validation(self.to_string())),
        }
    }
}

impl AsError for checkout::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use checkout::ExecutionError as E;

        match self {
            E::CreateOrder(e) => e.try_as_error(),
            E::Db(e) => e.try_as_error(),
            E::PaymentNotConfigured => {
                Some(Error::configuration(self.to_string()))
            }
            E::Payment(e) => e.try_as_error(),
        }
    }
}

impl AsError for confirm_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use confirm_payment::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::PaymentNotConfigured => {
                Some(Error::configuration(self.to_string()))
            }
            E::Payment(e) => e.try_as_error(),
            E::NoOrderReference => Some(Error::validation(self.to_string())),
            E::OrderNotExists(_) => {
                Some(Error::not_found("ORDER_NOT_FOUND", self.to_string()))
            }
        }
    }
}

impl AsError for advance_order_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use advance_order_status::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::OrderNotExists(_) => {
                Some(Error::not_found("ORDER_NOT_FOUND", self.to_string()))
            }
            E::InvalidTransition(_) => Some(Error {
                code: "INVALID_TRANSITION",
                status_code: http::StatusCode::BAD_REQUEST,
                message: self.to_string(),
                backtrace: None,
            }),
        }
    }
}

impl AsError for set_order_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use set_order_status::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::OrderNotExists(_) => {
                Some(Error::not_found("ORDER_NOT_FOUND", self.to_string()))
            }
        }
    }
}

impl AsError for create_menu_item::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use create_menu_item::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
        }
    }
}

impl AsError for update_menu_item::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use update_menu_item::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::MenuItemNotExists(_) => Some(Error::not_found(
                "MENU_ITEM_NOT_FOUND",
                self.to_string(),
            )),
        }
    }
}

impl AsError for delete_menu_item::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use delete_menu_item::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::MenuItemNotExists(_) => Some(Error::not_found(
                "MENU_ITEM_NOT_FOUND",
                self.to_string(),
            )),
        }
    }
}

impl AsError for set_menu_item_availability::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use set_menu_item_availability::ExecutionError as E;

        match self {
            E::Db(e) => e.try_as_error(),
            E::MenuItemNotExists(_) => Some(Error::not_found(
                "MENU_ITEM_NOT_FOUND",
                self.to_string(),
            )),
        }
    }
}
