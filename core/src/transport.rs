//! Transport: the backend collaborator behind a [`SwitchDirectory`](crate::SwitchDirectory).

use serde_json::Value;

use crate::SwitchRecord;

/// Failures reported by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The backend answered with a non-success status.
    #[error("backend returned status {status}: {message}")]
    Status {
        /// HTTP-like status code.
        status: u16,
        /// Response text.
        message: String,
    },
    /// The backend could not be reached.
    #[error("network error: {message}")]
    Network {
        /// Underlying error text.
        message: String,
    },
    /// The backend answered but the body could not be decoded.
    #[error("could not decode response: {message}")]
    Decode {
        /// Underlying error text.
        message: String,
    },
}

/// Remote storage for switches.
///
/// Calls are blocking from the directory's point of view; the directory's
/// two-phase `begin_*` / `complete_*` API lets a caller drive them some other way.
pub trait Transport {
    /// Fetch one page of switches starting at `offset`. An empty page means
    /// there are no more.
    ///
    /// # Errors
    ///
    /// Any [`TransportError`]; the directory is left unchanged.
    fn list(&self, offset: usize) -> Result<Vec<SwitchRecord>, TransportError>;

    /// Create or replace the switch `name` with `condition` (wire form).
    ///
    /// # Errors
    ///
    /// Any [`TransportError`]; the switch keeps its editing state.
    fn save(&self, name: &str, condition: &Value) -> Result<(), TransportError>;

    /// Delete the switch `name`.
    ///
    /// # Errors
    ///
    /// Any [`TransportError`]; the switch is kept.
    fn delete(&self, name: &str) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn list(&self, offset: usize) -> Result<Vec<SwitchRecord>, TransportError> {
        (**self).list(offset)
    }

    fn save(&self, name: &str, condition: &Value) -> Result<(), TransportError> {
        (**self).save(name, condition)
    }

    fn delete(&self, name: &str) -> Result<(), TransportError> {
        (**self).delete(name)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn list(&self, offset: usize) -> Result<Vec<SwitchRecord>, TransportError> {
        (**self).list(offset)
    }

    fn save(&self, name: &str, condition: &Value) -> Result<(), TransportError> {
        (**self).save(name, condition)
    }

    fn delete(&self, name: &str) -> Result<(), TransportError> {
        (**self).delete(name)
    }
}
