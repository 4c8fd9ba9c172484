//! The `StringService` capability.
//!
//! The trait is the seam that decorators compose over: every decorator
//! implements `StringService` by wrapping another `StringService`. Operations
//! come in two shapes, value-producing (`uppercase`, may fail) and
//! numeric-producing (`count`, infallible).

use std::sync::Arc;

use async_trait::async_trait;

/// Errors returned by capability operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The operation requires non-empty input.
    #[error("empty string")]
    Empty,
}

/// Business operations offered by the string service.
#[async_trait]
pub trait StringService: Send + Sync {
    /// Returns the input converted to upper case.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Empty`] when `input` is empty.
    async fn uppercase(&self, input: &str) -> Result<String, ServiceError>;

    /// Returns the length of the input in bytes.
    async fn count(&self, input: &str) -> usize;
}

#[async_trait]
impl<T: StringService + ?Sized> StringService for Arc<T> {
    async fn uppercase(&self, input: &str) -> Result<String, ServiceError> {
        (**self).uppercase(input).await
    }

    async fn count(&self, input: &str) -> usize {
        (**self).count(input).await
    }
}

#[async_trait]
impl<T: StringService + ?Sized> StringService for Box<T> {
    async fn uppercase(&self, input: &str) -> Result<String, ServiceError> {
        (**self).uppercase(input).await
    }

    async fn count(&self, input: &str) -> usize {
        (**self).count(input).await
    }
}

/// Undecorated implementation of [`StringService`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicStringService;

#[async_trait]
impl StringService for BasicStringService {
    async fn uppercase(&self, input: &str) -> Result<String, ServiceError> {
        if input.is_empty() {
            return Err(ServiceError::Empty);
        }
        Ok(input.to_uppercase())
    }

    async fn count(&self, input: &str) -> usize {
        input.len()
    }
}
