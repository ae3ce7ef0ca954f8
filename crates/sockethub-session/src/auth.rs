//! Authentication hook for resolving who the session speaks for.
//!
//! Socket-Hub doesn't implement authentication itself. Login forms,
//! token storage and the auth service live elsewhere. The session only
//! needs the result: an [`Identity`].
//!
//! The [`IdentityProvider`] trait is the seam between the two. Implement
//! it over your auth service (or a fixed identity in development, or a
//! mock in tests) and the client resolves an identity through it before
//! starting a session.

use crate::{Identity, SessionError};

/// What the user typed into the login form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login name.
    pub username: String,
    /// Secret.
    pub password: String,
}

impl Credentials {
    /// Creates credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Exchanges credentials for a token, and a token for an [`Identity`].
///
/// # Example
///
/// ```rust
/// use sockethub_session::{Credentials, Identity, IdentityProvider, SessionError};
///
/// /// Accepts any password and uses the username as the user id.
/// /// Only for development.
/// struct DevProvider;
///
/// impl IdentityProvider for DevProvider {
///     async fn login(&self, credentials: &Credentials) -> Result<String, SessionError> {
///         Ok(format!("token-{}", credentials.username))
///     }
///
///     async fn current_user(&self, token: &str) -> Result<Identity, SessionError> {
///         let user = token.strip_prefix("token-").ok_or_else(|| {
///             SessionError::AuthFailed("unknown token".into())
///         })?;
///         Identity::new(user, user)
///     }
/// }
/// ```
pub trait IdentityProvider: Send + Sync + 'static {
    /// Validates credentials and returns a session token.
    ///
    /// # Errors
    /// `Err(SessionError::AuthFailed)` if the credentials are rejected.
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<String, SessionError>> + Send;

    /// Resolves a token to the identity it belongs to.
    ///
    /// # Errors
    /// `Err(SessionError::AuthFailed)` if the token is invalid or expired.
    fn current_user(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Identity, SessionError>> + Send;
}
