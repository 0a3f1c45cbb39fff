//! Login state and the context handed to every API handle.
//!
//! A [`Session`] owns the transport and the token store. Logging in yields a
//! [`SessionContext`], a plain value carrying the client and the resolved
//! [`User`]; role-scoped API handles are borrowed from it.

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::RwLock;

use crate::client::{AccessToken, Client, UNAUTHORIZED_ANONYMOUS};
use crate::config::Config;
use crate::endpoints::ApiEndpoint;
use crate::entities::user::{LoginRequest, LoginResponse};
use crate::entities::{RegistrationResponse, User, UserRegistration};
use crate::error::{Error, Result};
use crate::role::{Capability, Role};

/// Client-side persistence for the session credential.
pub trait TokenStore: Send + Sync + fmt::Debug {
    fn load(&self) -> Result<Option<AccessToken>>;
    fn save(&self, token: &AccessToken) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Keeps the credential for the lifetime of the process only.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<AccessToken>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: AccessToken) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<AccessToken>> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, token: &AccessToken) -> Result<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Persists the credential as a single-line file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<AccessToken>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let secret = contents.trim();
                Ok((!secret.is_empty()).then(|| AccessToken::new(secret.to_string())))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(e)),
        }
    }

    fn save(&self, token: &AccessToken) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(Error::Storage)?;
        }
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path).map_err(Error::Storage)?;
        // `mode` only applies to newly created files.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .map_err(Error::Storage)?;
        }
        file.write_all(token.secret().as_bytes()).map_err(Error::Storage)
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(e)),
        }
    }
}

/// Entry point: authenticates users and tracks who is logged in.
///
/// Clones share the credential slot, the token store and the current user.
#[derive(Clone, Debug)]
pub struct Session {
    client: Client,
    store: Arc<dyn TokenStore>,
    user: Arc<RwLock<Option<User>>>,
}

impl Session {
    /// A session whose credential lives only in memory.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_store(config, MemoryTokenStore::new())
    }

    pub fn with_store(config: Config, store: impl TokenStore + 'static) -> Result<Self> {
        Ok(Self {
            client: Client::new(config)?,
            store: Arc::new(store),
            user: Arc::new(RwLock::new(None)),
        })
    }

    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn current_user(&self) -> Option<User> {
        self.user.read().await.clone()
    }

    /// Exchanges credentials for a session.
    ///
    /// Any rejection by the backend is reported as `Error::Authentication`
    /// carrying the backend's message. A previous session is fully replaced.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionContext> {
        let request = LoginRequest { username, password };
        let response: LoginResponse = self
            .client
            .post_anonymous(ApiEndpoint::Login, &request)
            .await
            .map_err(login_failure)?;

        let token = AccessToken::new(response.access_token);
        self.client.set_credential(Some(token.clone())).await;
        if let Err(e) = self.store.save(&token) {
            warn!(error = %e, "could not persist session credential");
        }
        *self.user.write().await = Some(response.user.clone());

        info!(username = %response.user.username, role = %response.user.role, "logged in");
        Ok(SessionContext::new(self.client.bound_to(token), response.user))
    }

    /// Ends the session. Handles still held fail their next request locally,
    /// as do handles from a login that a later one replaced.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        self.client.set_credential(None).await;
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "could not clear stored credential");
        }
        if let Some(user) = self.user.write().await.take() {
            info!(username = %user.username, "logged out");
        }
    }

    /// Restores a session from the token store.
    ///
    /// Any failure discards the stored credential and yields `None`.
    #[instrument(skip(self))]
    pub async fn resolve(&self) -> Option<SessionContext> {
        let token = match self.store.load() {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("no stored credential");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "could not read stored credential");
                return None;
            }
        };

        self.client.set_credential(Some(token.clone())).await;
        match self.client.get::<User>(ApiEndpoint::Me).await {
            Ok(user) => {
                debug!(username = %user.username, "restored session");
                *self.user.write().await = Some(user.clone());
                Some(SessionContext::new(self.client.bound_to(token), user))
            }
            Err(e) => {
                warn!(error = %e, "stored credential rejected, clearing it");
                self.logout().await;
                None
            }
        }
    }

    /// Creates a login account.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: &UserRegistration) -> Result<RegistrationResponse> {
        if registration.username.trim().is_empty() {
            return Err(Error::validation("username", "this field is required"));
        }
        if !registration.email.contains('@') {
            return Err(Error::validation("email", "not an email address"));
        }
        if registration.password.is_empty() {
            return Err(Error::validation("password", "this field is required"));
        }
        if registration.role == Role::Employee && registration.employee_id.is_none() {
            return Err(Error::validation(
                "employee_id",
                "employee accounts must be linked to an employee record",
            ));
        }

        self.client
            .post_anonymous(ApiEndpoint::Register, registration)
            .await
    }
}

fn login_failure(error: Error) -> Error {
    match error {
        Error::Authentication { message }
        | Error::Authorization { message, .. }
        | Error::Validation { message, .. } => Error::Authentication {
            message: if message.trim().is_empty() {
                UNAUTHORIZED_ANONYMOUS.to_string()
            } else {
                message
            },
        },
        other => other,
    }
}

/// An authenticated user together with the transport their requests use.
#[derive(Clone, Debug)]
pub struct SessionContext {
    client: Client,
    user: User,
}

impl SessionContext {
    pub(crate) fn new(client: Client, user: User) -> Self {
        Self { client, user }
    }

    #[must_use]
    pub fn user(&self) -> &User {
        &self.user
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.user.role
    }

    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The employee record this user is linked to, if any.
    #[must_use]
    pub fn employee_id(&self) -> Option<&str> {
        self.user.employee_id.as_deref()
    }

    pub(crate) fn require(&self, capability: Capability) -> Result<()> {
        self.role().require(capability)
    }

    /// The linked employee id, or an authorization error naming `operation`.
    pub(crate) fn require_employee_link(&self, operation: &str) -> Result<&str> {
        self.employee_id().ok_or_else(|| Error::Authorization {
            role: Some(self.role()),
            operation: operation.to_string(),
            message: "user is not linked to an employee record".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("token"));
        assert!(store.load().unwrap().is_none());

        store.save(&AccessToken::new("abc".into())).unwrap();
        assert_eq!(store.load().unwrap().unwrap().secret(), "abc");

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn file_store_is_private_to_the_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "old").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        let store = FileTokenStore::new(&path);

        store.save(&AccessToken::new("fresh".into())).unwrap();
        assert_eq!(store.load().unwrap().unwrap().secret(), "fresh");
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        let other = dir.path().join("new-token");
        FileTokenStore::new(&other).save(&AccessToken::new("abc".into())).unwrap();
        let mode = std::fs::metadata(&other).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn login_rejections_become_authentication_errors() {
        let mapped = login_failure(Error::validation("username", "field required"));
        assert!(matches!(mapped, Error::Authentication { message } if message == "field required"));
    }

    #[test]
    fn unexplained_login_rejections_get_the_generic_message() {
        let mapped = login_failure(Error::Validation { field: None, message: String::new() });
        assert!(matches!(mapped, Error::Authentication { message } if message == "Login failed"));
    }
}
