//! Application state shared across handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::KeyValueCache;
use crate::db::Store;
use crate::services::auth::{AuthService, AuthSettings, TokenIssuer};
use crate::services::email::Mailer;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the entity stores, the authentication service, and the media directory.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Store,
    auth: AuthService,
    media_dir: PathBuf,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `store` - Entity stores (`PostgreSQL` or in-memory)
    /// * `cache` - Ephemeral cache for pending registrations and codes
    /// * `mailer` - Delivery for one-time codes
    /// * `tokens` - Access token issuer/verifier
    /// * `settings` - TTLs for registrations, codes, and tokens
    /// * `media_dir` - Where uploaded files are written
    #[must_use]
    pub fn new(
        store: Store,
        cache: Arc<dyn KeyValueCache>,
        mailer: Arc<dyn Mailer>,
        tokens: TokenIssuer,
        settings: AuthSettings,
        media_dir: PathBuf,
    ) -> Self {
        let auth = AuthService::new(store.users.clone(), cache, mailer, tokens, settings);

        Self {
            inner: Arc::new(AppStateInner {
                store,
                auth,
                media_dir,
            }),
        }
    }

    /// Get a reference to the entity stores.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    /// Get a reference to the authentication service.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// Get a reference to the token issuer.
    #[must_use]
    pub fn tokens(&self) -> &TokenIssuer {
        self.inner.auth.tokens()
    }

    /// Directory uploaded files are stored in and served from.
    #[must_use]
    pub fn media_dir(&self) -> &Path {
        &self.inner.media_dir
    }
}
