//! Application context: the single owner of dashboard state.
//!
//! DESIGN
//! ======
//! `AppContext` is constructed explicitly and passed to whatever needs it;
//! there is no process-wide store. Every mutating method applies the change
//! to in-memory state first and then mirrors the touched slice to storage,
//! so the in-memory copy is always authoritative and storage trails it by at
//! most one failed write.
//!
//! Auth state sits behind `SharedAuth` because the expiry watcher task
//! updates it from the background.

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;

use std::sync::{Arc, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::auth::oauth::{self, CallbackParams, OAuthError, OAuthProvider, OAuthRequest};
use crate::auth::{AuthState, AuthTransition, Clock, ExpiryWatcher, SharedAuth, TokenPair};
use crate::config::Config;
use crate::net::api::{ApiClient, ApiError, LoginRequest, OAuthExchangeRequest, TokenResponse};
use crate::persist::bridge::{PersistError, load_slice, load_workspace, save_slice, save_workspace};
use crate::persist::storage::{KeyValueStore, TOKEN_KEY};
use crate::prefs::Prefs;
use crate::state::{Breakpoint, Layouts, LayoutRect, PanelCode, PanelId, PanelStatePatch, ScreenId, Workspace, WorkspaceError};
use crate::util::notice::NoticeBoard;
use crate::util::validation::can_submit_login;

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error(transparent)]
    OAuth(#[from] OAuthError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("server issued unusable tokens")]
    TokensRejected,
}

pub struct AppContext<S: KeyValueStore + ?Sized> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    workspace: Workspace,
    auth: SharedAuth,
    prefs: Prefs,
    notices: NoticeBoard,
}

impl<S: KeyValueStore + ?Sized> AppContext<S> {
    /// Load every slice from `store`. Missing or corrupt slices start empty.
    pub fn load(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        let workspace = load_workspace(store.as_ref());
        let prefs = Prefs::load(store.as_ref());

        let stored: Option<TokenPair> = load_slice(store.as_ref(), TOKEN_KEY);
        let had_tokens = stored.is_some();
        let auth = AuthState::restore(stored, clock.now_unix());
        if had_tokens && !auth.is_authenticated() {
            if let Err(e) = store.remove_item(TOKEN_KEY) {
                warn!(error = %e, "failed to clear unusable stored token");
            }
        }

        info!(
            screens = workspace.list().len(),
            panels = workspace.panels().len(),
            authenticated = auth.is_authenticated(),
            "app context loaded"
        );

        Self {
            store,
            clock,
            workspace,
            auth: Arc::new(std::sync::Mutex::new(auth)),
            prefs,
            notices: NoticeBoard::new(),
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    #[must_use]
    pub fn prefs(&self) -> &Prefs {
        &self.prefs
    }

    pub fn notices(&mut self) -> &mut NoticeBoard {
        &mut self.notices
    }

    #[must_use]
    pub fn now_unix(&self) -> i64 {
        self.clock.now_unix()
    }

    // -------------------------------------------------------------------------
    // Workspace
    // -------------------------------------------------------------------------

    fn mutate<T, F>(&mut self, op: F) -> Result<T, ContextError>
    where
        F: FnOnce(&mut Workspace) -> Result<T, WorkspaceError>,
    {
        let out = op(&mut self.workspace)?;
        save_workspace(self.store.as_ref(), &self.workspace)?;
        Ok(out)
    }

    /// # Errors
    ///
    /// Returns [`ContextError::Persist`] if the new state cannot be saved.
    pub fn add_screen(&mut self) -> Result<ScreenId, ContextError> {
        self.mutate(|ws| Ok(ws.add_screen()))
    }

    /// # Errors
    ///
    /// Returns [`WorkspaceError::InvalidIndex`] or a persistence error.
    pub fn remove_screen(&mut self, index: usize) -> Result<ScreenId, ContextError> {
        self.mutate(|ws| ws.remove_screen(index))
    }

    /// # Errors
    ///
    /// Returns [`WorkspaceError::InvalidIndex`] or a persistence error.
    pub fn move_screen(&mut self, current: usize, target: usize) -> Result<(), ContextError> {
        self.mutate(|ws| ws.move_screen(current, target))
    }

    /// # Errors
    ///
    /// Returns [`WorkspaceError::InvalidIndex`] or a persistence error.
    pub fn copy_screen(&mut self, index: usize) -> Result<ScreenId, ContextError> {
        self.mutate(|ws| ws.copy_screen(index))
    }

    /// # Errors
    ///
    /// Returns a workspace or persistence error.
    pub fn add_panel(
        &mut self,
        screen_id: &ScreenId,
        code: PanelCode,
        layout_item: Option<LayoutRect>,
    ) -> Result<PanelId, ContextError> {
        self.mutate(|ws| ws.add_panel(screen_id, code, layout_item))
    }

    /// # Errors
    ///
    /// Returns a workspace or persistence error.
    pub fn remove_panel(&mut self, screen_id: &ScreenId, panel_id: &PanelId) -> Result<(), ContextError> {
        self.mutate(|ws| ws.remove_panel(screen_id, panel_id))
    }

    /// # Errors
    ///
    /// Returns a workspace or persistence error.
    pub fn update_panel_state(&mut self, panel_id: &PanelId, patch: PanelStatePatch) -> Result<(), ContextError> {
        self.mutate(|ws| ws.update_panel_state(panel_id, patch))
    }

    /// # Errors
    ///
    /// Returns a workspace or persistence error.
    pub fn update_layouts(&mut self, screen_id: &ScreenId, layouts: Layouts) -> Result<(), ContextError> {
        self.mutate(|ws| ws.update_layouts(screen_id, layouts))
    }

    /// Track the viewport tier. Session-only, not persisted.
    pub fn set_viewport_width(&mut self, width_px: u32) {
        self.workspace.set_breakpoint(Breakpoint::for_width(width_px));
    }

    // -------------------------------------------------------------------------
    // Auth
    // -------------------------------------------------------------------------

    fn auth_state(&self) -> MutexGuard<'_, AuthState> {
        self.auth.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current session.
    #[must_use]
    pub fn auth(&self) -> AuthState {
        self.auth_state().clone()
    }

    #[must_use]
    pub fn shared_auth(&self) -> SharedAuth {
        Arc::clone(&self.auth)
    }

    /// Adopt freshly issued tokens.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::Persist`] if the token cannot be stored.
    pub fn login(&mut self, tokens: TokenPair) -> Result<AuthTransition, ContextError> {
        let now = self.clock.now_unix();
        let transition = self.auth_state().login(tokens.clone(), now);
        if transition == AuthTransition::LoggedIn {
            save_slice(self.store.as_ref(), TOKEN_KEY, &tokens)?;
        } else {
            self.store.remove_item(TOKEN_KEY).map_err(PersistError::from)?;
        }
        Ok(transition)
    }

    /// # Errors
    ///
    /// Returns [`ContextError::Persist`] if the stored token cannot be removed.
    pub fn logout(&mut self) -> Result<AuthTransition, ContextError> {
        let transition = self.auth_state().logout();
        self.store.remove_item(TOKEN_KEY).map_err(PersistError::from)?;
        Ok(transition)
    }

    /// Logout after the server confirmed account deletion; also forgets the
    /// remembered username.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::Persist`] if storage cannot be updated.
    pub fn account_deleted(&mut self) -> Result<AuthTransition, ContextError> {
        let transition = self.logout()?;
        self.update_prefs(|prefs| {
            prefs.remember_me = false;
            prefs.remembered_username = None;
        })?;
        Ok(transition)
    }

    /// Run one expiry check now.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::Persist`] if the expired token cannot be removed.
    pub fn check_expiry(&mut self) -> Result<AuthTransition, ContextError> {
        let now = self.clock.now_unix();
        let transition = self.auth_state().check_expiry(now);
        if transition == AuthTransition::Expired {
            self.store.remove_item(TOKEN_KEY).map_err(PersistError::from)?;
        }
        Ok(transition)
    }

    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.auth_state().remaining(self.clock.now_unix())
    }

    /// Log in with username and password.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::InvalidInput`] before any request when the
    /// fields fail validation, otherwise an API or persistence error.
    pub async fn sign_in(
        &mut self,
        api: &ApiClient,
        login_path: &str,
        username: &str,
        password: &str,
    ) -> Result<AuthTransition, ContextError> {
        if !can_submit_login(username, password) {
            return Err(ContextError::InvalidInput("username and password must be 6-30 characters"));
        }
        let result = api
            .post::<_, TokenResponse>(login_path, &LoginRequest { username, password }, None)
            .await;
        let tokens = match result {
            Ok(tokens) => tokens,
            Err(e) => {
                self.notices.error(e.to_string(), Instant::now());
                return Err(e.into());
            }
        };

        let transition = self.login(tokens)?;
        if transition != AuthTransition::LoggedIn {
            self.notices.error("login failed", Instant::now());
            return Err(ContextError::TokensRejected);
        }
        if self.prefs.remember_me {
            let username = username.to_owned();
            self.update_prefs(|prefs| prefs.remembered_username = Some(username))?;
        }
        self.notices.success("logged in", Instant::now());
        Ok(transition)
    }

    /// Start an OAuth login using the provider settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::NotConfigured`] when the provider has no client id.
    pub fn begin_oauth(&self, config: &Config, provider: OAuthProvider) -> Result<OAuthRequest, ContextError> {
        let client = config
            .oauth_client(provider)
            .ok_or(OAuthError::NotConfigured(provider.as_str()))?;
        Ok(oauth::begin(self.store.as_ref(), provider, client)?)
    }

    /// Validate an OAuth callback, exchange its code, and log in.
    ///
    /// # Errors
    ///
    /// Returns an OAuth, API, or persistence error.
    pub async fn finish_oauth(
        &mut self,
        api: &ApiClient,
        exchange_path: &str,
        provider: OAuthProvider,
        params: CallbackParams,
    ) -> Result<AuthTransition, ContextError> {
        let code = oauth::complete(self.store.as_ref(), provider, params)?;
        let body = OAuthExchangeRequest { provider: provider.as_str(), code: &code.code, state: &code.state };
        let tokens: TokenResponse = api.post(exchange_path, &body, None).await?;
        let transition = self.login(tokens)?;
        if transition != AuthTransition::LoggedIn {
            return Err(ContextError::TokensRejected);
        }
        Ok(transition)
    }

    // -------------------------------------------------------------------------
    // Preferences
    // -------------------------------------------------------------------------

    /// Apply `edit` to the preferences and persist them.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::Persist`] if the preferences cannot be saved.
    pub fn update_prefs<F>(&mut self, edit: F) -> Result<(), ContextError>
    where
        F: FnOnce(&mut Prefs),
    {
        edit(&mut self.prefs);
        self.prefs.save(self.store.as_ref())?;
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized + 'static> AppContext<S> {
    /// Start the background expiry watcher for this context's session,
    /// judging expiry against the context's own clock.
    /// The watcher stops when the returned handle is dropped.
    #[must_use]
    pub fn spawn_expiry_watcher(&self, period: Duration) -> ExpiryWatcher {
        ExpiryWatcher::spawn(self.shared_auth(), Arc::clone(&self.store), Arc::clone(&self.clock), period)
    }
}
