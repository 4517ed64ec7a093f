use crate::claims::session_user_from_token;
use crate::error::IdentityError;
use crate::{AuthTokens, IdentityProvider, SignUpOutcome, SignUpRequest};
use async_trait::async_trait;
use core_types::SessionUser;
use events::{AuthEvent, Notification};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, broadcast};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// What survives between runs: the user and the tokens to refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub user: SessionUser,
    pub tokens: AuthTokens,
}

/// Persistence for the current session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<Option<StoredSession>, IdentityError>;
    async fn save(&self, session: &StoredSession) -> Result<(), IdentityError>;
    async fn clear(&self) -> Result<(), IdentityError>;
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<StoredSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<StoredSession>, IdentityError> {
        Ok(self.session.lock().await.clone())
    }

    async fn save(&self, session: &StoredSession) -> Result<(), IdentityError> {
        *self.session.lock().await = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), IdentityError> {
        *self.session.lock().await = None;
        Ok(())
    }
}

/// Keeps the session as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<StoredSession>, IdentityError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(IdentityError::Storage(e.to_string())),
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| IdentityError::Storage(e.to_string()))
    }

    async fn save(&self, session: &StoredSession) -> Result<(), IdentityError> {
        let raw =
            serde_json::to_vec_pretty(session).map_err(|e| IdentityError::Storage(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| IdentityError::Storage(e.to_string()))?;
        }
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| IdentityError::Storage(e.to_string()))
    }

    async fn clear(&self) -> Result<(), IdentityError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(IdentityError::Storage(e.to_string())),
        }
    }
}

#[derive(Debug)]
struct AuthState {
    session: Option<StoredSession>,
    loading: bool,
}

/// The client-side view of who is signed in.
///
/// Starts out `loading` until [`AuthContext::restore`] has run. Every
/// sign-in, registration and sign-out is announced on the event channel
/// returned by [`AuthContext::subscribe`].
pub struct AuthContext<P: IdentityProvider + ?Sized> {
    provider: Arc<P>,
    store: Arc<dyn SessionStore>,
    state: RwLock<AuthState>,
    events: broadcast::Sender<AuthEvent>,
}

impl<P: IdentityProvider + ?Sized> AuthContext<P> {
    pub fn new(provider: Arc<P>, store: Arc<dyn SessionStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            provider,
            store,
            state: RwLock::new(AuthState {
                session: None,
                loading: true,
            }),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: AuthEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Recovers a stored session by refreshing its tokens.
    ///
    /// Any failure leaves the context signed out, silently.
    pub async fn restore(&self) -> Option<SessionUser> {
        let restored = self.refresh_stored().await;

        let mut state = self.state.write().await;
        state.loading = false;
        match restored {
            Ok(Some(session)) => {
                let user = session.user.clone();
                state.session = Some(session);
                drop(state);
                self.emit(AuthEvent::SignedIn(user.clone()));
                Some(user)
            }
            Ok(None) => {
                state.session = None;
                None
            }
            Err(e) => {
                state.session = None;
                drop(state);
                tracing::debug!(error = %e, "Stored session could not be restored");
                if let Err(e) = self.store.clear().await {
                    tracing::warn!(error = %e, "Failed to clear stored session");
                }
                None
            }
        }
    }

    async fn refresh_stored(&self) -> Result<Option<StoredSession>, IdentityError> {
        let Some(stored) = self.store.load().await? else {
            return Ok(None);
        };
        let tokens = self
            .provider
            .refresh_session(&stored.tokens.refresh_token)
            .await?;
        let session = StoredSession {
            user: session_user_from_token(&tokens.id_token)?,
            tokens,
        };
        self.store.save(&session).await?;
        Ok(Some(session))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionUser, IdentityError> {
        match self.sign_in(email, password).await {
            Ok(user) => {
                self.emit(AuthEvent::SignedIn(user.clone()));
                self.emit(AuthEvent::Notification(Notification::success(
                    "Inicio de sesión exitoso",
                )));
                Ok(user)
            }
            Err(e) => {
                self.emit(AuthEvent::Notification(Notification::error(format!(
                    "Error en inicio de sesión: {}",
                    e.user_message()
                ))));
                Err(e)
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, IdentityError> {
        let tokens = self.provider.authenticate(email, password).await?;
        let session = StoredSession {
            user: session_user_from_token(&tokens.id_token)?,
            tokens,
        };

        if let Err(e) = self.store.save(&session).await {
            tracing::warn!(error = %e, "Failed to persist session");
        }
        let user = session.user.clone();
        let mut state = self.state.write().await;
        state.session = Some(session);
        state.loading = false;
        Ok(user)
    }

    /// Creates an account. Registration does not sign the new user in.
    pub async fn register(&self, request: &SignUpRequest) -> Result<SignUpOutcome, IdentityError> {
        match self.provider.sign_up(request).await {
            Ok(outcome) => {
                self.emit(AuthEvent::Notification(Notification::success(
                    "Usuario registrado exitosamente",
                )));
                Ok(outcome)
            }
            Err(e) => {
                self.emit(AuthEvent::Notification(Notification::error(format!(
                    "Error en registro: {}",
                    e.user_message()
                ))));
                Err(e)
            }
        }
    }

    /// Signs out at the provider when possible and forgets the local session.
    pub async fn logout(&self) {
        let session = self.state.write().await.session.take();

        if let Some(session) = session {
            if let Err(e) = self.provider.sign_out(&session.tokens.access_token).await {
                tracing::warn!(error = %e, "Provider sign-out failed; clearing local session anyway");
            }
        }
        if let Err(e) = self.store.clear().await {
            tracing::warn!(error = %e, "Failed to clear stored session");
        }

        self.emit(AuthEvent::SignedOut);
        self.emit(AuthEvent::Notification(Notification::info("Sesión cerrada")));
    }

    pub async fn current_user(&self) -> Option<SessionUser> {
        self.state
            .read()
            .await
            .session
            .as_ref()
            .map(|s| s.user.clone())
    }

    /// The tokens of the current session, for authenticated API calls.
    pub async fn tokens(&self) -> Option<AuthTokens> {
        self.state
            .read()
            .await
            .session
            .as_ref()
            .map(|s| s.tokens.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.session.is_some()
    }

    pub async fn loading(&self) -> bool {
        self.state.read().await.loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::tests::token_with;
    use core_types::UserRole;
    use events::NotificationKind;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// An in-memory provider with one known account.
    struct MockProvider {
        accounts: std::sync::Mutex<HashMap<String, String>>,
        sign_outs: AtomicUsize,
    }

    impl MockProvider {
        fn new() -> Self {
            let accounts = HashMap::from([(
                "ana@bovitrack.co".to_string(),
                "secreto123".to_string(),
            )]);
            Self {
                accounts: std::sync::Mutex::new(accounts),
                sign_outs: AtomicUsize::new(0),
            }
        }

        fn tokens_for(email: &str) -> AuthTokens {
            AuthTokens {
                id_token: token_with(serde_json::json!({
                    "sub": "sub-ana",
                    "email": email,
                    "name": "Ana Gómez",
                    "custom:role": "producer"
                })),
                access_token: "access".to_string(),
                refresh_token: "refresh-ok".to_string(),
                expires_in: 3600,
            }
        }
    }

    #[async_trait]
    impl IdentityProvider for MockProvider {
        async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, IdentityError> {
            let mut accounts = self.accounts.lock().unwrap();
            if accounts.contains_key(&request.email) {
                return Err(IdentityError::UserExists("User already exists".to_string()));
            }
            accounts.insert(request.email.clone(), request.password.clone());
            Ok(SignUpOutcome {
                user_sub: "sub-new".to_string(),
                user_confirmed: false,
            })
        }

        async fn authenticate(&self, email: &str, password: &str) -> Result<AuthTokens, IdentityError> {
            let accounts = self.accounts.lock().unwrap();
            match accounts.get(email) {
                Some(stored) if stored == password => Ok(Self::tokens_for(email)),
                _ => Err(IdentityError::NotAuthorized(
                    "Incorrect username or password.".to_string(),
                )),
            }
        }

        async fn refresh_session(&self, refresh_token: &str) -> Result<AuthTokens, IdentityError> {
            if refresh_token == "refresh-ok" {
                Ok(Self::tokens_for("ana@bovitrack.co"))
            } else {
                Err(IdentityError::NotAuthorized("Refresh Token has expired".to_string()))
            }
        }

        async fn sign_out(&self, _access_token: &str) -> Result<(), IdentityError> {
            self.sign_outs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn context() -> (AuthContext<MockProvider>, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::new());
        let ctx = AuthContext::new(Arc::new(MockProvider::new()), store.clone());
        (ctx, store)
    }

    fn next_notification(rx: &mut broadcast::Receiver<AuthEvent>) -> Notification {
        loop {
            match rx.try_recv().expect("an event") {
                AuthEvent::Notification(n) => return n,
                _ => continue,
            }
        }
    }

    #[tokio::test]
    async fn login_sets_user_and_notifies() {
        let (ctx, store) = context();
        let mut rx = ctx.subscribe();

        let user = ctx.login("ana@bovitrack.co", "secreto123").await.unwrap();
        assert_eq!(user.role, UserRole::Productor);
        assert!(ctx.is_authenticated().await);
        assert_eq!(ctx.current_user().await, Some(user));
        assert!(store.load().await.unwrap().is_some());

        let note = next_notification(&mut rx);
        assert_eq!(note.kind, NotificationKind::Success);
        assert_eq!(note.message, "Inicio de sesión exitoso");
    }

    #[tokio::test]
    async fn failed_login_notifies_with_provider_message() {
        let (ctx, _) = context();
        let mut rx = ctx.subscribe();

        let err = ctx.login("ana@bovitrack.co", "wrong").await.unwrap_err();
        assert!(matches!(err, IdentityError::NotAuthorized(_)));
        assert!(!ctx.is_authenticated().await);

        let note = next_notification(&mut rx);
        assert_eq!(note.kind, NotificationKind::Error);
        assert_eq!(
            note.message,
            "Error en inicio de sesión: Incorrect username or password."
        );
    }

    #[tokio::test]
    async fn register_notifies_success_and_failure() {
        let (ctx, _) = context();
        let mut rx = ctx.subscribe();
        let mut request = SignUpRequest {
            email: "vet@bovitrack.co".to_string(),
            password: "secreto123".to_string(),
            name: "Laura Pérez".to_string(),
            role: UserRole::Veterinario,
            farm_id: None,
        };

        ctx.register(&request).await.unwrap();
        assert_eq!(next_notification(&mut rx).message, "Usuario registrado exitosamente");
        // Registration alone does not sign in.
        assert!(!ctx.is_authenticated().await);

        request.email = "ana@bovitrack.co".to_string();
        assert!(ctx.register(&request).await.is_err());
        assert_eq!(
            next_notification(&mut rx).message,
            "Error en registro: User already exists"
        );
    }

    #[tokio::test]
    async fn logout_clears_everything() {
        let (ctx, store) = context();
        ctx.login("ana@bovitrack.co", "secreto123").await.unwrap();
        let mut rx = ctx.subscribe();

        ctx.logout().await;
        assert!(!ctx.is_authenticated().await);
        assert!(store.load().await.unwrap().is_none());
        assert_eq!(ctx.provider.sign_outs.load(Ordering::SeqCst), 1);

        let note = next_notification(&mut rx);
        assert_eq!(note.kind, NotificationKind::Info);
        assert_eq!(note.message, "Sesión cerrada");
    }

    #[tokio::test]
    async fn restore_recovers_a_stored_session() {
        let (ctx, store) = context();
        assert!(ctx.loading().await);
        store
            .save(&StoredSession {
                user: session_user_from_token(&MockProvider::tokens_for("ana@bovitrack.co").id_token)
                    .unwrap(),
                tokens: MockProvider::tokens_for("ana@bovitrack.co"),
            })
            .await
            .unwrap();

        let user = ctx.restore().await.unwrap();
        assert_eq!(user.email, "ana@bovitrack.co");
        assert!(!ctx.loading().await);
        assert!(ctx.is_authenticated().await);
    }

    #[tokio::test]
    async fn restore_with_expired_session_is_silent() {
        let (ctx, store) = context();
        let mut tokens = MockProvider::tokens_for("ana@bovitrack.co");
        tokens.refresh_token = "expired".to_string();
        store
            .save(&StoredSession {
                user: session_user_from_token(&tokens.id_token).unwrap(),
                tokens,
            })
            .await
            .unwrap();
        let mut rx = ctx.subscribe();

        assert!(ctx.restore().await.is_none());
        assert!(!ctx.loading().await);
        assert!(!ctx.is_authenticated().await);
        assert!(store.load().await.unwrap().is_none());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn file_store_round_trips_and_clears() {
        let path = std::env::temp_dir().join(format!("bovitrack-session-{}.json", uuid::Uuid::new_v4()));
        let store = FileSessionStore::new(&path);
        assert!(store.load().await.unwrap().is_none());

        let tokens = MockProvider::tokens_for("ana@bovitrack.co");
        let session = StoredSession {
            user: session_user_from_token(&tokens.id_token).unwrap(),
            tokens,
        };
        store.save(&session).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(session));

        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }
}
