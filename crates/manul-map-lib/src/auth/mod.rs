//! Account flows against an identity provider
//!
//! Registration, login and password reset are plain async functions over an
//! [`IdentityProvider`]. Each one validates the form locally first, then
//! talks to the provider and turns provider error codes into the message the
//! form shows. [`AuthState`] holds the signed-in session and tells listeners
//! when it changes.

mod firebase;

pub use firebase::{FIREBASE_ENDPOINT, FirebaseRestProvider};

use std::future::Future;
use std::pin::Pin;

/// Error reported by the identity provider, with an `auth/*` code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

#[cfg(not(target_arch = "wasm32"))]
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = ProviderResult<T>> + Send + 'a>>;

#[cfg(target_arch = "wasm32")]
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = ProviderResult<T>> + 'a>>;

/// A signed-in account as the provider reports it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserSession {
    pub id_token: String,
    pub local_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub email_verified: bool,
}

/// Operations the account flows need from a provider
pub trait IdentityProvider: Send + Sync {
    fn create_account<'a>(&'a self, email: &'a str, password: &'a str) -> ProviderFuture<'a, UserSession>;

    fn update_display_name<'a>(
        &'a self,
        session: &'a UserSession,
        display_name: &'a str,
    ) -> ProviderFuture<'a, UserSession>;

    fn send_email_verification<'a>(&'a self, session: &'a UserSession) -> ProviderFuture<'a, ()>;

    fn sign_in<'a>(&'a self, email: &'a str, password: &'a str) -> ProviderFuture<'a, UserSession>;

    /// Fresh copy of the account, e.g. after the email was verified
    fn reload<'a>(&'a self, session: &'a UserSession) -> ProviderFuture<'a, UserSession>;

    fn send_password_reset<'a>(&'a self, email: &'a str) -> ProviderFuture<'a, ()>;
}

/// Which form an error is shown in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOperation {
    Register,
    Login,
    Reset,
}

pub mod messages {
    pub const MISSING_CREDENTIALS: &str = "Заполните почту и пароль.";
    pub const PASSWORD_TOO_SHORT: &str = "Пароль должен быть минимум 6 символов.";
    pub const MISSING_RESET_EMAIL: &str = "Введите почту и нажмите ещё раз.";
    pub const REGISTERED: &str = "✅ Письмо для подтверждения отправлено! Откройте почту, перейдите по ссылке в письме, затем войдите через вкладку «Вход».";
    pub const LOGGED_IN: &str = "Успешный вход!";
    pub const EMAIL_NOT_VERIFIED: &str =
        "Почта не подтверждена. Откройте письмо и подтвердите email. Затем попробуйте войти снова.";
    pub const RESET_SENT: &str = "Письмо для сброса пароля отправлено.";

    pub const EMAIL_IN_USE: &str = "Эта почта уже зарегистрирована.";
    pub const INVALID_EMAIL: &str = "Некорректная почта.";
    pub const WEAK_PASSWORD: &str = "Слишком простой пароль (минимум 6 символов).";
    pub const WRONG_CREDENTIALS: &str = "Неверная почта или пароль.";
    pub const USER_NOT_FOUND: &str = "Пользователь не найден.";

    pub const REGISTER_FAILED: &str = "Ошибка регистрации";
    pub const LOGIN_FAILED: &str = "Ошибка входа";
    pub const RESET_FAILED: &str = "Не удалось отправить письмо";

    pub const DEFAULT_DISPLAY_NAME: &str = "Пользователь";
}

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_CHARS: usize = 6;

/// Shorter nicknames are replaced by the local part of the email
pub const MIN_NICKNAME_CHARS: usize = 2;

/// Message shown for a provider error in a given form
pub fn error_message(operation: AuthOperation, error: &ProviderError) -> &'static str {
    use messages::*;
    match (operation, error.code.as_str()) {
        (AuthOperation::Register, "auth/email-already-in-use") => EMAIL_IN_USE,
        (AuthOperation::Register, "auth/invalid-email") => INVALID_EMAIL,
        (AuthOperation::Register, "auth/weak-password") => WEAK_PASSWORD,
        (AuthOperation::Register, _) => REGISTER_FAILED,

        (AuthOperation::Login, "auth/invalid-credential" | "auth/wrong-password") => WRONG_CREDENTIALS,
        (AuthOperation::Login, "auth/user-not-found") => USER_NOT_FOUND,
        (AuthOperation::Login, "auth/invalid-email") => INVALID_EMAIL,
        (AuthOperation::Login, _) => LOGIN_FAILED,

        (AuthOperation::Reset, "auth/invalid-email") => INVALID_EMAIL,
        (AuthOperation::Reset, "auth/user-not-found") => USER_NOT_FOUND,
        (AuthOperation::Reset, _) => RESET_FAILED,
    }
}

/// Result of one form submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Finished; show the message as a success
    Done(&'static str),
    /// Login succeeded with a verified account
    SignedIn(UserSession),
    /// Rejected locally or by the provider; show the message as an error
    Rejected(&'static str),
}

impl AuthOutcome {
    /// Message for the form under the submit button
    pub fn message(&self) -> &'static str {
        match self {
            Self::Done(message) | Self::Rejected(message) => message,
            Self::SignedIn(_) => messages::LOGGED_IN,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Nickname to store, falling back to the local part of the email
pub fn effective_nickname(nickname: &str, email: &str) -> String {
    let nickname = nickname.trim();
    if nickname.chars().count() >= MIN_NICKNAME_CHARS {
        nickname.to_string()
    } else {
        email.split('@').next().unwrap_or(email).to_string()
    }
}

fn rejected(operation: AuthOperation, error: ProviderError) -> AuthOutcome {
    tracing::warn!(?operation, code = %error.code, "Identity provider rejected request: {}", error.message);
    AuthOutcome::Rejected(error_message(operation, &error))
}

async fn create_named_account(
    provider: &dyn IdentityProvider,
    email: &str,
    password: &str,
    nickname: &str,
) -> ProviderResult<()> {
    let session = provider.create_account(email, password).await?;
    let session = provider.update_display_name(&session, nickname).await?;
    provider.send_email_verification(&session).await
}

async fn sign_in_fresh(
    provider: &dyn IdentityProvider,
    email: &str,
    password: &str,
) -> ProviderResult<UserSession> {
    let session = provider.sign_in(email, password).await?;
    provider.reload(&session).await
}

/// Create an account, name it and send the verification mail
///
/// The new account is not kept signed in: the user logs in once the email
/// is verified.
pub async fn register(
    provider: &dyn IdentityProvider,
    email: &str,
    password: &str,
    nickname: &str,
) -> AuthOutcome {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return AuthOutcome::Rejected(messages::MISSING_CREDENTIALS);
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return AuthOutcome::Rejected(messages::PASSWORD_TOO_SHORT);
    }
    let nickname = effective_nickname(nickname, email);

    match create_named_account(provider, email, password, &nickname).await {
        Ok(()) => {
            tracing::info!("Registered account, verification mail sent");
            AuthOutcome::Done(messages::REGISTERED)
        }
        Err(err) => rejected(AuthOperation::Register, err),
    }
}

/// Sign in; accounts with an unverified email are refused
pub async fn login(provider: &dyn IdentityProvider, email: &str, password: &str) -> AuthOutcome {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return AuthOutcome::Rejected(messages::MISSING_CREDENTIALS);
    }

    match sign_in_fresh(provider, email, password).await {
        Ok(session) if !session.email_verified => AuthOutcome::Rejected(messages::EMAIL_NOT_VERIFIED),
        Ok(session) => {
            tracing::info!("Signed in");
            AuthOutcome::SignedIn(session)
        }
        Err(err) => rejected(AuthOperation::Login, err),
    }
}

/// Send a password reset mail
pub async fn reset_password(provider: &dyn IdentityProvider, email: &str) -> AuthOutcome {
    let email = email.trim();
    if email.is_empty() {
        return AuthOutcome::Rejected(messages::MISSING_RESET_EMAIL);
    }
    match provider.send_password_reset(email).await {
        Ok(()) => AuthOutcome::Done(messages::RESET_SENT),
        Err(err) => rejected(AuthOperation::Reset, err),
    }
}

/// What the header shows about the current account
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionView {
    pub signed_in: bool,
    pub verified: bool,
    pub display_name: String,
}

impl SessionView {
    pub fn of(session: Option<&UserSession>) -> Self {
        let Some(session) = session else {
            return Self::default();
        };
        // Accounts without an email (e.g. anonymous) count as verified
        let verified = session.email_verified || session.email.is_none();
        let display_name = session
            .display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(session.email.as_deref().filter(|e| !e.is_empty()))
            .unwrap_or(messages::DEFAULT_DISPLAY_NAME)
            .to_string();
        Self {
            signed_in: true,
            verified,
            display_name,
        }
    }

    /// Whether the header shows the account instead of the sign-in button
    pub fn shows_account(&self) -> bool {
        self.signed_in && self.verified
    }
}

type SessionListener = Box<dyn FnMut(&SessionView)>;

/// Current session and its listeners
#[derive(Default)]
pub struct AuthState {
    session: Option<UserSession>,
    listeners: Vec<SessionListener>,
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("signed_in", &self.session.is_some())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl AuthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&UserSession> {
        self.session.as_ref()
    }

    pub fn view(&self) -> SessionView {
        SessionView::of(self.session.as_ref())
    }

    /// Register a listener; it is called right away with the current view
    pub fn on_session_changed(&mut self, mut listener: impl FnMut(&SessionView) + 'static) {
        listener(&self.view());
        self.listeners.push(Box::new(listener));
    }

    pub fn set_session(&mut self, session: Option<UserSession>) {
        self.session = session;
        let view = self.view();
        tracing::debug!(signed_in = view.signed_in, verified = view.verified, "Session changed");
        for listener in &mut self.listeners {
            listener(&view);
        }
    }

    /// Apply a form outcome; only a successful login changes the session
    pub fn apply(&mut self, outcome: &AuthOutcome) {
        if let AuthOutcome::SignedIn(session) = outcome {
            self.set_session(Some(session.clone()));
        }
    }

    pub fn logout(&mut self) {
        if self.session.is_some() {
            tracing::info!("Signed out");
            self.set_session(None);
        }
    }
}
