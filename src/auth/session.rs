//! Session gate: decides what the sign-in area shows on every page load.
//!
//! ```text
//! Unauthenticated ──(token cached)──▶ Validating ──▶ Valid
//!                                                ├─▶ Invalid  → redirect to Twitch
//!                                                └─▶ Errored  → "please refresh" banner
//! ```
//!
//! Each `resolve` call validates at most once and never retries. Nothing is
//! shared between gates: two mounts validate independently.

use crate::api::client::ApiClient;
use crate::api::models::TokenStatus;
use crate::auth::login::{LoginRedirector, Navigator};
use crate::error::ApiError;
use crate::routes::util::{error_banner, escape_html, notice};

pub const EXPIRED_NOTICE: &str = "Token has expired, refreshing token";
pub const VALIDATION_FAILED: &str =
    "Could not check your Twitch sign-in. Please refresh the page to try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Validating,
    Valid(TokenStatus),
    Invalid,
    Errored(String),
}

/// Asks the API whether an access token is still good.
#[allow(async_fn_in_trait)]
pub trait TokenValidator {
    async fn validate_token(&self, token: &str) -> Result<TokenStatus, ApiError>;
}

impl TokenValidator for ApiClient {
    async fn validate_token(&self, token: &str) -> Result<TokenStatus, ApiError> {
        ApiClient::validate_token(self, token).await
    }
}

#[derive(Debug)]
pub struct SessionGate {
    state: SessionState,
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionGate {
    pub fn new() -> Self {
        Self {
            state: SessionState::Unauthenticated,
        }
    }

    /// Resolve the session for `token`.
    ///
    /// `on_status` receives the validated status (`Valid`) or `None`
    /// (`Errored`). An `Invalid` token sends the browser back to Twitch.
    pub async fn resolve<V, N, F>(
        &mut self,
        token: Option<&str>,
        validator: &V,
        login: &LoginRedirector<'_, N>,
        mut on_status: F,
    ) -> &SessionState
    where
        V: TokenValidator,
        N: Navigator,
        F: FnMut(Option<&TokenStatus>),
    {
        let Some(token) = token else {
            self.state = SessionState::Unauthenticated;
            return &self.state;
        };

        self.state = SessionState::Validating;
        self.state = match validator.validate_token(token).await {
            Ok(status) if status.is_valid() => {
                on_status(Some(&status));
                SessionState::Valid(status)
            }
            Ok(_) => {
                tracing::info!("access token expired");
                login.redirect();
                SessionState::Invalid
            }
            Err(e) => {
                tracing::error!(error = %e, "token validation failed");
                on_status(None);
                SessionState::Errored(e.to_string())
            }
        };
        &self.state
    }
}

/// Sign-in area HTML for a session state.
pub fn render_session(state: &SessionState, login_url: &str) -> String {
    match state {
        SessionState::Unauthenticated => format!(
            r#"<a href="{}" class="inline-block bg-purple-700 hover:bg-purple-800 text-white font-bold py-2 px-4 rounded text-sm">Sign in with Twitch</a>"#,
            escape_html(login_url)
        ),
        SessionState::Validating => {
            r#"<span class="text-sm text-slate-500">Checking sign-in…</span>"#.to_string()
        }
        SessionState::Valid(status) => {
            let name = status.name.as_deref().unwrap_or("Twitch user");
            format!(
                r#"<div class="flex items-center gap-2 text-sm"><span>Signed in as <strong>{}</strong></span><button type="button" class="underline" onclick="buildboard.signOut()">Sign out</button></div>"#,
                escape_html(name)
            )
        }
        SessionState::Invalid => notice(EXPIRED_NOTICE),
        SessionState::Errored(_) => error_banner(VALIDATION_FAILED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::ValidationStatus;
    use crate::auth::login::tests::RecordingNavigator;
    use crate::config::Config;
    use std::cell::{Cell, RefCell};

    /// Validator with a canned answer that counts calls.
    struct MockValidator {
        answer: Option<ValidationStatus>,
        calls: Cell<usize>,
    }

    impl MockValidator {
        fn answering(status: ValidationStatus) -> Self {
            Self {
                answer: Some(status),
                calls: Cell::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                answer: None,
                calls: Cell::new(0),
            }
        }
    }

    impl TokenValidator for MockValidator {
        async fn validate_token(&self, _token: &str) -> Result<TokenStatus, ApiError> {
            self.calls.set(self.calls.get() + 1);
            match self.answer {
                Some(status) => Ok(TokenStatus {
                    id: Some("1001".into()),
                    name: Some("streamer".into()),
                    status,
                }),
                None => Err(ApiError::Status {
                    status: 502,
                    body: "bad gateway".into(),
                }),
            }
        }
    }

    fn config() -> Config {
        Config {
            twitch_client_id: "cid".into(),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn no_token_makes_no_call() {
        let validator = MockValidator::answering(ValidationStatus::Valid);
        let navigator = RecordingNavigator::default();
        let config = config();
        let login = LoginRedirector::new(&config, "https://x.test", &navigator);
        let notified = Cell::new(false);

        let mut gate = SessionGate::new();
        let state = gate.resolve(None, &validator, &login, |_| notified.set(true)).await;

        assert_eq!(*state, SessionState::Unauthenticated);
        assert_eq!(validator.calls.get(), 0);
        assert!(!notified.get());
        assert!(navigator.visited.borrow().is_empty());
        assert!(render_session(state, login.url()).contains("Sign in with Twitch"));
    }

    #[tokio::test]
    async fn valid_token_surfaces_name() {
        let validator = MockValidator::answering(ValidationStatus::Valid);
        let navigator = RecordingNavigator::default();
        let config = config();
        let login = LoginRedirector::new(&config, "https://x.test", &navigator);
        let seen = RefCell::new(None);

        let mut gate = SessionGate::new();
        let state = gate
            .resolve(Some("T"), &validator, &login, |s| {
                *seen.borrow_mut() = s.cloned()
            })
            .await
            .clone();

        assert!(matches!(state, SessionState::Valid(_)));
        assert_eq!(validator.calls.get(), 1);
        assert_eq!(seen.borrow().as_ref().unwrap().name.as_deref(), Some("streamer"));
        assert!(navigator.visited.borrow().is_empty());
        assert!(render_session(&state, login.url()).contains("Signed in as <strong>streamer</strong>"));
    }

    #[tokio::test]
    async fn invalid_token_redirects_exactly_once() {
        let validator = MockValidator::answering(ValidationStatus::Invalid);
        let navigator = RecordingNavigator::default();
        let config = config();
        let login = LoginRedirector::new(&config, "https://x.test", &navigator);

        let mut gate = SessionGate::new();
        let state = gate.resolve(Some("T"), &validator, &login, |_| {}).await;

        assert_eq!(*state, SessionState::Invalid);
        assert_eq!(validator.calls.get(), 1);
        assert_eq!(navigator.visited.borrow().len(), 1);
        assert!(navigator.visited.borrow()[0].starts_with("https://id.twitch.tv/oauth2/authorize"));
        assert!(render_session(state, login.url()).contains(EXPIRED_NOTICE));
    }

    #[tokio::test]
    async fn validation_failure_shows_refresh_banner() {
        let validator = MockValidator::failing();
        let navigator = RecordingNavigator::default();
        let config = config();
        let login = LoginRedirector::new(&config, "https://x.test", &navigator);
        let notified = RefCell::new(Vec::new());

        let mut gate = SessionGate::new();
        let state = gate
            .resolve(Some("T"), &validator, &login, |s| {
                notified.borrow_mut().push(s.is_some())
            })
            .await;

        assert!(matches!(state, SessionState::Errored(_)));
        assert_eq!(*notified.borrow(), vec![false]);
        assert!(navigator.visited.borrow().is_empty());
        let html = render_session(state, login.url());
        assert!(html.contains("refresh the page"));
        assert!(html.contains("@click=\"open = false\""));
    }

    #[tokio::test]
    async fn each_gate_validates_independently() {
        let validator = MockValidator::answering(ValidationStatus::Valid);
        let navigator = RecordingNavigator::default();
        let config = config();
        let login = LoginRedirector::new(&config, "https://x.test", &navigator);

        let mut header = SessionGate::new();
        let mut sidebar = SessionGate::new();
        header.resolve(Some("T"), &validator, &login, |_| {}).await;
        sidebar.resolve(Some("T"), &validator, &login, |_| {}).await;

        assert_eq!(validator.calls.get(), 2);
    }

    #[test]
    fn validating_renders_placeholder() {
        assert!(render_session(&SessionState::Validating, "").contains("Checking"));
    }

    #[tokio::test]
    async fn api_client_is_a_validator() {
        use wiremock::matchers::{header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/twitch/validate-token"))
            .and(header("X-Twitch-Token", "T"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "invalid"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        let navigator = RecordingNavigator::default();
        let config = config();
        let login = LoginRedirector::new(&config, "https://x.test", &navigator);
        let mut gate = SessionGate::new();
        let state = gate.resolve(Some("T"), &client, &login, |_| {}).await;
        assert_eq!(*state, SessionState::Invalid);
        assert_eq!(navigator.visited.borrow().len(), 1);
    }
}
