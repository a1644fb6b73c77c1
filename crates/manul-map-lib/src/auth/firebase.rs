//! Identity provider backed by the Firebase Identity Toolkit REST API

use super::{IdentityProvider, ProviderError, ProviderFuture, ProviderResult, UserSession};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Production endpoint; the auth emulator exposes the same paths
pub const FIREBASE_ENDPOINT: &str = "https://identitytoolkit.googleapis.com/v1";

#[derive(Debug, Clone)]
pub struct FirebaseRestProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl FirebaseRestProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(FIREBASE_ENDPOINT, api_key)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/accounts:{}?key={}", self.endpoint, method, self.api_key)
    }

    async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(&self, method: &str, body: &B) -> ProviderResult<R> {
        let response = self
            .client
            .post(self.url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::new("auth/network-request-failed", e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::new("auth/network-request-failed", e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));
            return Err(map_rest_error(&message));
        }

        serde_json::from_str(&text).map_err(|e| ProviderError::new("auth/internal-error", e.to_string()))
    }
}

/// Map a REST error identifier onto the `auth/*` code the forms know
///
/// REST messages look like `WEAK_PASSWORD : Password should be at least 6
/// characters`; only the identifier before ` : ` is significant.
pub fn map_rest_error(message: &str) -> ProviderError {
    let identifier = message.split(" : ").next().unwrap_or(message).trim();
    let code = match identifier {
        "EMAIL_EXISTS" => "auth/email-already-in-use",
        "INVALID_EMAIL" | "MISSING_EMAIL" => "auth/invalid-email",
        "WEAK_PASSWORD" => "auth/weak-password",
        "INVALID_LOGIN_CREDENTIALS" => "auth/invalid-credential",
        "INVALID_PASSWORD" => "auth/wrong-password",
        "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => "auth/user-not-found",
        "USER_DISABLED" => "auth/user-disabled",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "auth/too-many-requests",
        _ => "auth/internal-error",
    };
    ProviderError::new(code, message)
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OobCodeRequest<'a> {
    request_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

/// Response of `signUp`, `signInWithPassword` and `update`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
}

impl AccountResponse {
    /// Merge into an existing session; absent fields keep their old value
    fn into_session(self, previous: Option<&UserSession>) -> UserSession {
        let previous = previous.cloned().unwrap_or_default();
        UserSession {
            id_token: self.id_token.unwrap_or(previous.id_token),
            local_id: if self.local_id.is_empty() {
                previous.local_id
            } else {
                self.local_id
            },
            email: self.email.or(previous.email),
            display_name: self.display_name.or(previous.display_name),
            email_verified: self.email_verified.unwrap_or(previous.email_verified),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountResponse>,
}

#[derive(Debug, Deserialize)]
struct Ignored {}

impl IdentityProvider for FirebaseRestProvider {
    fn create_account<'a>(&'a self, email: &'a str, password: &'a str) -> ProviderFuture<'a, UserSession> {
        Box::pin(async move {
            let request = PasswordRequest {
                email,
                password,
                return_secure_token: true,
            };
            let account: AccountResponse = self.post("signUp", &request).await?;
            Ok(account.into_session(None))
        })
    }

    fn update_display_name<'a>(
        &'a self,
        session: &'a UserSession,
        display_name: &'a str,
    ) -> ProviderFuture<'a, UserSession> {
        Box::pin(async move {
            let request = UpdateProfileRequest {
                id_token: &session.id_token,
                display_name,
                return_secure_token: true,
            };
            let account: AccountResponse = self.post("update", &request).await?;
            Ok(account.into_session(Some(session)))
        })
    }

    fn send_email_verification<'a>(&'a self, session: &'a UserSession) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            let request = OobCodeRequest {
                request_type: "VERIFY_EMAIL",
                id_token: Some(&session.id_token),
                email: None,
            };
            let _: Ignored = self.post("sendOobCode", &request).await?;
            Ok(())
        })
    }

    fn sign_in<'a>(&'a self, email: &'a str, password: &'a str) -> ProviderFuture<'a, UserSession> {
        Box::pin(async move {
            let request = PasswordRequest {
                email,
                password,
                return_secure_token: true,
            };
            let account: AccountResponse = self.post("signInWithPassword", &request).await?;
            Ok(account.into_session(None))
        })
    }

    fn reload<'a>(&'a self, session: &'a UserSession) -> ProviderFuture<'a, UserSession> {
        Box::pin(async move {
            let request = LookupRequest {
                id_token: &session.id_token,
            };
            let lookup: LookupResponse = self.post("lookup", &request).await?;
            let account = lookup
                .users
                .into_iter()
                .next()
                .ok_or_else(|| ProviderError::new("auth/user-not-found", "lookup returned no users"))?;
            Ok(account.into_session(Some(session)))
        })
    }

    fn send_password_reset<'a>(&'a self, email: &'a str) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            let request = OobCodeRequest {
                request_type: "PASSWORD_RESET",
                id_token: None,
                email: Some(email),
            };
            let _: Ignored = self.post("sendOobCode", &request).await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_rest_error() {
        assert_eq!(map_rest_error("EMAIL_EXISTS").code, "auth/email-already-in-use");
        assert_eq!(
            map_rest_error("WEAK_PASSWORD : Password should be at least 6 characters").code,
            "auth/weak-password"
        );
        assert_eq!(map_rest_error("INVALID_LOGIN_CREDENTIALS").code, "auth/invalid-credential");
        assert_eq!(map_rest_error("EMAIL_NOT_FOUND").code, "auth/user-not-found");
        assert_eq!(map_rest_error("SOMETHING_NEW").code, "auth/internal-error");
        assert_eq!(map_rest_error("SOMETHING_NEW").message, "SOMETHING_NEW");
    }

    #[test]
    fn test_url() {
        let provider = FirebaseRestProvider::with_endpoint("http://localhost:9099/identitytoolkit.googleapis.com/v1/", "k");
        assert_eq!(
            provider.url("signUp"),
            "http://localhost:9099/identitytoolkit.googleapis.com/v1/accounts:signUp?key=k"
        );
    }

    #[test]
    fn test_request_bodies() {
        let body = serde_json::to_value(PasswordRequest {
            email: "a@b.c",
            password: "secret1",
            return_secure_token: true,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"email": "a@b.c", "password": "secret1", "returnSecureToken": true})
        );

        let body = serde_json::to_value(OobCodeRequest {
            request_type: "PASSWORD_RESET",
            id_token: None,
            email: Some("a@b.c"),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"requestType": "PASSWORD_RESET", "email": "a@b.c"}));
    }

    #[test]
    fn test_account_response_merges_into_session() {
        let previous = UserSession {
            id_token: "old".into(),
            local_id: "uid".into(),
            email: Some("a@b.c".into()),
            display_name: None,
            email_verified: false,
        };
        let update: AccountResponse =
            serde_json::from_str(r#"{"localId": "uid", "displayName": "Манул", "emailVerified": true}"#).unwrap();
        let session = update.into_session(Some(&previous));
        assert_eq!(session.id_token, "old");
        assert_eq!(session.display_name.as_deref(), Some("Манул"));
        assert!(session.email_verified);

        let error: ErrorEnvelope =
            serde_json::from_str(r#"{"error": {"code": 400, "message": "EMAIL_EXISTS", "errors": []}}"#).unwrap();
        assert_eq!(map_rest_error(&error.error.message).code, "auth/email-already-in-use");
    }
}
