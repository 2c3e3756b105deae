//! Credential exchange against the Simphony identity provider
//!
//! A bearer token is obtained with a three-step handshake:
//! 1. `GET  /oidc-provider/v1/oauth2/authorize` (PKCE challenge, no redirects) sets a session cookie
//! 2. `POST /oidc-provider/v1/oauth2/signin` returns a redirect URL carrying `code=...`
//! 3. `POST /oidc-provider/v1/oauth2/token` trades the code and verifier for an access token
//!
//! None of the steps is retried. Every sync runs the whole handshake again.

use super::types::{BearerToken, CredentialSession, Credentials};
use crate::error::{Error, Result};
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{redirect, Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Authorize endpoint path
pub const AUTHORIZE_PATH: &str = "/oidc-provider/v1/oauth2/authorize";
/// Sign-in endpoint path
pub const SIGN_IN_PATH: &str = "/oidc-provider/v1/oauth2/signin";
/// Token endpoint path
pub const TOKEN_PATH: &str = "/oidc-provider/v1/oauth2/token";
/// Redirect URI registered for API accounts
pub const REDIRECT_URI: &str = "apiaccount://callback";
/// Requested scope
pub const SCOPE: &str = "openid";

/// Marker preceding the authorization code in the sign-in redirect URL
const CODE_MARKER: &str = "code=";

/// Runs the login handshake against one identity provider
pub struct CredentialExchange {
    /// Identity provider base URL
    auth_url: String,
    /// HTTP client that never follows redirects
    http_client: Client,
}

impl CredentialExchange {
    /// Create an exchange for the identity provider at `auth_url`
    pub fn new(auth_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(timeout)
            .user_agent(format!("tap-simphony/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            auth_url: auth_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Run all three steps and return the bearer token
    pub async fn login(&self, credentials: Credentials) -> Result<BearerToken> {
        info!(username = %credentials.username, "Authenticating with Simphony identity provider");

        let session = CredentialSession::new(credentials);
        let session = self.authorize(session).await?;
        let session = self.sign_in(session).await?;
        let session = self.exchange_token(session).await?;

        info!("Obtained Simphony bearer token");
        session.into_token()
    }

    /// Step 1: request authorization and capture the session cookie
    pub async fn authorize(&self, session: CredentialSession) -> Result<CredentialSession> {
        let url = format!("{}{AUTHORIZE_PATH}", self.auth_url);
        let pkce = session.pkce();
        let query = [
            ("response_type", "code"),
            ("client_id", session.credentials().client_id.as_str()),
            ("scope", SCOPE),
            ("redirect_uri", REDIRECT_URI),
            ("state", ""),
            ("code_challenge", pkce.challenge()),
            ("code_challenge_method", pkce.method()),
        ];

        debug!(%url, "Sending authorize request");
        let response = self
            .http_client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| Error::authorize(format!("request failed: {e}")))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::authorize(format!(
                "authorize request failed with status {}: {body}",
                status.as_u16()
            )));
        }

        let cookie = parse_set_cookie(
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        )
        .ok_or_else(|| Error::authorize("response carried no Set-Cookie header"))?;

        Ok(session.with_cookie(cookie))
    }

    /// Step 2: sign in with the API account and capture the authorization code
    pub async fn sign_in(&self, session: CredentialSession) -> Result<CredentialSession> {
        let url = format!("{}{SIGN_IN_PATH}", self.auth_url);
        let cookie = session.cookie()?;
        let credentials = session.credentials();
        let form = [
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
            ("orgname", credentials.organization.as_str()),
            ("client_id", credentials.client_id.as_str()),
        ];

        debug!(%url, "Sending sign-in request");
        let response = self
            .http_client
            .post(&url)
            .header(COOKIE, cookie)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::sign_in(format!("request failed: {e}")))?;

        let body: SignInResponse = read_json(response, Error::sign_in).await?;
        let redirect_url = body
            .redirect_url
            .ok_or_else(|| Error::sign_in("response has no redirectUrl"))?;
        let code = extract_authorization_code(&redirect_url).ok_or_else(|| {
            Error::sign_in(format!("redirectUrl carries no authorization code: {redirect_url}"))
        })?;

        Ok(session.with_code(code))
    }

    /// Step 3: exchange the authorization code for a bearer token
    pub async fn exchange_token(&self, session: CredentialSession) -> Result<CredentialSession> {
        let url = format!("{}{TOKEN_PATH}", self.auth_url);
        let cookie = session.cookie()?;
        let code = session.code()?;
        let form = [
            ("scope", SCOPE),
            ("grant_type", "authorization_code"),
            ("client_id", session.credentials().client_id.as_str()),
            ("code_verifier", session.pkce().verifier()),
            ("code", code),
            ("redirect_uri", REDIRECT_URI),
        ];

        debug!(%url, "Sending token request");
        let response = self
            .http_client
            .post(&url)
            .header(COOKIE, cookie)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::token_exchange(format!("request failed: {e}")))?;

        let body: TokenResponse = read_json(response, Error::token_exchange).await?;
        let token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::token_exchange("response has no access_token"))?;

        if let Some(expires_in) = body.expires_in {
            debug!(expires_in, "Token lifetime reported by provider");
        }

        Ok(session.with_token(BearerToken::new(token)))
    }
}

impl std::fmt::Debug for CredentialExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialExchange")
            .field("auth_url", &self.auth_url)
            .finish_non_exhaustive()
    }
}

/// Sign-in response body
#[derive(Debug, Deserialize)]
struct SignInResponse {
    #[serde(rename = "redirectUrl", default)]
    redirect_url: Option<String>,
}

/// Token endpoint response body
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Check the status and decode a JSON body, tagging failures with the phase
async fn read_json<T, F>(response: Response, phase_error: F) -> Result<T>
where
    T: serde::de::DeserializeOwned,
    F: Fn(String) -> Error,
{
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| phase_error(format!("failed to read response body: {e}")))?;

    if !status.is_success() {
        return Err(phase_error(format!(
            "request failed with status {}: {body}",
            status.as_u16()
        )));
    }

    serde_json::from_str(&body).map_err(|e| phase_error(format!("invalid JSON response: {e}")))
}

/// Reduce `Set-Cookie` header values to a `Cookie` header value
///
/// Several cookies may share one header line separated by `", "`. Each cookie
/// keeps only its `name=value` segment; attribute fragments such as the tail of
/// an `Expires` date are dropped. Returns `None` when no cookie pair is found.
pub fn parse_set_cookie<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let pairs: Vec<&str> = values
        .into_iter()
        .flat_map(|value| value.split(", "))
        .filter_map(|cookie| cookie.split(';').next())
        .map(str::trim)
        .filter(|pair| {
            pair.split_once('=')
                .is_some_and(|(name, _)| !name.is_empty() && !name.contains(' '))
        })
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

/// Extract the authorization code from a sign-in redirect URL
///
/// The code is whatever follows the `code=` marker, up to the next `&` or `#`.
pub fn extract_authorization_code(redirect_url: &str) -> Option<String> {
    let (_, tail) = redirect_url.split_once(CODE_MARKER)?;
    let code = tail.split(['&', '#']).next().unwrap_or_default();

    if code.is_empty() {
        None
    } else {
        Some(code.to_string())
    }
}
