//! Credential session types
//!
//! The handshake state is an explicit value threaded through the three
//! exchange steps. Each step consumes a snapshot and returns the next one;
//! reading a field before the step that fills it is an error.

use super::pkce::PkcePair;
use crate::error::{Error, Result};

/// Login credentials of a Simphony API account
#[derive(Clone)]
pub struct Credentials {
    /// OpenID client identifier
    pub client_id: String,
    /// Organization short name (`orgname` on sign-in)
    pub organization: String,
    /// API account user name
    pub username: String,
    /// API account password
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &"<redacted>")
            .field("organization", &self.organization)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Opaque bearer credential for data requests
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw access token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// How far a [`CredentialSession`] has progressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HandshakePhase {
    /// Nothing sent yet
    New,
    /// Authorize request answered with a session cookie
    Authorized,
    /// Sign-in answered with an authorization code
    SignedIn,
    /// Token exchange answered with a bearer token
    Authenticated,
}

/// State of one login handshake, scoped to a single sync
#[derive(Debug, Clone)]
pub struct CredentialSession {
    credentials: Credentials,
    pkce: PkcePair,
    cookie: Option<String>,
    code: Option<String>,
    token: Option<BearerToken>,
}

impl CredentialSession {
    /// Start a session with a freshly generated PKCE pair
    pub fn new(credentials: Credentials) -> Self {
        Self::with_pkce(credentials, PkcePair::generate())
    }

    /// Start a session with a given PKCE pair
    pub fn with_pkce(credentials: Credentials, pkce: PkcePair) -> Self {
        Self {
            credentials,
            pkce,
            cookie: None,
            code: None,
            token: None,
        }
    }

    /// Account credentials
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// PKCE pair of this session
    pub fn pkce(&self) -> &PkcePair {
        &self.pkce
    }

    /// Session cookie set by the authorize step
    pub fn cookie(&self) -> Result<&str> {
        self.cookie
            .as_deref()
            .ok_or(Error::SessionIncomplete {
                field: "session cookie",
            })
    }

    /// Authorization code returned by sign-in
    pub fn code(&self) -> Result<&str> {
        self.code.as_deref().ok_or(Error::SessionIncomplete {
            field: "authorization code",
        })
    }

    /// Bearer token returned by the token exchange
    pub fn token(&self) -> Result<&BearerToken> {
        self.token.as_ref().ok_or(Error::SessionIncomplete {
            field: "bearer token",
        })
    }

    /// Consume the session, keeping only its token
    pub fn into_token(self) -> Result<BearerToken> {
        self.token.ok_or(Error::SessionIncomplete {
            field: "bearer token",
        })
    }

    /// Current handshake phase
    pub fn phase(&self) -> HandshakePhase {
        if self.token.is_some() {
            HandshakePhase::Authenticated
        } else if self.code.is_some() {
            HandshakePhase::SignedIn
        } else if self.cookie.is_some() {
            HandshakePhase::Authorized
        } else {
            HandshakePhase::New
        }
    }

    #[must_use]
    pub(crate) fn with_cookie(mut self, cookie: String) -> Self {
        self.cookie = Some(cookie);
        self
    }

    #[must_use]
    pub(crate) fn with_code(mut self, code: String) -> Self {
        self.code = Some(code);
        self
    }

    #[must_use]
    pub(crate) fn with_token(mut self, token: BearerToken) -> Self {
        self.token = Some(token);
        self
    }
}
