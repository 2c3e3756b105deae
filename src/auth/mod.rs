//! Authentication module
//!
//! Obtains the bearer token for the Simphony BI API through the identity
//! provider's PKCE handshake (authorize → sign in → token exchange).
//!
//! The handshake state lives in a `CredentialSession` that is threaded through
//! the steps of a `CredentialExchange`; the resulting `BearerToken` is shared
//! read-only by every data request of the sync.

mod authenticator;
mod pkce;
mod types;

pub use authenticator::{
    extract_authorization_code, parse_set_cookie, CredentialExchange, AUTHORIZE_PATH,
    REDIRECT_URI, SCOPE, SIGN_IN_PATH, TOKEN_PATH,
};
pub use pkce::{derive_challenge, PkcePair};
pub use types::{BearerToken, CredentialSession, Credentials, HandshakePhase};
