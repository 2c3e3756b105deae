//! PKCE verifier/challenge pair (RFC 7636, S256 method)

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256};

/// Number of random bytes behind a verifier
const VERIFIER_BYTES: usize = 32;

/// A PKCE verifier and the S256 challenge derived from it
#[derive(Clone, PartialEq, Eq)]
pub struct PkcePair {
    verifier: String,
    challenge: String,
}

impl PkcePair {
    /// Generate a fresh pair from 32 random bytes
    pub fn generate() -> Self {
        let bytes: [u8; VERIFIER_BYTES] = rand::random();
        Self::from_verifier(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Build a pair from an existing verifier
    pub fn from_verifier(verifier: impl Into<String>) -> Self {
        let verifier = verifier.into();
        let challenge = derive_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }

    /// The secret verifier sent on token exchange
    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    /// The challenge sent on the authorize request
    pub fn challenge(&self) -> &str {
        &self.challenge
    }

    /// RFC 7636 identifier of the challenge method
    pub fn method(&self) -> &'static str {
        "S256"
    }
}

impl std::fmt::Debug for PkcePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkcePair")
            .field("verifier", &"<redacted>")
            .field("challenge", &self.challenge)
            .finish()
    }
}

/// base64url-no-pad(SHA-256(verifier))
pub fn derive_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc7636_appendix_b_vector() {
        let pair = PkcePair::from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
        assert_eq!(
            pair.challenge(),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
        assert_eq!(pair.method(), "S256");
    }

    #[test]
    fn test_generated_verifier_shape() {
        let pair = PkcePair::generate();
        assert_eq!(pair.verifier().len(), 43);
        assert!(pair
            .verifier()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert!(!pair.challenge().contains('='));
    }

    #[test]
    fn test_challenge_rederives_from_verifier() {
        for _ in 0..16 {
            let pair = PkcePair::generate();
            assert_eq!(derive_challenge(pair.verifier()), pair.challenge());
            assert_eq!(PkcePair::from_verifier(pair.verifier()), pair);
        }
    }

    #[test]
    fn test_pairs_are_not_reused() {
        assert_ne!(PkcePair::generate(), PkcePair::generate());
    }

    #[test]
    fn test_debug_hides_verifier() {
        let pair = PkcePair::from_verifier("super-secret-verifier");
        let debug = format!("{pair:?}");
        assert!(!debug.contains("super-secret-verifier"));
        assert!(debug.contains(pair.challenge()));
    }
}
