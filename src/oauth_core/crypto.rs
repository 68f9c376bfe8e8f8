//! Secret and PKCE comparisons using `ring`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::{digest, hmac, rand::SystemRandom};

/// PKCE `S256` challenge for a verifier: base64url(SHA-256(verifier)), no padding.
pub fn pkce_code_challenge(verifier: &str) -> String {
    let hash = digest::digest(&digest::SHA256, verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash.as_ref())
}

/// Checks a PKCE verifier against the recorded challenge (RFC 7636 §4.6).
/// Unknown methods never verify.
pub fn verify_pkce(verifier: &str, challenge: &str, method: Option<&str>) -> bool {
    match method.unwrap_or("plain") {
        m if m.eq_ignore_ascii_case("S256") => {
            secrets_equal(&pkce_code_challenge(verifier), challenge)
        }
        m if m.eq_ignore_ascii_case("plain") => secrets_equal(verifier, challenge),
        _ => false,
    }
}

/// Constant-time equality for secrets, via an HMAC tag under a one-off key.
pub fn secrets_equal(presented: &str, expected: &str) -> bool {
    let rng = SystemRandom::new();
    let Ok(key) = hmac::Key::generate(hmac::HMAC_SHA256, &rng) else {
        return false;
    };
    let tag = hmac::sign(&key, expected.as_bytes());
    hmac::verify(&key, presented.as_bytes(), tag.as_ref()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 7636 Appendix B
    const VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    const CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

    #[test]
    fn s256_matches_rfc_vector() {
        assert_eq!(pkce_code_challenge(VERIFIER), CHALLENGE);
        assert!(verify_pkce(VERIFIER, CHALLENGE, Some("S256")));
        assert!(!verify_pkce("wrong", CHALLENGE, Some("S256")));
    }

    #[test]
    fn plain_and_unknown_methods() {
        assert!(verify_pkce("abc", "abc", None));
        assert!(verify_pkce("abc", "abc", Some("plain")));
        assert!(!verify_pkce("abc", "abc", Some("S512")));
    }

    #[test]
    fn secret_comparison() {
        assert!(secrets_equal("s3cret", "s3cret"));
        assert!(!secrets_equal("s3cret", "s3cre"));
        assert!(!secrets_equal("", "x"));
    }
}
