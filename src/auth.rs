use crate::error::{HavenError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verifier for HS256 signed session tokens.
///
/// Tokens are the usual three base64url segments: header, claims,
/// signature. Verification checks the HMAC over `header.claims` and the
/// `exp` claim, then returns the opaque user identifier.
pub struct TokenVerifier {
    secret: Vec<u8>,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    /// Verify `token` and return the user id claim.
    pub fn verify(&self, token: &str) -> Result<String> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    fn verify_at(&self, token: &str, now: i64) -> Result<String> {
        let mut parts = token.split('.');
        let (header, claims, signature) = match (parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(c), Some(s)) if parts.next().is_none() => (h, c, s),
            _ => return Err(HavenError::Token("malformed token".to_string())),
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| HavenError::Token("malformed signature".to_string()))?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| HavenError::Token(e.to_string()))?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(claims.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| HavenError::Token("invalid signature".to_string()))?;

        let claims = URL_SAFE_NO_PAD
            .decode(claims)
            .map_err(|_| HavenError::Token("malformed claims".to_string()))?;
        let claims: serde_json::Value = serde_json::from_slice(&claims)
            .map_err(|_| HavenError::Token("claims are not json".to_string()))?;

        if let Some(exp) = claims.get("exp").and_then(serde_json::Value::as_i64) {
            if exp < now {
                return Err(HavenError::Token("token expired".to_string()));
            }
        }

        claims
            .get("userId")
            .or_else(|| claims.get("sub"))
            .and_then(serde_json::Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| HavenError::Token("no user id claim".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_token(secret: &str, claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(body.as_bytes());
        let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{}.{}.{}", header, body, sig)
    }

    #[test]
    fn test_valid_token_returns_user_id() {
        let verifier = TokenVerifier::new("secret");
        let token = make_token("secret", &serde_json::json!({"userId": "user-7"}));

        assert_eq!(verifier.verify(&token).unwrap(), "user-7");
    }

    #[test]
    fn test_sub_claim_is_accepted() {
        let verifier = TokenVerifier::new("secret");
        let token = make_token("secret", &serde_json::json!({"sub": "user-9"}));

        assert_eq!(verifier.verify(&token).unwrap(), "user-9");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let verifier = TokenVerifier::new("secret");
        let token = make_token("other-secret", &serde_json::json!({"userId": "user-7"}));

        let err = verifier.verify(&token).unwrap_err();
        assert!(matches!(err, HavenError::Token(_)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = TokenVerifier::new("secret");
        let token = make_token(
            "secret",
            &serde_json::json!({"userId": "user-7", "exp": 1000}),
        );

        let err = verifier.verify_at(&token, 2000).unwrap_err();
        assert!(matches!(err, HavenError::Token(_)));
    }

    #[test]
    fn test_unexpired_token_accepted() {
        let verifier = TokenVerifier::new("secret");
        let token = make_token(
            "secret",
            &serde_json::json!({"userId": "user-7", "exp": 4102444800i64}),
        );

        assert_eq!(verifier.verify(&token).unwrap(), "user-7");
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let verifier = TokenVerifier::new("secret");
        assert!(verifier.verify("garbage").is_err());
        assert!(verifier.verify("a.b").is_err());
        assert!(verifier.verify("a.b.c.d").is_err());
    }

    #[test]
    fn test_missing_user_claim_rejected() {
        let verifier = TokenVerifier::new("secret");
        let token = make_token("secret", &serde_json::json!({"role": "admin"}));

        let err = verifier.verify(&token).unwrap_err();
        assert!(matches!(err, HavenError::Token(_)));
    }
}
