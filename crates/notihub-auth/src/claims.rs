//! JWT claims extraction without signature verification.
//!
//! Tokens reach this service only through the upstream gateway, which has
//! already validated them; here the claims segment is base64url-decoded and
//! projected into the fields the service uses.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use notihub_core::error::AppError;

/// User information extracted from a gateway token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    /// CPF, carried in the `preferred_username` claim.
    pub cpf: String,
    /// E-mail address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Phone number.
    pub phone: String,
    /// Realm roles.
    pub roles: Vec<String>,
    /// Whether the e-mail address is verified.
    pub email_verified: bool,
    /// Token subject.
    pub sub: String,
}

/// Raw claims layout of the gateway token.
#[derive(Debug, Default, Deserialize)]
struct RawClaims {
    #[serde(default)]
    preferred_username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    phone_number: String,
    #[serde(default)]
    sub: String,
    #[serde(default)]
    realm_access: RealmAccess,
}

#[derive(Debug, Default, Deserialize)]
struct RealmAccess {
    #[serde(default)]
    roles: Vec<String>,
}

/// Parse a JWT and extract the user information from its claims segment.
///
/// Accepts a bare token or one prefixed with `Bearer `. The signature is
/// NOT verified.
pub fn parse_token(token: &str) -> Result<UserInfo, AppError> {
    let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();

    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_sig), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AppError::unauthorized("Invalid token format"));
    };

    let decoded = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| AppError::unauthorized("Failed to decode token payload"))?;

    let claims: RawClaims = serde_json::from_slice(&decoded)
        .map_err(|_| AppError::unauthorized("Failed to parse token claims"))?;

    Ok(UserInfo {
        cpf: claims.preferred_username,
        email: claims.email,
        name: claims.name,
        phone: claims.phone_number,
        roles: claims.realm_access.roles,
        email_verified: claims.email_verified,
        sub: claims.sub,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_token(claims: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(b"{\"alg\":\"RS256\",\"typ\":\"JWT\"}");
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn test_parse_token_extracts_claims() {
        let token = make_token(serde_json::json!({
            "preferred_username": "12345678901",
            "email": "user@example.com",
            "name": "User Name",
            "phone_number": "5521999999999",
            "email_verified": true,
            "sub": "abc-123",
            "realm_access": { "roles": ["citizen"] }
        }));

        let info = parse_token(&token).unwrap();
        assert_eq!(info.cpf, "12345678901");
        assert_eq!(info.email, "user@example.com");
        assert_eq!(info.phone, "5521999999999");
        assert!(info.email_verified);
        assert_eq!(info.roles, vec!["citizen".to_string()]);
    }

    #[test]
    fn test_parse_token_strips_bearer_prefix() {
        let token = make_token(serde_json::json!({ "preferred_username": "111" }));
        let info = parse_token(&format!("Bearer {token}")).unwrap();
        assert_eq!(info.cpf, "111");
    }

    #[test]
    fn test_parse_token_rejects_malformed_input() {
        assert!(parse_token("not-a-token").is_err());
        assert!(parse_token("a.b").is_err());
        assert!(parse_token("a.!!!.c").is_err());
    }

    #[test]
    fn test_parse_token_tolerates_missing_claims() {
        let token = make_token(serde_json::json!({ "sub": "only-sub" }));
        let info = parse_token(&token).unwrap();
        assert_eq!(info.sub, "only-sub");
        assert!(info.cpf.is_empty());
        assert!(info.roles.is_empty());
    }
}
