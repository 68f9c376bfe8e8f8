//! OAuth2 grant type catalog.
//!
//! The set of grant types is closed: a raw `grant_type` value either matches
//! one of these (ignoring ASCII case) or the request is unsupported.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Grant types the token endpoint understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// Authorization code grant, RFC 6749 §4.1.
    AuthorizationCode,
    /// Resource Owner Password Credentials grant.
    Password,
    /// Client credentials grant.
    ClientCredentials,
    /// Refresh token grant.
    RefreshToken,
    /// Device authorization grant.
    DeviceCode,
}

const ALL_GRANT_TYPES: [GrantType; 5] = [
    GrantType::AuthorizationCode,
    GrantType::Password,
    GrantType::ClientCredentials,
    GrantType::RefreshToken,
    GrantType::DeviceCode,
];

impl GrantType {
    /// Canonical wire identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            GrantType::AuthorizationCode => "authorization_code",
            GrantType::Password => "password",
            GrantType::ClientCredentials => "client_credentials",
            GrantType::RefreshToken => "refresh_token",
            GrantType::DeviceCode => "device_code",
        }
    }

    /// Every grant type, in a stable order.
    pub fn all() -> &'static [GrantType] {
        &ALL_GRANT_TYPES
    }

    /// Whether `raw` names this grant type, ignoring ASCII case.
    pub fn matches(self, raw: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(raw)
    }

    /// Resolve a raw value against the full catalog.
    pub fn parse(raw: &str) -> Option<GrantType> {
        Self::all().iter().copied().find(|g| g.matches(raw))
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `raw` names `candidate`. A missing value never matches.
pub fn is_grant_type(raw: Option<&str>, candidate: GrantType) -> bool {
    raw.is_some_and(|r| candidate.matches(r))
}

/// Whether `raw` names any of `candidates`.
pub fn is_any_grant_type(raw: Option<&str>, candidates: &[GrantType]) -> bool {
    candidates.iter().any(|c| is_grant_type(raw, *c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_ignores_case() {
        assert!(is_grant_type(Some("Client_Credentials"), GrantType::ClientCredentials));
        assert!(is_grant_type(Some("REFRESH_TOKEN"), GrantType::RefreshToken));
        assert!(!is_grant_type(Some("refresh-token"), GrantType::RefreshToken));
        assert!(!is_grant_type(None, GrantType::Password));
    }

    #[test]
    fn any_of_candidates() {
        let code_flows = [GrantType::AuthorizationCode, GrantType::RefreshToken];
        assert!(is_any_grant_type(Some("refresh_TOKEN"), &code_flows));
        assert!(!is_any_grant_type(Some("password"), &code_flows));
        assert!(!is_any_grant_type(None, GrantType::all()));
        assert!(!is_any_grant_type(Some("password"), &[]));
    }

    #[test]
    fn parse_scans_whole_catalog() {
        for g in GrantType::all() {
            assert_eq!(GrantType::parse(&g.as_str().to_uppercase()), Some(*g));
        }
        assert_eq!(GrantType::parse("bogus_type"), None);
        assert_eq!(GrantType::parse(""), None);
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&GrantType::DeviceCode).unwrap();
        assert_eq!(json, "\"device_code\"");
        let back: GrantType = serde_json::from_str("\"authorization_code\"").unwrap();
        assert_eq!(back, GrantType::AuthorizationCode);
    }
}
