use std::sync::Arc;

use chrono::{Duration, Utc};
use starberry_token_gate::oauth_core::crypto::pkce_code_challenge;
use starberry_token_gate::oauth_core::types::{CodeTicket, DeviceTicket, RefreshTicket};
use starberry_token_gate::validator::{
    AuthorizationCodeValidator, DeviceCodeValidator, RefreshTokenValidator,
};
use starberry_token_gate::{
    AuthenticatedProfile, GateConfig, GrantType, InMemoryServiceRegistry, InMemoryTicketRegistry,
    RegisteredService, Rejection, StaticProfileResolver, TokenRequestContext,
    TokenRequestValidator, ValidatorServices, Verdict,
};

const VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
const CALLBACK: &str = "https://app.local/callback";

fn registry() -> Arc<InMemoryServiceRegistry> {
    Arc::new(InMemoryServiceRegistry::new(vec![
        RegisteredService::new("web")
            .service_id("https://app\\.local/.*")
            .grant_types(["authorization_code", "refresh_token"]),
        RegisteredService::new("spa")
            .service_id("https://app\\.local/.*")
            .grant_types(["authorization_code"]),
        RegisteredService::new("other").service_id("https://other\\.local/.*"),
        RegisteredService::new("tv").grant_types(["device_code"]),
    ]))
}

fn services(client: &str, tickets: &InMemoryTicketRegistry) -> ValidatorServices {
    let profiles = StaticProfileResolver::authenticated(AuthenticatedProfile::new(client));
    ValidatorServices::new(registry(), Arc::new(profiles)).tickets(Arc::new(tickets.clone()))
}

fn accepted(grant_type: GrantType, client_id: &str) -> Verdict {
    Verdict::Accepted { grant_type, client_id: client_id.into() }
}

fn missing(parameter: &str) -> Rejection {
    Rejection::InvalidRequest { parameter: parameter.into() }
}

fn code_ticket(code: &str, client_id: &str, challenge: Option<String>) -> CodeTicket {
    CodeTicket {
        code: code.into(),
        client_id: client_id.into(),
        redirect_uri: CALLBACK.into(),
        code_challenge_method: challenge.as_ref().map(|_| "S256".to_string()),
        code_challenge: challenge,
        expires_at: Utc::now() + Duration::minutes(5),
    }
}

fn code_request(code: &str, verifier: Option<&str>) -> TokenRequestContext {
    let mut params =
        vec![("grant_type", "authorization_code"), ("code", code), ("redirect_uri", CALLBACK)];
    if let Some(v) = verifier {
        params.push(("code_verifier", v));
    }
    TokenRequestContext::new(params)
}

fn invalid_grant(verdict: &Verdict) -> bool {
    matches!(verdict, Verdict::Rejected(Rejection::InvalidGrant { .. }))
}

#[tokio::test]
async fn authorization_code_with_pkce() {
    let tickets = InMemoryTicketRegistry::new();
    tickets.store_code(code_ticket("OC-1", "web", Some(pkce_code_challenge(VERIFIER)))).await;
    let validator = AuthorizationCodeValidator::new(services("web", &tickets));

    let verdict = validator.validate(&code_request("OC-1", Some(VERIFIER))).await.unwrap();
    assert_eq!(verdict, accepted(GrantType::AuthorizationCode, "web"));

    let ctx = code_request("OC-1", Some("not-the-verifier"));
    let verdict = validator.validate(&ctx).await.unwrap();
    assert!(invalid_grant(&verdict));

    let verdict = validator.validate(&code_request("OC-1", None)).await.unwrap();
    assert_eq!(verdict.rejection(), Some(&missing("code_verifier")));
}

#[tokio::test]
async fn authorization_code_rejections() {
    let tickets = InMemoryTicketRegistry::new();
    tickets.store_code(code_ticket("OC-web", "web", None)).await;
    tickets.store_code(code_ticket("OC-other", "other", None)).await;
    let mut expired = code_ticket("OC-old", "web", None);
    expired.expires_at = Utc::now() - Duration::seconds(1);
    tickets.store_code(expired).await;
    let validator = AuthorizationCodeValidator::new(services("web", &tickets));

    assert!(validator.validate(&code_request("OC-web", None)).await.unwrap().is_accepted());
    assert!(invalid_grant(&validator.validate(&code_request("OC-missing", None)).await.unwrap()));
    assert!(invalid_grant(&validator.validate(&code_request("OC-old", None)).await.unwrap()));
    assert!(invalid_grant(&validator.validate(&code_request("OC-other", None)).await.unwrap()));

    let ctx = TokenRequestContext::new([
        ("grant_type", "authorization_code"),
        ("code", "OC-web"),
        ("redirect_uri", "https://app.local/elsewhere"),
    ]);
    assert!(invalid_grant(&validator.validate(&ctx).await.unwrap()));

    let params = [("grant_type", "authorization_code"), ("redirect_uri", CALLBACK)];
    let ctx = TokenRequestContext::new(params);
    let verdict = validator.validate(&ctx).await.unwrap();
    assert_eq!(verdict.rejection(), Some(&missing("code")));
}

#[tokio::test]
async fn public_clients_can_be_required_to_use_pkce() {
    let tickets = InMemoryTicketRegistry::new();
    tickets.store_code(code_ticket("OC-spa", "spa", None)).await;

    let lenient = AuthorizationCodeValidator::new(services("spa", &tickets));
    assert!(lenient.validate(&code_request("OC-spa", None)).await.unwrap().is_accepted());

    let strict = AuthorizationCodeValidator::new(
        services("spa", &tickets).config(GateConfig::new().require_pkce_for_public_clients(true)),
    );
    assert!(invalid_grant(&strict.validate(&code_request("OC-spa", None)).await.unwrap()));
}

fn refresh_ticket(token: &str, client_id: &str) -> RefreshTicket {
    RefreshTicket {
        token: token.into(),
        client_id: client_id.into(),
        expires_at: Utc::now() + Duration::days(1),
        revoked: false,
    }
}

fn refresh_request(token: &str) -> TokenRequestContext {
    TokenRequestContext::new([("grant_type", "refresh_token"), ("refresh_token", token)])
}

#[tokio::test]
async fn refresh_token_ownership_and_revocation() {
    let tickets = InMemoryTicketRegistry::new();
    tickets.store_refresh_token(refresh_ticket("RT-1", "web")).await;
    tickets.store_refresh_token(refresh_ticket("RT-other", "other")).await;
    let mut expired = refresh_ticket("RT-old", "web");
    expired.expires_at = Utc::now() - Duration::seconds(1);
    tickets.store_refresh_token(expired).await;
    let validator = RefreshTokenValidator::new(services("web", &tickets));

    let verdict = validator.validate(&refresh_request("RT-1")).await.unwrap();
    assert_eq!(verdict, accepted(GrantType::RefreshToken, "web"));

    assert!(invalid_grant(&validator.validate(&refresh_request("RT-other")).await.unwrap()));
    assert!(invalid_grant(&validator.validate(&refresh_request("RT-old")).await.unwrap()));
    assert!(invalid_grant(&validator.validate(&refresh_request("RT-unknown")).await.unwrap()));

    assert!(tickets.revoke_refresh_token("RT-1").await);
    assert!(invalid_grant(&validator.validate(&refresh_request("RT-1")).await.unwrap()));

    let ctx = TokenRequestContext::new([("grant_type", "refresh_token")]);
    let verdict = validator.validate(&ctx).await.unwrap();
    assert_eq!(verdict.rejection(), Some(&missing("refresh_token")));
}

#[tokio::test]
async fn device_code_waits_for_approval() {
    let tickets = InMemoryTicketRegistry::new();
    tickets
        .store_device_code(DeviceTicket {
            device_code: "DC-1".into(),
            user_code: "WDJB-MJHT".into(),
            client_id: "tv".into(),
            approved: false,
            expires_at: Utc::now() + Duration::minutes(10),
        })
        .await;
    let validator = DeviceCodeValidator::new(services("tv", &tickets));
    let ctx = TokenRequestContext::new([("grant_type", "device_code"), ("device_code", "DC-1")]);

    let verdict = validator.validate(&ctx).await.unwrap();
    assert_eq!(verdict.rejection(), Some(&Rejection::AuthorizationPending));

    assert!(tickets.approve_device_code("WDJB-MJHT").await);
    let verdict = validator.validate(&ctx).await.unwrap();
    assert_eq!(verdict, accepted(GrantType::DeviceCode, "tv"));

    let unknown =
        TokenRequestContext::new([("grant_type", "device_code"), ("device_code", "DC-2")]);
    assert!(invalid_grant(&validator.validate(&unknown).await.unwrap()));
}

#[tokio::test]
async fn expired_device_code_is_invalid() {
    let tickets = InMemoryTicketRegistry::new();
    tickets
        .store_device_code(DeviceTicket {
            device_code: "DC-old".into(),
            user_code: "AAAA-BBBB".into(),
            client_id: "tv".into(),
            approved: true,
            expires_at: Utc::now() - Duration::seconds(1),
        })
        .await;
    let validator = DeviceCodeValidator::new(services("tv", &tickets));
    let ctx = TokenRequestContext::new([("grant_type", "device_code"), ("device_code", "DC-old")]);
    assert!(invalid_grant(&validator.validate(&ctx).await.unwrap()));
}
