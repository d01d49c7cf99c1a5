use anyhow::Result;
use serde_json::json;
use textock::{
    clients::{AuthService, auth::AuthClient},
    config::Config,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

fn client_for(server: &MockServer) -> Result<AuthClient> {
    AuthClient::new(&Config::for_backend(server.uri(), "anon-key"))
}

/// Test: Signing in publishes the new session to subscribers
#[tokio::test]
async fn test_sign_in_publishes_session() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", "anon-key"))
        .and(body_json(json!({"email": "ada@example.com", "password": "hunter22"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "token-1",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh-1",
            "user": {"id": "u1", "email": "ada@example.com", "role": "authenticated"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server)?;
    let mut updates = client.subscribe();
    assert!(updates.borrow().loading);

    let user = client.sign_in("ada@example.com", "hunter22").await?;
    assert_eq!(user.id, "u1");

    assert!(updates.has_changed()?);
    let session = updates.borrow_and_update().clone();
    assert_eq!(session.user_id(), Some("u1"));
    assert_eq!(session.access_token(), Some("token-1"));
    assert!(!session.loading);

    Ok(())
}

/// Test: Rejected credentials surface the auth error and keep the session
#[tokio::test]
async fn test_sign_in_rejected() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server)?;
    let err = client.sign_in("ada@example.com", "wrong").await.unwrap_err();

    assert_eq!(err.message, "Invalid login credentials");
    assert_eq!(err.code.as_deref(), Some("invalid_grant"));
    assert!(!client.session().is_authenticated());

    Ok(())
}

/// Test: A stored token is resolved to the current user
#[tokio::test]
async fn test_current_user_with_token() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer stored-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u1",
            "email": "ada@example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server)?.with_access_token("stored-token");
    assert!(client.session().loading);

    let user = client.current_user().await?;

    assert_eq!(user.map(|u| u.id).as_deref(), Some("u1"));
    assert!(client.session().is_authenticated());
    assert!(!client.session().loading);

    Ok(())
}

/// Test: An expired token clears the session instead of failing
#[tokio::test]
async fn test_current_user_with_expired_token() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": 401,
            "msg": "invalid JWT"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server)?.with_access_token("expired");

    assert!(client.current_user().await?.is_none());
    assert!(client.session().access_token().is_none());
    assert!(!client.session().loading);

    Ok(())
}

/// Test: Without a token no request is made and the user is signed out
#[tokio::test]
async fn test_current_user_without_token() -> Result<()> {
    let server = MockServer::start().await;
    let client = client_for(&server)?;

    assert!(client.current_user().await?.is_none());
    assert!(!client.session().loading);
    assert!(server.received_requests().await.unwrap_or_default().is_empty());

    Ok(())
}

/// Test: Sign-up that needs confirmation does not sign in
#[tokio::test]
async fn test_sign_up_pending_confirmation() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u2",
            "email": "new@example.com",
            "confirmation_sent_at": "2024-05-01T10:00:00Z"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server)?;

    assert!(client.sign_up("new@example.com", "secret123").await?.is_none());
    assert!(!client.session().is_authenticated());

    Ok(())
}

/// Test: Sign-up with an immediate session signs the user in
#[tokio::test]
async fn test_sign_up_with_session() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "token-2",
            "user": {"id": "u2", "email": "new@example.com"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server)?;
    let user = client.sign_up("new@example.com", "secret123").await?;

    assert_eq!(user.map(|u| u.email).as_deref(), Some("new@example.com"));
    assert_eq!(client.session().access_token(), Some("token-2"));

    Ok(())
}

/// Test: Sign-out drops the session even when the server call fails
#[tokio::test]
async fn test_sign_out_always_clears_session() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer token-3"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server)?.with_access_token("token-3");
    client.sign_out().await?;

    let session = client.session();
    assert!(!session.is_authenticated());
    assert!(session.access_token().is_none());

    Ok(())
}
