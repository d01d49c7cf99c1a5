use anyhow::Result;
use chrono::{TimeZone, Utc};
use serde_json::json;
use textock::{
    clients::{RecordStore, SortDirection, SortKey, records::RecordStoreClient},
    config::Config,
    models::{
        template::{NewTemplate, TemplatePatch},
        user::Session,
    },
};
use tokio::sync::watch;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path, query_param},
};

use crate::support::{OWNER_ID, draft, session};

fn row(id: &str, content: &str, variables: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "title": format!("Template {id}"),
        "content": content,
        "description": "",
        "category": "general",
        "tags": ["work"],
        "variables": variables,
        "is_public": false,
        "user_id": OWNER_ID,
        "created_at": "2024-05-01T09:00:00.123456+00:00",
        "updated_at": "2024-05-01T10:00:00+00:00",
        "isMarkdown": false
    })
}

fn client_for(server: &MockServer, session: Session) -> Result<RecordStoreClient> {
    let config = Config::for_backend(server.uri(), "anon-key");
    let (_tx, rx) = watch::channel(session);
    RecordStoreClient::new(&config, rx)
}

/// Test: Listing filters by owner and sorts by update time
#[tokio::test]
async fn test_list_filters_by_owner() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/templates"))
        .and(query_param("user_id", "eq.user-1"))
        .and(query_param("order", "updated_at.desc"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            row("t1", "Hi {{name}}", json!([{"name": "name", "type": "text", "required": true}])),
            row("t2", "Plain", json!([])),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, session())?;
    let templates = client
        .list(OWNER_ID, SortKey::UpdatedAt, SortDirection::Descending)
        .await?;

    assert_eq!(templates.len(), 2);
    assert_eq!(templates[0].id, "t1");
    assert_eq!(templates[0].variables[0].name, "name");
    assert_eq!(templates[0].tags, vec!["work"]);
    assert_eq!(
        templates[1].updated_at,
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    );

    Ok(())
}

/// Test: Insert sends derived variables and returns the stored row
#[tokio::test]
async fn test_insert_sends_derived_variables() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/templates"))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(json!({
            "title": "Greeting",
            "content": "Hi {{ name }}",
            "category": "general",
            "variables": [{"name": "name", "type": "text", "required": true}],
            "is_public": false,
            "user_id": OWNER_ID,
            "isMarkdown": false
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([row(
            "t-new",
            "Hi {{ name }}",
            json!([{"name": "name", "type": "text", "required": true}])
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, session())?;
    let record = NewTemplate::from_draft(&draft("Greeting", "Hi {{ name }}"), OWNER_ID);
    let stored = client.insert(&record).await?;

    assert_eq!(stored.id, "t-new");

    Ok(())
}

/// Test: A version-guarded update that matches nothing returns None
#[tokio::test]
async fn test_update_with_stale_version_matches_nothing() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/templates"))
        .and(query_param("id", "eq.t1"))
        .and(query_param("updated_at", "eq.2024-05-01T10:00:00Z"))
        .and(body_partial_json(json!({"title": "Renamed"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, session())?;
    let patch = TemplatePatch::new()
        .title("Renamed")
        .if_unmodified_since(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());

    assert!(client.update("t1", &patch).await?.is_none());

    Ok(())
}

/// Test: Content updates carry the recomputed variables
#[tokio::test]
async fn test_update_content_sends_variables() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/templates"))
        .and(query_param("id", "eq.t1"))
        .and(body_partial_json(json!({
            "content": "{{a}} and {{b}}",
            "variables": [
                {"name": "a", "type": "text", "required": true},
                {"name": "b", "type": "text", "required": true}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(
            "t1",
            "{{a}} and {{b}}",
            json!([{"name": "a"}, {"name": "b"}])
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, session())?;
    let updated = client
        .update("t1", &TemplatePatch::new().content("{{a}} and {{b}}"))
        .await?
        .expect("row returned");

    assert_eq!(updated.variables.len(), 2);
    assert!(updated.variables.iter().all(|v| v.required));

    Ok(())
}

/// Test: Delete targets the record by id
#[tokio::test]
async fn test_delete_by_id() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/templates"))
        .and(query_param("id", "eq.t1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, session())?;
    client.delete("t1").await?;

    Ok(())
}

/// Test: Error bodies become structured backend errors
#[tokio::test]
async fn test_error_body_is_structured() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/templates"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": "42501",
            "message": "permission denied for table templates"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, session())?;
    let err = client.delete("t1").await.unwrap_err();

    assert_eq!(err.message, "permission denied for table templates");
    assert_eq!(err.code.as_deref(), Some("42501"));

    Ok(())
}

/// Test: Without a session requests fall back to the anonymous key
#[tokio::test]
async fn test_signed_out_uses_anon_key() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/templates"))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Session::signed_out())?;
    let templates = client
        .list(OWNER_ID, SortKey::CreatedAt, SortDirection::Ascending)
        .await?;

    assert!(templates.is_empty());

    Ok(())
}
