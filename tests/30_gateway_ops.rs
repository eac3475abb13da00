mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use papo_doula_api::database::models::Role;
use papo_doula_api::database::ProfileStore;

#[tokio::test]
async fn update_user_is_idempotent() -> Result<()> {
    let app = common::spawn_app().await?;
    let body = json!({ "userId": app.assistant.id, "role": "admin", "active": false });

    for _ in 0..2 {
        let res = app.function("admin-update-user", Some(&app.admin.token), body.clone()).await?;
        assert_eq!(res.status(), StatusCode::OK);
        let reply: Value = res.json().await?;
        assert_eq!(reply["message"], "User updated successfully");
    }

    let profile = app.backend.store.find(app.assistant.id).await?.expect("profile");
    assert_eq!(profile.role, Role::Admin);
    assert!(!profile.active);
    Ok(())
}

#[tokio::test]
async fn update_user_validation() -> Result<()> {
    let app = common::spawn_app().await?;

    let res = app.function("admin-update-user", Some(&app.admin.token), json!({ "role": "admin" })).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let reply: Value = res.json().await?;
    assert_eq!(reply["error"], "userId is required");

    let res = app
        .function("admin-update-user", Some(&app.admin.token), json!({ "userId": app.client.id }))
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .function(
            "admin-update-user",
            Some(&app.admin.token),
            json!({ "userId": uuid::Uuid::new_v4(), "active": true }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn force_password_change_sets_the_flag() -> Result<()> {
    let app = common::spawn_app().await?;

    let res = app
        .function("admin-force-password-change", Some(&app.admin.token), json!({ "userId": app.client.id }))
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let profile = app.backend.store.find(app.client.id).await?.expect("profile");
    assert!(profile.must_change_password);
    Ok(())
}

#[tokio::test]
async fn reset_password_returns_a_recovery_link() -> Result<()> {
    let app = common::spawn_app().await?;

    let res = app
        .function("admin-reset-user-password", Some(&app.admin.token), json!({ "email": app.client.email }))
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let reply: Value = res.json().await?;
    assert!(reply["recoveryLink"].as_str().unwrap_or_default().contains("type=recovery"));

    let res = app.function("admin-reset-user-password", Some(&app.admin.token), json!({})).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let reply: Value = res.json().await?;
    assert_eq!(reply["error"], "User email is required");
    Ok(())
}

#[tokio::test]
async fn list_clients_reports_missing_email_as_empty() -> Result<()> {
    let app = common::spawn_app().await?;

    let res = app
        .http
        .post(app.url("/rest/v1/clients"))
        .bearer_auth(&app.assistant.token)
        .json(&json!({ "full_name": "Rita Sem Email", "phone": "(21) 97777-0000" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = app.function("admin-list-clients", Some(&app.admin.token), json!({})).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let rows: Vec<Value> = res.json().await?;
    assert_eq!(rows.len(), 2);
    // Newest first
    assert_eq!(rows[0]["full_name"], "Rita Sem Email");
    assert_eq!(rows[0]["email"], "");
    assert_eq!(rows[1]["email"], app.client.email);
    Ok(())
}

#[tokio::test]
async fn create_client_user_provisions_account_and_record() -> Result<()> {
    let app = common::spawn_app().await?;
    let body = json!({
        "email": "lucia@example.com",
        "password": "inicial123",
        "full_name": "Lúcia Lima",
        "dpp": "2031-05-20",
    });

    let res = app.function("admin-create-client-user", Some(&app.assistant.token), body).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let reply: Value = res.json().await?;
    assert_eq!(reply["message"], "Cliente criado com sucesso");

    assert!(app.backend.identity.user_exists("lucia@example.com").await);
    assert_eq!(app.backend.store.client_count().await, 2);

    let token = app.sign_in("lucia@example.com", "inicial123").await?;
    let res = app.http.get(app.url("/functions/v1/me")).bearer_auth(&token).send().await?;
    let profile: Value = res.json().await?;
    assert_eq!(profile["role"], "client");
    assert_eq!(profile["must_change_password"], true);
    Ok(())
}

#[tokio::test]
async fn create_client_user_requires_every_field() -> Result<()> {
    let app = common::spawn_app().await?;

    let res = app
        .function(
            "admin-create-client-user",
            Some(&app.admin.token),
            json!({ "email": "x@example.com", "password": "inicial123", "full_name": "X" }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let reply: Value = res.json().await?;
    assert_eq!(reply["error"], "Dados obrigatórios ausentes");
    assert!(!app.backend.identity.user_exists("x@example.com").await);
    Ok(())
}

#[tokio::test]
async fn failed_insert_rolls_back_the_identity() -> Result<()> {
    let app = common::spawn_app().await?;
    app.backend.store.set_fail_client_inserts(true);

    let res = app
        .function(
            "admin-create-client-user",
            Some(&app.admin.token),
            json!({ "email": "rollback@example.com", "password": "inicial123", "full_name": "R", "dpp": "2031-01-01" }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(!app.backend.identity.user_exists("rollback@example.com").await);
    assert_eq!(app.backend.store.client_count().await, 1);
    Ok(())
}

#[tokio::test]
async fn failed_rollback_is_a_server_error() -> Result<()> {
    let app = common::spawn_app().await?;
    app.backend.store.set_fail_client_inserts(true);
    app.backend.identity.set_fail_deletes(true);

    let res = app
        .function(
            "admin-create-client-user",
            Some(&app.admin.token),
            json!({ "email": "orphan@example.com", "password": "inicial123", "full_name": "O", "dpp": "2031-01-01" }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    // The orphaned identity is reported, not retried
    assert!(app.backend.identity.user_exists("orphan@example.com").await);
    Ok(())
}
