mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use papo_doula_api::database::models::Role;
use papo_doula_api::database::ProfileStore;
use papo_doula_api::identity::IdentityAdmin;

const FUNCTIONS: [&str; 6] = [
    "admin-list-users",
    "admin-update-user",
    "admin-reset-user-password",
    "admin-force-password-change",
    "admin-list-clients",
    "admin-create-client-user",
];

#[tokio::test]
async fn missing_bearer_is_401_whatever_the_body() -> Result<()> {
    let app = common::spawn_app().await?;

    for name in FUNCTIONS {
        for body in [json!({}), json!({ "userId": app.client.id, "role": "admin" })] {
            let res = app.function(name, None, body).await?;
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", name);
        }
    }

    // Malformed JSON is never looked at before the caller is known
    let res = app
        .http
        .post(app.url("/functions/v1/admin-update-user"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn invalid_token_is_401() -> Result<()> {
    let app = common::spawn_app().await?;

    let res = app.function("admin-list-users", Some("not-a-jwt"), json!({})).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Invalid JWT");
    Ok(())
}

#[tokio::test]
async fn role_outside_allow_list_is_403_and_changes_nothing() -> Result<()> {
    let app = common::spawn_app().await?;

    // A client trying to promote their own account
    let res = app
        .function(
            "admin-update-user",
            Some(&app.client.token),
            json!({ "userId": app.client.id, "role": "admin" }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Acesso negado");

    // Assistants are staff, but admin-only functions stay closed
    let res = app
        .function(
            "admin-force-password-change",
            Some(&app.assistant.token),
            json!({ "userId": app.client.id }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let profile = app.backend.store.find(app.client.id).await?.expect("client profile");
    assert_eq!(profile.role, Role::Client);
    assert!(!profile.must_change_password);
    Ok(())
}

#[tokio::test]
async fn staff_functions_admit_assistants() -> Result<()> {
    let app = common::spawn_app().await?;

    let res = app.function("admin-list-users", Some(&app.assistant.token), json!({})).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let users: Vec<Value> = res.json().await?;
    assert_eq!(users.len(), 4);

    let res = app.function("admin-list-clients", Some(&app.client.token), json!({})).await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn inactive_caller_is_rejected() -> Result<()> {
    let app = common::spawn_app().await?;

    let res = app.function("admin-list-users", Some(&app.inactive.token), json!({})).await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "User inactive");
    Ok(())
}

#[tokio::test]
async fn caller_without_profile_is_denied() -> Result<()> {
    let app = common::spawn_app().await?;

    assert!(app.backend.store.remove_profile(app.admin.id).await);
    let res = app.function("admin-list-users", Some(&app.admin.token), json!({})).await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn deleted_user_token_is_401_with_local_verification() -> Result<()> {
    let app = common::spawn_app().await?;
    let gateway = app.spawn_locally_verifying().await?;
    let call = |token: String| {
        let http = app.http.clone();
        let url = format!("{}/functions/v1/admin-list-users", gateway);
        async move { http.post(url).bearer_auth(token).json(&json!({})).send().await }
    };

    assert_eq!(call(app.admin.token.clone()).await?.status(), StatusCode::OK);

    app.backend.identity.delete_user(app.assistant.id).await?;
    let res = call(app.assistant.token.clone()).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Identity still there, profile gone: known caller without a role
    assert!(app.backend.store.remove_profile(app.admin.id).await);
    assert_eq!(call(app.admin.token.clone()).await?.status(), StatusCode::FORBIDDEN);
    Ok(())
}
