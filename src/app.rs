use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::config::Backend;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{apply_cors, preflight, require_profile};
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/health", get(public::health))
        // Gateway functions
        .merge(function_routes())
        // Self-service API
        .merge(rest_routes(&state));

    // Without a hosted platform the server answers the identity API itself
    if state.config.backend == Backend::Memory {
        router = router.merge(identity_routes());
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

fn identity_routes() -> Router<AppState> {
    use public::identity;

    Router::new()
        .route("/auth/v1/token", post(identity::token))
        .route(
            "/auth/v1/user",
            get(identity::get_user).put(identity::update_user),
        )
        .route("/auth/v1/logout", post(identity::logout))
}

fn function_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/functions/v1/me",
            get(protected::me).options(preflight),
        )
        .route(
            "/functions/v1/admin-list-users",
            post(elevated::admin_list_users).options(preflight),
        )
        .route(
            "/functions/v1/admin-update-user",
            post(elevated::admin_update_user).options(preflight),
        )
        .route(
            "/functions/v1/admin-reset-user-password",
            post(elevated::admin_reset_user_password).options(preflight),
        )
        .route(
            "/functions/v1/admin-force-password-change",
            post(elevated::admin_force_password_change).options(preflight),
        )
        .route(
            "/functions/v1/admin-list-clients",
            post(elevated::admin_list_clients).options(preflight),
        )
        .route(
            "/functions/v1/admin-create-client-user",
            post(elevated::admin_create_client_user).options(preflight),
        )
        .layer(middleware::map_response(apply_cors))
}

fn rest_routes(state: &AppState) -> Router<AppState> {
    use protected::{clients, password, portal};

    Router::new()
        .route("/rest/v1/clients", get(clients::list).post(clients::create))
        .route(
            "/rest/v1/clients/:id",
            get(clients::show)
                .patch(clients::update)
                .delete(clients::delete),
        )
        .route("/rest/v1/profile/password", post(password::change_password))
        .route("/rest/v1/portal", get(portal::overview))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_profile))
        .layer(rest_cors(&state.config.security.cors_origins))
}

fn rest_cors(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::state::MemoryBackend;

    fn router() -> Router {
        let config = AppConfig::development();
        let backend = MemoryBackend::new("router-test-secret", 1);
        app(backend.state(config))
    }

    #[tokio::test]
    async fn health_is_public() {
        let res = router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn gateway_preflight_is_no_content() {
        let res = router()
            .oneshot(
                Request::options("/functions/v1/admin-create-client-user")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert_eq!(res.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn rest_routes_need_a_bearer() {
        let res = router()
            .oneshot(Request::get("/rest/v1/clients").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Missing Authorization header");
    }

    #[tokio::test]
    async fn memory_backend_serves_the_identity_subset() {
        let res = router()
            .oneshot(
                Request::post("/auth/v1/token?grant_type=refresh_token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
