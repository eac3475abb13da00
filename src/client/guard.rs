//! Route Guard: synchronous navigation decisions over a session snapshot.

use serde::Serialize;

use crate::client::session::{SessionState, SessionStore};
use crate::database::models::{Profile, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Access {
    Public,
    /// Any signed-in, active profile
    Authenticated,
    Roles(&'static [Role]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Route {
    pub path: &'static str,
    pub access: Access,
}

impl Route {
    pub const LOGIN: Route = Route { path: "/login", access: Access::Public };
    pub const CHANGE_PASSWORD: Route = Route { path: "/change-password", access: Access::Authenticated };

    pub const ADMIN_DASHBOARD: Route = Route { path: "/admin/dashboard", access: Access::Roles(Role::STAFF) };
    pub const ADMIN_CLIENTS: Route = Route { path: "/admin/clients", access: Access::Roles(Role::STAFF) };
    pub const ADMIN_USERS: Route = Route { path: "/admin/users", access: Access::Roles(Role::STAFF) };
    pub const ADMIN_AGENDA: Route = Route { path: "/admin/agenda", access: Access::Roles(Role::STAFF) };
    pub const ADMIN_FINANCE: Route = Route { path: "/admin/finance", access: Access::Roles(Role::STAFF) };

    pub const CLIENT_HOME: Route = Route { path: "/client/home", access: Access::Roles(Role::CLIENT_ONLY) };
    pub const CLIENT_AGENDA: Route = Route { path: "/client/agenda", access: Access::Roles(Role::CLIENT_ONLY) };
    pub const CLIENT_PROFILE: Route = Route { path: "/client/profile", access: Access::Roles(Role::CLIENT_ONLY) };

    pub const ALL: [Route; 10] = [
        Route::LOGIN,
        Route::CHANGE_PASSWORD,
        Route::ADMIN_DASHBOARD,
        Route::ADMIN_CLIENTS,
        Route::ADMIN_USERS,
        Route::ADMIN_AGENDA,
        Route::ADMIN_FINANCE,
        Route::CLIENT_HOME,
        Route::CLIENT_AGENDA,
        Route::CLIENT_PROFILE,
    ];

    /// Look up a path; section roots go to their default page and anything
    /// unknown falls back to the login page
    pub fn find(path: &str) -> Route {
        let path = path.trim_end_matches('/');
        match path {
            "/admin" => Route::ADMIN_DASHBOARD,
            "/client" => Route::CLIENT_HOME,
            _ => Route::ALL
                .into_iter()
                .find(|r| r.path == path)
                .unwrap_or(Route::LOGIN),
        }
    }
}

/// Where a freshly signed-in user lands
pub fn landing_for(profile: &Profile) -> Route {
    if profile.must_change_password {
        return Route::CHANGE_PASSWORD;
    }
    match profile.role {
        Role::Admin | Role::Assistant => Route::ADMIN_DASHBOARD,
        Role::Client => Route::CLIENT_HOME,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Session still loading; ask again once it settles
    Pending,
    Enter,
    Redirect(Route),
}

/// Decide over a snapshot. A wrong role is sent to sign-in, never to a
/// "forbidden" page.
pub fn decide(route: &Route, state: &SessionState) -> Navigation {
    if route.access == Access::Public {
        return Navigation::Enter;
    }

    let session = match state {
        SessionState::Loading => return Navigation::Pending,
        SessionState::Unauthenticated => return Navigation::Redirect(Route::LOGIN),
        SessionState::Authenticated(session) => session,
    };

    match route.access {
        Access::Public | Access::Authenticated => Navigation::Enter,
        Access::Roles(allowed) if allowed.contains(&session.profile.role) => Navigation::Enter,
        Access::Roles(_) => Navigation::Redirect(Route::LOGIN),
    }
}

pub fn can_enter(route: &Route, state: &SessionState) -> bool {
    decide(route, state) == Navigation::Enter
}

/// Like [`decide`], waiting for the store to leave `Loading` first
pub async fn navigate(route: &Route, store: &SessionStore) -> Navigation {
    let state = store.settled().await;
    decide(route, &state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::session::Session;
    use crate::identity::Principal;
    use chrono::Utc;
    use uuid::Uuid;

    fn signed_in(role: Role, must_change_password: bool) -> SessionState {
        let id = Uuid::new_v4();
        SessionState::Authenticated(Session {
            principal: Principal {
                id,
                email: "x@example.com".to_string(),
                access_token: "t".to_string(),
            },
            profile: Profile {
                id,
                full_name: None,
                email: "x@example.com".to_string(),
                role,
                active: true,
                must_change_password,
                created_at: Utc::now(),
            },
        })
    }

    #[test]
    fn client_is_sent_to_login_from_admin_routes() {
        let state = signed_in(Role::Client, false);
        assert_eq!(
            decide(&Route::ADMIN_USERS, &state),
            Navigation::Redirect(Route::LOGIN)
        );
        assert!(can_enter(&Route::CLIENT_HOME, &state));
        assert!(can_enter(&Route::CHANGE_PASSWORD, &state));
    }

    #[test]
    fn staff_roles_share_admin_routes() {
        assert!(can_enter(&Route::ADMIN_CLIENTS, &signed_in(Role::Assistant, false)));
        assert!(can_enter(&Route::ADMIN_FINANCE, &signed_in(Role::Admin, false)));
        assert!(!can_enter(&Route::CLIENT_HOME, &signed_in(Role::Admin, false)));
    }

    #[test]
    fn unauthenticated_and_loading() {
        assert_eq!(
            decide(&Route::CHANGE_PASSWORD, &SessionState::Unauthenticated),
            Navigation::Redirect(Route::LOGIN)
        );
        assert_eq!(decide(&Route::ADMIN_DASHBOARD, &SessionState::Loading), Navigation::Pending);
        assert!(can_enter(&Route::LOGIN, &SessionState::Loading));
    }

    #[test]
    fn find_and_landing() {
        assert_eq!(Route::find("/admin/"), Route::ADMIN_DASHBOARD);
        assert_eq!(Route::find("/client/agenda"), Route::CLIENT_AGENDA);
        assert_eq!(Route::find("/nowhere"), Route::LOGIN);

        let SessionState::Authenticated(session) = signed_in(Role::Client, true) else {
            unreachable!()
        };
        assert_eq!(landing_for(&session.profile), Route::CHANGE_PASSWORD);
    }
}
