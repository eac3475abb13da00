// handlers/elevated/mod.rs - Privileged gateway functions (/functions/v1/*)
//
// Every handler goes through `middleware::gateway::run_privileged`: the caller's
// token is verified with the non-privileged identity capability, the role is
// checked against the function's allow-list, and only then does the handler
// touch the elevated identity admin or the stores.

pub mod clients;
pub mod users;

pub use clients::{admin_create_client_user, admin_list_clients};
pub use users::{
    admin_force_password_change, admin_list_users, admin_reset_user_password, admin_update_user,
};
