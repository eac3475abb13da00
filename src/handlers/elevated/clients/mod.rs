// handlers/elevated/clients/mod.rs - Client provisioning functions

mod create_user;
mod list;

pub use create_user::admin_create_client_user;
pub use list::admin_list_clients;
