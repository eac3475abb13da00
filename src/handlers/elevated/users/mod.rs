// handlers/elevated/users/mod.rs - Staff and user management functions

mod force_password_change;
mod list;
mod reset_password;
mod update;

pub use force_password_change::admin_force_password_change;
pub use list::admin_list_users;
pub use reset_password::admin_reset_user_password;
pub use update::admin_update_user;
