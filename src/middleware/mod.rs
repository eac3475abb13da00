pub mod auth;
pub mod gateway;

pub use auth::{extract_bearer_token, require_profile, CurrentUser};
pub use gateway::{apply_cors, authorize, parse_body, preflight, run_privileged, Caller};
