// handlers/protected/mod.rs - Self-service routes (/rest/v1/*)
//
// All routes here sit behind `middleware::require_profile`, so handlers receive
// an active `CurrentUser`. Client rows are scoped to `owner_id = caller`.

pub mod clients;
pub mod me;
pub mod password;
pub mod portal;

pub use me::me;
