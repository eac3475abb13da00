// handlers/public/mod.rs - Routes without authentication

pub mod health;
pub mod identity;

pub use health::health;
