pub mod client;
pub mod profile;

pub use client::{Client, ClientFields, ClientPatch, ClientSummary, NewClient, DEFAULT_CLIENT_STATUS};
pub use profile::{Profile, ProfilePatch, Role, UnknownRole, UserSummary};
