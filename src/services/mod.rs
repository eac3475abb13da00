pub mod profile_resolver;

pub use profile_resolver::{ProfileResolver, ResolveError, ResolveProfile};
