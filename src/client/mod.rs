//! Client-side core: everything a front-end needs to talk to the backend.

pub mod address;
pub mod api;
pub mod form;
pub mod guard;
pub mod services;
pub mod session;
pub mod sign_in;

pub use address::{Address, AddressError, AddressLookup};
pub use api::{ApiClient, ApiClientError};
pub use form::{ClientForm, FormError};
pub use guard::{can_enter, decide, landing_for, navigate, Access, Navigation, Route};
pub use services::{
    AdminClientsService, ClientsService, NewClientUser, PortalService, ServiceError, UsersService,
};
pub use session::{
    AuthEvent, AuthEvents, AuthObserver, Session, SessionController, SessionState, SessionStore,
    Subscription,
};
pub use sign_in::{AuthService, SignInError};
