//! `campease-auth`: pure route-access boundary for the CampEase client.
//!
//! No HTTP, storage or navigation here: callers hand in a path, a session
//! snapshot and the current time, and get a decision back.

pub mod claims;
pub mod guard;
pub mod identity;
pub mod policy;
pub mod roles;
pub mod route;
pub mod session;
pub mod token;

pub use claims::{TokenClaims, TokenValidationError, validate_claims};
pub use guard::{AccessState, ClearReason, Decision, GuardOutcome, Notice, RouteGuard, SessionAction};
pub use identity::Identity;
pub use policy::{PolicyError, RoutePolicy, RoutePolicyBuilder};
pub use roles::Role;
pub use route::RoutePattern;
pub use session::SessionSnapshot;
pub use token::{Hs256Decoder, Hs256Encoder, TokenDecoder, TokenError, UnverifiedDecoder};
