//! Management API: CRUD over baskets, captured requests and response
//! configuration, plus service stats and identity.

pub mod auth;
pub mod handlers;
pub mod router;
pub mod types;


pub use router::{dispatch_api, route_api};
