//! Request middleware.

pub mod session;

pub use session::{AuthSession, session_middleware};
