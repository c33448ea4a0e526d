//! Authorization-domain primitives: PKCE handshake material and secret wrappers.

pub mod pkce;
pub mod secret;

pub use pkce::*;
pub use secret::*;
