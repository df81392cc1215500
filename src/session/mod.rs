//! Client-side session: the single bearer token slot and the state derived from it.
//! Keep the public surface thin and split implementation across sub-modules.

mod backend;
mod claims;
mod state;
mod store;

pub use backend::{FileBackend, MemoryBackend, TokenBackend, TOKEN_KEY};
pub use claims::{decode_claims, TokenClaims};
pub use state::SessionState;
pub use store::{normalize, SessionStore};
