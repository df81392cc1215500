//! Authenticated HTTP access to the ChurchMan API.

mod request;
mod session;

pub use request::{ApiResponse, Auth, Body, Credential};
pub use session::ApiClient;
pub(crate) use session::path_segment;
