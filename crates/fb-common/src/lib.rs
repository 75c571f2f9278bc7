//! Fastbreak Common
//!
//! Types shared by the platform library and its binaries:
//! - `ActionResponse`, the success/error envelope every operation answers with
//! - Logging bootstrap for `tracing`

pub mod logging;
pub mod response;

pub use logging::{init_tracing, LogFormat};
pub use response::ActionResponse;
