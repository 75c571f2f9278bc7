//! Domain Models
//!
//! Events, venues, posters and the identities that own them.

pub mod event;
pub mod poster;
pub mod sport;
pub mod user;

pub use event::*;
pub use poster::*;
pub use sport::*;
pub use user::*;
