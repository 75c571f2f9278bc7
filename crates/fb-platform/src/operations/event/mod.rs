//! Event Operations
//!
//! Use cases for creating and deleting events.

mod create;
mod delete;

pub use create::{CreateEventCommand, CreateEventConfig, CreateEventUseCase, CreatedEvent};
pub use delete::DeleteEventUseCase;
