//! Operations Module
//!
//! Use cases following the Command pattern. Each use case receives its input
//! as a command plus an explicit [`ExecutionContext`] describing the caller,
//! and talks to the outside world only through repository and storage traits.
//!
//! # Example
//!
//! ```ignore
//! let command = CreateEventCommand::new("5v5 Run", SportType::Basketball, starts_at)
//!     .with_venue(NewVenue::new("Court A"));
//!
//! let created = create_event_use_case
//!     .execute(command, &ExecutionContext::authenticated(user))
//!     .await?;
//! println!("Created: {}", created.id);
//! ```

pub mod context;
pub mod event;

pub use context::ExecutionContext;
pub use event::*;
