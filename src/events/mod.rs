//! # Events Module
//!
//! Event-driven progress reporting for intake runs.
//!
//! ## Design
//! The engine emits events through a channel after every unit of work,
//! allowing any front end to subscribe and display counters. Nothing in the
//! engine waits on a listener.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Classify(ClassifyEvent::Progress(c)) = event {
//!             println!("new {} | trashed {} | conflicts {}", c.registered, c.trashed, c.conflicts);
//!         }
//!     }
//! });
//!
//! intake.run_with_events(&sender, &CancellationToken::new())?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
