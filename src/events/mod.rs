//! # Events Module
//!
//! Event-driven progress reporting for the GUI shell.
//!
//! ## Design
//! The core library emits events through channels, allowing any UI to
//! subscribe and display batch progress, rollbacks and stranded files.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         match event {
//!             Event::Batch(BatchEvent::Committed { target, .. }) => {
//!                 println!("-> {}", target.display())
//!             }
//!             Event::Batch(BatchEvent::Stranded { temp_path, .. }) => {
//!                 eprintln!("recover {}", temp_path.display())
//!             }
//!             _ => {}
//!         }
//!     }
//! });
//!
//! let renamer = Renamer::builder().events(sender).build();
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
