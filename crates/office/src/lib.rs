//! The office chat bus.
//!
//! [`OfficeChat`] keeps the ordered message log and fans messages out to
//! whole-message and streaming subscribers.

pub mod bus;
pub mod tee;

pub use bus::{OfficeChat, StreamSubscriber, Subscriber};
pub use tee::FragmentStream;
