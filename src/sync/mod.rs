//! Live List Synchronizer
//!
//! Keeps a local mirror of one category's shopping items, and its
//! rendered view, consistent with the server through a change stream.

mod event;
mod mirror;
mod synchronizer;

#[cfg(test)]
mod tests;

pub use event::ChangeEvent;
pub use mirror::{Mirror, RECENT_LIMIT};
pub use synchronizer::LiveListSynchronizer;
