//! Attempt persistence
//!
//! The only persisted state is the append-only attempt journal.

pub mod journal;

pub use journal::{AttemptJournal, AttemptRecord, JournalError, TAIL_LINES};
