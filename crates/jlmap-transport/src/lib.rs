//! Outbound script transport.
//!
//! A [`Transport`] turns an [`Envelope`] into concrete script text and hands
//! it to whatever [`ScriptExecutor`] the hosting toolkit supplies.

pub mod envelope;
pub mod executor;
pub mod syntax;
pub mod transport;

pub use envelope::Envelope;
pub use executor::{BlockingExecutor, MemoryExecutor, ScriptExecutor, ScriptFault};
pub use transport::{Deferred, Transport};
