//! Site settings adapters.
//!
//! The host application normally owns configuration storage and implements
//! `SiteSettings` itself; the in-memory adapter serves tests and the demo
//! binary.

mod in_memory;

pub use in_memory::InMemorySiteSettings;
