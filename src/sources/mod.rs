//! Collaborator implementations
//!
//! - [`InMemoryStore`]: configuration, roster, reads and results held in memory

mod memory;

pub use memory::InMemoryStore;
