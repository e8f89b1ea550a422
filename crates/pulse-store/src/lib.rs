#![doc = include_str!("../README.md")]

pub mod config;
pub mod envelope;
pub mod error;
pub mod local;
pub mod provider;
pub mod tiered;
#[cfg(feature = "writer")]
pub mod writer;

pub use config::{StoreConfig, validate_key};
pub use envelope::EnvelopeStore;
pub use error::{Result, StoreError};
pub use local::LocalStore;
pub use provider::{KeyValueStore, MemoryStore};
pub use tiered::{LoadedSession, SessionStore, TieredStore};
#[cfg(feature = "writer")]
pub use writer::{DebouncedWriter, WriterConfig};
