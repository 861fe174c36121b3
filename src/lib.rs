//! STRATA-CORE: runtime core for the STRATA engine
//!
//! The two foundational services everything else in the engine leans on:
//! - Layered resource streams: logical path + access mode in, byte stream
//!   out, resolved through a chain of backends (memory, packed archives,
//!   plain filesystem)
//! - Event dispatch: a deferred fan-out bus drained once per tick
//!
//! Console commands, script bindings, entity debug toggles and the loader
//! shell live in their own crates and call in through [`Runtime`].
//!
//! Both services are single-threaded and synchronous by design; drive them
//! from the engine thread.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod diag;
pub mod event;
pub mod runtime;
pub mod vfs;

pub use config::{load_config, load_config_from_str, ConfigError, RuntimeConfig};
pub use diag::{ConsoleSink, DiagnosticSink, MemorySink, Severity};
pub use event::{Event, EventBus, EventCtx, EventPayload, EventSource, ListenerId};
pub use runtime::{Runtime, RuntimeError};
pub use vfs::{
    AccessMode, ArchiveFactory, FileFactory, MemoryFactory, PackError, PackFile, PackMounts,
    ResolveError, ResourceManager, Stream, StreamFactory, StreamRequest, StreamResolver,
};
