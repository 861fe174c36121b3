//! Runtime session
//!
//! Single owner of the two foundational services. There are no ambient
//! globals: the engine shell constructs one `Runtime` at startup, passes it
//! to whatever needs streams or events, and drops it at shutdown.
//!
//! Default backend chain, in registration (= priority) order:
//! 1. memory (`mem@` namespace)
//! 2. archive (mounted packs)
//! 3. filesystem (catch-all)

use crate::config::{ConfigError, RuntimeConfig};
use crate::diag::{ConsoleSink, DiagnosticSink};
use crate::event::EventBus;
use crate::vfs::{
    AccessMode, ArchiveFactory, FileFactory, MemoryFactory, PackError, PackFile, PackMounts,
    ResolveError, Stream, StreamResolver,
};
use std::fmt;
use std::path::Path;

/// Startup failures
#[derive(Debug)]
pub enum RuntimeError {
    Config(ConfigError),
    Pack(PackError),
}

impl From<ConfigError> for RuntimeError {
    fn from(e: ConfigError) -> Self {
        RuntimeError::Config(e)
    }
}

impl From<PackError> for RuntimeError {
    fn from(e: PackError) -> Self {
        RuntimeError::Pack(e)
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::Config(e) => write!(f, "config error: {}", e),
            RuntimeError::Pack(e) => write!(f, "pack error: {}", e),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// The engine runtime: resource streams + event dispatch
pub struct Runtime {
    resolver: StreamResolver,
    events: EventBus,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Default chain, no packs mounted, console diagnostics
    pub fn new() -> Self {
        Self::assemble(PackMounts::new(), None, Box::new(ConsoleSink::new()))
    }

    /// Build from a parsed config, console diagnostics
    pub fn from_config(config: &RuntimeConfig) -> Result<Self, RuntimeError> {
        Self::build(config, Box::new(ConsoleSink::new()))
    }

    /// Load a config file and build from it
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self, RuntimeError> {
        let config = crate::config::load_config(path)?;
        Self::from_config(&config)
    }

    /// Build with an explicit diagnostic sink
    pub fn build(
        config: &RuntimeConfig,
        diag: Box<dyn DiagnosticSink>,
    ) -> Result<Self, RuntimeError> {
        let mut mounts = PackMounts::new();
        for pack_path in &config.packs {
            mounts.mount(PackFile::load(pack_path)?);
        }
        Ok(Self::assemble(mounts, config.data_dir.as_deref(), diag))
    }

    /// Wire the default chain around the given mounts
    fn assemble(mounts: PackMounts, data_dir: Option<&str>, diag: Box<dyn DiagnosticSink>) -> Self {
        let mut resolver = StreamResolver::new(diag);

        // Registration order is chain priority; keep the catch-all last.
        resolver.register(Box::new(MemoryFactory::new()));
        resolver.register(Box::new(ArchiveFactory::new(Box::new(mounts))));

        let file_factory = match data_dir {
            Some(dir) => FileFactory::with_base_dir(dir),
            None => FileFactory::new(),
        };
        resolver.register(Box::new(file_factory));

        Self {
            resolver,
            events: EventBus::new(),
        }
    }

    /// Resolve a logical path to a stream
    pub fn open(&self, path: &str, mode: AccessMode) -> Result<Stream, ResolveError> {
        self.resolver.open(path, mode)
    }

    /// Drain the event bus; call once per engine tick
    pub fn tick(&mut self) {
        self.events.process();
    }

    pub fn resolver(&self) -> &StreamResolver {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut StreamResolver {
        &mut self.resolver
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }
}
