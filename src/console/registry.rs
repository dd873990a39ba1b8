//! Console registry
//!
//! Hands out one shared console per [`ConsoleKind`], built on first use.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use super::{CommandConsole, Console, ConsoleKind, PassThroughConsole};
use crate::config::ConsoleConfig;
use crate::term::Backend;

type Factory = Box<dyn Fn(ConsoleKind) -> Arc<dyn Console> + Send + Sync>;

/// Lazily built, cached consoles keyed by kind
pub struct ConsoleRegistry {
    consoles: Mutex<HashMap<ConsoleKind, Arc<dyn Console>>>,
    factory: Factory,
}

impl Default for ConsoleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleRegistry {
    /// Registry building consoles on the real terminal with default settings
    pub fn new() -> Self {
        Self::with_config(ConsoleConfig::default())
    }

    /// Registry building consoles on the real terminal with `config`
    pub fn with_config(config: ConsoleConfig) -> Self {
        Self::with_factory(move |kind| -> Arc<dyn Console> {
            match kind {
                ConsoleKind::Command => {
                    Arc::new(CommandConsole::with_config(Backend::crossterm(), &config))
                }
                ConsoleKind::PassThrough => Arc::new(PassThroughConsole::stdio()),
            }
        })
    }

    /// Registry using a custom constructor
    pub fn with_factory(
        factory: impl Fn(ConsoleKind) -> Arc<dyn Console> + Send + Sync + 'static,
    ) -> Self {
        Self {
            consoles: Mutex::new(HashMap::new()),
            factory: Box::new(factory),
        }
    }

    /// The process-wide registry
    ///
    /// The first call fixes its configuration; later calls ignore `config`.
    pub fn global(config: impl FnOnce() -> ConsoleConfig) -> &'static ConsoleRegistry {
        static REGISTRY: OnceLock<ConsoleRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| Self::with_config(config()))
    }

    /// The console of `kind`, built on first request
    pub fn get(&self, kind: ConsoleKind) -> Arc<dyn Console> {
        let mut consoles = self.consoles.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            consoles
                .entry(kind)
                .or_insert_with(|| {
                    tracing::debug!(?kind, "building console");
                    (self.factory)(kind)
                }),
        )
    }

    /// Whether a console of `kind` has been built
    pub fn contains(&self, kind: ConsoleKind) -> bool {
        self.consoles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&kind)
    }
}
