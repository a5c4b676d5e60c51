//! World lookup supplied by the host.
//!
//! Stored rows only carry a world name. The host decides whether that world is
//! currently loaded; furnaces in unknown worlds are still returned, flagged with
//! `world_loaded = false`.

use std::collections::HashSet;

pub trait WorldLookup: Send + Sync {
    fn is_loaded(&self, world: &str) -> bool;
}

/// Treats every world name as loaded
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyWorld;

impl WorldLookup for AnyWorld {
    fn is_loaded(&self, _world: &str) -> bool {
        true
    }
}

/// Fixed set of loaded world names
#[derive(Debug, Clone, Default)]
pub struct KnownWorlds {
    names: HashSet<String>,
}

impl KnownWorlds {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl WorldLookup for KnownWorlds {
    fn is_loaded(&self, world: &str) -> bool {
        self.names.contains(world)
    }
}
