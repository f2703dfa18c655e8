//! Domain views: per-subsystem projections of world state.
use std::collections::BTreeMap;

use bytes::Bytes;
use thiserror::Error;

use crate::snapshot::WorldState;

/// Error produced by a view hydrator; non-fatal to the tick.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HydrateError {
    /// The hydrator could not build views from the supplied state.
    #[error("view hydration failed: {0}")]
    Failed(String),
}

/// Named, opaque view payloads keyed by view name.
///
/// The engine never interprets view contents; it only merges derived
/// views over caller-supplied ones and forwards the result to the
/// performer hook.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct DomainViews {
    views: BTreeMap<String, Bytes>,
}

impl DomainViews {
    /// Creates an empty view set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a view.
    pub fn insert(&mut self, name: impl Into<String>, payload: Bytes) {
        self.views.insert(name.into(), payload);
    }

    /// Returns a view payload by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Bytes> {
        self.views.get(name)
    }

    /// Number of views present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// True when no view is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Iterates views in ascending name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Bytes)> {
        self.views.iter()
    }

    /// Merges `derived` into this set; on key collision the derived entry
    /// wins.
    pub fn merge_over(&mut self, derived: DomainViews) {
        for (name, payload) in derived.views {
            self.views.insert(name, payload);
        }
    }
}

/// Derives domain views from a post-mutation state.
///
/// Optional collaborator: when absent, the tick proceeds with whatever
/// views the caller supplied. Hydration failure is recorded as an alert
/// and is never fatal.
pub trait ViewHydrator {
    /// Builds views from `state` for the given tick.
    ///
    /// # Errors
    /// A [`HydrateError`] is logged and the existing views are kept.
    fn hydrate(&self, state: &WorldState, tick_id: u64) -> Result<DomainViews, HydrateError>;
}
