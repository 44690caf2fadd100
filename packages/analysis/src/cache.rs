//! Process-lifetime store of route waypoints keyed by handle.
//!
//! Handles come from a monotonically increasing counter that is never
//! reset, so a handle is never reissued even after its entry has been
//! evicted. Entries are inserted fully built under the write lock; readers
//! never observe a partially written route.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use saferoute_analysis_models::{CachedRoute, RouteHandle, RouteWaypointSet};

use crate::AnalysisError;

/// Arena of cached routes.
///
/// Construct one per engine and share it with `Arc`; independent caches
/// never see each other's handles.
#[derive(Debug, Default)]
pub struct RouteCache {
    routes: RwLock<BTreeMap<RouteHandle, RouteWaypointSet>>,
    last_sequence: AtomicU64,
}

impl RouteCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `waypoints` under a fresh handle.
    pub fn put(&self, waypoints: RouteWaypointSet) -> RouteHandle {
        let sequence = self.last_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = RouteHandle::from_sequence(sequence);
        self.routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, waypoints);
        handle
    }

    /// Waypoints stored under `handle`.
    ///
    /// # Errors
    ///
    /// * If `handle` was never issued by this cache or has been evicted
    pub fn get(&self, handle: RouteHandle) -> Result<RouteWaypointSet, AnalysisError> {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&handle)
            .cloned()
            .ok_or(AnalysisError::HandleNotFound { handle })
    }

    /// Handles currently stored, in issue order.
    #[must_use]
    pub fn list(&self) -> Vec<RouteHandle> {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    /// Snapshot of every stored route, in issue order.
    #[must_use]
    pub fn entries(&self) -> Vec<CachedRoute> {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(&handle, waypoints)| CachedRoute {
                handle,
                waypoints: waypoints.clone(),
            })
            .collect()
    }

    /// Removes a single route. Returns whether it was present.
    pub fn evict(&self, handle: RouteHandle) -> bool {
        self.routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle)
            .is_some()
    }

    /// Removes every route and returns how many were removed.
    ///
    /// The handle counter is left untouched.
    pub fn evict_all(&self) -> usize {
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        let count = routes.len();
        routes.clear();
        drop(routes);
        log::debug!("Evicted {count} cached routes");
        count
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
