// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state tracking.
//!
//! The cached state of a device is its raw datapoint snapshot plus the
//! bookkeeping around it: whether the device answered its last poll and
//! when. Interpretation of the datapoints is left to the entity
//! translators, which read snapshots taken from here.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::dps::{DpsId, DpsMap, DpsValue};

/// Reachability of a device as observed by the poller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Availability {
    /// No poll has completed yet.
    #[default]
    Unknown,
    /// The last poll succeeded.
    Available,
    /// The last poll failed; cached datapoints are stale.
    Unavailable,
}

impl Availability {
    /// Returns true if the last poll succeeded.
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::Available => "available",
            Self::Unavailable => "unavailable",
        };
        write!(f, "{s}")
    }
}

/// Cached state of a Tuya device.
///
/// Holds the datapoint snapshot from the most recent successful poll.
/// When the device stops answering, the snapshot is kept as-is and only
/// [`availability`](DeviceState::availability) flips, so readers can keep
/// showing the last known values.
///
/// # Examples
///
/// ```
/// use loctuya_lib::state::{Availability, DeviceState};
///
/// let state = DeviceState::new();
/// assert_eq!(state.availability(), Availability::Unknown);
/// assert!(state.dps().is_empty());
/// assert!(state.refreshed_at().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceState {
    dps: DpsMap,
    availability: Availability,
    refreshed_at: Option<DateTime<Utc>>,
}

impl DeviceState {
    /// Creates an empty state with no datapoints and unknown availability.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached datapoint snapshot.
    #[must_use]
    pub fn dps(&self) -> &DpsMap {
        &self.dps
    }

    /// Returns the value of a single datapoint, if ever observed.
    #[must_use]
    pub fn get(&self, id: DpsId) -> Option<&DpsValue> {
        self.dps.get(id)
    }

    /// Returns the device's availability.
    #[must_use]
    pub fn availability(&self) -> Availability {
        self.availability
    }

    /// Returns true if the last poll succeeded.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.availability.is_available()
    }

    /// Returns when the snapshot was last refreshed from the device.
    #[must_use]
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    fn replace_dps(&mut self, dps: DpsMap) {
        self.dps = dps;
        self.availability = Availability::Available;
        self.refreshed_at = Some(Utc::now());
    }

    fn mark_unavailable(&mut self) {
        self.availability = Availability::Unavailable;
    }
}

/// Shared handle to a device's cached state.
///
/// Cloning the handle is cheap; all clones observe the same state. The
/// poller is the only writer, so readers never see a half-applied
/// snapshot.
#[derive(Debug, Clone, Default)]
pub struct StateHandle {
    inner: Arc<RwLock<DeviceState>>,
}

impl StateHandle {
    /// Creates a handle around an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a point-in-time copy of the full state.
    #[must_use]
    pub fn snapshot(&self) -> DeviceState {
        self.inner.read().clone()
    }

    /// Returns the current availability.
    #[must_use]
    pub fn availability(&self) -> Availability {
        self.inner.read().availability()
    }

    /// Returns true if the last poll succeeded.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.inner.read().is_available()
    }

    /// Returns the value of a single datapoint, if ever observed.
    #[must_use]
    pub fn get(&self, id: DpsId) -> Option<DpsValue> {
        self.inner.read().get(id).cloned()
    }

    /// Installs a fresh snapshot and marks the device available.
    ///
    /// Returns the state as it now stands, for handing to the entity
    /// translators without re-locking.
    pub(crate) fn replace_dps(&self, dps: DpsMap) -> DeviceState {
        let mut guard = self.inner.write();
        guard.replace_dps(dps);
        guard.clone()
    }

    /// Marks the device unavailable, keeping the stale snapshot.
    pub(crate) fn mark_unavailable(&self) {
        self.inner.write().mark_unavailable();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_unknown_and_empty() {
        let handle = StateHandle::new();
        assert_eq!(handle.availability(), Availability::Unknown);
        assert!(!handle.is_available());
        let snap = handle.snapshot();
        assert!(snap.dps().is_empty());
        assert!(snap.refreshed_at().is_none());
    }

    #[test]
    fn replace_marks_available_and_timestamps() {
        let handle = StateHandle::new();
        let mut dps = DpsMap::new();
        dps.insert(DpsId::new(1).unwrap(), true);

        let before = Utc::now();
        let snap = handle.replace_dps(dps);
        assert_eq!(snap.availability(), Availability::Available);
        assert!(snap.is_available());
        // The stamp is taken from the wall clock at replace time
        let stamp = snap.refreshed_at().unwrap();
        assert!(stamp >= before);
        assert!(stamp <= Utc::now());
        assert_eq!(
            snap.get(DpsId::new(1).unwrap()).and_then(|v| v.as_bool()),
            Some(true)
        );
    }

    #[test]
    fn mark_unavailable_keeps_stale_snapshot() {
        let handle = StateHandle::new();
        let mut dps = DpsMap::new();
        dps.insert(DpsId::new(7).unwrap(), 42u8);
        handle.replace_dps(dps);

        handle.mark_unavailable();

        let snap = handle.snapshot();
        assert_eq!(snap.availability(), Availability::Unavailable);
        assert!(!snap.is_available());
        // Last known values survive the outage
        assert_eq!(
            snap.get(DpsId::new(7).unwrap()).and_then(|v| v.as_i64()),
            Some(42)
        );
        assert!(snap.refreshed_at().is_some());
    }

    #[test]
    fn snapshot_is_isolated_from_later_writes() {
        let handle = StateHandle::new();
        let mut dps = DpsMap::new();
        dps.insert(DpsId::new(1).unwrap(), false);
        let before = handle.replace_dps(dps);

        let mut dps = DpsMap::new();
        dps.insert(DpsId::new(1).unwrap(), true);
        handle.replace_dps(dps);

        assert_eq!(
            before.get(DpsId::new(1).unwrap()).and_then(|v| v.as_bool()),
            Some(false)
        );
        assert_eq!(
            handle.get(DpsId::new(1).unwrap()).and_then(|v| v.as_bool()),
            Some(true)
        );
    }

    #[test]
    fn clones_share_state() {
        let handle = StateHandle::new();
        let clone = handle.clone();

        let mut dps = DpsMap::new();
        dps.insert(DpsId::new(2).unwrap(), "white");
        handle.replace_dps(dps);

        assert!(clone.is_available());
        let value = clone.get(DpsId::new(2).unwrap()).unwrap();
        assert_eq!(value.as_str(), Some("white"));
    }

    #[test]
    fn availability_display() {
        assert_eq!(Availability::Unknown.to_string(), "unknown");
        assert_eq!(Availability::Available.to_string(), "available");
        assert_eq!(Availability::Unavailable.to_string(), "unavailable");
    }
}
