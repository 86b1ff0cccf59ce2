// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback dispatch for device state updates.
//!
//! An [`UpdateDispatcher`] is a process-wide hub: any number of devices
//! notify it, any number of listeners subscribe to it, and subscriptions
//! are scoped to one device id. The poller notifies it exactly once per
//! successful refresh and whenever availability flips.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::config::DeviceId;
use crate::state::{Availability, DeviceState};

/// Unique identifier for a subscription.
///
/// Returned on registration and used to unsubscribe later. Ids are unique
/// for the lifetime of the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    #[must_use]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

/// Type alias for state update callbacks.
type UpdateCallback = Arc<dyn Fn(&DeviceState) + Send + Sync>;

/// Type alias for availability change callbacks.
type AvailabilityCallback = Arc<dyn Fn(Availability) + Send + Sync>;

/// Hub distributing device updates to registered callbacks.
///
/// Callbacks run synchronously on the notifying task in arbitrary order,
/// so they should be quick; anything slow belongs behind a channel. The
/// registry uses `parking_lot::RwLock` internally and is safe to share
/// across tasks behind an `Arc`.
pub struct UpdateDispatcher {
    /// Counter for generating unique subscription ids.
    next_id: AtomicU64,
    /// State update callbacks, each scoped to one device.
    update_callbacks: RwLock<HashMap<SubscriptionId, (DeviceId, UpdateCallback)>>,
    /// Availability change callbacks, each scoped to one device.
    availability_callbacks: RwLock<HashMap<SubscriptionId, (DeviceId, AvailabilityCallback)>>,
}

impl UpdateDispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            update_callbacks: RwLock::new(HashMap::new()),
            availability_callbacks: RwLock::new(HashMap::new()),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a callback for state updates of one device.
    ///
    /// The callback receives the fresh snapshot once per successful
    /// poll.
    pub fn on_updated<F>(&self, device: &DeviceId, callback: F) -> SubscriptionId
    where
        F: Fn(&DeviceState) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.update_callbacks
            .write()
            .insert(id, (device.clone(), Arc::new(callback)));
        id
    }

    /// Registers a callback for availability changes of one device.
    ///
    /// The callback fires only on transitions, not on every poll.
    pub fn on_availability_changed<F>(&self, device: &DeviceId, callback: F) -> SubscriptionId
    where
        F: Fn(Availability) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.availability_callbacks
            .write()
            .insert(id, (device.clone(), Arc::new(callback)));
        id
    }

    /// Unregisters a callback by its subscription id.
    ///
    /// Returns `true` if a callback was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        if self.update_callbacks.write().remove(&id).is_some() {
            return true;
        }
        if self.availability_callbacks.write().remove(&id).is_some() {
            return true;
        }
        false
    }

    /// Removes every registered callback.
    pub fn clear(&self) {
        self.update_callbacks.write().clear();
        self.availability_callbacks.write().clear();
    }

    /// Notifies update subscribers of one device with a fresh snapshot.
    pub(crate) fn notify_updated(&self, device: &DeviceId, state: &DeviceState) {
        let callbacks = self.update_callbacks.read();
        for (subscribed, callback) in callbacks.values() {
            if subscribed == device {
                callback(state);
            }
        }
    }

    /// Notifies availability subscribers of one device.
    pub(crate) fn notify_availability(&self, device: &DeviceId, availability: Availability) {
        let callbacks = self.availability_callbacks.read();
        for (subscribed, callback) in callbacks.values() {
            if subscribed == device {
                callback(availability);
            }
        }
    }

    /// Returns the total number of registered callbacks.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.update_callbacks.read().len() + self.availability_callbacks.read().len()
    }

    /// Returns `true` if there are no registered callbacks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callback_count() == 0
    }
}

impl Default for UpdateDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for UpdateDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateDispatcher")
            .field("callback_count", &self.callback_count())
            .finish()
    }
}
