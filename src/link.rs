// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport abstraction for reaching a Tuya device on the local network.
//!
//! Everything above this trait works purely on datapoint maps, so the
//! actual wire protocol (native Tuya 3.x TCP, a bridge daemon, or an
//! in-memory fake in tests) stays pluggable.

use crate::dps::{DpsId, DpsMap, DpsValue};
use crate::error::TransportError;

/// Trait for transports that exchange datapoint maps with one device.
///
/// Implementations are expected to be cheap to call repeatedly; the
/// poller invokes [`fetch_status`](DeviceLink::fetch_status) on every
/// poll tick and wraps it in its own timeout.
#[allow(async_fn_in_trait)]
pub trait DeviceLink {
    /// Fetches the device's full datapoint snapshot.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the device cannot be reached or the
    /// response cannot be understood.
    async fn fetch_status(&self) -> Result<DpsMap, TransportError>;

    /// Writes a batch of datapoints in a single request.
    ///
    /// # Arguments
    ///
    /// * `dps` - The datapoints to set, applied atomically by the device
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the write does not reach the device.
    async fn write(&self, dps: DpsMap) -> Result<(), TransportError>;

    /// Writes a single datapoint.
    ///
    /// Some firmware revisions reject batched writes for sequenced
    /// settings, so callers that need ordering issue singles through
    /// this method. The default implementation forwards to
    /// [`write`](DeviceLink::write).
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the write does not reach the device.
    async fn write_one(&self, id: DpsId, value: DpsValue) -> Result<(), TransportError> {
        self.write(DpsMap::from_iter([(id, value)])).await
    }
}
