// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! High-level handle for one local Tuya device.
//!
//! A [`Device`] ties together the pieces that make a physical device
//! usable: the [`DeviceLink`] transport, the cached
//! [`DeviceState`](crate::state::DeviceState), the registered entity
//! translators, and the notification paths (callback dispatcher and
//! watch channel). Entities are registered up front with the `add_*`
//! methods; afterwards the host spawns the [`Poller`] returned by
//! [`Device::poller`] and drives the device through
//! [`Device::apply`] and [`Device::view`].
//!
//! Cloning a `Device` is cheap and yields another handle to the same
//! device, which is how the poller and command paths share state.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::{Notify, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::{CoverConfig, DeviceConfig, DeviceId, FanConfig, LightConfig, SwitchConfig};
use crate::dispatch::{SubscriptionId, UpdateDispatcher};
use crate::dps::{DpsId, DpsValue};
use crate::error::{ConfigError, Error};
use crate::link::DeviceLink;
use crate::poller::Poller;
use crate::state::{Availability, DeviceState, StateHandle};
use crate::translator::{
    Command, CoverTranslator, EntityId, EntityView, FanTranslator, LightTranslator, PlannedWrites,
    SwitchTranslator, Translator,
};

/// State shared between the device handle and its poller.
pub(crate) struct DeviceCore<L> {
    pub(crate) config: DeviceConfig,
    pub(crate) link: L,
    pub(crate) state: StateHandle,
    /// Entity arena; an [`EntityId`] is a stable index into it.
    pub(crate) translators: RwLock<Vec<Mutex<Translator>>>,
    pub(crate) dispatcher: Arc<UpdateDispatcher>,
    pub(crate) state_tx: watch::Sender<DeviceState>,
    /// Signalled whenever a new simulated motion is armed, so the poll
    /// loop re-reads its earliest deadline.
    pub(crate) motion_wake: Notify,
}

impl<L> DeviceCore<L> {
    /// Runs `on_status` on every registered translator against the same
    /// snapshot.
    pub(crate) fn run_status_walk(&self, state: &DeviceState) {
        let translators = self.translators.read();
        for slot in translators.iter() {
            slot.lock().on_status(state);
        }
    }

    /// Earliest armed motion deadline across all entities, if any.
    pub(crate) fn earliest_motion_deadline(&self) -> Option<Instant> {
        let translators = self.translators.read();
        translators
            .iter()
            .filter_map(|slot| slot.lock().motion_deadline())
            .min()
    }

    /// Collects the deferred stop writes of every motion whose deadline
    /// has passed, completing those motions.
    pub(crate) fn take_due_stops(&self, now: Instant) -> Vec<(DpsId, DpsValue)> {
        let translators = self.translators.read();
        translators
            .iter()
            .filter_map(|slot| slot.lock().take_due_stop(now))
            .collect()
    }
}

/// A local Tuya device with registered entities.
///
/// The device itself never spawns tasks: the host obtains a [`Poller`]
/// via [`Device::poller`] and spawns its `run` future on whatever
/// executor it uses. Until the first poll completes the cached state is
/// empty and entity views show their optimistic defaults.
pub struct Device<L: DeviceLink> {
    core: Arc<DeviceCore<L>>,
}

impl<L: DeviceLink> Device<L> {
    /// Creates a device handle around a transport link.
    #[must_use]
    pub fn new(config: DeviceConfig, link: L) -> Self {
        Self::with_dispatcher(config, link, Arc::new(UpdateDispatcher::new()))
    }

    /// Creates a device handle sharing an existing dispatcher.
    ///
    /// Hosts managing several devices register all their callbacks on
    /// one dispatcher and hand it to each device.
    #[must_use]
    pub fn with_dispatcher(
        config: DeviceConfig,
        link: L,
        dispatcher: Arc<UpdateDispatcher>,
    ) -> Self {
        let state = StateHandle::new();
        let (state_tx, _) = watch::channel(state.snapshot());
        Self {
            core: Arc::new(DeviceCore {
                config,
                link,
                state,
                translators: RwLock::new(Vec::new()),
                dispatcher,
                state_tx,
                motion_wake: Notify::new(),
            }),
        }
    }

    /// Returns the device identifier.
    #[must_use]
    pub fn id(&self) -> &DeviceId {
        &self.core.config.id
    }

    /// Returns the friendly name, falling back to the device id.
    #[must_use]
    pub fn name(&self) -> &str {
        self.core.config.name()
    }

    /// Returns the number of registered entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.core.translators.read().len()
    }

    /// Registers a cover entity.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration fails validation.
    pub fn add_cover(&self, config: CoverConfig) -> Result<EntityId, ConfigError> {
        config.validate()?;
        Ok(self.register(Translator::Cover(CoverTranslator::new(config))))
    }

    /// Registers a fan entity.
    ///
    /// # Errors
    ///
    /// Currently always succeeds: fan configurations carry only
    /// datapoint ids, which are valid by construction.
    pub fn add_fan(&self, config: FanConfig) -> Result<EntityId, ConfigError> {
        Ok(self.register(Translator::Fan(FanTranslator::new(config))))
    }

    /// Registers a light entity.
    ///
    /// # Errors
    ///
    /// Currently always succeeds: a colour temperature range is already
    /// validated when [`MiredRange::new`](crate::types::MiredRange::new)
    /// builds it.
    pub fn add_light(&self, config: LightConfig) -> Result<EntityId, ConfigError> {
        Ok(self.register(Translator::Light(LightTranslator::new(config))))
    }

    /// Registers a switch entity.
    ///
    /// # Errors
    ///
    /// Currently always succeeds: switch configurations have nothing to
    /// validate.
    pub fn add_switch(&self, config: SwitchConfig) -> Result<EntityId, ConfigError> {
        Ok(self.register(Translator::Switch(SwitchTranslator::new(config))))
    }

    fn register(&self, translator: Translator) -> EntityId {
        let mut translators = self.core.translators.write();
        let id = EntityId::new(translators.len());
        tracing::debug!(
            device = %self.core.config.id,
            entity = %id,
            kind = translator.kind(),
            "Registered entity"
        );
        translators.push(Mutex::new(translator));
        id
    }

    /// Applies a command to one entity.
    ///
    /// The entity's optimistic state is updated first, then the planned
    /// datapoint writes go out over the link. A transport failure is
    /// returned to the caller; the optimistic state stays as set and the
    /// next successful poll reconciles it with the device.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceUnavailable`] while the device is known to
    /// be unreachable, [`Error::UnknownEntity`] for a stale handle,
    /// [`Error::UnsupportedCommand`] if the entity cannot perform the
    /// command, and [`Error::Transport`] when a write fails.
    pub async fn apply(&self, entity: EntityId, command: impl Into<Command>) -> Result<(), Error> {
        let command = command.into();
        if self.core.state.availability() == Availability::Unavailable {
            return Err(Error::DeviceUnavailable {
                device_id: self.core.config.id.to_string(),
            });
        }

        let plan = {
            let translators = self.core.translators.read();
            let slot = translators
                .get(entity.index())
                .ok_or(Error::UnknownEntity(entity.value()))?;
            slot.lock().apply_command(&command)?
        };

        tracing::debug!(
            device = %self.core.config.id,
            entity = %entity,
            command = command.name(),
            "Applying command"
        );

        match plan.writes {
            PlannedWrites::Batched(dps) => self.core.link.write(dps).await?,
            PlannedWrites::Sequential(writes) => {
                for (id, value) in writes {
                    self.core.link.write_one(id, value).await?;
                }
            }
        }

        // Arm only after the writes landed; a failed command must not
        // leave a deferred stop behind
        if let Some(motion) = plan.motion {
            let deadline = Instant::now() + motion.delay;
            let translators = self.core.translators.read();
            if let Some(slot) = translators.get(entity.index()) {
                slot.lock().arm_motion(deadline);
            }
            drop(translators);
            self.core.motion_wake.notify_one();
        }

        Ok(())
    }

    /// Returns the derived view of one entity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEntity`] for a stale handle.
    pub fn view(&self, entity: EntityId) -> Result<EntityView, Error> {
        let translators = self.core.translators.read();
        let slot = translators
            .get(entity.index())
            .ok_or(Error::UnknownEntity(entity.value()))?;
        Ok(slot.lock().view())
    }

    /// Returns a point-in-time copy of the cached device state.
    #[must_use]
    pub fn snapshot(&self) -> DeviceState {
        self.core.state.snapshot()
    }

    /// Returns the device's availability.
    #[must_use]
    pub fn availability(&self) -> Availability {
        self.core.state.availability()
    }

    /// Creates a watch receiver observing state snapshots.
    ///
    /// The receiver sees every snapshot the poller installs, plus
    /// availability transitions.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<DeviceState> {
        self.core.state_tx.subscribe()
    }

    /// Registers a callback for this device's state updates.
    pub fn on_updated<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&DeviceState) + Send + Sync + 'static,
    {
        self.core.dispatcher.on_updated(&self.core.config.id, callback)
    }

    /// Registers a callback for this device's availability changes.
    pub fn on_availability_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Availability) + Send + Sync + 'static,
    {
        self.core
            .dispatcher
            .on_availability_changed(&self.core.config.id, callback)
    }

    /// Returns the dispatcher this device notifies.
    #[must_use]
    pub fn dispatcher(&self) -> Arc<UpdateDispatcher> {
        Arc::clone(&self.core.dispatcher)
    }

    /// Creates the poller that keeps this device's state fresh.
    ///
    /// The caller spawns `poller.run()`; the loop exits when `shutdown`
    /// is cancelled.
    #[must_use]
    pub fn poller(&self, shutdown: CancellationToken) -> Poller<L> {
        Poller::new(Arc::clone(&self.core), shutdown)
    }
}

impl<L: DeviceLink> Clone for Device<L> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<L: DeviceLink> fmt::Debug for Device<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.core.config.id)
            .field("name", &self.name())
            .field("entities", &self.entity_count())
            .field("availability", &self.availability())
            .finish_non_exhaustive()
    }
}
