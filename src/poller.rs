// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Poll loop keeping one device's cached state fresh.
//!
//! Tuya devices do not push state over the local protocol, so the
//! poller fetches the full datapoint snapshot on a fixed interval. The
//! loop is also where simulated cover motions complete: between ticks
//! it sleeps until the earliest armed motion deadline and issues the
//! deferred stop write when it expires, even while a slow fetch is
//! still in flight.
//!
//! The crate never spawns; the host calls [`Device::poller`] and spawns
//! [`Poller::run`] on its own executor.
//!
//! [`Device::poller`]: crate::device::Device::poller

use std::fmt;
use std::future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::device::DeviceCore;
use crate::dps::DpsMap;
use crate::error::TransportError;
use crate::link::DeviceLink;
use crate::state::Availability;

/// Drives the poll loop of one device.
///
/// Obtained from [`Device::poller`](crate::device::Device::poller). The
/// loop runs until the shutdown token is cancelled:
///
/// - the first poll fires immediately, then once per configured
///   interval;
/// - a poll that overruns the interval never stacks further polls
///   behind it (missed ticks are skipped);
/// - each fetch is bounded by the configured poll timeout, an elapsed
///   timeout counting as a failed poll;
/// - a failed poll marks the device unavailable and keeps the stale
///   snapshot until the next tick.
pub struct Poller<L: DeviceLink> {
    core: Arc<DeviceCore<L>>,
    shutdown: CancellationToken,
}

impl<L: DeviceLink> Poller<L> {
    pub(crate) fn new(core: Arc<DeviceCore<L>>, shutdown: CancellationToken) -> Self {
        Self { core, shutdown }
    }

    /// Runs the poll loop until the shutdown token is cancelled.
    pub async fn run(self) {
        // tokio's interval panics on a zero period
        let period = self.core.config.poll_interval.max(Duration::from_millis(1));
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::debug!(
            device = %self.core.config.id,
            interval = ?period,
            "Poll loop started"
        );

        loop {
            let deadline = self.core.earliest_motion_deadline();
            tokio::select! {
                () = self.shutdown.cancelled() => {
                    tracing::debug!(device = %self.core.config.id, "Poll loop stopped");
                    break;
                }
                _ = interval.tick() => self.poll_once().await,
                () = wait_until(deadline) => self.issue_due_stops().await,
                () = self.core.motion_wake.notified() => {}
            }
        }
    }

    /// Fetches one snapshot and applies the outcome.
    ///
    /// Motion deadlines keep firing while the fetch is in flight, so a
    /// slow device cannot delay a deferred stop past its travel time.
    async fn poll_once(&self) {
        let timeout = self.core.config.poll_timeout;
        let fetch = time::timeout(timeout, self.core.link.fetch_status());
        tokio::pin!(fetch);

        let result = loop {
            let deadline = self.core.earliest_motion_deadline();
            tokio::select! {
                () = self.shutdown.cancelled() => return,
                result = &mut fetch => break result,
                () = wait_until(deadline) => self.issue_due_stops().await,
                () = self.core.motion_wake.notified() => {}
            }
        };

        match result {
            Ok(Ok(dps)) => self.on_poll_success(dps),
            Ok(Err(error)) => self.on_poll_failure(&error),
            Err(_) => self.on_poll_failure(&TransportError::Timeout(timeout)),
        }
    }

    /// Installs a fresh snapshot and fans it out.
    ///
    /// Every registered translator recomputes against the same snapshot
    /// before subscribers are notified, so callbacks observing views see
    /// a consistent device.
    fn on_poll_success(&self, dps: DpsMap) {
        let was = self.core.state.availability();
        let state = self.core.state.replace_dps(dps);
        tracing::debug!(
            device = %self.core.config.id,
            dps = state.dps().len(),
            "Poll succeeded"
        );

        self.core.run_status_walk(&state);
        self.core
            .dispatcher
            .notify_updated(&self.core.config.id, &state);
        if was != Availability::Available {
            self.core
                .dispatcher
                .notify_availability(&self.core.config.id, Availability::Available);
        }
        // Ignore send errors (no receivers)
        let _ = self.core.state_tx.send(state);
    }

    fn on_poll_failure(&self, error: &TransportError) {
        let was = self.core.state.availability();
        self.core.state.mark_unavailable();
        tracing::warn!(
            device = %self.core.config.id,
            error = %error,
            "Poll failed, keeping stale snapshot"
        );

        if was != Availability::Unavailable {
            self.core
                .dispatcher
                .notify_availability(&self.core.config.id, Availability::Unavailable);
            let _ = self.core.state_tx.send(self.core.state.snapshot());
        }
    }

    /// Writes the deferred stop of every motion whose deadline passed.
    async fn issue_due_stops(&self) {
        for (id, value) in self.core.take_due_stops(Instant::now()) {
            tracing::debug!(device = %self.core.config.id, dp = %id, "Issuing deferred stop");
            if let Err(error) = self.core.link.write_one(id, value).await {
                tracing::warn!(
                    device = %self.core.config.id,
                    dp = %id,
                    error = %error,
                    "Deferred stop write failed"
                );
            }
        }
    }
}

impl<L: DeviceLink> fmt::Debug for Poller<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Poller")
            .field("device", &self.core.config.id)
            .finish_non_exhaustive()
    }
}

/// Sleeps until the deadline, or forever when there is none.
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use tokio::time::sleep;

    use super::*;
    use crate::config::{CoverConfig, DeviceConfig, PositioningMode, SwitchConfig};
    use crate::device::Device;
    use crate::dps::{DpsId, DpsValue};
    use crate::translator::CoverCommand;
    use crate::types::Position;

    fn dp(id: u8) -> DpsId {
        DpsId::new(id).unwrap()
    }

    #[derive(Default)]
    struct Script {
        responses: Mutex<VecDeque<Result<DpsMap, TransportError>>>,
        fetch_delay: Mutex<Option<Duration>>,
        first_fetch_delay: Mutex<Option<Duration>>,
        fetches: Mutex<usize>,
        writes: Mutex<Vec<(DpsId, DpsValue)>>,
    }

    /// Link that plays back a queue of fetch results; an exhausted
    /// queue keeps answering with an empty snapshot.
    #[derive(Clone, Default)]
    struct ScriptedLink {
        script: Arc<Script>,
    }

    impl ScriptedLink {
        fn with_responses(responses: Vec<Result<DpsMap, TransportError>>) -> Self {
            let link = Self::default();
            *link.script.responses.lock() = responses.into();
            link
        }

        fn with_fetch_delay(self, delay: Duration) -> Self {
            *self.script.fetch_delay.lock() = Some(delay);
            self
        }

        /// Delays only the first fetch; later fetches answer instantly.
        fn with_first_fetch_delay(self, delay: Duration) -> Self {
            *self.script.first_fetch_delay.lock() = Some(delay);
            self
        }

        fn fetches(&self) -> usize {
            *self.script.fetches.lock()
        }

        fn writes(&self) -> Vec<(DpsId, DpsValue)> {
            self.script.writes.lock().clone()
        }
    }

    impl DeviceLink for ScriptedLink {
        async fn fetch_status(&self) -> Result<DpsMap, TransportError> {
            *self.script.fetches.lock() += 1;
            let first = self.script.first_fetch_delay.lock().take();
            let delay = first.or_else(|| *self.script.fetch_delay.lock());
            if let Some(delay) = delay {
                sleep(delay).await;
            }
            let next = self.script.responses.lock().pop_front();
            next.unwrap_or_else(|| Ok(DpsMap::new()))
        }

        async fn write(&self, dps: DpsMap) -> Result<(), TransportError> {
            let mut writes = self.script.writes.lock();
            for (id, value) in dps {
                writes.push((id, value));
            }
            Ok(())
        }

        async fn write_one(&self, id: DpsId, value: DpsValue) -> Result<(), TransportError> {
            self.script.writes.lock().push((id, value));
            Ok(())
        }
    }

    fn device_with(link: ScriptedLink) -> Device<ScriptedLink> {
        Device::new(DeviceConfig::new("bf6d7c8a4e21f09bc3poll"), link)
    }

    fn snapshot_of(pairs: Vec<(DpsId, DpsValue)>) -> Result<DpsMap, TransportError> {
        Ok(pairs.into_iter().collect())
    }

    #[tokio::test(start_paused = true)]
    async fn first_poll_fires_immediately() {
        let link = ScriptedLink::with_responses(vec![snapshot_of(vec![(
            dp(1),
            DpsValue::from(true),
        )])]);
        let device = device_with(link.clone());
        let switch = device.add_switch(SwitchConfig::new(dp(1))).unwrap();

        let shutdown = CancellationToken::new();
        tokio::spawn(device.poller(shutdown.clone()).run());
        sleep(Duration::from_millis(1)).await;

        assert_eq!(link.fetches(), 1);
        assert_eq!(device.availability(), Availability::Available);
        assert!(device.view(switch).unwrap().as_switch().unwrap().is_on);
        shutdown.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn polls_repeat_on_the_interval() {
        let link = ScriptedLink::default();
        let device = device_with(link.clone());

        let shutdown = CancellationToken::new();
        tokio::spawn(device.poller(shutdown.clone()).run());

        sleep(Duration::from_secs(10)).await;
        assert_eq!(link.fetches(), 1);

        sleep(Duration::from_secs(25)).await;
        assert_eq!(link.fetches(), 2);
        shutdown.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn poll_failure_keeps_the_stale_snapshot() {
        let link = ScriptedLink::with_responses(vec![
            snapshot_of(vec![(dp(7), DpsValue::from(42u8))]),
            Err(TransportError::ConnectionFailed("unplugged".into())),
        ]);
        let device = device_with(link.clone());

        let shutdown = CancellationToken::new();
        tokio::spawn(device.poller(shutdown.clone()).run());

        sleep(Duration::from_millis(1)).await;
        assert_eq!(device.availability(), Availability::Available);

        sleep(Duration::from_secs(31)).await;
        assert_eq!(device.availability(), Availability::Unavailable);
        let snapshot = device.snapshot();
        assert_eq!(snapshot.get(dp(7)).and_then(DpsValue::as_i64), Some(42));
        shutdown.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn availability_callbacks_fire_on_transitions_only() {
        let link = ScriptedLink::with_responses(vec![
            Err(TransportError::ConnectionFailed("unplugged".into())),
            Err(TransportError::ConnectionFailed("unplugged".into())),
            snapshot_of(Vec::new()),
        ]);
        let device = device_with(link);

        let transitions = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&transitions);
        device.on_availability_changed(move |availability| {
            seen.lock().push(availability);
        });
        let updates = Arc::new(Mutex::new(0usize));
        let counted = Arc::clone(&updates);
        device.on_updated(move |_| {
            *counted.lock() += 1;
        });

        let shutdown = CancellationToken::new();
        tokio::spawn(device.poller(shutdown.clone()).run());
        sleep(Duration::from_secs(65)).await;

        assert_eq!(
            transitions.lock().as_slice(),
            [Availability::Unavailable, Availability::Available]
        );
        // Failed polls never count as updates
        assert_eq!(*updates.lock(), 1);
        shutdown.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_counts_as_failed_poll() {
        let link = ScriptedLink::default().with_fetch_delay(Duration::from_secs(10));
        let device = device_with(link.clone());

        let shutdown = CancellationToken::new();
        tokio::spawn(device.poller(shutdown.clone()).run());

        sleep(Duration::from_secs(6)).await;
        assert_eq!(link.fetches(), 1);
        assert_eq!(device.availability(), Availability::Unavailable);
        shutdown.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn overrunning_fetch_never_stacks_polls() {
        // First fetch spans the ticks due at 20 s and 40 s; the timeout
        // is wide enough that it still lands as a success at 50 s
        let link = ScriptedLink::default().with_first_fetch_delay(Duration::from_secs(50));
        let device = Device::new(
            DeviceConfig::new("bf6d7c8a4e21f09bc3poll")
                .with_poll_interval(Duration::from_secs(20))
                .with_poll_timeout(Duration::from_secs(60)),
            link.clone(),
        );

        let shutdown = CancellationToken::new();
        tokio::spawn(device.poller(shutdown.clone()).run());

        sleep(Duration::from_secs(41)).await;
        assert_eq!(link.fetches(), 1, "no poll may start behind the slow fetch");

        // Exactly one catch-up poll when the fetch lands, not one per
        // missed tick
        sleep(Duration::from_secs(14)).await;
        assert_eq!(link.fetches(), 2);
        assert_eq!(device.availability(), Availability::Available);

        sleep(Duration::from_secs(4)).await;
        assert_eq!(link.fetches(), 2, "skipped ticks must not replay");

        // Back on the 20 s grid: the next poll is due at 60 s
        sleep(Duration::from_secs(2)).await;
        assert_eq!(link.fetches(), 3);
        shutdown.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn deferred_stop_fires_between_ticks() {
        let link = ScriptedLink::default();
        let device = device_with(link.clone());
        let cover = device
            .add_cover(CoverConfig::new(dp(1)).with_positioning(PositioningMode::Fake))
            .unwrap();

        let shutdown = CancellationToken::new();
        tokio::spawn(device.poller(shutdown.clone()).run());
        sleep(Duration::from_millis(1)).await;

        // Full travel from the assumed midpoint: 50 steps at 25 s span
        device
            .apply(cover, CoverCommand::SetPosition(Position::clamped(0)))
            .await
            .unwrap();
        assert_eq!(link.writes(), [(dp(1), DpsValue::from("off"))]);

        sleep(Duration::from_secs(24)).await;
        assert_eq!(link.writes().len(), 1, "stop must not fire early");

        sleep(Duration::from_secs(2)).await;
        let writes = link.writes();
        assert_eq!(writes.last(), Some(&(dp(1), DpsValue::from("stop"))));
        assert_eq!(writes.len(), 2);

        let view = device.view(cover).unwrap().as_cover().unwrap();
        assert!(!view.is_moving);
        assert_eq!(view.position, Some(Position::clamped(50)));
        // The interval has not ticked a second time yet
        assert_eq!(link.fetches(), 1);
        shutdown.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn motion_deadline_fires_during_slow_fetch() {
        let link = ScriptedLink::default().with_fetch_delay(Duration::from_secs(10));
        let device = Device::new(
            DeviceConfig::new("bf6d7c8a4e21f09bc3poll")
                .with_poll_timeout(Duration::from_secs(20)),
            link.clone(),
        );
        let cover = device
            .add_cover(
                CoverConfig::new(dp(1))
                    .with_positioning(PositioningMode::Fake)
                    .with_span_time(5.0),
            )
            .unwrap();

        let shutdown = CancellationToken::new();
        tokio::spawn(device.poller(shutdown.clone()).run());

        // Commands are accepted while the first fetch is still in
        // flight; full travel takes 5 s here
        device
            .apply(cover, CoverCommand::SetPosition(Position::clamped(100)))
            .await
            .unwrap();

        sleep(Duration::from_secs(6)).await;
        let writes = link.writes();
        assert_eq!(writes.last(), Some(&(dp(1), DpsValue::from("stop"))));
        assert_eq!(link.fetches(), 1, "fetch is still in flight");
        shutdown.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn watch_channel_sees_each_snapshot() {
        let link = ScriptedLink::with_responses(vec![snapshot_of(vec![(
            dp(1),
            DpsValue::from(false),
        )])]);
        let device = device_with(link);
        let mut rx = device.watch_state();

        let shutdown = CancellationToken::new();
        tokio::spawn(device.poller(shutdown.clone()).run());

        rx.changed().await.unwrap();
        let state = rx.borrow_and_update();
        assert!(state.is_available());
        assert_eq!(state.get(dp(1)).and_then(DpsValue::as_bool), Some(false));
        shutdown.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_token_stops_the_loop() {
        let link = ScriptedLink::default();
        let device = device_with(link);

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(device.poller(shutdown.clone()).run());
        sleep(Duration::from_millis(1)).await;

        shutdown.cancel();
        handle.await.unwrap();
    }
}
