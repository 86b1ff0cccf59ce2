// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Capability translators between domain commands and raw data points.
//!
//! Every entity registered on a device is backed by one [`Translator`]
//! variant owning the entity's configuration and its optimistic local
//! state. The contract has two operations:
//!
//! - `apply_command` turns a [`Command`] into a plan of data-point
//!   writes, updating local state optimistically; the device performs
//!   the writes and the next poll reconciles.
//! - `on_status` recomputes the derived view from a fresh state
//!   snapshot. It never fails: malformed fields are logged and keep
//!   their previous values.
//!
//! The set of entity kinds is closed; adding one means adding a variant
//! here and in [`Command`] and [`EntityView`].

mod cover;
mod fan;
mod light;
mod switch;

pub use cover::{CoverCommand, CoverView};
pub use fan::{FanCommand, FanView};
pub use light::{LightCommand, LightMode, LightSettings, LightView};
pub use switch::{SwitchCommand, SwitchView};

pub(crate) use cover::CoverTranslator;
pub(crate) use fan::FanTranslator;
pub(crate) use light::LightTranslator;
pub(crate) use switch::SwitchTranslator;

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::dps::{DpsId, DpsMap, DpsValue};
use crate::error::Error;
use crate::state::DeviceState;

/// Handle to one entity registered on a device.
///
/// Returned by the `add_*` registration methods and stable for the
/// lifetime of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(usize);

impl EntityId {
    #[must_use]
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub(crate) fn index(&self) -> usize {
        self.0
    }

    /// Returns the raw handle value.
    #[must_use]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// A command addressed to one entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Command for a cover entity.
    Cover(CoverCommand),
    /// Command for a fan entity.
    Fan(FanCommand),
    /// Command for a light entity.
    Light(LightCommand),
    /// Command for a switch entity.
    Switch(SwitchCommand),
}

impl Command {
    /// Returns the command name used in errors and logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cover(command) => command.name(),
            Self::Fan(command) => command.name(),
            Self::Light(command) => command.name(),
            Self::Switch(command) => command.name(),
        }
    }
}

impl From<CoverCommand> for Command {
    fn from(command: CoverCommand) -> Self {
        Self::Cover(command)
    }
}

impl From<FanCommand> for Command {
    fn from(command: FanCommand) -> Self {
        Self::Fan(command)
    }
}

impl From<LightCommand> for Command {
    fn from(command: LightCommand) -> Self {
        Self::Light(command)
    }
}

impl From<SwitchCommand> for Command {
    fn from(command: SwitchCommand) -> Self {
        Self::Switch(command)
    }
}

/// Snapshot of one entity's derived state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityView {
    /// View of a cover entity.
    Cover(CoverView),
    /// View of a fan entity.
    Fan(FanView),
    /// View of a light entity.
    Light(LightView),
    /// View of a switch entity.
    Switch(SwitchView),
}

impl EntityView {
    /// Returns the cover view, if this entity is a cover.
    #[must_use]
    pub fn as_cover(self) -> Option<CoverView> {
        match self {
            Self::Cover(view) => Some(view),
            _ => None,
        }
    }

    /// Returns the fan view, if this entity is a fan.
    #[must_use]
    pub fn as_fan(self) -> Option<FanView> {
        match self {
            Self::Fan(view) => Some(view),
            _ => None,
        }
    }

    /// Returns the light view, if this entity is a light.
    #[must_use]
    pub fn as_light(self) -> Option<LightView> {
        match self {
            Self::Light(view) => Some(view),
            _ => None,
        }
    }

    /// Returns the switch view, if this entity is a switch.
    #[must_use]
    pub fn as_switch(self) -> Option<SwitchView> {
        match self {
            Self::Switch(view) => Some(view),
            _ => None,
        }
    }

    /// Returns the entity kind name.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Cover(_) => "cover",
            Self::Fan(_) => "fan",
            Self::Light(_) => "light",
            Self::Switch(_) => "switch",
        }
    }
}

/// Planned link writes for one command.
///
/// Lights batch all affected data points into a single write; covers,
/// fans and switches write data points one at a time because their
/// firmware sequences settings.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CommandPlan {
    pub(crate) writes: PlannedWrites,
    pub(crate) motion: Option<MotionArming>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PlannedWrites {
    /// All data points in a single write call.
    Batched(DpsMap),
    /// One write call per data point, in order.
    Sequential(Vec<(DpsId, DpsValue)>),
}

/// Request to arm a deferred stop once the plan's writes succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MotionArming {
    /// Travel time before the deferred stop fires.
    pub(crate) delay: Duration,
}

impl CommandPlan {
    pub(crate) fn batched(dps: DpsMap) -> Self {
        Self {
            writes: PlannedWrites::Batched(dps),
            motion: None,
        }
    }

    pub(crate) fn sequential(writes: Vec<(DpsId, DpsValue)>) -> Self {
        Self {
            writes: PlannedWrites::Sequential(writes),
            motion: None,
        }
    }

    pub(crate) fn single(id: DpsId, value: impl Into<DpsValue>) -> Self {
        Self::sequential(vec![(id, value.into())])
    }

    /// A plan that writes nothing.
    pub(crate) fn no_writes() -> Self {
        Self::sequential(Vec::new())
    }

    pub(crate) fn with_motion(mut self, delay: Duration) -> Self {
        self.motion = Some(MotionArming { delay });
        self
    }
}

/// Closed set of entity translators hosted by a device.
#[derive(Debug)]
pub(crate) enum Translator {
    Cover(CoverTranslator),
    Fan(FanTranslator),
    Light(LightTranslator),
    Switch(SwitchTranslator),
}

impl Translator {
    /// Applies a command, updating optimistic state and returning the
    /// planned writes.
    ///
    /// A command of the wrong kind for this entity returns
    /// [`Error::UnsupportedCommand`].
    pub(crate) fn apply_command(&mut self, command: &Command) -> Result<CommandPlan, Error> {
        match (self, command) {
            (Self::Cover(translator), Command::Cover(command)) => translator.apply_command(command),
            (Self::Fan(translator), Command::Fan(command)) => translator.apply_command(command),
            (Self::Light(translator), Command::Light(command)) => {
                Ok(translator.apply_command(command))
            }
            (Self::Switch(translator), Command::Switch(command)) => {
                Ok(translator.apply_command(command))
            }
            (_, command) => Err(Error::UnsupportedCommand {
                command: command.name(),
            }),
        }
    }

    /// Recomputes the derived view from a fresh snapshot.
    pub(crate) fn on_status(&mut self, state: &DeviceState) {
        match self {
            Self::Cover(translator) => translator.on_status(state),
            Self::Fan(translator) => translator.on_status(state),
            Self::Light(translator) => translator.on_status(state),
            Self::Switch(translator) => translator.on_status(state),
        }
    }

    /// Returns the current derived view.
    pub(crate) fn view(&self) -> EntityView {
        match self {
            Self::Cover(translator) => EntityView::Cover(translator.view()),
            Self::Fan(translator) => EntityView::Fan(translator.view()),
            Self::Light(translator) => EntityView::Light(translator.view()),
            Self::Switch(translator) => EntityView::Switch(translator.view()),
        }
    }

    /// Returns the entity kind name.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Cover(_) => "cover",
            Self::Fan(_) => "fan",
            Self::Light(_) => "light",
            Self::Switch(_) => "switch",
        }
    }

    /// Arms the deferred stop of a simulated cover motion.
    ///
    /// Only covers simulate motion; for other kinds this does nothing.
    pub(crate) fn arm_motion(&mut self, deadline: Instant) {
        if let Self::Cover(translator) = self {
            translator.arm_motion(deadline);
        }
    }

    /// Deadline of a pending simulated motion, if any.
    pub(crate) fn motion_deadline(&self) -> Option<Instant> {
        match self {
            Self::Cover(translator) => translator.motion_deadline(),
            _ => None,
        }
    }

    /// Takes the deferred stop write of a motion whose deadline passed,
    /// completing that motion.
    pub(crate) fn take_due_stop(&mut self, now: Instant) -> Option<(DpsId, DpsValue)> {
        match self {
            Self::Cover(translator) => translator.take_due_stop(now),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CoverConfig, FanConfig, LightConfig, SwitchConfig};

    fn dp(id: u8) -> DpsId {
        DpsId::new(id).unwrap()
    }

    #[test]
    fn entity_id_display() {
        assert_eq!(EntityId::new(3).to_string(), "Entity(3)");
        assert_eq!(EntityId::new(3).value(), 3);
    }

    #[test]
    fn command_names() {
        assert_eq!(Command::from(CoverCommand::Open).name(), "open");
        assert_eq!(Command::from(FanCommand::TurnOff).name(), "turn_off");
        assert_eq!(Command::from(LightCommand::TurnOff).name(), "turn_off");
        assert_eq!(Command::from(SwitchCommand::TurnOn).name(), "turn_on");
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let mut translator = Translator::Switch(SwitchTranslator::new(SwitchConfig::new(dp(1))));
        let result = translator.apply_command(&Command::Cover(CoverCommand::Open));
        assert!(matches!(
            result,
            Err(Error::UnsupportedCommand { command: "open" })
        ));
    }

    #[test]
    fn kind_match_is_accepted() {
        let mut translator = Translator::Switch(SwitchTranslator::new(SwitchConfig::new(dp(1))));
        assert!(
            translator
                .apply_command(&Command::Switch(SwitchCommand::TurnOn))
                .is_ok()
        );
    }

    #[test]
    fn view_accessors_match_kind() {
        let fan = Translator::Fan(FanTranslator::new(FanConfig::new(dp(1))));
        let view = fan.view();
        assert_eq!(view.kind(), "fan");
        assert!(view.as_fan().is_some());
        assert!(view.as_cover().is_none());
        assert!(view.as_light().is_none());
        assert!(view.as_switch().is_none());
    }

    #[test]
    fn only_covers_report_motion_deadlines() {
        let light = Translator::Light(LightTranslator::new(LightConfig::new(dp(1))));
        assert!(light.motion_deadline().is_none());

        let mut cover = Translator::Cover(CoverTranslator::new(CoverConfig::new(dp(1))));
        assert!(cover.motion_deadline().is_none());
        cover.arm_motion(Instant::now() + Duration::from_secs(5));
        assert!(cover.motion_deadline().is_some());
    }

    #[test]
    fn plan_constructors() {
        let plan = CommandPlan::single(dp(1), "stop");
        assert_eq!(
            plan.writes,
            PlannedWrites::Sequential(vec![(dp(1), DpsValue::from("stop"))])
        );
        assert!(plan.motion.is_none());

        let armed = CommandPlan::single(dp(1), "on").with_motion(Duration::from_secs(3));
        assert_eq!(
            armed.motion,
            Some(MotionArming {
                delay: Duration::from_secs(3)
            })
        );

        let empty = CommandPlan::no_writes();
        assert_eq!(empty.writes, PlannedWrites::Sequential(Vec::new()));
    }
}
