// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan translator.
//!
//! Fans split their state over a boolean power datapoint, an enumerated
//! speed datapoint and an optional oscillation datapoint. Off is not a
//! speed on the wire, so speed changes to and from off go through the
//! power datapoint, and a fan that reports power off reads as speed off
//! no matter what the speed datapoint still holds.

use crate::config::FanConfig;
use crate::dps::{DpsId, DpsValue};
use crate::error::{DecodeError, Error};
use crate::state::DeviceState;
use crate::types::FanSpeed;

use super::CommandPlan;

/// Command for a fan entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanCommand {
    /// Switch the fan on, optionally selecting a speed in the same
    /// command.
    TurnOn {
        /// Speed to select after powering on; `None` keeps the
        /// device's current speed.
        speed: Option<FanSpeed>,
    },
    /// Switch the fan off.
    TurnOff,
    /// Select a speed step. [`FanSpeed::Off`] switches the fan off
    /// through the power datapoint instead.
    SetSpeed(FanSpeed),
    /// Start or stop oscillation.
    Oscillate(bool),
}

impl FanCommand {
    /// Returns the command name used in errors and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TurnOn { .. } => "turn_on",
            Self::TurnOff => "turn_off",
            Self::SetSpeed(_) => "set_speed",
            Self::Oscillate(_) => "oscillate",
        }
    }
}

/// Derived state of a fan entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanView {
    /// The fan is powered on.
    pub is_on: bool,
    /// Current speed step; [`FanSpeed::Off`] whenever the fan is off.
    pub speed: FanSpeed,
    /// Oscillation state; `None` when the fan has no oscillation
    /// datapoint or it was never reported.
    pub oscillating: Option<bool>,
}

#[derive(Debug)]
pub(crate) struct FanTranslator {
    config: FanConfig,
    is_on: bool,
    speed: FanSpeed,
    oscillating: Option<bool>,
}

impl FanTranslator {
    pub(crate) fn new(config: FanConfig) -> Self {
        Self {
            config,
            is_on: false,
            speed: FanSpeed::Off,
            oscillating: None,
        }
    }

    pub(crate) fn apply_command(&mut self, command: &FanCommand) -> Result<CommandPlan, Error> {
        match command {
            FanCommand::TurnOn { speed } => {
                let mut writes = vec![(self.config.power_dp, DpsValue::from(true))];
                self.is_on = true;
                if let Some(speed) = speed {
                    self.push_speed_write(&mut writes, *speed);
                }
                Ok(CommandPlan::sequential(writes))
            }
            FanCommand::TurnOff => {
                self.is_on = false;
                self.speed = FanSpeed::Off;
                Ok(CommandPlan::single(self.config.power_dp, false))
            }
            FanCommand::SetSpeed(speed) => {
                let mut writes = Vec::with_capacity(1);
                self.push_speed_write(&mut writes, *speed);
                Ok(CommandPlan::sequential(writes))
            }
            FanCommand::Oscillate(oscillating) => {
                let Some(dp) = self.config.oscillation_dp else {
                    return Err(Error::UnsupportedCommand {
                        command: "oscillate",
                    });
                };
                self.oscillating = Some(*oscillating);
                Ok(CommandPlan::single(dp, *oscillating))
            }
        }
    }

    /// Plans one speed change. Off clears the power datapoint; any
    /// other step writes its token to the speed datapoint.
    fn push_speed_write(&mut self, writes: &mut Vec<(DpsId, DpsValue)>, speed: FanSpeed) {
        self.speed = speed;
        if let Some(token) = speed.as_dps() {
            writes.push((self.config.speed_dp, DpsValue::from(token)));
        } else {
            self.is_on = false;
            writes.push((self.config.power_dp, DpsValue::from(false)));
        }
    }

    pub(crate) fn on_status(&mut self, state: &DeviceState) {
        match state.get(self.config.power_dp) {
            Some(DpsValue::Bool(on)) => self.is_on = *on,
            Some(_) => {
                let error = DecodeError::WrongKind {
                    id: self.config.power_dp,
                    expected: "bool",
                };
                tracing::warn!(dp = %self.config.power_dp, error = %error, "Keeping previous power state");
            }
            None => self.is_on = false,
        }

        if self.is_on {
            match state.get(self.config.speed_dp) {
                Some(DpsValue::Str(raw)) => {
                    if let Some(speed) = FanSpeed::from_dps(raw) {
                        self.speed = speed;
                    } else {
                        let error = DecodeError::UnknownSpeed(raw.clone());
                        tracing::warn!(dp = %self.config.speed_dp, error = %error, "Keeping previous speed");
                    }
                }
                Some(_) => {
                    let error = DecodeError::WrongKind {
                        id: self.config.speed_dp,
                        expected: "string",
                    };
                    tracing::warn!(dp = %self.config.speed_dp, error = %error, "Keeping previous speed");
                }
                None => {}
            }
        } else {
            self.speed = FanSpeed::Off;
        }

        if let Some(dp) = self.config.oscillation_dp {
            match state.get(dp) {
                Some(DpsValue::Bool(oscillating)) => self.oscillating = Some(*oscillating),
                Some(_) => {
                    let error = DecodeError::WrongKind {
                        id: dp,
                        expected: "bool",
                    };
                    tracing::warn!(dp = %dp, error = %error, "Keeping previous oscillation state");
                }
                None => self.oscillating = None,
            }
        }
    }

    pub(crate) fn view(&self) -> FanView {
        FanView {
            is_on: self.is_on,
            speed: self.speed,
            oscillating: self.oscillating,
        }
    }
}
