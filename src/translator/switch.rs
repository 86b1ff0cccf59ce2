// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Switch translator.
//!
//! The simplest entity kind: a boolean power datapoint, optionally
//! accompanied by read-only power-monitoring datapoints found on smart
//! plugs. Monitoring values pass through on the device's own scale.

use crate::config::SwitchConfig;
use crate::dps::{DpsId, DpsValue};
use crate::error::DecodeError;
use crate::state::DeviceState;

use super::CommandPlan;

/// Command for a switch entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchCommand {
    /// Switch on.
    TurnOn,
    /// Switch off.
    TurnOff,
}

impl SwitchCommand {
    /// Returns the command name used in errors and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TurnOn => "turn_on",
            Self::TurnOff => "turn_off",
        }
    }
}

/// Derived state of a switch entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchView {
    /// The switch is powered on.
    pub is_on: bool,
    /// Latest current reading, if a current datapoint is configured
    /// and present.
    pub current: Option<f64>,
    /// Latest power-draw reading, if a consumption datapoint is
    /// configured and present.
    pub current_consumption: Option<f64>,
    /// Latest voltage reading, if a voltage datapoint is configured
    /// and present.
    pub voltage: Option<f64>,
}

#[derive(Debug)]
pub(crate) struct SwitchTranslator {
    config: SwitchConfig,
    is_on: bool,
    current: Option<f64>,
    current_consumption: Option<f64>,
    voltage: Option<f64>,
}

impl SwitchTranslator {
    pub(crate) fn new(config: SwitchConfig) -> Self {
        Self {
            config,
            is_on: false,
            current: None,
            current_consumption: None,
            voltage: None,
        }
    }

    pub(crate) fn apply_command(&mut self, command: &SwitchCommand) -> CommandPlan {
        let on = matches!(command, SwitchCommand::TurnOn);
        self.is_on = on;
        CommandPlan::single(self.config.power_dp, on)
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

        if let Some(id) = self.config.current_dp {
            decode_reading(state, id, &mut self.current);
        }
        if let Some(id) = self.config.current_consumption_dp {
            decode_reading(state, id, &mut self.current_consumption);
        }
        if let Some(id) = self.config.voltage_dp {
            decode_reading(state, id, &mut self.voltage);
        }
    }

    pub(crate) fn view(&self) -> SwitchView {
        SwitchView {
            is_on: self.is_on,
            current: self.current,
            current_consumption: self.current_consumption,
            voltage: self.voltage,
        }
    }
}

/// Updates one monitoring reading from the snapshot. An absent
/// datapoint clears the reading; a non-numeric one keeps it.
fn decode_reading(state: &DeviceState, id: DpsId, reading: &mut Option<f64>) {
    match state.get(id) {
        Some(value) => match value.as_f64() {
            Some(raw) => *reading = Some(raw),
            None => {
                let error = DecodeError::WrongKind {
                    id,
                    expected: "number",
                };
                tracing::warn!(dp = %id, error = %error, "Keeping previous reading");
            }
        },
        None => *reading = None,
    }
}
