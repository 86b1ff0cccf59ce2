// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cover translator.
//!
//! Covers are driven through a single command datapoint taking open,
//! close and stop tokens. Position feedback is optional: devices either
//! report a real percentage on a second datapoint, or the position is
//! approximated by timing travel ("fake" positioning) with a deferred
//! stop fired from the poll loop.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::{CoverConfig, PositioningMode};
use crate::dps::{DpsId, DpsValue};
use crate::error::{DecodeError, Error};
use crate::state::DeviceState;
use crate::types::Position;

use super::CommandPlan;

/// Command for a cover entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverCommand {
    /// Start opening.
    Open,
    /// Start closing.
    Close,
    /// Halt movement.
    Stop,
    /// Travel to a target position.
    SetPosition(Position),
}

impl CoverCommand {
    /// Returns the command name used in errors and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Stop => "stop",
            Self::SetPosition(_) => "set_position",
        }
    }
}

/// Derived state of a cover entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverView {
    /// Last known position: the reported percentage when a position
    /// datapoint is configured, the simulated value under fake
    /// positioning, the assumed midpoint otherwise. `None` once a
    /// configured position datapoint stops reporting.
    pub position: Option<Position>,
    /// The device last echoed its open command.
    pub is_opening: bool,
    /// The device last echoed its close command.
    pub is_closing: bool,
    /// Fully open; `None` unless the device reports real positions.
    pub is_open: Option<bool>,
    /// Fully closed; `None` unless the device reports real positions.
    pub is_closed: Option<bool>,
    /// A simulated motion is pending its deferred stop.
    pub is_moving: bool,
}

/// Fake-positioning state machine. At most one motion is pending per
/// cover; arming while moving replaces the deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Motion {
    Idle,
    Moving { deadline: Instant },
}

#[derive(Debug)]
pub(crate) struct CoverTranslator {
    config: CoverConfig,
    position: Option<Position>,
    is_opening: bool,
    is_closing: bool,
    motion: Motion,
}

impl CoverTranslator {
    pub(crate) fn new(config: CoverConfig) -> Self {
        Self {
            config,
            position: Some(Position::UNKNOWN_MIDPOINT),
            is_opening: false,
            is_closing: false,
            motion: Motion::Idle,
        }
    }

    pub(crate) fn apply_command(&mut self, command: &CoverCommand) -> Result<CommandPlan, Error> {
        // An explicit command supersedes a pending simulated motion;
        // the superseded motion's deferred stop is never issued.
        self.motion = Motion::Idle;

        match command {
            CoverCommand::Open => {
                self.is_opening = true;
                self.is_closing = false;
                Ok(self.token_write(self.config.open_close_cmds.open_token()))
            }
            CoverCommand::Close => {
                self.is_opening = false;
                self.is_closing = true;
                Ok(self.token_write(self.config.open_close_cmds.close_token()))
            }
            CoverCommand::Stop => {
                self.is_opening = false;
                self.is_closing = false;
                Ok(self.token_write(self.config.open_close_cmds.stop_token()))
            }
            CoverCommand::SetPosition(target) => self.plan_set_position(*target),
        }
    }

    fn token_write(&self, token: &'static str) -> CommandPlan {
        CommandPlan::single(self.config.command_dp, token)
    }

    fn plan_set_position(&mut self, target: Position) -> Result<CommandPlan, Error> {
        match self.config.positioning {
            PositioningMode::None => Err(Error::UnsupportedCommand {
                command: "set_position",
            }),
            PositioningMode::Position => {
                if let Some(dp) = self.config.set_position_dp {
                    tracing::debug!(target = %target, dp = %dp, "Writing target position");
                    Ok(CommandPlan::single(dp, target.value()))
                } else {
                    // No target datapoint to write; the device's own
                    // feedback arrives with the next poll.
                    tracing::debug!(target = %target, "No set-position datapoint configured, ignoring");
                    Ok(CommandPlan::no_writes())
                }
            }
            PositioningMode::Fake => Ok(self.plan_fake_motion(target)),
        }
    }

    /// Starts a simulated motion towards `target`.
    ///
    /// Travel time scales linearly with the distance: half the range
    /// takes the configured span time. The direction token is written
    /// immediately; the stop is deferred until the deadline fires on
    /// the poll loop.
    fn plan_fake_motion(&mut self, target: Position) -> CommandPlan {
        let current = self.position.unwrap_or(Position::UNKNOWN_MIDPOINT);
        let delta = f64::from(current.value().abs_diff(target.value()));
        let delay = Duration::from_secs_f64(delta / 50.0 * self.config.span_time);

        let token = if target > current {
            self.is_opening = true;
            self.is_closing = false;
            self.config.open_close_cmds.open_token()
        } else {
            self.is_opening = false;
            self.is_closing = true;
            self.config.open_close_cmds.close_token()
        };
        tracing::debug!(target = %target, current = %current, ?delay, "Simulating cover travel");
        self.token_write(token).with_motion(delay)
    }

    pub(crate) fn arm_motion(&mut self, deadline: Instant) {
        self.motion = Motion::Moving { deadline };
    }

    pub(crate) fn motion_deadline(&self) -> Option<Instant> {
        match self.motion {
            Motion::Moving { deadline } => Some(deadline),
            Motion::Idle => None,
        }
    }

    /// Completes a motion whose deadline has passed, returning the
    /// deferred stop write. The simulated position snaps back to the
    /// midpoint because timed travel gives no better estimate.
    pub(crate) fn take_due_stop(&mut self, now: Instant) -> Option<(DpsId, DpsValue)> {
        match self.motion {
            Motion::Moving { deadline } if deadline <= now => {
                self.motion = Motion::Idle;
                self.position = Some(Position::UNKNOWN_MIDPOINT);
                self.is_opening = false;
                self.is_closing = false;
                Some((
                    self.config.command_dp,
                    DpsValue::from(self.config.open_close_cmds.stop_token()),
                ))
            }
            _ => None,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub(crate) fn on_status(&mut self, state: &DeviceState) {
        match state.get(self.config.command_dp) {
            Some(DpsValue::Str(token)) => {
                self.is_opening = token == self.config.open_close_cmds.open_token();
                self.is_closing = token == self.config.open_close_cmds.close_token();
            }
            Some(_) => {
                let error = DecodeError::WrongKind {
                    id: self.config.command_dp,
                    expected: "string",
                };
                tracing::warn!(dp = %self.config.command_dp, error = %error, "Keeping previous command echo");
            }
            None => {
                // Nothing echoed yet, so the cover is not known to move
                self.is_opening = false;
                self.is_closing = false;
            }
        }

        if let Some(dp) = self.config.current_position_dp {
            match state.get(dp) {
                Some(value) => match value.as_i64() {
                    Some(raw) => {
                        if !(0..=100).contains(&raw) {
                            let error = DecodeError::NumberOutOfRange { id: dp, value: raw };
                            tracing::warn!(dp = %dp, error = %error, "Clamping position report");
                        }
                        self.position = Some(Position::clamped(raw.clamp(0, 100) as u8));
                    }
                    None => {
                        let error = DecodeError::WrongKind {
                            id: dp,
                            expected: "number",
                        };
                        tracing::warn!(dp = %dp, error = %error, "Keeping previous position");
                    }
                },
                None => self.position = None,
            }
        }
    }

    pub(crate) fn view(&self) -> CoverView {
        let (is_open, is_closed) = if self.config.positioning == PositioningMode::Position {
            (
                Some(self.position.is_some_and(|p| p.is_fully_open())),
                Some(self.position.is_some_and(|p| p.is_fully_closed())),
            )
        } else {
            (None, None)
        };

        CoverView {
            position: self.position,
            is_opening: self.is_opening,
            is_closing: self.is_closing,
            is_open,
            is_closed,
            is_moving: matches!(self.motion, Motion::Moving { .. }),
        }
    }
}
