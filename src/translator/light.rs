// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light translator.
//!
//! Tuya bulbs run in one of two modes reported on the mode datapoint:
//! `white` (brightness plus optional colour temperature on their own
//! datapoints) and `colour` (a single packed hex datapoint carrying
//! RGB, hue, saturation and lightness). The translator owns the mode
//! optimistically and reconciles it with device reports, so a snapshot
//! is always decoded against the mode it was produced under.

use std::fmt;

use crate::config::LightConfig;
use crate::dps::{DpsMap, DpsValue};
use crate::error::DecodeError;
use crate::state::DeviceState;
use crate::types::{Brightness, HsColor};

use super::CommandPlan;

/// Operating mode of a Tuya bulb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightMode {
    /// Brightness and colour temperature control.
    White,
    /// Hue/saturation colour control.
    Colour,
}

impl LightMode {
    /// Returns the token stored on the mode datapoint.
    #[must_use]
    pub const fn as_dps(&self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Colour => "colour",
        }
    }

    /// Parses a mode datapoint token. Unknown tokens return `None`,
    /// which callers treat as "keep the previous mode".
    #[must_use]
    pub fn from_dps(raw: &str) -> Option<Self> {
        match raw {
            "white" => Some(Self::White),
            "colour" => Some(Self::Colour),
            _ => None,
        }
    }
}

impl fmt::Display for LightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_dps())
    }
}

/// Settings carried by one turn-on command.
///
/// All fields are optional so a single command can adjust any subset,
/// batched into one device write.
///
/// # Examples
///
/// ```
/// use loctuya_lib::translator::LightSettings;
///
/// let settings = LightSettings::new()
///     .with_brightness(200)
///     .with_color_temp(290);
/// assert_eq!(settings.brightness, Some(200));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightSettings {
    /// Brightness on the device scale (0-255); values below the usable
    /// floor are pulled up to it.
    pub brightness: Option<u8>,
    /// Colour temperature in mireds; selects white mode. Ignored when
    /// the light has no configured mired range.
    pub color_temp: Option<u16>,
    /// Hue/saturation colour; selects colour mode unless the
    /// saturation is negligible. Ignored when the light has no colour
    /// support.
    pub hs: Option<HsColor>,
}

impl LightSettings {
    /// Creates empty settings; a bare turn-on.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the brightness.
    #[must_use]
    pub fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = Some(brightness);
        self
    }

    /// Sets the colour temperature in mireds.
    #[must_use]
    pub fn with_color_temp(mut self, mireds: u16) -> Self {
        self.color_temp = Some(mireds);
        self
    }

    /// Sets the hue/saturation colour.
    #[must_use]
    pub fn with_hs(mut self, hs: HsColor) -> Self {
        self.hs = Some(hs);
        self
    }
}

/// Command for a light entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightCommand {
    /// Switch on, applying the carried settings in the same write.
    TurnOn(LightSettings),
    /// Switch off.
    TurnOff,
}

impl LightCommand {
    /// Returns the command name used in errors and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TurnOn(_) => "turn_on",
            Self::TurnOff => "turn_off",
        }
    }
}

/// Derived state of a light entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightView {
    /// The light is powered on.
    pub is_on: bool,
    /// Current operating mode.
    pub mode: LightMode,
    /// Current brightness.
    pub brightness: Brightness,
    /// Colour temperature in mireds; `None` when the bulb has no
    /// configured mired range.
    pub color_temp: Option<u16>,
    /// Hue/saturation colour; fully desaturated while in white mode.
    pub hs_color: HsColor,
}

#[derive(Debug)]
pub(crate) struct LightTranslator {
    config: LightConfig,
    is_on: bool,
    mode: LightMode,
    brightness: Brightness,
    color_temp: Option<u16>,
    hs: HsColor,
}

impl LightTranslator {
    pub(crate) fn new(config: LightConfig) -> Self {
        // Optimistic defaults until the first snapshot arrives: full
        // white at the coolest supported temperature.
        let color_temp = config.color_temp.map(|range| range.min());
        Self {
            config,
            is_on: true,
            mode: LightMode::White,
            brightness: Brightness::MAX,
            color_temp,
            hs: HsColor::default(),
        }
    }

    pub(crate) fn apply_command(&mut self, command: &LightCommand) -> CommandPlan {
        match command {
            LightCommand::TurnOn(settings) => self.plan_turn_on(settings),
            LightCommand::TurnOff => {
                self.is_on = false;
                CommandPlan::single(self.config.power_dp, false)
            }
        }
    }

    /// Applies the settings to local state, then encodes the full
    /// current mode as one batched write.
    fn plan_turn_on(&mut self, settings: &LightSettings) -> CommandPlan {
        if let Some(brightness) = settings.brightness {
            self.brightness = Brightness::clamped(brightness);
        }

        if let Some(mireds) = settings.color_temp {
            if let Some(range) = self.config.color_temp {
                self.mode = LightMode::White;
                self.hs = HsColor::default();
                self.color_temp = Some(range.clamp(mireds));
            } else {
                tracing::warn!(mireds, "Colour temperature requested without a mired range, ignoring");
            }
        }

        // Processed after colour temperature, so a command carrying
        // both settles on colour mode
        if let Some(hs) = settings.hs {
            if self.config.supports_color {
                self.mode = if hs.saturation() < 5 {
                    LightMode::White
                } else {
                    LightMode::Colour
                };
                self.hs = hs;
            } else {
                tracing::warn!(color = %hs, "Colour requested without colour support, ignoring");
            }
        }

        let mut dps = DpsMap::new();
        match self.mode {
            LightMode::White => {
                dps.insert(self.config.brightness_dp, self.brightness.value());
                if let (Some(range), Some(mireds)) = (self.config.color_temp, self.color_temp) {
                    dps.insert(self.config.color_temp_dp, range.encode(mireds));
                }
                tracing::debug!(
                    brightness = %self.brightness,
                    color_temp = ?self.color_temp,
                    "Encoding white mode"
                );
            }
            LightMode::Colour => {
                let lightness = self.brightness.as_lightness();
                let (r, g, b) = self.hs.to_rgb(lightness);
                let hue = self.hs.hue();
                let sat = self.hs.saturation();
                let hex = format!("{r:02x}{g:02x}{b:02x}{hue:04x}{sat:02x}{lightness:02x}");
                tracing::debug!(color = %self.hs, brightness = %self.brightness, hex = %hex, "Encoding colour mode");
                dps.insert(self.config.color_dp, hex);
            }
        }
        dps.insert(self.config.mode_dp, self.mode.as_dps());
        dps.insert(self.config.power_dp, true);

        self.is_on = true;
        CommandPlan::batched(dps)
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

        match state.get(self.config.mode_dp) {
            Some(DpsValue::Str(raw)) => {
                if let Some(mode) = LightMode::from_dps(raw) {
                    self.mode = mode;
                } else {
                    let error = DecodeError::UnknownMode(raw.clone());
                    tracing::warn!(dp = %self.config.mode_dp, error = %error, "Keeping previous mode");
                }
            }
            Some(_) => {
                let error = DecodeError::WrongKind {
                    id: self.config.mode_dp,
                    expected: "string",
                };
                tracing::warn!(dp = %self.config.mode_dp, error = %error, "Keeping previous mode");
            }
            None => {}
        }

        // Decode against the reconciled mode, not the raw report
        match self.mode {
            LightMode::White => self.decode_white(state),
            LightMode::Colour => self.decode_colour(state),
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn decode_white(&mut self, state: &DeviceState) {
        if let Some(value) = state.get(self.config.brightness_dp) {
            match value.as_i64() {
                Some(raw) => {
                    if !(0..=255).contains(&raw) {
                        let error = DecodeError::NumberOutOfRange {
                            id: self.config.brightness_dp,
                            value: raw,
                        };
                        tracing::warn!(dp = %self.config.brightness_dp, error = %error, "Clamping brightness report");
                    }
                    self.brightness = Brightness::clamped(raw.clamp(0, 255) as u8);
                }
                None => {
                    let error = DecodeError::WrongKind {
                        id: self.config.brightness_dp,
                        expected: "number",
                    };
                    tracing::warn!(dp = %self.config.brightness_dp, error = %error, "Keeping previous brightness");
                }
            }
        }

        let Some(range) = self.config.color_temp else {
            return;
        };
        if let Some(value) = state.get(self.config.color_temp_dp) {
            match value.as_i64() {
                Some(raw) => {
                    if !(0..=255).contains(&raw) {
                        let error = DecodeError::NumberOutOfRange {
                            id: self.config.color_temp_dp,
                            value: raw,
                        };
                        tracing::warn!(dp = %self.config.color_temp_dp, error = %error, "Clamping colour temperature report");
                    }
                    self.color_temp = Some(range.decode(raw.clamp(0, 255) as u8));
                }
                None => {
                    let error = DecodeError::WrongKind {
                        id: self.config.color_temp_dp,
                        expected: "number",
                    };
                    tracing::warn!(dp = %self.config.color_temp_dp, error = %error, "Keeping previous colour temperature");
                }
            }
        }
    }

    fn decode_colour(&mut self, state: &DeviceState) {
        let Some(value) = state.get(self.config.color_dp) else {
            return;
        };
        let DpsValue::Str(hex) = value else {
            let error = DecodeError::WrongKind {
                id: self.config.color_dp,
                expected: "string",
            };
            tracing::warn!(dp = %self.config.color_dp, error = %error, "Keeping previous colour");
            return;
        };
        match parse_colour_hex(hex) {
            Ok((hs, brightness)) => {
                self.hs = hs;
                self.brightness = brightness;
            }
            Err(error) => {
                tracing::warn!(dp = %self.config.color_dp, error = %error, "Keeping previous colour");
            }
        }
    }

    pub(crate) fn view(&self) -> LightView {
        LightView {
            is_on: self.is_on,
            mode: self.mode,
            brightness: self.brightness,
            color_temp: self.color_temp,
            hs_color: if self.mode == LightMode::Colour {
                self.hs
            } else {
                HsColor::default()
            },
        }
    }
}

/// Parses the packed colour datapoint: `RRGGBB` + `HHHH` + `SS` + `LL`,
/// all lowercase hex.
///
/// Hue and saturation are recovered from the RGB channels; the hue and
/// saturation fields of the payload are not read. Brightness comes
/// from the trailing lightness byte.
fn parse_colour_hex(hex: &str) -> Result<(HsColor, Brightness), DecodeError> {
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|part| u8::from_str_radix(part, 16).ok())
            .ok_or_else(|| DecodeError::MalformedColour(hex.to_string()))
    };

    let red = channel(0..2)?;
    let green = channel(2..4)?;
    let blue = channel(4..6)?;
    let lightness = channel(12..14)?;

    Ok((
        HsColor::from_rgb(red, green, blue),
        Brightness::from_lightness(lightness),
    ))
}
