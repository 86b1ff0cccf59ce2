// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device and entity configuration types.
//!
//! A [`DeviceConfig`] describes one physical device and how often to poll
//! it. Each entity hosted by the device gets its own config struct naming
//! the datapoints it lives on; the defaults follow the ids Tuya firmware
//! assigns most commonly, and every id can be overridden for devices that
//! deviate.

use std::fmt;
use std::num::NonZeroU8;
use std::time::Duration;

use crate::dps::DpsId;
use crate::error::ConfigError;
use crate::types::MiredRange;

const DP_LIGHT_MODE: DpsId = DpsId::from_nonzero(NonZeroU8::new(2).unwrap());
const DP_LIGHT_BRIGHTNESS: DpsId = DpsId::from_nonzero(NonZeroU8::new(3).unwrap());
const DP_LIGHT_COLOR_TEMP: DpsId = DpsId::from_nonzero(NonZeroU8::new(4).unwrap());
const DP_LIGHT_COLOR: DpsId = DpsId::from_nonzero(NonZeroU8::new(5).unwrap());
const DP_FAN_SPEED: DpsId = DpsId::from_nonzero(NonZeroU8::new(2).unwrap());
const DP_FAN_OSCILLATION: DpsId = DpsId::from_nonzero(NonZeroU8::new(8).unwrap());

/// Identifier of a physical Tuya device.
///
/// Tuya assigns each device an opaque string id (e.g. `"bf6d7c8a4e..."`);
/// this newtype keeps it from being confused with friendly names or
/// datapoint ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(String);

impl DeviceId {
    /// Creates a device id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DeviceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Configuration for one polled device.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use loctuya_lib::config::DeviceConfig;
///
/// let config = DeviceConfig::new("bf6d7c8a4e21f09bc3wxyz")
///     .with_friendly_name("Bedroom Lamp")
///     .with_poll_interval(Duration::from_secs(10));
/// assert_eq!(config.name(), "Bedroom Lamp");
/// ```
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// The device identifier.
    pub id: DeviceId,
    /// Optional human-readable name used in logs.
    pub friendly_name: Option<String>,
    /// Interval between status polls.
    pub poll_interval: Duration,
    /// Upper bound on a single status fetch before it counts as failed.
    pub poll_timeout: Duration,
}

impl DeviceConfig {
    /// Default interval between status polls (30 seconds).
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

    /// Default timeout for one status fetch (5 seconds).
    pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a configuration with default polling settings.
    #[must_use]
    pub fn new(id: impl Into<DeviceId>) -> Self {
        Self {
            id: id.into(),
            friendly_name: None,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            poll_timeout: Self::DEFAULT_POLL_TIMEOUT,
        }
    }

    /// Sets a friendly name for the device.
    #[must_use]
    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    /// Sets the interval between status polls.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the per-fetch timeout.
    #[must_use]
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Returns the friendly name, falling back to the device id.
    #[must_use]
    pub fn name(&self) -> &str {
        self.friendly_name.as_deref().unwrap_or(self.id.as_str())
    }
}

/// Token pair a cover expects on its command datapoint.
///
/// Tuya cover firmware comes in two vocabularies; both stop with the
/// literal `"stop"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OpenCloseCommands {
    /// The cover speaks `"on"` / `"off"`.
    #[default]
    OnOff,
    /// The cover speaks `"open"` / `"close"`.
    OpenClose,
}

impl OpenCloseCommands {
    /// Returns the token that starts opening.
    #[must_use]
    pub const fn open_token(&self) -> &'static str {
        match self {
            Self::OnOff => "on",
            Self::OpenClose => "open",
        }
    }

    /// Returns the token that starts closing.
    #[must_use]
    pub const fn close_token(&self) -> &'static str {
        match self {
            Self::OnOff => "off",
            Self::OpenClose => "close",
        }
    }

    /// Returns the token that halts movement.
    #[must_use]
    pub const fn stop_token(&self) -> &'static str {
        "stop"
    }
}

/// How a cover's position is tracked, if at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PositioningMode {
    /// Open/close/stop only; no position concept.
    #[default]
    None,
    /// The device reports real position on a dedicated datapoint.
    Position,
    /// Position is approximated by timing open/close travel.
    Fake,
}

impl PositioningMode {
    /// Returns the configuration vocabulary name of the mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Position => "position",
            Self::Fake => "fake",
        }
    }
}

impl fmt::Display for PositioningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration for a cover entity.
///
/// # Examples
///
/// ```
/// use loctuya_lib::config::{CoverConfig, PositioningMode};
/// use loctuya_lib::dps::DpsId;
///
/// let config = CoverConfig::new(DpsId::new(1).unwrap())
///     .with_positioning(PositioningMode::Fake)
///     .with_span_time(18.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct CoverConfig {
    /// Datapoint receiving the open/close/stop tokens.
    pub command_dp: DpsId,
    /// Which token vocabulary the firmware expects.
    pub open_close_cmds: OpenCloseCommands,
    /// How position is tracked.
    pub positioning: PositioningMode,
    /// Datapoint reporting real position, when the device has feedback.
    pub current_position_dp: Option<DpsId>,
    /// Datapoint accepting a target position, when the device has one.
    pub set_position_dp: Option<DpsId>,
    /// Seconds the cover needs to travel its full range.
    pub span_time: f64,
}

impl CoverConfig {
    /// Default full-travel time in seconds.
    pub const DEFAULT_SPAN_TIME: f64 = 25.0;

    /// Shortest accepted full-travel time in seconds.
    pub const MIN_SPAN_TIME: f64 = 1.0;

    /// Longest accepted full-travel time in seconds.
    pub const MAX_SPAN_TIME: f64 = 300.0;

    /// Creates a cover configuration with no positioning.
    #[must_use]
    pub fn new(command_dp: DpsId) -> Self {
        Self {
            command_dp,
            open_close_cmds: OpenCloseCommands::default(),
            positioning: PositioningMode::default(),
            current_position_dp: None,
            set_position_dp: None,
            span_time: Self::DEFAULT_SPAN_TIME,
        }
    }

    /// Sets the command token vocabulary.
    #[must_use]
    pub fn with_open_close_cmds(mut self, cmds: OpenCloseCommands) -> Self {
        self.open_close_cmds = cmds;
        self
    }

    /// Sets the positioning mode.
    #[must_use]
    pub fn with_positioning(mut self, mode: PositioningMode) -> Self {
        self.positioning = mode;
        self
    }

    /// Sets the datapoint that reports real position.
    #[must_use]
    pub fn with_current_position_dp(mut self, dp: DpsId) -> Self {
        self.current_position_dp = Some(dp);
        self
    }

    /// Sets the datapoint that accepts a target position.
    #[must_use]
    pub fn with_set_position_dp(mut self, dp: DpsId) -> Self {
        self.set_position_dp = Some(dp);
        self
    }

    /// Sets the full-travel time in seconds.
    #[must_use]
    pub fn with_span_time(mut self, seconds: f64) -> Self {
        self.span_time = seconds;
        self
    }

    /// Checks the configuration for values the translators cannot work
    /// with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::SpanTimeOutOfRange` if the span time is not
    /// within [1.0, 300.0] seconds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(Self::MIN_SPAN_TIME..=Self::MAX_SPAN_TIME).contains(&self.span_time) {
            return Err(ConfigError::SpanTimeOutOfRange(self.span_time));
        }
        Ok(())
    }
}

/// Configuration for a fan entity.
///
/// # Examples
///
/// ```
/// use loctuya_lib::config::FanConfig;
/// use loctuya_lib::dps::DpsId;
///
/// let config = FanConfig::new(DpsId::new(1).unwrap());
/// assert_eq!(config.speed_dp.value(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct FanConfig {
    /// Boolean datapoint switching the fan on and off.
    pub power_dp: DpsId,
    /// Enumerated datapoint holding the speed step.
    pub speed_dp: DpsId,
    /// Boolean datapoint for oscillation, absent on fixed-head fans.
    pub oscillation_dp: Option<DpsId>,
}

impl FanConfig {
    /// Creates a fan configuration with the common datapoint layout
    /// (speed on 2, oscillation on 8).
    #[must_use]
    pub fn new(power_dp: DpsId) -> Self {
        Self {
            power_dp,
            speed_dp: DP_FAN_SPEED,
            oscillation_dp: Some(DP_FAN_OSCILLATION),
        }
    }

    /// Sets the speed datapoint.
    #[must_use]
    pub fn with_speed_dp(mut self, dp: DpsId) -> Self {
        self.speed_dp = dp;
        self
    }

    /// Sets the oscillation datapoint.
    #[must_use]
    pub fn with_oscillation_dp(mut self, dp: DpsId) -> Self {
        self.oscillation_dp = Some(dp);
        self
    }

    /// Removes oscillation support.
    #[must_use]
    pub fn without_oscillation(mut self) -> Self {
        self.oscillation_dp = None;
        self
    }
}

/// Configuration for a light entity.
///
/// Brightness-only lights need nothing beyond the power datapoint.
/// Tunable-white lights add a [`MiredRange`]; RGB lights additionally
/// enable colour support.
///
/// # Examples
///
/// ```
/// use loctuya_lib::config::LightConfig;
/// use loctuya_lib::dps::DpsId;
/// use loctuya_lib::types::MiredRange;
///
/// let config = LightConfig::new(DpsId::new(1).unwrap())
///     .with_color_temp(MiredRange::new(167, 370).unwrap())
///     .with_color_support();
/// assert!(config.supports_color);
/// ```
#[derive(Debug, Clone)]
pub struct LightConfig {
    /// Boolean datapoint switching the light on and off.
    pub power_dp: DpsId,
    /// String datapoint holding the `white`/`colour` mode.
    pub mode_dp: DpsId,
    /// Numeric datapoint holding white-mode brightness.
    pub brightness_dp: DpsId,
    /// Numeric datapoint holding the raw colour temperature.
    pub color_temp_dp: DpsId,
    /// String datapoint holding the packed colour hex.
    pub color_dp: DpsId,
    /// Colour temperature window, absent on fixed-white bulbs.
    pub color_temp: Option<MiredRange>,
    /// Whether the bulb has an RGB colour channel.
    pub supports_color: bool,
}

impl LightConfig {
    /// Creates a light configuration with the common datapoint layout
    /// (mode 2, brightness 3, temperature 4, colour 5) and no colour
    /// temperature or RGB support.
    #[must_use]
    pub fn new(power_dp: DpsId) -> Self {
        Self {
            power_dp,
            mode_dp: DP_LIGHT_MODE,
            brightness_dp: DP_LIGHT_BRIGHTNESS,
            color_temp_dp: DP_LIGHT_COLOR_TEMP,
            color_dp: DP_LIGHT_COLOR,
            color_temp: None,
            supports_color: false,
        }
    }

    /// Sets the mode datapoint.
    #[must_use]
    pub fn with_mode_dp(mut self, dp: DpsId) -> Self {
        self.mode_dp = dp;
        self
    }

    /// Sets the brightness datapoint.
    #[must_use]
    pub fn with_brightness_dp(mut self, dp: DpsId) -> Self {
        self.brightness_dp = dp;
        self
    }

    /// Sets the colour temperature datapoint.
    #[must_use]
    pub fn with_color_temp_dp(mut self, dp: DpsId) -> Self {
        self.color_temp_dp = dp;
        self
    }

    /// Sets the packed colour datapoint.
    #[must_use]
    pub fn with_color_dp(mut self, dp: DpsId) -> Self {
        self.color_dp = dp;
        self
    }

    /// Enables colour temperature control within the given window.
    #[must_use]
    pub fn with_color_temp(mut self, range: MiredRange) -> Self {
        self.color_temp = Some(range);
        self
    }

    /// Enables the RGB colour channel.
    #[must_use]
    pub fn with_color_support(mut self) -> Self {
        self.supports_color = true;
        self
    }
}

/// Configuration for a switch entity.
///
/// Smart plugs often expose instantaneous readings next to the relay;
/// the three monitoring datapoints are optional and reported raw.
///
/// # Examples
///
/// ```
/// use loctuya_lib::config::SwitchConfig;
/// use loctuya_lib::dps::DpsId;
///
/// let config = SwitchConfig::new(DpsId::new(1).unwrap())
///     .with_current_dp(DpsId::new(18).unwrap())
///     .with_current_consumption_dp(DpsId::new(19).unwrap())
///     .with_voltage_dp(DpsId::new(20).unwrap());
/// assert!(config.voltage_dp.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct SwitchConfig {
    /// Boolean datapoint switching the relay.
    pub power_dp: DpsId,
    /// Datapoint reporting instantaneous current, in milliamperes.
    pub current_dp: Option<DpsId>,
    /// Datapoint reporting instantaneous consumption, in tenths of a watt.
    pub current_consumption_dp: Option<DpsId>,
    /// Datapoint reporting mains voltage, in tenths of a volt.
    pub voltage_dp: Option<DpsId>,
}

impl SwitchConfig {
    /// Creates a switch configuration without monitoring datapoints.
    #[must_use]
    pub fn new(power_dp: DpsId) -> Self {
        Self {
            power_dp,
            current_dp: None,
            current_consumption_dp: None,
            voltage_dp: None,
        }
    }

    /// Sets the current-monitoring datapoint.
    #[must_use]
    pub fn with_current_dp(mut self, dp: DpsId) -> Self {
        self.current_dp = Some(dp);
        self
    }

    /// Sets the consumption-monitoring datapoint.
    #[must_use]
    pub fn with_current_consumption_dp(mut self, dp: DpsId) -> Self {
        self.current_consumption_dp = Some(dp);
        self
    }

    /// Sets the voltage-monitoring datapoint.
    #[must_use]
    pub fn with_voltage_dp(mut self, dp: DpsId) -> Self {
        self.voltage_dp = Some(dp);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dp(id: u8) -> DpsId {
        DpsId::new(id).unwrap()
    }

    #[test]
    fn device_config_defaults() {
        let config = DeviceConfig::new("bfabcdef12345678");
        assert_eq!(config.id.as_str(), "bfabcdef12345678");
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.poll_timeout, Duration::from_secs(5));
        // Without a friendly name, logs fall back to the id
        assert_eq!(config.name(), "bfabcdef12345678");
    }

    #[test]
    fn device_config_builders() {
        let config = DeviceConfig::new("bfabcdef12345678")
            .with_friendly_name("Living Room Blind")
            .with_poll_interval(Duration::from_secs(10))
            .with_poll_timeout(Duration::from_secs(2));
        assert_eq!(config.name(), "Living Room Blind");
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.poll_timeout, Duration::from_secs(2));
    }

    #[test]
    fn open_close_tokens() {
        let on_off = OpenCloseCommands::OnOff;
        assert_eq!(on_off.open_token(), "on");
        assert_eq!(on_off.close_token(), "off");
        assert_eq!(on_off.stop_token(), "stop");

        let open_close = OpenCloseCommands::OpenClose;
        assert_eq!(open_close.open_token(), "open");
        assert_eq!(open_close.close_token(), "close");
        assert_eq!(open_close.stop_token(), "stop");
    }

    #[test]
    fn open_close_default_is_on_off() {
        assert_eq!(OpenCloseCommands::default(), OpenCloseCommands::OnOff);
    }

    #[test]
    fn positioning_mode_default_and_names() {
        assert_eq!(PositioningMode::default(), PositioningMode::None);
        assert_eq!(PositioningMode::None.as_str(), "none");
        assert_eq!(PositioningMode::Position.as_str(), "position");
        assert_eq!(PositioningMode::Fake.as_str(), "fake");
    }

    #[test]
    fn cover_config_defaults() {
        let config = CoverConfig::new(dp(1));
        assert_eq!(config.command_dp, dp(1));
        assert_eq!(config.open_close_cmds, OpenCloseCommands::OnOff);
        assert_eq!(config.positioning, PositioningMode::None);
        assert!(config.current_position_dp.is_none());
        assert!(config.set_position_dp.is_none());
        assert!((config.span_time - 25.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn cover_config_span_time_bounds() {
        assert!(CoverConfig::new(dp(1)).with_span_time(1.0).validate().is_ok());
        assert!(
            CoverConfig::new(dp(1))
                .with_span_time(300.0)
                .validate()
                .is_ok()
        );

        let too_short = CoverConfig::new(dp(1)).with_span_time(0.5);
        assert!(matches!(
            too_short.validate(),
            Err(ConfigError::SpanTimeOutOfRange(_))
        ));

        let too_long = CoverConfig::new(dp(1)).with_span_time(301.0);
        assert!(too_long.validate().is_err());

        let not_a_number = CoverConfig::new(dp(1)).with_span_time(f64::NAN);
        assert!(not_a_number.validate().is_err());
    }

    #[test]
    fn fan_config_defaults() {
        let config = FanConfig::new(dp(1));
        assert_eq!(config.power_dp, dp(1));
        assert_eq!(config.speed_dp, dp(2));
        assert_eq!(config.oscillation_dp, Some(dp(8)));
    }

    #[test]
    fn fan_config_without_oscillation() {
        let config = FanConfig::new(dp(1)).without_oscillation();
        assert!(config.oscillation_dp.is_none());
    }

    #[test]
    fn light_config_defaults() {
        let config = LightConfig::new(dp(1));
        assert_eq!(config.power_dp, dp(1));
        assert_eq!(config.mode_dp, dp(2));
        assert_eq!(config.brightness_dp, dp(3));
        assert_eq!(config.color_temp_dp, dp(4));
        assert_eq!(config.color_dp, dp(5));
        assert!(config.color_temp.is_none());
        assert!(!config.supports_color);
    }

    #[test]
    fn light_config_color_options() {
        let range = MiredRange::new(167, 370).unwrap();
        let config = LightConfig::new(dp(1))
            .with_color_temp(range)
            .with_color_support();
        assert_eq!(config.color_temp, Some(range));
        assert!(config.supports_color);
    }

    #[test]
    fn switch_config_monitoring() {
        let config = SwitchConfig::new(dp(1))
            .with_current_dp(dp(18))
            .with_current_consumption_dp(dp(19))
            .with_voltage_dp(dp(20));
        assert_eq!(config.power_dp, dp(1));
        assert_eq!(config.current_dp, Some(dp(18)));
        assert_eq!(config.current_consumption_dp, Some(dp(19)));
        assert_eq!(config.voltage_dp, Some(dp(20)));
    }
}
