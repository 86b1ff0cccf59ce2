// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan speed type.
//!
//! Tuya fans expose three discrete speed steps on their speed datapoint,
//! encoded as the strings `"1"`, `"2"` and `"3"`. Off is not a speed on
//! the wire; it is expressed through the power datapoint.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Discrete speed setting of a Tuya fan.
///
/// # Examples
///
/// ```
/// use loctuya_lib::types::FanSpeed;
///
/// let speed = FanSpeed::Medium;
/// assert_eq!(speed.as_dps(), Some("2"));
/// assert_eq!(FanSpeed::from_dps("3"), Some(FanSpeed::High));
///
/// // Off has no wire encoding of its own
/// assert_eq!(FanSpeed::Off.as_dps(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FanSpeed {
    /// Fan is off.
    Off,
    /// Lowest speed step.
    Low,
    /// Middle speed step.
    Medium,
    /// Highest speed step.
    High,
}

impl FanSpeed {
    /// Returns the value written to the speed datapoint.
    ///
    /// [`FanSpeed::Off`] returns `None`; turning the fan off goes
    /// through the power datapoint instead.
    #[must_use]
    pub const fn as_dps(&self) -> Option<&'static str> {
        match self {
            Self::Off => None,
            Self::Low => Some("1"),
            Self::Medium => Some("2"),
            Self::High => Some("3"),
        }
    }

    /// Parses a speed datapoint value reported by the device.
    ///
    /// Returns `None` for encodings this library does not know, which
    /// callers treat as "keep the previous reading".
    #[must_use]
    pub fn from_dps(raw: &str) -> Option<Self> {
        match raw {
            "1" => Some(Self::Low),
            "2" => Some(Self::Medium),
            "3" => Some(Self::High),
            _ => None,
        }
    }

    /// Returns `true` if this is the off state.
    #[must_use]
    pub const fn is_off(&self) -> bool {
        matches!(self, Self::Off)
    }

    /// Returns the human-readable name of the speed step.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FanSpeed {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "0" => Ok(Self::Off),
            "low" | "1" => Ok(Self::Low),
            "medium" | "2" => Ok(Self::Medium),
            "high" | "3" => Ok(Self::High),
            _ => Err(ValueError::InvalidFanSpeed(s.to_string())),
        }
    }
}
