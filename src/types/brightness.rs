// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Brightness type for light control.
//!
//! This module provides a type-safe representation of brightness on the
//! Tuya device scale. Bulbs misbehave below a raw value of 26 (roughly
//! 10%), so that is the floor of the valid range rather than zero.

use std::fmt;

use crate::error::ValueError;

/// Light brightness on the Tuya device scale (26-255).
///
/// Tuya bulbs take brightness as an 8-bit value but flicker or shut off
/// below 26, so values are kept in the 26-255 band. Use
/// [`Brightness::clamped`] when adopting raw device reports.
///
/// # Examples
///
/// ```
/// use loctuya_lib::types::Brightness;
///
/// let bri = Brightness::new(200).unwrap();
/// assert_eq!(bri.value(), 200);
///
/// // Raw reports below the floor are pulled up
/// assert_eq!(Brightness::clamped(10).value(), 26);
///
/// // Values below the floor return error
/// assert!(Brightness::new(25).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Brightness(u8);

impl Brightness {
    /// Minimum brightness the hardware renders reliably.
    pub const MIN: Self = Self(26);

    /// Maximum brightness.
    pub const MAX: Self = Self(255);

    /// Creates a new brightness value.
    ///
    /// # Arguments
    ///
    /// * `value` - Brightness on the device scale (26-255)
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value is below 26.
    ///
    /// # Examples
    ///
    /// ```
    /// use loctuya_lib::types::Brightness;
    ///
    /// let bri = Brightness::new(128).unwrap();
    /// assert_eq!(bri.value(), 128);
    /// ```
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if value < 26 {
            return Err(ValueError::OutOfRange {
                min: 26,
                max: 255,
                actual: u16::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Creates a brightness value, clamping to the valid range.
    ///
    /// Values below 26 are clamped to 26.
    ///
    /// # Examples
    ///
    /// ```
    /// use loctuya_lib::types::Brightness;
    ///
    /// let bri = Brightness::clamped(0);
    /// assert_eq!(bri.value(), 26);
    /// ```
    #[must_use]
    pub const fn clamped(value: u8) -> Self {
        if value < 26 { Self(26) } else { Self(value) }
    }

    /// Returns the brightness value on the device scale.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Returns the brightness as a lightness percentage (0-100).
    ///
    /// This is the form embedded in the colour datapoint of RGB bulbs.
    ///
    /// # Examples
    ///
    /// ```
    /// use loctuya_lib::types::Brightness;
    ///
    /// assert_eq!(Brightness::MAX.as_lightness(), 100);
    /// assert_eq!(Brightness::clamped(128).as_lightness(), 50);
    /// ```
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn as_lightness(&self) -> u8 {
        let percent = (f32::from(self.0) / 255.0 * 100.0).round() as u8;
        percent.min(100)
    }

    /// Creates a brightness from a lightness percentage.
    ///
    /// The inverse of [`as_lightness`](Self::as_lightness), used when
    /// decoding the colour datapoint. The conversion truncates the same
    /// way the bulbs do, so a round trip may drift by one step.
    ///
    /// # Examples
    ///
    /// ```
    /// use loctuya_lib::types::Brightness;
    ///
    /// assert_eq!(Brightness::from_lightness(100).value(), 255);
    /// assert_eq!(Brightness::from_lightness(50).value(), 127);
    /// assert_eq!(Brightness::from_lightness(0).value(), 26);
    /// ```
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_lightness(lightness: u8) -> Self {
        let raw = u32::from(lightness) * 255 / 100;
        Self::clamped(raw.min(255) as u8)
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/255", self.0)
    }
}

impl TryFrom<u8> for Brightness {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brightness_valid_values() {
        for v in 26..=255 {
            let bri = Brightness::new(v).unwrap();
            assert_eq!(bri.value(), v);
        }
    }

    #[test]
    fn brightness_below_floor() {
        assert!(Brightness::new(0).is_err());
        assert!(Brightness::new(25).is_err());
    }

    #[test]
    fn brightness_clamped() {
        assert_eq!(Brightness::clamped(0).value(), 26);
        assert_eq!(Brightness::clamped(25).value(), 26);
        assert_eq!(Brightness::clamped(26).value(), 26);
        assert_eq!(Brightness::clamped(200).value(), 200);
    }

    #[test]
    fn brightness_as_lightness() {
        assert_eq!(Brightness::MIN.as_lightness(), 10);
        assert_eq!(Brightness::clamped(128).as_lightness(), 50);
        assert_eq!(Brightness::MAX.as_lightness(), 100);
    }

    #[test]
    fn brightness_from_lightness() {
        assert_eq!(Brightness::from_lightness(0).value(), 26);
        assert_eq!(Brightness::from_lightness(10).value(), 26);
        assert_eq!(Brightness::from_lightness(50).value(), 127);
        assert_eq!(Brightness::from_lightness(100).value(), 255);
        // Malformed payloads can exceed 100 percent; the result saturates.
        assert_eq!(Brightness::from_lightness(255).value(), 255);
    }

    #[test]
    fn brightness_lightness_round_trip_drift_is_bounded() {
        for v in 26..=255u8 {
            let bri = Brightness::new(v).unwrap();
            let back = Brightness::from_lightness(bri.as_lightness());
            let drift = i16::from(back.value()) - i16::from(v);
            assert!(
                drift.abs() <= 2,
                "brightness {v} drifted to {} after round trip",
                back.value()
            );
        }
    }

    #[test]
    fn brightness_display() {
        assert_eq!(Brightness::new(200).unwrap().to_string(), "200/255");
    }
}
