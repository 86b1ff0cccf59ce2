// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Colour types for light control.
//!
//! This module provides the hue/saturation colour used by RGB bulbs and
//! the per-device colour temperature window of tunable-white bulbs.
//! Tuya carries colour as packed hex on a single datapoint and colour
//! temperature as an inverted 8-bit raw value, so both types own their
//! wire conversions.

use std::fmt;

use crate::error::{ConfigError, ValueError};

/// Hue/saturation colour of an RGB bulb.
///
/// The third channel of the colour triple is brightness, which Tuya
/// tracks separately, so this type carries only hue (0-360 degrees) and
/// saturation (0-100 percent).
///
/// The default colour is fully desaturated (hue 0, saturation 0), the
/// reading a bulb reports in white mode.
///
/// # Examples
///
/// ```
/// use loctuya_lib::types::HsColor;
///
/// let magenta = HsColor::new(300, 50).unwrap();
/// assert_eq!(magenta.hue(), 300);
/// assert_eq!(magenta.saturation(), 50);
///
/// // Out-of-range components return error
/// assert!(HsColor::new(361, 50).is_err());
/// assert!(HsColor::new(300, 101).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HsColor {
    hue: u16,
    saturation: u8,
}

impl HsColor {
    /// Creates a new hue/saturation colour.
    ///
    /// # Arguments
    ///
    /// * `hue` - Hue in degrees (0-360, where 360 wraps to 0)
    /// * `saturation` - Saturation percentage (0-100)
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidHue` or `ValueError::InvalidSaturation`
    /// if a component is out of range.
    pub fn new(hue: u16, saturation: u8) -> Result<Self, ValueError> {
        if hue > 360 {
            return Err(ValueError::InvalidHue(hue));
        }
        if saturation > 100 {
            return Err(ValueError::InvalidSaturation(saturation));
        }
        Ok(Self { hue, saturation })
    }

    /// Returns the hue in degrees.
    #[must_use]
    pub const fn hue(&self) -> u16 {
        self.hue
    }

    /// Returns the saturation percentage.
    #[must_use]
    pub const fn saturation(&self) -> u8 {
        self.saturation
    }

    /// Renders this colour as RGB channels at the given lightness.
    ///
    /// `lightness` is a percentage (0-100) that fills the value channel
    /// of the HSV triple; Tuya bulbs embed it in the colour datapoint
    /// next to the RGB channels.
    ///
    /// # Examples
    ///
    /// ```
    /// use loctuya_lib::types::HsColor;
    ///
    /// let red = HsColor::new(0, 100).unwrap();
    /// assert_eq!(red.to_rgb(100), (255, 0, 0));
    /// assert_eq!(red.to_rgb(50), (128, 0, 0));
    /// ```
    #[must_use]
    pub fn to_rgb(&self, lightness: u8) -> (u8, u8, u8) {
        hsv_to_rgb(self.hue, self.saturation, lightness.min(100))
    }

    /// Recovers hue and saturation from RGB channels.
    ///
    /// The value channel of the conversion is discarded; brightness is
    /// read from its own field of the colour datapoint.
    ///
    /// # Examples
    ///
    /// ```
    /// use loctuya_lib::types::HsColor;
    ///
    /// let color = HsColor::from_rgb(128, 64, 128);
    /// assert_eq!(color.hue(), 300);
    /// assert_eq!(color.saturation(), 50);
    /// ```
    #[must_use]
    pub fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        let (hue, saturation) = rgb_to_hs(red, green, blue);
        Self { hue, saturation }
    }
}

impl fmt::Display for HsColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\u{b0}/{}%", self.hue, self.saturation)
    }
}

/// Colour temperature window of a tunable-white light, in mireds.
///
/// Tuya encodes colour temperature as an inverted 8-bit raw value where
/// 255 is the coolest supported temperature and 0 the warmest, scaled
/// to the bounds of the individual bulb. The bounds therefore live in
/// device configuration and this type owns the raw codec.
///
/// # Examples
///
/// ```
/// use loctuya_lib::types::MiredRange;
///
/// let range = MiredRange::new(167, 370).unwrap();
/// assert_eq!(range.encode(167), 255);
/// assert_eq!(range.encode(370), 0);
/// assert_eq!(range.decode(100), 290);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MiredRange {
    min: u16,
    max: u16,
}

impl MiredRange {
    /// Creates a colour temperature window.
    ///
    /// # Arguments
    ///
    /// * `min` - Coolest supported temperature in mireds
    /// * `max` - Warmest supported temperature in mireds
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidMiredRange` if `min` is zero or not
    /// strictly below `max`.
    pub fn new(min: u16, max: u16) -> Result<Self, ConfigError> {
        if min == 0 || min >= max {
            return Err(ConfigError::InvalidMiredRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Returns the coolest supported temperature in mireds.
    #[must_use]
    pub const fn min(&self) -> u16 {
        self.min
    }

    /// Returns the warmest supported temperature in mireds.
    #[must_use]
    pub const fn max(&self) -> u16 {
        self.max
    }

    /// Clamps a mired value into this window.
    #[must_use]
    pub const fn clamp(&self, mireds: u16) -> u16 {
        if mireds < self.min {
            self.min
        } else if mireds > self.max {
            self.max
        } else {
            mireds
        }
    }

    /// Encodes a mired value as the raw byte written to the device.
    ///
    /// Out-of-window input is clamped first. The scale is inverted:
    /// the window minimum maps to 255 and the maximum to 0.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn encode(&self, mireds: u16) -> u8 {
        let m = self.clamp(mireds);
        let span = f32::from(self.max - self.min);
        let raw = 255.0 - f32::from(m - self.min) / span * 255.0;
        raw.round() as u8
    }

    /// Decodes a raw device byte back into mireds.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn decode(&self, raw: u8) -> u16 {
        let span = f32::from(self.max - self.min);
        let mireds = (255.0 - f32::from(raw)) / 255.0 * span + f32::from(self.min);
        mireds.round() as u16
    }
}

impl fmt::Display for MiredRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} mireds", self.min, self.max)
    }
}

/// Converts HSV components to RGB channels.
///
/// Takes (hue: 0-360, saturation: 0-100, value: 0-100)
/// Returns (red: 0-255, green: 0-255, blue: 0-255)
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::many_single_char_names
)]
fn hsv_to_rgb(h: u16, s: u8, v: u8) -> (u8, u8, u8) {
    let s = f32::from(s) / 100.0;
    let v = f32::from(v) / 100.0;
    let h = f32::from(h);

    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    )
}

/// Extracts hue and saturation from RGB channels.
///
/// Returns (hue: 0-360, saturation: 0-100). The value channel is not
/// returned because the colour datapoint carries brightness separately.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::many_single_char_names
)]
fn rgb_to_hs(r: u8, g: u8, b: u8) -> (u16, u8) {
    let r = f32::from(r) / 255.0;
    let g = f32::from(g) / 255.0;
    let b = f32::from(b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    // Saturation (0-100)
    let saturation = if max == 0.0 {
        0
    } else {
        ((delta / max) * 100.0).round() as u8
    };

    // Hue (0-360)
    let hue = if delta < f32::EPSILON {
        0
    } else if (max - r).abs() < f32::EPSILON {
        let h = 60.0 * (((g - b) / delta) % 6.0);
        if h < 0.0 {
            (h + 360.0).round() as u16
        } else {
            h.round() as u16
        }
    } else if (max - g).abs() < f32::EPSILON {
        (60.0 * (((b - r) / delta) + 2.0)).round() as u16
    } else {
        (60.0 * (((r - g) / delta) + 4.0)).round() as u16
    };

    (hue, saturation)
}
