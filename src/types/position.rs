// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Position type for cover control.
//!
//! This module provides a type-safe representation of cover positions,
//! ensuring values are always within the valid range of 0-100%.

use std::fmt;

use crate::error::ValueError;

/// Cover position as a percentage (0-100).
///
/// Tuya covers report 0 for fully closed and 100 for fully open. Devices
/// without position feedback are modelled at the halfway point.
///
/// # Examples
///
/// ```
/// use loctuya_lib::types::Position;
///
/// // Create a position at 75%
/// let pos = Position::new(75).unwrap();
/// assert_eq!(pos.value(), 75);
///
/// // Use predefined values
/// let closed = Position::CLOSED;
/// let open = Position::OPEN;
/// assert_eq!(closed.value(), 0);
/// assert_eq!(open.value(), 100);
///
/// // Invalid values return error
/// assert!(Position::new(101).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position(u8);

impl Position {
    /// Fully closed position (0%).
    pub const CLOSED: Self = Self(0);

    /// Fully open position (100%).
    pub const OPEN: Self = Self(100);

    /// Assumed position for covers without position feedback (50%).
    pub const UNKNOWN_MIDPOINT: Self = Self(50);

    /// Creates a new position value.
    ///
    /// # Arguments
    ///
    /// * `value` - The position percentage (0-100)
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value exceeds 100.
    ///
    /// # Examples
    ///
    /// ```
    /// use loctuya_lib::types::Position;
    ///
    /// let pos = Position::new(50).unwrap();
    /// assert_eq!(pos.value(), 50);
    /// ```
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if value > 100 {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: 100,
                actual: u16::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Creates a position value, clamping to the valid range.
    ///
    /// Values above 100 are clamped to 100.
    ///
    /// # Examples
    ///
    /// ```
    /// use loctuya_lib::types::Position;
    ///
    /// let pos = Position::clamped(150);
    /// assert_eq!(pos.value(), 100);
    /// ```
    #[must_use]
    pub const fn clamped(value: u8) -> Self {
        if value > 100 { Self(100) } else { Self(value) }
    }

    /// Returns the position percentage value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Returns `true` if the cover is fully open (100%).
    #[must_use]
    pub const fn is_fully_open(&self) -> bool {
        self.0 == 100
    }

    /// Returns `true` if the cover is fully closed (0%).
    #[must_use]
    pub const fn is_fully_closed(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl TryFrom<u8> for Position {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
