// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `LocTuya` library.
//!
//! This module provides the error hierarchy for failures across the library:
//! value validation, transport communication through a device link, raw
//! data-point decoding, and entity configuration.

use std::time::Duration;

use thiserror::Error;

use crate::dps::DpsId;

/// The main error type for this library.
///
/// This enum encompasses all possible errors that can occur when operating
/// a local Tuya device.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred while communicating through the device link.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Error occurred while decoding a raw data-point value.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Entity configuration is invalid or a required data point is unset.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The entity handle does not exist on this device.
    #[error("unknown entity {0}")]
    UnknownEntity(usize),

    /// The entity's device class or configuration does not support this
    /// command.
    #[error("entity does not accept {command} commands")]
    UnsupportedCommand {
        /// Name of the rejected command.
        command: &'static str,
    },

    /// The device is known to be unreachable; the caller may retry after the
    /// next successful poll.
    #[error("device {device_id} is unavailable")]
    DeviceUnavailable {
        /// Identifier of the unreachable device.
        device_id: String,
    },
}

/// Errors related to value validation and constraints.
///
/// These errors occur when attempting to create constrained types
/// with invalid values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u16,
        /// Maximum allowed value.
        max: u16,
        /// The actual value that was provided.
        actual: u16,
    },

    /// A hue value is outside the valid range (0-360).
    #[error("hue value {0} is out of range [0, 360]")]
    InvalidHue(u16),

    /// A saturation value is outside the valid range (0-100).
    #[error("saturation value {0} is out of range [0, 100]")]
    InvalidSaturation(u8),

    /// An invalid fan speed string was provided.
    #[error("invalid fan speed: {0}")]
    InvalidFanSpeed(String),

    /// A data-point id is outside the valid range (1-255).
    #[error("data-point id 0 is out of range [1, 255]")]
    InvalidDpsId,
}

/// Errors produced by a [`DeviceLink`](crate::link::DeviceLink)
/// implementation or by the poller's fetch timeout.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection to the device failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The device rejected or garbled a request.
    #[error("protocol failure: {0}")]
    Protocol(String),

    /// The operation did not complete in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while decoding a raw data-point value into domain state.
///
/// Decoding is field-scoped: a translator logs these and keeps the field's
/// previous value instead of failing the whole status update.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The data point holds a different primitive kind than expected.
    #[error("data point {id} holds a non-{expected} value")]
    WrongKind {
        /// The data-point id that was read.
        id: DpsId,
        /// The primitive kind the translator expected.
        expected: &'static str,
    },

    /// A packed colour string is too short or not hexadecimal.
    #[error("malformed colour string {0:?}")]
    MalformedColour(String),

    /// The mode data point holds neither of the two known mode strings.
    #[error("unknown light mode {0:?}")]
    UnknownMode(String),

    /// The speed data point holds an unmapped enumeration value.
    #[error("unknown fan speed value {0:?}")]
    UnknownSpeed(String),

    /// A numeric data point is outside its documented range.
    #[error("data point {id} value {value} is out of range")]
    NumberOutOfRange {
        /// The data-point id that was read.
        id: DpsId,
        /// The offending raw value.
        value: i64,
    },
}

/// Errors related to entity configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Full-travel span time is outside the supported range.
    #[error("span time {0} s is out of range [1.0, 300.0]")]
    SpanTimeOutOfRange(f64),

    /// The configured mired bounds are inverted or degenerate.
    #[error("invalid mired range [{min}, {max}]")]
    InvalidMiredRange {
        /// Configured cool bound.
        min: u16,
        /// Configured warm bound.
        max: u16,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::OutOfRange {
            min: 0,
            max: 100,
            actual: 150,
        };
        assert_eq!(err.to_string(), "value 150 is out of range [0, 100]");
    }

    #[test]
    fn error_from_value_error() {
        let value_err = ValueError::InvalidHue(400);
        let err: Error = value_err.into();
        assert!(matches!(err, Error::Value(ValueError::InvalidHue(400))));
    }

    #[test]
    fn transport_error_display() {
        let err = TransportError::Timeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "request timed out after 5s");
    }

    #[test]
    fn decode_error_display() {
        let err = DecodeError::MalformedColour("ff00".to_string());
        assert_eq!(err.to_string(), "malformed colour string \"ff00\"");
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::SpanTimeOutOfRange(500.0);
        assert_eq!(err.to_string(), "span time 500 s is out of range [1.0, 300.0]");
    }

    #[test]
    fn error_from_config_error() {
        let err: Error = ConfigError::InvalidMiredRange { min: 370, max: 167 }.into();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidMiredRange { min: 370, max: 167 })
        ));
    }
}
