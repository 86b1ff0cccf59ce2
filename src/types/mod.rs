// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for local Tuya device control.
//!
//! This module provides type-safe representations of values carried in
//! device datapoints. Each type ensures values are within their valid
//! ranges at construction time, so the translators never have to
//! re-check them.
//!
//! # Types
//!
//! - [`Position`] - Cover position percentage (0-100)
//! - [`Brightness`] - Light brightness on the Tuya scale (26-255)
//! - [`HsColor`] - Hue/saturation pair for colour-mode lights
//! - [`MiredRange`] - Per-device colour temperature bounds and raw codec
//! - [`FanSpeed`] - Discrete fan speed steps

mod brightness;
mod color;
mod fan_speed;
mod position;

pub use brightness::Brightness;
pub use color::{HsColor, MiredRange};
pub use fan_speed::FanSpeed;
pub use position::Position;
