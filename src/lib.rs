// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `LocTuya` Lib - A Rust library to operate local Tuya devices.
//!
//! Tuya devices on the local network speak in numbered data points
//! (DPS): a status fetch returns a map like `{"1": true, "2": "white",
//! "3": 255}`, and commands are writes into the same map. This library
//! keeps a polled cache of that map per device and translates it into
//! typed entity state and back.
//!
//! # Supported Features
//!
//! - **Polled state cache**: full DPS snapshot on a fixed interval;
//!   stale values survive outages and availability is tracked
//! - **Capability translators**: covers, fans, lights and switches
//!   derived from raw data points
//! - **Optimistic commands**: writes apply to the local view at once,
//!   the next poll reconciles with the device
//! - **Simulated cover positioning**: timed open/close travel with a
//!   deferred stop for covers without position feedback
//! - **Pluggable transport**: bring any Tuya 3.x client by implementing
//!   the [`DeviceLink`] trait
//!
//! # Quick Start
//!
//! ```no_run
//! use loctuya_lib::config::{DeviceConfig, SwitchConfig};
//! use loctuya_lib::dps::DpsId;
//! use loctuya_lib::translator::SwitchCommand;
//! use loctuya_lib::Device;
//! use tokio_util::sync::CancellationToken;
//!
//! # struct TuyaTcpLink;
//! # impl loctuya_lib::DeviceLink for TuyaTcpLink {
//! #     async fn fetch_status(
//! #         &self,
//! #     ) -> Result<loctuya_lib::DpsMap, loctuya_lib::TransportError> {
//! #         Ok(loctuya_lib::DpsMap::new())
//! #     }
//! #     async fn write(
//! #         &self,
//! #         _dps: loctuya_lib::DpsMap,
//! #     ) -> Result<(), loctuya_lib::TransportError> {
//! #         Ok(())
//! #     }
//! # }
//! #[tokio::main]
//! async fn main() -> loctuya_lib::Result<()> {
//!     // Bring your own transport; anything implementing DeviceLink works
//!     let link = TuyaTcpLink;
//!     let device = Device::new(DeviceConfig::new("bf6d7c8a4e21f09bc3wxyz"), link);
//!
//!     // Register the entities this device exposes
//!     let plug = device.add_switch(SwitchConfig::new(DpsId::new(1)?))?;
//!
//!     // The host owns the poll task; cancel the token to stop it
//!     let shutdown = CancellationToken::new();
//!     tokio::spawn(device.poller(shutdown.clone()).run());
//!
//!     // Commands apply optimistically; polls reconcile
//!     device.apply(plug, SwitchCommand::TurnOn).await?;
//!     if let Some(view) = device.view(plug)?.as_switch() {
//!         println!("plug is on: {}", view.is_on);
//!     }
//!
//!     shutdown.cancel();
//!     Ok(())
//! }
//! ```
//!
//! ## Observing State
//!
//! Every successful poll notifies registered callbacks and publishes the
//! snapshot on a watch channel:
//!
//! ```no_run
//! # struct TuyaTcpLink;
//! # impl loctuya_lib::DeviceLink for TuyaTcpLink {
//! #     async fn fetch_status(
//! #         &self,
//! #     ) -> Result<loctuya_lib::DpsMap, loctuya_lib::TransportError> {
//! #         Ok(loctuya_lib::DpsMap::new())
//! #     }
//! #     async fn write(
//! #         &self,
//! #         _dps: loctuya_lib::DpsMap,
//! #     ) -> Result<(), loctuya_lib::TransportError> {
//! #         Ok(())
//! #     }
//! # }
//! use loctuya_lib::config::DeviceConfig;
//! use loctuya_lib::Device;
//!
//! # async fn example() -> loctuya_lib::Result<()> {
//! let device = Device::new(DeviceConfig::new("bf6d7c8a4e21f09bc3wxyz"), TuyaTcpLink);
//!
//! device.on_availability_changed(|availability| {
//!     println!("device is now {availability}");
//! });
//!
//! let mut updates = device.watch_state();
//! while updates.changed().await.is_ok() {
//!     let state = updates.borrow_and_update();
//!     println!("{} data points cached", state.dps().len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
mod device;
pub mod dispatch;
pub mod dps;
pub mod error;
pub mod link;
mod poller;
pub mod state;
pub mod translator;
pub mod types;

pub use config::{
    CoverConfig, DeviceConfig, DeviceId, FanConfig, LightConfig, OpenCloseCommands,
    PositioningMode, SwitchConfig,
};
pub use device::Device;
pub use dispatch::{SubscriptionId, UpdateDispatcher};
pub use dps::{DpsId, DpsMap, DpsValue};
pub use error::{ConfigError, DecodeError, Error, Result, TransportError, ValueError};
pub use link::DeviceLink;
pub use poller::Poller;
pub use state::{Availability, DeviceState};
pub use translator::{
    Command, CoverCommand, CoverView, EntityId, EntityView, FanCommand, FanView, LightCommand,
    LightMode, LightSettings, LightView, SwitchCommand, SwitchView,
};
pub use types::{Brightness, FanSpeed, HsColor, MiredRange, Position};
