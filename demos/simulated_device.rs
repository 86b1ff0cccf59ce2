// SPDX-License-Identifier: MPL-2.0

//! Test program: Drive a simulated Tuya bulb and plug through the
//! full poll and command cycle.
//!
//! No hardware is needed; the device link is an in-memory datapoint
//! map standing in for a real transport.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example simulated_device
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use loctuya_lib::config::{DeviceConfig, LightConfig, SwitchConfig};
use loctuya_lib::dps::{DpsId, DpsMap};
use loctuya_lib::translator::{LightCommand, LightSettings, SwitchCommand};
use loctuya_lib::types::MiredRange;
use loctuya_lib::{Device, DeviceLink, TransportError};

/// In-memory device: fetches return the stored map, writes merge into it.
#[derive(Clone, Default)]
struct SimulatedTuya {
    dps: Arc<Mutex<DpsMap>>,
}

impl DeviceLink for SimulatedTuya {
    async fn fetch_status(&self) -> Result<DpsMap, TransportError> {
        Ok(self.dps.lock().clone())
    }

    async fn write(&self, dps: DpsMap) -> Result<(), TransportError> {
        let mut store = self.dps.lock();
        for (id, value) in dps {
            store.insert(id, value);
        }
        Ok(())
    }
}

fn dp(id: u8) -> DpsId {
    DpsId::new(id).unwrap()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let link = SimulatedTuya::default();
    {
        let mut dps = link.dps.lock();
        dps.insert(dp(1), true);
        dps.insert(dp(2), "white");
        dps.insert(dp(3), 180u8);
        dps.insert(dp(4), 120u8);
        dps.insert(dp(9), false);
    }

    let config = DeviceConfig::new("bf6d7c8a4e21f09bc3demo")
        .with_friendly_name("Living Room")
        .with_poll_interval(Duration::from_millis(500));
    let device = Device::new(config, link.clone());

    let bulb = device.add_light(
        LightConfig::new(dp(1)).with_color_temp(MiredRange::new(167, 370)?),
    )?;
    let plug = device.add_switch(SwitchConfig::new(dp(9)))?;

    device.on_availability_changed(|availability| {
        println!("Availability changed: {availability}");
    });

    println!("Polling {}...", device.name());
    let shutdown = CancellationToken::new();
    let poller = tokio::spawn(device.poller(shutdown.clone()).run());
    tokio::time::sleep(Duration::from_millis(700)).await;

    if let Some(view) = device.view(bulb)?.as_light() {
        println!(
            "Bulb reports: on={}, mode={}, brightness={}, mireds={:?}",
            view.is_on,
            view.mode,
            view.brightness.value(),
            view.color_temp
        );
    }

    println!("Turning the bulb up to 220 at 300 mireds...");
    let settings = LightSettings::new().with_brightness(220).with_color_temp(300);
    device.apply(bulb, LightCommand::TurnOn(settings)).await?;

    println!("Switching the plug on...");
    device.apply(plug, SwitchCommand::TurnOn).await?;

    // Let the next poll read the writes back from the simulated device
    tokio::time::sleep(Duration::from_millis(700)).await;

    if let Some(view) = device.view(bulb)?.as_light() {
        println!(
            "Bulb now: brightness={}, mireds={:?}",
            view.brightness.value(),
            view.color_temp
        );
    }
    if let Some(view) = device.view(plug)?.as_switch() {
        println!("Plug now: on={}", view.is_on);
    }

    shutdown.cancel();
    poller.await?;
    println!("Done.");
    Ok(())
}
