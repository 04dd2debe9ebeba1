// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bus-power handling: turning power-domain events into peripheral
//! enable/disable calls and keeping the suspend request flag current.
//!
//! These events arrive from a lower-priority interrupt than the USB
//! events; nothing here assumes it runs atomically with respect to
//! them beyond single-field writes.

use crate::bus::{RecvSink, StatusIndicator, UsbBus};
use crate::device::UsbDevice;
use crate::REMOTE_WAKEUP_CAPABLE;

/// A VBUS power-domain event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PowerEvent {
    /// Voltage appeared on the port.
    Detected,
    /// The port voltage went away.
    Removed,
    /// The regulator settled; the peripheral may attach to the bus.
    Ready,
}

/// Where the device stands in the power bring-up sequence.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PowerState {
    Removed,
    Detected,
    Ready,
}

impl<B: UsbBus, S: RecvSink, I: StatusIndicator> UsbDevice<B, S, I> {
    /// Feeds one power-domain event through the bridge. Removal is
    /// legal in any state and cancels whatever the host was in the
    /// middle of.
    pub fn handle_power_event(&mut self, event: PowerEvent) {
        match event {
            PowerEvent::Detected => {
                log::info!("USB power detected");
                if !self.bus.is_enabled() {
                    self.bus.enable();
                }
                self.power = PowerState::Detected;
            }
            PowerEvent::Ready => {
                log::info!("USB power ready");
                self.indicator.power(true);
                if !self.bus.is_started() {
                    self.bus.start(REMOTE_WAKEUP_CAPABLE);
                }
                self.power = PowerState::Ready;
            }
            PowerEvent::Removed => {
                log::info!("USB power removed");
                // Back to defaults before the peripheral goes away, so
                // a poller never sees a configured-but-dead device.
                self.state.reset();
                if self.bus.is_started() {
                    self.bus.stop();
                }
                if self.bus.is_enabled() {
                    self.bus.disable();
                }
                self.indicator.configured(false);
                self.indicator.power(false);
                self.power = PowerState::Removed;
            }
        }
    }
}
