// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Endpoint lifecycle for the two configurations this device has:
//! index 0 (address state, HID interface down) and index 1 (interrupt
//! endpoints live).

use crate::bus::UsbBus;
use crate::protocol::{EP1_IN, EP1_OUT};
use crate::state::DeviceState;

/// SetConfiguration carried a value that names no configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct InvalidConfiguration(pub u8);

/// Moves the endpoints into the shape of configuration `index`.
///
/// Index 1 brings both interrupt endpoints up with a fresh data toggle
/// and no stall. Index 0 drops back to the address state; only the IN
/// endpoint is explicitly disabled, while the OUT side is left alone
/// and simply never re-armed while unconfigured. Hosts may depend on
/// that asymmetry; keep it. Anything else is rejected and the caller
/// answers the host with a stall. Calling this twice with the same
/// index lands in the same state.
pub(crate) fn set_configuration<B: UsbBus>(
    bus: &mut B,
    state: &mut DeviceState,
    index: u8,
) -> Result<(), InvalidConfiguration> {
    match index {
        1 => {
            for ep in [EP1_IN, EP1_OUT] {
                bus.ep_dtoggle_clear(ep);
                bus.ep_stall_clear(ep);
                bus.ep_enable(ep);
                state.set_endpoint_enabled(ep, true);
            }
            state.set_configured(true);
            Ok(())
        }
        0 => {
            bus.ep_disable(EP1_IN);
            state.set_endpoint_enabled(EP1_IN, false);
            state.set_configured(false);
            Ok(())
        }
        other => Err(InvalidConfiguration(other)),
    }
}
