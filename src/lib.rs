// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device-side USB transport for a CTAPHID authenticator.
//!
//! This crate implements the control-transfer state machine of a
//! composite HID-class FIDO2 token (the USB 2.0 chapter 9 subset plus
//! the HID 1.11 class requests), and the steady-state interrupt
//! transfer path that moves 64-byte CTAPHID report frames once the
//! host has configured the device. What the frames mean is someone
//! else's problem; this is the transport envelope only.
//!
//! The hardware stays behind narrow traits: the peripheral driver is
//! consumed through [`UsbBus`], completed receive frames go to a
//! [`RecvSink`], and configuration/power transitions are shown through
//! a [`StatusIndicator`]. The interrupt handlers translate hardware
//! events into [`UsbEvent`] and [`PowerEvent`] values and feed them to
//! [`UsbDevice::handle_usb_event`] and
//! [`UsbDevice::handle_power_event`]; each event is processed to
//! completion and nothing in the crate blocks. Because every decision
//! the state machine makes is taken on plain data, the whole protocol
//! surface runs under host-side tests with a scripted bus double.
//!
//! Descriptors are built once into a read-only [`DescriptorCatalog`];
//! request decoding lives in [`setup::dispatch`], which returns an
//! explicit [`SetupAction`] instead of touching the peripheral, so the
//! dispatch rules can be tested in isolation too.

#![cfg_attr(not(test), no_std)]

pub mod bus;
pub mod descriptors;
pub mod device;
mod endpoint;
pub mod power;
pub mod protocol;
mod pump;
pub mod setup;
pub mod state;

pub use bus::{BusError, RecvSink, StatusIndicator, TransferStatus, UsbBus, UsbEvent};
pub use descriptors::{DescriptorCatalog, DescriptorKind};
pub use device::{FatalError, UsbDevice};
pub use power::{PowerEvent, PowerState};
pub use protocol::{EndpointAddr, SetupRequest, UsbDir, EP0_IN, EP0_OUT, EP1_IN, EP1_OUT};
pub use setup::{SetupAction, StateChange};
pub use state::{DeviceState, EndpointState};

cfg_if::cfg_if! {
    if #[cfg(feature = "remote-wakeup")] {
        /// Whether this build advertises the remote-wakeup capability.
        /// Reflected in the configuration descriptor, passed to the
        /// peripheral at start, and gates the host's ability to toggle
        /// the runtime remote-wakeup flag.
        pub const REMOTE_WAKEUP_CAPABLE: bool = true;
    } else {
        /// Whether this build advertises the remote-wakeup capability.
        /// Reflected in the configuration descriptor, passed to the
        /// peripheral at start, and gates the host's ability to toggle
        /// the runtime remote-wakeup flag.
        pub const REMOTE_WAKEUP_CAPABLE: bool = false;
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "self-powered")] {
        /// Whether this build reports itself as self-powered, in bit 0
        /// of the device status word and in the configuration
        /// descriptor attributes.
        pub const SELF_POWERED: bool = true;
    } else {
        /// Whether this build reports itself as self-powered, in bit 0
        /// of the device status word and in the configuration
        /// descriptor attributes.
        pub const SELF_POWERED: bool = false;
    }
}
