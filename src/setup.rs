// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Setup-request dispatch.
//!
//! [`dispatch`] decodes one setup packet and decides what happens to
//! it. It reads the descriptor catalog and the device state but touches
//! no hardware; the returned [`SetupAction`] tells the composition root
//! which peripheral operation to perform, and [`StateChange`] carries
//! the mutations a host request asked for. That split is what lets the
//! whole chapter-9 state machine run under a plain unit test.
//!
//! Every setup packet gets exactly one outcome. Unsupported or
//! malformed requests stall; the host treats a stall as "request not
//! supported" and retries or moves on, so a stall is never an error on
//! our side.

use num_traits::FromPrimitive;

use crate::descriptors::{DescriptorCatalog, DescriptorKind, DescriptorType};
use crate::protocol::{
    Request, SetupRequest, EP1_IN, EP1_OUT, FEATURE_DEVICE_REMOTE_WAKEUP, FEATURE_ENDPOINT_HALT,
};
use crate::state::DeviceState;
use crate::{EndpointAddr, REMOTE_WAKEUP_CAPABLE, SELF_POWERED};

/// What the composition root must do with the current control transfer.
#[derive(Debug, PartialEq, Eq)]
pub enum SetupAction<'d> {
    /// Send a data stage. The bytes are the full table; truncation to
    /// the host's `wLength` happens at the point of transmission.
    Respond(&'d [u8]),
    /// Acknowledge with an empty status stage.
    Accept,
    /// Perform a state change, then acknowledge (or stall, if the
    /// change is rejected).
    Apply(StateChange),
    /// Protocol stall.
    Stall,
    /// Do nothing; the hardware completes this request by itself.
    Ignore,
}

/// A host-requested mutation of device state, executed at the
/// composition root.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StateChange {
    /// SetConfiguration. The value is unvalidated beyond fitting in a
    /// byte; the endpoint manager rejects anything but 0 and 1.
    Configure(u8),
    /// Set or clear the HALT feature on an interrupt endpoint.
    EndpointHalt(EndpointAddr, bool),
    /// Enable or disable the remote-wakeup feature.
    RemoteWakeup(bool),
}

// Prebuilt responses for the handlers that answer with status words.
// Little-endian: self-powered in bit 0, remote wakeup in bit 1.
const DEVICE_STATUS: [u8; 2] = [SELF_POWERED as u8, 0];
const DEVICE_STATUS_WAKEUP: [u8; 2] = [SELF_POWERED as u8 | 0x02, 0];
const INTERFACE_STATUS: [u8; 2] = [0, 0];
const ENDPOINT_ACTIVE: [u8; 2] = [0, 0];
const ENDPOINT_HALTED: [u8; 2] = [1, 0];
const CONFIGURED: [u8; 1] = [1];
const UNCONFIGURED: [u8; 1] = [0];

/// Routes one setup packet to its handler and returns the outcome.
pub fn dispatch<'d>(
    req: &SetupRequest,
    state: &DeviceState,
    catalog: &'d DescriptorCatalog,
) -> SetupAction<'d> {
    match Request::from_u8(req.request) {
        Some(Request::GetStatus) => get_status(req, state),
        Some(Request::ClearFeature) => feature(req, false),
        Some(Request::SetFeature) => feature(req, true),
        // Address changes are applied by the peripheral; answering
        // anything here, including a stall, would break enumeration.
        Some(Request::SetAddress) => SetupAction::Ignore,
        Some(Request::GetDescriptor) => get_descriptor(req, catalog),
        Some(Request::GetConfiguration) => {
            if state.is_configured() {
                SetupAction::Respond(&CONFIGURED)
            } else {
                SetupAction::Respond(&UNCONFIGURED)
            }
        }
        Some(Request::SetConfiguration) => set_configuration(req),
        Some(Request::SetIdle) => {
            if req.request_type == 0x21 {
                // Idle rate is meaningless for this device; accept any
                // value.
                SetupAction::Accept
            } else {
                log::debug!("SetIdle with wrong type 0x{:02x}", req.request_type);
                SetupAction::Stall
            }
        }
        Some(Request::SetInterface) => interface_control(req),
        None => {
            log::debug!("unknown request 0x{:02x}", req.request);
            SetupAction::Stall
        }
    }
}

fn get_status(req: &SetupRequest, state: &DeviceState) -> SetupAction<'static> {
    match req.request_type {
        // Device recipient.
        0x80 => {
            if req.index() & 0xff == 0 {
                return SetupAction::Respond(if state.remote_wakeup_enabled() {
                    &DEVICE_STATUS_WAKEUP
                } else {
                    &DEVICE_STATUS
                });
            }
        }
        // Interface recipient. Only interface 0 exists, and only once
        // configured.
        0x81 => {
            if state.is_configured() && req.index() & 0xff == 0 {
                return SetupAction::Respond(&INTERFACE_STATUS);
            }
        }
        // Endpoint recipient.
        0x82 => {
            let addr = (req.index() & 0xff) as u8;
            if addr == 0 {
                // The control endpoint is always active.
                return SetupAction::Respond(&ENDPOINT_ACTIVE);
            }
            if state.is_configured() {
                for ep in [EP1_IN, EP1_OUT] {
                    if addr == ep.raw() {
                        return SetupAction::Respond(if state.endpoint_halted(ep) {
                            &ENDPOINT_HALTED
                        } else {
                            &ENDPOINT_ACTIVE
                        });
                    }
                }
            }
        }
        _ => {}
    }
    log::debug!("unknown status request 0x{:02x}", req.request_type);
    SetupAction::Stall
}

/// SetFeature and ClearFeature share everything but the direction of
/// the change.
fn feature(req: &SetupRequest, set: bool) -> SetupAction<'static> {
    if req.request_type == 0x02 {
        // Endpoint recipient. The HALT feature is only addressable on
        // the interrupt IN endpoint; an attempt to halt the OUT side is
        // answered with a stall.
        if req.value() == FEATURE_ENDPOINT_HALT && req.index() == EP1_IN.raw() as u16 {
            return SetupAction::Apply(StateChange::EndpointHalt(EP1_IN, set));
        }
    } else if req.request_type == 0x00 {
        // Device recipient.
        if REMOTE_WAKEUP_CAPABLE && req.value() == FEATURE_DEVICE_REMOTE_WAKEUP {
            return SetupAction::Apply(StateChange::RemoteWakeup(set));
        }
    }
    log::debug!(
        "unknown feature to {}: type 0x{:02x} value {}",
        if set { "set" } else { "clear" },
        req.request_type,
        req.value()
    );
    SetupAction::Stall
}

fn get_descriptor<'d>(req: &SetupRequest, catalog: &'d DescriptorCatalog) -> SetupAction<'d> {
    let index = req.descriptor_index();
    match DescriptorType::from_u16(req.descriptor_type()) {
        Some(DescriptorType::Device) if req.request_type == 0x80 => {
            return SetupAction::Respond(catalog.get(DescriptorKind::Device));
        }
        Some(DescriptorType::Configuration) if req.request_type == 0x80 => {
            return SetupAction::Respond(catalog.get(DescriptorKind::Configuration));
        }
        Some(DescriptorType::String) if req.request_type == 0x80 => {
            if let Some(bytes) = catalog.string(index) {
                return SetupAction::Respond(bytes);
            }
        }
        Some(DescriptorType::Interface) if req.request_type == 0x80 => {
            if index == 0 {
                return SetupAction::Respond(catalog.get(DescriptorKind::Interface));
            }
        }
        Some(DescriptorType::Endpoint) if req.request_type == 0x80 => {
            // Sub-descriptor indices, not endpoint addresses: 1 is the
            // OUT endpoint, 2 the IN endpoint.
            match index {
                1 => return SetupAction::Respond(catalog.get(DescriptorKind::EndpointOut)),
                2 => return SetupAction::Respond(catalog.get(DescriptorKind::EndpointIn)),
                _ => {}
            }
        }
        // The class descriptors are requested at the interface.
        Some(DescriptorType::Hid) if req.request_type == 0x81 => {
            if index == 0 {
                return SetupAction::Respond(catalog.get(DescriptorKind::Hid));
            }
        }
        Some(DescriptorType::Report) if req.request_type == 0x81 => {
            if index == 0 {
                return SetupAction::Respond(catalog.get(DescriptorKind::HidReport));
            }
        }
        _ => {}
    }
    log::debug!(
        "unknown descriptor: type 0x{:02x} request type 0x{:02x} index {}",
        req.descriptor_type(),
        req.request_type,
        index,
    );
    SetupAction::Stall
}

fn set_configuration(req: &SetupRequest) -> SetupAction<'static> {
    if req.request_type == 0x00 && req.index() == 0 && req.length() == 0 && req.value() <= 0xff {
        return SetupAction::Apply(StateChange::Configure(req.value() as u8));
    }
    log::debug!(
        "bad SetConfiguration: index 0x{:02x} value 0x{:02x}",
        req.index(),
        req.value()
    );
    SetupAction::Stall
}

/// Request 0x0B is standard SetInterface or HID SetProtocol, depending
/// on the type bits.
fn interface_control(req: &SetupRequest) -> SetupAction<'static> {
    match req.request_type {
        0x01 => {
            // No alternate settings exist; a stall here is the
            // specified answer, not a failure.
            log::debug!("no alternate interface settings");
            SetupAction::Stall
        }
        // SetProtocol: boot/report distinction does not apply, accept
        // any value.
        0x21 => SetupAction::Accept,
        other => {
            log::debug!("request 0x0b with unknown type 0x{:02x}", other);
            SetupAction::Stall
        }
    }
}
