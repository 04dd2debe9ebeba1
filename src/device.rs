// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The composition root: owns the peripheral, the sink, the indicator
//! and all device state, and is the only place where dispatch outcomes
//! turn into peripheral operations.

use core::fmt;

use crate::bus::{BusError, RecvSink, StatusIndicator, UsbBus, UsbEvent};
use crate::descriptors::DescriptorCatalog;
use crate::endpoint;
use crate::power::PowerState;
use crate::protocol::{SetupRequest, EP1_IN};
use crate::setup::{self, SetupAction, StateChange};
use crate::state::DeviceState;

/// Conditions the device cannot continue from. The caller is expected
/// to halt or reset the system; recovering in place would silently
/// corrupt authenticator traffic.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FatalError {
    /// The receive sink took fewer bytes than a full frame.
    RecvSinkExhausted { offered: usize, accepted: usize },
    /// The peripheral refused a control transfer it must always accept.
    ControlTransfer(BusError),
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalError::RecvSinkExhausted { offered, accepted } => write!(
                f,
                "receive sink exhausted: accepted {accepted} of {offered} bytes"
            ),
            FatalError::ControlTransfer(err) => write!(f, "control transfer failed: {err}"),
        }
    }
}

/// The USB device core for a CTAPHID authenticator.
///
/// `B` drives the USB peripheral, `S` swallows received report frames,
/// `I` shows configuration and power changes on the board. Feed it
/// [`UsbEvent`]s from the USB interrupt and
/// [`PowerEvent`](crate::PowerEvent)s from the power-domain interrupt;
/// both handlers run to completion without blocking.
pub struct UsbDevice<B, S, I> {
    pub(crate) bus: B,
    pub(crate) sink: S,
    pub(crate) indicator: I,
    pub(crate) state: DeviceState,
    pub(crate) catalog: DescriptorCatalog,
    pub(crate) power: PowerState,
    /// Landing buffer for interrupt OUT frames; report frames are
    /// always exactly this size.
    pub(crate) rx_frame: [u8; 64],
}

impl<B: UsbBus, S: RecvSink, I: StatusIndicator> UsbDevice<B, S, I> {
    pub fn new(bus: B, sink: S, indicator: I) -> Self {
        Self {
            bus,
            sink,
            indicator,
            state: DeviceState::new(),
            catalog: DescriptorCatalog::build(),
            power: PowerState::Removed,
            rx_frame: [0; 64],
        }
    }

    /// Feeds one USB peripheral event through the core. A `Fatal` error
    /// means the device must be halted or reset by the caller; every
    /// protocol-level problem has already been answered with a stall
    /// before this returns.
    pub fn handle_usb_event(&mut self, event: UsbEvent) -> Result<(), FatalError> {
        match event {
            UsbEvent::Setup(req) => self.handle_setup(&req),
            UsbEvent::Transfer { endpoint, status } => self.on_transfer(endpoint, status),
            UsbEvent::Reset => {
                self.on_bus_reset();
                Ok(())
            }
            UsbEvent::Suspend => {
                log::info!("suspend requested by host");
                self.state.set_suspend_requested(true);
                Ok(())
            }
            UsbEvent::Resume => {
                log::info!("resuming from suspend");
                self.state.set_suspend_requested(false);
                Ok(())
            }
            UsbEvent::WakeRequest => {
                log::info!("remote wakeup initiated");
                self.state.set_suspend_requested(false);
                Ok(())
            }
        }
    }

    fn handle_setup(&mut self, req: &SetupRequest) -> Result<(), FatalError> {
        match setup::dispatch(req, &self.state, &self.catalog) {
            SetupAction::Respond(bytes) => {
                // Never exceed what the host asked for; serving a
                // prefix is normal and the host knows the real length
                // from the descriptor itself.
                let len = bytes.len().min(req.length() as usize);
                self.bus
                    .ep0_respond(&bytes[..len])
                    .map_err(FatalError::ControlTransfer)?;
            }
            SetupAction::Accept => self.bus.setup_ack(),
            SetupAction::Apply(change) => self.apply(change),
            SetupAction::Stall => self.bus.setup_stall(),
            SetupAction::Ignore => {}
        }
        Ok(())
    }

    /// Executes a host-requested state change and closes the status
    /// stage. This is the single point where dispatch decisions touch
    /// the peripheral.
    fn apply(&mut self, change: StateChange) {
        match change {
            StateChange::Configure(value) => {
                match endpoint::set_configuration(&mut self.bus, &mut self.state, value) {
                    Ok(()) => {
                        self.bus.setup_ack();
                        self.indicator.configured(value == 1);
                    }
                    Err(invalid) => {
                        log::debug!("rejected configuration value {}", invalid.0);
                        self.bus.setup_stall();
                    }
                }
            }
            StateChange::EndpointHalt(ep, halted) => {
                if halted {
                    self.bus.ep_stall(ep);
                } else {
                    self.bus.ep_stall_clear(ep);
                }
                self.state.set_endpoint_halted(ep, halted);
                self.bus.setup_ack();
            }
            StateChange::RemoteWakeup(enabled) => {
                self.state.set_remote_wakeup(enabled);
                self.bus.setup_ack();
            }
        }
    }

    /// Host-driven bus reset: back to the address state no matter what
    /// was going on, and any in-flight control transfer is gone.
    fn on_bus_reset(&mut self) {
        log::info!("bus reset");
        let result = endpoint::set_configuration(&mut self.bus, &mut self.state, 0);
        debug_assert!(result.is_ok());
        self.state.reset();
        // Whatever setup processing the reset interrupted is void.
        self.bus.setup_ack();
        self.indicator.configured(false);
    }

    /// Queues one report frame on the interrupt IN endpoint. The frame
    /// must stay untouched until the completion event for it arrives.
    pub fn send_report(&mut self, frame: &[u8; 64]) -> Result<(), BusError> {
        self.bus.ep_send(EP1_IN, frame)
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn is_configured(&self) -> bool {
        self.state.is_configured()
    }

    /// The suspend state the host most recently asked for. The main
    /// loop polls this and performs the actual low-power entry.
    pub fn suspend_requested(&self) -> bool {
        self.state.suspend_requested()
    }

    pub fn power_state(&self) -> PowerState {
        self.power
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }
}
