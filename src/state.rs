// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mutable device state: the negotiated configuration, per-endpoint
//! enable/halt mirrors, and the feature flags the host can toggle.
//!
//! One instance is owned by the composition root and handed by
//! reference to the request dispatch and the power bridge. Every field
//! has a single writer; `suspend_requested` is additionally read from
//! the main-loop context and is therefore atomic.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::protocol::{EndpointAddr, EP1_IN, EP1_OUT};

/// Enable and halt state of one interrupt endpoint.
///
/// Invariant: a disabled endpoint is never marked halted. The hardware
/// data toggle is not mirrored here; it is cleared through the bus
/// whenever an endpoint goes from disabled to enabled.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EndpointState {
    enabled: bool,
    halted: bool,
}

impl EndpointState {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }
}

pub struct DeviceState {
    /// Whether the host selected configuration 1. `false` is the
    /// address state with the HID interface disabled.
    configured: bool,
    remote_wakeup_enabled: bool,
    /// The suspend state the host most recently requested. This is an
    /// `AtomicBool` so the main loop can poll it through a shared
    /// reference while the interrupt context updates it; we do not rely
    /// on any ordering beyond the store itself.
    suspend_requested: AtomicBool,
    ep_in: EndpointState,
    ep_out: EndpointState,
}

impl DeviceState {
    pub fn new() -> Self {
        Self {
            configured: false,
            remote_wakeup_enabled: false,
            suspend_requested: AtomicBool::new(false),
            ep_in: EndpointState::default(),
            ep_out: EndpointState::default(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// The chapter-9 configuration value, 0 or 1.
    pub fn current_configuration(&self) -> u8 {
        self.configured as u8
    }

    pub(crate) fn set_configured(&mut self, configured: bool) {
        self.configured = configured;
    }

    pub fn remote_wakeup_enabled(&self) -> bool {
        self.remote_wakeup_enabled
    }

    pub(crate) fn set_remote_wakeup(&mut self, enabled: bool) {
        self.remote_wakeup_enabled = enabled;
    }

    pub fn suspend_requested(&self) -> bool {
        self.suspend_requested.load(Ordering::Relaxed)
    }

    pub(crate) fn set_suspend_requested(&self, requested: bool) {
        self.suspend_requested.store(requested, Ordering::Relaxed);
    }

    pub fn endpoint(&self, ep: EndpointAddr) -> Option<&EndpointState> {
        if ep == EP1_IN {
            Some(&self.ep_in)
        } else if ep == EP1_OUT {
            Some(&self.ep_out)
        } else {
            None
        }
    }

    pub fn endpoint_halted(&self, ep: EndpointAddr) -> bool {
        self.endpoint(ep).map_or(false, EndpointState::is_halted)
    }

    pub fn endpoint_enabled(&self, ep: EndpointAddr) -> bool {
        self.endpoint(ep).map_or(false, EndpointState::is_enabled)
    }

    /// Marks an endpoint enabled or disabled. Either way the halt flag
    /// is cleared: enabling resets it, and a disabled endpoint cannot
    /// stay halted.
    pub(crate) fn set_endpoint_enabled(&mut self, ep: EndpointAddr, enabled: bool) {
        if let Some(state) = self.endpoint_mut(ep) {
            state.enabled = enabled;
            state.halted = false;
        }
    }

    /// Records a host-driven halt change. Only takes effect on an
    /// enabled endpoint; the halt of a disabled endpoint is not
    /// representable.
    pub(crate) fn set_endpoint_halted(&mut self, ep: EndpointAddr, halted: bool) {
        if let Some(state) = self.endpoint_mut(ep) {
            if state.enabled {
                state.halted = halted;
            }
        }
    }

    /// Back to power-on defaults: address state, endpoints disabled,
    /// features cleared. Used on bus reset and on power removal.
    pub(crate) fn reset(&mut self) {
        self.configured = false;
        self.remote_wakeup_enabled = false;
        self.suspend_requested.store(false, Ordering::Relaxed);
        self.ep_in = EndpointState::default();
        self.ep_out = EndpointState::default();
    }

    fn endpoint_mut(&mut self, ep: EndpointAddr) -> Option<&mut EndpointState> {
        if ep == EP1_IN {
            Some(&mut self.ep_in)
        } else if ep == EP1_OUT {
            Some(&mut self.ep_out)
        } else {
            None
        }
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new()
    }
}
