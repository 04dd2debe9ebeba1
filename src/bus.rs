// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interfaces to the collaborators this crate does not implement: the
//! USB peripheral driver, the byte sink that receives report frames, and
//! the board-level status indicator.

use core::fmt;

use crate::protocol::{EndpointAddr, SetupRequest};

/// Error returned by the peripheral driver for a transfer it cannot
/// start.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BusError {
    /// The endpoint already has a transfer in flight.
    Busy,
    /// The endpoint is disabled or the peripheral is not started.
    Inactive,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::Busy => f.write_str("endpoint busy"),
            BusError::Inactive => f.write_str("endpoint inactive"),
        }
    }
}

/// Completion status of an endpoint transfer, as reported by the
/// peripheral.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransferStatus {
    /// The transfer finished and the data is ready.
    Ok,
    /// The host delivered data on an OUT endpoint and the peripheral is
    /// waiting for a buffer to receive it into.
    Waiting,
    /// The transfer was cancelled by the host or the hardware. Normal;
    /// not an error.
    Aborted,
    /// The host sent more than the armed buffer could take.
    Overload,
}

/// A hardware event from the USB peripheral, delivered one at a time
/// from interrupt context.
#[derive(Copy, Clone, Debug)]
pub enum UsbEvent {
    /// The host reset the bus. Drops the device back to the address
    /// state.
    Reset,
    /// A setup packet arrived on EP0.
    Setup(SetupRequest),
    /// A transfer on `endpoint` changed state.
    Transfer {
        endpoint: EndpointAddr,
        status: TransferStatus,
    },
    /// The bus went idle and the host expects the device to enter
    /// suspend.
    Suspend,
    /// The host resumed the bus.
    Resume,
    /// A remote-wakeup sequence was initiated.
    WakeRequest,
}

/// The driver surface of the USB peripheral.
///
/// This is the complete set of operations the core needs; a target
/// implementation forwards each one to the vendor driver, and the test
/// suite substitutes a recording double. No method may block.
pub trait UsbBus {
    /// Power up the USB transceiver.
    fn enable(&mut self);
    /// Power the transceiver back down.
    fn disable(&mut self);
    /// Attach to the bus and start answering traffic. `remote_wakeup`
    /// tells the peripheral whether the device may signal wakeups.
    fn start(&mut self, remote_wakeup: bool);
    /// Detach from the bus.
    fn stop(&mut self);
    fn is_enabled(&self) -> bool;
    fn is_started(&self) -> bool;

    fn ep_enable(&mut self, ep: EndpointAddr);
    fn ep_disable(&mut self, ep: EndpointAddr);
    /// Answer transfers on `ep` with STALL until cleared.
    fn ep_stall(&mut self, ep: EndpointAddr);
    fn ep_stall_clear(&mut self, ep: EndpointAddr);
    /// Reset the DATA0/DATA1 toggle to DATA0.
    fn ep_dtoggle_clear(&mut self, ep: EndpointAddr);

    /// Let the status stage of the current control transfer complete
    /// successfully.
    fn setup_ack(&mut self);
    /// Answer the current control transfer with a protocol stall.
    fn setup_stall(&mut self);

    /// Queue `bytes` as the data stage of the current control transfer.
    /// The caller has already truncated to the host's `wLength`.
    fn ep0_respond(&mut self, bytes: &[u8]) -> Result<(), BusError>;
    /// Arm an OUT endpoint to receive up to `len` bytes.
    fn ep_recv(&mut self, ep: EndpointAddr, len: usize) -> Result<(), BusError>;
    /// Queue `bytes` for transmission on an IN endpoint. The buffer must
    /// stay valid and unmodified until the completion event fires.
    fn ep_send(&mut self, ep: EndpointAddr, bytes: &[u8]) -> Result<(), BusError>;
    /// Size of the data the host delivered on a waiting OUT endpoint.
    fn ep_out_size(&self, ep: EndpointAddr) -> usize;
    /// Copy a completed OUT transfer into `buf`, returning the byte
    /// count.
    fn ep_read(&mut self, ep: EndpointAddr, buf: &mut [u8]) -> usize;

    /// True when the peripheral acknowledges the EP0 status stage on its
    /// own and the core must not do it again. Models hardware revisions
    /// whose erratum workaround takes over the status stage.
    fn auto_status_stage(&self) -> bool {
        false
    }
}

/// Byte sink for received report frames.
pub trait RecvSink {
    /// Append up to `bytes.len()` bytes, returning how many were
    /// accepted. Accepting less than offered signals exhaustion.
    fn accept(&mut self, bytes: &[u8]) -> usize;
}

/// Board-level status indication. Fire and forget; implementations must
/// not fail and the core never inspects a result.
pub trait StatusIndicator {
    /// The device entered (`true`) or left (`false`) the configured
    /// state.
    fn configured(&mut self, on: bool);
    /// Bus power appeared (`true`) or went away (`false`).
    fn power(&mut self, present: bool);
}

/// No-op indicator for boards without one.
impl StatusIndicator for () {
    fn configured(&mut self, _on: bool) {}
    fn power(&mut self, _present: bool) {}
}
