// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Test doubles: a recording USB bus, a bounded byte sink, and an
//! indicator that remembers what it was told.

#![allow(dead_code)]

use ctaphid_usbd::{
    BusError, EndpointAddr, RecvSink, SetupRequest, StatusIndicator, UsbBus, UsbDevice, UsbEvent,
};

/// One recorded peripheral operation, in call order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BusOp {
    Enable,
    Disable,
    Start(bool),
    Stop,
    EpEnable(EndpointAddr),
    EpDisable(EndpointAddr),
    EpStall(EndpointAddr),
    EpStallClear(EndpointAddr),
    EpDtoggleClear(EndpointAddr),
    SetupAck,
    SetupStall,
    Respond(Vec<u8>),
    Recv(EndpointAddr, usize),
    Send(EndpointAddr, Vec<u8>),
}

/// Scripted stand-in for the USB peripheral driver.
pub struct MockBus {
    pub ops: Vec<BusOp>,
    pub enabled: bool,
    pub started: bool,
    pub started_with_wakeup: Option<bool>,
    /// What `ep_out_size` reports for the next waiting OUT transfer.
    pub out_size: usize,
    /// What `ep_read` copies out for the next completed OUT transfer.
    pub out_data: Vec<u8>,
    pub auto_status: bool,
    /// Make `ep0_respond` fail, to exercise the fatal path.
    pub fail_respond: bool,
}

impl MockBus {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            enabled: false,
            started: false,
            started_with_wakeup: None,
            out_size: 64,
            out_data: vec![0; 64],
            auto_status: false,
            fail_respond: false,
        }
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// All EP0 data-stage payloads, in order.
    pub fn responses(&self) -> Vec<Vec<u8>> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                BusOp::Respond(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_response(&self) -> Vec<u8> {
        self.responses().pop().expect("no EP0 response recorded")
    }

    pub fn acks(&self) -> usize {
        self.ops.iter().filter(|op| **op == BusOp::SetupAck).count()
    }

    pub fn stalls(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| **op == BusOp::SetupStall)
            .count()
    }

    pub fn contains(&self, op: &BusOp) -> bool {
        self.ops.contains(op)
    }
}

impl UsbBus for MockBus {
    fn enable(&mut self) {
        self.enabled = true;
        self.ops.push(BusOp::Enable);
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.ops.push(BusOp::Disable);
    }

    fn start(&mut self, remote_wakeup: bool) {
        self.started = true;
        self.started_with_wakeup = Some(remote_wakeup);
        self.ops.push(BusOp::Start(remote_wakeup));
    }

    fn stop(&mut self) {
        self.started = false;
        self.ops.push(BusOp::Stop);
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn is_started(&self) -> bool {
        self.started
    }

    fn ep_enable(&mut self, ep: EndpointAddr) {
        self.ops.push(BusOp::EpEnable(ep));
    }

    fn ep_disable(&mut self, ep: EndpointAddr) {
        self.ops.push(BusOp::EpDisable(ep));
    }

    fn ep_stall(&mut self, ep: EndpointAddr) {
        self.ops.push(BusOp::EpStall(ep));
    }

    fn ep_stall_clear(&mut self, ep: EndpointAddr) {
        self.ops.push(BusOp::EpStallClear(ep));
    }

    fn ep_dtoggle_clear(&mut self, ep: EndpointAddr) {
        self.ops.push(BusOp::EpDtoggleClear(ep));
    }

    fn setup_ack(&mut self) {
        self.ops.push(BusOp::SetupAck);
    }

    fn setup_stall(&mut self) {
        self.ops.push(BusOp::SetupStall);
    }

    fn ep0_respond(&mut self, bytes: &[u8]) -> Result<(), BusError> {
        if self.fail_respond {
            return Err(BusError::Busy);
        }
        self.ops.push(BusOp::Respond(bytes.to_vec()));
        Ok(())
    }

    fn ep_recv(&mut self, ep: EndpointAddr, len: usize) -> Result<(), BusError> {
        self.ops.push(BusOp::Recv(ep, len));
        Ok(())
    }

    fn ep_send(&mut self, ep: EndpointAddr, bytes: &[u8]) -> Result<(), BusError> {
        self.ops.push(BusOp::Send(ep, bytes.to_vec()));
        Ok(())
    }

    fn ep_out_size(&self, _ep: EndpointAddr) -> usize {
        self.out_size
    }

    fn ep_read(&mut self, _ep: EndpointAddr, buf: &mut [u8]) -> usize {
        let len = buf.len().min(self.out_data.len());
        buf[..len].copy_from_slice(&self.out_data[..len]);
        len
    }

    fn auto_status_stage(&self) -> bool {
        self.auto_status
    }
}

/// Byte sink with a capacity limit, for exhaustion tests.
pub struct VecSink {
    pub data: Vec<u8>,
    pub capacity: usize,
}

impl VecSink {
    pub fn unbounded() -> Self {
        Self {
            data: Vec::new(),
            capacity: usize::MAX,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::new(),
            capacity,
        }
    }
}

impl RecvSink for VecSink {
    fn accept(&mut self, bytes: &[u8]) -> usize {
        let room = self.capacity - self.data.len();
        let taken = room.min(bytes.len());
        self.data.extend_from_slice(&bytes[..taken]);
        taken
    }
}

/// Indicator that records every notification.
#[derive(Default)]
pub struct RecordIndicator {
    pub configured: Vec<bool>,
    pub power: Vec<bool>,
}

impl StatusIndicator for RecordIndicator {
    fn configured(&mut self, on: bool) {
        self.configured.push(on);
    }

    fn power(&mut self, present: bool) {
        self.power.push(present);
    }
}

pub type TestDevice = UsbDevice<MockBus, VecSink, RecordIndicator>;

pub fn device() -> TestDevice {
    UsbDevice::new(MockBus::new(), VecSink::unbounded(), RecordIndicator::default())
}

/// A device the host has already moved to configuration 1, with the
/// enumeration traffic cleared from the op log.
pub fn configured_device() -> TestDevice {
    let mut dev = device();
    dev.handle_usb_event(setup(0x00, 0x09, 1, 0, 0)).unwrap();
    assert!(dev.is_configured());
    dev.bus_mut().clear_ops();
    dev
}

pub fn setup(request_type: u8, request: u8, value: u16, index: u16, length: u16) -> UsbEvent {
    UsbEvent::Setup(SetupRequest::new(request_type, request, value, index, length))
}
