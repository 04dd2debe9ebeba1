// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire-level USB control protocol definitions: the 8-byte setup packet,
//! request and descriptor-type codes, and endpoint addressing.

use core::fmt;

use byteorder::LittleEndian;
use num_derive::FromPrimitive;
use zerocopy::{FromBytes, LayoutVerified, Unaligned, U16};

/// USB deals in two transfer directions, called OUT (host-to-device) and
/// IN (device-to-host). OUT is represented by a 0 byte, IN by `0x80`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UsbDir {
    Out = 0,
    In = 0x80,
}

impl UsbDir {
    pub const fn of_endpoint_addr(addr: u8) -> Self {
        if addr & Self::In as u8 != 0 {
            Self::In
        } else {
            Self::Out
        }
    }
}

/// An endpoint address as it appears on the wire: endpoint number in the
/// low bits, direction in bit 7.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct EndpointAddr(u8);

impl EndpointAddr {
    pub const fn new(dir: UsbDir, number: u8) -> Self {
        Self(number | dir as u8)
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    pub const fn number(self) -> u8 {
        self.0 & 0x7f
    }

    pub const fn direction(self) -> UsbDir {
        UsbDir::of_endpoint_addr(self.0)
    }
}

impl fmt::Debug for EndpointAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction() {
            UsbDir::In => "IN",
            UsbDir::Out => "OUT",
        };
        write!(f, "EP{}{}", dir, self.number())
    }
}

/// The bidirectional control endpoint, always present.
pub const EP0_OUT: EndpointAddr = EndpointAddr::new(UsbDir::Out, 0);
pub const EP0_IN: EndpointAddr = EndpointAddr::new(UsbDir::In, 0);
/// The interrupt endpoints carrying CTAPHID report frames.
pub const EP1_OUT: EndpointAddr = EndpointAddr::new(UsbDir::Out, 1);
pub const EP1_IN: EndpointAddr = EndpointAddr::new(UsbDir::In, 1);

/// Layout of an 8-byte USB SETUP packet.
#[repr(C)]
#[derive(Copy, Clone, Debug, FromBytes, Unaligned)]
pub struct SetupRequest {
    /// Direction, type and recipient bitfield. The combinations this
    /// device answers are matched literally in the dispatch code.
    pub request_type: u8,
    /// Request code. Standard and HID class requests are listed in
    /// [`Request`].
    pub request: u8,
    value: U16<LittleEndian>,
    index: U16<LittleEndian>,
    length: U16<LittleEndian>,
}

impl SetupRequest {
    pub fn new(request_type: u8, request: u8, value: u16, index: u16, length: u16) -> Self {
        Self {
            request_type,
            request,
            value: U16::from_bytes(value.to_le_bytes()),
            index: U16::from_bytes(index.to_le_bytes()),
            length: U16::from_bytes(length.to_le_bytes()),
        }
    }

    /// Reinterprets the raw packet bytes as delivered by the peripheral.
    pub fn parse(raw: &[u8; 8]) -> Self {
        *LayoutVerified::<_, SetupRequest>::new(&raw[..])
            .unwrap()
            .into_ref()
    }

    pub fn value(&self) -> u16 {
        self.value.get()
    }

    pub fn index(&self) -> u16 {
        self.index.get()
    }

    /// Number of bytes the host will transfer in the data stage; responses
    /// must never exceed it.
    pub fn length(&self) -> u16 {
        self.length.get()
    }

    /// Descriptor type for GetDescriptor, carried in the high byte of
    /// `wValue`.
    pub fn descriptor_type(&self) -> u16 {
        self.value.get() >> 8
    }

    /// Descriptor index for GetDescriptor, carried in the low byte of
    /// `wValue`.
    pub fn descriptor_index(&self) -> u8 {
        (self.value.get() & 0xff) as u8
    }
}

/// The control requests this device understands (USB 2.0 table 9-4 plus
/// the HID 1.11 class requests it shares code 0x0B with).
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
pub enum Request {
    GetStatus = 0x00,
    ClearFeature = 0x01,
    SetFeature = 0x03,
    /// Handled by the peripheral hardware; must not be stalled.
    SetAddress = 0x05,
    GetDescriptor = 0x06,
    GetConfiguration = 0x08,
    SetConfiguration = 0x09,
    /// HID class. Accepted for any value.
    SetIdle = 0x0a,
    /// Standard SetInterface and HID SetProtocol share this code; the
    /// dispatch splits them on `request_type`.
    SetInterface = 0x0b,
}

/// Feature selector for SetFeature/ClearFeature with an endpoint
/// recipient.
pub const FEATURE_ENDPOINT_HALT: u16 = 0;
/// Feature selector for SetFeature/ClearFeature with a device recipient.
pub const FEATURE_DEVICE_REMOTE_WAKEUP: u16 = 1;
