// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The descriptor tables the device serves during enumeration.
//!
//! Descriptors are described as typed structures and serialized once,
//! at initialization, into the fixed byte tables of a
//! [`DescriptorCatalog`]. After that the catalog is read-only; every
//! GetDescriptor response is a borrow into it. The interface, HID and
//! endpoint descriptors are served as sub-slices of the configuration
//! blob, which the USB spec requires to be their concatenation anyway.

use core::mem::size_of;

use byteorder::LittleEndian;
use num_derive::FromPrimitive;
use zerocopy::{AsBytes, U16};

use crate::{REMOTE_WAKEUP_CAPABLE, SELF_POWERED};

/// Descriptor type codes, standard (USB 2.0 table 9-5) and HID class.
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive, AsBytes)]
#[repr(u8)]
pub enum DescriptorType {
    Device = 0x01,
    Configuration = 0x02,
    String = 0x03,
    Interface = 0x04,
    Endpoint = 0x05,
    Hid = 0x21,
    Report = 0x22,
}

/// Vendor ID (Nordic Semiconductor).
pub const VENDOR_ID: u16 = 0x1915;
pub const PRODUCT_ID: u16 = 0xaaaa;
/// Device release number, BCD.
pub const DEVICE_RELEASE: u16 = 0x0105;
/// USB specification release, BCD (2.0).
pub const USB_RELEASE: u16 = 0x0200;
/// Both EP0 and the interrupt endpoints move 64-byte packets.
pub const MAX_PACKET_SIZE: u16 = 64;
/// Interrupt polling interval in frames.
pub const POLL_INTERVAL: u8 = 8;
/// Maximum draw in 2 mA units (98 mA).
pub const MAX_POWER: u8 = 49;

pub const MANUFACTURER: &str = "Needa N";
pub const PRODUCT: &str = "FIDO2 Token";

const STRING_LANG_INDEX: u8 = 0;
const STRING_MANUFACTURER_INDEX: u8 = 1;
const STRING_PRODUCT_INDEX: u8 = 2;

/// bmAttributes of the configuration: bit 7 is always set, bit 6 is
/// self-powered, bit 5 is remote-wakeup capable.
const CONFIG_ATTRIBUTES: u8 =
    0x80 | ((SELF_POWERED as u8) << 6) | ((REMOTE_WAKEUP_CAPABLE as u8) << 5);

#[repr(C)]
#[derive(AsBytes)]
struct DeviceDescriptor {
    length: u8,
    descriptor_type: DescriptorType,
    bcd_usb: U16<LittleEndian>,
    device_class: u8,
    device_subclass: u8,
    device_protocol: u8,
    max_packet_size0: u8,
    vendor: U16<LittleEndian>,
    product: U16<LittleEndian>,
    bcd_device: U16<LittleEndian>,
    manufacturer_s: u8,
    product_s: u8,
    serial_s: u8,
    num_configurations: u8,
}

#[repr(C)]
#[derive(AsBytes)]
struct ConfigurationDescriptor {
    length: u8,
    descriptor_type: DescriptorType,
    /// Length of this descriptor plus the interface, HID and endpoint
    /// descriptors that follow it in the blob.
    total_length: U16<LittleEndian>,
    num_interfaces: u8,
    configuration_value: u8,
    configuration_s: u8,
    attributes: u8,
    max_power: u8,
}

#[repr(C)]
#[derive(AsBytes)]
struct InterfaceDescriptor {
    length: u8,
    descriptor_type: DescriptorType,
    interface_number: u8,
    alternate_setting: u8,
    num_endpoints: u8,
    interface_class: u8,
    interface_subclass: u8,
    interface_protocol: u8,
    interface_s: u8,
}

/// The HID class descriptor announcing the report descriptor.
///
/// HID 1.11 wants this between the interface and endpoint descriptors,
/// and that ordering also keeps old Windows hosts happy.
#[repr(C)]
#[derive(AsBytes)]
struct HidDescriptor {
    length: u8,
    descriptor_type: DescriptorType,
    bcd_hid: U16<LittleEndian>,
    country_code: u8,
    num_descriptors: u8,
    report_type: DescriptorType,
    report_length: U16<LittleEndian>,
}

#[repr(C)]
#[derive(AsBytes)]
struct EndpointDescriptor {
    length: u8,
    descriptor_type: DescriptorType,
    endpoint_address: u8,
    attributes: u8,
    max_packet_size: U16<LittleEndian>,
    interval: u8,
}

/// Endpoint attribute bits for an interrupt endpoint.
const TRANSFER_TYPE_INTERRUPT: u8 = 0x03;

const DEVICE_DESC_SIZE: usize = size_of::<DeviceDescriptor>();
const CONFIG_DESC_SIZE: usize = size_of::<ConfigurationDescriptor>();
const INTERFACE_DESC_SIZE: usize = size_of::<InterfaceDescriptor>();
const HID_DESC_SIZE: usize = size_of::<HidDescriptor>();
const ENDPOINT_DESC_SIZE: usize = size_of::<EndpointDescriptor>();
const CONFIG_TOTAL_SIZE: usize =
    CONFIG_DESC_SIZE + INTERFACE_DESC_SIZE + HID_DESC_SIZE + 2 * ENDPOINT_DESC_SIZE;

const LANG_DESC_SIZE: usize = 4;
const MANUFACTURER_DESC_SIZE: usize = 2 + 2 * MANUFACTURER.len();
const PRODUCT_DESC_SIZE: usize = 2 + 2 * PRODUCT.len();
const REPORT_DESC_SIZE: usize = 34;

/// The CTAPHID report descriptor: vendor-defined FIDO alliance usage
/// page, one 64-byte input report and one 64-byte output report.
const REPORT_DESCRIPTOR: [u8; REPORT_DESC_SIZE] = [
    0x06, 0xd0, 0xf1, // usage page (FIDO alliance)
    0x09, 0x01, //       usage (CTAPHID authenticator device)
    0xa1, 0x01, //       collection (application)
    0x09, 0x20, //       usage (data in)
    0x15, 0x00, //         logical minimum (0)
    0x26, 0xff, 0x00, //   logical maximum (255)
    0x75, 0x08, //         report size (8)
    0x95, 0x40, //         report count (64)
    0x81, 0x02, //         input (data, variable, absolute)
    0x09, 0x21, //       usage (data out)
    0x15, 0x00, //         logical minimum (0)
    0x26, 0xff, 0x00, //   logical maximum (255)
    0x75, 0x08, //         report size (8)
    0x95, 0x40, //         report count (64)
    0x91, 0x02, //         output (data, variable, absolute)
    0xc0, //             end collection
];

/// Which table a [`DescriptorCatalog::get`] lookup wants.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DescriptorKind {
    Device,
    Configuration,
    Interface,
    Hid,
    EndpointOut,
    EndpointIn,
    StringLang,
    StringManufacturer,
    StringProduct,
    HidReport,
}

/// Immutable descriptor byte tables, built once and shared by
/// reference for the life of the device.
pub struct DescriptorCatalog {
    device: [u8; DEVICE_DESC_SIZE],
    configuration: [u8; CONFIG_TOTAL_SIZE],
    string_lang: [u8; LANG_DESC_SIZE],
    string_manufacturer: [u8; MANUFACTURER_DESC_SIZE],
    string_product: [u8; PRODUCT_DESC_SIZE],
    hid_report: [u8; REPORT_DESC_SIZE],
}

impl DescriptorCatalog {
    pub fn build() -> Self {
        let device = DeviceDescriptor {
            length: DEVICE_DESC_SIZE as u8,
            descriptor_type: DescriptorType::Device,
            bcd_usb: U16::from_bytes(u16::to_le_bytes(USB_RELEASE)),
            // Class information lives on the interface.
            device_class: 0,
            device_subclass: 0,
            device_protocol: 0,
            max_packet_size0: MAX_PACKET_SIZE as u8,
            vendor: U16::from_bytes(u16::to_le_bytes(VENDOR_ID)),
            product: U16::from_bytes(u16::to_le_bytes(PRODUCT_ID)),
            bcd_device: U16::from_bytes(u16::to_le_bytes(DEVICE_RELEASE)),
            manufacturer_s: STRING_MANUFACTURER_INDEX,
            product_s: STRING_PRODUCT_INDEX,
            // No serial number string.
            serial_s: 0,
            num_configurations: 1,
        };

        let configuration = ConfigurationDescriptor {
            length: CONFIG_DESC_SIZE as u8,
            descriptor_type: DescriptorType::Configuration,
            total_length: U16::from_bytes(u16::to_le_bytes(CONFIG_TOTAL_SIZE as u16)),
            num_interfaces: 1,
            configuration_value: 1,
            configuration_s: 0,
            attributes: CONFIG_ATTRIBUTES,
            max_power: MAX_POWER,
        };

        let interface = InterfaceDescriptor {
            length: INTERFACE_DESC_SIZE as u8,
            descriptor_type: DescriptorType::Interface,
            interface_number: 0,
            alternate_setting: 0,
            num_endpoints: 2,
            // HID, no boot interface.
            interface_class: 0x03,
            interface_subclass: 0,
            interface_protocol: 0,
            interface_s: 0,
        };

        let hid = HidDescriptor {
            length: HID_DESC_SIZE as u8,
            descriptor_type: DescriptorType::Hid,
            bcd_hid: U16::from_bytes(u16::to_le_bytes(0x0111)),
            country_code: 0,
            num_descriptors: 1,
            report_type: DescriptorType::Report,
            report_length: U16::from_bytes(u16::to_le_bytes(REPORT_DESC_SIZE as u16)),
        };

        let endpoint_out = EndpointDescriptor {
            length: ENDPOINT_DESC_SIZE as u8,
            descriptor_type: DescriptorType::Endpoint,
            endpoint_address: crate::protocol::EP1_OUT.raw(),
            attributes: TRANSFER_TYPE_INTERRUPT,
            max_packet_size: U16::from_bytes(u16::to_le_bytes(MAX_PACKET_SIZE)),
            interval: POLL_INTERVAL,
        };

        let endpoint_in = EndpointDescriptor {
            length: ENDPOINT_DESC_SIZE as u8,
            descriptor_type: DescriptorType::Endpoint,
            endpoint_address: crate::protocol::EP1_IN.raw(),
            attributes: TRANSFER_TYPE_INTERRUPT,
            max_packet_size: U16::from_bytes(u16::to_le_bytes(MAX_PACKET_SIZE)),
            interval: POLL_INTERVAL,
        };

        let mut configuration_blob = [0u8; CONFIG_TOTAL_SIZE];
        let mut used = 0;
        for part in [
            configuration.as_bytes(),
            interface.as_bytes(),
            hid.as_bytes(),
            endpoint_out.as_bytes(),
            endpoint_in.as_bytes(),
        ] {
            configuration_blob[used..used + part.len()].copy_from_slice(part);
            used += part.len();
        }

        let mut device_table = [0u8; DEVICE_DESC_SIZE];
        device_table.copy_from_slice(device.as_bytes());

        Self {
            device: device_table,
            configuration: configuration_blob,
            // US English.
            string_lang: [LANG_DESC_SIZE as u8, DescriptorType::String as u8, 0x09, 0x04],
            string_manufacturer: string_descriptor(MANUFACTURER),
            string_product: string_descriptor(PRODUCT),
            hid_report: REPORT_DESCRIPTOR,
        }
    }

    /// Looks up a descriptor table. The interface, HID and endpoint
    /// entries are sub-slices of the configuration blob.
    pub fn get(&self, kind: DescriptorKind) -> &[u8] {
        const INTERFACE_OFF: usize = CONFIG_DESC_SIZE;
        const HID_OFF: usize = INTERFACE_OFF + INTERFACE_DESC_SIZE;
        const ENDPOINT_OUT_OFF: usize = HID_OFF + HID_DESC_SIZE;
        const ENDPOINT_IN_OFF: usize = ENDPOINT_OUT_OFF + ENDPOINT_DESC_SIZE;

        match kind {
            DescriptorKind::Device => &self.device,
            DescriptorKind::Configuration => &self.configuration,
            DescriptorKind::Interface => &self.configuration[INTERFACE_OFF..HID_OFF],
            DescriptorKind::Hid => &self.configuration[HID_OFF..ENDPOINT_OUT_OFF],
            DescriptorKind::EndpointOut => {
                &self.configuration[ENDPOINT_OUT_OFF..ENDPOINT_IN_OFF]
            }
            DescriptorKind::EndpointIn => &self.configuration[ENDPOINT_IN_OFF..],
            DescriptorKind::StringLang => &self.string_lang,
            DescriptorKind::StringManufacturer => &self.string_manufacturer,
            DescriptorKind::StringProduct => &self.string_product,
            DescriptorKind::HidReport => &self.hid_report,
        }
    }

    /// String descriptor for the given index, if one exists. Index 0 is
    /// the language table.
    pub fn string(&self, index: u8) -> Option<&[u8]> {
        match index {
            STRING_LANG_INDEX => Some(self.get(DescriptorKind::StringLang)),
            STRING_MANUFACTURER_INDEX => Some(self.get(DescriptorKind::StringManufacturer)),
            STRING_PRODUCT_INDEX => Some(self.get(DescriptorKind::StringProduct)),
            _ => None,
        }
    }
}

/// Builds a UTF-16LE string descriptor from fixed ASCII content. `N`
/// must be exactly `2 + 2 * text.len()`.
fn string_descriptor<const N: usize>(text: &str) -> [u8; N] {
    debug_assert_eq!(N, 2 + 2 * text.len());
    let mut out = [0u8; N];
    out[0] = N as u8;
    out[1] = DescriptorType::String as u8;
    for (i, b) in text.bytes().enumerate() {
        out[2 + 2 * i] = b;
    }
    out
}
