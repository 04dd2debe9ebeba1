// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Descriptor and status requests, as the host issues them during and
//! after enumeration.

mod util;

use util::{configured_device, device, setup};

const DEVICE_DESCRIPTOR: [u8; 18] = [
    0x12, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x40, 0x15, 0x19, 0xaa, 0xaa, 0x05, 0x01, 0x01,
    0x02, 0x00, 0x01,
];

#[test]
fn device_descriptor_truncates_to_the_requested_length() {
    for length in [0u16, 1, 17, 18, 64] {
        let mut dev = device();
        dev.handle_usb_event(setup(0x80, 0x06, 0x0100, 0, length)).unwrap();
        let expected = &DEVICE_DESCRIPTOR[..DEVICE_DESCRIPTOR.len().min(length as usize)];
        assert_eq!(
            dev.bus().last_response(),
            expected,
            "wrong response for wLength {length}"
        );
        assert_eq!(dev.bus().stalls(), 0);
    }
}

#[test]
fn configuration_descriptor_carries_the_whole_hierarchy() {
    let mut dev = device();
    dev.handle_usb_event(setup(0x80, 0x06, 0x0200, 0, 255)).unwrap();

    let blob = dev.bus().last_response();
    assert_eq!(blob.len(), 41);
    assert_eq!(blob[1], 0x02);
    assert_eq!(u16::from_le_bytes([blob[2], blob[3]]), 41);
    // Interface descriptor follows: HID class, two endpoints.
    assert_eq!(blob[9..18], [0x09, 0x04, 0, 0, 2, 0x03, 0, 0, 0]);
    // HID descriptor announces the 34-byte report descriptor.
    assert_eq!(blob[18..27], [0x09, 0x21, 0x11, 0x01, 0x00, 0x01, 0x22, 34, 0]);
    // Interrupt OUT then interrupt IN, 64 bytes, interval 8.
    assert_eq!(blob[27..34], [0x07, 0x05, 0x01, 0x03, 0x40, 0x00, 0x08]);
    assert_eq!(blob[34..41], [0x07, 0x05, 0x81, 0x03, 0x40, 0x00, 0x08]);
}

#[test]
fn string_descriptors_cover_exactly_three_indices() {
    let mut dev = device();

    dev.handle_usb_event(setup(0x80, 0x06, 0x0300, 0, 255)).unwrap();
    assert_eq!(dev.bus().last_response(), [4, 0x03, 0x09, 0x04]);

    dev.handle_usb_event(setup(0x80, 0x06, 0x0301, 0, 255)).unwrap();
    let manufacturer = dev.bus().last_response();
    assert_eq!(manufacturer[0] as usize, manufacturer.len());
    assert_eq!(manufacturer[1], 0x03);

    dev.handle_usb_event(setup(0x80, 0x06, 0x0302, 0, 255)).unwrap();
    let product = dev.bus().last_response();
    assert_eq!(&product[2..], b"F\0I\0D\0O\x002\0 \0T\0o\0k\0e\0n\0");

    // Anything past the product string is undefined and must stall,
    // not fabricate data.
    dev.handle_usb_event(setup(0x80, 0x06, 0x0303, 0, 255)).unwrap();
    assert_eq!(dev.bus().stalls(), 1);
    assert_eq!(dev.bus().responses().len(), 3);
}

#[test]
fn interface_descriptor_exists_only_for_interface_zero() {
    let mut dev = device();
    dev.handle_usb_event(setup(0x80, 0x06, 0x0400, 0, 9)).unwrap();
    assert_eq!(dev.bus().last_response()[1], 0x04);

    dev.handle_usb_event(setup(0x80, 0x06, 0x0401, 0, 9)).unwrap();
    assert_eq!(dev.bus().stalls(), 1);
}

#[test]
fn endpoint_descriptors_use_sub_descriptor_indices() {
    let mut dev = device();

    dev.handle_usb_event(setup(0x80, 0x06, 0x0501, 0, 7)).unwrap();
    assert_eq!(dev.bus().last_response()[2], 0x01);

    dev.handle_usb_event(setup(0x80, 0x06, 0x0502, 0, 7)).unwrap();
    assert_eq!(dev.bus().last_response()[2], 0x81);

    dev.handle_usb_event(setup(0x80, 0x06, 0x0500, 0, 7)).unwrap();
    dev.handle_usb_event(setup(0x80, 0x06, 0x0503, 0, 7)).unwrap();
    assert_eq!(dev.bus().stalls(), 2);
}

#[test]
fn hid_descriptors_are_interface_requests() {
    let mut dev = device();

    dev.handle_usb_event(setup(0x81, 0x06, 0x2100, 0, 9)).unwrap();
    assert_eq!(dev.bus().last_response()[1], 0x21);

    dev.handle_usb_event(setup(0x81, 0x06, 0x2200, 0, 34)).unwrap();
    let report = dev.bus().last_response();
    assert_eq!(report.len(), 34);
    assert_eq!(&report[..3], [0x06, 0xd0, 0xf1]);

    // The device-recipient form is not valid for class descriptors.
    dev.handle_usb_event(setup(0x80, 0x06, 0x2200, 0, 34)).unwrap();
    assert_eq!(dev.bus().stalls(), 1);
}

#[test]
fn report_descriptor_is_truncated_like_any_other() {
    let mut dev = device();
    dev.handle_usb_event(setup(0x81, 0x06, 0x2200, 0, 16)).unwrap();
    assert_eq!(dev.bus().last_response().len(), 16);
}

#[test]
fn device_status_reports_the_feature_bits() {
    let mut dev = device();
    dev.handle_usb_event(setup(0x80, 0x00, 0, 0, 2)).unwrap();
    // Bus powered, remote wakeup not yet enabled by the host.
    assert_eq!(dev.bus().last_response(), [0x00, 0x00]);

    // After the host enables remote wakeup, bit 1 appears.
    dev.handle_usb_event(setup(0x00, 0x03, 1, 0, 0)).unwrap();
    dev.handle_usb_event(setup(0x80, 0x00, 0, 0, 2)).unwrap();
    assert_eq!(dev.bus().last_response(), [0x02, 0x00]);
}

#[test]
fn interface_status_needs_a_configured_device() {
    let mut dev = device();
    dev.handle_usb_event(setup(0x81, 0x00, 0, 0, 2)).unwrap();
    assert_eq!(dev.bus().stalls(), 1);

    let mut dev = configured_device();
    dev.handle_usb_event(setup(0x81, 0x00, 0, 0, 2)).unwrap();
    assert_eq!(dev.bus().last_response(), [0x00, 0x00]);

    // Only interface 0 exists.
    dev.handle_usb_event(setup(0x81, 0x00, 0, 1, 2)).unwrap();
    assert_eq!(dev.bus().stalls(), 1);
}

#[test]
fn endpoint_zero_status_is_always_active() {
    let mut dev = device();
    dev.handle_usb_event(setup(0x82, 0x00, 0, 0, 2)).unwrap();
    assert_eq!(dev.bus().last_response(), [0x00, 0x00]);
}

#[test]
fn interrupt_endpoint_status_is_gated_on_configuration() {
    let mut dev = device();
    dev.handle_usb_event(setup(0x82, 0x00, 0, 0x81, 2)).unwrap();
    assert_eq!(dev.bus().stalls(), 1);

    let mut dev = configured_device();
    dev.handle_usb_event(setup(0x82, 0x00, 0, 0x81, 2)).unwrap();
    assert_eq!(dev.bus().last_response(), [0x00, 0x00]);
    dev.handle_usb_event(setup(0x82, 0x00, 0, 0x01, 2)).unwrap();
    assert_eq!(dev.bus().last_response(), [0x00, 0x00]);

    // An endpoint that does not exist stalls even when configured.
    dev.handle_usb_event(setup(0x82, 0x00, 0, 0x82, 2)).unwrap();
    assert_eq!(dev.bus().stalls(), 1);
}

#[test]
fn get_configuration_tracks_the_negotiated_state() {
    let mut dev = device();
    dev.handle_usb_event(setup(0x80, 0x08, 0, 0, 1)).unwrap();
    assert_eq!(dev.bus().last_response(), [0]);

    let mut dev = configured_device();
    dev.handle_usb_event(setup(0x80, 0x08, 0, 0, 1)).unwrap();
    assert_eq!(dev.bus().last_response(), [1]);
}

#[test]
fn unknown_request_codes_stall() {
    let mut dev = device();
    // 0x02 is reserved in the standard request table.
    dev.handle_usb_event(setup(0x80, 0x02, 0, 0, 0)).unwrap();
    // 0x0C is simply unassigned.
    dev.handle_usb_event(setup(0x00, 0x0c, 0, 0, 0)).unwrap();
    assert_eq!(dev.bus().stalls(), 2);
    assert_eq!(dev.bus().acks(), 0);
    assert!(dev.bus().responses().is_empty());
}
