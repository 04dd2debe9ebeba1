// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Steady-state transfer handling once setup decoding is out of the
//! way: closing EP0 status stages, and the receive loop that keeps the
//! interrupt OUT endpoint armed and feeds completed 64-byte frames to
//! the sink.

use crate::bus::{RecvSink, StatusIndicator, TransferStatus, UsbBus};
use crate::device::{FatalError, UsbDevice};
use crate::protocol::{EndpointAddr, EP0_IN, EP0_OUT, EP1_OUT};

impl<B: UsbBus, S: RecvSink, I: StatusIndicator> UsbDevice<B, S, I> {
    pub(crate) fn on_transfer(
        &mut self,
        endpoint: EndpointAddr,
        status: TransferStatus,
    ) -> Result<(), FatalError> {
        if endpoint == EP1_OUT {
            self.pump_receive(status)
        } else if endpoint == EP0_IN || endpoint == EP0_OUT {
            self.ep0_complete(endpoint, status);
            Ok(())
        } else {
            // IN completions on the interrupt endpoint need no action;
            // the application queues the next report when it has one.
            Ok(())
        }
    }

    /// A control transfer data stage finished. On success the status
    /// stage must be allowed to complete, or the host sits on a pending
    /// transfer forever.
    fn ep0_complete(&mut self, endpoint: EndpointAddr, status: TransferStatus) {
        match status {
            TransferStatus::Ok => {
                if !self.bus.auto_status_stage() {
                    self.bus.setup_ack();
                }
            }
            TransferStatus::Aborted => {
                // The host gave up on the transfer. Normal.
                log::info!("transfer aborted on {:?}", endpoint);
            }
            other => {
                log::warn!("transfer failed on {:?}: {:?}", endpoint, other);
                self.bus.setup_stall();
            }
        }
    }

    /// The interrupt OUT receive loop. `Waiting` means the host has a
    /// packet for us and we must provide the buffer; `Ok` means the
    /// buffer is full and goes upstream.
    fn pump_receive(&mut self, status: TransferStatus) -> Result<(), FatalError> {
        match status {
            TransferStatus::Waiting => {
                let size = self.bus.ep_out_size(EP1_OUT);
                if size > self.rx_frame.len() {
                    // The hardware and our report descriptor disagree
                    // about the packet size. Drop the frame rather than
                    // overrun; this does not happen on a sane bus.
                    log::error!("invalid transfer size {} on {:?}", size, EP1_OUT);
                    return Ok(());
                }
                if let Err(err) = self.bus.ep_recv(EP1_OUT, size) {
                    log::warn!("failed to arm receive on {:?}: {}", EP1_OUT, err);
                }
                Ok(())
            }
            TransferStatus::Ok => {
                self.bus.ep_read(EP1_OUT, &mut self.rx_frame);
                // Frames are handed upstream whole. A sink that cannot
                // take all 64 bytes has lost CTAPHID framing, and there
                // is no way to resynchronize from here.
                let accepted = self.sink.accept(&self.rx_frame);
                if accepted != self.rx_frame.len() {
                    log::error!("receive sink exhausted, accepted {} of 64", accepted);
                    return Err(FatalError::RecvSinkExhausted {
                        offered: self.rx_frame.len(),
                        accepted,
                    });
                }
                Ok(())
            }
            TransferStatus::Overload => {
                log::error!("receive overload on {:?}", EP1_OUT);
                Ok(())
            }
            TransferStatus::Aborted => {
                log::warn!("transfer aborted on {:?}", EP1_OUT);
                Ok(())
            }
        }
    }
}
