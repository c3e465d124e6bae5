//! Send and receive side of logical connections.
//!
//! Outbound buffers wait in the control block's send queue and are cut into
//! segments only while credits remain, so a connection without credits
//! simply stops draining until a CORE_CONN_CREDITS notification tops it up.
//! Inbound segments are collected per connection and handed to the owner as
//! soon as [`RxQueue`](crate::data::RxQueue) reports a buffer ready.

use bytes::Bytes;
use log::{debug, error, warn};

use super::Engine;
use crate::{
    codec::{DataFrame, Frame, MessageType},
    conn::{ConnId, ControlBlock},
    data::Fragmenter,
    error::{NciError, Result},
    event::ConnEvent,
    metrics,
    params::{interface, protocol},
    state::NfcState,
    status::Status,
    timer::TimerKind,
    transport::Transport,
};

impl<T: Transport> Engine<T> {
    /// Queue `data` on connection `id` and send as much as credits allow.
    ///
    /// # Errors
    ///
    /// Returns [`NciError::BadHandle`] if `id` is not bound, or
    /// [`NciError::WrongProtocol`] if the connection cannot carry data yet
    /// (the RF link is not open, or no payload size was negotiated).
    pub fn send_data(&mut self, id: ConnId, data: Bytes) -> Result<()> {
        let state = self.state;
        let block = self.conns.by_id_mut(id).ok_or(NciError::BadHandle)?;
        if id == ConnId::RF && state != NfcState::Open {
            return Err(NciError::WrongProtocol);
        }
        if block.max_payload() == 0 {
            return Err(NciError::WrongProtocol);
        }
        block.tx.push_back(data);
        self.drain_tx(id);
        Ok(())
    }

    /// Discard everything waiting in the send queue of `id`.
    ///
    /// # Errors
    ///
    /// Returns [`NciError::BadHandle`] if `id` is not bound.
    pub fn flush_data(&mut self, id: ConnId) -> Result<()> {
        let block = self.conns.by_id_mut(id).ok_or(NciError::BadHandle)?;
        let dropped = block.tx.len();
        block.tx.clear();
        if dropped > 0 {
            debug!("flushed {dropped} buffers from {id}");
        }
        Ok(())
    }

    /// Write segments from the head of the send queue while credits last.
    ///
    /// RF data only moves while the link is open.
    pub(crate) fn drain_tx(&mut self, id: ConnId) {
        if id == ConnId::RF && self.state != NfcState::Open {
            return;
        }
        loop {
            let Some(block) = self.conns.by_id_mut(id) else {
                return;
            };
            let Some(packet) = next_data_packet(block) else {
                break;
            };
            match packet {
                Ok(packet) => self.write_packet(&packet, MessageType::Data),
                Err(err) => {
                    error!("dropping unencodable segment on {id}: {err}");
                    return;
                }
            }
        }
        self.arm_credit_wait(id);
    }

    /// Start the credit-wait timer when the RF connection ran out of credits
    /// with data still queued.
    fn arm_credit_wait(&mut self, id: ConnId) {
        let Some(wait) = self.config.credit_wait else {
            return;
        };
        if id != ConnId::RF || self.timers.is_running(TimerKind::CreditWait) {
            return;
        }
        let starved = self
            .connection(id)
            .is_some_and(|rf| !rf.is_unlimited() && rf.credits() == 0 && rf.queued_tx() > 0);
        if starved {
            debug!("RF connection waiting for credits");
            self.start_timer(TimerKind::CreditWait, wait);
        }
    }

    /// Apply a credit delta reported by the controller.
    pub(crate) fn on_credits(&mut self, id: ConnId, delta: u8) {
        let state = self.state;
        let Some(block) = self.conns.by_id_mut(id) else {
            warn!("credits for unknown {id}");
            metrics::inc_protocol_errors();
            return;
        };
        if block.is_unlimited() {
            return;
        }
        if block.add_credits(delta) {
            if state == NfcState::Open {
                error!("{id} credits exceed the initial allotment; clamped");
            } else {
                debug!("{id} credits clamped to the initial allotment");
            }
        }
        let all_returned = block.credits() == block.initial_credits();
        if id == ConnId::RF {
            self.timers.stop(TimerKind::CreditWait);
            if state == NfcState::Closing && self.flags.deactivating && all_returned {
                self.flags.deactivating = false;
                self.timers.stop(TimerKind::DeactivateWait);
                if let Some(kind) = self.deferred_deactivate.take()
                    && let Err(err) = self.send_deactivate(kind)
                {
                    error!("failed to queue the deferred deactivate: {err}");
                }
                return;
            }
            if state != NfcState::Open {
                return;
            }
        }
        self.drain_tx(id);
    }

    /// Feed one inbound data packet into its connection.
    pub(crate) fn on_data(&mut self, frame: DataFrame) {
        let id = ConnId::new(frame.conn_id);
        let deliver_partial = id == ConnId::RF && !self.reassembly;
        let max = self.config.max_reassembly_size;
        let Some(block) = self.conns.by_id_mut(id) else {
            warn!("data for unknown {id} dropped");
            metrics::inc_protocol_errors();
            return;
        };
        let push = block.rx.push(&frame.payload, frame.pbf, max);
        if push.overflowed {
            warn!("reassembly on {id} exceeded {max} bytes; delivering in parts");
        }
        if push.started && id == ConnId::RF {
            block.notify(ConnEvent::DataStart);
        }
        let strips_status = id == ConnId::RF
            && block.interface == interface::FRAME
            && (protocol::T1T..=protocol::T3T).contains(&block.protocol());
        for delivery in block.rx.drain_ready(deliver_partial) {
            let (status, data) = if strips_status && delivery.status.is_ok() {
                split_rf_status(delivery.data)
            } else {
                (delivery.status, delivery.data)
            };
            block.notify(ConnEvent::Data { status, data });
        }
    }
}

/// Cut the next segment off `block`'s send queue, if it may be sent now.
fn next_data_packet(block: &mut ControlBlock) -> Option<Result<Bytes>> {
    if block.credits() == 0 && !block.is_unlimited() {
        return None;
    }
    let fragmenter = Fragmenter::for_payload_size(block.max_payload())?;
    let head = block.tx.front_mut()?;
    let segment = fragmenter.next_segment(head);
    if !segment.more {
        block.tx.pop_front();
    }
    block.consume_credit();
    let frame = Frame::Data(DataFrame {
        conn_id: block.id().get(),
        pbf: segment.more,
        payload: segment.payload,
    });
    Some(frame.encode().map_err(NciError::from))
}

/// Split the trailing RF status byte off a frame-interface buffer.
fn split_rf_status(mut data: Bytes) -> (Status, Bytes) {
    if data.is_empty() {
        return (Status::FAILED, data);
    }
    let status = data.split_off(data.len() - 1);
    (status.first().copied().map_or(Status::FAILED, Status::new), data)
}
