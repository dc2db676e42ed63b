//! Send/receive flow control for IEC 60870-5-104 sessions.
//!
//! Sequence numbers live on a 15-bit circle; all comparisons use the
//! forward modular distance rather than naive subtraction. The send
//! window admits at most `k` unacknowledged I-frames and acknowledges
//! cumulatively; the receive window counts inbound I-frames against the
//! `w` acknowledge threshold.
//!
//! Both windows are plain state machines with no notion of time; the
//! session task owns the T1/T2 deadlines derived from their
//! transitions.

use std::collections::VecDeque;

use bytes::Bytes;

use crate::error::{Iec104Error, Result};
use crate::types::SEQ_MODULO;

/// Next sequence number on the 15-bit circle.
#[inline]
pub fn seq_next(seq: u16) -> u16 {
    (seq + 1) % SEQ_MODULO
}

/// Forward distance from `from` to `to` on the 15-bit circle.
#[inline]
pub fn seq_distance(from: u16, to: u16) -> u16 {
    to.wrapping_sub(from) & (SEQ_MODULO - 1)
}

/// Outbound window: V(S), V(A) and the retained unacknowledged frames.
///
/// Invariant: `V(S) == V(A) + unacked.len() (mod 2^15)` and
/// `unacked.len() <= k`.
#[derive(Debug)]
pub struct SendWindow {
    v_s: u16,
    v_a: u16,
    k: u16,
    unacked: VecDeque<(u16, Bytes)>,
}

impl SendWindow {
    /// Create a window admitting at most `k` unacknowledged frames.
    pub fn new(k: u16) -> Self {
        Self {
            v_s: 0,
            v_a: 0,
            k,
            unacked: VecDeque::with_capacity(k as usize),
        }
    }

    /// Next send sequence number V(S).
    #[inline]
    pub fn v_s(&self) -> u16 {
        self.v_s
    }

    /// Oldest unacknowledged sequence number V(A).
    #[inline]
    pub fn v_a(&self) -> u16 {
        self.v_a
    }

    /// Number of frames in flight.
    #[inline]
    pub fn in_flight(&self) -> usize {
        self.unacked.len()
    }

    /// Check whether the window has no frames in flight.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.unacked.is_empty()
    }

    /// Check whether another I-frame may be admitted.
    #[inline]
    pub fn has_room(&self) -> bool {
        self.unacked.len() < self.k as usize
    }

    /// Admit a frame, retaining its bytes until acknowledged.
    ///
    /// Returns the N(S) assigned to the frame.
    pub fn push(&mut self, frame: Bytes) -> Result<u16> {
        if !self.has_room() {
            return Err(Iec104Error::WindowOverflow(self.k));
        }
        let ns = self.v_s;
        self.unacked.push_back((ns, frame));
        self.v_s = seq_next(self.v_s);
        debug_assert_eq!(
            seq_distance(self.v_a, self.v_s) as usize,
            self.unacked.len()
        );
        Ok(ns)
    }

    /// Apply a received N(R), discarding every frame it acknowledges.
    ///
    /// Acknowledgement is cumulative: `nr` acknowledges all frames with
    /// N(S) modularly below it. An `nr` outside `[V(A), V(S)]` is a
    /// fatal protocol error. Returns the number of frames released.
    pub fn acknowledge(&mut self, nr: u16) -> Result<usize> {
        let acked = seq_distance(self.v_a, nr);
        if acked > seq_distance(self.v_a, self.v_s) {
            return Err(Iec104Error::NrOutOfRange {
                nr,
                va: self.v_a,
                vs: self.v_s,
            });
        }

        for _ in 0..acked {
            self.unacked.pop_front();
        }
        self.v_a = nr;
        debug_assert_eq!(
            seq_distance(self.v_a, self.v_s) as usize,
            self.unacked.len()
        );
        Ok(acked as usize)
    }

    /// Oldest in-flight sequence number, if any.
    pub fn oldest(&self) -> Option<u16> {
        self.unacked.front().map(|(ns, _)| *ns)
    }
}

/// Inbound window: V(R) and the count of unacknowledged receives.
///
/// Invariant: `unacked_rx <= w`.
#[derive(Debug)]
pub struct RecvWindow {
    v_r: u16,
    unacked_rx: u16,
    w: u16,
}

impl RecvWindow {
    /// Create a window with acknowledge threshold `w`.
    pub fn new(w: u16) -> Self {
        Self {
            v_r: 0,
            unacked_rx: 0,
            w,
        }
    }

    /// Next expected receive sequence number V(R).
    #[inline]
    pub fn v_r(&self) -> u16 {
        self.v_r
    }

    /// Number of received I-frames not yet acknowledged.
    #[inline]
    pub fn pending(&self) -> u16 {
        self.unacked_rx
    }

    /// Accept an inbound I-frame with the given N(S).
    ///
    /// TCP preserves ordering, so anything other than the expected
    /// sequence number is a protocol violation.
    pub fn accept(&mut self, ns: u16) -> Result<()> {
        if ns != self.v_r {
            return Err(Iec104Error::protocol(format!(
                "unexpected N(S) {ns}, expected {}",
                self.v_r
            )));
        }
        self.v_r = seq_next(self.v_r);
        self.unacked_rx += 1;
        debug_assert!(self.unacked_rx <= self.w);
        Ok(())
    }

    /// Check whether the `w` threshold forces an acknowledgement now.
    #[inline]
    pub fn must_ack(&self) -> bool {
        self.unacked_rx >= self.w
    }

    /// Check whether an acknowledgement is owed at all.
    #[inline]
    pub fn owes_ack(&self) -> bool {
        self.unacked_rx > 0
    }

    /// Record that an acknowledgement carrying V(R) went out
    /// (dedicated S-frame or piggybacked on an I-frame).
    #[inline]
    pub fn ack_sent(&mut self) {
        self.unacked_rx = 0;
    }
}
