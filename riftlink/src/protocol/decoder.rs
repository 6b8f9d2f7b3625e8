/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Frame decoding: the receiving side of the protocol.
//!
//! The platform itself never answers, so nothing in the transmit path needs
//! this.  It exists for the simulators in `test-tools` and for tests that
//! check the encoder from the outside.

use tracing::trace;

use super::crc::crc16;
use super::error::DecodeError;
use super::{
    unescape, BlockLayout, Markers, CHECKSUMMED_LEN, CMD_ORIENTATION, LOGICAL_INTERIOR_LEN,
    MAX_FRAME_LEN, RESERVED_LEN,
};
use crate::orientation::Orientation;

// ── DecodedFrame ──────────────────────────────────────────────────────────────

/// Logical content of one received frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedFrame {
    /// Length byte as sent (a protocol constant, not a measured size).
    pub declared_len: u8,
    pub command: u8,
    /// Raw flag byte; [`layout`](Self::layout) interprets it.
    pub flag: u8,
    pub orientation: Orientation,
    pub reserved: [u8; RESERVED_LEN],
    pub checksum: u16,
}

impl DecodedFrame {
    pub fn layout(&self) -> Option<BlockLayout> {
        BlockLayout::from_wire(self.flag)
    }
}

fn le_f32(bytes: &[u8]) -> f32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[..4]);
    f32::from_le_bytes(raw)
}

/// Decode one complete frame, SOM through EOM.
///
/// # Errors
/// Any [`DecodeError`] except [`DecodeError::Truncated`], which only the
/// streaming [`FrameDecoder`] produces.
pub fn decode_frame(wire: &[u8], markers: &Markers) -> Result<DecodedFrame, DecodeError> {
    let (&first, rest) = wire.split_first().ok_or(DecodeError::Empty)?;
    if first != markers.som() {
        return Err(DecodeError::MissingStartMarker { found: first });
    }
    let (&last, interior) = rest.split_last().ok_or(DecodeError::MissingEndMarker { found: first })?;
    if last != markers.eom() {
        return Err(DecodeError::MissingEndMarker { found: last });
    }

    let logical = unescape(interior, markers)?;
    if logical.len() != LOGICAL_INTERIOR_LEN {
        return Err(DecodeError::UnexpectedLength {
            expected: LOGICAL_INTERIOR_LEN,
            actual: logical.len(),
        });
    }

    let (checked, crc_bytes) = logical.split_at(CHECKSUMMED_LEN);
    let received = u16::from_le_bytes([crc_bytes[0], crc_bytes[1]]);
    let computed = crc16(checked);
    if received != computed {
        return Err(DecodeError::ChecksumMismatch { received, computed });
    }

    let command = checked[1];
    if command != CMD_ORIENTATION {
        return Err(DecodeError::UnsupportedCommand(command));
    }

    let mut reserved = [0u8; RESERVED_LEN];
    reserved.copy_from_slice(&checked[11..11 + RESERVED_LEN]);

    Ok(DecodedFrame {
        declared_len: checked[0],
        command,
        flag: checked[2],
        orientation: Orientation::new(le_f32(&checked[3..7]), le_f32(&checked[7..11])),
        reserved,
        checksum: received,
    })
}

// ── FrameDecoder (streaming) ──────────────────────────────────────────────────

enum ParseState {
    SeekStart,
    InFrame,
}

/// Incremental decoder for a byte stream (serial capture, concatenated
/// datagrams).
///
/// Bytes outside a frame are skipped.  A start marker inside a frame restarts
/// the frame and reports [`DecodeError::Truncated`] for the discarded part.
/// A frame that reaches [`MAX_FRAME_LEN`] without an end marker is dropped
/// with [`DecodeError::Oversized`], so the buffer never grows past that.
pub struct FrameDecoder {
    markers: Markers,
    state: ParseState,
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new(markers: Markers) -> Self {
        Self {
            markers,
            state: ParseState::SeekStart,
            buf: Vec::with_capacity(MAX_FRAME_LEN),
        }
    }

    /// Feed the next chunk and collect every frame it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<DecodedFrame, DecodeError>> {
        let mut out = Vec::new();

        for &b in chunk {
            match self.state {
                ParseState::SeekStart => {
                    if b == self.markers.som() {
                        self.buf.clear();
                        self.buf.push(b);
                        self.state = ParseState::InFrame;
                    } else {
                        trace!(byte = b, "skipping byte outside frame");
                    }
                }
                ParseState::InFrame => {
                    if b == self.markers.som() {
                        out.push(Err(DecodeError::Truncated {
                            discarded: self.buf.len(),
                        }));
                        self.buf.clear();
                        self.buf.push(b);
                    } else if b == self.markers.eom() {
                        self.buf.push(b);
                        out.push(decode_frame(&self.buf, &self.markers));
                        self.buf.clear();
                        self.state = ParseState::SeekStart;
                    } else {
                        self.buf.push(b);
                        // A frame this long with no end marker yet cannot be valid.
                        if self.buf.len() >= MAX_FRAME_LEN {
                            out.push(Err(DecodeError::Oversized {
                                discarded: self.buf.len(),
                            }));
                            self.buf.clear();
                            self.state = ParseState::SeekStart;
                        }
                    }
                }
            }
        }

        out
    }

    /// Returns `true` while a frame has started but not yet ended.
    pub fn in_frame(&self) -> bool {
        matches!(self.state, ParseState::InFrame)
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(Markers::DEFAULT)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
