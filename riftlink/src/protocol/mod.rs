/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Wire protocol of the motion platform.
//!
//! One frame carries one orientation sample:
//!
//! ```text
//!  logical layout (before escaping)
//! ┌─────┬─────┬─────┬──────┬────────────┬────────────┬──────────┬────────┬─────┐
//! │ SOM │ LEN │ CMD │ FLAG │ pitch f32  │ roll f32   │ 4 × 0x00 │ CRC16  │ EOM │
//! │  1  │  1  │  1  │  1   │ 4 (LE)     │ 4 (LE)     │ 4        │ 2 (LE) │  1  │
//! └─────┴─────┴─────┴──────┴────────────┴────────────┴──────────┴────────┴─────┘
//!         └──────────── checksummed (15 logical bytes) ─────────┘
//!         └──────────────────── escaped ─────────────────────────────────┘
//! ```
//!
//! * `LEN` is a fixed protocol constant ([`DECLARED_LEN`]); it is not
//!   recomputed from the escaped size.
//! * Every interior byte `b >= esc` goes out as the pair `(esc, b - esc)`.
//!   With a valid [`Markers`] set this keeps SOM, EOM and ESC out of the
//!   interior, so a receiver can resynchronise on the markers alone.
//! * The checksum (see [`crc`]) runs over logical values, never over the
//!   escaped wire bytes.

pub mod crc;
pub mod decoder;
pub mod error;

pub use decoder::{decode_frame, DecodedFrame, FrameDecoder};
pub use error::{DecodeError, MarkerError};

use serde::Deserialize;

use crate::orientation::Orientation;
use crc::Crc16;

// ── Constants ─────────────────────────────────────────────────────────────────

// The three marker values and the `OneBlock` flag value are not taken from
// vendor documentation.  They are placeholders that satisfy the escape rule;
// check them against a capture of the vendor software and set `markers:` in
// the configuration once confirmed.

/// Default start-of-message marker (unverified placeholder).
pub const DEFAULT_SOM: u8 = 0xFE;

/// Default end-of-message marker (unverified placeholder).
pub const DEFAULT_EOM: u8 = 0xFF;

/// Default escape marker (unverified placeholder).
pub const DEFAULT_ESC: u8 = 0xFD;

/// Value written into the length byte of every orientation frame.
pub const DECLARED_LEN: u8 = 33;

/// Command code for a single orientation block update.
pub const CMD_ORIENTATION: u8 = 12;

/// Number of reserved (always zero) axis bytes after pitch and roll.
pub const RESERVED_LEN: usize = 4;

/// Logical bytes between SOM and EOM: length, command, flag, pitch, roll,
/// reserved, checksum.
pub const LOGICAL_INTERIOR_LEN: usize = 3 + 4 + 4 + RESERVED_LEN + 2;

/// Logical bytes covered by the checksum (interior minus the checksum itself).
pub const CHECKSUMMED_LEN: usize = LOGICAL_INTERIOR_LEN - 2;

/// Largest possible frame: both markers plus every interior byte escaped.
pub const MAX_FRAME_LEN: usize = 2 + 2 * LOGICAL_INTERIOR_LEN;

// ── BlockLayout ───────────────────────────────────────────────────────────────

/// Flag byte describing how the axis block is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockLayout {
    /// One block: pitch, roll and four reserved axis bytes.  Wire value
    /// `0x01` is an unverified placeholder, like the default markers.
    #[default]
    OneBlock,
}

impl BlockLayout {
    pub fn to_wire(self) -> u8 {
        match self {
            BlockLayout::OneBlock => 0x01,
        }
    }

    pub fn from_wire(v: u8) -> Option<Self> {
        match v {
            0x01 => Some(BlockLayout::OneBlock),
            _ => None,
        }
    }
}

// ── Markers ───────────────────────────────────────────────────────────────────

/// The three framing sentinels.
///
/// Only sets that keep the escape rule sound can be constructed:
/// `esc >= 0x80`, `som >= esc`, `eom >= esc`, all distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawMarkers")]
pub struct Markers {
    som: u8,
    eom: u8,
    esc: u8,
}

#[derive(Deserialize)]
struct RawMarkers {
    som: u8,
    eom: u8,
    esc: u8,
}

impl TryFrom<RawMarkers> for Markers {
    type Error = MarkerError;

    fn try_from(raw: RawMarkers) -> Result<Self, Self::Error> {
        Markers::new(raw.som, raw.eom, raw.esc)
    }
}

impl Markers {
    /// The platform's default marker set.
    pub const DEFAULT: Markers = Markers {
        som: DEFAULT_SOM,
        eom: DEFAULT_EOM,
        esc: DEFAULT_ESC,
    };

    /// Validate and build a marker set.
    pub fn new(som: u8, eom: u8, esc: u8) -> Result<Self, MarkerError> {
        if esc < 0x80 {
            return Err(MarkerError::EscapeTooLow { esc });
        }
        if som == eom || som == esc || eom == esc {
            return Err(MarkerError::NotDistinct { som, eom, esc });
        }
        if som < esc {
            return Err(MarkerError::BelowEscape {
                role: "start",
                value: som,
                esc,
            });
        }
        if eom < esc {
            return Err(MarkerError::BelowEscape {
                role: "end",
                value: eom,
                esc,
            });
        }
        Ok(Self { som, eom, esc })
    }

    pub fn som(&self) -> u8 {
        self.som
    }

    pub fn eom(&self) -> u8 {
        self.eom
    }

    pub fn esc(&self) -> u8 {
        self.esc
    }

    /// Largest residue an escape pair can carry (`0xFF - esc`).
    pub fn max_residue(&self) -> u8 {
        u8::MAX - self.esc
    }
}

impl Default for Markers {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ── Escaping ──────────────────────────────────────────────────────────────────

/// Append `byte` to `out`, escaping it if it falls in the control range.
pub fn escape_into(byte: u8, markers: &Markers, out: &mut Vec<u8>) {
    if byte >= markers.esc {
        out.push(markers.esc);
        out.push(byte - markers.esc);
    } else {
        out.push(byte);
    }
}

/// Escape a whole logical slice.
pub fn escape(bytes: &[u8], markers: &Markers) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() * 2);
    for &b in bytes {
        escape_into(b, markers, &mut out);
    }
    out
}

/// Reverse [`escape`].
///
/// # Errors
/// * [`DecodeError::DanglingEscape`] – the input ends with an escape byte.
/// * [`DecodeError::InvalidEscape`] – an escape is followed by a residue
///   larger than [`Markers::max_residue`].
/// * [`DecodeError::UnescapedControlByte`] – a byte `>= esc` appears without
///   an escape in front of it.
pub fn unescape(bytes: &[u8], markers: &Markers) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied().enumerate();

    while let Some((offset, b)) = iter.next() {
        if b == markers.esc {
            let (_, residue) = iter.next().ok_or(DecodeError::DanglingEscape { offset })?;
            if residue > markers.max_residue() {
                return Err(DecodeError::InvalidEscape {
                    offset: offset + 1,
                    residue,
                });
            }
            out.push(markers.esc + residue);
        } else if b > markers.esc {
            return Err(DecodeError::UnescapedControlByte { offset, byte: b });
        } else {
            out.push(b);
        }
    }

    Ok(out)
}

// ── Frame ─────────────────────────────────────────────────────────────────────

/// One encoded, wire-ready frame.
///
/// Built fresh for every tick and never modified after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8>,
    checksum: u16,
}

impl Frame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Checksum carried by the frame, computed over the logical interior.
    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

// ── FrameEncoder ──────────────────────────────────────────────────────────────

/// Builds orientation frames.
///
/// Stateless apart from the marker set; `Copy` so the scheduler task can own
/// its own instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameEncoder {
    markers: Markers,
    layout: BlockLayout,
}

impl FrameEncoder {
    /// Encoder using the default marker set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoder using a custom (already validated) marker set.
    pub fn with_markers(markers: Markers) -> Self {
        Self {
            markers,
            layout: BlockLayout::OneBlock,
        }
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    /// Encode one sample.
    ///
    /// The sample is encoded as given; clamping is the controller's job.
    pub fn encode(&self, orientation: Orientation) -> Frame {
        let mut bytes = Vec::with_capacity(MAX_FRAME_LEN);
        let mut crc = Crc16::new();

        bytes.push(self.markers.som);

        let pitch = orientation.pitch.to_le_bytes();
        let roll = orientation.roll.to_le_bytes();
        let header = [DECLARED_LEN, CMD_ORIENTATION, self.layout.to_wire()];

        let checksummed = header
            .iter()
            .chain(pitch.iter())
            .chain(roll.iter())
            .chain([0u8; RESERVED_LEN].iter());

        for &b in checksummed {
            crc.update(b);
            escape_into(b, &self.markers, &mut bytes);
        }

        let checksum = crc.value();
        for b in checksum.to_le_bytes() {
            escape_into(b, &self.markers, &mut bytes);
        }

        bytes.push(self.markers.eom);

        debug_assert!(bytes.len() <= MAX_FRAME_LEN);

        Frame { bytes, checksum }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn interior(frame: &Frame) -> &[u8] {
        let b = frame.as_bytes();
        &b[1..b.len() - 1]
    }

    // ── golden frames ─────────────────────────────────────────────────────────

    #[test]
    fn level_frame_matches_golden_bytes() {
        let frame = FrameEncoder::new().encode(Orientation::new(0.0, 0.0));
        assert_eq!(
            frame.as_bytes(),
            &[
                0xFE, 0x21, 0x0C, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
                0x00, 0x00, 0x00, 0xDE, 0xD9, 0xFF,
            ]
        );
        assert_eq!(frame.checksum(), 0xD9DE);
    }

    #[test]
    fn tilted_frame_matches_golden_bytes() {
        let frame = FrameEncoder::new().encode(Orientation::new(10.0, -5.0));
        assert_eq!(
            frame.as_bytes(),
            &[
                0xFE, 0x21, 0x0C, 0x01, 0x00, 0x00, 0x20, 0x41, 0x00, 0x00, 0xA0, 0xC0, 0x00,
                0x00, 0x00, 0x00, 0xB9, 0x86, 0xFF,
            ]
        );
    }

    #[test]
    fn envelope_corners_match_golden_checksums() {
        let enc = FrameEncoder::new();
        assert_eq!(enc.encode(Orientation::new(21.0, -18.0)).checksum(), 0xAD1B);
        assert_eq!(enc.encode(Orientation::new(-15.0, 18.0)).checksum(), 0x788A);
    }

    #[test]
    fn payload_bytes_in_control_range_are_escaped() {
        // 0x41A7FFFF / 0xC18FFFFE put 0xFF and 0xFE bytes into the payload.
        let pitch = f32::from_bits(0x41A7_FFFF);
        let roll = f32::from_bits(0xC18F_FFFE);
        let frame = FrameEncoder::new().encode(Orientation::new(pitch, roll));
        assert_eq!(
            frame.as_bytes(),
            &[
                0xFE, 0x21, 0x0C, 0x01, 0xFD, 0x02, 0xFD, 0x02, 0xA7, 0x41, 0xFD, 0x01, 0xFD,
                0x02, 0x8F, 0xC1, 0x00, 0x00, 0x00, 0x00, 0x39, 0xD6, 0xFF,
            ]
        );
        assert_eq!(frame.checksum(), 0xD639);
    }

    #[test]
    fn checksum_bytes_in_control_range_are_escaped() {
        // pitch 0.038 yields checksum 0xAAFD, whose low byte equals ESC.
        let frame = FrameEncoder::new().encode(Orientation::new(f32::from_bits(0x3D1B_A5E3), 0.0));
        assert_eq!(frame.checksum(), 0xAAFD);
        let b = frame.as_bytes();
        assert_eq!(&b[b.len() - 4..], &[0xFD, 0x00, 0xAA, 0xFF]);
    }

    // ── structural invariants ─────────────────────────────────────────────────

    fn sweep() -> impl Iterator<Item = Orientation> {
        let specials = [
            f32::from_bits(0x41A7_FFFF),
            f32::from_bits(0xC18F_FFFE),
            f32::from_bits(0xFFFF_FFFF),
            f32::MAX,
            f32::MIN,
            -0.0,
        ];
        (-40..=40)
            .map(|i| i as f32 * 0.53)
            .chain(specials)
            .flat_map(|p| (-40..=40).map(move |r| Orientation::new(p, r as f32 * 0.47)))
    }

    #[test]
    fn frames_start_and_end_with_markers() {
        let enc = FrameEncoder::new();
        for o in sweep() {
            let frame = enc.encode(o);
            let b = frame.as_bytes();
            assert_eq!(b[0], DEFAULT_SOM);
            assert_eq!(b[b.len() - 1], DEFAULT_EOM);
        }
    }

    #[test]
    fn interior_never_contains_raw_control_bytes() {
        let enc = FrameEncoder::new();
        for o in sweep() {
            let frame = enc.encode(o);
            let mut iter = interior(&frame).iter();
            while let Some(&b) = iter.next() {
                assert_ne!(b, DEFAULT_SOM, "raw SOM in {o:?}");
                assert_ne!(b, DEFAULT_EOM, "raw EOM in {o:?}");
                if b == DEFAULT_ESC {
                    let residue = *iter.next().expect("escape must be followed by a residue");
                    assert!(residue < DEFAULT_ESC);
                }
            }
        }
    }

    #[test]
    fn frames_never_exceed_worst_case_length() {
        let enc = FrameEncoder::new();
        for o in sweep() {
            assert!(enc.encode(o).len() <= MAX_FRAME_LEN);
        }
        assert_eq!(MAX_FRAME_LEN, 36);
    }

    #[test]
    fn encoding_is_deterministic() {
        let enc = FrameEncoder::new();
        let o = Orientation::new(3.25, -7.5);
        assert_eq!(enc.encode(o), enc.encode(o));
    }

    #[test]
    fn checksum_covers_logical_values_not_wire_bytes() {
        let pitch = f32::from_bits(0x41A7_FFFF);
        let roll = f32::from_bits(0xC18F_FFFE);
        let frame = FrameEncoder::new().encode(Orientation::new(pitch, roll));

        let logical = unescape(interior(&frame), &Markers::DEFAULT).unwrap();
        assert_eq!(logical.len(), LOGICAL_INTERIOR_LEN);

        let expected = crc::crc16(&logical[..CHECKSUMMED_LEN]);
        assert_eq!(frame.checksum(), expected);

        // Running the checksum over the escaped wire bytes gives a different value.
        let wire = interior(&frame);
        let escaped_crc = crc::crc16(&wire[..wire.len() - 2]);
        assert_ne!(escaped_crc, expected);
    }

    #[test]
    fn custom_markers_are_honoured() {
        let markers = Markers::new(0xFA, 0xFB, 0xF0).unwrap();
        let enc = FrameEncoder::with_markers(markers);
        let frame = enc.encode(Orientation::new(f32::from_bits(0x41A7_FFFF), 0.0));
        let b = frame.as_bytes();
        assert_eq!(b[0], 0xFA);
        assert_eq!(b[b.len() - 1], 0xFB);
        // 0xFF → (0xF0, 0x0F)
        assert_eq!(&b[4..8], &[0xF0, 0x0F, 0xF0, 0x0F]);
    }

    // ── escaping ──────────────────────────────────────────────────────────────

    #[test]
    fn escape_then_unescape_restores_every_byte_value() {
        let all: Vec<u8> = (0..=u8::MAX).collect();
        let m = Markers::DEFAULT;
        let escaped = escape(&all, &m);
        assert_eq!(escaped.len(), all.len() + 3); // 0xFD, 0xFE, 0xFF expand
        assert_eq!(unescape(&escaped, &m).unwrap(), all);
    }

    #[test]
    fn escape_with_low_escape_marker_restores_every_byte_value() {
        let all: Vec<u8> = (0..=u8::MAX).rev().collect();
        let m = Markers::new(0x81, 0x80 + 0x7F, 0x80).unwrap();
        assert_eq!(unescape(&escape(&all, &m), &m).unwrap(), all);
    }

    #[test]
    fn unescape_rejects_dangling_escape() {
        let err = unescape(&[0x01, 0xFD], &Markers::DEFAULT).unwrap_err();
        assert_eq!(err, DecodeError::DanglingEscape { offset: 1 });
    }

    #[test]
    fn unescape_rejects_out_of_range_residue() {
        let err = unescape(&[0xFD, 0x03], &Markers::DEFAULT).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidEscape {
                offset: 1,
                residue: 0x03
            }
        );
    }

    #[test]
    fn unescape_rejects_raw_control_byte() {
        let err = unescape(&[0x00, 0xFE], &Markers::DEFAULT).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnescapedControlByte {
                offset: 1,
                byte: 0xFE
            }
        );
    }

    // ── Markers ───────────────────────────────────────────────────────────────

    #[test]
    fn default_markers_are_valid() {
        let m = Markers::DEFAULT;
        assert_eq!(Markers::new(m.som(), m.eom(), m.esc()), Ok(m));
        assert_eq!(m.max_residue(), 2);
    }

    #[test]
    fn markers_reject_low_escape() {
        assert_eq!(
            Markers::new(0xFE, 0xFF, 0x7F),
            Err(MarkerError::EscapeTooLow { esc: 0x7F })
        );
    }

    #[test]
    fn markers_reject_start_below_escape() {
        assert!(matches!(
            Markers::new(0xFA, 0xFF, 0xFD),
            Err(MarkerError::BelowEscape { role: "start", .. })
        ));
    }

    #[test]
    fn markers_reject_end_below_escape() {
        assert!(matches!(
            Markers::new(0xFE, 0xFA, 0xFD),
            Err(MarkerError::BelowEscape { role: "end", .. })
        ));
    }

    #[test]
    fn markers_reject_duplicates() {
        assert!(matches!(
            Markers::new(0xFE, 0xFE, 0xFD),
            Err(MarkerError::NotDistinct { .. })
        ));
    }

    // ── BlockLayout ───────────────────────────────────────────────────────────

    #[test]
    fn block_layout_wire_value() {
        assert_eq!(BlockLayout::OneBlock.to_wire(), 0x01);
        assert_eq!(BlockLayout::from_wire(0x01), Some(BlockLayout::OneBlock));
        assert_eq!(BlockLayout::from_wire(0x02), None);
    }
}
