/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured errors for the protocol layer.
//!
//! Encoding cannot fail: a frame is a pure function of two floats and the
//! output buffer is sized to the worst case.  Every variant here therefore
//! describes something wrong with bytes that came **in**, or with a marker
//! set supplied by configuration.

use thiserror::Error;

/// Why a marker set was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkerError {
    /// The escape residue `value - esc` would itself reach `esc`, so escaped
    /// bytes could not be told apart from control bytes.
    #[error("escape marker {esc:#04x} must be at least 0x80")]
    EscapeTooLow { esc: u8 },

    /// A start or end marker below the escape value would never be escaped and
    /// could show up raw inside the payload.
    #[error("{role} marker {value:#04x} is below the escape marker {esc:#04x}")]
    BelowEscape {
        role: &'static str,
        value: u8,
        esc: u8,
    },

    /// Two roles share the same byte value.
    #[error("markers must be distinct (som={som:#04x}, eom={eom:#04x}, esc={esc:#04x})")]
    NotDistinct { som: u8, eom: u8, esc: u8 },
}

/// Top-level error returned by the frame decoder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("frame is empty")]
    Empty,

    #[error("frame does not begin with the start marker (found {found:#04x})")]
    MissingStartMarker { found: u8 },

    #[error("frame does not end with the end marker (found {found:#04x})")]
    MissingEndMarker { found: u8 },

    /// The last interior byte was an escape with nothing after it.
    #[error("escape marker at offset {offset} has no following byte")]
    DanglingEscape { offset: usize },

    /// The byte after an escape is outside `0..=0xFF - esc`.
    #[error("invalid escape residue {residue:#04x} at offset {offset}")]
    InvalidEscape { offset: usize, residue: u8 },

    /// A control-range byte appeared without a preceding escape.
    #[error("unescaped control byte {byte:#04x} at offset {offset}")]
    UnescapedControlByte { offset: usize, byte: u8 },

    /// After unescaping, the interior is not the fixed logical size.
    #[error("logical interior is {actual} bytes, expected {expected}")]
    UnexpectedLength { expected: usize, actual: usize },

    #[error("unsupported command code {0:#04x}")]
    UnsupportedCommand(u8),

    #[error("checksum mismatch: frame carries {received:#06x}, computed {computed:#06x}")]
    ChecksumMismatch { received: u16, computed: u16 },

    /// A streaming decoder saw a new start marker before the end of the
    /// current frame; the partial frame was discarded.
    #[error("frame truncated after {discarded} bytes by a new start marker")]
    Truncated { discarded: usize },

    /// A streaming decoder reached the worst-case frame length without an
    /// end marker; the partial frame was discarded.
    #[error("no end marker within {discarded} bytes, frame discarded")]
    Oversized { discarded: usize },
}
