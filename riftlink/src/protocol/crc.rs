/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Frame checksum: a byte-wise CRC-16 with a device-specific seed.
//!
//! The update step is the nibble-folding form used by the platform firmware:
//!
//! ```text
//! n   = ((crc >> 8) ^ byte) & 0xFF
//! t   = n ^ (n >> 4)
//! crc = ((crc ^ (t << 4) ^ (t >> 3)) << 8) ^ ((t ^ (t << 5)) & 0xFF)
//! ```
//!
//! Algebraically this is CRC-16 over polynomial `0x1021` (MSB first, no final
//! XOR), seeded with [`CRC_INIT`] instead of `0x0000`.  The tests pin that
//! equivalence against a bitwise polynomial division so the folded form can
//! never drift.
//!
//! The checksum always runs over **logical** bytes.  Escape sequences on the
//! wire must be collapsed back to their original value before they are fed in.

/// Seed value of the running checksum (`58005` decimal).
///
/// Device documentation sometimes quotes this as `0xE2D5`; the firmware seeds
/// with decimal `58005`, which is `0xE295`.
pub const CRC_INIT: u16 = 0xE295;

/// Fold one logical byte into the running checksum.
pub fn crc16_update(crc: u16, byte: u8) -> u16 {
    let n = (crc >> 8) ^ u16::from(byte);
    let n = n & 0xFF;
    let t = n ^ (n >> 4);
    ((crc ^ (t << 4) ^ (t >> 3)) << 8) ^ ((t ^ (t << 5)) & 0xFF)
}

/// Checksum of a complete logical byte slice, starting from [`CRC_INIT`].
pub fn crc16(bytes: &[u8]) -> u16 {
    bytes.iter().fold(CRC_INIT, |crc, &b| crc16_update(crc, b))
}

/// Incremental form of [`crc16`], for callers that produce bytes one at a
/// time (the encoder feeds each byte here as it escapes it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc16 {
    value: u16,
}

impl Crc16 {
    pub fn new() -> Self {
        Self { value: CRC_INIT }
    }

    pub fn update(&mut self, byte: u8) {
        self.value = crc16_update(self.value, byte);
    }

    pub fn value(&self) -> u16 {
        self.value
    }
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
