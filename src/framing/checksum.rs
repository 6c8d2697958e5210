//! Bit-serial polynomial division.
//!
//! One generic routine serves every checksum the link speaks. The
//! instantiations below are protocol constants fixed by the wire format
//! bit-for-bit; they are not the textbook CRC-7/CRC-8
//! parameter sets and must not be "corrected".

/// Parameters of one checksum instantiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CrcParams {
    /// Generator polynomial, including its leading term.
    pub generator: u32,
    /// Bit index that triggers an XOR with the generator when set.
    pub check_bit: u32,
    /// Zero bits appended after the input to flush the remainder.
    pub flush_bits: u32,
}

impl CrcParams {
    /// CRC-7 used by the unacknowledged variant.
    pub const CRC7: Self = Self {
        generator: 0b0000_1001,
        check_bit: 3,
        flush_bits: 6,
    };

    /// CRC-8 used by the stop-and-wait variant.
    pub const CRC8: Self = Self {
        generator: 0b0000_0001_1101_0101,
        check_bit: 8,
        flush_bits: 8,
    };

    /// Division by `x + 1`: the even-parity bit of the input.
    pub const PARITY: Self = Self {
        generator: 0b11,
        check_bit: 1,
        flush_bits: 1,
    };

    /// Compute the checksum of `data` with these parameters.
    pub fn checksum(&self, data: &[u8]) -> u8 {
        checksum(data, *self)
    }

    fn step(&self, dividend: u64, bit: u64) -> u64 {
        let dividend = (dividend << 1) | bit;
        // A check bit past the dividend width never triggers.
        if dividend.checked_shr(self.check_bit).is_some_and(|d| d & 1 == 1) {
            dividend ^ u64::from(self.generator)
        } else {
            dividend
        }
    }
}

/// Compute the remainder of `data` under `params`, truncated to one byte.
///
/// Input bits are consumed most-significant first. Pure and deterministic;
/// the empty input yields 0.
pub fn checksum(data: &[u8], params: CrcParams) -> u8 {
    let mut dividend = 0u64;

    for &byte in data {
        for shift in (0..8).rev() {
            dividend = params.step(dividend, u64::from((byte >> shift) & 1));
        }
    }
    for _ in 0..params.flush_bits {
        dividend = params.step(dividend, 0);
    }

    dividend as u8
}

/// CRC-8 of `data`, the checksum carried by every ARQ frame.
pub fn crc8(data: &[u8]) -> u8 {
    checksum(data, CrcParams::CRC8)
}
