//! CRC-16 used to protect space packets.
//!
//! The checksum is the CCITT variant with an initial register of `0xFFFF`, polynomial
//! `0x1021`, no reflection and no final xor, catalogued as CRC-16/IBM-3740.
use crc::{Crc, CRC_16_IBM_3740};

/// Number of bytes the checksum occupies at the end of a packet.
pub const LEN: usize = 2;

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Compute the checksum of `dat`.
#[must_use]
pub fn compute(dat: &[u8]) -> u16 {
    CRC16.checksum(dat)
}

/// Returns true if the last [LEN] bytes of `dat` are the big-endian checksum of the
/// bytes that precede them. Buffers too short to hold a checksum never verify.
#[must_use]
pub fn verify(dat: &[u8]) -> bool {
    if dat.len() < LEN {
        return false;
    }
    let (body, trailer) = dat.split_at(dat.len() - LEN);
    compute(body) == u16::from_be_bytes([trailer[0], trailer[1]])
}
