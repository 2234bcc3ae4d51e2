//! CRC-16/CCITT-FALSE.
//!
//! Initial value 0xFFFF, polynomial 0x1021, no reflection, no final XOR.

/// Generator polynomial.
pub const POLYNOMIAL: u16 = 0x1021;

/// Register preset.
pub const INITIAL: u16 = 0xFFFF;

const TABLE: [u16; 256] = build_table();

const fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ POLYNOMIAL
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Compute the checksum of a byte block.
pub fn checksum(data: &[u8]) -> u16 {
    data.iter().fold(INITIAL, |crc, &byte| {
        (crc << 8) ^ TABLE[usize::from((crc >> 8) as u8 ^ byte)]
    })
}

/// Check a block against the little-endian checksum bytes that follow it on the wire.
pub fn verify(data: &[u8], checksum_le: [u8; 2]) -> bool {
    checksum(data) == u16::from_le_bytes(checksum_le)
}
