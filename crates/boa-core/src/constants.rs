//! Protocol constants. All monetary values in the smallest unit
//! (1 BOA = 10^7 units).

/// Number of fractional decimal digits of one BOA.
pub const BOA_DECIMALS: u32 = 7;

/// Units per BOA.
pub const UNITS_PER_BOA: u64 = 10_000_000;

/// Minimum fee rate in units per byte. Fee sources never quote below this.
pub const FEE_RATE: u64 = 700;

/// Width of a UTXO hash in bytes.
pub const HASH_WIDTH: usize = 64;

/// Width of an Ed25519 signature in bytes.
pub const SIGNATURE_WIDTH: usize = 64;

/// Width of an address (raw public key) in bytes.
pub const ADDRESS_WIDTH: usize = 32;

/// Serialized size of one input: utxo hash + signature + 4-byte unlock age.
pub const TX_INPUT_SIZE: usize = HASH_WIDTH + SIGNATURE_WIDTH + 4;

/// Serialized size of one output: type byte + 8-byte value + address + lock type byte.
pub const TX_OUTPUT_SIZE: usize = 1 + 8 + ADDRESS_WIDTH + 1;

/// Fixed transaction overhead: type byte + 8-byte lock height + input/output count bytes.
pub const TX_BASE_SIZE: usize = 1 + 8 + 2;

/// Largest data payload accepted on a transaction, in bytes.
pub const MAX_PAYLOAD_SIZE: usize = 1024;

/// Payload fee per payload byte.
pub const PAYLOAD_FEE_FACTOR: u64 = 200;

/// Lower bound of the payload fee for any non-empty payload.
pub const PAYLOAD_MIN_FEE: u64 = 500_000;

/// Change below this many units is not worth an output and is left to the fee.
pub const DEFAULT_DUST_THRESHOLD: u64 = 1;

/// Raw key of the commons budget, the protocol-reserved receiver of payload fees.
pub const COMMONS_BUDGET_KEY: [u8; ADDRESS_WIDTH] = [
    0xc4, 0xe6, 0x31, 0xda, 0xfe, 0x9a, 0x5b, 0x1e, 0xbd, 0x9c, 0x00, 0x88, 0x14, 0x83, 0x5c,
    0x32, 0xb0, 0xb2, 0xb5, 0x72, 0x66, 0x71, 0x6c, 0xbd, 0xf7, 0xf3, 0x7e, 0x66, 0x51, 0x84,
    0x21, 0x63,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_per_boa_matches_decimals() {
        assert_eq!(UNITS_PER_BOA, 10u64.pow(BOA_DECIMALS));
    }

    #[test]
    fn record_sizes() {
        assert_eq!(TX_INPUT_SIZE, 132);
        assert_eq!(TX_OUTPUT_SIZE, 42);
        assert_eq!(TX_BASE_SIZE, 11);
    }
}
