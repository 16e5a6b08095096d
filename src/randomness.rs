//! Winner selection from an oracle-delivered random value.

use arrayref::array_ref;

/// Map a 32-byte random value onto an entry slot index.
///
/// Uses the first 8 bytes as a little-endian u64 and reduces modulo the
/// entry count. Modulo selection is only as uniform as the oracle's entropy
/// relative to `total_entries`; the bias is negligible for realistic ledger
/// sizes and accepted here.
pub fn winner_index(randomness: &[u8; 32], total_entries: u64) -> u64 {
    if total_entries == 0 {
        return 0;
    }
    let random_value = u64::from_le_bytes(*array_ref![randomness, 0, 8]);
    random_value % total_entries
}
