//! Program constants.

/// Seed for the single global raffle PDA.
pub const RAFFLE_SEED: &[u8] = b"raffle";

/// Maximum number of entry slots per round. The entry ledger lives inside
/// the raffle account, so it needs a fixed capacity to keep a fixed layout.
pub const MAX_PLAYERS: usize = 100;

/// Confirmation depth requested from the randomness oracle. Passed through
/// to the oracle in the request log; opaque to this program.
pub const REQUEST_CONFIRMATIONS: u8 = 3;

/// Random words requested per randomness request. One word is enough to
/// select a single winner.
pub const NUM_WORDS: u32 = 1;
