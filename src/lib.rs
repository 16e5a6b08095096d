//! Solotto — a recurring raffle with oracle-fulfilled randomness.
//!
//! Players enter an open round by paying a fixed entrance fee. Once the
//! configured interval has elapsed with at least one entry, a permissionless
//! upkeep crank issues a randomness request; the oracle's fulfillment picks
//! the winner, pays out the whole pool and opens the next round.

pub mod constants;
pub mod error;
pub mod instruction;
pub mod processor;
pub mod randomness;
pub mod state;

#[cfg(not(feature = "no-entrypoint"))]
pub mod entrypoint;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process(program_id, accounts, instruction_data)
}
