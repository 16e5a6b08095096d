use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use solana_program::{
    clock::UnixTimestamp,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};
use std::convert::TryFrom;

use crate::constants::MAX_PLAYERS;
use crate::error::RaffleError;

const PUBKEY_BYTES: usize = 32;
const PLAYERS_BYTES: usize = PUBKEY_BYTES * MAX_PLAYERS;

/// Phase of the current round
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RafflePhase {
    /// Round is open for entries
    Open,
    /// Randomness request outstanding, waiting for the oracle
    Calculating,
}

impl TryFrom<u8> for RafflePhase {
    type Error = &'static str;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(RafflePhase::Open),
            1 => Ok(RafflePhase::Calculating),
            _ => Err("Invalid raffle phase"),
        }
    }
}

impl From<RafflePhase> for u8 {
    fn from(phase: RafflePhase) -> Self {
        match phase {
            RafflePhase::Open => 0,
            RafflePhase::Calculating => 1,
        }
    }
}

/// The single global raffle account.
///
/// Holds the round state machine, the entry ledger and the prize pool
/// bookkeeping. The same account is reused across rounds: settlement clears
/// the ledger and reopens the round, it never tears the account down.
#[derive(Debug, Clone)]
pub struct Raffle {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Creator of the raffle
    pub authority: Pubkey,
    /// Off-chain oracle key that must sign randomness fulfillments
    pub oracle_authority: Pubkey,
    /// Entrance fee per entry in lamports
    pub entrance_fee: u64,
    /// Seconds that must elapse since the round start before upkeep is due
    pub interval: i64,
    /// Phase of the current round
    pub phase: RafflePhase,
    /// Start time of the current round (Unix timestamp)
    pub last_timestamp: UnixTimestamp,
    /// Most recently selected winner (zero until the first settlement)
    pub current_winner: Pubkey,
    /// Monotonically increasing counter used to derive request ids
    pub request_counter: u64,
    /// Id of the outstanding randomness request, 0 while the round is open
    pub pending_request_id: u64,
    /// Lamports accumulated from entries since the last payout
    pub prize_pool: u64,
    /// Number of occupied entry slots
    pub player_count: u32,
    /// Entry ledger in insertion order; one slot per entry, duplicates allowed
    pub players: [Pubkey; MAX_PLAYERS],
}

impl Raffle {
    /// Eligibility predicate polled by the automation scheduler.
    ///
    /// True iff the round is open, the configured interval has elapsed since
    /// the round started, and there is at least one player and a non-zero
    /// pool. Pure read, safe to call arbitrarily often.
    pub fn upkeep_needed(&self, now: UnixTimestamp) -> bool {
        self.phase == RafflePhase::Open
            && now - self.last_timestamp > self.interval
            && self.player_count > 0
            && self.prize_pool > 0
    }

    /// Player occupying the given entry slot
    pub fn player_at(&self, index: u64) -> Result<Pubkey, RaffleError> {
        if index >= self.player_count as u64 {
            return Err(RaffleError::IndexOutOfRange);
        }
        Ok(self.players[index as usize])
    }

    /// Append a player to the next free entry slot
    pub fn push_player(&mut self, player: Pubkey) -> Result<(), RaffleError> {
        let slot = self.player_count as usize;
        if slot >= MAX_PLAYERS {
            return Err(RaffleError::RaffleFull);
        }
        self.players[slot] = player;
        self.player_count += 1;
        Ok(())
    }

    /// Empty the entry ledger for the next round
    pub fn clear_players(&mut self) {
        self.players = [Pubkey::default(); MAX_PLAYERS];
        self.player_count = 0;
    }
}

impl Sealed for Raffle {}

impl IsInitialized for Raffle {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for Raffle {
    const LEN: usize = 1 + 32 + 32 + 8 + 8 + 1 + 8 + 32 + 8 + 8 + 8 + 4 + PLAYERS_BYTES;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, solana_program::program_error::ProgramError> {
        let src = array_ref![src, 0, Raffle::LEN];
        let (
            is_initialized,
            authority,
            oracle_authority,
            entrance_fee,
            interval,
            phase,
            last_timestamp,
            current_winner,
            request_counter,
            pending_request_id,
            prize_pool,
            player_count,
            players,
        ) = array_refs![src, 1, 32, 32, 8, 8, 1, 8, 32, 8, 8, 8, 4, PLAYERS_BYTES];

        let phase = match RafflePhase::try_from(phase[0]) {
            Ok(phase) => phase,
            Err(_) => return Err(solana_program::program_error::ProgramError::InvalidAccountData),
        };

        let mut player_slots = [Pubkey::default(); MAX_PLAYERS];
        for (slot, chunk) in player_slots.iter_mut().zip(players.chunks_exact(PUBKEY_BYTES)) {
            *slot = Pubkey::try_from(chunk)
                .map_err(|_| solana_program::program_error::ProgramError::InvalidAccountData)?;
        }

        Ok(Raffle {
            is_initialized: is_initialized[0] != 0,
            authority: Pubkey::new_from_array(*authority),
            oracle_authority: Pubkey::new_from_array(*oracle_authority),
            entrance_fee: u64::from_le_bytes(*entrance_fee),
            interval: i64::from_le_bytes(*interval),
            phase,
            last_timestamp: UnixTimestamp::from_le_bytes(*last_timestamp),
            current_winner: Pubkey::new_from_array(*current_winner),
            request_counter: u64::from_le_bytes(*request_counter),
            pending_request_id: u64::from_le_bytes(*pending_request_id),
            prize_pool: u64::from_le_bytes(*prize_pool),
            player_count: u32::from_le_bytes(*player_count),
            players: player_slots,
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Raffle::LEN];
        let (
            is_initialized_dst,
            authority_dst,
            oracle_authority_dst,
            entrance_fee_dst,
            interval_dst,
            phase_dst,
            last_timestamp_dst,
            current_winner_dst,
            request_counter_dst,
            pending_request_id_dst,
            prize_pool_dst,
            player_count_dst,
            players_dst,
        ) = mut_array_refs![dst, 1, 32, 32, 8, 8, 1, 8, 32, 8, 8, 8, 4, PLAYERS_BYTES];

        is_initialized_dst[0] = self.is_initialized as u8;
        authority_dst.copy_from_slice(self.authority.as_ref());
        oracle_authority_dst.copy_from_slice(self.oracle_authority.as_ref());
        *entrance_fee_dst = self.entrance_fee.to_le_bytes();
        *interval_dst = self.interval.to_le_bytes();
        phase_dst[0] = self.phase.into();
        *last_timestamp_dst = self.last_timestamp.to_le_bytes();
        current_winner_dst.copy_from_slice(self.current_winner.as_ref());
        *request_counter_dst = self.request_counter.to_le_bytes();
        *pending_request_id_dst = self.pending_request_id.to_le_bytes();
        *prize_pool_dst = self.prize_pool.to_le_bytes();
        *player_count_dst = self.player_count.to_le_bytes();
        for (slot, chunk) in self
            .players
            .iter()
            .zip(players_dst.chunks_exact_mut(PUBKEY_BYTES))
        {
            chunk.copy_from_slice(slot.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_raffle() -> Raffle {
        Raffle {
            is_initialized: true,
            authority: Pubkey::new_unique(),
            oracle_authority: Pubkey::new_unique(),
            entrance_fee: 1_000_000,
            interval: 60,
            phase: RafflePhase::Open,
            last_timestamp: 1_000,
            current_winner: Pubkey::default(),
            request_counter: 0,
            pending_request_id: 0,
            prize_pool: 0,
            player_count: 0,
            players: [Pubkey::default(); MAX_PLAYERS],
        }
    }

    #[test]
    fn pack_round_trip() {
        let mut raffle = open_raffle();
        raffle.push_player(Pubkey::new_unique()).unwrap();
        raffle.push_player(Pubkey::new_unique()).unwrap();
        raffle.prize_pool = 2_000_000;
        raffle.phase = RafflePhase::Calculating;
        raffle.request_counter = 7;
        raffle.pending_request_id = 7;

        let mut buf = vec![0u8; Raffle::LEN];
        raffle.pack_into_slice(&mut buf);
        let decoded = Raffle::unpack_from_slice(&buf).unwrap();

        assert!(decoded.is_initialized);
        assert_eq!(decoded.authority, raffle.authority);
        assert_eq!(decoded.oracle_authority, raffle.oracle_authority);
        assert_eq!(decoded.entrance_fee, raffle.entrance_fee);
        assert_eq!(decoded.interval, raffle.interval);
        assert_eq!(decoded.phase, RafflePhase::Calculating);
        assert_eq!(decoded.last_timestamp, raffle.last_timestamp);
        assert_eq!(decoded.request_counter, 7);
        assert_eq!(decoded.pending_request_id, 7);
        assert_eq!(decoded.prize_pool, 2_000_000);
        assert_eq!(decoded.player_count, 2);
        assert_eq!(decoded.players[0], raffle.players[0]);
        assert_eq!(decoded.players[1], raffle.players[1]);
    }

    #[test]
    fn invalid_phase_byte_rejected() {
        let raffle = open_raffle();
        let mut buf = vec![0u8; Raffle::LEN];
        raffle.pack_into_slice(&mut buf);
        // phase byte sits right after the two pubkeys and two u64 params
        buf[1 + 32 + 32 + 8 + 8] = 9;
        assert!(Raffle::unpack_from_slice(&buf).is_err());
    }

    #[test]
    fn upkeep_requires_all_four_conditions() {
        let mut raffle = open_raffle();
        raffle.push_player(Pubkey::new_unique()).unwrap();
        raffle.prize_pool = raffle.entrance_fee;

        // all conditions hold
        assert!(raffle.upkeep_needed(raffle.last_timestamp + raffle.interval + 1));

        // elapsed time not strictly greater than the interval
        assert!(!raffle.upkeep_needed(raffle.last_timestamp + raffle.interval));

        // wrong phase
        raffle.phase = RafflePhase::Calculating;
        assert!(!raffle.upkeep_needed(raffle.last_timestamp + raffle.interval + 1));
        raffle.phase = RafflePhase::Open;

        // empty pool
        raffle.prize_pool = 0;
        assert!(!raffle.upkeep_needed(raffle.last_timestamp + raffle.interval + 1));
        raffle.prize_pool = raffle.entrance_fee;

        // no players
        raffle.clear_players();
        assert!(!raffle.upkeep_needed(raffle.last_timestamp + raffle.interval + 1));
    }

    #[test]
    fn player_at_bounds() {
        let mut raffle = open_raffle();
        let player = Pubkey::new_unique();
        raffle.push_player(player).unwrap();

        assert_eq!(raffle.player_at(0).unwrap(), player);
        assert_eq!(raffle.player_at(1), Err(RaffleError::IndexOutOfRange));
    }

    #[test]
    fn ledger_capacity_enforced() {
        let mut raffle = open_raffle();
        for _ in 0..MAX_PLAYERS {
            raffle.push_player(Pubkey::new_unique()).unwrap();
        }
        assert_eq!(
            raffle.push_player(Pubkey::new_unique()),
            Err(RaffleError::RaffleFull)
        );
        assert_eq!(raffle.player_count as usize, MAX_PLAYERS);

        raffle.clear_players();
        assert_eq!(raffle.player_count, 0);
        assert_eq!(raffle.player_at(0), Err(RaffleError::IndexOutOfRange));
    }
}
