use crate::constants::{MAX_PLAYERS, NUM_WORDS, RAFFLE_SEED, REQUEST_CONFIRMATIONS};
use crate::error::RaffleError;
use crate::instruction::RaffleInstruction;
use crate::randomness::winner_index;
use crate::state::{Raffle, RafflePhase};

use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::InitializeRaffle {
                entrance_fee,
                interval,
            } => {
                msg!("Instruction: Initialize Raffle");
                Self::process_initialize_raffle(accounts, entrance_fee, interval, program_id)
            }
            RaffleInstruction::EnterRaffle { amount } => {
                msg!("Instruction: Enter Raffle");
                Self::process_enter_raffle(accounts, amount, program_id)
            }
            RaffleInstruction::PerformUpkeep {} => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, program_id)
            }
            RaffleInstruction::FulfillRandomness {
                request_id,
                randomness,
            } => {
                msg!("Instruction: Fulfill Randomness");
                Self::process_fulfill_randomness(accounts, request_id, randomness, program_id)
            }
        }
    }

    /// Process the InitializeRaffle instruction
    ///
    /// Creates the single global raffle account and opens the first round.
    /// Called once after deployment.
    fn process_initialize_raffle(
        accounts: &[AccountInfo],
        entrance_fee: u64,
        interval: i64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let oracle_authority_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        // Verify the authority signed the transaction
        if !authority_info.is_signer {
            msg!("Authority must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        // Find the PDA for the raffle account
        let (expected_raffle_pubkey, bump_seed) =
            Pubkey::find_program_address(&[RAFFLE_SEED], program_id);

        // Verify that the provided raffle account is the expected PDA
        if *raffle_info.key != expected_raffle_pubkey {
            msg!("Invalid raffle account address");
            return Err(ProgramError::InvalidArgument);
        }

        // A zero fee or a non-positive interval makes upkeep degenerate
        if entrance_fee == 0 || interval <= 0 {
            msg!(
                "Invalid parameters: entrance_fee={} interval={}",
                entrance_fee,
                interval
            );
            return Err(RaffleError::InvalidFeeOrInterval.into());
        }

        // Create the raffle account if it does not exist yet
        if raffle_info.owner != program_id {
            msg!("Creating raffle account");
            let rent = Rent::get()?;
            let rent_lamports = rent.minimum_balance(Raffle::LEN);

            invoke_signed(
                &system_instruction::create_account(
                    authority_info.key,
                    raffle_info.key,
                    rent_lamports,
                    Raffle::LEN as u64,
                    program_id,
                ),
                &[
                    authority_info.clone(),
                    raffle_info.clone(),
                    system_program_info.clone(),
                ],
                &[&[RAFFLE_SEED, &[bump_seed]]],
            )?;
        }

        // Check the raffle is not already initialized
        let existing = Raffle::unpack_unchecked(&raffle_info.data.borrow())?;
        if existing.is_initialized {
            msg!("Raffle account is already initialized");
            return Err(RaffleError::AlreadyInitialized.into());
        }

        let clock = Clock::get()?;

        // Open the first round
        let raffle_data = Raffle {
            is_initialized: true,
            authority: *authority_info.key,
            oracle_authority: *oracle_authority_info.key,
            entrance_fee,
            interval,
            phase: RafflePhase::Open,
            last_timestamp: clock.unix_timestamp,
            current_winner: Pubkey::default(),
            request_counter: 0,
            pending_request_id: 0,
            prize_pool: 0,
            player_count: 0,
            players: [Pubkey::default(); MAX_PLAYERS],
        };
        Raffle::pack(raffle_data, &mut raffle_info.data.borrow_mut())?;

        msg!(
            "Raffle initialized: fee={} interval={}s oracle={}",
            entrance_fee,
            interval,
            oracle_authority_info.key
        );
        Ok(())
    }

    /// Process the EnterRaffle instruction
    ///
    /// All preconditions are checked before any mutation, so a rejected
    /// entry leaves the ledger and pool untouched.
    fn process_enter_raffle(
        accounts: &[AccountInfo],
        amount: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        // Ensure the player signed the transaction
        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        // Check that the raffle account is owned by our program
        if raffle_info.owner != program_id {
            msg!("Raffle account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut raffle_data = Raffle::unpack(&raffle_info.data.borrow())?;

        // Entries are only accepted while the round is open
        if raffle_data.phase != RafflePhase::Open {
            msg!("Round is calculating, entries are closed");
            return Err(RaffleError::RoundNotOpen.into());
        }

        // The fee paid must cover the entrance fee
        if amount < raffle_data.entrance_fee {
            msg!(
                "Insufficient fee: paid {} lamports, entrance fee is {} lamports",
                amount,
                raffle_data.entrance_fee
            );
            return Err(RaffleError::InsufficientFee.into());
        }

        // Reject before transferring if no slot is free
        if raffle_data.player_count as usize >= MAX_PLAYERS {
            msg!("Entry ledger is full ({} slots)", MAX_PLAYERS);
            return Err(RaffleError::RaffleFull.into());
        }

        let new_pool = raffle_data
            .prize_pool
            .checked_add(amount)
            .ok_or(RaffleError::ArithmeticOverflow)?;

        // Move the fee into the prize pool held by the raffle account
        invoke(
            &system_instruction::transfer(player_info.key, raffle_info.key, amount),
            &[
                player_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        let slot = raffle_data.player_count;
        raffle_data.push_player(*player_info.key)?;
        raffle_data.prize_pool = new_pool;
        Raffle::pack(raffle_data, &mut raffle_info.data.borrow_mut())?;

        msg!(
            "EVENT: EntryRecorded player={} slot={} pool={}",
            player_info.key,
            slot,
            new_pool
        );
        Ok(())
    }

    /// Process the PerformUpkeep instruction
    ///
    /// Permissionless crank. Re-checks the eligibility predicate on-chain
    /// and, if it holds, commits the round to Calculating and issues a fresh
    /// randomness request. Two racing cranks resolve to one winner: the
    /// second one sees Calculating and fails the predicate.
    fn process_perform_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;

        // Anyone may crank, but they must sign
        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        // Check that the raffle account is owned by our program
        if raffle_info.owner != program_id {
            msg!("Raffle account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut raffle_data = Raffle::unpack(&raffle_info.data.borrow())?;

        let clock = Clock::get()?;
        let now = clock.unix_timestamp;

        if !raffle_data.upkeep_needed(now) {
            msg!(
                "Upkeep not needed: pool={} players={} phase={:?} elapsed={}s interval={}s",
                raffle_data.prize_pool,
                raffle_data.player_count,
                raffle_data.phase,
                now - raffle_data.last_timestamp,
                raffle_data.interval
            );
            return Err(RaffleError::UpkeepNotNeeded.into());
        }

        // Commit the round and issue the request; the id correlates the
        // oracle's future fulfillment with this round
        raffle_data.phase = RafflePhase::Calculating;
        raffle_data.request_counter = raffle_data
            .request_counter
            .checked_add(1)
            .ok_or(RaffleError::ArithmeticOverflow)?;
        raffle_data.pending_request_id = raffle_data.request_counter;
        Raffle::pack(raffle_data.clone(), &mut raffle_info.data.borrow_mut())?;

        msg!(
            "EVENT: RandomnessRequested request_id={} entries={} confirmations={} num_words={}",
            raffle_data.pending_request_id,
            raffle_data.player_count,
            REQUEST_CONFIRMATIONS,
            NUM_WORDS
        );
        Ok(())
    }

    /// Process the FulfillRandomness instruction
    ///
    /// The oracle's one-shot callback. Validates the request correlation,
    /// selects the winner by modulo over the entry ledger, pays the whole
    /// pool to the winner and reopens the round. Every rejection happens
    /// before the first mutation; an aborted transaction leaves the round
    /// in Calculating for a retried fulfillment.
    fn process_fulfill_randomness(
        accounts: &[AccountInfo],
        request_id: u64,
        randomness: [u8; 32],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let oracle_authority_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        // Check that the raffle account is owned by our program
        if raffle_info.owner != program_id {
            msg!("Raffle account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut raffle_data = Raffle::unpack(&raffle_info.data.borrow())?;

        // Only the registered oracle may deliver randomness
        if !oracle_authority_info.is_signer {
            msg!("Oracle authority must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        if *oracle_authority_info.key != raffle_data.oracle_authority {
            msg!(
                "Unauthorized oracle: expected {}, got {}",
                raffle_data.oracle_authority,
                oracle_authority_info.key
            );
            return Err(RaffleError::UnauthorizedOracle.into());
        }

        // Reject replayed or stale deliveries: the id must match the one
        // outstanding request, and only while the round is calculating
        if raffle_data.phase != RafflePhase::Calculating
            || request_id != raffle_data.pending_request_id
        {
            msg!(
                "Stale fulfillment: request_id={} pending={} phase={:?}",
                request_id,
                raffle_data.pending_request_id,
                raffle_data.phase
            );
            return Err(RaffleError::UnknownOrStaleRequest.into());
        }

        // player_count > 0 is guaranteed: Calculating is only entered when
        // the ledger is non-empty and entries are closed while calculating
        let index = winner_index(&randomness, raffle_data.player_count as u64);
        let winner = raffle_data.player_at(index)?;
        msg!("Selected winner index {} of {}", index, raffle_data.player_count);

        if *winner_info.key != winner {
            msg!(
                "Winner account mismatch: selected {}, got {}",
                winner,
                winner_info.key
            );
            return Err(RaffleError::WinnerAccountMismatch.into());
        }

        // Pay out the whole pool. The raffle account must stay rent exempt,
        // otherwise the payout is refused and the round stays Calculating.
        let prize_amount = raffle_data.prize_pool;
        let rent = Rent::get()?;
        let remaining = raffle_info
            .lamports()
            .checked_sub(prize_amount)
            .ok_or(RaffleError::PayoutFailed)?;
        if remaining < rent.minimum_balance(Raffle::LEN) {
            msg!("Payout would leave the raffle account below rent exemption");
            return Err(RaffleError::PayoutFailed.into());
        }
        let winner_balance = winner_info
            .lamports()
            .checked_add(prize_amount)
            .ok_or(RaffleError::PayoutFailed)?;

        **raffle_info.try_borrow_mut_lamports()? = remaining;
        **winner_info.try_borrow_mut_lamports()? = winner_balance;

        // Settle and open the next round
        let clock = Clock::get()?;
        raffle_data.current_winner = winner;
        raffle_data.prize_pool = 0;
        raffle_data.clear_players();
        raffle_data.pending_request_id = 0;
        raffle_data.phase = RafflePhase::Open;
        raffle_data.last_timestamp = clock.unix_timestamp;
        Raffle::pack(raffle_data, &mut raffle_info.data.borrow_mut())?;

        msg!(
            "EVENT: WinnerChosen winner={} amount={} request_id={}",
            winner,
            prize_amount,
            request_id
        );
        Ok(())
    }
}
