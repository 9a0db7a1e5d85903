use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed, set_return_data},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    sysvar::Sysvar,
};

use crate::{
    clock::{SysvarTime, TimeSource},
    constants::{LOTTERY_SEED, ORACLE_QUEUE_SEED},
    coordinator::{PrizeTransfer, RoundCoordinator},
    error::LotteryError,
    events::ProgramLog,
    instruction::LotteryInstruction,
    oracle_queue::OracleQueue,
    randomness::RandomWord,
    state::{Lottery, LotteryConfig},
    utils::{find_lottery_address, find_oracle_queue_address, lamports_to_sol},
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = LotteryInstruction::unpack(instruction_data)?;

        match instruction {
            LotteryInstruction::InitializeOracleQueue => {
                msg!("Instruction: Initialize Oracle Queue");
                Self::process_initialize_oracle_queue(accounts, program_id)
            }
            LotteryInstruction::InitializeLottery { config } => {
                msg!("Instruction: Initialize Lottery");
                Self::process_initialize_lottery(accounts, config, program_id)
            }
            LotteryInstruction::EnterLottery { amount } => {
                msg!("Instruction: Enter Lottery");
                Self::process_enter_lottery(accounts, amount, program_id)
            }
            LotteryInstruction::CheckUpkeep { check_data } => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, &check_data, program_id)
            }
            LotteryInstruction::PerformUpkeep { perform_data } => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, &perform_data, program_id)
            }
            LotteryInstruction::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(accounts, request_id, &random_words, program_id)
            }
        }
    }

    fn process_initialize_oracle_queue(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let payer_info = next_account_info(account_info_iter)?;
        let queue_info = next_account_info(account_info_iter)?;
        let oracle_authority_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !payer_info.is_signer {
            msg!("Payer must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let (expected_queue, bump_seed) = find_oracle_queue_address(program_id);
        if *queue_info.key != expected_queue {
            msg!("Invalid oracle queue account address");
            return Err(LotteryError::InvalidOracleQueue.into());
        }
        if queue_info.owner == program_id {
            msg!("Oracle queue is already initialized");
            return Err(LotteryError::AlreadyInitialized.into());
        }

        let rent = Rent::get()?;
        invoke_signed(
            &system_instruction::create_account(
                payer_info.key,
                queue_info.key,
                rent.minimum_balance(OracleQueue::LEN),
                OracleQueue::LEN as u64,
                program_id,
            ),
            &[
                payer_info.clone(),
                queue_info.clone(),
                system_program_info.clone(),
            ],
            &[&[ORACLE_QUEUE_SEED, &[bump_seed]]],
        )?;

        OracleQueue::pack(
            OracleQueue::new(*oracle_authority_info.key),
            &mut queue_info.data.borrow_mut(),
        )?;

        msg!("Oracle queue initialized: authority={}", oracle_authority_info.key);
        Ok(())
    }

    fn process_initialize_lottery(
        accounts: &[AccountInfo],
        config: LotteryConfig,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let queue_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !authority_info.is_signer {
            msg!("Authority must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        config.validate()?;

        let (expected_lottery, bump_seed) = find_lottery_address(program_id);
        if *lottery_info.key != expected_lottery {
            msg!("Invalid lottery account address");
            return Err(LotteryError::InvalidLotteryAccount.into());
        }
        if lottery_info.owner == program_id {
            msg!("Lottery is already initialized");
            return Err(LotteryError::AlreadyInitialized.into());
        }

        Self::check_oracle_queue(program_id, queue_info, &find_oracle_queue_address(program_id).0)?;
        OracleQueue::unpack(&queue_info.data.borrow())?;

        let space = Lottery::space(config.max_players);
        let rent = Rent::get()?;
        invoke_signed(
            &system_instruction::create_account(
                authority_info.key,
                lottery_info.key,
                rent.minimum_balance(space),
                space as u64,
                program_id,
            ),
            &[
                authority_info.clone(),
                lottery_info.clone(),
                system_program_info.clone(),
            ],
            &[&[LOTTERY_SEED, &[bump_seed]]],
        )?;

        let now = SysvarTime.now()?;
        let lottery = Lottery::new(
            bump_seed,
            *authority_info.key,
            *queue_info.key,
            &config,
            now,
        );
        lottery.save(&mut lottery_info.data.borrow_mut())?;

        msg!(
            "Lottery initialized: entrance fee={} lamports, interval={}s, capacity={}",
            config.entrance_fee,
            config.interval,
            config.max_players
        );
        Ok(())
    }

    fn process_enter_lottery(
        accounts: &[AccountInfo],
        amount: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut lottery = Self::load_lottery(program_id, lottery_info)?;
        RoundCoordinator::new(&mut lottery, &SysvarTime, &mut ProgramLog)
            .enter(*player_info.key, amount)?;

        invoke(
            &system_instruction::transfer(player_info.key, lottery_info.key, amount),
            &[
                player_info.clone(),
                lottery_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        lottery.save(&mut lottery_info.data.borrow_mut())?;

        msg!(
            "Entry accepted: {} SOL, pool={} SOL, players={}",
            lamports_to_sol(amount),
            lamports_to_sol(lottery.get_pool()),
            lottery.get_num_players()
        );
        Ok(())
    }

    fn process_check_upkeep(
        accounts: &[AccountInfo],
        check_data: &[u8],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let lottery_info = next_account_info(account_info_iter)?;

        let mut lottery = Self::load_lottery(program_id, lottery_info)?;
        let status =
            RoundCoordinator::new(&mut lottery, &SysvarTime, &mut ProgramLog).check_upkeep(check_data)?;

        let encoded = status
            .try_to_vec()
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
        set_return_data(&encoded);

        msg!("Upkeep needed: {} ({:?})", status.upkeep_needed, status.reason);
        Ok(())
    }

    fn process_perform_upkeep(
        accounts: &[AccountInfo],
        perform_data: &[u8],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let queue_info = next_account_info(account_info_iter)?;

        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut lottery = Self::load_lottery(program_id, lottery_info)?;
        Self::check_oracle_queue(program_id, queue_info, &lottery.oracle_queue)?;
        let mut queue = OracleQueue::unpack_unchecked(&queue_info.data.borrow())?;

        let pending = RoundCoordinator::new(&mut lottery, &SysvarTime, &mut ProgramLog)
            .perform_upkeep(&mut queue, perform_data)?;

        OracleQueue::pack(queue, &mut queue_info.data.borrow_mut())?;
        lottery.save(&mut lottery_info.data.borrow_mut())?;

        msg!(
            "Round {} closing, randomness request {} issued by {}",
            pending.round_id,
            pending.request_id,
            caller_info.key
        );
        Ok(())
    }

    fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: u64,
        random_words: &[RandomWord],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let oracle_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let queue_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        let mut lottery = Self::load_lottery(program_id, lottery_info)?;
        Self::check_oracle_queue(program_id, queue_info, &lottery.oracle_queue)?;
        let queue = OracleQueue::unpack(&queue_info.data.borrow())?;

        if !oracle_info.is_signer || *oracle_info.key != queue.authority {
            msg!("Fulfillment must be signed by the oracle authority {}", queue.authority);
            return Err(LotteryError::UnauthorizedOracle.into());
        }

        let rent = Rent::get()?;
        let mut payout = LamportTransfer {
            vault: lottery_info,
            recipient: winner_info,
            rent_exempt_minimum: rent.minimum_balance(lottery_info.data_len()),
        };
        let winner = RoundCoordinator::new(&mut lottery, &SysvarTime, &mut ProgramLog)
            .fulfill_random_words(&mut payout, request_id, random_words)?;

        lottery.save(&mut lottery_info.data.borrow_mut())?;

        msg!("Winner paid: {}", winner);
        Ok(())
    }

    /// Loads the lottery after checking its address and owner.
    fn load_lottery(program_id: &Pubkey, lottery_info: &AccountInfo) -> Result<Lottery, ProgramError> {
        let (expected_lottery, _) = find_lottery_address(program_id);
        if *lottery_info.key != expected_lottery {
            msg!("Invalid lottery account address");
            return Err(LotteryError::InvalidLotteryAccount.into());
        }
        if lottery_info.owner != program_id {
            msg!("Lottery account must be owned by the program");
            return Err(ProgramError::IncorrectProgramId);
        }
        Lottery::load(&lottery_info.data.borrow())
    }

    fn check_oracle_queue(
        program_id: &Pubkey,
        queue_info: &AccountInfo,
        expected_queue: &Pubkey,
    ) -> ProgramResult {
        if queue_info.key != expected_queue {
            msg!("Oracle queue does not match the lottery's queue");
            return Err(LotteryError::InvalidOracleQueue.into());
        }
        if queue_info.owner != program_id {
            msg!("Oracle queue must be owned by the program");
            return Err(ProgramError::IncorrectProgramId);
        }
        Ok(())
    }
}

/// Pays the prize straight out of the program-owned lottery account. The
/// lottery never drops below its rent-exempt minimum.
struct LamportTransfer<'a, 'info> {
    vault: &'a AccountInfo<'info>,
    recipient: &'a AccountInfo<'info>,
    rent_exempt_minimum: u64,
}

impl PrizeTransfer for LamportTransfer<'_, '_> {
    fn transfer(&mut self, winner: &Pubkey, amount: u64) -> Result<(), LotteryError> {
        if self.recipient.key != winner {
            msg!(
                "Recipient {} is not the selected winner {}",
                self.recipient.key,
                winner
            );
            return Err(LotteryError::TransferFailed);
        }
        if !self.recipient.is_writable || self.recipient.key == self.vault.key {
            msg!("Recipient account cannot receive the prize");
            return Err(LotteryError::TransferFailed);
        }

        let remaining = self
            .vault
            .lamports()
            .checked_sub(amount)
            .filter(|remaining| *remaining >= self.rent_exempt_minimum)
            .ok_or(LotteryError::TransferFailed)?;
        let credited = self
            .recipient
            .lamports()
            .checked_add(amount)
            .ok_or(LotteryError::TransferFailed)?;

        **self
            .vault
            .try_borrow_mut_lamports()
            .map_err(|_| LotteryError::TransferFailed)? = remaining;
        **self
            .recipient
            .try_borrow_mut_lamports()
            .map_err(|_| LotteryError::TransferFailed)? = credited;

        msg!("Transferred {} lamports to {}", amount, winner);
        Ok(())
    }
}
