use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};
use std::mem::size_of;

use crate::{
    error::LotteryError,
    randomness::{RandomWord, RandomnessParams},
    state::LotteryConfig,
    utils::{find_lottery_address, find_oracle_queue_address},
};

#[derive(Clone, Debug, PartialEq)]
pub enum LotteryInstruction {
    /// Create the oracle queue and register the authority that fulfills requests
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` Payer of the queue account
    /// 1. `[writable]` The oracle queue account (PDA)
    /// 2. `[]` Oracle authority
    /// 3. `[]` The system program
    InitializeOracleQueue,

    /// Create the lottery and open its first round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The authority creating the lottery, pays for the account
    /// 1. `[writable]` The lottery account (PDA)
    /// 2. `[]` The oracle queue account
    /// 3. `[]` The system program
    InitializeLottery { config: LotteryConfig },

    /// Pay into the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player
    /// 1. `[writable]` The lottery account
    /// 2. `[]` The system program
    EnterLottery {
        /// Lamports paid, at least the entrance fee
        amount: u64,
    },

    /// Evaluate the upkeep predicate without changing anything. The
    /// borsh-encoded `UpkeepStatus` is set as return data.
    ///
    /// Accounts expected:
    /// 0. `[]` The lottery account
    CheckUpkeep { check_data: Vec<u8> },

    /// Close the round and request randomness. Anyone may call this; it
    /// fails unless the upkeep predicate holds.
    ///
    /// Accounts expected:
    /// 0. `[signer]` Caller (keeper or any user)
    /// 1. `[writable]` The lottery account
    /// 2. `[writable]` The oracle queue account
    PerformUpkeep { perform_data: Vec<u8> },

    /// Deliver random words for the outstanding request and pay the winner
    ///
    /// Accounts expected:
    /// 0. `[signer]` The oracle queue authority
    /// 1. `[writable]` The lottery account
    /// 2. `[]` The oracle queue account
    /// 3. `[writable]` The winning player's account
    FulfillRandomWords {
        request_id: u64,
        random_words: Vec<RandomWord>,
    },
}

impl LotteryInstruction {
    /// Unpacks a byte buffer into a LotteryInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(LotteryError::InvalidInstruction)?;

        Ok(match tag {
            0 => Self::InitializeOracleQueue,
            1 => {
                let (entrance_fee, rest) = Self::unpack_u64(rest)?;
                let (interval, rest) = Self::unpack_i64(rest)?;
                let (max_players, rest) = Self::unpack_u32(rest)?;
                let (key_hash, rest) = Self::unpack_fixed_bytes::<32>(rest)?;
                let (subscription_id, rest) = Self::unpack_u64(rest)?;
                let (request_confirmations, rest) = Self::unpack_u16(rest)?;
                let (callback_compute_limit, rest) = Self::unpack_u32(rest)?;
                let (num_words, _) = Self::unpack_u32(rest)?;
                Self::InitializeLottery {
                    config: LotteryConfig {
                        entrance_fee,
                        interval,
                        max_players,
                        randomness_params: RandomnessParams {
                            key_hash,
                            subscription_id,
                            request_confirmations,
                            callback_compute_limit,
                            num_words,
                        },
                    },
                }
            }
            2 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::EnterLottery { amount }
            }
            3 => {
                let (check_data, _) = Self::unpack_bytes(rest)?;
                Self::CheckUpkeep { check_data }
            }
            4 => {
                let (perform_data, _) = Self::unpack_bytes(rest)?;
                Self::PerformUpkeep { perform_data }
            }
            5 => {
                let (request_id, rest) = Self::unpack_u64(rest)?;
                let (count, mut rest) = Self::unpack_u32(rest)?;
                let mut random_words = Vec::with_capacity(count.min(16) as usize);
                for _ in 0..count {
                    let (word, next) = Self::unpack_fixed_bytes::<32>(rest)?;
                    random_words.push(word);
                    rest = next;
                }
                Self::FulfillRandomWords {
                    request_id,
                    random_words,
                }
            }
            _ => return Err(LotteryError::InvalidInstruction.into()),
        })
    }

    /// Packs a LotteryInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(size_of::<Self>());
        match self {
            Self::InitializeOracleQueue => buf.push(0),
            Self::InitializeLottery { config } => {
                let params = &config.randomness_params;
                buf.push(1);
                buf.extend_from_slice(&config.entrance_fee.to_le_bytes());
                buf.extend_from_slice(&config.interval.to_le_bytes());
                buf.extend_from_slice(&config.max_players.to_le_bytes());
                buf.extend_from_slice(&params.key_hash);
                buf.extend_from_slice(&params.subscription_id.to_le_bytes());
                buf.extend_from_slice(&params.request_confirmations.to_le_bytes());
                buf.extend_from_slice(&params.callback_compute_limit.to_le_bytes());
                buf.extend_from_slice(&params.num_words.to_le_bytes());
            }
            Self::EnterLottery { amount } => {
                buf.push(2);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::CheckUpkeep { check_data } => {
                buf.push(3);
                Self::pack_bytes(&mut buf, check_data);
            }
            Self::PerformUpkeep { perform_data } => {
                buf.push(4);
                Self::pack_bytes(&mut buf, perform_data);
            }
            Self::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                buf.push(5);
                buf.extend_from_slice(&request_id.to_le_bytes());
                buf.extend_from_slice(&(random_words.len() as u32).to_le_bytes());
                for word in random_words {
                    buf.extend_from_slice(word);
                }
            }
        }
        buf
    }

    fn pack_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
        buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        buf.extend_from_slice(bytes);
    }

    fn unpack_fixed_bytes<const N: usize>(input: &[u8]) -> Result<([u8; N], &[u8]), ProgramError> {
        if input.len() < N {
            return Err(LotteryError::InvalidInstruction.into());
        }
        let (bytes, rest) = input.split_at(N);
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok((out, rest))
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<8>(input)?;
        Ok((u64::from_le_bytes(bytes), rest))
    }

    fn unpack_i64(input: &[u8]) -> Result<(i64, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<8>(input)?;
        Ok((i64::from_le_bytes(bytes), rest))
    }

    fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<4>(input)?;
        Ok((u32::from_le_bytes(bytes), rest))
    }

    fn unpack_u16(input: &[u8]) -> Result<(u16, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<2>(input)?;
        Ok((u16::from_le_bytes(bytes), rest))
    }

    fn unpack_bytes(input: &[u8]) -> Result<(Vec<u8>, &[u8]), ProgramError> {
        let (len, rest) = Self::unpack_u32(input)?;
        let len = len as usize;
        if rest.len() < len {
            return Err(LotteryError::InvalidInstruction.into());
        }
        let (bytes, rest) = rest.split_at(len);
        Ok((bytes.to_vec(), rest))
    }
}

/// Create initialize_oracle_queue instruction
pub fn initialize_oracle_queue(
    program_id: &Pubkey,
    payer: &Pubkey,
    oracle_authority: &Pubkey,
) -> Result<Instruction, ProgramError> {
    let (oracle_queue, _) = find_oracle_queue_address(program_id);
    let data = LotteryInstruction::InitializeOracleQueue.pack();

    let accounts = vec![
        AccountMeta::new(*payer, true),
        AccountMeta::new(oracle_queue, false),
        AccountMeta::new_readonly(*oracle_authority, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create initialize_lottery instruction
pub fn initialize_lottery(
    program_id: &Pubkey,
    authority: &Pubkey,
    config: LotteryConfig,
) -> Result<Instruction, ProgramError> {
    let (lottery, _) = find_lottery_address(program_id);
    let (oracle_queue, _) = find_oracle_queue_address(program_id);
    let data = LotteryInstruction::InitializeLottery { config }.pack();

    let accounts = vec![
        AccountMeta::new(*authority, true),
        AccountMeta::new(lottery, false),
        AccountMeta::new_readonly(oracle_queue, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create enter_lottery instruction
pub fn enter_lottery(
    program_id: &Pubkey,
    player: &Pubkey,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let (lottery, _) = find_lottery_address(program_id);
    let data = LotteryInstruction::EnterLottery { amount }.pack();

    let accounts = vec![
        AccountMeta::new(*player, true),
        AccountMeta::new(lottery, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey, check_data: Vec<u8>) -> Result<Instruction, ProgramError> {
    let (lottery, _) = find_lottery_address(program_id);
    let data = LotteryInstruction::CheckUpkeep { check_data }.pack();

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![AccountMeta::new_readonly(lottery, false)],
        data,
    })
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(
    program_id: &Pubkey,
    caller: &Pubkey,
    perform_data: Vec<u8>,
) -> Result<Instruction, ProgramError> {
    let (lottery, _) = find_lottery_address(program_id);
    let (oracle_queue, _) = find_oracle_queue_address(program_id);
    let data = LotteryInstruction::PerformUpkeep { perform_data }.pack();

    let accounts = vec![
        AccountMeta::new_readonly(*caller, true),
        AccountMeta::new(lottery, false),
        AccountMeta::new(oracle_queue, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create fulfill_random_words instruction
pub fn fulfill_random_words(
    program_id: &Pubkey,
    oracle_authority: &Pubkey,
    winner: &Pubkey,
    request_id: u64,
    random_words: Vec<RandomWord>,
) -> Result<Instruction, ProgramError> {
    let (lottery, _) = find_lottery_address(program_id);
    let (oracle_queue, _) = find_oracle_queue_address(program_id);
    let data = LotteryInstruction::FulfillRandomWords {
        request_id,
        random_words,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new_readonly(*oracle_authority, true),
        AccountMeta::new(lottery, false),
        AccountMeta::new_readonly(oracle_queue, false),
        AccountMeta::new(*winner, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}
