use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, program_error::ProgramError, pubkey::Pubkey};

use crate::{
    clock::RoundClock,
    constants::{FIRST_ROUND_ID, NUM_WORDS},
    error::LotteryError,
    ledger::EntryLedger,
    randomness::{PendingRequest, RandomnessGateway, RandomnessParams},
};

/// Phase of the live round
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LotteryState {
    /// Accepting entries
    Open,
    /// Waiting for the oracle to deliver randomness
    Calculating,
}

/// The single live round.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Round {
    pub round_id: u64,
    pub phase: LotteryState,
    pub clock: RoundClock,
    /// Minimum lamports per entry
    pub entrance_fee: u64,
}

impl Round {
    pub const LEN: usize = 8 + 1 + 8 + 8 + 8;
}

/// Parameters fixed when the lottery is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LotteryConfig {
    pub entrance_fee: u64,
    /// Minimum round length in seconds
    pub interval: i64,
    pub max_players: u32,
    pub randomness_params: RandomnessParams,
}

impl LotteryConfig {
    pub fn validate(&self) -> Result<(), LotteryError> {
        if self.interval <= 0
            || self.max_players == 0
            || self.randomness_params.num_words != NUM_WORDS
        {
            return Err(LotteryError::InvalidConfig);
        }
        Ok(())
    }
}

/// Lottery account data. The account also holds the pooled lamports.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Lottery {
    pub is_initialized: bool,
    /// Bump of the lottery PDA
    pub bump: u8,
    /// Account that created the lottery
    pub authority: Pubkey,
    /// Oracle queue randomness is requested from
    pub oracle_queue: Pubkey,
    pub randomness_params: RandomnessParams,
    /// Entry capacity the account was sized for
    pub max_players: u32,
    pub round: Round,
    pub ledger: EntryLedger,
    pub gateway: RandomnessGateway,
    pub recent_winner: Option<Pubkey>,
}

impl Lottery {
    /// Size of everything but the player list, with the list empty.
    pub const BASE_LEN: usize = 1
        + 1
        + 32
        + 32
        + RandomnessParams::LEN
        + 4
        + Round::LEN
        + (4 + 8)
        + RandomnessGateway::LEN
        + (1 + 32);

    /// Account size needed to hold `max_players` entries.
    pub fn space(max_players: u32) -> usize {
        Self::BASE_LEN + max_players as usize * 32
    }

    pub fn new(
        bump: u8,
        authority: Pubkey,
        oracle_queue: Pubkey,
        config: &LotteryConfig,
        now: UnixTimestamp,
    ) -> Self {
        Self {
            is_initialized: true,
            bump,
            authority,
            oracle_queue,
            randomness_params: config.randomness_params,
            max_players: config.max_players,
            round: Round {
                round_id: FIRST_ROUND_ID,
                phase: LotteryState::Open,
                clock: RoundClock::new(now, config.interval),
                entrance_fee: config.entrance_fee,
            },
            ledger: EntryLedger::default(),
            gateway: RandomnessGateway::default(),
            recent_winner: None,
        }
    }

    /// Reads an initialized lottery from account data. Trailing capacity is
    /// ignored.
    pub fn load(src: &[u8]) -> Result<Self, ProgramError> {
        let lottery = Self::deserialize(&mut &src[..])
            .map_err(|_| ProgramError::InvalidAccountData)?;
        if !lottery.is_initialized {
            return Err(LotteryError::NotInitialized.into());
        }
        Ok(lottery)
    }

    /// Writes the lottery into account data.
    pub fn save(&self, dst: &mut [u8]) -> Result<(), ProgramError> {
        let data = self
            .try_to_vec()
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
        if data.len() > dst.len() {
            return Err(LotteryError::LotteryFull.into());
        }
        dst[..data.len()].copy_from_slice(&data);
        Ok(())
    }

    /// True while the account has room for another player.
    pub fn has_capacity(&self) -> bool {
        self.ledger.num_players() < self.max_players as u64
    }

    pub fn get_entrance_fee(&self) -> u64 {
        self.round.entrance_fee
    }

    pub fn get_player(&self, index: u64) -> Option<Pubkey> {
        self.ledger.player(index).copied()
    }

    pub fn get_num_players(&self) -> u64 {
        self.ledger.num_players()
    }

    pub fn get_lottery_state(&self) -> LotteryState {
        self.round.phase
    }

    pub fn get_recent_winner(&self) -> Option<Pubkey> {
        self.recent_winner
    }

    pub fn get_last_timestamp(&self) -> UnixTimestamp {
        self.round.clock.started_at
    }

    pub fn get_interval(&self) -> i64 {
        self.round.clock.interval
    }

    pub fn get_num_words(&self) -> u32 {
        self.randomness_params.num_words
    }

    pub fn get_request_confirmations(&self) -> u16 {
        self.randomness_params.request_confirmations
    }

    pub fn get_pending_request(&self) -> Option<PendingRequest> {
        self.gateway.pending
    }

    pub fn get_round_id(&self) -> u64 {
        self.round.round_id
    }

    pub fn get_pool(&self) -> u64 {
        self.ledger.pool
    }
}
