use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::{error::LotteryError, state::LotteryState};

/// Participants of the current round in insertion order, plus the pooled
/// lamports they paid in.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryLedger {
    /// One element per entry; a player entering twice appears twice
    pub players: Vec<Pubkey>,
    /// Lamports collected this round
    pub pool: u64,
}

impl EntryLedger {
    /// Records one paid entry. Rejects entries while the round is calculating
    /// and entries paying less than the fee, without touching the ledger.
    pub fn enter(
        &mut self,
        phase: LotteryState,
        entrance_fee: u64,
        player: Pubkey,
        value: u64,
    ) -> Result<(), LotteryError> {
        if phase != LotteryState::Open {
            return Err(LotteryError::RoundNotOpen);
        }
        if value < entrance_fee {
            return Err(LotteryError::InsufficientValue);
        }

        let pool = self.pool.checked_add(value).ok_or(LotteryError::Overflow)?;
        self.players.push(player);
        self.pool = pool;
        Ok(())
    }

    pub fn num_players(&self) -> u64 {
        self.players.len() as u64
    }

    pub fn player(&self, index: u64) -> Option<&Pubkey> {
        usize::try_from(index).ok().and_then(|i| self.players.get(i))
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub(crate) fn reset(&mut self) {
        self.players.clear();
        self.pool = 0;
    }
}
