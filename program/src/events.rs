use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, pubkey::Pubkey};

use crate::constants::EVENT_LOG_PREFIX;

/// Externally observable notifications, in emission order.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum LotteryEvent {
    Entered {
        round_id: u64,
        player: Pubkey,
        amount: u64,
    },
    RandomnessRequested {
        round_id: u64,
        request_id: u64,
        key_hash: [u8; 32],
        subscription_id: u64,
        request_confirmations: u16,
        callback_compute_limit: u32,
        num_words: u32,
    },
    WinnerPicked {
        round_id: u64,
        winner: Pubkey,
        prize: u64,
    },
}

/// Destination for lottery notifications.
pub trait EventSink {
    fn emit(&mut self, event: LotteryEvent);
}

impl EventSink for Vec<LotteryEvent> {
    fn emit(&mut self, event: LotteryEvent) {
        self.push(event);
    }
}

/// Writes events to the transaction log: a readable `msg!` line followed by
/// the borsh encoding under the `lottery-event` prefix.
pub struct ProgramLog;

impl EventSink for ProgramLog {
    fn emit(&mut self, event: LotteryEvent) {
        match &event {
            LotteryEvent::Entered {
                round_id,
                player,
                amount,
            } => msg!("Entered: round={} player={} amount={}", round_id, player, amount),
            LotteryEvent::RandomnessRequested {
                round_id,
                request_id,
                ..
            } => msg!("RandomnessRequested: round={} request_id={}", round_id, request_id),
            LotteryEvent::WinnerPicked {
                round_id,
                winner,
                prize,
            } => msg!("WinnerPicked: round={} winner={} prize={}", round_id, winner, prize),
        }

        match event.try_to_vec() {
            Ok(data) => sol_log_data(&[EVENT_LOG_PREFIX, &data]),
            Err(err) => msg!("Failed to encode event: {}", err),
        }
    }
}
