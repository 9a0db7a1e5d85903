use solana_program::pubkey::Pubkey;

use crate::constants::{LOTTERY_SEED, ORACLE_QUEUE_SEED};

/// Find the program derived address of the lottery
pub fn find_lottery_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[LOTTERY_SEED], program_id)
}

/// Find the program derived address of the oracle queue
pub fn find_oracle_queue_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[ORACLE_QUEUE_SEED], program_id)
}

/// Convert lamports to SOL (for display purposes)
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / 1_000_000_000.0
}
