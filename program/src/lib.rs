// Keeper-driven lottery: paid entries during an open window, closed by an
// external keeper and settled by an oracle's randomness callback.

pub mod clock;
pub mod constants;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod instruction;
pub mod ledger;
pub mod oracle_queue;
pub mod processor;
pub mod randomness;
pub mod selector;
pub mod state;
pub mod upkeep;
pub mod utils;

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
