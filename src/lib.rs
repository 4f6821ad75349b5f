// Stake Lottery
// A pooled-stake lottery: players stake to enter a round, the manager draws a
// winner who takes the whole pool, and the next round starts empty.

pub mod error;
pub mod instruction;
pub mod processor;
pub mod randomness;
pub mod state;
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
