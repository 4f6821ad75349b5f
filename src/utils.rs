// Stake lottery - utility functions
use arrayref::{array_ref, array_refs};
use solana_program::{
    bpf_loader_upgradeable::{self, UpgradeableLoaderState},
    native_token::LAMPORTS_PER_SOL,
    program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::state::LOTTERY_SEED;

const PROGRAM_DATA_TAG: u32 = 3;
const PROGRAM_DATA_METADATA_LEN: usize = UpgradeableLoaderState::size_of_programdata_metadata();

/// Find the program derived address of the lottery
pub fn find_lottery_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[LOTTERY_SEED], program_id)
}

/// Address of the upgradeable loader's program data account for `program_id`
pub fn find_program_data_address(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[program_id.as_ref()], &bpf_loader_upgradeable::id()).0
}

/// Read the upgrade authority out of a program data account.
///
/// Layout: u32 variant tag (3), u64 slot, option tag, authority key.
pub fn upgrade_authority(program_data: &[u8]) -> Result<Option<Pubkey>, ProgramError> {
    if program_data.len() < PROGRAM_DATA_METADATA_LEN {
        return Err(ProgramError::InvalidAccountData);
    }
    let metadata = array_ref![program_data, 0, PROGRAM_DATA_METADATA_LEN];
    let (tag, _slot, has_authority, authority) = array_refs![metadata, 4, 8, 1, 32];

    if u32::from_le_bytes(*tag) != PROGRAM_DATA_TAG {
        return Err(ProgramError::InvalidAccountData);
    }
    match has_authority[0] {
        0 => Ok(None),
        1 => Ok(Some(Pubkey::new_from_array(*authority))),
        _ => Err(ProgramError::InvalidAccountData),
    }
}

/// Lamports held by the lottery above its rent-exempt reserve
pub fn pool_balance(account_lamports: u64, rent_exempt_minimum: u64) -> u64 {
    account_lamports.saturating_sub(rent_exempt_minimum)
}

/// Convert lamports to SOL (for display purposes)
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Convert SOL to lamports
pub fn sol_to_lamports(sol: f64) -> u64 {
    (sol * LAMPORTS_PER_SOL as f64).round() as u64
}
