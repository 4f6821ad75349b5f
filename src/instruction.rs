use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};
use std::convert::TryInto;
use std::mem::size_of;

use crate::{error::LotteryError, utils::find_program_data_address};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LotteryInstruction {
    /// Create the lottery. The signer must be the program's upgrade
    /// authority and becomes the manager.
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The manager, pays for the lottery account
    /// 1. `[writable]` The lottery account (PDA)
    /// 2. `[]` The system program
    /// 3. `[]` The program data account of this program
    Initialize,

    /// Join the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player, pays the stake
    /// 1. `[writable]` The lottery account
    /// 2. `[]` The system program
    Enter {
        /// Stake in lamports (minimum 0.01 SOL)
        amount: u64,
    },

    /// Draw a winner, pay out the pool and start a new round (manager only)
    ///
    /// Accounts expected:
    /// 0. `[signer]` The manager
    /// 1. `[writable]` The lottery account
    /// 2.. `[writable]` Every distinct participant of the round
    PickWinner,

    /// Publish the current participants as return data
    ///
    /// Accounts expected:
    /// 0. `[]` The lottery account
    GetPlayers,
}

impl LotteryInstruction {
    /// Unpacks a byte buffer into a LotteryInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(LotteryError::InvalidInstruction)?;

        Ok(match tag {
            0 => Self::Initialize,
            1 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::Enter { amount }
            }
            2 => Self::PickWinner,
            3 => Self::GetPlayers,
            _ => return Err(LotteryError::InvalidInstruction.into()),
        })
    }

    /// Packs a LotteryInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(size_of::<Self>());
        match *self {
            Self::Initialize => buf.push(0),
            Self::Enter { amount } => {
                buf.push(1);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::PickWinner => buf.push(2),
            Self::GetPlayers => buf.push(3),
        }
        buf
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        if input.len() < 8 {
            return Err(LotteryError::InvalidInstruction.into());
        }
        let (bytes, rest) = input.split_at(8);
        let value = bytes
            .try_into()
            .map(u64::from_le_bytes)
            .map_err(|_| LotteryError::InvalidInstruction)?;
        Ok((value, rest))
    }
}

/// Create initialize instruction
pub fn initialize(
    program_id: &Pubkey,
    manager: &Pubkey,
    lottery_account: &Pubkey,
) -> Instruction {
    let accounts = vec![
        AccountMeta::new(*manager, true),
        AccountMeta::new(*lottery_account, false),
        AccountMeta::new_readonly(system_program::id(), false),
        AccountMeta::new_readonly(find_program_data_address(program_id), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data: LotteryInstruction::Initialize.pack(),
    }
}

/// Create enter instruction
pub fn enter(
    program_id: &Pubkey,
    player: &Pubkey,
    lottery_account: &Pubkey,
    amount: u64,
) -> Instruction {
    let accounts = vec![
        AccountMeta::new(*player, true),
        AccountMeta::new(*lottery_account, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data: LotteryInstruction::Enter { amount }.pack(),
    }
}

/// Create pick_winner instruction. `players` is the current round as read from
/// the lottery account; each distinct key is passed once.
pub fn pick_winner(
    program_id: &Pubkey,
    manager: &Pubkey,
    lottery_account: &Pubkey,
    players: &[Pubkey],
) -> Instruction {
    let mut accounts = vec![
        AccountMeta::new_readonly(*manager, true),
        AccountMeta::new(*lottery_account, false),
    ];

    let mut seen: Vec<Pubkey> = Vec::with_capacity(players.len());
    for player in players {
        if !seen.contains(player) {
            seen.push(*player);
            accounts.push(AccountMeta::new(*player, false));
        }
    }

    Instruction {
        program_id: *program_id,
        accounts,
        data: LotteryInstruction::PickWinner.pack(),
    }
}

/// Create get_players instruction
pub fn get_players(program_id: &Pubkey, lottery_account: &Pubkey) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![AccountMeta::new_readonly(*lottery_account, false)],
        data: LotteryInstruction::GetPlayers.pack(),
    }
}
