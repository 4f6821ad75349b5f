use solana_program::{
    account_info::{next_account_info, AccountInfo},
    bpf_loader_upgradeable,
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed, set_return_data},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

use crate::{
    error::LotteryError,
    instruction::LotteryInstruction,
    randomness::BlockMetadataEntropy,
    state::{Lottery, LOTTERY_SEED},
    utils,
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
            LotteryInstruction::Initialize => {
                msg!("Instruction: Initialize");
                Self::process_initialize(accounts, program_id)
            }
            LotteryInstruction::Enter { amount } => {
                msg!("Instruction: Enter");
                Self::process_enter(accounts, amount, program_id)
            }
            LotteryInstruction::PickWinner => {
                msg!("Instruction: Pick Winner");
                Self::process_pick_winner(accounts, program_id)
            }
            LotteryInstruction::GetPlayers => {
                msg!("Instruction: Get Players");
                Self::process_get_players(accounts, program_id)
            }
        }
    }

    /// Create the lottery PDA and bind its manager
    fn process_initialize(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let manager_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;
        let program_data_info = next_account_info(account_info_iter)?;

        if !manager_info.is_signer {
            msg!("Manager must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let (expected_lottery_pubkey, bump_seed) = utils::find_lottery_address(program_id);
        if *lottery_info.key != expected_lottery_pubkey {
            msg!("Invalid lottery account address");
            return Err(LotteryError::InvalidLotteryAccount.into());
        }

        if lottery_info.owner == program_id {
            let existing = Lottery::unpack_unchecked(&lottery_info.data.borrow())?;
            if existing.is_initialized {
                msg!("Lottery account is already initialized");
                return Err(LotteryError::AlreadyInitialized.into());
            }
        }

        Self::check_upgrade_authority(manager_info, program_data_info, program_id)?;

        let bump = [bump_seed];
        let signer_seeds: &[&[u8]] = &[LOTTERY_SEED, &bump];
        let rent = Rent::get()?;

        if lottery_info.owner != program_id && lottery_info.lamports() > 0 {
            // create_account refuses a funded address, so build the account in steps
            let required = rent
                .minimum_balance(Lottery::LEN)
                .saturating_sub(lottery_info.lamports());
            if required > 0 {
                invoke(
                    &system_instruction::transfer(manager_info.key, lottery_info.key, required),
                    &[
                        manager_info.clone(),
                        lottery_info.clone(),
                        system_program_info.clone(),
                    ],
                )?;
            }

            invoke_signed(
                &system_instruction::allocate(lottery_info.key, Lottery::LEN as u64),
                &[lottery_info.clone(), system_program_info.clone()],
                &[signer_seeds],
            )?;
            invoke_signed(
                &system_instruction::assign(lottery_info.key, program_id),
                &[lottery_info.clone(), system_program_info.clone()],
                &[signer_seeds],
            )?;
        } else if lottery_info.owner != program_id {
            invoke_signed(
                &system_instruction::create_account(
                    manager_info.key,
                    lottery_info.key,
                    rent.minimum_balance(Lottery::LEN),
                    Lottery::LEN as u64,
                    program_id,
                ),
                &[
                    manager_info.clone(),
                    lottery_info.clone(),
                    system_program_info.clone(),
                ],
                &[signer_seeds],
            )?;
        }

        let lottery = Lottery::new(*manager_info.key, bump_seed);
        Lottery::pack(lottery, &mut lottery_info.data.borrow_mut())?;

        msg!("Lottery initialized: Manager={}", manager_info.key);
        Ok(())
    }

    /// Admit the signer to the current round and move the stake into the pool
    fn process_enter(accounts: &[AccountInfo], amount: u64, program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut lottery = Self::load_lottery(lottery_info, program_id)?;
        lottery.enter(*player_info.key, amount).map_err(|e| {
            msg!("Entry rejected: {} ({} lamports)", e, amount);
            e
        })?;

        invoke(
            &system_instruction::transfer(player_info.key, lottery_info.key, amount),
            &[
                player_info.clone(),
                lottery_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        let player_count = lottery.players().len();
        Lottery::pack(lottery, &mut lottery_info.data.borrow_mut())?;

        msg!(
            "Player {} entered with {} SOL, {} entries in round",
            player_info.key,
            utils::lamports_to_sol(amount),
            player_count
        );
        Ok(())
    }

    /// Draw a winner, pay out the pool and clear the round in one instruction
    fn process_pick_winner(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let manager_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;

        if !manager_info.is_signer {
            msg!("Manager must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut lottery = Self::load_lottery(lottery_info, program_id)?;

        let clock = Clock::get()?;
        let entropy = BlockMetadataEntropy::from_clock(&clock, manager_info.key);
        let winner = lottery.pick_winner(manager_info.key, &entropy)?;

        let winner_info = account_info_iter
            .find(|info| *info.key == winner)
            .ok_or_else(|| {
                msg!("Winner {} was not passed to the instruction", winner);
                LotteryError::WinnerAccountMissing
            })?;
        if !winner_info.is_writable {
            msg!("Winner account must be writable");
            return Err(ProgramError::InvalidArgument);
        }

        let rent = Rent::get()?;
        let prize = utils::pool_balance(
            lottery_info.lamports(),
            rent.minimum_balance(lottery_info.data_len()),
        );

        let lottery_lamports = lottery_info
            .lamports()
            .checked_sub(prize)
            .ok_or(LotteryError::Overflow)?;
        let winner_lamports = winner_info
            .lamports()
            .checked_add(prize)
            .ok_or(LotteryError::Overflow)?;
        **lottery_info.try_borrow_mut_lamports()? = lottery_lamports;
        **winner_info.try_borrow_mut_lamports()? = winner_lamports;

        Lottery::pack(lottery, &mut lottery_info.data.borrow_mut())?;

        msg!(
            "Winner {} paid {} SOL, new round started",
            winner,
            utils::lamports_to_sol(prize)
        );
        Ok(())
    }

    /// Publish the participants of the current round as return data
    fn process_get_players(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let lottery_info = next_account_info(account_info_iter)?;

        let lottery = Self::load_lottery(lottery_info, program_id)?;
        set_return_data(&lottery.players_return_data()?);

        msg!("{} players in current round", lottery.players().len());
        Ok(())
    }

    /// Only the account that deployed the program may become its manager
    fn check_upgrade_authority(
        manager_info: &AccountInfo,
        program_data_info: &AccountInfo,
        program_id: &Pubkey,
    ) -> ProgramResult {
        if *program_data_info.key != utils::find_program_data_address(program_id)
            || *program_data_info.owner != bpf_loader_upgradeable::id()
        {
            msg!("Invalid program data account");
            return Err(ProgramError::InvalidAccountData);
        }

        let authority = utils::upgrade_authority(&program_data_info.data.borrow())?;
        if authority != Some(*manager_info.key) {
            msg!("Manager {} is not the upgrade authority", manager_info.key);
            return Err(LotteryError::NotUpgradeAuthority.into());
        }
        Ok(())
    }

    /// Load the lottery, checking it is this program's initialized PDA
    fn load_lottery(lottery_info: &AccountInfo, program_id: &Pubkey) -> Result<Lottery, ProgramError> {
        if lottery_info.owner != program_id {
            msg!("Lottery account must be owned by this program");
            return Err(LotteryError::InvalidLotteryAccount.into());
        }

        let lottery = Lottery::unpack_unchecked(&lottery_info.data.borrow())?;
        if !lottery.is_initialized {
            return Err(LotteryError::NotInitialized.into());
        }

        let expected = Pubkey::create_program_address(&[LOTTERY_SEED, &[lottery.bump]], program_id)
            .map_err(|_| LotteryError::InvalidLotteryAccount)?;
        if *lottery_info.key != expected {
            msg!("Invalid lottery account address");
            return Err(LotteryError::InvalidLotteryAccount.into());
        }

        Ok(lottery)
    }
}
