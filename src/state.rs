use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};

use crate::{
    error::LotteryError,
    randomness::{winner_index, RandomnessSource},
};

/// Seed of the lottery program derived address
pub const LOTTERY_SEED: &[u8] = b"lottery";

/// Minimum stake per entry: 0.01 SOL
pub const MIN_STAKE_LAMPORTS: u64 = 10_000_000;

/// Participant slots per round. A resolution transaction has to carry every
/// distinct participant account, which bounds how many fit.
pub const MAX_PLAYERS: usize = 20;

const HEADER_LEN: usize = 1 + 32 + 1 + 4;
const PLAYERS_LEN: usize = 32 * MAX_PLAYERS;

/// Lottery account data: the round state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lottery {
    /// Is the account initialized
    pub is_initialized: bool,
    /// The only account allowed to resolve a round, fixed at creation
    pub manager: Pubkey,
    /// Bump seed of the lottery PDA
    pub bump: u8,
    /// Entrants of the current round in entry order, duplicates allowed
    players: Vec<Pubkey>,
}

impl Lottery {
    /// A fresh lottery with an empty round
    pub fn new(manager: Pubkey, bump: u8) -> Self {
        Self {
            is_initialized: true,
            manager,
            bump,
            players: Vec::with_capacity(MAX_PLAYERS),
        }
    }

    pub fn players(&self) -> &[Pubkey] {
        &self.players
    }

    /// Borsh encoding of the participants, as published by `GetPlayers`
    pub fn players_return_data(&self) -> Result<Vec<u8>, ProgramError> {
        self.players
            .try_to_vec()
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))
    }

    /// Admit `player` for one slot with the given stake
    pub fn enter(&mut self, player: Pubkey, stake: u64) -> Result<(), LotteryError> {
        if stake < MIN_STAKE_LAMPORTS {
            return Err(LotteryError::InsufficientStake);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(LotteryError::RoundFull);
        }

        self.players.push(player);
        Ok(())
    }

    /// Resolve the round on behalf of `caller`: pick the winner and clear the
    /// participants. Paying the pool out is left to the caller, which must do
    /// it in the same transaction.
    pub fn pick_winner<R: RandomnessSource + ?Sized>(
        &mut self,
        caller: &Pubkey,
        source: &R,
    ) -> Result<Pubkey, LotteryError> {
        if *caller != self.manager {
            return Err(LotteryError::Unauthorized);
        }

        let index = winner_index(source, self.players.len())?;
        let winner = self.players[index];
        self.players.clear();

        Ok(winner)
    }
}

/// Decode the return data of a `GetPlayers` instruction
pub fn decode_players(data: &[u8]) -> Result<Vec<Pubkey>, ProgramError> {
    Vec::<Pubkey>::try_from_slice(data).map_err(|e| ProgramError::BorshIoError(e.to_string()))
}

impl Sealed for Lottery {}

impl IsInitialized for Lottery {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for Lottery {
    const LEN: usize = HEADER_LEN + PLAYERS_LEN;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, Lottery::LEN];
        let (is_initialized, manager, bump, player_count, players) =
            array_refs![src, 1, 32, 1, 4, PLAYERS_LEN];

        let is_initialized = match is_initialized[0] {
            0 => false,
            1 => true,
            _ => return Err(ProgramError::InvalidAccountData),
        };

        let player_count = u32::from_le_bytes(*player_count) as usize;
        if player_count > MAX_PLAYERS {
            return Err(ProgramError::InvalidAccountData);
        }

        let players = players
            .chunks_exact(32)
            .take(player_count)
            .map(|key| <[u8; 32]>::try_from(key).map(Pubkey::new_from_array))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ProgramError::InvalidAccountData)?;

        Ok(Lottery {
            is_initialized,
            manager: Pubkey::new_from_array(*manager),
            bump: bump[0],
            players,
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Lottery::LEN];
        let (is_initialized_dst, manager_dst, bump_dst, player_count_dst, players_dst) =
            mut_array_refs![dst, 1, 32, 1, 4, PLAYERS_LEN];

        is_initialized_dst[0] = self.is_initialized as u8;
        manager_dst.copy_from_slice(self.manager.as_ref());
        bump_dst[0] = self.bump;
        *player_count_dst = (self.players.len() as u32).to_le_bytes();

        players_dst.fill(0);
        for (slot, player) in players_dst.chunks_exact_mut(32).zip(self.players.iter()) {
            slot.copy_from_slice(player.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lottery() -> Lottery {
        Lottery::new(Pubkey::new_unique(), 254)
    }

    #[test]
    fn new_lottery_has_an_empty_round() {
        let manager = Pubkey::new_unique();
        let lottery = Lottery::new(manager, 1);

        assert!(lottery.is_initialized());
        assert_eq!(lottery.manager, manager);
        assert!(lottery.players().is_empty());
    }

    #[test]
    fn enter_keeps_call_order_and_duplicates() {
        let mut lottery = lottery();
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();

        lottery.enter(alice, MIN_STAKE_LAMPORTS).unwrap();
        lottery.enter(bob, MIN_STAKE_LAMPORTS + 1).unwrap();
        lottery.enter(alice, 2 * MIN_STAKE_LAMPORTS).unwrap();

        assert_eq!(lottery.players(), &[alice, bob, alice]);
    }

    #[test]
    fn enter_below_minimum_changes_nothing() {
        let mut lottery = lottery();
        let player = Pubkey::new_unique();

        assert_eq!(
            lottery.enter(player, MIN_STAKE_LAMPORTS - 1),
            Err(LotteryError::InsufficientStake)
        );
        assert!(lottery.players().is_empty());
    }

    #[test]
    fn enter_into_full_round_is_rejected() {
        let mut lottery = lottery();
        for _ in 0..MAX_PLAYERS {
            lottery.enter(Pubkey::new_unique(), MIN_STAKE_LAMPORTS).unwrap();
        }

        let before = lottery.clone();
        assert_eq!(
            lottery.enter(Pubkey::new_unique(), MIN_STAKE_LAMPORTS),
            Err(LotteryError::RoundFull)
        );
        assert_eq!(lottery, before);
    }

    #[test]
    fn only_manager_can_pick_winner() {
        let mut lottery = lottery();
        let player = Pubkey::new_unique();
        lottery.enter(player, MIN_STAKE_LAMPORTS).unwrap();

        let intruder = Pubkey::new_unique();
        assert_eq!(
            lottery.pick_winner(&intruder, &0u64),
            Err(LotteryError::Unauthorized)
        );
        assert_eq!(lottery.players(), &[player]);
    }

    #[test]
    fn unauthorized_is_reported_before_empty_round() {
        let mut lottery = lottery();
        assert_eq!(
            lottery.pick_winner(&Pubkey::new_unique(), &0u64),
            Err(LotteryError::Unauthorized)
        );
    }

    #[test]
    fn pick_winner_on_empty_round_fails() {
        let mut lottery = lottery();
        let manager = lottery.manager;
        assert_eq!(
            lottery.pick_winner(&manager, &0u64),
            Err(LotteryError::EmptyRound)
        );
    }

    #[test]
    fn pick_winner_selects_by_index_and_resets() {
        let mut lottery = lottery();
        let manager = lottery.manager;
        let players: Vec<Pubkey> = (0..3).map(|_| Pubkey::new_unique()).collect();
        for player in &players {
            lottery.enter(*player, MIN_STAKE_LAMPORTS).unwrap();
        }

        // 7 % 3 == 1
        assert_eq!(lottery.pick_winner(&manager, &7u64), Ok(players[1]));
        assert!(lottery.players().is_empty());

        // next round starts clean
        let late = Pubkey::new_unique();
        lottery.enter(late, MIN_STAKE_LAMPORTS).unwrap();
        assert_eq!(lottery.players(), &[late]);
        assert_eq!(lottery.pick_winner(&manager, &12345u64), Ok(late));
    }

    #[test]
    fn pack_and_unpack_preserve_round() {
        let mut lottery = lottery();
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();
        lottery.enter(alice, MIN_STAKE_LAMPORTS).unwrap();
        lottery.enter(bob, MIN_STAKE_LAMPORTS).unwrap();

        let mut data = vec![0u8; Lottery::LEN];
        Lottery::pack(lottery.clone(), &mut data).unwrap();
        let unpacked = Lottery::unpack(&data).unwrap();

        assert_eq!(unpacked, lottery);
        assert_eq!(unpacked.players(), &[alice, bob]);
    }

    #[test]
    fn pack_zeroes_slots_left_by_a_previous_round() {
        let mut lottery = lottery();
        let manager = lottery.manager;
        lottery.enter(Pubkey::new_unique(), MIN_STAKE_LAMPORTS).unwrap();

        let mut data = vec![0u8; Lottery::LEN];
        Lottery::pack(lottery.clone(), &mut data).unwrap();
        lottery.pick_winner(&manager, &0u64).unwrap();
        Lottery::pack(lottery, &mut data).unwrap();

        assert!(data[HEADER_LEN..].iter().all(|byte| *byte == 0));
    }

    #[test]
    fn players_return_data_decodes_in_order() {
        let mut lottery = lottery();
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();
        lottery.enter(bob, MIN_STAKE_LAMPORTS).unwrap();
        lottery.enter(alice, MIN_STAKE_LAMPORTS).unwrap();

        let data = lottery.players_return_data().unwrap();
        assert_eq!(data.len(), 4 + 2 * 32);
        assert_eq!(decode_players(&data).unwrap(), vec![bob, alice]);

        let empty = Lottery::new(Pubkey::new_unique(), 0);
        let data = empty.players_return_data().unwrap();
        assert!(decode_players(&data).unwrap().is_empty());
    }

    #[test]
    fn uninitialized_account_does_not_unpack() {
        let data = vec![0u8; Lottery::LEN];
        assert_eq!(
            Lottery::unpack(&data),
            Err(ProgramError::UninitializedAccount)
        );
        assert!(!Lottery::unpack_unchecked(&data).unwrap().is_initialized());
    }

    #[test]
    fn corrupt_player_count_is_rejected() {
        let mut data = vec![0u8; Lottery::LEN];
        Lottery::pack(lottery(), &mut data).unwrap();
        data[34..38].copy_from_slice(&(MAX_PLAYERS as u32 + 1).to_le_bytes());

        assert_eq!(
            Lottery::unpack(&data),
            Err(ProgramError::InvalidAccountData)
        );
    }
}
