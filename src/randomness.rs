// Winner selection randomness for the lottery program
//
// NOTE: block metadata is NOT a secure source of randomness. The slot leader
// controls the slot and can nudge the timestamp, so a validator colluding with
// the manager can bias the draw. The source sits behind `RandomnessSource` so
// it can be swapped for something stronger.
use solana_program::{clock::Clock, keccak, pubkey::Pubkey};

use crate::error::LotteryError;

/// Produces the random word a winner index is reduced from
pub trait RandomnessSource {
    fn random_word(&self) -> u64;
}

/// Pseudo-random word derived from volatile block metadata and the caller
#[derive(Debug, Clone, Copy)]
pub struct BlockMetadataEntropy {
    pub unix_timestamp: i64,
    pub slot: u64,
    pub caller: Pubkey,
}

impl BlockMetadataEntropy {
    pub fn from_clock(clock: &Clock, caller: &Pubkey) -> Self {
        Self {
            unix_timestamp: clock.unix_timestamp,
            slot: clock.slot,
            caller: *caller,
        }
    }
}

impl RandomnessSource for BlockMetadataEntropy {
    fn random_word(&self) -> u64 {
        let digest = keccak::hashv(&[
            &self.unix_timestamp.to_le_bytes(),
            &self.slot.to_le_bytes(),
            self.caller.as_ref(),
        ]);
        word_from_bytes(&digest.to_bytes())
    }
}

/// Fixed word, for deterministic draws
impl RandomnessSource for u64 {
    fn random_word(&self) -> u64 {
        *self
    }
}

/// Read the first 8 bytes of a digest as a little-endian u64
pub fn word_from_bytes(bytes: &[u8; 32]) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(word)
}

/// Reduce a random word to an index into `player_count` slots
pub fn winner_index<R: RandomnessSource + ?Sized>(
    source: &R,
    player_count: usize,
) -> Result<usize, LotteryError> {
    if player_count == 0 {
        return Err(LotteryError::EmptyRound);
    }

    let index = source.random_word() % player_count as u64;
    Ok(index as usize)
}
