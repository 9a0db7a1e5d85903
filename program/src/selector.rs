use crate::{error::LotteryError, randomness::RandomWord};

/// Maps a random word onto a participant index: `word mod participant_count`,
/// computed exactly over all 256 bits.
///
/// The result carries a slight modulo bias whenever `participant_count` does
/// not divide 2^256. That bias is accepted.
pub fn pick(random_word: &RandomWord, participant_count: u64) -> Result<u64, LotteryError> {
    if participant_count == 0 {
        return Err(LotteryError::NoParticipants);
    }

    let modulus = participant_count as u128;
    let remainder = random_word
        .iter()
        .fold(0u128, |acc, byte| ((acc << 8) | *byte as u128) % modulus);

    Ok(remainder as u64)
}
