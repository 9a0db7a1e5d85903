use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use solana_program::{
    msg,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};

use crate::{
    constants::FIRST_REQUEST_ID,
    error::LotteryError,
    randomness::{RandomnessOracle, RandomnessRequest},
};

/// On-chain endpoint of the randomness service. Requests are published as
/// log events; the queue authority answers them with `FulfillRandomWords`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleQueue {
    pub is_initialized: bool,
    /// Only signer allowed to deliver random words
    pub authority: Pubkey,
    /// Id the next request will receive
    pub next_request_id: u64,
}

impl OracleQueue {
    pub fn new(authority: Pubkey) -> Self {
        Self {
            is_initialized: true,
            authority,
            next_request_id: FIRST_REQUEST_ID,
        }
    }
}

impl RandomnessOracle for OracleQueue {
    fn request_random_words(&mut self, request: &RandomnessRequest) -> Result<u64, LotteryError> {
        if !self.is_initialized {
            msg!("Oracle queue is not initialized");
            return Err(LotteryError::InvalidOracleQueue);
        }

        let request_id = self.next_request_id;
        self.next_request_id = request_id
            .checked_add(1)
            .ok_or(LotteryError::Overflow)?;

        msg!(
            "Queued randomness request {} for round {} ({} words, {} confirmations)",
            request_id,
            request.round_id,
            request.params.num_words,
            request.params.request_confirmations
        );
        Ok(request_id)
    }
}

impl Sealed for OracleQueue {}

impl IsInitialized for OracleQueue {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for OracleQueue {
    const LEN: usize = 1 + 32 + 8;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, OracleQueue::LEN];
        let (is_initialized, authority, next_request_id) = array_refs![src, 1, 32, 8];

        let is_initialized = match is_initialized[0] {
            0 => false,
            1 => true,
            _ => return Err(ProgramError::InvalidAccountData),
        };

        Ok(OracleQueue {
            is_initialized,
            authority: Pubkey::new_from_array(*authority),
            next_request_id: u64::from_le_bytes(*next_request_id),
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, OracleQueue::LEN];
        let (is_initialized_dst, authority_dst, next_request_id_dst) =
            mut_array_refs![dst, 1, 32, 8];

        is_initialized_dst[0] = self.is_initialized as u8;
        authority_dst.copy_from_slice(self.authority.as_ref());
        *next_request_id_dst = self.next_request_id.to_le_bytes();
    }
}
