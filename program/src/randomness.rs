use borsh::{BorshDeserialize, BorshSerialize};

use crate::error::LotteryError;

/// A 256-bit random word as delivered by the oracle, big-endian.
pub type RandomWord = [u8; 32];

/// Widens a `u64` into a big-endian random word.
pub fn word_from_u64(value: u64) -> RandomWord {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Parameters the oracle must honour when serving a request.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomnessParams {
    /// Gas lane / key the oracle signs with
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    /// Slots the oracle waits before answering
    pub request_confirmations: u16,
    /// Compute budget reserved for the fulfillment transaction
    pub callback_compute_limit: u32,
    pub num_words: u32,
}

impl RandomnessParams {
    pub const LEN: usize = 32 + 8 + 2 + 4 + 4;
}

/// One outbound randomness request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomnessRequest {
    pub round_id: u64,
    pub params: RandomnessParams,
}

/// The external randomness service, seen from the lottery.
pub trait RandomnessOracle {
    /// Submits a request and returns the identifier the fulfillment will carry.
    fn request_random_words(&mut self, request: &RandomnessRequest) -> Result<u64, LotteryError>;
}

/// Correlates an in-flight request with the round that issued it.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    pub request_id: u64,
    pub round_id: u64,
}

impl PendingRequest {
    pub const LEN: usize = 8 + 8;
}

/// Holds at most one outstanding request and matches fulfillments against it.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RandomnessGateway {
    pub pending: Option<PendingRequest>,
}

impl RandomnessGateway {
    pub const LEN: usize = 1 + PendingRequest::LEN;

    /// Issues one request for `round_id` and records it as pending. Fails
    /// without recording anything if a request is already outstanding or the
    /// oracle refuses.
    pub fn request<O: RandomnessOracle>(
        &mut self,
        oracle: &mut O,
        round_id: u64,
        params: RandomnessParams,
    ) -> Result<PendingRequest, LotteryError> {
        if self.is_pending() {
            return Err(LotteryError::UpkeepNotNeeded);
        }

        let request_id = oracle.request_random_words(&RandomnessRequest { round_id, params })?;
        let pending = PendingRequest {
            request_id,
            round_id,
        };
        self.pending = Some(pending);
        Ok(pending)
    }

    /// Returns the pending request iff `request_id` is the outstanding one for
    /// `round_id`. Does not consume it.
    pub fn matching(&self, request_id: u64, round_id: u64) -> Result<PendingRequest, LotteryError> {
        match self.pending {
            Some(pending) if pending.request_id == request_id && pending.round_id == round_id => {
                Ok(pending)
            }
            _ => Err(LotteryError::UnknownRequest),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn clear(&mut self) {
        self.pending = None;
    }
}
