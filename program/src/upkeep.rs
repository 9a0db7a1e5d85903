use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::clock::UnixTimestamp;

use crate::{
    ledger::EntryLedger,
    state::{LotteryState, Round},
};

/// Why the round can or cannot close right now. When several conditions fail
/// the first one in declaration order is reported.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpkeepReason {
    Ready,
    NotOpen,
    IntervalNotElapsed,
    NoPlayers,
    EmptyPool,
}

/// Answer to a keeper poll, published as program return data.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct UpkeepStatus {
    pub upkeep_needed: bool,
    pub reason: UpkeepReason,
    pub perform_data: Vec<u8>,
}

/// The close predicate: open, interval elapsed, pool funded and at least one
/// player. Reads only.
pub fn evaluate(round: &Round, ledger: &EntryLedger, now: UnixTimestamp) -> UpkeepReason {
    if round.phase != LotteryState::Open {
        UpkeepReason::NotOpen
    } else if !round.clock.interval_elapsed(now) {
        UpkeepReason::IntervalNotElapsed
    } else if ledger.is_empty() {
        UpkeepReason::NoPlayers
    } else if ledger.pool == 0 {
        UpkeepReason::EmptyPool
    } else {
        UpkeepReason::Ready
    }
}

pub fn check_upkeep(
    round: &Round,
    ledger: &EntryLedger,
    now: UnixTimestamp,
    check_data: &[u8],
) -> UpkeepStatus {
    let reason = evaluate(round, ledger, now);
    UpkeepStatus {
        upkeep_needed: reason == UpkeepReason::Ready,
        reason,
        perform_data: check_data.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::RoundClock;
    use solana_program::pubkey::Pubkey;

    const FEE: u64 = 10_000_000;

    fn round() -> Round {
        Round {
            round_id: 1,
            phase: LotteryState::Open,
            clock: RoundClock::new(1_000, 30),
            entrance_fee: FEE,
        }
    }

    fn funded_ledger() -> EntryLedger {
        EntryLedger {
            players: vec![Pubkey::new_unique()],
            pool: FEE,
        }
    }

    #[test]
    fn test_ready_when_all_conditions_hold() {
        let status = check_upkeep(&round(), &funded_ledger(), 1_031, b"");
        assert!(status.upkeep_needed);
        assert_eq!(status.reason, UpkeepReason::Ready);
    }

    #[test]
    fn test_not_ready_before_interval() {
        assert_eq!(
            evaluate(&round(), &funded_ledger(), 1_029),
            UpkeepReason::IntervalNotElapsed
        );
        assert_eq!(evaluate(&round(), &funded_ledger(), 1_030), UpkeepReason::Ready);
    }

    #[test]
    fn test_not_ready_without_players() {
        assert_eq!(
            evaluate(&round(), &EntryLedger::default(), 1_031),
            UpkeepReason::NoPlayers
        );
    }

    #[test]
    fn test_not_ready_with_empty_pool() {
        let ledger = EntryLedger {
            players: vec![Pubkey::new_unique()],
            pool: 0,
        };
        assert_eq!(evaluate(&round(), &ledger, 1_031), UpkeepReason::EmptyPool);
    }

    #[test]
    fn test_not_ready_while_calculating() {
        let mut round = round();
        round.phase = LotteryState::Calculating;
        let status = check_upkeep(&round, &funded_ledger(), 1_031, b"");
        assert!(!status.upkeep_needed);
        assert_eq!(status.reason, UpkeepReason::NotOpen);
    }

    #[test]
    fn test_perform_data_echoes_check_data() {
        let status = check_upkeep(&round(), &funded_ledger(), 1_031, &[1, 2, 3]);
        assert_eq!(status.perform_data, vec![1, 2, 3]);
    }
}
