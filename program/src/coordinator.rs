use solana_program::{msg, program_error::ProgramError, pubkey::Pubkey};

use crate::{
    clock::TimeSource,
    error::LotteryError,
    events::{EventSink, LotteryEvent},
    randomness::{PendingRequest, RandomWord, RandomnessOracle},
    selector,
    state::{Lottery, LotteryState},
    upkeep::{self, UpkeepReason, UpkeepStatus},
};

/// Moves the pooled prize to the winner.
pub trait PrizeTransfer {
    fn transfer(&mut self, winner: &Pubkey, amount: u64) -> Result<(), LotteryError>;
}

/// Owns the round state machine: OPEN -> CALCULATING -> OPEN.
///
/// Every entry point re-validates its precondition against the state it is
/// handed, and leaves that state untouched when it returns an error.
pub struct RoundCoordinator<'a, T: TimeSource, E: EventSink> {
    lottery: &'a mut Lottery,
    time: &'a T,
    events: &'a mut E,
}

impl<'a, T: TimeSource, E: EventSink> RoundCoordinator<'a, T, E> {
    pub fn new(lottery: &'a mut Lottery, time: &'a T, events: &'a mut E) -> Self {
        Self {
            lottery,
            time,
            events,
        }
    }

    /// Records a paid entry for `player`.
    pub fn enter(&mut self, player: Pubkey, value: u64) -> Result<(), ProgramError> {
        let lottery = &mut *self.lottery;
        if lottery.round.phase == LotteryState::Open && !lottery.has_capacity() {
            return Err(LotteryError::LotteryFull.into());
        }

        lottery.ledger.enter(
            lottery.round.phase,
            lottery.round.entrance_fee,
            player,
            value,
        )?;

        self.events.emit(LotteryEvent::Entered {
            round_id: lottery.round.round_id,
            player,
            amount: value,
        });
        Ok(())
    }

    /// Read-only keeper poll.
    pub fn check_upkeep(&self, check_data: &[u8]) -> Result<UpkeepStatus, ProgramError> {
        let now = self.time.now()?;
        Ok(upkeep::check_upkeep(
            &self.lottery.round,
            &self.lottery.ledger,
            now,
            check_data,
        ))
    }

    /// Starts closing the round: re-checks the upkeep predicate, requests
    /// randomness and moves to CALCULATING. A refused request leaves the round
    /// OPEN.
    pub fn perform_upkeep<O: RandomnessOracle>(
        &mut self,
        oracle: &mut O,
        perform_data: &[u8],
    ) -> Result<PendingRequest, ProgramError> {
        let now = self.time.now()?;
        let lottery = &mut *self.lottery;

        let reason = upkeep::evaluate(&lottery.round, &lottery.ledger, now);
        if reason != UpkeepReason::Ready {
            msg!(
                "Upkeep not needed: {:?}, balance={}, players={}, phase={:?}",
                reason,
                lottery.ledger.pool,
                lottery.ledger.num_players(),
                lottery.round.phase
            );
            return Err(LotteryError::UpkeepNotNeeded.into());
        }
        if !perform_data.is_empty() {
            msg!("Perform data: {} bytes", perform_data.len());
        }

        let pending = lottery.gateway.request(
            oracle,
            lottery.round.round_id,
            lottery.randomness_params,
        )?;
        lottery.round.phase = LotteryState::Calculating;

        let params = lottery.randomness_params;
        self.events.emit(LotteryEvent::RandomnessRequested {
            round_id: pending.round_id,
            request_id: pending.request_id,
            key_hash: params.key_hash,
            subscription_id: params.subscription_id,
            request_confirmations: params.request_confirmations,
            callback_compute_limit: params.callback_compute_limit,
            num_words: params.num_words,
        });
        Ok(pending)
    }

    /// Oracle callback. Picks the winner from the first word, pays out the
    /// whole pool, then resets the ledger and clock and reopens the round.
    /// Nothing is mutated unless the transfer succeeds.
    pub fn fulfill_random_words<P: PrizeTransfer>(
        &mut self,
        payout: &mut P,
        request_id: u64,
        random_words: &[RandomWord],
    ) -> Result<Pubkey, ProgramError> {
        let lottery = &mut *self.lottery;

        let pending = lottery
            .gateway
            .matching(request_id, lottery.round.round_id)?;
        if lottery.round.phase != LotteryState::Calculating {
            return Err(LotteryError::UnknownRequest.into());
        }
        let random_word = random_words
            .first()
            .ok_or(LotteryError::MissingRandomWords)?;

        let index = selector::pick(random_word, lottery.ledger.num_players())?;
        let winner = *lottery
            .ledger
            .player(index)
            .ok_or(LotteryError::NoParticipants)?;
        let prize = lottery.ledger.pool;
        let next_round_id = pending
            .round_id
            .checked_add(1)
            .ok_or(LotteryError::Overflow)?;
        let now = self.time.now()?;

        msg!(
            "Request {} fulfilled: winner index {} of {}",
            request_id,
            index,
            lottery.ledger.num_players()
        );
        payout.transfer(&winner, prize)?;

        lottery.gateway.clear();
        lottery.ledger.reset();
        lottery.recent_winner = Some(winner);
        lottery.round.round_id = next_round_id;
        lottery.round.clock.restart(now);
        lottery.round.phase = LotteryState::Open;

        self.events.emit(LotteryEvent::WinnerPicked {
            round_id: pending.round_id,
            winner,
            prize,
        });
        Ok(winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        randomness::{
            tests::{params, MockOracle},
            word_from_u64,
        },
        state::LotteryConfig,
    };
    use solana_program::clock::UnixTimestamp;
    use std::cell::Cell;

    const FEE: u64 = 10_000_000;
    const INTERVAL: i64 = 30;
    const START: UnixTimestamp = 1_000;

    struct FixedTime(Cell<UnixTimestamp>);

    impl FixedTime {
        fn at(now: UnixTimestamp) -> Self {
            Self(Cell::new(now))
        }

        fn advance(&self, seconds: i64) {
            self.0.set(self.0.get() + seconds);
        }
    }

    impl TimeSource for FixedTime {
        fn now(&self) -> Result<UnixTimestamp, ProgramError> {
            Ok(self.0.get())
        }
    }

    #[derive(Default)]
    struct RecordingTransfer {
        transfers: Vec<(Pubkey, u64)>,
        fail: bool,
    }

    impl PrizeTransfer for RecordingTransfer {
        fn transfer(&mut self, winner: &Pubkey, amount: u64) -> Result<(), LotteryError> {
            if self.fail {
                return Err(LotteryError::TransferFailed);
            }
            self.transfers.push((*winner, amount));
            Ok(())
        }
    }

    fn new_lottery(max_players: u32) -> Lottery {
        let config = LotteryConfig {
            entrance_fee: FEE,
            interval: INTERVAL,
            max_players,
            randomness_params: params(),
        };
        Lottery::new(255, Pubkey::new_unique(), Pubkey::new_unique(), &config, START)
    }

    fn enter_all(lottery: &mut Lottery, time: &FixedTime, players: &[Pubkey]) {
        let mut events = Vec::new();
        let mut coordinator = RoundCoordinator::new(lottery, time, &mut events);
        for player in players {
            coordinator.enter(*player, FEE).unwrap();
        }
    }

    /// Enters `players`, elapses the interval and closes the round.
    fn calculating_lottery(players: &[Pubkey]) -> (Lottery, FixedTime, PendingRequest) {
        let mut lottery = new_lottery(16);
        let time = FixedTime::at(START);
        enter_all(&mut lottery, &time, players);
        time.advance(INTERVAL + 1);

        let mut events = Vec::new();
        let mut oracle = MockOracle::new();
        let pending = RoundCoordinator::new(&mut lottery, &time, &mut events)
            .perform_upkeep(&mut oracle, &[])
            .unwrap();
        (lottery, time, pending)
    }

    #[test]
    fn test_enter_emits_and_accumulates() {
        let mut lottery = new_lottery(16);
        let time = FixedTime::at(START);
        let mut events = Vec::new();
        let players: Vec<Pubkey> = (0..3).map(|_| Pubkey::new_unique()).collect();

        let mut coordinator = RoundCoordinator::new(&mut lottery, &time, &mut events);
        for player in &players {
            coordinator.enter(*player, FEE).unwrap();
        }

        assert_eq!(lottery.get_pool(), 3 * FEE);
        assert_eq!(lottery.get_num_players(), 3);
        assert_eq!(lottery.get_player(2), Some(players[2]));
        assert_eq!(
            events[0],
            LotteryEvent::Entered {
                round_id: 1,
                player: players[0],
                amount: FEE,
            }
        );
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn test_enter_low_value_rejected() {
        let mut lottery = new_lottery(16);
        let time = FixedTime::at(START);
        let mut events = Vec::new();

        let result = RoundCoordinator::new(&mut lottery, &time, &mut events)
            .enter(Pubkey::new_unique(), FEE / 10);
        assert_eq!(result, Err(LotteryError::InsufficientValue.into()));
        assert_eq!(lottery.get_num_players(), 0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_enter_rejected_when_full() {
        let mut lottery = new_lottery(1);
        let time = FixedTime::at(START);
        enter_all(&mut lottery, &time, &[Pubkey::new_unique()]);

        let mut events = Vec::new();
        let result = RoundCoordinator::new(&mut lottery, &time, &mut events)
            .enter(Pubkey::new_unique(), FEE);
        assert_eq!(result, Err(LotteryError::LotteryFull.into()));
        assert_eq!(lottery.get_pool(), FEE);
    }

    #[test]
    fn test_enter_while_calculating_rejected() {
        let (mut lottery, time, _) = calculating_lottery(&[Pubkey::new_unique()]);
        let before = lottery.clone();
        let mut events = Vec::new();

        let result = RoundCoordinator::new(&mut lottery, &time, &mut events)
            .enter(Pubkey::new_unique(), FEE);
        assert_eq!(result, Err(LotteryError::RoundNotOpen.into()));
        assert_eq!(lottery, before);
        assert!(events.is_empty());
    }

    #[test]
    fn test_check_upkeep_never_mutates() {
        let mut lottery = new_lottery(16);
        let time = FixedTime::at(START);
        enter_all(&mut lottery, &time, &[Pubkey::new_unique()]);
        time.advance(INTERVAL);
        let before = lottery.clone();

        let mut events = Vec::new();
        let coordinator = RoundCoordinator::new(&mut lottery, &time, &mut events);
        for _ in 0..10 {
            assert!(coordinator.check_upkeep(b"").unwrap().upkeep_needed);
        }
        assert_eq!(lottery, before);
        assert!(events.is_empty());
    }

    #[test]
    fn test_perform_upkeep_refused_when_not_needed() {
        let mut lottery = new_lottery(16);
        let time = FixedTime::at(START);
        enter_all(&mut lottery, &time, &[Pubkey::new_unique()]);
        let before = lottery.clone();

        let mut events = Vec::new();
        let mut oracle = MockOracle::new();
        let result = RoundCoordinator::new(&mut lottery, &time, &mut events)
            .perform_upkeep(&mut oracle, &[]);

        assert_eq!(result, Err(LotteryError::UpkeepNotNeeded.into()));
        assert_eq!(lottery, before);
        assert!(oracle.requests.is_empty());
    }

    #[test]
    fn test_perform_upkeep_oracle_failure_stays_open() {
        let mut lottery = new_lottery(16);
        let time = FixedTime::at(START);
        enter_all(&mut lottery, &time, &[Pubkey::new_unique()]);
        time.advance(INTERVAL);
        let before = lottery.clone();

        let mut events = Vec::new();
        let mut oracle = MockOracle::new();
        oracle.exhausted = true;
        let result = RoundCoordinator::new(&mut lottery, &time, &mut events)
            .perform_upkeep(&mut oracle, &[]);

        assert!(result.is_err());
        assert_eq!(lottery, before);
        assert_eq!(lottery.get_lottery_state(), LotteryState::Open);
        assert!(events.is_empty());
    }

    #[test]
    fn test_perform_upkeep_moves_to_calculating() {
        let mut lottery = new_lottery(16);
        let time = FixedTime::at(START);
        enter_all(&mut lottery, &time, &[Pubkey::new_unique()]);
        time.advance(INTERVAL + 1);

        let mut events = Vec::new();
        let mut oracle = MockOracle::new();
        let pending = RoundCoordinator::new(&mut lottery, &time, &mut events)
            .perform_upkeep(&mut oracle, &[])
            .unwrap();

        assert_eq!(pending.request_id, 1);
        assert_eq!(lottery.get_lottery_state(), LotteryState::Calculating);
        assert_eq!(lottery.get_pending_request(), Some(pending));
        assert_eq!(oracle.requests.len(), 1);
        assert!(matches!(
            events[0],
            LotteryEvent::RandomnessRequested {
                request_id: 1,
                round_id: 1,
                num_words: 1,
                ..
            }
        ));

        // a second close attempt finds the predicate false
        let mut events = Vec::new();
        let result = RoundCoordinator::new(&mut lottery, &time, &mut events)
            .perform_upkeep(&mut oracle, &[]);
        assert_eq!(result, Err(LotteryError::UpkeepNotNeeded.into()));
        assert_eq!(oracle.requests.len(), 1);
    }

    #[test]
    fn test_fulfill_unknown_request_rejected() {
        let (mut lottery, time, pending) = calculating_lottery(&[Pubkey::new_unique()]);
        let before = lottery.clone();
        let mut events = Vec::new();
        let mut payout = RecordingTransfer::default();

        let result = RoundCoordinator::new(&mut lottery, &time, &mut events).fulfill_random_words(
            &mut payout,
            pending.request_id + 1,
            &[word_from_u64(7)],
        );
        assert_eq!(result, Err(LotteryError::UnknownRequest.into()));
        assert_eq!(lottery, before);
        assert!(payout.transfers.is_empty());
    }

    #[test]
    fn test_fulfill_without_words_rejected() {
        let (mut lottery, time, pending) = calculating_lottery(&[Pubkey::new_unique()]);
        let before = lottery.clone();
        let mut events = Vec::new();
        let mut payout = RecordingTransfer::default();

        let result = RoundCoordinator::new(&mut lottery, &time, &mut events).fulfill_random_words(
            &mut payout,
            pending.request_id,
            &[],
        );
        assert_eq!(result, Err(LotteryError::MissingRandomWords.into()));
        assert_eq!(lottery, before);
    }

    #[test]
    fn test_fulfill_picks_winner_and_resets() {
        let players: Vec<Pubkey> = (0..4).map(|_| Pubkey::new_unique()).collect();
        let (mut lottery, time, pending) = calculating_lottery(&players);
        time.advance(5);
        let mut events = Vec::new();
        let mut payout = RecordingTransfer::default();

        let winner = RoundCoordinator::new(&mut lottery, &time, &mut events)
            .fulfill_random_words(&mut payout, pending.request_id, &[word_from_u64(10)])
            .unwrap();

        // 10 mod 4 = 2
        assert_eq!(winner, players[2]);
        assert_eq!(payout.transfers, vec![(players[2], 4 * FEE)]);
        assert_eq!(lottery.get_recent_winner(), Some(players[2]));
        assert_eq!(lottery.get_pool(), 0);
        assert_eq!(lottery.get_num_players(), 0);
        assert_eq!(lottery.get_lottery_state(), LotteryState::Open);
        assert_eq!(lottery.get_pending_request(), None);
        assert_eq!(lottery.get_round_id(), 2);
        assert_eq!(lottery.get_last_timestamp(), START + INTERVAL + 1 + 5);
        assert_eq!(
            events,
            vec![LotteryEvent::WinnerPicked {
                round_id: 1,
                winner: players[2],
                prize: 4 * FEE,
            }]
        );
    }

    #[test]
    fn test_transfer_failure_keeps_round_calculating() {
        let (mut lottery, time, pending) = calculating_lottery(&[Pubkey::new_unique()]);
        let before = lottery.clone();
        let mut events = Vec::new();
        let mut payout = RecordingTransfer {
            fail: true,
            ..Default::default()
        };

        let result = RoundCoordinator::new(&mut lottery, &time, &mut events).fulfill_random_words(
            &mut payout,
            pending.request_id,
            &[word_from_u64(7)],
        );
        assert_eq!(result, Err(LotteryError::TransferFailed.into()));
        assert_eq!(lottery, before);
        assert_eq!(lottery.get_lottery_state(), LotteryState::Calculating);
        assert!(events.is_empty());
    }

    #[test]
    fn test_emptied_ledger_fails_closed() {
        let (mut lottery, time, pending) = calculating_lottery(&[Pubkey::new_unique()]);
        lottery.ledger.players.clear();
        let mut events = Vec::new();
        let mut payout = RecordingTransfer::default();

        let result = RoundCoordinator::new(&mut lottery, &time, &mut events).fulfill_random_words(
            &mut payout,
            pending.request_id,
            &[word_from_u64(7)],
        );
        assert_eq!(result, Err(LotteryError::NoParticipants.into()));
        assert_eq!(lottery.get_lottery_state(), LotteryState::Calculating);
        assert!(payout.transfers.is_empty());
    }

    #[test]
    fn test_single_player_round_end_to_end() {
        let player = Pubkey::new_unique();
        let mut lottery = new_lottery(16);
        let time = FixedTime::at(START);
        let mut events = Vec::new();
        let mut oracle = MockOracle::new();
        let mut payout = RecordingTransfer::default();

        let mut coordinator = RoundCoordinator::new(&mut lottery, &time, &mut events);
        coordinator.enter(player, FEE).unwrap();
        assert!(!coordinator.check_upkeep(b"").unwrap().upkeep_needed);

        time.advance(INTERVAL);
        assert!(coordinator.check_upkeep(b"").unwrap().upkeep_needed);

        let pending = coordinator.perform_upkeep(&mut oracle, &[]).unwrap();
        assert_eq!(pending.request_id, 1);

        let winner = coordinator
            .fulfill_random_words(&mut payout, 1, &[word_from_u64(7)])
            .unwrap();
        assert_eq!(winner, player);

        let replay = coordinator.fulfill_random_words(&mut payout, 1, &[word_from_u64(7)]);
        assert_eq!(replay, Err(LotteryError::UnknownRequest.into()));

        assert_eq!(payout.transfers, vec![(player, FEE)]);
        assert_eq!(lottery.get_lottery_state(), LotteryState::Open);
        assert_eq!(lottery.get_pool(), 0);
        assert_eq!(events.len(), 3);
    }
}
