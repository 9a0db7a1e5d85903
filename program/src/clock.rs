use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::{Clock, UnixTimestamp},
    program_error::ProgramError,
    sysvar::Sysvar,
};

/// Source of the current time.
pub trait TimeSource {
    fn now(&self) -> Result<UnixTimestamp, ProgramError>;
}

/// Reads the `Clock` sysvar.
pub struct SysvarTime;

impl TimeSource for SysvarTime {
    fn now(&self) -> Result<UnixTimestamp, ProgramError> {
        Ok(Clock::get()?.unix_timestamp)
    }
}

/// Tracks when the current round started and how long it must stay open.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundClock {
    pub started_at: UnixTimestamp,
    /// Seconds that must elapse before the round may close
    pub interval: i64,
}

impl RoundClock {
    pub fn new(started_at: UnixTimestamp, interval: i64) -> Self {
        Self {
            started_at,
            interval,
        }
    }

    /// Seconds since the round started. A clock that reads earlier than the
    /// start yields a negative value, which never satisfies the interval.
    pub fn elapsed(&self, now: UnixTimestamp) -> i64 {
        now.saturating_sub(self.started_at)
    }

    pub fn interval_elapsed(&self, now: UnixTimestamp) -> bool {
        self.elapsed(now) >= self.interval
    }

    pub(crate) fn restart(&mut self, now: UnixTimestamp) {
        self.started_at = now;
    }
}
