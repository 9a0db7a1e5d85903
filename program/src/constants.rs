// PDA seeds
pub const LOTTERY_SEED: &[u8] = b"lottery";
pub const ORACLE_QUEUE_SEED: &[u8] = b"oracle-queue";

/// Random words requested per round; only the first one is consumed.
pub const NUM_WORDS: u32 = 1;

/// Prefix of every structured event log line.
pub const EVENT_LOG_PREFIX: &[u8] = b"lottery-event";

/// First request id handed out by a fresh oracle queue.
pub const FIRST_REQUEST_ID: u64 = 1;

/// First round of a freshly initialized lottery.
pub const FIRST_ROUND_ID: u64 = 1;
