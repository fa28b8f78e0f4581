/// Task and event channels are sized to `workers * CHANNEL_CAPACITY_MULTIPLIER`.
pub const CHANNEL_CAPACITY_MULTIPLIER: usize = 4;

/// Floor for channel capacity regardless of worker count.
pub const MIN_CHANNEL_CAPACITY: usize = 8;

/// A flush event is sent to the writer after this many dispatched archives,
/// so long runs hit disk incrementally.
pub const FLUSH_DISPATCH_INTERVAL: u64 = 16;
