/// The send side's single retransmission countdown.
///
/// Exactly one of these exists per connection, armed for the oldest
/// unacknowledged segment. Time is whatever the owner says it is: the timer
/// only moves when `tick` hands it an elapsed-milliseconds delta, and expiry
/// latches until the next `start`.
#[derive(Debug)]
pub(crate) enum RetxTimer {
    Closed,
    Running { timeout: u64, elapsed: u64 },
    Expired,
}

impl RetxTimer {
    /// (Re)arm with a fresh countdown; resets any accumulated time.
    pub(crate) fn start(&mut self, timeout: u64) {
        *self = RetxTimer::Running {
            timeout,
            elapsed: 0,
        };
    }

    pub(crate) fn stop(&mut self) {
        *self = RetxTimer::Closed;
    }

    pub(crate) fn tick(&mut self, ms: u64) {
        if let RetxTimer::Running { timeout, elapsed } = self {
            *elapsed += ms;
            if *elapsed >= *timeout {
                *self = RetxTimer::Expired;
            }
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        matches!(self, RetxTimer::Closed)
    }

    pub(crate) fn is_expired(&self) -> bool {
        matches!(self, RetxTimer::Expired)
    }
}
