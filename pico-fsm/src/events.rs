use std::time::Duration;

/// Events the embedder delivers to a running FSM (spec.md section 4.7/4.8:
/// `connected`, `read(bytes)`, `disconnected`, `timeout`). Anything the FSM
/// doesn't expect in its current state is handled uniformly: move to
/// `Error` and call the embedder's `error()` callback.
#[derive(Debug, Clone)]
pub enum Event {
    Connected,
    Read(Vec<u8>),
    Disconnected,
    Timeout,
}

/// A timer token. Per spec.md section 5, at most one timeout may be
/// pending per FSM; arming a new one logically cancels whichever token was
/// previously armed. The FSM hands the embedder a fresh, strictly
/// increasing token on every `set_timeout` call so an embedder whose
/// `timeout` event arrives after a newer timer was armed can recognize and
/// drop the stale one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerToken(pub u64);

#[derive(Debug, Clone, Copy)]
pub struct ArmedTimeout {
    pub token: TimerToken,
    pub after: Duration,
}
