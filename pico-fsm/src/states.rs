/// Verifier-side FSM states (spec.md section 4.7). `Invalid` is the state
/// before `start()` is called and after `stop()`/teardown resets the
/// machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsmVerifierState {
    Invalid,
    Connect,
    Start,
    ServiceAuth,
    PicoAuth,
    Status,
    Authenticated,
    AuthFailed,
    ContStartService,
    ContStartPico,
    PicoReauth,
    ServiceReauth,
    Fin,
    Error,
}

/// Prover-side FSM states (spec.md section 4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsmProverState {
    Invalid,
    Start,
    ServiceAuth,
    PicoAuth,
    Status,
    Authenticated,
    ContStartPico,
    ContStartService,
    PicoReauth,
    ServiceReauth,
    Fin,
    Error,
}
