use std::time::Duration;

/// The blocking rendezvous-channel abstraction the thread-per-session
/// driver reads and writes through (spec.md section 6). Each call may
/// block: `read_message` up to the last-armed timeout, `write_message` on
/// transport flush. A timed-out read returns `Ok(None)` rather than an
/// error — timing out is an expected outcome of the continuous-auth loop,
/// not a transport failure — while every other kind of I/O failure is a
/// genuine `Err`.
pub trait Channel {
    fn open(&mut self) -> std::io::Result<()>;
    fn close(&mut self) -> std::io::Result<()>;

    /// Blocks for up to the last `set_timeout` duration waiting for one
    /// complete wire message. Returns `Ok(None)` on timeout.
    fn read_message(&mut self) -> std::io::Result<Option<Vec<u8>>>;

    /// Blocks until `bytes` has been handed to the transport.
    fn write_message(&mut self, bytes: &[u8]) -> std::io::Result<()>;

    /// Sets the timeout applied by the next `read_message` call. A
    /// duration of zero means "expire immediately" (spec.md section 6).
    fn set_timeout(&mut self, timeout: Duration);

    fn get_url(&self) -> String;
}
