/// Monotonic millisecond counter supplied by the runtime environment.
///
/// Only used for conversion-latency comparisons, so no wall-clock semantics
/// are required. The counter must never decrease.
pub trait Clock {
    fn now_ms(&mut self) -> u64;
}

/// Platform tick functions can be passed directly, e.g. `|| millis()`.
impl<F: FnMut() -> u64> Clock for F {
    fn now_ms(&mut self) -> u64 {
        self()
    }
}
