//! Host-provided native functions (spec.md §6: "host registers globals as
//! closures over a host function"). Baseline registers only `clock()`.

use loxi_core::Value;

/// Seconds since the Unix epoch, as a baseline stand-in for "seconds since
/// process start" (spec.md §6). Native functions cannot produce runtime
/// errors in this baseline, so this never fails: a clock read that somehow
/// predates the epoch just reports `0.0`.
pub fn clock(_args: &[Value]) -> Value {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    Value::Number(now.as_secs_f64())
}
