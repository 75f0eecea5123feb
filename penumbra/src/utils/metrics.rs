/// Runs `f` and, with the `metrics` feature enabled, logs how long it took
/// to record its commands.
///
/// This measures CPU-side time only; the GPU runs the commands later.
#[cfg(feature = "metrics")]
pub fn metric<T>(label: &str, f: impl FnOnce() -> T) -> T {
    use std::time::Instant;

    let started_at = Instant::now();
    let result = f();
    let elapsed = started_at.elapsed();

    log::trace!("{label}: {}", humantime::format_duration(elapsed));

    result
}

#[cfg(not(feature = "metrics"))]
pub fn metric<T>(_: &str, f: impl FnOnce() -> T) -> T {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_result() {
        assert_eq!(4, metric("add", || 2 + 2));
    }
}
