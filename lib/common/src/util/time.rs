use std::{fmt::Write, time::Duration};

/// Pretty-print the elapsed time (used in progress bars)
pub fn elapsed_subsec(state: &indicatif::ProgressState, writer: &mut dyn Write) {
    let seconds = state.elapsed().as_secs();
    let sub_seconds = (state.elapsed().as_millis() % 1000) / 100;
    let _ = write!(writer, "{}.{}s", seconds, sub_seconds);
}

/// Pretty-print the elapsed time (used in logs and diagnostics), in the
/// largest unit that keeps the value at or above one.
pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs_f64();
    if duration < Duration::from_millis(1) {
        format!("{:.3}μs", duration.as_nanos() as f64 / 1_000.0)
    } else if duration < Duration::from_secs(1) {
        format!("{:.3}ms", seconds * 1_000.0)
    } else if duration < Duration::from_secs(60) {
        format!("{:.3}s", seconds)
    } else if duration < Duration::from_secs(3_600) {
        format!("{:.3}m", seconds / 60.0)
    } else if duration < Duration::from_secs(86_400) {
        format!("{:.3}h", seconds / 3_600.0)
    } else {
        format!("{:.3}d", seconds / 86_400.0)
    }
}
