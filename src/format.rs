const MS_PER_SEC: u64 = 1_000;
const MS_PER_HOUR: u64 = 3_600_000;

/// Render a millisecond duration as a clock string.
///
/// Under one hour the format is `M:SS`, from one hour on it is `H:MM:SS`.
/// Partial seconds are truncated.
pub fn format_duration(ms: u64) -> String {
    let total_secs = ms / MS_PER_SEC;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;

    if ms >= MS_PER_HOUR {
        let hours = total_secs / 3600;
        format!("{hours}:{mins:02}:{secs:02}")
    } else {
        let mins = total_secs / 60;
        format!("{mins}:{secs:02}")
    }
}
