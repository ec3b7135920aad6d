//! Per-segment acceptance tests and keystroke accumulation.

use super::parts::Segment;

/// Outcome of feeding one typed character into a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keystroke {
    /// The segment now holds this value.
    Accepted(u32),
    /// The keystroke was suppressed; the segment is unchanged.
    Rejected,
}

fn max_digits(segment: Segment) -> usize {
    match segment {
        Segment::Milliseconds => 3,
        _ => 2,
    }
}

/// Tests whether a decimal string is an acceptable value for a segment.
///
/// Hour bounds depend on the clock mode: 0-23 in 24-hour mode, 1-12 in
/// 12-hour mode (`"0"` and `"00"` are invalid there). Minutes and seconds
/// accept 0-59 in one or two digits, milliseconds 0-999 in up to three.
/// Leading zeros are allowed everywhere.
///
/// # Examples
///
/// ```
/// use tessera_time_field::time_field::{Segment, is_valid_segment};
///
/// assert!(is_valid_segment("09", Segment::Hours, false));
/// assert!(!is_valid_segment("24", Segment::Hours, false));
/// assert!(!is_valid_segment("0", Segment::Hours, true));
/// assert!(is_valid_segment("999", Segment::Milliseconds, false));
/// ```
pub fn is_valid_segment(text: &str, segment: Segment, use_12_hour_clock: bool) -> bool {
    if text.is_empty() || text.len() > max_digits(segment) {
        return false;
    }
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let Ok(value) = text.parse::<u32>() else {
        return false;
    };
    match segment {
        Segment::Hours if use_12_hour_clock => (1..=12).contains(&value),
        Segment::Hours => value <= 23,
        Segment::Minutes | Segment::Seconds => value <= 59,
        Segment::Milliseconds => value <= 999,
        Segment::Meridiem => false,
    }
}

/// The (min, max) range of a segment, used when stepping from an absent
/// value and as accessibility range metadata.
pub fn segment_bounds(segment: Segment, use_12_hour_clock: bool) -> (u32, u32) {
    match segment {
        Segment::Hours => (1, if use_12_hour_clock { 12 } else { 23 }),
        Segment::Minutes | Segment::Seconds => (0, 59),
        Segment::Milliseconds => (0, 999),
        Segment::Meridiem => (0, 1),
    }
}

/// Folds a typed character into the segment's buffered value.
///
/// The buffered numeric string is the decimal rendering of `current`. The
/// combination of buffer and new character wins when it is acceptable
/// (typing "1" then "2" into hours yields 12); otherwise the character
/// alone restarts the buffer when acceptable on its own (typing "9" then
/// "5" into minutes yields 5); otherwise the keystroke is rejected.
pub fn accumulate_digit(
    current: Option<u32>,
    typed: char,
    segment: Segment,
    use_12_hour_clock: bool,
) -> Keystroke {
    if !typed.is_ascii_digit() {
        return Keystroke::Rejected;
    }
    if let Some(current) = current {
        let combined = format!("{current}{typed}");
        if is_valid_segment(&combined, segment, use_12_hour_clock)
            && let Ok(value) = combined.parse()
        {
            return Keystroke::Accepted(value);
        }
    }
    let single = typed.to_string();
    if is_valid_segment(&single, segment, use_12_hour_clock)
        && let Ok(value) = single.parse()
    {
        return Keystroke::Accepted(value);
    }
    Keystroke::Rejected
}
