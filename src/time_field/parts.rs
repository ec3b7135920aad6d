//! Decomposition of a timestamp into independently editable segments and
//! re-composition of a complete segment record back into a timestamp.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use smallvec::SmallVec;

/// AM/PM half of the day, meaningful in 12-hour display mode only.
///
/// The meridiem always carries a value so a partially entered record can be
/// composed without a separate "meridiem missing" case; it defaults to
/// [`Meridiem::Am`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Meridiem {
    /// Ante meridiem (before noon).
    #[default]
    Am,
    /// Post meridiem (after noon).
    Pm,
}

impl Meridiem {
    /// Returns the opposite half of the day.
    pub fn toggled(self) -> Self {
        match self {
            Meridiem::Am => Meridiem::Pm,
            Meridiem::Pm => Meridiem::Am,
        }
    }

    /// Returns the display label ("AM" / "PM").
    pub fn label(self) -> &'static str {
        match self {
            Meridiem::Am => "AM",
            Meridiem::Pm => "PM",
        }
    }
}

/// The finest time unit the field exposes.
///
/// Precision determines which segments are visible and which must be
/// populated before a record counts as complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimePrecision {
    /// Hours and minutes.
    #[default]
    Minutes,
    /// Hours, minutes and seconds.
    Seconds,
    /// Hours, minutes, seconds and milliseconds.
    Milliseconds,
}

impl TimePrecision {
    /// Whether the seconds segment is part of the record.
    pub fn requires_seconds(self) -> bool {
        matches!(self, TimePrecision::Seconds | TimePrecision::Milliseconds)
    }

    /// Whether the milliseconds segment is part of the record.
    pub fn requires_milliseconds(self) -> bool {
        matches!(self, TimePrecision::Milliseconds)
    }
}

/// One independently editable component of a time value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// Hour of day (1-12 or 0-23 depending on clock mode).
    Hours,
    /// Minute of hour (0-59).
    Minutes,
    /// Second of minute (0-59).
    Seconds,
    /// Millisecond of second (0-999).
    Milliseconds,
    /// AM/PM indicator (12-hour mode only).
    Meridiem,
}

impl Segment {
    pub(crate) fn index(self) -> usize {
        match self {
            Segment::Hours => 0,
            Segment::Minutes => 1,
            Segment::Seconds => 2,
            Segment::Milliseconds => 3,
            Segment::Meridiem => 4,
        }
    }

    /// Returns a short human-readable name for accessibility labels.
    pub fn label(self) -> &'static str {
        match self {
            Segment::Hours => "Hours",
            Segment::Minutes => "Minutes",
            Segment::Seconds => "Seconds",
            Segment::Milliseconds => "Milliseconds",
            Segment::Meridiem => "AM/PM",
        }
    }
}

/// Number of [`Segment`] variants; sizes per-segment storage.
pub(crate) const SEGMENT_COUNT: usize = 5;

/// Display mode of the field: clock convention plus precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeFormat {
    /// Show hours as 1-12 with an AM/PM segment instead of 0-23.
    pub use_12_hour_clock: bool,
    /// The finest unit exposed by the field.
    pub precision: TimePrecision,
}

impl TimeFormat {
    /// Creates a 24-hour format with the given precision.
    pub fn new(precision: TimePrecision) -> Self {
        Self {
            use_12_hour_clock: false,
            precision,
        }
    }

    /// Creates a 12-hour format with the given precision.
    pub fn twelve_hour(precision: TimePrecision) -> Self {
        Self {
            use_12_hour_clock: true,
            precision,
        }
    }

    /// Returns the ordered list of segments this format displays.
    ///
    /// The order is also the keyboard traversal order: hours, minutes, then
    /// seconds and milliseconds as the precision requires, with the meridiem
    /// segment last in 12-hour mode.
    pub fn segments(self) -> SmallVec<[Segment; SEGMENT_COUNT]> {
        let mut segments = SmallVec::new();
        segments.push(Segment::Hours);
        segments.push(Segment::Minutes);
        if self.precision.requires_seconds() {
            segments.push(Segment::Seconds);
        }
        if self.precision.requires_milliseconds() {
            segments.push(Segment::Milliseconds);
        }
        if self.use_12_hour_clock {
            segments.push(Segment::Meridiem);
        }
        segments
    }
}

/// Completeness of a segment record relative to a precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    /// No required segment is populated.
    Empty,
    /// Some, but not all, required segments are populated.
    Partial,
    /// Every required segment is populated; the record can be composed.
    Complete,
}

/// A time value broken into independently nullable segments.
///
/// `None` in a numeric field means "not yet entered". The meridiem always
/// has a value (see [`Meridiem`]).
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use tessera_time_field::time_field::{TimeFormat, TimeParts, TimePrecision};
///
/// let value = NaiveDate::from_ymd_opt(2026, 8, 7)
///     .and_then(|d| d.and_hms_opt(14, 5, 0));
/// let parts = TimeParts::decompose(value, TimeFormat::new(TimePrecision::Minutes));
/// assert_eq!(parts.hours, Some(14));
/// assert_eq!(parts.minutes, Some(5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeParts {
    /// Displayed hour; 1-12 in 12-hour mode, 0-23 otherwise.
    pub hours: Option<u32>,
    /// Minute of hour.
    pub minutes: Option<u32>,
    /// Second of minute.
    pub seconds: Option<u32>,
    /// Millisecond of second.
    pub milliseconds: Option<u32>,
    /// AM/PM half of the day.
    pub meridiem: Meridiem,
}

impl TimeParts {
    /// Breaks an optional timestamp into segments for the given format.
    ///
    /// An absent value yields the all-absent record with meridiem AM. In
    /// 12-hour mode the displayed hour is mapped to 1-12 (calendar hour 0
    /// shows as 12 AM).
    pub fn decompose(value: Option<NaiveDateTime>, format: TimeFormat) -> Self {
        let Some(value) = value else {
            return Self::default();
        };
        let hour = value.hour();
        let meridiem = if hour < 12 { Meridiem::Am } else { Meridiem::Pm };
        let hours = if format.use_12_hour_clock {
            let wrapped = hour % 12;
            if wrapped == 0 { 12 } else { wrapped }
        } else {
            hour
        };
        Self {
            hours: Some(hours),
            minutes: Some(value.minute()),
            seconds: Some(value.second()),
            milliseconds: Some(value.nanosecond() / 1_000_000),
            meridiem,
        }
    }

    /// Reads a numeric segment. Returns `None` for an absent segment and for
    /// [`Segment::Meridiem`], which is not numeric.
    pub fn numeric(&self, segment: Segment) -> Option<u32> {
        match segment {
            Segment::Hours => self.hours,
            Segment::Minutes => self.minutes,
            Segment::Seconds => self.seconds,
            Segment::Milliseconds => self.milliseconds,
            Segment::Meridiem => None,
        }
    }

    /// Returns a copy with one numeric segment replaced. A meridiem segment
    /// is left unchanged; use [`TimeParts::with_meridiem`] for it.
    pub fn with_numeric(mut self, segment: Segment, value: Option<u32>) -> Self {
        match segment {
            Segment::Hours => self.hours = value,
            Segment::Minutes => self.minutes = value,
            Segment::Seconds => self.seconds = value,
            Segment::Milliseconds => self.milliseconds = value,
            Segment::Meridiem => {}
        }
        self
    }

    /// Returns a copy with the meridiem replaced.
    pub fn with_meridiem(mut self, meridiem: Meridiem) -> Self {
        self.meridiem = meridiem;
        self
    }

    /// Classifies the record against the segments the precision requires.
    pub fn completeness(&self, precision: TimePrecision) -> Completeness {
        if self.is_empty(precision) {
            Completeness::Empty
        } else if self.is_complete(precision) {
            Completeness::Complete
        } else {
            Completeness::Partial
        }
    }

    /// True when every segment the precision requires is absent.
    pub fn is_empty(&self, precision: TimePrecision) -> bool {
        self.hours.is_none()
            && self.minutes.is_none()
            && (!precision.requires_seconds() || self.seconds.is_none())
            && (!precision.requires_milliseconds() || self.milliseconds.is_none())
    }

    /// True when some but not all required segments are populated.
    pub fn is_partial(&self, precision: TimePrecision) -> bool {
        !self.is_empty(precision) && !self.is_complete(precision)
    }

    /// True when every segment the precision requires is populated.
    pub fn is_complete(&self, precision: TimePrecision) -> bool {
        self.hours.is_some()
            && self.minutes.is_some()
            && (!precision.requires_seconds() || self.seconds.is_some())
            && (!precision.requires_milliseconds() || self.milliseconds.is_some())
    }

    /// Assembles a timestamp from a complete record.
    ///
    /// The basis for the calendar date and for any sub-precision fields is
    /// `previous` when present, otherwise the start of day of `date_part`
    /// (falling back to today). An explicit `date_part` overrides the basis
    /// year/month/day. Seconds and milliseconds are written only when the
    /// precision requires them; otherwise the basis values carry over, so a
    /// minutes-precision edit preserves the seconds already on `previous`.
    ///
    /// Returns `None` when a required segment is absent (the record is not
    /// [`Completeness::Complete`]) or the segments are out of range for a
    /// calendar time.
    pub fn compose(
        &self,
        format: TimeFormat,
        date_part: Option<NaiveDate>,
        previous: Option<NaiveDateTime>,
    ) -> Option<NaiveDateTime> {
        let hours = self.hours?;
        let minutes = self.minutes?;
        let hour = if format.use_12_hour_clock {
            // Displayed 12 is calendar 0; PM shifts forward half a day.
            let wrapped = hours % 12;
            match self.meridiem {
                Meridiem::Am => wrapped,
                Meridiem::Pm => wrapped + 12,
            }
        } else {
            hours
        };
        let basis =
            previous.unwrap_or_else(|| start_of_day(date_part.unwrap_or_else(today)));
        let date = date_part.unwrap_or_else(|| basis.date());
        let seconds = if format.precision.requires_seconds() {
            self.seconds?
        } else {
            basis.second()
        };
        let milliseconds = if format.precision.requires_milliseconds() {
            self.milliseconds?
        } else {
            basis.nanosecond() / 1_000_000
        };
        date.and_hms_milli_opt(hour, minutes, seconds, milliseconds)
    }
}

/// Midnight at the start of the given calendar day.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// The current calendar day in local time.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(h: u32, m: u32, s: u32, ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 7)
            .and_then(|d| d.and_hms_milli_opt(h, m, s, ms))
            .expect("valid time")
    }

    #[test]
    fn decompose_absent_value_yields_empty_record() {
        let parts = TimeParts::decompose(None, TimeFormat::new(TimePrecision::Minutes));
        assert_eq!(parts, TimeParts::default());
        assert_eq!(parts.meridiem, Meridiem::Am);
    }

    #[test]
    fn decompose_reads_calendar_fields_in_24_hour_mode() {
        let parts = TimeParts::decompose(
            Some(dt(14, 5, 27, 250)),
            TimeFormat::new(TimePrecision::Milliseconds),
        );
        assert_eq!(parts.hours, Some(14));
        assert_eq!(parts.minutes, Some(5));
        assert_eq!(parts.seconds, Some(27));
        assert_eq!(parts.milliseconds, Some(250));
        assert_eq!(parts.meridiem, Meridiem::Pm);
    }

    #[test]
    fn decompose_maps_hours_into_12_hour_range() {
        let format = TimeFormat::twelve_hour(TimePrecision::Minutes);
        let midnight = TimeParts::decompose(Some(dt(0, 30, 0, 0)), format);
        assert_eq!(midnight.hours, Some(12));
        assert_eq!(midnight.meridiem, Meridiem::Am);

        let noon = TimeParts::decompose(Some(dt(12, 15, 0, 0)), format);
        assert_eq!(noon.hours, Some(12));
        assert_eq!(noon.meridiem, Meridiem::Pm);

        let evening = TimeParts::decompose(Some(dt(23, 5, 0, 0)), format);
        assert_eq!(evening.hours, Some(11));
        assert_eq!(evening.meridiem, Meridiem::Pm);
    }

    #[test]
    fn compose_round_trips_24_hour_values() {
        let format = TimeFormat::new(TimePrecision::Milliseconds);
        for value in [dt(0, 0, 0, 0), dt(9, 30, 15, 1), dt(23, 59, 59, 999)] {
            let parts = TimeParts::decompose(Some(value), format);
            assert_eq!(parts.compose(format, None, Some(value)), Some(value));
        }
    }

    #[test]
    fn compose_round_trips_12_hour_values() {
        let format = TimeFormat::twelve_hour(TimePrecision::Seconds);
        for hour in 0..24 {
            let value = dt(hour, 42, 7, 0);
            let parts = TimeParts::decompose(Some(value), format);
            let composed = parts.compose(format, None, Some(value)).expect("valid time");
            assert_eq!(composed.hour(), value.hour());
            assert_eq!(composed.minute(), value.minute());
        }
    }

    #[test]
    fn compose_maps_meridiem_boundaries() {
        let format = TimeFormat::twelve_hour(TimePrecision::Minutes);
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).expect("valid time");
        let twelve_am = TimeParts {
            hours: Some(12),
            minutes: Some(0),
            ..TimeParts::default()
        };
        assert_eq!(
            twelve_am.compose(format, Some(date), None).map(|v| v.hour()),
            Some(0)
        );
        let twelve_pm = twelve_am.with_meridiem(Meridiem::Pm);
        assert_eq!(
            twelve_pm.compose(format, Some(date), None).map(|v| v.hour()),
            Some(12)
        );
        let one_pm = TimeParts {
            hours: Some(1),
            minutes: Some(0),
            meridiem: Meridiem::Pm,
            ..TimeParts::default()
        };
        assert_eq!(
            one_pm.compose(format, Some(date), None).map(|v| v.hour()),
            Some(13)
        );
    }

    #[test]
    fn compose_preserves_sub_precision_fields_from_previous() {
        let format = TimeFormat::new(TimePrecision::Minutes);
        let previous = dt(14, 5, 27, 250);
        let parts = TimeParts::decompose(Some(previous), format).with_numeric(
            Segment::Minutes,
            Some(30),
        );
        assert_eq!(
            parts.compose(format, None, Some(previous)),
            Some(dt(14, 30, 27, 250))
        );
    }

    #[test]
    fn compose_without_previous_starts_from_midnight() {
        let format = TimeFormat::twelve_hour(TimePrecision::Minutes);
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).expect("valid time");
        let parts = TimeParts {
            hours: Some(9),
            minutes: Some(30),
            ..TimeParts::default()
        };
        let composed = parts.compose(format, Some(date), None).expect("valid time");
        assert_eq!(composed, dt(9, 30, 0, 0));
    }

    #[test]
    fn compose_rejects_incomplete_records() {
        let format = TimeFormat::new(TimePrecision::Seconds);
        let parts = TimeParts {
            hours: Some(9),
            minutes: Some(30),
            ..TimeParts::default()
        };
        assert_eq!(parts.compose(format, None, None), None);
    }

    #[test]
    fn completeness_follows_required_segments() {
        let precision = TimePrecision::Seconds;
        let empty = TimeParts::default();
        assert_eq!(empty.completeness(precision), Completeness::Empty);
        assert!(empty.is_empty(precision));

        let partial = empty.with_numeric(Segment::Hours, Some(9));
        assert_eq!(partial.completeness(precision), Completeness::Partial);
        assert!(partial.is_partial(precision));

        let complete = partial
            .with_numeric(Segment::Minutes, Some(30))
            .with_numeric(Segment::Seconds, Some(0));
        assert_eq!(complete.completeness(precision), Completeness::Complete);
        assert!(complete.is_complete(precision));

        // Seconds are ignored by minute precision.
        let stray_seconds = TimeParts::default().with_numeric(Segment::Seconds, Some(5));
        assert!(stray_seconds.is_empty(TimePrecision::Minutes));
        assert!(stray_seconds.is_partial(TimePrecision::Seconds));
    }

    #[test]
    fn segment_order_follows_format() {
        use Segment::*;
        assert_eq!(
            TimeFormat::new(TimePrecision::Minutes).segments().as_slice(),
            &[Hours, Minutes]
        );
        assert_eq!(
            TimeFormat::twelve_hour(TimePrecision::Seconds)
                .segments()
                .as_slice(),
            &[Hours, Minutes, Seconds, Meridiem]
        );
        assert_eq!(
            TimeFormat::new(TimePrecision::Milliseconds)
                .segments()
                .as_slice(),
            &[Hours, Minutes, Seconds, Milliseconds]
        );
    }
}
