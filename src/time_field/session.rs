//! Edit-session state for the segmented time field.
//!
//! The session owns the in-progress (possibly partial) segment record
//! between keystrokes. The externally supplied value is never the source of
//! truth mid-edit; instead the session re-derives its segments whenever the
//! outside value or format changes, discarding any partial input.

use chrono::{NaiveDate, NaiveDateTime};
use tessera_ui::Focus;

use super::{
    parts::{Completeness, Meridiem, SEGMENT_COUNT, Segment, TimeFormat, TimeParts},
    validate::{Keystroke, accumulate_digit, is_valid_segment, segment_bounds},
};

/// Resynchronizations allowed before a continuously changing external
/// value/format pair is treated as a caller bug and ignored.
const MAX_RESYNC_ATTEMPTS: u32 = 10;

/// Decision produced by merging a segment edit into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// The edit was suppressed; nothing changed.
    Rejected,
    /// The record is still partial (or empty with no value to clear); the
    /// segments were buffered and nothing is reported upward.
    Buffered,
    /// The field transitioned to no-value; report an absent value upward.
    Cleared,
    /// A complete value was composed; report it upward.
    Committed(NaiveDateTime),
}

/// State for one [`time_field`](super::time_field) instance.
///
/// Holds the buffered segment record, the last-seen external value/format
/// snapshot used for reconciliation, one focus handle per segment, and the
/// whole-segment selection marker that makes a fresh keystroke replace a
/// segment instead of appending to it.
pub struct TimeFieldState {
    last_value: Option<NaiveDateTime>,
    last_format: TimeFormat,
    parts: TimeParts,
    focus: [Focus; SEGMENT_COUNT],
    resync_attempts: u32,
    /// Segment whose content is select-all highlighted; the next typed
    /// digit replaces it rather than extending it.
    selected: Option<Segment>,
    /// Segment whose content should be re-selected on the next frame,
    /// scheduled by a step or meridiem change.
    pending_selection: Option<Segment>,
}

impl TimeFieldState {
    /// Creates a session with segments derived from the initial value.
    pub fn new(value: Option<NaiveDateTime>, format: TimeFormat) -> Self {
        Self {
            last_value: value,
            last_format: format,
            parts: TimeParts::decompose(value, format),
            focus: std::array::from_fn(|_| Focus::new()),
            resync_attempts: 0,
            selected: None,
            pending_selection: None,
        }
    }

    /// The buffered segment record.
    pub fn parts(&self) -> TimeParts {
        self.parts
    }

    /// The format the session was last reconciled against.
    pub fn format(&self) -> TimeFormat {
        self.last_format
    }

    /// The external value the session was last reconciled against.
    pub fn value(&self) -> Option<NaiveDateTime> {
        self.last_value
    }

    /// Re-derives the segments when the externally supplied value or format
    /// differs from the last-seen snapshot, discarding any partial edit.
    ///
    /// A value/format pair that keeps changing every frame stops forcing
    /// resynchronization after a fixed number of attempts; the counter
    /// resets once the inputs hold still.
    pub fn reconcile(&mut self, value: Option<NaiveDateTime>, format: TimeFormat) {
        if self.last_value == value && self.last_format == format {
            self.resync_attempts = 0;
            return;
        }
        if self.resync_attempts >= MAX_RESYNC_ATTEMPTS {
            if self.resync_attempts == MAX_RESYNC_ATTEMPTS {
                tracing::warn!(
                    "time field value/format keeps changing; giving up on resynchronization"
                );
                self.resync_attempts += 1;
            }
            return;
        }
        self.resync_attempts += 1;
        self.last_value = value;
        self.last_format = format;
        self.parts = TimeParts::decompose(value, format);
        self.pending_selection = None;
    }

    fn focus(&self, segment: Segment) -> &Focus {
        &self.focus[segment.index()]
    }

    /// The segment whose focus handle is currently active, if any.
    pub fn focused_segment(&self) -> Option<Segment> {
        self.last_format
            .segments()
            .into_iter()
            .find(|segment| self.focus(*segment).is_focused())
    }

    /// Whether any segment of this field holds focus.
    pub fn is_focused(&self) -> bool {
        self.focused_segment().is_some()
    }

    /// Moves focus onto the given segment and selects its content.
    pub fn focus_segment(&mut self, segment: Segment) {
        self.focus(segment).request_focus();
        self.selected = Some(segment);
    }

    /// Releases focus from every segment of this field.
    pub fn unfocus_all(&mut self) {
        for focus in &self.focus {
            focus.unfocus();
        }
        self.selected = None;
    }

    /// Moves focus to the neighbouring segment in traversal order.
    ///
    /// A no-op when no segment is focused or the move would leave the field.
    pub fn move_focus(&mut self, delta: isize) {
        let order = self.last_format.segments();
        let Some(current) = self.focused_segment() else {
            return;
        };
        let Some(position) = order.iter().position(|segment| *segment == current) else {
            return;
        };
        let target = position as isize + delta;
        if target < 0 || target >= order.len() as isize {
            return;
        }
        self.focus_segment(order[target as usize]);
    }

    /// Marks a segment's content as select-all highlighted; the next typed
    /// digit replaces the segment's value instead of extending it.
    pub fn select_segment(&mut self, segment: Segment) {
        self.selected = Some(segment);
    }

    /// The segment currently rendered with a whole-value selection, if any.
    pub fn selected_segment(&self) -> Option<Segment> {
        self.selected
    }

    /// Takes the deferred reselection scheduled by a step or meridiem
    /// change, dropping it when the segment lost focus since then (a
    /// staleness check in place of a real cancellation).
    pub fn take_pending_selection(&mut self) -> Option<Segment> {
        let segment = self.pending_selection.take()?;
        self.focus(segment).is_focused().then_some(segment)
    }

    /// Types one character into a numeric segment (see
    /// [`accumulate_digit`]). A selected segment is replaced by the first
    /// digit; later digits extend it.
    pub fn type_digit(
        &mut self,
        segment: Segment,
        typed: char,
        date_part: Option<NaiveDate>,
    ) -> ChangeOutcome {
        let use_12 = self.last_format.use_12_hour_clock;
        let current = if self.selected == Some(segment) {
            None
        } else {
            self.parts.numeric(segment)
        };
        match accumulate_digit(current, typed, segment, use_12) {
            Keystroke::Rejected => ChangeOutcome::Rejected,
            Keystroke::Accepted(value) => {
                self.selected = None;
                self.merge(self.parts.with_numeric(segment, Some(value)), date_part)
            }
        }
    }

    /// Clears one numeric segment back to absent.
    pub fn clear_segment(
        &mut self,
        segment: Segment,
        date_part: Option<NaiveDate>,
    ) -> ChangeOutcome {
        if self.parts.numeric(segment).is_none() {
            return ChangeOutcome::Rejected;
        }
        self.selected = None;
        self.merge(self.parts.with_numeric(segment, None), date_part)
    }

    /// Forces the meridiem to a specific half of the day.
    pub fn set_meridiem(
        &mut self,
        meridiem: Meridiem,
        date_part: Option<NaiveDate>,
    ) -> ChangeOutcome {
        if self.parts.meridiem == meridiem {
            return ChangeOutcome::Rejected;
        }
        self.schedule_reselect(
            Segment::Meridiem,
            self.parts.with_meridiem(meridiem),
            date_part,
        )
    }

    /// Toggles the meridiem between AM and PM.
    pub fn toggle_meridiem(&mut self, date_part: Option<NaiveDate>) -> ChangeOutcome {
        self.schedule_reselect(
            Segment::Meridiem,
            self.parts.with_meridiem(self.parts.meridiem.toggled()),
            date_part,
        )
    }

    /// Steps a segment by `delta`, validating the result.
    ///
    /// A step whose result fails validation is dropped, leaving the value
    /// unchanged: stepping up from hour 23 in 24-hour mode does not wrap.
    /// Stepping an absent segment starts from the bounds-table minimum (up)
    /// or maximum (down). On the meridiem segment a step toggles.
    pub fn step(
        &mut self,
        segment: Segment,
        delta: i64,
        date_part: Option<NaiveDate>,
    ) -> ChangeOutcome {
        if segment == Segment::Meridiem {
            return self.toggle_meridiem(date_part);
        }
        let use_12 = self.last_format.use_12_hour_clock;
        let (min, max) = segment_bounds(segment, use_12);
        let candidate = match self.parts.numeric(segment) {
            Some(value) => i64::from(value) + delta,
            None if delta >= 0 => i64::from(min),
            None => i64::from(max),
        };
        if candidate < 0 || !is_valid_segment(&candidate.to_string(), segment, use_12) {
            return ChangeOutcome::Rejected;
        }
        self.schedule_reselect(
            segment,
            self.parts.with_numeric(segment, Some(candidate as u32)),
            date_part,
        )
    }

    /// Clear-control action: emit an absent value when a concrete value
    /// exists, otherwise just reset the buffered segments.
    pub fn clear_value(&mut self) -> ChangeOutcome {
        let had_value = self.last_value.is_some();
        self.parts = TimeParts::default();
        self.selected = None;
        self.pending_selection = None;
        if had_value {
            ChangeOutcome::Cleared
        } else {
            ChangeOutcome::Buffered
        }
    }

    /// Merges a record produced by a step or meridiem change and schedules
    /// the segment's content to be re-selected on the next frame.
    fn schedule_reselect(
        &mut self,
        segment: Segment,
        next: TimeParts,
        date_part: Option<NaiveDate>,
    ) -> ChangeOutcome {
        let outcome = self.merge(next, date_part);
        if outcome != ChangeOutcome::Rejected {
            self.pending_selection = Some(segment);
        }
        outcome
    }

    /// Merges an updated record and decides between buffering, clearing and
    /// committing.
    fn merge(&mut self, next: TimeParts, date_part: Option<NaiveDate>) -> ChangeOutcome {
        match next.completeness(self.last_format.precision) {
            Completeness::Empty if self.last_value.is_some() => {
                // Do not retain the buffered segments on a clear.
                self.parts = TimeParts::default();
                ChangeOutcome::Cleared
            }
            Completeness::Empty | Completeness::Partial => {
                self.parts = next;
                ChangeOutcome::Buffered
            }
            Completeness::Complete => {
                self.parts = next;
                match next.compose(self.last_format, date_part, self.last_value) {
                    Some(value) => ChangeOutcome::Committed(value),
                    None => ChangeOutcome::Buffered,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_field::parts::TimePrecision;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).expect("valid time")
    }

    fn dt(h: u32, m: u32, s: u32) -> NaiveDateTime {
        date().and_hms_opt(h, m, s).expect("valid time")
    }

    #[test]
    fn new_session_derives_segments_from_the_value() {
        let state = TimeFieldState::new(
            Some(dt(14, 5, 0)),
            TimeFormat::new(TimePrecision::Minutes),
        );
        assert_eq!(state.parts().hours, Some(14));
        assert_eq!(state.parts().minutes, Some(5));
    }

    #[test]
    fn reconcile_discards_partial_input_on_external_change() {
        let format = TimeFormat::new(TimePrecision::Minutes);
        let mut state = TimeFieldState::new(None, format);
        assert_eq!(
            state.type_digit(Segment::Hours, '9', None),
            ChangeOutcome::Buffered
        );
        assert_eq!(state.parts().hours, Some(9));

        state.reconcile(Some(dt(7, 30, 0)), format);
        assert_eq!(state.parts().hours, Some(7));
        assert_eq!(state.parts().minutes, Some(30));
    }

    #[test]
    fn reconcile_stops_after_the_attempt_threshold() {
        let format = TimeFormat::new(TimePrecision::Minutes);
        let mut state = TimeFieldState::new(None, format);
        // A fresh value every frame, as a caller constructing "now" on each
        // render would produce; the guard has to kick in eventually.
        for round in 0..30u32 {
            state.reconcile(Some(dt(1, round, 0)), format);
        }
        let frozen = state.parts();
        state.reconcile(Some(dt(17, 45, 0)), format);
        assert_eq!(state.parts(), frozen);

        // A stable frame resets the guard.
        state.reconcile(state.value(), format);
        state.reconcile(Some(dt(17, 45, 0)), format);
        assert_eq!(state.parts().hours, Some(17));
    }

    #[test]
    fn typing_builds_multi_digit_values() {
        let format = TimeFormat::new(TimePrecision::Minutes);
        let mut state = TimeFieldState::new(None, format);
        assert_eq!(
            state.type_digit(Segment::Hours, '1', Some(date())),
            ChangeOutcome::Buffered
        );
        assert_eq!(
            state.type_digit(Segment::Hours, '2', Some(date())),
            ChangeOutcome::Buffered
        );
        assert_eq!(state.parts().hours, Some(12));
    }

    #[test]
    fn typing_restarts_when_the_combination_is_invalid() {
        let format = TimeFormat::new(TimePrecision::Minutes);
        let mut state = TimeFieldState::new(None, format);
        state.type_digit(Segment::Minutes, '9', Some(date()));
        // "95" is not a minute; the fresh "5" wins.
        assert_eq!(
            state.type_digit(Segment::Minutes, '5', Some(date())),
            ChangeOutcome::Buffered
        );
        assert_eq!(state.parts().minutes, Some(5));
    }

    #[test]
    fn typing_replaces_a_selected_segment() {
        let format = TimeFormat::new(TimePrecision::Minutes);
        let mut state = TimeFieldState::new(Some(dt(14, 5, 0)), format);
        state.select_segment(Segment::Minutes);
        // The first digit replaces the selected "05"; the second extends it.
        assert_eq!(
            state.type_digit(Segment::Minutes, '3', None),
            ChangeOutcome::Committed(dt(14, 3, 0))
        );
        assert_eq!(
            state.type_digit(Segment::Minutes, '0', None),
            ChangeOutcome::Committed(dt(14, 30, 0))
        );
    }

    #[test]
    fn completing_the_record_commits_a_value() {
        let format = TimeFormat::twelve_hour(TimePrecision::Minutes);
        let mut state = TimeFieldState::new(None, format);
        state.type_digit(Segment::Hours, '9', Some(date()));
        state.type_digit(Segment::Minutes, '3', Some(date()));
        let outcome = state.type_digit(Segment::Minutes, '0', Some(date()));
        // Meridiem defaults to AM: today at 09:30:00.
        assert_eq!(outcome, ChangeOutcome::Committed(dt(9, 30, 0)));
    }

    #[test]
    fn committing_preserves_sub_precision_fields() {
        let format = TimeFormat::new(TimePrecision::Minutes);
        let previous = date().and_hms_opt(14, 5, 27).expect("valid time");
        let mut state = TimeFieldState::new(Some(previous), format);
        state.select_segment(Segment::Minutes);
        state.type_digit(Segment::Minutes, '3', None);
        let outcome = state.type_digit(Segment::Minutes, '0', None);
        assert_eq!(outcome, ChangeOutcome::Committed(dt(14, 30, 27)));
    }

    #[test]
    fn step_rejects_out_of_range_results() {
        let format = TimeFormat::new(TimePrecision::Minutes);
        let mut state = TimeFieldState::new(Some(dt(23, 0, 0)), format);
        assert_eq!(
            state.step(Segment::Hours, 1, Some(date())),
            ChangeOutcome::Rejected
        );
        assert_eq!(state.parts().hours, Some(23));

        let mut state = TimeFieldState::new(Some(dt(10, 0, 0)), format);
        assert_eq!(
            state.step(Segment::Minutes, -1, Some(date())),
            ChangeOutcome::Rejected
        );
        assert_eq!(state.parts().minutes, Some(0));
    }

    #[test]
    fn step_commits_in_range_results() {
        let format = TimeFormat::new(TimePrecision::Minutes);
        let mut state = TimeFieldState::new(Some(dt(14, 30, 0)), format);
        assert_eq!(
            state.step(Segment::Minutes, 1, None),
            ChangeOutcome::Committed(dt(14, 31, 0))
        );
    }

    #[test]
    fn step_starts_absent_segments_at_the_bounds() {
        let format = TimeFormat::new(TimePrecision::Minutes);
        let mut state = TimeFieldState::new(None, format);
        state.step(Segment::Minutes, 1, Some(date()));
        assert_eq!(state.parts().minutes, Some(0));
        state.clear_segment(Segment::Minutes, Some(date()));
        state.step(Segment::Minutes, -1, Some(date()));
        assert_eq!(state.parts().minutes, Some(59));
        state.step(Segment::Hours, 1, Some(date()));
        assert_eq!(state.parts().hours, Some(1));
    }

    #[test]
    fn meridiem_steps_toggle() {
        let format = TimeFormat::twelve_hour(TimePrecision::Minutes);
        let mut state = TimeFieldState::new(Some(dt(9, 30, 0)), format);
        assert_eq!(
            state.step(Segment::Meridiem, 1, None),
            ChangeOutcome::Committed(dt(21, 30, 0))
        );
        assert_eq!(
            state.step(Segment::Meridiem, 1, None),
            ChangeOutcome::Committed(dt(9, 30, 0))
        );
    }

    #[test]
    fn forcing_an_unchanged_meridiem_is_a_no_op() {
        let format = TimeFormat::twelve_hour(TimePrecision::Minutes);
        let mut state = TimeFieldState::new(Some(dt(9, 30, 0)), format);
        assert_eq!(state.set_meridiem(Meridiem::Am, None), ChangeOutcome::Rejected);
        assert_eq!(
            state.set_meridiem(Meridiem::Pm, None),
            ChangeOutcome::Committed(dt(21, 30, 0))
        );
    }

    #[test]
    fn clearing_segments_reaches_the_cleared_state() {
        let format = TimeFormat::new(TimePrecision::Minutes);
        let mut state = TimeFieldState::new(Some(dt(14, 5, 0)), format);
        assert_eq!(
            state.clear_segment(Segment::Hours, None),
            ChangeOutcome::Buffered
        );
        assert_eq!(
            state.clear_segment(Segment::Minutes, None),
            ChangeOutcome::Cleared
        );
        // The buffered segments are not retained after a clear.
        assert_eq!(state.parts(), TimeParts::default());
    }

    #[test]
    fn clear_value_emits_only_when_a_value_exists() {
        let format = TimeFormat::new(TimePrecision::Minutes);
        let mut state = TimeFieldState::new(Some(dt(14, 5, 0)), format);
        assert_eq!(state.clear_value(), ChangeOutcome::Cleared);

        let mut state = TimeFieldState::new(None, format);
        state.type_digit(Segment::Hours, '9', None);
        assert_eq!(state.clear_value(), ChangeOutcome::Buffered);
        assert_eq!(state.parts(), TimeParts::default());
    }

    #[test]
    fn pending_selection_is_dropped_without_focus() {
        let format = TimeFormat::new(TimePrecision::Minutes);
        let mut state = TimeFieldState::new(Some(dt(14, 30, 0)), format);
        state.step(Segment::Minutes, 1, None);
        // The segment never held focus, so the deferred reselect is stale.
        assert_eq!(state.take_pending_selection(), None);
        assert_eq!(state.take_pending_selection(), None);
    }

    #[test]
    fn focus_traversal_follows_segment_order() {
        let format = TimeFormat::twelve_hour(TimePrecision::Seconds);
        let mut state = TimeFieldState::new(Some(dt(9, 30, 0)), format);
        assert_eq!(state.focused_segment(), None);

        state.focus_segment(Segment::Hours);
        assert_eq!(state.focused_segment(), Some(Segment::Hours));
        assert_eq!(state.selected_segment(), Some(Segment::Hours));

        // No-op at the first segment.
        state.move_focus(-1);
        assert_eq!(state.focused_segment(), Some(Segment::Hours));

        state.move_focus(1);
        assert_eq!(state.focused_segment(), Some(Segment::Minutes));
        state.move_focus(1);
        state.move_focus(1);
        assert_eq!(state.focused_segment(), Some(Segment::Meridiem));

        // No-op at the last segment.
        state.move_focus(1);
        assert_eq!(state.focused_segment(), Some(Segment::Meridiem));

        // A step while focused schedules a reselect that survives the
        // staleness check.
        state.move_focus(-1);
        state.step(Segment::Seconds, 1, None);
        assert_eq!(state.take_pending_selection(), Some(Segment::Seconds));

        state.unfocus_all();
        assert_eq!(state.focused_segment(), None);
    }
}
