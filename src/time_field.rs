//! A segmented time-of-day entry field.
//!
//! ## Usage
//!
//! Use when users need to type or step an exact clock time, segment by
//! segment, for schedules, alarms, or filtering by time.

mod parts;
mod session;
mod validate;

use chrono::{NaiveDate, NaiveDateTime};
use derive_setters::Setters;
use tessera_ui::{
    CallbackWith, Color, CursorEventContent, Dp, InputHandlerInput, Modifier, State,
    accesskit::{Action, Role},
    remember, tessera, use_context, winit,
};
use winit::keyboard::{Key, NamedKey};

use tessera_components::{
    alignment::{Alignment, CrossAxisAlignment},
    modifier::ModifierExt as _,
    pos_misc::is_position_in_component,
    row::{RowArgs, row},
    shape_def::Shape,
    spacer::{SpacerArgs, spacer},
    surface::{SurfaceArgs, SurfaceStyle, surface},
    text::{TextArgs, text},
    theme::{MaterialAlpha, MaterialTheme, TextSelectionColors},
};

pub use parts::{
    Completeness, Meridiem, Segment, TimeFormat, TimeParts, TimePrecision, start_of_day, today,
};
pub use session::{ChangeOutcome, TimeFieldState};
pub use validate::{Keystroke, accumulate_digit, is_valid_segment, segment_bounds};

const FIELD_PADDING: Dp = Dp(6.0);
const FIELD_CORNER_RADIUS: Dp = Dp(4.0);
const CELL_CORNER_RADIUS: Dp = Dp(3.0);
const CELL_PADDING: Dp = Dp(3.0);
const ADDON_GAP: Dp = Dp(1.0);
const CLEAR_BUTTON_SIZE: Dp = Dp(20.0);
const CLEAR_GAP: Dp = Dp(8.0);

/// Report passed to the change callback of [`time_field`].
///
/// Fired only when the field clears or reaches a complete, composable
/// value; partial input is buffered silently. The previous value and the
/// previous segment record let the owner diff what changed.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeFieldChange {
    /// The new value, or `None` when the field was cleared.
    pub value: Option<NaiveDateTime>,
    /// The externally supplied value before this change.
    pub last_value: Option<NaiveDateTime>,
    /// The segment record before this change.
    pub last_parts: TimeParts,
}

/// Configuration options for [`time_field`].
#[derive(Clone, PartialEq, Setters)]
pub struct TimeFieldArgs {
    /// Optional modifier chain applied to the field container.
    pub modifier: Modifier,
    /// The externally owned time value shown by the field.
    #[setters(strip_option)]
    pub value: Option<NaiveDateTime>,
    /// Basis calendar date used for year/month/day when composing a value.
    ///
    /// When absent the date comes from the previous value, or today.
    #[setters(strip_option)]
    pub date_part: Option<NaiveDate>,
    /// Show hours as 1-12 with an AM/PM segment instead of 0-23.
    pub use_12_hour_clock: bool,
    /// The finest unit the field exposes; decides which segments exist.
    pub precision: TimePrecision,
    /// Zero-pad displayed segment values to their full width.
    pub pad_values: bool,
    /// Placeholder glyph repeated in place of a not-yet-entered segment.
    pub empty_character: char,
    /// Hide the trailing clear control.
    pub no_clear_button: bool,
    /// Disable all interaction and wash out the field.
    pub disabled: bool,
    /// Keep the field focusable but suppress every mutating key.
    pub read_only: bool,
    /// Separator rendered after the hours cell. Defaults to ":".
    #[setters(strip_option, into)]
    pub hours_addon: Option<String>,
    /// Separator rendered after the minutes cell. Defaults to ":" when the
    /// precision includes seconds.
    #[setters(strip_option, into)]
    pub minutes_addon: Option<String>,
    /// Separator rendered after the seconds cell. Defaults to "." when the
    /// precision includes milliseconds.
    #[setters(strip_option, into)]
    pub seconds_addon: Option<String>,
    /// Separator rendered after the milliseconds cell.
    #[setters(strip_option, into)]
    pub milliseconds_addon: Option<String>,
    /// Called on clear or when a complete value is composed; never called
    /// for partial input.
    #[setters(skip)]
    pub on_change: CallbackWith<TimeFieldChange>,
    /// Optional accessibility label read by assistive technologies.
    #[setters(strip_option, into)]
    pub accessibility_label: Option<String>,
    /// Optional accessibility description read by assistive technologies.
    #[setters(strip_option, into)]
    pub accessibility_description: Option<String>,
    /// Optional external state for the edit session.
    ///
    /// When this is `None`, `time_field` creates and owns an internal state.
    #[setters(skip)]
    pub state: Option<State<TimeFieldState>>,
}

impl TimeFieldArgs {
    /// Creates field args with the required precision.
    pub fn new(precision: TimePrecision) -> Self {
        Self {
            modifier: Modifier::new(),
            value: None,
            date_part: None,
            use_12_hour_clock: false,
            precision,
            pad_values: true,
            empty_character: '-',
            no_clear_button: false,
            disabled: false,
            read_only: false,
            hours_addon: None,
            minutes_addon: None,
            seconds_addon: None,
            milliseconds_addon: None,
            on_change: CallbackWith::new(|_| {}),
            accessibility_label: None,
            accessibility_description: None,
            state: None,
        }
    }

    /// Sets the change handler.
    pub fn on_change<F>(mut self, on_change: F) -> Self
    where
        F: Fn(TimeFieldChange) + Send + Sync + 'static,
    {
        self.on_change = CallbackWith::new(on_change);
        self
    }

    /// Sets the change handler using a shared callback.
    pub fn on_change_shared(
        mut self,
        on_change: impl Into<CallbackWith<TimeFieldChange>>,
    ) -> Self {
        self.on_change = on_change.into();
        self
    }

    /// Sets an external time field state.
    pub fn state(mut self, state: State<TimeFieldState>) -> Self {
        self.state = Some(state);
        self
    }

    /// The display format derived from the clock mode and precision.
    pub fn format(&self) -> TimeFormat {
        TimeFormat {
            use_12_hour_clock: self.use_12_hour_clock,
            precision: self.precision,
        }
    }

    fn addon_after(&self, segment: Segment) -> Option<String> {
        match segment {
            Segment::Hours => self
                .hours_addon
                .clone()
                .or_else(|| Some(":".to_string())),
            Segment::Minutes => self.minutes_addon.clone().or_else(|| {
                self.precision
                    .requires_seconds()
                    .then(|| ":".to_string())
            }),
            Segment::Seconds => self.seconds_addon.clone().or_else(|| {
                self.precision
                    .requires_milliseconds()
                    .then(|| ".".to_string())
            }),
            Segment::Milliseconds => self.milliseconds_addon.clone(),
            Segment::Meridiem => None,
        }
    }
}

/// # time_field
///
/// Renders a time-of-day entry field whose hours, minutes, seconds,
/// milliseconds and AM/PM components are independently editable segments
/// with keyboard navigation and stepping.
///
/// ## Usage
///
/// Use when users need to enter an exact clock time rather than pick one
/// from a dial.
///
/// ## Parameters
///
/// - `args` — configuration for the field's value, format and callbacks;
///   see [`TimeFieldArgs`].
///
/// ## Examples
///
/// ```
/// # use tessera_ui::tessera;
/// # #[tessera]
/// # fn component() {
/// use tessera_time_field::time_field::{TimeFieldArgs, TimePrecision, time_field};
/// # use tessera_components::theme::{MaterialTheme, material_theme};
///
/// # let args = tessera_components::theme::MaterialThemeProviderArgs::new(
/// #     || MaterialTheme::default(),
/// #     || {
/// time_field(
///     &TimeFieldArgs::new(TimePrecision::Minutes)
///         .use_12_hour_clock(true)
///         .on_change(|change| {
///             println!("time changed to {:?}", change.value);
///         }),
/// );
/// #     },
/// # );
/// # material_theme(&args);
/// # }
/// # component();
/// ```
#[tessera]
pub fn time_field(args: &TimeFieldArgs) {
    let mut args: TimeFieldArgs = args.clone();
    let initial_value = args.value;
    let format = args.format();
    let state = args
        .state
        .unwrap_or_else(|| remember(|| TimeFieldState::new(initial_value, format)));
    args.state = Some(state);
    time_field_node(&args);
}

#[tessera]
fn time_field_node(args: &TimeFieldArgs) {
    let args = args.clone();
    let state = args.state.expect("time_field_node requires state to be set");
    let format = args.format();

    if args.disabled {
        state.with_mut(|s| s.unfocus_all());
    }
    state.with_mut(|s| s.reconcile(args.value, format));
    // A step on the previous frame scheduled a whole-segment reselect; it
    // applies only if that segment still holds focus.
    if let Some(segment) = state.with_mut(|s| s.take_pending_selection()) {
        state.with_mut(|s| s.select_segment(segment));
    }

    let theme = use_context::<MaterialTheme>()
        .expect("MaterialTheme must be provided")
        .get();
    let scheme = theme.color_scheme;
    let typography = theme.typography;
    let is_focused = state.with(|s| s.is_focused());

    let (fill_color, border_color) = if args.disabled {
        (
            scheme
                .on_surface
                .with_alpha(MaterialAlpha::DISABLED_CONTAINER),
            scheme
                .on_surface
                .with_alpha(MaterialAlpha::DISABLED_CONTENT),
        )
    } else if is_focused {
        (scheme.surface, scheme.primary)
    } else {
        (scheme.surface_variant, scheme.outline_variant)
    };

    let parts = state.with(|s| s.parts());
    let focused_segment = state.with(|s| s.focused_segment());
    let selected_segment = state.with(|s| s.selected_segment());
    let font_size = typography.body_medium.font_size;
    let addon_color = scheme.on_surface_variant;

    let cells: Vec<(SegmentCellArgs, Option<String>)> = format
        .segments()
        .into_iter()
        .map(|segment| {
            let cell = SegmentCellArgs {
                segment,
                display: segment_display(&parts, segment, args.pad_values, args.empty_character),
                is_absent: segment != Segment::Meridiem && parts.numeric(segment).is_none(),
                focused: !args.disabled && focused_segment == Some(segment),
                selected: !args.disabled
                    && focused_segment == Some(segment)
                    && selected_segment == Some(segment),
                disabled: args.disabled,
                read_only: args.read_only,
                value: parts.numeric(segment),
                bounds: segment_bounds(segment, format.use_12_hour_clock),
                date_part: args.date_part,
                font_size,
                on_change: args.on_change.clone(),
                state,
            };
            (cell, args.addon_after(segment))
        })
        .collect();

    let show_clear = !args.no_clear_button && !args.disabled && !args.read_only;
    let on_change = args.on_change.clone();

    let container_args = SurfaceArgs::default()
        .style(SurfaceStyle::FilledOutlined {
            fill_color,
            border_color,
            border_width: Dp(1.0),
        })
        .shape(Shape::rounded_rectangle(FIELD_CORNER_RADIUS))
        .block_input(true)
        .modifier(args.modifier);

    surface(&SurfaceArgs::with_child(container_args, move || {
        let cells = cells.clone();
        let on_change = on_change.clone();
        Modifier::new().padding_all(FIELD_PADDING).run(move || {
            let cells = cells.clone();
            let on_change = on_change.clone();
            row(
                RowArgs::default().cross_axis_alignment(CrossAxisAlignment::Center),
                move |scope| {
                    for (cell, addon) in cells.clone() {
                        scope.child(move || segment_cell(&cell));
                        if let Some(addon) = addon {
                            let color = addon_color;
                            scope.child(move || {
                                Modifier::new().padding_all(ADDON_GAP).run(|| {
                                    text(
                                        &TextArgs::default()
                                            .text(addon.clone())
                                            .size(font_size)
                                            .color(color),
                                    );
                                });
                            });
                        }
                    }
                    if show_clear {
                        scope.child(|| {
                            spacer(&SpacerArgs::new(Modifier::new().width(CLEAR_GAP)))
                        });
                        let on_change = on_change.clone();
                        scope.child(move || {
                            clear_button(state, on_change.clone());
                        });
                    }
                },
            );
        });
    }));

    let handler_args = args.clone();
    input_handler(move |mut input| {
        handle_field_input(&mut input, &handler_args, state);
    });
}

fn segment_display(parts: &TimeParts, segment: Segment, pad: bool, empty: char) -> String {
    if segment == Segment::Meridiem {
        return parts.meridiem.label().to_string();
    }
    let width = if segment == Segment::Milliseconds { 3 } else { 2 };
    match parts.numeric(segment) {
        Some(value) if pad => format!("{value:0width$}"),
        Some(value) => value.to_string(),
        None => empty.to_string().repeat(width),
    }
}

#[derive(Clone, PartialEq)]
struct SegmentCellArgs {
    segment: Segment,
    display: String,
    is_absent: bool,
    focused: bool,
    selected: bool,
    disabled: bool,
    read_only: bool,
    value: Option<u32>,
    bounds: (u32, u32),
    date_part: Option<NaiveDate>,
    font_size: Dp,
    on_change: CallbackWith<TimeFieldChange>,
    state: State<TimeFieldState>,
}

#[tessera]
fn segment_cell(args: &SegmentCellArgs) {
    let args = args.clone();
    let scheme = use_context::<MaterialTheme>()
        .expect("MaterialTheme must be provided")
        .get()
        .color_scheme;

    let cell_color = if args.selected {
        TextSelectionColors::from_scheme(&scheme).background
    } else if args.focused {
        scheme.surface_container_high
    } else {
        Color::TRANSPARENT
    };
    let text_color = if args.disabled {
        scheme
            .on_surface
            .with_alpha(MaterialAlpha::DISABLED_CONTENT)
    } else if args.is_absent {
        scheme.on_surface_variant
    } else {
        scheme.on_surface
    };

    let display = args.display.clone();
    let font_size = args.font_size;
    surface(&SurfaceArgs::with_child(
        SurfaceArgs::default()
            .style(SurfaceStyle::Filled { color: cell_color })
            .shape(Shape::rounded_rectangle(CELL_CORNER_RADIUS))
            .content_alignment(Alignment::Center),
        move || {
            let display = display.clone();
            Modifier::new().padding_all(CELL_PADDING).run(move || {
                text(
                    &TextArgs::default()
                        .text(display.clone())
                        .size(font_size)
                        .color(text_color),
                );
            });
        },
    ));

    let handler_args = args.clone();
    input_handler(move |mut input| {
        handle_segment_input(&mut input, &handler_args);
    });
}

fn handle_segment_input(input: &mut InputHandlerInput<'_>, args: &SegmentCellArgs) {
    apply_segment_accessibility(input, args);
    if args.disabled {
        return;
    }
    let in_bounds = input
        .cursor_position_rel
        .map(|pos| is_position_in_component(input.computed_data, pos))
        .unwrap_or(false);
    if !in_bounds {
        return;
    }
    let pressed = input
        .cursor_events
        .iter()
        .any(|event| matches!(event.content, CursorEventContent::Pressed(_)));
    if pressed {
        let segment = args.segment;
        args.state.with_mut(|s| s.focus_segment(segment));
        input.cursor_events.clear();
    }
}

fn apply_segment_accessibility(input: &mut InputHandlerInput<'_>, args: &SegmentCellArgs) {
    let mut builder = input.accessibility().label(args.segment.label());
    builder = if args.segment == Segment::Meridiem {
        builder.role(Role::Button).value(args.display.clone())
    } else {
        let (min, max) = args.bounds;
        let mut builder = builder
            .role(Role::SpinButton)
            .numeric_range(f64::from(min), f64::from(max))
            .value(args.display.clone());
        if let Some(value) = args.value {
            builder = builder.numeric_value(f64::from(value));
        }
        builder
    };
    if args.disabled {
        builder = builder.disabled();
    } else {
        builder = builder.focusable();
        if !args.read_only {
            builder = builder.action(Action::Increment).action(Action::Decrement);
        }
    }
    builder.commit();

    if args.disabled || args.read_only {
        return;
    }
    let state = args.state;
    let segment = args.segment;
    let date_part = args.date_part;
    let on_change = args.on_change.clone();
    input.set_accessibility_action_handler(move |action| {
        let delta = match action {
            Action::Increment => 1,
            Action::Decrement => -1,
            _ => return,
        };
        let (last_value, last_parts) = state.with(|s| (s.value(), s.parts()));
        let outcome = state.with_mut(|s| s.step(segment, delta, date_part));
        report_outcome(outcome, &on_change, last_value, last_parts);
    });
}

fn clear_button(state: State<TimeFieldState>, on_change: CallbackWith<TimeFieldChange>) {
    let theme = use_context::<MaterialTheme>()
        .expect("MaterialTheme must be provided")
        .get();
    let scheme = theme.color_scheme;
    let font_size = theme.typography.label_medium.font_size;
    surface(&SurfaceArgs::with_child(
        SurfaceArgs::default()
            .modifier(Modifier::new().size(CLEAR_BUTTON_SIZE, CLEAR_BUTTON_SIZE))
            .style(SurfaceStyle::Filled {
                color: scheme.surface_container_low,
            })
            .shape(Shape::capsule())
            .content_alignment(Alignment::Center)
            .on_click(move || {
                let (last_value, last_parts) = state.with(|s| (s.value(), s.parts()));
                let outcome = state.with_mut(|s| s.clear_value());
                state.with_mut(|s| s.focus_segment(Segment::Hours));
                report_outcome(outcome, &on_change, last_value, last_parts);
            }),
        move || {
            text(
                &TextArgs::default()
                    .text("\u{00d7}")
                    .size(font_size)
                    .color(scheme.on_surface_variant),
            );
        },
    ));
}

fn report_outcome(
    outcome: ChangeOutcome,
    on_change: &CallbackWith<TimeFieldChange>,
    last_value: Option<NaiveDateTime>,
    last_parts: TimeParts,
) {
    let value = match outcome {
        ChangeOutcome::Cleared => None,
        ChangeOutcome::Committed(value) => Some(value),
        ChangeOutcome::Rejected | ChangeOutcome::Buffered => return,
    };
    on_change.call(TimeFieldChange {
        value,
        last_value,
        last_parts,
    });
}

fn handle_field_input(
    input: &mut InputHandlerInput<'_>,
    args: &TimeFieldArgs,
    state: State<TimeFieldState>,
) {
    apply_field_accessibility(input, args);
    if args.disabled {
        return;
    }

    let in_bounds = input
        .cursor_position_rel
        .map(|pos| is_position_in_component(input.computed_data, pos))
        .unwrap_or(false);
    if in_bounds {
        input.requests.cursor_icon = winit::window::CursorIcon::Text;
        // Clicks the cells did not claim land here; redirect focus to the
        // hours segment instead of leaving it nowhere.
        let pressed = input
            .cursor_events
            .iter()
            .any(|event| matches!(event.content, CursorEventContent::Pressed(_)));
        if pressed {
            if !state.with(|s| s.is_focused()) {
                state.with_mut(|s| s.focus_segment(Segment::Hours));
            }
            input.cursor_events.clear();
        }
    }

    if !state.with(|s| s.is_focused()) {
        return;
    }

    let events: Vec<winit::event::KeyEvent> = input.keyboard_events.iter().cloned().collect();
    // Tab keeps flowing so outer tab-order handling still works; everything
    // else belongs to the field while a segment is focused.
    input
        .keyboard_events
        .retain(|event| matches!(event.logical_key, Key::Named(NamedKey::Tab)));

    for event in events {
        if event.state != winit::event::ElementState::Pressed {
            continue;
        }
        if matches!(event.logical_key, Key::Named(NamedKey::Tab)) {
            continue;
        }
        if args.read_only {
            continue;
        }
        handle_key(&event, args, state);
    }
}

fn handle_key(event: &winit::event::KeyEvent, args: &TimeFieldArgs, state: State<TimeFieldState>) {
    let Some(focused) = state.with(|s| s.focused_segment()) else {
        return;
    };
    match &event.logical_key {
        Key::Named(NamedKey::ArrowUp) => {
            let (last_value, last_parts) = state.with(|s| (s.value(), s.parts()));
            let outcome = state.with_mut(|s| s.step(focused, 1, args.date_part));
            report_outcome(outcome, &args.on_change, last_value, last_parts);
        }
        Key::Named(NamedKey::ArrowDown) => {
            let (last_value, last_parts) = state.with(|s| (s.value(), s.parts()));
            let outcome = state.with_mut(|s| s.step(focused, -1, args.date_part));
            report_outcome(outcome, &args.on_change, last_value, last_parts);
        }
        Key::Named(NamedKey::ArrowLeft) => state.with_mut(|s| s.move_focus(-1)),
        Key::Named(NamedKey::ArrowRight) => state.with_mut(|s| s.move_focus(1)),
        Key::Named(NamedKey::Backspace | NamedKey::Delete) => {
            let (last_value, last_parts) = state.with(|s| (s.value(), s.parts()));
            let outcome = state.with_mut(|s| s.clear_segment(focused, args.date_part));
            report_outcome(outcome, &args.on_change, last_value, last_parts);
        }
        Key::Character(typed) => {
            for ch in typed.chars() {
                // Focus may have moved while handling earlier characters.
                let Some(focused) = state.with(|s| s.focused_segment()) else {
                    break;
                };
                if focused == Segment::Meridiem {
                    let forced = match ch.to_ascii_lowercase() {
                        'a' => Some(Meridiem::Am),
                        'p' => Some(Meridiem::Pm),
                        _ => None,
                    };
                    if let Some(meridiem) = forced {
                        let (last_value, last_parts) =
                            state.with(|s| (s.value(), s.parts()));
                        let outcome =
                            state.with_mut(|s| s.set_meridiem(meridiem, args.date_part));
                        report_outcome(outcome, &args.on_change, last_value, last_parts);
                    }
                } else if ch.is_ascii_digit() {
                    let (last_value, last_parts) = state.with(|s| (s.value(), s.parts()));
                    let outcome =
                        state.with_mut(|s| s.type_digit(focused, ch, args.date_part));
                    report_outcome(outcome, &args.on_change, last_value, last_parts);
                }
            }
        }
        _ => {}
    }
}

fn apply_field_accessibility(input: &mut InputHandlerInput<'_>, args: &TimeFieldArgs) {
    let mut builder = input.accessibility().role(Role::Group);
    if let Some(label) = args.accessibility_label.as_ref() {
        builder = builder.label(label.clone());
    }
    if let Some(description) = args.accessibility_description.as_ref() {
        builder = builder.description(description.clone());
    }
    if args.disabled {
        builder = builder.disabled();
    }
    builder.commit();
}
