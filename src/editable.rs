//! Click-to-edit fields.
//!
//! A field shows its value as a label. Clicking it swaps in a focused text
//! input pre-filled with the value; losing focus (or Enter, for single-line
//! fields) goes back to the label and reports the new text, but only when it
//! differs from what was shown.

use std::hash::Hash;

use eframe::egui::{self, Color32, CursorIcon, Id, Label, RichText, Sense, TextEdit, Ui};

use crate::coerce;

pub const PLACEHOLDER: &str = "Empty";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEvent {
    Enter,
    FocusLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    SingleLine,
    MultiLine,
}

/// Edit state of one field. `None` buffer means display mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldEditor {
    buffer: Option<String>,
    mode: Mode,
    wants_focus: bool,
}

impl FieldEditor {
    pub fn new(mode: Mode) -> Self {
        Self { buffer: None, mode, wants_focus: false }
    }

    pub fn is_editing(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn activate(&mut self, current: &str) {
        self.buffer = Some(current.to_owned());
        self.wants_focus = true;
    }

    fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.wants_focus)
    }

    pub fn buffer_mut(&mut self) -> Option<&mut String> {
        self.buffer.as_mut()
    }

    /// Returns the committed text when the event ends editing with a change.
    pub fn handle(&mut self, event: FieldEvent, current: &str) -> Option<String> {
        if event == FieldEvent::Enter && self.mode == Mode::MultiLine {
            return None;
        }
        let text = self.buffer.take()?;
        (text != current).then_some(text)
    }
}

/// Text shown in display mode.
pub fn display_text(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

fn field_id(salt: impl Hash) -> Id {
    Id::new(("editable", salt))
}

/// Draws a click-to-edit text field. Returns the new value on commit.
pub fn text(ui: &mut Ui, salt: impl Hash, value: &str, mode: Mode) -> Option<String> {
    let id = field_id(salt);
    let mut editor = ui
        .data_mut(|d| d.get_temp::<FieldEditor>(id))
        .unwrap_or_else(|| FieldEditor::new(mode));

    let mut committed = None;
    if let Some(buffer) = editor.buffer_mut() {
        let (edit, max_width) = match mode {
            Mode::SingleLine => (TextEdit::singleline(buffer), 240.0),
            Mode::MultiLine => (TextEdit::multiline(buffer).desired_rows(3), 360.0),
        };
        let width = ui.available_width().min(max_width);
        let response = ui.add(edit.id(id.with("input")).desired_width(width));
        if editor.take_focus_request() {
            response.request_focus();
        }
        if response.lost_focus() {
            let enter = mode == Mode::SingleLine && ui.input(|i| i.key_pressed(egui::Key::Enter));
            let event = if enter { FieldEvent::Enter } else { FieldEvent::FocusLost };
            committed = editor.handle(event, value);
        }
    } else {
        let label = match display_text(value) {
            Some(v) => RichText::new(v),
            None => RichText::new(PLACEHOLDER).italics().color(Color32::LIGHT_GRAY),
        };
        let response = ui
            .add(Label::new(label).sense(Sense::click()))
            .on_hover_cursor(CursorIcon::Text);
        if response.clicked() {
            editor.activate(value);
        }
    }

    ui.data_mut(|d| d.insert_temp(id, editor));
    committed
}

/// Numeric field using `parse` to coerce committed text.
pub fn number(ui: &mut Ui, salt: impl Hash, value: f64, parse: fn(&str) -> f64) -> Option<f64> {
    text(ui, salt, &value.to_string(), Mode::SingleLine).map(|s| parse(&s))
}

pub fn float(ui: &mut Ui, salt: impl Hash, value: f64) -> Option<f64> {
    number(ui, salt, value, coerce::parse_float)
}

pub fn int(ui: &mut Ui, salt: impl Hash, value: f64) -> Option<f64> {
    number(ui, salt, value, coerce::parse_int)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_display_mode() {
        let editor = FieldEditor::new(Mode::SingleLine);
        assert!(!editor.is_editing());
    }

    #[test]
    fn activation_prefills_buffer() {
        let mut editor = FieldEditor::new(Mode::SingleLine);
        editor.activate("INVOMA LTD");
        assert!(editor.is_editing());
        assert_eq!(editor.buffer_mut().map(|b| b.as_str()), Some("INVOMA LTD"));
    }

    #[test]
    fn unchanged_commit_reports_nothing() {
        let mut editor = FieldEditor::new(Mode::SingleLine);
        editor.activate("#LL93784");
        assert_eq!(editor.handle(FieldEvent::FocusLost, "#LL93784"), None);
        assert!(!editor.is_editing());
    }

    #[test]
    fn changed_commit_reports_new_text() {
        let mut editor = FieldEditor::new(Mode::SingleLine);
        editor.activate("#LL93784");
        editor.buffer_mut().unwrap().push('9');
        assert_eq!(editor.handle(FieldEvent::Enter, "#LL93784"), Some("#LL937849".into()));
        assert!(!editor.is_editing());
    }

    #[test]
    fn enter_keeps_multiline_editing() {
        let mut editor = FieldEditor::new(Mode::MultiLine);
        editor.activate("line");
        editor.buffer_mut().unwrap().push_str("\nmore");

        assert_eq!(editor.handle(FieldEvent::Enter, "line"), None);
        assert!(editor.is_editing());
        assert_eq!(editor.handle(FieldEvent::FocusLost, "line"), Some("line\nmore".into()));
    }

    #[test]
    fn events_in_display_mode_are_ignored() {
        let mut editor = FieldEditor::new(Mode::SingleLine);
        assert_eq!(editor.handle(FieldEvent::FocusLost, "x"), None);
    }

    #[test]
    fn number_text_round_trips_like_display() {
        // Committing an untouched numeric field must compare equal.
        let mut editor = FieldEditor::new(Mode::SingleLine);
        let shown = 400.0f64.to_string();
        assert_eq!(shown, "400");
        editor.activate(&shown);
        assert_eq!(editor.handle(FieldEvent::FocusLost, &shown), None);
    }

    #[test]
    fn empty_values_use_placeholder() {
        assert_eq!(display_text(""), None);
        assert_eq!(display_text("0"), Some("0"));
    }
}
