use std::sync::Arc;

use crossterm::event::KeyEvent;

use crate::config::actions::{DialogAction, GlobalAction, NavAction, PickerAction};
use crate::config::keybindings::KeybindingsConfig;

/// Resolves key events against the configured bindings.
pub struct KeyResolver {
    keybindings: Arc<KeybindingsConfig>,
}

impl KeyResolver {
    pub fn new(keybindings: Arc<KeybindingsConfig>) -> Self {
        Self { keybindings }
    }

    pub fn matches_global(&self, event: &KeyEvent, action: GlobalAction) -> bool {
        let kb = &self.keybindings.global;
        match action {
            GlobalAction::Quit => kb.quit.matches(event),
            GlobalAction::Back => kb.back.matches(event),
        }
    }

    pub fn matches_nav(&self, event: &KeyEvent, action: NavAction) -> bool {
        let kb = &self.keybindings.navigation;
        match action {
            NavAction::Up => kb.up.matches(event),
            NavAction::Down => kb.down.matches(event),
            NavAction::PageUp => kb.page_up.matches(event),
            NavAction::PageDown => kb.page_down.matches(event),
            NavAction::Home => kb.home.matches(event),
            NavAction::End => kb.end.matches(event),
        }
    }

    pub fn matches_picker(&self, event: &KeyEvent, action: PickerAction) -> bool {
        let kb = &self.keybindings.picker;
        match action {
            PickerAction::Toggle => kb.toggle.matches(event),
            PickerAction::SelectAll => kb.select_all.matches(event),
            PickerAction::SelectNone => kb.select_none.matches(event),
            PickerAction::Search => kb.search.matches(event),
            PickerAction::NextField => kb.next_field.matches(event),
        }
    }

    pub fn matches_dialog(&self, event: &KeyEvent, action: DialogAction) -> bool {
        let kb = &self.keybindings.dialog;
        match action {
            DialogAction::Confirm => kb.confirm.matches(event),
            DialogAction::Cancel => kb.cancel.matches(event),
            DialogAction::Dismiss => kb.dismiss.matches(event),
        }
    }

    pub fn display_picker(&self, action: PickerAction) -> String {
        let kb = &self.keybindings.picker;
        match action {
            PickerAction::Toggle => kb.toggle.display(),
            PickerAction::SelectAll => kb.select_all.display(),
            PickerAction::SelectNone => kb.select_none.display(),
            PickerAction::Search => kb.search.display(),
            PickerAction::NextField => kb.next_field.display(),
        }
    }

    pub fn display_dialog(&self, action: DialogAction) -> String {
        let kb = &self.keybindings.dialog;
        match action {
            DialogAction::Confirm => kb.confirm.display(),
            DialogAction::Cancel => kb.cancel.display(),
            DialogAction::Dismiss => kb.dismiss.display(),
        }
    }
}
