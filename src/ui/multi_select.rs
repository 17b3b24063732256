use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Borders, List, ListItem, ListState};

use crate::Theme;
use crate::config::{KeyResolver, NavAction, PickerAction};
use crate::search::Matcher;
use crate::ui::{Component, EventResult, Result};

const PAGE_STEP: usize = 5;

pub enum MultiSelectEvent {
    /// The set of selected values changed. Carries the new selection in
    /// option order.
    Changed(Vec<String>),
}

/// Searchable multi-value picker over a labeled option set.
///
/// All options start selected. Emits [`MultiSelectEvent::Changed`] whenever
/// the selection is edited; the current value can also be read directly via
/// [`Self::selected_values`].
pub struct MultiSelect {
    title: String,
    options: Vec<String>,
    selected: Vec<bool>,
    /// Indexes into `options` that pass the current filter.
    view: Vec<usize>,
    state: ListState,
    filter: String,
    searching: bool,
    focused: bool,
    matcher: Matcher,
    resolver: Arc<KeyResolver>,
}

impl MultiSelect {
    pub fn new(title: impl Into<String>, options: Vec<String>, resolver: Arc<KeyResolver>) -> Self {
        let mut picker = Self {
            title: title.into(),
            selected: vec![true; options.len()],
            view: Vec::new(),
            state: ListState::default(),
            filter: String::new(),
            searching: false,
            focused: false,
            matcher: Matcher::new(),
            resolver,
            options,
        };
        picker.refresh_view();
        picker
    }

    /// Replace the option set. All new options start selected and any
    /// active filter is dropped.
    pub fn set_options(&mut self, options: Vec<String>) {
        self.selected = vec![true; options.len()];
        self.options = options;
        self.filter.clear();
        self.searching = false;
        self.refresh_view();
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Whether the filter prompt is capturing input.
    pub const fn is_searching(&self) -> bool {
        self.searching
    }

    /// Selected values in option order.
    pub fn selected_values(&self) -> Vec<String> {
        self.options
            .iter()
            .zip(&self.selected)
            .filter(|(_, sel)| **sel)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Current value as a single comma-delimited string.
    pub fn value(&self) -> String {
        self.selected_values().join(",")
    }

    pub fn select_all(&mut self) {
        self.selected.fill(true);
    }

    pub fn select_none(&mut self) {
        self.selected.fill(false);
    }

    /// Toggle the option under the cursor. Returns false when the view is
    /// empty.
    pub fn toggle_current(&mut self) -> bool {
        let Some(cursor) = self.state.selected() else {
            return false;
        };
        let Some(&index) = self.view.get(cursor) else {
            return false;
        };
        self.selected[index] = !self.selected[index];
        true
    }

    fn refresh_view(&mut self) {
        self.view = self
            .options
            .iter()
            .enumerate()
            .filter(|(_, name)| self.filter.is_empty() || self.matcher.matches(name, &self.filter))
            .map(|(i, _)| i)
            .collect();

        if self.view.is_empty() {
            self.state.select(None);
        } else {
            let cursor = self.state.selected().unwrap_or(0);
            self.state.select(Some(cursor.min(self.view.len() - 1)));
        }
    }

    fn changed(&self) -> EventResult<MultiSelectEvent> {
        MultiSelectEvent::Changed(self.selected_values()).into()
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> EventResult<MultiSelectEvent> {
        match key.code {
            KeyCode::Esc => {
                self.searching = false;
                self.filter.clear();
                self.refresh_view();
            }
            KeyCode::Enter => self.searching = false,
            KeyCode::Backspace => {
                self.filter.pop();
                self.refresh_view();
            }
            KeyCode::Up => self.state.select_previous(),
            KeyCode::Down => self.state.select_next(),
            KeyCode::Char(c) => {
                self.filter.push(c);
                self.refresh_view();
            }
            _ => {}
        }
        EventResult::Consumed
    }
}

impl Component for MultiSelect {
    type Output = MultiSelectEvent;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        if self.searching {
            return Ok(self.handle_search_key(key));
        }

        if self.resolver.matches_nav(&key, NavAction::Up) {
            self.state.select_previous();
            return Ok(EventResult::Consumed);
        }
        if self.resolver.matches_nav(&key, NavAction::Down) {
            self.state.select_next();
            return Ok(EventResult::Consumed);
        }
        if self.resolver.matches_nav(&key, NavAction::Home) {
            self.state.select_first();
            return Ok(EventResult::Consumed);
        }
        if self.resolver.matches_nav(&key, NavAction::End) {
            self.state.select_last();
            return Ok(EventResult::Consumed);
        }
        if self.resolver.matches_nav(&key, NavAction::PageDown) {
            let new_index = self.state.selected().map_or(0, |i| {
                usize::min(i + PAGE_STEP, self.view.len().saturating_sub(1))
            });
            self.state.select(Some(new_index));
            return Ok(EventResult::Consumed);
        }
        if self.resolver.matches_nav(&key, NavAction::PageUp) {
            let new_index = self.state.selected().map_or(0, |i| i.saturating_sub(PAGE_STEP));
            self.state.select(Some(new_index));
            return Ok(EventResult::Consumed);
        }
        if self.resolver.matches_picker(&key, PickerAction::Toggle) {
            if self.toggle_current() {
                return Ok(self.changed());
            }
            return Ok(EventResult::Consumed);
        }
        if self.resolver.matches_picker(&key, PickerAction::SelectAll) {
            self.select_all();
            return Ok(self.changed());
        }
        if self.resolver.matches_picker(&key, PickerAction::SelectNone) {
            self.select_none();
            return Ok(self.changed());
        }
        if self.resolver.matches_picker(&key, PickerAction::Search) {
            self.searching = true;
            return Ok(EventResult::Consumed);
        }

        Ok(EventResult::Ignored)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let border_color = if self.focused {
            theme.border_focused()
        } else {
            theme.border()
        };

        let selected_count = self.selected.iter().filter(|s| **s).count();
        let title = format!(" {} ({selected_count}/{}) ", self.title, self.options.len());
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color));

        let mut inner = block.inner(area);
        frame.render_widget(block, area);

        if self.searching || !self.filter.is_empty() {
            let filter_area = Rect::new(
                inner.x,
                inner.y + inner.height.saturating_sub(1),
                inner.width,
                1,
            );
            inner.height = inner.height.saturating_sub(1);
            let line = Line::styled(
                format!("/{}", self.filter),
                Style::default().fg(theme.peach()),
            );
            frame.render_widget(line, filter_area);
        }

        let items: Vec<ListItem> = self
            .view
            .iter()
            .map(|&i| {
                let mark = if self.selected[i] { "[x]" } else { "[ ]" };
                ListItem::new(format!("{mark} {}", self.options[i]))
                    .style(Style::default().fg(theme.text()))
            })
            .collect();

        let list = List::new(items)
            .highlight_style(
                Style::default()
                    .bg(theme.selection_bg())
                    .fg(theme.lavender())
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        frame.render_stateful_widget(list, inner, &mut self.state);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crossterm::event::{KeyEvent, KeyModifiers};

    use super::*;
    use crate::config::keybindings::KeybindingsConfig;

    fn resolver() -> Arc<KeyResolver> {
        Arc::new(KeyResolver::new(Arc::new(KeybindingsConfig::default())))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn picker() -> MultiSelect {
        MultiSelect::new(
            "Services",
            vec!["a1".to_string(), "a2".to_string(), "a3".to_string()],
            resolver(),
        )
    }

    #[test]
    fn all_options_start_selected() {
        let picker = picker();
        assert_eq!(picker.value(), "a1,a2,a3");
    }

    #[test]
    fn toggle_emits_changed_with_remaining_values() {
        let mut picker = picker();
        let result = picker.handle_key(key(KeyCode::Char(' '))).unwrap();
        let EventResult::Event(MultiSelectEvent::Changed(values)) = result else {
            panic!("expected a change event");
        };
        assert_eq!(values, vec!["a2", "a3"]);
    }

    #[test]
    fn select_none_yields_empty_value() {
        let mut picker = picker();
        picker.select_none();
        assert!(picker.value().is_empty());
    }

    #[test]
    fn set_options_reselects_everything() {
        let mut picker = picker();
        picker.select_none();
        picker.set_options(vec!["b1".to_string(), "b2".to_string()]);
        assert_eq!(picker.value(), "b1,b2");
    }

    #[test]
    fn search_narrows_the_view_without_touching_selection() {
        let mut picker = MultiSelect::new(
            "Services",
            vec!["hadoop".to_string(), "hive".to_string(), "hbase".to_string()],
            resolver(),
        );
        picker.handle_key(key(KeyCode::Char('/'))).unwrap();
        picker.handle_key(key(KeyCode::Char('v'))).unwrap();
        assert_eq!(picker.view, vec![1]);
        assert_eq!(picker.value(), "hadoop,hive,hbase");

        // Toggle applies to the filtered row, not the raw cursor index.
        picker.handle_key(key(KeyCode::Enter)).unwrap();
        picker.handle_key(key(KeyCode::Char(' '))).unwrap();
        assert_eq!(picker.value(), "hadoop,hbase");
    }

    #[test]
    fn unbound_keys_are_ignored() {
        let mut picker = picker();
        let result = picker.handle_key(key(KeyCode::Char('q'))).unwrap();
        assert!(!result.is_consumed());
    }
}
