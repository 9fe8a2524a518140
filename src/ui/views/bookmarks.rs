use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use super::DisplayRow;
use crate::ui::renderfns::ensure_valid_selection;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use scour::bookmarks::{BookmarkRecord, BookmarkStore};
use scour::cache::Record;
use scour::notify::Toast;

/// Saved records of one kind, newest first.
pub struct BookmarksView<T: Record> {
  store: BookmarkStore<T>,
  source: &'static str,
  items: Vec<BookmarkRecord<T>>,
  error: Option<String>,
  list_state: ListState,
}

impl<T: Record + DisplayRow> BookmarksView<T> {
  pub fn new(store: BookmarkStore<T>, source: &'static str) -> Self {
    let mut view = Self {
      store,
      source,
      items: Vec::new(),
      error: None,
      list_state: ListState::default(),
    };
    view.reload();
    view
  }

  fn reload(&mut self) {
    match self.store.list() {
      Ok(items) => {
        self.items = items;
        self.error = None;
      }
      Err(e) => {
        self.items.clear();
        self.error = Some(e.to_string());
      }
    }
  }

  fn remove_selected(&mut self) -> ViewAction {
    let Some(bookmark) = self.list_state.selected().and_then(|i| self.items.get(i)) else {
      return ViewAction::None;
    };
    let label = bookmark.record.label();
    let result = self.store.remove(&bookmark.record.record_key());
    self.reload();

    match result {
      Ok(_) => ViewAction::Notify(Toast::success("Removed").with_message(label)),
      Err(e) => ViewAction::Notify(Toast::failure("Failed to remove bookmark", e.to_string())),
    }
  }

  fn clear_all(&mut self) -> ViewAction {
    let result = self.store.clear();
    self.reload();

    match result {
      Ok(removed) => ViewAction::Notify(
        Toast::success("Bookmarks cleared").with_message(format!("{} removed", removed)),
      ),
      Err(e) => ViewAction::Notify(Toast::failure("Failed to clear bookmarks", e.to_string())),
    }
  }
}

impl<T: Record + DisplayRow> View for BookmarksView<T> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
      KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('s') if ctrl => return self.remove_selected(),
      KeyCode::Char('d') if ctrl => return self.clear_all(),
      KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    ensure_valid_selection(&mut self.list_state, self.items.len());

    let block = Block::default()
      .title(format!(" Bookmarks · {} ({}) ", self.source, self.items.len()))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Magenta));

    if self.items.is_empty() {
      let (content, color) = match &self.error {
        Some(e) => (format!("Failed to load bookmarks: {}", e), Color::Red),
        None => (
          "No bookmarks yet. Press Ctrl-S on a result to save it.".to_string(),
          Color::DarkGray,
        ),
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(color));
      frame.render_widget(paragraph, area);
      return;
    }

    let width = area.width as usize;
    let items: Vec<ListItem> = self
      .items
      .iter()
      .map(|bookmark| bookmark.record.list_item(width, true))
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn breadcrumb_label(&self) -> String {
    "Bookmarks".to_string()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("^s", "remove").with_priority(10),
      ShortcutInfo::new("^d", "clear all").with_priority(20),
      ShortcutInfo::new("esc", "back").with_priority(90),
    ]
  }
}
