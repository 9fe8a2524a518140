use super::input::{InputResult, TextInput};
use super::KeyResult;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use std::time::{Duration, Instant};

/// Events emitted by the search box that the parent view acts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
  /// Enter pressed; search now without waiting for the debounce
  Submitted(String),
  /// Esc pressed on a non-empty box; text is gone
  Cleared,
}

/// Always-focused search line with search-as-you-type debounce.
#[derive(Debug, Clone)]
pub struct SearchBox {
  input: TextInput,
  debounce: Duration,
  /// When the pending text should be searched
  deadline: Option<Instant>,
}

impl SearchBox {
  pub fn new(debounce: Duration) -> Self {
    Self {
      input: TextInput::new(),
      debounce,
      deadline: None,
    }
  }

  pub fn text(&self) -> &str {
    self.input.value()
  }

  /// Fill the box and search on the next poll.
  pub fn set_text(&mut self, text: impl Into<String>) {
    self.input.set_value(text);
    self.deadline = Some(Instant::now());
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<SearchEvent> {
    match self.input.handle_key(key) {
      InputResult::Changed => {
        self.deadline = Some(Instant::now() + self.debounce);
        KeyResult::Handled
      }
      InputResult::Consumed => KeyResult::Handled,
      InputResult::Submitted(text) => {
        self.deadline = None;
        KeyResult::Event(SearchEvent::Submitted(text))
      }
      InputResult::Cancelled if self.input.is_empty() => KeyResult::NotHandled,
      InputResult::Cancelled => {
        self.input.clear();
        self.deadline = None;
        KeyResult::Event(SearchEvent::Cleared)
      }
      InputResult::NotHandled => KeyResult::NotHandled,
    }
  }

  /// Text to search for, once typing has paused for the debounce period.
  pub fn poll(&mut self) -> Option<String> {
    self.poll_at(Instant::now())
  }

  fn poll_at(&mut self, now: Instant) -> Option<String> {
    match self.deadline {
      Some(deadline) if now >= deadline => {
        self.deadline = None;
        Some(self.input.value().to_string())
      }
      _ => None,
    }
  }

  pub fn render(&self, frame: &mut Frame, area: Rect, title: &str, hint: &str) {
    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" {} ", title));

    let line = if self.input.is_empty() {
      Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Yellow)),
        Span::styled(hint.to_string(), Style::default().fg(Color::DarkGray)),
      ])
    } else {
      let (before, after) = split_at_char(self.input.value(), self.input.cursor_position());
      Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Yellow)),
        Span::raw(before.to_string()),
        Span::styled("_", Style::default().fg(Color::Yellow)), // Cursor
        Span::raw(after.to_string()),
      ])
    };

    frame.render_widget(Paragraph::new(line).block(block), area);
  }
}

fn split_at_char(text: &str, index: usize) -> (&str, &str) {
  let at = text
    .char_indices()
    .nth(index)
    .map(|(i, _)| i)
    .unwrap_or(text.len());
  text.split_at(at)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::{KeyCode, KeyModifiers};

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_typing_waits_for_debounce() {
    let mut search = SearchBox::new(Duration::from_millis(400));
    search.handle_key(key(KeyCode::Char('r')));
    search.handle_key(key(KeyCode::Char('s')));

    let now = Instant::now();
    assert_eq!(search.poll_at(now), None);
    assert_eq!(
      search.poll_at(now + Duration::from_millis(500)),
      Some("rs".to_string())
    );
    assert_eq!(search.poll_at(now + Duration::from_secs(1)), None);
  }

  #[test]
  fn test_enter_skips_debounce() {
    let mut search = SearchBox::new(Duration::from_secs(10));
    search.handle_key(key(KeyCode::Char('x')));
    assert_eq!(
      search.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(SearchEvent::Submitted("x".to_string()))
    );
    assert_eq!(search.poll_at(Instant::now() + Duration::from_secs(60)), None);
  }

  #[test]
  fn test_escape_clears_then_passes_through() {
    let mut search = SearchBox::new(Duration::ZERO);
    search.handle_key(key(KeyCode::Char('x')));
    assert_eq!(
      search.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(SearchEvent::Cleared)
    );
    assert_eq!(search.text(), "");
    assert_eq!(search.handle_key(key(KeyCode::Esc)), KeyResult::NotHandled);
  }

  #[test]
  fn test_set_text_searches_on_next_poll() {
    let mut search = SearchBox::new(Duration::from_secs(10));
    search.set_text("initial query");
    assert_eq!(search.poll(), Some("initial query".to_string()));
  }

  #[test]
  fn test_split_at_char() {
    assert_eq!(split_at_char("héllo", 2), ("hé", "llo"));
    assert_eq!(split_at_char("abc", 10), ("abc", ""));
  }
}
