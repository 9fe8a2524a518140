use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use std::collections::HashSet;
use std::time::Duration;
use tracing::warn;

use super::{BookmarksView, DisplayRow, SourceUi};
use crate::ui::components::{KeyResult, SearchBox, SearchEvent};
use crate::ui::renderfns::{ensure_valid_selection, spinner};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use scour::bookmarks::BookmarkStore;
use scour::cache::Record;
use scour::notify::Toast;
use scour::search::{SearchSession, SessionState};

const RETRY_HINT: &str = "Press Ctrl-R to retry.";

/// What went wrong, for the states that need a manual retry.
fn failure_text(state: &SessionState) -> Option<String> {
  match state {
    SessionState::Blocked(message) => Some(message.clone()),
    SessionState::Failed(message) => Some(format!("Search failed: {}", message)),
    _ => None,
  }
}

/// One-line failure notice shown under a partially loaded list.
fn failure_footer(state: &SessionState) -> Option<Line<'static>> {
  let message = failure_text(state)?;
  Some(Line::from(vec![
    Span::styled(message, Style::default().fg(Color::Red)),
    Span::raw("  "),
    Span::styled(RETRY_HINT, Style::default().fg(Color::DarkGray)),
  ]))
}

/// Search-as-you-type over one source, with paging and bookmarks.
pub struct SearchView<S: SourceUi> {
  session: SearchSession<S>,
  bookmarks: BookmarkStore<S::Item>,
  search: SearchBox,
  list_state: ListState,
  /// Identities of bookmarked records
  saved: HashSet<String>,
  /// Index into the source's sort labels
  sort: usize,
  /// Text of the last search issued
  searched: String,
  ticks: usize,
}

impl<S: SourceUi> SearchView<S>
where
  S::Item: DisplayRow,
{
  pub fn new(session: SearchSession<S>, bookmarks: BookmarkStore<S::Item>, debounce: Duration) -> Self {
    let mut view = Self {
      session,
      bookmarks,
      search: SearchBox::new(debounce),
      list_state: ListState::default(),
      saved: HashSet::new(),
      sort: 0,
      searched: String::new(),
      ticks: 0,
    };
    view.refresh_saved();
    view
  }

  /// Start with text already typed; it is searched on the first tick.
  pub fn with_initial_query(mut self, text: &str) -> Self {
    if !text.trim().is_empty() {
      self.search.set_text(text);
    }
    self
  }

  fn selected(&self) -> Option<&S::Item> {
    self
      .list_state
      .selected()
      .and_then(|i| self.session.results().get(i))
  }

  fn refresh_saved(&mut self) {
    match self.bookmarks.list() {
      Ok(saved) => {
        self.saved = saved.iter().map(|b| b.record.record_key()).collect();
      }
      Err(e) => warn!(error = %e, "failed to load bookmarks"),
    }
  }

  fn run_search(&mut self, text: &str) -> Option<Toast> {
    self.searched = text.to_string();

    if text.trim().is_empty() {
      self.session.reset();
      self.list_state.select(None);
      return None;
    }

    match self.session.source().build_query(text, self.sort) {
      Ok(query) => {
        self.session.search(query);
        self.list_state.select(Some(0));
        None
      }
      Err(e) => Some(Toast::failure("Invalid query", e)),
    }
  }

  fn move_down(&mut self) {
    let len = self.session.results().len();
    match self.list_state.selected() {
      Some(i) if i + 1 >= len => {
        // Reaching the end pulls in the next page
        self.session.load_more();
      }
      _ => self.list_state.select_next(),
    }
  }

  fn toggle_bookmark(&mut self) -> ViewAction {
    let Some(item) = self.selected().cloned() else {
      return ViewAction::None;
    };

    let toast = match self.bookmarks.toggle(&item) {
      Ok(true) => {
        self.saved.insert(item.record_key());
        Toast::success("Saved").with_message(item.label())
      }
      Ok(false) => {
        self.saved.remove(&item.record_key());
        Toast::success("Removed").with_message(item.label())
      }
      Err(e) => Toast::failure("Failed to update bookmarks", e.to_string()),
    };
    ViewAction::Notify(toast)
  }

  fn cycle_sort(&mut self) -> ViewAction {
    let labels = self.session.source().sort_labels();
    if labels.is_empty() {
      return ViewAction::Notify(Toast::info("No sort options for this source"));
    }

    self.sort = (self.sort + 1) % labels.len();
    // A new sort is a new query
    let text = self.search.text().to_string();
    let toast = self
      .run_search(&text)
      .unwrap_or_else(|| Toast::info(format!("Sorted by {}", labels[self.sort])));
    ViewAction::Notify(toast)
  }

  fn status_title(&self) -> String {
    let count = self.session.results().len();
    let more = if self.session.has_more() { "+" } else { "" };

    match self.session.state() {
      SessionState::Idle => " Results ".to_string(),
      SessionState::Fetching if count > 0 => {
        format!(" {} Loading more... ({}) ", spinner(self.ticks), count)
      }
      SessionState::Fetching => format!(" {} Searching... ", spinner(self.ticks)),
      SessionState::Retrying { attempt, delay } => format!(
        " Rate limited, retrying in {}s (attempt {}) ",
        delay.as_secs(),
        attempt
      ),
      SessionState::Ready => format!(" Results ({}{}) ", count, more),
      SessionState::Empty => " No results ".to_string(),
      SessionState::Blocked(_) => format!(" Blocked ({}) ", count),
      SessionState::Failed(_) => format!(" Failed ({}) ", count),
    }
  }

  /// Message for an empty list, with its color.
  fn placeholder(&self) -> (String, Color) {
    match self.session.state() {
      SessionState::Idle => (
        format!("Type to search {}.", self.session.source().title()),
        Color::DarkGray,
      ),
      SessionState::Fetching => ("Searching...".to_string(), Color::DarkGray),
      SessionState::Retrying { attempt, delay } => (
        format!(
          "Rate limited. Retrying in {}s (attempt {}).",
          delay.as_secs(),
          attempt
        ),
        Color::Yellow,
      ),
      SessionState::Ready | SessionState::Empty => {
        ("No results for this query.".to_string(), Color::DarkGray)
      }
      SessionState::Blocked(_) | SessionState::Failed(_) => {
        let message = failure_text(self.session.state()).unwrap_or_default();
        (format!("{}\n\n{}", message, RETRY_HINT), Color::Red)
      }
    }
  }

  fn render_results(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.session.results().len();
    ensure_valid_selection(&mut self.list_state, len);

    let border = match self.session.state() {
      SessionState::Blocked(_) | SessionState::Failed(_) => Color::Red,
      SessionState::Retrying { .. } => Color::Yellow,
      _ => Color::Blue,
    };
    let block = Block::default()
      .title(self.status_title())
      .borders(Borders::ALL)
      .border_style(Style::default().fg(border));

    if len == 0 {
      let (message, color) = self.placeholder();
      let paragraph = Paragraph::new(message)
        .block(block)
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(color));
      frame.render_widget(paragraph, area);
      return;
    }

    // Keep the rows that did load and explain the failure below them
    let area = match failure_footer(self.session.state()) {
      Some(footer) => {
        let [list_area, footer_area] =
          Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);
        frame.render_widget(Paragraph::new(footer), footer_area);
        list_area
      }
      None => area,
    };

    let width = area.width as usize;
    let items: Vec<ListItem> = self
      .session
      .results()
      .iter()
      .map(|item| item.list_item(width, self.saved.contains(&item.record_key())))
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
}

impl<S: SourceUi> View for SearchView<S>
where
  S::Item: DisplayRow,
{
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
      KeyCode::Up => {
        self.list_state.select_previous();
        return ViewAction::None;
      }
      KeyCode::Down => {
        self.move_down();
        return ViewAction::None;
      }
      KeyCode::Tab => return ViewAction::SwitchSource,
      KeyCode::Char('l') if ctrl => {
        self.session.load_more();
        return ViewAction::None;
      }
      KeyCode::Char('s') if ctrl => return self.toggle_bookmark(),
      KeyCode::Char('t') if ctrl => return self.cycle_sort(),
      KeyCode::Char('r') if ctrl => {
        return if self.session.retry() {
          ViewAction::None
        } else {
          ViewAction::Notify(Toast::info("Nothing to retry"))
        };
      }
      KeyCode::Char('x') if ctrl => return ViewAction::Notify(self.session.clear_cache()),
      KeyCode::Char('b') if ctrl => {
        let view = BookmarksView::new(self.bookmarks.clone(), self.session.source().title());
        return ViewAction::Push(Box::new(view));
      }
      _ => {}
    }

    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Submitted(text)) => {
        if text == self.searched {
          // Same text again: open the selected record
          let opened = self.selected().and_then(|item| self.session.source().open(item));
          return match opened {
            Some(view) => ViewAction::Push(view),
            None => ViewAction::None,
          };
        }
        match self.run_search(&text) {
          Some(toast) => ViewAction::Notify(toast),
          None => ViewAction::None,
        }
      }
      KeyResult::Event(SearchEvent::Cleared) => {
        self.run_search("");
        ViewAction::None
      }
      KeyResult::Handled => ViewAction::None,
      KeyResult::NotHandled if key.code == KeyCode::Esc => ViewAction::Quit,
      KeyResult::NotHandled => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(3), Constraint::Min(1)])
      .split(area);

    let source = self.session.source();
    let labels = source.sort_labels();
    let title = match labels.get(self.sort) {
      Some(label) => format!("{} · sort: {}", source.title(), label),
      None => source.title().to_string(),
    };
    self.search.render(frame, chunks[0], &title, source.hint());

    self.render_results(frame, chunks[1]);
  }

  fn breadcrumb_label(&self) -> String {
    self.session.source().title().to_string()
  }

  fn tick(&mut self) -> Option<Toast> {
    self.ticks = self.ticks.wrapping_add(1);

    let mut toast = None;
    if let Some(text) = self.search.poll() {
      toast = self.run_search(&text);
    }
    self.session.poll();
    toast.or_else(|| self.session.take_toast())
  }

  fn focus(&mut self) {
    self.refresh_saved();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    let mut shortcuts = vec![
      ShortcutInfo::new("tab", "source").with_priority(10),
      ShortcutInfo::new("^s", "save").with_priority(20),
      ShortcutInfo::new("^b", "bookmarks").with_priority(30),
      ShortcutInfo::new("^l", "more").with_priority(40),
      ShortcutInfo::new("^r", "retry").with_priority(60),
      ShortcutInfo::new("^x", "clear cache").with_priority(70),
      ShortcutInfo::new("esc", "quit").with_priority(90),
    ];
    if !self.session.source().sort_labels().is_empty() {
      shortcuts.push(ShortcutInfo::new("^t", "sort").with_priority(50));
    }
    shortcuts
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_failure_footer_keeps_retry_guidance() {
    let blocked = SessionState::Blocked("Too many requests. Wait or change network.".to_string());
    let footer = failure_footer(&blocked).expect("footer for blocked");
    assert_eq!(
      footer.to_string(),
      "Too many requests. Wait or change network.  Press Ctrl-R to retry."
    );

    let failed = SessionState::Failed("timed out".to_string());
    let footer = failure_footer(&failed).expect("footer for failed");
    assert!(footer.to_string().starts_with("Search failed: timed out"));
    assert!(footer.to_string().ends_with(RETRY_HINT));
  }

  #[test]
  fn test_no_footer_while_healthy() {
    assert!(failure_footer(&SessionState::Ready).is_none());
    assert!(failure_footer(&SessionState::Fetching).is_none());
    assert!(failure_text(&SessionState::Empty).is_none());
  }
}
