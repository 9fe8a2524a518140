use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use super::loader::Loader;
use super::repositories::RepositoriesView;
use crate::ui::renderfns::{ensure_valid_selection, spinner};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use scour::dockerhub::{DockerHubClient, Tag};
use scour::notify::Toast;

/// Tags of one Docker Hub repository.
pub struct TagsView {
  client: DockerHubClient,
  namespace: String,
  repository: String,
  loader: Loader<Vec<Tag>>,
  tags: Vec<Tag>,
  error: Option<String>,
  list_state: ListState,
  ticks: usize,
}

impl TagsView {
  pub fn new(client: DockerHubClient, namespace: String, repository: String) -> Self {
    let loader = {
      let client = client.clone();
      let (namespace, repository) = (namespace.clone(), repository.clone());
      Loader::spawn(move |cancel| async move {
        client.list_tags(&namespace, &repository, &cancel).await
      })
    };

    Self {
      client,
      namespace,
      repository,
      loader,
      tags: Vec::new(),
      error: None,
      list_state: ListState::default(),
      ticks: 0,
    }
  }

  fn is_loading(&self) -> bool {
    self.loader.is_loading()
  }

  fn image(&self) -> String {
    format!("{}/{}", self.namespace, self.repository)
  }
}

fn human_size(bytes: u64) -> String {
  const MB: f64 = 1024.0 * 1024.0;
  format!("{:.1} MB", bytes as f64 / MB)
}

impl View for TagsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Down => self.list_state.select_next(),
      KeyCode::Esc => return ViewAction::Pop,
      KeyCode::Char('o') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        let view = RepositoriesView::new(self.client.clone(), self.namespace.clone());
        return ViewAction::Push(Box::new(view));
      }
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    ensure_valid_selection(&mut self.list_state, self.tags.len());

    let title = if self.is_loading() {
      format!(" {} Tags · {} ", spinner(self.ticks), self.image())
    } else {
      format!(" Tags · {} ({}) ", self.image(), self.tags.len())
    };
    let block = Block::default()
      .title(title)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.tags.is_empty() {
      let (content, color) = match (&self.error, self.is_loading()) {
        (Some(e), _) => (format!("Failed to load tags: {}", e), Color::Red),
        (None, true) => ("Loading tags...".to_string(), Color::DarkGray),
        (None, false) => ("No tags.".to_string(), Color::DarkGray),
      };
      frame.render_widget(
        Paragraph::new(content)
          .block(block)
          .style(Style::default().fg(color)),
        area,
      );
      return;
    }

    let items: Vec<ListItem> = self
      .tags
      .iter()
      .map(|tag| {
        let updated = tag
          .last_updated
          .map(|t| t.format("%Y-%m-%d").to_string())
          .unwrap_or_default();
        let size = tag.full_size.map(human_size).unwrap_or_default();
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:<32}", tag.name), Style::default().fg(Color::Cyan)),
          Span::styled(format!("{:>12}", size), Style::default().fg(Color::White)),
          Span::raw("  "),
          Span::styled(updated, Style::default().fg(Color::DarkGray)),
        ]))
      })
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
    format!("Tags [{}]", self.image())
  }

  fn tick(&mut self) -> Option<Toast> {
    self.ticks = self.ticks.wrapping_add(1);
    match self.loader.poll()? {
      Ok(tags) => {
        self.tags = tags;
        None
      }
      Err(e) => {
        let toast = Toast::failure("Failed to load tags", e.clone());
        self.error = Some(e);
        Some(toast)
      }
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("ctrl-o", "repositories").with_priority(50),
      ShortcutInfo::new("esc", "back").with_priority(90),
    ]
  }
}
