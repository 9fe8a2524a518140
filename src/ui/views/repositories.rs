use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use super::loader::Loader;
use super::tags::TagsView;
use crate::ui::renderfns::{compact_count, ensure_valid_selection, spinner, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use scour::dockerhub::{DockerHubClient, Repository};
use scour::notify::Toast;

/// Repositories published under one Docker Hub namespace.
pub struct RepositoriesView {
  client: DockerHubClient,
  namespace: String,
  loader: Loader<Vec<Repository>>,
  repositories: Vec<Repository>,
  error: Option<String>,
  list_state: ListState,
  ticks: usize,
}

impl RepositoriesView {
  pub fn new(client: DockerHubClient, namespace: String) -> Self {
    let loader = {
      let client = client.clone();
      let namespace = namespace.clone();
      Loader::spawn(move |cancel| async move {
        client.list_repositories(&namespace, &cancel).await
      })
    };

    Self {
      client,
      namespace,
      loader,
      repositories: Vec::new(),
      error: None,
      list_state: ListState::default(),
      ticks: 0,
    }
  }

  fn open_selected(&self) -> ViewAction {
    let Some(repo) = self
      .list_state
      .selected()
      .and_then(|i| self.repositories.get(i))
    else {
      return ViewAction::None;
    };
    let view = TagsView::new(self.client.clone(), repo.namespace.clone(), repo.name.clone());
    ViewAction::Push(Box::new(view))
  }

  fn status_line(&self) -> (String, Color) {
    match (&self.error, self.loader.is_loading()) {
      (Some(e), _) => (format!("Failed to load repositories: {}", e), Color::Red),
      (None, true) => ("Loading repositories...".to_string(), Color::DarkGray),
      // Anonymous listings only show public repositories
      (None, false) if !self.client.has_credentials() => (
        "No public repositories. Log in to see private ones.".to_string(),
        Color::DarkGray,
      ),
      (None, false) => ("No repositories.".to_string(), Color::DarkGray),
    }
  }
}

fn repository_item(repo: &Repository, width: usize) -> ListItem<'static> {
  let mut spans = vec![Span::styled(
    format!("{:<32}", repo.name),
    Style::default().fg(Color::Cyan),
  )];
  if repo.is_private {
    spans.push(Span::styled("[private] ", Style::default().fg(Color::Yellow)));
  }
  spans.push(Span::styled(
    format!(
      "★ {:<6} ↓ {:<8}",
      compact_count(repo.star_count),
      compact_count(repo.pull_count)
    ),
    Style::default().fg(Color::White),
  ));
  spans.push(Span::styled(
    truncate(&repo.description, width.saturating_sub(50)),
    Style::default().fg(Color::DarkGray),
  ));
  ListItem::new(Line::from(spans))
}

impl View for RepositoriesView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Down => self.list_state.select_next(),
      KeyCode::Enter => return self.open_selected(),
      KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    ensure_valid_selection(&mut self.list_state, self.repositories.len());

    let title = if self.loader.is_loading() {
      format!(" {} Repositories · {} ", spinner(self.ticks), self.namespace)
    } else {
      format!(
        " Repositories · {} ({}) ",
        self.namespace,
        self.repositories.len()
      )
    };
    let block = Block::default()
      .title(title)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.repositories.is_empty() {
      let (content, color) = self.status_line();
      frame.render_widget(
        Paragraph::new(content)
          .block(block)
          .style(Style::default().fg(color)),
        area,
      );
      return;
    }

    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = self
      .repositories
      .iter()
      .map(|repo| repository_item(repo, width))
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
    format!("Repositories [{}]", self.namespace)
  }

  fn tick(&mut self) -> Option<Toast> {
    self.ticks = self.ticks.wrapping_add(1);
    match self.loader.poll()? {
      Ok(repositories) => {
        self.repositories = repositories;
        None
      }
      Err(e) => {
        let toast = Toast::failure("Failed to load repositories", e.clone());
        self.error = Some(e);
        Some(toast)
      }
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("enter", "tags").with_priority(10),
      ShortcutInfo::new("esc", "back").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use mockito::Matcher;
  use scour::transport::{HttpTransport, IdentityPool};
  use std::time::Duration;

  fn client(server: &mockito::Server) -> DockerHubClient {
    let transport =
      HttpTransport::new(IdentityPool::default(), Duration::from_secs(5)).expect("transport");
    DockerHubClient::new(transport).with_base_url(server.url())
  }

  async fn settle(view: &mut RepositoriesView) -> Option<Toast> {
    for _ in 0..200 {
      let toast = view.tick();
      if !view.loader.is_loading() {
        return toast;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("listing never finished");
  }

  #[tokio::test]
  async fn test_enter_opens_tags_of_selected_repository() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("GET", "/v2/repositories/acme/")
      .match_query(Matcher::Any)
      .with_body(
        r#"{"count": 2, "next": null, "results": [
          {"name": "api", "namespace": "acme", "star_count": 3},
          {"name": "web", "namespace": "acme", "is_private": true}
        ]}"#,
      )
      .create_async()
      .await;

    let mut view = RepositoriesView::new(client(&server), "acme".to_string());
    assert!(settle(&mut view).await.is_none());
    assert_eq!(view.repositories.len(), 2);
    assert!(view.repositories[1].is_private);

    view.list_state.select(Some(1));
    let action = view.handle_key(KeyEvent::from(KeyCode::Enter));
    match action {
      ViewAction::Push(tags) => assert_eq!(tags.breadcrumb_label(), "Tags [acme/web]"),
      _ => panic!("expected a pushed tags view"),
    }
  }

  #[tokio::test]
  async fn test_failed_listing_toasts_and_explains() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("GET", "/v2/repositories/ghost/")
      .match_query(Matcher::Any)
      .with_status(500)
      .create_async()
      .await;

    let mut view = RepositoriesView::new(client(&server), "ghost".to_string());
    let toast = settle(&mut view).await.expect("failure toast");
    assert_eq!(toast.title, "Failed to load repositories");
    assert!(view.status_line().0.starts_with("Failed to load repositories"));
    assert!(matches!(
      view.handle_key(KeyEvent::from(KeyCode::Enter)),
      ViewAction::None
    ));
  }

  #[tokio::test]
  async fn test_empty_anonymous_listing_mentions_login() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("GET", "/v2/repositories/quiet/")
      .match_query(Matcher::Any)
      .with_body(r#"{"count": 0, "next": null, "results": []}"#)
      .create_async()
      .await;

    let mut view = RepositoriesView::new(client(&server), "quiet".to_string());
    assert!(settle(&mut view).await.is_none());
    assert!(view.status_line().0.contains("Log in"));
  }
}
