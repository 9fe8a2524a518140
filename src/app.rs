use crate::event::{Event, EventHandler};
use crate::ui;
use crate::ui::view::{View, ViewAction};
use crate::ui::views::SearchView;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use scour::bookmarks::BookmarkStore;
use scour::cache::ResponseCache;
use scour::config::{Config, SourceKind};
use scour::dockerhub::{DockerHubClient, DockerHubSource};
use scour::notify::Toast;
use scour::scholar::ScholarSource;
use scour::search::SearchSession;
use scour::store::KvStore;
use scour::transport::{HttpTransport, IdentityPool};
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const TICK_RATE: Duration = Duration::from_millis(100);

/// Main application state
pub struct App {
  /// One root search view per source; both keep their state while hidden
  scholar: Box<dyn View>,
  dockerhub: Box<dyn View>,
  active: SourceKind,

  /// Views pushed on top of the active root (bookmarks, tags)
  stack: Vec<Box<dyn View>>,

  toast: Option<Toast>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(
    config: &Config,
    store: Arc<dyn KvStore>,
    source: SourceKind,
    initial_query: Option<&str>,
  ) -> Result<Self> {
    let identities = IdentityPool::new(config.transport.user_agents.clone());
    let transport = HttpTransport::new(identities, config.transport.timeout())?;

    let cache = ResponseCache::new(store.clone()).with_ttl(config.cache.ttl());
    let swept = cache.clear_expired();
    if swept > 0 {
      info!(swept, "removed expired cache entries");
    }

    let scholar = ScholarSource::new(transport.clone())
      .with_base_url(&config.scholar.base_url)
      .with_language(&config.scholar.language)
      .with_page_size(config.scholar.page_size);

    let mut client = DockerHubClient::new(transport).with_base_url(&config.dockerhub.base_url);
    if let (Some(username), Some(secret)) = (&config.dockerhub.username, Config::dockerhub_token()) {
      debug!(username = %username, "docker hub credentials configured");
      client = client.with_credentials(username, secret);
    }
    let dockerhub = DockerHubSource::new(client).with_page_size(config.dockerhub.page_size);

    let policy = config.retry.policy();
    let debounce = config.ui.debounce();

    let mut scholar_view = SearchView::new(
      SearchSession::new(Arc::new(scholar), cache.clone(), policy),
      BookmarkStore::new(store.clone()),
      debounce,
    );
    let mut dockerhub_view = SearchView::new(
      SearchSession::new(Arc::new(dockerhub), cache, policy),
      BookmarkStore::new(store),
      debounce,
    );

    if let Some(text) = initial_query {
      match source {
        SourceKind::Scholar => scholar_view = scholar_view.with_initial_query(text),
        SourceKind::Dockerhub => dockerhub_view = dockerhub_view.with_initial_query(text),
      }
    }

    Ok(Self {
      scholar: Box::new(scholar_view),
      dockerhub: Box::new(dockerhub_view),
      active: source,
      stack: Vec::new(),
      toast: None,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.event_loop(&mut terminal).await;

    // Cleanup terminal, even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);

    while !self.should_quit() {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Tick) => self.tick(),
        None => break,
      }
    }

    Ok(())
  }

  fn tick(&mut self) {
    if self.toast.as_ref().is_some_and(Toast::is_expired) {
      self.toast = None;
    }

    // Hidden roots keep polling so their searches land
    let mut toasts = vec![self.scholar.tick(), self.dockerhub.tick()];
    if let Some(top) = self.stack.last_mut() {
      toasts.push(top.tick());
    }
    if let Some(toast) = toasts.into_iter().flatten().last() {
      self.toast = Some(toast);
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let action = self.current_view_mut().handle_key(key);
    self.apply(action);
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.stack.push(view),
      ViewAction::Pop => {
        self.stack.pop();
        self.current_view_mut().focus();
      }
      ViewAction::SwitchSource => {
        self.stack.clear();
        self.active = match self.active {
          SourceKind::Scholar => SourceKind::Dockerhub,
          SourceKind::Dockerhub => SourceKind::Scholar,
        };
        self.current_view_mut().focus();
      }
      ViewAction::Notify(toast) => self.toast = Some(toast),
      ViewAction::Quit => self.should_quit = true,
    }
  }

  fn root(&self) -> &dyn View {
    match self.active_source() {
      SourceKind::Scholar => self.scholar.as_ref(),
      SourceKind::Dockerhub => self.dockerhub.as_ref(),
    }
  }

  // Accessors for UI rendering
  pub fn current_view(&self) -> &dyn View {
    match self.stack.last() {
      Some(view) => view.as_ref(),
      None => self.root(),
    }
  }

  pub fn current_view_mut(&mut self) -> &mut dyn View {
    match self.stack.last_mut() {
      Some(view) => view.as_mut(),
      None => match self.active {
        SourceKind::Scholar => self.scholar.as_mut(),
        SourceKind::Dockerhub => self.dockerhub.as_mut(),
      },
    }
  }

  pub fn active_source(&self) -> SourceKind {
    self.active
  }

  pub fn source_title(&self) -> String {
    self.root().breadcrumb_label()
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    std::iter::once(self.root().breadcrumb_label())
      .chain(self.stack.iter().map(|v| v.breadcrumb_label()))
      .collect()
  }

  pub fn toast(&self) -> Option<&Toast> {
    self.toast.as_ref()
  }

  pub fn should_quit(&self) -> bool {
    self.should_quit
  }
}
