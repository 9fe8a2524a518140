pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Breadcrumb and toast
    ])
    .split(frame.area());

  let source = app.source_title();
  let shortcuts = app.current_view().shortcuts();
  renderfns::draw_header(frame, chunks[0], &source, &shortcuts);

  app.current_view_mut().render(frame, chunks[1]);

  let breadcrumb = app.breadcrumb();
  renderfns::draw_footer(frame, chunks[2], &breadcrumb, app.toast());
}
