use ratatui::prelude::*;
use ratatui::widgets::ListItem;

use super::tags::TagsView;
use super::{DisplayRow, SourceUi};
use crate::ui::renderfns::{compact_count, truncate};
use crate::ui::view::View;
use scour::dockerhub::{DockerHubSource, ImageSummary, SourceFlag};
use scour::scholar::{parse_query, ScholarSource, SearchQuery, SearchResult, SortOrder, UNKNOWN};

const SAVED_MARK: &str = "★ ";
const UNSAVED_MARK: &str = "  ";

fn mark(saved: bool) -> Span<'static> {
  if saved {
    Span::styled(SAVED_MARK, Style::default().fg(Color::Yellow))
  } else {
    Span::raw(UNSAVED_MARK)
  }
}

// ============================================================================
// Google Scholar
// ============================================================================

const SCHOLAR_SORTS: [&str; 2] = [SortOrder::ALL[0].label(), SortOrder::ALL[1].label()];

impl SourceUi for ScholarSource {
  fn title(&self) -> &'static str {
    "Google Scholar"
  }

  fn hint(&self) -> &'static str {
    "words \"exact phrase\" -exclude author:name venue:name year:2018..2020 any:a,b in:title"
  }

  fn build_query(&self, text: &str, sort: usize) -> Result<SearchQuery, String> {
    let sort = SortOrder::ALL[sort % SortOrder::ALL.len()];
    let query = parse_query(text, sort).map_err(|e| e.to_string())?;
    if query.is_blank() {
      return Err("nothing to search for".to_string());
    }
    Ok(query)
  }

  fn sort_labels(&self) -> &'static [&'static str] {
    &SCHOLAR_SORTS
  }
}

impl DisplayRow for SearchResult {
  fn list_item(&self, width: usize, saved: bool) -> ListItem<'static> {
    let width = width.saturating_sub(4).max(10);

    let title = Line::from(vec![
      mark(saved),
      Span::styled(truncate(&self.title, width), Style::default().bold()),
    ]);

    let mut meta = vec![self.authors.clone()];
    if self.venue != UNKNOWN {
      meta.push(self.venue.clone());
    }
    if let Some(year) = self.year {
      meta.push(year.to_string());
    }
    if let Some(cited_by) = self.cited_by {
      meta.push(format!("cited by {}", cited_by));
    }
    if self.pdf_link.is_some() {
      meta.push("[PDF]".to_string());
    }
    let meta = Line::from(vec![
      Span::raw(UNSAVED_MARK),
      Span::styled(
        truncate(&meta.join(" · "), width),
        Style::default().fg(Color::DarkGray),
      ),
    ]);

    ListItem::new(vec![title, meta])
  }

  fn label(&self) -> String {
    truncate(&self.title, 40)
  }
}

// ============================================================================
// Docker Hub
// ============================================================================

impl SourceUi for DockerHubSource {
  fn title(&self) -> &'static str {
    "Docker Hub"
  }

  fn hint(&self) -> &'static str {
    "image name, e.g. postgres (Enter on a result lists its tags)"
  }

  fn build_query(&self, text: &str, _sort: usize) -> Result<String, String> {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
      return Err("nothing to search for".to_string());
    }
    Ok(text)
  }

  fn open(&self, item: &ImageSummary) -> Option<Box<dyn View>> {
    let (namespace, repository) = item.repository_path();
    Some(Box::new(TagsView::new(self.client().clone(), namespace, repository)))
  }
}

fn flag_span(flag: SourceFlag) -> Span<'static> {
  let color = match flag {
    SourceFlag::Official => Color::Green,
    SourceFlag::Verified => Color::Blue,
    SourceFlag::Community => Color::DarkGray,
  };
  Span::styled(format!("[{}]", flag.label()), Style::default().fg(color))
}

impl DisplayRow for ImageSummary {
  fn list_item(&self, width: usize, saved: bool) -> ListItem<'static> {
    let width = width.saturating_sub(4).max(10);

    let mut header = vec![
      mark(saved),
      Span::styled(self.slug.clone(), Style::default().fg(Color::Cyan).bold()),
      Span::raw(" "),
      flag_span(self.flag),
      Span::styled(
        format!("  ★ {}", compact_count(self.star_count)),
        Style::default().fg(Color::Yellow),
      ),
    ];
    if !self.pull_count.is_empty() {
      header.push(Span::styled(
        format!("  ↓ {}", self.pull_count),
        Style::default().fg(Color::DarkGray),
      ));
    }

    let description = Line::from(vec![
      Span::raw(UNSAVED_MARK),
      Span::styled(
        truncate(&self.description, width),
        Style::default().fg(Color::DarkGray),
      ),
    ]);

    ListItem::new(vec![Line::from(header), description])
  }

  fn label(&self) -> String {
    self.slug.clone()
  }
}
