mod bookmarks;
mod loader;
mod repositories;
mod search;
mod sources;
mod tags;

pub use bookmarks::BookmarksView;
pub use search::SearchView;

use ratatui::widgets::ListItem;

use crate::ui::view::View;
use scour::search::PageSource;

/// How a record shows up in a list.
pub trait DisplayRow {
  /// List entry; `saved` marks bookmarked records
  fn list_item(&self, width: usize, saved: bool) -> ListItem<'static>;

  /// Short name for toasts
  fn label(&self) -> String;
}

/// What the search view needs from a source beyond fetching pages.
pub trait SourceUi: PageSource<Item: DisplayRow> {
  /// Display name, e.g. "Google Scholar"
  fn title(&self) -> &'static str;

  /// Placeholder shown in an empty search box
  fn hint(&self) -> &'static str;

  /// Turn search box text into a query.
  fn build_query(&self, text: &str, sort: usize) -> Result<Self::Query, String>;

  fn sort_labels(&self) -> &'static [&'static str] {
    &[]
  }

  /// Detail view for a record, if the source has one
  fn open(&self, _item: &Self::Item) -> Option<Box<dyn View>> {
    None
  }
}
