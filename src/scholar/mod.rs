//! Google Scholar: query building, HTML parsing and the page source.

mod parser;
mod query;
mod query_parser;
mod source;
mod types;

pub use parser::{parse_meta, parse_results};
pub use query::{SearchQuery, SortOrder, DEFAULT_PAGE_SIZE};
pub use query_parser::{parse_query, QueryParseError};
pub use source::{ScholarSource, SCHOLAR_URL};
pub use types::{AuthorProfile, ProfileKind, SearchResult, UNKNOWN};
