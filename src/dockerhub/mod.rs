//! Docker Hub: image search plus the authenticated `/v2` list endpoints.

mod api_types;
mod client;
mod parser;
mod source;
mod types;

pub use client::{DockerHubClient, HUB_API_URL};
pub use parser::{parse_search, SearchPage};
pub use source::{DockerHubSource, DEFAULT_PAGE_SIZE};
pub use types::{ImageSummary, Repository, SourceFlag, Tag, HUB_WEB_URL};
