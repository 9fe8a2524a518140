//! Parse the search box text into a [`SearchQuery`].
//!
//! Syntax, tokens separated by whitespace:
//! - `word` goes to all words; `-word` excludes it
//! - `"exact phrase"` (first one) becomes the exact phrase
//! - `author:name` / `author:"Jane Doe"`, repeatable
//! - `venue:name` (alias `source:`)
//! - `year:2020`, `year:2018..2020`, `year:2018..`, `year:..2020`
//! - `any:a,b,c` for at-least-one-of words
//! - `in:title` restricts matching to titles

use thiserror::Error;

use super::query::{SearchQuery, SortOrder};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryParseError {
  #[error("empty {0} filter")]
  EmptyFilter(&'static str),
  #[error("invalid year filter: {0}")]
  InvalidYear(String),
  #[error("duplicate filter: {0}")]
  DuplicateFilter(&'static str),
}

pub fn parse_query(input: &str, sort: SortOrder) -> Result<SearchQuery, QueryParseError> {
  let mut query = SearchQuery {
    sort,
    ..SearchQuery::default()
  };
  let mut all_words = Vec::new();
  let mut none_words = Vec::new();
  let mut any_words = Vec::new();
  let mut authors = Vec::new();
  let mut phrase_seen = false;
  let mut year_seen = false;

  for token in tokenize(input) {
    if let Some(value) = token.strip_prefix("author:") {
      authors.push(filter_value(value, "author")?);
      continue;
    }
    if let Some(value) = token
      .strip_prefix("venue:")
      .or_else(|| token.strip_prefix("source:"))
    {
      if !query.publication.is_empty() {
        return Err(QueryParseError::DuplicateFilter("venue"));
      }
      query.publication = unquote(&filter_value(value, "venue")?);
      continue;
    }
    if let Some(value) = token.strip_prefix("year:") {
      if year_seen {
        return Err(QueryParseError::DuplicateFilter("year"));
      }
      year_seen = true;
      let (start, end) = parse_year_range(value)?;
      query.start_year = start;
      query.end_year = end;
      continue;
    }
    if let Some(value) = token.strip_prefix("any:") {
      let value = filter_value(value, "any")?;
      any_words.extend(
        value
          .split(',')
          .map(str::trim)
          .filter(|w| !w.is_empty())
          .map(String::from),
      );
      continue;
    }
    if token == "in:title" {
      query.title_only = true;
      continue;
    }
    if token.starts_with('"') {
      if phrase_seen {
        all_words.push(token);
      } else {
        phrase_seen = true;
        query.exact_phrase = unquote(&token);
      }
      continue;
    }
    if let Some(word) = token.strip_prefix('-').filter(|w| !w.is_empty()) {
      none_words.push(word.to_string());
      continue;
    }
    all_words.push(token);
  }

  query.all_words = all_words.join(" ");
  query.none_words = none_words.join(" ");
  query.any_words = any_words.join(" ");
  query.authors = authors.join(" ");

  Ok(query)
}

/// Split on whitespace outside double quotes. Quotes stay in the token.
fn tokenize(input: &str) -> Vec<String> {
  let mut tokens = Vec::new();
  let mut current = String::new();
  let mut in_quotes = false;

  for ch in input.chars() {
    match ch {
      '"' => {
        in_quotes = !in_quotes;
        current.push(ch);
      }
      c if c.is_whitespace() && !in_quotes => {
        if !current.is_empty() {
          tokens.push(std::mem::take(&mut current));
        }
      }
      c => current.push(c),
    }
  }
  if !current.is_empty() {
    tokens.push(current);
  }

  tokens
}

fn filter_value(value: &str, name: &'static str) -> Result<String, QueryParseError> {
  if unquote(value).trim().is_empty() {
    Err(QueryParseError::EmptyFilter(name))
  } else {
    Ok(value.to_string())
  }
}

fn unquote(value: &str) -> String {
  value.trim_matches('"').trim().to_string()
}

fn parse_year_range(value: &str) -> Result<(Option<u16>, Option<u16>), QueryParseError> {
  let invalid = || QueryParseError::InvalidYear(value.to_string());

  let (start, end) = match value.split_once("..").or_else(|| value.split_once('-')) {
    Some((start, end)) => (parse_year(start, value)?, parse_year(end, value)?),
    None => {
      let year = parse_year(value, value)?.ok_or_else(invalid)?;
      (Some(year), Some(year))
    }
  };

  match (start, end) {
    (None, None) => Err(invalid()),
    (Some(s), Some(e)) if s > e => Err(invalid()),
    range => Ok(range),
  }
}

fn parse_year(part: &str, whole: &str) -> Result<Option<u16>, QueryParseError> {
  let part = part.trim();
  if part.is_empty() {
    return Ok(None);
  }
  if part.len() != 4 || !part.chars().all(|c| c.is_ascii_digit()) {
    return Err(QueryParseError::InvalidYear(whole.to_string()));
  }
  part
    .parse()
    .map(Some)
    .map_err(|_| QueryParseError::InvalidYear(whole.to_string()))
}
