use url::form_urlencoded;

/// Scholar's own page size when `num` is not sent.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Result ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
  #[default]
  Relevance,
  Date,
}

impl SortOrder {
  pub const ALL: [SortOrder; 2] = [SortOrder::Relevance, SortOrder::Date];

  pub const fn label(self) -> &'static str {
    match self {
      SortOrder::Relevance => "relevance",
      SortOrder::Date => "date",
    }
  }
}

/// Canonicalized Scholar search filters plus a page offset.
///
/// Changing any filter means a new query; only [`SearchQuery::with_offset`]
/// derives a continuation of the same one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
  pub all_words: String,
  pub exact_phrase: String,
  pub any_words: String,
  pub none_words: String,
  pub authors: String,
  pub publication: String,
  pub start_year: Option<u16>,
  pub end_year: Option<u16>,
  pub sort: SortOrder,
  pub title_only: bool,
  pub(crate) offset: usize,
}

impl SearchQuery {
  /// Query matching all of `words`.
  pub fn all_words(words: impl Into<String>) -> Self {
    Self {
      all_words: words.into(),
      ..Self::default()
    }
  }

  pub fn offset(&self) -> usize {
    self.offset
  }

  /// Same filters, different page.
  pub fn with_offset(&self, offset: usize) -> Self {
    Self {
      offset,
      ..self.clone()
    }
  }

  pub fn with_sort(&self, sort: SortOrder) -> Self {
    Self {
      sort,
      offset: 0,
      ..self.clone()
    }
  }

  /// True when there is nothing to search for.
  pub fn is_blank(&self) -> bool {
    [
      &self.all_words,
      &self.exact_phrase,
      &self.any_words,
      &self.authors,
      &self.publication,
    ]
    .iter()
    .all(|field| field.trim().is_empty())
  }

  /// Build the fully-qualified search URL.
  ///
  /// Empty filters are omitted so equivalent queries produce identical URLs.
  pub fn to_url(&self, base_url: &str, language: &str, page_size: usize) -> String {
    let mut params = form_urlencoded::Serializer::new(String::new());

    let text_fields = [
      ("as_q", &self.all_words),
      ("as_epq", &self.exact_phrase),
      ("as_oq", &self.any_words),
      ("as_eq", &self.none_words),
      ("as_sauthors", &self.authors),
      ("as_publication", &self.publication),
    ];
    for (name, value) in text_fields {
      let value = normalize(value);
      if !value.is_empty() {
        params.append_pair(name, &value);
      }
    }

    if let Some(year) = self.start_year {
      params.append_pair("as_ylo", &year.to_string());
    }
    if let Some(year) = self.end_year {
      params.append_pair("as_yhi", &year.to_string());
    }
    if self.title_only {
      params.append_pair("as_occt", "title");
    }
    if self.sort == SortOrder::Date {
      params.append_pair("scisbd", "1");
    }
    if !language.is_empty() {
      params.append_pair("hl", language);
    }
    if page_size != DEFAULT_PAGE_SIZE {
      params.append_pair("num", &page_size.to_string());
    }
    if self.offset > 0 {
      params.append_pair("start", &self.offset.to_string());
    }

    format!("{}?{}", base_url, params.finish())
  }
}

/// Collapse runs of whitespace.
fn normalize(value: &str) -> String {
  value.split_whitespace().collect::<Vec<_>>().join(" ")
}
