//! Scholar results page -> [`SearchResult`]s.
//!
//! Each result block is handled on its own; a block missing any part still
//! yields a record with defaulted fields.

use chrono::{Datelike, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

use super::types::{AuthorProfile, ProfileKind, SearchResult, UNKNOWN};

const UNTITLED: &str = "Untitled";

/// Shortest string accepted as a venue name.
const MIN_VENUE_LEN: usize = 4;

/// Earliest year accepted from a meta line.
const MIN_YEAR: u16 = 1800;

static RESULT_SELECTOR: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse("div.gs_r").expect("selector"));
static BODY_SELECTOR: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse("div.gs_ri").expect("selector"));
static TITLE_SELECTOR: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse("h3.gs_rt").expect("selector"));
static TITLE_LINK_SELECTOR: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse("h3.gs_rt a").expect("selector"));
static META_SELECTOR: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse("div.gs_a").expect("selector"));
static META_LINK_SELECTOR: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse("div.gs_a a").expect("selector"));
static ORCID_SELECTOR: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse("a[href*=\"orcid.org\"]").expect("selector"));
static SNIPPET_SELECTOR: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse("div.gs_rs").expect("selector"));
static PDF_SELECTOR: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse("div.gs_or_ggsm a, div.gs_ggs a").expect("selector"));
static FOOTER_LINK_SELECTOR: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse("div.gs_fl a").expect("selector"));

static YEAR_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\b(1[89]\d{2}|20\d{2})\b").expect("regex"));
static DOMAIN_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)^[a-z0-9-]+(\.[a-z0-9-]+)+$").expect("regex"));
static CITED_BY_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"Cited by\s+(\d+)").expect("regex"));
static TITLE_MARKER_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\s*(\[[A-Z]+\]\s*)+").expect("regex"));

/// Parse every result block on a page, in page order.
///
/// `base_url` resolves relative links (Scholar uses `/citations?...` and `/scholar?cites=...`).
pub fn parse_results(html: &str, base_url: &str) -> Vec<SearchResult> {
  let document = Html::parse_document(html);
  let base = Url::parse(base_url).ok();

  let results: Vec<SearchResult> = document
    .select(&RESULT_SELECTOR)
    .filter(|block| block.select(&BODY_SELECTOR).next().is_some())
    .map(|block| parse_block(block, base.as_ref()))
    .collect();

  debug!(count = results.len(), "parsed scholar results");
  results
}

fn parse_block(block: ElementRef<'_>, base: Option<&Url>) -> SearchResult {
  let link_element = block.select(&TITLE_LINK_SELECTOR).next();
  let link = link_element
    .and_then(|a| a.value().attr("href"))
    .map(|href| absolutize(href, base));

  let title = link_element
    .or_else(|| block.select(&TITLE_SELECTOR).next())
    .map(extract_text)
    .map(|text| strip_title_markers(&text))
    .filter(|text| !text.is_empty())
    .unwrap_or_else(|| UNTITLED.to_string());

  let (authors, venue, year) = block
    .select(&META_SELECTOR)
    .next()
    .map(|meta| parse_meta(&extract_text(meta)))
    .unwrap_or_else(|| (UNKNOWN.to_string(), UNKNOWN.to_string(), None));

  let snippet = block
    .select(&SNIPPET_SELECTOR)
    .next()
    .map(extract_text)
    .unwrap_or_default();

  let pdf_link = block
    .select(&PDF_SELECTOR)
    .next()
    .and_then(|a| a.value().attr("href"))
    .map(|href| absolutize(href, base));

  let cited_by = block
    .select(&FOOTER_LINK_SELECTOR)
    .map(extract_text)
    .find_map(|text| parse_cited_by(&text));

  SearchResult {
    title,
    link,
    snippet,
    authors,
    venue,
    year,
    cited_by,
    pdf_link,
    profiles: extract_profiles(block, base),
  }
}

fn extract_profiles(block: ElementRef<'_>, base: Option<&Url>) -> Vec<AuthorProfile> {
  let mut profiles: Vec<AuthorProfile> = Vec::new();

  for anchor in block
    .select(&META_LINK_SELECTOR)
    .chain(block.select(&ORCID_SELECTOR))
  {
    let Some(href) = anchor.value().attr("href") else {
      continue;
    };
    let url = absolutize(href, base);
    if profiles.iter().any(|p| p.url == url) {
      continue;
    }
    let name = extract_text(anchor);
    profiles.push(AuthorProfile {
      name: if name.is_empty() {
        UNKNOWN.to_string()
      } else {
        name
      },
      kind: ProfileKind::classify(&url),
      url,
    });
  }

  profiles
}

/// Split a meta line such as `A Smith, B Jones - Nature, 2020 - nature.com`
/// into (authors, venue, year).
pub fn parse_meta(meta: &str) -> (String, String, Option<u16>) {
  let meta = meta.replace('\u{a0}', " ");
  let parts: Vec<&str> = meta.split(" - ").map(str::trim).collect();

  let authors = parts
    .first()
    .map(|a| a.trim_end_matches(['…', ',', ' ']).trim())
    .filter(|a| !a.is_empty())
    .unwrap_or(UNKNOWN)
    .to_string();

  let source = parts.get(1).copied().unwrap_or_default();
  let source_year = last_year(source);
  let year = source_year
    .as_ref()
    .map(|(year, _)| *year)
    .or_else(|| last_year(&meta).map(|(year, _)| year));

  let venue_text = match &source_year {
    Some((_, range)) => format!("{}{}", &source[..range.start], &source[range.end..]),
    None => source.to_string(),
  };
  let venue_text = venue_text.trim_matches(|c: char| c == ',' || c == '…' || c.is_whitespace());
  let venue = if is_plausible_venue(venue_text) {
    venue_text.to_string()
  } else {
    UNKNOWN.to_string()
  };

  (authors, venue, year)
}

/// Last plausible year in `text` and where it sits.
fn last_year(text: &str) -> Option<(u16, std::ops::Range<usize>)> {
  let max_year = u16::try_from(Utc::now().year() + 1).unwrap_or(u16::MAX);
  YEAR_RE
    .find_iter(text)
    .filter_map(|m| {
      m.as_str()
        .parse::<u16>()
        .ok()
        .filter(|y| (MIN_YEAR..=max_year).contains(y))
        .map(|y| (y, m.range()))
    })
    .last()
}

fn is_plausible_venue(text: &str) -> bool {
  text.chars().count() >= MIN_VENUE_LEN && !DOMAIN_RE.is_match(text)
}

fn parse_cited_by(text: &str) -> Option<u32> {
  CITED_BY_RE
    .captures(text)
    .and_then(|caps| caps.get(1))
    .and_then(|m| m.as_str().parse().ok())
}

fn strip_title_markers(title: &str) -> String {
  TITLE_MARKER_RE.replace(title, "").trim().to_string()
}

fn absolutize(href: &str, base: Option<&Url>) -> String {
  match base {
    Some(base) if !href.starts_with("http://") && !href.starts_with("https://") => base
      .join(href)
      .map(String::from)
      .unwrap_or_else(|_| href.to_string()),
    _ => href.to_string(),
  }
}

fn extract_text(element: ElementRef<'_>) -> String {
  element
    .text()
    .collect::<String>()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}

#[cfg(test)]
mod tests {
  use super::*;

  const BASE: &str = "https://scholar.google.com/scholar";

  fn block(title: &str, href: &str, meta: Option<&str>, cited: Option<u32>) -> String {
    let meta = meta
      .map(|m| format!(r#"<div class="gs_a">{}</div>"#, m))
      .unwrap_or_default();
    let cited = cited
      .map(|n| format!(r#"<a href="/scholar?cites=1">Cited by {}</a>"#, n))
      .unwrap_or_default();
    format!(
      r##"<div class="gs_r gs_or gs_scl">
           <div class="gs_ri">
             <h3 class="gs_rt"><a href="{href}">{title}</a></h3>
             {meta}
             <div class="gs_rs">Snippet for {title}</div>
             <div class="gs_fl"><a href="#">Save</a> {cited}</div>
           </div>
         </div>"##
    )
  }

  fn page(blocks: &[String]) -> String {
    format!(
      r#"<html><body><div id="gs_res_ccl_mid">{}</div></body></html>"#,
      blocks.join("\n")
    )
  }

  #[test]
  fn test_full_block() {
    let html = page(&[format!(
      r#"<div class="gs_r gs_or gs_scl">
           <div class="gs_ggs gs_fl"><div class="gs_ggsd"><div class="gs_or_ggsm">
             <a href="https://arxiv.org/pdf/1706.03762">[PDF] arxiv.org</a>
           </div></div></div>
           <div class="gs_ri">
             <h3 class="gs_rt"><span class="gs_ctg2">[HTML]</span>
               <a href="https://papers.nips.cc/paper/7181">Attention is all you need</a></h3>
             <div class="gs_a"><a href="/citations?user=abc&amp;hl=en">A Vaswani</a>, N Shazeer, N Parmar&hellip; - Advances in neural information processing systems, 2017 - proceedings.neurips.cc</div>
             <div class="gs_rs">The dominant sequence transduction models are based on complex recurrent ...</div>
             <div class="gs_fl"><a href="/scholar?cites=2960712678066186980">Cited by 120345</a></div>
           </div>
         </div>"#
    )]);

    let results = parse_results(&html, BASE);
    assert_eq!(results.len(), 1);

    let r = &results[0];
    assert_eq!(r.title, "Attention is all you need");
    assert_eq!(r.link.as_deref(), Some("https://papers.nips.cc/paper/7181"));
    assert_eq!(r.authors, "A Vaswani, N Shazeer, N Parmar");
    assert_eq!(r.venue, "Advances in neural information processing systems");
    assert_eq!(r.year, Some(2017));
    assert_eq!(r.cited_by, Some(120345));
    assert_eq!(
      r.pdf_link.as_deref(),
      Some("https://arxiv.org/pdf/1706.03762")
    );
    assert!(r.snippet.starts_with("The dominant sequence"));
    assert_eq!(r.profiles.len(), 1);
    assert_eq!(r.profiles[0].name, "A Vaswani");
    assert_eq!(
      r.profiles[0].url,
      "https://scholar.google.com/citations?user=abc&hl=en"
    );
    assert_eq!(r.profiles[0].kind, ProfileKind::Academic);
  }

  #[test]
  fn test_missing_meta_defaults_without_dropping_records() {
    let blocks: Vec<String> = (0..5)
      .map(|i| {
        let meta = if i == 2 {
          None
        } else {
          Some("J Doe - Journal of Things, 2019 - things.org")
        };
        block(&format!("Paper {}", i), &format!("https://x.org/{}", i), meta, None)
      })
      .collect();

    let results = parse_results(&page(&blocks), BASE);
    assert_eq!(results.len(), 5);
    assert_eq!(results[2].title, "Paper 2");
    assert_eq!(results[2].authors, UNKNOWN);
    assert_eq!(results[2].venue, UNKNOWN);
    assert_eq!(results[2].year, None);
    assert_eq!(results[3].venue, "Journal of Things");
    assert_eq!(results[3].year, Some(2019));
  }

  #[test]
  fn test_preserves_source_order_and_duplicates() {
    let blocks = vec![
      block("B", "https://x.org/b", None, None),
      block("A", "https://x.org/a", None, None),
      block("B again", "https://x.org/b", None, None),
    ];
    let titles: Vec<String> = parse_results(&page(&blocks), BASE)
      .into_iter()
      .map(|r| r.title)
      .collect();
    assert_eq!(titles, vec!["B", "A", "B again"]);
  }

  #[test]
  fn test_citation_only_block_has_no_link() {
    let html = page(&[r#"<div class="gs_r"><div class="gs_ri">
        <h3 class="gs_rt"><span class="gs_ctu"><span class="gs_ct1">[CITATION]</span></span> On growth and form</h3>
        <div class="gs_a">DAW Thompson - 1942 - cambridge.org</div>
      </div></div>"#
      .to_string()]);

    let results = parse_results(&html, BASE);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "On growth and form");
    assert_eq!(results[0].link, None);
    assert_eq!(results[0].year, Some(1942));
    assert_eq!(results[0].venue, UNKNOWN);
  }

  #[test]
  fn test_blocks_without_body_are_ignored() {
    let html = page(&[
      r#"<div class="gs_r"><div class="gs_med">Did you mean: rust</div></div>"#.to_string(),
      block("Real", "https://x.org/r", None, Some(3)),
    ]);
    let results = parse_results(&html, BASE);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].cited_by, Some(3));
  }

  #[test]
  fn test_empty_page() {
    assert!(parse_results("<html><body></body></html>", BASE).is_empty());
  }

  #[test]
  fn test_orcid_links_are_classified() {
    let html = page(&[r#"<div class="gs_r"><div class="gs_ri">
        <h3 class="gs_rt"><a href="https://x.org/p">P</a></h3>
        <div class="gs_a">J Doe - Some Venue, 2021 - x.org</div>
        <div class="gs_fl"><a href="https://orcid.org/0000-0001-2345-6789">ORCID</a></div>
      </div></div>"#
      .to_string()]);

    let results = parse_results(&html, BASE);
    assert_eq!(results[0].profiles.len(), 1);
    assert_eq!(results[0].profiles[0].kind, ProfileKind::Orcid);
  }

  #[test]
  fn test_meta_with_domain_only_source() {
    let (authors, venue, year) = parse_meta("A Smith - springer.com");
    assert_eq!(authors, "A Smith");
    assert_eq!(venue, UNKNOWN);
    assert_eq!(year, None);
  }

  #[test]
  fn test_meta_keeps_years_inside_venue_names() {
    let (_, venue, year) =
      parse_meta("B Lee - Proceedings of the 2019 Conference on Things, 2020 - acm.org");
    assert_eq!(venue, "Proceedings of the 2019 Conference on Things");
    assert_eq!(year, Some(2020));
  }

  #[test]
  fn test_meta_short_venue_rejected() {
    let (_, venue, year) = parse_meta("C Wu - ACL, 2018 - aclweb.org");
    assert_eq!(venue, UNKNOWN);
    assert_eq!(year, Some(2018));
  }

  #[test]
  fn test_meta_rejects_implausible_years() {
    let (_, _, year) = parse_meta("D Kim - Report 1066, 1700 - example.org");
    assert_eq!(year, None);
  }

  #[test]
  fn test_meta_nbsp_separators() {
    let (authors, venue, year) = parse_meta("E Roe\u{a0}- Science, 2001\u{a0}- science.org");
    assert_eq!(authors, "E Roe");
    assert_eq!(venue, "Science");
    assert_eq!(year, Some(2001));
  }

  #[test]
  fn test_meta_year_outside_source_segment() {
    let (authors, venue, year) = parse_meta("F Doe - Nature - 2015");
    assert_eq!(authors, "F Doe");
    assert_eq!(venue, "Nature");
    assert_eq!(year, Some(2015));
  }

  #[test]
  fn test_ten_result_page() {
    let blocks: Vec<String> = (0..10)
      .map(|i| {
        block(
          &format!("ML paper {}", i),
          &format!("https://ml.org/{}", i),
          Some("X Y - Machine Learning, 2021 - springer.com"),
          Some(i),
        )
      })
      .collect();
    let results = parse_results(&page(&blocks), BASE);
    assert_eq!(results.len(), 10);
    assert_eq!(results[9].cited_by, Some(9));
  }
}
