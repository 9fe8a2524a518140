use ratatui::widgets::ListState;

/// Truncate a string to at most `max_chars` chars, adding "..." if truncated
pub fn truncate(s: &str, max_chars: usize) -> String {
  if s.chars().count() <= max_chars {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Compact count, e.g. `1.2k`, `3.4M`
pub fn compact_count(n: u64) -> String {
  match n {
    0..=999 => n.to_string(),
    1_000..=999_999 => format!("{:.1}k", n as f64 / 1_000.0),
    _ => format!("{:.1}M", n as f64 / 1_000_000.0),
  }
}

/// Keep the selection inside a list of `len` rows.
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  match (state.selected(), len) {
    (_, 0) => state.select(None),
    (None, _) => state.select(Some(0)),
    (Some(i), len) if i >= len => state.select(Some(len - 1)),
    _ => {}
  }
}

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

pub fn spinner(frame: usize) -> &'static str {
  SPINNER[frame % SPINNER.len()]
}
