use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use scour::notify::{Toast, ToastStyle};

/// Draw the footer bar: view breadcrumb on the left, toast on the right
pub fn draw_footer(frame: &mut Frame, area: Rect, breadcrumb: &[String], toast: Option<&Toast>) {
  let mut spans = vec![Span::raw(" ")];

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    }

    let style = if i + 1 == breadcrumb.len() {
      // Current view - highlighted
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };

    spans.push(Span::styled(part.clone(), style));
  }

  let chunks = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
    .split(area);

  frame.render_widget(
    Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black)),
    chunks[0],
  );

  let toast_line = match toast {
    Some(toast) => Line::from(Span::styled(
      format!("{} ", toast.text()),
      toast_style(toast.style),
    )),
    None => Line::default(),
  };
  frame.render_widget(
    Paragraph::new(toast_line)
      .alignment(Alignment::Right)
      .style(Style::default().bg(Color::Black)),
    chunks[1],
  );
}

fn toast_style(style: ToastStyle) -> Style {
  match style {
    ToastStyle::Success => Style::default().fg(Color::Green).bold(),
    ToastStyle::Failure => Style::default().fg(Color::Red).bold(),
    ToastStyle::Info => Style::default().fg(Color::Cyan),
  }
}
