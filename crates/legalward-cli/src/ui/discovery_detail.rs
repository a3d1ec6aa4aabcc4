//! Discovery detail screen: bill header, consolidated summary and the
//! impacts in server order.

use legalward_core::lifecycle::DiscoveryState;
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Paragraph, Wrap},
};

use super::{dim, pane_block, relevance_badge};
use crate::app::App;

pub fn draw<R>(f: &mut Frame, area: Rect, app: &App<R>) {
  let Some(d) = &app.detail else {
    let block = pane_block(" Discovery ".to_string());
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(Paragraph::new(Line::from(dim("Nothing selected."))), inner);
    return;
  };

  let block = pane_block(format!(" {} ", d.bill_id));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let state_color = match d.state {
    DiscoveryState::Pending => Color::Cyan,
    DiscoveryState::Tracking => Color::Green,
    DiscoveryState::Discarded => Color::DarkGray,
  };

  let mut lines = vec![
    Line::from(Span::styled(
      d.bill_title.clone(),
      Style::default().add_modifier(Modifier::BOLD),
    )),
    Line::from(vec![
      Span::styled(format!("{} ", d.state), Style::default().fg(state_color)),
      relevance_badge(d.max_relevance),
      Span::raw(format!("  {} impacts", d.impact_count())),
    ]),
    Line::from(vec![
      dim("Document  "),
      Span::raw(d.document.name.clone()),
      dim(format!("  uploaded {}", d.document.uploaded_at.format("%Y-%m-%d"))),
    ]),
    Line::from(vec![
      dim("Analyzed  "),
      Span::raw(d.analyzed_at.format("%Y-%m-%d %H:%M").to_string()),
    ]),
  ];
  if let Some(summary) = &d.impact_summary {
    lines.push(Line::from(""));
    lines.push(Line::from(summary.clone()));
  }

  for (i, impact) in d.impacts.iter().enumerate().skip(app.detail_scroll) {
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
      Span::styled(
        format!("#{} Article {}  ", i + 1, impact.article_number),
        Style::default()
          .fg(Color::Cyan)
          .add_modifier(Modifier::BOLD),
      ),
      relevance_badge(impact.relevance),
    ]));
    lines.push(Line::from(impact.description.clone()));
    lines.push(Line::from(vec![dim("  document: "), Span::raw(impact.document_excerpt.clone())]));
    lines.push(Line::from(vec![dim("  bill:     "), Span::raw(impact.bill_excerpt.clone())]));
  }

  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
