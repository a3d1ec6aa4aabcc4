//! Documents screen and document detail.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{List, ListItem, ListState, Paragraph, Wrap},
};

use super::{cursor_style, dim, pane_block, relevance_badge};
use crate::app::App;

pub fn draw_list<R>(f: &mut Frame, area: Rect, app: &App<R>) {
  let block = pane_block(format!(" Documents ({}) ", app.documents.len()));
  let inner = block.inner(area);
  f.render_widget(block, area);

  if app.documents.is_empty() {
    f.render_widget(
      Paragraph::new(Line::from(dim("No documents. Press u to upload one."))),
      inner,
    );
    return;
  }

  let items: Vec<ListItem> = app
    .documents
    .iter()
    .map(|doc| {
      ListItem::new(Line::from(vec![
        Span::raw(format!("{:<40}", doc.name)),
        dim(format!(
          "{}  {} discoveries",
          doc.uploaded_at.format("%Y-%m-%d %H:%M"),
          doc.discovery_count
        )),
      ]))
    })
    .collect();

  let mut state = ListState::default();
  state.select(Some(app.list_cursor));
  f.render_stateful_widget(
    List::new(items).highlight_style(cursor_style()),
    inner,
    &mut state,
  );
}

pub fn draw_detail<R>(f: &mut Frame, area: Rect, app: &App<R>) {
  let Some(doc) = &app.document else {
    return;
  };

  let block = pane_block(format!(" {} ", doc.name));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let mut lines = vec![Line::from(vec![
    dim("Uploaded  "),
    Span::raw(doc.uploaded_at.format("%Y-%m-%d %H:%M").to_string()),
    dim(format!("  {} discoveries", doc.discoveries.len())),
  ])];

  for d in doc.discoveries.iter().skip(app.detail_scroll) {
    let top = d.impacts.iter().map(|i| i.relevance).max();
    let mut header = vec![Span::styled(
      format!("{}  {}  ", d.bill_id, d.bill_title),
      Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD),
    )];
    if let Some(top) = top {
      header.push(relevance_badge(top));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(header));
    if let Some(summary) = &d.impact_summary {
      lines.push(Line::from(summary.clone()));
    }
    for impact in &d.impacts {
      lines.push(Line::from(vec![
        dim(format!("  Art. {:<5}", impact.article_number)),
        relevance_badge(impact.relevance),
        Span::raw(format!(" {}", impact.description)),
      ]));
    }
  }

  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
