//! Dashboard screen: counters and the recently viewed panel.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{List, ListItem, ListState, Paragraph},
};

use super::{cursor_style, dim, pane_block, relevance_badge};
use crate::app::App;

pub fn draw<R>(f: &mut Frame, area: Rect, app: &App<R>) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(4), Constraint::Min(0)])
    .split(area);

  draw_counters(f, rows[0], app);
  draw_recent(f, rows[1], app);
}

fn draw_counters<R>(f: &mut Frame, area: Rect, app: &App<R>) {
  let stats = &app.stats;
  let cells = [
    ("Documents", stats.document_count, Color::White),
    ("Pending", stats.pending_count, Color::Cyan),
    ("Tracking", stats.tracking_count, Color::Green),
    ("High impact", stats.high_impact_count, Color::Red),
  ];
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Ratio(1, 4); 4])
    .split(area);

  for ((label, value, color), col) in cells.into_iter().zip(cols.iter()) {
    let block = pane_block(format!(" {label} "));
    let inner = block.inner(*col);
    f.render_widget(block, *col);
    f.render_widget(
      Paragraph::new(Line::from(Span::styled(
        value.to_string(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
      ))),
      inner,
    );
  }
}

fn draw_recent<R>(f: &mut Frame, area: Rect, app: &App<R>) {
  let block = pane_block(" Recently viewed ".to_string());
  let inner = block.inner(area);
  f.render_widget(block, area);

  if app.stats.recent.is_empty() {
    f.render_widget(
      Paragraph::new(Line::from(dim("Discoveries you open will show up here."))),
      inner,
    );
    return;
  }

  let items: Vec<ListItem> = app
    .stats
    .recent
    .iter()
    .map(|e| {
      ListItem::new(Line::from(vec![
        relevance_badge(e.max_relevance),
        Span::raw(" "),
        Span::styled(e.bill_id.clone(), Style::default().fg(Color::Cyan)),
        Span::raw(format!(" {} ", e.bill_title)),
        dim(format!(
          "{} · {} impacts · {}",
          e.state,
          e.impact_count,
          e.viewed_at.format("%Y-%m-%d %H:%M")
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
