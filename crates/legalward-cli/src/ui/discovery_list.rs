//! Discovery list pane: left panel of the pending and tracking screens.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Style},
  text::{Line, Span},
  widgets::{List, ListItem, ListState, Paragraph, Wrap},
};

use super::{cursor_style, dim, pane_block, relevance_badge};
use crate::app::{App, Screen};

/// Render the discoveries listed on `screen` into `area`.
pub fn draw<R>(f: &mut Frame, area: Rect, app: &App<R>, screen: Screen) {
  let filtered = app.filtered(screen);
  let total = match screen {
    Screen::Tracking => app.discoveries.lists.tracking.len(),
    _ => app.discoveries.lists.pending.len(),
  };

  // Title with count.
  let title = if app.filter_active || !app.filter.is_empty() {
    format!(" {} ({}/{}) ", screen.title(), filtered.len(), total)
  } else {
    format!(" {} ({}) ", screen.title(), total)
  };
  let block = pane_block(title);
  let mut inner_area = block.inner(area);
  f.render_widget(block, area);

  if let Some(err) = &app.discoveries.error {
    f.render_widget(
      Paragraph::new(format!("Could not load discoveries: {err}"))
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true }),
      inner_area,
    );
    return;
  }

  let items: Vec<ListItem> = filtered
    .iter()
    .map(|d| {
      ListItem::new(Line::from(vec![
        relevance_badge(d.max_relevance),
        Span::raw(" "),
        Span::styled(d.bill_id.clone(), Style::default().fg(Color::Cyan)),
        Span::raw(" "),
        Span::raw(d.bill_title.clone()),
      ]))
    })
    .collect();

  // Filter bar along the bottom edge.
  if (app.filter_active || !app.filter.is_empty()) && inner_area.height > 2 {
    let filter_area = Rect {
      x:      inner_area.x,
      y:      inner_area.y + inner_area.height - 1,
      width:  inner_area.width,
      height: 1,
    };
    inner_area.height = inner_area.height.saturating_sub(1);

    let filter_text = if app.filter_active {
      format!("/{}_", app.filter)
    } else {
      format!("/{}", app.filter)
    };
    f.render_widget(
      Paragraph::new(filter_text).style(Style::default().fg(Color::Yellow)),
      filter_area,
    );
  }

  if items.is_empty() {
    let empty = if screen == Screen::Tracking {
      "No tracked bills yet."
    } else {
      "No pending discoveries."
    };
    f.render_widget(Paragraph::new(Line::from(dim(empty))), inner_area);
    return;
  }

  let mut state = ListState::default();
  state.select(Some(app.list_cursor));
  f.render_stateful_widget(
    List::new(items).highlight_style(cursor_style()),
    inner_area,
    &mut state,
  );
}

/// Summary of the discovery under the cursor, on the pending screen.
pub fn draw_preview<R>(f: &mut Frame, area: Rect, app: &App<R>) {
  let block = pane_block(" Preview ".to_string());
  let inner = block.inner(area);
  f.render_widget(block, area);

  let Some(d) = app.cursor_discovery() else {
    f.render_widget(
      Paragraph::new(Line::from(dim("Select a discovery and press Enter."))),
      inner,
    );
    return;
  };

  let mut lines = vec![
    Line::from(Span::styled(
      d.bill_title.clone(),
      Style::default().fg(Color::White),
    )),
    Line::from(vec![dim("Bill      "), Span::raw(d.bill_id.clone())]),
    Line::from(vec![dim("Document  "), Span::raw(d.document_name.clone())]),
    Line::from(vec![
      dim("Impact    "),
      relevance_badge(d.max_relevance),
      Span::raw(format!("  {} impacts", d.impact_count)),
    ]),
    Line::from(vec![
      dim("Analyzed  "),
      Span::raw(d.analyzed_at.format("%Y-%m-%d %H:%M").to_string()),
    ]),
    Line::from(""),
  ];
  if let Some(summary) = &d.impact_summary {
    lines.push(Line::from(summary.clone()));
  }

  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}
