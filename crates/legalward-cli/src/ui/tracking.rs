//! Timeline pane: right panel of the tracking screen.

use chrono::{Local, NaiveDate};
use legalward_core::{
  discovery::DiscoverySummary,
  timeline::{MilestoneStatus, Timeline, days_since},
};
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::Paragraph,
};

use super::{dim, pane_block, relevance_badge};
use crate::app::App;

pub fn draw<R>(f: &mut Frame, area: Rect, app: &App<R>) {
  let block = pane_block(" Timeline ".to_string());
  let inner = block.inner(area);
  f.render_widget(block, area);

  match app.cursor_discovery() {
    Some(d) => {
      let lines = lines_for(d, Local::now().date_naive());
      f.render_widget(Paragraph::new(lines), inner);
    }
    None => f.render_widget(Paragraph::new(Line::from(dim("No bill selected."))), inner),
  }
}

fn lines_for(d: &DiscoverySummary, today: NaiveDate) -> Vec<Line<'static>> {
  let mut lines = vec![
    Line::from(Span::styled(
      format!("{}  {}", d.bill_id, d.bill_title),
      Style::default().add_modifier(Modifier::BOLD),
    )),
    Line::from(vec![
      relevance_badge(d.max_relevance),
      Span::raw(format!("  {} impacts on {}", d.impact_count, d.document_name)),
    ]),
  ];

  if let Some(bill) = &d.bill {
    if let Some(chamber) = &bill.chamber {
      lines.push(Line::from(vec![dim("Chamber of origin  "), Span::raw(chamber.clone())]));
    }
    if let Some(introduced) = bill.introduced_on {
      lines.push(Line::from(vec![
        dim("Introduced         "),
        Span::raw(format!(
          "{introduced} ({} days ago)",
          days_since(introduced, today)
        )),
      ]));
    }
  }
  let timeline = d.timeline();
  if let Some(current) = timeline.current() {
    lines.push(Line::from(vec![
      dim("Current stage      "),
      Span::styled(current.stage.to_string(), Style::default().fg(Color::Yellow)),
    ]));
  }
  lines.push(Line::from(""));
  lines.extend(timeline_lines(&timeline));
  lines
}

/// One line per milestone: marker, stage name and date when known.
pub fn timeline_lines(timeline: &Timeline) -> Vec<Line<'static>> {
  timeline
    .milestones
    .iter()
    .map(|m| {
      let (marker, color) = match m.status {
        MilestoneStatus::Completed => ("●", Color::Green),
        MilestoneStatus::InProgress => ("◐", Color::Yellow),
        MilestoneStatus::Pending => ("○", Color::DarkGray),
      };
      let mut spans = vec![
        Span::styled(format!(" {marker} "), Style::default().fg(color)),
        Span::styled(
          format!("{:<16}", m.stage.to_string()),
          Style::default().fg(color),
        ),
        dim(m.status.to_string()),
      ];
      if let Some(date) = m.date {
        spans.push(Span::raw(format!("  {date}")));
      }
      Line::from(spans)
    })
    .collect()
}
