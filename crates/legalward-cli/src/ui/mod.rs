//! TUI rendering: orchestrates all panes.

pub mod dashboard;
pub mod discovery_detail;
pub mod discovery_list;
pub mod documents;
pub mod tracking;

use chrono::Local;
use legalward_core::tier::{ImpactTier, Relevance};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Flex, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::{App, Confirm, Screen};

// ─── Shared styling ───────────────────────────────────────────────────────────

pub fn tier_color(tier: ImpactTier) -> Color {
  match tier {
    ImpactTier::Alto => Color::Red,
    ImpactTier::Medio => Color::Yellow,
    ImpactTier::Bajo => Color::Green,
  }
}

/// `[Alto 72%]`-style badge coloured by tier.
pub fn relevance_badge(relevance: Relevance) -> Span<'static> {
  let tier = relevance.tier();
  Span::styled(
    format!("[{tier} {relevance}]"),
    Style::default()
      .fg(tier_color(tier))
      .add_modifier(Modifier::BOLD),
  )
}

pub fn pane_block(title: String) -> Block<'static> {
  Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray))
}

pub fn dim(text: impl Into<String>) -> Span<'static> {
  Span::styled(text.into(), Style::default().fg(Color::DarkGray))
}

pub fn cursor_style() -> Style {
  Style::default()
    .bg(Color::Blue)
    .fg(Color::White)
    .add_modifier(Modifier::BOLD)
}

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw<R>(f: &mut Frame, app: &App<R>) {
  let area = f.area();

  // Vertical stack: header, body, status bar.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  draw_body(f, rows[1], app);
  draw_status(f, rows[2], app);

  if let Some(input) = &app.upload_input {
    draw_prompt(f, area, " Upload document ", &format!("Path: {input}_"));
  } else if let Some(Confirm::DeleteDocument { name, .. }) = &app.confirm {
    draw_prompt(
      f,
      area,
      " Delete document ",
      &format!("Delete {name} and all its discoveries? [y/N]"),
    );
  }
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header<R>(f: &mut Frame, area: Rect, app: &App<R>) {
  let date = Local::now().format("%Y-%m-%d").to_string();

  let mut spans = vec![Span::styled(
    " legalward ",
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  )];
  for (i, tab) in Screen::TABS.iter().enumerate() {
    let active = *tab == app.screen || (*tab == app.back && is_detail(app.screen));
    let label = match tab {
      Screen::Pending => format!(
        " {} {} ({}) ",
        i + 1,
        tab.title(),
        app.discoveries.pending_count()
      ),
      _ => format!(" {} {} ", i + 1, tab.title()),
    };
    let style = if active {
      Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
      Style::default().fg(Color::Gray)
    };
    spans.push(Span::styled(label, style));
  }

  let who = match (app.session.session.user(), app.session.methods.email) {
    (Some(user), _) => user.display.clone(),
    (None, true) => "anonymous (L to sign in)".to_string(),
    (None, false) => "anonymous".to_string(),
  };
  let right = format!("{who}  {date} ");
  let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
  let pad = (area.width as usize)
    .saturating_sub(used)
    .saturating_sub(right.chars().count());
  spans.push(Span::raw(" ".repeat(pad)));
  spans.push(dim(right));

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(Line::from(spans)), inner);
}

fn is_detail(screen: Screen) -> bool {
  matches!(screen, Screen::DiscoveryDetail | Screen::DocumentDetail)
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body<R>(f: &mut Frame, area: Rect, app: &App<R>) {
  match app.screen {
    Screen::Dashboard => dashboard::draw(f, area, app),
    Screen::Pending => {
      let cols = split_list(area);
      discovery_list::draw(f, cols[0], app, Screen::Pending);
      discovery_list::draw_preview(f, cols[1], app);
    }
    Screen::Tracking => {
      let cols = split_list(area);
      discovery_list::draw(f, cols[0], app, Screen::Tracking);
      tracking::draw(f, cols[1], app);
    }
    Screen::Documents => documents::draw_list(f, area, app),
    Screen::DiscoveryDetail => discovery_detail::draw(f, area, app),
    Screen::DocumentDetail => documents::draw_detail(f, area, app),
  }
}

/// Left list pane (40%) and right detail pane (60%).
fn split_list(area: Rect) -> std::rc::Rc<[Rect]> {
  Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
    .split(area)
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status<R>(f: &mut Frame, area: Rect, app: &App<R>) {
  let (mode_label, hints) = if app.upload_input.is_some() {
    ("UPLOAD", "Type a file path  Enter upload  Esc cancel")
  } else if app.confirm.is_some() {
    ("CONFIRM", "y confirm  any other key cancels")
  } else if app.filter_active {
    ("SEARCH", "Type to filter  Esc cancel  Enter select")
  } else {
    match app.screen {
      Screen::Dashboard => (
        "DASHBOARD",
        "1-4 screens  ↑↓/jk recent  Enter open  u upload  a advance  L login  q quit",
      ),
      Screen::Pending => (
        "PENDING",
        "↑↓/jk navigate  / search  Enter detail  t track  d discard  q quit",
      ),
      Screen::Tracking => ("TRACKING", "↑↓/jk navigate  / search  Enter detail  q quit"),
      Screen::Documents => (
        "DOCUMENTS",
        "↑↓/jk navigate  Enter detail  x delete  u upload  q quit",
      ),
      Screen::DiscoveryDetail => (
        "DETAIL",
        "↑↓/jk scroll  t track  d discard  Esc back  q quit",
      ),
      Screen::DocumentDetail => ("DOCUMENT", "↑↓/jk scroll  Esc back  q quit"),
    }
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(if app.busy { Color::Yellow } else { Color::Cyan })
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(
    format!("  {status}"),
    Style::default().fg(Color::DarkGray),
  );

  let line = Line::from(vec![mode_span, hint_span]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}

// ─── Prompt overlay ───────────────────────────────────────────────────────────

fn draw_prompt(f: &mut Frame, area: Rect, title: &str, text: &str) {
  let [row] = Layout::vertical([Constraint::Length(3)])
    .flex(Flex::Center)
    .areas(area);
  let [popup] = Layout::horizontal([Constraint::Percentage(60)])
    .flex(Flex::Center)
    .areas(row);

  let block = Block::default()
    .title(title.to_string())
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Yellow));
  f.render_widget(Clear, popup);
  f.render_widget(
    Paragraph::new(text.to_string())
      .block(block)
      .wrap(Wrap { trim: false }),
    popup,
  );
}
