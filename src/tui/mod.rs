//! Ratatui-based terminal UI.
//!
//! The TUI shows the loaded folder's KPI trend as a chart, lets the user step
//! through the indexed dates, toggle the plotted metric, reload the folder,
//! and export the visible series.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
    Terminal,
};

use crate::cli::DashArgs;
use crate::domain::{DailyMetrics, DashConfig, RangeSeries, RawRecord};
use crate::error::AppError;
use crate::io::cache::LoadCache;

mod plotters_chart;

use plotters_chart::TrendChart;

/// Start the TUI.
pub fn run(args: DashArgs) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(crate::app::dash_config_from_args(&args))?;
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    config: DashConfig,
    cache: LoadCache,
    today: NaiveDate,
    dates: Vec<NaiveDate>,
    selected: usize,
    series: Option<RangeSeries>,
    day: Option<DailyMetrics>,
    day_files: Vec<RawRecord>,
    files_read: usize,
    skipped_count: usize,
    status: String,
}

impl App {
    fn new(config: DashConfig) -> Result<Self, AppError> {
        let mut app = Self {
            config,
            cache: LoadCache::new(),
            today: chrono::Local::now().date_naive(),
            dates: Vec::new(),
            selected: 0,
            series: None,
            day: None,
            day_files: Vec::new(),
            files_read: 0,
            skipped_count: 0,
            status: String::new(),
        };
        app.refresh()?;
        app.selected = app.dates.len().saturating_sub(1);
        app.refresh()?;
        app.status = format!(
            "Loaded {} file(s), {} date(s), {} skipped.",
            app.files_read,
            app.dates.len(),
            app.skipped_count
        );
        Ok(app)
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code)? {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        match code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Left => {
                if self.selected > 0 {
                    self.selected -= 1;
                    self.refresh()?;
                    self.status = self.selected_date_status();
                }
            }
            KeyCode::Right => {
                if self.selected + 1 < self.dates.len() {
                    self.selected += 1;
                    self.refresh()?;
                    self.status = self.selected_date_status();
                }
            }
            KeyCode::Home => {
                self.selected = 0;
                self.refresh()?;
                self.status = self.selected_date_status();
            }
            KeyCode::End => {
                self.selected = self.dates.len().saturating_sub(1);
                self.refresh()?;
                self.status = self.selected_date_status();
            }
            KeyCode::Char('m') => {
                self.config.metric = self.config.metric.next();
                self.status = format!("metric: {}", self.config.metric.display_name());
            }
            KeyCode::Char('r') => {
                self.cache.invalidate();
                self.refresh()?;
                self.status = format!(
                    "Reloaded: {} file(s), {} date(s), {} skipped.",
                    self.files_read,
                    self.dates.len(),
                    self.skipped_count
                );
            }
            KeyCode::Char('e') => {
                self.export_series();
            }
            _ => {}
        }

        Ok(false)
    }

    fn selected_date_status(&self) -> String {
        match self.dates.get(self.selected) {
            Some(date) => format!("day: {date}"),
            None => "No dated files.".to_string(),
        }
    }

    /// Re-derive everything shown from the (possibly cached) load.
    fn refresh(&mut self) -> Result<(), AppError> {
        let loaded = self.cache.load(&self.config.data_dir, self.today)?;

        let files_read = loaded.files_read;
        let skipped_count = loaded.skipped.len();
        let dates = loaded.dates();

        let (series, day, day_files) = match (dates.first(), dates.last()) {
            (Some(&start), Some(&end)) => {
                let selected = self.selected.min(dates.len() - 1);
                let date = dates[selected];
                let series = crate::metrics::range(&loaded.by_date, start, end)?;
                let day = crate::metrics::single_day(&loaded.by_date, date).ok();
                let day_files = loaded.by_date.get(&date).cloned().unwrap_or_default();
                (Some(series), day, day_files)
            }
            _ => (None, None, Vec::new()),
        };

        self.files_read = files_read;
        self.skipped_count = skipped_count;
        self.selected = self.selected.min(dates.len().saturating_sub(1));
        self.dates = dates;
        self.series = series;
        self.day = day;
        self.day_files = day_files;
        Ok(())
    }

    fn export_series(&mut self) {
        let Some(series) = &self.series else {
            self.status = "Nothing to export.".to_string();
            return;
        };
        let path = PathBuf::from(format!("oee_series_{}_{}.csv", series.start, series.end));
        match crate::io::export::write_series_csv(&path, series) {
            Ok(()) => self.status = format!("Wrote series CSV: {}", path.display()),
            Err(err) => self.status = format!("Export failed: {err}"),
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("oee", Style::default().fg(Color::Cyan)),
            Span::raw(" — daily production KPIs"),
        ]));

        lines.push(Line::from(Span::styled(
            format!(
                "dir: {} | files: {} | skipped: {} | dates: {} | metric: {}",
                self.config.data_dir.display(),
                self.files_read,
                self.skipped_count,
                self.dates.len(),
                self.config.metric.display_name(),
            ),
            Style::default().fg(Color::Gray),
        )));

        if let Some(day) = &self.day {
            let oee = day
                .oee
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| "-".to_string());
            lines.push(Line::from(Span::styled(
                format!(
                    "day {} | oee={oee} | production={:.1} | files={} rows={}",
                    day.date, day.total_production, day.file_count, day.row_count,
                ),
                Style::default().fg(Color::Gray),
            )));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(8)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_day_panel(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = format!("{} trend", self.config.metric.display_name());
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some((line, selected, x_bounds, y_bounds, first_date)) = self.chart_series() else {
            let msg = Paragraph::new("No data to plot (no dated files, or the metric is absent).")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let (chart_rect, insets) = chart_layout(inner);
        let widget = TrendChart {
            line: &line,
            points: &line,
            selected: &selected,
            x_bounds,
            y_bounds,
            x_label: "day",
            y_label: self.config.metric.axis_label().to_string(),
            fmt_x: fmt_axis_x,
            fmt_y: fmt_axis_y,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, x_bounds, y_bounds, first_date);
        }
    }

    /// Build the chart series for the current metric.
    ///
    /// X is "days since the first indexed date", so gaps between dates keep
    /// their true width. Days where the metric is absent are simply missing
    /// points, matching how the rest of the tool treats gaps.
    fn chart_series(&self) -> Option<(Vec<(f64, f64)>, Vec<(f64, f64)>, [f64; 2], [f64; 2], NaiveDate)> {
        let series = self.series.as_ref()?;
        let first = series.points.first()?.date;

        let mut line = Vec::new();
        for point in &series.points {
            let Some(y) = self.config.metric.value(point) else {
                continue;
            };
            let x = point.date.signed_duration_since(first).num_days() as f64;
            line.push((x, y));
        }
        if line.is_empty() {
            return None;
        }

        let selected_date = self.dates.get(self.selected).copied()?;
        let selected: Vec<(f64, f64)> = line
            .iter()
            .copied()
            .filter(|&(x, _)| {
                let days = selected_date.signed_duration_since(first).num_days() as f64;
                (x - days).abs() < 0.5
            })
            .collect();

        let x_max = line.iter().map(|&(x, _)| x).fold(0.0_f64, f64::max).max(1.0);
        let x_bounds = [0.0, x_max];

        let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for &(_, y) in &line {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
        if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
            y_min -= 0.5;
            y_max = y_min + 1.0;
        }
        let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
        let y_bounds = [y_min - pad, y_max + pad];

        Some((line, selected, x_bounds, y_bounds, first))
    }

    fn draw_day_panel(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = self
            .dates
            .get(self.selected)
            .map(|d| format!("Files for {d}"))
            .unwrap_or_else(|| "Files".to_string());

        let mut lines: Vec<Line> = Vec::new();
        if self.day_files.is_empty() {
            lines.push(Line::from(Span::styled(
                "No data for this day.",
                Style::default().fg(Color::Yellow),
            )));
        }
        for record in &self.day_files {
            let oee = record
                .mean_oee()
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| "-".to_string());
            lines.push(Line::from(format!(
                "{} — {} row(s), production {:.1}, oee {oee} (date from {})",
                record.file_name,
                record.rows.len(),
                record.total_production(),
                record.date_source.display_name(),
            )));
        }

        let p = Paragraph::new(Text::from(lines))
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ day  Home/End first/last  m metric  r reload  e export  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn fmt_axis_x(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_y(v: f64) -> String {
    format!("{v:.1}")
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 10,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    first_date: NaiveDate,
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        // X ticks are calendar dates, not raw day offsets.
        let tick_date = first_date + chrono::Duration::days(x_val.round() as i64);
        let label = tick_date.format("%m-%d").to_string();
        let label_len = label.len() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = format!("{y_val:.1}");
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("date")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new("kpi")
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}
