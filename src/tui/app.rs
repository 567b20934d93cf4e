//! Terminal Gantt timeline.
//!
//! Renders the projected task list next to a day-granular timeline of
//! colored bars: sprints span their members, milestones draw as diamonds,
//! synthetic group rows appear when a grouping mode is active. Date edits
//! made from the timeline go through the same successor-shift rules as the
//! CLI and are persisted through the debounced save queue.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration as StdDuration, Instant};

use chrono::{Duration, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};

use crate::db::Database;
use crate::fields::GroupBy;
use crate::graph::TaskGraph;
use crate::grouping::project_grouped;
use crate::save_queue::SaveQueue;
use crate::shift::{apply_shift, shift_successors};
use crate::snapshot::GanttTask;
use crate::tui::colors::{bar_color, GROUP_BAR, PROGRESS_FILL, TODAY_MARK};
use crate::validate::NoticeLimiter;

/// Terminal Gantt view state.
pub struct App {
    db: Database,
    db_path: PathBuf,
    rows: Vec<GanttTask>,
    table_state: TableState,
    group_by: GroupBy,
    /// Leftmost day shown in the timeline pane.
    view_start: NaiveDate,
    /// Columns per day, 1..=4.
    day_width: u16,
    status_message: String,
    notices: NoticeLimiter,
    save_queue: SaveQueue,
}

impl App {
    pub fn new(db_path: &Path) -> Self {
        let db = Database::load(db_path);
        let view_start = earliest_start(&db)
            .unwrap_or_else(|| chrono::Local::now().date_naive())
            - Duration::days(2);
        let mut app = App {
            db,
            db_path: db_path.to_path_buf(),
            rows: Vec::new(),
            table_state: TableState::default(),
            group_by: GroupBy::None,
            view_start,
            day_width: 2,
            status_message: String::new(),
            notices: NoticeLimiter::new(),
            save_queue: SaveQueue::new(),
        };
        app.rebuild_rows();
        if !app.rows.is_empty() {
            app.table_state.select(Some(0));
        }
        app
    }

    /// Re-project the display rows after any edit or mode change.
    fn rebuild_rows(&mut self) {
        let graph = TaskGraph::build(&self.db);
        self.rows = project_grouped(&self.db, &graph, self.group_by);
        let len = self.rows.len();
        match self.table_state.selected() {
            Some(i) if i >= len && len > 0 => self.table_state.select(Some(len - 1)),
            None if len > 0 => self.table_state.select(Some(0)),
            _ => {}
        }
    }

    fn selected_task_id(&self) -> Option<u64> {
        let i = self.table_state.selected()?;
        let row = self.rows.get(i)?;
        if row.id > 0 {
            Some(row.id as u64)
        } else {
            None
        }
    }

    fn select_delta(&mut self, delta: i64) {
        if self.rows.is_empty() {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as i64;
        let next = (current + delta).clamp(0, self.rows.len() as i64 - 1);
        self.table_state.select(Some(next as usize));
    }

    /// Show a notice unless an identical one fired within the last second.
    fn notify(&mut self, text: &str, now: Instant) {
        if self.notices.admit(text, now) {
            self.status_message = text.to_string();
        }
    }

    /// Move the selected task by a day delta, honoring the move-successors
    /// setting, and queue the affected rows for saving.
    fn shift_selected(&mut self, days: i64, now: Instant) {
        let Some(id) = self.selected_task_id() else {
            self.notify("Group rows are read-only", now);
            return;
        };
        let Some(task) = self.db.get(id) else { return };
        if task.is_sprint() {
            self.notify("Sprint bars follow their members; move the member tasks", now);
            return;
        }

        let plan = if self.db.settings.move_successors {
            let graph = TaskGraph::build(&self.db);
            shift_successors(&graph, &self.db.tasks, id, days)
        } else {
            Vec::new()
        };

        let delta = Duration::days(days);
        if let Some(task) = self.db.get_mut(id) {
            task.start += delta;
            task.end += delta;
            task.updated_at_utc = chrono::Utc::now().timestamp();
        }
        apply_shift(&mut self.db.tasks, &plan);

        self.save_queue.mark_dirty(id, now);
        for moved in &plan {
            self.save_queue.mark_dirty(moved.id, now);
        }
        if plan.is_empty() {
            self.status_message = format!("Moved #{id} by {days} day(s)");
        } else {
            self.status_message = format!("Moved #{id} and {} successor(s)", plan.len());
        }
        self.rebuild_rows();
    }

    /// Write the database once any queued edits fall due.
    fn flush_due_saves(&mut self, now: Instant) {
        if self.save_queue.due(now).is_empty() {
            return;
        }
        if let Err(e) = self.db.save(&self.db_path) {
            self.status_message = format!("Save failed: {e}");
        }
    }

    fn flush_all(&mut self) {
        if self.save_queue.drain_all().is_empty() {
            return;
        }
        if let Err(e) = self.db.save(&self.db_path) {
            eprintln!("Save failed: {e}");
        }
    }

    fn toggle_move_successors(&mut self, now: Instant) {
        self.db.settings.move_successors = !self.db.settings.move_successors;
        let state = if self.db.settings.move_successors { "on" } else { "off" };
        self.status_message = format!("Move successors: {state}");
        self.save_queue.mark_dirty(0, now);
    }

    fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;

            if event::poll(StdDuration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    let now = Instant::now();
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => {
                            self.flush_all();
                            return Ok(());
                        }
                        KeyCode::Up | KeyCode::Char('k') => self.select_delta(-1),
                        KeyCode::Down | KeyCode::Char('j') => self.select_delta(1),
                        KeyCode::Left => self.view_start -= Duration::days(7),
                        KeyCode::Right => self.view_start += Duration::days(7),
                        KeyCode::Char('+') | KeyCode::Char('=') => {
                            self.day_width = (self.day_width + 1).min(4);
                        }
                        KeyCode::Char('-') => {
                            self.day_width = (self.day_width - 1).max(1);
                        }
                        KeyCode::Char('g') => {
                            self.group_by = self.group_by.next();
                            self.status_message = format!("Grouping: {:?}", self.group_by);
                            self.rebuild_rows();
                        }
                        KeyCode::Char('H') => self.shift_selected(-1, now),
                        KeyCode::Char('L') => self.shift_selected(1, now),
                        KeyCode::Char('m') => self.toggle_move_successors(now),
                        _ => {}
                    }
                }
            }
            self.flush_due_saves(Instant::now());
        }
    }

    fn draw(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(3), Constraint::Length(1)])
            .split(f.area());

        self.draw_header(f, chunks[0]);
        self.draw_body(f, chunks[1]);
        self.draw_status(f, chunks[2]);
    }

    fn draw_header(&self, f: &mut Frame, area: Rect) {
        let succ = if self.db.settings.move_successors { "on" } else { "off" };
        let text = format!(
            " {} | grouping: {:?} | move-successors: {succ} | q quit, g group, H/L move, m toggle",
            self.db_path.file_name().and_then(|n| n.to_str()).unwrap_or("project"),
            self.group_by,
        );
        f.render_widget(
            Paragraph::new(text).style(Style::default().add_modifier(Modifier::REVERSED)),
            area,
        );
    }

    fn draw_body(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(32), Constraint::Min(20)])
            .split(area);

        self.draw_task_list(f, chunks[0]);
        self.draw_timeline(f, chunks[1]);
    }

    fn draw_task_list(&mut self, f: &mut Frame, area: Rect) {
        let rows: Vec<Row> = self
            .rows
            .iter()
            .map(|r| {
                let marker = match r.task_type.as_str() {
                    "sprint" => "▣ ",
                    "milestone" => "◆ ",
                    "group" => "",
                    _ => "· ",
                };
                let indent = if r.id < 0 {
                    ""
                } else if r.parent != 0 {
                    "  "
                } else {
                    ""
                };
                let style = if r.id < 0 {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Row::new(vec![format!("{indent}{marker}{}", r.text)]).style(style)
            })
            .collect();

        let table = Table::new(rows, [Constraint::Percentage(100)])
            .block(Block::default().borders(Borders::RIGHT))
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        f.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn draw_timeline(&self, f: &mut Frame, area: Rect) {
        if area.width < 4 || area.height < 2 {
            return;
        }
        let days_visible = (area.width / self.day_width) as i64;
        let today = chrono::Local::now().date_naive();

        let mut lines = vec![self.timeline_header(days_visible, today)];

        let offset = self.table_state.offset();
        for row in self.rows.iter().skip(offset) {
            lines.push(self.timeline_bar(row, days_visible, today));
            if lines.len() as u16 >= area.height {
                break;
            }
        }
        f.render_widget(Paragraph::new(lines), area);
    }

    /// Month/day tick row across the visible window.
    fn timeline_header(&self, days_visible: i64, today: NaiveDate) -> Line<'static> {
        let mut spans = Vec::new();
        for i in 0..days_visible {
            let day = self.view_start + Duration::days(i);
            let label = if day.format("%d").to_string() == "01" || i == 0 {
                day.format("%m/%d").to_string()
            } else {
                day.format("%d").to_string()
            };
            let mut cell = label;
            cell.truncate(self.day_width as usize);
            while (cell.chars().count() as u16) < self.day_width {
                cell.push(' ');
            }
            let style = if day == today {
                Style::default().fg(TODAY_MARK).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            spans.push(Span::styled(cell, style));
        }
        Line::from(spans)
    }

    /// One row of the chart: leading gap, then the bar.
    fn timeline_bar(&self, row: &GanttTask, days_visible: i64, today: NaiveDate) -> Line<'static> {
        let (Some(start), Some(end)) = (parse_wire_date(&row.start_date), parse_wire_date(&row.end_date)) else {
            return Line::from("");
        };
        let dw = self.day_width as i64;
        let from = (start - self.view_start).num_days();
        let to = (end - self.view_start).num_days();
        if to < 0 || from >= days_visible {
            return Line::from("");
        }

        let color = if row.id < 0 { GROUP_BAR } else { bar_color(&row.color) };
        let mut spans = Vec::new();
        let visible_from = from.max(0);
        spans.push(Span::raw(" ".repeat((visible_from * dw) as usize)));

        if row.is_milestone {
            let style = Style::default().fg(color);
            spans.push(Span::styled("◆", style));
            if Some(row.id as u64) == self.selected_task_id() {
                spans.push(Span::styled(format!(" {}", today_delta_label(start, today)), Style::default().fg(Color::DarkGray)));
            }
            return Line::from(spans);
        }

        let bar_days = (to.min(days_visible - 1) - visible_from + 1).max(0);
        let bar_cells = (bar_days * dw) as usize;
        if bar_cells == 0 {
            return Line::from(spans);
        }
        // progress fill over the left portion of the bar
        let fill_cells = if self.db.settings.show_progress && row.id > 0 {
            ((bar_cells as f64) * row.progress.clamp(0.0, 1.0)).round() as usize
        } else {
            0
        };
        let fill_cells = fill_cells.min(bar_cells);
        if fill_cells > 0 {
            spans.push(Span::styled("█".repeat(fill_cells), Style::default().fg(PROGRESS_FILL).bg(color)));
        }
        let glyph = if row.id < 0 || row.task_type == "sprint" { "▬" } else { "█" };
        spans.push(Span::styled(glyph.repeat(bar_cells - fill_cells), Style::default().fg(color)));
        Line::from(spans)
    }

    fn draw_status(&self, f: &mut Frame, area: Rect) {
        let pending = if self.save_queue.is_empty() { "" } else { " [unsaved]" };
        let text = format!(" {}{pending}", self.status_message);
        f.render_widget(Paragraph::new(text).style(Style::default().fg(Color::DarkGray)), area);
    }
}

fn earliest_start(db: &Database) -> Option<NaiveDate> {
    db.tasks.iter().map(|t| t.start).min()
}

fn parse_wire_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.split(' ').next().unwrap_or(s), "%Y-%m-%d").ok()
}

fn today_delta_label(day: NaiveDate, today: NaiveDate) -> String {
    let delta = (day - today).num_days();
    if delta == 0 {
        "today".to_string()
    } else if delta > 0 {
        format!("in {delta}d")
    } else {
        format!("{}d ago", -delta)
    }
}

/// Run the Gantt TUI against a project file.
pub fn run_tui(db_path: &Path) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(db_path);
    let res = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::date;

    #[test]
    fn wire_dates_parse_back_to_days() {
        assert_eq!(parse_wire_date("2024-06-03 00:00"), Some(date("2024-06-03")));
        assert_eq!(parse_wire_date("2024-06-03"), Some(date("2024-06-03")));
        assert_eq!(parse_wire_date("junk"), None);
    }

    #[test]
    fn today_delta_labels() {
        let today = date("2024-06-10");
        assert_eq!(today_delta_label(today, today), "today");
        assert_eq!(today_delta_label(date("2024-06-12"), today), "in 2d");
        assert_eq!(today_delta_label(date("2024-06-08"), today), "2d ago");
    }
}
