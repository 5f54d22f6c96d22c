use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::{Datelike, NaiveDate};
use unicode_width::UnicodeWidthStr;

use crate::board::BoardView;
use crate::calendar::MonthGrid;
use crate::config::Config;
use crate::task::{Task, format_time_spent};

const WEEKDAY_NAMES: [&str; 7] = ["Пн", "Вт", "Ср", "Чт", "Пт", "Сб", "Вс"];

fn month_name(month: u32) -> &'static str {
    match month {
        1 => "Январь",
        2 => "Февраль",
        3 => "Март",
        4 => "Апрель",
        5 => "Май",
        6 => "Июнь",
        7 => "Июль",
        8 => "Август",
        9 => "Сентябрь",
        10 => "Октябрь",
        11 => "Ноябрь",
        _ => "Декабрь",
    }
}

/// Per-task view model row: everything the shell shows, precomputed by
/// the command layer so rendering stays free of business logic.
#[derive(Debug, Clone)]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub status: String,
    pub due: String,
    pub time: String,
    pub color: String,
    pub running: bool,
    pub overdue: bool,
}

impl TaskRow {
    pub fn new(task: &Task, elapsed_ms: u64, today: NaiveDate) -> Self {
        Self {
            id: short_id(task),
            title: task.title.clone(),
            status: task.status.label().to_string(),
            due: task
                .due_date
                .map(|d| d.format("%d.%m.%Y").to_string())
                .unwrap_or_default(),
            time: format_time_spent(elapsed_ms),
            color: task.color.name().to_string(),
            running: task.timer_running,
            overdue: task.due_date.is_some_and(|d| d < today),
        }
    }
}

pub fn short_id(task: &Task) -> String {
    task.id.simple().to_string()[..8].to_string()
}

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, rows))]
    pub fn print_task_table(&mut self, rows: &[TaskRow]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = vec![
            "ID".to_string(),
            "Задача".to_string(),
            "Статус".to_string(),
            "Срок".to_string(),
            "Время".to_string(),
            "Цвет".to_string(),
        ];

        let mut table = Vec::with_capacity(rows.len());
        for row in rows {
            let id = self.paint(&row.id, "33");
            let due = if row.overdue {
                self.paint(&row.due, "31")
            } else {
                row.due.clone()
            };
            let time = if row.running {
                self.paint(&row.time, "32")
            } else {
                row.time.clone()
            };

            table.push(vec![
                id,
                row.title.clone(),
                row.status.clone(),
                due,
                time,
                row.color.clone(),
            ]);
        }

        write_table(&mut out, headers, table)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, board))]
    pub fn print_board(&mut self, board: &BoardView<'_>) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let mut headers = Vec::new();
        let mut columns: Vec<Vec<String>> = Vec::new();
        for (status, tasks) in board.iter() {
            headers.push(format!("{} ({})", status.label(), tasks.len()));
            columns.push(
                tasks
                    .iter()
                    .map(|t| format!("{} {}", short_id(t), t.title))
                    .collect(),
            );
        }

        let depth = columns.iter().map(|c| c.len()).max().unwrap_or(0);
        let mut rows = Vec::with_capacity(depth);
        for i in 0..depth {
            rows.push(
                columns
                    .iter()
                    .map(|c| c.get(i).cloned().unwrap_or_default())
                    .collect(),
            );
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, days))]
    pub fn print_week(&mut self, days: &[(NaiveDate, Vec<String>)]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = vec![
            "День".to_string(),
            "Дата".to_string(),
            "Задачи".to_string(),
        ];

        let mut rows = Vec::with_capacity(days.len());
        for (idx, (date, titles)) in days.iter().enumerate() {
            let name = WEEKDAY_NAMES.get(idx).copied().unwrap_or("");
            rows.push(vec![
                name.to_string(),
                date.format("%d.%m.%Y").to_string(),
                titles.join(", "),
            ]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    /// Seven columns, six rows; out-of-month days are dimmed, days with
    /// due tasks carry their count.
    #[tracing::instrument(skip(self, grid, counts))]
    pub fn print_month(&mut self, grid: &MonthGrid, counts: &[usize]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "{} {}", month_name(grid.month), grid.year)?;

        let headers = WEEKDAY_NAMES.iter().map(|s| s.to_string()).collect();
        let mut rows = Vec::with_capacity(6);
        for week in 0..6 {
            let mut row = Vec::with_capacity(7);
            for day in 0..7 {
                let idx = week * 7 + day;
                let cell = &grid.cells[idx];
                let count = counts.get(idx).copied().unwrap_or(0);
                let text = if count > 0 {
                    format!("{:2} ({count})", cell.date.day())
                } else {
                    format!("{:2}", cell.date.day())
                };
                let text = if cell.in_month {
                    text
                } else {
                    self.paint(&text, "90")
                };
                row.push(text);
            }
            rows.push(row);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, task))]
    pub fn print_task_info(&mut self, task: &Task, elapsed_ms: u64) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "id        {}", task.id)?;
        writeln!(out, "title     {}", task.title)?;
        writeln!(out, "desc      {}", task.description)?;
        writeln!(out, "status    {}", task.status.as_str())?;
        writeln!(out, "color     {}", task.color.name())?;
        writeln!(out, "created   {}", task.created_at.format("%Y-%m-%d %H:%M:%S"))?;
        if let Some(due) = task.due_date {
            writeln!(out, "due       {}", due.format("%Y-%m-%d"))?;
        }
        writeln!(out, "time      {}", format_time_spent(elapsed_ms))?;
        writeln!(out, "running   {}", task.timer_running)?;

        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
