use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Board column a task currently sits in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Todo,
    InProgress,
    Done,
    Paused,
}

impl Status {
    /// Column label shown on the board.
    pub fn label(self) -> &'static str {
        match self {
            Status::Todo => "Взять в работу",
            Status::InProgress => "В работе",
            Status::Done => "Готово",
            Status::Paused => "Отложена",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::InProgress => "in-progress",
            Status::Done => "done",
            Status::Paused => "paused",
        }
    }
}

impl std::str::FromStr for Status {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "todo" => Ok(Status::Todo),
            "in-progress" | "in_progress" => Ok(Status::InProgress),
            "done" => Ok(Status::Done),
            "paused" => Ok(Status::Paused),
            other => Err(anyhow::anyhow!("unknown status: {other}")),
        }
    }
}

/// Sticker palette. Stored as the hex values the original board used;
/// unrecognized stored values fall back to the default category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum Color {
    Yellow,
    Blue,
    Green,
    Pink,
    Purple,
    Orange,
}

impl Color {
    pub fn hex(self) -> &'static str {
        match self {
            Color::Yellow => "#FFD700",
            Color::Blue => "#87CEEB",
            Color::Green => "#98FB98",
            Color::Pink => "#FFB6C1",
            Color::Purple => "#DDA0DD",
            Color::Orange => "#FFA500",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Yellow => "yellow",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Pink => "pink",
            Color::Purple => "purple",
            Color::Orange => "orange",
        }
    }

    fn lenient(s: &str) -> Color {
        match s.trim().to_ascii_lowercase().as_str() {
            "#87ceeb" | "blue" => Color::Blue,
            "#98fb98" | "green" => Color::Green,
            "#ffb6c1" | "pink" => Color::Pink,
            "#dda0dd" | "purple" => Color::Purple,
            "#ffa500" | "orange" => Color::Orange,
            _ => Color::Yellow,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::Yellow
    }
}

impl From<String> for Color {
    fn from(s: String) -> Self {
        Color::lenient(&s)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.hex().to_string()
    }
}

impl std::str::FromStr for Color {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yellow" => Ok(Color::Yellow),
            "blue" => Ok(Color::Blue),
            "green" => Ok(Color::Green),
            "pink" => Ok(Color::Pink),
            "purple" => Ok(Color::Purple),
            "orange" => Ok(Color::Orange),
            other => Err(anyhow::anyhow!("unknown color: {other}")),
        }
    }
}

/// A planner task. The persisted field names match the collection the
/// original board kept under its storage key, so older stores load as-is;
/// missing optional fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub due_date: Option<NaiveDate>,

    #[serde(default)]
    pub color: Color,

    pub status: Status,

    pub created_at: DateTime<Utc>,

    /// Accumulated elapsed milliseconds. Monotonically non-decreasing.
    #[serde(default)]
    pub time_spent: u64,

    /// True iff this task holds the single active timer slot.
    #[serde(default)]
    pub timer_running: bool,
}

impl Task {
    pub fn new(title: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description: String::new(),
            due_date: None,
            color: Color::default(),
            status: Status::Todo,
            created_at: now,
            time_spent: 0,
            timer_running: false,
        }
    }
}

/// Compact elapsed-time display, e.g. "5с", "1м 5с", "2ч 3м 4с".
pub fn format_time_spent(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;

    if hours > 0 {
        format!("{hours}ч {minutes}м {seconds}с")
    } else if minutes > 0 {
        format!("{minutes}м {seconds}с")
    } else {
        format!("{seconds}с")
    }
}
