use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::task::{Color, Task};

const TASKS_FILE: &str = "planner-tasks.json";

/// Fields supplied when creating a task; everything else takes defaults.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub color: Color,
}

/// Partial update. `None` leaves a field unchanged; `due_date` carries a
/// second level so a set date can also be cleared.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<Option<NaiveDate>>,
    pub color: Option<Color>,
    pub status: Option<crate::task::Status>,
}

/// Owns the ordered task list and its on-disk home. The whole list is
/// rewritten under the fixed storage key on every mutation.
#[derive(Debug)]
pub struct TaskStore {
    pub data_dir: PathBuf,
    tasks_path: PathBuf,
    tasks: Vec<Task>,
}

impl TaskStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let tasks_path = data_dir.join(TASKS_FILE);
        let tasks = restore(&tasks_path);

        info!(
            data_dir = %data_dir.display(),
            tasks = tasks.len(),
            "opened task store"
        );

        Ok(Self {
            data_dir,
            tasks_path,
            tasks,
        })
    }

    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn find(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn find_mut(&mut self, id: Uuid) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Resolve a user-supplied token to a task id: a full uuid or a
    /// unique prefix of one.
    pub fn resolve_id(&self, token: &str) -> anyhow::Result<Uuid> {
        if let Ok(id) = token.parse::<Uuid>() {
            if self.find(id).is_some() {
                return Ok(id);
            }
            return Err(anyhow!("task not found: {id}"));
        }

        let needle = token.to_ascii_lowercase();
        let mut matches = self
            .tasks
            .iter()
            .filter(|t| t.id.simple().to_string().starts_with(&needle));

        let first = matches
            .next()
            .ok_or_else(|| anyhow!("task not found: {token}"))?;
        if matches.next().is_some() {
            return Err(anyhow!("ambiguous task id prefix: {token}"));
        }
        Ok(first.id)
    }

    #[tracing::instrument(skip(self, draft), fields(title = %draft.title))]
    pub fn create(&mut self, draft: TaskDraft, now: DateTime<Utc>) -> anyhow::Result<&Task> {
        let mut task = Task::new(draft.title, now);
        task.description = draft.description;
        task.due_date = draft.due_date;
        task.color = draft.color;

        let id = task.id;
        self.tasks.push(task);
        self.persist()?;

        // Just pushed, so the lookup cannot miss.
        self.find(id)
            .ok_or_else(|| anyhow!("freshly created task vanished: {id}"))
    }

    #[tracing::instrument(skip(self, patch), fields(id = %id))]
    pub fn update(&mut self, id: Uuid, patch: TaskPatch) -> anyhow::Result<()> {
        let task = self
            .find_mut(id)
            .ok_or_else(|| anyhow!("task not found: {id}"))?;

        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(color) = patch.color {
            task.color = color;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }

        self.persist()
    }

    /// Remove a task and return it. When the task holds the active timer
    /// slot the caller detaches the timer engine first, so no slot is left
    /// pointing at a missing record.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub fn delete(&mut self, id: Uuid) -> anyhow::Result<Task> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| anyhow!("task not found: {id}"))?;

        let task = self.tasks.remove(idx);
        self.persist()?;
        Ok(task)
    }

    #[tracing::instrument(skip(self))]
    pub fn persist(&self) -> anyhow::Result<()> {
        debug!(file = %self.tasks_path.display(), count = self.tasks.len(), "saving tasks");

        let dir = self
            .tasks_path
            .parent()
            .unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        let serialized = serde_json::to_string_pretty(&self.tasks)?;
        temp.write_all(serialized.as_bytes())?;
        temp.flush()?;

        temp.persist(&self.tasks_path).map_err(|err| {
            anyhow!("failed to persist {}: {}", self.tasks_path.display(), err)
        })?;

        Ok(())
    }
}

/// Load the stored collection. Absent or unreadable data degrades to an
/// empty list; corruption never stops the planner from starting. No tick
/// survives a restart, so every restored task is marked not running; the
/// timer engine re-marks the one its slot file still points at.
fn restore(path: &Path) -> Vec<Task> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(file = %path.display(), "no stored tasks yet");
            return Vec::new();
        }
        Err(err) => {
            warn!(file = %path.display(), error = %err, "failed to read stored tasks; starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<Task>>(&raw) {
        Ok(mut tasks) => {
            for task in &mut tasks {
                task.timer_running = false;
            }
            debug!(file = %path.display(), count = tasks.len(), "restored tasks");
            tasks
        }
        Err(err) => {
            warn!(file = %path.display(), error = %err, "stored tasks are corrupt; starting empty");
            Vec::new()
        }
    }
}
