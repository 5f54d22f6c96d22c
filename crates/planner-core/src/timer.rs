use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::store::TaskStore;
use crate::task::Status;

const TIMER_FILE: &str = "planner-timer.json";

/// Cosmetic display refresh period for shells that poll `elapsed_ms`.
/// Accounting never depends on it; flushes use wall-clock deltas.
pub const TICK_PERIOD: std::time::Duration = std::time::Duration::from_secs(1);

/// The single active timer slot: which task is accruing time and since
/// when. Never a copy of the task itself.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActiveTimer {
    pub task_id: Uuid,
    pub started_at: DateTime<Utc>,
}

/// Enforces the one-running-timer invariant and owns elapsed-time
/// accounting. The slot is persisted to its own sidecar file so a timer
/// started in one invocation can be stopped in a later one.
#[derive(Debug)]
pub struct TimerEngine {
    slot_path: PathBuf,
    active: Option<ActiveTimer>,
}

impl TimerEngine {
    /// Load the slot sidecar and reconcile it with the store: a slot
    /// pointing at a task that still exists re-marks that task running;
    /// anything else is discarded.
    #[tracing::instrument(skip(data_dir, store))]
    pub fn open(data_dir: &Path, store: &mut TaskStore) -> anyhow::Result<Self> {
        let slot_path = data_dir.join(TIMER_FILE);
        let mut engine = Self {
            slot_path,
            active: None,
        };

        match load_slot(&engine.slot_path) {
            Some(slot) => {
                if let Some(task) = store.find_mut(slot.task_id) {
                    task.timer_running = true;
                    engine.active = Some(slot);
                    info!(task = %slot.task_id, "resumed active timer");
                } else {
                    warn!(task = %slot.task_id, "timer slot points at a missing task; clearing");
                    engine.save_slot()?;
                }
            }
            None => debug!("no active timer"),
        }

        Ok(engine)
    }

    pub fn active_task(&self) -> Option<Uuid> {
        self.active.map(|slot| slot.task_id)
    }

    /// Start accruing time on `id`. A timer running on another task is
    /// flushed and cleared first without touching that task's status; a
    /// re-entrant start on the active task flushes the interval accrued so
    /// far and restarts the instant, so nothing is lost or double counted.
    #[tracing::instrument(skip(self, store), fields(id = %id))]
    pub fn start(
        &mut self,
        store: &mut TaskStore,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        if store.find(id).is_none() {
            return Err(anyhow!("task not found: {id}"));
        }

        if let Some(slot) = self.active.take() {
            flush(store, slot, now);
        }

        // The existence check above makes this lookup infallible.
        if let Some(task) = store.find_mut(id) {
            task.timer_running = true;
            task.status = Status::InProgress;
        }
        self.active = Some(ActiveTimer {
            task_id: id,
            started_at: now,
        });

        self.save_slot()?;
        store.persist()?;
        info!(task = %id, "timer started");
        Ok(())
    }

    /// Flush and clear the timer, leaving the task `Paused`. A no-op when
    /// `id` is not the active task.
    #[tracing::instrument(skip(self, store), fields(id = %id))]
    pub fn pause(
        &mut self,
        store: &mut TaskStore,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.halt(store, id, now, Status::Paused)
    }

    /// Flush and clear the timer, leaving the task `Done`. A no-op when
    /// `id` is not the active task.
    #[tracing::instrument(skip(self, store), fields(id = %id))]
    pub fn stop(
        &mut self,
        store: &mut TaskStore,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.halt(store, id, now, Status::Done)
    }

    fn halt(
        &mut self,
        store: &mut TaskStore,
        id: Uuid,
        now: DateTime<Utc>,
        status: Status,
    ) -> anyhow::Result<()> {
        let Some(slot) = self.active else {
            debug!("no timer running; ignoring");
            return Ok(());
        };
        if slot.task_id != id {
            debug!(active = %slot.task_id, "timer running on another task; ignoring");
            return Ok(());
        }

        self.active = None;
        flush(store, slot, now);
        if let Some(task) = store.find_mut(id) {
            task.status = status;
        }

        self.save_slot()?;
        store.persist()?;
        info!(task = %id, status = status.as_str(), "timer cleared");
        Ok(())
    }

    /// Drop the slot without flushing, used when the owning task is being
    /// deleted. No-op unless the slot references `id`.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub fn detach(&mut self, id: Uuid) -> anyhow::Result<()> {
        if self.active.map(|slot| slot.task_id) != Some(id) {
            return Ok(());
        }
        self.active = None;
        self.save_slot()?;
        info!(task = %id, "timer detached");
        Ok(())
    }

    /// Live elapsed milliseconds for display: the stored total plus, for
    /// the active task only, the un-flushed wall-clock interval. Pure
    /// query; stored totals move only at start/pause/stop boundaries.
    pub fn elapsed_ms(&self, store: &TaskStore, id: Uuid, now: DateTime<Utc>) -> Option<u64> {
        let task = store.find(id)?;
        let mut total = task.time_spent;
        if let Some(slot) = self.active
            && slot.task_id == id
        {
            total += delta_ms(slot.started_at, now);
        }
        Some(total)
    }

    fn save_slot(&self) -> anyhow::Result<()> {
        let dir = self.slot_path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        let serialized = serde_json::to_string(&self.active)?;
        temp.write_all(serialized.as_bytes())?;
        temp.flush()?;
        temp.persist(&self.slot_path)
            .map_err(|err| anyhow!("failed to persist {}: {}", self.slot_path.display(), err))
            .context("failed to save timer slot")?;
        Ok(())
    }
}

/// Commit the slot's wall-clock interval into the task and clear its
/// running flag. The task's status is left alone; only explicit
/// pause/stop/start transitions change it.
fn flush(store: &mut TaskStore, slot: ActiveTimer, now: DateTime<Utc>) {
    if let Some(task) = store.find_mut(slot.task_id) {
        task.time_spent += delta_ms(slot.started_at, now);
        task.timer_running = false;
    }
}

/// Wall-clock delta in milliseconds, clamped at zero so a stepped-back
/// clock can never shrink `time_spent`.
fn delta_ms(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    (to - from).num_milliseconds().max(0) as u64
}

fn load_slot(path: &Path) -> Option<ActiveTimer> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            warn!(file = %path.display(), error = %err, "failed to read timer slot; clearing");
            return None;
        }
    };

    match serde_json::from_str::<Option<ActiveTimer>>(&raw) {
        Ok(slot) => slot,
        Err(err) => {
            warn!(file = %path.display(), error = %err, "timer slot is corrupt; clearing");
            None
        }
    }
}
