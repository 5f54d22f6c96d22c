use tracing::trace;
use uuid::Uuid;

use crate::store::{TaskPatch, TaskStore};
use crate::task::{Status, Task};

/// Fixed column order of the board.
pub const COLUMNS: [Status; 4] = [
    Status::Todo,
    Status::InProgress,
    Status::Done,
    Status::Paused,
];

/// Tasks grouped into board columns, store order preserved within each.
#[derive(Debug)]
pub struct BoardView<'a> {
    columns: [Vec<&'a Task>; 4],
}

fn column_index(status: Status) -> usize {
    match status {
        Status::Todo => 0,
        Status::InProgress => 1,
        Status::Done => 2,
        Status::Paused => 3,
    }
}

impl<'a> BoardView<'a> {
    pub fn column(&self, status: Status) -> &[&'a Task] {
        &self.columns[column_index(status)]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Status, &[&'a Task])> {
        COLUMNS
            .iter()
            .zip(self.columns.iter())
            .map(|(status, tasks)| (*status, tasks.as_slice()))
    }
}

/// Pure projection of the task list into board columns.
pub fn group_by_status(tasks: &[Task]) -> BoardView<'_> {
    let mut columns: [Vec<&Task>; 4] = Default::default();
    for task in tasks {
        columns[column_index(task.status)].push(task);
    }
    trace!(
        todo = columns[0].len(),
        in_progress = columns[1].len(),
        done = columns[2].len(),
        paused = columns[3].len(),
        "projected board"
    );
    BoardView { columns }
}

/// Drag-and-drop reassignment: write the target column's status onto the
/// task, skipping the write when nothing changes. Does not touch the
/// timer; a running task can be dragged without releasing the slot.
pub fn move_task(store: &mut TaskStore, id: Uuid, target: Status) -> anyhow::Result<()> {
    let current = store
        .find(id)
        .ok_or_else(|| anyhow::anyhow!("task not found: {id}"))?
        .status;

    if current == target {
        trace!(id = %id, status = target.as_str(), "task already in column");
        return Ok(());
    }

    store.update(
        id,
        TaskPatch {
            status: Some(target),
            ..TaskPatch::default()
        },
    )
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use super::{COLUMNS, group_by_status, move_task};
    use crate::store::{TaskDraft, TaskStore};
    use crate::task::{Status, Task};

    #[test]
    fn groups_preserve_store_order() {
        let now = Utc.with_ymd_and_hms(2026, 8, 26, 9, 0, 0).unwrap();
        let mut tasks = Vec::new();
        for (title, status) in [
            ("first", Status::Todo),
            ("second", Status::Done),
            ("third", Status::Todo),
            ("fourth", Status::InProgress),
        ] {
            let mut task = Task::new(title.to_string(), now);
            task.status = status;
            tasks.push(task);
        }

        let board = group_by_status(&tasks);
        let todo: Vec<&str> = board
            .column(Status::Todo)
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(todo, vec!["first", "third"]);
        assert_eq!(board.column(Status::Done).len(), 1);
        assert_eq!(board.column(Status::Paused).len(), 0);

        let total: usize = board.iter().map(|(_, tasks)| tasks.len()).sum();
        assert_eq!(total, tasks.len());
        assert_eq!(board.iter().count(), COLUMNS.len());
    }

    #[test]
    fn move_task_writes_only_on_change() {
        let temp = tempdir().expect("tempdir");
        let mut store = TaskStore::open(temp.path()).expect("open store");
        let now = Utc.with_ymd_and_hms(2026, 8, 26, 9, 0, 0).unwrap();

        let id = store
            .create(
                TaskDraft {
                    title: "drag me".to_string(),
                    ..TaskDraft::default()
                },
                now,
            )
            .expect("create")
            .id;

        move_task(&mut store, id, Status::Done).expect("move");
        assert_eq!(store.find(id).expect("find").status, Status::Done);

        // Dropping onto the same column is a no-op, not an error.
        move_task(&mut store, id, Status::Done).expect("same column");
        assert_eq!(store.find(id).expect("find").status, Status::Done);
    }

    #[test]
    fn move_does_not_release_timer_flag() {
        let temp = tempdir().expect("tempdir");
        let mut store = TaskStore::open(temp.path()).expect("open store");
        let mut timer =
            crate::timer::TimerEngine::open(temp.path(), &mut store).expect("open timer");
        let now = Utc.with_ymd_and_hms(2026, 8, 26, 9, 0, 0).unwrap();

        let id = store
            .create(
                TaskDraft {
                    title: "busy".to_string(),
                    ..TaskDraft::default()
                },
                now,
            )
            .expect("create")
            .id;

        timer.start(&mut store, id, now).expect("start");
        move_task(&mut store, id, Status::Paused).expect("move");

        let task = store.find(id).expect("find");
        assert_eq!(task.status, Status::Paused);
        assert!(task.timer_running);
        assert_eq!(timer.active_task(), Some(id));
    }
}
