use chrono::{Duration, NaiveDate, TimeZone, Utc};
use planner_core::board::group_by_status;
use planner_core::calendar::{month_grid, tasks_on_date, week_of};
use planner_core::store::{TaskDraft, TaskPatch, TaskStore};
use planner_core::task::{Color, Status, format_time_spent};
use planner_core::timer::TimerEngine;
use tempfile::tempdir;

fn draft(title: &str) -> TaskDraft {
    TaskDraft {
        title: title.to_string(),
        ..TaskDraft::default()
    }
}

#[test]
fn store_roundtrip_reproduces_tasks() {
    let temp = tempdir().expect("tempdir");
    let now = Utc.with_ymd_and_hms(2026, 8, 26, 9, 0, 0).unwrap();

    let (first, second) = {
        let mut store = TaskStore::open(temp.path()).expect("open store");
        let first = store
            .create(
                TaskDraft {
                    title: "Купить продукты".to_string(),
                    description: "молоко, хлеб".to_string(),
                    due_date: NaiveDate::from_ymd_opt(2026, 8, 30),
                    color: Color::Green,
                },
                now,
            )
            .expect("create")
            .id;
        let second = store.create(draft("Сдать отчёт"), now).expect("create").id;

        store
            .update(
                second,
                TaskPatch {
                    status: Some(Status::Paused),
                    ..TaskPatch::default()
                },
            )
            .expect("update");

        (first, second)
    };

    let store = TaskStore::open(temp.path()).expect("reopen store");
    assert_eq!(store.list().len(), 2);

    let restored = store.find(first).expect("find first");
    assert_eq!(restored.title, "Купить продукты");
    assert_eq!(restored.description, "молоко, хлеб");
    assert_eq!(restored.due_date, NaiveDate::from_ymd_opt(2026, 8, 30));
    assert_eq!(restored.color, Color::Green);
    assert_eq!(restored.status, Status::Todo);

    assert_eq!(store.find(second).expect("find second").status, Status::Paused);

    // Insertion order survives the round trip.
    assert_eq!(store.list()[0].id, first);
    assert_eq!(store.list()[1].id, second);
}

#[test]
fn corrupt_store_degrades_to_empty() {
    let temp = tempdir().expect("tempdir");
    std::fs::write(temp.path().join("planner-tasks.json"), "{not json").expect("write");

    let mut store = TaskStore::open(temp.path()).expect("open despite corruption");
    assert!(store.list().is_empty());

    // And the store is usable afterwards.
    let now = Utc.with_ymd_and_hms(2026, 8, 26, 9, 0, 0).unwrap();
    store.create(draft("fresh start"), now).expect("create");
    assert_eq!(store.list().len(), 1);
}

#[test]
fn unknown_ids_are_errors() {
    let temp = tempdir().expect("tempdir");
    let mut store = TaskStore::open(temp.path()).expect("open store");

    let missing = uuid::Uuid::new_v4();
    assert!(store.update(missing, TaskPatch::default()).is_err());
    assert!(store.delete(missing).is_err());
    assert!(store.resolve_id("zzzz").is_err());
}

#[test]
fn full_timer_flow_to_done() {
    let temp = tempdir().expect("tempdir");
    let mut store = TaskStore::open(temp.path()).expect("open store");
    let mut timer = TimerEngine::open(temp.path(), &mut store).expect("open timer");

    let now = Utc.with_ymd_and_hms(2026, 8, 26, 9, 0, 0).unwrap();
    let id = store.create(draft("Большая задача"), now).expect("create").id;

    let task = store.find(id).expect("find");
    assert_eq!(task.status, Status::Todo);
    assert_eq!(task.time_spent, 0);

    timer.start(&mut store, id, now).expect("start");
    let task = store.find(id).expect("find");
    assert_eq!(task.status, Status::InProgress);
    assert!(task.timer_running);

    let later = now + Duration::seconds(65);
    timer.stop(&mut store, id, later).expect("stop");

    let task = store.find(id).expect("find");
    assert_eq!(task.status, Status::Done);
    assert!(!task.timer_running);
    assert_eq!(task.time_spent, 65_000);
    assert_eq!(format_time_spent(task.time_spent), "1м 5с");
}

#[test]
fn at_most_one_timer_runs_across_a_session() {
    let temp = tempdir().expect("tempdir");
    let mut store = TaskStore::open(temp.path()).expect("open store");
    let mut timer = TimerEngine::open(temp.path(), &mut store).expect("open timer");

    let now = Utc.with_ymd_and_hms(2026, 8, 26, 9, 0, 0).unwrap();
    let ids: Vec<_> = (0..4)
        .map(|i| {
            store
                .create(draft(&format!("задача {i}")), now)
                .expect("create")
                .id
        })
        .collect();

    let mut t = now;
    for id in &ids {
        t += Duration::seconds(10);
        timer.start(&mut store, *id, t).expect("start");
        let running = store.list().iter().filter(|task| task.timer_running).count();
        assert_eq!(running, 1);
    }

    t += Duration::seconds(10);
    timer.pause(&mut store, ids[3], t).expect("pause");
    assert!(store.list().iter().all(|task| !task.timer_running));

    // Every task got exactly its ten seconds of wall clock.
    for id in &ids {
        assert_eq!(store.find(*id).expect("find").time_spent, 10_000);
    }
}

#[test]
fn projections_agree_with_store_contents() {
    let temp = tempdir().expect("tempdir");
    let mut store = TaskStore::open(temp.path()).expect("open store");

    let now = Utc.with_ymd_and_hms(2026, 8, 26, 9, 0, 0).unwrap();
    let sunday = NaiveDate::from_ymd_opt(2026, 8, 30).expect("date");

    store
        .create(
            TaskDraft {
                title: "воскресная".to_string(),
                due_date: Some(sunday),
                ..TaskDraft::default()
            },
            now,
        )
        .expect("create");
    let moved = store.create(draft("в колонку done"), now).expect("create").id;
    store
        .update(
            moved,
            TaskPatch {
                status: Some(Status::Done),
                ..TaskPatch::default()
            },
        )
        .expect("update");

    let board = group_by_status(store.list());
    assert_eq!(board.column(Status::Todo).len(), 1);
    assert_eq!(board.column(Status::Done).len(), 1);

    let week = week_of(sunday);
    assert_eq!(tasks_on_date(store.list(), week[6]).len(), 1);

    let grid = month_grid(2026, 8);
    assert_eq!(grid.cells.len(), 42);
    let due_cells: usize = grid
        .cells
        .iter()
        .map(|cell| tasks_on_date(store.list(), cell.date).len())
        .sum();
    assert_eq!(due_cells, 1);
}
