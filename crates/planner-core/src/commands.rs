use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, instrument};

use crate::board;
use crate::calendar::{self, CalendarView};
use crate::cli::Command;
use crate::render::{Renderer, TaskRow, short_id};
use crate::store::{TaskDraft, TaskPatch, TaskStore};
use crate::task::format_time_spent;
use crate::timer::TimerEngine;

#[instrument(skip(store, timer, renderer, command))]
pub fn dispatch(
    store: &mut TaskStore,
    timer: &mut TimerEngine,
    renderer: &mut Renderer,
    command: Command,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let today = now.date_naive();

    match command {
        Command::Add {
            title,
            description,
            due,
            color,
        } => cmd_add(store, title, description, due, color, now),
        Command::Modify {
            id,
            title,
            description,
            due,
            clear_due,
            color,
            status,
        } => {
            let patch = TaskPatch {
                title,
                description,
                due_date: if clear_due { Some(None) } else { due.map(Some) },
                color,
                status,
            };
            cmd_modify(store, &id, patch)
        }
        Command::Delete { id } => cmd_delete(store, timer, &id),
        Command::List => cmd_list(store, timer, renderer, now),
        Command::Info { id } => cmd_info(store, timer, renderer, &id, now),
        Command::Start { id } => cmd_start(store, timer, &id, now),
        Command::Pause { id } => cmd_pause(store, timer, &id, now),
        Command::Stop { id } => cmd_stop(store, timer, &id, now),
        Command::Board => cmd_board(store, renderer),
        Command::Move { id, status } => cmd_move(store, &id, status),
        Command::Week { offset } => cmd_week(store, renderer, today, offset),
        Command::Month { offset } => cmd_month(store, renderer, today, offset),
    }
}

#[instrument(skip(store, title, description, due, color, now))]
fn cmd_add(
    store: &mut TaskStore,
    title: String,
    description: String,
    due: Option<NaiveDate>,
    color: crate::task::Color,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command add");

    let task = store.create(
        TaskDraft {
            title,
            description,
            due_date: due,
            color,
        },
        now,
    )?;

    println!("Создана задача {} — {}", short_id(task), task.title);
    Ok(())
}

#[instrument(skip(store, patch))]
fn cmd_modify(store: &mut TaskStore, id: &str, patch: TaskPatch) -> anyhow::Result<()> {
    info!("command modify");

    let id = store.resolve_id(id)?;
    store.update(id, patch)?;
    println!("Задача обновлена.");
    Ok(())
}

#[instrument(skip(store, timer))]
fn cmd_delete(store: &mut TaskStore, timer: &mut TimerEngine, id: &str) -> anyhow::Result<()> {
    info!("command delete");

    let id = store.resolve_id(id)?;
    // Release the active slot first so the delete cannot leave the engine
    // pointing at a missing record.
    timer.detach(id)?;
    let task = store.delete(id)?;
    println!("Задача удалена: {}", task.title);
    Ok(())
}

#[instrument(skip(store, timer, renderer, now))]
fn cmd_list(
    store: &TaskStore,
    timer: &TimerEngine,
    renderer: &mut Renderer,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command list");

    let today = now.date_naive();
    let rows: Vec<TaskRow> = store
        .list()
        .iter()
        .map(|task| {
            let elapsed = timer.elapsed_ms(store, task.id, now).unwrap_or(task.time_spent);
            TaskRow::new(task, elapsed, today)
        })
        .collect();

    renderer.print_task_table(&rows)
}

#[instrument(skip(store, timer, renderer, now))]
fn cmd_info(
    store: &TaskStore,
    timer: &TimerEngine,
    renderer: &mut Renderer,
    id: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command info");

    let id = store.resolve_id(id)?;
    let task = store
        .find(id)
        .ok_or_else(|| anyhow::anyhow!("task not found: {id}"))?;
    let elapsed = timer.elapsed_ms(store, id, now).unwrap_or(task.time_spent);
    renderer.print_task_info(task, elapsed)
}

#[instrument(skip(store, timer, now))]
fn cmd_start(
    store: &mut TaskStore,
    timer: &mut TimerEngine,
    id: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command start");

    let id = store.resolve_id(id)?;
    timer.start(store, id, now)?;
    if let Some(task) = store.find(id) {
        println!("Таймер запущен для задачи \"{}\"", task.title);
    }
    Ok(())
}

#[instrument(skip(store, timer, now))]
fn cmd_pause(
    store: &mut TaskStore,
    timer: &mut TimerEngine,
    id: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command pause");

    let id = store.resolve_id(id)?;
    timer.pause(store, id, now)?;
    if let Some(task) = store.find(id) {
        println!(
            "Таймер приостановлен: {} ({})",
            task.title,
            format_time_spent(task.time_spent)
        );
    }
    Ok(())
}

#[instrument(skip(store, timer, now))]
fn cmd_stop(
    store: &mut TaskStore,
    timer: &mut TimerEngine,
    id: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command stop");

    let id = store.resolve_id(id)?;
    timer.stop(store, id, now)?;
    if let Some(task) = store.find(id) {
        println!(
            "Таймер остановлен: {} ({})",
            task.title,
            format_time_spent(task.time_spent)
        );
    }
    Ok(())
}

#[instrument(skip(store, renderer))]
fn cmd_board(store: &TaskStore, renderer: &mut Renderer) -> anyhow::Result<()> {
    info!("command board");

    let view = board::group_by_status(store.list());
    renderer.print_board(&view)
}

#[instrument(skip(store))]
fn cmd_move(store: &mut TaskStore, id: &str, status: crate::task::Status) -> anyhow::Result<()> {
    info!("command move");

    let id = store.resolve_id(id)?;
    board::move_task(store, id, status)?;
    println!("Статус задачи изменен на \"{}\"", status.label());
    Ok(())
}

#[instrument(skip(store, renderer))]
fn cmd_week(
    store: &TaskStore,
    renderer: &mut Renderer,
    today: NaiveDate,
    offset: i64,
) -> anyhow::Result<()> {
    info!("command week");

    let mut view = CalendarView::new(today);
    view.change_week(offset);

    let days: Vec<(NaiveDate, Vec<String>)> = view
        .week()
        .iter()
        .map(|day| {
            let titles = calendar::tasks_on_date(store.list(), *day)
                .iter()
                .map(|t| t.title.clone())
                .collect();
            (*day, titles)
        })
        .collect();

    renderer.print_week(&days)
}

#[instrument(skip(store, renderer))]
fn cmd_month(
    store: &TaskStore,
    renderer: &mut Renderer,
    today: NaiveDate,
    offset: i32,
) -> anyhow::Result<()> {
    info!("command month");

    let mut view = CalendarView::new(today);
    view.change_month(offset);

    let grid = view.month_grid();
    let counts: Vec<usize> = grid
        .cells
        .iter()
        .map(|cell| calendar::tasks_on_date(store.list(), cell.date).len())
        .collect();

    renderer.print_month(&grid, &counts)
}
