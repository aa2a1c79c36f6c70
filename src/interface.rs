use std::time::Duration as STDDuration;

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use humantime::format_duration;
use prettytable::Table;

use crate::allocation::{Pressure, Totals};
use crate::model::{ListType, Task, TaskId};
use crate::planner::{AddOptions, Overview, Planner};
use crate::store::Backend;

const TITLE_WIDTH: usize = 50;

pub fn add<B: Backend>(
    planner: &mut Planner<B>,
    owner_id: &str,
    titles: &[String],
    options: AddOptions,
) -> Result<()> {
    let outcome = planner
        .add_tasks(owner_id, titles, options)
        .context("Failed to add tasks.")?;

    if outcome.created.is_empty() && outcome.failed.is_empty() {
        println!("Nothing to add.");
        return Ok(());
    }

    for task in &outcome.created {
        println!(
            "{}. {} ({}) -> {}",
            task.id,
            task.title,
            fmt_minutes(u64::from(task.time)),
            task.list_type
        );
    }
    for (title, err) in &outcome.failed {
        eprintln!("Could not save '{}': {}", title, err);
    }

    print_status(&planner.overview(owner_id)?.totals);

    if !outcome.failed.is_empty() {
        return Err(anyhow!(
            "{} of {} task(s) could not be saved.",
            outcome.failed.len(),
            outcome.failed.len() + outcome.created.len()
        ));
    }
    Ok(())
}

pub fn list<B: Backend>(planner: &mut Planner<B>, owner_id: &str, json: bool) -> Result<()> {
    let overview = planner
        .overview(owner_id)
        .context("Failed to read tasks.")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&overview)?);
        return Ok(());
    }

    print_list(&overview, ListType::Today);
    print_list(&overview, ListType::Backlog);
    print_status(&overview.totals);
    Ok(())
}

pub fn retime<B: Backend>(
    planner: &mut Planner<B>,
    owner_id: &str,
    id: TaskId,
    minutes: i64,
) -> Result<()> {
    let task = planner
        .retime_task(id, minutes)
        .with_context(|| format!("Failed to change the time of task {}.", id))?;
    println!("{}. {} now takes {}.", task.id, task.title, fmt_minutes(u64::from(task.time)));
    print_status(&planner.overview(owner_id)?.totals);
    Ok(())
}

pub fn move_task<B: Backend>(
    planner: &mut Planner<B>,
    owner_id: &str,
    id: TaskId,
    target: ListType,
) -> Result<()> {
    let task = planner
        .move_task(id, target)
        .with_context(|| format!("Failed to move task {}.", id))?;
    println!("{}. {} moved to {}.", task.id, task.title, task.list_type);
    print_status(&planner.overview(owner_id)?.totals);
    Ok(())
}

pub fn remove_task<B: Backend>(planner: &mut Planner<B>, id: TaskId) -> Result<()> {
    planner
        .delete_task(id)
        .with_context(|| format!("Failed to remove task {}.", id))?;
    println!("Removed task {}.", id);
    Ok(())
}

pub fn clear<B: Backend>(planner: &mut Planner<B>, owner_id: &str) -> Result<()> {
    let removed = planner
        .clear_all(owner_id)
        .context("Failed to clear tasks.")?;
    println!("Removed {} task(s).", removed);
    Ok(())
}

pub fn limit<B: Backend>(
    planner: &mut Planner<B>,
    owner_id: &str,
    minutes: Option<i64>,
    json: bool,
) -> Result<()> {
    let settings = match minutes {
        Some(minutes) => planner
            .set_daily_limit(owner_id, minutes)
            .context("Failed to change the daily limit.")?,
        None => planner
            .settings(owner_id)
            .context("Failed to read settings.")?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
    } else {
        println!(
            "Daily limit: {}",
            fmt_minutes(u64::from(settings.daily_limit_minutes))
        );
    }
    Ok(())
}

fn print_list(overview: &Overview, list_type: ListType) {
    let tasks = overview.list(list_type);
    if tasks.is_empty() {
        println!("No tasks in {}.", list_type);
        return;
    }

    let mut table = Table::new();
    table.add_row(row![list_type.as_str(), "task", "time", "added"]);
    for task in tasks {
        let title = textwrap::fill(&task.title, TITLE_WIDTH);
        let time = fmt_minutes(u64::from(task.time));
        let added = fmt_created_at(task);
        table.add_row(row![task.id, title, time, added]);
    }
    table.printstd();
}

fn print_status(totals: &Totals) {
    println!(
        "Planned today: {} of {} ({}%). Remaining: {}.",
        fmt_minutes(totals.total_time),
        fmt_minutes(u64::from(totals.daily_limit)),
        totals.percent_used(),
        fmt_minutes(totals.remaining_time)
    );
    match totals.pressure() {
        Pressure::Critical if totals.total_time > u64::from(totals.daily_limit) => {
            println!("Today is over the limit, consider moving something to the backlog.")
        }
        Pressure::Critical => println!("Almost no time left today."),
        Pressure::Tight => println!("Time is getting tight."),
        Pressure::Comfortable => {}
    }
}

fn fmt_minutes(minutes: u64) -> String {
    if minutes == 0 {
        return "0m".to_string();
    }
    format_duration(STDDuration::from_secs(minutes * 60)).to_string()
}

fn fmt_created_at(task: &Task) -> String {
    task.created_at
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_minutes() {
        assert_eq!(fmt_minutes(0), "0m");
        assert_eq!(fmt_minutes(15), "15m");
        assert_eq!(fmt_minutes(90), "1h 30m");
        assert_eq!(fmt_minutes(240), "4h");
    }
}
