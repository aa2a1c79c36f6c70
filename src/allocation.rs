//! Placement of new tasks between the today list and the backlog, and the
//! time totals measured against the daily limit.
//!
//! Nothing in here touches storage. Callers read the current state, ask the
//! engine what to do, then persist the result.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::PlanResult;
use crate::model::{validate_duration, ListType, NewTask, Task, TaskUpdate};

/// Remaining minutes at or under which the day is considered critical.
pub const CRITICAL_REMAINING: u64 = 30;

/// Remaining minutes at or under which the day is considered tight.
pub const TIGHT_REMAINING: u64 = 60;

lazy_static! {
    /// End of a dictated sentence: `.`, `!` or `?` followed by whitespace.
    static ref SENTENCE_END: Regex = Regex::new(r"[.!?]\s+").unwrap();
}

/// Split manually typed text into titles, one per line. Lines are trimmed
/// and blank ones are dropped.
pub fn split_lines(text: &str) -> Vec<String> {
    clean(text.lines())
}

/// Split a speech transcript into titles, one per sentence. A sentence ends
/// at `.`, `!` or `?` followed by whitespace, so the last sentence keeps its
/// terminal punctuation.
pub fn split_sentences(text: &str) -> Vec<String> {
    clean(SENTENCE_END.split(text.trim()))
}

fn clean<'a, I: Iterator<Item = &'a str>>(pieces: I) -> Vec<String> {
    pieces
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(String::from)
        .collect()
}

/// Decide where a task of `duration` minutes goes when `today_total`
/// minutes are already planned for today.
pub fn place(today_total: u64, duration: u32, daily_limit: u32) -> ListType {
    if today_total + u64::from(duration) <= u64::from(daily_limit) {
        ListType::Today
    } else {
        ListType::Backlog
    }
}

/// Build one task per non blank title, in input order. Each title is
/// placed against the running today total, which grows only when a title
/// lands in today. The split is greedy: nothing is reordered to fit.
pub fn batch_add<S: AsRef<str>>(
    titles: &[S],
    owner_id: &str,
    current_today_total: u64,
    daily_limit: u32,
    duration: u32,
) -> PlanResult<Vec<NewTask>> {
    let (planned, _) = non_blank(titles).try_fold(
        (Vec::new(), current_today_total),
        |(mut planned, today_total), title| -> PlanResult<_> {
            let list_type = place(today_total, duration, daily_limit);
            let today_total = match list_type {
                ListType::Today => today_total + u64::from(duration),
                ListType::Backlog => today_total,
            };
            planned.push(NewTask::new(
                title,
                i64::from(duration),
                list_type,
                owner_id,
            )?);
            Ok((planned, today_total))
        },
    )?;
    Ok(planned)
}

/// Build one task per non blank title, all in `list_type`. Used when the
/// caller picks the list explicitly, which skips the budget check.
pub fn batch_into<S: AsRef<str>>(
    titles: &[S],
    owner_id: &str,
    list_type: ListType,
    duration: u32,
) -> PlanResult<Vec<NewTask>> {
    non_blank(titles)
        .map(|title| NewTask::new(title, i64::from(duration), list_type, owner_id))
        .collect()
}

fn non_blank<S: AsRef<str>>(titles: &[S]) -> impl Iterator<Item = &str> {
    titles
        .iter()
        .map(|title| title.as_ref().trim())
        .filter(|title| !title.is_empty())
}

/// Reassign a task to another list. The daily limit is not checked again,
/// so moving into today may push the total over it.
pub fn move_task(target: ListType) -> TaskUpdate {
    TaskUpdate::list(target)
}

/// Change the duration of a task, keeping it in whatever list it is in.
pub fn retime(minutes: i64) -> PlanResult<TaskUpdate> {
    Ok(TaskUpdate::time(validate_duration(minutes)?))
}

/// How busy the today list is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pressure {
    Comfortable,
    Tight,
    Critical,
}

/// Time totals for one owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// Sum of the today tasks. May exceed the limit after manual moves.
    pub total_time: u64,
    /// What is left of the limit, never below zero.
    pub remaining_time: u64,
    pub daily_limit: u32,
}

impl Totals {
    pub fn percent_used(&self) -> u8 {
        let limit = u64::from(self.daily_limit.max(1));
        let percent = (self.total_time * 100 + limit / 2) / limit;
        percent.min(100) as u8
    }

    pub fn pressure(&self) -> Pressure {
        if self.remaining_time <= CRITICAL_REMAINING {
            Pressure::Critical
        } else if self.remaining_time <= TIGHT_REMAINING {
            Pressure::Tight
        } else {
            Pressure::Comfortable
        }
    }
}

pub fn compute_totals(tasks: &[Task], daily_limit: u32) -> Totals {
    let total_time: u64 = tasks
        .iter()
        .filter(|task| task.is_today())
        .map(|task| u64::from(task.time))
        .sum();
    Totals {
        total_time,
        remaining_time: u64::from(daily_limit).saturating_sub(total_time),
        daily_limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanError;
    use crate::model::DEFAULT_TASK_MINUTES;
    use chrono::Utc;

    fn stored(new_tasks: Vec<NewTask>) -> Vec<Task> {
        new_tasks
            .into_iter()
            .enumerate()
            .map(|(i, t)| Task {
                id: i as i64 + 1,
                title: t.title,
                time: t.time,
                list_type: t.list_type,
                owner_id: t.owner_id,
                created_at: Utc::now(),
            })
            .collect()
    }

    fn lists(tasks: &[NewTask]) -> Vec<ListType> {
        tasks.iter().map(|t| t.list_type).collect()
    }

    #[test]
    fn test_split_lines_trims_and_drops_blanks() {
        let titles = split_lines("  buy milk \n\n   \ncall mom\r\n  ");
        assert_eq!(titles, vec!["buy milk", "call mom"]);
    }

    #[test]
    fn test_split_sentences() {
        let titles = split_sentences("Buy milk. Call mom!  Fix the sink? Walk the dog.");
        assert_eq!(
            titles,
            vec!["Buy milk", "Call mom", "Fix the sink", "Walk the dog."]
        );
    }

    #[test]
    fn test_split_sentences_blank_transcript() {
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn test_batch_within_budget_all_today() {
        let titles = ["a", "b", "c"];
        let planned = batch_add(&titles, "u", 100, 240, DEFAULT_TASK_MINUTES).unwrap();
        assert_eq!(planned.len(), 3);
        assert!(planned.iter().all(|t| t.list_type == ListType::Today));
        assert!(planned.iter().all(|t| t.time == DEFAULT_TASK_MINUTES));
    }

    #[test]
    fn test_batch_fills_limit_exactly() {
        let planned = batch_add(&["A", "B", "C", "D"], "u", 0, 60, 15).unwrap();
        assert_eq!(lists(&planned), vec![ListType::Today; 4]);

        let totals = compute_totals(&stored(planned), 60);
        assert_eq!(totals.total_time, 60);
        assert_eq!(totals.remaining_time, 0);
    }

    #[test]
    fn test_batch_overflow_goes_to_backlog() {
        let planned = batch_add(&["A", "B", "C", "D", "E"], "u", 0, 60, 15).unwrap();
        assert_eq!(
            lists(&planned),
            vec![
                ListType::Today,
                ListType::Today,
                ListType::Today,
                ListType::Today,
                ListType::Backlog
            ]
        );
    }

    #[test]
    fn test_batch_split_is_monotonic() {
        let titles: Vec<String> = (0..20).map(|i| format!("task {}", i)).collect();
        for current in &[0u64, 10, 55, 100, 240, 300] {
            let planned = batch_add(&titles, "u", *current, 120, 15).unwrap();
            let first_backlog = planned
                .iter()
                .position(|t| t.list_type == ListType::Backlog)
                .unwrap_or(planned.len());
            assert!(planned[..first_backlog]
                .iter()
                .all(|t| t.list_type == ListType::Today));
            assert!(planned[first_backlog..]
                .iter()
                .all(|t| t.list_type == ListType::Backlog));
        }
    }

    #[test]
    fn test_batch_uses_running_total_not_snapshot() {
        // With the starting snapshot every title would fit; the running total must not.
        let planned = batch_add(&["a", "b", "c"], "u", 200, 240, 15).unwrap();
        assert_eq!(
            lists(&planned),
            vec![ListType::Today, ListType::Today, ListType::Backlog]
        );
    }

    #[test]
    fn test_batch_keeps_order_and_trims() {
        let planned = batch_add(&["  first ", "", "   ", "second"], "owner", 0, 240, 15).unwrap();
        let titles: Vec<&str> = planned.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
        assert!(planned.iter().all(|t| t.owner_id == "owner"));
    }

    #[test]
    fn test_batch_of_blanks_is_empty() {
        let planned = batch_add(&["", "  ", "\t"], "u", 0, 240, 15).unwrap();
        assert!(planned.is_empty());
    }

    #[test]
    fn test_batch_already_over_limit() {
        let planned = batch_add(&["a", "b"], "u", 500, 240, 15).unwrap();
        assert_eq!(lists(&planned), vec![ListType::Backlog; 2]);
    }

    #[test]
    fn test_batch_into_skips_budget() {
        let planned = batch_into(&["a", " ", "b"], "u", ListType::Today, 500).unwrap();
        assert_eq!(lists(&planned), vec![ListType::Today; 2]);
        assert!(planned.iter().all(|t| t.time == 500));
    }

    #[test]
    fn test_batch_rejects_zero_duration() {
        let err = batch_add(&["a", "b"], "u", 0, 240, 0).unwrap_err();
        assert!(matches!(err, PlanError::NonPositiveDuration(0)));
        assert!(batch_into(&["a"], "u", ListType::Backlog, 0)
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_batch_of_blanks_with_zero_duration_is_empty() {
        assert!(batch_add(&[" ", ""], "u", 0, 240, 0).unwrap().is_empty());
    }

    #[test]
    fn test_move_preserves_duration() {
        let task = stored(batch_add(&["a"], "u", 0, 60, 40).unwrap()).remove(0);
        let mut moved = task.clone();
        move_task(ListType::Backlog).apply_to(&mut moved);
        assert_eq!(moved.list_type, ListType::Backlog);
        assert_eq!(moved.time, 40);

        move_task(ListType::Today).apply_to(&mut moved);
        assert_eq!(moved, task);
    }

    #[test]
    fn test_move_into_today_ignores_limit() {
        let mut tasks = stored(batch_add(&["a", "b", "c", "d", "e"], "u", 0, 60, 15).unwrap());
        assert_eq!(tasks[4].list_type, ListType::Backlog);
        move_task(ListType::Today).apply_to(&mut tasks[4]);

        let totals = compute_totals(&tasks, 60);
        assert_eq!(totals.total_time, 75);
        assert_eq!(totals.remaining_time, 0);
    }

    #[test]
    fn test_retime_over_limit_clamps_remaining() {
        let mut task = stored(batch_add(&["a"], "u", 0, 60, 15).unwrap()).remove(0);
        retime(90).unwrap().apply_to(&mut task);
        assert_eq!(task.list_type, ListType::Today);

        let totals = compute_totals(&[task], 60);
        assert_eq!(totals.total_time, 90);
        assert_eq!(totals.remaining_time, 0);
    }

    #[test]
    fn test_retime_rejects_non_positive() {
        assert!(retime(0).unwrap_err().is_validation());
        assert!(retime(-10).unwrap_err().is_validation());
        assert_eq!(retime(5).unwrap(), TaskUpdate::time(5));
    }

    #[test]
    fn test_totals_ignore_backlog() {
        let mut tasks = stored(batch_add(&["a", "b"], "u", 0, 240, 30).unwrap());
        tasks[1].list_type = ListType::Backlog;
        let totals = compute_totals(&tasks, 240);
        assert_eq!(totals.total_time, 30);
        assert_eq!(totals.remaining_time, 210);
    }

    #[test]
    fn test_totals_empty() {
        let totals = compute_totals(&[], 240);
        assert_eq!(totals.total_time, 0);
        assert_eq!(totals.remaining_time, 240);
        assert_eq!(totals.percent_used(), 0);
        assert_eq!(totals.pressure(), Pressure::Comfortable);
    }

    #[test]
    fn test_percent_and_pressure() {
        let totals = Totals {
            total_time: 200,
            remaining_time: 40,
            daily_limit: 240,
        };
        assert_eq!(totals.percent_used(), 83);
        assert_eq!(totals.pressure(), Pressure::Tight);

        let over = Totals {
            total_time: 300,
            remaining_time: 0,
            daily_limit: 240,
        };
        assert_eq!(over.percent_used(), 100);
        assert_eq!(over.pressure(), Pressure::Critical);
    }
}
