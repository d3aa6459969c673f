use serde::{Deserialize, Serialize};

use super::models::{Checkin, CheckinStatus, ObjectiveType, OkrStatus};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Progress {
    pub current_progress: i32,
    pub previous_progress: Option<i32>,
    pub change: Option<i32>,
}

impl Progress {
    /// `change` with an explicit sign, blank when undefined.
    pub fn change_label(&self) -> String {
        format_change(self.change)
    }
}

pub fn format_change(change: Option<i32>) -> String {
    match change {
        Some(c) if c < 0 => format!("{c}"),
        Some(c) => format!("+{c}"),
        None => String::new(),
    }
}

/// `history` must be newest first. The objective's status is the latest
/// row's status whatever it is.
pub fn status_label(history: &[Checkin]) -> OkrStatus {
    history
        .first()
        .map(|latest| latest.status.into())
        .unwrap_or(OkrStatus::NotChecked)
}

/// Rows that count towards progress: every non-draft row, plus the latest
/// row when it is a draft. Drafts superseded by a later row are
/// intermediate saves.
fn timeline(history: &[Checkin]) -> impl Iterator<Item = &Checkin> {
    history
        .iter()
        .enumerate()
        .filter(|(i, c)| *i == 0 || c.status != CheckinStatus::Draft)
        .map(|(_, c)| c)
}

/// `history` must be newest first.
pub fn compute_progress(history: &[Checkin]) -> Progress {
    let mut rows = timeline(history);
    let Some(latest) = rows.next() else {
        return Progress::default();
    };
    let current = latest.percent;
    let previous = rows.next().map(|c| c.percent);
    let change = Some(match previous {
        Some(prev) => current - prev,
        None => current,
    });

    Progress {
        current_progress: current,
        previous_progress: previous,
        change,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypeSummary {
    pub objective_type: ObjectiveType,
    pub count: usize,
    pub avg_progress: i32,
}

/// One entry per objective type, in a fixed order, including empty groups.
pub fn summarize_by_type<I>(items: I) -> Vec<TypeSummary>
where
    I: IntoIterator<Item = (ObjectiveType, i32)>,
{
    let mut sums = [(0usize, 0i64); 3];
    for (objective_type, progress) in items {
        let slot = &mut sums[type_slot(objective_type)];
        slot.0 += 1;
        slot.1 += i64::from(progress);
    }

    ObjectiveType::ALL
        .iter()
        .map(|t| {
            let (count, total) = sums[type_slot(*t)];
            let avg_progress = if count == 0 {
                0
            } else {
                (total as f64 / count as f64).round() as i32
            };
            TypeSummary {
                objective_type: *t,
                count,
                avg_progress,
            }
        })
        .collect()
}

fn type_slot(objective_type: ObjectiveType) -> usize {
    match objective_type {
        ObjectiveType::Company => 0,
        ObjectiveType::Team => 1,
        ObjectiveType::Individual => 2,
    }
}
