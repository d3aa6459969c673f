use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::OkrError;
use super::models::{CheckinFields, CheckinStatus, Confidence, NewCheckin, OkrStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    SaveDraft,
    Submit,
    Review,
}

impl Transition {
    pub fn owner_write(as_draft: bool) -> Self {
        if as_draft {
            Self::SaveDraft
        } else {
            Self::Submit
        }
    }
}

/// Transition table keyed on the objective's current status (the latest
/// check-in's status). Owner writes always append a new row; only a review
/// mutates an existing row.
pub fn next_status(current: OkrStatus, transition: Transition) -> Result<CheckinStatus, OkrError> {
    use OkrStatus as S;
    use Transition as T;

    match (current, transition) {
        (S::NotChecked | S::Draft | S::Checked, T::SaveDraft) => Ok(CheckinStatus::Draft),
        (S::NotChecked | S::Draft | S::Checked, T::Submit) => Ok(CheckinStatus::Waiting),
        (S::Waiting, T::SaveDraft) => Err(OkrError::InvalidState(
            "a check-in is waiting for review and cannot go back to draft".to_string(),
        )),
        (S::Waiting, T::Submit) => Err(OkrError::Conflict(
            "a check-in is already waiting for review".to_string(),
        )),
        (S::Waiting, T::Review) => Ok(CheckinStatus::Checked),
        (S::NotChecked, T::Review) => Err(OkrError::InvalidState(
            "objective has no check-in to review".to_string(),
        )),
        (S::Draft | S::Checked, T::Review) => Err(OkrError::InvalidState(format!(
            "cannot review a check-in that is {}",
            if current == S::Draft { "draft" } else { "checked" }
        ))),
    }
}

/// `round(achieved / target * 100)` clamped to 0..=100; zero, absent or
/// non-finite targets yield 0.
pub fn percent_of_target(achieved: f64, target: Option<f64>) -> i32 {
    match target {
        Some(t) if t != 0.0 && t.is_finite() && achieved.is_finite() => {
            let pct = (achieved / t * 100.0).round();
            pct.clamp(0.0, 100.0) as i32
        }
        _ => 0,
    }
}

pub fn resolve_percent(fields: &CheckinFields) -> Result<i32, OkrError> {
    if !fields.achieved_value.is_finite() {
        return Err(OkrError::Validation(
            "achieved value must be a finite number".to_string(),
        ));
    }
    if fields.target_value.is_some_and(|t| !t.is_finite()) {
        return Err(OkrError::Validation(
            "target value must be a finite number".to_string(),
        ));
    }
    match fields.percent {
        Some(p) if (0..=100).contains(&p) => Ok(p),
        Some(p) => Err(OkrError::Validation(format!(
            "percent must be between 0 and 100, got {p}"
        ))),
        None => Ok(percent_of_target(fields.achieved_value, fields.target_value)),
    }
}

pub fn build_checkin(
    objective_id: Uuid,
    user_id: Uuid,
    fields: CheckinFields,
    status: CheckinStatus,
    now: DateTime<Utc>,
) -> Result<NewCheckin, OkrError> {
    let percent = resolve_percent(&fields)?;
    Ok(NewCheckin {
        id: Uuid::new_v4(),
        objective_id,
        user_id,
        checkin_date: fields.checkin_date.unwrap_or_else(|| now.date_naive()),
        achieved_value: fields.achieved_value,
        target_value: fields.target_value,
        percent,
        confidence: fields.confidence.unwrap_or(Confidence::Stable),
        blockers: non_blank(fields.blockers),
        next_steps: non_blank(fields.next_steps),
        summary: non_blank(fields.summary),
        status,
        created_at: now,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
