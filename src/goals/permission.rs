use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::OkrError;
use super::models::{CheckinStatus, Objective};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    EditObjective,
    SubmitCheckin,
    SaveDraft,
    ReviewCheckin,
}

impl Action {
    fn to_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::EditObjective => "edit_objective",
            Self::SubmitCheckin => "submit_checkin",
            Self::SaveDraft => "save_draft",
            Self::ReviewCheckin => "review_checkin",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    NotOwner,
    NotSuperior,
    /// The owner has no superior, so nobody can ever review.
    NoSuperior,
    CheckinNotWaiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Facts about the target that the decision depends on. The caller
/// derives them from fresh reads of the objective, never from ids the
/// client supplied.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessContext {
    pub owner_superior: Option<Uuid>,
    pub checkin_status: Option<CheckinStatus>,
}

pub fn can(
    caller_id: Uuid,
    objective: &Objective,
    action: Action,
    ctx: &AccessContext,
) -> Decision {
    match action {
        Action::View => Decision::Allow,
        Action::EditObjective | Action::SubmitCheckin | Action::SaveDraft => {
            if caller_id == objective.owner_id {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::NotOwner)
            }
        }
        Action::ReviewCheckin => match ctx.owner_superior {
            None => Decision::Deny(DenyReason::NoSuperior),
            Some(superior) if superior != caller_id => Decision::Deny(DenyReason::NotSuperior),
            Some(_) => match ctx.checkin_status {
                Some(CheckinStatus::Waiting) => Decision::Allow,
                _ => Decision::Deny(DenyReason::CheckinNotWaiting),
            },
        },
    }
}

/// Turns a denial into the caller-visible error kind.
pub fn enforce(
    caller_id: Uuid,
    objective: &Objective,
    action: Action,
    ctx: &AccessContext,
) -> Result<(), OkrError> {
    match can(caller_id, objective, action, ctx) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => {
            log::warn!(
                "Denied {} on objective {} for user {caller_id}: {reason:?}",
                action.to_str(),
                objective.id
            );
            Err(match reason {
                DenyReason::NotOwner => OkrError::Forbidden(format!(
                    "only the owner of objective {} may {}",
                    objective.id,
                    action.to_str()
                )),
                DenyReason::NotSuperior => OkrError::Forbidden(
                    "only the owner's superior may review this check-in".to_string(),
                ),
                DenyReason::NoSuperior => OkrError::Forbidden(
                    "the objective owner has no superior; check-ins cannot be reviewed".to_string(),
                ),
                DenyReason::CheckinNotWaiting => OkrError::InvalidState(
                    "only waiting check-ins can be reviewed".to_string(),
                ),
            })
        }
    }
}
