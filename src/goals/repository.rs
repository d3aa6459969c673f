use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use super::checkin::{next_status, Transition};
use super::error::OkrError;
use super::hierarchy::ensure_acyclic_parent;
use super::models::{
    Checkin, CheckinStatus, KeyResult, NewCheckin, Objective, OkrStatus, Review, User,
};

/// Storage boundary for the check-in workflow.
///
/// Every method is one atomic unit. The two guarded writes,
/// [`append_checkin`](OkrRepository::append_checkin) and
/// [`record_review`](OkrRepository::record_review), enforce the uniqueness
/// invariants at the point of write so concurrent callers cannot both win.
pub trait OkrRepository: Send + Sync {
    fn find_objective(&self, id: Uuid) -> Result<Option<Objective>, OkrError>;
    fn list_objectives(&self) -> Result<Vec<Objective>, OkrError>;
    fn list_children(&self, parent_id: Uuid) -> Result<Vec<Objective>, OkrError>;
    fn list_objectives_by_owner(&self, owner_id: Uuid) -> Result<Vec<Objective>, OkrError>;
    fn count_children(&self, parent_id: Uuid) -> Result<i64, OkrError>;
    fn insert_objective(&self, objective: &Objective) -> Result<(), OkrError>;
    /// Overwrites a stored objective. A changed `parent_id` is checked for
    /// existence and cycles (see [`ensure_acyclic_parent`]) in the same
    /// atomic unit as the write.
    fn update_objective(&self, objective: &Objective, max_depth: usize) -> Result<(), OkrError>;

    fn find_checkin(&self, id: Uuid) -> Result<Option<Checkin>, OkrError>;
    /// Check-ins of an objective, newest first by `(checkin_date, seq)`.
    fn list_checkins(&self, objective_id: Uuid, limit: Option<i64>)
        -> Result<Vec<Checkin>, OkrError>;
    /// Appends a row. While any `waiting` row exists for the objective,
    /// whatever its date, a draft is refused with `InvalidState` and another
    /// `waiting` row with `Conflict`.
    fn append_checkin(&self, checkin: NewCheckin) -> Result<Checkin, OkrError>;

    fn find_review(&self, checkin_id: Uuid) -> Result<Option<Review>, OkrError>;
    /// Flips the check-in from `waiting` to `checked` and stores the review.
    /// `Conflict` if a review already exists, `InvalidState` if the
    /// check-in is not `waiting`, `NotFound` if it does not exist.
    fn record_review(&self, review: &Review) -> Result<(), OkrError>;

    fn find_user(&self, id: Uuid) -> Result<Option<User>, OkrError>;

    fn insert_key_result(&self, key_result: &KeyResult) -> Result<(), OkrError>;
    fn list_key_results(&self, objective_id: Uuid) -> Result<Vec<KeyResult>, OkrError>;
    fn count_key_results(&self, objective_id: Uuid) -> Result<i64, OkrError>;
}

/// Owner-write guard applied by `append_checkin` under the store's lock.
pub(crate) fn guard_pending_review(
    incoming: CheckinStatus,
    has_waiting: bool,
) -> Result<(), OkrError> {
    if !has_waiting {
        return Ok(());
    }
    let transition = Transition::owner_write(incoming == CheckinStatus::Draft);
    next_status(OkrStatus::Waiting, transition).map(|_| ())
}

pub(crate) fn newest_first(checkins: &mut [Checkin]) {
    checkins.sort_by(|a, b| {
        b.checkin_date
            .cmp(&a.checkin_date)
            .then_with(|| b.seq.cmp(&a.seq))
    });
}

#[derive(Default)]
struct MemoryState {
    objectives: HashMap<Uuid, Objective>,
    checkins: HashMap<Uuid, Checkin>,
    reviews: HashMap<Uuid, Review>,
    users: HashMap<Uuid, User>,
    key_results: HashMap<Uuid, KeyResult>,
    next_seq: i64,
}

/// In-process store. A single mutex makes each call one atomic unit.
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, OkrError> {
        self.state
            .lock()
            .map_err(|_| OkrError::Database("memory store lock poisoned".to_string()))
    }

    pub fn upsert_user(&self, user: User) -> Result<(), OkrError> {
        self.lock()?.users.insert(user.id, user);
        Ok(())
    }
}

impl OkrRepository for MemoryRepository {
    fn find_objective(&self, id: Uuid) -> Result<Option<Objective>, OkrError> {
        Ok(self.lock()?.objectives.get(&id).cloned())
    }

    fn list_objectives(&self) -> Result<Vec<Objective>, OkrError> {
        let mut all: Vec<Objective> = self.lock()?.objectives.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    fn list_children(&self, parent_id: Uuid) -> Result<Vec<Objective>, OkrError> {
        Ok(self
            .list_objectives()?
            .into_iter()
            .filter(|o| o.parent_id == Some(parent_id))
            .collect())
    }

    fn list_objectives_by_owner(&self, owner_id: Uuid) -> Result<Vec<Objective>, OkrError> {
        Ok(self
            .list_objectives()?
            .into_iter()
            .filter(|o| o.owner_id == owner_id)
            .collect())
    }

    fn count_children(&self, parent_id: Uuid) -> Result<i64, OkrError> {
        let state = self.lock()?;
        Ok(state
            .objectives
            .values()
            .filter(|o| o.parent_id == Some(parent_id))
            .count() as i64)
    }

    fn insert_objective(&self, objective: &Objective) -> Result<(), OkrError> {
        let mut state = self.lock()?;
        if state.objectives.contains_key(&objective.id) {
            return Err(OkrError::Conflict(format!(
                "Objective {} already exists",
                objective.id
            )));
        }
        state.objectives.insert(objective.id, objective.clone());
        Ok(())
    }

    fn update_objective(&self, objective: &Objective, max_depth: usize) -> Result<(), OkrError> {
        let mut state = self.lock()?;
        let stored_parent = state
            .objectives
            .get(&objective.id)
            .ok_or_else(|| OkrError::NotFound("Objective not found".to_string()))?
            .parent_id;
        if let Some(parent_id) = objective.parent_id {
            if stored_parent != Some(parent_id) {
                ensure_acyclic_parent(objective.id, parent_id, max_depth, |id| {
                    Ok(state.objectives.get(&id).map(|o| o.parent_id))
                })?;
            }
        }
        state.objectives.insert(objective.id, objective.clone());
        Ok(())
    }

    fn find_checkin(&self, id: Uuid) -> Result<Option<Checkin>, OkrError> {
        Ok(self.lock()?.checkins.get(&id).cloned())
    }

    fn list_checkins(
        &self,
        objective_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<Checkin>, OkrError> {
        let mut rows: Vec<Checkin> = self
            .lock()?
            .checkins
            .values()
            .filter(|c| c.objective_id == objective_id)
            .cloned()
            .collect();
        newest_first(&mut rows);
        if let Some(limit) = limit {
            rows.truncate(limit.max(0) as usize);
        }
        Ok(rows)
    }

    fn append_checkin(&self, checkin: NewCheckin) -> Result<Checkin, OkrError> {
        let mut state = self.lock()?;
        if !state.objectives.contains_key(&checkin.objective_id) {
            return Err(OkrError::NotFound(format!(
                "Objective {} not found",
                checkin.objective_id
            )));
        }
        let has_waiting = state.checkins.values().any(|c| {
            c.objective_id == checkin.objective_id && c.status == CheckinStatus::Waiting
        });
        guard_pending_review(checkin.status, has_waiting)?;
        state.next_seq += 1;
        let row = checkin.into_checkin(state.next_seq);
        state.checkins.insert(row.id, row.clone());
        Ok(row)
    }

    fn find_review(&self, checkin_id: Uuid) -> Result<Option<Review>, OkrError> {
        Ok(self
            .lock()?
            .reviews
            .values()
            .find(|r| r.checkin_id == checkin_id)
            .cloned())
    }

    fn record_review(&self, review: &Review) -> Result<(), OkrError> {
        let mut state = self.lock()?;
        if state.reviews.values().any(|r| r.checkin_id == review.checkin_id) {
            return Err(OkrError::Conflict(
                "Check-in has already been reviewed".to_string(),
            ));
        }
        let checkin = state
            .checkins
            .get_mut(&review.checkin_id)
            .ok_or_else(|| OkrError::NotFound("Check-in not found".to_string()))?;
        if checkin.status != CheckinStatus::Waiting {
            return Err(OkrError::InvalidState(format!(
                "Check-in is {}, only waiting check-ins can be reviewed",
                checkin.status.to_str()
            )));
        }
        checkin.status = CheckinStatus::Checked;
        state.reviews.insert(review.id, review.clone());
        Ok(())
    }

    fn find_user(&self, id: Uuid) -> Result<Option<User>, OkrError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    fn insert_key_result(&self, key_result: &KeyResult) -> Result<(), OkrError> {
        self.lock()?
            .key_results
            .insert(key_result.id, key_result.clone());
        Ok(())
    }

    fn list_key_results(&self, objective_id: Uuid) -> Result<Vec<KeyResult>, OkrError> {
        let mut rows: Vec<KeyResult> = self
            .lock()?
            .key_results
            .values()
            .filter(|k| k.objective_id == objective_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    fn count_key_results(&self, objective_id: Uuid) -> Result<i64, OkrError> {
        Ok(self
            .lock()?
            .key_results
            .values()
            .filter(|k| k.objective_id == objective_id)
            .count() as i64)
    }
}
