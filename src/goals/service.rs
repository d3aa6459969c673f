use std::sync::Arc;

use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::checkin::build_checkin;
use super::error::OkrError;
use super::hierarchy::{HierarchyResolver, ObjectiveForest, DEFAULT_MAX_DEPTH};
use super::models::{
    Checkin, CheckinFields, CheckinStatus, KeyResult, KeyResultFields, Objective,
    ObjectiveFields, ObjectiveFilter, OkrStatus, Principal, Review, ReviewComments, Visibility,
};
use super::permission::{enforce, AccessContext, Action};
use super::progress::{compute_progress, status_label, summarize_by_type, Progress, TypeSummary};
use super::repository::OkrRepository;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveView {
    #[serde(flatten)]
    pub objective: Objective,
    pub status: OkrStatus,
    pub current_progress: i32,
    pub previous_progress: Option<i32>,
    pub change: String,
    pub has_children: bool,
    pub expanded: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ObjectiveView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveDetail {
    #[serde(flatten)]
    pub objective: Objective,
    pub status: OkrStatus,
    pub progress: i32,
    pub change: String,
    pub key_result_count: i64,
    pub has_children: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinView {
    #[serde(flatten)]
    pub checkin: Checkin,
    pub confidence_label: String,
}

/// Entry point for every check-in workflow operation. Callers pass the
/// authenticated principal explicitly; nothing is read from ambient state.
#[derive(Clone)]
pub struct OkrService {
    repo: Arc<dyn OkrRepository>,
    max_depth: usize,
}

impl OkrService {
    pub fn new(repo: Arc<dyn OkrRepository>) -> Self {
        Self::with_max_depth(repo, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(repo: Arc<dyn OkrRepository>, max_depth: usize) -> Self {
        Self { repo, max_depth }
    }

    fn hierarchy(&self) -> HierarchyResolver<'_> {
        HierarchyResolver::new(self.repo.as_ref(), self.max_depth)
    }

    fn load_objective(&self, id: Uuid) -> Result<Objective, OkrError> {
        self.repo
            .find_objective(id)?
            .ok_or_else(|| OkrError::NotFound(format!("Objective {id} not found")))
    }

    fn load_checkin(&self, id: Uuid) -> Result<Checkin, OkrError> {
        self.repo
            .find_checkin(id)?
            .ok_or_else(|| OkrError::NotFound(format!("Check-in {id} not found")))
    }

    fn progress_of(&self, objective_id: Uuid) -> Result<(OkrStatus, Progress), OkrError> {
        let history = self.repo.list_checkins(objective_id, None)?;
        Ok((status_label(&history), compute_progress(&history)))
    }

    fn view(&self, objective: Objective, has_children: bool) -> Result<ObjectiveView, OkrError> {
        let (status, progress) = self.progress_of(objective.id)?;
        Ok(ObjectiveView {
            objective,
            status,
            current_progress: progress.current_progress,
            previous_progress: progress.previous_progress,
            change: progress.change_label(),
            has_children,
            expanded: false,
            children: Vec::new(),
        })
    }

    pub fn create_or_update_objective(
        &self,
        principal: &Principal,
        fields: ObjectiveFields,
    ) -> Result<Objective, OkrError> {
        let text = fields.objective.trim().to_string();
        if text.is_empty() {
            return Err(OkrError::Validation("objective text is required".to_string()));
        }
        let cycle = fields.cycle.trim().to_string();
        if cycle.is_empty() {
            return Err(OkrError::Validation("cycle is required".to_string()));
        }
        let now = Utc::now();

        match fields.id {
            Some(id) => {
                let mut existing = self.load_objective(id)?;
                enforce(
                    principal.user_id,
                    &existing,
                    Action::EditObjective,
                    &AccessContext::default(),
                )?;
                existing.objective = text;
                existing.objective_type = fields.objective_type;
                existing.cycle = cycle;
                if let Some(visibility) = fields.visibility {
                    existing.visibility = visibility;
                }
                existing.department_id = fields.department_id;
                existing.parent_id = fields.parent_id;
                existing.updated_at = now;

                self.repo.update_objective(&existing, self.max_depth)?;
                info!("Updated objective: {} ({})", existing.objective, existing.id);
                Ok(existing)
            }
            None => {
                let objective = Objective {
                    id: Uuid::new_v4(),
                    objective: text,
                    objective_type: fields.objective_type,
                    cycle,
                    visibility: fields.visibility.unwrap_or(Visibility::Public),
                    owner_id: principal.user_id,
                    department_id: fields.department_id,
                    parent_id: fields.parent_id,
                    created_at: now,
                    updated_at: now,
                };
                if let Some(parent_id) = objective.parent_id {
                    self.hierarchy().validate_parent(objective.id, parent_id)?;
                }
                self.repo.insert_objective(&objective)?;
                info!("Created objective: {} ({})", objective.objective, objective.id);
                Ok(objective)
            }
        }
    }

    /// Root objectives. With a filter, a root is listed when it or any
    /// descendant matches, and roots surfaced only through a descendant
    /// come back expanded down to the matches.
    pub fn list_objectives(
        &self,
        filter: &ObjectiveFilter,
    ) -> Result<Vec<ObjectiveView>, OkrError> {
        let forest = ObjectiveForest::new(self.repo.list_objectives()?, self.max_depth);
        forest.check_integrity()?;

        let mut out = Vec::new();
        for root in forest.roots() {
            if filter.is_empty() {
                out.push(self.view(root.clone(), forest.has_children(root.id))?);
            } else if let Some(view) = self.surface(&forest, root, filter)? {
                out.push(view);
            }
        }
        Ok(out)
    }

    fn surface(
        &self,
        forest: &ObjectiveForest,
        node: &Objective,
        filter: &ObjectiveFilter,
    ) -> Result<Option<ObjectiveView>, OkrError> {
        let mut matched_children = Vec::new();
        for child in forest.children(node.id) {
            if let Some(view) = self.surface(forest, child, filter)? {
                matched_children.push(view);
            }
        }
        if !filter.matches(node) && matched_children.is_empty() {
            return Ok(None);
        }
        let mut view = self.view(node.clone(), forest.has_children(node.id))?;
        view.expanded = !matched_children.is_empty();
        view.children = matched_children;
        Ok(Some(view))
    }

    pub fn summarize_objectives(
        &self,
        filter: &ObjectiveFilter,
    ) -> Result<Vec<TypeSummary>, OkrError> {
        let candidates = match filter.owner_id {
            Some(owner_id) => self.repo.list_objectives_by_owner(owner_id)?,
            None => self.repo.list_objectives()?,
        };
        let mut items = Vec::new();
        for objective in candidates {
            if filter.matches(&objective) {
                let (_, progress) = self.progress_of(objective.id)?;
                items.push((objective.objective_type, progress.current_progress));
            }
        }
        Ok(summarize_by_type(items))
    }

    pub fn get_objective(&self, id: Uuid) -> Result<ObjectiveDetail, OkrError> {
        let objective = self.load_objective(id)?;
        let (status, progress) = self.progress_of(id)?;
        let key_result_count = self.repo.count_key_results(id)?;
        let has_children = self.hierarchy().has_children(id)?;
        Ok(ObjectiveDetail {
            objective,
            status,
            progress: progress.current_progress,
            change: progress.change_label(),
            key_result_count,
            has_children,
        })
    }

    pub fn list_children(&self, parent_id: Uuid) -> Result<Vec<ObjectiveView>, OkrError> {
        self.load_objective(parent_id)?;
        let hierarchy = self.hierarchy();
        hierarchy
            .children_of(parent_id)?
            .into_iter()
            .map(|child| {
                let has_children = hierarchy.has_children(child.id)?;
                self.view(child, has_children)
            })
            .collect()
    }

    pub fn list_ancestors(&self, id: Uuid) -> Result<Vec<Objective>, OkrError> {
        self.hierarchy().ancestor_chain(id)
    }

    pub fn submit_checkin(
        &self,
        principal: &Principal,
        objective_id: Uuid,
        fields: CheckinFields,
        as_draft: bool,
    ) -> Result<Checkin, OkrError> {
        let objective = self.load_objective(objective_id)?;
        let action = if as_draft {
            Action::SaveDraft
        } else {
            Action::SubmitCheckin
        };
        enforce(principal.user_id, &objective, action, &AccessContext::default())?;

        // The store refuses the row while another check-in waits for review.
        let status = if as_draft {
            CheckinStatus::Draft
        } else {
            CheckinStatus::Waiting
        };
        let row = build_checkin(objective_id, principal.user_id, fields, status, Utc::now())?;
        let checkin = self.repo.append_checkin(row)?;

        info!(
            "Recorded {} check-in {} for objective {} ({}%)",
            checkin.status.to_str(),
            checkin.id,
            objective_id,
            checkin.percent
        );
        Ok(checkin)
    }

    pub fn list_checkin_history(&self, objective_id: Uuid) -> Result<Vec<Checkin>, OkrError> {
        self.load_objective(objective_id)?;
        self.repo.list_checkins(objective_id, None)
    }

    pub fn get_checkin(&self, id: Uuid) -> Result<CheckinView, OkrError> {
        let checkin = self.load_checkin(id)?;
        Ok(CheckinView {
            confidence_label: checkin.confidence.label().to_string(),
            checkin,
        })
    }

    pub fn create_review(
        &self,
        principal: &Principal,
        checkin_id: Uuid,
        objective_id: Uuid,
        comments: ReviewComments,
    ) -> Result<Review, OkrError> {
        let checkin = self.load_checkin(checkin_id)?;
        if checkin.objective_id != objective_id {
            return Err(OkrError::NotFound(format!(
                "Check-in {checkin_id} not found under objective {objective_id}"
            )));
        }
        // Ownership is re-derived from the stored objective on every call.
        let objective = self.load_objective(checkin.objective_id)?;

        if self.repo.find_review(checkin_id)?.is_some() {
            return Err(OkrError::Conflict(format!(
                "Check-in {checkin_id} has already been reviewed"
            )));
        }

        let ctx = AccessContext {
            owner_superior: self.hierarchy().superior_of(objective.owner_id)?,
            checkin_status: Some(checkin.status),
        };
        enforce(principal.user_id, &objective, Action::ReviewCheckin, &ctx)?;

        let review = Review {
            id: Uuid::new_v4(),
            checkin_id,
            objective_id: objective.id,
            reviewer_id: principal.user_id,
            personal_comment: non_blank(comments.personal_comment),
            team_comment: non_blank(comments.team_comment),
            summary_comment: non_blank(comments.summary_comment),
            created_at: Utc::now(),
        };
        if review.personal_comment.is_none()
            && review.team_comment.is_none()
            && review.summary_comment.is_none()
        {
            return Err(OkrError::Validation(
                "a review needs at least one comment".to_string(),
            ));
        }

        self.repo.record_review(&review)?;
        info!(
            "Check-in {} of objective {} reviewed by {}",
            checkin_id, objective.id, principal.user_id
        );
        Ok(review)
    }

    pub fn get_review(&self, checkin_id: Uuid) -> Result<Option<Review>, OkrError> {
        self.load_checkin(checkin_id)?;
        self.repo.find_review(checkin_id)
    }

    pub fn add_key_result(
        &self,
        principal: &Principal,
        objective_id: Uuid,
        fields: KeyResultFields,
    ) -> Result<KeyResult, OkrError> {
        let objective = self.load_objective(objective_id)?;
        enforce(
            principal.user_id,
            &objective,
            Action::EditObjective,
            &AccessContext::default(),
        )?;
        let title = fields.title.trim().to_string();
        if title.is_empty() {
            return Err(OkrError::Validation("key result title is required".to_string()));
        }
        if fields.target_value.is_some_and(|t| !t.is_finite()) {
            return Err(OkrError::Validation(
                "target value must be a finite number".to_string(),
            ));
        }

        let key_result = KeyResult {
            id: Uuid::new_v4(),
            objective_id,
            title,
            target_value: fields.target_value,
            unit: non_blank(fields.unit),
            created_at: Utc::now(),
        };
        self.repo.insert_key_result(&key_result)?;
        info!("Created key result: {} ({})", key_result.title, key_result.id);
        Ok(key_result)
    }

    pub fn list_key_results(&self, objective_id: Uuid) -> Result<Vec<KeyResult>, OkrError> {
        self.load_objective(objective_id)?;
        self.repo.list_key_results(objective_id)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goals::models::{NewCheckin, ObjectiveType, User};
    use crate::goals::repository::MemoryRepository;
    use crate::tests::test_util::{checkin_fields, objective_fields, Fixture};
    use crate::{assert_err, assert_ok};
    use chrono::NaiveDate;

    fn submit(
        fx: &Fixture,
        okr_id: Uuid,
        achieved: f64,
        as_draft: bool,
    ) -> Result<Checkin, OkrError> {
        fx.service
            .submit_checkin(&fx.as_owner(), okr_id, checkin_fields(achieved, 100.0), as_draft)
    }

    fn submit_on(
        fx: &Fixture,
        okr_id: Uuid,
        day: u32,
        achieved: f64,
        as_draft: bool,
    ) -> Result<Checkin, OkrError> {
        let mut fields = checkin_fields(achieved, 100.0);
        fields.checkin_date = NaiveDate::from_ymd_opt(2026, 10, day);
        fx.service
            .submit_checkin(&fx.as_owner(), okr_id, fields, as_draft)
    }

    fn review(fx: &Fixture, checkin: &Checkin) -> Result<Review, OkrError> {
        fx.service
            .create_review(&fx.as_superior(), checkin.id, checkin.objective_id, fx.comments())
    }

    #[test]
    fn test_status_tracks_latest_checkin() {
        let fx = Fixture::new();
        let okr = fx.objective(fx.owner, None);
        let status = |fx: &Fixture| fx.service.get_objective(okr.id).unwrap().status;
        assert_eq!(status(&fx), OkrStatus::NotChecked);

        assert_ok!(submit(&fx, okr.id, 10.0, true));
        assert_eq!(status(&fx), OkrStatus::Draft);

        assert_ok!(submit(&fx, okr.id, 30.0, false));
        let detail = fx.service.get_objective(okr.id).unwrap();
        assert_eq!(detail.status, OkrStatus::Waiting);
        assert_eq!(detail.progress, 30);
        assert_eq!(detail.change, "+30");
    }

    #[test]
    fn test_only_owner_writes_checkins() {
        let fx = Fixture::new();
        let okr = fx.objective(fx.owner, None);
        for as_draft in [true, false] {
            let err = assert_err!(fx.service.submit_checkin(
                &fx.as_superior(),
                okr.id,
                checkin_fields(1.0, 10.0),
                as_draft
            ));
            assert!(matches!(err, OkrError::Forbidden(_)));
        }
        assert!(fx.service.list_checkin_history(okr.id).unwrap().is_empty());
    }

    #[test]
    fn test_missing_objective_is_not_found_not_forbidden() {
        let fx = Fixture::new();
        let err = assert_err!(fx.service.submit_checkin(
            &fx.as_stranger(),
            Uuid::new_v4(),
            checkin_fields(1.0, 10.0),
            false
        ));
        assert!(matches!(err, OkrError::NotFound(_)));
    }

    #[test]
    fn test_waiting_blocks_new_owner_writes() {
        let fx = Fixture::new();
        let okr = fx.objective(fx.owner, None);
        assert_ok!(submit(&fx, okr.id, 10.0, false));

        let err = assert_err!(submit(&fx, okr.id, 20.0, true));
        assert!(matches!(err, OkrError::InvalidState(_)));
        let err = assert_err!(submit(&fx, okr.id, 20.0, false));
        assert!(matches!(err, OkrError::Conflict(_)));
    }

    #[test]
    fn test_backdated_waiting_checkin_still_blocks_drafts() {
        let fx = Fixture::new();
        let okr = fx.objective(fx.owner, None);
        let first = submit_on(&fx, okr.id, 10, 40.0, false).unwrap();
        assert_ok!(review(&fx, &first));

        let backdated = submit_on(&fx, okr.id, 1, 50.0, false).unwrap();
        assert_eq!(backdated.status, CheckinStatus::Waiting);

        let err = assert_err!(submit_on(&fx, okr.id, 20, 60.0, true));
        assert!(matches!(err, OkrError::InvalidState(_)));
        let err = assert_err!(submit_on(&fx, okr.id, 20, 60.0, false));
        assert!(matches!(err, OkrError::Conflict(_)));
        assert_eq!(fx.service.list_checkin_history(okr.id).unwrap().len(), 2);

        assert_ok!(review(&fx, &backdated));
        assert_ok!(submit_on(&fx, okr.id, 20, 60.0, true));
    }

    /// Lands a waiting row for the objective right before the wrapped
    /// append, as a concurrent submit would.
    struct InterleavedSubmit {
        inner: MemoryRepository,
    }

    impl OkrRepository for InterleavedSubmit {
        fn find_objective(&self, id: Uuid) -> Result<Option<Objective>, OkrError> {
            self.inner.find_objective(id)
        }
        fn list_objectives(&self) -> Result<Vec<Objective>, OkrError> {
            self.inner.list_objectives()
        }
        fn list_children(&self, parent_id: Uuid) -> Result<Vec<Objective>, OkrError> {
            self.inner.list_children(parent_id)
        }
        fn list_objectives_by_owner(&self, owner_id: Uuid) -> Result<Vec<Objective>, OkrError> {
            self.inner.list_objectives_by_owner(owner_id)
        }
        fn count_children(&self, parent_id: Uuid) -> Result<i64, OkrError> {
            self.inner.count_children(parent_id)
        }
        fn insert_objective(&self, objective: &Objective) -> Result<(), OkrError> {
            self.inner.insert_objective(objective)
        }
        fn update_objective(
            &self,
            objective: &Objective,
            max_depth: usize,
        ) -> Result<(), OkrError> {
            self.inner.update_objective(objective, max_depth)
        }
        fn find_checkin(&self, id: Uuid) -> Result<Option<Checkin>, OkrError> {
            self.inner.find_checkin(id)
        }
        fn list_checkins(
            &self,
            objective_id: Uuid,
            limit: Option<i64>,
        ) -> Result<Vec<Checkin>, OkrError> {
            self.inner.list_checkins(objective_id, limit)
        }
        fn append_checkin(&self, checkin: NewCheckin) -> Result<Checkin, OkrError> {
            let mut rival = checkin.clone();
            rival.id = Uuid::new_v4();
            rival.status = CheckinStatus::Waiting;
            self.inner.append_checkin(rival)?;
            self.inner.append_checkin(checkin)
        }
        fn find_review(&self, checkin_id: Uuid) -> Result<Option<Review>, OkrError> {
            self.inner.find_review(checkin_id)
        }
        fn record_review(&self, review: &Review) -> Result<(), OkrError> {
            self.inner.record_review(review)
        }
        fn find_user(&self, id: Uuid) -> Result<Option<User>, OkrError> {
            self.inner.find_user(id)
        }
        fn insert_key_result(&self, key_result: &KeyResult) -> Result<(), OkrError> {
            self.inner.insert_key_result(key_result)
        }
        fn list_key_results(&self, objective_id: Uuid) -> Result<Vec<KeyResult>, OkrError> {
            self.inner.list_key_results(objective_id)
        }
        fn count_key_results(&self, objective_id: Uuid) -> Result<i64, OkrError> {
            self.inner.count_key_results(objective_id)
        }
    }

    #[test]
    fn test_draft_refused_when_submit_lands_first() {
        let repo = Arc::new(InterleavedSubmit {
            inner: MemoryRepository::new(),
        });
        let service = OkrService::new(repo.clone());
        let owner = Principal::new(Uuid::new_v4());
        let okr = service
            .create_or_update_objective(&owner, objective_fields("Race", None))
            .unwrap();

        let err = assert_err!(service.submit_checkin(
            &owner,
            okr.id,
            checkin_fields(10.0, 100.0),
            true
        ));
        assert!(matches!(err, OkrError::InvalidState(_)));
        let history = repo.inner.list_checkins(okr.id, None).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, CheckinStatus::Waiting);
        assert_eq!(service.get_objective(okr.id).unwrap().status, OkrStatus::Waiting);
    }

    #[test]
    fn test_new_cycle_after_checked() {
        let fx = Fixture::new();
        let okr = fx.objective(fx.owner, None);
        let first = submit(&fx, okr.id, 40.0, false).unwrap();
        assert_ok!(review(&fx, &first));

        let second = submit(&fx, okr.id, 55.0, false).unwrap();
        assert_eq!(second.status, CheckinStatus::Waiting);
        let detail = fx.service.get_objective(okr.id).unwrap();
        assert_eq!(detail.status, OkrStatus::Waiting);
        assert_eq!(detail.change, "+15");
        assert_eq!(
            fx.service.get_checkin(first.id).unwrap().checkin.status,
            CheckinStatus::Checked
        );
    }

    #[test]
    fn test_review_requires_waiting_checkin() {
        let fx = Fixture::new();
        let okr = fx.objective(fx.owner, None);
        let draft = submit(&fx, okr.id, 10.0, true).unwrap();
        let err = assert_err!(review(&fx, &draft));
        assert!(matches!(err, OkrError::InvalidState(_)));
        assert!(fx.service.get_review(draft.id).unwrap().is_none());
    }

    #[test]
    fn test_review_against_other_objective_is_not_found() {
        let fx = Fixture::new();
        let okr = fx.objective(fx.owner, None);
        let other = fx.objective(fx.owner, None);
        let waiting = submit(&fx, okr.id, 10.0, false).unwrap();
        let err = assert_err!(fx.service.create_review(
            &fx.as_superior(),
            waiting.id,
            other.id,
            fx.comments()
        ));
        assert!(matches!(err, OkrError::NotFound(_)));
        let err = assert_err!(fx.service.create_review(
            &fx.as_superior(),
            Uuid::new_v4(),
            okr.id,
            fx.comments()
        ));
        assert!(matches!(err, OkrError::NotFound(_)));
    }

    #[test]
    fn test_owner_without_superior_cannot_be_reviewed() {
        let fx = Fixture::new();
        let okr = fx.objective(fx.superior, None);
        let waiting = fx
            .service
            .submit_checkin(&fx.as_superior(), okr.id, checkin_fields(10.0, 100.0), false)
            .unwrap();
        for caller in [fx.as_superior(), fx.as_owner(), fx.as_stranger()] {
            let err =
                assert_err!(fx.service.create_review(&caller, waiting.id, okr.id, fx.comments()));
            assert!(matches!(err, OkrError::Forbidden(_)));
        }
    }

    #[test]
    fn test_review_needs_a_comment() {
        let fx = Fixture::new();
        let okr = fx.objective(fx.owner, None);
        let waiting = submit(&fx, okr.id, 10.0, false).unwrap();
        let err = assert_err!(fx.service.create_review(
            &fx.as_superior(),
            waiting.id,
            okr.id,
            ReviewComments::default()
        ));
        assert!(matches!(err, OkrError::Validation(_)));
    }

    #[test]
    fn test_objective_edit_is_owner_only_and_acyclic() {
        let fx = Fixture::new();
        let owner = fx.as_owner();
        let parent = fx.objective(fx.owner, None);
        let child = fx.objective(fx.owner, Some(parent.id));

        let mut fields = objective_fields("Renamed", None);
        fields.id = Some(child.id);
        let err =
            assert_err!(fx.service.create_or_update_objective(&fx.as_stranger(), fields.clone()));
        assert!(matches!(err, OkrError::Forbidden(_)));

        let updated = fx.service.create_or_update_objective(&owner, fields).unwrap();
        assert_eq!(updated.objective, "Renamed");
        assert_eq!(updated.owner_id, fx.owner);
        assert_eq!(updated.parent_id, None);

        let mut looped = objective_fields("Loop", Some(updated.id));
        looped.id = Some(parent.id);
        assert_ok!(fx.service.create_or_update_objective(&owner, looped));

        let mut back = objective_fields("Back", Some(parent.id));
        back.id = Some(updated.id);
        let err = assert_err!(fx.service.create_or_update_objective(&owner, back));
        assert!(matches!(err, OkrError::CycleDetected(_)));
        assert_eq!(
            fx.service.get_objective(updated.id).unwrap().objective.parent_id,
            None
        );
    }

    #[test]
    fn test_objective_validation() {
        let fx = Fixture::new();
        let owner = fx.as_owner();
        let err = assert_err!(fx
            .service
            .create_or_update_objective(&owner, objective_fields("  ", None)));
        assert!(matches!(err, OkrError::Validation(_)));
        let err = assert_err!(fx
            .service
            .create_or_update_objective(&owner, objective_fields("Valid", Some(Uuid::new_v4()))));
        assert!(matches!(err, OkrError::NotFound(_)));
    }

    #[test]
    fn test_key_results_counted() {
        let fx = Fixture::new();
        let okr = fx.objective(fx.owner, None);
        let fields = KeyResultFields {
            title: "Close 10 deals".to_string(),
            target_value: Some(10.0),
            unit: Some("deals".to_string()),
        };
        let err = assert_err!(fx.service.add_key_result(&fx.as_stranger(), okr.id, fields.clone()));
        assert!(matches!(err, OkrError::Forbidden(_)));
        assert_ok!(fx.service.add_key_result(&fx.as_owner(), okr.id, fields));
        assert_eq!(fx.service.get_objective(okr.id).unwrap().key_result_count, 1);
        assert_eq!(fx.service.list_key_results(okr.id).unwrap().len(), 1);
    }

    #[test]
    fn test_summary_includes_descendants() {
        let fx = Fixture::new();
        let company = fx.objective_of_type(fx.superior, None, ObjectiveType::Company);
        let team = fx.objective_of_type(fx.owner, Some(company.id), ObjectiveType::Team);
        let team_two = fx.objective_of_type(fx.owner, Some(company.id), ObjectiveType::Team);
        assert_ok!(submit(&fx, team.id, 30.0, false));
        assert_ok!(submit(&fx, team_two.id, 45.0, false));

        let summary = fx
            .service
            .summarize_objectives(&ObjectiveFilter::default())
            .unwrap();
        let teams = summary
            .iter()
            .find(|s| s.objective_type == ObjectiveType::Team)
            .unwrap();
        assert_eq!(teams.count, 2);
        assert_eq!(teams.avg_progress, 38);
        let individual = summary
            .iter()
            .find(|s| s.objective_type == ObjectiveType::Individual)
            .unwrap();
        assert_eq!(individual.count, 0);
        assert_eq!(individual.avg_progress, 0);
    }

    #[test]
    fn test_summary_by_owner_counts_only_their_objectives() {
        let fx = Fixture::new();
        fx.objective_of_type(fx.superior, None, ObjectiveType::Company);
        let team = fx.objective_of_type(fx.owner, None, ObjectiveType::Team);
        assert_ok!(submit(&fx, team.id, 70.0, false));

        let filter = ObjectiveFilter {
            owner_id: Some(fx.owner),
            ..ObjectiveFilter::default()
        };
        let summary = fx.service.summarize_objectives(&filter).unwrap();
        let count_of = |kind: ObjectiveType| {
            summary
                .iter()
                .find(|s| s.objective_type == kind)
                .map(|s| (s.count, s.avg_progress))
        };
        assert_eq!(count_of(ObjectiveType::Company), Some((0, 0)));
        assert_eq!(count_of(ObjectiveType::Team), Some((1, 70)));
    }

    #[test]
    fn test_history_newest_first_with_confidence_label() {
        let fx = Fixture::new();
        let okr = fx.objective(fx.owner, None);
        let first = submit(&fx, okr.id, 10.0, true).unwrap();
        let second = submit(&fx, okr.id, 20.0, true).unwrap();
        let history = fx.service.list_checkin_history(okr.id).unwrap();
        let ids: Vec<Uuid> = history.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(
            fx.service.get_checkin(first.id).unwrap().confidence_label,
            "On track"
        );
    }
}
