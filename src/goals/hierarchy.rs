use std::collections::{HashMap, HashSet};

use log::warn;
use uuid::Uuid;

use super::error::OkrError;
use super::models::Objective;
use super::repository::OkrRepository;

pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Resolves parent/child links between objectives and reporting lines
/// between users. Every walk is capped at `max_depth` steps.
pub struct HierarchyResolver<'a> {
    repo: &'a dyn OkrRepository,
    max_depth: usize,
}

impl<'a> HierarchyResolver<'a> {
    pub fn new(repo: &'a dyn OkrRepository, max_depth: usize) -> Self {
        Self {
            repo,
            max_depth: max_depth.max(1),
        }
    }

    pub fn children_of(&self, okr_id: Uuid) -> Result<Vec<Objective>, OkrError> {
        self.repo.list_children(okr_id)
    }

    pub fn has_children(&self, okr_id: Uuid) -> Result<bool, OkrError> {
        Ok(self.repo.count_children(okr_id)? > 0)
    }

    /// Ancestors of `okr_id`, nearest parent first. The objective itself is
    /// not included.
    pub fn ancestor_chain(&self, okr_id: Uuid) -> Result<Vec<Objective>, OkrError> {
        let start = self
            .repo
            .find_objective(okr_id)?
            .ok_or_else(|| OkrError::NotFound(format!("Objective {okr_id} not found")))?;

        let mut chain = Vec::new();
        let mut seen = HashSet::from([okr_id]);
        let mut next = start.parent_id;

        while let Some(parent_id) = next {
            if !seen.insert(parent_id) || chain.len() >= self.max_depth {
                warn!("Parent chain of objective {okr_id} loops at {parent_id}");
                return Err(OkrError::CycleDetected(format!(
                    "parent chain of objective {okr_id} revisits {parent_id}"
                )));
            }
            let parent = self.repo.find_objective(parent_id)?.ok_or_else(|| {
                OkrError::NotFound(format!("Parent objective {parent_id} not found"))
            })?;
            next = parent.parent_id;
            chain.push(parent);
        }
        Ok(chain)
    }

    pub fn superior_of(&self, user_id: Uuid) -> Result<Option<Uuid>, OkrError> {
        Ok(self
            .repo
            .find_user(user_id)?
            .and_then(|user| user.superior_id)
            .filter(|superior| *superior != user_id))
    }

    /// Checks that `objective_id` may hang under `parent_id`: the parent
    /// exists and the objective is not among the parent's ancestors.
    pub fn validate_parent(&self, objective_id: Uuid, parent_id: Uuid) -> Result<(), OkrError> {
        ensure_acyclic_parent(objective_id, parent_id, self.max_depth, |id| {
            Ok(self.repo.find_objective(id)?.map(|o| o.parent_id))
        })
    }
}

/// Walks up from `parent_id` and fails if the walk reaches `objective_id`.
/// `parent_of` returns `None` for a missing objective and `Some(parent)`
/// otherwise. Stores call this inside the same atomic unit as the write.
pub fn ensure_acyclic_parent<F>(
    objective_id: Uuid,
    parent_id: Uuid,
    max_depth: usize,
    mut parent_of: F,
) -> Result<(), OkrError>
where
    F: FnMut(Uuid) -> Result<Option<Option<Uuid>>, OkrError>,
{
    if parent_id == objective_id {
        return Err(OkrError::CycleDetected(format!(
            "objective {objective_id} cannot be its own parent"
        )));
    }
    let mut seen = HashSet::from([parent_id]);
    let mut current = parent_id;
    loop {
        let next = parent_of(current)?
            .ok_or_else(|| OkrError::NotFound(format!("Parent objective {current} not found")))?;
        let Some(next) = next else {
            return Ok(());
        };
        if next == objective_id {
            return Err(OkrError::CycleDetected(format!(
                "objective {objective_id} is already an ancestor of {parent_id}"
            )));
        }
        if !seen.insert(next) || seen.len() > max_depth.max(1) {
            warn!("Parent chain above objective {parent_id} loops at {next}");
            return Err(OkrError::CycleDetected(format!(
                "parent chain of objective {parent_id} revisits {next}"
            )));
        }
        current = next;
    }
}

/// Parent/child index over an in-memory set of objectives, for listings
/// that work on the whole tree at once.
pub struct ObjectiveForest {
    by_id: HashMap<Uuid, Objective>,
    children: HashMap<Uuid, Vec<Uuid>>,
    roots: Vec<Uuid>,
    max_depth: usize,
}

impl ObjectiveForest {
    pub fn new(objectives: Vec<Objective>, max_depth: usize) -> Self {
        let mut by_id = HashMap::new();
        let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        let mut roots = Vec::new();
        for objective in &objectives {
            match objective.parent_id {
                Some(parent) => children.entry(parent).or_default().push(objective.id),
                None => roots.push(objective.id),
            }
        }
        for objective in objectives {
            by_id.insert(objective.id, objective);
        }
        Self {
            by_id,
            children,
            roots,
            max_depth: max_depth.max(1),
        }
    }

    pub fn roots(&self) -> impl Iterator<Item = &Objective> {
        self.roots.iter().filter_map(|id| self.by_id.get(id))
    }

    pub fn children(&self, id: Uuid) -> impl Iterator<Item = &Objective> {
        self.children
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|child| self.by_id.get(child))
    }

    pub fn has_children(&self, id: Uuid) -> bool {
        self.children.get(&id).is_some_and(|c| !c.is_empty())
    }

    /// Fails if any objective's parent chain loops or runs past `max_depth`.
    pub fn check_integrity(&self) -> Result<(), OkrError> {
        for objective in self.by_id.values() {
            let mut seen = HashSet::from([objective.id]);
            let mut next = objective.parent_id;
            while let Some(parent_id) = next {
                if !seen.insert(parent_id) || seen.len() > self.max_depth + 1 {
                    return Err(OkrError::CycleDetected(format!(
                        "parent chain of objective {} revisits {parent_id}",
                        objective.id
                    )));
                }
                next = self.by_id.get(&parent_id).and_then(|p| p.parent_id);
            }
        }
        Ok(())
    }
}
