use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveType {
    Company,
    Team,
    Individual,
}

impl ObjectiveType {
    pub const ALL: [ObjectiveType; 3] = [Self::Company, Self::Team, Self::Individual];

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "company" => Some(Self::Company),
            "team" => Some(Self::Team),
            "individual" => Some(Self::Individual),
            _ => None,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Team => "team",
            Self::Individual => "individual",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Self::Public),
            "private" => Some(Self::Private),
            _ => None,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

/// Persisted status of a single check-in row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckinStatus {
    Draft,
    Waiting,
    Checked,
}

impl CheckinStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "waiting" => Some(Self::Waiting),
            "checked" => Some(Self::Checked),
            _ => None,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Waiting => "waiting",
            Self::Checked => "checked",
        }
    }
}

/// Derived status of an objective: the latest check-in's status, or
/// `NotChecked` when the objective has none.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OkrStatus {
    NotChecked,
    Draft,
    Waiting,
    Checked,
}

impl From<CheckinStatus> for OkrStatus {
    fn from(status: CheckinStatus) -> Self {
        match status {
            CheckinStatus::Draft => Self::Draft,
            CheckinStatus::Waiting => Self::Waiting,
            CheckinStatus::Checked => Self::Checked,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Weak,
    Stable,
    Strong,
}

impl Confidence {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "weak" => Some(Self::Weak),
            "stable" => Some(Self::Stable),
            "strong" => Some(Self::Strong),
            _ => None,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Weak => "weak",
            Self::Stable => "stable",
            Self::Strong => "strong",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Weak => "Not going well",
            Self::Stable => "On track",
            Self::Strong => "Going well",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Objective {
    pub id: Uuid,
    pub objective: String,
    pub objective_type: ObjectiveType,
    pub cycle: String,
    pub visibility: Visibility,
    pub owner_id: Uuid,
    pub department_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyResult {
    pub id: Uuid,
    pub objective_id: Uuid,
    pub title: String,
    pub target_value: Option<f64>,
    pub unit: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkin {
    pub id: Uuid,
    pub objective_id: Uuid,
    pub user_id: Uuid,
    pub checkin_date: NaiveDate,
    pub achieved_value: f64,
    pub target_value: Option<f64>,
    pub percent: i32,
    pub confidence: Confidence,
    pub blockers: Option<String>,
    pub next_steps: Option<String>,
    pub summary: Option<String>,
    pub status: CheckinStatus,
    /// Creation order; breaks ties between rows sharing a date.
    pub seq: i64,
    pub created_at: DateTime<Utc>,
}

/// A check-in about to be appended; the store assigns `seq`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCheckin {
    pub id: Uuid,
    pub objective_id: Uuid,
    pub user_id: Uuid,
    pub checkin_date: NaiveDate,
    pub achieved_value: f64,
    pub target_value: Option<f64>,
    pub percent: i32,
    pub confidence: Confidence,
    pub blockers: Option<String>,
    pub next_steps: Option<String>,
    pub summary: Option<String>,
    pub status: CheckinStatus,
    pub created_at: DateTime<Utc>,
}

impl NewCheckin {
    pub fn into_checkin(self, seq: i64) -> Checkin {
        Checkin {
            id: self.id,
            objective_id: self.objective_id,
            user_id: self.user_id,
            checkin_date: self.checkin_date,
            achieved_value: self.achieved_value,
            target_value: self.target_value,
            percent: self.percent,
            confidence: self.confidence,
            blockers: self.blockers,
            next_steps: self.next_steps,
            summary: self.summary,
            status: self.status,
            seq,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: Uuid,
    pub checkin_id: Uuid,
    pub objective_id: Uuid,
    pub reviewer_id: Uuid,
    pub personal_comment: Option<String>,
    pub team_comment: Option<String>,
    pub summary_comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    pub superior_id: Option<Uuid>,
}

/// The caller on whose behalf a core operation runs. Resolved from the
/// bearer token by the API boundary before the core is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
}

impl Principal {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ObjectiveFilter {
    pub owner_id: Option<Uuid>,
    pub objective_type: Option<ObjectiveType>,
    pub cycle: Option<String>,
    pub department_id: Option<Uuid>,
}

impl ObjectiveFilter {
    pub fn is_empty(&self) -> bool {
        self.owner_id.is_none()
            && self.objective_type.is_none()
            && self.cycle.is_none()
            && self.department_id.is_none()
    }

    pub fn matches(&self, objective: &Objective) -> bool {
        self.owner_id.map_or(true, |o| objective.owner_id == o)
            && self
                .objective_type
                .map_or(true, |t| objective.objective_type == t)
            && self.cycle.as_ref().map_or(true, |c| &objective.cycle == c)
            && self
                .department_id
                .map_or(true, |d| objective.department_id == Some(d))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveFields {
    pub id: Option<Uuid>,
    pub objective: String,
    pub objective_type: ObjectiveType,
    pub cycle: String,
    pub visibility: Option<Visibility>,
    pub department_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinFields {
    pub checkin_date: Option<NaiveDate>,
    pub achieved_value: f64,
    pub target_value: Option<f64>,
    pub percent: Option<i32>,
    pub confidence: Option<Confidence>,
    pub blockers: Option<String>,
    pub next_steps: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReviewComments {
    pub personal_comment: Option<String>,
    pub team_comment: Option<String>,
    pub summary_comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyResultFields {
    pub title: String,
    pub target_value: Option<f64>,
    pub unit: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkin_status_round_trip_and_unknown() {
        for status in [CheckinStatus::Draft, CheckinStatus::Waiting, CheckinStatus::Checked] {
            assert_eq!(CheckinStatus::from_str(status.to_str()), Some(status));
        }
        assert_eq!(CheckinStatus::from_str("approved"), None);
    }

    #[test]
    fn test_unknown_enum_values_are_rejected() {
        for kind in ObjectiveType::ALL {
            assert_eq!(ObjectiveType::from_str(kind.to_str()), Some(kind));
        }
        assert_eq!(ObjectiveType::from_str("division"), None);
        assert_eq!(Visibility::from_str("secret"), None);
        assert_eq!(Confidence::from_str("strong"), Some(Confidence::Strong));
        assert_eq!(Confidence::from_str("meh"), None);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&OkrStatus::NotChecked).unwrap();
        assert_eq!(json, "\"not_checked\"");
    }

    #[test]
    fn test_filter_matches_all_fields() {
        let owner = Uuid::new_v4();
        let dept = Uuid::new_v4();
        let objective = Objective {
            id: Uuid::new_v4(),
            objective: "Grow revenue".to_string(),
            objective_type: ObjectiveType::Team,
            cycle: "2026-Q4".to_string(),
            visibility: Visibility::Public,
            owner_id: owner,
            department_id: Some(dept),
            parent_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(ObjectiveFilter::default().matches(&objective));
        let filter = ObjectiveFilter {
            owner_id: Some(owner),
            objective_type: Some(ObjectiveType::Team),
            cycle: Some("2026-Q4".to_string()),
            department_id: Some(dept),
        };
        assert!(filter.matches(&objective));

        let other_cycle = ObjectiveFilter {
            cycle: Some("2026-Q3".to_string()),
            ..Default::default()
        };
        assert!(!other_cycle.matches(&objective));
    }
}
