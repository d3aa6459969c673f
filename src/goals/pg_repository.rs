use bigdecimal::{BigDecimal, FromPrimitive, ToPrimitive};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::sql_types::BigInt;
use diesel::PgConnection;
use uuid::Uuid;

use super::error::OkrError;
use super::models::{
    Checkin, CheckinStatus, Confidence, KeyResult, NewCheckin, Objective, ObjectiveType, Review,
    User, Visibility,
};
use super::hierarchy::ensure_acyclic_parent;
use super::repository::{guard_pending_review, OkrRepository};
use crate::core::shared::schema::{
    okr_checkins, okr_key_results, okr_objectives, okr_reviews, okr_users,
};
use crate::core::shared::utils::DbPool;

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = okr_objectives)]
#[diesel(treat_none_as_null = true)]
pub struct ObjectiveRecord {
    pub id: Uuid,
    pub objective: String,
    pub objective_type: String,
    pub cycle: String,
    pub visibility: String,
    pub owner_id: Uuid,
    pub department_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = okr_key_results)]
pub struct KeyResultRecord {
    pub id: Uuid,
    pub objective_id: Uuid,
    pub title: String,
    pub target_value: Option<BigDecimal>,
    pub unit: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = okr_checkins)]
pub struct CheckinRecord {
    pub id: Uuid,
    pub seq: i64,
    pub objective_id: Uuid,
    pub user_id: Uuid,
    pub checkin_date: NaiveDate,
    pub achieved_value: BigDecimal,
    pub target_value: Option<BigDecimal>,
    pub percent: i32,
    pub confidence: String,
    pub blockers: Option<String>,
    pub next_steps: Option<String>,
    pub summary: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = okr_checkins)]
pub struct NewCheckinRecord {
    pub id: Uuid,
    pub objective_id: Uuid,
    pub user_id: Uuid,
    pub checkin_date: NaiveDate,
    pub achieved_value: BigDecimal,
    pub target_value: Option<BigDecimal>,
    pub percent: i32,
    pub confidence: String,
    pub blockers: Option<String>,
    pub next_steps: Option<String>,
    pub summary: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = okr_reviews)]
pub struct ReviewRecord {
    pub id: Uuid,
    pub checkin_id: Uuid,
    pub objective_id: Uuid,
    pub reviewer_id: Uuid,
    pub personal_comment: Option<String>,
    pub team_comment: Option<String>,
    pub summary_comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = okr_users)]
pub struct UserRecord {
    pub id: Uuid,
    pub display_name: String,
    pub superior_id: Option<Uuid>,
}

fn to_decimal(value: f64) -> BigDecimal {
    BigDecimal::from_f64(value).unwrap_or_else(|| BigDecimal::from(0))
}

fn objective_to_record(objective: &Objective) -> ObjectiveRecord {
    ObjectiveRecord {
        id: objective.id,
        objective: objective.objective.clone(),
        objective_type: objective.objective_type.to_str().to_string(),
        cycle: objective.cycle.clone(),
        visibility: objective.visibility.to_str().to_string(),
        owner_id: objective.owner_id,
        department_id: objective.department_id,
        parent_id: objective.parent_id,
        created_at: objective.created_at,
        updated_at: objective.updated_at,
    }
}

fn record_to_objective(record: ObjectiveRecord) -> Result<Objective, OkrError> {
    let objective_type = ObjectiveType::from_str(&record.objective_type).ok_or_else(|| {
        OkrError::Database(format!(
            "objective {} has unknown type '{}'",
            record.id, record.objective_type
        ))
    })?;
    let visibility = Visibility::from_str(&record.visibility).ok_or_else(|| {
        OkrError::Database(format!(
            "objective {} has unknown visibility '{}'",
            record.id, record.visibility
        ))
    })?;
    Ok(Objective {
        id: record.id,
        objective: record.objective,
        objective_type,
        cycle: record.cycle,
        visibility,
        owner_id: record.owner_id,
        department_id: record.department_id,
        parent_id: record.parent_id,
        created_at: record.created_at,
        updated_at: record.updated_at,
    })
}

fn records_to_objectives(records: Vec<ObjectiveRecord>) -> Result<Vec<Objective>, OkrError> {
    records.into_iter().map(record_to_objective).collect()
}

fn checkin_to_record(checkin: &NewCheckin) -> NewCheckinRecord {
    NewCheckinRecord {
        id: checkin.id,
        objective_id: checkin.objective_id,
        user_id: checkin.user_id,
        checkin_date: checkin.checkin_date,
        achieved_value: to_decimal(checkin.achieved_value),
        target_value: checkin.target_value.map(to_decimal),
        percent: checkin.percent,
        confidence: checkin.confidence.to_str().to_string(),
        blockers: checkin.blockers.clone(),
        next_steps: checkin.next_steps.clone(),
        summary: checkin.summary.clone(),
        status: checkin.status.to_str().to_string(),
        created_at: checkin.created_at,
    }
}

fn record_to_checkin(record: CheckinRecord) -> Result<Checkin, OkrError> {
    let status = CheckinStatus::from_str(&record.status).ok_or_else(|| {
        OkrError::Database(format!(
            "check-in {} has unknown status '{}'",
            record.id, record.status
        ))
    })?;
    let confidence = Confidence::from_str(&record.confidence).ok_or_else(|| {
        OkrError::Database(format!(
            "check-in {} has unknown confidence '{}'",
            record.id, record.confidence
        ))
    })?;
    Ok(Checkin {
        id: record.id,
        objective_id: record.objective_id,
        user_id: record.user_id,
        checkin_date: record.checkin_date,
        achieved_value: record.achieved_value.to_f64().unwrap_or(0.0),
        target_value: record.target_value.and_then(|v| v.to_f64()),
        percent: record.percent,
        confidence,
        blockers: record.blockers,
        next_steps: record.next_steps,
        summary: record.summary,
        status,
        seq: record.seq,
        created_at: record.created_at,
    })
}

fn review_to_record(review: &Review) -> ReviewRecord {
    ReviewRecord {
        id: review.id,
        checkin_id: review.checkin_id,
        objective_id: review.objective_id,
        reviewer_id: review.reviewer_id,
        personal_comment: review.personal_comment.clone(),
        team_comment: review.team_comment.clone(),
        summary_comment: review.summary_comment.clone(),
        created_at: review.created_at,
    }
}

fn record_to_review(record: ReviewRecord) -> Review {
    Review {
        id: record.id,
        checkin_id: record.checkin_id,
        objective_id: record.objective_id,
        reviewer_id: record.reviewer_id,
        personal_comment: record.personal_comment,
        team_comment: record.team_comment,
        summary_comment: record.summary_comment,
        created_at: record.created_at,
    }
}

fn record_to_key_result(record: KeyResultRecord) -> KeyResult {
    KeyResult {
        id: record.id,
        objective_id: record.objective_id,
        title: record.title,
        target_value: record.target_value.and_then(|v| v.to_f64()),
        unit: record.unit,
        created_at: record.created_at,
    }
}

const HIERARCHY_LOCK_KEY: i64 = 0x6f6b_725f_7472_6565;

/// Postgres-backed store. The guarded writes run in a transaction and are
/// backed by unique indexes (`uq_okr_checkins_one_waiting`,
/// `uq_okr_reviews_checkin`), whose violations surface as `Conflict`.
pub struct PgRepository {
    pool: DbPool,
}

impl PgRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PooledConnection<ConnectionManager<PgConnection>>, OkrError> {
        Ok(self.pool.get()?)
    }
}

impl OkrRepository for PgRepository {
    fn find_objective(&self, id: Uuid) -> Result<Option<Objective>, OkrError> {
        let mut conn = self.conn()?;
        let record = okr_objectives::table
            .find(id)
            .select(ObjectiveRecord::as_select())
            .first(&mut conn)
            .optional()?;
        record.map(record_to_objective).transpose()
    }

    fn list_objectives(&self) -> Result<Vec<Objective>, OkrError> {
        let mut conn = self.conn()?;
        let records = okr_objectives::table
            .order((okr_objectives::created_at.asc(), okr_objectives::id.asc()))
            .select(ObjectiveRecord::as_select())
            .load(&mut conn)?;
        records_to_objectives(records)
    }

    fn list_children(&self, parent_id: Uuid) -> Result<Vec<Objective>, OkrError> {
        let mut conn = self.conn()?;
        let records = okr_objectives::table
            .filter(okr_objectives::parent_id.eq(parent_id))
            .order((okr_objectives::created_at.asc(), okr_objectives::id.asc()))
            .select(ObjectiveRecord::as_select())
            .load(&mut conn)?;
        records_to_objectives(records)
    }

    fn list_objectives_by_owner(&self, owner_id: Uuid) -> Result<Vec<Objective>, OkrError> {
        let mut conn = self.conn()?;
        let records = okr_objectives::table
            .filter(okr_objectives::owner_id.eq(owner_id))
            .order((okr_objectives::created_at.asc(), okr_objectives::id.asc()))
            .select(ObjectiveRecord::as_select())
            .load(&mut conn)?;
        records_to_objectives(records)
    }

    fn count_children(&self, parent_id: Uuid) -> Result<i64, OkrError> {
        let mut conn = self.conn()?;
        Ok(okr_objectives::table
            .filter(okr_objectives::parent_id.eq(parent_id))
            .count()
            .get_result(&mut conn)?)
    }

    fn insert_objective(&self, objective: &Objective) -> Result<(), OkrError> {
        let mut conn = self.conn()?;
        diesel::insert_into(okr_objectives::table)
            .values(&objective_to_record(objective))
            .execute(&mut conn)?;
        Ok(())
    }

    fn update_objective(&self, objective: &Objective, max_depth: usize) -> Result<(), OkrError> {
        let mut conn = self.conn()?;
        let record = objective_to_record(objective);

        conn.transaction::<_, OkrError, _>(|conn| {
            // Serializes re-parenting so two moves cannot each pass the walk.
            diesel::sql_query("SELECT pg_advisory_xact_lock($1)")
                .bind::<BigInt, _>(HIERARCHY_LOCK_KEY)
                .execute(conn)?;

            let stored_parent: Option<Uuid> = okr_objectives::table
                .find(objective.id)
                .select(okr_objectives::parent_id)
                .for_update()
                .first::<Option<Uuid>>(conn)
                .optional()?
                .ok_or_else(|| OkrError::NotFound("Objective not found".to_string()))?;

            if let Some(parent_id) = objective.parent_id {
                if stored_parent != Some(parent_id) {
                    ensure_acyclic_parent(objective.id, parent_id, max_depth, |id| {
                        Ok(okr_objectives::table
                            .find(id)
                            .select(okr_objectives::parent_id)
                            .first::<Option<Uuid>>(conn)
                            .optional()?)
                    })?;
                }
            }

            diesel::update(okr_objectives::table.find(objective.id))
                .set(&record)
                .execute(conn)?;
            Ok(())
        })
    }

    fn find_checkin(&self, id: Uuid) -> Result<Option<Checkin>, OkrError> {
        let mut conn = self.conn()?;
        okr_checkins::table
            .find(id)
            .select(CheckinRecord::as_select())
            .first(&mut conn)
            .optional()?
            .map(record_to_checkin)
            .transpose()
    }

    fn list_checkins(
        &self,
        objective_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<Checkin>, OkrError> {
        let mut conn = self.conn()?;
        let mut query = okr_checkins::table
            .filter(okr_checkins::objective_id.eq(objective_id))
            .order((okr_checkins::checkin_date.desc(), okr_checkins::seq.desc()))
            .select(CheckinRecord::as_select())
            .into_boxed();
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        query
            .load::<CheckinRecord>(&mut conn)?
            .into_iter()
            .map(record_to_checkin)
            .collect()
    }

    fn append_checkin(&self, checkin: NewCheckin) -> Result<Checkin, OkrError> {
        let mut conn = self.conn()?;
        let record = checkin_to_record(&checkin);

        let row = conn.transaction::<_, OkrError, _>(|conn| {
            // Owner writes on one objective queue behind its row lock.
            okr_objectives::table
                .find(checkin.objective_id)
                .select(okr_objectives::id)
                .for_update()
                .first::<Uuid>(conn)
                .optional()?
                .ok_or_else(|| {
                    OkrError::NotFound(format!("Objective {} not found", checkin.objective_id))
                })?;

            let pending: i64 = okr_checkins::table
                .filter(okr_checkins::objective_id.eq(checkin.objective_id))
                .filter(okr_checkins::status.eq(CheckinStatus::Waiting.to_str()))
                .count()
                .get_result(conn)?;
            guard_pending_review(checkin.status, pending > 0)?;

            Ok(diesel::insert_into(okr_checkins::table)
                .values(&record)
                .returning(CheckinRecord::as_returning())
                .get_result::<CheckinRecord>(conn)?)
        })?;
        record_to_checkin(row)
    }

    fn find_review(&self, checkin_id: Uuid) -> Result<Option<Review>, OkrError> {
        let mut conn = self.conn()?;
        let record = okr_reviews::table
            .filter(okr_reviews::checkin_id.eq(checkin_id))
            .select(ReviewRecord::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(record.map(record_to_review))
    }

    fn record_review(&self, review: &Review) -> Result<(), OkrError> {
        let mut conn = self.conn()?;
        let record = review_to_record(review);

        conn.transaction::<_, OkrError, _>(|conn| {
            let flipped = diesel::update(
                okr_checkins::table
                    .filter(okr_checkins::id.eq(review.checkin_id))
                    .filter(okr_checkins::status.eq(CheckinStatus::Waiting.to_str())),
            )
            .set(okr_checkins::status.eq(CheckinStatus::Checked.to_str()))
            .execute(conn)?;

            if flipped == 0 {
                let reviewed: i64 = okr_reviews::table
                    .filter(okr_reviews::checkin_id.eq(review.checkin_id))
                    .count()
                    .get_result(conn)?;
                if reviewed > 0 {
                    return Err(OkrError::Conflict(
                        "Check-in has already been reviewed".to_string(),
                    ));
                }
                let status: Option<String> = okr_checkins::table
                    .find(review.checkin_id)
                    .select(okr_checkins::status)
                    .first(conn)
                    .optional()?;
                return Err(match status {
                    None => OkrError::NotFound("Check-in not found".to_string()),
                    Some(status) => OkrError::InvalidState(format!(
                        "Check-in is {status}, only waiting check-ins can be reviewed"
                    )),
                });
            }

            diesel::insert_into(okr_reviews::table)
                .values(&record)
                .execute(conn)?;
            Ok(())
        })
    }

    fn find_user(&self, id: Uuid) -> Result<Option<User>, OkrError> {
        let mut conn = self.conn()?;
        let record = okr_users::table
            .find(id)
            .select(UserRecord::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(record.map(|r| User {
            id: r.id,
            display_name: r.display_name,
            superior_id: r.superior_id,
        }))
    }

    fn insert_key_result(&self, key_result: &KeyResult) -> Result<(), OkrError> {
        let mut conn = self.conn()?;
        let record = KeyResultRecord {
            id: key_result.id,
            objective_id: key_result.objective_id,
            title: key_result.title.clone(),
            target_value: key_result.target_value.map(to_decimal),
            unit: key_result.unit.clone(),
            created_at: key_result.created_at,
        };
        diesel::insert_into(okr_key_results::table)
            .values(&record)
            .execute(&mut conn)?;
        Ok(())
    }

    fn list_key_results(&self, objective_id: Uuid) -> Result<Vec<KeyResult>, OkrError> {
        let mut conn = self.conn()?;
        let records = okr_key_results::table
            .filter(okr_key_results::objective_id.eq(objective_id))
            .order(okr_key_results::created_at.asc())
            .select(KeyResultRecord::as_select())
            .load(&mut conn)?;
        Ok(records.into_iter().map(record_to_key_result).collect())
    }

    fn count_key_results(&self, objective_id: Uuid) -> Result<i64, OkrError> {
        let mut conn = self.conn()?;
        Ok(okr_key_results::table
            .filter(okr_key_results::objective_id.eq(objective_id))
            .count()
            .get_result(&mut conn)?)
    }
}
