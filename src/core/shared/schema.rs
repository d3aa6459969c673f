diesel::table! {
    okr_users (id) {
        id -> Uuid,
        display_name -> Varchar,
        superior_id -> Nullable<Uuid>,
    }
}

diesel::table! {
    okr_objectives (id) {
        id -> Uuid,
        objective -> Text,
        objective_type -> Varchar,
        cycle -> Varchar,
        visibility -> Varchar,
        owner_id -> Uuid,
        department_id -> Nullable<Uuid>,
        parent_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    okr_key_results (id) {
        id -> Uuid,
        objective_id -> Uuid,
        title -> Text,
        target_value -> Nullable<Numeric>,
        unit -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    okr_checkins (id) {
        id -> Uuid,
        seq -> Int8,
        objective_id -> Uuid,
        user_id -> Uuid,
        checkin_date -> Date,
        achieved_value -> Numeric,
        target_value -> Nullable<Numeric>,
        percent -> Int4,
        confidence -> Varchar,
        blockers -> Nullable<Text>,
        next_steps -> Nullable<Text>,
        summary -> Nullable<Text>,
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    okr_reviews (id) {
        id -> Uuid,
        checkin_id -> Uuid,
        objective_id -> Uuid,
        reviewer_id -> Uuid,
        personal_comment -> Nullable<Text>,
        team_comment -> Nullable<Text>,
        summary_comment -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(okr_key_results -> okr_objectives (objective_id));
diesel::joinable!(okr_checkins -> okr_objectives (objective_id));
diesel::joinable!(okr_reviews -> okr_checkins (checkin_id));

diesel::allow_tables_to_appear_in_same_query!(
    okr_users,
    okr_objectives,
    okr_key_results,
    okr_checkins,
    okr_reviews,
);
