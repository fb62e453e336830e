diesel::table! {
    users (id) {
        id -> Uuid,
        email -> Text,
        username -> Text,
        first_name -> Text,
        last_name -> Text,
        hashed_password -> Text,
        role -> Text,
        department -> Nullable<Text>,
        phone -> Nullable<Text>,
        is_active -> Bool,
        last_login -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        is_deleted -> Bool,
    }
}

diesel::table! {
    tasks (id) {
        id -> Uuid,
        title -> Text,
        description -> Nullable<Text>,
        status -> Text,
        priority -> Text,
        due_date -> Nullable<Timestamptz>,
        assigned_to -> Nullable<Uuid>,
        created_by -> Uuid,
        tags -> Array<Text>,
        time_logged -> Int4,
        lead_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        is_deleted -> Bool,
    }
}

diesel::table! {
    comments (id) {
        id -> Uuid,
        task_id -> Uuid,
        content -> Text,
        created_by -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        is_deleted -> Bool,
    }
}

diesel::table! {
    notifications (id) {
        id -> Uuid,
        user_id -> Uuid,
        kind -> Text,
        title -> Text,
        message -> Text,
        related_id -> Nullable<Uuid>,
        is_read -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    activity_logs (id) {
        id -> Uuid,
        user_id -> Uuid,
        action -> Text,
        entity_type -> Text,
        entity_id -> Text,
        old_value -> Nullable<Jsonb>,
        new_value -> Nullable<Jsonb>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    campaigns (id) {
        id -> Uuid,
        name -> Text,
        description -> Nullable<Text>,
        campaign_type -> Text,
        status -> Text,
        start_date -> Timestamptz,
        end_date -> Nullable<Timestamptz>,
        assigned_team_members -> Array<Uuid>,
        budget -> Nullable<Float8>,
        target_leads -> Nullable<Int4>,
        total_leads -> Int4,
        qualified_leads -> Int4,
        disqualified_leads -> Int4,
        converted_leads -> Int4,
        created_by -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        is_deleted -> Bool,
    }
}

diesel::table! {
    leads (id) {
        id -> Uuid,
        name -> Text,
        email -> Nullable<Text>,
        phone -> Nullable<Text>,
        company -> Nullable<Text>,
        designation -> Nullable<Text>,
        industry -> Nullable<Text>,
        location -> Nullable<Text>,
        source -> Text,
        status -> Text,
        notes -> Nullable<Text>,
        tags -> Array<Text>,
        campaign_id -> Nullable<Uuid>,
        assigned_to -> Nullable<Uuid>,
        created_by -> Uuid,
        score -> Int4,
        disqualification_reason -> Nullable<Text>,
        disqualification_notes -> Nullable<Text>,
        last_contacted_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        is_deleted -> Bool,
    }
}

diesel::table! {
    lead_activities (id) {
        id -> Uuid,
        lead_id -> Uuid,
        activity_type -> Text,
        description -> Text,
        performed_by -> Uuid,
        metadata -> Nullable<Jsonb>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    daily_targets (id) {
        id -> Uuid,
        campaign_id -> Uuid,
        target_date -> Date,
        data_target -> Int4,
        calling_target -> Int4,
        data_achieved -> Int4,
        calling_achieved -> Int4,
        qualified_data -> Int4,
        qualified_calling -> Int4,
        disqualified_data -> Int4,
        disqualified_calling -> Int4,
    }
}

diesel::table! {
    daily_metrics (id) {
        id -> Uuid,
        campaign_id -> Uuid,
        metric_date -> Date,
        daily_calling_target -> Int4,
        daily_data_target -> Int4,
        achieved_calling_count -> Int4,
        achieved_data_count -> Int4,
        qualified_calling -> Int4,
        qualified_data -> Int4,
        disqualified_calling -> Int4,
        disqualified_data -> Int4,
        disqualification_reasons -> Jsonb,
        status -> Text,
        submitted_by -> Nullable<Uuid>,
        approved_by -> Nullable<Uuid>,
        approved_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    users,
    tasks,
    comments,
    notifications,
    activity_logs,
    campaigns,
    leads,
    lead_activities,
    daily_targets,
    daily_metrics,
);
