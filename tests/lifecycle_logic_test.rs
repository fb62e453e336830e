use axum::http::StatusCode;
use leadserver::analytics::funnel_percentages;
use leadserver::auth::claims::{issue_token, validate_token, AuthUser, ROLE_EMPLOYEE, ROLE_MANAGER};
use leadserver::campaigns::rollup::conversion_rate;
use leadserver::daily_metrics::{
    accepts_approval, accepts_submission, STATUS_APPROVED, STATUS_DRAFT, STATUS_LOCKED,
    STATUS_SUBMITTED,
};
use leadserver::error::ApiError;
use leadserver::leads::types::{append_qualify_note, DisqualificationReason, LeadSource};
use uuid::Uuid;

#[test]
fn issued_tokens_carry_the_role_through_validation() {
    let secret = "integration-secret";
    let id = Uuid::new_v4();
    let token = issue_token(
        id,
        Some("manager@example.com".into()),
        Some(ROLE_MANAGER.into()),
        secret,
        30,
    )
    .unwrap();

    let claims = validate_token(&token, secret).unwrap();
    let user = AuthUser {
        user_id: Uuid::parse_str(&claims.sub).unwrap(),
        email: claims.email,
        role: claims.role,
    };

    assert_eq!(user.user_id, id);
    assert!(user.is_manager());
    assert!(user.require_manager("set campaign targets").is_ok());
    assert!(user.require_admin("delete campaigns").is_err());
}

#[test]
fn employee_tokens_cannot_pass_manager_gates() {
    let secret = "integration-secret";
    let token = issue_token(
        Uuid::new_v4(),
        None,
        Some(ROLE_EMPLOYEE.into()),
        secret,
        30,
    )
    .unwrap();
    let claims = validate_token(&token, secret).unwrap();
    let user = AuthUser {
        user_id: Uuid::parse_str(&claims.sub).unwrap(),
        email: claims.email,
        role: claims.role,
    };

    let err = user.require_manager("bulk import leads").unwrap_err();
    assert_eq!(err.status(), StatusCode::FORBIDDEN);
}

#[test]
fn qualification_notes_accumulate_across_calls() {
    let first = append_qualify_note(None, "budget confirmed");
    let second = append_qualify_note(Some(&first), "decision maker reached");
    assert_eq!(
        second,
        "[Qualified] budget confirmed\n[Qualified] decision maker reached"
    );
}

#[test]
fn disqualification_reasons_parse_from_wire_format() {
    let reason: DisqualificationReason = serde_json::from_str("\"do_not_call\"").unwrap();
    assert_eq!(reason.as_str(), "do_not_call");

    let bad: Result<DisqualificationReason, _> = serde_json::from_str("\"meteor_strike\"");
    assert!(bad.is_err());
}

#[test]
fn only_calling_sources_roll_into_the_calling_channel() {
    let calling: LeadSource = serde_json::from_str("\"calling\"").unwrap();
    let website: LeadSource = serde_json::from_str("\"website\"").unwrap();
    assert!(calling.is_calling_channel());
    assert!(!website.is_calling_channel());
}

#[test]
fn metrics_day_lifecycle_gates() {
    // draft -> submitted -> approved; locked days reject everything
    assert!(accepts_submission(STATUS_DRAFT));
    assert!(accepts_approval(STATUS_SUBMITTED));
    assert!(!accepts_approval(STATUS_APPROVED));
    assert!(!accepts_submission(STATUS_LOCKED));
    assert!(!accepts_approval(STATUS_LOCKED));
}

#[test]
fn rates_and_funnels_survive_empty_campaigns() {
    assert_eq!(conversion_rate(0, 0), 0.0);
    assert_eq!(funnel_percentages(&[0; 5]), [0.0; 5]);

    let pct = funnel_percentages(&[40, 30, 20, 5, 5]);
    assert_eq!(pct, [40.0, 30.0, 20.0, 5.0, 5.0]);
}

#[test]
fn not_found_errors_name_the_missing_resource() {
    let err = ApiError::NotFound("Lead");
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
    assert_eq!(err.to_string(), "Lead not found");
}
