use super::*;

fn ann() -> UserRecord {
    UserRecord {
        id: UserId(1),
        name: "Ann".to_string(),
        email: "ann@example.com".to_string(),
        gender: Gender::Female,
        status: UserStatus::Active,
    }
}

#[test]
fn user_record_uses_service_wire_shape() {
    let json = serde_json::to_value(ann()).expect("serialize");
    assert_eq!(
        json,
        serde_json::json!({
            "id": 1,
            "name": "Ann",
            "email": "ann@example.com",
            "gender": "female",
            "status": "active",
        })
    );
}

#[test]
fn draft_serializes_without_id() {
    let draft = UserDraft::from(&ann());
    let json = serde_json::to_value(&draft).expect("serialize");
    assert!(json.get("id").is_none());
    assert_eq!(json["status"], "active");
}

#[test]
fn blank_draft_defaults_to_first_choices() {
    let draft = UserDraft::default();
    assert!(draft.name.is_empty());
    assert!(draft.email.is_empty());
    assert_eq!(draft.gender, Gender::Male);
    assert_eq!(draft.status, UserStatus::Active);
}

#[test]
fn choices_parse_case_insensitively() {
    assert_eq!("Female".parse::<Gender>(), Ok(Gender::Female));
    assert_eq!(" INACTIVE ".parse::<UserStatus>(), Ok(UserStatus::Inactive));

    let err = "other".parse::<Gender>().expect_err("must reject");
    assert_eq!(
        err.to_string(),
        "unknown gender 'other', expected one of: male female"
    );
}

#[test]
fn validate_rejects_blank_name_and_bad_email() {
    let mut draft = UserDraft::from(&ann());
    assert_eq!(draft.validate(), Ok(()));

    draft.name = "   ".to_string();
    assert_eq!(draft.validate(), Err(DraftError::EmptyName));

    draft.name = "Ann".to_string();
    for email in ["", "ann", "ann@example", "a b@example.com", "a@@example.com"] {
        draft.email = email.to_string();
        assert_eq!(
            draft.validate(),
            Err(DraftError::InvalidEmail(email.to_string())),
            "email {email:?} should be rejected"
        );
    }
}

#[test]
fn set_field_updates_named_field() {
    let mut draft = UserDraft::default();
    draft.set_field("name", " Bo ").expect("name");
    draft.set_field("Gender", "female").expect("gender");
    draft.set_field("status", "inactive").expect("status");

    assert_eq!(draft.name, "Bo");
    assert_eq!(draft.gender, Gender::Female);
    assert_eq!(draft.status, UserStatus::Inactive);

    assert!(matches!(
        draft.set_field("age", "3"),
        Err(DraftFieldError::UnknownField(field)) if field == "age"
    ));
    assert!(matches!(
        draft.set_field("status", "paused"),
        Err(DraftFieldError::Choice(_))
    ));
}
