use super::*;

#[test]
fn draft_defaults_to_active() {
    let draft = CategoryDraft::new("Alimentation");
    assert!(draft.is_active);
    assert!(draft.validate().is_ok());
    assert_eq!(draft.to_request().is_active, Some(true));
}

#[test]
fn draft_rejects_single_character_name() {
    let errors = CategoryDraft::new("A").validate().expect_err("too short");
    assert_eq!(
        field_messages(&errors),
        vec![("name".to_string(), NAME_TOO_SHORT.to_string())]
    );
}

#[test]
fn patch_only_checks_present_name() {
    assert!(CategoryPatch::default().validate().is_ok());
    assert!(CategoryPatch::default().is_empty());

    let patch = CategoryPatch {
        name: Some("x".into()),
        ..CategoryPatch::default()
    };
    let errors = patch.validate().expect_err("too short");
    assert!(errors.field_errors().contains_key("name"));
}

#[test]
fn register_form_reports_every_invalid_field() {
    let form = RegisterForm {
        username: "al".into(),
        email: "not-an-email".into(),
        password: "short".into(),
        confirm_password: "different".into(),
    };
    let errors = form.validate().expect_err("invalid");
    let fields = field_messages(&errors)
        .into_iter()
        .map(|(field, _)| field)
        .collect::<Vec<_>>();
    assert_eq!(
        fields,
        vec!["confirm_password", "email", "password", "username"]
    );
}

#[test]
fn register_form_accepts_matching_passwords() {
    let form = RegisterForm {
        username: "camille".into(),
        email: "camille@example.com".into(),
        password: "correct horse".into(),
        confirm_password: "correct horse".into(),
    };
    assert!(form.validate().is_ok());
    assert_eq!(form.to_request().confirm_password, "correct horse");
}

#[test]
fn login_form_requires_password() {
    let form = LoginForm {
        email: "camille@example.com".into(),
        password: String::new(),
    };
    let errors = form.validate().expect_err("missing password");
    assert_eq!(
        field_messages(&errors),
        vec![("password".to_string(), "password is required".to_string())]
    );
}

#[test]
fn edit_form_is_prefilled_from_row() {
    use crate::fixtures::{category, with_description};

    let mut row = with_description(category(3, "Divers"), "Petites dépenses");
    row.is_active = false;

    let draft = CategoryDraft::from_category(&row);
    assert_eq!(draft.name, "Divers");
    assert_eq!(draft.description.as_deref(), Some("Petites dépenses"));
    assert!(!draft.is_active);
    assert_eq!(draft.household_id, Some(HouseholdId(1)));

    let patch = CategoryPatch::from(draft);
    assert_eq!(patch.name.as_deref(), Some("Divers"));
    assert_eq!(patch.is_active, Some(false));
}
