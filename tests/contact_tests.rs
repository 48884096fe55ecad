use treasury_page::contact::{ConsultationRequest, FormState};

#[test]
fn test_from_form_decodes_all_fields() {
    let req = ConsultationRequest::from_form(
        b"name=Jamie&email=jamie%40example.com&message=Help+me+automate+my+debt+schedule",
    );
    assert_eq!(req.name, "Jamie");
    assert_eq!(req.email, "jamie@example.com");
    assert_eq!(req.message, "Help me automate my debt schedule");
}

#[test]
fn test_from_form_accepts_missing_and_unknown_fields() {
    let req = ConsultationRequest::from_form(b"company=Acme&name=");
    assert_eq!(req, ConsultationRequest::default());

    let empty = ConsultationRequest::from_form(b"");
    assert_eq!(empty.name, "");
    assert_eq!(empty.email, "");
    assert_eq!(empty.message, "");
}

#[test]
fn test_from_form_is_lossy_not_strict() {
    let req = ConsultationRequest::from_form(b"name=%ZZ%E2%9C%93&email=not-an-email");
    assert_eq!(req.name, "%ZZ✓");
    assert_eq!(req.email, "not-an-email");
}

#[test]
fn test_from_form_last_value_wins() {
    let req = ConsultationRequest::from_form(b"name=first&name=second");
    assert_eq!(req.name, "second");
}

#[test]
fn test_acknowledgment_interpolates_name() {
    let req = ConsultationRequest {
        name: "Jamie".to_string(),
        email: "jamie@example.com".to_string(),
        message: "Help me automate my debt schedule".to_string(),
    };
    assert_eq!(
        req.acknowledgment(),
        "Thank you, Jamie! Your consultation request has been received and we will be in touch shortly."
    );
}

#[test]
fn test_acknowledgment_with_empty_and_unicode_names() {
    let empty = ConsultationRequest::default();
    assert!(empty.acknowledgment().starts_with("Thank you, ! Your consultation request"));

    let unicode = ConsultationRequest {
        name: "Zoë 山田".to_string(),
        ..Default::default()
    };
    assert!(unicode.acknowledgment().starts_with("Thank you, Zoë 山田! "));
}

#[test]
fn test_form_state_transitions() {
    let idle = FormState::default();
    assert_eq!(idle, FormState::Idle);
    assert!(!idle.is_submitted());
    assert_eq!(idle.acknowledgment(), None);
    assert!(idle.request().is_none());

    let submitted = FormState::submit(ConsultationRequest {
        name: "Jamie".to_string(),
        ..Default::default()
    });
    assert!(submitted.is_submitted());
    assert_eq!(submitted.request().unwrap().name, "Jamie");
    assert!(submitted.acknowledgment().unwrap().contains("Jamie"));
}
