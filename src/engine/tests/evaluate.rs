use super::*;
use yare::parameterized;

#[test]
fn ownership_permits_the_author() {
    let engine = engine_from_doc(TEST_POLICY_DOC);
    let decision = engine.evaluate(&edit_request(7, post(7, "draft"))).unwrap();
    assert_permit(&decision);
}

#[test]
fn non_author_falls_to_default_deny() {
    let engine = engine_from_doc(TEST_POLICY_DOC);
    let decision = engine.evaluate(&edit_request(8, post(7, "draft"))).unwrap();
    assert_deny_with(&decision, DecisionCode::NoApplicablePolicy);
}

#[test]
fn deny_overrides_a_permit() {
    let engine = engine_from_doc(TEST_POLICY_DOC);
    let decision = engine.evaluate(&edit_request(7, locked_post(7))).unwrap();
    assert_deny_with(&decision, DecisionCode::DeniedByPolicy);
    assert_eq!(
        decision.message.as_deref(),
        Some("denied by policy 'deny-if-locked': locked posts are read-only")
    );
}

#[test]
fn undeclared_action_is_default_deny() {
    let engine = engine_from_doc(TEST_POLICY_DOC);
    let request = Request::new(
        "publish-post",
        PolicyContext::new(user(7)).with_subject(post(7, "draft")),
    );
    let decision = engine.evaluate(&request).unwrap();
    assert_deny_with(&decision, DecisionCode::NoApplicablePolicy);
}

#[test]
fn missing_subject_attribute_is_indeterminate_deny() {
    let engine = engine_from_doc(TEST_POLICY_DOC);
    let subject = attrs([
        ("category", AttrValue::from("post")),
        ("authorId", AttrValue::Int(7)),
        // no "status" attribute
    ]);
    let decision = engine.evaluate(&edit_request(7, subject)).unwrap();
    assert_deny_with(&decision, DecisionCode::Indeterminate);
}

#[test]
fn mixed_type_comparison_is_indeterminate_deny() {
    let engine = engine_from_doc(TEST_POLICY_DOC);
    let subject = attrs([
        ("category", AttrValue::from("post")),
        ("authorId", AttrValue::from("7")),
        ("status", AttrValue::from("draft")),
    ]);
    let decision = engine.evaluate(&edit_request(7, subject)).unwrap();
    assert_deny_with(&decision, DecisionCode::Indeterminate);
}

#[parameterized(
    inside_hours = { 10, true },
    at_opening = { 9, true },
    after_hours = { 22, false },
)]
fn environment_window_gates_the_permit(hour: i64, allowed: bool) {
    let engine = engine_from_doc(TEST_POLICY_DOC);
    let request = Request::new(
        "read-archive",
        PolicyContext::new(user(7)).with_env("hour", hour),
    );
    let decision = engine.evaluate(&request).unwrap();
    if allowed {
        assert_permit(&decision);
    } else {
        assert_deny_with(&decision, DecisionCode::NoApplicablePolicy);
    }
}

#[test]
fn absent_environment_key_is_indeterminate_deny() {
    let engine = engine_from_doc(TEST_POLICY_DOC);
    let request = Request::new("read-archive", PolicyContext::new(user(7)));
    let decision = engine.evaluate(&request).unwrap();
    assert_deny_with(&decision, DecisionCode::Indeterminate);
}

#[test]
fn decisions_are_deterministic_and_side_effect_free() {
    let engine = engine_from_doc(TEST_POLICY_DOC);
    let request = edit_request(7, post(7, "draft"));

    let first = engine.evaluate(&request).unwrap();
    let second = engine.evaluate(&request).unwrap();
    assert_eq!(first, second);

    // the context still resolves the same values afterwards
    assert_eq!(
        request.context.subjects()[0].attribute("status"),
        Some(AttrValue::from("draft"))
    );
    assert_eq!(
        request.context.actor().attribute("id"),
        Some(AttrValue::Int(7))
    );
}

#[test]
fn empty_declared_actors_match_any_category() {
    let engine = engine_from_policies(vec![permit_policy("open-read", "read-post", "", "")]);
    let actor = attrs([("category", AttrValue::from("service"))]);
    let decision = engine
        .evaluate(&Request::new("read-post", PolicyContext::new(actor)))
        .unwrap();
    assert_permit(&decision);
}

#[test]
fn empty_policy_set_denies_everything() {
    let engine = engine_from_policies(Vec::new());
    let decision = engine
        .evaluate(&Request::new("edit-post", PolicyContext::new(user(7))))
        .unwrap();
    assert_deny_with(&decision, DecisionCode::NoApplicablePolicy);
}

#[test]
fn permit_requires_every_subject_to_match() {
    let engine = engine_from_doc(TEST_POLICY_DOC);

    let own_both = Request::new(
        "edit-post",
        PolicyContext::new(user(7))
            .with_subject(post(7, "draft"))
            .with_subject(post(7, "review")),
    );
    assert_permit(&engine.evaluate(&own_both).unwrap());

    let own_one = Request::new(
        "edit-post",
        PolicyContext::new(user(7))
            .with_subject(post(7, "draft"))
            .with_subject(post(8, "draft")),
    );
    assert_deny_with(
        &engine.evaluate(&own_one).unwrap(),
        DecisionCode::NoApplicablePolicy,
    );
}

#[test]
fn deny_applies_when_any_subject_matches() {
    let engine = engine_from_doc(TEST_POLICY_DOC);
    let request = Request::new(
        "edit-post",
        PolicyContext::new(user(7))
            .with_subject(post(7, "draft"))
            .with_subject(locked_post(7)),
    );
    let decision = engine.evaluate(&request).unwrap();
    assert_deny_with(&decision, DecisionCode::DeniedByPolicy);
}

#[test]
fn declared_subjects_require_a_subject_in_the_request() {
    // both edit-post policies declare subjects = ["post"]; a request with
    // no subjects never reaches them
    let engine = engine_from_doc(TEST_POLICY_DOC);
    let request = Request::new("edit-post", PolicyContext::new(user(7)));
    let decision = engine.evaluate(&request).unwrap();
    assert_deny_with(&decision, DecisionCode::NoApplicablePolicy);
}

#[test]
fn subject_reference_without_subjects_is_indeterminate() {
    let doc = r#"{
        "policies": [
            { "name": "subject-bound", "effect": "permit",
              "actions": ["inspect"],
              "rules": { "condition": "AND", "expressions": [
                  { "operator": "truthy", "subject_attribute": "visible" }
              ] } }
        ]
    }"#;
    let engine = engine_from_doc(doc);
    let request = Request::new("inspect", PolicyContext::new(user(7)));
    let decision = engine.evaluate(&request).unwrap();
    assert_deny_with(&decision, DecisionCode::Indeterminate);
}

#[test]
fn empty_action_is_rejected_as_misuse() {
    let engine = engine_from_doc(TEST_POLICY_DOC);
    let request = Request::new("", PolicyContext::new(user(7)));
    assert!(matches!(
        engine.evaluate(&request),
        Err(PolicyError::InvalidRequest(_))
    ));
}

#[test]
fn per_policy_outcomes_are_exposed() {
    let engine = engine_from_doc(TEST_POLICY_DOC);
    let edit = engine.policy("edit-post").unwrap();
    let deny = engine.policy("deny-if-locked").unwrap();

    let own = PolicyContext::new(user(7)).with_subject(post(7, "draft"));
    assert_eq!(
        engine.outcome_for(&edit, &own).unwrap(),
        PolicyOutcome::Permit
    );

    let other = PolicyContext::new(user(8)).with_subject(post(7, "draft"));
    assert_eq!(
        engine.outcome_for(&edit, &other).unwrap(),
        PolicyOutcome::NotApplicable
    );

    let locked = PolicyContext::new(user(7)).with_subject(locked_post(7));
    assert_eq!(
        engine.outcome_for(&deny, &locked).unwrap(),
        PolicyOutcome::Deny
    );

    let bare_subject = attrs([("category", AttrValue::from("post"))]);
    let missing = PolicyContext::new(user(7)).with_subject(bare_subject);
    assert_eq!(
        engine.outcome_for(&deny, &missing).unwrap(),
        PolicyOutcome::Indeterminate
    );
}

#[test]
fn listing_exposes_the_current_snapshot() {
    let engine = engine_from_doc(TEST_POLICY_DOC);
    let names: Vec<String> = engine
        .policies()
        .iter()
        .map(|policy| policy.name.clone())
        .collect();
    assert_eq!(names, ["deny-if-locked", "edit-post", "office-hours"]);

    let policy = engine.policy("edit-post").unwrap();
    assert!(policy.has_actor("user"));
    assert!(engine.policy("missing").is_none());
}
