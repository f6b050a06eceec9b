use assessment_core::service::tree_ops::{
    add_question, add_section, update_question, QuestionPatch,
};
use assessment_core::{
    sample_assessment, validate_section, Assessment, ConditionOperator, Conditional,
    Navigation, PreviewSession, QuestionType, Responses, SessionStatus, ValidationError,
    ValidationRule,
};

/// One section with a required numeric question bounded to [0, 50].
fn experience_assessment() -> (Assessment, String) {
    let base = add_section(&Assessment::new("job-1", "Experience"));
    let section_id = base.sections[0].id.clone();
    let added = add_question(&base, &section_id, QuestionType::Numeric);
    let question_id = added.question_id.unwrap();
    let assessment = update_question(
        &added.assessment,
        &question_id,
        QuestionPatch {
            required: Some(true),
            validation: Some(Some(ValidationRule::range(Some(0.0), Some(50.0)))),
            ..QuestionPatch::default()
        },
    );
    (assessment, question_id)
}

#[test]
fn out_of_range_answer_blocks_then_valid_answer_submits() {
    let (assessment, question_id) = experience_assessment();
    let mut session = PreviewSession::new();
    session.enter_test_mode();

    session.answer(&question_id, "100");
    assert_eq!(session.go_next(&assessment), Navigation::Blocked);
    assert_eq!(
        session.error(&question_id),
        Some(&ValidationError::AboveMaximum { max: 50.0 })
    );
    assert_eq!(session.status(), SessionStatus::InProgress);

    session.answer(&question_id, "25");
    assert!(session.errors().is_empty());
    assert_eq!(session.go_next(&assessment), Navigation::Submitted);
    assert_eq!(session.status(), SessionStatus::Completed);
    assert_eq!(session.progress(&assessment), 1.0);
    let submission = session.submission().unwrap();
    assert_eq!(
        submission.get(&question_id).and_then(|value| value.as_text()),
        Some("25")
    );
}

#[test]
fn hidden_required_question_does_not_block() {
    let assessment = sample_assessment("job-1");
    let background = &assessment.sections[0];
    let experience_id = background.questions[0].id.clone();
    let framework_id = background.questions[1].id.clone();
    let other_id = background.questions[2].id.clone();

    let mut session = PreviewSession::new();
    session.answer(&experience_id, "4");
    session.answer(&framework_id, "React");
    assert_eq!(
        session.go_next(&assessment),
        Navigation::Moved { section_index: 1 }
    );

    session.go_previous(&assessment);
    session.answer(&framework_id, "Other");
    assert_eq!(session.go_next(&assessment), Navigation::Blocked);
    assert_eq!(session.error(&other_id), Some(&ValidationError::Required));
}

#[test]
fn equals_conditional_gates_validation() {
    let base = add_section(&Assessment::new("job-1", "Gate"));
    let section_id = base.sections[0].id.clone();
    let q1 = add_question(&base, &section_id, QuestionType::ShortText);
    let q1_id = q1.question_id.unwrap();
    let q2 = add_question(&q1.assessment, &section_id, QuestionType::ShortText);
    let q2_id = q2.question_id.unwrap();
    let assessment = update_question(
        &q2.assessment,
        &q2_id,
        QuestionPatch {
            required: Some(true),
            conditional: Some(Some(Conditional::new(
                q1_id.clone(),
                ConditionOperator::Equals,
                "yes",
            ))),
            ..QuestionPatch::default()
        },
    );
    let section = &assessment.sections[0];

    let mut responses = Responses::new();
    responses.insert(q1_id.as_str(), "no");
    assert!(validate_section(section, &responses).is_empty());

    responses.insert(q1_id.as_str(), "yes");
    let errors = validate_section(section, &responses);
    assert_eq!(errors.get(&q2_id), Some(&ValidationError::Required));
}

#[test]
fn session_follows_editor_snapshots() {
    let (assessment, _) = experience_assessment();
    let mut session = PreviewSession::new();
    assert_eq!(session.progress(&assessment), 0.0);

    let grown = add_section(&assessment);
    let added = add_question(&grown, &grown.sections[1].id, QuestionType::FileUpload);
    session.answer(added.question_id.as_deref().unwrap(), "cv.pdf");

    assert_eq!(session.progress(&added.assessment), 0.5);
    assert_eq!(session.progress(&assessment), 0.0);
}
