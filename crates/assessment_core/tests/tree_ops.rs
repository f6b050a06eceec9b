use assessment_core::service::integrity::check_invariants;
use assessment_core::service::tree_ops::{
    add_question, add_section, delete_question, delete_section, duplicate_question,
    duplicate_section, reorder, update_question, QuestionPatch,
};
use assessment_core::{
    sample_assessment, Assessment, ConditionOperator, Conditional, QuestionType,
};
use std::collections::HashSet;

fn section_ids(assessment: &Assessment) -> Vec<String> {
    assessment
        .sections
        .iter()
        .map(|section| section.id.clone())
        .collect()
}

fn all_ids(assessment: &Assessment) -> HashSet<String> {
    assessment
        .sections
        .iter()
        .map(|section| section.id.clone())
        .chain(assessment.questions().map(|question| question.id.clone()))
        .collect()
}

fn three_sections() -> Assessment {
    let empty = Assessment::new("job-1", "Ordering");
    add_section(&add_section(&add_section(&empty)))
}

#[test]
fn reorder_moves_last_section_to_front() {
    let assessment = three_sections();
    let ids = section_ids(&assessment);

    let next = reorder(&assessment, &ids[2], &ids[0]);

    assert_eq!(
        section_ids(&next),
        vec![ids[2].clone(), ids[0].clone(), ids[1].clone()]
    );
    let orders = next
        .sections
        .iter()
        .map(|section| section.order)
        .collect::<Vec<_>>();
    assert_eq!(orders, vec![0, 1, 2]);
    check_invariants(&next).unwrap();
}

#[test]
fn reorder_moves_question_down_within_section() {
    let base = three_sections();
    let section_id = base.sections[0].id.clone();
    let mut assessment = base;
    let mut question_ids = Vec::new();
    for question_type in [
        QuestionType::ShortText,
        QuestionType::Numeric,
        QuestionType::FileUpload,
    ] {
        let added = add_question(&assessment, &section_id, question_type);
        question_ids.push(added.question_id.unwrap());
        assessment = added.assessment;
    }

    let next = reorder(&assessment, &question_ids[0], &question_ids[2]);
    let order = next.sections[0]
        .questions
        .iter()
        .map(|question| question.id.clone())
        .collect::<Vec<_>>();
    assert_eq!(
        order,
        vec![
            question_ids[1].clone(),
            question_ids[2].clone(),
            question_ids[0].clone()
        ]
    );
    check_invariants(&next).unwrap();
}

#[test]
fn reorder_never_moves_questions_across_sections() {
    let base = three_sections();
    let first = add_question(&base, &base.sections[0].id, QuestionType::ShortText);
    let second = add_question(
        &first.assessment,
        &base.sections[1].id,
        QuestionType::ShortText,
    );

    let next = reorder(
        &second.assessment,
        first.question_id.as_deref().unwrap(),
        second.question_id.as_deref().unwrap(),
    );
    assert_eq!(next, second.assessment);
}

#[test]
fn add_question_without_sections_creates_default_section() {
    let empty = Assessment::new("job-1", "Empty");

    let added = add_question(&empty, "ignored", QuestionType::SingleChoice);

    assert_eq!(added.assessment.sections.len(), 1);
    let question = &added.assessment.sections[0].questions[0];
    assert_eq!(Some(&question.id), added.question_id.as_ref());
    assert_eq!(
        question.kind.options().unwrap(),
        ["Option 1", "Option 2", "Option 3"]
    );
    assert!(empty.sections.is_empty());
}

#[test]
fn add_question_into_missing_section_is_a_no_op() {
    let assessment = three_sections();
    let added = add_question(&assessment, "section-missing", QuestionType::Numeric);
    assert_eq!(added.assessment, assessment);
    assert_eq!(added.question_id, None);
}

#[test]
fn delete_leaves_no_dangling_ids() {
    let assessment = sample_assessment("job-1");
    let background = assessment.sections[0].clone();
    let gate_id = background.questions[1].id.clone();
    let follow_up_id = background.questions[2].id.clone();

    let removal = delete_question(&assessment, &background.id, &gate_id);

    assert_eq!(removal.removed_question_ids, vec![gate_id.clone()]);
    assert!(removal.assessment.question(&gate_id).is_none());
    assert!(removal
        .assessment
        .question(&follow_up_id)
        .unwrap()
        .conditional
        .is_none());
    check_invariants(&removal.assessment).unwrap();

    let removal = delete_section(&removal.assessment, &background.id);
    assert_eq!(removal.removed_question_ids.len(), 2);
    for id in &removal.removed_question_ids {
        assert!(removal.assessment.question(id).is_none());
    }
    assert_eq!(removal.assessment.sections[0].order, 0);
    check_invariants(&removal.assessment).unwrap();
}

#[test]
fn duplicate_section_ids_are_disjoint_and_conditionals_follow_copy() {
    let assessment = sample_assessment("job-1");
    let source = assessment.sections[0].clone();

    let next = duplicate_section(&assessment, &source.id);

    assert_eq!(next.sections.len(), 3);
    let copy = &next.sections[2];
    assert_eq!(copy.order, 2);
    assert_eq!(copy.title, format!("{} (Copy)", source.title));
    let source_ids = source
        .questions
        .iter()
        .map(|question| question.id.clone())
        .collect::<HashSet<_>>();
    for question in &copy.questions {
        assert!(!source_ids.contains(&question.id));
    }
    assert_eq!(
        copy.questions[2].conditional.as_ref().unwrap().depends_on,
        copy.questions[1].id
    );
    assert_eq!(all_ids(&next).len(), all_ids(&assessment).len() + 4);
    check_invariants(&next).unwrap();
}

#[test]
fn duplicate_question_keeps_section_and_fresh_id() {
    let assessment = sample_assessment("job-1");
    let source = assessment.sections[1].questions[0].clone();

    let added = duplicate_question(&assessment, &source.id);
    let copy_id = added.question_id.unwrap();

    let section = added.assessment.section_of(&copy_id).unwrap();
    assert_eq!(section.id, assessment.sections[1].id);
    assert_ne!(copy_id, source.id);
    check_invariants(&added.assessment).unwrap();
}

#[test]
fn cyclic_conditional_update_is_rejected() {
    let assessment = sample_assessment("job-1");
    let gate_id = assessment.sections[0].questions[1].id.clone();
    let follow_up_id = assessment.sections[0].questions[2].id.clone();

    let patch = QuestionPatch {
        title: Some("Renamed".to_string()),
        conditional: Some(Some(Conditional::new(
            follow_up_id.clone(),
            ConditionOperator::Equals,
            "x",
        ))),
        ..QuestionPatch::default()
    };
    let next = update_question(&assessment, &gate_id, patch);

    assert_eq!(next, assessment);
}

#[test]
fn patch_decodes_explicit_null_as_clear() {
    let assessment = sample_assessment("job-1");
    let follow_up_id = assessment.sections[0].questions[2].id.clone();

    let patch: QuestionPatch =
        serde_json::from_value(serde_json::json!({ "conditional": null })).unwrap();
    assert_eq!(patch.conditional, Some(None));

    let next = update_question(&assessment, &follow_up_id, patch);
    assert!(next.question(&follow_up_id).unwrap().conditional.is_none());
    assert!(next.updated_at >= assessment.updated_at);
}

#[test]
fn long_edit_sequence_preserves_invariants() {
    let mut assessment = sample_assessment("job-1");
    let mut expected_sections = assessment.sections.len();

    for step in 0..80 {
        let ids = section_ids(&assessment);
        let target = &ids[step % ids.len()];
        let question_ids = assessment
            .section(target)
            .map(|section| {
                section
                    .questions
                    .iter()
                    .map(|question| question.id.clone())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        assessment = match step % 8 {
            0 => {
                expected_sections += 1;
                add_section(&assessment)
            }
            1 => {
                let question_type = QuestionType::ALL[step % QuestionType::ALL.len()];
                add_question(&assessment, target, question_type).assessment
            }
            2 => match question_ids.first() {
                Some(question_id) => duplicate_question(&assessment, question_id).assessment,
                None => assessment,
            },
            3 => match question_ids.last() {
                Some(question_id) => delete_question(&assessment, target, question_id).assessment,
                None => assessment,
            },
            4 => reorder(&assessment, target, &ids[0]),
            5 => {
                expected_sections += 1;
                duplicate_section(&assessment, target)
            }
            6 if ids.len() > 1 => {
                expected_sections -= 1;
                delete_section(&assessment, target).assessment
            }
            6 => assessment,
            _ => match (question_ids.first(), question_ids.last()) {
                (Some(first), Some(last)) => reorder(&assessment, last, first),
                _ => assessment,
            },
        };

        check_invariants(&assessment).unwrap();
        assert_eq!(assessment.sections.len(), expected_sections, "step {step}");
    }

    assert!(expected_sections > 1);
}
