//! Built-in assessment templates.
//!
//! Used as the starting point for a new job and as the fallback when a
//! persisted blob is absent or corrupt.

use crate::model::assessment::{
    Assessment, ConditionOperator, Conditional, Question, QuestionKind, Section, ValidationRule,
};
use std::sync::Arc;

/// Title of the sample template.
pub const SAMPLE_TITLE: &str = "Frontend Developer Assessment";

/// Builds the sample assessment for `job_id`.
///
/// Every call produces fresh ids. The template exercises every question type,
/// a numeric range, a text length rule, and one conditional question.
pub fn sample_assessment(job_id: &str) -> Assessment {
    let mut assessment = Assessment::new(job_id, SAMPLE_TITLE);
    assessment.description =
        "Screening questions for frontend engineering candidates.".to_string();

    let mut experience = Question::new(
        QuestionKind::Numeric {
            validation: Some(ValidationRule::range(Some(0.0), Some(50.0))),
        },
        0,
    );
    experience.title = "How many years of professional experience do you have?".to_string();
    experience.required = true;
    experience.placeholder = Some("Enter a number...".to_string());

    let mut framework = Question::new(
        QuestionKind::SingleChoice {
            options: vec![
                "React".to_string(),
                "Vue".to_string(),
                "Angular".to_string(),
                "Other".to_string(),
            ],
        },
        1,
    );
    framework.title = "Which framework do you use most?".to_string();
    framework.required = true;

    let mut other_framework = Question::new(QuestionKind::ShortText { validation: None }, 2);
    other_framework.title = "Which other framework?".to_string();
    other_framework.required = true;
    other_framework.conditional = Some(Conditional::new(
        framework.id.clone(),
        ConditionOperator::Equals,
        "Other",
    ));

    let mut background = Section::new(0);
    background.title = "Background".to_string();
    background.description = Some("Tell us about your experience.".to_string());
    background.questions = vec![
        Arc::new(experience),
        Arc::new(framework),
        Arc::new(other_framework),
    ];

    let mut skills = Question::new(
        QuestionKind::MultiChoice {
            options: vec![
                "TypeScript".to_string(),
                "CSS".to_string(),
                "Testing".to_string(),
                "Accessibility".to_string(),
            ],
        },
        0,
    );
    skills.title = "Which skills are you comfortable with?".to_string();

    let mut project = Question::new(
        QuestionKind::LongText {
            validation: Some(ValidationRule::length(Some(50), Some(1000))),
        },
        1,
    );
    project.title = "Describe a project you are proud of.".to_string();
    project.placeholder = Some("Enter your detailed answer...".to_string());

    let mut portfolio = Question::new(QuestionKind::FileUpload, 2);
    portfolio.title = "Upload your portfolio".to_string();

    let mut experience_section = Section::new(1);
    experience_section.title = "Skills".to_string();
    experience_section.questions = vec![Arc::new(skills), Arc::new(project), Arc::new(portfolio)];

    assessment.sections = vec![Arc::new(background), Arc::new(experience_section)];
    assessment
}
