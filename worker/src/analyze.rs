//! Extraction collaborators and result post-processing.
//!
//! Layout extraction, entity labeling, and redaction are model-backed
//! collaborators behind narrow async traits; the worker orchestrates them
//! without looking inside. What lives here concretely is the plain
//! post-processing applied to whatever the collaborators return:
//! deduplication, sensitive-keyword filtering, heading normalization, and
//! the feedback message for thin resumes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Entity labels requested from the entity extractor.
pub const ENTITY_LABELS: &[&str] = &["Skill", "Education", "Experience"];

/// Terms that must never surface in extracted output.
const SENSITIVE_KEYWORDS: &[&str] = &["male", "female", "gender", "race", "ethnicity", "religion"];

/// Canonical section names with their common spellings.
const MAJOR_HEADINGS: &[(&str, &[&str])] = &[
    (
        "Skills",
        &["skill", "skills", "technical skills", "tech stack", "competencies"],
    ),
    (
        "Education",
        &["education", "academic", "qualification", "qualifications", "academics"],
    ),
    (
        "Experience",
        &[
            "experience",
            "work experience",
            "employment",
            "career history",
            "professional experience",
        ],
    ),
];

/// One section of a laid-out document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub text: String,
}

/// A labeled span returned by the entity extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
    pub score: Option<f32>,
}

/// Splits a document into heading-labeled sections.
#[async_trait]
pub trait LayoutExtractor: Send + Sync {
    async fn extract(&self, document: &[u8]) -> Result<Vec<Section>, anyhow::Error>;
}

/// Labels spans of text with a requested label set.
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    async fn extract(&self, text: &str, labels: &[&str]) -> Result<Vec<Entity>, anyhow::Error>;
}

/// Removes personally identifying text and imagery from a document.
#[async_trait]
pub trait RedactionEngine: Send + Sync {
    async fn redact(&self, document: Vec<u8>) -> Result<Vec<u8>, anyhow::Error>;
}

/// Map a raw heading onto its canonical section name.
///
/// Unrecognized headings keep their own (title-cased) name; an empty
/// heading becomes `Other`.
pub fn normalize_heading(heading: &str) -> String {
    let lowered = heading.trim().to_lowercase();
    if lowered.is_empty() {
        return "Other".to_string();
    }

    for (canon, alternatives) in MAJOR_HEADINGS {
        if alternatives
            .iter()
            .any(|alt| lowered == *alt || lowered.starts_with(alt))
        {
            return (*canon).to_string();
        }
    }

    title_case(&lowered)
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Case-insensitive dedup preserving first-seen order and spelling.
pub fn uniq_casefold(items: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for item in items {
        let trimmed = item.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            out.push(trimmed.to_string());
        }
    }

    out
}

/// Drop entries mentioning protected characteristics.
pub fn filter_sensitive(items: &[String]) -> Vec<String> {
    items
        .iter()
        .filter(|item| {
            let lowered = item.to_lowercase();
            !SENSITIVE_KEYWORDS
                .iter()
                .any(|keyword| lowered.contains(keyword))
        })
        .cloned()
        .collect()
}

/// Split labeled entities into the three extraction categories,
/// deduplicated per category.
pub fn categorize_entities(entities: &[Entity]) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut skills = Vec::new();
    let mut education = Vec::new();
    let mut experience = Vec::new();

    for entity in entities {
        match entity.label.to_lowercase().as_str() {
            "skill" => skills.push(entity.text.clone()),
            "education" => education.push(entity.text.clone()),
            "experience" => experience.push(entity.text.clone()),
            _ => {}
        }
    }

    (
        uniq_casefold(&skills),
        uniq_casefold(&education),
        uniq_casefold(&experience),
    )
}

/// Feedback naming the expected sections a resume is missing, or `None`
/// when all three are present.
pub fn build_feedback(
    skills: &[String],
    education: &[String],
    experience: &[String],
) -> Option<String> {
    let mut missing = Vec::new();
    if skills.is_empty() {
        missing.push("skills");
    }
    if education.is_empty() {
        missing.push("education");
    }
    if experience.is_empty() {
        missing.push("experience");
    }

    match missing.as_slice() {
        [] => None,
        [only] => Some(format!(
            "We could not detect any {} in your resume. Consider adding more detail.",
            only
        )),
        [first, second] => Some(format!(
            "We could not detect {} or {} in your resume. Consider expanding these sections.",
            first, second
        )),
        _ => Some(
            "We could not detect key resume sections (skills, education, experience). \
             Please review and update your resume."
                .to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_heading_canonical_sections() {
        assert_eq!(normalize_heading("Technical Skills"), "Skills");
        assert_eq!(normalize_heading("skills"), "Skills");
        assert_eq!(normalize_heading("WORK EXPERIENCE"), "Experience");
        assert_eq!(normalize_heading("Academic Background"), "Education");
        assert_eq!(normalize_heading("qualifications"), "Education");
    }

    #[test]
    fn test_normalize_heading_unknown_and_empty() {
        assert_eq!(normalize_heading("Hobbies"), "Hobbies");
        assert_eq!(normalize_heading("side projects"), "Side Projects");
        assert_eq!(normalize_heading(""), "Other");
        assert_eq!(normalize_heading("   "), "Other");
    }

    #[test]
    fn test_uniq_casefold() {
        let items = strings(&["Rust", "rust ", "", "Go", "RUST", "go"]);
        assert_eq!(uniq_casefold(&items), strings(&["Rust", "Go"]));
    }

    #[test]
    fn test_filter_sensitive() {
        let items = strings(&["Rust", "Gender Studies", "Comparative Religion", "Databases"]);
        assert_eq!(filter_sensitive(&items), strings(&["Rust", "Databases"]));
    }

    #[test]
    fn test_categorize_entities() {
        let entities = vec![
            Entity {
                text: "Rust".to_string(),
                label: "Skill".to_string(),
                score: Some(0.93),
            },
            Entity {
                text: "rust".to_string(),
                label: "skill".to_string(),
                score: None,
            },
            Entity {
                text: "BSc Computer Science".to_string(),
                label: "Education".to_string(),
                score: Some(0.88),
            },
            Entity {
                text: "ACME Corp".to_string(),
                label: "Experience".to_string(),
                score: Some(0.74),
            },
            Entity {
                text: "Kuala Lumpur".to_string(),
                label: "Location".to_string(),
                score: Some(0.91),
            },
        ];

        let (skills, education, experience) = categorize_entities(&entities);
        assert_eq!(skills, strings(&["Rust"]));
        assert_eq!(education, strings(&["BSc Computer Science"]));
        assert_eq!(experience, strings(&["ACME Corp"]));
    }

    #[test]
    fn test_build_feedback_complete_resume() {
        let some = strings(&["x"]);
        assert_eq!(build_feedback(&some, &some, &some), None);
    }

    #[test]
    fn test_build_feedback_one_missing() {
        let some = strings(&["x"]);
        let feedback = build_feedback(&[], &some, &some).unwrap();
        assert_eq!(
            feedback,
            "We could not detect any skills in your resume. Consider adding more detail."
        );
    }

    #[test]
    fn test_build_feedback_two_missing() {
        let some = strings(&["x"]);
        let feedback = build_feedback(&[], &some, &[]).unwrap();
        assert_eq!(
            feedback,
            "We could not detect skills or experience in your resume. \
             Consider expanding these sections."
        );
    }

    #[test]
    fn test_build_feedback_all_missing() {
        let feedback = build_feedback(&[], &[], &[]).unwrap();
        assert!(feedback.contains("key resume sections"));
    }
}
