//! §4.12 validator: confidence via lexical overlap with sources, generic-
//! answer and citation-leakage detection, contradiction heuristic.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use hr_rag_core::Document;

pub struct ValidationResult {
    pub confidence: f32,
    pub is_generic: bool,
    pub has_citations: bool,
    pub contradicts_sources: bool,
    pub validation_passed: bool,
}

static WORD4: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w{4,}\b").unwrap());
static WORD5: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w{5,}\b").unwrap());

static GENERIC_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"i\s+don't\s+know",
        r"i\s+cannot\s+answer",
        r"no\s+information",
        r"not\s+enough\s+information",
        r"unable\s+to\s+answer",
        r"i\s+don't\s+have.*information",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static CITATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\[\d+\]",
        r"\(page\s+\d+\)",
        r"\(pages\s+\d+-\d+\)",
        r"according\s+to",
        r"as\s+stated\s+in",
        r"the\s+document\s+mentions",
        r"page\s+\d+\s+states",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static NEGATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(not|no|never|does not|cannot|impossible)\b").unwrap());

fn word_set<'a>(re: &Regex, text: &'a str) -> HashSet<String> {
    re.find_iter(text).map(|m| m.as_str().to_lowercase()).collect()
}

fn overlap_ratio(response_words: &HashSet<String>, source_words: &HashSet<String>) -> f32 {
    if response_words.is_empty() {
        return 0.0;
    }
    let overlap = response_words.intersection(source_words).count();
    overlap as f32 / response_words.len() as f32
}

fn calculate_document_overlap_confidence(response: &str, documents: &[Document]) -> f32 {
    if documents.is_empty() {
        return 0.5;
    }

    let response_words = word_set(&WORD4, &response.to_lowercase());
    if response_words.is_empty() {
        return 0.0;
    }

    let source_text: String = documents.iter().map(|d| d.text.as_str()).collect::<Vec<_>>().join(" ");
    let source_words = word_set(&WORD4, &source_text.to_lowercase());

    let ratio = overlap_ratio(&response_words, &source_words);
    let confidence = (ratio / 0.3).min(1.0);
    (confidence * 100.0).round() / 100.0
}

fn is_generic(response: &str) -> bool {
    let lowered = response.to_lowercase();
    GENERIC_PATTERNS.iter().any(|re| re.is_match(&lowered))
}

fn has_citations(response: &str) -> bool {
    let lowered = response.to_lowercase();
    CITATION_PATTERNS.iter().any(|re| re.is_match(&lowered))
}

fn detect_contradictions(response: &str, documents: &[Document]) -> bool {
    if !NEGATION.is_match(&response.to_lowercase()) {
        return false;
    }
    if documents.is_empty() {
        return false;
    }

    let response_words = word_set(&WORD5, &response.to_lowercase());
    let source_text: String = documents.iter().map(|d| d.text.as_str()).collect::<Vec<_>>().join(" ");
    let source_words = word_set(&WORD5, &source_text.to_lowercase());

    let ratio = overlap_ratio(&response_words, &source_words);
    ratio < 0.1
}

/// §4.12: responses under 10 characters short-circuit to zero confidence,
/// generic, and failed validation.
pub fn validate_generation(response: &str, documents: &[Document]) -> ValidationResult {
    let trimmed = response.trim();
    if trimmed.chars().count() < 10 {
        return ValidationResult {
            confidence: 0.0,
            is_generic: true,
            has_citations: false,
            contradicts_sources: false,
            validation_passed: false,
        };
    }

    let confidence = calculate_document_overlap_confidence(trimmed, documents);
    let is_generic = is_generic(trimmed);
    let has_citations = has_citations(trimmed);
    let contradicts_sources = detect_contradictions(trimmed, documents);

    let validation_passed =
        confidence > 0.3 && !contradicts_sources && (has_citations || documents.is_empty());

    ValidationResult { confidence, is_generic, has_citations, contradicts_sources, validation_passed }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document::new("d1", text, 1.0)
    }

    #[test]
    fn short_response_short_circuits() {
        let result = validate_generation("short", &[]);
        assert_eq!(result.confidence, 0.0);
        assert!(result.is_generic);
        assert!(!result.validation_passed);
    }

    #[test]
    fn no_documents_gives_half_confidence() {
        let result = validate_generation("Employees receive twenty one days of annual leave.", &[]);
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn high_overlap_response_is_confident() {
        let documents = vec![doc("Employees receive twenty one days of paid annual leave every year.")];
        let result =
            validate_generation("Employees receive twenty one days of paid annual leave.", &documents);
        assert!(result.confidence > 0.3);
    }

    #[test]
    fn generic_refusal_is_detected() {
        assert!(is_generic("I don't know the answer to that."));
        assert!(is_generic("There is not enough information to answer."));
    }

    #[test]
    fn citation_markers_are_detected() {
        assert!(has_citations("As stated in the handbook, leave accrues monthly."));
        assert!(has_citations("See [1] for details."));
    }

    #[test]
    fn contradiction_requires_negation_and_low_overlap() {
        let documents = vec![doc("The annual leave allowance is twenty one days per year.")];
        let response = "There is never any leave allowance available at this company.";
        assert!(detect_contradictions(response, &documents));
    }

    #[test]
    fn no_negation_means_no_contradiction() {
        let documents = vec![doc("The annual leave allowance is twenty one days per year.")];
        let response = "The annual leave allowance is twenty one days per year.";
        assert!(!detect_contradictions(response, &documents));
    }
}
