//! Intent classification and language detection: regex and closed-set
//! lookups only, no generator call on this path.

use once_cell::sync::Lazy;
use regex::Regex;

use hr_rag_core::{Intent, Language};

static GREETING_TOKENS: &[&str] = &[
    "hi", "hello", "hey", "salom", "assalomu", "assalomu alaykum", "privet", "zdravstvuyte",
    "здравствуйте", "привет",
];
static THANKS_TOKENS: &[&str] =
    &["thanks", "thank you", "rahmat", "tashakkur", "spasibo", "спасибо", "благодарю"];

fn is_emoji_only(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && !trimmed.chars().any(|c| c.is_alphanumeric())
}

fn normalize(text: &str) -> String {
    text.trim().trim_end_matches(|c: char| c.is_ascii_punctuation()).to_lowercase()
}

/// §4.1: normalize, then exact-set match, then a short-message heuristic.
pub fn classify_intent(text: &str) -> Intent {
    let normalized = normalize(text);

    if normalized.is_empty() || is_emoji_only(text) {
        return Intent::Greeting;
    }
    if GREETING_TOKENS.contains(&normalized.as_str()) {
        return Intent::Greeting;
    }
    if THANKS_TOKENS.contains(&normalized.as_str()) {
        return Intent::Thanks;
    }

    let words: Vec<&str> = normalized.split_whitespace().collect();
    if words.len() <= 3 && !normalized.contains(',') && !normalized.contains('?') {
        if let Some(first) = words.first() {
            if GREETING_TOKENS.contains(first) {
                return Intent::Greeting;
            }
            if THANKS_TOKENS.contains(first) {
                return Intent::Thanks;
            }
        }
    }

    Intent::HrQuery
}

static CYRILLIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[Ѐ-ӿ]").unwrap());
static UZBEK_LETTERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ўқғҳЎҚҒҲ]").unwrap());
static LATIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]").unwrap());

/// Exact-set lookup first (via [`classify_intent`]'s token lists doubling as
/// language hints is intentionally not done here — greetings carry their
/// own language signal in the response table), then a character-class
/// heuristic for texts under 10 characters, else falls back to `unknown`
/// (the statistical detector a full deployment would wire in is out of
/// scope for this core).
pub fn detect_language(text: &str) -> Language {
    let trimmed = text.trim();
    if trimmed.chars().count() < 10 {
        if UZBEK_LETTERS.is_match(trimmed) {
            return Language::Uz;
        }
        if CYRILLIC.is_match(trimmed) {
            return Language::Ru;
        }
        if LATIN.is_match(trimmed) {
            return detect_latin_language(trimmed);
        }
        return Language::Unknown;
    }

    if CYRILLIC.is_match(trimmed) {
        Language::Ru
    } else if UZBEK_LETTERS.is_match(trimmed) {
        Language::Uz
    } else {
        detect_latin_language(trimmed)
    }
}

/// Disambiguates Latin-script text between English and Uzbek; a Turkish
/// detector output would be confusable with Uzbek (shared Latin alphabet,
/// similar function words) and is folded into `Uz` per spec.
fn detect_latin_language(text: &str) -> Language {
    let lowered = text.to_lowercase();
    const UZBEK_WORDS: &[&str] =
        &["va", "bilan", "uchun", "nima", "qanday", "bo'yicha", "siyosat", "ish", "kun"];
    const UZBEK_GREETING_WORDS: &[&str] = &["salom", "assalomu", "rahmat", "tashakkur"];
    let is_uzbek = lowered
        .split_whitespace()
        .any(|t| UZBEK_WORDS.contains(&t) || UZBEK_GREETING_WORDS.contains(&t));
    if is_uzbek {
        Language::Uz
    } else {
        Language::En
    }
}

/// Canned multilingual response for the greeting short-circuit (no
/// retrieval, rerank, or generator call).
pub fn greeting_response(language: Language) -> &'static str {
    match language {
        Language::Uz => "Assalomu alaykum! HR siyosatlari bo'yicha qanday yordam bera olaman?",
        Language::Ru => "Здравствуйте! Чем я могу помочь вам по вопросам кадровой политики?",
        _ => "Hello! How can I help you with HR policy questions?",
    }
}

pub fn thanks_response(language: Language) -> &'static str {
    match language {
        Language::Uz => "Arzimaydi! Yana savollaringiz bo'lsa, bemalol so'rang.",
        Language::Ru => "Пожалуйста! Обращайтесь, если будут ещё вопросы.",
        _ => "You're welcome! Let me know if you have any other questions.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salom_is_greeting_in_uzbek() {
        assert_eq!(classify_intent("salom"), Intent::Greeting);
        assert_eq!(detect_language("salom"), Language::Uz);
    }

    #[test]
    fn empty_input_is_greeting() {
        assert_eq!(classify_intent(""), Intent::Greeting);
    }

    #[test]
    fn hr_question_is_not_greeting() {
        assert_eq!(classify_intent("What is the annual leave policy?"), Intent::HrQuery);
    }

    #[test]
    fn thanks_token_is_recognized() {
        assert_eq!(classify_intent("Rahmat!"), Intent::Thanks);
    }

    #[test]
    fn russian_cyrillic_detected() {
        assert_eq!(detect_language("Какая политика по отпускам в компании?"), Language::Ru);
    }

    #[test]
    fn long_question_with_comma_is_not_short_circuited() {
        assert_eq!(classify_intent("Hi, what is the leave policy for new employees?"), Intent::HrQuery);
    }
}
