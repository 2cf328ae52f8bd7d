//! Dynamic system-prompt composition for the query preparer and the
//! generator, built from detected language, query type, expertise level,
//! document types, and cross-language signal.

use hr_rag_core::{Document, ExpertiseLevel, Language, ResponseStyle};

pub const QUERY_PREPARER_SYSTEM_PROMPT: &str = r#"You rewrite HR policy questions for retrieval. Respond with a single JSON object only:
{"search_query": str, "search_queries": [str, ...], "step_back_query": str, "filters": {"language"?: str, "file_type"?: str, "section_header"?: str} | null}
search_queries holds 2-3 alternates; decompose multi-topic questions into sub-questions. step_back_query is a broader abstraction of the question. Do not add commentary outside the JSON object."#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Definition,
    Comparison,
    HowTo,
    List,
    Analytical,
    Factual,
}

/// Keyword match against the query text; falls back to `Factual`.
pub fn detect_query_type(query: &str) -> QueryType {
    let q = query.to_lowercase();
    if q.starts_with("what is") || q.contains("define") || q.contains("definition") {
        QueryType::Definition
    } else if q.contains("vs") || q.contains("versus") || q.contains("difference between")
        || q.contains("compare")
    {
        QueryType::Comparison
    } else if q.starts_with("how to") || q.starts_with("how do") || q.contains("steps to") {
        QueryType::HowTo
    } else if q.contains("list") || q.contains("what are the") || q.contains("types of") {
        QueryType::List
    } else if q.contains("why") || q.contains("analyze") || q.contains("impact of") {
        QueryType::Analytical
    } else {
        QueryType::Factual
    }
}

/// Fixed per-language, per-query-type instruction table.
pub fn query_type_instruction(language: Language, query_type: QueryType) -> &'static str {
    match (language, query_type) {
        (Language::Ru, QueryType::Definition) => "Дайте чёткое определение на основе документов.",
        (Language::Ru, QueryType::Comparison) => "Сравните указанные понятия на основе документов.",
        (Language::Ru, QueryType::HowTo) => "Опишите шаги в виде краткой последовательности.",
        (Language::Ru, QueryType::List) => "Перечислите пункты в сжатом виде.",
        (Language::Ru, QueryType::Analytical) => "Дайте краткий анализ на основе документов.",
        (Language::Ru, QueryType::Factual) => "Ответьте кратко и точно на основе документов.",
        (Language::Uz, QueryType::Definition) => "Hujjatlar asosida aniq ta'rif bering.",
        (Language::Uz, QueryType::Comparison) => "Hujjatlar asosida tushunchalarni solishtiring.",
        (Language::Uz, QueryType::HowTo) => "Qadamlarni qisqa tartibda tavsiflang.",
        (Language::Uz, QueryType::List) => "Bandlarni qisqa ro'yxat shaklida sanab bering.",
        (Language::Uz, QueryType::Analytical) => "Hujjatlar asosida qisqa tahlil bering.",
        (Language::Uz, QueryType::Factual) => "Hujjatlar asosida qisqa va aniq javob bering.",
        (_, QueryType::Definition) => "Provide a clear definition grounded in the documents.",
        (_, QueryType::Comparison) => "Compare the concepts using only the documents.",
        (_, QueryType::HowTo) => "Describe the steps as a brief sequence.",
        (_, QueryType::List) => "Enumerate the items concisely.",
        (_, QueryType::Analytical) => "Give a brief analysis grounded in the documents.",
        (_, QueryType::Factual) => "Answer briefly and precisely using the documents.",
    }
}

fn base_persona(language: Language, org: &str) -> String {
    match language {
        Language::Ru => format!("Вы — HR-ассистент по политике компании {org}."),
        Language::Uz => format!("Siz {org} kompaniyasining HR siyosati bo'yicha yordamchisisiz."),
        _ => format!("You are {org}'s HR Policy Assistant."),
    }
}

fn expertise_clause(language: Language, level: ExpertiseLevel) -> Option<&'static str> {
    match (language, level) {
        (_, ExpertiseLevel::General) => None,
        (Language::Ru, ExpertiseLevel::Expert) => {
            Some("Используйте точную терминологию и детали процедур.")
        }
        (Language::Ru, ExpertiseLevel::Beginner) => {
            Some("Объясняйте простыми словами, избегая профессионального жаргона.")
        }
        (Language::Uz, ExpertiseLevel::Expert) => {
            Some("Aniq terminologiya va protsedura tafsilotlaridan foydalaning.")
        }
        (Language::Uz, ExpertiseLevel::Beginner) => {
            Some("Oddiy so'zlar bilan tushuntiring, professional atamalardan saqlaning.")
        }
        (_, ExpertiseLevel::Expert) => Some("Use precise terminology and procedural detail."),
        (_, ExpertiseLevel::Beginner) => Some("Explain in simple terms, avoiding jargon."),
    }
}

fn document_type_clause(language: Language, documents: &[Document]) -> Option<&'static str> {
    if documents.is_empty() {
        return None;
    }
    let first_type = documents[0].metadata.file_type.as_deref()?;
    let all_same = documents.iter().all(|d| d.metadata.file_type.as_deref() == Some(first_type));
    if all_same && first_type.eq_ignore_ascii_case("pdf") {
        return Some(match language {
            Language::Ru => "Вы анализируете документы политики компании в формате PDF.",
            Language::Uz => "Siz PDF formatidagi kompaniya siyosati hujjatlarini tahlil qilyapsiz.",
            _ => "You are analyzing PDF policy documents.",
        });
    }
    None
}

fn cross_language_clause(language: Language, documents: &[Document]) -> Option<&'static str> {
    let diverges = documents
        .iter()
        .any(|d| d.metadata.language.as_deref().map(|l| l != language.code()).unwrap_or(false));
    if diverges {
        Some(match language {
            Language::Ru => {
                "Документы могут быть на любом языке; читайте их на исходном языке, но отвечайте на языке вопроса."
            }
            Language::Uz => {
                "Hujjatlar istalgan tilda bo'lishi mumkin; ularni asl tilida o'qing, lekin savol tilida javob bering."
            }
            _ => "Documents may be in any language; read them in their original language but answer in the query's language.",
        })
    } else {
        None
    }
}

fn grounding_clause(language: Language) -> &'static str {
    match language {
        Language::Ru => "Опирайтесь только на приведённые документы, ничего не придумывайте; если в документах действительно нет ответа, скажите об этом прямо.",
        Language::Uz => "Faqat berilgan hujjatlarga tayaning, hech narsani o'ylab topmang; agar hujjatlarda haqiqatan ham javob bo'lmasa, buni ochiq ayting.",
        _ => "Ground your answer only in the provided documents, never invent facts; if the documents genuinely lack an answer, say so plainly.",
    }
}

fn output_format_clause(language: Language) -> &'static str {
    match language {
        Language::Ru => "Дайте краткий профессиональный ответ (2-5 предложений). Никогда не упоминайте источники, страницы или названия документов, не используйте фразы вроде «согласно», «как указано», «на основании». Без воды и повторов.",
        Language::Uz => "Qisqa va professional javob bering (2-5 gap). Manbalar, sahifalar yoki hujjat nomlarini hech qachon eslatmang, \"ga ko'ra\", \"da aytilishicha\" kabi iboralardan foydalanmang. Ortiqcha so'z va takrorlarsiz.",
        _ => "Give a short, professional answer (2-5 sentences). Never reveal sources, page numbers, or document names, and never use attribution phrases like \"according to\" or \"as stated in\". No filler or repetition.",
    }
}

fn response_style_clause(language: Language) -> &'static str {
    match language {
        Language::Ru => "Предоставьте более развёрнутый ответ с дополнительным контекстом, сохраняя краткость формулировок.",
        Language::Uz => "Qisqa ifodalarni saqlagan holda qo'shimcha kontekst bilan batafsilroq javob bering.",
        _ => "Provide a more thorough answer with additional context, while keeping sentences concise.",
    }
}

pub struct SystemPromptInputs<'a> {
    pub org_name: &'a str,
    pub language: Language,
    pub query: &'a str,
    pub expertise_level: ExpertiseLevel,
    pub response_style: ResponseStyle,
    pub documents: &'a [Document],
}

/// Assembles the generator's system prompt following the eight-step
/// composition: persona, expertise, query type, document type,
/// cross-language, grounding, output format, and response style.
pub fn create_dynamic_system_prompt(inputs: &SystemPromptInputs<'_>) -> String {
    let mut parts = vec![base_persona(inputs.language, inputs.org_name)];

    if let Some(clause) = expertise_clause(inputs.language, inputs.expertise_level) {
        parts.push(clause.to_string());
    }

    let query_type = detect_query_type(inputs.query);
    parts.push(query_type_instruction(inputs.language, query_type).to_string());

    if let Some(clause) = document_type_clause(inputs.language, inputs.documents) {
        parts.push(clause.to_string());
    }

    if let Some(clause) = cross_language_clause(inputs.language, inputs.documents) {
        parts.push(clause.to_string());
    }

    parts.push(grounding_clause(inputs.language).to_string());
    parts.push(output_format_clause(inputs.language).to_string());

    if inputs.response_style == ResponseStyle::Detailed {
        parts.push(response_style_clause(inputs.language).to_string());
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hr_rag_core::Document;

    #[test]
    fn detects_definition_query() {
        assert_eq!(detect_query_type("What is the annual leave policy?"), QueryType::Definition);
    }

    #[test]
    fn detects_how_to_query() {
        assert_eq!(detect_query_type("How to apply for parental leave?"), QueryType::HowTo);
    }

    #[test]
    fn prompt_includes_persona_and_grounding() {
        let docs: Vec<Document> = Vec::new();
        let inputs = SystemPromptInputs {
            org_name: "Acme",
            language: Language::En,
            query: "What is the annual leave policy?",
            expertise_level: ExpertiseLevel::General,
            response_style: ResponseStyle::Balanced,
            documents: &docs,
        };
        let prompt = create_dynamic_system_prompt(&inputs);
        assert!(prompt.contains("Acme's HR Policy Assistant"));
        assert!(prompt.contains("never invent facts"));
        assert!(!prompt.contains("more thorough answer"));
    }

    #[test]
    fn detailed_style_appends_clause() {
        let docs: Vec<Document> = Vec::new();
        let inputs = SystemPromptInputs {
            org_name: "Acme",
            language: Language::En,
            query: "What is the annual leave policy?",
            expertise_level: ExpertiseLevel::General,
            response_style: ResponseStyle::Detailed,
            documents: &docs,
        };
        let prompt = create_dynamic_system_prompt(&inputs);
        assert!(prompt.contains("more thorough answer"));
    }
}
