//! Prompts sent to the model.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the classification wording and the OCR
//!    wording each live in exactly one place.
//!
//! 2. **Testability** — unit tests can inspect a built prompt directly
//!    without a provider, so regressions such as a dropped taxonomy entry
//!    are caught before any API call.
//!
//! The response labels the classification prompt asks for are defined in
//! [`crate::response`], next to the parser that reads them back.

use crate::config::PromptLanguage;
use crate::response::{ADDITIONAL_INFO_LABEL_EN, ADDITIONAL_INFO_LABEL_FR, JUSTIFICATION_LABEL, TYPE_LABEL};
use crate::taxonomy::Taxonomy;
use std::fmt::Write as _;

/// System prompt used when transcribing a scanned page or image.
pub const OCR_SYSTEM_PROMPT: &str = r#"You are an expert OCR engine. Transcribe ALL text visible in the image exactly as written.

Rules:
- Preserve the reading order a human would follow
- Keep line breaks between paragraphs, table rows and list items
- Keep numbers, amounts, dates and identifiers character for character
- Do NOT translate, summarise, correct or comment
- Output ONLY the transcribed text, no Markdown fences"#;

struct Wording {
    header: &'static str,
    fields_heading: &'static str,
    content_heading: &'static str,
    instructions: &'static str,
    categories_heading: &'static str,
    format_heading: &'static str,
    type_placeholder: &'static str,
    justification_placeholder: &'static str,
    info_label: &'static str,
    info_placeholder: &'static str,
}

const FRENCH: Wording = Wording {
    header: "Vous êtes un assistant d'IA expert en classification de documents. \
Votre tâche est de classer le document donné dans l'une des catégories suivantes :",
    fields_heading: "**Champs clés:**",
    content_heading: "## Contenu du document:",
    instructions: "Analysez le document fourni et classez-le dans l'une des catégories disponibles.\n\
- Fournissez une justification détaillée de votre classification, en faisant référence à des éléments spécifiques du contenu du document.\n\
- Incluez toute information supplémentaire pertinente dérivée du document.\n\
- Utilisez *uniquement* le contenu et les catégories du document fournis pour votre analyse.",
    categories_heading: "Catégories disponibles:",
    format_heading: "Répondez au format suivant:",
    type_placeholder: "[Catégorie sélectionnée]",
    justification_placeholder: "[Explication détaillée des raisons pour lesquelles cette catégorie a été choisie, \
en faisant référence à des éléments spécifiques du contenu du document.]",
    info_label: ADDITIONAL_INFO_LABEL_FR,
    info_placeholder: "[Toute autre information pertinente trouvée dans le document.]",
};

const ENGLISH: Wording = Wording {
    header: "You are an AI assistant specialised in document classification. \
Your task is to classify the given document into one of the following categories:",
    fields_heading: "**Key fields:**",
    content_heading: "## Document content:",
    instructions: "Analyse the document above and classify it into one of the available categories.\n\
- Give a detailed justification for your choice, referring to specific elements of the document content.\n\
- Include any other relevant information derived from the document.\n\
- Use *only* the supplied document content and categories for your analysis.",
    categories_heading: "Available categories:",
    format_heading: "Answer in the following format:",
    type_placeholder: "[Selected category]",
    justification_placeholder: "[Detailed explanation of why this category was chosen, \
referring to specific elements of the document content.]",
    info_label: ADDITIONAL_INFO_LABEL_EN,
    info_placeholder: "[Any other relevant information found in the document.]",
};

fn wording(language: PromptLanguage) -> &'static Wording {
    match language {
        PromptLanguage::French => &FRENCH,
        PromptLanguage::English => &ENGLISH,
    }
}

/// Build the classification prompt for `document_text`.
///
/// Every taxonomy entry is listed in order with its description and key
/// fields, followed by the document text verbatim and the answer format.
/// Nothing is truncated; size limits are the caller's concern.
pub fn build_prompt(taxonomy: &Taxonomy, document_text: &str, language: PromptLanguage) -> String {
    let w = wording(language);
    let mut prompt = String::with_capacity(document_text.len() + 512 * (taxonomy.len() + 1));

    prompt.push_str(w.header);
    prompt.push_str("\n\n");

    for entry in taxonomy {
        // Writing into a String cannot fail.
        let _ = writeln!(prompt, "## {}", entry.type_name);
        let _ = writeln!(prompt, "{}", entry.description);
        prompt.push_str(w.fields_heading);
        prompt.push('\n');
        for field in &entry.fields {
            let _ = writeln!(prompt, "- {}", field);
        }
        prompt.push('\n');
    }

    prompt.push_str(w.content_heading);
    prompt.push('\n');
    prompt.push_str(document_text);
    prompt.push_str("\n\n");

    prompt.push_str(w.instructions);
    prompt.push_str("\n\n");

    prompt.push_str(w.categories_heading);
    prompt.push('\n');
    for name in taxonomy.type_names() {
        let _ = writeln!(prompt, "- {}", name);
    }
    prompt.push('\n');

    prompt.push_str(w.format_heading);
    prompt.push_str("\n\n");
    let _ = writeln!(prompt, "{} {}", TYPE_LABEL, w.type_placeholder);
    let _ = writeln!(prompt, "{} {}", JUSTIFICATION_LABEL, w.justification_placeholder);
    let _ = writeln!(prompt, "{} {}", w.info_label, w.info_placeholder);

    prompt
}
