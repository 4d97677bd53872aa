//! Reading the model's free-text answer back into a fixed record.
//!
//! The model is asked for three labelled blocks (`TYPE:`, `JUSTIFICATION:`,
//! `INFORMATIONS ADDITIONNELLES:`). Replies are read line by line with a
//! small state machine:
//!
//! ```text
//!            TYPE:            JUSTIFICATION:        INFO label
//!   None ──────────▶ Type ─────────────────▶ Justification ──▶ AdditionalInfo
//!     any label line resets its own field; other non-blank lines append
//! ```
//!
//! A label line *replaces* the field with the text after the label. Any other
//! non-blank line is appended, space-separated, to the field currently open.
//! Lines before the first label and blank lines are ignored.
//!
//! Parsing never consults the taxonomy. Whether the parsed type is legal is
//! decided separately by [`validate`].

use crate::taxonomy::Taxonomy;
use serde::{Deserialize, Serialize};

pub const TYPE_LABEL: &str = "TYPE:";
pub const JUSTIFICATION_LABEL: &str = "JUSTIFICATION:";
pub const ADDITIONAL_INFO_LABEL_FR: &str = "INFORMATIONS ADDITIONNELLES:";
pub const ADDITIONAL_INFO_LABEL_EN: &str = "ADDITIONAL INFORMATION:";

/// Sentinel type when the answer names no taxonomy member.
pub const UNCLASSIFIABLE: &str = "Unclassifiable";
/// Sentinel type when the generation call itself failed.
pub const ERROR: &str = "Error";

/// The outcome of classifying one document.
///
/// `doc_type` is always a taxonomy type name, [`UNCLASSIFIABLE`] or [`ERROR`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub justification: String,
    pub additional_info: String,
}

impl Default for ClassificationResult {
    fn default() -> Self {
        Self {
            doc_type: UNCLASSIFIABLE.to_string(),
            justification: String::new(),
            additional_info: String::new(),
        }
    }
}

impl ClassificationResult {
    /// The result returned when the generation call failed.
    pub fn error(detail: impl std::fmt::Display) -> Self {
        Self {
            doc_type: ERROR.to_string(),
            justification: format!("An error occurred: {detail}"),
            additional_info: String::new(),
        }
    }

    pub fn is_unclassifiable(&self) -> bool {
        self.doc_type == UNCLASSIFIABLE
    }

    pub fn is_error(&self) -> bool {
        self.doc_type == ERROR
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Type,
    Justification,
    AdditionalInfo,
}

/// Match a line against the labels, in priority order.
///
/// Returns the section the label opens and the text after the label.
fn match_label(line: &str) -> Option<(Section, &str)> {
    const LABELS: [(&str, Section); 4] = [
        (TYPE_LABEL, Section::Type),
        (JUSTIFICATION_LABEL, Section::Justification),
        (ADDITIONAL_INFO_LABEL_FR, Section::AdditionalInfo),
        (ADDITIONAL_INFO_LABEL_EN, Section::AdditionalInfo),
    ];
    LABELS.iter().find_map(|(label, section)| {
        line.split_once(label)
            .map(|(_, rest)| (*section, rest.trim()))
    })
}

/// Parse a raw model reply. Never fails: missing sections keep their default.
pub fn parse(raw: &str) -> ClassificationResult {
    let mut result = ClassificationResult::default();
    let mut current = Section::None;

    for line in raw.lines() {
        let line = line.trim();

        if let Some((section, rest)) = match_label(line) {
            current = section;
            *field_mut(&mut result, section) = rest.to_string();
            continue;
        }

        if current != Section::None && !line.is_empty() {
            let field = field_mut(&mut result, current);
            field.push(' ');
            field.push_str(line);
        }
    }

    result
}

fn field_mut(result: &mut ClassificationResult, section: Section) -> &mut String {
    match section {
        Section::Type | Section::None => &mut result.doc_type,
        Section::Justification => &mut result.justification,
        Section::AdditionalInfo => &mut result.additional_info,
    }
}

/// Force `result.doc_type` to a legal value.
///
/// A case-insensitive taxonomy match is replaced by the taxonomy's own
/// spelling; anything else becomes [`UNCLASSIFIABLE`]. Justification and
/// additional information are kept either way.
pub fn validate(mut result: ClassificationResult, taxonomy: &Taxonomy) -> ClassificationResult {
    result.doc_type = match taxonomy.resolve(&result.doc_type) {
        Some(entry) => entry.type_name.clone(),
        None => UNCLASSIFIABLE.to_string(),
    };
    result
}
