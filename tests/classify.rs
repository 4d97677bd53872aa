//! Classification behaviour against a scripted text generator.
//!
//! No network: the generator replays canned replies (or failures) and
//! records the prompts and decoding parameters it was given.

use async_trait::async_trait;
use doctype_classifier::{
    Classifier, ClassifierConfig, GenerationError, PromptLanguage, Taxonomy, TaxonomyEntry,
    TextGenerator, ERROR, UNCLASSIFIABLE,
};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct ScriptedGenerator {
    reply: Option<Result<String, GenerationError>>,
    calls: Mutex<Vec<(String, f32, usize)>>,
}

impl ScriptedGenerator {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(Ok(text.to_string())),
            ..Default::default()
        })
    }

    fn failing(err: GenerationError) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(Err(err)),
            ..Default::default()
        })
    }

    fn calls(&self) -> Vec<(String, f32, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: usize,
    ) -> Result<String, GenerationError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), temperature, max_tokens));
        self.reply
            .clone()
            .unwrap_or_else(|| Err(GenerationError::EmptyResponse))
    }
}

fn invoice_taxonomy() -> Taxonomy {
    Taxonomy::new(vec![TaxonomyEntry::new("Invoice", "...", ["amount"])]).unwrap()
}

fn french_taxonomy() -> Taxonomy {
    Taxonomy::from_json_str(
        r#"{"documents": [
            {"type_document": "Facture", "description": "Demande de paiement", "champs": [{"nom": "montant"}]},
            {"type_document": "Bulletin de salaire", "description": "Fiche de paie", "champs": [{"nom": "employeur"}, {"nom": "net à payer"}]}
        ]}"#,
    )
    .unwrap()
}

fn classifier(generator: Arc<ScriptedGenerator>) -> Classifier {
    Classifier::new(generator, ClassifierConfig::default())
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_invoice_example() {
    let gen = ScriptedGenerator::replying(
        "TYPE: Invoice\nJUSTIFICATION: Contains amount field.\nINFORMATIONS ADDITIONNELLES: None.",
    );
    let result = classifier(gen).classify(&invoice_taxonomy(), "Amount due: 10").await;

    assert_eq!(result.doc_type, "Invoice");
    assert_eq!(result.justification, "Contains amount field.");
    assert_eq!(result.additional_info, "None.");
}

#[tokio::test]
async fn test_case_insensitive_match_returns_canonical_name() {
    let gen = ScriptedGenerator::replying("TYPE: BULLETIN DE SALAIRE\nJUSTIFICATION: net à payer présent");
    let result = classifier(gen).classify(&french_taxonomy(), "Net à payer : 2 100 €").await;

    assert_eq!(result.doc_type, "Bulletin de salaire");
    assert_eq!(result.justification, "net à payer présent");
}

#[tokio::test]
async fn test_unknown_type_is_unclassifiable() {
    let gen = ScriptedGenerator::replying(
        "TYPE: Invoice\nJUSTIFICATION: looks like a bill\nINFORMATIONS ADDITIONNELLES: total 10",
    );
    let result = classifier(gen).classify(&french_taxonomy(), "Total: 10").await;

    assert_eq!(result.doc_type, UNCLASSIFIABLE);
    assert_eq!(result.justification, "looks like a bill");
    assert_eq!(result.additional_info, "total 10");
}

#[tokio::test]
async fn test_reply_without_labels() {
    let gen = ScriptedGenerator::replying("I am not able to help with that.");
    let result = classifier(gen).classify(&invoice_taxonomy(), "???").await;

    assert_eq!(result.doc_type, UNCLASSIFIABLE);
    assert_eq!(result.justification, "");
    assert_eq!(result.additional_info, "");
}

#[tokio::test]
async fn test_generation_failure_becomes_error_result() {
    let gen = ScriptedGenerator::failing(GenerationError::Provider(
        "connection reset by peer".into(),
    ));
    let result = classifier(gen).classify(&invoice_taxonomy(), "Amount: 10").await;

    assert_eq!(result.doc_type, ERROR);
    assert!(
        result.justification.contains("connection reset by peer"),
        "got: {}",
        result.justification
    );
    assert_eq!(result.additional_info, "");
}

#[tokio::test]
async fn test_empty_response_becomes_error_result() {
    let gen = ScriptedGenerator::failing(GenerationError::EmptyResponse);
    let result = classifier(gen).classify(&invoice_taxonomy(), "x").await;

    assert!(result.is_error());
    assert!(result.justification.contains("empty"));
}

#[tokio::test]
async fn test_multiline_justification_is_space_joined() {
    let gen = ScriptedGenerator::replying(
        "TYPE: Facture\n\
         JUSTIFICATION: Le document mentionne un montant TTC.\n\
         Il comporte un numéro de facture.\n\
         Une date d'échéance est indiquée.\n\
         INFORMATIONS ADDITIONNELLES: Montant 120 €",
    );
    let result = classifier(gen).classify(&french_taxonomy(), "FACTURE").await;

    assert_eq!(result.doc_type, "Facture");
    assert_eq!(
        result.justification,
        "Le document mentionne un montant TTC. Il comporte un numéro de facture. Une date d'échéance est indiquée."
    );
    assert_eq!(result.additional_info, "Montant 120 €");
}

#[tokio::test]
async fn test_prompt_and_decoding_parameters() {
    let gen = ScriptedGenerator::replying("TYPE: Facture");
    let document = "FACTURE N° 42\n\nTotal TTC : 120,00 €\n";
    let config = ClassifierConfig::builder()
        .temperature(0.2)
        .max_tokens(512)
        .language(PromptLanguage::English)
        .build()
        .unwrap();
    let classifier = Classifier::new(gen.clone(), config);

    classifier.classify(&french_taxonomy(), document).await;

    let calls = gen.calls();
    assert_eq!(calls.len(), 1, "exactly one attempt, no retries");
    let (prompt, temperature, max_tokens) = &calls[0];
    assert_eq!(*temperature, 0.2);
    assert_eq!(*max_tokens, 512);
    assert!(prompt.contains("Facture"));
    assert!(prompt.contains("Bulletin de salaire"));
    assert!(prompt.contains("- net à payer"));
    assert!(prompt.contains(document));
    assert!(prompt.contains("ADDITIONAL INFORMATION:"));
}

#[tokio::test]
async fn test_default_decoding_parameters() {
    let gen = ScriptedGenerator::replying("TYPE: Invoice");
    classifier(gen.clone()).classify(&invoice_taxonomy(), "x").await;

    let (_, temperature, max_tokens) = gen.calls().remove(0);
    assert_eq!(temperature, 0.3);
    assert_eq!(max_tokens, 1000);
}

#[tokio::test]
async fn test_failed_call_is_not_retried() {
    let gen = ScriptedGenerator::failing(GenerationError::Provider("503".into()));
    classifier(gen.clone()).classify(&invoice_taxonomy(), "x").await;
    assert_eq!(gen.calls().len(), 1);
}

#[tokio::test]
async fn test_prompt_matches_classify_prompt() {
    let gen = ScriptedGenerator::replying("TYPE: Invoice");
    let c = classifier(gen.clone());
    let taxonomy = invoice_taxonomy();
    let expected = c.prompt(&taxonomy, "body");
    c.classify(&taxonomy, "body").await;
    assert_eq!(gen.calls()[0].0, expected);
}
