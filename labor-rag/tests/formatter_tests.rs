//! Tests for context formatting and prompt composition.

use labor_rag::prompt::QUESTION_LABEL;
use labor_rag::{ChunkRecord, NO_CONTEXT_SENTINEL, PromptTemplate, compose, format_context};
use proptest::prelude::*;

fn chunk(text: &str, source_file: &str, page: u64, score: f32) -> ChunkRecord {
    ChunkRecord {
        text: text.to_string(),
        source_file: source_file.to_string(),
        page,
        chunk_id: page,
        score,
    }
}

fn arb_chunk() -> impl Strategy<Value = ChunkRecord> {
    ("[a-zA-Z0-9 .,]{1,80}", "[a-z_]{1,12}\\.txt", 0u64..500, 0.0f32..1.0f32)
        .prop_map(|(text, source, page, score)| chunk(&text, &source, page, score))
}

#[test]
fn empty_list_yields_sentinel() {
    assert_eq!(format_context(&[]), NO_CONTEXT_SENTINEL);
}

#[test]
fn entries_are_numbered_in_input_order() {
    let chunks = vec![
        chunk("Article 98: eight hours per day.", "labor_law.pdf", 12, 0.91),
        chunk("Article 99: overtime at 150%.", "labor_law.pdf", 13, 0.87),
    ];
    let out = format_context(&chunks);

    assert!(out.starts_with("=== RELEVANT SAUDI LABOR LAW INFORMATION ===\n"));
    assert!(out.ends_with("=== END CONTEXT ==="));
    assert!(out.contains("Context 1: [Source: labor_law.pdf, Page: 12, Relevance: 0.910]"));
    assert!(out.contains("Context 2: [Source: labor_law.pdf, Page: 13, Relevance: 0.870]"));

    let first = out.find("Article 98").unwrap();
    let second = out.find("Article 99").unwrap();
    assert!(first < second);
    assert_eq!(out.matches("\n---").count(), 2);
}

#[test]
fn chunk_text_is_emitted_verbatim() {
    let text = "  المادة 98\nلا يجوز تشغيل العامل  ";
    let out = format_context(&[chunk(text, "nizam.txt", 0, 0.5)]);
    assert!(out.contains(text));
    assert!(out.contains("Relevance: 0.500"));
}

#[test]
fn compose_places_context_before_question() {
    let context = format_context(&[chunk("Article 109", "a.txt", 1, 0.8)]);
    let prompt = compose("How many leave days?", &context);

    let ctx_at = prompt.find(&context).unwrap();
    let label_at = prompt.find(QUESTION_LABEL).unwrap();
    let question_at = prompt.find("How many leave days?").unwrap();
    assert!(ctx_at < label_at && label_at < question_at);
    assert!(prompt.starts_with(PromptTemplate::CURRENT.preamble));
    assert!(prompt.ends_with(PromptTemplate::CURRENT.suffix));
}

#[test]
fn sentinel_reaches_the_prompt_for_empty_context() {
    let prompt = compose("What is the probation period?", &format_context(&[]));
    assert!(prompt.contains(NO_CONTEXT_SENTINEL));
}

#[test]
fn default_template_is_current() {
    assert_eq!(PromptTemplate::default(), PromptTemplate::CURRENT);
    assert_eq!(PromptTemplate::CURRENT.version, "v1");
}

/// *For any* chunk list, formatting twice produces byte-identical output.
mod prop_format_deterministic {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn same_input_same_output(chunks in proptest::collection::vec(arb_chunk(), 0..8)) {
            prop_assert_eq!(format_context(&chunks), format_context(&chunks.clone()));
        }

        #[test]
        fn one_provenance_line_per_chunk(chunks in proptest::collection::vec(arb_chunk(), 1..8)) {
            let out = format_context(&chunks);
            for i in 1..=chunks.len() {
                let label = format!("Context {i}: [Source: ");
                prop_assert!(out.contains(&label));
            }
            let missing = format!("Context {}: ", chunks.len() + 1);
            prop_assert!(!out.contains(&missing));
        }
    }
}

/// *For any* query and context, the prompt contains both verbatim and its
/// length is exactly the template's fixed text plus the two inputs.
mod prop_compose_lossless {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn contains_inputs_and_adds_only_template_text(
            query in "\\PC{0,120}",
            context in "\\PC{0,400}",
        ) {
            let prompt = compose(&query, &context);
            prop_assert!(prompt.contains(&query));
            prop_assert!(prompt.contains(&context));
            prop_assert_eq!(
                prompt.len(),
                PromptTemplate::CURRENT.fixed_len() + query.len() + context.len()
            );
        }
    }
}
