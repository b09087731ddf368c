//! Source summaries for retrieved chunks.

use super::types::{RetrievedChunk, SourceMetadata, SourceSummary};
use crate::masking::{apply_output_masking, MaskPolicy};
use unicode_segmentation::UnicodeSegmentation;

/// Maximum snippet length, in grapheme clusters.
const MAX_SNIPPET_LENGTH: usize = 200;

/// Summarize chunks in rank order. Snippets are truncated, then masked.
pub fn summarize(chunks: &[RetrievedChunk], policy: &MaskPolicy) -> Vec<SourceSummary> {
    chunks
        .iter()
        .map(|chunk| SourceSummary {
            chunk_index: chunk.chunk_index,
            text: apply_output_masking(&truncate_snippet(&chunk.text), policy),
            page_number: chunk.page_number,
            confidence_score: chunk.score,
            metadata: SourceMetadata {
                document_id: chunk.document_id.clone(),
                file_name: chunk.file_name.clone(),
                doc_type: chunk.doc_type,
            },
        })
        .collect()
}

fn truncate_snippet(text: &str) -> String {
    let mut graphemes = text.grapheme_indices(true);
    match graphemes.nth(MAX_SNIPPET_LENGTH) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocType;

    fn chunk(text: &str, score: f32) -> RetrievedChunk {
        RetrievedChunk {
            text: text.to_string(),
            chunk_index: 2,
            page_number: Some(7),
            document_id: "doc-9".to_string(),
            file_name: "estimate.pdf".to_string(),
            doc_type: DocType::EstimatePdf,
            tenant_id: "T1".to_string(),
            score,
        }
    }

    #[test]
    fn test_short_snippet_untouched() {
        assert_eq!(truncate_snippet("短い"), "短い");
        assert_eq!(truncate_snippet(&"a".repeat(200)), "a".repeat(200));
    }

    #[test]
    fn test_long_snippet_truncated_on_grapheme_boundary() {
        let text = "保".repeat(250);
        let snippet = truncate_snippet(&text);
        assert_eq!(snippet, format!("{}...", "保".repeat(200)));
    }

    #[test]
    fn test_summary_fields() {
        let sources = summarize(&[chunk("保証は10年", 0.9)], &MaskPolicy::unrestricted());
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].chunk_index, 2);
        assert_eq!(sources[0].page_number, Some(7));
        assert_eq!(sources[0].confidence_score, 0.9);
        assert_eq!(sources[0].metadata.document_id, "doc-9");
        assert_eq!(sources[0].metadata.doc_type, DocType::EstimatePdf);
    }

    #[test]
    fn test_snippets_are_masked() {
        let policy = MaskPolicy {
            mask_cost_data: true,
            ..MaskPolicy::unrestricted()
        };
        let sources = summarize(&[chunk("原価: 1,200,000円 で計上", 0.5)], &policy);
        assert!(!sources[0].text.contains("1,200,000"));
        assert!(sources[0].text.contains(crate::masking::MASK_PLACEHOLDER));
    }
}
