//! Versioned instruction templates and prompt composition.
//!
//! Changing instruction wording changes model behavior everywhere, so the
//! text lives in one [`PromptTemplate`] constant per version. Add a new
//! version instead of editing a released one.

/// Literal placed between the context block and the question.
pub const QUESTION_LABEL: &str = "\n\nQUESTION: ";

/// Fixed instruction text surrounding the evidence block and question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub version: &'static str,
    /// Role framing and numbered directives. Precedes the context block.
    pub preamble: &'static str,
    /// Answer-priming text. Follows the question.
    pub suffix: &'static str,
}

impl PromptTemplate {
    pub const V1: PromptTemplate = PromptTemplate {
        version: "v1",
        preamble: "You are an expert assistant specializing in Saudi Labor Law. \
You have access to relevant sections of the Saudi Labor Law documents to answer questions accurately.

INSTRUCTIONS:
1. Answer the question based primarily on the provided context from Saudi Labor Law documents
2. If the context doesn't contain enough information, clearly state this
3. Be specific and cite relevant articles, sections, or provisions when possible
4. Provide practical, actionable advice when appropriate
5. If you're unsure about any legal interpretation, recommend consulting with a legal professional
6. Answer in a clear, professional manner suitable for someone seeking legal guidance

",
        suffix: "\n\nANSWER: Based on the Saudi Labor Law documents provided above, ",
    };

    /// The template used by [`compose`].
    pub const CURRENT: PromptTemplate = Self::V1;

    /// Byte length contributed by the template itself.
    pub fn fixed_len(&self) -> usize {
        self.preamble.len() + QUESTION_LABEL.len() + self.suffix.len()
    }

    /// Concatenate preamble, context, question, and suffix, in that order.
    pub fn render(&self, query: &str, formatted_context: &str) -> String {
        let capacity = self.fixed_len() + query.len() + formatted_context.len();
        let mut prompt = String::with_capacity(capacity);
        prompt.push_str(self.preamble);
        prompt.push_str(formatted_context);
        prompt.push_str(QUESTION_LABEL);
        prompt.push_str(query);
        prompt.push_str(self.suffix);
        prompt
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::CURRENT
    }
}

/// Compose the final prompt with [`PromptTemplate::CURRENT`].
///
/// Pure: no I/O and no trimming, so `query` and `formatted_context` appear
/// verbatim in the output.
pub fn compose(query: &str, formatted_context: &str) -> String {
    PromptTemplate::CURRENT.render(query, formatted_context)
}
