//! Fixed prompt frame for the yes/no relevance judgment.
//!
//! Every (query, document) pair is rendered with the same instruction
//! template, then wrapped in a chat frame whose system turn constrains
//! the answer to "yes" or "no" and whose assistant preamble positions
//! the next generated token as that answer.

pub const DEFAULT_INSTRUCTION: &str =
    "Given a web search query, retrieve relevant passages that answer the query";

/// Tokenized once and prepended to every pair in a batch.
pub const PREFIX: &str = "<|im_start|>system\nJudge whether the Document meets the requirements based on the Query and the Instruct provided. Note that the answer can only be \"yes\" or \"no\".<|im_end|>\n<|im_start|>user\n";

/// Tokenized once and appended to every pair in a batch.
pub const SUFFIX: &str = "<|im_end|>\n<|im_start|>assistant\n<think>\n\n</think>\n\n";

/// Render the pair body that sits between [`PREFIX`] and [`SUFFIX`].
pub fn format_pair(instruction: Option<&str>, query: &str, document: &str) -> String {
    let instruction = instruction.unwrap_or(DEFAULT_INSTRUCTION);
    format!("<Instruct>: {instruction}\n<Query>: {query}\n<Document>: {document}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_uses_default_instruction() {
        let body = format_pair(None, "how to cure olives", "Brine curing takes weeks.");
        assert_eq!(
            body,
            format!(
                "<Instruct>: {DEFAULT_INSTRUCTION}\n<Query>: how to cure olives\n<Document>: Brine curing takes weeks."
            )
        );
    }

    #[test]
    fn pair_uses_supplied_instruction() {
        let body = format_pair(Some("Find the section answering the question"), "q", "d");
        assert!(body.starts_with("<Instruct>: Find the section answering the question\n"));
        assert!(body.contains("\n<Query>: q\n"));
        assert!(body.ends_with("<Document>: d"));
    }

    #[test]
    fn frame_is_stable() {
        assert!(PREFIX.contains("\"yes\" or \"no\""));
        assert!(SUFFIX.ends_with("</think>\n\n"));
    }
}
