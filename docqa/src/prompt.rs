//! Grounded prompt construction.
//!
//! The template asks the model to answer only from the supplied segments and
//! to finish with a `SOURCES: ` line. [`crate::citation`] parses that line
//! back, so the marker and separator here must stay in sync with it.

use crate::citation::{SOURCES_MARKER, SOURCE_SEPARATOR};
use crate::document::Segment;

const INSTRUCTIONS: &str = "\
Create a final answer to the given question using only the provided document excerpts \
(given in no particular order) as sources. Do not use any outside knowledge.
If the excerpts do not contain enough information to answer, say \"I don't know.\" \
Do not attempt to fabricate an answer.
ALWAYS finish your response with a single line of the exact form \
\"SOURCES: <source>, <source>\" listing every source you used to ground the answer, \
copying each source exactly as given. If you used no source, leave the list empty.";

const QUESTION_PREFIX: &str = "QUESTION: ";

/// Line that opens and closes the excerpt block.
const DELIMITER: &str = "=========";

const EXAMPLE: &str = "\
QUESTION: When must bids be submitted?
=========
Content: All bids must reach the contracting authority no later than 12:00 on 3 May.
Source: 2-1
Content: Late submissions will not be considered.
Source: 2-2
Content: The contract runs for 24 months with an option to extend.
Source: 5-0
=========
FINAL ANSWER: Bids must be submitted by 12:00 on 3 May; late bids are rejected.
SOURCES: 2-1, 2-2";

/// Renders the fixed grounded-answer template.
///
/// # Example
///
/// ```rust,ignore
/// use docqa::PromptBuilder;
///
/// let prompt = PromptBuilder::new().build_prompt(&segments, "Who is the buyer?");
/// ```
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    include_example: bool,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptBuilder {
    /// Create a builder that includes a worked example in every prompt.
    pub fn new() -> Self {
        Self { include_example: true }
    }

    /// Create a builder without the worked example, for smaller context windows.
    pub fn without_example() -> Self {
        Self { include_example: false }
    }

    /// Render the prompt for `question` over `segments`.
    ///
    /// Each segment appears as a `Content:` block followed by its source
    /// identifier, in the order given.
    pub fn build_prompt(&self, segments: &[Segment], question: &str) -> String {
        let mut prompt = String::with_capacity(
            INSTRUCTIONS.len() + segments.iter().map(|s| s.text.len() + 32).sum::<usize>() + 256,
        );

        prompt.push_str(INSTRUCTIONS);
        prompt.push_str("\n\n");
        if self.include_example {
            prompt.push_str(EXAMPLE);
            prompt.push_str("\n\n");
        }

        prompt.push_str(QUESTION_PREFIX);
        prompt.push_str(question.trim());
        prompt.push('\n');
        prompt.push_str(DELIMITER);
        prompt.push('\n');
        for segment in segments {
            prompt.push_str("Content: ");
            prompt.push_str(&segment.text);
            prompt.push_str("\nSource: ");
            prompt.push_str(&segment.source_id);
            prompt.push('\n');
        }
        prompt.push_str(DELIMITER);
        prompt.push('\n');
        prompt.push_str(&format!(
            "FINAL ANSWER (end with \"{}\" followed by sources separated by \"{}\"):",
            SOURCES_MARKER.trim_end(),
            SOURCE_SEPARATOR
        ));
        prompt
    }
}

/// The excerpt block of a prompt rendered by [`PromptBuilder`]: everything
/// after the delimiter that follows the question.
///
/// The instructions and the optional example are skipped by position, so
/// text inside the excerpts cannot be mistaken for the question.
pub(crate) fn excerpt_section(prompt: &str) -> Option<&str> {
    let rest = prompt.strip_prefix(INSTRUCTIONS)?.trim_start_matches('\n');
    let rest = rest.strip_prefix(EXAMPLE).map_or(rest, |r| r.trim_start_matches('\n'));
    let question = rest.strip_prefix(QUESTION_PREFIX)?;
    let (_, excerpts) = question.split_once(&format!("\n{DELIMITER}\n"))?;
    Some(excerpts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(source_id: &str, text: &str) -> Segment {
        Segment {
            source_id: source_id.to_string(),
            text: text.to_string(),
            document_id: "doc".to_string(),
            page: 1,
            index: 0,
        }
    }

    #[test]
    fn every_segment_is_tagged_with_its_source() {
        let prompt = PromptBuilder::without_example()
            .build_prompt(&[segment("1-0", "alpha"), segment("3-2", "beta")], "What?");
        assert!(prompt.contains("Content: alpha\nSource: 1-0\n"));
        assert!(prompt.contains("Content: beta\nSource: 3-2\n"));
        assert!(prompt.find("1-0").unwrap() < prompt.find("3-2").unwrap());
    }

    #[test]
    fn prompt_demands_the_citation_line_and_refusal() {
        let prompt = PromptBuilder::new().build_prompt(&[], "Who is the buyer?");
        assert!(prompt.contains("SOURCES: "));
        assert!(prompt.contains("I don't know"));
        assert!(prompt.contains("QUESTION: Who is the buyer?\n"));
    }

    #[test]
    fn excerpt_section_starts_after_the_question() {
        let segments = [segment("1-0", "QUESTION: inside\n=========")];
        for builder in [PromptBuilder::new(), PromptBuilder::without_example()] {
            let prompt = builder.build_prompt(&segments, "Real question?");
            let excerpts = excerpt_section(&prompt).unwrap();
            assert!(excerpts.starts_with("Content: QUESTION: inside\n"));
        }
        assert!(excerpt_section("QUESTION: hand written\n=========\n").is_none());
    }

    #[test]
    fn example_is_optional() {
        let bare = PromptBuilder::without_example().build_prompt(&[], "q");
        let full = PromptBuilder::new().build_prompt(&[], "q");
        assert!(!bare.contains("FINAL ANSWER: Bids"));
        assert!(full.contains("FINAL ANSWER: Bids"));
    }
}
