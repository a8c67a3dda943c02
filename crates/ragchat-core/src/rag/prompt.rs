//! Prompt texts and prompt assembly for answer generation.

use super::{ChatMessage, Role};

const SYSTEM_PROMPT: &str = "\
You are the assistant of a community health forum. You answer questions using \
threads in which doctors have replied to members of the forum.

Guidelines:
1. Answer in the language of the user's question.
2. Take the previous conversation, if any, into account to understand the current question.
3. Use only the reference content provided for the current question. Never use outside knowledge.
4. You are an informational assistant, not a doctor: summarize the doctors' replies accurately and plainly.
5. When several replies are relevant, combine them. If they disagree, say that the references hold differing opinions.
6. Be precise, concise and factual.
7. If the reference content is unrelated to the question or not sufficient to answer confidently, say that no directly relevant information was found.
8. Do not give personal medical advice, do not diagnose and do not recommend specific treatment.
9. Do not mention \"reference content\" or \"previous conversation\" in your answer; answer as if you already knew the information.";

const DISCLAIMER: &str = "\
This information is a preliminary summary of question-and-answer threads from the forum \
and cannot replace advice, diagnosis or treatment from a medical professional. \
If you have health concerns, please consult a doctor directly.";

const NO_INFORMATION: &str =
    "Sorry, I could not find information directly related to your question in the database at the moment.";

const INSUFFICIENT_INFORMATION: &str =
    "The available information may not be sufficient to give a clear answer to this question.";

/// All user-facing texts of the answer pipeline.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    /// Instructions prepended to every prompt
    pub system_prompt: String,
    /// Appended to every answer
    pub disclaimer: String,
    /// Answer when nothing relevant was retrieved
    pub no_information: String,
    /// Answer when context existed but the model produced nothing usable
    pub insufficient_information: String,
    /// Prefix of the answer when the pipeline failed
    pub error_prefix: String,
    /// Header of the chat history block
    pub history_header: String,
    /// Header of the retrieved context block
    pub context_header: String,
    /// Placeholder when no context was retrieved
    pub no_context: String,
    /// Header of the current question
    pub question_header: String,
    /// Label for user messages in the history
    pub user_label: String,
    /// Label for assistant messages in the history
    pub assistant_label: String,
    /// Used as the title of a source chunk without one
    pub untitled: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            system_prompt: SYSTEM_PROMPT.to_string(),
            disclaimer: DISCLAIMER.to_string(),
            no_information: NO_INFORMATION.to_string(),
            insufficient_information: INSUFFICIENT_INFORMATION.to_string(),
            error_prefix: "An error occurred while processing your question".to_string(),
            history_header: "Previous conversation:".to_string(),
            context_header: "Reference content from forum threads (for the current question):"
                .to_string(),
            no_context: "No directly relevant reference content was found for this question."
                .to_string(),
            question_header: "Current question from the user:".to_string(),
            user_label: "User".to_string(),
            assistant_label: "Assistant".to_string(),
            untitled: "Reference".to_string(),
        }
    }
}

impl PromptTemplates {
    /// Assemble the generation prompt.
    pub fn build_prompt(&self, question: &str, history: &[ChatMessage], context: &[String]) -> String {
        let history_block = if history.is_empty() {
            String::new()
        } else {
            let mut lines = vec![self.history_header.clone()];
            for message in history {
                let label = match message.role {
                    Role::User => &self.user_label,
                    Role::Assistant => &self.assistant_label,
                };
                lines.push(format!("{}: {}", label, message.content));
            }
            format!("{}\n\n", lines.join("\n"))
        };

        let context_block = if context.is_empty() {
            self.no_context.clone()
        } else {
            context.join("\n")
        };

        [
            format!("System: {}", self.system_prompt),
            format!("{}{}\n{}", history_block, self.context_header, context_block),
            format!("{}\n{}", self.question_header, question),
        ]
        .join("\n\n")
    }

    /// Clean a raw model answer and append the disclaimer exactly once.
    pub fn finalize(&self, raw_answer: &str, had_context: bool) -> String {
        let stripped = raw_answer.replace(self.disclaimer.as_str(), "");
        let stripped = stripped.trim();

        let body: &str = if !stripped.is_empty() {
            stripped
        } else if had_context {
            &self.insufficient_information
        } else {
            &self.no_information
        };

        self.with_disclaimer(body)
    }

    /// `body` followed by the disclaimer.
    pub fn with_disclaimer(&self, body: &str) -> String {
        format!("{}\n\n{}", body, self.disclaimer)
    }
}
