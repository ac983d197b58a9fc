/*!
 * Prompt construction for batch translation.
 *
 * The response aligner relies on the model answering with exactly one
 * numbered line per numbered input line, in the same order. The preamble
 * below is the contract that asks for it; change it with care.
 */

use crate::database::PendingRow;

/// Instruction preamble for numbered-list translation.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// The fixed preamble
    pub const NUMBERED_LIST: &'static str = r#"Translate the following numbered lines from {source_language} to {target_language}.

Rules:
- Reply ONLY with a numbered list in the form "<number>. <translation>".
- Return exactly one output line for every input line, keeping the same numbers in the same order.
- Do not add any commentary, explanations or notes.
- Do not add any extra formatting: no markdown, no quotes, no code blocks, no blank lines.

Lines:"#;

    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    pub fn numbered_list() -> Self {
        Self::new(Self::NUMBERED_LIST)
    }

    /// Render the template with the given languages.
    pub fn render(&self, source_language: &str, target_language: &str) -> String {
        self.template
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::numbered_list()
    }
}

/// Builds the single request payload for one batch
#[derive(Debug, Clone)]
pub struct TranslationPromptBuilder {
    source_language: String,
    target_language: String,
    template: PromptTemplate,
}

impl TranslationPromptBuilder {
    /// Create a builder for a language pair (already resolved to labels)
    pub fn new(source_language: &str, target_language: &str) -> Self {
        Self {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            template: PromptTemplate::default(),
        }
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// Preamble followed by `<n>. <text>` lines, numbered from 1 in batch order
    pub fn build(&self, rows: &[PendingRow]) -> String {
        let texts: Vec<&str> = rows.iter().map(|r| r.source_text.as_str()).collect();
        self.build_from_texts(&texts)
    }

    pub fn build_from_texts(&self, texts: &[&str]) -> String {
        let mut prompt = self
            .template
            .render(&self.source_language, &self.target_language);
        prompt.push('\n');

        for (idx, text) in texts.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", idx + 1, single_line(text)));
        }

        prompt
    }
}

/// Line breaks inside one source text would shift every later number
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
