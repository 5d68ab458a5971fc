//! Prompt templates for retrieval-augmented answering.
//!
//! Two answer modes: `learning` renders a structured tutorial-style
//! answer, `concise` keeps it to short bullet points. Both templates
//! receive the retrieved context verbatim.

use std::fmt;
use std::str::FromStr;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a knowledgeable Web3 tutor who answers \
questions from authoritative material. Answer clearly and accurately, and never mention \
that you were given context or a knowledge base.";

pub const DEFAULT_LEARNER_PROFILE: &str = "general learner";

const LEARNING_TEMPLATE: &str = "\
{system_prompt}
Learner profile: {learner_profile}

Relevant retrieved information:
{context}

Answer the question using the structure below. Keep the tone clear and \
instructional; wording may vary but the structure and key concepts must not. \
If the question is about installation, configuration, troubleshooting, usage \
or deployment, skip the structure and output a step-by-step tutorial instead:
- number the steps 01/02/03 ...
- include the commands for each step in code blocks
- add how to verify each step and the expected output
1. Definition
2. Why it matters
3. How it works
4. Real-world example
5. Common pitfalls
6. Going further
7. Self-check questions (1-2)

Question: {question}

Answer:";

const CONCISE_TEMPLATE: &str = "\
{system_prompt}
Learner profile: {learner_profile}

Relevant retrieved information:
{context}

Answer the question in short bullet points, avoiding verbosity:
Question: {question}

Answer:";

/// Answer mode selecting which template is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Learning,
    Concise,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Learning => "learning",
            Mode::Concise => "concise",
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "learning" => Ok(Mode::Learning),
            "concise" => Ok(Mode::Concise),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render the full prompt for one question.
pub fn render_prompt(
    mode: Mode,
    system_prompt: &str,
    learner_profile: Option<&str>,
    context: &str,
    question: &str,
) -> String {
    let template = match mode {
        Mode::Learning => LEARNING_TEMPLATE,
        Mode::Concise => CONCISE_TEMPLATE,
    };
    let profile = learner_profile
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_LEARNER_PROFILE);

    template
        .replace("{system_prompt}", system_prompt)
        .replace("{learner_profile}", profile)
        .replace("{context}", context)
        .replace("{question}", question)
}
