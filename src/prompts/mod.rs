//! Agent prompt templates and placeholder filling.
//!
//! Each translation job freezes a set of four prompt templates at creation
//! time: forward translator, evaluator, backward translator, and comparator.
//! Templates contain `{name}` placeholders that are filled with literal text
//! before each model call.

pub mod defaults;

use serde::{Deserialize, Serialize};

/// The four agent prompt templates in effect for a job.
///
/// Frozen into the job record at creation; later edits to the defaults do
/// not affect already-created jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentPromptSet {
    /// Template for the forward translation stage.
    pub forward_translator: String,
    /// Template for the evaluation stage.
    pub evaluator: String,
    /// Template for the back-translation stage.
    pub backward_translator: String,
    /// Template for the comparison stage.
    pub comparator: String,
}

impl Default for AgentPromptSet {
    fn default() -> Self {
        Self {
            forward_translator: defaults::FORWARD_TRANSLATOR_PROMPT.to_string(),
            evaluator: defaults::EVALUATOR_PROMPT.to_string(),
            backward_translator: defaults::BACKWARD_TRANSLATOR_PROMPT.to_string(),
            comparator: defaults::COMPARATOR_PROMPT.to_string(),
        }
    }
}

/// Optional per-agent template overrides supplied at job creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentPromptOverrides {
    pub forward_translator: Option<String>,
    pub evaluator: Option<String>,
    pub backward_translator: Option<String>,
    pub comparator: Option<String>,
}

impl AgentPromptSet {
    /// Builds a prompt set from the defaults with any overrides applied.
    pub fn with_overrides(overrides: AgentPromptOverrides) -> Self {
        let base = Self::default();
        Self {
            forward_translator: overrides.forward_translator.unwrap_or(base.forward_translator),
            evaluator: overrides.evaluator.unwrap_or(base.evaluator),
            backward_translator: overrides
                .backward_translator
                .unwrap_or(base.backward_translator),
            comparator: overrides.comparator.unwrap_or(base.comparator),
        }
    }
}

/// Fills `{name}` placeholders in a template with literal replacement text.
///
/// Every occurrence of each named placeholder is replaced. Placeholders not
/// present in `vars` are left untouched; replacement values are substituted
/// literally with no escaping. Filling the same template with the same map
/// is idempotent.
pub fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (name, value) in vars {
        result = result.replace(&format!("{{{name}}}"), value);
    }
    result
}
