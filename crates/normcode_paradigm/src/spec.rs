//! The on-disk paradigm specification shape (§4.6, §6 [ADDED]).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One `v_*` setup step: invokes `tool`'s `setup` method with a resolved
/// signifier, producing a concrete handle bound for every subsequent call
/// (§4.6 "Vertical spec").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerticalStep {
    pub tool: String,
    /// Either a literal JSON value or a perceptual-sign string (in which
    /// case the composer transmutes it through the PerceptionRouter before
    /// handing it to the tool's setup method).
    pub signifier_selector: Value,
}

/// Where one `h_plan` step's argument comes from (§4.6 "an input mapping
/// from value_order positions... to step arguments").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ArgRef {
    /// A position into the per-element MVP-assembled value tuple (negative
    /// indices count from the end, matching `value_selectors.index`).
    Value { position: i64 },
    /// A position into the resolved `v_setup` handles.
    Setup { position: usize },
    /// The immediately preceding step's output (the `c_*` composition
    /// link).
    PriorOutput,
    /// A literal value baked into the paradigm spec.
    Literal { value: Value },
}

/// One ordered `h_plan` composition step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizontalStep {
    pub tool: String,
    pub method: String,
    #[serde(default)]
    pub args: Vec<ArgRef>,
    /// `o_*` output format hint, e.g. `"json"`/`"text"`. Currently
    /// advisory — the composed callable always yields the last step's raw
    /// output value; a future format-specific coercion point.
    #[serde(default)]
    pub output_format: Option<String>,
}

/// A full paradigm specification, identified by the `[inputs]-[composition]-
/// [outputs]` string from §4.6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParadigmSpec {
    pub paradigm_id: String,
    #[serde(default)]
    pub v_setup: Vec<VerticalStep>,
    pub h_plan: Vec<HorizontalStep>,
    /// §4.6 `create_axis_on_list_output`, defaulting to `true`. Read by
    /// the semantic sequences' OR stage, not by the composer itself.
    #[serde(default = "default_true")]
    pub create_axis_on_list_output: bool,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_spec() {
        let json = serde_json::json!({
            "paradigm_id": "h_PromptTemplate-c_GenerateThinkJson-Extract-Save-o_FileLocation",
            "h_plan": [
                {"tool": "llm", "method": "complete", "args": [{"source": "value", "position": 0}]}
            ]
        });
        let spec: ParadigmSpec = serde_json::from_value(json).unwrap();
        assert_eq!(spec.h_plan.len(), 1);
        assert!(spec.create_axis_on_list_output);
    }
}
