//! Inference entries and their sequence-specific working interpretations
//! (§3 "Inference entry", §4.7, §4.8, §6).

use crate::error::ModelError;
use crate::flow_index::FlowIndex;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::Value;

/// One of the six sequence kinds. `"quantifying"` is rejected at load time
/// rather than treated as a synonym of `looping` (§9 Open Question,
/// resolved in DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    Assigning,
    Grouping,
    Timing,
    Looping,
    Imperative,
    Judgement,
}

impl SequenceKind {
    fn parse(raw: &str) -> Result<Self, String> {
        Ok(match raw {
            "assigning" => SequenceKind::Assigning,
            "grouping" => SequenceKind::Grouping,
            "timing" => SequenceKind::Timing,
            "looping" => SequenceKind::Looping,
            "imperative" => SequenceKind::Imperative,
            "judgement" => SequenceKind::Judgement,
            "quantifying" => {
                return Err(
                    "sequence_kind 'quantifying' is not supported; this plan format uses 'looping' exclusively"
                        .to_string(),
                )
            }
            other => return Err(format!("unknown sequence_kind '{}'", other)),
        })
    }
}

/// `$-` derelation selector (§4.7.1) and the selector shape shared with
/// `value_selectors` (§4.6).
#[derive(Debug, Clone)]
pub enum DerelationSelector {
    Index(i64),
    Key(String),
    Unpack,
}

/// The `value_selectors` entry shape from §4.6, attached per value concept
/// in imperative/judgement working interpretations.
#[derive(Debug, Clone)]
pub enum ValueSelector {
    Index(i64),
    Key(String),
    Unpack,
    Branch { path: Value, content: Value },
}

fn parse_selector_object(obj: &serde_json::Map<String, Value>) -> Result<ValueSelector, String> {
    if let Some(v) = obj.get("index") {
        let n = v.as_i64().ok_or("selector 'index' must be an integer")?;
        return Ok(ValueSelector::Index(n));
    }
    if let Some(v) = obj.get("key") {
        let s = v.as_str().ok_or("selector 'key' must be a string")?;
        return Ok(ValueSelector::Key(s.to_string()));
    }
    if let Some(v) = obj.get("unpack") {
        if v.as_bool() == Some(true) {
            return Ok(ValueSelector::Unpack);
        }
        return Err("selector 'unpack' must be true".to_string());
    }
    if let Some(v) = obj.get("branch") {
        let branch = v.as_object().ok_or("selector 'branch' must be an object")?;
        let path = branch.get("path").cloned().unwrap_or(Value::Null);
        let content = branch.get("content").cloned().unwrap_or(Value::Null);
        return Ok(ValueSelector::Branch { path, content });
    }
    Err("selector object has none of index/key/unpack/branch".to_string())
}

fn parse_derelation_selector(obj: &serde_json::Map<String, Value>) -> Result<DerelationSelector, String> {
    match parse_selector_object(obj)? {
        ValueSelector::Index(n) => Ok(DerelationSelector::Index(n)),
        ValueSelector::Key(k) => Ok(DerelationSelector::Key(k)),
        ValueSelector::Unpack => Ok(DerelationSelector::Unpack),
        ValueSelector::Branch { .. } => Err("'$-' derelation does not accept a 'branch' selector".to_string()),
    }
}

/// `$=`/`$%`/`$./`$+`/`$-` (§4.7.1). The candidate list for `$.` and the
/// source concept for `$+`/`$-`/`$=` are the entry's `value_concepts`, not
/// duplicated here.
#[derive(Debug, Clone)]
pub enum AssigningWI {
    Identity,
    Abstraction { face_value: Value, axis_names: Vec<String> },
    Specification,
    Continuation { by_axes: Vec<String> },
    Derelation { selector: DerelationSelector },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupingMode {
    In,
    Across,
}

/// `&[{}]`/`&[#]` (§4.7.2), in either the legacy cross-product-then-collapse
/// form or the per-reference form.
#[derive(Debug, Clone)]
pub enum GroupingWI {
    Legacy { by_axis_concepts: Vec<String>, protect_axes: Vec<String> },
    PerReference { by_axes: Vec<String>, create_axis: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingMarker {
    If,
    IfBang,
    After,
}

/// `@:'`/`@:!`/`@.` (§4.7.3).
#[derive(Debug, Clone)]
pub struct TimingWI {
    pub marker: TimingMarker,
    pub condition: String,
}

/// `*.` / "every" (§4.7.4).
#[derive(Debug, Clone)]
pub struct LoopingWI {
    pub loop_index: u32,
    pub loop_base_concept: String,
    pub current_loop_base_concept: String,
    pub group_base: String,
    pub in_loop_concept: FxHashMap<String, u32>,
    pub concept_to_infer: Vec<String>,
    pub invariant_concepts: Vec<FlowIndex>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    All,
    Exists,
    ForEach,
}

/// Judgement-only `assertion_condition` (§4.8 TIA).
#[derive(Debug, Clone)]
pub struct AssertionCondition {
    pub quantifier: Quantifier,
    pub truth_value: Value,
}

/// Shared shape of imperative and judgement working interpretations
/// (§4.8 IWI); `assertion_condition` is populated only for judgement.
#[derive(Debug, Clone)]
pub struct SemanticWI {
    pub paradigm: String,
    pub value_order: Vec<String>,
    pub value_selectors: FxHashMap<String, ValueSelector>,
    pub create_axis_on_list_output: bool,
    pub assertion_condition: Option<AssertionCondition>,
}

/// The sequence-specific declarative configuration carried by every
/// inference entry; the variant always matches the entry's `sequence_kind`.
#[derive(Debug, Clone)]
pub enum WorkingInterpretation {
    Assigning(AssigningWI),
    Grouping(GroupingMode, GroupingWI),
    Timing(TimingWI),
    Looping(LoopingWI),
    Imperative(SemanticWI),
    Judgement(SemanticWI),
}

/// The on-disk shape of one inference repository record (§6).
#[derive(Debug, Deserialize)]
pub struct InferenceRecord {
    pub flow_index: String,
    pub sequence_kind: String,
    pub concept_to_infer: String,
    pub function_concept: String,
    #[serde(default)]
    pub value_concepts: Vec<String>,
    #[serde(default)]
    pub context_concepts: Vec<String>,
    #[serde(default)]
    pub working_interpretation: Value,
    #[serde(default)]
    pub supporting_children: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct InferenceEntry {
    pub flow_index: FlowIndex,
    pub sequence_kind: SequenceKind,
    pub concept_to_infer: String,
    pub function_concept: String,
    pub value_concepts: Vec<String>,
    pub context_concepts: Vec<String>,
    pub working_interpretation: WorkingInterpretation,
    pub supporting_children: Vec<FlowIndex>,
}

fn str_field<'a>(obj: &'a serde_json::Map<String, Value>, key: &str) -> Result<&'a str, String> {
    obj.get(key).and_then(Value::as_str).ok_or_else(|| format!("missing or non-string '{}'", key))
}

fn str_vec_field(obj: &serde_json::Map<String, Value>, key: &str) -> Result<Vec<String>, String> {
    match obj.get(key) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string).ok_or_else(|| format!("'{}' must be an array of strings", key)))
            .collect(),
        Some(_) => Err(format!("'{}' must be an array of strings", key)),
    }
}

fn parse_assigning(obj: &serde_json::Map<String, Value>) -> Result<AssigningWI, String> {
    match str_field(obj, "marker")? {
        "=" => Ok(AssigningWI::Identity),
        "%" => {
            let face_value = obj.get("face_value").cloned().ok_or("'$%' requires 'face_value'")?;
            let axis_names = str_vec_field(obj, "axis_names")?;
            Ok(AssigningWI::Abstraction { face_value, axis_names })
        }
        "." => Ok(AssigningWI::Specification),
        "+" => {
            let by_axes = str_vec_field(obj, "by_axes")?;
            if by_axes.is_empty() {
                return Err("'$+' requires non-empty 'by_axes'".to_string());
            }
            Ok(AssigningWI::Continuation { by_axes })
        }
        "-" => {
            let selector_obj = obj.get("selector").and_then(Value::as_object).ok_or("'$-' requires 'selector'")?;
            let selector = parse_derelation_selector(selector_obj)?;
            Ok(AssigningWI::Derelation { selector })
        }
        other => Err(format!("unknown assigning marker '{}'", other)),
    }
}

fn parse_grouping(obj: &serde_json::Map<String, Value>) -> Result<(GroupingMode, GroupingWI), String> {
    let mode = match str_field(obj, "marker")? {
        "in" => GroupingMode::In,
        "across" => GroupingMode::Across,
        other => return Err(format!("unknown grouping marker '{}'", other)),
    };
    let has_legacy = obj.contains_key("by_axis_concepts");
    let has_per_reference = obj.contains_key("by_axes") || obj.contains_key("create_axis");
    if has_legacy == has_per_reference {
        return Err(
            "grouping working_interpretation must set either 'by_axis_concepts' or ('by_axes' + 'create_axis'), not both or neither"
                .to_string(),
        );
    }
    let wi = if has_legacy {
        GroupingWI::Legacy {
            by_axis_concepts: str_vec_field(obj, "by_axis_concepts")?,
            protect_axes: str_vec_field(obj, "protect_axes")?,
        }
    } else {
        let create_axis = str_field(obj, "create_axis")?.to_string();
        GroupingWI::PerReference { by_axes: str_vec_field(obj, "by_axes")?, create_axis }
    };
    Ok((mode, wi))
}

fn parse_timing(obj: &serde_json::Map<String, Value>) -> Result<TimingWI, String> {
    let marker = match str_field(obj, "marker")? {
        "if" => TimingMarker::If,
        "if!" => TimingMarker::IfBang,
        "after" => TimingMarker::After,
        other => return Err(format!("unknown timing marker '{}'", other)),
    };
    let condition = str_field(obj, "condition")?.to_string();
    Ok(TimingWI { marker, condition })
}

fn parse_looping(obj: &serde_json::Map<String, Value>) -> Result<LoopingWI, String> {
    if obj.get("marker").and_then(Value::as_str) != Some("every") {
        return Err("looping working_interpretation requires marker == 'every'".to_string());
    }
    let loop_index = obj.get("loop_index").and_then(Value::as_u64).ok_or("looping requires integer 'loop_index'")? as u32;
    let loop_base_concept = str_field(obj, "LoopBaseConcept")?.to_string();
    let current_loop_base_concept = str_field(obj, "CurrentLoopBaseConcept")?.to_string();
    let group_base = str_field(obj, "group_base")?.to_string();
    let concept_to_infer = str_vec_field(obj, "ConceptToInfer")?;

    let mut in_loop_concept = FxHashMap::default();
    if let Some(Value::Object(map)) = obj.get("InLoopConcept") {
        for (k, v) in map {
            let distance = v.as_u64().ok_or_else(|| format!("InLoopConcept['{}'] must be an integer distance", k))? as u32;
            in_loop_concept.insert(k.clone(), distance);
        }
    }

    let invariant_concepts = str_vec_field(obj, "invariant_flow_indices")?
        .into_iter()
        .map(|s| s.parse::<FlowIndex>().map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LoopingWI {
        loop_index,
        loop_base_concept,
        current_loop_base_concept,
        group_base,
        in_loop_concept,
        concept_to_infer,
        invariant_concepts,
    })
}

fn parse_value_selectors(obj: &serde_json::Map<String, Value>) -> Result<FxHashMap<String, ValueSelector>, String> {
    let mut out = FxHashMap::default();
    if let Some(Value::Object(map)) = obj.get("value_selectors") {
        for (concept, raw) in map {
            let selector_obj = raw.as_object().ok_or_else(|| format!("value_selectors['{}'] must be an object", concept))?;
            out.insert(concept.clone(), parse_selector_object(selector_obj)?);
        }
    }
    Ok(out)
}

fn parse_semantic(obj: &serde_json::Map<String, Value>, judgement: bool) -> Result<SemanticWI, String> {
    let paradigm = str_field(obj, "paradigm")?.to_string();
    let value_order = str_vec_field(obj, "value_order")?;
    let value_selectors = parse_value_selectors(obj)?;
    let create_axis_on_list_output = obj.get("create_axis_on_list_output").and_then(Value::as_bool).unwrap_or(true);

    let assertion_condition = if judgement {
        let cond_obj = obj
            .get("assertion_condition")
            .and_then(Value::as_object)
            .ok_or("judgement requires 'assertion_condition'")?;
        let quantifier = match str_field(cond_obj, "quantifier")? {
            "ALL" => Quantifier::All,
            "EXISTS" => Quantifier::Exists,
            "FOR_EACH" => Quantifier::ForEach,
            other => return Err(format!("unknown assertion_condition quantifier '{}'", other)),
        };
        let truth_value = cond_obj.get("truth_value").cloned().ok_or("assertion_condition requires 'truth_value'")?;
        Some(AssertionCondition { quantifier, truth_value })
    } else {
        None
    };

    Ok(SemanticWI { paradigm, value_order, value_selectors, create_axis_on_list_output, assertion_condition })
}

impl InferenceEntry {
    /// Parses and validates one raw record, including its
    /// `working_interpretation` shape against `sequence_kind` (§3 [ADDED]).
    pub fn from_record(record: InferenceRecord) -> Result<Self, ModelError> {
        let flow_index = record
            .flow_index
            .parse::<FlowIndex>()
            .map_err(|e| ModelError::single(format!("inference record: {}", e)))?;

        let sequence_kind = SequenceKind::parse(&record.sequence_kind)
            .map_err(|e| ModelError::single(format!("{} ({})", e, record.flow_index)))?;

        let obj = record.working_interpretation.as_object().cloned().unwrap_or_default();

        let working_interpretation = (|| -> Result<WorkingInterpretation, String> {
            Ok(match sequence_kind {
                SequenceKind::Assigning => WorkingInterpretation::Assigning(parse_assigning(&obj)?),
                SequenceKind::Grouping => {
                    let (mode, wi) = parse_grouping(&obj)?;
                    WorkingInterpretation::Grouping(mode, wi)
                }
                SequenceKind::Timing => WorkingInterpretation::Timing(parse_timing(&obj)?),
                SequenceKind::Looping => WorkingInterpretation::Looping(parse_looping(&obj)?),
                SequenceKind::Imperative => WorkingInterpretation::Imperative(parse_semantic(&obj, false)?),
                SequenceKind::Judgement => WorkingInterpretation::Judgement(parse_semantic(&obj, true)?),
            })
        })()
        .map_err(|e| ModelError::single(format!("inference {}: {}", record.flow_index, e)))?;

        let supporting_children = record
            .supporting_children
            .iter()
            .map(|s| s.parse::<FlowIndex>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ModelError::single(format!("inference {}: {}", record.flow_index, e)))?;

        Ok(InferenceEntry {
            flow_index,
            sequence_kind,
            concept_to_infer: record.concept_to_infer,
            function_concept: record.function_concept,
            value_concepts: record.value_concepts,
            context_concepts: record.context_concepts,
            working_interpretation,
            supporting_children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(flow_index: &str, sequence_kind: &str, wi: Value) -> InferenceRecord {
        InferenceRecord {
            flow_index: flow_index.to_string(),
            sequence_kind: sequence_kind.to_string(),
            concept_to_infer: "{out}".to_string(),
            function_concept: "{op}".to_string(),
            value_concepts: vec!["{a}".to_string()],
            context_concepts: vec![],
            working_interpretation: wi,
            supporting_children: vec![],
        }
    }

    #[test]
    fn parses_specification_assigning() {
        let entry = InferenceEntry::from_record(record("1.1", "assigning", json!({"marker": "."}))).unwrap();
        assert!(matches!(entry.working_interpretation, WorkingInterpretation::Assigning(AssigningWI::Specification)));
    }

    #[test]
    fn rejects_quantifying_sequence_kind() {
        let err = InferenceEntry::from_record(record("1.1", "quantifying", json!({}))).unwrap_err();
        assert!(err.to_string().contains("quantifying"));
    }

    #[test]
    fn parses_timing_marker() {
        let entry = InferenceEntry::from_record(record(
            "1.2",
            "timing",
            json!({"marker": "if!", "condition": "<is_empty>"}),
        ))
        .unwrap();
        match entry.working_interpretation {
            WorkingInterpretation::Timing(t) => {
                assert_eq!(t.marker, TimingMarker::IfBang);
                assert_eq!(t.condition, "<is_empty>");
            }
            _ => panic!("expected timing"),
        }
    }

    #[test]
    fn judgement_requires_assertion_condition() {
        let err = InferenceEntry::from_record(record(
            "1.3",
            "judgement",
            json!({"paradigm": "p", "value_order": []}),
        ))
        .unwrap_err();
        assert!(err.to_string().contains("assertion_condition"));
    }

    #[test]
    fn parses_for_each_quantifier() {
        let entry = InferenceEntry::from_record(record(
            "1.4",
            "judgement",
            json!({
                "paradigm": "p",
                "value_order": ["{a}"],
                "assertion_condition": {"quantifier": "FOR_EACH", "truth_value": true}
            }),
        ))
        .unwrap();
        match entry.working_interpretation {
            WorkingInterpretation::Judgement(wi) => {
                assert_eq!(wi.assertion_condition.unwrap().quantifier, Quantifier::ForEach);
            }
            _ => panic!("expected judgement"),
        }
    }

    #[test]
    fn grouping_rejects_both_legacy_and_per_reference_fields() {
        let err = InferenceEntry::from_record(record(
            "1.5",
            "grouping",
            json!({"marker": "in", "by_axis_concepts": ["{a}"], "by_axes": [], "create_axis": "x"}),
        ))
        .unwrap_err();
        assert!(err.to_string().contains("grouping"));
    }
}
