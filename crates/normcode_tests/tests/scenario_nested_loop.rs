//! A `*.` loop nested inside another `*.` loop, driven end to end through
//! the Orchestrator (§4.7.4, §8 Scenario E): the outer loop carries a
//! growing accumulator across its two iterations, and each outer iteration
//! restarts a fresh inner loop over the same two-element base, so the
//! overall accumulated output has shape `(outer, inner)` rather than a
//! single flat axis.

use async_trait::async_trait;
use normcode_agent::{Agent, AgentRegistry, Body, Tool};
use normcode_blackboard::Blackboard;
use normcode_model::{ConceptRecord, ConceptRepo, InferenceRecord, InferenceRepo};
use normcode_orchestrator::Orchestrator;
use normcode_paradigm::{ArgRef, HorizontalStep, ParadigmRegistry, ParadigmSpec};
use normcode_perception::{InMemoryStore, InMemoryVfs, PerceptionRouter};
use serde_json::json;
use std::sync::Arc;

struct AddPair;

#[async_trait]
impl Tool for AddPair {
    fn name(&self) -> &str {
        "arith2"
    }
    async fn invoke(&self, _method: &str, args: &[serde_json::Value]) -> normcode_agent::Result<serde_json::Value> {
        let a = args[0].as_i64().unwrap_or(0);
        let b = args[1].as_i64().unwrap_or(0);
        Ok(json!(a + b))
    }
}

fn ground(name: &str, data: serde_json::Value, axes: Vec<&str>) -> ConceptRecord {
    ConceptRecord {
        concept_name: name.to_string(),
        kind: "object".to_string(),
        is_ground: true,
        is_final: false,
        reference_data: Some(data),
        reference_axes: axes.into_iter().map(str::to_string).collect(),
        natural_name: None,
    }
}

fn pending(name: &str, is_final: bool) -> ConceptRecord {
    ConceptRecord {
        concept_name: name.to_string(),
        kind: "object".to_string(),
        is_ground: false,
        is_final,
        reference_data: None,
        reference_axes: vec![],
        natural_name: None,
    }
}

/// Outer loop over `{outer_items}` = `[100, 200]` carries `{acc}` forward;
/// each outer iteration runs a fresh inner loop over `{inner_items}` =
/// `[1, 2]`, writing `{cell} = outer_item + inner_item` per inner position
/// and copying it into `{row}`, the outer loop's own `ConceptToInfer`.
#[tokio::test(flavor = "multi_thread")]
async fn outer_loop_carries_accumulator_across_nested_inner_loop_iterations() {
    let concepts = ConceptRepo::load(vec![
        ground("{outer_items}", json!([100, 200]), vec!["outer"]),
        ground("{inner_items}", json!([1, 2]), vec!["inner"]),
        ground("{acc}", json!([]), vec!["hist"]),
        ground("{op}", json!("noop"), vec![]),
        ground("{summer}", json!("agent"), vec![]),
        pending("{cell}", false),
        pending("{row}", true),
    ])
    .unwrap();

    let outer_wi = json!({
        "marker": "every",
        "loop_index": 1,
        "LoopBaseConcept": "{outer_items}",
        "CurrentLoopBaseConcept": "{outer_items*1}",
        "group_base": "outer",
        "InLoopConcept": {"{acc}": 1},
        "ConceptToInfer": ["{row}"]
    });

    let inner_wi = json!({
        "marker": "every",
        "loop_index": 2,
        "LoopBaseConcept": "{inner_items}",
        "CurrentLoopBaseConcept": "{inner_items*2}",
        "group_base": "inner",
        "InLoopConcept": {},
        "ConceptToInfer": ["{cell}"]
    });

    let repo = InferenceRepo::load(vec![
        InferenceRecord {
            flow_index: "1".to_string(),
            sequence_kind: "looping".to_string(),
            concept_to_infer: "{row}".to_string(),
            function_concept: "{op}".to_string(),
            value_concepts: vec![],
            context_concepts: vec![],
            working_interpretation: outer_wi,
            supporting_children: vec![],
        },
        InferenceRecord {
            flow_index: "1.1".to_string(),
            sequence_kind: "assigning".to_string(),
            concept_to_infer: "{acc}".to_string(),
            function_concept: "{op}".to_string(),
            value_concepts: vec!["{outer_items*1}".to_string()],
            context_concepts: vec![],
            working_interpretation: json!({"marker": "+", "by_axes": ["hist"]}),
            supporting_children: vec![],
        },
        InferenceRecord {
            flow_index: "1.2".to_string(),
            sequence_kind: "looping".to_string(),
            concept_to_infer: "{cell}".to_string(),
            function_concept: "{op}".to_string(),
            value_concepts: vec![],
            context_concepts: vec![],
            working_interpretation: inner_wi,
            supporting_children: vec![],
        },
        InferenceRecord {
            flow_index: "1.2.1".to_string(),
            sequence_kind: "imperative".to_string(),
            concept_to_infer: "{cell}".to_string(),
            function_concept: "{summer}".to_string(),
            value_concepts: vec!["{outer_items*1}".to_string(), "{inner_items*2}".to_string()],
            context_concepts: vec![],
            working_interpretation: json!({
                "paradigm": "add_pair",
                "value_order": ["{outer_items*1}", "{inner_items*2}"]
            }),
            supporting_children: vec![],
        },
        InferenceRecord {
            flow_index: "1.3".to_string(),
            sequence_kind: "assigning".to_string(),
            concept_to_infer: "{row}".to_string(),
            function_concept: "{op}".to_string(),
            value_concepts: vec!["{cell}".to_string()],
            context_concepts: vec![],
            working_interpretation: json!({"marker": "."}),
            supporting_children: vec![],
        },
    ])
    .unwrap();

    let mut agents = AgentRegistry::new();
    let mut body = Body::new();
    body.register("arith2", Arc::new(AddPair));
    agents.register("{summer}", Agent::new("{summer}", body));

    let mut paradigms = ParadigmRegistry::new();
    paradigms.insert(ParadigmSpec {
        paradigm_id: "add_pair".to_string(),
        v_setup: vec![],
        h_plan: vec![HorizontalStep {
            tool: "arith2".to_string(),
            method: "add_pair".to_string(),
            args: vec![ArgRef::Value { position: 0 }, ArgRef::Value { position: 1 }],
            output_format: None,
        }],
        create_axis_on_list_output: true,
    });

    let orchestrator = Orchestrator::new(
        agents,
        paradigms,
        PerceptionRouter::with_defaults(Arc::new(InMemoryVfs::new()), Arc::new(InMemoryStore::new())),
        300,
    );

    let mut blackboard = Blackboard::new();
    orchestrator.seed(&concepts, &mut blackboard);
    orchestrator.run(&concepts, &repo, &mut blackboard, None).await.unwrap();

    let row = blackboard.get_reference("{row}").unwrap();
    assert_eq!(row.axis_size("outer"), Some(2));
    assert_eq!(row.axis_size("inner"), Some(2));

    let expected = [[101, 102], [201, 202]];
    let mut seen = Vec::new();
    for (i, inner_expected) in expected.iter().enumerate() {
        for (j, value) in inner_expected.iter().enumerate() {
            let cell = row.get(&[i, j]).unwrap().as_primitive().unwrap();
            assert_eq!(cell, &json!(value));
            seen.push(cell.clone());
        }
    }
    seen.sort_by_key(|v| v.as_i64().unwrap());
    seen.dedup();
    assert_eq!(seen.len(), 4, "all four inner executions must produce distinct values");

    // The accumulator threaded the first outer iteration's appended value
    // forward into the second rather than resetting to the seed.
    let acc = blackboard.get_reference("{acc}").unwrap();
    assert_eq!(acc.axis_size("hist"), Some(2));
    assert_eq!(acc.get(&[0]).unwrap().as_primitive().unwrap(), &json!(100));
    assert_eq!(acc.get(&[1]).unwrap().as_primitive().unwrap(), &json!(200));

    assert!(blackboard.is_concept_ready("{row}"));
}
