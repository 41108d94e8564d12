//! `@:!(<is_empty>)` gating a subtree: once the condition is true the
//! entire gated subtree completes `completed_skipped` without running,
//! while an unrelated sibling branch still completes normally (§4.7.3,
//! §4.9, §8 Scenario C).

use normcode_agent::AgentRegistry;
use normcode_blackboard::{Blackboard, Status, Target};
use normcode_model::{ConceptRecord, ConceptRepo, InferenceRecord, InferenceRepo};
use normcode_orchestrator::Orchestrator;
use normcode_paradigm::ParadigmRegistry;
use normcode_perception::{InMemoryStore, InMemoryVfs, PerceptionRouter};
use serde_json::json;
use std::sync::Arc;

fn ground(name: &str, value: serde_json::Value) -> ConceptRecord {
    ConceptRecord {
        concept_name: name.to_string(),
        kind: "object".to_string(),
        is_ground: true,
        is_final: false,
        reference_data: Some(value),
        reference_axes: vec![],
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

fn identity(flow_index: &str, concept_to_infer: &str, value_concept: &str, supporting_children: Vec<&str>) -> InferenceRecord {
    InferenceRecord {
        flow_index: flow_index.to_string(),
        sequence_kind: "assigning".to_string(),
        concept_to_infer: concept_to_infer.to_string(),
        function_concept: "{op}".to_string(),
        value_concepts: vec![value_concept.to_string()],
        context_concepts: vec![],
        working_interpretation: json!({"marker": "="}),
        supporting_children: supporting_children.into_iter().map(str::to_string).collect(),
    }
}

fn harness() -> Orchestrator {
    Orchestrator::new(
        AgentRegistry::default(),
        ParadigmRegistry::default(),
        PerceptionRouter::with_defaults(Arc::new(InMemoryVfs::new()), Arc::new(InMemoryStore::new())),
        20,
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn gated_subtree_skips_while_unrelated_branch_completes() {
    let concepts = ConceptRepo::load(vec![
        ground("{op}", json!("noop")),
        ground("{is_empty}", json!(true)),
        ground("{a}", json!(1)),
        pending("{gated_root_out}", false),
        pending("{gated_1_out}", false),
        pending("{gated_2_out}", false),
        pending("{gated_3_out}", false),
        pending("{sibling_out}", false),
    ])
    .unwrap();

    let timing_wi = json!({"marker": "if!", "condition": "{is_empty}"});
    let repo = InferenceRepo::load(vec![
        // "1": the gated root, blocked on "1.1" (the timing sub-step)
        // completing before it is ever considered ready.
        identity("1", "{gated_root_out}", "{a}", vec!["1.1"]),
        InferenceRecord {
            flow_index: "1.1".to_string(),
            sequence_kind: "timing".to_string(),
            concept_to_infer: "{unused}".to_string(),
            function_concept: "{op}".to_string(),
            value_concepts: vec!["{is_empty}".to_string()],
            context_concepts: vec![],
            working_interpretation: timing_wi,
            supporting_children: vec![],
        },
        identity("1.2", "{gated_1_out}", "{gated_root_out}", vec![]),
        identity("1.3", "{gated_2_out}", "{gated_root_out}", vec![]),
        identity("1.4", "{gated_3_out}", "{gated_root_out}", vec![]),
        identity("2", "{sibling_out}", "{a}", vec![]),
    ])
    .unwrap();

    let orchestrator = harness();
    let mut blackboard = Blackboard::new();
    orchestrator.seed(&concepts, &mut blackboard);

    orchestrator.run(&concepts, &repo, &mut blackboard, None).await.unwrap();

    for flow_index in ["1", "1.2", "1.3", "1.4"] {
        assert_eq!(blackboard.status(&Target::Inference(flow_index.parse().unwrap())), Status::CompletedSkipped, "{} should be skipped", flow_index);
    }
    for concept in ["{gated_root_out}", "{gated_1_out}", "{gated_2_out}", "{gated_3_out}"] {
        assert!(blackboard.get_reference(concept).unwrap().get(&[0]).unwrap().is_skip());
    }

    assert_eq!(blackboard.status(&Target::Inference("1.1".parse().unwrap())), Status::Completed);
    assert_eq!(blackboard.status(&Target::Inference("2".parse().unwrap())), Status::Completed);
    assert!(blackboard.get_reference("{sibling_out}").unwrap().get(&[0]).unwrap().as_primitive().is_some());
}
