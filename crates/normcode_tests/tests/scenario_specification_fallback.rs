//! `$.` picks the first completed, non-skip candidate and never calls out
//! to an agent to do it (§4.7.1, §8 Scenario B).

use normcode_agent::AgentRegistry;
use normcode_blackboard::Blackboard;
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

fn pending(name: &str) -> ConceptRecord {
    ConceptRecord {
        concept_name: name.to_string(),
        kind: "object".to_string(),
        is_ground: false,
        is_final: true,
        reference_data: None,
        reference_axes: vec![],
        natural_name: None,
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
async fn falls_back_to_first_completed_non_skip_candidate() {
    // {a} is never given a reference (stands in for a failed producer),
    // {b} is the only completed candidate, {c} would complete in a later
    // cycle if it were ever reached.
    let concepts = ConceptRepo::load(vec![
        ground("{b}", json!("chosen value")),
        ground("{op}", json!("noop")),
        pending("{a}"),
        pending("{c}"),
        pending("{out}"),
    ])
    .unwrap();
    let repo = InferenceRepo::load(vec![InferenceRecord {
        flow_index: "1".to_string(),
        sequence_kind: "assigning".to_string(),
        concept_to_infer: "{out}".to_string(),
        function_concept: "{op}".to_string(),
        value_concepts: vec!["{a}".to_string(), "{b}".to_string(), "{c}".to_string()],
        context_concepts: vec![],
        working_interpretation: json!({"marker": "."}),
        supporting_children: vec![],
    }])
    .unwrap();

    let orchestrator = harness();
    let mut blackboard = Blackboard::new();
    orchestrator.seed(&concepts, &mut blackboard);

    let report = orchestrator.run(&concepts, &repo, &mut blackboard, None).await.unwrap();

    assert_eq!(report.cycles_run, 1);
    assert_eq!(blackboard.get_reference("{out}").unwrap().get(&[0]).unwrap().as_primitive(), Some(&json!("chosen value")));
}
