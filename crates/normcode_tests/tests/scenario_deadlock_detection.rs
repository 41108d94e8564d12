//! A failed producer permanently blocks its consumer (§8 Scenario F): `F1`
//! depends on concept `{c1}`, and `{c1}` is only produced by an imperative
//! inference `F2` whose tool always errors. Once `F2` exhausts its retry
//! budget it is marked `Failed` — and since `{c1}` is not a `is_final`
//! concept, the Orchestrator logs and presses on rather than surfacing the
//! failure directly — but `F1` never becomes ready. The next cycle makes no
//! progress and the run terminates with `deadlock-detected`, naming `F1`
//! and its unmet dependency `{c1}`.

use async_trait::async_trait;
use normcode_agent::{Agent, AgentRegistry, Body, Tool, ToolError};
use normcode_blackboard::Blackboard;
use normcode_model::{ConceptRecord, ConceptRepo, InferenceRecord, InferenceRepo};
use normcode_orchestrator::{Orchestrator, OrchestratorError};
use normcode_paradigm::{ArgRef, HorizontalStep, ParadigmRegistry, ParadigmSpec};
use normcode_perception::{InMemoryStore, InMemoryVfs, PerceptionRouter};
use serde_json::json;
use std::sync::Arc;

struct AlwaysFails;

#[async_trait]
impl Tool for AlwaysFails {
    fn name(&self) -> &str {
        "failer"
    }

    async fn invoke(&self, method: &str, _args: &[serde_json::Value]) -> normcode_agent::Result<serde_json::Value> {
        Err(ToolError::Invocation { tool: "failer".to_string(), method: method.to_string(), detail: "simulated permanent failure".to_string() })
    }
}

fn ground(name: &str, data: serde_json::Value) -> ConceptRecord {
    ConceptRecord {
        concept_name: name.to_string(),
        kind: "object".to_string(),
        is_ground: true,
        is_final: false,
        reference_data: Some(data),
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

#[tokio::test(flavor = "multi_thread")]
async fn failed_producer_leaves_its_consumer_permanently_blocked() {
    let concepts = ConceptRepo::load(vec![
        ground("{seed}", json!(1)),
        ground("{failer}", json!("agent")),
        ground("{op}", json!("noop")),
        pending("{c1}", false),
        pending("{out}", true),
    ])
    .unwrap();

    let repo = InferenceRepo::load(vec![
        InferenceRecord {
            flow_index: "1".to_string(),
            sequence_kind: "imperative".to_string(),
            concept_to_infer: "{c1}".to_string(),
            function_concept: "{failer}".to_string(),
            value_concepts: vec!["{seed}".to_string()],
            context_concepts: vec![],
            working_interpretation: json!({"paradigm": "p1", "value_order": ["{seed}"]}),
            supporting_children: vec![],
        },
        InferenceRecord {
            flow_index: "2".to_string(),
            sequence_kind: "assigning".to_string(),
            concept_to_infer: "{out}".to_string(),
            function_concept: "{op}".to_string(),
            value_concepts: vec!["{c1}".to_string()],
            context_concepts: vec![],
            working_interpretation: json!({"marker": "="}),
            supporting_children: vec![],
        },
    ])
    .unwrap();

    let mut agents = AgentRegistry::new();
    let mut body = Body::new();
    body.register("failer", Arc::new(AlwaysFails));
    agents.register("{failer}", Agent::new("{failer}", body));

    let mut paradigms = ParadigmRegistry::new();
    paradigms.insert(ParadigmSpec {
        paradigm_id: "p1".to_string(),
        v_setup: vec![],
        h_plan: vec![HorizontalStep { tool: "failer".to_string(), method: "run".to_string(), args: vec![ArgRef::Value { position: 0 }], output_format: None }],
        create_axis_on_list_output: true,
    });

    let orchestrator = Orchestrator::new(
        agents,
        paradigms,
        PerceptionRouter::with_defaults(Arc::new(InMemoryVfs::new()), Arc::new(InMemoryStore::new())),
        10,
    )
    .with_retry_budget(0);

    let mut blackboard = Blackboard::new();
    orchestrator.seed(&concepts, &mut blackboard);

    let err = orchestrator.run(&concepts, &repo, &mut blackboard, None).await.unwrap_err();

    match err {
        OrchestratorError::Deadlock { blocked, .. } => {
            let f1 = blocked.iter().find(|b| b.flow_index.to_string() == "2").expect("F1 (flow index 2) must be reported as blocked");
            assert!(f1.unmet.iter().any(|u| u == "{c1}"), "F1's unmet dependencies must name {{c1}}, got {:?}", f1.unmet);
        }
        other => panic!("expected deadlock-detected, got {:?}", other),
    }
}
