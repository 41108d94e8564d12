//! PATCH resume resets only the changed inference and its dependents (§4.10
//! [ADDED] "Reconciliation modes", §8 Scenario D): a plan with two
//! independent chains runs to completion and is checkpointed every cycle;
//! one chain's inference is then edited (its marker changes from `$=` to
//! `$.`, a content change the snapshot's hash does not recognize) and the
//! run resumes in PATCH mode. Only the edited inference and its transitive
//! dependent are reset to pending — the untouched chain stays settled and
//! is never re-executed.

use normcode_agent::AgentRegistry;
use normcode_blackboard::Blackboard;
use normcode_checkpoint::{patch, Snapshot, Store, StoreSink};
use normcode_model::{ConceptRecord, ConceptRepo, InferenceRecord, InferenceRepo};
use normcode_orchestrator::Orchestrator;
use normcode_paradigm::ParadigmRegistry;
use normcode_perception::{InMemoryStore, InMemoryVfs, PerceptionRouter};
use serde_json::json;
use std::sync::Arc;

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

fn identity_record(flow_index: &str, concept_to_infer: &str, value_concept: &str) -> InferenceRecord {
    InferenceRecord {
        flow_index: flow_index.to_string(),
        sequence_kind: "assigning".to_string(),
        concept_to_infer: concept_to_infer.to_string(),
        function_concept: "{op}".to_string(),
        value_concepts: vec![value_concept.to_string()],
        context_concepts: vec![],
        working_interpretation: json!({"marker": "="}),
        supporting_children: vec![],
    }
}

fn concepts() -> ConceptRepo {
    ConceptRepo::load(vec![
        ground("{a}", json!(1)),
        ground("{b}", json!(2)),
        ground("{op}", json!("noop")),
        pending("{mid}", false),
        pending("{out}", true),
        pending("{mid2}", false),
        pending("{out2}", true),
    ])
    .unwrap()
}

fn repo() -> InferenceRepo {
    InferenceRepo::load(vec![
        identity_record("1", "{mid}", "{a}"),
        identity_record("2", "{out}", "{mid}"),
        identity_record("3", "{mid2}", "{b}"),
        identity_record("4", "{out2}", "{mid2}"),
    ])
    .unwrap()
}

fn harness() -> Orchestrator {
    Orchestrator::new(
        AgentRegistry::default(),
        ParadigmRegistry::default(),
        PerceptionRouter::with_defaults(Arc::new(InMemoryVfs::new()), Arc::new(InMemoryStore::new())),
        50,
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn patch_resets_only_the_edited_chain_after_full_run() {
    let concepts = concepts();
    let repo = repo();

    let store = Store::open_in_memory().unwrap();
    store.create_run("run-a", None, None, "sig").unwrap();

    let orchestrator = harness();
    let mut blackboard = Blackboard::new();
    orchestrator.seed(&concepts, &mut blackboard);

    let mut sink = StoreSink::new(&store, "run-a", &repo);
    let report = orchestrator.run(&concepts, &repo, &mut blackboard, Some(&mut sink)).await.unwrap();

    assert!(blackboard.is_concept_ready("{out}"));
    assert!(blackboard.is_concept_ready("{out2}"));

    let (last_cycle, snapshot) = store.load_snapshot("run-a", None).unwrap();
    assert_eq!(last_cycle, report.cycles_run - 1, "Store indexes snapshots by the cycle just executed, 0-based");

    // The same plan, except "1" now reads as `$.` instead of `$=` — a
    // content change PATCH's hash comparison must notice even though the
    // result is equivalent (a single ready candidate).
    let edited_records = vec![
        InferenceRecord { working_interpretation: json!({"marker": "."}), ..identity_record("1", "{mid}", "{a}") },
        identity_record("2", "{out}", "{mid}"),
        identity_record("3", "{mid2}", "{b}"),
        identity_record("4", "{out2}", "{mid2}"),
    ];
    let edited_repo = InferenceRepo::load(edited_records).unwrap();

    let mut restored = patch(&edited_repo, &snapshot).unwrap();

    assert!(!restored.is_inference_ready(&"1".parse().unwrap()), "edited inference must reset to pending");
    assert!(!restored.is_inference_ready(&"2".parse().unwrap()), "1's dependent must reset to pending too");
    assert!(restored.is_inference_ready(&"3".parse().unwrap()), "the untouched chain must stay settled");
    assert!(restored.is_inference_ready(&"4".parse().unwrap()));
    assert!(restored.is_concept_ready("{out2}"), "unrelated output must survive PATCH without being recomputed");

    let resumed = orchestrator.run_from(last_cycle + 1, &concepts, &edited_repo, &mut restored, None).await.unwrap();
    assert!(resumed.cycles_run > last_cycle);

    assert!(restored.is_concept_ready("{out}"));
    assert_eq!(restored.get_reference("{out}").unwrap().get(&[0]).unwrap().as_primitive().unwrap(), &json!(1));
    assert_eq!(restored.get_reference("{out2}").unwrap().get(&[0]).unwrap().as_primitive().unwrap(), &json!(2));
}
