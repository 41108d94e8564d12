//! `InferenceRepo`: the immutable, load-time-validated plan graph (§4.3).

use crate::error::{ModelError, Result};
use crate::flow_index::FlowIndex;
use crate::inference::{InferenceEntry, InferenceRecord, WorkingInterpretation};
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug)]
pub struct InferenceRepo {
    entries: FxHashMap<FlowIndex, InferenceEntry>,
    sorted: Vec<FlowIndex>,
}

impl InferenceRepo {
    pub fn load(records: Vec<InferenceRecord>) -> Result<Self> {
        let mut entries = FxHashMap::default();
        let mut problems = Vec::new();

        for record in records {
            let flow_index_str = record.flow_index.clone();
            match InferenceEntry::from_record(record) {
                Ok(entry) => {
                    if entries.contains_key(&entry.flow_index) {
                        problems.push(format!("duplicate flow_index '{}'", flow_index_str));
                        continue;
                    }
                    entries.insert(entry.flow_index.clone(), entry);
                }
                Err(e) => problems.extend(e.problems),
            }
        }

        for entry in entries.values() {
            for child in &entry.supporting_children {
                if !entries.contains_key(child) {
                    problems.push(format!(
                        "inference {} names dangling supporting_children '{}'",
                        entry.flow_index, child
                    ));
                }
            }
        }

        if let Some(err) = ModelError::from_problems(problems) {
            return Err(err);
        }

        let mut sorted: Vec<FlowIndex> = entries.keys().cloned().collect();
        sorted.sort();

        let repo = InferenceRepo { entries, sorted };
        repo.validate_acyclic()?;
        Ok(repo)
    }

    pub fn get(&self, flow_index: &FlowIndex) -> Option<&InferenceEntry> {
        self.entries.get(flow_index)
    }

    /// Entries in lexicographic flow-index order (Waitlist order, §4.3).
    pub fn iterate_sorted(&self) -> impl Iterator<Item = &InferenceEntry> {
        self.sorted.iter().map(move |fi| &self.entries[fi])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds the dependency graph from `supporting_children` and rejects a
    /// cycle as `plan-validity`. Loop carry-distance back-edges (§9) are a
    /// structured exception recognized via `LoopingWI::in_loop_concept` and
    /// are not edges in this graph at all, so they never trip the check.
    fn validate_acyclic(&self) -> Result<()> {
        #[derive(PartialEq, Eq, Clone, Copy)]
        enum Mark {
            Visiting,
            Done,
        }
        let mut marks: FxHashMap<&FlowIndex, Mark> = FxHashMap::default();
        let mut stack_path: Vec<&FlowIndex> = Vec::new();

        fn visit<'a>(
            repo: &'a InferenceRepo,
            node: &'a FlowIndex,
            marks: &mut FxHashMap<&'a FlowIndex, Mark>,
            stack_path: &mut Vec<&'a FlowIndex>,
        ) -> std::result::Result<(), String> {
            match marks.get(node) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    let mut cycle: Vec<String> = stack_path.iter().map(|f| f.to_string()).collect();
                    cycle.push(node.to_string());
                    return Err(format!("dependency cycle: {}", cycle.join(" -> ")));
                }
                None => {}
            }
            marks.insert(node, Mark::Visiting);
            stack_path.push(node);
            if let Some(entry) = repo.entries.get(node) {
                for child in &entry.supporting_children {
                    visit(repo, child, marks, stack_path)?;
                }
            }
            stack_path.pop();
            marks.insert(node, Mark::Done);
            Ok(())
        }

        for fi in &self.sorted {
            if let Err(msg) = visit(self, fi, &mut marks, &mut stack_path) {
                return Err(ModelError::single(msg));
            }
        }
        Ok(())
    }

    /// The set of flow indices structurally belonging to a loop's subtree,
    /// i.e. descendants of the loop's own flow index, minus its declared
    /// invariants (§4.9 "Loop re-execution").
    pub fn loop_subtree(&self, loop_flow_index: &FlowIndex) -> Vec<FlowIndex> {
        let invariants: FxHashSet<FlowIndex> = match self.entries.get(loop_flow_index).map(|e| &e.working_interpretation) {
            Some(WorkingInterpretation::Looping(wi)) => wi.invariant_concepts.iter().cloned().collect(),
            _ => FxHashSet::default(),
        };
        self.sorted
            .iter()
            .filter(|fi| fi.is_descendant_of(loop_flow_index) && !invariants.contains(fi))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(flow_index: &str, children: Vec<&str>) -> InferenceRecord {
        InferenceRecord {
            flow_index: flow_index.to_string(),
            sequence_kind: "assigning".to_string(),
            concept_to_infer: "{out}".to_string(),
            function_concept: "{op}".to_string(),
            value_concepts: vec![],
            context_concepts: vec![],
            working_interpretation: json!({"marker": "."}),
            supporting_children: children.into_iter().map(str::to_string).collect(),
        }
    }

    #[test]
    fn loads_and_sorts_by_flow_index() {
        let repo = InferenceRepo::load(vec![record("1.2", vec![]), record("1.1", vec![])]).unwrap();
        let order: Vec<String> = repo.iterate_sorted().map(|e| e.flow_index.to_string()).collect();
        assert_eq!(order, vec!["1.1".to_string(), "1.2".to_string()]);
    }

    #[test]
    fn rejects_dangling_supporting_child() {
        let err = InferenceRepo::load(vec![record("1.1", vec!["9.9"])]).unwrap_err();
        assert!(err.to_string().contains("dangling"));
    }

    #[test]
    fn rejects_cycle() {
        let err = InferenceRepo::load(vec![record("1.1", vec!["1.2"]), record("1.2", vec!["1.1"])]).unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn rejects_duplicate_flow_index() {
        let err = InferenceRepo::load(vec![record("1.1", vec![]), record("1.1", vec![])]).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }
}
