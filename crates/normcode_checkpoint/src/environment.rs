//! Environment signature (§4.10 OVERWRITE mismatch check): a digest of the
//! loaded paradigm registry and tool set, recorded alongside a run and
//! compared against the *current* environment before an OVERWRITE resume
//! is allowed to proceed.

use normcode_agent::Body;
use normcode_paradigm::ParadigmRegistry;
use sha2::{Digest, Sha256};

/// Hashes the sorted paradigm ids and tool names together. Sorting first
/// makes the signature independent of registration order, which is
/// otherwise an implementation detail of how the plan's paradigm files and
/// Body were assembled, not something OVERWRITE should care about.
pub fn signature(paradigms: &ParadigmRegistry, body: &Body) -> String {
    let mut paradigm_ids: Vec<&str> = paradigms.ids().collect();
    paradigm_ids.sort_unstable();
    let mut tool_names: Vec<&str> = body.tool_names().collect();
    tool_names.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(b"paradigms:");
    hasher.update(paradigm_ids.join(",").as_bytes());
    hasher.update(b"|tools:");
    hasher.update(tool_names.join(",").as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_of_registration_does_not_affect_signature() {
        let mut a = ParadigmRegistry::new();
        let mut b = ParadigmRegistry::new();
        // Both registries empty here; the property under test is about
        // `Body`'s tool registration order, exercised below.
        let _ = (&mut a, &mut b);

        let mut body_a = Body::new();
        body_a.register("llm", std::sync::Arc::new(normcode_agent::UnconfiguredTool::new("llm")));
        body_a.register("file_system", std::sync::Arc::new(normcode_agent::UnconfiguredTool::new("file_system")));

        let mut body_b = Body::new();
        body_b.register("file_system", std::sync::Arc::new(normcode_agent::UnconfiguredTool::new("file_system")));
        body_b.register("llm", std::sync::Arc::new(normcode_agent::UnconfiguredTool::new("llm")));

        assert_eq!(signature(&a, &body_a), signature(&a, &body_b));
        assert_eq!(signature(&a, &body_a), signature(&b, &body_a));
    }

    #[test]
    fn different_tool_sets_produce_different_signatures() {
        let registry = ParadigmRegistry::new();
        let mut body_a = Body::new();
        body_a.register("llm", std::sync::Arc::new(normcode_agent::UnconfiguredTool::new("llm")));
        let body_b = Body::new();
        assert_ne!(signature(&registry, &body_a), signature(&registry, &body_b));
    }
}
