//! TIA (§4.8, judgement only): collapses TVA's elementwise output to a
//! verdict per `assertion_condition`. `FOR_EACH` does not collapse — it
//! produces a per-element boolean mask that downstream timing steps
//! consume as a filter (§4.7.3).

use crate::error::{Result, SemanticError};
use normcode_model::{AssertionCondition, Quantifier};
use normcode_reference::{Element, Reference};

fn element_matches(element: &Element, truth_value: &serde_json::Value) -> bool {
    match element.as_primitive() {
        Some(v) => v == truth_value,
        None => false,
    }
}

/// Returns the verdict reference: a singleton boolean for `ALL`/`EXISTS`,
/// or a same-shaped boolean tensor for `FOR_EACH`.
pub fn assert_truth(actuated: &Reference, condition: &AssertionCondition) -> Result<Reference> {
    match condition.quantifier {
        Quantifier::All => {
            let mut verdict = true;
            for idx in actuated.iter_index_tuples() {
                let element = actuated.get(&idx)?;
                if element.is_skip() {
                    continue;
                }
                if !element_matches(element, &condition.truth_value) {
                    verdict = false;
                    break;
                }
            }
            Ok(Reference::singleton(Element::Primitive(serde_json::Value::Bool(verdict))))
        }
        Quantifier::Exists => {
            let mut verdict = false;
            for idx in actuated.iter_index_tuples() {
                let element = actuated.get(&idx)?;
                if !element.is_skip() && element_matches(element, &condition.truth_value) {
                    verdict = true;
                    break;
                }
            }
            Ok(Reference::singleton(Element::Primitive(serde_json::Value::Bool(verdict))))
        }
        Quantifier::ForEach => {
            let mut tensor = Vec::with_capacity(actuated.len());
            for idx in actuated.iter_index_tuples() {
                let element = actuated.get(&idx)?;
                let matched = !element.is_skip() && element_matches(element, &condition.truth_value);
                tensor.push(Element::Primitive(serde_json::Value::Bool(matched)));
            }
            Ok(Reference::new(actuated.axes().to_vec(), actuated.shape().to_vec(), tensor)?)
        }
    }
}

/// Extracts the `FOR_EACH` mask as a plain `Vec<bool>`, for callers (the
/// Orchestrator's timing wiring) that need it outside a `Reference`.
pub fn for_each_mask(verdict: &Reference) -> Result<Vec<bool>> {
    let mut mask = Vec::with_capacity(verdict.len());
    for idx in verdict.iter_index_tuples() {
        let element = verdict.get(&idx)?;
        let b = element.as_primitive().and_then(|v| v.as_bool()).ok_or_else(|| {
            SemanticError::PlanValidity("FOR_EACH verdict reference contains a non-boolean element".to_string())
        })?;
        mask.push(b);
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tensor(values: Vec<Element>) -> Reference {
        let n = values.len();
        Reference::new(vec!["n".into()], vec![n], values).unwrap()
    }

    #[test]
    fn all_is_true_when_every_non_skip_element_matches() {
        let actuated = tensor(vec![Element::Primitive(json!(true)), Element::Skip, Element::Primitive(json!(true))]);
        let condition = AssertionCondition { quantifier: Quantifier::All, truth_value: json!(true) };
        let verdict = assert_truth(&actuated, &condition).unwrap();
        assert_eq!(verdict.get(&[0]).unwrap(), &Element::Primitive(json!(true)));
    }

    #[test]
    fn all_is_false_when_one_element_mismatches() {
        let actuated = tensor(vec![Element::Primitive(json!(true)), Element::Primitive(json!(false))]);
        let condition = AssertionCondition { quantifier: Quantifier::All, truth_value: json!(true) };
        let verdict = assert_truth(&actuated, &condition).unwrap();
        assert_eq!(verdict.get(&[0]).unwrap(), &Element::Primitive(json!(false)));
    }

    #[test]
    fn exists_is_true_with_a_single_match() {
        let actuated = tensor(vec![Element::Primitive(json!(false)), Element::Primitive(json!(true))]);
        let condition = AssertionCondition { quantifier: Quantifier::Exists, truth_value: json!(true) };
        let verdict = assert_truth(&actuated, &condition).unwrap();
        assert_eq!(verdict.get(&[0]).unwrap(), &Element::Primitive(json!(true)));
    }

    #[test]
    fn for_each_returns_a_same_shaped_mask_without_collapsing() {
        let actuated = tensor(vec![Element::Primitive(json!(true)), Element::Primitive(json!(false)), Element::Skip]);
        let condition = AssertionCondition { quantifier: Quantifier::ForEach, truth_value: json!(true) };
        let verdict = assert_truth(&actuated, &condition).unwrap();
        assert_eq!(verdict.len(), 3);
        let mask = for_each_mask(&verdict).unwrap();
        assert_eq!(mask, vec![true, false, false]);
    }
}
