//! The Paradigm Composer (§4.6): compiles a [`ParadigmSpec`] plus an
//! [`Agent`]'s Body into a single callable `Φ(V)`, via vertical (setup)
//! then horizontal (runtime) composition.
//!
//! `Φ` is stored as an `Element::Callable` inside the functional reference
//! produced by MFP (§4.8) — the shape `normcode-reference` already reserves
//! for exactly this. `Tool::invoke` is `async`; since `Callable` is a plain
//! synchronous closure (never written to a stored reference, so it never
//! needs to cross an `await` point on its own), the composed closure
//! bridges back into async with `block_in_place` + `Handle::block_on`,
//! which is sound because the Orchestrator always runs on a multi-thread
//! Tokio runtime (`rt-multi-thread`, already a workspace dependency) — the
//! call never happens on a current-thread runtime.

use crate::error::{ParadigmError, Result};
use crate::spec::{ArgRef, HorizontalStep, ParadigmSpec};
use normcode_agent::{Agent, Body};
use normcode_perception::{PerceptionRouter, Transmuted};
use normcode_reference::{CallError, Callable, Element};
use serde_json::Value;
use std::sync::Arc;

pub struct ParadigmComposer;

impl ParadigmComposer {
    pub fn new() -> Self {
        ParadigmComposer
    }

    /// Vertical + horizontal composition in one call: resolves every
    /// `v_setup` step against the Agent's Body (awaiting any perception
    /// transmutation and the tool's own `setup` invocation), then returns
    /// a callable closing over the resolved setup values and the ordered
    /// `h_plan` steps.
    pub async fn compose(&self, spec: &ParadigmSpec, agent: &Agent, perception: &PerceptionRouter) -> Result<Callable> {
        let mut setup_values: Vec<Value> = Vec::with_capacity(spec.v_setup.len());
        for step in &spec.v_setup {
            let tool = agent.body.get(&step.tool).ok_or_else(|| ParadigmError::UnknownTool { tool: step.tool.clone() })?;
            let resolved = resolve_signifier_selector(&step.signifier_selector, perception).await?;
            let bound = tool
                .invoke("setup", &[resolved])
                .await
                .map_err(|e| ParadigmError::SetupFailed { detail: e.to_string() })?;
            setup_values.push(bound);
        }

        let steps: Vec<HorizontalStep> = spec.h_plan.clone();
        let body = agent.body.clone();
        let setup_values = Arc::new(setup_values);

        Ok(Callable::new(move |args: &[Element]| -> std::result::Result<Element, CallError> {
            let steps = steps.clone();
            let body = body.clone();
            let setup_values = setup_values.clone();
            let args: Vec<Element> = args.to_vec();
            tokio::task::block_in_place(move || {
                tokio::runtime::Handle::current().block_on(run_horizontal(steps, body, setup_values, args))
            })
        }))
    }
}

impl Default for ParadigmComposer {
    fn default() -> Self {
        Self::new()
    }
}

/// `v_setup`'s `signifier_selector` is either a literal JSON value or a
/// perceptual-sign string naming data to transmute before handing it to
/// the tool's setup method (e.g. a prompt-template path).
async fn resolve_signifier_selector(selector: &Value, perception: &PerceptionRouter) -> Result<Value> {
    if let Value::String(s) = selector {
        if let Ok(sign) = normcode_reference::PerceptualSign::parse(s) {
            let transmuted = perception
                .transmute(&sign.norm, &sign.id, &sign.signifier)
                .await
                .map_err(|e| ParadigmError::SetupFailed { detail: e.to_string() })?;
            return Ok(match transmuted {
                Transmuted::Value(v) => v,
                Transmuted::Script(handle) => Value::String(handle.signifier),
            });
        }
    }
    Ok(selector.clone())
}

async fn run_horizontal(
    steps: Vec<HorizontalStep>,
    body: Body,
    setup_values: Arc<Vec<Value>>,
    args: Vec<Element>,
) -> std::result::Result<Element, CallError> {
    let mut prior: Option<Value> = None;
    for step in &steps {
        let tool = body.get(&step.tool).ok_or_else(|| CallError(format!("paradigm step references unknown tool '{}'", step.tool)))?;
        let mut call_args = Vec::with_capacity(step.args.len());
        for argref in &step.args {
            let value = match argref {
                ArgRef::Value { position } => element_to_value(element_at(&args, *position)?)?,
                ArgRef::Setup { position } => setup_values
                    .get(*position)
                    .cloned()
                    .ok_or_else(|| CallError(format!("paradigm setup index {} out of range", position)))?,
                ArgRef::PriorOutput => prior.clone().ok_or_else(|| CallError("paradigm step references prior output before one exists".to_string()))?,
                ArgRef::Literal { value } => value.clone(),
            };
            call_args.push(value);
        }
        let out = tool.invoke(&step.method, &call_args).await.map_err(|e| CallError(e.to_string()))?;
        prior = Some(out);
    }
    Ok(Element::Primitive(prior.unwrap_or(Value::Null)))
}

fn element_at(args: &[Element], position: i64) -> std::result::Result<&Element, CallError> {
    let len = args.len() as i64;
    let idx = if position < 0 { len + position } else { position };
    if idx < 0 || idx >= len {
        return Err(CallError(format!("paradigm value position {} out of range for {} argument(s)", position, args.len())));
    }
    Ok(&args[idx as usize])
}

fn element_to_value(element: &Element) -> std::result::Result<Value, CallError> {
    match element {
        Element::Primitive(v) => Ok(v.clone()),
        Element::Sign(s) => Ok(Value::String(s.format())),
        Element::Skip => Err(CallError("cannot pass a skip element as a paradigm step argument".to_string())),
        Element::Tuple(members) => Ok(Value::Array(members.iter().map(element_to_value).collect::<std::result::Result<_, _>>()?)),
        Element::Callable(_) => Err(CallError("cannot pass a callable element as a paradigm step argument".to_string())),
    }
}
