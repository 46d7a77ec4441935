use serde::{Deserialize, Serialize};

use super::render::{Renderer, TextRenderer};
use crate::{
    declaration::{AggregateDecl, Decl},
    resolver::ParameterNaming,
};

/// What to do with a case whose payload cannot be named.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnsupportedParameterPolicy {
    /// Nothing is generated and the offending slot is reported.
    #[default]
    Abort,
    /// The case is handled as if it were excluded from dispatch.
    DropVariant,
}

/// Fixed names of the generated shape.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Conventions {
    /// Name of the nested tagged union, also used to qualify its nested types.
    pub action_type: String,
    pub state_type: String,
    pub effect_type: String,
    /// Capability the host aggregate must conform to, adopted by the dispatch wrapper.
    pub capability: String,
    pub exclusion_attribute: String,
    pub dispatch_name: String,
    pub dispatch_method: String,
    pub handler_field: String,
    pub interface_suffix: String,
    pub state_parameter: String,
    pub no_op: String,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            action_type: "Action".to_owned(),
            state_type: "State".to_owned(),
            effect_type: "Effect".to_owned(),
            capability: "Reducer".to_owned(),
            exclusion_attribute: "SkipDispatch".to_owned(),
            dispatch_name: "Dispatch".to_owned(),
            dispatch_method: "reduce".to_owned(),
            handler_field: "actionDelegate".to_owned(),
            interface_suffix: "ActionDelegate".to_owned(),
            state_parameter: "state".to_owned(),
            no_op: ".none".to_owned(),
        }
    }
}

/// Tells whether an aggregate participates in the reducer capability.
pub trait ReducerPredicate {
    fn is_reducer_like(&self, decl: &Decl, aggregate: &AggregateDecl) -> bool;
}

impl<F> ReducerPredicate for F
where
    F: Fn(&Decl, &AggregateDecl) -> bool,
{
    fn is_reducer_like(&self, decl: &Decl, aggregate: &AggregateDecl) -> bool {
        self(decl, aggregate)
    }
}

/// Accepts aggregates which either list the capability in their inherited types, or carry an
/// attribute of the same name.
#[derive(Debug, new)]
pub struct ConformanceOrAttribute {
    capability: String,
}

impl ReducerPredicate for ConformanceOrAttribute {
    fn is_reducer_like(&self, decl: &Decl, aggregate: &AggregateDecl) -> bool {
        aggregate
            .inherited_types()
            .iter()
            .any(|ty| ty.to_string() == self.capability)
            || decl.attribute(&self.capability).is_some()
    }
}

pub struct GeneratorConfig {
    naming: ParameterNaming,
    unsupported_parameter: UnsupportedParameterPolicy,
    conventions: Conventions,
    reducer: Box<dyn ReducerPredicate>,
    renderer: Box<dyn Renderer>,
}

impl GeneratorConfig {
    /// Creates a configuration checking the reducer capability named in `conventions`.
    pub fn new(conventions: Conventions) -> Self {
        Self {
            naming: ParameterNaming::default(),
            unsupported_parameter: UnsupportedParameterPolicy::default(),
            reducer: Box::new(ConformanceOrAttribute::new(conventions.capability.clone())),
            renderer: Box::new(TextRenderer),
            conventions,
        }
    }

    pub fn with_naming(mut self, naming: ParameterNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_unsupported_parameter(mut self, policy: UnsupportedParameterPolicy) -> Self {
        self.unsupported_parameter = policy;
        self
    }

    pub fn with_reducer_predicate<P>(mut self, predicate: P) -> Self
    where
        P: ReducerPredicate + 'static,
    {
        self.reducer = Box::new(predicate);
        self
    }

    pub fn with_renderer<R>(mut self, renderer: R) -> Self
    where
        R: Renderer + 'static,
    {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn naming(&self) -> ParameterNaming {
        self.naming
    }

    pub fn unsupported_parameter(&self) -> UnsupportedParameterPolicy {
        self.unsupported_parameter
    }

    pub fn conventions(&self) -> &Conventions {
        &self.conventions
    }

    pub fn reducer(&self) -> &dyn ReducerPredicate {
        self.reducer.as_ref()
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::new(Conventions::default())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::declaration::{DeclNode, DeclTree};

    fn is_reducer_like(config: &GeneratorConfig, node: DeclNode) -> bool {
        let tree = DeclTree::from_root(node);
        let decl = &tree[tree.root()];
        let aggregate = decl.as_aggregate().expect("aggregate");
        config.reducer().is_reducer_like(decl, aggregate)
    }

    #[test]
    fn should_accept_conformance_or_attribute() {
        let config = GeneratorConfig::default();
        assert!(is_reducer_like(
            &config,
            DeclNode::structure("Feature")
                .inherits("Equatable")
                .inherits("Reducer")
        ));
        assert!(is_reducer_like(
            &config,
            DeclNode::structure("Feature").attribute("Reducer")
        ));
        assert!(!is_reducer_like(
            &config,
            DeclNode::structure("Feature").inherits("ReducerOf<Feature>")
        ));
    }

    #[test]
    fn should_use_custom_predicate() {
        let config = GeneratorConfig::default()
            .with_reducer_predicate(|_: &Decl, aggregate: &AggregateDecl| {
                aggregate.name().ends_with("Feature")
            });
        assert!(is_reducer_like(&config, DeclNode::structure("LoginFeature")));
        assert!(!is_reducer_like(&config, DeclNode::structure("Login")));
    }

    #[test]
    fn should_deserialize_partial_conventions() {
        let conventions: Conventions =
            serde_json::from_str(r#"{ "effect_type": "Task", "no_op": "nil" }"#)
                .expect("conventions");
        assert_eq!(
            conventions,
            Conventions {
                effect_type: "Task".to_owned(),
                no_op: "nil".to_owned(),
                ..Conventions::default()
            }
        );
    }
}
