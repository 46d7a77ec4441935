//! Validation of the annotated aggregate and synthesis of its dispatch wrapper and handler
//! interface.

use std::{collections::VecDeque, iter::once};

use tracing::{debug, trace, warn};

use self::{
    config::{Conventions, GeneratorConfig, UnsupportedParameterPolicy},
    output::{
        ArmBody, CallArgument, CallValue, DispatchArm, DispatchBody, DispatchDecl, Generated,
        HandlerCall, HandlerParameter, HandlerSignature, InterfaceDecl, StateParameter, TypeAlias,
        Visibility,
    },
    render::{render_dispatch, render_interface},
};
use crate::{
    declaration::{
        AggregateDecl, AggregateKind, Decl, DeclId, DeclKind, DeclTree, PathSegment, Span,
        TaggedUnion, TypeRef, Variant,
    },
    diagnostic::{Diagnostic, DiagnosticKind},
    resolver::{derive_argument_label, derive_parameter_names, qualify_type},
};

pub mod config;
pub mod output;
pub mod render;

/// Host aggregate which passed the top-level validation, with its nested tagged union.
#[derive(Clone, Copy, Debug)]
pub struct ReducerDecl<'t> {
    decl: &'t Decl,
    aggregate: &'t AggregateDecl,
    action: &'t AggregateDecl,
}

impl<'t> ReducerDecl<'t> {
    pub fn decl(&self) -> &'t Decl {
        self.decl
    }

    pub fn aggregate(&self) -> &'t AggregateDecl {
        self.aggregate
    }

    /// Gets the nested tagged union.
    pub fn action(&self) -> &'t AggregateDecl {
        self.action
    }

    pub fn name(&self) -> &'t str {
        self.aggregate.name()
    }
}

/// Checks, in that order, that `root` is a struct, that it is reducer-like and that it holds
/// exactly one nested `Action` enum.
pub fn validate_top_level<'t>(
    tree: &'t DeclTree,
    root: DeclId,
    annotation: Span,
    config: &GeneratorConfig,
) -> Result<ReducerDecl<'t>, Diagnostic> {
    let decl = tree.get(root).ok_or_else(|| {
        Diagnostic::new(
            DiagnosticKind::Unknown(format!("declaration #{} not found", root)),
            annotation,
        )
    })?;
    let aggregate = decl
        .as_aggregate()
        .filter(|aggregate| aggregate.kind() == AggregateKind::Struct)
        .ok_or_else(|| Diagnostic::new(DiagnosticKind::InvalidRootNodeType, annotation))?;

    if !config.reducer().is_reducer_like(decl, aggregate) {
        return Err(Diagnostic::new(
            DiagnosticKind::ReducerConformanceNotFound,
            aggregate.name_span(),
        ));
    }

    let action_type = config.conventions().action_type.as_str();
    let mut actions = tree.members(aggregate).filter_map(|member| {
        member
            .as_aggregate()
            .filter(|nested| nested.kind() == AggregateKind::Enum && nested.name() == action_type)
            .map(|nested| (member, nested))
    });
    match (actions.next(), actions.next()) {
        (Some((_, action)), None) => Ok(ReducerDecl {
            decl,
            aggregate,
            action,
        }),
        (Some(_), Some((duplicate, _))) => Err(Diagnostic::new(
            DiagnosticKind::NestedActionRequired,
            duplicate.span(),
        )),
        (None, _) => Err(Diagnostic::new(
            DiagnosticKind::NestedActionRequired,
            missing_action_span(tree, aggregate, action_type, annotation),
        )),
    }
}

/// Best effort location of a member which looks like a misplaced `Action`.
fn missing_action_span(
    tree: &DeclTree,
    aggregate: &AggregateDecl,
    action_type: &str,
    annotation: Span,
) -> Span {
    let needle = format!(" {} ", action_type);
    tree.members(aggregate)
        .find(|member| member.text().contains(&needle))
        .map_or(annotation, Decl::span)
}

/// The exclusion attribute is only allowed on enum cases.
pub fn check_exclusion_usage(decl: &Decl, config: &GeneratorConfig) -> Result<(), Diagnostic> {
    match (
        decl.kind(),
        decl.attribute(&config.conventions().exclusion_attribute),
    ) {
        (DeclKind::Case(_), _) | (_, None) => Ok(()),
        (DeclKind::Aggregate(_) | DeclKind::Other, Some(attribute)) => Err(Diagnostic::new(
            DiagnosticKind::IncorrectAttributeUsage,
            attribute.span(),
        )),
    }
}

fn check_exclusion_usage_in_subtree(
    tree: &DeclTree,
    root: DeclId,
    config: &GeneratorConfig,
) -> Result<(), Diagnostic> {
    let mut queue = VecDeque::from([root]);
    while let Some(id) = queue.pop_front() {
        let decl = &tree[id];
        check_exclusion_usage(decl, config)?;
        if let Some(aggregate) = decl.as_aggregate() {
            queue.extend(aggregate.members());
        }
    }
    Ok(())
}

enum ResolvedVariant<'u> {
    /// No-op arm, no handler method.
    Skipped(&'u Variant),
    Forwarded {
        variant: &'u Variant,
        names: Vec<String>,
    },
}

fn resolve_variants<'u>(
    union: &'u TaggedUnion,
    config: &GeneratorConfig,
) -> Result<Vec<ResolvedVariant<'u>>, Diagnostic> {
    let conventions = config.conventions();
    let reserved = [
        conventions.state_parameter.as_str(),
        conventions.handler_field.as_str(),
    ];
    union
        .variants()
        .iter()
        .map(|variant| {
            trace!(
                variant = variant.name(),
                slots = variant.slots().len(),
                excluded = variant.is_excluded(),
                "resolving variant"
            );
            if variant.is_excluded() {
                return Ok(ResolvedVariant::Skipped(variant));
            }
            match derive_parameter_names(variant, config.naming(), &reserved) {
                Ok(names) => Ok(ResolvedVariant::Forwarded { variant, names }),
                Err(diagnostic) => match config.unsupported_parameter() {
                    UnsupportedParameterPolicy::Abort => Err(diagnostic),
                    UnsupportedParameterPolicy::DropVariant => {
                        warn!(
                            variant = variant.name(),
                            %diagnostic,
                            "variant dropped from dispatch"
                        );
                        Ok(ResolvedVariant::Skipped(variant))
                    }
                },
            }
        })
        .collect()
}

fn interface_name(reducer: &ReducerDecl, conventions: &Conventions) -> String {
    format!("{}{}", reducer.name(), conventions.interface_suffix)
}

fn state_argument(conventions: &Conventions) -> CallArgument {
    CallArgument::new(
        Some(conventions.state_parameter.clone()),
        CallValue::State(conventions.state_parameter.clone()),
    )
}

fn dispatch_arm(resolved: &ResolvedVariant, conventions: &Conventions) -> DispatchArm {
    match resolved {
        ResolvedVariant::Skipped(variant) => {
            DispatchArm::new(variant.name().to_owned(), Vec::new(), ArmBody::NoOp)
        }
        ResolvedVariant::Forwarded { variant, names } => {
            let arguments = variant
                .slots()
                .iter()
                .zip(names)
                .map(|(slot, name)| {
                    let label = derive_argument_label(slot, name);
                    CallArgument::new(
                        label.call_label(name).map(str::to_owned),
                        CallValue::Binding(name.clone()),
                    )
                })
                .chain(once(state_argument(conventions)))
                .collect();
            DispatchArm::new(
                variant.name().to_owned(),
                names.clone(),
                ArmBody::Forward(HandlerCall::new(
                    conventions.handler_field.clone(),
                    variant.name().to_owned(),
                    arguments,
                )),
            )
        }
    }
}

fn build_dispatch(
    reducer: &ReducerDecl,
    resolved: &[ResolvedVariant],
    config: &GeneratorConfig,
) -> DispatchDecl {
    let conventions = config.conventions();
    let forwards = resolved
        .iter()
        .any(|resolved| matches!(resolved, ResolvedVariant::Forwarded { .. }));
    let body = if forwards {
        DispatchBody::Match(
            resolved
                .iter()
                .map(|resolved| dispatch_arm(resolved, conventions))
                .collect(),
        )
    } else {
        DispatchBody::NoOp
    };
    DispatchDecl {
        name: conventions.dispatch_name.clone(),
        capability: conventions.capability.clone(),
        handler_field: conventions.handler_field.clone(),
        handler_type: interface_name(reducer, conventions),
        body,
    }
}

fn handler_signature(
    variant: &Variant,
    names: &[String],
    union: &TaggedUnion,
    conventions: &Conventions,
) -> HandlerSignature {
    HandlerSignature {
        name: variant.name().to_owned(),
        parameters: variant
            .slots()
            .iter()
            .zip(names)
            .map(|(slot, name)| {
                HandlerParameter::new(
                    derive_argument_label(slot, name),
                    name.clone(),
                    qualify_type(slot.ty(), union.nested_type_names(), union.name()),
                )
            })
            .collect(),
        state: StateParameter::new(
            conventions.state_parameter.clone(),
            TypeRef::path([conventions.state_type.as_str()]),
        ),
        returns: TypeRef::Path(vec![PathSegment::new(
            conventions.effect_type.clone(),
            vec![TypeRef::path([conventions.action_type.as_str()])],
        )]),
    }
}

fn build_interface(
    reducer: &ReducerDecl,
    union: &TaggedUnion,
    resolved: &[ResolvedVariant],
    config: &GeneratorConfig,
) -> InterfaceDecl {
    let conventions = config.conventions();
    let host = reducer.name();
    InterfaceDecl {
        visibility: Visibility::from_modifiers(reducer.aggregate().modifiers()),
        name: interface_name(reducer, conventions),
        aliases: vec![
            TypeAlias::new(
                conventions.state_type.clone(),
                TypeRef::path([host, conventions.state_type.as_str()]),
            ),
            TypeAlias::new(
                conventions.action_type.clone(),
                TypeRef::path([host, union.name()]),
            ),
        ],
        methods: resolved
            .iter()
            .filter_map(|resolved| match resolved {
                ResolvedVariant::Skipped(_) => None,
                ResolvedVariant::Forwarded { variant, names } => {
                    Some(handler_signature(variant, names, union, conventions))
                }
            })
            .collect(),
    }
}

fn aborted(diagnostic: Diagnostic) -> Diagnostic {
    debug!(
        code = diagnostic.kind().code(),
        span = ?diagnostic.span(),
        %diagnostic,
        "generation aborted"
    );
    diagnostic
}

fn prepare<'t>(
    tree: &'t DeclTree,
    root: DeclId,
    annotation: Span,
    config: &GeneratorConfig,
) -> Result<(ReducerDecl<'t>, TaggedUnion), Diagnostic> {
    let reducer = validate_top_level(tree, root, annotation, config)?;
    check_exclusion_usage_in_subtree(tree, root, config)?;
    let union = TaggedUnion::from_decl(
        tree,
        reducer.action(),
        &config.conventions().exclusion_attribute,
    );
    Ok((reducer, union))
}

/// Generates the dispatch wrapper and the handler interface of the aggregate `root`.
///
/// Generation is all-or-nothing: the first problem aborts it and is returned, located in the
/// host source.
pub fn generate(
    tree: &DeclTree,
    root: DeclId,
    annotation: Span,
    config: &GeneratorConfig,
) -> Result<Generated, Diagnostic> {
    debug!(%root, "generating action dispatch");
    let (reducer, union) = prepare(tree, root, annotation, config).map_err(aborted)?;
    let resolved = resolve_variants(&union, config).map_err(aborted)?;

    let generated = Generated {
        dispatch: build_dispatch(&reducer, &resolved, config),
        interface: build_interface(&reducer, &union, &resolved, config),
    };
    debug!(
        reducer = reducer.name(),
        arms = generated.dispatch.arms().len(),
        methods = generated.interface.methods.len(),
        "generated action dispatch"
    );
    Ok(generated)
}

/// Generates the dispatch wrapper only.
pub fn generate_dispatch(
    tree: &DeclTree,
    root: DeclId,
    annotation: Span,
    config: &GeneratorConfig,
) -> Result<DispatchDecl, Diagnostic> {
    debug!(%root, "generating dispatch wrapper");
    let (reducer, union) = prepare(tree, root, annotation, config).map_err(aborted)?;
    let resolved = resolve_variants(&union, config).map_err(aborted)?;
    Ok(build_dispatch(&reducer, &resolved, config))
}

/// Rendered declarations for the host to splice into the program.
///
/// Either the declarations are there and there is no diagnostic, or the other way around.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Expansion {
    /// Declarations to add inside the annotated aggregate.
    pub members: Vec<String>,
    /// Declarations to add next to the annotated aggregate.
    pub peers: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Expansion {
    pub fn is_success(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

pub fn expand(
    tree: &DeclTree,
    root: DeclId,
    annotation: Span,
    config: &GeneratorConfig,
) -> Expansion {
    let rendered = generate(tree, root, annotation, config).and_then(|generated| {
        let classify =
            |error: std::fmt::Error| aborted(Diagnostic::classify(&error, annotation));
        let member = render_dispatch(
            config.renderer(),
            &generated.dispatch,
            config.conventions(),
        )
        .map_err(classify)?;
        let peer = render_interface(
            config.renderer(),
            &generated.interface,
            config.conventions(),
        )
        .map_err(classify)?;
        Ok((member, peer))
    });
    match rendered {
        Ok((member, peer)) => Expansion {
            members: vec![member],
            peers: vec![peer],
            diagnostics: Vec::new(),
        },
        Err(diagnostic) => Expansion {
            diagnostics: vec![diagnostic],
            ..Expansion::default()
        },
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt;

    use assert_matches::assert_matches;
    use codegen::Formatter;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{render::Renderer, *};
    use crate::{
        declaration::{Attribute, DeclNode, PayloadSlot},
        resolver::{ArgumentLabel, ParameterNaming},
    };

    const ANNOTATION: Span = Span { start: 0, end: 15 };

    fn feature() -> DeclNode {
        DeclNode::structure("Feature")
            .with_name_span(Span::new(23, 30))
            .inherits("Reducer")
            .member(DeclNode::structure("State"))
    }

    fn action() -> DeclNode {
        DeclNode::enumeration("Action")
    }

    fn generate_with(root: DeclNode, config: &GeneratorConfig) -> Result<Generated, Diagnostic> {
        let tree = DeclTree::from_root(root);
        generate(&tree, tree.root(), ANNOTATION, config)
    }

    fn generate_from(root: DeclNode) -> Result<Generated, Diagnostic> {
        generate_with(root, &GeneratorConfig::default())
    }

    fn state_argument() -> CallArgument {
        CallArgument::new(
            Some("state".to_owned()),
            CallValue::State("state".to_owned()),
        )
    }

    fn binding(label: Option<&str>, name: &str) -> CallArgument {
        CallArgument::new(
            label.map(str::to_owned),
            CallValue::Binding(name.to_owned()),
        )
    }

    #[test]
    fn should_forward_case_without_payload() {
        let generated =
            generate_from(feature().member(action().member(DeclNode::case("ping"))))
                .expect("generated");

        assert_eq!(
            generated.dispatch.body,
            DispatchBody::Match(vec![DispatchArm::new(
                "ping".to_owned(),
                Vec::new(),
                ArmBody::Forward(HandlerCall::new(
                    "actionDelegate".to_owned(),
                    "ping".to_owned(),
                    vec![state_argument()],
                )),
            )])
        );
        assert_eq!(
            generated.interface.methods,
            vec![HandlerSignature {
                name: "ping".to_owned(),
                parameters: Vec::new(),
                state: StateParameter::new("state".to_owned(), TypeRef::path(["State"])),
                returns: TypeRef::from("Effect<Action>"),
            }]
        );
        assert_eq!(generated.interface.methods[0].arity(), 1);
    }

    #[rstest]
    #[case(ParameterNaming::TypeDerived, "action")]
    #[case(ParameterNaming::Positional, "value0")]
    fn should_name_unnamed_payload(#[case] naming: ParameterNaming, #[case] expected: &str) {
        let config = GeneratorConfig::default().with_naming(naming);
        let generated = generate_with(
            feature().member(
                action().member(DeclNode::case("child").slot(PayloadSlot::unnamed("Child.Action"))),
            ),
            &config,
        )
        .expect("generated");

        let arm = &generated.dispatch.arms()[0];
        assert_eq!(arm.bindings, vec![expected.to_owned()]);
        assert_matches!(
            &arm.body,
            ArmBody::Forward(call) if call.arguments == vec![binding(None, expected), state_argument()]
        );
        assert_eq!(
            generated.interface.methods[0].parameters,
            vec![HandlerParameter::new(
                ArgumentLabel::Unlabeled,
                expected.to_owned(),
                TypeRef::from("Child.Action"),
            )]
        );
    }

    #[test]
    fn should_qualify_nested_generic_payload() {
        let generated = generate_from(
            feature().member(
                action()
                    .member(DeclNode::structure("Payload"))
                    .member(
                        DeclNode::case("response")
                            .slot(PayloadSlot::unnamed("Result<Payload, Error>")),
                    ),
            ),
        )
        .expect("generated");

        let parameter = &generated.interface.methods[0].parameters[0];
        assert_eq!(parameter.name, "result");
        assert_eq!(parameter.ty.to_string(), "Result<Action.Payload, Error>");
        assert_eq!(generated.dispatch.arms()[0].bindings, vec!["result"]);
    }

    #[test]
    fn should_pass_named_payloads_by_label() {
        let generated = generate_from(
            feature().member(
                action().member(
                    DeclNode::case("child")
                        .slot(PayloadSlot::labeled("id", "UUID"))
                        .slot(PayloadSlot::labeled("action", "Child.Action")),
                ),
            ),
        )
        .expect("generated");

        let arm = &generated.dispatch.arms()[0];
        assert_eq!(arm.bindings, vec!["id", "action"]);
        assert_matches!(
            &arm.body,
            ArmBody::Forward(call) if call.arguments == vec![
                binding(Some("id"), "id"),
                binding(Some("action"), "action"),
                state_argument(),
            ]
        );
        let labels = generated.interface.methods[0]
            .parameters
            .iter()
            .map(|parameter| parameter.label.clone())
            .collect::<Vec<_>>();
        assert_eq!(labels, vec![ArgumentLabel::Named, ArgumentLabel::Named]);
    }

    #[test]
    fn should_mix_payload_labels() {
        let generated = generate_from(
            feature().member(
                action().member(
                    DeclNode::case("select")
                        .slot(PayloadSlot::unnamed("Int"))
                        .slot(PayloadSlot::labeled("animated", "Bool"))
                        .slot(PayloadSlot::relabeled("for", "index", "Int"))
                        .slot(PayloadSlot::relabeled("id", "id", "UUID")),
                ),
            ),
        )
        .expect("generated");

        let arm = &generated.dispatch.arms()[0];
        assert_eq!(arm.bindings, vec!["int", "animated", "index", "id"]);
        assert_matches!(
            &arm.body,
            ArmBody::Forward(call) if call.arguments == vec![
                binding(None, "int"),
                binding(Some("animated"), "animated"),
                binding(Some("for"), "index"),
                binding(Some("id"), "id"),
                state_argument(),
            ]
        );
        assert_eq!(
            generated.interface.methods[0].parameters,
            vec![
                HandlerParameter::new(
                    ArgumentLabel::Unlabeled,
                    "int".to_owned(),
                    TypeRef::from("Int")
                ),
                HandlerParameter::new(
                    ArgumentLabel::Named,
                    "animated".to_owned(),
                    TypeRef::from("Bool")
                ),
                HandlerParameter::new(
                    ArgumentLabel::Relabeled("for".to_owned()),
                    "index".to_owned(),
                    TypeRef::from("Int")
                ),
                HandlerParameter::new(
                    ArgumentLabel::Relabeled("id".to_owned()),
                    "id".to_owned(),
                    TypeRef::from("UUID")
                ),
            ]
        );
    }

    #[test]
    fn should_not_shadow_state_nor_handler() {
        let tree = DeclTree::from_root(
            feature().member(
                action()
                    .member(DeclNode::case("load").slot(PayloadSlot::unnamed("State")))
                    .member(DeclNode::case("save").slot(PayloadSlot::labeled("state", "Int")))
                    .member(
                        DeclNode::case("attach").slot(PayloadSlot::unnamed("ActionDelegate")),
                    ),
            ),
        );

        let expansion = expand(&tree, tree.root(), ANNOTATION, &GeneratorConfig::default());

        assert!(expansion.is_success(), "{:?}", expansion.diagnostics);
        let member = &expansion.members[0];
        assert!(member.contains(
            "        case let .load(state0):\n            return actionDelegate.load(state0, state: &state)\n"
        ));
        assert!(member.contains(
            "        case let .save(state0):\n            return actionDelegate.save(state: state0, state: &state)\n"
        ));
        assert!(member.contains(
            "        case let .attach(actionDelegate0):\n            return actionDelegate.attach(actionDelegate0, state: &state)\n"
        ));
        let peer = &expansion.peers[0];
        assert!(peer.contains("func load(_ state0: State, state: inout State) -> Effect<Action>"));
        assert!(peer.contains("func save(state state0: Int, state: inout State) -> Effect<Action>"));
        assert!(peer.contains(
            "func attach(_ actionDelegate0: ActionDelegate, state: inout State) -> Effect<Action>"
        ));
    }

    #[test]
    fn should_qualify_sugared_payloads() {
        let generated = generate_from(
            feature().member(
                action()
                    .member(DeclNode::structure("Payload"))
                    .member(
                        DeclNode::case("update")
                            .slot(PayloadSlot::labeled("payload", "Payload?"))
                            .slot(PayloadSlot::labeled("all", "[String: [Payload]]")),
                    ),
            ),
        )
        .expect("generated");

        let types = generated.interface.methods[0]
            .parameters
            .iter()
            .map(|parameter| parameter.ty.to_string())
            .collect::<Vec<_>>();
        assert_eq!(types, vec!["Action.Payload?", "[String: [Action.Payload]]"]);
    }

    #[test]
    fn should_report_overly_nested_payload() {
        let deep = format!("{}Int{}", "Array<".repeat(200_000), ">".repeat(200_000));
        let tree = DeclTree::from_root(
            feature().member(
                action().member(
                    DeclNode::case("deep")
                        .slot(PayloadSlot::unnamed(deep.as_str()).with_span(Span::new(40, 50))),
                ),
            ),
        );

        let expansion = expand(&tree, tree.root(), ANNOTATION, &GeneratorConfig::default());

        assert!(expansion.members.is_empty());
        assert_eq!(expansion.diagnostics.len(), 1);
        assert_matches!(
            expansion.diagnostics[0].kind(),
            DiagnosticKind::UnsupportedParameter { case, index: 0 } if case == "deep"
        );
        assert_eq!(expansion.diagnostics[0].span(), Span::new(40, 50));
    }

    #[test]
    fn should_expand_several_cases() {
        let tree = DeclTree::from_root(
            feature().member(
                action()
                    .member(DeclNode::case("didAppear"))
                    .member(DeclNode::case("child").slot(PayloadSlot::unnamed("Child.Action")))
                    .member(
                        DeclNode::case("delegate")
                            .attribute("SkipDispatch")
                            .slot(PayloadSlot::unnamed("Delegate")),
                    )
                    .member(
                        DeclNode::case("select")
                            .slot(PayloadSlot::labeled("id", "UUID"))
                            .slot(PayloadSlot::labeled("animated", "Bool")),
                    ),
            ),
        );

        let expansion = expand(&tree, tree.root(), ANNOTATION, &GeneratorConfig::default());

        assert!(expansion.is_success());
        assert_eq!(
            expansion.members,
            vec![r#"private struct Dispatch: Reducer {
    private let actionDelegate: FeatureActionDelegate

    init(_ actionDelegate: FeatureActionDelegate) {
        self.actionDelegate = actionDelegate
    }

    func reduce(into state: inout State, action: Action) -> Effect<Action> {
        switch action {
        case .didAppear:
            return actionDelegate.didAppear(state: &state)
        case let .child(action):
            return actionDelegate.child(action, state: &state)
        case .delegate:
            return .none
        case let .select(id, animated):
            return actionDelegate.select(id: id, animated: animated, state: &state)
        }
    }
}
"#
            .to_owned()]
        );
        assert_eq!(
            expansion.peers,
            vec![r#"protocol FeatureActionDelegate {
    typealias State = Feature.State
    typealias Action = Feature.Action

    func didAppear(state: inout State) -> Effect<Action>
    func child(_ action: Child.Action, state: inout State) -> Effect<Action>
    func select(id: UUID, animated: Bool, state: inout State) -> Effect<Action>
}
"#
            .to_owned()]
        );
    }

    #[test]
    fn should_not_dispatch_without_cases() {
        let generated = generate_from(
            feature().member(action().member(DeclNode::other("var id: Int { 0 }"))),
        )
        .expect("generated");

        assert_eq!(generated.dispatch.body, DispatchBody::NoOp);
        assert!(generated.interface.methods.is_empty());
        assert_eq!(
            generated.interface.aliases,
            vec![
                TypeAlias::new("State".to_owned(), TypeRef::path(["Feature", "State"])),
                TypeAlias::new("Action".to_owned(), TypeRef::path(["Feature", "Action"])),
            ]
        );
    }

    #[test]
    fn should_not_dispatch_when_every_case_is_excluded() {
        let generated = generate_from(
            feature().member(
                action()
                    .member(DeclNode::case("didAppear").attribute("SkipDispatch"))
                    .member(
                        DeclNode::case("child")
                            .attribute("SkipDispatch")
                            .slot(PayloadSlot::unnamed("Child.Action")),
                    ),
            ),
        )
        .expect("generated");

        assert_eq!(generated.dispatch.body, DispatchBody::NoOp);
        assert!(generated.interface.methods.is_empty());
    }

    #[rstest]
    #[case(&[], Visibility::Internal)]
    #[case(&["private"], Visibility::Private)]
    #[case(&["fileprivate"], Visibility::FilePrivate)]
    fn should_mirror_aggregate_visibility(
        #[case] modifiers: &[&str],
        #[case] expected: Visibility,
    ) {
        let root = modifiers
            .iter()
            .fold(feature(), |root, modifier| root.modifier(*modifier))
            .member(action());

        let generated = generate_from(root).expect("generated");

        assert_eq!(generated.interface.visibility, expected);
    }

    #[test]
    fn should_accept_reducer_attribute() {
        let generated = generate_from(
            DeclNode::structure("Feature")
                .attribute("Reducer")
                .member(action().member(DeclNode::case("ping"))),
        )
        .expect("generated");

        assert_eq!(generated.interface.name, "FeatureActionDelegate");
        assert_eq!(generated.dispatch.handler_type, "FeatureActionDelegate");
    }

    #[test]
    fn should_follow_conventions() {
        let conventions = Conventions {
            action_type: "Event".to_owned(),
            effect_type: "Task".to_owned(),
            ..Conventions::default()
        };
        let config = GeneratorConfig::new(conventions);

        let generated = generate_with(
            feature().member(DeclNode::enumeration("Event").member(DeclNode::case("tick"))),
            &config,
        )
        .expect("generated");

        assert_eq!(
            generated.interface.aliases[1],
            TypeAlias::new("Event".to_owned(), TypeRef::path(["Feature", "Event"]))
        );
        assert_eq!(
            generated.interface.methods[0].returns,
            TypeRef::from("Task<Event>")
        );
    }

    #[rstest]
    #[case(DeclNode::enumeration("Feature").inherits("Reducer"))]
    #[case(DeclNode::class("Feature").inherits("Reducer"))]
    #[case(DeclNode::case("feature"))]
    fn should_reject_non_struct_root(#[case] root: DeclNode) {
        let diagnostic = generate_from(root).expect_err("diagnostic");

        assert_eq!(
            diagnostic,
            Diagnostic::new(DiagnosticKind::InvalidRootNodeType, ANNOTATION)
        );
    }

    #[test]
    fn should_report_missing_conformance_at_name() {
        let diagnostic = generate_from(
            DeclNode::structure("Feature")
                .with_name_span(Span::new(23, 30))
                .inherits("Equatable")
                .member(action()),
        )
        .expect_err("diagnostic");

        assert_eq!(
            diagnostic,
            Diagnostic::new(DiagnosticKind::ReducerConformanceNotFound, Span::new(23, 30))
        );
    }

    #[rstest]
    #[case(feature(), ANNOTATION)]
    #[case(
        feature().member(DeclNode::other("typealias Action = Child.Action").with_span(Span::new(40, 70))),
        Span::new(40, 70)
    )]
    #[case(
        feature().member(DeclNode::structure("Action").with_span(Span::new(40, 60))),
        Span::new(40, 60)
    )]
    #[case(
        feature().member(action().with_span(Span::new(20, 40))).member(action().with_span(Span::new(50, 70))),
        Span::new(50, 70)
    )]
    fn should_require_one_nested_action(#[case] root: DeclNode, #[case] span: Span) {
        let diagnostic = generate_from(root).expect_err("diagnostic");

        assert_eq!(
            diagnostic,
            Diagnostic::new(DiagnosticKind::NestedActionRequired, span)
        );
    }

    #[rstest]
    #[case(action().member(
        DeclNode::structure("Payload")
            .attribute(Attribute::new("SkipDispatch".to_owned(), Span::new(30, 42)))
    ))]
    #[case(action()
        .attribute(Attribute::new("SkipDispatch".to_owned(), Span::new(30, 42)))
        .member(DeclNode::case("ping")))]
    #[case(action().member(
        DeclNode::other("static let all: [Action] = []")
            .attribute(Attribute::new("SkipDispatch".to_owned(), Span::new(30, 42)))
    ))]
    fn should_reject_misplaced_exclusion(#[case] action: DeclNode) {
        let diagnostic = generate_from(feature().member(action)).expect_err("diagnostic");

        assert_eq!(
            diagnostic,
            Diagnostic::new(DiagnosticKind::IncorrectAttributeUsage, Span::new(30, 42))
        );
    }

    #[test]
    fn should_accept_exclusion_on_case() {
        let tree = DeclTree::from_root(DeclNode::case("ping").attribute("SkipDispatch"));

        assert_eq!(
            check_exclusion_usage(&tree[tree.root()], &GeneratorConfig::default()),
            Ok(())
        );
    }

    fn unsupported_payload() -> DeclNode {
        feature().member(
            action().member(DeclNode::case("ping")).member(
                DeclNode::case("pair")
                    .slot(PayloadSlot::unnamed("Int"))
                    .slot(PayloadSlot::unnamed("Int?").with_span(Span::new(60, 64))),
            ),
        )
    }

    #[test]
    fn should_abort_on_unsupported_parameter() {
        let diagnostic = generate_from(unsupported_payload()).expect_err("diagnostic");

        assert_matches!(
            diagnostic.kind(),
            DiagnosticKind::UnsupportedParameter { case, index: 1 } if case == "pair"
        );
        assert_eq!(diagnostic.span(), Span::new(60, 64));
    }

    #[test]
    fn should_drop_unsupported_variant_on_demand() {
        let config = GeneratorConfig::default()
            .with_unsupported_parameter(UnsupportedParameterPolicy::DropVariant);

        let generated = generate_with(unsupported_payload(), &config).expect("generated");

        let arms = generated.dispatch.arms();
        assert_eq!(arms.len(), 2);
        assert_eq!(
            arms[1],
            DispatchArm::new("pair".to_owned(), Vec::new(), ArmBody::NoOp)
        );
        let methods = generated
            .interface
            .methods
            .iter()
            .map(|method| method.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(methods, vec!["ping"]);
    }

    #[test]
    fn should_be_deterministic() {
        let root = feature().member(
            action()
                .member(DeclNode::enumeration("Alert").member(DeclNode::case("dismiss")))
                .member(DeclNode::case("alert").slot(PayloadSlot::unnamed("Alert")))
                .member(DeclNode::case("pair").slot(PayloadSlot::unnamed("String")).slot(
                    PayloadSlot::unnamed("String"),
                )),
        );
        let tree = DeclTree::from_root(root.clone());
        let other_tree = DeclTree::from_root(root);
        let config = GeneratorConfig::default();

        let first = expand(&tree, tree.root(), ANNOTATION, &config);
        let second = expand(&other_tree, other_tree.root(), ANNOTATION, &config);

        assert!(first.is_success());
        assert_eq!(first, second);
        assert_eq!(
            generate(&tree, tree.root(), ANNOTATION, &config),
            generate(&tree, tree.root(), ANNOTATION, &config)
        );
    }

    #[test]
    fn should_generate_dispatch_only() {
        let tree = DeclTree::from_root(
            feature().member(action().member(DeclNode::case("ping"))),
        );
        let config = GeneratorConfig::default();

        let dispatch =
            generate_dispatch(&tree, tree.root(), ANNOTATION, &config).expect("dispatch");

        assert_eq!(
            dispatch,
            generate(&tree, tree.root(), ANNOTATION, &config)
                .expect("generated")
                .dispatch
        );
        assert_eq!(dispatch.name, "Dispatch");
    }

    #[test]
    fn should_expose_validated_reducer() {
        let tree = DeclTree::from_root(
            feature().member(action().member(DeclNode::case("ping"))),
        );

        let reducer = validate_top_level(&tree, tree.root(), ANNOTATION, &GeneratorConfig::default())
            .expect("reducer");

        assert_eq!(reducer.name(), "Feature");
        assert_eq!(reducer.action().name(), "Action");
        assert_eq!(reducer.action().members().len(), 1);
        assert_eq!(reducer.decl().id(), tree.root());
    }

    struct FailingRenderer;

    impl Renderer for FailingRenderer {
        fn fmt_dispatch(
            &self,
            _dispatch: &DispatchDecl,
            _conventions: &Conventions,
            _fmt: &mut Formatter<'_>,
        ) -> fmt::Result {
            Err(fmt::Error)
        }

        fn fmt_interface(
            &self,
            _interface: &InterfaceDecl,
            _conventions: &Conventions,
            _fmt: &mut Formatter<'_>,
        ) -> fmt::Result {
            Ok(())
        }
    }

    #[test]
    fn should_classify_render_failure_as_unknown() {
        let tree = DeclTree::from_root(feature().member(action()));
        let config = GeneratorConfig::default().with_renderer(FailingRenderer);

        let expansion = expand(&tree, tree.root(), ANNOTATION, &config);

        assert!(expansion.members.is_empty());
        assert!(expansion.peers.is_empty());
        assert_eq!(expansion.diagnostics.len(), 1);
        assert_matches!(expansion.diagnostics[0].kind(), DiagnosticKind::Unknown(_));
        assert_eq!(expansion.diagnostics[0].span(), ANNOTATION);
    }

    #[test]
    fn should_expand_diagnostic_only_on_failure() {
        let tree = DeclTree::from_root(DeclNode::enumeration("Feature"));

        let expansion = expand(&tree, tree.root(), ANNOTATION, &GeneratorConfig::default());

        assert_eq!(
            expansion,
            Expansion {
                diagnostics: vec![Diagnostic::new(
                    DiagnosticKind::InvalidRootNodeType,
                    ANNOTATION
                )],
                ..Expansion::default()
            }
        );
    }
}
