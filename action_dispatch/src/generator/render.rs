//! Textual rendering of the generated declarations.

use std::fmt::{self, Write};

use codegen::Formatter;
use itertools::Itertools;

use super::{
    config::Conventions,
    output::{
        ArmBody, CallArgument, CallValue, DispatchArm, DispatchBody, DispatchDecl, HandlerCall,
        HandlerSignature, InterfaceDecl, Visibility,
    },
};
use crate::resolver::ArgumentLabel;

/// Turns generated declarations into source text the host can splice into the program.
pub trait Renderer {
    fn fmt_dispatch(
        &self,
        dispatch: &DispatchDecl,
        conventions: &Conventions,
        fmt: &mut Formatter<'_>,
    ) -> fmt::Result;

    fn fmt_interface(
        &self,
        interface: &InterfaceDecl,
        conventions: &Conventions,
        fmt: &mut Formatter<'_>,
    ) -> fmt::Result;
}

pub fn render_dispatch(
    renderer: &dyn Renderer,
    dispatch: &DispatchDecl,
    conventions: &Conventions,
) -> Result<String, fmt::Error> {
    let mut dst = String::new();
    renderer.fmt_dispatch(dispatch, conventions, &mut Formatter::new(&mut dst))?;
    Ok(dst)
}

pub fn render_interface(
    renderer: &dyn Renderer,
    interface: &InterfaceDecl,
    conventions: &Conventions,
) -> Result<String, fmt::Error> {
    let mut dst = String::new();
    renderer.fmt_interface(interface, conventions, &mut Formatter::new(&mut dst))?;
    Ok(dst)
}

/// Renders the declarations in the host declaration syntax.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextRenderer;

impl Renderer for TextRenderer {
    fn fmt_dispatch(
        &self,
        dispatch: &DispatchDecl,
        conventions: &Conventions,
        fmt: &mut Formatter<'_>,
    ) -> fmt::Result {
        write!(
            fmt,
            "private struct {}: {}",
            dispatch.name, dispatch.capability
        )?;
        fmt.block(|fmt| {
            writeln!(
                fmt,
                "private let {}: {}",
                dispatch.handler_field, dispatch.handler_type
            )?;
            writeln!(fmt)?;
            write!(
                fmt,
                "init(_ {}: {})",
                dispatch.handler_field, dispatch.handler_type
            )?;
            fmt.block(|fmt| writeln!(fmt, "self.{0} = {0}", dispatch.handler_field))?;
            writeln!(fmt)?;
            write!(
                fmt,
                "func {}(into {}: inout {}, action: {}) -> {}<{}>",
                conventions.dispatch_method,
                conventions.state_parameter,
                conventions.state_type,
                conventions.action_type,
                conventions.effect_type,
                conventions.action_type,
            )?;
            fmt.block(|fmt| match &dispatch.body {
                DispatchBody::NoOp => writeln!(fmt, "{}", conventions.no_op),
                DispatchBody::Match(arms) => {
                    // Cases sit at the column of their switch.
                    writeln!(fmt, "switch action {{")?;
                    for arm in arms {
                        fmt_arm(arm, conventions, fmt)?;
                    }
                    writeln!(fmt, "}}")
                }
            })
        })
    }

    fn fmt_interface(
        &self,
        interface: &InterfaceDecl,
        _conventions: &Conventions,
        fmt: &mut Formatter<'_>,
    ) -> fmt::Result {
        if interface.visibility != Visibility::Internal {
            write!(fmt, "{} ", interface.visibility)?;
        }
        write!(fmt, "protocol {}", interface.name)?;
        fmt.block(|fmt| {
            for alias in &interface.aliases {
                writeln!(fmt, "typealias {} = {}", alias.name, alias.target)?;
            }
            if !interface.methods.is_empty() {
                writeln!(fmt)?;
            }
            for method in &interface.methods {
                writeln!(fmt, "{}", signature(method))?;
            }
            Ok(())
        })
    }
}

fn fmt_arm(arm: &DispatchArm, conventions: &Conventions, fmt: &mut Formatter<'_>) -> fmt::Result {
    if arm.bindings.is_empty() {
        writeln!(fmt, "case .{}:", arm.tag)?;
    } else {
        writeln!(fmt, "case let .{}({}):", arm.tag, arm.bindings.iter().join(", "))?;
    }
    fmt.indent(|fmt| match &arm.body {
        ArmBody::NoOp => writeln!(fmt, "return {}", conventions.no_op),
        ArmBody::Forward(call) => writeln!(fmt, "return {}", call_expression(call)),
    })
}

fn call_expression(call: &HandlerCall) -> String {
    format!(
        "{}.{}({})",
        call.receiver,
        call.method,
        call.arguments.iter().map(argument).join(", ")
    )
}

fn argument(argument: &CallArgument) -> String {
    let value = match &argument.value {
        CallValue::Binding(name) => name.clone(),
        CallValue::State(name) => format!("&{}", name),
    };
    match &argument.label {
        Some(label) => format!("{}: {}", label, value),
        None => value,
    }
}

fn signature(method: &HandlerSignature) -> String {
    let parameters = method
        .parameters
        .iter()
        .map(|parameter| match &parameter.label {
            ArgumentLabel::Unlabeled => format!("_ {}: {}", parameter.name, parameter.ty),
            ArgumentLabel::Named => format!("{}: {}", parameter.name, parameter.ty),
            ArgumentLabel::Relabeled(label) => {
                format!("{} {}: {}", label, parameter.name, parameter.ty)
            }
        })
        .chain(std::iter::once(format!(
            "{}: inout {}",
            method.state.name, method.state.ty
        )))
        .join(", ");
    format!(
        "func {}({}) -> {}",
        method.name, parameters, method.returns
    )
}
