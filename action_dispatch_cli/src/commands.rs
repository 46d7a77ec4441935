use std::{fs, path::Path};

use action_dispatch::{
    declaration::{DeclNode, DeclTree, Span},
    diagnostic::Diagnostic,
    generator::{
        config::{Conventions, GeneratorConfig, UnsupportedParameterPolicy},
        expand, validate_top_level,
    },
    resolver::{nested_type_names, ParameterNaming},
};
use anyhow::Context;
use serde::Deserialize;
use tracing::debug;

/// Generator settings read from a JSON file, every field being optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub conventions: Conventions,
    pub naming: ParameterNaming,
    pub unsupported_parameter: UnsupportedParameterPolicy,
}

impl ConfigFile {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                debug!(path = %path.display(), "loading configuration");
                let text = fs::read_to_string(path)
                    .with_context(|| format!("cannot read configuration {}", path.display()))?;
                Self::parse(&text)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        serde_json::from_str(text).context("invalid configuration")
    }

    /// Builds the generator configuration, `naming` overriding the one of the file.
    pub fn into_generator_config(self, naming: Option<ParameterNaming>) -> GeneratorConfig {
        GeneratorConfig::new(self.conventions)
            .with_naming(naming.unwrap_or(self.naming))
            .with_unsupported_parameter(self.unsupported_parameter)
    }
}

/// Annotated declaration handed over by the host front-end.
#[derive(Debug, Deserialize)]
pub struct Input {
    /// Location of the annotation, diagnostics not related to a declaration land there.
    #[serde(default)]
    pub annotation: Span,
    pub declaration: DeclNode,
}

impl Input {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        debug!(path = %path.display(), "loading input");
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read input {}", path.display()))?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        serde_json::from_str(text).context("invalid input declaration")
    }
}

#[derive(PartialEq, Eq, Debug)]
pub enum Outcome {
    Success(String),
    Diagnostics(Vec<Diagnostic>),
}

/// Renders the members, then the peers.
pub fn generate(input: Input, config: &GeneratorConfig) -> Outcome {
    let tree = DeclTree::from_root(input.declaration);
    let expansion = expand(&tree, tree.root(), input.annotation, config);
    if expansion.is_success() {
        Outcome::Success(
            expansion
                .members
                .iter()
                .chain(&expansion.peers)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("\n"),
        )
    } else {
        Outcome::Diagnostics(expansion.diagnostics)
    }
}

pub fn validate(input: Input, config: &GeneratorConfig) -> Outcome {
    let tree = DeclTree::from_root(input.declaration);
    match validate_top_level(&tree, tree.root(), input.annotation, config) {
        Ok(reducer) => Outcome::Success(format!(
            "{} dispatches {} ({} members)\n",
            reducer.name(),
            reducer.action().name(),
            reducer.action().members().len()
        )),
        Err(diagnostic) => Outcome::Diagnostics(vec![diagnostic]),
    }
}

pub fn nested_types(input: Input, config: &GeneratorConfig) -> Outcome {
    let tree = DeclTree::from_root(input.declaration);
    match validate_top_level(&tree, tree.root(), input.annotation, config) {
        Ok(reducer) => Outcome::Success(
            nested_type_names(&tree, reducer.action())
                .iter()
                .map(|name| format!("{}\n", name))
                .collect(),
        ),
        Err(diagnostic) => Outcome::Diagnostics(vec![diagnostic]),
    }
}

pub fn describe(diagnostic: &Diagnostic) -> String {
    let span = diagnostic.span();
    format!(
        "error[{}]: {} at {}..{}",
        diagnostic.kind().code(),
        diagnostic,
        span.start,
        span.end
    )
}
