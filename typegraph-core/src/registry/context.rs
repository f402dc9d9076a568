//! Explicit build state threaded through every resolution call.

use std::collections::BTreeMap;

use super::canonical::qualify;
use super::store::TypeRegistry;
use crate::config::CoreConfig;
use crate::model::{Declaration, DeclarationKind, EnumValue, TypeExpr};

/// Declarations grouped by what they become.
#[derive(Debug, Default)]
pub struct DeclarationIndex<'a> {
    /// Type-defining declarations (including receiver-less functions) by canonical name.
    types: BTreeMap<String, &'a Declaration>,
    /// Methods by receiver canonical name, in input order.
    methods: BTreeMap<String, Vec<&'a Declaration>>,
    constant_groups: Vec<&'a Declaration>,
}

impl<'a> DeclarationIndex<'a> {
    pub fn build(declarations: &'a [Declaration]) -> Self {
        let mut index = Self::default();
        for decl in declarations {
            match &decl.kind {
                DeclarationKind::ConstantGroup { .. } => index.constant_groups.push(decl),
                DeclarationKind::Function {
                    receiver: Some(receiver),
                    ..
                } => {
                    let key = receiver_canonical(receiver, &decl.package);
                    index.methods.entry(key).or_default().push(decl);
                }
                _ if decl.defines_type() => {
                    let key = qualify(&decl.package, &decl.name);
                    // First declaration of a name wins.
                    index.types.entry(key).or_insert(decl);
                }
                _ => {}
            }
        }
        index
    }

    pub fn get(&self, canonical: &str) -> Option<&'a Declaration> {
        self.types.get(canonical).copied()
    }

    pub fn type_keys(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    pub fn methods_of(&self, canonical: &str) -> Vec<&'a Declaration> {
        self.methods.get(canonical).cloned().unwrap_or_default()
    }

    /// Receivers with methods but no declaration of their own.
    pub fn orphan_receivers(&self) -> Vec<&str> {
        self.methods
            .keys()
            .filter(|k| !self.types.contains_key(*k))
            .map(String::as_str)
            .collect()
    }

    pub fn constant_groups(&self) -> &[&'a Declaration] {
        &self.constant_groups
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Canonical name of a method receiver: `*Node[T]` on package `app` gives `app.Node`.
pub fn receiver_canonical(receiver: &TypeExpr, package: &str) -> String {
    match receiver.deref() {
        TypeExpr::Named { package: pkg, name } => qualify(pkg.as_deref().unwrap_or(package), name),
        TypeExpr::Generic { base, .. } => receiver_canonical(base, package),
        other => other.to_string(),
    }
}

/// Type parameter names declared on a receiver such as `*Node[T, P]`.
pub fn receiver_params(receiver: &TypeExpr) -> Vec<String> {
    match receiver.deref() {
        TypeExpr::Generic { args, .. } => args
            .iter()
            .filter_map(|a| match a {
                TypeExpr::Named { package: None, name } => Some(name.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Everything a build mutates, plus the read-only inputs it consults.
pub struct BuildContext<'a> {
    pub config: &'a CoreConfig,
    pub index: DeclarationIndex<'a>,
    pub registry: TypeRegistry,
    /// Constants gathered per owning canonical name, in declaration order.
    pub(crate) constants: BTreeMap<String, Vec<EnumValue>>,
    generic_scope: Vec<Vec<String>>,
    /// Instances waiting for their base to finish construction, by base name.
    deferred: BTreeMap<String, Vec<String>>,
    marker: char,
}

impl<'a> BuildContext<'a> {
    pub fn new(config: &'a CoreConfig, declarations: &'a [Declaration]) -> Self {
        Self {
            config,
            index: DeclarationIndex::build(declarations),
            registry: TypeRegistry::new(),
            constants: BTreeMap::new(),
            generic_scope: Vec::new(),
            deferred: BTreeMap::new(),
            marker: config.marker(),
        }
    }

    pub fn marker(&self) -> char {
        self.marker
    }

    pub fn push_generic_scope(&mut self, params: Vec<String>) {
        self.generic_scope.push(params);
    }

    pub fn pop_generic_scope(&mut self) {
        self.generic_scope.pop();
    }

    /// Start a declaration with only its own parameters in scope. Returns the
    /// enclosing scope for [`BuildContext::restore_generic_scope`].
    pub fn enter_declaration_scope(&mut self, params: Vec<String>) -> Vec<Vec<String>> {
        std::mem::replace(&mut self.generic_scope, vec![params])
    }

    pub fn restore_generic_scope(&mut self, saved: Vec<Vec<String>>) {
        self.generic_scope = saved;
    }

    /// True if `name` is a type parameter of any enclosing declaration.
    pub fn in_generic_scope(&self, name: &str) -> bool {
        self.generic_scope
            .iter()
            .rev()
            .any(|scope| scope.iter().any(|p| p == name))
    }

    pub(crate) fn defer_instance(&mut self, base: &str, instance: &str) {
        let waiting = self.deferred.entry(base.to_string()).or_default();
        if !waiting.iter().any(|i| i == instance) {
            waiting.push(instance.to_string());
        }
    }

    pub(crate) fn take_deferred(&mut self, base: &str) -> Vec<String> {
        self.deferred.remove(base).unwrap_or_default()
    }

    pub(crate) fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    pub fn into_registry(self) -> TypeRegistry {
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConstDecl, ParamDecl};

    fn method(receiver: TypeExpr, name: &str) -> Declaration {
        Declaration::new(
            "app",
            name,
            DeclarationKind::Function {
                receiver: Some(receiver),
                params: vec![ParamDecl::new("v", TypeExpr::named("int"))],
                results: vec![],
                call_sites: vec![],
            },
        )
    }

    #[test]
    fn test_index_groups_declarations() {
        let decls = vec![
            Declaration::composite("app", "User", vec![]),
            Declaration::composite("app", "User", vec![]),
            method(TypeExpr::pointer(TypeExpr::named("User")), "Save"),
            method(
                TypeExpr::pointer(TypeExpr::generic(TypeExpr::named("Node"), vec![TypeExpr::named("T")])),
                "Next",
            ),
            Declaration::constants("app", vec![ConstDecl::new("A")]),
        ];
        let index = DeclarationIndex::build(&decls);
        assert_eq!(index.len(), 1);
        assert_eq!(index.methods_of("app.User").len(), 1);
        assert_eq!(index.constant_groups().len(), 1);
        assert_eq!(index.orphan_receivers(), vec!["app.Node"]);
    }

    #[test]
    fn test_receiver_params() {
        let recv = TypeExpr::pointer(TypeExpr::generic(
            TypeExpr::named("Pair"),
            vec![TypeExpr::named("K"), TypeExpr::named("V")],
        ));
        assert_eq!(receiver_params(&recv), vec!["K", "V"]);
        assert!(receiver_params(&TypeExpr::named("User")).is_empty());
    }

    #[test]
    fn test_generic_scope_stack() {
        let config = CoreConfig::default();
        let mut ctx = BuildContext::new(&config, &[]);
        assert!(!ctx.in_generic_scope("T"));
        ctx.push_generic_scope(vec!["T".into()]);
        ctx.push_generic_scope(vec!["K".into()]);
        assert!(ctx.in_generic_scope("T"));
        ctx.pop_generic_scope();
        ctx.pop_generic_scope();
        assert!(!ctx.in_generic_scope("T"));

        ctx.push_generic_scope(vec!["T".into()]);
        let saved = ctx.enter_declaration_scope(vec!["K".into()]);
        assert!(!ctx.in_generic_scope("T"));
        assert!(ctx.in_generic_scope("K"));
        ctx.restore_generic_scope(saved);
        assert!(ctx.in_generic_scope("T"));
    }
}
