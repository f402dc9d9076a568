//! Declaration registration and type-expression resolution.
//!
//! Every declared name goes through [`register_declaration`]:
//!
//! 1. cache hit: return the existing node unchanged
//! 2. insert a skeleton marked under construction
//! 3. populate members, resolving each reference recursively
//! 4. clear the marker and release instances deferred on this node
//!
//! A reference to a node that is still under construction hits the cache in
//! step 1, so self-referencing and mutually recursive types terminate.

use tracing::{debug, warn};

use super::canonical::{
    anonymous_struct_name, array_name, is_builtin, map_name, qualify, slice_name, split_canonical,
};
use super::context::{receiver_params, BuildContext};
use super::store::TypeRegistry;
use crate::annotations::{doc_comment_text, parse_annotations, parse_struct_tags, Annotation};
use crate::enums;
use crate::error::{TypegraphError, TypegraphResult};
use crate::generics;
use crate::model::{
    signature_member, Declaration, DeclarationKind, Field, FieldDecl, FunctionSignature, GenericParam,
    MethodDecl, ParamDecl, TypeExpr, TypeKind, TypeNode, TypeRef, TypedElement, UsageRole, Visibility,
};
use crate::usage;

/// Where a type expression appears: the referencing node, the package that
/// qualifies bare names, and the member being resolved.
#[derive(Debug, Clone, Copy)]
pub struct Site<'s> {
    pub owner: &'s str,
    pub package: &'s str,
    pub member: &'s str,
}

impl<'s> Site<'s> {
    pub fn new(owner: &'s str, package: &'s str, member: &'s str) -> Self {
        Self { owner, package, member }
    }

    pub fn with_member(self, member: &'s str) -> Self {
        Self { member, ..self }
    }
}

/// Register every indexed declaration, then gather constants.
pub fn register_all(ctx: &mut BuildContext<'_>) -> TypegraphResult<()> {
    for key in ctx.index.type_keys() {
        register_declaration(ctx, &key)?;
    }

    let groups = ctx.index.constant_groups().to_vec();
    for group in groups {
        enums::collect_constants(ctx, group)?;
    }

    for receiver in ctx.index.orphan_receivers() {
        warn!(node = receiver, "methods declared on a type that is never declared; skipped");
    }
    if ctx.has_deferred() {
        return Err(TypegraphError::internal(
            "generic instances still waiting on a base after registration",
        ));
    }
    Ok(())
}

/// Register the declaration behind `canonical`, or return the cached node.
/// Names without a declaration become placeholders.
pub fn register_declaration(ctx: &mut BuildContext<'_>, canonical: &str) -> TypegraphResult<TypeRef> {
    if ctx.registry.contains(canonical) {
        return Ok(TypeRef::Node(canonical.to_string()));
    }
    let Some(decl) = ctx.index.get(canonical) else {
        let (package, name) = split_canonical(canonical);
        return Ok(placeholder(ctx, canonical, package, name, ""));
    };

    let marker = ctx.marker();
    let mut node = TypeNode::skeleton(canonical, decl.name.as_str(), decl.package.as_str(), initial_kind(decl));
    node.source_path = decl.source_path.clone();
    node.visibility = Visibility::resolve(decl.visibility, &decl.name);
    node.comment = doc_comment_text(&decl.doc, marker);
    node.annotations = parse_annotations(&decl.doc, marker);
    ctx.registry.begin_construction(node);
    debug!(node = canonical, "registering declaration");

    let params: Vec<String> = decl.type_params.iter().map(|p| p.name.clone()).collect();
    // Declarations registered on demand must not see the caller's parameters.
    let saved = ctx.enter_declaration_scope(params);
    let populated = populate(ctx, decl, canonical);
    ctx.restore_generic_scope(saved);
    populated?;

    finish(ctx, canonical)?;
    Ok(TypeRef::Node(canonical.to_string()))
}

/// Clear the construction marker and complete instances deferred on this node.
pub(crate) fn finish(ctx: &mut BuildContext<'_>, canonical: &str) -> TypegraphResult<()> {
    ctx.registry.finish_construction(canonical);
    for instance in ctx.take_deferred(canonical) {
        generics::copy_from_base(&mut ctx.registry, &instance, canonical)?;
    }
    Ok(())
}

pub(crate) fn node_mut<'r>(registry: &'r mut TypeRegistry, canonical: &str) -> TypegraphResult<&'r mut TypeNode> {
    registry
        .get_mut(canonical)
        .ok_or_else(|| TypegraphError::internal(format!("node '{}' missing during construction", canonical)))
}

fn initial_kind(decl: &Declaration) -> TypeKind {
    match &decl.kind {
        DeclarationKind::Interface { .. } => TypeKind::Interface,
        DeclarationKind::Function { .. } => TypeKind::Function,
        DeclarationKind::Alias { .. } => TypeKind::Alias,
        DeclarationKind::Container { expr } => match expr.deref() {
            TypeExpr::Slice { .. } => TypeKind::Slice,
            TypeExpr::Array { .. } => TypeKind::Array,
            TypeExpr::Map { .. } => TypeKind::Map,
            _ => TypeKind::Composite,
        },
        DeclarationKind::GenericInstantiation { .. } => TypeKind::GenericInstantiation,
        _ => TypeKind::Composite,
    }
}

fn populate(ctx: &mut BuildContext<'_>, decl: &Declaration, canonical: &str) -> TypegraphResult<()> {
    let site = Site::new(canonical, &decl.package, "");

    let mut generic_params = Vec::with_capacity(decl.type_params.len());
    for param in &decl.type_params {
        let constraint = match &param.constraint {
            Some(expr) => Some(resolve_type(ctx, expr, site.with_member(&param.name))?),
            None => None,
        };
        generic_params.push(GenericParam {
            name: param.name.clone(),
            constraint,
        });
    }
    node_mut(&mut ctx.registry, canonical)?.generic_params = generic_params;

    match &decl.kind {
        DeclarationKind::Composite { fields } => {
            let fields = resolve_fields(ctx, fields, site)?;
            node_mut(&mut ctx.registry, canonical)?.fields = fields;
        }
        DeclarationKind::Interface { methods, embeds } => {
            populate_interface(ctx, methods, embeds, site)?;
        }
        DeclarationKind::Function {
            params,
            results,
            call_sites,
            ..
        } => {
            let mut signature = resolve_signature(ctx, &decl.name, params, results, site)?;
            let marker = ctx.marker();
            let call_site_annotations = parse_call_sites(call_sites, marker);
            let node = node_mut(&mut ctx.registry, canonical)?;
            signature.comment = node.comment.clone();
            signature.annotations = node.annotations.clone();
            signature.call_site_annotations = call_site_annotations.clone();
            signature.visibility = node.visibility;
            node.signature = Some(signature);
            node.call_site_annotations = call_site_annotations;
        }
        DeclarationKind::ConstantGroup { .. } => {}
        DeclarationKind::Alias { target } => {
            let target = resolve_type(ctx, target, site.with_member("alias"))?;
            node_mut(&mut ctx.registry, canonical)?.alias_target = Some(target);
        }
        DeclarationKind::Container { expr } => {
            populate_container(ctx, expr.deref(), site)?;
        }
        DeclarationKind::GenericInstantiation { base, args } => {
            generics::populate_named_instance(ctx, canonical, base, args, site)?;
        }
        DeclarationKind::Defined { underlying } => {
            node_mut(&mut ctx.registry, canonical)?.underlying = Some(underlying.to_string());
        }
    }

    if !matches!(decl.kind, DeclarationKind::Function { .. } | DeclarationKind::Interface { .. }) {
        attach_methods(ctx, canonical)?;
    }
    Ok(())
}

fn populate_interface(
    ctx: &mut BuildContext<'_>,
    methods: &[MethodDecl],
    embeds: &[TypeExpr],
    site: Site<'_>,
) -> TypegraphResult<()> {
    let marker = ctx.marker();
    let mut signatures = Vec::with_capacity(methods.len());
    for method in methods {
        let mut sig = resolve_signature(ctx, &method.name, &method.params, &method.results, site)?;
        sig.comment = doc_comment_text(&method.doc, marker);
        sig.annotations = parse_annotations(&method.doc, marker);
        signatures.push(sig);
    }

    let mut fields = Vec::with_capacity(embeds.len());
    for embed in embeds {
        let type_ref = resolve_type(ctx, embed, site)?;
        usage::track(&mut ctx.registry, &type_ref, site.owner, "", UsageRole::Embedded);

        let inherited = type_ref
            .node_key()
            .and_then(|key| ctx.registry.get(key))
            .filter(|node| node.kind == TypeKind::Interface)
            .map(|node| node.methods.clone())
            .unwrap_or_default();
        for method in inherited {
            if !signatures.iter().any(|s| s.name == method.name) {
                signatures.push(method);
            }
        }

        let name = embedded_name(embed);
        fields.push(Field {
            element: TypedElement {
                visibility: Visibility::from_name(&name),
                name,
                type_ref,
                type_text: embed.to_string(),
                is_pointer: embed.is_pointer(),
                comment: String::new(),
                annotations: Vec::new(),
            },
            embedded: true,
            tags: Default::default(),
        });
    }

    let node = node_mut(&mut ctx.registry, site.owner)?;
    node.methods = signatures;
    node.fields = fields;
    Ok(())
}

fn populate_container(ctx: &mut BuildContext<'_>, expr: &TypeExpr, site: Site<'_>) -> TypegraphResult<()> {
    match expr {
        TypeExpr::Slice { elem } | TypeExpr::Array { elem, .. } => {
            let element = resolve_type(ctx, elem, site.with_member("element"))?;
            usage::track(&mut ctx.registry, &element, site.owner, "element", UsageRole::Field);
            node_mut(&mut ctx.registry, site.owner)?.element = Some(element);
        }
        TypeExpr::Map { key, value } => {
            let key = resolve_type(ctx, key, site.with_member("key"))?;
            let value = resolve_type(ctx, value, site.with_member("value"))?;
            usage::track(&mut ctx.registry, &key, site.owner, "key", UsageRole::Field);
            usage::track(&mut ctx.registry, &value, site.owner, "value", UsageRole::Field);
            let node = node_mut(&mut ctx.registry, site.owner)?;
            node.key = Some(key);
            node.element = Some(value);
        }
        other => {
            node_mut(&mut ctx.registry, site.owner)?.underlying = Some(other.to_string());
        }
    }
    Ok(())
}

/// Attach methods declared with `canonical` as receiver. Parameters and
/// results are recorded as usage by the receiver.
fn attach_methods(ctx: &mut BuildContext<'_>, canonical: &str) -> TypegraphResult<()> {
    let declared = ctx.index.methods_of(canonical);
    if declared.is_empty() {
        return Ok(());
    }
    let marker = ctx.marker();
    let mut methods = Vec::with_capacity(declared.len());
    for decl in declared {
        let DeclarationKind::Function {
            receiver: Some(receiver),
            params,
            results,
            call_sites,
        } = &decl.kind
        else {
            continue;
        };
        ctx.push_generic_scope(receiver_params(receiver));
        let sig = resolve_signature(ctx, &decl.name, params, results, Site::new(canonical, &decl.package, ""));
        ctx.pop_generic_scope();
        let mut sig = sig?;
        sig.comment = doc_comment_text(&decl.doc, marker);
        sig.annotations = parse_annotations(&decl.doc, marker);
        sig.call_site_annotations = parse_call_sites(call_sites, marker);
        sig.visibility = Visibility::resolve(decl.visibility, &decl.name);
        methods.push(sig);
    }
    node_mut(&mut ctx.registry, canonical)?.methods.extend(methods);
    Ok(())
}

fn parse_call_sites(call_sites: &[String], marker: char) -> Vec<Annotation> {
    call_sites
        .iter()
        .flat_map(|text| parse_annotations(text, marker))
        .collect()
}

/// Resolve fields of `site.owner`, recording field and embedded usage.
pub(crate) fn resolve_fields(
    ctx: &mut BuildContext<'_>,
    decls: &[FieldDecl],
    site: Site<'_>,
) -> TypegraphResult<Vec<Field>> {
    let marker = ctx.marker();
    let mut fields = Vec::with_capacity(decls.len());
    for decl in decls {
        let name = if decl.name.is_empty() && decl.embedded {
            embedded_name(&decl.ty)
        } else {
            decl.name.clone()
        };
        let type_ref = resolve_type(ctx, &decl.ty, site.with_member(&name))?;
        let (member, role) = if decl.embedded {
            ("", UsageRole::Embedded)
        } else {
            (name.as_str(), UsageRole::Field)
        };
        usage::track(&mut ctx.registry, &type_ref, site.owner, member, role);

        fields.push(Field {
            element: TypedElement {
                visibility: Visibility::resolve(decl.visibility, &name),
                name,
                type_ref,
                type_text: decl.ty.to_string(),
                is_pointer: decl.ty.is_pointer(),
                comment: doc_comment_text(&decl.doc, marker),
                annotations: parse_annotations(&decl.doc, marker),
            },
            embedded: decl.embedded,
            tags: parse_struct_tags(&decl.tag),
        });
    }
    Ok(fields)
}

/// Resolve a signature. `site.owner` is the referencer for parameter and
/// return usage (the receiver for methods, the function itself otherwise).
fn resolve_signature(
    ctx: &mut BuildContext<'_>,
    name: &str,
    params: &[ParamDecl],
    results: &[ParamDecl],
    site: Site<'_>,
) -> TypegraphResult<FunctionSignature> {
    let params = resolve_elements(ctx, name, params, site, UsageRole::Parameter)?;
    let results = resolve_elements(ctx, name, results, site, UsageRole::Return)?;
    Ok(FunctionSignature {
        name: name.to_string(),
        comment: String::new(),
        annotations: Vec::new(),
        call_site_annotations: Vec::new(),
        params,
        results,
        visibility: Visibility::from_name(name),
    })
}

fn resolve_elements(
    ctx: &mut BuildContext<'_>,
    signature: &str,
    decls: &[ParamDecl],
    site: Site<'_>,
    role: UsageRole,
) -> TypegraphResult<Vec<TypedElement>> {
    let mut elements = Vec::with_capacity(decls.len());
    for decl in decls {
        let member = signature_member(signature, &decl.name);
        let type_ref = resolve_type(ctx, &decl.ty, site.with_member(&member))?;
        usage::track(&mut ctx.registry, &type_ref, site.owner, &member, role);
        elements.push(TypedElement {
            name: decl.name.clone(),
            type_ref,
            type_text: decl.ty.to_string(),
            is_pointer: decl.ty.is_pointer(),
            comment: String::new(),
            annotations: Vec::new(),
            visibility: Visibility::from_name(&decl.name),
        });
    }
    Ok(elements)
}

/// Resolve a type expression at `site`, registering whatever it names.
pub fn resolve_type(ctx: &mut BuildContext<'_>, expr: &TypeExpr, site: Site<'_>) -> TypegraphResult<TypeRef> {
    match expr {
        TypeExpr::Named { package, name } => resolve_named(ctx, package.as_deref(), name, site),
        TypeExpr::Pointer { elem } => resolve_type(ctx, elem, site),
        TypeExpr::Slice { elem } => {
            let elem = resolve_type(ctx, elem, site)?;
            container(ctx, TypeKind::Slice, slice_name(elem.name()), None, elem, site)
        }
        TypeExpr::Array { len, elem } => {
            let elem = resolve_type(ctx, elem, site)?;
            container(ctx, TypeKind::Array, array_name(*len, elem.name()), None, elem, site)
        }
        TypeExpr::Map { key, value } => {
            let key = resolve_type(ctx, key, site)?;
            let value = resolve_type(ctx, value, site)?;
            container(ctx, TypeKind::Map, map_name(key.name(), value.name()), Some(key), value, site)
        }
        TypeExpr::Generic { base, args } => generics::resolve_instance(ctx, base, args, site),
        TypeExpr::Struct { fields } => resolve_anonymous(ctx, fields, site),
    }
}

fn resolve_named(
    ctx: &mut BuildContext<'_>,
    package: Option<&str>,
    name: &str,
    site: Site<'_>,
) -> TypegraphResult<TypeRef> {
    if package.is_none() {
        if ctx.in_generic_scope(name) {
            return Ok(TypeRef::Param(name.to_string()));
        }
        if is_builtin(name) {
            return Ok(TypeRef::Builtin(name.to_string()));
        }
    }
    let package = package.unwrap_or(site.package);
    let key = qualify(package, name);
    if ctx.registry.contains(&key) {
        return Ok(TypeRef::Node(key));
    }
    if ctx.index.get(&key).is_some() {
        return register_declaration(ctx, &key);
    }
    Ok(placeholder(ctx, &key, package, name, site.owner))
}

/// Node for a name that is referenced but never declared.
fn placeholder(ctx: &mut BuildContext<'_>, key: &str, package: &str, name: &str, referenced_by: &str) -> TypeRef {
    let mut node = TypeNode::skeleton(key, name, package, TypeKind::Composite);
    node.placeholder = true;
    if ctx.registry.insert(node) {
        debug!(node = key, referenced_by, "placeholder for undeclared type");
    }
    TypeRef::Node(key.to_string())
}

/// Anonymous container node. Containers over builtins only stay builtin;
/// containers over builtins and type parameters stay parameters.
fn container(
    ctx: &mut BuildContext<'_>,
    kind: TypeKind,
    canonical: String,
    key: Option<TypeRef>,
    element: TypeRef,
    site: Site<'_>,
) -> TypegraphResult<TypeRef> {
    let refs = key.iter().chain(std::iter::once(&element));
    let anchor = refs.clone().find_map(TypeRef::node_key).map(str::to_string);
    let Some(anchor) = anchor else {
        if refs.clone().any(|r| matches!(r, TypeRef::Param(_))) {
            return Ok(TypeRef::Param(canonical));
        }
        return Ok(TypeRef::Builtin(canonical));
    };

    if ctx.registry.contains(&canonical) {
        return Ok(TypeRef::Node(canonical));
    }

    let (package, visibility) = ctx
        .registry
        .get(&anchor)
        .map(|n| (n.package.clone(), n.visibility))
        .unwrap_or_else(|| (site.package.to_string(), Visibility::Public));
    let mut node = TypeNode::skeleton(canonical.as_str(), canonical.as_str(), package, kind);
    node.visibility = visibility;
    node.element = Some(element.clone());
    node.key = key.clone();
    ctx.registry.insert(node);

    let value_member = if kind == TypeKind::Map { "value" } else { "element" };
    usage::track(&mut ctx.registry, &element, &canonical, value_member, UsageRole::Field);
    if let Some(key) = &key {
        usage::track(&mut ctx.registry, key, &canonical, "key", UsageRole::Field);
    }
    Ok(TypeRef::Node(canonical))
}

fn resolve_anonymous(ctx: &mut BuildContext<'_>, fields: &[FieldDecl], site: Site<'_>) -> TypegraphResult<TypeRef> {
    let canonical = anonymous_struct_name(site.owner, site.member);
    if ctx.registry.contains(&canonical) {
        return Ok(TypeRef::Node(canonical));
    }
    let name = canonical
        .strip_prefix(site.owner)
        .map(|s| s.trim_start_matches('.'))
        .unwrap_or(canonical.as_str())
        .to_string();
    let node = TypeNode::skeleton(canonical.as_str(), name, site.package, TypeKind::Composite);
    ctx.registry.begin_construction(node);

    let fields = resolve_fields(ctx, fields, Site::new(&canonical, site.package, ""))?;
    node_mut(&mut ctx.registry, &canonical)?.fields = fields;
    finish(ctx, &canonical)?;
    Ok(TypeRef::Node(canonical))
}

/// Name an embedded field takes: the short name of its type.
pub fn embedded_name(expr: &TypeExpr) -> String {
    match expr.deref() {
        TypeExpr::Named { name, .. } => name.clone(),
        TypeExpr::Generic { base, .. } => embedded_name(base),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::model::{ConstDecl, TypeParamDecl};

    fn build(config: &CoreConfig, decls: &[Declaration]) -> TypeRegistry {
        let mut ctx = BuildContext::new(config, decls);
        register_all(&mut ctx).unwrap();
        ctx.into_registry()
    }

    fn function(name: &str, params: Vec<ParamDecl>, results: Vec<ParamDecl>) -> Declaration {
        Declaration::new(
            "app",
            name,
            DeclarationKind::Function {
                receiver: None,
                params,
                results,
                call_sites: vec![],
            },
        )
    }

    #[test]
    fn test_self_reference_terminates() {
        let config = CoreConfig::default();
        let decls = vec![Declaration::composite(
            "app",
            "Tree",
            vec![
                FieldDecl::new("Left", TypeExpr::pointer(TypeExpr::named("Tree"))),
                FieldDecl::new("Kids", TypeExpr::slice(TypeExpr::pointer(TypeExpr::named("Tree")))),
            ],
        )];
        let registry = build(&config, &decls);
        let tree = registry.get("app.Tree").unwrap();
        assert_eq!(tree.fields[0].type_ref(), &TypeRef::Node("app.Tree".into()));
        assert!(tree.fields[0].element.is_pointer);
        assert_eq!(tree.fields[1].type_ref(), &TypeRef::Node("[]app.Tree".into()));
        assert_eq!(registry.pending().count(), 0);

        let slice = registry.get("[]app.Tree").unwrap();
        assert_eq!(slice.kind, TypeKind::Slice);
        assert_eq!(slice.element, Some(TypeRef::Node("app.Tree".into())));
    }

    #[test]
    fn test_mutual_recursion_and_on_demand_registration() {
        let config = CoreConfig::default();
        let decls = vec![
            Declaration::composite("app", "A", vec![FieldDecl::new("B", TypeExpr::pointer(TypeExpr::named("B")))]),
            Declaration::composite("app", "B", vec![FieldDecl::new("A", TypeExpr::pointer(TypeExpr::named("A")))]),
        ];
        let registry = build(&config, &decls);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("app.B").unwrap().fields[0].type_ref(), &TypeRef::Node("app.A".into()));
        let a_usage = &registry.get("app.A").unwrap().usage;
        assert_eq!(a_usage.edges.len(), 1);
        assert_eq!(a_usage.edges[0].referencer, "app.B");
    }

    #[test]
    fn test_builtin_containers_are_not_nodes() {
        let config = CoreConfig::default();
        let decls = vec![Declaration::composite(
            "app",
            "Bag",
            vec![
                FieldDecl::new("Tags", TypeExpr::slice(TypeExpr::named("string"))),
                FieldDecl::new("Counts", TypeExpr::map(TypeExpr::named("string"), TypeExpr::named("int"))),
            ],
        )];
        let registry = build(&config, &decls);
        assert_eq!(registry.len(), 1);
        let bag = registry.get("app.Bag").unwrap();
        assert_eq!(bag.fields[0].type_ref(), &TypeRef::Builtin("[]string".into()));
        assert_eq!(bag.fields[1].type_ref(), &TypeRef::Builtin("map[string]int".into()));
    }

    #[test]
    fn test_map_container_usage_edges() {
        let config = CoreConfig::default();
        let decls = vec![
            Declaration::composite("app", "User", vec![]),
            Declaration::composite(
                "app",
                "Index",
                vec![FieldDecl::new(
                    "ByName",
                    TypeExpr::map(TypeExpr::named("string"), TypeExpr::pointer(TypeExpr::named("User"))),
                )],
            ),
        ];
        let registry = build(&config, &decls);
        let map = registry.get("map[string]app.User").unwrap();
        assert_eq!(map.kind, TypeKind::Map);
        assert_eq!(map.key, Some(TypeRef::Builtin("string".into())));

        let user = registry.get("app.User").unwrap();
        assert_eq!(user.usage.edges.len(), 1);
        assert_eq!(user.usage.edges[0].referencer, "map[string]app.User");
        assert_eq!(user.usage.edges[0].member, "value");
    }

    #[test]
    fn test_placeholder_for_undeclared_reference() {
        let config = CoreConfig::default();
        let decls = vec![Declaration::composite(
            "app",
            "Order",
            vec![FieldDecl::new("Paid", TypeExpr::qualified("time", "Time"))],
        )];
        let registry = build(&config, &decls);
        let ghost = registry.get("time.Time").unwrap();
        assert!(ghost.placeholder);
        assert_eq!(ghost.kind, TypeKind::Composite);
        assert_eq!(ghost.package, "time");
    }

    #[test]
    fn test_methods_attach_to_receiver() {
        let config = CoreConfig::default();
        let decls = vec![
            Declaration::composite("app", "User", vec![]),
            Declaration::composite("app", "Profile", vec![]),
            Declaration::new(
                "app",
                "Profile",
                DeclarationKind::Function {
                    receiver: Some(TypeExpr::pointer(TypeExpr::named("User"))),
                    params: vec![],
                    results: vec![ParamDecl::new("", TypeExpr::pointer(TypeExpr::named("Profile")))],
                    call_sites: vec!["// @route(schema:\"Profile\")".to_string()],
                },
            )
            .with_doc("// @deprecated"),
        ];
        let registry = build(&config, &decls);
        let user = registry.get("app.User").unwrap();
        assert_eq!(user.methods.len(), 1);
        assert_eq!(user.methods[0].name, "Profile");
        assert_eq!(user.methods[0].annotations[0].name, "deprecated");
        assert_eq!(user.methods[0].call_site_annotations[0].param("schema"), Some("Profile"));

        let profile = registry.get("app.Profile").unwrap();
        assert_eq!(profile.usage.edges[0].referencer, "app.User");
        assert_eq!(profile.usage.edges[0].role, UsageRole::Return);
    }

    #[test]
    fn test_function_node_with_call_sites() {
        let config = CoreConfig::default();
        let mut decl = function(
            "ListUsers",
            vec![ParamDecl::new("filter", TypeExpr::named("Filter"))],
            vec![ParamDecl::new("", TypeExpr::slice(TypeExpr::named("User")))],
        )
        .with_doc("// ListUsers returns users.\n// @route(\"GET\", \"/users\")");
        if let DeclarationKind::Function { call_sites, .. } = &mut decl.kind {
            call_sites.push("// @schema(User)".to_string());
        }
        let decls = vec![
            decl,
            Declaration::composite("app", "User", vec![]),
            Declaration::composite("app", "Filter", vec![]),
        ];
        let registry = build(&config, &decls);
        let func = registry.get("app.ListUsers").unwrap();
        assert_eq!(func.kind, TypeKind::Function);
        assert_eq!(func.comment, "ListUsers returns users.");
        let sig = func.signature.as_ref().unwrap();
        assert_eq!(sig.params[0].type_ref, TypeRef::Node("app.Filter".into()));
        assert_eq!(sig.results[0].type_ref, TypeRef::Node("[]app.User".into()));
        assert_eq!(func.call_site_annotations[0].name, "schema");
        assert_eq!(sig.call_site_annotations, func.call_site_annotations);

        let filter = registry.get("app.Filter").unwrap();
        assert_eq!(filter.usage.edges[0].member, "ListUsers.filter");
        assert_eq!(filter.usage.edges[0].role, UsageRole::Parameter);
    }

    #[test]
    fn test_interface_embeds_inherit_methods() {
        let config = CoreConfig::default();
        let reader = Declaration::new(
            "app",
            "Reader",
            DeclarationKind::Interface {
                methods: vec![MethodDecl {
                    name: "Read".into(),
                    doc: String::new(),
                    params: vec![],
                    results: vec![ParamDecl::new("", TypeExpr::named("string"))],
                }],
                embeds: vec![],
            },
        );
        let closer = Declaration::new(
            "app",
            "ReadCloser",
            DeclarationKind::Interface {
                methods: vec![MethodDecl {
                    name: "Close".into(),
                    doc: String::new(),
                    params: vec![],
                    results: vec![],
                }],
                embeds: vec![TypeExpr::named("Reader")],
            },
        );
        let registry = build(&config, &[closer, reader]);
        let rc = registry.get("app.ReadCloser").unwrap();
        let names: Vec<&str> = rc.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Close", "Read"]);
        assert!(rc.fields[0].embedded);

        let reader = registry.get("app.Reader").unwrap();
        assert!(reader.usage.embedded_only);
    }

    #[test]
    fn test_anonymous_struct_field() {
        let config = CoreConfig::default();
        let decls = vec![Declaration::composite(
            "app",
            "User",
            vec![FieldDecl::new(
                "Meta",
                TypeExpr::Struct {
                    fields: vec![FieldDecl::new("Source", TypeExpr::named("string"))],
                },
            )],
        )];
        let registry = build(&config, &decls);
        let meta = registry.get("app.User.MetaType").unwrap();
        assert_eq!(meta.name, "MetaType");
        assert_eq!(meta.fields[0].name(), "Source");
        assert_eq!(meta.usage.edges[0].referencer, "app.User");
    }

    #[test]
    fn test_type_params_resolve_to_params() {
        let config = CoreConfig::default();
        let mut decl = Declaration::composite(
            "app",
            "Box",
            vec![
                FieldDecl::new("Value", TypeExpr::named("T")),
                FieldDecl::new("Items", TypeExpr::slice(TypeExpr::named("T"))),
            ],
        );
        decl.type_params = vec![TypeParamDecl {
            name: "T".into(),
            constraint: Some(TypeExpr::named("comparable")),
        }];
        let registry = build(&config, &[decl]);
        let boxed = registry.get("app.Box").unwrap();
        assert!(boxed.is_generic());
        assert_eq!(boxed.generic_params[0].constraint, Some(TypeRef::Builtin("comparable".into())));
        assert_eq!(boxed.fields[0].type_ref(), &TypeRef::Param("T".into()));
        assert_eq!(boxed.fields[1].type_ref(), &TypeRef::Param("[]T".into()));
    }

    #[test]
    fn test_register_all_is_idempotent() {
        let config = CoreConfig::default();
        let decls = vec![
            Declaration::composite("app", "User", vec![FieldDecl::new("Role", TypeExpr::named("Role"))]),
            Declaration::composite("app", "Role", vec![]),
            Declaration::constants("app", vec![ConstDecl::new("Admin").typed(TypeExpr::named("Role")).value("1")]),
        ];
        let mut ctx = BuildContext::new(&config, &decls);
        register_all(&mut ctx).unwrap();
        let first = ctx.registry.fingerprint();
        register_all(&mut ctx).unwrap();
        assert_eq!(ctx.registry.fingerprint(), first);
        assert_eq!(ctx.registry.get("app.Role").unwrap().usage.edges.len(), 1);
    }

    #[test]
    fn test_explicit_visibility_wins() {
        let config = CoreConfig::default();
        let mut decl = Declaration::composite("app", "internalThing", vec![]);
        decl.visibility = Some(Visibility::Protected);
        let registry = build(&config, &[decl]);
        assert_eq!(registry.get("app.internalThing").unwrap().visibility, Visibility::Protected);
    }
}
