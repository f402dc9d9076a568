//! Synthesis of generic instantiation nodes.
//!
//! An instance copies its base's kind, fields and methods verbatim. Field
//! types are not substituted: a field typed `T` in the base is still
//! `Param("T")` in `Node[app.Character,int]`, which the reachability engine's
//! out-of-scope policy deals with later.

use tracing::debug;

use crate::error::{TypegraphError, TypegraphResult};
use crate::model::{TypeExpr, TypeKind, TypeNode, TypeRef};
use crate::registry::canonical::instance_name;
use crate::registry::resolver::{node_mut, resolve_type, Site};
use crate::registry::{BuildContext, TypeRegistry};

/// Resolve `base[args]` at a use site. With generics disabled, or when the
/// base is not a node, the base reference is returned unchanged.
pub fn resolve_instance(
    ctx: &mut BuildContext<'_>,
    base: &TypeExpr,
    args: &[TypeExpr],
    site: Site<'_>,
) -> TypegraphResult<TypeRef> {
    let base_ref = resolve_type(ctx, base, site)?;
    let Some(base_key) = base_ref.node_key().map(str::to_string) else {
        return Ok(base_ref);
    };
    if !ctx.config.enable_generics {
        return Ok(base_ref);
    }

    let arg_refs = resolve_args(ctx, args, site)?;
    let canonical = instance_name(&base_key, &arg_names(&arg_refs));
    if ctx.registry.contains(&canonical) {
        return Ok(TypeRef::Node(canonical));
    }

    let (name, package, visibility) = {
        let base_node = ctx
            .registry
            .get(&base_key)
            .ok_or_else(|| TypegraphError::unresolved(base_key.as_str(), site.owner))?;
        (
            instance_name(&base_node.name, &arg_names(&arg_refs)),
            base_node.package.clone(),
            base_node.visibility,
        )
    };
    let mut node = TypeNode::skeleton(canonical.as_str(), name, package, TypeKind::GenericInstantiation);
    node.visibility = visibility;
    node.generic_base = Some(base_key.clone());
    node.type_args = arg_refs;
    ctx.registry.insert(node);

    attach_to_base(ctx, &canonical, &base_key)?;
    Ok(TypeRef::Node(canonical))
}

/// Populate a named instantiation such as `type CharNode = Node[Character, int]`.
///
/// The node keeps its own canonical name. With generics disabled it becomes
/// an alias of the base.
pub fn populate_named_instance(
    ctx: &mut BuildContext<'_>,
    canonical: &str,
    base: &TypeExpr,
    args: &[TypeExpr],
    site: Site<'_>,
) -> TypegraphResult<()> {
    let base_ref = resolve_type(ctx, base, site)?;
    let base_key = match base_ref.node_key() {
        Some(key) if ctx.config.enable_generics => key.to_string(),
        _ => {
            let node = node_mut(&mut ctx.registry, canonical)?;
            node.kind = TypeKind::Alias;
            node.alias_target = Some(base_ref);
            return Ok(());
        }
    };

    let arg_refs = resolve_args(ctx, args, site)?;
    let node = node_mut(&mut ctx.registry, canonical)?;
    node.generic_base = Some(base_key.clone());
    node.type_args = arg_refs;

    attach_to_base(ctx, canonical, &base_key)
}

fn resolve_args(ctx: &mut BuildContext<'_>, args: &[TypeExpr], site: Site<'_>) -> TypegraphResult<Vec<TypeRef>> {
    args.iter().map(|arg| resolve_type(ctx, arg, site)).collect()
}

fn arg_names(args: &[TypeRef]) -> Vec<&str> {
    args.iter().map(TypeRef::name).collect()
}

/// Copy now, or wait until the base finishes construction.
fn attach_to_base(ctx: &mut BuildContext<'_>, instance: &str, base: &str) -> TypegraphResult<()> {
    if ctx.registry.is_under_construction(base) {
        debug!(node = instance, base, "deferring instantiation until base is complete");
        ctx.defer_instance(base, instance);
        Ok(())
    } else {
        copy_from_base(&mut ctx.registry, instance, base)
    }
}

/// Copy kind, fields and methods of `base` into `instance`. Methods the
/// instance already declares itself are kept after the base's.
pub fn copy_from_base(registry: &mut TypeRegistry, instance: &str, base: &str) -> TypegraphResult<()> {
    let (kind, fields, mut methods) = {
        let base_node = registry
            .get(base)
            .ok_or_else(|| TypegraphError::unresolved(base, instance))?;
        (base_node.kind, base_node.fields.clone(), base_node.methods.clone())
    };

    let node = node_mut(registry, instance)?;
    for own in node.methods.drain(..) {
        if !methods.iter().any(|m| m.name == own.name) {
            methods.push(own);
        }
    }
    node.kind = kind;
    node.fields = fields;
    node.methods = methods;
    Ok(())
}
