//! Constant collection and enum detection.
//!
//! Constants are grouped by the node their type resolves to. After all
//! groups are read, every node that gathered at least one constant becomes
//! an enum carrying its values in declaration order.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::sequence::ConstSequence;
use crate::annotations::{doc_comment_text, parse_annotations};
use crate::error::TypegraphResult;
use crate::model::{Declaration, DeclarationKind, EnumValue, TypeKind, TypeRef, Visibility};
use crate::registry::{resolve_type, BuildContext, Site, TypeRegistry};

/// Read one constant group into the build context.
///
/// Constants typed with a builtin, or with no type in effect, are skipped
/// but still advance the sequence. Collecting the same group twice adds
/// nothing.
pub fn collect_constants(ctx: &mut BuildContext<'_>, group: &Declaration) -> TypegraphResult<()> {
    let DeclarationKind::ConstantGroup { members } = &group.kind else {
        return Ok(());
    };
    let marker = ctx.marker();
    let group_annotations = parse_annotations(&group.doc, marker);

    let mut sequence = ConstSequence::new();
    let mut owner: Option<String> = None;
    for member in members {
        if let Some(ty) = &member.ty {
            let site = Site::new(&group.package, &group.package, &member.name);
            owner = match resolve_type(ctx, ty, site)? {
                TypeRef::Node(key) => Some(key),
                _ => None,
            };
            sequence.reset();
        }
        let value = sequence.next_value(member.value.as_deref());

        let Some(owner) = &owner else { continue };
        if member.name == "_" {
            continue;
        }

        let values = ctx.constants.entry(owner.clone()).or_default();
        if values.iter().any(|v| v.name == member.name) {
            continue;
        }
        let mut annotations = parse_annotations(&member.doc, marker);
        annotations.extend(group_annotations.iter().cloned());
        values.push(EnumValue {
            name: member.name.clone(),
            value,
            owner: owner.clone(),
            comment: doc_comment_text(&member.doc, marker),
            annotations,
            visibility: Visibility::from_name(&member.name),
        });
    }
    Ok(())
}

/// Turn every node that gathered constants into an enum. Returns the
/// number of enums.
pub fn detect_enums(registry: &mut TypeRegistry, constants: BTreeMap<String, Vec<EnumValue>>) -> usize {
    let mut count = 0;
    for (owner, values) in constants {
        if values.is_empty() {
            continue;
        }
        let Some(node) = registry.get_mut(&owner) else {
            warn!(node = %owner, "constants reference a type missing from the registry");
            continue;
        };
        debug!(node = %owner, values = values.len(), "detected enum");
        node.kind = TypeKind::Enum;
        node.enum_values = values;
        count += 1;
    }
    count
}

/// Detect enums from the constants gathered in `ctx`.
pub fn detect(ctx: &mut BuildContext<'_>) -> usize {
    let constants = std::mem::take(&mut ctx.constants);
    detect_enums(&mut ctx.registry, constants)
}
