//! Registry entries and their members.
//!
//! Nodes never hold other nodes: every cross-node reference is a canonical
//! name ([`TypeRef::Node`]) resolved through the registry, so cyclic graphs
//! need no shared ownership.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::usage::UsageInfo;
use crate::annotations::{Annotation, StructTags};

/// Kind of a registry node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Composite,
    Interface,
    Function,
    Enum,
    Alias,
    Array,
    Slice,
    Map,
    GenericInstantiation,
}

impl TypeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeKind::Composite => "composite",
            TypeKind::Interface => "interface",
            TypeKind::Function => "function",
            TypeKind::Enum => "enum",
            TypeKind::Alias => "alias",
            TypeKind::Array => "array",
            TypeKind::Slice => "slice",
            TypeKind::Map => "map",
            TypeKind::GenericInstantiation => "generic_instantiation",
        }
    }

    pub fn is_container(self) -> bool {
        matches!(self, TypeKind::Array | TypeKind::Slice | TypeKind::Map)
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility derived from naming convention or an explicit modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    /// Uppercase first letter exports; everything else is private.
    pub fn from_name(name: &str) -> Self {
        match name.chars().next() {
            Some(c) if c.is_uppercase() => Visibility::Public,
            _ => Visibility::Private,
        }
    }

    /// Explicit modifier wins over the naming convention.
    pub fn resolve(explicit: Option<Visibility>, name: &str) -> Self {
        explicit.unwrap_or_else(|| Self::from_name(name))
    }

    pub fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }
}

/// Origin of a node relative to the configured roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncludeType {
    /// Inside an explicitly configured root.
    Scanned,
    /// Same module, not explicitly scanned.
    Local,
    /// Platform or standard library.
    Std,
    #[default]
    External,
}

/// A resolved type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "ref", content = "name", rename_all = "snake_case")]
pub enum TypeRef {
    /// Primitive type; never a node.
    Builtin(String),
    /// Canonical name of a registry node.
    Node(String),
    /// Type parameter name, left as written.
    Param(String),
}

impl TypeRef {
    pub fn name(&self) -> &str {
        match self {
            TypeRef::Builtin(n) | TypeRef::Node(n) | TypeRef::Param(n) => n,
        }
    }

    /// Canonical key when this points at a node.
    pub fn node_key(&self) -> Option<&str> {
        match self {
            TypeRef::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn param_name(&self) -> Option<&str> {
        match self {
            TypeRef::Param(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared shape of fields, parameters and results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypedElement {
    pub name: String,
    pub type_ref: TypeRef,
    /// The type as written, e.g. `[]*T`.
    pub type_text: String,
    pub is_pointer: bool,
    pub comment: String,
    pub annotations: Vec<Annotation>,
    pub visibility: Visibility,
}

/// A field of a composite node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    #[serde(flatten)]
    pub element: TypedElement,
    pub embedded: bool,
    pub tags: StructTags,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.element.name
    }

    pub fn type_ref(&self) -> &TypeRef {
        &self.element.type_ref
    }
}

/// A method or function signature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionSignature {
    pub name: String,
    pub comment: String,
    pub annotations: Vec<Annotation>,
    /// Annotations written at call sites inside the body.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub call_site_annotations: Vec<Annotation>,
    pub params: Vec<TypedElement>,
    pub results: Vec<TypedElement>,
    pub visibility: Visibility,
}

/// A declared type parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenericParam {
    pub name: String,
    pub constraint: Option<TypeRef>,
}

/// Value of an enumeration member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EnumLiteral {
    Int(i64),
    Str(String),
}

impl fmt::Display for EnumLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumLiteral::Int(n) => write!(f, "{}", n),
            EnumLiteral::Str(s) => f.write_str(s),
        }
    }
}

/// One member of a reconstructed enumeration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumValue {
    pub name: String,
    pub value: EnumLiteral,
    /// Canonical name of the owning node.
    pub owner: String,
    pub comment: String,
    pub annotations: Vec<Annotation>,
    pub visibility: Visibility,
}

/// A registry entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeNode {
    pub canonical_name: String,
    pub name: String,
    pub package: String,
    pub source_path: String,
    pub kind: TypeKind,
    pub visibility: Visibility,
    pub comment: String,
    pub annotations: Vec<Annotation>,
    pub fields: Vec<Field>,
    pub methods: Vec<FunctionSignature>,
    /// Signature of a function node.
    pub signature: Option<FunctionSignature>,
    /// Annotations found on call statements inside a function body.
    pub call_site_annotations: Vec<Annotation>,
    pub generic_params: Vec<GenericParam>,
    pub alias_target: Option<TypeRef>,
    /// Element (array/slice) or value (map) type.
    pub element: Option<TypeRef>,
    pub key: Option<TypeRef>,
    /// Base node of a generic instantiation.
    pub generic_base: Option<String>,
    pub type_args: Vec<TypeRef>,
    /// Underlying type text of a defined type such as `type Color int`.
    pub underlying: Option<String>,
    pub enum_values: Vec<EnumValue>,
    pub usage: UsageInfo,
    pub include_type: IncludeType,
    /// BFS distance from the nearest scanned node; `None` until computed or unreachable.
    pub depth: Option<usize>,
    /// Referenced but never declared.
    pub placeholder: bool,
}

impl TypeNode {
    /// Empty node of the given kind. Members are filled in afterwards.
    pub fn skeleton(
        canonical_name: impl Into<String>,
        name: impl Into<String>,
        package: impl Into<String>,
        kind: TypeKind,
    ) -> Self {
        let name = name.into();
        Self {
            canonical_name: canonical_name.into(),
            visibility: Visibility::from_name(&name),
            name,
            package: package.into(),
            source_path: String::new(),
            kind,
            comment: String::new(),
            annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            signature: None,
            call_site_annotations: Vec::new(),
            generic_params: Vec::new(),
            alias_target: None,
            element: None,
            key: None,
            generic_base: None,
            type_args: Vec::new(),
            underlying: None,
            enum_values: Vec::new(),
            usage: UsageInfo::default(),
            include_type: IncludeType::default(),
            depth: None,
            placeholder: false,
        }
    }

    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }

    pub fn is_instantiation(&self) -> bool {
        self.generic_base.is_some()
    }

    pub fn is_enum(&self) -> bool {
        self.kind == TypeKind::Enum
    }

    /// True if `name` is a type parameter declared by this node.
    pub fn declares_param(&self, name: &str) -> bool {
        self.generic_params.iter().any(|p| p.name == name)
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations
            .iter()
            .any(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Every type reference held by this node, paired with the member it
    /// belongs to and whether the edge is an embedding.
    pub fn member_refs(&self) -> Vec<MemberRef<'_>> {
        let mut refs = Vec::new();
        for field in &self.fields {
            refs.push(MemberRef {
                member: field.name().to_string(),
                type_ref: field.type_ref(),
                edge: if field.embedded {
                    EdgeKind::Embedded
                } else {
                    EdgeKind::Field
                },
            });
        }
        let signatures = self.methods.iter().chain(self.signature.iter());
        for sig in signatures {
            for p in &sig.params {
                refs.push(MemberRef {
                    member: signature_member(&sig.name, &p.name),
                    type_ref: &p.type_ref,
                    edge: EdgeKind::Signature,
                });
            }
            for r in &sig.results {
                refs.push(MemberRef {
                    member: signature_member(&sig.name, &r.name),
                    type_ref: &r.type_ref,
                    edge: EdgeKind::Signature,
                });
            }
        }
        if let Some(t) = &self.alias_target {
            refs.push(MemberRef {
                member: "alias".to_string(),
                type_ref: t,
                edge: EdgeKind::Structural,
            });
        }
        if let Some(k) = &self.key {
            refs.push(MemberRef {
                member: "key".to_string(),
                type_ref: k,
                edge: EdgeKind::Structural,
            });
        }
        if let Some(e) = &self.element {
            refs.push(MemberRef {
                member: if self.kind == TypeKind::Map { "value" } else { "element" }.to_string(),
                type_ref: e,
                edge: EdgeKind::Structural,
            });
        }
        for (i, arg) in self.type_args.iter().enumerate() {
            refs.push(MemberRef {
                member: format!("arg{}", i),
                type_ref: arg,
                edge: EdgeKind::Structural,
            });
        }
        refs
    }

    /// Canonical names of all nodes this node references structurally,
    /// in member order, without duplicates.
    pub fn referenced_nodes(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for r in self.member_refs() {
            if let Some(key) = r.type_ref.node_key() {
                if key != self.canonical_name && !seen.contains(&key) {
                    seen.push(key);
                }
            }
        }
        seen
    }
}

/// Member path of a signature parameter or result: `Save.user`, or just
/// `Save` when the element is unnamed.
pub fn signature_member(signature: &str, element: &str) -> String {
    if element.is_empty() {
        signature.to_string()
    } else {
        format!("{}.{}", signature, element)
    }
}

/// How a member reaches the type it references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Field,
    Embedded,
    /// Method or function parameter/result.
    Signature,
    /// Alias target, container element/key, generic argument.
    Structural,
}

/// A borrowed view of one member reference.
#[derive(Debug, Clone)]
pub struct MemberRef<'a> {
    pub member: String,
    pub type_ref: &'a TypeRef,
    pub edge: EdgeKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(name: &str, type_ref: TypeRef) -> TypedElement {
        TypedElement {
            name: name.to_string(),
            type_text: type_ref.name().to_string(),
            type_ref,
            is_pointer: false,
            comment: String::new(),
            annotations: Vec::new(),
            visibility: Visibility::from_name(name),
        }
    }

    #[test]
    fn test_visibility_from_name() {
        assert_eq!(Visibility::from_name("User"), Visibility::Public);
        assert_eq!(Visibility::from_name("user"), Visibility::Private);
        assert_eq!(Visibility::from_name(""), Visibility::Private);
        assert_eq!(
            Visibility::resolve(Some(Visibility::Protected), "User"),
            Visibility::Protected
        );
    }

    #[test]
    fn test_referenced_nodes_skips_self_and_builtins() {
        let mut node = TypeNode::skeleton("app.Tree", "Tree", "app", TypeKind::Composite);
        node.fields.push(Field {
            element: element("Left", TypeRef::Node("app.Tree".into())),
            embedded: false,
            tags: StructTags::default(),
        });
        node.fields.push(Field {
            element: element("Label", TypeRef::Builtin("string".into())),
            embedded: false,
            tags: StructTags::default(),
        });
        node.fields.push(Field {
            element: element("Meta", TypeRef::Node("app.Meta".into())),
            embedded: true,
            tags: StructTags::default(),
        });
        node.fields.push(Field {
            element: element("Other", TypeRef::Node("app.Meta".into())),
            embedded: false,
            tags: StructTags::default(),
        });

        assert_eq!(node.referenced_nodes(), vec!["app.Meta"]);
        let refs = node.member_refs();
        assert_eq!(refs.len(), 4);
        assert_eq!(refs[2].edge, EdgeKind::Embedded);
    }

    #[test]
    fn test_map_members_are_named_key_and_value() {
        let mut node = TypeNode::skeleton("map[string]app.User", "", "app", TypeKind::Map);
        node.key = Some(TypeRef::Builtin("string".into()));
        node.element = Some(TypeRef::Node("app.User".into()));
        let names: Vec<String> = node.member_refs().into_iter().map(|r| r.member).collect();
        assert_eq!(names, vec!["key", "value"]);
    }

    #[test]
    fn test_enum_literal_display() {
        assert_eq!(EnumLiteral::Int(7).to_string(), "7");
        assert_eq!(EnumLiteral::Str("red".into()).to_string(), "red");
    }
}
