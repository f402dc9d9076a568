//! Declarations as supplied by a declaration source.
//!
//! These are the inputs of a build. They are plain data, deserializable from
//! JSON, and carry the doc-comment text that annotations are parsed from.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::node::Visibility;

/// A type expression as written at a use site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeExpr {
    /// A named type. `package: None` means the package of the enclosing
    /// declaration (or a builtin, or an in-scope type parameter).
    Named {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        package: Option<String>,
        name: String,
    },
    Pointer { elem: Box<TypeExpr> },
    Slice { elem: Box<TypeExpr> },
    Array {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        len: Option<u64>,
        elem: Box<TypeExpr>,
    },
    Map { key: Box<TypeExpr>, value: Box<TypeExpr> },
    Generic { base: Box<TypeExpr>, args: Vec<TypeExpr> },
    /// Inline anonymous struct.
    Struct { fields: Vec<FieldDecl> },
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named {
            package: None,
            name: name.into(),
        }
    }

    pub fn qualified(package: impl Into<String>, name: impl Into<String>) -> Self {
        TypeExpr::Named {
            package: Some(package.into()),
            name: name.into(),
        }
    }

    pub fn pointer(elem: TypeExpr) -> Self {
        TypeExpr::Pointer { elem: Box::new(elem) }
    }

    pub fn slice(elem: TypeExpr) -> Self {
        TypeExpr::Slice { elem: Box::new(elem) }
    }

    pub fn array(len: u64, elem: TypeExpr) -> Self {
        TypeExpr::Array {
            len: Some(len),
            elem: Box::new(elem),
        }
    }

    pub fn map(key: TypeExpr, value: TypeExpr) -> Self {
        TypeExpr::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn generic(base: TypeExpr, args: Vec<TypeExpr>) -> Self {
        TypeExpr::Generic {
            base: Box::new(base),
            args,
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, TypeExpr::Pointer { .. })
    }

    /// Strip any number of pointer layers.
    pub fn deref(&self) -> &TypeExpr {
        match self {
            TypeExpr::Pointer { elem } => elem.deref(),
            other => other,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named {
                package: Some(pkg),
                name,
            } => {
                let short = pkg.rsplit('/').next().unwrap_or(pkg);
                write!(f, "{}.{}", short, name)
            }
            TypeExpr::Named { package: None, name } => f.write_str(name),
            TypeExpr::Pointer { elem } => write!(f, "*{}", elem),
            TypeExpr::Slice { elem } => write!(f, "[]{}", elem),
            TypeExpr::Array { len: Some(n), elem } => write!(f, "[{}]{}", n, elem),
            TypeExpr::Array { len: None, elem } => write!(f, "[...]{}", elem),
            TypeExpr::Map { key, value } => write!(f, "map[{}]{}", key, value),
            TypeExpr::Generic { base, args } => {
                write!(f, "{}[", base)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str("]")
            }
            TypeExpr::Struct { .. } => f.write_str("struct{...}"),
        }
    }
}

/// A field of a composite (or inline struct).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Empty for embedded fields; the embedded type name is used instead.
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    #[serde(default)]
    pub embedded: bool,
    #[serde(default)]
    pub doc: String,
    /// Raw struct tag text, e.g. `` `json:"id" db:"user_id"` ``.
    #[serde(default)]
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            embedded: false,
            doc: String::new(),
            tag: String::new(),
            visibility: None,
        }
    }

    pub fn embedded(ty: TypeExpr) -> Self {
        Self {
            embedded: true,
            ..Self::new("", ty)
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }
}

/// A parameter or result of a signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDecl {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// An interface method signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub doc: String,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(default)]
    pub results: Vec<ParamDecl>,
}

/// One member of a constant group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstDecl {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<TypeExpr>,
    /// Raw value expression; `None` when the member omits it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub doc: String,
}

impl ConstDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
            value: None,
            doc: String::new(),
        }
    }

    pub fn typed(mut self, ty: TypeExpr) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// A declared type parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParamDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<TypeExpr>,
}

/// Shape of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum DeclarationKind {
    Composite {
        #[serde(default)]
        fields: Vec<FieldDecl>,
    },
    Interface {
        #[serde(default)]
        methods: Vec<MethodDecl>,
        #[serde(default)]
        embeds: Vec<TypeExpr>,
    },
    Function {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        receiver: Option<TypeExpr>,
        #[serde(default)]
        params: Vec<ParamDecl>,
        #[serde(default)]
        results: Vec<ParamDecl>,
        /// Comment text attached to call statements inside the body.
        #[serde(default)]
        call_sites: Vec<String>,
    },
    ConstantGroup { members: Vec<ConstDecl> },
    Alias { target: TypeExpr },
    /// Named array, slice or map type.
    Container { expr: TypeExpr },
    /// Named instantiation, e.g. `type CharNode = Node[Character, int]`.
    GenericInstantiation { base: TypeExpr, args: Vec<TypeExpr> },
    /// Named type over another type, e.g. `type Color int`.
    Defined { underlying: TypeExpr },
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Empty for constant groups.
    #[serde(default)]
    pub name: String,
    pub package: String,
    #[serde(default)]
    pub source_path: String,
    #[serde(default)]
    pub doc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub type_params: Vec<TypeParamDecl>,
    #[serde(flatten)]
    pub kind: DeclarationKind,
}

impl Declaration {
    pub fn new(package: impl Into<String>, name: impl Into<String>, kind: DeclarationKind) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            source_path: String::new(),
            doc: String::new(),
            visibility: None,
            type_params: Vec::new(),
            kind,
        }
    }

    pub fn composite(package: impl Into<String>, name: impl Into<String>, fields: Vec<FieldDecl>) -> Self {
        Self::new(package, name, DeclarationKind::Composite { fields })
    }

    pub fn constants(package: impl Into<String>, members: Vec<ConstDecl>) -> Self {
        Self::new(package, "", DeclarationKind::ConstantGroup { members })
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    pub fn with_source(mut self, path: impl Into<String>) -> Self {
        self.source_path = path.into();
        self
    }

    pub fn with_type_params(mut self, params: &[&str]) -> Self {
        self.type_params = params
            .iter()
            .map(|p| TypeParamDecl {
                name: (*p).to_string(),
                constraint: None,
            })
            .collect();
        self
    }

    /// True for declarations that define a type node of their own.
    pub fn defines_type(&self) -> bool {
        match &self.kind {
            DeclarationKind::ConstantGroup { .. } => false,
            DeclarationKind::Function { receiver, .. } => receiver.is_none(),
            _ => !self.name.is_empty(),
        }
    }
}
