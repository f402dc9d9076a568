//! Data model: declarations coming in, nodes and usage edges going out.

pub mod declaration;
pub mod node;
pub mod usage;

pub use declaration::{
    ConstDecl, Declaration, DeclarationKind, FieldDecl, MethodDecl, ParamDecl, TypeExpr,
    TypeParamDecl,
};
pub use node::{
    EdgeKind, EnumLiteral, EnumValue, Field, FunctionSignature, GenericParam, IncludeType,
    signature_member, MemberRef, TypeKind, TypeNode, TypeRef, TypedElement, Visibility,
};
pub use usage::{UsageEdge, UsageInfo, UsageRole};
