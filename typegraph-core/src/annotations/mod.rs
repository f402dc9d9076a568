//! Comment annotations and inline field tags.
//!
//! Annotations are parsed from doc-comment text into a name plus a string
//! parameter bag. Plugins declare which annotations they understand through
//! [`AnnotationSpec`]s, which the validator checks every registry node against.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐     ┌─────────────────────┐
//! │     parser.rs       │     │       tags.rs       │
//! │  ─────────────────  │     │  ─────────────────  │
//! │  @name(k:v, flag)   │     │  `json:"id" db:".."`│
//! └──────────┬──────────┘     └──────────┬──────────┘
//!            │                           │
//!            ▼                           ▼
//! ┌─────────────────────┐     ┌─────────────────────┐
//! │      types.rs       │     │     lookup.rs       │
//! │  ─────────────────  │────▶│  ─────────────────  │
//! │  Annotation, specs  │     │  match/merge/ns     │
//! └──────────┬──────────┘     └─────────────────────┘
//!            ▼
//! ┌─────────────────────┐
//! │    validator.rs     │
//! │  ─────────────────  │
//! │  Disabled/Lax/Strict│
//! └─────────────────────┘
//! ```

pub mod lookup;
pub mod parser;
pub mod tags;
pub mod types;
pub mod validator;

pub use lookup::{find_annotation, matches_annotation, merge_annotations, namespace_of, normalize_annotation_name};
pub use parser::{doc_comment_text, parse_annotation, parse_annotations};
pub use tags::{parse_struct_tags, StructTags};
pub use types::{
    core_specs, parse_bool, parse_string_list, Annotation, AnnotationParam, AnnotationSpec, ParamType, ValidOn,
    DEFAULT_PARAM,
};
pub use validator::{AnnotationValidator, Severity, ValidationIssue, ValidationReport};
