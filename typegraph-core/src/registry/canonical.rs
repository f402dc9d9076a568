//! Canonical node names.
//!
//! | Type                 | Canonical name                    |
//! |----------------------|-----------------------------------|
//! | Named declaration    | `<package>.<name>`                |
//! | Builtin              | bare name (never a node)          |
//! | Generic instance     | `<base>[<arg>,<arg>]`             |
//! | Slice / array / map  | `[]<e>` / `[N]<e>` / `map[<k>]<v>`|
//! | Inline struct        | `<owner>.<field>Type`             |

/// Predeclared types. These never become registry nodes.
pub const BUILTIN_TYPES: &[&str] = &[
    "any",
    "bool",
    "byte",
    "comparable",
    "complex128",
    "complex64",
    "error",
    "float32",
    "float64",
    "int",
    "int16",
    "int32",
    "int64",
    "int8",
    "rune",
    "string",
    "uint",
    "uint16",
    "uint32",
    "uint64",
    "uint8",
    "uintptr",
];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_TYPES.contains(&name)
}

pub fn qualify(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", package, name)
    }
}

pub fn instance_name<S: AsRef<str>>(base: &str, args: &[S]) -> String {
    let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
    format!("{}[{}]", base, args.join(","))
}

pub fn slice_name(elem: &str) -> String {
    format!("[]{}", elem)
}

/// Arrays without a known length use `...`.
pub fn array_name(len: Option<u64>, elem: &str) -> String {
    match len {
        Some(n) => format!("[{}]{}", n, elem),
        None => format!("[...]{}", elem),
    }
}

pub fn map_name(key: &str, value: &str) -> String {
    format!("map[{}]{}", key, value)
}

/// Name of an inline struct declared by `field` of `owner`. Unnamed
/// positions fall back to `AnonymousType`.
pub fn anonymous_struct_name(owner: &str, field: &str) -> String {
    if field.is_empty() {
        format!("{}.AnonymousType", owner)
    } else {
        format!("{}.{}Type", owner, field)
    }
}

/// Last path segment of a package, e.g. `models` for `example.com/app/models`.
pub fn package_short_name(package: &str) -> &str {
    package.rsplit('/').next().unwrap_or(package)
}

/// Split a canonical name into package and short name at the last `.` that
/// sits outside brackets. Names without a package give an empty package.
pub fn split_canonical(canonical: &str) -> (&str, &str) {
    let mut depth = 0usize;
    let mut split = None;
    for (i, c) in canonical.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '.' if depth == 0 => split = Some(i),
            _ => {}
        }
    }
    match split {
        Some(i) => (&canonical[..i], &canonical[i + 1..]),
        None => ("", canonical),
    }
}
