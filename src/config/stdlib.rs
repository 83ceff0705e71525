//! Embedded standard library, imported as `import stdlib.<name>`.

/// Import names starting with this prefix never touch the filesystem.
pub const STDLIB_PREFIX: &str = "stdlib.";

const CONST: &str = r#"// Transaction enumerations.

const NoOp = 0;
const OptIn = 1;
const CloseOut = 2;
const ClearState = 3;
const UpdateApplication = 4;
const DeleteApplication = 5;

const TxTypePayment = 1;
const TxTypeKeyRegistration = 2;
const TxTypeAssetConfig = 3;
const TxTypeAssetTransfer = 4;
const TxTypeAssetFreeze = 5;
const TxTypeApplicationCall = 6;
"#;

const MATH: &str = r#"// Integer helpers, expanded at each call site.

inline function min(a, b) {
    if a < b {
        return a;
    }
    return b;
}

inline function max(a, b) {
    if a > b {
        return a;
    }
    return b;
}
"#;

/// Source text of a standard library module, by full import name.
pub fn lookup(name: &str) -> Option<&'static str> {
    match name.strip_prefix(STDLIB_PREFIX)? {
        "const" => Some(CONST),
        "math" => Some(MATH),
        _ => None,
    }
}

pub fn is_stdlib(name: &str) -> bool {
    name.starts_with(STDLIB_PREFIX)
}
