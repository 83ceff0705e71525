//! Builtin catalog: every operation callable by name, its argument shapes,
//! result types, minimum target version and optional call remapper.
//!
//! A remapper runs once when the call node is built. It may rename the
//! opcode and fold compile-time constant arguments into immediates.

pub mod fields;

use crate::ast::Expr;
use crate::span::Spanned;
use crate::types::Ty;
use fields::FieldInfo;

/// Largest value an immediate byte operand can hold.
pub const MAX_IMMEDIATE: u64 = 255;

/// What an argument position accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgShape {
    Int,
    Bytes,
    /// Integer or byte array.
    Any,
    /// A bare field name, compiled to an immediate, never evaluated.
    FieldName(&'static [FieldInfo]),
}

impl ArgShape {
    pub fn accepts(&self, ty: Ty) -> bool {
        match self {
            ArgShape::Int => ty == Ty::Integer,
            ArgShape::Bytes => ty == Ty::Bytes,
            ArgShape::Any => ty.is_resolved(),
            ArgShape::FieldName(_) => true,
        }
    }

    pub fn expectation(&self) -> &'static str {
        match self {
            ArgShape::Int => "int",
            ArgShape::Bytes => "byte[]",
            ArgShape::Any => "int or byte[]",
            ArgShape::FieldName(_) => "a field name",
        }
    }
}

/// Compile-time knowledge about one source argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstArg {
    Int(u64),
    Name(String),
    Unknown,
}

impl ConstArg {
    fn immediate(&self) -> Option<u64> {
        match self {
            ConstArg::Int(n) if *n <= MAX_IMMEDIATE => Some(*n),
            _ => None,
        }
    }
}

/// A builtin call node.
#[derive(Clone, Debug)]
pub struct BuiltinCall {
    /// Name the call was written with.
    pub name: &'static str,
    /// Opcode emitted after the arguments.
    pub op: String,
    /// Arguments pushed on the stack, in order.
    pub args: Vec<Spanned<Expr>>,
    /// For each entry of `args`: its 1-based source position and shape.
    pub params: Vec<(usize, ArgShape)>,
    pub immediates: Vec<String>,
    pub results: Vec<Ty>,
}

pub type RemapFn = fn(&mut BuiltinCall, &[ConstArg], u8) -> Result<(), String>;

pub struct BuiltinSpec {
    pub name: &'static str,
    /// False for opcode names that only exist as rewrite targets.
    pub callable: bool,
    pub args: &'static [ArgShape],
    pub results: &'static [Ty],
    pub remap: Option<RemapFn>,
    pub min_version: u8,
}

impl BuiltinSpec {
    /// Build the call node from already-built value arguments.
    ///
    /// `args` holds one expression per non-field-name shape; `consts` holds
    /// one entry per source argument.
    pub fn instantiate(
        &self,
        args: Vec<Spanned<Expr>>,
        consts: &[ConstArg],
        version: u8,
    ) -> Result<BuiltinCall, String> {
        let params = self
            .args
            .iter()
            .enumerate()
            .filter(|(_, shape)| !matches!(shape, ArgShape::FieldName(_)))
            .map(|(i, shape)| (i + 1, *shape))
            .collect();
        let mut call = BuiltinCall {
            name: self.name,
            op: self.name.to_string(),
            args,
            params,
            immediates: Vec::new(),
            results: self.results.to_vec(),
        };
        if let Some(remap) = self.remap {
            remap(&mut call, consts, version)?;
        }
        Ok(call)
    }
}

const INT: ArgShape = ArgShape::Int;
const BYTES: ArgShape = ArgShape::Bytes;
const ANY: ArgShape = ArgShape::Any;
const I: Ty = Ty::Integer;
const B: Ty = Ty::Bytes;

const fn builtin(
    name: &'static str,
    args: &'static [ArgShape],
    results: &'static [Ty],
    min_version: u8,
) -> BuiltinSpec {
    BuiltinSpec {
        name,
        callable: true,
        args,
        results,
        remap: None,
        min_version,
    }
}

const fn remapped(
    name: &'static str,
    args: &'static [ArgShape],
    results: &'static [Ty],
    min_version: u8,
    remap: RemapFn,
) -> BuiltinSpec {
    BuiltinSpec {
        name,
        callable: true,
        args,
        results,
        remap: Some(remap),
        min_version,
    }
}

const fn internal(
    name: &'static str,
    args: &'static [ArgShape],
    results: &'static [Ty],
    min_version: u8,
) -> BuiltinSpec {
    BuiltinSpec {
        name,
        callable: false,
        args,
        results,
        remap: None,
        min_version,
    }
}

pub static BUILTINS: &[BuiltinSpec] = &[
    // Crypto
    builtin("sha256", &[BYTES], &[B], 1),
    builtin("keccak256", &[BYTES], &[B], 1),
    builtin("sha512_256", &[BYTES], &[B], 1),
    builtin("ed25519verify", &[BYTES, BYTES, BYTES], &[I], 1),
    // Bytes
    builtin("len", &[BYTES], &[I], 1),
    builtin("itob", &[INT], &[B], 1),
    builtin("btoi", &[BYTES], &[I], 1),
    builtin("concat", &[BYTES, BYTES], &[B], 2),
    remapped("substring", &[BYTES, INT, INT], &[B], 2, remap_substring),
    remapped("extract", &[BYTES, INT, INT], &[B], 5, remap_extract),
    builtin("extract_uint16", &[BYTES, INT], &[I], 5),
    builtin("extract_uint32", &[BYTES, INT], &[I], 5),
    builtin("extract_uint64", &[BYTES, INT], &[I], 5),
    builtin("getbyte", &[BYTES, INT], &[I], 3),
    builtin("setbyte", &[BYTES, INT, INT], &[B], 3),
    builtin("getbit", &[ANY, INT], &[I], 3),
    builtin("bzero", &[INT], &[B], 4),
    builtin("bitlen", &[ANY], &[I], 4),
    // Wide math
    builtin("addw", &[INT, INT], &[I, I], 2),
    builtin("mulw", &[INT, INT], &[I, I], 1),
    builtin("expw", &[INT, INT], &[I, I], 4),
    builtin("divmodw", &[INT, INT, INT, INT], &[I, I, I, I], 4),
    builtin("exp", &[INT, INT], &[I], 4),
    builtin("sqrt", &[INT], &[I], 4),
    builtin("shl", &[INT, INT], &[I], 4),
    builtin("shr", &[INT, INT], &[I], 4),
    // State
    builtin("balance", &[ANY], &[I], 2),
    builtin("min_balance", &[ANY], &[I], 3),
    builtin("app_opted_in", &[ANY, INT], &[I], 2),
    builtin("app_local_get", &[ANY, BYTES], &[Ty::Unknown], 2),
    builtin("app_local_put", &[ANY, BYTES, ANY], &[], 2),
    builtin("app_local_del", &[ANY, BYTES], &[], 2),
    builtin("app_global_get", &[BYTES], &[Ty::Unknown], 2),
    builtin("app_global_put", &[BYTES, ANY], &[], 2),
    builtin("app_global_del", &[BYTES], &[], 2),
    remapped(
        "asset_holding_get",
        &[ArgShape::FieldName(fields::ASSET_HOLDING_FIELDS), ANY, INT],
        &[Ty::Unknown, I],
        2,
        remap_asset_field,
    ),
    remapped(
        "asset_params_get",
        &[ArgShape::FieldName(fields::ASSET_PARAMS_FIELDS), INT],
        &[Ty::Unknown, I],
        2,
        remap_asset_field,
    ),
    // Misc
    builtin("log", &[BYTES], &[], 5),
    builtin("assert", &[INT], &[], 3),
    // Rewrite targets
    internal("substring3", &[BYTES, INT, INT], &[B], 2),
    internal("extract3", &[BYTES, INT, INT], &[B], 5),
    internal("itxn_begin", &[], &[], 5),
    internal("itxn_field", &[ANY], &[], 5),
    internal("itxn_submit", &[], &[], 5),
];

pub fn lookup(name: &str) -> Option<&'static BuiltinSpec> {
    BUILTINS.iter().find(|b| b.name == name)
}

/// Fold both indices into immediates when they fit, keeping only the
/// byte-array argument on the stack.
fn fold_index_pair(call: &mut BuiltinCall, consts: &[ConstArg]) -> bool {
    let (Some(a), Some(b)) = (
        consts.get(1).and_then(ConstArg::immediate),
        consts.get(2).and_then(ConstArg::immediate),
    ) else {
        return false;
    };
    call.args.truncate(1);
    call.params.truncate(1);
    call.immediates = vec![a.to_string(), b.to_string()];
    true
}

fn remap_substring(call: &mut BuiltinCall, consts: &[ConstArg], _version: u8) -> Result<(), String> {
    if let (ConstArg::Int(start), ConstArg::Int(end)) = (&consts[1], &consts[2]) {
        if start > end {
            return Err(format!(
                "substring start {} is greater than end {}",
                start, end
            ));
        }
    }
    if !fold_index_pair(call, consts) {
        call.op = "substring3".to_string();
    }
    Ok(())
}

/// A zero length immediate means "to the end", unlike a zero on the stack,
/// so a constant zero length stays a stack argument.
fn remap_extract(call: &mut BuiltinCall, consts: &[ConstArg], _version: u8) -> Result<(), String> {
    let zero_length = matches!(consts.get(2), Some(ConstArg::Int(0)));
    if zero_length || !fold_index_pair(call, consts) {
        call.op = "extract3".to_string();
    }
    Ok(())
}

/// The first argument names an asset field: it becomes the immediate and
/// decides the type of the first result.
fn remap_asset_field(call: &mut BuiltinCall, consts: &[ConstArg], version: u8) -> Result<(), String> {
    let table = match lookup(call.name).and_then(|spec| spec.args.first()) {
        Some(ArgShape::FieldName(table)) => *table,
        _ => return Err(format!("'{}' takes no field name", call.op)),
    };
    let ConstArg::Name(name) = &consts[0] else {
        return Err(format!(
            "argument 1 of '{}' must be a field name",
            call.op
        ));
    };
    let field = fields::find(table, name)
        .ok_or_else(|| format!("unknown field '{}' for '{}'", name, call.op))?;
    if field.min_version > version {
        return Err(format!(
            "field '{}' requires version {} (target is {})",
            name, field.min_version, version
        ));
    }
    call.immediates = vec![field.name.to_string()];
    call.results = vec![field.ty, Ty::Integer];
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;
    use crate::pool::PoolRef;

    fn int_arg(n: u64) -> Spanned<Expr> {
        Spanned::dummy(Expr::Literal {
            value: Literal::Int(n),
            pool: PoolRef::Int(0),
        })
    }

    fn bytes_arg() -> Spanned<Expr> {
        Spanned::dummy(Expr::Literal {
            value: Literal::Bytes(b"abc".to_vec()),
            pool: PoolRef::Bytes(0),
        })
    }

    #[test]
    fn test_catalog_names_unique() {
        for (i, b) in BUILTINS.iter().enumerate() {
            assert!(BUILTINS[i + 1..].iter().all(|o| o.name != b.name), "{}", b.name);
        }
    }

    #[test]
    fn test_internal_names_not_callable() {
        for name in ["substring3", "extract3", "itxn_begin", "itxn_field", "itxn_submit"] {
            assert!(!lookup(name).unwrap().callable, "{}", name);
        }
        assert!(lookup("sha256").unwrap().callable);
        assert!(lookup("nope").is_none());
    }

    #[test]
    fn test_substring_constant_indices_fold() {
        let spec = lookup("substring").unwrap();
        let call = spec
            .instantiate(
                vec![bytes_arg(), int_arg(1), int_arg(2)],
                &[ConstArg::Unknown, ConstArg::Int(1), ConstArg::Int(2)],
                5,
            )
            .unwrap();
        assert_eq!(call.op, "substring");
        assert_eq!(call.args.len(), 1);
        assert_eq!(call.immediates, vec!["1", "2"]);
    }

    #[test]
    fn test_substring_dynamic_falls_back() {
        let spec = lookup("substring").unwrap();
        let call = spec
            .instantiate(
                vec![bytes_arg(), int_arg(1), int_arg(300)],
                &[ConstArg::Unknown, ConstArg::Int(1), ConstArg::Int(300)],
                5,
            )
            .unwrap();
        assert_eq!(call.op, "substring3");
        assert_eq!(call.args.len(), 3);
        assert!(call.immediates.is_empty());
        assert_eq!(call.params[2], (3, ArgShape::Int));
    }

    #[test]
    fn test_substring_reversed_bounds() {
        let spec = lookup("substring").unwrap();
        let err = spec
            .instantiate(
                vec![bytes_arg(), int_arg(5), int_arg(2)],
                &[ConstArg::Unknown, ConstArg::Int(5), ConstArg::Int(2)],
                5,
            )
            .unwrap_err();
        assert!(err.contains("greater than end"));
    }

    #[test]
    fn test_asset_field_selects_result_type() {
        let spec = lookup("asset_params_get").unwrap();
        let call = spec
            .instantiate(
                vec![int_arg(7)],
                &[ConstArg::Name("AssetName".into()), ConstArg::Int(7)],
                5,
            )
            .unwrap();
        assert_eq!(call.immediates, vec!["AssetName"]);
        assert_eq!(call.results, vec![Ty::Bytes, Ty::Integer]);
        assert_eq!(call.params, vec![(2, ArgShape::Int)]);
    }

    #[test]
    fn test_asset_field_unknown_and_versioned() {
        let spec = lookup("asset_params_get").unwrap();
        let consts = [ConstArg::Name("Bogus".into()), ConstArg::Unknown];
        let err = spec.instantiate(vec![int_arg(7)], &consts, 5).unwrap_err();
        assert!(err.contains("unknown field 'Bogus'"));

        let consts = [ConstArg::Name("AssetCreator".into()), ConstArg::Unknown];
        let err = spec.instantiate(vec![int_arg(7)], &consts, 4).unwrap_err();
        assert!(err.contains("requires version 5"));
    }

    #[test]
    fn test_shapes() {
        assert!(ArgShape::Int.accepts(Ty::Integer));
        assert!(!ArgShape::Int.accepts(Ty::Bytes));
        assert!(!ArgShape::Any.accepts(Ty::Unknown));
        assert_eq!(ArgShape::Int.expectation(), "int");
    }
}
