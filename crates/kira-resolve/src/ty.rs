//! Resolved types.
//!
//! Unlike `mesh_typeck::ty::Ty`, this representation carries no unification
//! variables and no `ena` machinery: Kira requires an explicit type
//! annotation everywhere a binding, parameter, or return type is introduced,
//! so a resolved type is always fully known at the point it is built.
//! `TypeVar` exists only to name a function's own generic parameters, not to
//! stand in for an unknown type awaiting inference.

use std::fmt;

use crate::symbol::SymbolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    I8,
    I16,
    I32,
    I64,
    I128,
    U8,
    U16,
    U32,
    U64,
    U128,
    F32,
    F64,
    Bool,
    Char,
    String,
}

impl PrimitiveType {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "i8" => PrimitiveType::I8,
            "i16" => PrimitiveType::I16,
            "i32" => PrimitiveType::I32,
            "i64" => PrimitiveType::I64,
            "i128" => PrimitiveType::I128,
            "u8" => PrimitiveType::U8,
            "u16" => PrimitiveType::U16,
            "u32" => PrimitiveType::U32,
            "u64" => PrimitiveType::U64,
            "u128" => PrimitiveType::U128,
            "f32" => PrimitiveType::F32,
            "f64" => PrimitiveType::F64,
            "bool" => PrimitiveType::Bool,
            "char" => PrimitiveType::Char,
            "string" => PrimitiveType::String,
            _ => return None,
        })
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            PrimitiveType::I8
                | PrimitiveType::I16
                | PrimitiveType::I32
                | PrimitiveType::I64
                | PrimitiveType::I128
                | PrimitiveType::U8
                | PrimitiveType::U16
                | PrimitiveType::U32
                | PrimitiveType::U64
                | PrimitiveType::U128
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, PrimitiveType::F32 | PrimitiveType::F64)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveType::I8 => "i8",
            PrimitiveType::I16 => "i16",
            PrimitiveType::I32 => "i32",
            PrimitiveType::I64 => "i64",
            PrimitiveType::I128 => "i128",
            PrimitiveType::U8 => "u8",
            PrimitiveType::U16 => "u16",
            PrimitiveType::U32 => "u32",
            PrimitiveType::U64 => "u64",
            PrimitiveType::U128 => "u128",
            PrimitiveType::F32 => "f32",
            PrimitiveType::F64 => "f64",
            PrimitiveType::Bool => "bool",
            PrimitiveType::Char => "char",
            PrimitiveType::String => "string",
        };
        write!(f, "{name}")
    }
}

/// A fully resolved type: every name has been looked up to a definition, and
/// no slot is left open for later inference.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedType {
    Primitive(PrimitiveType),
    /// A reference to a zero-arity type definition (a struct, a non-generic
    /// sum type, or a type parameter bound in the current scope is instead
    /// `TypeVar`).
    Named { symbol: SymbolId, name: String },
    /// A generic type definition applied to concrete arguments, e.g. `List[i64]`.
    Instantiated { symbol: SymbolId, name: String, args: Vec<ResolvedType> },
    Function { params: Vec<ResolvedType>, ret: Box<ResolvedType>, is_effect: bool },
    Tuple(Vec<ResolvedType>),
    Array { element: Box<ResolvedType>, size: Option<u64> },
    Io(Box<ResolvedType>),
    Result { ok: Box<ResolvedType>, err: Box<ResolvedType> },
    Option(Box<ResolvedType>),
    /// A function's own generic parameter, e.g. `T` in `fn id[T](x: T) -> T`.
    TypeVar { name: String, constraints: Vec<String> },
    /// `self` used as a type, inside a `trait`/`impl` body.
    SelfType,
    Void,
    /// Placeholder used after a resolution error so downstream checks can
    /// keep walking without cascading the same error.
    Error,
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedType::Primitive(p) => write!(f, "{p}"),
            ResolvedType::Named { name, .. } => write!(f, "{name}"),
            ResolvedType::Instantiated { name, args, .. } => {
                write!(f, "{name}[")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, "]")
            }
            ResolvedType::Function { params, ret, is_effect } => {
                if *is_effect {
                    write!(f, "effect ")?;
                }
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") -> {ret}")
            }
            ResolvedType::Tuple(elems) => {
                write!(f, "(")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, ")")
            }
            ResolvedType::Array { element, size } => match size {
                Some(n) => write!(f, "[{element}; {n}]"),
                None => write!(f, "[{element}]"),
            },
            ResolvedType::Io(inner) => write!(f, "io[{inner}]"),
            ResolvedType::Result { ok, err } => write!(f, "result[{ok}, {err}]"),
            ResolvedType::Option(inner) => write!(f, "option[{inner}]"),
            ResolvedType::TypeVar { name, .. } => write!(f, "{name}"),
            ResolvedType::SelfType => write!(f, "self"),
            ResolvedType::Void => write!(f, "void"),
            ResolvedType::Error => write!(f, "<error>"),
        }
    }
}

/// A mapping from a generic function's or type's own type-parameter names to
/// concrete types at a particular call/application site.
pub type Substitution = rustc_hash::FxHashMap<String, ResolvedType>;

/// Replaces every `TypeVar` in `ty` whose name is bound in `subst` with its
/// substituted type, recursing through compound shapes.
pub fn instantiate(ty: &ResolvedType, subst: &Substitution) -> ResolvedType {
    match ty {
        ResolvedType::TypeVar { name, .. } => subst.get(name).cloned().unwrap_or_else(|| ty.clone()),
        ResolvedType::Instantiated { symbol, name, args } => ResolvedType::Instantiated {
            symbol: *symbol,
            name: name.clone(),
            args: args.iter().map(|a| instantiate(a, subst)).collect(),
        },
        ResolvedType::Function { params, ret, is_effect } => ResolvedType::Function {
            params: params.iter().map(|p| instantiate(p, subst)).collect(),
            ret: Box::new(instantiate(ret, subst)),
            is_effect: *is_effect,
        },
        ResolvedType::Tuple(elems) => ResolvedType::Tuple(elems.iter().map(|e| instantiate(e, subst)).collect()),
        ResolvedType::Array { element, size } => {
            ResolvedType::Array { element: Box::new(instantiate(element, subst)), size: *size }
        }
        ResolvedType::Io(inner) => ResolvedType::Io(Box::new(instantiate(inner, subst))),
        ResolvedType::Result { ok, err } => {
            ResolvedType::Result { ok: Box::new(instantiate(ok, subst)), err: Box::new(instantiate(err, subst)) }
        }
        ResolvedType::Option(inner) => ResolvedType::Option(Box::new(instantiate(inner, subst))),
        ResolvedType::Primitive(_)
        | ResolvedType::Named { .. }
        | ResolvedType::SelfType
        | ResolvedType::Void
        | ResolvedType::Error => ty.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_from_name_and_display() {
        assert_eq!(PrimitiveType::from_name("i64"), Some(PrimitiveType::I64));
        assert_eq!(PrimitiveType::from_name("nonsense"), None);
        assert_eq!(ResolvedType::Primitive(PrimitiveType::F64).to_string(), "f64");
    }

    #[test]
    fn integer_and_float_classification() {
        assert!(PrimitiveType::I32.is_integer());
        assert!(!PrimitiveType::I32.is_float());
        assert!(PrimitiveType::F64.is_float());
        assert!(PrimitiveType::Bool.is_numeric() == false);
    }

    #[test]
    fn instantiate_substitutes_type_var_in_nested_shape() {
        let ty = ResolvedType::Option(Box::new(ResolvedType::TypeVar { name: "T".into(), constraints: vec![] }));
        let mut subst = Substitution::default();
        subst.insert("T".to_string(), ResolvedType::Primitive(PrimitiveType::I32));
        let result = instantiate(&ty, &subst);
        assert_eq!(result, ResolvedType::Option(Box::new(ResolvedType::Primitive(PrimitiveType::I32))));
    }

    #[test]
    fn instantiate_leaves_unbound_type_var_untouched() {
        let ty = ResolvedType::TypeVar { name: "U".into(), constraints: vec![] };
        let subst = Substitution::default();
        assert_eq!(instantiate(&ty, &subst), ty);
    }

    #[test]
    fn function_display_marks_effect() {
        let ty = ResolvedType::Function {
            params: vec![ResolvedType::Primitive(PrimitiveType::I32)],
            ret: Box::new(ResolvedType::Void),
            is_effect: true,
        };
        assert_eq!(ty.to_string(), "effect (i32) -> void");
    }
}
