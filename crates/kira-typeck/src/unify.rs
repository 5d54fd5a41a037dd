//! Structural predicates over [`ResolvedType`]: equality, assignability,
//! cast validity, and the comparable/equatable/iterable capability
//! contracts the checker consults for operators and `for` loops.
//!
//! These are a non-unifying simplification of `mesh-typeck`'s
//! `InferCtx::resolve`-driven equality: every type here is already fully
//! resolved, so there is no substitution to drive to a fixed point, only a
//! structural walk.

use kira_resolve::ResolvedType;

/// Structural equality, with the rule that the error type unifies with
/// anything — this is what lets a single root-cause diagnostic avoid
/// cascading into a pile of unrelated "type mismatch" noise.
pub fn types_equal(a: &ResolvedType, b: &ResolvedType) -> bool {
    if matches!(a, ResolvedType::Error) || matches!(b, ResolvedType::Error) {
        return true;
    }
    match (a, b) {
        (ResolvedType::Primitive(x), ResolvedType::Primitive(y)) => x == y,
        (ResolvedType::Named { symbol: s1, .. }, ResolvedType::Named { symbol: s2, .. }) => s1 == s2,
        (
            ResolvedType::Instantiated { symbol: s1, args: a1, .. },
            ResolvedType::Instantiated { symbol: s2, args: a2, .. },
        ) => s1 == s2 && a1.len() == a2.len() && a1.iter().zip(a2).all(|(x, y)| types_equal(x, y)),
        (
            ResolvedType::Function { params: p1, ret: r1, is_effect: e1 },
            ResolvedType::Function { params: p2, ret: r2, is_effect: e2 },
        ) => e1 == e2 && p1.len() == p2.len() && p1.iter().zip(p2).all(|(x, y)| types_equal(x, y)) && types_equal(r1, r2),
        (ResolvedType::Tuple(x), ResolvedType::Tuple(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| types_equal(a, b))
        }
        (ResolvedType::Array { element: e1, size: s1 }, ResolvedType::Array { element: e2, size: s2 }) => {
            s1 == s2 && types_equal(e1, e2)
        }
        (ResolvedType::Io(x), ResolvedType::Io(y)) => types_equal(x, y),
        (ResolvedType::Result { ok: o1, err: e1 }, ResolvedType::Result { ok: o2, err: e2 }) => {
            types_equal(o1, o2) && types_equal(e1, e2)
        }
        (ResolvedType::Option(x), ResolvedType::Option(y)) => types_equal(x, y),
        (ResolvedType::TypeVar { name: n1, .. }, ResolvedType::TypeVar { name: n2, .. }) => n1 == n2,
        (ResolvedType::SelfType, ResolvedType::SelfType) => true,
        (ResolvedType::Void, ResolvedType::Void) => true,
        _ => false,
    }
}

/// `source` may be assigned where `target` is expected: equal types, or an
/// integer of any width assigned to another integer width, or a fixed-size
/// array assigned to its dynamic counterpart.
pub fn is_assignable(target: &ResolvedType, source: &ResolvedType) -> bool {
    if types_equal(target, source) {
        return true;
    }
    match (target, source) {
        (ResolvedType::Primitive(t), ResolvedType::Primitive(s)) => t.is_integer() && s.is_integer(),
        (ResolvedType::Array { element: te, size: None }, ResolvedType::Array { element: se, size: Some(_) }) => {
            types_equal(te, se)
        }
        _ => false,
    }
}

/// `source as target` is well-formed: identity, numeric-to-numeric, or a
/// char/integer conversion. No other casts exist in this language.
pub fn is_valid_cast(source: &ResolvedType, target: &ResolvedType) -> bool {
    if types_equal(source, target) {
        return true;
    }
    use kira_resolve::PrimitiveType as P;
    match (source, target) {
        (ResolvedType::Primitive(s), ResolvedType::Primitive(t)) => {
            (s.is_numeric() && t.is_numeric())
                || (*s == P::Char && t.is_integer())
                || (s.is_integer() && *t == P::Char)
        }
        _ => false,
    }
}

/// numeric, char, and string values order with `<`/`>`/`<=`/`>=`.
pub fn is_comparable(ty: &ResolvedType) -> bool {
    if matches!(ty, ResolvedType::Error) {
        return true;
    }
    match ty {
        ResolvedType::Primitive(p) => p.is_numeric() || matches!(p, kira_resolve::PrimitiveType::Char | kira_resolve::PrimitiveType::String),
        _ => false,
    }
}

/// Primitives always; compound types of equatable elements; named types
/// are assumed equatable (optimistic — the checker has no per-type
/// `PartialEq` derive registry to consult).
pub fn is_equatable(ty: &ResolvedType) -> bool {
    match ty {
        ResolvedType::Error => true,
        ResolvedType::Primitive(_) => true,
        ResolvedType::Tuple(elems) => elems.iter().all(is_equatable),
        ResolvedType::Array { element, .. } => is_equatable(element),
        ResolvedType::Option(inner) => is_equatable(inner),
        ResolvedType::Result { ok, err } => is_equatable(ok) && is_equatable(err),
        ResolvedType::Named { .. } | ResolvedType::Instantiated { .. } => true,
        _ => false,
    }
}

/// arrays, strings (element type `char`), and instantiated collections
/// (element type is the collection's first type argument); named types
/// are assumed iterable (optimistic, same rationale as `is_equatable`).
pub fn is_iterable(ty: &ResolvedType) -> bool {
    matches!(
        ty,
        ResolvedType::Error
            | ResolvedType::Array { .. }
            | ResolvedType::Primitive(kira_resolve::PrimitiveType::String)
            | ResolvedType::Instantiated { .. }
            | ResolvedType::Named { .. }
    )
}

/// The element type a `for` loop binds to when iterating `ty`, or `None`
/// if `ty` is not iterable.
pub fn get_iterable_element(ty: &ResolvedType) -> Option<ResolvedType> {
    match ty {
        ResolvedType::Error => Some(ResolvedType::Error),
        ResolvedType::Array { element, .. } => Some((**element).clone()),
        ResolvedType::Primitive(kira_resolve::PrimitiveType::String) => {
            Some(ResolvedType::Primitive(kira_resolve::PrimitiveType::Char))
        }
        ResolvedType::Instantiated { args, .. } => args.first().cloned(),
        ResolvedType::Named { .. } => Some(ResolvedType::Error),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kira_resolve::PrimitiveType;

    fn i32_() -> ResolvedType {
        ResolvedType::Primitive(PrimitiveType::I32)
    }
    fn i64_() -> ResolvedType {
        ResolvedType::Primitive(PrimitiveType::I64)
    }
    fn f64_() -> ResolvedType {
        ResolvedType::Primitive(PrimitiveType::F64)
    }

    #[test]
    fn error_type_equals_anything() {
        assert!(types_equal(&ResolvedType::Error, &i32_()));
        assert!(types_equal(&f64_(), &ResolvedType::Error));
    }

    #[test]
    fn integers_of_different_width_are_assignable_but_not_equal() {
        assert!(!types_equal(&i32_(), &i64_()));
        assert!(is_assignable(&i32_(), &i64_()));
    }

    #[test]
    fn float_to_int_is_not_assignable() {
        assert!(!is_assignable(&i32_(), &f64_()));
    }

    #[test]
    fn fixed_array_assignable_to_dynamic_array() {
        let fixed = ResolvedType::Array { element: Box::new(i32_()), size: Some(4) };
        let dynamic = ResolvedType::Array { element: Box::new(i32_()), size: None };
        assert!(is_assignable(&dynamic, &fixed));
        assert!(!is_assignable(&fixed, &dynamic));
    }

    #[test]
    fn numeric_casts_are_valid() {
        assert!(is_valid_cast(&i32_(), &f64_()));
        assert!(is_valid_cast(&f64_(), &i32_()));
    }

    #[test]
    fn char_int_cast_is_valid_but_string_int_is_not() {
        let char_ty = ResolvedType::Primitive(PrimitiveType::Char);
        assert!(is_valid_cast(&char_ty, &i32_()));
        let string_ty = ResolvedType::Primitive(PrimitiveType::String);
        assert!(!is_valid_cast(&string_ty, &i32_()));
    }

    #[test]
    fn string_is_comparable_and_iterable_with_char_element() {
        let string_ty = ResolvedType::Primitive(PrimitiveType::String);
        assert!(is_comparable(&string_ty));
        assert!(is_iterable(&string_ty));
        assert_eq!(get_iterable_element(&string_ty), Some(ResolvedType::Primitive(PrimitiveType::Char)));
    }

    #[test]
    fn tuple_of_equatables_is_equatable() {
        let tuple = ResolvedType::Tuple(vec![i32_(), f64_()]);
        assert!(is_equatable(&tuple));
    }

    #[test]
    fn instantiated_collection_element_is_first_type_argument() {
        use kira_resolve::SymbolId;
        let list = ResolvedType::Instantiated { symbol: SymbolId(0), name: "List".into(), args: vec![i32_()] };
        assert!(is_iterable(&list));
        assert_eq!(get_iterable_element(&list), Some(i32_()));
    }
}
