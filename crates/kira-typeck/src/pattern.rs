//! Pattern spaces and the usefulness-based exhaustiveness/unreachability
//! check (Maranget 2007, "Warnings for Pattern Matching"), completing the
//! `is_useful`/`check_exhaustiveness`/`check_redundancy` functions the
//! teacher's `snow-typeck/src/exhaustiveness.rs` left as `todo!()` stubs.
//!
//! The teacher's version specializes a `PatternMatrix` column by column.
//! This language closes the set of pattern shapes (no user-extensible
//! constructors beyond declared sum types), so coverage is instead defined
//! structurally over a **pattern space** tree: a space covers another iff
//! it entirely encloses it. That relation is cheaper to compute and easier
//! to reason about for a closed shape set, while still answering the same
//! two questions the teacher's algorithm answers: is a wildcard useful
//! after these arms (exhaustiveness), and is this arm useful given the
//! ones before it (redundancy).

/// An abstract description of the set of values a pattern matches.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternSpace {
    /// Matches every value (wildcard or identifier binding).
    Any,
    /// Matches no value; the neutral element for unions.
    Empty,
    BoolValue(bool),
    IntValue(i128),
    CharValue(char),
    StringValue(String),
    /// Stored as bits so the space can derive `PartialEq`.
    FloatValue(u64),
    Constructor { variant: String, arg_spaces: Vec<PatternSpace> },
    Record { field_spaces: Vec<(String, PatternSpace)> },
    Tuple(Vec<PatternSpace>),
    Union(Vec<PatternSpace>),
    Range { start: Option<i128>, end: Option<i128>, inclusive: bool },
}

impl PatternSpace {
    pub fn float(value: f64) -> Self {
        PatternSpace::FloatValue(value.to_bits())
    }
}

fn range_contains(start: Option<i128>, end: Option<i128>, inclusive: bool, value: i128) -> bool {
    let above_start = start.map_or(true, |s| value >= s);
    let below_end = match end {
        None => true,
        Some(e) => {
            if inclusive {
                value <= e
            } else {
                value < e
            }
        }
    };
    above_start && below_end
}

/// Does `outer` (as a half-open-or-closed interval, `None` meaning
/// unbounded) entirely contain `inner`?
fn range_contains_range(
    outer_start: Option<i128>,
    outer_end: Option<i128>,
    outer_inclusive: bool,
    inner_start: Option<i128>,
    inner_end: Option<i128>,
    inner_inclusive: bool,
) -> bool {
    let start_ok = match (outer_start, inner_start) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(o), Some(i)) => i >= o,
    };
    let end_ok = match (outer_end, inner_end) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(o), Some(i)) => {
            let o_exclusive_bound = if outer_inclusive { o + 1 } else { o };
            let i_exclusive_bound = if inner_inclusive { i + 1 } else { i };
            i_exclusive_bound <= o_exclusive_bound
        }
    };
    start_ok && end_ok
}

/// Does `a` entirely enclose `b` — every value `b` matches, `a` also matches?
pub fn covers(a: &PatternSpace, b: &PatternSpace) -> bool {
    if matches!(a, PatternSpace::Any) {
        return true;
    }
    if matches!(b, PatternSpace::Empty) {
        return true;
    }
    if let PatternSpace::Union(alts) = b {
        return alts.iter().all(|bi| covers(a, bi));
    }
    if let PatternSpace::Union(alts) = a {
        return alts.iter().any(|ai| covers(ai, b));
    }
    match (a, b) {
        (PatternSpace::BoolValue(x), PatternSpace::BoolValue(y)) => x == y,
        (PatternSpace::IntValue(x), PatternSpace::IntValue(y)) => x == y,
        (PatternSpace::CharValue(x), PatternSpace::CharValue(y)) => x == y,
        (PatternSpace::StringValue(x), PatternSpace::StringValue(y)) => x == y,
        (PatternSpace::FloatValue(x), PatternSpace::FloatValue(y)) => x == y,
        (
            PatternSpace::Constructor { variant: v1, arg_spaces: a1 },
            PatternSpace::Constructor { variant: v2, arg_spaces: a2 },
        ) => v1 == v2 && a1.len() == a2.len() && a1.iter().zip(a2).all(|(x, y)| covers(x, y)),
        (PatternSpace::Record { field_spaces: f1 }, PatternSpace::Record { field_spaces: f2 }) => f2.iter().all(|(name, space)| {
            match f1.iter().find(|(n, _)| n == name) {
                Some((_, s)) => covers(s, space),
                None => false,
            }
        }),
        (PatternSpace::Tuple(t1), PatternSpace::Tuple(t2)) => {
            t1.len() == t2.len() && t1.iter().zip(t2).all(|(x, y)| covers(x, y))
        }
        (
            PatternSpace::Range { start: s1, end: e1, inclusive: i1 },
            PatternSpace::Range { start: s2, end: e2, inclusive: i2 },
        ) => range_contains_range(*s1, *e1, *i1, *s2, *e2, *i2),
        (PatternSpace::Range { start, end, inclusive }, PatternSpace::IntValue(v)) => {
            range_contains(*start, *end, *inclusive, *v)
        }
        _ => false,
    }
}

/// Do `a` and `b` describe value sets with any value in common?
pub fn overlaps(a: &PatternSpace, b: &PatternSpace) -> bool {
    if matches!(a, PatternSpace::Any) || matches!(b, PatternSpace::Any) {
        return true;
    }
    if matches!(a, PatternSpace::Empty) || matches!(b, PatternSpace::Empty) {
        return false;
    }
    if let PatternSpace::Union(alts) = a {
        return alts.iter().any(|x| overlaps(x, b));
    }
    if let PatternSpace::Union(alts) = b {
        return alts.iter().any(|x| overlaps(a, x));
    }
    match (a, b) {
        (PatternSpace::BoolValue(x), PatternSpace::BoolValue(y)) => x == y,
        (PatternSpace::IntValue(x), PatternSpace::IntValue(y)) => x == y,
        (PatternSpace::CharValue(x), PatternSpace::CharValue(y)) => x == y,
        (PatternSpace::StringValue(x), PatternSpace::StringValue(y)) => x == y,
        (PatternSpace::FloatValue(x), PatternSpace::FloatValue(y)) => x == y,
        (
            PatternSpace::Constructor { variant: v1, arg_spaces: a1 },
            PatternSpace::Constructor { variant: v2, arg_spaces: a2 },
        ) => v1 == v2 && a1.iter().zip(a2).all(|(x, y)| overlaps(x, y)),
        (PatternSpace::Record { field_spaces: f1 }, PatternSpace::Record { field_spaces: f2 }) => f1.iter().all(|(n, s)| {
            match f2.iter().find(|(n2, _)| n2 == n) {
                Some((_, s2)) => overlaps(s, s2),
                None => true,
            }
        }),
        (PatternSpace::Tuple(t1), PatternSpace::Tuple(t2)) => {
            t1.len() == t2.len() && t1.iter().zip(t2).all(|(x, y)| overlaps(x, y))
        }
        (PatternSpace::Range { start: s1, end: e1, inclusive: i1 }, PatternSpace::Range { start: s2, end: e2, inclusive: i2 }) => {
            let upper1 = e1.map(|e| if *i1 { e } else { e - 1 });
            let upper2 = e2.map(|e| if *i2 { e } else { e - 1 });
            let lower_ok = match (s1, s2) {
                (None, _) | (_, None) => true,
                (Some(a), Some(b)) => a <= upper2.unwrap_or(i128::MAX) && *b <= upper1.unwrap_or(i128::MAX),
            };
            lower_ok
        }
        (PatternSpace::Range { start, end, inclusive }, PatternSpace::IntValue(v))
        | (PatternSpace::IntValue(v), PatternSpace::Range { start, end, inclusive }) => {
            range_contains(*start, *end, *inclusive, *v)
        }
        _ => false,
    }
}

/// Is `candidate` useful against the value sets already covered by
/// `existing` — does it match a value none of `existing` matches?
pub fn is_useful(existing: &[PatternSpace], candidate: &PatternSpace) -> bool {
    if existing.is_empty() {
        return true;
    }
    let union = PatternSpace::Union(existing.to_vec());
    !covers(&union, candidate)
}

/// Indices (into `arm_spaces`) of arms that are unreachable because every
/// value they match is already matched by some earlier arm.
pub fn check_redundancy(arm_spaces: &[PatternSpace]) -> Vec<usize> {
    let mut unreachable = Vec::new();
    for i in 1..arm_spaces.len() {
        if !is_useful(&arm_spaces[..i], &arm_spaces[i]) {
            unreachable.push(i);
        }
    }
    unreachable
}

/// Describes one uncovered case reported by [`check_exhaustiveness`].
#[derive(Debug, Clone, PartialEq)]
pub struct MissingPattern {
    pub description: String,
    pub variant_name: Option<String>,
}

/// The shape of the value being matched, used to decide what exhaustive
/// coverage means (§4.6's "Exhaustiveness by subject type").
#[derive(Debug, Clone)]
pub enum SubjectType {
    Bool,
    Sum { variants: Vec<String> },
    Product,
    Option,
    Result,
    Tuple,
    Other,
}

fn any_arm_is_wildcard(arm_spaces: &[PatternSpace]) -> bool {
    arm_spaces.iter().any(|s| covers(s, &PatternSpace::Any))
}

/// Flattens unions so a single arm `A | B` contributes both `A` and `B` as
/// separately-covered constructor names / tuple shapes.
fn flatten(spaces: &[PatternSpace]) -> Vec<&PatternSpace> {
    let mut out = Vec::new();
    for s in spaces {
        collect_flat(s, &mut out);
    }
    out
}

fn collect_flat<'a>(space: &'a PatternSpace, out: &mut Vec<&'a PatternSpace>) {
    match space {
        PatternSpace::Union(alts) => {
            for alt in alts {
                collect_flat(alt, out);
            }
        }
        other => out.push(other),
    }
}

pub fn check_exhaustiveness(arm_spaces: &[PatternSpace], subject: &SubjectType) -> Vec<MissingPattern> {
    if any_arm_is_wildcard(arm_spaces) {
        return Vec::new();
    }
    let flat = flatten(arm_spaces);
    match subject {
        SubjectType::Bool => {
            let mut missing = Vec::new();
            let has_true = flat.iter().any(|s| matches!(s, PatternSpace::BoolValue(true)));
            let has_false = flat.iter().any(|s| matches!(s, PatternSpace::BoolValue(false)));
            if !has_true {
                missing.push(MissingPattern { description: "true".into(), variant_name: None });
            }
            if !has_false {
                missing.push(MissingPattern { description: "false".into(), variant_name: None });
            }
            missing
        }
        SubjectType::Sum { variants } => variants
            .iter()
            .filter(|name| {
                !flat.iter().any(|s| matches!(s, PatternSpace::Constructor { variant, .. } if variant == *name))
            })
            .map(|name| MissingPattern { description: name.clone(), variant_name: Some(name.clone()) })
            .collect(),
        SubjectType::Option => {
            let covered = SubjectType::Sum { variants: vec!["Some".into(), "None".into()] };
            check_exhaustiveness(arm_spaces, &covered)
        }
        SubjectType::Result => {
            let covered = SubjectType::Sum { variants: vec!["Ok".into(), "Err".into()] };
            check_exhaustiveness(arm_spaces, &covered)
        }
        SubjectType::Product => {
            let has_record_or_wildcard = flat.iter().any(|s| matches!(s, PatternSpace::Record { .. } | PatternSpace::Any));
            if has_record_or_wildcard {
                Vec::new()
            } else {
                vec![MissingPattern { description: "_".into(), variant_name: None }]
            }
        }
        SubjectType::Tuple => {
            let has_all_wildcard_tuple = flat.iter().any(|s| match s {
                PatternSpace::Tuple(elems) => elems.iter().all(|e| matches!(e, PatternSpace::Any)),
                PatternSpace::Any => true,
                _ => false,
            });
            if has_all_wildcard_tuple {
                Vec::new()
            } else {
                vec![MissingPattern { description: "`_` or `(_, ...)`".into(), variant_name: None }]
            }
        }
        SubjectType::Other => {
            vec![MissingPattern { description: "_".into(), variant_name: None }]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wildcard() -> PatternSpace {
        PatternSpace::Any
    }

    fn ctor(name: &str, args: Vec<PatternSpace>) -> PatternSpace {
        PatternSpace::Constructor { variant: name.to_string(), arg_spaces: args }
    }

    fn lit_int(v: i128) -> PatternSpace {
        PatternSpace::IntValue(v)
    }

    fn lit_bool(v: bool) -> PatternSpace {
        PatternSpace::BoolValue(v)
    }

    fn or_pat(alts: Vec<PatternSpace>) -> PatternSpace {
        PatternSpace::Union(alts)
    }

    fn shape_type() -> SubjectType {
        SubjectType::Sum { variants: vec!["Circle".into(), "Point".into()] }
    }

    #[test]
    fn bool_exhaustive_with_both_values() {
        let result = check_exhaustiveness(&[lit_bool(true), lit_bool(false)], &SubjectType::Bool);
        assert!(result.is_empty());
    }

    #[test]
    fn bool_non_exhaustive_missing_false() {
        let result = check_exhaustiveness(&[lit_bool(true)], &SubjectType::Bool);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].description, "false");
    }

    #[test]
    fn bool_wildcard_is_exhaustive() {
        assert!(check_exhaustiveness(&[wildcard()], &SubjectType::Bool).is_empty());
    }

    #[test]
    fn sum_type_exhaustive_with_all_variants() {
        let result = check_exhaustiveness(&[ctor("Circle", vec![wildcard()]), ctor("Point", vec![])], &shape_type());
        assert!(result.is_empty());
    }

    #[test]
    fn sum_type_non_exhaustive_reports_missing_variant() {
        let result = check_exhaustiveness(&[ctor("Circle", vec![wildcard()])], &shape_type());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].variant_name.as_deref(), Some("Point"));
    }

    #[test]
    fn or_pattern_covers_both_variants() {
        let result = check_exhaustiveness(
            &[or_pat(vec![ctor("Circle", vec![wildcard()]), ctor("Point", vec![])])],
            &shape_type(),
        );
        assert!(result.is_empty());
    }

    #[test]
    fn redundant_arm_after_wildcard() {
        let result = check_redundancy(&[wildcard(), ctor("Circle", vec![wildcard()])]);
        assert_eq!(result, vec![1]);
    }

    #[test]
    fn duplicate_arm_is_redundant() {
        let result = check_redundancy(&[ctor("Circle", vec![wildcard()]), ctor("Circle", vec![wildcard()]), ctor("Point", vec![])]);
        assert_eq!(result, vec![1]);
    }

    #[test]
    fn no_redundancy_when_arms_are_disjoint() {
        let result = check_redundancy(&[ctor("Circle", vec![wildcard()]), ctor("Point", vec![])]);
        assert!(result.is_empty());
    }

    #[test]
    fn is_useful_distinguishes_new_literal() {
        assert!(is_useful(&[lit_int(1)], &lit_int(2)));
        assert!(!is_useful(&[lit_int(1)], &lit_int(1)));
    }

    #[test]
    fn nested_constructor_exhaustiveness() {
        let option_shape = SubjectType::Sum { variants: vec!["Some".into(), "None".into()] };
        let result = check_exhaustiveness(
            &[
                ctor("Some", vec![ctor("Circle", vec![wildcard()])]),
                ctor("Some", vec![ctor("Point", vec![])]),
                ctor("None", vec![]),
            ],
            &option_shape,
        );
        assert!(result.is_empty());
    }

    #[test]
    fn range_pattern_covers_contained_int_literal() {
        let range = PatternSpace::Range { start: Some(0), end: Some(10), inclusive: false };
        assert!(covers(&range, &PatternSpace::IntValue(5)));
        assert!(!covers(&range, &PatternSpace::IntValue(10)));
    }

    #[test]
    fn tuple_requires_all_wildcard_to_be_exhaustive() {
        let all_wild = PatternSpace::Tuple(vec![PatternSpace::Any, PatternSpace::Any]);
        assert!(check_exhaustiveness(&[all_wild], &SubjectType::Tuple).is_empty());
        let partial = PatternSpace::Tuple(vec![PatternSpace::IntValue(0), PatternSpace::Any]);
        assert!(!check_exhaustiveness(&[partial], &SubjectType::Tuple).is_empty());
    }
}
