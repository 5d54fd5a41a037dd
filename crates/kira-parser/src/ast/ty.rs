use kira_common::Span;

/// A syntactic type annotation, as written by the user. Resolved into a
/// `kira_resolve::ResolvedType` during name resolution.
#[derive(Debug, Clone)]
pub enum Type {
    /// A bare name: `i32`, `string`, `MyStruct`, or a type parameter.
    Named { name: String, span: Span },
    /// A generic application: `Base[T, ...]`.
    Generic { base: String, args: Vec<Type>, span: Span },
    /// `fn(P...) -> R`, with an optional `effect` annotation.
    Function { params: Vec<Type>, ret: Box<Type>, is_effect: bool, span: Span },
    /// `(T, U, ...)`.
    Tuple { elements: Vec<Type>, span: Span },
    /// `[T]` (dynamic) or `[T; N]` (fixed-size).
    Array { element: Box<Type>, size: Option<u64>, span: Span },
    /// `IO[T]`.
    Io { inner: Box<Type>, span: Span },
    /// `Result[T, E]`.
    Result { ok: Box<Type>, err: Box<Type>, span: Span },
    /// `Option[T]`.
    Option { inner: Box<Type>, span: Span },
    /// `Self`, inside a trait or impl body.
    SelfType { span: Span },
    /// A qualified path: `Module::Name`.
    Path { segments: Vec<String>, span: Span },
    /// A syntactic placeholder (`_`), always rejected by the checker since
    /// annotations are mandatory.
    Inferred { span: Span },
}

impl Type {
    pub fn span(&self) -> Span {
        match self {
            Type::Named { span, .. }
            | Type::Generic { span, .. }
            | Type::Function { span, .. }
            | Type::Tuple { span, .. }
            | Type::Array { span, .. }
            | Type::Io { span, .. }
            | Type::Result { span, .. }
            | Type::Option { span, .. }
            | Type::SelfType { span }
            | Type::Path { span, .. }
            | Type::Inferred { span } => *span,
        }
    }
}
