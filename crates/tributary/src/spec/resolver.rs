//! Type resolution traits.
//!
//! A [`TypeResolver`] widens the types one column has across sources into a
//! single type. The widening policy belongs to the implementation; the
//! reconciliation code only feeds tokens in source order and asks for the
//! result once.

/// Single-use reducer over the type tokens of one column.
pub trait TypeResolver<T> {
    /// Feed the type of one typed occurrence of the column.
    fn accept(&mut self, ty: &T);

    /// The common type of everything accepted.
    ///
    /// Returns `None` if the resolver cannot produce a type, typically
    /// because nothing was accepted.
    fn resolve(self) -> Option<T>;
}

/// Creates a fresh [`TypeResolver`] per column.
pub trait TypeHierarchy<T> {
    type Resolver: TypeResolver<T>;

    fn create_resolver(&self) -> Self::Resolver;
}

impl<T, R, F> TypeHierarchy<T> for F
where
    F: Fn() -> R,
    R: TypeResolver<T>,
{
    type Resolver = R;

    fn create_resolver(&self) -> R {
        self()
    }
}
