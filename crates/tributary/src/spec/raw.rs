//! Union and intersection of per-source specs.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::SpecError;

use super::{RawSpec, TypeHierarchy, TypeResolver, TypeToken, TypedColumnSpec, TypedTableSpec};

/// Builds a [`RawSpec`] from the specs of all sources in a group.
#[derive(Debug, Clone)]
pub struct RawSpecFactory<H> {
    hierarchy: H,
}

impl<H> RawSpecFactory<H> {
    pub fn new(hierarchy: H) -> Self {
        Self { hierarchy }
    }

    pub fn hierarchy(&self) -> &H {
        &self.hierarchy
    }

    /// Compute the union and intersection of `specs`.
    ///
    /// The union holds every distinct column name, the intersection only the
    /// names present in every spec. Both are ordered by first appearance and
    /// typed by feeding every typed occurrence, in source order, to a fresh
    /// resolver.
    ///
    /// # Errors
    ///
    /// - [`SpecError::NoSpecs`] if `specs` is empty
    /// - [`SpecError::UntypedColumn`] if the resolver yields no type for a column
    pub fn create<T>(&self, specs: &[TypedTableSpec<T>]) -> Result<RawSpec<T>, SpecError>
    where
        T: TypeToken,
        H: TypeHierarchy<T>,
    {
        if specs.is_empty() {
            return Err(SpecError::NoSpecs);
        }

        let occurrences = collect_occurrences(specs);

        let mut union = Vec::with_capacity(occurrences.len());
        let mut intersection = Vec::new();
        for (name, columns) in &occurrences {
            let column = resolve_column(&self.hierarchy, name, columns)?;
            // Present in every spec: the intersection restricts resolution to
            // exactly the specs the union already used.
            if columns.len() == specs.len() {
                intersection.push(column.clone());
            }
            union.push(column);
        }

        debug!(
            sources = specs.len(),
            union = union.len(),
            intersection = intersection.len(),
            "Computed raw spec"
        );

        Ok(RawSpec::new(
            TypedTableSpec::new(union),
            TypedTableSpec::new(intersection),
        ))
    }
}

/// Group the columns of all specs by name, in first-seen order.
///
/// Each spec contributes at most one occurrence per name (its first column
/// with that name), so the occurrence count equals the number of specs that
/// contain the name.
pub(crate) fn collect_occurrences<T>(
    specs: &[TypedTableSpec<T>],
) -> IndexMap<&str, Vec<&TypedColumnSpec<T>>> {
    let mut occurrences: IndexMap<&str, Vec<&TypedColumnSpec<T>>> = IndexMap::new();
    for spec in specs {
        for (idx, column) in spec.iter().enumerate() {
            if spec.index_of(column.name()) != Some(idx) {
                continue;
            }
            occurrences.entry(column.name()).or_default().push(column);
        }
    }
    occurrences
}

/// Resolve the common type of one column from its occurrences.
pub(crate) fn resolve_column<T, H>(
    hierarchy: &H,
    name: &str,
    occurrences: &[&TypedColumnSpec<T>],
) -> Result<TypedColumnSpec<T>, SpecError>
where
    T: TypeToken,
    H: TypeHierarchy<T>,
{
    let mut resolver = hierarchy.create_resolver();
    let mut has_type = false;
    for column in occurrences.iter().filter(|c| c.has_type()) {
        resolver.accept(column.ty());
        has_type = true;
    }

    match resolver.resolve() {
        Some(ty) => Ok(TypedColumnSpec::new(name, ty, has_type)),
        None => Err(SpecError::UntypedColumn {
            column: name.to_string(),
        }),
    }
}
