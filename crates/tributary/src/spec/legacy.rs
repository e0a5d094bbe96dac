//! Spec merge modes of older configurations.
//!
//! Before column filter modes existed, a configuration picked one of these
//! modes and the merged spec was used as the output spec directly. They
//! remain for configurations that still carry one.

use serde::{Deserialize, Serialize};

use crate::error::SpecError;
use crate::transform::ColumnFilterMode;

use super::raw::{collect_occurrences, resolve_column};
use super::{TypeHierarchy, TypeToken, TypedTableSpec};

/// How the specs of a source group are combined into one spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecMergeMode {
    /// Every column of every spec.
    Union,
    /// Only the columns present in every spec.
    Intersection,
    /// All specs must list the same column names in the same order.
    FailOnDifferingSpecs,
}

impl SpecMergeMode {
    /// Merge `specs` into a single spec.
    ///
    /// # Errors
    ///
    /// - [`SpecError::NoSpecs`] if `specs` is empty
    /// - [`SpecError::EmptyIntersection`] if intersecting leaves no column
    /// - [`SpecError::DifferingSpecs`] if identical specs are required but differ
    /// - [`SpecError::UntypedColumn`] if a column cannot be typed
    pub fn merge_specs<T, H>(
        self,
        specs: &[TypedTableSpec<T>],
        hierarchy: &H,
    ) -> Result<TypedTableSpec<T>, SpecError>
    where
        T: TypeToken,
        H: TypeHierarchy<T>,
    {
        if specs.is_empty() {
            return Err(SpecError::NoSpecs);
        }

        if self == SpecMergeMode::FailOnDifferingSpecs {
            ensure_identical_names(specs)?;
        }

        let occurrences = collect_occurrences(specs);
        let columns = occurrences
            .iter()
            .filter(|(_, columns)| self != SpecMergeMode::Intersection || columns.len() == specs.len())
            .map(|(name, columns)| resolve_column(hierarchy, name, columns))
            .collect::<Result<Vec<_>, _>>()?;

        if self == SpecMergeMode::Intersection && columns.is_empty() {
            return Err(SpecError::EmptyIntersection);
        }

        Ok(TypedTableSpec::new(columns))
    }

    /// The column filter mode a configuration with this merge mode maps to.
    ///
    /// Identical specs make union and intersection coincide, so
    /// `FailOnDifferingSpecs` maps to `Union`.
    pub fn column_filter_mode(self) -> ColumnFilterMode {
        match self {
            SpecMergeMode::Intersection => ColumnFilterMode::Intersection,
            SpecMergeMode::Union | SpecMergeMode::FailOnDifferingSpecs => ColumnFilterMode::Union,
        }
    }
}

fn ensure_identical_names<T>(specs: &[TypedTableSpec<T>]) -> Result<(), SpecError> {
    let expected: Vec<&str> = specs[0].column_names().collect();
    for (index, spec) in specs.iter().enumerate().skip(1) {
        if !spec.column_names().eq(expected.iter().copied()) {
            return Err(SpecError::DifferingSpecs {
                index,
                expected: expected.iter().map(|n| n.to_string()).collect(),
                found: spec.column_names().map(str::to_string).collect(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::TypedColumnSpec;
    use crate::spec::resolver::testing::ranks;

    fn spec(columns: &[(&str, &'static str)]) -> TypedTableSpec<&'static str> {
        columns
            .iter()
            .map(|(name, ty)| TypedColumnSpec::typed(*name, *ty))
            .collect()
    }

    fn names<'a>(spec: &'a TypedTableSpec<&'static str>) -> Vec<&'a str> {
        spec.column_names().collect()
    }

    #[test]
    fn test_intersection() {
        let specs = [
            spec(&[("A", "int"), ("B", "double")]),
            spec(&[("B", "double"), ("C", "string")]),
        ];

        let merged = SpecMergeMode::Intersection
            .merge_specs(&specs, &ranks())
            .unwrap();

        assert_eq!(names(&merged), vec!["B"]);
    }

    #[test]
    fn test_union() {
        let specs = [
            spec(&[("A", "int"), ("B", "int")]),
            spec(&[("B", "double"), ("C", "string")]),
        ];

        let merged = SpecMergeMode::Union.merge_specs(&specs, &ranks()).unwrap();

        assert_eq!(names(&merged), vec!["A", "B", "C"]);
        assert_eq!(merged.get("B").unwrap().ty(), &"double");
    }

    #[test]
    fn test_empty_intersection_fails() {
        let specs = [spec(&[("A", "int")]), spec(&[("B", "int")])];

        let result = SpecMergeMode::Intersection.merge_specs(&specs, &ranks());

        assert!(matches!(result, Err(SpecError::EmptyIntersection)));
    }

    #[test]
    fn test_fail_on_differing_specs_accepts_identical_names() {
        let specs = [
            spec(&[("A", "int"), ("B", "string")]),
            spec(&[("A", "double"), ("B", "string")]),
        ];

        let merged = SpecMergeMode::FailOnDifferingSpecs
            .merge_specs(&specs, &ranks())
            .unwrap();

        assert_eq!(names(&merged), vec!["A", "B"]);
        assert_eq!(merged.get("A").unwrap().ty(), &"double");
    }

    #[test]
    fn test_fail_on_differing_specs_rejects_reordering() {
        let specs = [
            spec(&[("A", "int"), ("B", "string")]),
            spec(&[("B", "string"), ("A", "int")]),
        ];

        let result = SpecMergeMode::FailOnDifferingSpecs.merge_specs(&specs, &ranks());

        match result {
            Err(SpecError::DifferingSpecs { index, found, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(found, vec!["B", "A"]);
            }
            other => panic!("Expected DifferingSpecs error, got: {other:?}"),
        }
    }

    #[test]
    fn test_every_mode_rejects_empty_input() {
        for mode in [
            SpecMergeMode::Union,
            SpecMergeMode::Intersection,
            SpecMergeMode::FailOnDifferingSpecs,
        ] {
            let result = mode.merge_specs::<&'static str, _>(&[], &ranks());
            assert!(matches!(result, Err(SpecError::NoSpecs)), "{mode:?}");
        }
    }

    #[test]
    fn test_filter_mode_mapping() {
        assert_eq!(
            SpecMergeMode::Intersection.column_filter_mode(),
            ColumnFilterMode::Intersection
        );
        assert_eq!(SpecMergeMode::Union.column_filter_mode(), ColumnFilterMode::Union);
        assert_eq!(
            SpecMergeMode::FailOnDifferingSpecs.column_filter_mode(),
            ColumnFilterMode::Union
        );
    }
}
