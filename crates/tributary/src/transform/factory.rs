//! Building default transformations and reconciling stored ones.

use tracing::{debug, info, warn};

use crate::config::ReadConfig;
use crate::error::TransformationError;
use crate::spec::{RawSpec, TypeToken, TypedColumnSpec};

use super::{
    ColumnTransformation, ProductionPath, ProductionPathProvider, TableTransformation,
    UnknownColumnsTransformation,
};

/// Creates [`TableTransformation`]s using the conversions of a provider.
#[derive(Debug, Clone)]
pub struct TableTransformationFactory<P> {
    provider: P,
}

impl<P> TableTransformationFactory<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Build the transformation used when the caller has none.
    ///
    /// Every union column keeps its name and default conversion and is
    /// placed at its union index. Columns outside the configured filter mode
    /// get a transformation too and are left out by inclusion.
    pub fn create_new<T>(&self, raw_spec: RawSpec<T>, config: &ReadConfig) -> TableTransformation<T>
    where
        T: TypeToken,
        P: ProductionPathProvider<T>,
    {
        let columns: Vec<_> = raw_spec
            .union()
            .iter()
            .enumerate()
            .map(|(position, column)| ColumnTransformation {
                column: column.name().to_string(),
                output_name: column.name().to_string(),
                path: self.provider.default_path(column.ty()),
                position,
                keep: true,
            })
            .collect();

        let unknown_columns = UnknownColumnsTransformation {
            position: columns.len(),
            keep: config.keep_unknown_columns,
        };

        TableTransformation {
            raw_spec,
            column_filter_mode: config.effective_filter_mode(),
            enforce_types: config.enforce_types,
            skip_empty_columns: config.skip_empty_columns,
            columns,
            unknown_columns,
        }
    }

    /// Reconcile `existing` against a newly computed raw spec.
    ///
    /// Columns the existing transformation knew keep their output name,
    /// relative order and `keep` flag. Columns it did not know are inserted,
    /// in raw-spec order, at its unknown-columns slot and take its `keep`
    /// default. Positions are renumbered to `0..N`.
    ///
    /// A column is known if the existing transformation's own filter mode
    /// selected it in the old raw spec, and, when the existing
    /// transformation skipped empty columns, it was and still is typed.
    /// Whether a known column is read is decided later by the new filter
    /// mode.
    ///
    /// # Errors
    ///
    /// - [`TransformationError::NoCompatiblePath`] if `enforce_types` is set
    ///   and a known column changed to a type with no conversion to its
    ///   previous destination type
    pub fn create_from_existing<T>(
        &self,
        raw_spec: RawSpec<T>,
        config: &ReadConfig,
        existing: &TableTransformation<T>,
    ) -> Result<TableTransformation<T>, TransformationError>
    where
        T: TypeToken,
        P: ProductionPathProvider<T>,
    {
        self.reconcile(raw_spec, config, existing)
            .map(|reconciled| reconciled.transformation)
    }

    pub(crate) fn reconcile<T>(
        &self,
        raw_spec: RawSpec<T>,
        config: &ReadConfig,
        existing: &TableTransformation<T>,
    ) -> Result<Reconciled<T>, TransformationError>
    where
        T: TypeToken,
        P: ProductionPathProvider<T>,
    {
        let mut known = Vec::new();
        let mut new = Vec::new();
        for (raw_index, column) in raw_spec.union().iter().enumerate() {
            match known_transformation(existing, column) {
                Some(previous) => known.push((raw_index, column, previous)),
                None => new.push(column),
            }
        }

        for vanished in existing
            .columns()
            .iter()
            .filter(|c| !raw_spec.union().contains(&c.column))
        {
            warn!(column = %vanished.column, "Column of the stored transformation is missing from all sources");
        }

        // Stored relative order first, raw-spec order on ties.
        known.sort_by_key(|(raw_index, _, previous)| (previous.position, *raw_index));
        let slot = known
            .iter()
            .filter(|(_, _, previous)| previous.position < existing.unknown_columns.position)
            .count();

        let mut columns = Vec::with_capacity(known.len() + new.len());
        for (_, column, previous) in &known[..slot] {
            columns.push(self.reconcile_known(column, previous, config.enforce_types)?);
        }
        for column in &new {
            columns.push(ColumnTransformation {
                column: column.name().to_string(),
                output_name: column.name().to_string(),
                path: self.provider.default_path(column.ty()),
                position: 0,
                keep: existing.unknown_columns.keep,
            });
        }
        for (_, column, previous) in &known[slot..] {
            columns.push(self.reconcile_known(column, previous, config.enforce_types)?);
        }
        for (position, column) in columns.iter_mut().enumerate() {
            column.position = position;
        }

        let unknown_columns = UnknownColumnsTransformation {
            position: slot + new.len(),
            keep: existing.unknown_columns.keep,
        };

        // Raw-spec order, the same order `create_new` uses.
        let union = raw_spec.union();
        columns.sort_by_key(|c| union.index_of(&c.column));

        let new_columns: Vec<String> = new.iter().map(|c| c.name().to_string()).collect();
        if new_columns.is_empty() {
            debug!(known = known.len(), "Reconciled transformation without new columns");
        } else {
            info!(
                known = known.len(),
                new = new_columns.len(),
                slot,
                "Reconciled transformation with new columns"
            );
        }

        let transformation = TableTransformation {
            raw_spec,
            column_filter_mode: config.effective_filter_mode(),
            enforce_types: config.enforce_types,
            skip_empty_columns: config.skip_empty_columns,
            columns,
            unknown_columns,
        };

        Ok(Reconciled {
            transformation,
            new_columns,
        })
    }

    fn reconcile_known<T>(
        &self,
        column: &TypedColumnSpec<T>,
        previous: &ColumnTransformation<T>,
        enforce_types: bool,
    ) -> Result<ColumnTransformation<T>, TransformationError>
    where
        T: TypeToken,
        P: ProductionPathProvider<T>,
    {
        let path = if column.ty() == &previous.path.source {
            previous.path.clone()
        } else if enforce_types {
            self.compatible_path(column, &previous.path)?
        } else {
            self.provider.default_path(column.ty())
        };

        Ok(ColumnTransformation {
            column: previous.column.clone(),
            output_name: previous.output_name.clone(),
            path,
            position: previous.position,
            keep: previous.keep,
        })
    }

    fn compatible_path<T>(
        &self,
        column: &TypedColumnSpec<T>,
        previous: &ProductionPath<T>,
    ) -> Result<ProductionPath<T>, TransformationError>
    where
        T: TypeToken,
        P: ProductionPathProvider<T>,
    {
        self.provider
            .paths_to(column.ty(), &previous.destination)
            .into_iter()
            .next()
            .ok_or_else(|| TransformationError::NoCompatiblePath {
                column: column.name().to_string(),
                found_type: format!("{:?}", column.ty()),
                destination: format!("{:?}", previous.destination),
            })
    }
}

/// A reconciled transformation and the columns it newly inserted.
#[derive(Debug)]
pub(crate) struct Reconciled<T> {
    pub(crate) transformation: TableTransformation<T>,
    pub(crate) new_columns: Vec<String>,
}

fn known_transformation<'a, T: TypeToken>(
    existing: &'a TableTransformation<T>,
    column: &TypedColumnSpec<T>,
) -> Option<&'a ColumnTransformation<T>> {
    let mode = existing.column_filter_mode();
    let old = mode.relevant_spec(existing.raw_spec()).get(column.name())?;
    if existing.skip_empty_columns() && !(old.has_type() && column.has_type()) {
        return None;
    }
    existing.get(column.name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::resolver::testing::ranks;
    use crate::spec::{RawSpecFactory, TypedTableSpec};
    use crate::transform::ColumnFilterMode;
    use crate::transform::path::testing::RankPaths;

    type Spec = TypedTableSpec<&'static str>;

    fn spec(columns: &[(&str, &'static str)]) -> Spec {
        columns
            .iter()
            .map(|(name, ty)| TypedColumnSpec::typed(*name, *ty))
            .collect()
    }

    fn raw(specs: &[Spec]) -> RawSpec<&'static str> {
        RawSpecFactory::new(ranks()).create(specs).unwrap()
    }

    fn factory() -> TableTransformationFactory<RankPaths> {
        TableTransformationFactory::new(RankPaths)
    }

    fn config(mode: ColumnFilterMode) -> ReadConfig {
        ReadConfig {
            column_filter_mode: mode,
            ..ReadConfig::default()
        }
    }

    fn output_names(transformation: &TableTransformation<&'static str>) -> Vec<String> {
        transformation.output_spec().names().map(str::to_string).collect()
    }

    #[test]
    fn test_create_new_uses_union_order() {
        let raw = raw(&[spec(&[("a", "int"), ("b", "int")]), spec(&[("b", "int"), ("c", "string")])]);

        let transformation = factory().create_new(raw, &config(ColumnFilterMode::Union));

        transformation.validate().unwrap();
        assert_eq!(output_names(&transformation), vec!["a", "b", "c"]);
        assert_eq!(transformation.unknown_columns().position, 3);
        assert!(transformation.unknown_columns().keep);
        assert_eq!(transformation.get("c").unwrap().path.converter, "identity");
    }

    #[test]
    fn test_create_new_in_intersection_mode() {
        let raw = raw(&[spec(&[("a", "int"), ("b", "int")]), spec(&[("b", "int"), ("c", "string")])]);

        let transformation = factory().create_new(raw, &config(ColumnFilterMode::Intersection));

        assert_eq!(output_names(&transformation), vec!["b"]);
        assert_eq!(transformation.columns().len(), 3);
    }

    #[test]
    fn test_unchanged_known_columns_keep_name_and_position() {
        for mode in [ColumnFilterMode::Union, ColumnFilterMode::Intersection] {
            let specs = [spec(&[("a", "int"), ("b", "string")]), spec(&[("a", "int"), ("b", "string")])];
            let mut existing = factory().create_new(raw(&specs), &config(mode));
            existing.rename("a", "alpha").unwrap();
            existing.rename("b", "beta").unwrap();

            let reconciled = factory()
                .create_from_existing(raw(&specs), &config(mode), &existing)
                .unwrap();

            for name in ["a", "b"] {
                let before = existing.get(name).unwrap();
                let after = reconciled.get(name).unwrap();
                assert_eq!(after.output_name, before.output_name, "{mode:?}");
                assert_eq!(after.position, before.position, "{mode:?}");
            }
            assert_eq!(output_names(&reconciled), vec!["alpha", "beta"]);
        }
    }

    #[test]
    fn test_unchanged_type_keeps_custom_path() {
        let specs = [spec(&[("a", "int")])];
        let mut existing = factory().create_new(raw(&specs), &config(ColumnFilterMode::Union));
        existing
            .set_path("a", ProductionPath::new("int", "string", "format"))
            .unwrap();

        let reconciled = factory()
            .create_from_existing(raw(&specs), &ReadConfig::default(), &existing)
            .unwrap();

        assert_eq!(reconciled.get("a").unwrap().path.converter, "format");
    }

    #[test]
    fn test_changed_type_without_enforcement_takes_default_path() {
        let existing = factory().create_new(raw(&[spec(&[("a", "int")])]), &ReadConfig::default());

        let reconciled = factory()
            .create_from_existing(raw(&[spec(&[("a", "double")])]), &ReadConfig::default(), &existing)
            .unwrap();

        let a = reconciled.get("a").unwrap();
        assert_eq!(a.path, ProductionPath::new("double", "double", "identity"));
        assert_eq!(a.position, 0);
    }

    #[test]
    fn test_enforced_types_switch_path_when_compatible() {
        let mut existing = factory().create_new(
            raw(&[spec(&[("id", "int"), ("a", "int")])]),
            &ReadConfig::default(),
        );
        existing
            .set_path("a", ProductionPath::new("int", "string", "format"))
            .unwrap();
        existing.rename("a", "label").unwrap();
        let enforcing = ReadConfig {
            enforce_types: true,
            ..ReadConfig::default()
        };

        let reconciled = factory()
            .create_from_existing(raw(&[spec(&[("id", "int"), ("a", "double")])]), &enforcing, &existing)
            .unwrap();

        let a = reconciled.get("a").unwrap();
        assert_eq!(a.path, ProductionPath::new("double", "string", "format"));
        assert_eq!(a.output_name, "label");
        assert_eq!(a.position, 1);
        assert!(reconciled.enforce_types());
    }

    #[test]
    fn test_enforced_types_fail_without_compatible_path() {
        let existing = factory().create_new(raw(&[spec(&[("a", "int")])]), &ReadConfig::default());
        let enforcing = ReadConfig {
            enforce_types: true,
            ..ReadConfig::default()
        };

        let result =
            factory().create_from_existing(raw(&[spec(&[("a", "string")])]), &enforcing, &existing);

        match result {
            Err(TransformationError::NoCompatiblePath { column, .. }) => assert_eq!(column, "a"),
            other => panic!("Expected NoCompatiblePath error, got: {other:?}"),
        }
    }

    #[test]
    fn test_new_columns_are_inserted_at_unknown_slot() {
        let mut existing = factory().create_new(
            raw(&[spec(&[("a", "int"), ("b", "int"), ("c", "int")])]),
            &ReadConfig::default(),
        );
        existing.set_unknown_columns(UnknownColumnsTransformation {
            position: 1,
            keep: true,
        });

        let reconciled = factory()
            .create_from_existing(
                raw(&[spec(&[("x", "int"), ("a", "int"), ("b", "int"), ("y", "int"), ("c", "int")])]),
                &ReadConfig::default(),
                &existing,
            )
            .unwrap();

        reconciled.validate().unwrap();
        assert_eq!(output_names(&reconciled), vec!["a", "x", "y", "b", "c"]);
        assert_eq!(reconciled.unknown_columns().position, 3);
    }

    #[test]
    fn test_new_columns_follow_unknown_keep_default() {
        let mut existing = factory().create_new(raw(&[spec(&[("a", "int")])]), &ReadConfig::default());
        existing.set_unknown_columns(UnknownColumnsTransformation {
            position: 1,
            keep: false,
        });

        let reconciled = factory()
            .create_from_existing(
                raw(&[spec(&[("a", "int"), ("b", "int")])]),
                &ReadConfig::default(),
                &existing,
            )
            .unwrap();

        assert!(!reconciled.get("b").unwrap().keep);
        assert_eq!(output_names(&reconciled), vec!["a"]);
    }

    #[test]
    fn test_known_set_uses_stored_filter_mode() {
        let old_specs = [spec(&[("a", "int"), ("b", "int")]), spec(&[("b", "int"), ("c", "int")])];
        let mut existing = factory().create_new(raw(&old_specs), &config(ColumnFilterMode::Intersection));
        existing.rename("a", "kept_a").unwrap();
        existing.rename("b", "kept_b").unwrap();

        let reconciled = factory()
            .create_from_existing(raw(&old_specs), &config(ColumnFilterMode::Union), &existing)
            .unwrap();

        // Only `b` was known under the stored intersection mode.
        assert_eq!(reconciled.get("b").unwrap().output_name, "kept_b");
        assert_eq!(reconciled.get("a").unwrap().output_name, "a");
        assert_eq!(reconciled.column_filter_mode(), ColumnFilterMode::Union);
        assert_eq!(reconciled.output_columns().len(), 3);
    }

    #[test]
    fn test_known_column_survives_leaving_intersection() {
        let old_specs = [spec(&[("a", "int"), ("b", "int")]), spec(&[("b", "int"), ("c", "int")])];
        let mut existing = factory().create_new(raw(&old_specs), &config(ColumnFilterMode::Intersection));
        existing.rename("b", "kept_b").unwrap();

        // `b` is now only in the union.
        let new_specs = [spec(&[("a", "int"), ("b", "int")]), spec(&[("c", "int")])];
        let reconciled = factory()
            .create_from_existing(raw(&new_specs), &config(ColumnFilterMode::Union), &existing)
            .unwrap();

        let b = reconciled.get("b").unwrap();
        assert_eq!(b.output_name, "kept_b");
        assert_eq!(b.position, 0);
        assert_eq!(output_names(&reconciled), vec!["kept_b", "a", "c"]);
    }

    #[test]
    fn test_known_columns_at_unknown_slot_shift_past_new_columns() {
        let mut existing = factory().create_new(
            raw(&[spec(&[("a", "int"), ("b", "int"), ("c", "int")])]),
            &ReadConfig::default(),
        );
        existing.set_unknown_columns(UnknownColumnsTransformation {
            position: 2,
            keep: true,
        });

        let reconciled = factory()
            .create_from_existing(
                raw(&[spec(&[("a", "int"), ("b", "int"), ("c", "int"), ("x", "int"), ("y", "int")])]),
                &ReadConfig::default(),
                &existing,
            )
            .unwrap();

        reconciled.validate().unwrap();
        assert_eq!(output_names(&reconciled), vec!["a", "b", "x", "y", "c"]);
        assert_eq!(reconciled.get("c").unwrap().position, 4);
        assert_eq!(reconciled.unknown_columns().position, 4);
    }

    #[test]
    fn test_new_columns_before_all_known_columns() {
        let mut existing = factory().create_new(
            raw(&[spec(&[("a", "int"), ("b", "int")])]),
            &ReadConfig::default(),
        );
        existing.set_unknown_columns(UnknownColumnsTransformation {
            position: 0,
            keep: true,
        });

        let reconciled = factory()
            .create_from_existing(
                raw(&[spec(&[("a", "int"), ("x", "int"), ("b", "int")])]),
                &ReadConfig::default(),
                &existing,
            )
            .unwrap();

        assert_eq!(output_names(&reconciled), vec!["x", "a", "b"]);
        assert_eq!(reconciled.unknown_columns().position, 1);
    }

    #[test]
    fn test_equal_stored_positions_follow_raw_order() {
        let mut existing = factory().create_new(
            raw(&[spec(&[("a", "int"), ("b", "int"), ("c", "int")])]),
            &ReadConfig::default(),
        );
        for column in existing.columns.iter_mut() {
            column.position = if column.column == "c" { 1 } else { 0 };
        }

        let reconciled = factory()
            .create_from_existing(
                raw(&[spec(&[("b", "int"), ("a", "int"), ("c", "int")])]),
                &ReadConfig::default(),
                &existing,
            )
            .unwrap();

        reconciled.validate().unwrap();
        assert_eq!(output_names(&reconciled), vec!["b", "a", "c"]);
        assert_eq!(reconciled.get("a").unwrap().position, 1);
    }

    #[test]
    fn test_empty_columns_become_new_once_skipping_is_disabled() {
        let typed = TypedColumnSpec::typed("a", "int");
        let specs = [
            TypedTableSpec::new(vec![typed.clone(), TypedColumnSpec::new("e", "string", false)]),
            TypedTableSpec::new(vec![typed, TypedColumnSpec::typed("e", "string")]),
        ];
        let skipping = ReadConfig {
            skip_empty_columns: true,
            ..ReadConfig::default()
        };
        // The fallback resolver keeps `e` untyped.
        let untyped_raw = RawSpecFactory::new(FallbackResolver::default)
            .create(&specs[..1])
            .unwrap();

        let mut existing = factory().create_new(untyped_raw, &skipping);
        existing.rename("e", "hidden").unwrap();
        assert_eq!(output_names(&existing), vec!["a"]);

        let reconciled = factory()
            .create_from_existing(raw(&specs), &ReadConfig::default(), &existing)
            .unwrap();

        let e = reconciled.get("e").unwrap();
        assert_eq!(e.output_name, "e");
        assert!(!reconciled.skip_empty_columns());
        assert_eq!(output_names(&reconciled), vec!["a", "e"]);
    }

    #[test]
    fn test_vanished_columns_are_dropped() {
        let existing = factory().create_new(
            raw(&[spec(&[("a", "int"), ("b", "int"), ("c", "int")])]),
            &ReadConfig::default(),
        );

        let reconciled = factory()
            .create_from_existing(raw(&[spec(&[("a", "int"), ("c", "int")])]), &ReadConfig::default(), &existing)
            .unwrap();

        reconciled.validate().unwrap();
        assert_eq!(output_names(&reconciled), vec!["a", "c"]);
        assert_eq!(reconciled.get("c").unwrap().position, 1);
    }

    #[test]
    fn test_reconcile_reports_new_columns() {
        let existing = factory().create_new(raw(&[spec(&[("a", "int")])]), &ReadConfig::default());

        let reconciled = factory()
            .reconcile(raw(&[spec(&[("b", "int"), ("a", "int")])]), &ReadConfig::default(), &existing)
            .unwrap();

        assert_eq!(reconciled.new_columns, vec!["b"]);
    }

    #[derive(Default)]
    struct FallbackResolver(Option<&'static str>);

    impl crate::spec::TypeResolver<&'static str> for FallbackResolver {
        fn accept(&mut self, ty: &&'static str) {
            self.0 = Some(*ty);
        }

        fn resolve(self) -> Option<&'static str> {
            Some(self.0.unwrap_or("string"))
        }
    }
}
