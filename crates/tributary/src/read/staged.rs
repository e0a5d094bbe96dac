//! Staging: reading the specs of a source group once and binding a
//! transformation to them.

use std::fmt::Debug;
use std::sync::Arc;

use tracing::{debug, info, warn};
use tributary_core::emit;

use crate::config::ReadConfig;
use crate::error::ReadError;
use crate::metrics::events::SchemaDrift;
use crate::spec::{RawSpec, RawSpecFactory, TypeHierarchy, TypeToken, TypedTableSpec};
use crate::transform::{
    ProductionPathProvider, TableTransformation, TableTransformationFactory, ValueConverter,
};

use super::mapper::IndexMapper;
use super::multi::MultiTableRead;
use super::source::{SourceGroup, SourceReader};

/// Stages source groups for reading.
///
/// Holds the collaborators every read of the same kind of source shares:
/// the reader, the type hierarchy, the conversion provider and the value
/// converter.
pub struct MultiTableReadFactory<R, H, P, C> {
    reader: Arc<R>,
    raw_specs: RawSpecFactory<H>,
    transformations: Arc<TableTransformationFactory<P>>,
    converter: Arc<C>,
    config: ReadConfig,
}

impl<R, H, P, C> MultiTableReadFactory<R, H, P, C> {
    pub fn new(reader: R, hierarchy: H, provider: P, converter: C, config: ReadConfig) -> Self {
        Self {
            reader: Arc::new(reader),
            raw_specs: RawSpecFactory::new(hierarchy),
            transformations: Arc::new(TableTransformationFactory::new(provider)),
            converter: Arc::new(converter),
            config,
        }
    }

    pub fn config(&self) -> &ReadConfig {
        &self.config
    }

    /// Read the spec of every source in `group` and compute the raw spec.
    ///
    /// A legacy merge mode in the configuration is checked against the
    /// specs here, so differing specs or an empty intersection fail staging.
    ///
    /// # Errors
    ///
    /// - [`ReadError::NoSources`] if the group is empty
    /// - [`ReadError::ReadSpec`] if a source cannot be described
    /// - [`ReadError::Spec`] if the specs cannot be combined
    pub fn stage<I>(&self, group: &SourceGroup<I>) -> Result<StagedMultiTableRead<I, R, P, C>, ReadError>
    where
        I: Clone + Debug,
        R: SourceReader<I>,
        R::Type: TypeToken,
        H: TypeHierarchy<R::Type>,
    {
        if group.is_empty() {
            return Err(ReadError::NoSources);
        }

        let mut source_specs = Vec::with_capacity(group.len());
        for item in group.items() {
            let spec = self.reader.read_spec(item).map_err(|e| ReadError::ReadSpec {
                item: format!("{item:?}"),
                source: e.into(),
            })?;
            debug!(group = %group.id(), item = ?item, columns = spec.len(), "Read source spec");
            source_specs.push(spec);
        }

        if let Some(mode) = self.config.spec_merge_mode {
            mode.merge_specs(&source_specs, self.raw_specs.hierarchy())?;
        }

        let raw_spec = self.raw_specs.create(&source_specs)?;

        info!(
            group = %group.id(),
            sources = group.len(),
            union = raw_spec.union().len(),
            intersection = raw_spec.intersection().len(),
            "Staged source group"
        );

        Ok(StagedMultiTableRead {
            group: group.clone(),
            source_specs,
            raw_spec,
            reader: Arc::clone(&self.reader),
            transformations: Arc::clone(&self.transformations),
            converter: Arc::clone(&self.converter),
            config: self.config.clone(),
        })
    }
}

/// The specs of one source group, ready to be bound to a transformation.
pub struct StagedMultiTableRead<I, R: SourceReader<I>, P, C> {
    group: SourceGroup<I>,
    source_specs: Vec<TypedTableSpec<R::Type>>,
    raw_spec: RawSpec<R::Type>,
    reader: Arc<R>,
    transformations: Arc<TableTransformationFactory<P>>,
    converter: Arc<C>,
    config: ReadConfig,
}

impl<I, R, P, C> StagedMultiTableRead<I, R, P, C>
where
    I: Clone + PartialEq + Debug,
    R: SourceReader<I>,
    R::Type: TypeToken,
    P: ProductionPathProvider<R::Type>,
    C: ValueConverter<R::Type, Value = R::Value>,
{
    pub fn group(&self) -> &SourceGroup<I> {
        &self.group
    }

    pub fn raw_spec(&self) -> &RawSpec<R::Type> {
        &self.raw_spec
    }

    /// Specs of the sources, in group order.
    pub fn source_specs(&self) -> &[TypedTableSpec<R::Type>] {
        &self.source_specs
    }

    pub fn config(&self) -> &ReadConfig {
        &self.config
    }

    /// Whether `candidate` lists exactly the staged sources, in order.
    pub fn is_valid_for(&self, candidate: &SourceGroup<I>) -> bool {
        self.group.items() == candidate.items()
    }

    /// The transformation used when the caller supplies none.
    pub fn default_transformation(&self) -> TableTransformation<R::Type> {
        self.transformations
            .create_new(self.raw_spec.clone(), &self.config)
    }

    /// Reconcile a stored transformation against the staged raw spec.
    ///
    /// # Errors
    ///
    /// - [`ReadError::Transformation`] if type enforcement finds no
    ///   compatible conversion
    pub fn reconcile(
        &self,
        existing: &TableTransformation<R::Type>,
    ) -> Result<TableTransformation<R::Type>, ReadError> {
        let reconciled = self
            .transformations
            .reconcile(self.raw_spec.clone(), &self.config, existing)?;

        if !reconciled.new_columns.is_empty() {
            info!(
                group = %self.group.id(),
                columns = ?reconciled.new_columns,
                "Sources gained columns since the transformation was stored"
            );
            emit!(SchemaDrift {
                new_columns: reconciled.new_columns.len() as u64,
                group: self.group.id().to_string(),
            });
        }

        Ok(reconciled.transformation)
    }

    /// Bind the default transformation.
    pub fn without_transformation(
        &self,
        group: &SourceGroup<I>,
    ) -> Result<MultiTableRead<I, R, C>, ReadError> {
        self.with_transformation(group, self.default_transformation())
    }

    /// Bind a caller-supplied transformation.
    ///
    /// The transformation is expected to be reconciled with the staged raw
    /// spec already; binding one computed for another raw spec is allowed
    /// but logged.
    ///
    /// # Errors
    ///
    /// - [`ReadError::StaleStaging`] if `group` is not the staged group
    /// - [`ReadError::Transformation`] if the transformation is invalid
    pub fn with_transformation(
        &self,
        group: &SourceGroup<I>,
        transformation: TableTransformation<R::Type>,
    ) -> Result<MultiTableRead<I, R, C>, ReadError> {
        if !self.is_valid_for(group) {
            return Err(ReadError::StaleStaging {
                group: group.id().to_string(),
            });
        }
        transformation.validate()?;

        if transformation.raw_spec() != &self.raw_spec {
            warn!(
                group = %group.id(),
                "Binding a transformation that was computed for a different raw spec"
            );
        }

        let output_columns = transformation.output_columns();
        let names: Vec<&str> = output_columns.iter().map(|c| c.column.as_str()).collect();
        let mappers = self
            .source_specs
            .iter()
            .map(|spec| IndexMapper::new(names.iter().copied(), spec))
            .collect();
        let paths = output_columns.iter().map(|c| c.path.clone()).collect();
        let output_spec = transformation.output_spec();

        info!(
            group = %group.id(),
            columns = output_spec.len(),
            "Bound transformation"
        );

        Ok(MultiTableRead::new(
            self.group.clone(),
            Arc::clone(&self.reader),
            Arc::clone(&self.converter),
            Arc::new(transformation),
            output_spec,
            paths,
            mappers,
            self.config.progress_interval,
        ))
    }
}
