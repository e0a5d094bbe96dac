//! Production paths: how a source type becomes an output type.

use serde::{Deserialize, Serialize};

use crate::error::BoxError;
use crate::spec::TypeToken;

/// A conversion from a source type to a destination type.
///
/// `converter` identifies the conversion among those a provider offers for
/// the same pair of types; it is what gets persisted with a transformation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionPath<T> {
    pub source: T,
    pub destination: T,
    pub converter: String,
}

impl<T> ProductionPath<T> {
    pub fn new(source: T, destination: T, converter: impl Into<String>) -> Self {
        Self {
            source,
            destination,
            converter: converter.into(),
        }
    }
}

/// Offers the conversions available for a source type.
pub trait ProductionPathProvider<T: TypeToken> {
    /// The conversion used for a column nobody configured.
    fn default_path(&self, source: &T) -> ProductionPath<T>;

    /// Every conversion available for `source`, the default among them.
    fn available_paths(&self, source: &T) -> Vec<ProductionPath<T>>;

    /// The conversions from `source` that produce `destination`.
    ///
    /// The default path comes first when it qualifies.
    fn paths_to(&self, source: &T, destination: &T) -> Vec<ProductionPath<T>> {
        let default = self.default_path(source);
        let mut paths: Vec<_> = self
            .available_paths(source)
            .into_iter()
            .filter(|path| &path.destination == destination && *path != default)
            .collect();
        if &default.destination == destination {
            paths.insert(0, default);
        }
        paths
    }
}

/// Converts cell values along production paths while rows are read.
pub trait ValueConverter<T> {
    type Value;

    fn convert(&self, path: &ProductionPath<T>, value: Self::Value) -> Result<Self::Value, BoxError>;
}
