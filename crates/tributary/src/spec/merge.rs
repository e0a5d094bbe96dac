//! Merging of column domains and table-level metadata.
//!
//! Both mergers are folds over an owned builder value: `merge` consumes the
//! merger and returns the updated one, `create_merged` materializes the
//! result without consuming it.
//!
//! ```ignore
//! let merged = TableSpecMerger::default()
//!     .merge(&first)
//!     .merge(&second)
//!     .create_merged()?;
//! ```

use std::cmp::Ordering;
use std::fmt::Debug;
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::config::ReadConfig;
use crate::error::SpecError;

/// Possible-value sets larger than this become absent.
pub const DEFAULT_MAX_POSSIBLE_VALUES: usize = 60;

/// Value range and nominal values observed for a column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "V: Serialize + Hash + Eq",
    deserialize = "V: Deserialize<'de> + Hash + Eq"
))]
pub struct ColumnDomain<V> {
    pub lower_bound: Option<V>,
    pub upper_bound: Option<V>,
    /// `None` means the values are unknown, not that there are none.
    pub possible_values: Option<IndexSet<V>>,
}

impl<V: Hash + Eq> PartialEq for ColumnDomain<V> {
    fn eq(&self, other: &Self) -> bool {
        self.lower_bound == other.lower_bound
            && self.upper_bound == other.upper_bound
            && self.possible_values == other.possible_values
    }
}

impl<V> Default for ColumnDomain<V> {
    fn default() -> Self {
        Self {
            lower_bound: None,
            upper_bound: None,
            possible_values: None,
        }
    }
}

impl<V: Hash + Eq> ColumnDomain<V> {
    /// A domain with bounds only.
    pub fn bounded(lower_bound: V, upper_bound: V) -> Self {
        Self {
            lower_bound: Some(lower_bound),
            upper_bound: Some(upper_bound),
            possible_values: None,
        }
    }

    /// A domain with possible values only.
    pub fn nominal(values: impl IntoIterator<Item = V>) -> Self {
        Self {
            lower_bound: None,
            upper_bound: None,
            possible_values: Some(values.into_iter().collect()),
        }
    }
}

/// A column spec carrying domain information.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize, V: Serialize + Hash + Eq",
    deserialize = "T: Deserialize<'de>, V: Deserialize<'de> + Hash + Eq"
))]
pub struct DomainColumnSpec<T, V> {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: T,
    #[serde(default)]
    pub domain: ColumnDomain<V>,
}

impl<T: PartialEq, V: Hash + Eq> PartialEq for DomainColumnSpec<T, V> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.ty == other.ty && self.domain == other.domain
    }
}

impl<T, V> DomainColumnSpec<T, V> {
    pub fn new(name: impl Into<String>, ty: T, domain: ColumnDomain<V>) -> Self {
        Self {
            name: name.into(),
            ty,
            domain,
        }
    }
}

/// A table spec with a name, free-form properties and domain-carrying columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize, V: Serialize + Hash + Eq",
    deserialize = "T: Deserialize<'de>, V: Deserialize<'de> + Hash + Eq"
))]
pub struct DomainTableSpec<T, V> {
    pub name: String,
    #[serde(default)]
    pub properties: IndexMap<String, String>,
    pub columns: Vec<DomainColumnSpec<T, V>>,
}

impl<T: PartialEq, V: Hash + Eq> PartialEq for DomainTableSpec<T, V> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.properties == other.properties
            && self.columns == other.columns
    }
}

impl<T, V> DomainTableSpec<T, V> {
    pub fn new(name: impl Into<String>, columns: Vec<DomainColumnSpec<T, V>>) -> Self {
        Self {
            name: name.into(),
            properties: IndexMap::new(),
            columns,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone)]
enum PossibleValues<V> {
    Collecting(IndexSet<V>),
    /// Terminal: once absent, later merges cannot bring the values back.
    Absent,
}

#[derive(Debug, Clone)]
struct ColumnAccumulator<T, V> {
    name: String,
    ty: T,
    conflicting_type: Option<T>,
    lower_bound: Option<V>,
    upper_bound: Option<V>,
    possible_values: PossibleValues<V>,
}

/// Folds the domains of same-named columns.
///
/// Name and type come from the first merged column. Bounds widen to the
/// smallest lower and largest upper bound present. Possible values are the
/// union of all sets until a merged column has none or the union outgrows
/// the cap, after which they stay absent.
#[derive(Debug, Clone)]
pub struct ColumnSpecMerger<T, V> {
    max_possible_values: usize,
    state: Option<ColumnAccumulator<T, V>>,
}

impl<T, V> Default for ColumnSpecMerger<T, V> {
    fn default() -> Self {
        Self::with_max_possible_values(DEFAULT_MAX_POSSIBLE_VALUES)
    }
}

impl<T, V> ColumnSpecMerger<T, V> {
    pub fn with_max_possible_values(max_possible_values: usize) -> Self {
        Self {
            max_possible_values,
            state: None,
        }
    }

    /// A merger capped at the configured `max_possible_values`.
    pub fn from_config(config: &ReadConfig) -> Self {
        Self::with_max_possible_values(config.max_possible_values)
    }
}

impl<T, V> ColumnSpecMerger<T, V>
where
    T: Clone + PartialEq + Debug,
    V: Clone + PartialOrd + Hash + Eq,
{
    /// Merge `spec` into the accumulated column.
    pub fn merge(mut self, spec: &DomainColumnSpec<T, V>) -> Self {
        self.absorb(spec);
        self
    }

    fn absorb(&mut self, spec: &DomainColumnSpec<T, V>) {
        let domain = &spec.domain;
        let Some(state) = self.state.as_mut() else {
            let possible_values = match &domain.possible_values {
                Some(values) if values.len() <= self.max_possible_values => {
                    PossibleValues::Collecting(values.clone())
                }
                _ => PossibleValues::Absent,
            };
            self.state = Some(ColumnAccumulator {
                name: spec.name.clone(),
                ty: spec.ty.clone(),
                conflicting_type: None,
                lower_bound: domain.lower_bound.clone(),
                upper_bound: domain.upper_bound.clone(),
                possible_values,
            });
            return;
        };

        if spec.ty != state.ty && state.conflicting_type.is_none() {
            state.conflicting_type = Some(spec.ty.clone());
        }

        state.lower_bound = pick_bound(
            state.lower_bound.take(),
            domain.lower_bound.as_ref(),
            Ordering::Less,
        );
        state.upper_bound = pick_bound(
            state.upper_bound.take(),
            domain.upper_bound.as_ref(),
            Ordering::Greater,
        );

        if let PossibleValues::Collecting(values) = &mut state.possible_values {
            match &domain.possible_values {
                Some(more) => {
                    values.extend(more.iter().cloned());
                    if values.len() > self.max_possible_values {
                        state.possible_values = PossibleValues::Absent;
                    }
                }
                None => state.possible_values = PossibleValues::Absent,
            }
        }
    }

    /// Materialize the merged column.
    ///
    /// # Errors
    ///
    /// - [`SpecError::NothingMerged`] if `merge` was never called
    /// - [`SpecError::ColumnTypeConflict`] if merged columns disagree on their type
    pub fn create_merged(&self) -> Result<DomainColumnSpec<T, V>, SpecError> {
        let state = self
            .state
            .as_ref()
            .ok_or(SpecError::NothingMerged { merger: "column" })?;

        if let Some(other) = &state.conflicting_type {
            return Err(SpecError::ColumnTypeConflict {
                column: state.name.clone(),
                first: format!("{:?}", state.ty),
                other: format!("{other:?}"),
            });
        }

        let possible_values = match &state.possible_values {
            PossibleValues::Collecting(values) => Some(values.clone()),
            PossibleValues::Absent => None,
        };

        Ok(DomainColumnSpec {
            name: state.name.clone(),
            ty: state.ty.clone(),
            domain: ColumnDomain {
                lower_bound: state.lower_bound.clone(),
                upper_bound: state.upper_bound.clone(),
                possible_values,
            },
        })
    }
}

/// Keep whichever bound compares as `wanted` against the other; an absent
/// bound contributes nothing. Incomparable values keep the current bound.
fn pick_bound<V: Clone + PartialOrd>(current: Option<V>, next: Option<&V>, wanted: Ordering) -> Option<V> {
    match (current, next) {
        (Some(current), Some(next)) => {
            if next.partial_cmp(&current) == Some(wanted) {
                Some(next.clone())
            } else {
                Some(current)
            }
        }
        (current, None) => current,
        (None, Some(next)) => Some(next.clone()),
    }
}

#[derive(Debug, Clone)]
struct TableAccumulator<T, V> {
    name: String,
    properties: IndexMap<String, String>,
    columns: IndexMap<String, ColumnSpecMerger<T, V>>,
}

/// Folds whole table specs.
///
/// The name is the first merged spec's name, properties are unioned with
/// later values winning, and columns are unioned in order of first
/// appearance with same-named columns merged by [`ColumnSpecMerger`].
#[derive(Debug, Clone)]
pub struct TableSpecMerger<T, V> {
    max_possible_values: usize,
    state: Option<TableAccumulator<T, V>>,
}

impl<T, V> Default for TableSpecMerger<T, V> {
    fn default() -> Self {
        Self::with_max_possible_values(DEFAULT_MAX_POSSIBLE_VALUES)
    }
}

impl<T, V> TableSpecMerger<T, V> {
    pub fn with_max_possible_values(max_possible_values: usize) -> Self {
        Self {
            max_possible_values,
            state: None,
        }
    }

    /// A merger capped at the configured `max_possible_values`.
    pub fn from_config(config: &ReadConfig) -> Self {
        Self::with_max_possible_values(config.max_possible_values)
    }
}

impl<T, V> TableSpecMerger<T, V>
where
    T: Clone + PartialEq + Debug,
    V: Clone + PartialOrd + Hash + Eq,
{
    /// Merge `spec` into the accumulated table.
    pub fn merge(mut self, spec: &DomainTableSpec<T, V>) -> Self {
        let cap = self.max_possible_values;
        let state = self.state.get_or_insert_with(|| TableAccumulator {
            name: spec.name.clone(),
            properties: IndexMap::new(),
            columns: IndexMap::new(),
        });

        for (key, value) in &spec.properties {
            state.properties.insert(key.clone(), value.clone());
        }

        for column in &spec.columns {
            state
                .columns
                .entry(column.name.clone())
                .or_insert_with(|| ColumnSpecMerger::with_max_possible_values(cap))
                .absorb(column);
        }

        self
    }

    /// Materialize the merged table.
    ///
    /// # Errors
    ///
    /// - [`SpecError::NothingMerged`] if `merge` was never called
    /// - [`SpecError::ColumnTypeConflict`] if same-named columns disagree on their type
    pub fn create_merged(&self) -> Result<DomainTableSpec<T, V>, SpecError> {
        let state = self
            .state
            .as_ref()
            .ok_or(SpecError::NothingMerged { merger: "table" })?;

        let columns = state
            .columns
            .values()
            .map(ColumnSpecMerger::create_merged)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DomainTableSpec {
            name: state.name.clone(),
            properties: state.properties.clone(),
            columns,
        })
    }
}
