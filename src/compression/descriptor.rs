//! Compression descriptors and their validation
//!
//! A [`CompressionDescriptor`] records how a compressed store maps onto its
//! uncompressed (logical) shape, using the CF conventions for gathered and
//! ragged arrays. Descriptors are checked against the store and logical
//! shapes before an adapter is built, so decompression itself cannot fail.

use crate::errors::{CfArrayError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

/// The four CF compression encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionKind {
    Gathered,
    RaggedContiguous,
    RaggedIndexed,
    RaggedIndexedContiguous,
}

impl CompressionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gathered => "gathered",
            Self::RaggedContiguous => "ragged_contiguous",
            Self::RaggedIndexed => "ragged_indexed",
            Self::RaggedIndexedContiguous => "ragged_indexed_contiguous",
        }
    }

    /// Mapping fields a descriptor of this kind carries
    const fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Gathered => &["sample_axis", "collapsed_axes", "list"],
            Self::RaggedContiguous => &["count"],
            Self::RaggedIndexed => &["index"],
            Self::RaggedIndexedContiguous => &["count", "index"],
        }
    }
}

impl fmt::Display for CompressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionKind {
    type Err = CfArrayError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gathered" => Ok(Self::Gathered),
            "ragged_contiguous" => Ok(Self::RaggedContiguous),
            "ragged_indexed" => Ok(Self::RaggedIndexed),
            "ragged_indexed_contiguous" => Ok(Self::RaggedIndexedContiguous),
            other => Err(CfArrayError::InvalidCompressionKind {
                kind: other.to_string(),
            }),
        }
    }
}

/// Compression by gathering: `collapsed_axes` consecutive logical axes,
/// starting at `sample_axis`, are replaced in the store by one sample axis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatheredMapping {
    /// Position of the sample axis in the store (and of the first collapsed
    /// axis in the logical array)
    pub sample_axis: usize,
    /// Number of logical axes collapsed into the sample axis
    pub collapsed_axes: usize,
    /// For each sample, the row-major position within the collapsed axes
    pub list: Vec<usize>,
}

/// Contiguous ragged array: instance `i` owns the next `count[i]` elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContiguousMapping {
    pub count: Vec<usize>,
}

/// Indexed ragged array: element `e` belongs to instance `index[e]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedMapping {
    pub index: Vec<usize>,
}

/// Indexed contiguous ragged array: profile `p` owns the next `count[p]`
/// elements and belongs to instance `index[p]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedContiguousMapping {
    pub count: Vec<usize>,
    pub index: Vec<usize>,
}

/// How a compressed store maps onto its logical shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressionDescriptor {
    Gathered(GatheredMapping),
    RaggedContiguous(ContiguousMapping),
    RaggedIndexed(IndexedMapping),
    RaggedIndexedContiguous(IndexedContiguousMapping),
}

impl CompressionDescriptor {
    #[must_use]
    pub const fn kind(&self) -> CompressionKind {
        match self {
            Self::Gathered(_) => CompressionKind::Gathered,
            Self::RaggedContiguous(_) => CompressionKind::RaggedContiguous,
            Self::RaggedIndexed(_) => CompressionKind::RaggedIndexed,
            Self::RaggedIndexedContiguous(_) => CompressionKind::RaggedIndexedContiguous,
        }
    }

    /// Build a descriptor from a JSON object with a `kind` field
    ///
    /// # Errors
    ///
    /// Returns `InvalidCompressionKind` for an unknown kind, and
    /// `InvalidDescriptor` if the value is not an object or has missing,
    /// unknown or mistyped fields.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| CfArrayError::invalid_descriptor("expected a JSON object"))?;
        let kind: CompressionKind = object
            .get("kind")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| CfArrayError::invalid_descriptor("missing string field 'kind'"))?
            .parse()?;

        let mut fields = object.clone();
        fields.remove("kind");
        if let Some(unknown) = fields.keys().find(|key| !kind.fields().contains(&key.as_str())) {
            return Err(CfArrayError::invalid_descriptor(format!(
                "unknown field '{unknown}' for {kind} compression"
            )));
        }

        let fields = JsonValue::Object(fields);
        Ok(match kind {
            CompressionKind::Gathered => Self::Gathered(serde_json::from_value(fields)?),
            CompressionKind::RaggedContiguous => {
                Self::RaggedContiguous(serde_json::from_value(fields)?)
            }
            CompressionKind::RaggedIndexed => Self::RaggedIndexed(serde_json::from_value(fields)?),
            CompressionKind::RaggedIndexedContiguous => {
                Self::RaggedIndexedContiguous(serde_json::from_value(fields)?)
            }
        })
    }

    /// Parse a descriptor from JSON text
    ///
    /// # Errors
    ///
    /// See [`from_json`](Self::from_json).
    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::from_json(&serde_json::from_str(text)?)
    }

    /// JSON object with a `kind` field and the mapping fields
    ///
    /// # Errors
    ///
    /// Returns `InvalidDescriptor` if serialisation fails.
    pub fn to_json(&self) -> Result<JsonValue> {
        let mut value = match self {
            Self::Gathered(mapping) => serde_json::to_value(mapping)?,
            Self::RaggedContiguous(mapping) => serde_json::to_value(mapping)?,
            Self::RaggedIndexed(mapping) => serde_json::to_value(mapping)?,
            Self::RaggedIndexedContiguous(mapping) => serde_json::to_value(mapping)?,
        };
        if let JsonValue::Object(object) = &mut value {
            object.insert("kind".to_string(), JsonValue::from(self.kind().as_str()));
        }
        Ok(value)
    }

    /// Check that a store of `store_shape` can be decompressed into
    /// `logical_shape` under this descriptor
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` describing the first inconsistency found.
    pub fn validate(&self, store_shape: &[usize], logical_shape: &[usize]) -> Result<()> {
        match self {
            Self::Gathered(mapping) => validate_gathered(mapping, store_shape, logical_shape),
            Self::RaggedContiguous(mapping) => {
                validate_ragged(store_shape, logical_shape, 1)?;
                validate_counts(&mapping.count, store_shape[0], logical_shape[0], logical_shape[1])
            }
            Self::RaggedIndexed(mapping) => {
                validate_ragged(store_shape, logical_shape, 1)?;
                let (instances, max_elements) = (logical_shape[0], logical_shape[1]);
                if mapping.index.len() != store_shape[0] {
                    return Err(CfArrayError::shape_mismatch(format!(
                        "index has {} entries but the store has {} elements",
                        mapping.index.len(),
                        store_shape[0]
                    )));
                }
                validate_index(&mapping.index, instances, max_elements, "elements")
            }
            Self::RaggedIndexedContiguous(mapping) => {
                validate_ragged(store_shape, logical_shape, 2)?;
                if mapping.count.len() != mapping.index.len() {
                    return Err(CfArrayError::shape_mismatch(format!(
                        "count has {} profiles but index has {}",
                        mapping.count.len(),
                        mapping.index.len()
                    )));
                }
                validate_counts(
                    &mapping.count,
                    store_shape[0],
                    mapping.count.len(),
                    logical_shape[2],
                )?;
                validate_index(&mapping.index, logical_shape[0], logical_shape[1], "profiles")
            }
        }
    }
}

fn validate_gathered(
    mapping: &GatheredMapping,
    store_shape: &[usize],
    logical_shape: &[usize],
) -> Result<()> {
    let GatheredMapping {
        sample_axis,
        collapsed_axes,
        list,
    } = mapping;
    let (axis, k) = (*sample_axis, *collapsed_axes);

    if k == 0 {
        return Err(CfArrayError::shape_mismatch(
            "a gathered array must collapse at least one axis",
        ));
    }
    if axis >= store_shape.len() {
        return Err(CfArrayError::shape_mismatch(format!(
            "sample axis {axis} does not exist in a {}-dimensional store",
            store_shape.len()
        )));
    }
    if logical_shape.len() != store_shape.len() + k - 1 {
        return Err(CfArrayError::shape_mismatch(format!(
            "store of shape {store_shape:?} with {k} collapsed axes cannot produce shape {logical_shape:?}"
        )));
    }
    if store_shape[..axis] != logical_shape[..axis]
        || store_shape[axis + 1..] != logical_shape[axis + k..]
    {
        return Err(CfArrayError::shape_mismatch(format!(
            "uncompressed axes of store shape {store_shape:?} do not match shape {logical_shape:?}"
        )));
    }
    if list.len() != store_shape[axis] {
        return Err(CfArrayError::shape_mismatch(format!(
            "list has {} entries but the sample axis has size {}",
            list.len(),
            store_shape[axis]
        )));
    }

    let collapsed_size: usize = logical_shape[axis..axis + k].iter().product();
    let mut seen = vec![false; collapsed_size];
    for &position in list {
        if position >= collapsed_size {
            return Err(CfArrayError::shape_mismatch(format!(
                "list value {position} is outside the {collapsed_size} gathered positions"
            )));
        }
        if std::mem::replace(&mut seen[position], true) {
            return Err(CfArrayError::shape_mismatch(format!(
                "list value {position} appears more than once"
            )));
        }
    }
    Ok(())
}

/// Ragged stores have one element axis replacing `ragged_axes + 1` logical axes
fn validate_ragged(store_shape: &[usize], logical_shape: &[usize], ragged_axes: usize) -> Result<()> {
    if store_shape.is_empty() || logical_shape.len() != store_shape.len() + ragged_axes {
        return Err(CfArrayError::shape_mismatch(format!(
            "ragged store of shape {store_shape:?} cannot produce shape {logical_shape:?}"
        )));
    }
    if store_shape[1..] != logical_shape[ragged_axes + 1..] {
        return Err(CfArrayError::shape_mismatch(format!(
            "trailing axes of store shape {store_shape:?} do not match shape {logical_shape:?}"
        )));
    }
    Ok(())
}

fn validate_counts(
    count: &[usize],
    store_elements: usize,
    expected_runs: usize,
    max_run: usize,
) -> Result<()> {
    if count.len() != expected_runs {
        return Err(CfArrayError::shape_mismatch(format!(
            "count has {} entries, expected {expected_runs}",
            count.len()
        )));
    }
    let total: usize = count.iter().sum();
    if total != store_elements {
        return Err(CfArrayError::shape_mismatch(format!(
            "counts sum to {total} but the store has {store_elements} elements"
        )));
    }
    if let Some(&longest) = count.iter().max() {
        if longest > max_run {
            return Err(CfArrayError::shape_mismatch(format!(
                "a count of {longest} does not fit an axis of size {max_run}"
            )));
        }
    }
    Ok(())
}

fn validate_index(index: &[usize], instances: usize, capacity: usize, what: &str) -> Result<()> {
    let mut per_instance = vec![0usize; instances];
    for &instance in index {
        let slot = per_instance.get_mut(instance).ok_or_else(|| {
            CfArrayError::shape_mismatch(format!(
                "index value {instance} is outside the {instances} instances"
            ))
        })?;
        *slot += 1;
        if *slot > capacity {
            return Err(CfArrayError::shape_mismatch(format!(
                "instance {instance} has more than {capacity} {what}"
            )));
        }
    }
    Ok(())
}
