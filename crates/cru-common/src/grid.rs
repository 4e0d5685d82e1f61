//! Sub-window indexing between the simulation grid and the dataset grid.
//!
//! The simulation works on a rectangular window of the dataset's absolute
//! grid. Each axis of that window is described by an origin (the absolute
//! index of local index 0), a stride (decimation factor) and a local extent.
//! Rows and columns are converted independently with the same arithmetic:
//!
//! ```text
//! absolute = origin + local * stride
//! local    = (absolute - origin) / stride
//! ```

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::{CruError, CruResult};

/// Convert a local axis index to the dataset's absolute index.
pub fn to_absolute(local: i64, origin: i64, stride: i64) -> i64 {
    origin + local * stride
}

/// Convert an absolute axis index back to a local index, truncating toward
/// the origin when the offset is not a multiple of the stride.
pub fn to_local(absolute: i64, origin: i64, stride: i64) -> i64 {
    (absolute - origin) / stride
}

/// Which axis of the window an indexer describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Dataset `y` dimension, configured with the `j_*` keys.
    Row,
    /// Dataset `x` dimension, configured with the `i_*` keys.
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Row => write!(f, "row"),
            Axis::Column => write!(f, "column"),
        }
    }
}

/// Bounds checking requested by the caller of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsCheck {
    /// Pure arithmetic, no validation.
    Unchecked,
    /// Validate the local index against the window extent and the absolute
    /// index against the dataset extent.
    Within { dataset_extent: usize },
}

/// Index conversion for one axis of the sub-window.
///
/// Only [`AxisIndexer::new`] builds one, so the stride is at least 1 and
/// `origin + extent * stride` fits in an `i64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisIndexer {
    axis: Axis,
    origin: usize,
    stride: usize,
    extent: usize,
}

impl AxisIndexer {
    /// Create an indexer, rejecting zero strides, empty extents and windows
    /// whose end bound is not representable.
    pub fn new(axis: Axis, origin: usize, stride: usize, extent: usize) -> CruResult<Self> {
        if stride == 0 {
            return Err(CruError::invalid_value(
                format!("{} stride", axis),
                "stride must be at least 1",
            ));
        }
        if extent == 0 {
            return Err(CruError::invalid_value(
                format!("{} extent", axis),
                "extent must be at least 1",
            ));
        }
        let end = extent
            .checked_mul(stride)
            .and_then(|span| span.checked_add(origin))
            .filter(|end| i64::try_from(*end).is_ok());
        if end.is_none() {
            return Err(CruError::invalid_value(
                format!("{} window", axis),
                format!(
                    "origin {} plus {} cells at stride {} overflows the index range",
                    origin, extent, stride
                ),
            ));
        }
        Ok(Self {
            axis,
            origin,
            stride,
            extent,
        })
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Absolute index of local index 0.
    pub fn origin(&self) -> usize {
        self.origin
    }

    /// Decimation factor.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of local cells along this axis.
    pub fn extent(&self) -> usize {
        self.extent
    }

    /// Absolute index of a local index, without bounds validation.
    ///
    /// Fails only when the result does not fit in a `usize`.
    pub fn to_absolute(&self, local: usize) -> CruResult<usize> {
        local
            .checked_mul(self.stride)
            .and_then(|offset| offset.checked_add(self.origin))
            .ok_or_else(|| {
                CruError::index_out_of_range(
                    format!("local {}", self.axis),
                    i64::try_from(local).unwrap_or(i64::MAX),
                    self.extent,
                )
            })
    }

    /// Local index of an absolute index, truncating toward the origin.
    pub fn to_local(&self, absolute: i64) -> i64 {
        absolute.saturating_sub(self.origin as i64) / self.stride as i64
    }

    /// Absolute index of a local index with optional bounds checking.
    pub fn to_absolute_with(&self, local: i64, check: BoundsCheck) -> CruResult<i64> {
        if let BoundsCheck::Within { .. } = check {
            self.check_local(local)?;
        }
        let absolute = local
            .checked_mul(self.stride as i64)
            .and_then(|offset| offset.checked_add(self.origin as i64))
            .ok_or_else(|| {
                CruError::index_out_of_range(format!("local {}", self.axis), local, self.extent)
            })?;
        if let BoundsCheck::Within { dataset_extent } = check {
            self.check_absolute(absolute, dataset_extent)?;
        }
        Ok(absolute)
    }

    /// Local index of an absolute index.
    ///
    /// With `exact` set, an absolute index that does not fall on the stride
    /// (or precedes the origin) is an error instead of being truncated.
    pub fn to_local_with(&self, absolute: i64, exact: bool, check: BoundsCheck) -> CruResult<i64> {
        if let BoundsCheck::Within { dataset_extent } = check {
            self.check_absolute(absolute, dataset_extent)?;
        }
        let offset = absolute.saturating_sub(self.origin as i64);
        if exact && (offset < 0 || offset % self.stride as i64 != 0) {
            return Err(CruError::OffStride {
                axis: self.axis.to_string(),
                absolute,
                origin: self.origin,
                stride: self.stride,
            });
        }
        let local = self.to_local(absolute);
        if let BoundsCheck::Within { .. } = check {
            self.check_local(local)?;
        }
        Ok(local)
    }

    /// Exclusive end bound of the window: `origin + extent * stride`.
    pub fn end_exclusive(&self) -> usize {
        self.origin + self.extent * self.stride
    }

    /// Absolute index of the last sampled cell.
    pub fn last_sample(&self) -> usize {
        self.origin + (self.extent - 1) * self.stride
    }

    /// Contiguous span of absolute indices that covers every sample.
    ///
    /// Reading this span and keeping every `stride`-th element yields
    /// exactly `extent` cells; see [`AxisIndexer::samples_in_span`].
    pub fn read_span(&self) -> Range<usize> {
        self.origin..self.last_sample() + 1
    }

    /// Number of samples a stride-decimated read of `span_len` cells yields.
    pub fn samples_in_span(&self, span_len: usize) -> usize {
        span_len.div_ceil(self.stride)
    }

    /// Fail unless every sample of this axis lies inside the dataset.
    pub fn validate_within(&self, dataset_extent: usize) -> CruResult<()> {
        let last = self.last_sample();
        if last >= dataset_extent {
            return Err(CruError::index_out_of_range(
                format!("absolute {}", self.axis),
                last as i64,
                dataset_extent,
            ));
        }
        debug_assert_eq!(self.samples_in_span(self.read_span().len()), self.extent);
        Ok(())
    }

    /// Absolute indices of all samples along this axis.
    pub fn samples(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.extent).map(move |local| self.origin + local * self.stride)
    }

    fn check_local(&self, local: i64) -> CruResult<()> {
        if local < 0 || local >= self.extent as i64 {
            return Err(CruError::index_out_of_range(
                format!("local {}", self.axis),
                local,
                self.extent,
            ));
        }
        Ok(())
    }

    fn check_absolute(&self, absolute: i64, dataset_extent: usize) -> CruResult<()> {
        if absolute < 0 || absolute >= dataset_extent as i64 {
            return Err(CruError::index_out_of_range(
                format!("absolute {}", self.axis),
                absolute,
                dataset_extent,
            ));
        }
        Ok(())
    }
}

/// Shape of a 2-D grid in (rows, cols).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridShape {
    pub rows: usize,
    pub cols: usize,
}

impl GridShape {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// Check if the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Row-major flat index of a cell.
    pub fn flat_index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }
}

impl fmt::Display for GridShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// The simulation's rectangular window into the dataset grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubWindowSpec {
    pub rows: AxisIndexer,
    pub cols: AxisIndexer,
}

impl SubWindowSpec {
    /// Build a window from per-axis origin and stride and the local shape.
    pub fn new(
        origin: (usize, usize),
        stride: (usize, usize),
        shape: GridShape,
    ) -> CruResult<Self> {
        Ok(Self {
            rows: AxisIndexer::new(Axis::Row, origin.0, stride.0, shape.rows)?,
            cols: AxisIndexer::new(Axis::Column, origin.1, stride.1, shape.cols)?,
        })
    }

    /// Local shape of the window.
    pub fn shape(&self) -> GridShape {
        GridShape::new(self.rows.extent(), self.cols.extent())
    }

    /// Fail unless the whole window lies inside a dataset of the given shape.
    pub fn validate_within(&self, dataset: GridShape) -> CruResult<()> {
        self.rows.validate_within(dataset.rows)?;
        self.cols.validate_within(dataset.cols)
    }

    /// Absolute (row, col) of a local cell, bounds checked against the dataset.
    pub fn to_absolute(&self, row: usize, col: usize, dataset: GridShape) -> CruResult<(usize, usize)> {
        let r = self.rows.to_absolute_with(
            row as i64,
            BoundsCheck::Within {
                dataset_extent: dataset.rows,
            },
        )?;
        let c = self.cols.to_absolute_with(
            col as i64,
            BoundsCheck::Within {
                dataset_extent: dataset.cols,
            },
        )?;
        Ok((r as usize, c as usize))
    }

    /// Local (row, col) of an absolute cell, requiring it to be a sample.
    pub fn to_local(&self, row: usize, col: usize, dataset: GridShape) -> CruResult<(usize, usize)> {
        let r = self.rows.to_local_with(
            row as i64,
            true,
            BoundsCheck::Within {
                dataset_extent: dataset.rows,
            },
        )?;
        let c = self.cols.to_local_with(
            col as i64,
            true,
            BoundsCheck::Within {
                dataset_extent: dataset.cols,
            },
        )?;
        Ok((r as usize, c as usize))
    }
}
