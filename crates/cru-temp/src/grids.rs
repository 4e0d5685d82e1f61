//! Named output grids allocated at initialization.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use cru_common::{CruError, CruResult, GridShape};

/// Element type of a declared grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridElementType {
    Float32,
    Float64,
    Int16,
    Int32,
    Int64,
    UInt8,
}

impl GridElementType {
    /// Canonical name, as reported to callers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
        }
    }

    /// Size of one element in bytes.
    pub fn itemsize(&self) -> usize {
        match self {
            Self::UInt8 => 1,
            Self::Int16 => 2,
            Self::Float32 | Self::Int32 => 4,
            Self::Float64 | Self::Int64 => 8,
        }
    }
}

impl FromStr for GridElementType {
    type Err = CruError;

    /// Accepts canonical names, `np.`/`numpy.` prefixed names and the C
    /// style aliases `float`, `double`, `short`, `int` and `long`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let name = lowered
            .strip_prefix("np.")
            .or_else(|| lowered.strip_prefix("numpy."))
            .unwrap_or(&lowered);
        match name {
            "float32" | "float" | "f4" => Ok(Self::Float32),
            "float64" | "double" | "f8" => Ok(Self::Float64),
            "int16" | "short" | "i2" => Ok(Self::Int16),
            "int32" | "int" | "i4" => Ok(Self::Int32),
            "int64" | "long" | "i8" => Ok(Self::Int64),
            "uint8" | "byte" | "u1" => Ok(Self::UInt8),
            _ => Err(CruError::invalid_value(
                "grid element type",
                format!("unsupported element type '{}'", s.trim()),
            )),
        }
    }
}

impl fmt::Display for GridElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Storage for one grid, zero-initialized.
#[derive(Debug, Clone, PartialEq)]
pub enum GridBuffer {
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt8(Vec<u8>),
}

impl GridBuffer {
    pub fn zeroed(element_type: GridElementType, len: usize) -> Self {
        match element_type {
            GridElementType::Float32 => Self::Float32(vec![0.0; len]),
            GridElementType::Float64 => Self::Float64(vec![0.0; len]),
            GridElementType::Int16 => Self::Int16(vec![0; len]),
            GridElementType::Int32 => Self::Int32(vec![0; len]),
            GridElementType::Int64 => Self::Int64(vec![0; len]),
            GridElementType::UInt8 => Self::UInt8(vec![0; len]),
        }
    }

    pub fn element_type(&self) -> GridElementType {
        match self {
            Self::Float32(_) => GridElementType::Float32,
            Self::Float64(_) => GridElementType::Float64,
            Self::Int16(_) => GridElementType::Int16,
            Self::Int32(_) => GridElementType::Int32,
            Self::Int64(_) => GridElementType::Int64,
            Self::UInt8(_) => GridElementType::UInt8,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Float32(v) => v.len(),
            Self::Float64(v) => v.len(),
            Self::Int16(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::UInt8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn nbytes(&self) -> usize {
        self.len() * self.element_type().itemsize()
    }

    /// Value at a flat index, widened to f64.
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        match self {
            Self::Float32(v) => v.get(index).map(|x| *x as f64),
            Self::Float64(v) => v.get(index).copied(),
            Self::Int16(v) => v.get(index).map(|x| *x as f64),
            Self::Int32(v) => v.get(index).map(|x| *x as f64),
            Self::Int64(v) => v.get(index).map(|x| *x as f64),
            Self::UInt8(v) => v.get(index).map(|x| *x as f64),
        }
    }

    /// Overwrite the buffer from f64 values, casting to the element type.
    ///
    /// Integer element types saturate and map NaN to zero.
    pub fn set_from_f64(&mut self, values: &[f64]) -> CruResult<()> {
        if values.len() != self.len() {
            return Err(CruError::invalid_argument(
                "values",
                format!("expected {} values, got {}", self.len(), values.len()),
            ));
        }
        match self {
            Self::Float32(v) => v.iter_mut().zip(values).for_each(|(d, s)| *d = *s as f32),
            Self::Float64(v) => v.copy_from_slice(values),
            Self::Int16(v) => v.iter_mut().zip(values).for_each(|(d, s)| *d = *s as i16),
            Self::Int32(v) => v.iter_mut().zip(values).for_each(|(d, s)| *d = *s as i32),
            Self::Int64(v) => v.iter_mut().zip(values).for_each(|(d, s)| *d = *s as i64),
            Self::UInt8(v) => v.iter_mut().zip(values).for_each(|(d, s)| *d = *s as u8),
        }
        Ok(())
    }

    /// Contents widened to f64.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        (0..self.len()).filter_map(|i| self.get_f64(i)).collect()
    }
}

/// The grids declared by a run, keyed by name.
#[derive(Debug, Clone)]
pub struct GridSet {
    shape: GridShape,
    grids: BTreeMap<String, GridBuffer>,
}

impl GridSet {
    /// Allocate every declared grid at `shape`, zero-filled.
    pub fn allocate(shape: GridShape, declarations: &[(String, GridElementType)]) -> Self {
        let grids = declarations
            .iter()
            .map(|(name, element_type)| {
                (name.clone(), GridBuffer::zeroed(*element_type, shape.len()))
            })
            .collect();
        Self { shape, grids }
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.grids.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&GridBuffer> {
        self.grids.get(name)
    }

    /// Mutable access to a grid, failing for undeclared names.
    pub fn get_mut(&mut self, name: &str) -> CruResult<&mut GridBuffer> {
        self.grids
            .get_mut(name)
            .ok_or_else(|| CruError::invalid_argument("name", format!("no grid named '{}'", name)))
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("np.float32".parse::<GridElementType>().unwrap(), GridElementType::Float32);
        assert_eq!("float".parse::<GridElementType>().unwrap(), GridElementType::Float32);
        assert_eq!("numpy.float64".parse::<GridElementType>().unwrap(), GridElementType::Float64);
        assert_eq!("short".parse::<GridElementType>().unwrap(), GridElementType::Int16);
        assert_eq!(" INT32 ".parse::<GridElementType>().unwrap(), GridElementType::Int32);
        assert!("complex64".parse::<GridElementType>().is_err());
    }

    #[test]
    fn test_allocation_is_zeroed() {
        let declarations = vec![
            ("temperature".to_string(), GridElementType::Float32),
            ("count".to_string(), GridElementType::Int32),
        ];
        let grids = GridSet::allocate(GridShape::new(4, 5), &declarations);
        assert_eq!(grids.len(), 2);
        let temperature = grids.get("temperature").unwrap();
        assert_eq!(temperature.len(), 20);
        assert_eq!(temperature.nbytes(), 80);
        assert!(temperature.to_f64_vec().iter().all(|v| *v == 0.0));
        assert_eq!(grids.names().collect::<Vec<_>>(), vec!["count", "temperature"]);
    }

    #[test]
    fn test_set_from_f64_casts() {
        let mut buffer = GridBuffer::zeroed(GridElementType::Int16, 3);
        buffer.set_from_f64(&[1.9, -2.5, 40000.0]).unwrap();
        assert_eq!(buffer, GridBuffer::Int16(vec![1, -2, i16::MAX]));

        let err = buffer.set_from_f64(&[1.0]).unwrap_err();
        assert_eq!(err.category(), "UsageError");
    }
}
