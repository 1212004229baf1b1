//! Sample encodings: the element-type contract between caller arrays and driver entry points.
//!
//! Reader and writer methods are generic over the caller's element type `T: Sample`, and each
//! method names the one element type its encoding requires (`read_int16` requires `i16`, ...).
//! [`cast_slice_mut`] and [`cast_slice`] check that contract at run time and fail with a
//! `TypeError` naming the required [`Dtype`] when the caller passed anything else.
//!
//! [`BinarySample`] and [`PortSample`] select the driver entry point for the integer encodings
//! by wrapping a slice in the matching buffer enum.

use ndarray::{ArrayBase, Data, DataMut, Dimension};
use std::any::TypeId;
use std::fmt;

use crate::error::{DaqError, Result};
use crate::interpreter::{BinaryBuffer, BinaryBufferMut, PortBuffer, PortBufferMut};

/// Element type tag, displayed with the conventional array dtype names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dtype {
    Bool,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Uint64,
    Float64,
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dtype::Bool => "bool",
            Dtype::Uint8 => "uint8",
            Dtype::Int16 => "int16",
            Dtype::Uint16 => "uint16",
            Dtype::Int32 => "int32",
            Dtype::Uint32 => "uint32",
            Dtype::Uint64 => "uint64",
            Dtype::Float64 => "float64",
        };
        write!(f, "{}", name)
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Element types a sample array may have.
pub trait Sample: sealed::Sealed + Copy + Default + fmt::Debug + 'static {
    const DTYPE: Dtype;
}

macro_rules! sample {
    ($($ty:ty => $dtype:ident),+ $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}
            impl Sample for $ty {
                const DTYPE: Dtype = Dtype::$dtype;
            }
        )+
    };
}

sample! {
    bool => Bool,
    u8 => Uint8,
    i16 => Int16,
    u16 => Uint16,
    i32 => Int32,
    u32 => Uint32,
    u64 => Uint64,
    f64 => Float64,
}

fn dtype_error(required: Dtype, actual: Dtype) -> DaqError {
    DaqError::type_error(format!(
        "The datatype of the array must be {required}, but an array of {actual} was provided."
    ))
}

/// Views `data` as `[U]`, failing unless `T` is `U`.
pub fn cast_slice_mut<T: Sample, U: Sample>(data: &mut [T]) -> Result<&mut [U]> {
    if TypeId::of::<T>() != TypeId::of::<U>() {
        return Err(dtype_error(U::DTYPE, T::DTYPE));
    }
    // SAFETY: `T` and `U` are the same type.
    Ok(unsafe { std::slice::from_raw_parts_mut(data.as_mut_ptr() as *mut U, data.len()) })
}

/// Views `data` as `[U]`, failing unless `T` is `U`.
pub fn cast_slice<T: Sample, U: Sample>(data: &[T]) -> Result<&[U]> {
    if TypeId::of::<T>() != TypeId::of::<U>() {
        return Err(dtype_error(U::DTYPE, T::DTYPE));
    }
    // SAFETY: `T` and `U` are the same type.
    Ok(unsafe { std::slice::from_raw_parts(data.as_ptr() as *const U, data.len()) })
}

/// Checks the dtype contract without converting.
pub fn require_dtype<T: Sample, U: Sample>() -> Result<()> {
    if TypeId::of::<T>() != TypeId::of::<U>() {
        return Err(dtype_error(U::DTYPE, T::DTYPE));
    }
    Ok(())
}

/// Contiguous storage of a standard-layout (row-major) array.
pub fn contiguous_mut<S, D>(array: &mut ArrayBase<S, D>) -> Result<&mut [S::Elem]>
where
    S: DataMut,
    D: Dimension,
{
    array
        .as_slice_mut()
        .ok_or_else(|| DaqError::type_error("The array must be contiguous and in standard (row-major) layout."))
}

pub fn contiguous<S, D>(array: &ArrayBase<S, D>) -> Result<&[S::Elem]>
where
    S: Data,
    D: Dimension,
{
    array
        .as_slice()
        .ok_or_else(|| DaqError::type_error("The array must be contiguous and in standard (row-major) layout."))
}

/// Integer encodings of unscaled analog codes.
pub trait BinarySample: Sample {
    fn buffer_mut(data: &mut [Self]) -> BinaryBufferMut<'_>;
    fn buffer(data: &[Self]) -> BinaryBuffer<'_>;
}

impl BinarySample for i16 {
    fn buffer_mut(data: &mut [Self]) -> BinaryBufferMut<'_> {
        BinaryBufferMut::I16(data)
    }

    fn buffer(data: &[Self]) -> BinaryBuffer<'_> {
        BinaryBuffer::I16(data)
    }
}

impl BinarySample for u16 {
    fn buffer_mut(data: &mut [Self]) -> BinaryBufferMut<'_> {
        BinaryBufferMut::U16(data)
    }

    fn buffer(data: &[Self]) -> BinaryBuffer<'_> {
        BinaryBuffer::U16(data)
    }
}

impl BinarySample for i32 {
    fn buffer_mut(data: &mut [Self]) -> BinaryBufferMut<'_> {
        BinaryBufferMut::I32(data)
    }

    fn buffer(data: &[Self]) -> BinaryBuffer<'_> {
        BinaryBuffer::I32(data)
    }
}

impl BinarySample for u32 {
    fn buffer_mut(data: &mut [Self]) -> BinaryBufferMut<'_> {
        BinaryBufferMut::U32(data)
    }

    fn buffer(data: &[Self]) -> BinaryBuffer<'_> {
        BinaryBuffer::U32(data)
    }
}

/// Packed port encodings.
pub trait PortSample: Sample {
    fn buffer_mut(data: &mut [Self]) -> PortBufferMut<'_>;
    fn buffer(data: &[Self]) -> PortBuffer<'_>;
}

impl PortSample for u8 {
    fn buffer_mut(data: &mut [Self]) -> PortBufferMut<'_> {
        PortBufferMut::U8(data)
    }

    fn buffer(data: &[Self]) -> PortBuffer<'_> {
        PortBuffer::U8(data)
    }
}

impl PortSample for u16 {
    fn buffer_mut(data: &mut [Self]) -> PortBufferMut<'_> {
        PortBufferMut::U16(data)
    }

    fn buffer(data: &[Self]) -> PortBuffer<'_> {
        PortBuffer::U16(data)
    }
}

impl PortSample for u32 {
    fn buffer_mut(data: &mut [Self]) -> PortBufferMut<'_> {
        PortBufferMut::U32(data)
    }

    fn buffer(data: &[Self]) -> PortBuffer<'_> {
        PortBuffer::U32(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{s, Array2};

    #[test]
    fn matching_dtype_casts_in_place() {
        let mut data = [1i16, 2, 3];
        let cast: &mut [i16] = cast_slice_mut::<i16, i16>(&mut data).unwrap();
        cast[0] = 7;
        assert_eq!(data, [7, 2, 3]);
    }

    #[test]
    fn mismatched_dtype_names_required_type() {
        let mut data = [0.0f64; 4];
        let err = cast_slice_mut::<f64, i16>(&mut data).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("int16"), "{message}");
        assert!(message.contains("float64"), "{message}");
        assert!(matches!(err, DaqError::TypeError { .. }));
    }

    #[test]
    fn dtype_names() {
        assert_eq!(Dtype::Uint32.to_string(), "uint32");
        assert_eq!(<bool as Sample>::DTYPE.to_string(), "bool");
    }

    #[test]
    fn non_standard_layout_is_rejected() {
        let mut data = Array2::<f64>::zeros((3, 4));
        assert_eq!(contiguous_mut(&mut data).unwrap().len(), 12);
        let mut transposed = data.view_mut().reversed_axes();
        assert!(contiguous_mut(&mut transposed).is_err());
        let column = data.slice(s![.., 1]);
        assert!(contiguous(&column).is_err());
    }
}
