//! Reading and writing single raw values through their format

use crate::descriptor::DataFormatBase;
use crate::dispatch::FormatVisitor;
use crate::error::{DataFormatError, Result};
use crate::types::{DataFormatType, Scalar};
use ivw_core::source_context;

fn check_size<T: DataFormatType>(len: usize) -> Result<()> {
    let expected = std::mem::size_of::<T>();
    if len == expected {
        Ok(())
    } else {
        Err(DataFormatError::BufferSize {
            format: T::ID.name().to_string(),
            expected,
            actual: len,
            context: source_context!(),
        })
    }
}

struct ReadValue<'a> {
    bytes: &'a [u8],
    normalized: bool,
}

impl FormatVisitor for ReadValue<'_> {
    type Output = Result<[f64; 4]>;

    fn visit<T: DataFormatType>(self) -> Self::Output {
        check_size::<T>(self.bytes.len())?;
        let value: T = bytemuck::pod_read_unaligned(self.bytes);
        let mut out = [0.0; 4];
        for (slot, c) in out.iter_mut().zip(value.components()) {
            *slot = if self.normalized {
                c.to_normalized_f64()
            } else {
                c.to_f64()
            };
        }
        Ok(out)
    }
}

struct WriteValue<'a> {
    value: [f64; 4],
    out: &'a mut [u8],
}

impl FormatVisitor for WriteValue<'_> {
    type Output = Result<()>;

    fn visit<T: DataFormatType>(self) -> Self::Output {
        check_size::<T>(self.out.len())?;
        let value = T::from_components(|i| T::Component::from_f64(self.value[i]));
        self.out.copy_from_slice(bytemuck::bytes_of(&value));
        Ok(())
    }
}

impl DataFormatBase {
    /// First component of the value stored in `bytes`
    pub fn value_to_f64(&self, bytes: &[u8]) -> Result<f64> {
        Ok(self.value_to_dvec4(bytes)?[0])
    }

    /// All components of the value, missing components are 0
    pub fn value_to_dvec4(&self, bytes: &[u8]) -> Result<[f64; 4]> {
        self.dispatch(ReadValue {
            bytes,
            normalized: false,
        })?
    }

    /// First component, integers mapped onto `[0, 1]`
    pub fn value_to_normalized_f64(&self, bytes: &[u8]) -> Result<f64> {
        Ok(self.value_to_normalized_dvec4(bytes)?[0])
    }

    pub fn value_to_normalized_dvec4(&self, bytes: &[u8]) -> Result<[f64; 4]> {
        self.dispatch(ReadValue {
            bytes,
            normalized: true,
        })?
    }

    /// Store `value` in every component of `out`
    pub fn f64_to_value(&self, value: f64, out: &mut [u8]) -> Result<()> {
        self.dvec4_to_value([value; 4], out)
    }

    /// Store the leading components of `value` in `out`; integer targets saturate
    pub fn dvec4_to_value(&self, value: [f64; 4], out: &mut [u8]) -> Result<()> {
        self.dispatch(WriteValue { value, out })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::DataFormatId;
    use half::f16;

    #[test]
    fn test_read_scalar() {
        let format = DataFormatBase::get_by_id(DataFormatId::Int16);
        let bytes = (-1234i16).to_ne_bytes();
        assert_eq!(format.value_to_f64(&bytes).unwrap(), -1234.0);
    }

    #[test]
    fn test_read_vector_pads_with_zero() {
        let format = DataFormatBase::get_by_id(DataFormatId::Vec2Float32);
        let value = [1.5f32, -2.0];
        let out = format.value_to_dvec4(bytemuck::bytes_of(&value)).unwrap();
        assert_eq!(out, [1.5, -2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_read_normalized() {
        let format = DataFormatBase::get_by_id(DataFormatId::Vec3UInt8);
        let out = format.value_to_normalized_dvec4(&[0, 255, 51]).unwrap();
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 1.0);
        assert!((out[2] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_write_saturates() {
        let format = DataFormatBase::get_by_id(DataFormatId::UInt8);
        let mut out = [0u8; 1];
        format.f64_to_value(512.0, &mut out).unwrap();
        assert_eq!(out, [255]);
    }

    #[test]
    fn test_write_half_vector() {
        let format = DataFormatBase::get_by_id(DataFormatId::Vec2Float16);
        let mut out = [0u8; 4];
        format.dvec4_to_value([0.5, 2.0, 9.0, 9.0], &mut out).unwrap();
        let value: [f16; 2] = bytemuck::pod_read_unaligned(&out);
        assert_eq!(value, [f16::from_f32(0.5), f16::from_f32(2.0)]);
    }

    #[test]
    fn test_buffer_size_mismatch() {
        let format = DataFormatBase::get_by_id(DataFormatId::Float64);
        let err = format.value_to_f64(&[0u8; 4]).unwrap_err();
        assert!(matches!(
            err,
            DataFormatError::BufferSize { expected: 8, actual: 4, .. }
        ));
    }

    #[test]
    fn test_not_specialized_cannot_convert() {
        assert!(DataFormatBase::get().value_to_f64(&[]).is_err());
    }
}
