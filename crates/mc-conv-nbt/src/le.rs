//! Little-endian NBT flavor (key-value store records: sub-chunk palettes,
//! block entities, actors, level.dat body).

use bytes::{Buf, BufMut};

use crate::error::NbtError;
use crate::io::NbtVariant;

pub(crate) struct LeVariant;

impl NbtVariant for LeVariant {
    fn write_i16(buf: &mut impl BufMut, value: i16) {
        buf.put_i16_le(value);
    }

    fn read_i16(buf: &mut impl Buf) -> Result<i16, NbtError> {
        if buf.remaining() < 2 {
            return Err(NbtError::UnexpectedEof);
        }
        Ok(buf.get_i16_le())
    }

    fn write_i32(buf: &mut impl BufMut, value: i32) {
        buf.put_i32_le(value);
    }

    fn read_i32(buf: &mut impl Buf) -> Result<i32, NbtError> {
        if buf.remaining() < 4 {
            return Err(NbtError::UnexpectedEof);
        }
        Ok(buf.get_i32_le())
    }

    fn write_i64(buf: &mut impl BufMut, value: i64) {
        buf.put_i64_le(value);
    }

    fn read_i64(buf: &mut impl Buf) -> Result<i64, NbtError> {
        if buf.remaining() < 8 {
            return Err(NbtError::UnexpectedEof);
        }
        Ok(buf.get_i64_le())
    }

    fn write_f32(buf: &mut impl BufMut, value: f32) {
        buf.put_f32_le(value);
    }

    fn read_f32(buf: &mut impl Buf) -> Result<f32, NbtError> {
        if buf.remaining() < 4 {
            return Err(NbtError::UnexpectedEof);
        }
        Ok(buf.get_f32_le())
    }

    fn write_f64(buf: &mut impl BufMut, value: f64) {
        buf.put_f64_le(value);
    }

    fn read_f64(buf: &mut impl Buf) -> Result<f64, NbtError> {
        if buf.remaining() < 8 {
            return Err(NbtError::UnexpectedEof);
        }
        Ok(buf.get_f64_le())
    }

    fn write_string_len(buf: &mut impl BufMut, len: u16) {
        buf.put_u16_le(len);
    }

    fn read_string_len(buf: &mut impl Buf) -> Result<usize, NbtError> {
        if buf.remaining() < 2 {
            return Err(NbtError::UnexpectedEof);
        }
        Ok(buf.get_u16_le() as usize)
    }
}
