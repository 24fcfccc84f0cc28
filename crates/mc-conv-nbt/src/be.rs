//! Big-endian NBT flavor (region-file chunks, Java `level.dat`).

use bytes::{Buf, BufMut};

use crate::error::NbtError;
use crate::io::NbtVariant;

pub(crate) struct BeVariant;

impl NbtVariant for BeVariant {
    fn write_i16(buf: &mut impl BufMut, value: i16) {
        buf.put_i16(value);
    }

    fn read_i16(buf: &mut impl Buf) -> Result<i16, NbtError> {
        if buf.remaining() < 2 {
            return Err(NbtError::UnexpectedEof);
        }
        Ok(buf.get_i16())
    }

    fn write_i32(buf: &mut impl BufMut, value: i32) {
        buf.put_i32(value);
    }

    fn read_i32(buf: &mut impl Buf) -> Result<i32, NbtError> {
        if buf.remaining() < 4 {
            return Err(NbtError::UnexpectedEof);
        }
        Ok(buf.get_i32())
    }

    fn write_i64(buf: &mut impl BufMut, value: i64) {
        buf.put_i64(value);
    }

    fn read_i64(buf: &mut impl Buf) -> Result<i64, NbtError> {
        if buf.remaining() < 8 {
            return Err(NbtError::UnexpectedEof);
        }
        Ok(buf.get_i64())
    }

    fn write_f32(buf: &mut impl BufMut, value: f32) {
        buf.put_f32(value);
    }

    fn read_f32(buf: &mut impl Buf) -> Result<f32, NbtError> {
        if buf.remaining() < 4 {
            return Err(NbtError::UnexpectedEof);
        }
        Ok(buf.get_f32())
    }

    fn write_f64(buf: &mut impl BufMut, value: f64) {
        buf.put_f64(value);
    }

    fn read_f64(buf: &mut impl Buf) -> Result<f64, NbtError> {
        if buf.remaining() < 8 {
            return Err(NbtError::UnexpectedEof);
        }
        Ok(buf.get_f64())
    }

    fn write_string_len(buf: &mut impl BufMut, len: u16) {
        buf.put_u16(len);
    }

    fn read_string_len(buf: &mut impl Buf) -> Result<usize, NbtError> {
        if buf.remaining() < 2 {
            return Err(NbtError::UnexpectedEof);
        }
        Ok(buf.get_u16() as usize)
    }
}
