//! Generic NBT read/write engine, parameterized by byte order.

use bytes::{Buf, BufMut};

use crate::error::NbtError;
use crate::tag::{NbtCompound, NbtRoot, NbtTag};

/// Maximum nesting depth to prevent stack overflow.
const MAX_DEPTH: usize = 512;

/// Abstraction over the two NBT byte orders.
pub(crate) trait NbtVariant {
    fn write_i16(buf: &mut impl BufMut, value: i16);
    fn read_i16(buf: &mut impl Buf) -> Result<i16, NbtError>;

    fn write_i32(buf: &mut impl BufMut, value: i32);
    fn read_i32(buf: &mut impl Buf) -> Result<i32, NbtError>;

    fn write_i64(buf: &mut impl BufMut, value: i64);
    fn read_i64(buf: &mut impl Buf) -> Result<i64, NbtError>;

    fn write_f32(buf: &mut impl BufMut, value: f32);
    fn read_f32(buf: &mut impl Buf) -> Result<f32, NbtError>;

    fn write_f64(buf: &mut impl BufMut, value: f64);
    fn read_f64(buf: &mut impl Buf) -> Result<f64, NbtError>;

    fn write_string_len(buf: &mut impl BufMut, len: u16);
    fn read_string_len(buf: &mut impl Buf) -> Result<usize, NbtError>;
}

// -----------------------------------------------------------------------
// Reading
// -----------------------------------------------------------------------

pub(crate) fn read_nbt<V: NbtVariant>(buf: &mut impl Buf) -> Result<NbtRoot, NbtError> {
    if !buf.has_remaining() {
        return Err(NbtError::UnexpectedEof);
    }
    let tag_type = buf.get_u8();
    if tag_type != 10 {
        return Err(NbtError::ExpectedCompound { got: tag_type });
    }
    let name = read_string::<V>(buf)?;
    let compound = read_compound::<V>(buf, 0)?;
    Ok(NbtRoot { name, compound })
}

/// Read root compounds back to back until the buffer is exhausted.
pub(crate) fn read_nbt_multi<V: NbtVariant>(
    buf: &mut impl Buf,
) -> Result<Vec<NbtRoot>, NbtError> {
    let mut roots = Vec::new();
    while buf.has_remaining() {
        roots.push(read_nbt::<V>(buf)?);
    }
    Ok(roots)
}

fn read_tag<V: NbtVariant>(
    buf: &mut impl Buf,
    tag_type: u8,
    depth: usize,
) -> Result<NbtTag, NbtError> {
    if depth > MAX_DEPTH {
        return Err(NbtError::NestingTooDeep { limit: MAX_DEPTH });
    }

    match tag_type {
        1 => {
            ensure_remaining(buf, 1)?;
            Ok(NbtTag::Byte(buf.get_i8()))
        }
        2 => Ok(NbtTag::Short(V::read_i16(buf)?)),
        3 => Ok(NbtTag::Int(V::read_i32(buf)?)),
        4 => Ok(NbtTag::Long(V::read_i64(buf)?)),
        5 => Ok(NbtTag::Float(V::read_f32(buf)?)),
        6 => Ok(NbtTag::Double(V::read_f64(buf)?)),
        7 => {
            let len = read_len::<V>(buf)?;
            ensure_remaining(buf, len)?;
            let mut arr = Vec::with_capacity(len);
            for _ in 0..len {
                arr.push(buf.get_i8());
            }
            Ok(NbtTag::ByteArray(arr))
        }
        8 => Ok(NbtTag::String(read_string::<V>(buf)?)),
        9 => {
            ensure_remaining(buf, 1)?;
            let element_type = buf.get_u8();
            let len = read_len::<V>(buf)?;
            if element_type == 0 && len > 0 {
                return Err(NbtError::UnknownTagType(0));
            }
            let mut list = Vec::with_capacity(len.min(buf.remaining()));
            for _ in 0..len {
                list.push(read_tag::<V>(buf, element_type, depth + 1)?);
            }
            Ok(NbtTag::List(list))
        }
        10 => Ok(NbtTag::Compound(read_compound::<V>(buf, depth + 1)?)),
        11 => {
            let len = read_len::<V>(buf)?;
            ensure_remaining(buf, len.saturating_mul(4))?;
            let mut arr = Vec::with_capacity(len);
            for _ in 0..len {
                arr.push(V::read_i32(buf)?);
            }
            Ok(NbtTag::IntArray(arr))
        }
        12 => {
            let len = read_len::<V>(buf)?;
            ensure_remaining(buf, len.saturating_mul(8))?;
            let mut arr = Vec::with_capacity(len);
            for _ in 0..len {
                arr.push(V::read_i64(buf)?);
            }
            Ok(NbtTag::LongArray(arr))
        }
        _ => Err(NbtError::UnknownTagType(tag_type)),
    }
}

fn read_len<V: NbtVariant>(buf: &mut impl Buf) -> Result<usize, NbtError> {
    let len = V::read_i32(buf)?;
    if len < 0 {
        return Err(NbtError::NegativeLength(len));
    }
    Ok(len as usize)
}

fn read_compound<V: NbtVariant>(buf: &mut impl Buf, depth: usize) -> Result<NbtCompound, NbtError> {
    if depth > MAX_DEPTH {
        return Err(NbtError::NestingTooDeep { limit: MAX_DEPTH });
    }
    let mut map = NbtCompound::new();
    loop {
        ensure_remaining(buf, 1)?;
        let tag_type = buf.get_u8();
        if tag_type == 0 {
            break; // TAG_End
        }
        let name = read_string::<V>(buf)?;
        let tag = read_tag::<V>(buf, tag_type, depth)?;
        map.insert(name, tag);
    }
    Ok(map)
}

fn read_string<V: NbtVariant>(buf: &mut impl Buf) -> Result<String, NbtError> {
    let len = V::read_string_len(buf)?;
    ensure_remaining(buf, len)?;
    let data = buf.copy_to_bytes(len);
    String::from_utf8(data.to_vec()).map_err(|_| NbtError::InvalidUtf8)
}

fn ensure_remaining(buf: &impl Buf, needed: usize) -> Result<(), NbtError> {
    if buf.remaining() < needed {
        Err(NbtError::UnexpectedEof)
    } else {
        Ok(())
    }
}

// -----------------------------------------------------------------------
// Writing
// -----------------------------------------------------------------------

pub(crate) fn write_nbt<V: NbtVariant>(buf: &mut impl BufMut, root: &NbtRoot) {
    buf.put_u8(10); // TAG_Compound
    write_string::<V>(buf, &root.name);
    write_compound::<V>(buf, &root.compound);
}

fn write_tag<V: NbtVariant>(buf: &mut impl BufMut, tag: &NbtTag) {
    match tag {
        NbtTag::Byte(v) => buf.put_i8(*v),
        NbtTag::Short(v) => V::write_i16(buf, *v),
        NbtTag::Int(v) => V::write_i32(buf, *v),
        NbtTag::Long(v) => V::write_i64(buf, *v),
        NbtTag::Float(v) => V::write_f32(buf, *v),
        NbtTag::Double(v) => V::write_f64(buf, *v),
        NbtTag::ByteArray(arr) => {
            V::write_i32(buf, arr.len() as i32);
            for &b in arr {
                buf.put_i8(b);
            }
        }
        NbtTag::String(s) => write_string::<V>(buf, s),
        NbtTag::List(list) => {
            if list.is_empty() {
                buf.put_u8(0); // TAG_End type for empty list
                V::write_i32(buf, 0);
            } else {
                buf.put_u8(list[0].tag_type_id());
                V::write_i32(buf, list.len() as i32);
                for item in list {
                    write_tag::<V>(buf, item);
                }
            }
        }
        NbtTag::Compound(map) => write_compound::<V>(buf, map),
        NbtTag::IntArray(arr) => {
            V::write_i32(buf, arr.len() as i32);
            for &v in arr {
                V::write_i32(buf, v);
            }
        }
        NbtTag::LongArray(arr) => {
            V::write_i32(buf, arr.len() as i32);
            for &v in arr {
                V::write_i64(buf, v);
            }
        }
    }
}

fn write_compound<V: NbtVariant>(buf: &mut impl BufMut, map: &NbtCompound) {
    for (name, tag) in map {
        buf.put_u8(tag.tag_type_id());
        write_string::<V>(buf, name);
        write_tag::<V>(buf, tag);
    }
    buf.put_u8(0); // TAG_End
}

fn write_string<V: NbtVariant>(buf: &mut impl BufMut, s: &str) {
    // Lengths are u16; cut overlong strings at the last char boundary that fits.
    let mut end = s.len().min(u16::MAX as usize);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    V::write_string_len(buf, end as u16);
    buf.put_slice(&s.as_bytes()[..end]);
}
