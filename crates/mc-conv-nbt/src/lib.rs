//! NBT (Named Binary Tag) implementation shared by both save formats.
//!
//! Supports two byte orders over one grammar:
//! - **Little-endian**: key-value store records (sub-chunk palettes, block
//!   entities, actors, the body of the store's `level.dat`).
//! - **Big-endian**: region-file chunks and the Java `level.dat`.

pub mod error;
mod be;
mod io;
mod le;
pub mod tag;

pub use error::NbtError;
pub use tag::{CompoundExt, NbtCompound, NbtRoot, NbtTag};

use bytes::{Buf, BufMut};

/// Read little-endian NBT from a buffer.
pub fn read_nbt_le(buf: &mut impl Buf) -> Result<NbtRoot, NbtError> {
    io::read_nbt::<le::LeVariant>(buf)
}

/// Write little-endian NBT to a buffer.
pub fn write_nbt_le(buf: &mut impl BufMut, root: &NbtRoot) {
    io::write_nbt::<le::LeVariant>(buf, root)
}

/// Read every little-endian root compound concatenated in `buf`.
pub fn read_nbt_le_multi(buf: &mut impl Buf) -> Result<Vec<NbtRoot>, NbtError> {
    io::read_nbt_multi::<le::LeVariant>(buf)
}

/// Read big-endian NBT from a buffer.
pub fn read_nbt_be(buf: &mut impl Buf) -> Result<NbtRoot, NbtError> {
    io::read_nbt::<be::BeVariant>(buf)
}

/// Write big-endian NBT to a buffer.
pub fn write_nbt_be(buf: &mut impl BufMut, root: &NbtRoot) {
    io::write_nbt::<be::BeVariant>(buf, root)
}

/// Serialize an unnamed compound as little-endian NBT.
pub fn to_le_bytes(compound: &NbtCompound) -> Vec<u8> {
    let mut buf = Vec::new();
    write_nbt_le(&mut buf, &NbtRoot::new("", compound.clone()));
    buf
}

/// Serialize an unnamed compound as big-endian NBT.
pub fn to_be_bytes(compound: &NbtCompound) -> Vec<u8> {
    let mut buf = Vec::new();
    write_nbt_be(&mut buf, &NbtRoot::new("", compound.clone()));
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn roundtrip_le(root: &NbtRoot) {
        let mut buf = BytesMut::new();
        write_nbt_le(&mut buf, root);
        let decoded = read_nbt_le(&mut buf.freeze()).unwrap();
        assert_eq!(decoded, *root);
    }

    fn roundtrip_be(root: &NbtRoot) {
        let mut buf = BytesMut::new();
        write_nbt_be(&mut buf, root);
        let decoded = read_nbt_be(&mut buf.freeze()).unwrap();
        assert_eq!(decoded, *root);
    }

    fn sample() -> NbtRoot {
        let mut inner = NbtCompound::new();
        inner.insert("name".into(), NbtTag::String("Steve".into()));
        inner.insert("health".into(), NbtTag::Float(20.0));
        inner.insert("xp".into(), NbtTag::Int(1500));

        let mut c = NbtCompound::new();
        c.insert("player".into(), NbtTag::Compound(inner));
        c.insert("version".into(), NbtTag::Int(19133));
        c.insert("pos".into(), NbtTag::IntArray(vec![100, -200, 300]));
        c.insert("ticks".into(), NbtTag::LongArray(vec![i64::MIN, 0, i64::MAX]));
        c.insert("bytes".into(), NbtTag::ByteArray(vec![1, -2, 3]));
        c.insert("motion".into(), NbtTag::List(vec![NbtTag::Double(0.5), NbtTag::Double(-1.0)]));
        c.insert("empty".into(), NbtTag::List(vec![]));
        c.insert("short".into(), NbtTag::Short(-1234));
        c.insert("long".into(), NbtTag::Long(1 << 40));
        c.insert("text".into(), NbtTag::String("日本語".into()));
        NbtRoot::new("level", c)
    }

    #[test]
    fn le_empty_compound() {
        roundtrip_le(&NbtRoot::new("", NbtCompound::new()));
    }

    #[test]
    fn le_complex_structure() {
        roundtrip_le(&sample());
    }

    #[test]
    fn be_complex_structure() {
        roundtrip_be(&sample());
    }

    #[test]
    fn be_int_is_network_order() {
        let mut c = NbtCompound::new();
        c.insert("v".into(), NbtTag::Int(1));
        let mut buf = Vec::new();
        write_nbt_be(&mut buf, &NbtRoot::new("", c));
        // 0x0A, name len (2), TAG_Int, name len (2) "v", value
        assert_eq!(&buf[..3], &[0x0A, 0x00, 0x00]);
        assert_eq!(&buf[buf.len() - 5..buf.len() - 1], &[0, 0, 0, 1]);
    }

    #[test]
    fn le_and_be_differ() {
        let root = sample();
        let mut le_buf = Vec::new();
        write_nbt_le(&mut le_buf, &root);
        let mut be_buf = Vec::new();
        write_nbt_be(&mut be_buf, &root);
        assert_eq!(le_buf.len(), be_buf.len());
        assert_ne!(le_buf, be_buf);
    }

    #[test]
    fn serialization_is_deterministic() {
        // Insertion order must not leak into the bytes.
        let mut a = NbtCompound::new();
        a.insert("z".into(), NbtTag::Int(1));
        a.insert("a".into(), NbtTag::Int(2));
        let mut b = NbtCompound::new();
        b.insert("a".into(), NbtTag::Int(2));
        b.insert("z".into(), NbtTag::Int(1));
        assert_eq!(to_le_bytes(&a), to_le_bytes(&b));
    }

    #[test]
    fn multi_read_concatenated() {
        let mut a = NbtCompound::new();
        a.insert("id".into(), NbtTag::String("Chest".into()));
        let mut b = NbtCompound::new();
        b.insert("id".into(), NbtTag::String("Beacon".into()));
        let mut buf = to_le_bytes(&a);
        buf.extend_from_slice(&to_le_bytes(&b));
        let roots = read_nbt_le_multi(&mut buf.as_slice()).unwrap();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].compound, a);
        assert_eq!(roots[1].compound, b);
    }

    #[test]
    fn multi_read_truncated_is_error() {
        let mut a = NbtCompound::new();
        a.insert("id".into(), NbtTag::String("Chest".into()));
        let buf = to_le_bytes(&a);
        assert!(read_nbt_le_multi(&mut &buf[..buf.len() - 1]).is_err());
    }

    #[test]
    fn empty_buffer_error() {
        let data = bytes::Bytes::new();
        assert!(read_nbt_le(&mut data.clone()).is_err());
        assert!(read_nbt_be(&mut data.clone()).is_err());
    }

    #[test]
    fn wrong_root_type_error() {
        // TAG_Byte instead of TAG_Compound
        let data = bytes::Bytes::from_static(&[1]);
        assert!(matches!(
            read_nbt_le(&mut data.clone()),
            Err(NbtError::ExpectedCompound { got: 1 })
        ));
    }

    #[test]
    fn negative_length_rejected() {
        // root compound, empty name, TAG_Int_Array "a" with length -1
        let mut buf = vec![0x0A, 0x00, 0x00, 11, 0x00, 0x01, b'a'];
        buf.extend_from_slice(&(-1i32).to_be_bytes());
        assert!(matches!(
            read_nbt_be(&mut buf.as_slice()),
            Err(NbtError::NegativeLength(-1))
        ));
    }
}
