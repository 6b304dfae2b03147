//! Forward-only typed reads over a packet buffer
//!
//! The Project CARS broadcast mixes byte orders: integers are big-endian while
//! every float is little-endian. The cursor reproduces that exactly.

use tracing::trace;

use crate::error::DecodeError;

/// Sequential reader over a borrowed byte buffer.
///
/// Every read advances the offset by its width. A read that would run past the
/// end of the buffer fails with [`DecodeError::Truncated`] and leaves the offset
/// untouched.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Current read position.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, width: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.offset.checked_add(width).filter(|end| *end <= self.data.len()).ok_or(
            DecodeError::Truncated { offset: self.offset, needed: width, len: self.data.len() },
        )?;
        let bytes = &self.data[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, DecodeError> {
        Ok(i8::from_be_bytes(self.take_array()?))
    }

    /// Big-endian unsigned 16-bit integer.
    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_be_bytes(self.take_array()?))
    }

    /// Big-endian signed 16-bit integer.
    pub fn read_i16(&mut self) -> Result<i16, DecodeError> {
        Ok(i16::from_be_bytes(self.take_array()?))
    }

    /// Little-endian IEEE 754 single precision float.
    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_le_bytes(self.take_array()?))
    }

    /// Read `N` consecutive values with the given element reader.
    pub fn read_array<T, const N: usize>(
        &mut self,
        read: impl Fn(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<[T; N], DecodeError>
    where
        T: Copy + Default,
    {
        let mut out = [T::default(); N];
        for slot in out.iter_mut() {
            *slot = read(self)?;
        }
        Ok(out)
    }

    /// Read a fixed-width, NUL-terminated UTF-8 string.
    ///
    /// The whole slot is decoded first and then cut at the first NUL. A slot
    /// that is not valid UTF-8 yields an empty string instead of failing the
    /// packet.
    pub fn read_string(&mut self, width: usize) -> Result<String, DecodeError> {
        let start = self.offset;
        let bytes = self.take(width)?;
        match std::str::from_utf8(bytes) {
            Ok(text) => Ok(text.split('\0').next().unwrap_or_default().to_string()),
            Err(e) => {
                trace!("Discarding {}-byte string slot at offset {}: {}", width, start, e);
                Ok(String::new())
            }
        }
    }

    /// Skip `width` bytes without interpreting them.
    pub fn skip(&mut self, width: usize) -> Result<(), DecodeError> {
        self.take(width).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn integers_are_big_endian_and_floats_little_endian() {
        let mut data = vec![0x12, 0x34, 0xFF, 0xFE];
        data.extend_from_slice(&1.5f32.to_le_bytes());
        let mut cursor = ByteCursor::new(&data);

        assert_eq!(cursor.read_u16().unwrap(), 0x1234);
        assert_eq!(cursor.read_i16().unwrap(), -2);
        assert_eq!(cursor.read_f32().unwrap(), 1.5);
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn reading_past_the_end_fails_without_advancing() {
        let data = [0x01, 0x02, 0x03];
        let mut cursor = ByteCursor::new(&data);
        cursor.read_u16().unwrap();

        let err = cursor.read_f32().unwrap_err();
        assert_eq!(err, DecodeError::Truncated { offset: 2, needed: 4, len: 3 });
        assert_eq!(cursor.offset(), 2);
        assert_eq!(cursor.read_u8().unwrap(), 0x03);
    }

    #[test]
    fn strings_stop_at_first_nul() {
        let mut slot = [0u8; 64];
        slot[..5].copy_from_slice(b"Alice");
        slot[6..9].copy_from_slice(b"xyz");
        let mut cursor = ByteCursor::new(&slot);

        assert_eq!(cursor.read_string(64).unwrap(), "Alice");
        assert_eq!(cursor.offset(), 64);
    }

    #[test]
    fn invalid_utf8_yields_empty_string() {
        let mut slot = [0u8; 8];
        slot[0] = b'A';
        slot[1] = 0xC3; // lead byte with no continuation
        let mut cursor = ByteCursor::new(&slot);

        assert_eq!(cursor.read_string(8).unwrap(), "");
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn arrays_read_in_order() {
        let data = [0x00, 0x01, 0x00, 0x02, 0xFF, 0xFF];
        let mut cursor = ByteCursor::new(&data);
        let values: [u16; 3] = cursor.read_array(ByteCursor::read_u16).unwrap();
        assert_eq!(values, [1, 2, 0xFFFF]);
    }

    proptest! {
        #[test]
        fn reads_never_panic_on_arbitrary_buffers(
            data in prop::collection::vec(any::<u8>(), 0..64),
            widths in prop::collection::vec(0usize..5, 0..32)
        ) {
            let mut cursor = ByteCursor::new(&data);
            for width in widths {
                let before = cursor.offset();
                let result = match width {
                    0 => cursor.read_u8().map(|_| ()),
                    1 => cursor.read_i16().map(|_| ()),
                    2 => cursor.read_f32().map(|_| ()),
                    3 => cursor.read_string(7).map(|_| ()),
                    _ => cursor.skip(3),
                };
                if result.is_err() {
                    prop_assert_eq!(cursor.offset(), before);
                }
                prop_assert!(cursor.offset() <= data.len());
            }
        }
    }
}
