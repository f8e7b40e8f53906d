use crate::error::{WireError, WireResult};

/// Cursor over a blob with the fixed-width and varint primitives the
/// decoder is built from. Tracks its offset so every failure names the
/// byte position it happened at.
#[derive(Debug)]
pub(crate) struct BlobReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BlobReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn offset(&self) -> u64 {
        self.pos as u64
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.pos == self.data.len()
    }

    pub(crate) fn corrupt(&self, reason: impl Into<String>) -> WireError {
        WireError::Corrupt {
            offset: self.offset(),
            reason: reason.into(),
        }
    }

    fn truncated(&self) -> WireError {
        WireError::Truncated {
            offset: self.offset(),
        }
    }

    pub(crate) fn read_exact(&mut self, len: usize) -> WireResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(self.truncated());
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub(crate) fn read_u8(&mut self) -> WireResult<u8> {
        let slice = self.read_exact(1)?;
        Ok(slice[0])
    }

    pub(crate) fn read_u32(&mut self) -> WireResult<u32> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.read_exact(4)?);
        Ok(u32::from_be_bytes(bytes))
    }

    pub(crate) fn read_u64(&mut self) -> WireResult<u64> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.read_exact(8)?);
        Ok(u64::from_be_bytes(bytes))
    }

    pub(crate) fn read_i32(&mut self) -> WireResult<i32> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.read_exact(4)?);
        Ok(i32::from_be_bytes(bytes))
    }

    pub(crate) fn read_i64(&mut self) -> WireResult<i64> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.read_exact(8)?);
        Ok(i64::from_be_bytes(bytes))
    }

    pub(crate) fn read_f32(&mut self) -> WireResult<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub(crate) fn read_f64(&mut self) -> WireResult<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    pub(crate) fn read_varint(&mut self) -> WireResult<u64> {
        let mut value: u64 = 0;
        let mut shift = 0;
        loop {
            let byte = self.read_u8()?;
            value |= ((byte & 0x7F) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift >= 64 {
                return Err(self.corrupt("varint overflow"));
            }
        }
    }

    /// Varint byte length followed by the bytes.
    pub(crate) fn read_bytes(&mut self) -> WireResult<&'a [u8]> {
        let len = self.read_varint()?;
        if len > self.remaining() as u64 {
            return Err(self.truncated());
        }
        self.read_exact(len as usize)
    }

    pub(crate) fn read_str(&mut self) -> WireResult<String> {
        let start = self.offset();
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| WireError::Corrupt {
            offset: start,
            reason: "string is not valid UTF-8".to_string(),
        })
    }
}
