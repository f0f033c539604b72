//! Big-endian byte cursor used by every packed payload.
//!
//! The wire formats are tightly packed (3-byte rate bumps, 2-byte deltas,
//! 10-byte tags), so reads are explicit about width rather than going
//! through a general serializer.

use crate::{Address, FusionError, Result};

/// Read cursor over a packed byte payload.
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
    context: &'static str,
}

impl<'a> ByteReader<'a> {
    /// `context` names the payload in error messages.
    #[must_use]
    pub fn new(buf: &'a [u8], context: &'static str) -> Self {
        Self {
            buf,
            pos: 0,
            context,
        }
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(FusionError::malformed(
                self.context,
                format!(
                    "need {len} bytes at offset {}, only {} left",
                    self.pos,
                    self.remaining()
                ),
            ));
        }
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    /// 3-byte big-endian integer.
    pub fn read_u24(&mut self) -> Result<u32> {
        let [a, b, c] = self.read_array::<3>()?;
        Ok(u32::from_be_bytes([0, a, b, c]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    pub fn read_u128(&mut self) -> Result<u128> {
        Ok(u128::from_be_bytes(self.read_array()?))
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(FusionError::malformed(
                self.context,
                format!("flag byte must be 0 or 1, got {other}"),
            )),
        }
    }

    pub fn read_address(&mut self) -> Result<Address> {
        Ok(Address::from(self.read_array::<20>()?))
    }

    /// Length-prefixed (u16) byte string.
    pub fn read_bytes_u16(&mut self) -> Result<&'a [u8]> {
        let len = usize::from(self.read_u16()?);
        self.read_bytes(len)
    }

    /// Length-prefixed (u32) byte string.
    pub fn read_bytes_u32(&mut self) -> Result<&'a [u8]> {
        let len = usize::try_from(self.read_u32()?)
            .map_err(|_| FusionError::malformed(self.context, "length prefix too large"))?;
        self.read_bytes(len)
    }

    /// Everything not yet consumed.
    pub fn rest(&mut self) -> &'a [u8] {
        let out = &self.buf[self.pos..];
        self.pos = self.buf.len();
        out
    }

    /// Fail if any bytes are left over.
    pub fn finish(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(FusionError::malformed(
                self.context,
                format!("{} trailing bytes", self.remaining()),
            ))
        }
    }
}

/// Append-only writer producing the same layouts [`ByteReader`] consumes.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn put_u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Low three bytes of `v`, big-endian.
    pub fn put_u24(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes()[1..]);
        self
    }

    pub fn put_u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn put_u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn put_u128(&mut self, v: u128) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn put_bool(&mut self, v: bool) -> &mut Self {
        self.put_u8(u8::from(v))
    }

    pub fn put_address(&mut self, a: &Address) -> &mut Self {
        self.buf.extend_from_slice(a.as_slice());
        self
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// u16 length prefix followed by the bytes.
    pub fn put_bytes_u16(&mut self, bytes: &[u8], context: &'static str) -> Result<&mut Self> {
        let len = u16::try_from(bytes.len())
            .map_err(|_| FusionError::malformed(context, "segment longer than 65535 bytes"))?;
        self.put_u16(len);
        Ok(self.put_bytes(bytes))
    }

    /// u32 length prefix followed by the bytes.
    pub fn put_bytes_u32(&mut self, bytes: &[u8], context: &'static str) -> Result<&mut Self> {
        let len = u32::try_from(bytes.len())
            .map_err(|_| FusionError::malformed(context, "segment longer than u32::MAX bytes"))?;
        self.put_u32(len);
        Ok(self.put_bytes(bytes))
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
