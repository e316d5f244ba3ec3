//! Guest memory access capability.
//!
//! Everything the bridge writes into or reads out of guest linear memory goes
//! through [`GuestMemory`]: byte/f32/f64 stores and loads at arbitrary
//! offsets, bulk float arrays, and fixed-length string loads (used for
//! element-id lookups).
//!
//! Two implementations:
//! - [`WasmMemory`], backed by an exported `wasmtime::Memory`. Used both from
//!   host-import closures (via `Caller`) and from the per-frame sync drivers
//!   (via the deck's own `Store`).
//! - `Vec<u8>`, a plain byte buffer. Used by unit tests so the sync drivers
//!   and bridge helpers can be exercised without a runtime.

use wasmtime::{AsContextMut, Memory};

/// Error for out-of-range or malformed guest memory access.
#[derive(Debug)]
pub enum MemoryError {
    /// The access would fall outside the guest's linear memory.
    OutOfBounds { addr: u32, len: usize },
    /// A string load produced bytes that are not valid UTF-8.
    InvalidUtf8 { addr: u32 },
}

impl core::fmt::Display for MemoryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MemoryError::OutOfBounds { addr, len } => {
                write!(f, "guest memory access out of bounds ({len} bytes at {addr:#x})")
            }
            MemoryError::InvalidUtf8 { addr } => {
                write!(f, "guest string at {addr:#x} is not valid UTF-8")
            }
        }
    }
}

impl std::error::Error for MemoryError {}

/// Byte-addressed access to guest-owned memory.
///
/// All multi-byte values are little-endian, matching WASM linear memory.
pub trait GuestMemory {
    fn store_bytes(&mut self, addr: u32, bytes: &[u8]) -> Result<(), MemoryError>;
    fn load_bytes(&self, addr: u32, out: &mut [u8]) -> Result<(), MemoryError>;

    fn store_u8(&mut self, addr: u32, value: u8) -> Result<(), MemoryError> {
        self.store_bytes(addr, &[value])
    }

    fn load_u8(&self, addr: u32) -> Result<u8, MemoryError> {
        let mut buf = [0u8; 1];
        self.load_bytes(addr, &mut buf)?;
        Ok(buf[0])
    }

    fn store_f32(&mut self, addr: u32, value: f32) -> Result<(), MemoryError> {
        self.store_bytes(addr, &value.to_le_bytes())
    }

    fn load_f32(&self, addr: u32) -> Result<f32, MemoryError> {
        let mut buf = [0u8; 4];
        self.load_bytes(addr, &mut buf)?;
        Ok(f32::from_le_bytes(buf))
    }

    fn store_f64(&mut self, addr: u32, value: f64) -> Result<(), MemoryError> {
        self.store_bytes(addr, &value.to_le_bytes())
    }

    fn load_f64(&self, addr: u32) -> Result<f64, MemoryError> {
        let mut buf = [0u8; 8];
        self.load_bytes(addr, &mut buf)?;
        Ok(f64::from_le_bytes(buf))
    }

    /// Store consecutive f64 values starting at `addr`.
    fn store_f64_array(&mut self, addr: u32, values: &[f64]) -> Result<(), MemoryError> {
        for (i, v) in values.iter().enumerate() {
            self.store_f64(addr + (i * 8) as u32, *v)?;
        }
        Ok(())
    }

    /// Load `len` consecutive f64 values starting at `addr`.
    fn load_f64_array(&self, addr: u32, len: usize) -> Result<Vec<f64>, MemoryError> {
        let mut out = Vec::with_capacity(len);
        for i in 0..len {
            out.push(self.load_f64(addr + (i * 8) as u32)?);
        }
        Ok(out)
    }

    /// Load a fixed-length UTF-8 string.
    fn load_string(&self, addr: u32, len: u32) -> Result<String, MemoryError> {
        let mut buf = vec![0u8; len as usize];
        self.load_bytes(addr, &mut buf)?;
        String::from_utf8(buf).map_err(|_| MemoryError::InvalidUtf8 { addr })
    }
}

/// [`GuestMemory`] over an exported `wasmtime::Memory`.
pub struct WasmMemory<'a, C: AsContextMut> {
    memory: Memory,
    cx: &'a mut C,
}

impl<'a, C: AsContextMut> WasmMemory<'a, C> {
    pub fn new(memory: Memory, cx: &'a mut C) -> Self {
        Self { memory, cx }
    }
}

impl<C: AsContextMut> GuestMemory for WasmMemory<'_, C> {
    fn store_bytes(&mut self, addr: u32, bytes: &[u8]) -> Result<(), MemoryError> {
        self.memory
            .write(&mut *self.cx, addr as usize, bytes)
            .map_err(|_| MemoryError::OutOfBounds { addr, len: bytes.len() })
    }

    fn load_bytes(&self, addr: u32, out: &mut [u8]) -> Result<(), MemoryError> {
        self.memory
            .read(&*self.cx, addr as usize, out)
            .map_err(|_| MemoryError::OutOfBounds { addr, len: out.len() })
    }
}

impl GuestMemory for Vec<u8> {
    fn store_bytes(&mut self, addr: u32, bytes: &[u8]) -> Result<(), MemoryError> {
        let start = addr as usize;
        let end = start
            .checked_add(bytes.len())
            .filter(|end| *end <= self.len())
            .ok_or(MemoryError::OutOfBounds { addr, len: bytes.len() })?;
        self[start..end].copy_from_slice(bytes);
        Ok(())
    }

    fn load_bytes(&self, addr: u32, out: &mut [u8]) -> Result<(), MemoryError> {
        let start = addr as usize;
        let end = start
            .checked_add(out.len())
            .filter(|end| *end <= self.len())
            .ok_or(MemoryError::OutOfBounds { addr, len: out.len() })?;
        out.copy_from_slice(&self[start..end]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_roundtrip() {
        let mut mem = vec![0u8; 64];
        mem.store_u8(0, 7).unwrap();
        mem.store_f32(4, -0.25).unwrap();
        mem.store_f64(8, 1234.5).unwrap();

        assert_eq!(mem.load_u8(0).unwrap(), 7);
        assert_eq!(mem.load_f32(4).unwrap(), -0.25);
        assert_eq!(mem.load_f64(8).unwrap(), 1234.5);
    }

    #[test]
    fn f64_array_roundtrip() {
        let mut mem = vec![0u8; 64];
        mem.store_f64_array(8, &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(mem.load_f64_array(8, 3).unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn string_load() {
        let mut mem = vec![0u8; 32];
        mem.store_bytes(4, b"main-canvas").unwrap();
        assert_eq!(mem.load_string(4, 11).unwrap(), "main-canvas");
    }

    #[test]
    fn out_of_bounds_is_an_error() {
        let mut mem = vec![0u8; 8];
        assert!(matches!(
            mem.store_f64(4, 1.0),
            Err(MemoryError::OutOfBounds { .. })
        ));
        assert!(mem.load_u8(8).is_err());
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let mut mem = vec![0u8; 8];
        mem.store_bytes(0, &[0xff, 0xfe]).unwrap();
        assert!(matches!(
            mem.load_string(0, 2),
            Err(MemoryError::InvalidUtf8 { .. })
        ));
    }
}
