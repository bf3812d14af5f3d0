use std::ops::Range;

use crate::Fault;

/// Bounds-checked view over a guest's linear memory.
///
/// Offsets and lengths arrive as raw `i32`s from guest code. Every span is
/// bounds-checked first; an in-range span at offset zero is the guest's null
/// pointer and marks an absent value. Readers for required values report it
/// as missing, `read_opt_*` readers return `None`. Every failed access leaves
/// memory untouched.
pub struct GuestMemory<'a> {
    data: &'a mut [u8],
}

impl<'a> GuestMemory<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    fn span(&self, offset: i32, len: i32) -> Result<Range<usize>, Fault> {
        if offset < 0 || len < 0 {
            return Err(Fault::memory(format!(
                "invalid span (offset {offset}, length {len})"
            )));
        }
        let start = offset as usize;
        let end = start
            .checked_add(len as usize)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                Fault::memory(format!(
                    "span {start}..{} exceeds guest memory of {} bytes",
                    start as u64 + len as u64,
                    self.data.len()
                ))
            })?;
        Ok(start..end)
    }

    pub fn read_bytes(&self, offset: i32, len: i32) -> Result<&[u8], Fault> {
        self.read_opt_bytes(offset, len)?
            .ok_or_else(|| Fault::missing("required byte span is null"))
    }

    pub fn read_opt_bytes(&self, offset: i32, len: i32) -> Result<Option<&[u8]>, Fault> {
        let range = self.span(offset, len)?;
        if offset == 0 {
            return Ok(None);
        }
        Ok(Some(&self.data[range]))
    }

    pub fn read_str(&self, offset: i32, len: i32) -> Result<&str, Fault> {
        self.read_opt_str(offset, len)?
            .ok_or_else(|| Fault::missing("required string span is null"))
    }

    pub fn read_opt_str(&self, offset: i32, len: i32) -> Result<Option<&str>, Fault> {
        let Some(bytes) = self.read_opt_bytes(offset, len)? else {
            return Ok(None);
        };
        std::str::from_utf8(bytes)
            .map(Some)
            .map_err(|err| Fault::memory(format!("span at {offset} is not valid UTF-8: {err}")))
    }

    fn read_array<const N: usize>(&self, offset: i32) -> Result<[u8; N], Fault> {
        let range = self.span(offset, N as i32)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[range]);
        Ok(out)
    }

    pub fn read_i32(&self, offset: i32) -> Result<i32, Fault> {
        self.read_array(offset).map(i32::from_le_bytes)
    }

    pub fn read_u32(&self, offset: i32) -> Result<u32, Fault> {
        self.read_array(offset).map(u32::from_le_bytes)
    }

    pub fn read_i64(&self, offset: i32) -> Result<i64, Fault> {
        self.read_array(offset).map(i64::from_le_bytes)
    }

    pub fn read_f64(&self, offset: i32) -> Result<f64, Fault> {
        self.read_array(offset).map(f64::from_le_bytes)
    }

    pub fn write_bytes(&mut self, offset: i32, bytes: &[u8]) -> Result<(), Fault> {
        let len = i32::try_from(bytes.len())
            .map_err(|_| Fault::memory(format!("{} bytes exceed the guest span limit", bytes.len())))?;
        let range = self.span(offset, len)?;
        if offset == 0 {
            return Err(Fault::missing("destination pointer is null"));
        }
        self.data[range].copy_from_slice(bytes);
        Ok(())
    }

    pub fn write_i32(&mut self, offset: i32, value: i32) -> Result<(), Fault> {
        self.write_bytes(offset, &value.to_le_bytes())
    }

    pub fn write_i64(&mut self, offset: i32, value: i64) -> Result<(), Fault> {
        self.write_bytes(offset, &value.to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FaultKind;
    use proptest::prelude::*;

    #[test]
    fn reads_strings_in_bounds() {
        let mut data = vec![0u8; 32];
        data[8..13].copy_from_slice(b"hello");
        let memory = GuestMemory::new(&mut data);
        assert_eq!(memory.read_str(8, 5).unwrap(), "hello");
        assert_eq!(memory.read_opt_str(0, 5).unwrap(), None);
        assert_eq!(memory.read_str(8, 0).unwrap(), "");
    }

    #[test]
    fn null_required_span_is_missing() {
        let mut data = vec![0u8; 8];
        let memory = GuestMemory::new(&mut data);
        assert_eq!(memory.read_str(0, 4).unwrap_err().kind, FaultKind::NullOrMissing);
    }

    #[test]
    fn null_span_past_the_end_is_a_memory_fault() {
        let mut data = vec![7u8; 64];
        let mut memory = GuestMemory::new(&mut data);
        assert_eq!(memory.read_bytes(0, 1_000_000).unwrap_err().kind, FaultKind::MemoryFault);
        assert_eq!(memory.read_opt_str(0, 65).unwrap_err().kind, FaultKind::MemoryFault);
        assert_eq!(memory.write_bytes(0, &[0; 1000]).unwrap_err().kind, FaultKind::MemoryFault);
        assert_eq!(memory.write_bytes(0, &[0; 4]).unwrap_err().kind, FaultKind::NullOrMissing);
        assert_eq!(data, vec![7u8; 64]);
    }

    #[test]
    fn malformed_utf8_is_a_memory_fault() {
        let mut data = vec![0u8; 8];
        data[1] = 0xff;
        data[2] = 0xfe;
        let memory = GuestMemory::new(&mut data);
        assert_eq!(memory.read_str(1, 2).unwrap_err().kind, FaultKind::MemoryFault);
    }

    #[test]
    fn negative_length_is_rejected() {
        let mut data = vec![0u8; 8];
        let memory = GuestMemory::new(&mut data);
        assert_eq!(memory.read_bytes(1, -1).unwrap_err().kind, FaultKind::MemoryFault);
    }

    #[test]
    fn scalars_round_trip_little_endian() {
        let mut data = vec![0u8; 32];
        let mut memory = GuestMemory::new(&mut data);
        memory.write_i32(4, -7).unwrap();
        memory.write_i64(8, i64::MAX).unwrap();
        assert_eq!(memory.read_i32(4).unwrap(), -7);
        assert_eq!(memory.read_u32(4).unwrap(), (-7i32) as u32);
        assert_eq!(memory.read_i64(8).unwrap(), i64::MAX);
        assert_eq!(memory.read_i32(30).unwrap_err().kind, FaultKind::MemoryFault);
    }

    #[test]
    fn reads_f64() {
        let mut data = vec![0u8; 16];
        data[4..12].copy_from_slice(&1.5f64.to_le_bytes());
        let memory = GuestMemory::new(&mut data);
        assert_eq!(memory.read_f64(4).unwrap(), 1.5);
    }

    proptest! {
        #[test]
        fn out_of_range_access_never_touches_memory(
            size in 1usize..256,
            offset in 0i32..512,
            len in 0i32..512,
        ) {
            prop_assume!(offset as usize + len as usize > size);
            let original: Vec<u8> = (0..size).map(|i| i as u8).collect();
            let mut data = original.clone();
            let mut memory = GuestMemory::new(&mut data);
            let read = memory.read_bytes(offset, len).map(|bytes| bytes.to_vec());
            prop_assert_eq!(read.unwrap_err().kind, FaultKind::MemoryFault);
            let payload = vec![0xAAu8; len as usize];
            let written = memory.write_bytes(offset, &payload);
            prop_assert_eq!(written.unwrap_err().kind, FaultKind::MemoryFault);
            prop_assert_eq!(data, original);
        }
    }
}
