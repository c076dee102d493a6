/// Copy `s` into a fixed-size wire field, truncating to `buf.len() - 1`
/// bytes and leaving the remainder zeroed (which doubles as the nul
/// terminator `strncpy`-style fields rely on). Returns the logical length
/// written, i.e. what `path_len`/`name_len` should be set to.
pub fn normalize_field(buf: &mut [u8], s: &str) -> i32 {
    buf.fill(0);
    let max = buf.len().saturating_sub(1);
    let bytes = s.as_bytes();
    let n = bytes.len().min(max);
    buf[..n].copy_from_slice(&bytes[..n]);
    n as i32
}

/// Read a field written by [`normalize_field`] back out as a `&str`,
/// stopping at the first nul byte (or the field's end, whichever comes
/// first). Invalid UTF-8 is treated as an empty string rather than a panic,
/// since a misbehaving peer shouldn't be able to crash the reader.
pub fn read_field(buf: &[u8]) -> &str {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    core::str::from_utf8(&buf[..end]).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_to_buffer_capacity() {
        let mut buf = [0xffu8; 8];
        let len = normalize_field(&mut buf, "hello world");
        assert_eq!(len, 7);
        assert_eq!(read_field(&buf), "hello w");
        assert_eq!(buf[7], 0);
    }

    #[test]
    fn short_strings_are_nul_padded() {
        let mut buf = [0xffu8; 8];
        let len = normalize_field(&mut buf, "hi");
        assert_eq!(len, 2);
        assert_eq!(&buf, &[b'h', b'i', 0, 0, 0, 0, 0, 0]);
        assert_eq!(read_field(&buf), "hi");
    }
}
