//! Fixed-length concatenation and splitting of byte sequences

/// Concatenate `parts` into one buffer with exact capacity.
pub fn concat(parts: &[&[u8]]) -> Vec<u8> {
    let len = parts.iter().map(|part| part.len()).sum();
    let mut out = Vec::with_capacity(len);
    for part in parts {
        out.extend_from_slice(part);
    }

    debug_assert_eq!(out.len(), len);
    out
}

/// Split `N` bytes off the front of `bytes`.
///
/// Returns `None` if fewer than `N` bytes are available.
pub fn split_array<const N: usize>(bytes: &[u8]) -> Option<(&[u8; N], &[u8])> {
    let (head, tail) = bytes.split_first_chunk::<N>()?;
    Some((head, tail))
}

/// Split `bytes` into two fixed-size halves, requiring the exact total length.
pub fn split_exact<const A: usize, const B: usize>(bytes: &[u8]) -> Option<(&[u8; A], &[u8; B])> {
    let (head, tail) = split_array::<A>(bytes)?;
    let tail = <&[u8; B]>::try_from(tail).ok()?;
    Some((head, tail))
}
