//! Byte-exact verification of fingerprint matches.
//!
//! Fingerprints can collide, fast ones in particular. The shallow check
//! reads both files in lock-step [`HASH_CHUNK_SIZE`] chunks and stops at the
//! first differing chunk, so a mismatch near the start costs almost nothing.

use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::path::Path;

use crate::scanner::HASH_CHUNK_SIZE;

/// Whether `a` and `b` have identical contents.
///
/// Files of different length compare unequal as soon as one of them hits
/// EOF before the other.
///
/// # Errors
///
/// Returns the first I/O error raised while opening or reading either file.
pub fn files_identical(a: &Path, b: &Path) -> io::Result<bool> {
    let mut left = File::open(a)?;
    let mut right = File::open(b)?;
    let mut left_buf = [0u8; HASH_CHUNK_SIZE];
    let mut right_buf = [0u8; HASH_CHUNK_SIZE];

    loop {
        let n = fill(&mut left, &mut left_buf)?;
        let m = fill(&mut right, &mut right_buf)?;
        if n != m || left_buf[..n] != right_buf[..m] {
            log::trace!("{} and {} differ", a.display(), b.display());
            return Ok(false);
        }
        if n == 0 {
            return Ok(true);
        }
    }
}

/// Read until `buf` is full or EOF; returns the number of bytes read.
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
