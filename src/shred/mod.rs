//! Overwrite-then-delete of plaintext originals.
//!
//! A single pass of random bytes is written over the file's full extent,
//! flushed to disk, and the file is then unlinked.  On copy-on-write
//! filesystems and wear-levelled flash the old blocks may survive; this
//! only defeats casual recovery.

use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use rand::RngCore;

use crate::errors::Result;

/// Random bytes generated and written per iteration.
const OVERWRITE_CHUNK: usize = 64 * 1024;

/// Overwrite `path` with random bytes of the same length, then remove it.
pub fn shred_file(path: &Path) -> Result<()> {
    let len = fs::metadata(path)?.len();

    let mut file = OpenOptions::new().write(true).open(path)?;
    file.seek(SeekFrom::Start(0))?;

    let mut rng = rand::rng();
    let mut buf = vec![0u8; OVERWRITE_CHUNK];
    let mut remaining = len;

    while remaining > 0 {
        let n = usize::try_from(remaining).map_or(OVERWRITE_CHUNK, |r| r.min(OVERWRITE_CHUNK));
        rng.fill_bytes(&mut buf[..n]);
        file.write_all(&buf[..n])?;
        remaining -= n as u64;
    }

    file.sync_all()?;
    drop(file);

    fs::remove_file(path)?;
    tracing::debug!(path = %path.display(), bytes = len, "shredded file");
    Ok(())
}
