use std::io::{self, Write};

use crate::label::Banner;

/// Appends accepted certificates to the bundle. Output is only ever
/// appended; every entry is flushed before the next one starts.
pub struct BundleWriter<W: Write> {
    inner: W,
    include_label: bool,
    written: usize,
}

impl<W: Write> BundleWriter<W> {
    pub fn new(inner: W, include_label: bool) -> Self {
        BundleWriter {
            inner,
            include_label,
            written: 0,
        }
    }

    /// Writes a blank line, the banner (when labels are enabled) and the
    /// PEM segments, then flushes.
    pub fn write_certificate(&mut self, banner: &Banner, segments: &[String]) -> io::Result<()> {
        self.inner.write_all(b"\n")?;
        if self.include_label {
            write!(self.inner, "{}", banner)?;
        }
        for segment in segments {
            self.inner.write_all(segment.as_bytes())?;
        }
        self.inner.flush()?;
        self.written += 1;
        Ok(())
    }

    /// Number of certificates written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
