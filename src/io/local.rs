use super::ReadAt;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Local file reader with random access support
pub struct LocalFileReader {
    file: std::fs::File,
    path: PathBuf,
    size: u64,
}

impl LocalFileReader {
    pub fn new(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("cannot open {}", path.display()))?;
        let size = file.metadata()?.len();
        Ok(Self {
            file,
            path: path.to_path_buf(),
            size,
        })
    }
}

#[async_trait]
impl ReadAt for LocalFileReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        // Positional reads keep no shared cursor, so one handle may serve
        // interleaved requests.
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            let mut filled = 0;
            while filled < buf.len() {
                let n = self.file.read_at(&mut buf[filled..], offset + filled as u64)?;
                if n == 0 {
                    break;
                }
                filled += n;
            }
            Ok(filled)
        }

        #[cfg(windows)]
        {
            use std::os::windows::fs::FileExt;
            let mut filled = 0;
            while filled < buf.len() {
                let n = self.file.seek_read(&mut buf[filled..], offset + filled as u64)?;
                if n == 0 {
                    break;
                }
                filled += n;
            }
            Ok(filled)
        }

        #[cfg(not(any(unix, windows)))]
        {
            use std::io::{Read, Seek, SeekFrom};
            let mut file = &self.file;
            file.seek(SeekFrom::Start(offset))?;
            let mut filled = 0;
            while filled < buf.len() {
                let n = file.read(&mut buf[filled..])?;
                if n == 0 {
                    break;
                }
                filled += n;
            }
            Ok(filled)
        }
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn local_path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}
