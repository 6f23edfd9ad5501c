//! Low-level ZIP archive parser.
//!
//! This module handles the binary parsing of ZIP file structures,
//! reading from any source that implements the [`ReadAt`] trait.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Walk the Central Directory header by header
//! 4. For reading an entry, resolve its Local File Header to the data start
//!
//! Only the archive tail and the central directory are fetched to
//! enumerate entries, which keeps remote archives cheap to index.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Result, bail};

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// Low-level ZIP file parser, generic over the byte source.
pub struct ZipParser<R: ReadAt> {
    reader: Arc<R>,
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Returns the record and its offset in the file. Archives with a
    /// trailing comment are handled by scanning backwards for the signature.
    pub async fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        // Common case first: no comment, EOCD is the last 22 bytes.
        if self.size >= EndOfCentralDirectory::SIZE as u64 {
            let offset = self.size - EndOfCentralDirectory::SIZE as u64;
            let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
            self.read_exact_at(offset, &mut buf).await?;

            if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && &buf[20..22] == b"\x00\x00" {
                let eocd = EndOfCentralDirectory::from_bytes(&buf)?;
                return Ok((eocd, offset));
            }
        }

        let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE as u64).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        self.read_exact_at(search_start, &mut buf).await?;

        for i in (0..=buf.len().saturating_sub(EndOfCentralDirectory::SIZE)).rev() {
            if buf.len() < i + EndOfCentralDirectory::SIZE {
                continue;
            }
            if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                // The comment length must account for every trailing byte.
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;

                if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd = EndOfCentralDirectory::from_bytes(
                        &buf[i..i + EndOfCentralDirectory::SIZE],
                    )?;
                    return Ok((eocd, search_start + i as u64));
                }
            }
        }

        bail!("Not a valid ZIP file")
    }

    /// Read the ZIP64 End of Central Directory record via its locator,
    /// which sits immediately before the regular EOCD.
    pub async fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EOCD> {
        let Some(locator_offset) = eocd_offset.checked_sub(Zip64EOCDLocator::SIZE as u64) else {
            bail!("Invalid ZIP64 locator");
        };
        let mut locator_buf = vec![0u8; Zip64EOCDLocator::SIZE];
        self.read_exact_at(locator_offset, &mut locator_buf).await?;

        let locator = Zip64EOCDLocator::from_bytes(&locator_buf)?;

        let mut eocd64_buf = vec![0u8; Zip64EOCD::MIN_SIZE];
        self.read_exact_at(locator.eocd64_offset, &mut eocd64_buf)
            .await?;

        Zip64EOCD::from_bytes(&eocd64_buf)
    }

    /// Fetch the whole Central Directory, positioned at its first header.
    pub async fn central_directory(&self) -> Result<CentralDirectory> {
        let (eocd, eocd_offset) = self.find_eocd().await?;

        if eocd.spans_multiple_disks() {
            bail!("Multi-disk archives are not supported");
        }

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset).await?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        if cd_offset.saturating_add(cd_size) > self.size {
            bail!(
                "Central directory ({} bytes at {}) lies outside the archive",
                cd_size,
                cd_offset
            );
        }

        // One read for the whole directory; a single Range request remotely.
        let mut data = vec![0u8; cd_size as usize];
        self.read_exact_at(cd_offset, &mut data).await?;

        Ok(CentralDirectory {
            data,
            base_offset: cd_offset,
            total_entries,
            position: 0,
            visited: 0,
        })
    }

    /// List every entry in native central-directory order.
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        let mut directory = self.central_directory().await?;
        let mut entries = Vec::with_capacity(directory.total_entries() as usize);

        if directory.total_entries() == 0 {
            return Ok(entries);
        }
        loop {
            entries.push(directory.current_entry()?);
            if !directory.advance()? {
                break;
            }
        }

        Ok(entries)
    }

    /// Read the single central directory header stored at `cdfh_offset`.
    pub async fn read_entry_at(&self, cdfh_offset: u64) -> Result<ZipFileEntry> {
        let mut fixed = vec![0u8; CDFH_MIN_SIZE];
        self.read_exact_at(cdfh_offset, &mut fixed).await?;

        let header_len = cdfh_len(&fixed)?;
        let mut header = vec![0u8; header_len];
        self.read_exact_at(cdfh_offset, &mut header).await?;

        parse_cdfh(&header, cdfh_offset)
    }

    /// Find an entry by exact name with a linear central directory walk.
    pub async fn locate(&self, name: &str) -> Result<Option<ZipFileEntry>> {
        Ok(self
            .list_files()
            .await?
            .into_iter()
            .find(|entry| entry.file_name == name))
    }

    /// Get the actual data offset for a file entry.
    ///
    /// The Local File Header has its own variable-length name and extra
    /// field, which may differ from the central directory copy.
    pub async fn get_data_offset(&self, entry: &ZipFileEntry) -> Result<u64> {
        let mut lfh_buf = vec![0u8; LFH_SIZE];
        self.read_exact_at(entry.lfh_offset, &mut lfh_buf).await?;

        if &lfh_buf[0..4] != LFH_SIGNATURE {
            bail!("Invalid Local File Header at offset {}", entry.lfh_offset);
        }

        let mut cursor = Cursor::new(&lfh_buf);
        cursor.set_position(26); // Offset to filename length field

        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        let data_offset =
            entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length;

        if data_offset.saturating_add(entry.compressed_size) > self.size {
            bail!("Entry data for {} runs past the end of the archive", entry.file_name);
        }

        Ok(data_offset)
    }

    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }

    async fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let n = self.reader.read_at(offset, buf).await?;
        if n != buf.len() {
            bail!(
                "Short read at offset {}: wanted {} bytes, got {}",
                offset,
                buf.len(),
                n
            );
        }
        Ok(())
    }
}

/// In-memory Central Directory with a cursor over its headers.
///
/// Reading the header under the cursor and stepping to the next one are
/// separate operations, so callers can tell a damaged header apart from a
/// directory that ends before its advertised entry count.
pub struct CentralDirectory {
    data: Vec<u8>,
    base_offset: u64,
    total_entries: u64,
    position: usize,
    visited: u64,
}

impl CentralDirectory {
    /// Entry count advertised by the EOCD record.
    pub fn total_entries(&self) -> u64 {
        self.total_entries
    }

    /// Parse the header under the cursor without moving it.
    pub fn current_entry(&self) -> Result<ZipFileEntry> {
        parse_cdfh(
            &self.data[self.position.min(self.data.len())..],
            self.base_offset + self.position as u64,
        )
    }

    /// Step past the current header. Returns `false` once every advertised
    /// entry has been visited.
    pub fn advance(&mut self) -> Result<bool> {
        let header_len = cdfh_len(&self.data[self.position.min(self.data.len())..])?;
        self.position += header_len;
        self.visited += 1;

        if self.visited >= self.total_entries {
            return Ok(false);
        }

        let next = self.data.get(self.position..self.position + 4);
        if next != Some(CDFH_SIGNATURE) {
            bail!(
                "Central directory ends after {} of {} entries",
                self.visited,
                self.total_entries
            );
        }
        Ok(true)
    }
}

/// Total length of the central directory header at the start of `data`.
fn cdfh_len(data: &[u8]) -> Result<usize> {
    if data.len() < CDFH_MIN_SIZE || &data[0..4] != CDFH_SIGNATURE {
        bail!("Invalid Central Directory File Header");
    }
    let name_len = u16::from_le_bytes([data[28], data[29]]) as usize;
    let extra_len = u16::from_le_bytes([data[30], data[31]]) as usize;
    let comment_len = u16::from_le_bytes([data[32], data[33]]) as usize;
    Ok(CDFH_MIN_SIZE + name_len + extra_len + comment_len)
}

/// Parse a Central Directory File Header starting at `data[0]`.
fn parse_cdfh(data: &[u8], cdfh_offset: u64) -> Result<ZipFileEntry> {
    let header_len = cdfh_len(data)?;
    if data.len() < header_len {
        bail!("Truncated Central Directory File Header at offset {}", cdfh_offset);
    }
    let mut cursor = Cursor::new(&data[4..header_len]);

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let _file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes)?;
    let file_name = String::from_utf8_lossy(&file_name_bytes).to_string();
    let is_directory = file_name.ends_with('/');

    // ZIP64 extended information lives in extra field 0x0001; a value is
    // present only when its 32-bit header field is saturated.
    let extra_field_end = cursor.position() + extra_field_length as u64;

    while cursor.position() + 4 <= extra_field_end {
        let header_id = cursor.read_u16::<LittleEndian>()?;
        let field_size = cursor.read_u16::<LittleEndian>()?;
        let field_end = cursor.position() + field_size as u64;

        if header_id == 0x0001 {
            if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                uncompressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                compressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                lfh_offset = cursor.read_u64::<LittleEndian>()?;
            }
        }
        cursor.set_position(field_end);
    }

    Ok(ZipFileEntry {
        file_name,
        compression_method: CompressionMethod::from_u16(compression_method),
        flags,
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
        cdfh_offset,
        is_directory,
    })
}
