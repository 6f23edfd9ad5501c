use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use anyhow::{Result, bail};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }
}

/// End of Central Directory (EOCD) - 22 bytes minimum
#[derive(Debug)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("Invalid End of Central Directory");
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>()?,
            disk_with_cd: cursor.read_u16::<LittleEndian>()?,
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }

    pub fn is_zip64(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }

    /// Split archives keep their central directory on another disk.
    pub fn spans_multiple_disks(&self) -> bool {
        self.disk_number != self.disk_with_cd || self.disk_entries != self.total_entries
    }
}

/// ZIP64 End of Central Directory Locator - 20 bytes
pub struct Zip64EOCDLocator {
    pub eocd64_offset: u64,
}

impl Zip64EOCDLocator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("Invalid ZIP64 locator");
        }

        // Skip the disk-with-EOCD64 field
        let mut cursor = Cursor::new(&data[8..]);

        Ok(Self {
            eocd64_offset: cursor.read_u64::<LittleEndian>()?,
        })
    }
}

/// ZIP64 End of Central Directory - 56 bytes minimum
pub struct Zip64EOCD {
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EOCD {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("Invalid ZIP64 End of Central Directory");
        }

        // Record size, versions and disk numbers precede the counts
        let mut cursor = Cursor::new(&data[32..]);

        Ok(Self {
            total_entries: cursor.read_u64::<LittleEndian>()?,
            cd_size: cursor.read_u64::<LittleEndian>()?,
            cd_offset: cursor.read_u64::<LittleEndian>()?,
        })
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// Parsed central directory entry
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub flags: u16,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    /// Offset of the local file header
    pub lfh_offset: u64,
    /// Offset of this entry's central directory header
    pub cdfh_offset: u64,
    pub is_directory: bool,
}

impl ZipFileEntry {
    /// General purpose flag bit 0
    pub fn is_encrypted(&self) -> bool {
        self.flags & 0x0001 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eocd_bytes(disk: u16, disk_entries: u16, total: u16, cd_offset: u32) -> Vec<u8> {
        let mut data = EndOfCentralDirectory::SIGNATURE.to_vec();
        data.extend_from_slice(&disk.to_le_bytes());
        data.extend_from_slice(&disk.to_le_bytes());
        data.extend_from_slice(&disk_entries.to_le_bytes());
        data.extend_from_slice(&total.to_le_bytes());
        data.extend_from_slice(&100u32.to_le_bytes());
        data.extend_from_slice(&cd_offset.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data
    }

    #[test]
    fn test_eocd_parse() {
        let eocd = EndOfCentralDirectory::from_bytes(&eocd_bytes(0, 3, 3, 512)).unwrap();
        assert_eq!(eocd.total_entries, 3);
        assert_eq!(eocd.cd_offset, 512);
        assert!(!eocd.is_zip64());
        assert!(!eocd.spans_multiple_disks());
    }

    #[test]
    fn test_eocd_zip64_markers() {
        let eocd = EndOfCentralDirectory::from_bytes(&eocd_bytes(0, 0xFFFF, 0xFFFF, 0xFFFFFFFF))
            .unwrap();
        assert!(eocd.is_zip64());
    }

    #[test]
    fn test_eocd_rejects_bad_signature() {
        let mut data = eocd_bytes(0, 1, 1, 0);
        data[0] = b'X';
        assert!(EndOfCentralDirectory::from_bytes(&data).is_err());
        assert!(EndOfCentralDirectory::from_bytes(&data[..10]).is_err());
    }

    #[test]
    fn test_compression_method() {
        assert_eq!(CompressionMethod::from_u16(0), CompressionMethod::Stored);
        assert_eq!(CompressionMethod::from_u16(8), CompressionMethod::Deflate);
        assert_eq!(CompressionMethod::from_u16(12), CompressionMethod::Unknown(12));
    }
}
