//! Minimal ZIP writer for test fixtures.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::DeflateEncoder;

const STORED: u16 = 0;
const DEFLATE: u16 = 8;

#[derive(Default)]
pub struct ZipBuilder {
    data: Vec<u8>,
    central: Vec<u8>,
    count: u16,
    comment: Vec<u8>,
    claimed_entries: Option<u16>,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(mut self, name: &str, content: &[u8]) -> Self {
        self.add(name, STORED, content.to_vec(), content, true);
        self
    }

    pub fn deflated(mut self, name: &str, content: &[u8]) -> Self {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(content).unwrap();
        let payload = encoder.finish().unwrap();
        self.add(name, DEFLATE, payload, content, true);
        self
    }

    pub fn directory(mut self, name: &str) -> Self {
        self.add(name, STORED, Vec::new(), b"", true);
        self
    }

    /// Entry using an unsupported compression method (bzip2 id).
    pub fn unsupported(mut self, name: &str, content: &[u8]) -> Self {
        self.add(name, 12, content.to_vec(), content, true);
        self
    }

    /// Entry whose local file header signature is damaged.
    pub fn broken_local_header(mut self, name: &str, content: &[u8]) -> Self {
        self.add(name, STORED, content.to_vec(), content, false);
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = comment.as_bytes().to_vec();
        self
    }

    /// Advertise a different entry count in the EOCD than headers written.
    pub fn claim_entries(mut self, count: u16) -> Self {
        self.claimed_entries = Some(count);
        self
    }

    /// Stored entry whose recorded CRC does not match its bytes.
    pub fn bad_crc(mut self, name: &str, content: &[u8]) -> Self {
        self.add(name, STORED, content.to_vec(), content, true);
        let crc_at = self.central.len() - name.len() - 46 + 16;
        self.central[crc_at] ^= 0xFF;
        self
    }

    /// Deflated entry whose ZIP64 extra field claims `claimed` uncompressed
    /// bytes.
    pub fn deflated_claiming(mut self, name: &str, content: &[u8], claimed: u64) -> Self {
        self = self.deflated(name, content);
        let header = self.central.len() - name.len() - 46;
        self.central[header + 24..header + 28].copy_from_slice(&u32::MAX.to_le_bytes());
        self.central[header + 30..header + 32].copy_from_slice(&12u16.to_le_bytes());
        self.central.write_u16::<LittleEndian>(0x0001).unwrap();
        self.central.write_u16::<LittleEndian>(8).unwrap();
        self.central.write_u64::<LittleEndian>(claimed).unwrap();
        self
    }

    fn add(&mut self, name: &str, method: u16, payload: Vec<u8>, content: &[u8], valid: bool) {
        let mut crc = flate2::Crc::new();
        crc.update(content);
        let crc = crc.sum();
        let lfh_offset = self.data.len() as u32;

        let signature: &[u8] = if valid { b"PK\x03\x04" } else { b"XX\x03\x04" };
        let local = &mut self.data;
        local.extend_from_slice(signature);
        local.write_u16::<LittleEndian>(20).unwrap();
        local.write_u16::<LittleEndian>(0).unwrap();
        local.write_u16::<LittleEndian>(method).unwrap();
        local.write_u32::<LittleEndian>(0).unwrap(); // time, date
        local.write_u32::<LittleEndian>(crc).unwrap();
        local.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
        local.write_u32::<LittleEndian>(content.len() as u32).unwrap();
        local.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        local.write_u16::<LittleEndian>(0).unwrap();
        local.extend_from_slice(name.as_bytes());
        local.extend_from_slice(&payload);

        let central = &mut self.central;
        central.extend_from_slice(b"PK\x01\x02");
        central.write_u16::<LittleEndian>(20).unwrap();
        central.write_u16::<LittleEndian>(20).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u16::<LittleEndian>(method).unwrap();
        central.write_u32::<LittleEndian>(0).unwrap(); // time, date
        central.write_u32::<LittleEndian>(crc).unwrap();
        central.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
        central.write_u32::<LittleEndian>(content.len() as u32).unwrap();
        central.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap(); // extra
        central.write_u16::<LittleEndian>(0).unwrap(); // comment
        central.write_u16::<LittleEndian>(0).unwrap(); // disk
        central.write_u16::<LittleEndian>(0).unwrap(); // internal attrs
        central.write_u32::<LittleEndian>(0).unwrap(); // external attrs
        central.write_u32::<LittleEndian>(lfh_offset).unwrap();
        central.extend_from_slice(name.as_bytes());

        self.count += 1;
    }

    pub fn finish(self) -> Vec<u8> {
        let mut out = self.data;
        let cd_offset = out.len() as u32;
        out.extend_from_slice(&self.central);

        let entries = self.claimed_entries.unwrap_or(self.count);
        out.extend_from_slice(b"PK\x05\x06");
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(entries).unwrap();
        out.write_u16::<LittleEndian>(entries).unwrap();
        out.write_u32::<LittleEndian>(self.central.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(cd_offset).unwrap();
        out.write_u16::<LittleEndian>(self.comment.len() as u16).unwrap();
        out.extend_from_slice(&self.comment);
        out
    }

    /// Write the archive as `dir/name` and return its path.
    pub fn write_to(self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.finish()).unwrap();
        path
    }
}

/// Content with `keyword` placed so it straddles many chunk boundaries.
pub fn repeated_lines(lines: usize, keyword: &str) -> Vec<u8> {
    let mut out = Vec::new();
    for i in 0..lines {
        if i % 7 == 3 {
            writeln!(out, "line {} has {} inside", i, keyword).unwrap();
        } else {
            writeln!(out, "line {} is filler text", i).unwrap();
        }
    }
    out
}
