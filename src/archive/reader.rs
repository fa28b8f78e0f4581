use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::DeflateDecoder;

use super::structures::{
    CDFH_SIGNATURE, CompressionMethod, EndOfCentralDirectory, EntryInfo, LFH_SIGNATURE, LFH_SIZE,
    Zip64Eocd, Zip64EocdLocator,
};
use super::{ArchiveError, EntryError};

/// Maximum zip comment size allowed by the format; bounds the EOCD search.
const MAX_COMMENT_SIZE: u64 = 65535;

/// Random-access handle over the archive file.
#[derive(Debug)]
struct ArchiveFile {
    file: File,
    len: u64,
    #[cfg(not(unix))]
    lock: std::sync::Mutex<()>,
}

impl ArchiveFile {
    fn open(path: &Path) -> Result<Self, std::io::Error> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            file,
            len,
            #[cfg(not(unix))]
            lock: std::sync::Mutex::new(()),
        })
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize, std::io::Error> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            self.file.read_at(buf, offset)
        }
        #[cfg(not(unix))]
        {
            use std::io::{Read, Seek, SeekFrom};
            let _guard = self.lock.lock().unwrap();
            let mut f = &self.file;
            f.seek(SeekFrom::Start(offset))?;
            f.read(buf)
        }
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), std::io::Error> {
        let mut read = 0usize;
        while read < buf.len() {
            let n = self.read_at(offset + read as u64, &mut buf[read..])?;
            if n == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "unexpected end of archive",
                ));
            }
            read += n;
        }
        Ok(())
    }
}

/// An opened zip archive with its central directory parsed up front.
///
/// Entry reads are independent pread calls, so `read_entry` takes `&self` and
/// the underlying handle closes on drop.
#[derive(Debug)]
pub struct ZipArchive {
    file: ArchiveFile,
    entries: Vec<EntryInfo>,
}

impl ZipArchive {
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let file = ArchiveFile::open(path)?;
        if file.len < EndOfCentralDirectory::SIZE as u64 {
            return Err(ArchiveError::Format(
                "file too small to be a zip archive".to_string(),
            ));
        }

        let (eocd, eocd_offset) = find_eocd(&file)?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = read_zip64_eocd(&file, eocd_offset)?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        let cd_end = cd_offset.checked_add(cd_size).filter(|end| *end <= file.len);
        if cd_end.is_none() {
            return Err(ArchiveError::Format(
                "central directory extends past end of file".to_string(),
            ));
        }

        let mut cd_data = vec![0u8; cd_size as usize];
        file.read_exact_at(cd_offset, &mut cd_data)?;

        let mut entries = Vec::with_capacity(total_entries as usize);
        let mut cursor = Cursor::new(cd_data.as_slice());
        for _ in 0..total_entries {
            entries.push(parse_cdfh(&mut cursor)?);
        }

        Ok(Self { file, entries })
    }

    /// Entry metadata in central-directory order.
    pub fn entries(&self) -> &[EntryInfo] {
        &self.entries
    }

    /// Read and decompress one entry.
    pub fn read_entry(&self, entry: &EntryInfo) -> Result<Vec<u8>, EntryError> {
        let mut lfh = [0u8; LFH_SIZE];
        self.file.read_exact_at(entry.lfh_offset, &mut lfh)?;
        if &lfh[0..4] != LFH_SIGNATURE {
            return Err(EntryError::BadLocalHeader(entry.name.clone()));
        }

        // Name and extra-field lengths in the LFH may differ from the central
        // directory; the data begins right after both.
        let name_len = u16::from_le_bytes([lfh[26], lfh[27]]) as u64;
        let extra_len = u16::from_le_bytes([lfh[28], lfh[29]]) as u64;
        let data_offset = entry.lfh_offset + LFH_SIZE as u64 + name_len + extra_len;

        let in_bounds = data_offset
            .checked_add(entry.compressed_size)
            .is_some_and(|end| end <= self.file.len);
        if !in_bounds {
            return Err(EntryError::Corrupt {
                name: entry.name.clone(),
                reason: "entry data extends past end of archive".to_string(),
            });
        }

        let mut compressed = vec![0u8; entry.compressed_size as usize];
        self.file.read_exact_at(data_offset, &mut compressed)?;

        match entry.method {
            CompressionMethod::Stored => {
                if compressed.len() as u64 != entry.uncompressed_size {
                    return Err(EntryError::Corrupt {
                        name: entry.name.clone(),
                        reason: "stored size mismatch".to_string(),
                    });
                }
                Ok(compressed)
            }
            CompressionMethod::Deflate => {
                let mut out = Vec::with_capacity(entry.uncompressed_size as usize);
                let mut decoder = DeflateDecoder::new(compressed.as_slice());
                decoder
                    .read_to_end(&mut out)
                    .map_err(|err| EntryError::Corrupt {
                        name: entry.name.clone(),
                        reason: err.to_string(),
                    })?;
                if out.len() as u64 != entry.uncompressed_size {
                    return Err(EntryError::Corrupt {
                        name: entry.name.clone(),
                        reason: "inflated size mismatch".to_string(),
                    });
                }
                Ok(out)
            }
            CompressionMethod::Unknown(method) => Err(EntryError::Unsupported {
                name: entry.name.clone(),
                method,
            }),
        }
    }
}

/// Find the End of Central Directory record.
///
/// Fast path: no archive comment, so the EOCD sits exactly at the tail.
/// Otherwise search backwards through the maximum comment window for a
/// signature whose comment length matches the remaining bytes.
fn find_eocd(file: &ArchiveFile) -> Result<(EndOfCentralDirectory, u64), ArchiveError> {
    let eocd_size = EndOfCentralDirectory::SIZE as u64;

    let offset = file.len - eocd_size;
    let mut tail = vec![0u8; EndOfCentralDirectory::SIZE];
    file.read_exact_at(offset, &mut tail)?;
    if &tail[0..4] == EndOfCentralDirectory::SIGNATURE && &tail[20..22] == b"\x00\x00" {
        let eocd = EndOfCentralDirectory::from_bytes(&tail)?;
        return Ok((eocd, offset));
    }

    let search_size = (MAX_COMMENT_SIZE + eocd_size).min(file.len);
    let search_start = file.len - search_size;
    let mut buf = vec![0u8; search_size as usize];
    file.read_exact_at(search_start, &mut buf)?;

    for i in (0..buf.len().saturating_sub(EndOfCentralDirectory::SIZE)).rev() {
        if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
            let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;
            if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                let eocd =
                    EndOfCentralDirectory::from_bytes(&buf[i..i + EndOfCentralDirectory::SIZE])?;
                return Ok((eocd, search_start + i as u64));
            }
        }
    }

    Err(ArchiveError::Format(
        "no end of central directory record".to_string(),
    ))
}

fn read_zip64_eocd(file: &ArchiveFile, eocd_offset: u64) -> Result<Zip64Eocd, ArchiveError> {
    let locator_offset = eocd_offset
        .checked_sub(Zip64EocdLocator::SIZE as u64)
        .ok_or_else(|| ArchiveError::Format("missing zip64 locator".to_string()))?;
    let mut locator_buf = vec![0u8; Zip64EocdLocator::SIZE];
    file.read_exact_at(locator_offset, &mut locator_buf)?;
    let locator = Zip64EocdLocator::from_bytes(&locator_buf)?;

    let mut eocd64_buf = vec![0u8; Zip64Eocd::MIN_SIZE];
    file.read_exact_at(locator.eocd64_offset, &mut eocd64_buf)?;
    Zip64Eocd::from_bytes(&eocd64_buf)
}

/// Parse one Central Directory File Header, including ZIP64 extra fields.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<EntryInfo, ArchiveError> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        return Err(ArchiveError::Format(
            "invalid central directory file header".to_string(),
        ));
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let _flags = cursor.read_u16::<LittleEndian>()?;
    let method = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let name_len = cursor.read_u16::<LittleEndian>()?;
    let extra_len = cursor.read_u16::<LittleEndian>()?;
    let comment_len = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut name_bytes = vec![0u8; name_len as usize];
    cursor.read_exact(&mut name_bytes)?;
    // Lossy conversion keeps non-UTF8 names readable in logs.
    let name = String::from_utf8_lossy(&name_bytes).to_string();
    let is_directory = name.ends_with('/');

    // ZIP64 extended information lives in extra field id 0x0001; each 64-bit
    // value is present only when the 32-bit header field is saturated.
    let extra_end = cursor.position() + extra_len as u64;
    while cursor.position() + 4 <= extra_end {
        let header_id = cursor.read_u16::<LittleEndian>()?;
        let field_size = cursor.read_u16::<LittleEndian>()?;
        if header_id == 0x0001 {
            if uncompressed_size == 0xFFFF_FFFF && cursor.position() + 8 <= extra_end {
                uncompressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if compressed_size == 0xFFFF_FFFF && cursor.position() + 8 <= extra_end {
                compressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if lfh_offset == 0xFFFF_FFFF && cursor.position() + 8 <= extra_end {
                lfh_offset = cursor.read_u64::<LittleEndian>()?;
            }
            let remaining = extra_end.saturating_sub(cursor.position());
            cursor.set_position(cursor.position() + remaining);
        } else {
            cursor.set_position(cursor.position() + field_size as u64);
        }
    }
    cursor.set_position(extra_end);
    cursor.set_position(cursor.position() + comment_len as u64);

    Ok(EntryInfo {
        name,
        method: CompressionMethod::from_u16(method),
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
        is_directory,
    })
}
