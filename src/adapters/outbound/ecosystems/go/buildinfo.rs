use crate::shared::Result;
use goblin::elf::program_header::{PF_W, PF_X, PT_LOAD};
use goblin::mach::Mach;
use goblin::pe::section_table::{
    IMAGE_SCN_CNT_INITIALIZED_DATA, IMAGE_SCN_MEM_READ, IMAGE_SCN_MEM_WRITE,
};
use goblin::Object;

const MAGIC: &[u8] = b"\xff Go buildinf:";
const HEADER_SIZE: usize = 32;
const ALIGN: usize = 32;
const SEARCH_WINDOW: usize = 64 * 1024;
const FLAG_BIG_ENDIAN: u8 = 0x1;
const FLAG_INLINE_STRINGS: u8 = 0x2;
/// Sentinel bytes framing the module information blob on each side
const MODINFO_FRAME: usize = 16;

/// Build information embedded by the Go linker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub go_version: String,
    /// `\n`-delimited `path`/`mod`/`dep`/`=>` lines, empty for non-module builds
    pub mod_info: String,
}

/// A loaded segment: `size` bytes at virtual `addr`, stored at file `offset`
#[derive(Debug, Clone, Copy)]
struct Region {
    addr: u64,
    offset: usize,
    size: usize,
}

/// Virtual-address view over an executable file
struct ExeImage<'a> {
    data: &'a [u8],
    regions: Vec<Region>,
    data_start: u64,
}

impl<'a> ExeImage<'a> {
    fn parse(data: &'a [u8]) -> Option<Self> {
        match Object::parse(data).ok()? {
            Object::Elf(elf) => {
                let regions = elf
                    .program_headers
                    .iter()
                    .filter(|ph| ph.p_type == PT_LOAD)
                    .map(|ph| Region {
                        addr: ph.p_vaddr,
                        offset: ph.p_offset as usize,
                        size: ph.p_filesz as usize,
                    })
                    .collect();
                let data_start = elf
                    .section_headers
                    .iter()
                    .find(|sh| elf.shdr_strtab.get_at(sh.sh_name) == Some(".go.buildinfo"))
                    .map(|sh| sh.sh_addr)
                    .or_else(|| {
                        elf.program_headers
                            .iter()
                            .find(|ph| ph.p_type == PT_LOAD && ph.p_flags & (PF_X | PF_W) == PF_W)
                            .map(|ph| ph.p_vaddr)
                    })?;
                Some(Self {
                    data,
                    regions,
                    data_start,
                })
            }
            Object::PE(pe) => {
                let base = pe.image_base as u64;
                let regions = pe
                    .sections
                    .iter()
                    .map(|s| Region {
                        addr: base + u64::from(s.virtual_address),
                        offset: s.pointer_to_raw_data as usize,
                        size: s.size_of_raw_data as usize,
                    })
                    .collect();
                let writable_data =
                    IMAGE_SCN_CNT_INITIALIZED_DATA | IMAGE_SCN_MEM_READ | IMAGE_SCN_MEM_WRITE;
                let data_start = pe
                    .sections
                    .iter()
                    .find(|s| {
                        s.virtual_address != 0
                            && s.size_of_raw_data != 0
                            && s.characteristics & writable_data == writable_data
                    })
                    .map(|s| base + u64::from(s.virtual_address))?;
                Some(Self {
                    data,
                    regions,
                    data_start,
                })
            }
            Object::Mach(Mach::Binary(macho)) => {
                let mut regions = Vec::new();
                let mut buildinfo_section = None;
                let mut data_segment = None;
                for segment in macho.segments.iter() {
                    regions.push(Region {
                        addr: segment.vmaddr,
                        offset: segment.fileoff as usize,
                        size: segment.filesize as usize,
                    });
                    if segment.name().ok() == Some("__DATA") && data_segment.is_none() {
                        data_segment = Some(segment.vmaddr);
                    }
                    if let Ok(sections) = segment.sections() {
                        for (section, _) in sections {
                            if section.name().ok() == Some("__go_buildinfo") {
                                buildinfo_section = Some(section.addr);
                            }
                        }
                    }
                }
                Some(Self {
                    data,
                    regions,
                    data_start: buildinfo_section.or(data_segment)?,
                })
            }
            _ => None,
        }
    }

    /// Returns up to `size` bytes starting at virtual address `addr`
    fn read(&self, addr: u64, size: usize) -> Option<&'a [u8]> {
        let region = self
            .regions
            .iter()
            .find(|r| addr >= r.addr && addr - r.addr < r.size as u64)?;
        let skip = usize::try_from(addr - region.addr).ok()?;
        let len = size.min(region.size - skip);
        let start = region.offset.checked_add(skip)?;
        self.data.get(start..start.checked_add(len)?)
    }

    fn read_exact(&self, addr: u64, size: usize) -> Option<&'a [u8]> {
        self.read(addr, size).filter(|bytes| bytes.len() == size)
    }
}

#[derive(Debug, Clone, Copy)]
struct PointerReader {
    size: usize,
    big_endian: bool,
}

impl PointerReader {
    fn read(self, bytes: &[u8]) -> Option<u64> {
        let bytes = bytes.get(..self.size)?;
        match (self.size, self.big_endian) {
            (4, false) => Some(u64::from(u32::from_le_bytes(bytes.try_into().ok()?))),
            (4, true) => Some(u64::from(u32::from_be_bytes(bytes.try_into().ok()?))),
            (8, false) => Some(u64::from_le_bytes(bytes.try_into().ok()?)),
            (8, true) => Some(u64::from_be_bytes(bytes.try_into().ok()?)),
            _ => None,
        }
    }
}

/// Reads the build information of a Go executable
///
/// # Returns
/// `None` when `data` is not an executable or carries no Go build-info
/// header.
///
/// # Errors
/// Returns an error when the build-info header is present but the strings
/// it points to cannot be decoded.
pub fn read_build_info(data: &[u8]) -> Result<Option<BuildInfo>> {
    match ExeImage::parse(data) {
        Some(image) => decode(&image),
        None => Ok(None),
    }
}

fn decode(image: &ExeImage<'_>) -> Result<Option<BuildInfo>> {
    let Some(window) = image.read(image.data_start, SEARCH_WINDOW) else {
        return Ok(None);
    };
    let Some(header) = find_header(window) else {
        return Ok(None);
    };

    let ptr_size = usize::from(header[14]);
    let flags = header[15];

    let (go_version, mod_info) = if flags & FLAG_INLINE_STRINGS != 0 {
        let (version, rest) = decode_varint_string(&header[HEADER_SIZE..])
            .ok_or_else(|| anyhow::anyhow!("truncated Go version string in build info"))?;
        let (mod_info, _) = decode_varint_string(rest)
            .ok_or_else(|| anyhow::anyhow!("truncated module information in build info"))?;
        (version, mod_info)
    } else {
        let reader = PointerReader {
            size: ptr_size,
            big_endian: flags & FLAG_BIG_ENDIAN != 0,
        };
        if ptr_size != 4 && ptr_size != 8 {
            anyhow::bail!("unsupported pointer size {} in Go build info", ptr_size);
        }
        let version = read_pointed_string(image, reader, &header[16..])
            .ok_or_else(|| anyhow::anyhow!("cannot read Go version string from build info"))?;
        let mod_info = read_pointed_string(image, reader, &header[16 + ptr_size..])
            .ok_or_else(|| anyhow::anyhow!("cannot read module information from build info"))?;
        (version, mod_info)
    };

    Ok(Some(BuildInfo {
        go_version: String::from_utf8_lossy(go_version).into_owned(),
        mod_info: String::from_utf8_lossy(strip_modinfo_frame(mod_info)).into_owned(),
    }))
}

/// Finds the 32-byte aligned build-info header inside `window`
fn find_header(mut window: &[u8]) -> Option<&[u8]> {
    loop {
        let i = window.windows(MAGIC.len()).position(|w| w == MAGIC)?;
        if window.len() - i < HEADER_SIZE {
            return None;
        }
        if i % ALIGN == 0 {
            return Some(&window[i..]);
        }
        window = &window[(i + ALIGN - 1) & !(ALIGN - 1)..];
    }
}

/// Follows a pointer to a `(data pointer, length)` string header
fn read_pointed_string<'a>(image: &ExeImage<'a>, reader: PointerReader, ptr: &[u8]) -> Option<&'a [u8]> {
    let header_addr = reader.read(ptr)?;
    let header = image.read_exact(header_addr, 2 * reader.size)?;
    let data_addr = reader.read(header)?;
    let len = usize::try_from(reader.read(&header[reader.size..])?).ok()?;
    image.read_exact(data_addr, len)
}

fn decode_varint_string(data: &[u8]) -> Option<(&[u8], &[u8])> {
    let (len, consumed) = read_uvarint(data)?;
    let end = consumed.checked_add(usize::try_from(len).ok()?)?;
    let value = data.get(consumed..end)?;
    Some((value, &data[end..]))
}

fn read_uvarint(data: &[u8]) -> Option<(u64, usize)> {
    let mut value = 0u64;
    let mut shift = 0u32;
    for (i, &byte) in data.iter().enumerate().take(10) {
        if byte < 0x80 {
            return Some((value | u64::from(byte) << shift, i + 1));
        }
        value |= u64::from(byte & 0x7f) << shift;
        shift += 7;
    }
    None
}

fn strip_modinfo_frame(mod_info: &[u8]) -> &[u8] {
    let len = mod_info.len();
    if len >= 2 * MODINFO_FRAME + 1 && mod_info[len - MODINFO_FRAME - 1] == b'\n' {
        &mod_info[MODINFO_FRAME..len - MODINFO_FRAME]
    } else {
        &[]
    }
}
