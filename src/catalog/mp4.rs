// src/catalog/mp4.rs

//! 最小化的 MP4（ISO-BMFF）探测器
//!
//! 只读取素材库需要的信息：`moov/mvhd` 中的影片时长，
//! 以及 `stsd` 中 `avc1` 采样条目的宽高。`mdat` 直接 seek 跳过。

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

type FourCC = [u8; 4];

const MOOV: &FourCC = b"moov";
const MVHD: &FourCC = b"mvhd";
const TRAK: &FourCC = b"trak";
const MDIA: &FourCC = b"mdia";
const MINF: &FourCC = b"minf";
const STBL: &FourCC = b"stbl";
const STSD: &FourCC = b"stsd";
const AVC1: &FourCC = b"avc1";

/// moov 超过该大小视为损坏文件
const MAX_MOOV_SIZE: u64 = 64 * 1024 * 1024;

/// 探测结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mp4Info {
    /// 影片时长，精确到毫秒（向下取整）
    pub duration: Duration,
    /// H.264 视频轨的宽高，没有 avc1 轨时为 None
    pub avc_dimensions: Option<(u32, u32)>,
}

/// 打开并探测一个 MP4 文件
pub fn probe_file(path: &Path) -> Result<Mp4Info> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    probe(&mut reader).map_err(|reason| match reason {
        ProbeError::Io(e) => Error::Io(e),
        ProbeError::Format(reason) => Error::Mp4 {
            path: path.to_path_buf(),
            reason,
        },
    })
}

#[derive(Debug)]
pub enum ProbeError {
    Io(std::io::Error),
    Format(String),
}

impl From<std::io::Error> for ProbeError {
    fn from(e: std::io::Error) -> Self {
        ProbeError::Io(e)
    }
}

impl From<String> for ProbeError {
    fn from(reason: String) -> Self {
        ProbeError::Format(reason)
    }
}

/// 遍历顶层 box，找到 moov 后解析
pub fn probe<R: Read + Seek>(reader: &mut R) -> std::result::Result<Mp4Info, ProbeError> {
    let end = reader.seek(SeekFrom::End(0))?;
    let mut pos = reader.seek(SeekFrom::Start(0))?;

    while pos + 8 <= end {
        let mut header = [0u8; 8];
        reader.read_exact(&mut header)?;
        let size = u64::from(be_u32(&header, 0)?);
        let kind = fourcc(&header, 4)?;

        let (box_size, header_len) = match size {
            0 => (end - pos, 8),
            1 => {
                let mut large = [0u8; 8];
                reader.read_exact(&mut large)?;
                (be_u64(&large, 0)?, 16)
            }
            n => (n, 8),
        };
        let box_end = pos
            .checked_add(box_size)
            .filter(|box_end| box_size >= header_len && *box_end <= end)
            .ok_or_else(|| format!("box {} has invalid size {}", format_fourcc(&kind), box_size))?;

        let payload_len = box_size - header_len;
        if &kind == MOOV {
            if payload_len > MAX_MOOV_SIZE {
                return Err(format!("moov too large: {} bytes", payload_len).into());
            }
            let mut payload = vec![0u8; payload_len as usize];
            reader.read_exact(&mut payload)?;
            return parse_moov(&payload).map_err(ProbeError::from);
        }

        pos = reader.seek(SeekFrom::Start(box_end))?;
    }

    Err("no moov box".to_string().into())
}

fn parse_moov(moov: &[u8]) -> std::result::Result<Mp4Info, String> {
    let mut movie: Option<(u32, u64)> = None;
    let mut avc_dimensions = None;

    for child in BoxIter::new(moov) {
        let (kind, payload) = child?;
        if &kind == MVHD {
            movie = Some(parse_mvhd(payload)?);
        } else if &kind == TRAK {
            // 多个 H.264 轨时以最后一个为准
            if let Some(dims) = parse_trak(payload)? {
                avc_dimensions = Some(dims);
            }
        }
    }

    let (timescale, duration) = movie.ok_or("no mvhd box")?;
    if timescale == 0 {
        return Err("mvhd timescale is zero".to_string());
    }
    let millis = u128::from(duration) * 1000 / u128::from(timescale);
    let millis = u64::try_from(millis).map_err(|_| format!("duration overflow: {}", millis))?;

    Ok(Mp4Info {
        duration: Duration::from_millis(millis),
        avc_dimensions,
    })
}

/// 返回 (timescale, duration)
fn parse_mvhd(data: &[u8]) -> std::result::Result<(u32, u64), String> {
    let (version, _flags) = read_version_and_flags(data)?;
    match version {
        0 => Ok((be_u32(data, 12)?, u64::from(be_u32(data, 16)?))),
        1 => Ok((be_u32(data, 20)?, be_u64(data, 24)?)),
        v => Err(format!("unsupported mvhd version {}", v)),
    }
}

fn parse_trak(trak: &[u8]) -> std::result::Result<Option<(u32, u32)>, String> {
    let Some(stsd) = find_path(trak, &[MDIA, MINF, STBL, STSD])? else {
        return Ok(None);
    };
    // version/flags + entry_count
    let entries = stsd.get(8..).ok_or("truncated stsd")?;
    for entry in BoxIter::new(entries) {
        let (kind, payload) = entry?;
        if &kind == AVC1 {
            // SampleEntry(8) + VisualSampleEntry 预留字段(16) 之后是 width/height
            let width = u32::from(be_u16(payload, 24)?);
            let height = u32::from(be_u16(payload, 26)?);
            if width == 0 || height == 0 {
                return Ok(None);
            }
            return Ok(Some((width, height)));
        }
    }
    Ok(None)
}

fn find_path<'a>(data: &'a [u8], path: &[&FourCC]) -> std::result::Result<Option<&'a [u8]>, String> {
    let Some((first, rest)) = path.split_first() else {
        return Ok(Some(data));
    };
    for child in BoxIter::new(data) {
        let (kind, payload) = child?;
        if &kind == *first {
            return find_path(payload, rest);
        }
    }
    Ok(None)
}

/// 在内存切片上迭代子 box
struct BoxIter<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> BoxIter<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }
}

impl<'a> Iterator for BoxIter<'a> {
    type Item = std::result::Result<(FourCC, &'a [u8]), String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset + 8 > self.data.len() {
            return None;
        }
        let item = self.read_child();
        if item.is_err() {
            // 结构损坏后不再继续迭代
            self.offset = self.data.len();
        }
        Some(item)
    }
}

impl<'a> BoxIter<'a> {
    fn read_child(&mut self) -> std::result::Result<(FourCC, &'a [u8]), String> {
        let start = self.offset;
        let size = be_u32(self.data, start)? as usize;
        let kind = fourcc(self.data, start + 4)?;
        let (box_size, header_len) = match size {
            0 => (self.data.len() - start, 8),
            1 => {
                let large = be_u64(self.data, start + 8)?;
                let large = usize::try_from(large).map_err(|_| "box size overflow".to_string())?;
                (large, 16)
            }
            n => (n, 8),
        };
        let end = start
            .checked_add(box_size)
            .filter(|end| box_size >= header_len && *end <= self.data.len())
            .ok_or_else(|| format!("box {} has invalid size {}", format_fourcc(&kind), box_size))?;
        self.offset = end;
        Ok((kind, &self.data[start + header_len..end]))
    }
}

pub fn format_fourcc(fourcc: &FourCC) -> String {
    std::str::from_utf8(fourcc).unwrap_or("????").to_string()
}

fn fourcc(data: &[u8], offset: usize) -> std::result::Result<FourCC, String> {
    data.get(offset..offset + 4)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| "out of bounds while reading box type".to_string())
}

fn be_u16(data: &[u8], offset: usize) -> std::result::Result<u16, String> {
    data.get(offset..offset + 2)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u16::from_be_bytes)
        .ok_or_else(|| "out of bounds while reading u16".to_string())
}

fn be_u32(data: &[u8], offset: usize) -> std::result::Result<u32, String> {
    data.get(offset..offset + 4)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u32::from_be_bytes)
        .ok_or_else(|| "out of bounds while reading u32".to_string())
}

fn be_u64(data: &[u8], offset: usize) -> std::result::Result<u64, String> {
    data.get(offset..offset + 8)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u64::from_be_bytes)
        .ok_or_else(|| "out of bounds while reading u64".to_string())
}

fn read_version_and_flags(data: &[u8]) -> std::result::Result<(u8, u32), String> {
    let word = be_u32(data, 0)?;
    Ok(((word >> 24) as u8, word & 0x00ff_ffff))
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn probes_duration_and_avc_dimensions() {
        let bytes = fixture::build(1000, 10_900, Some((1280, 720)));
        let info = probe(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(info.duration, Duration::from_millis(10_900));
        assert_eq!(info.avc_dimensions, Some((1280, 720)));
    }

    #[test]
    fn duration_is_truncated_to_milliseconds() {
        // 90000 时基下 1351351 个单位 = 15015.0111... ms
        let bytes = fixture::build(90_000, 1_351_351, Some((640, 360)));
        let info = probe(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(info.duration, Duration::from_millis(15_015));
    }

    #[test]
    fn audio_only_file_has_no_dimensions() {
        let bytes = fixture::build(1000, 5_000, None);
        let info = probe(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(info.avc_dimensions, None);
    }

    #[test]
    fn rejects_files_without_moov() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&16u32.to_be_bytes());
        bytes.extend_from_slice(b"ftyp");
        bytes.extend_from_slice(b"isom\0\0\0\0");
        assert!(matches!(probe(&mut Cursor::new(bytes)), Err(ProbeError::Format(_))));
    }

    #[test]
    fn rejects_box_size_past_end_of_file() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&16u32.to_be_bytes());
        bytes.extend_from_slice(b"ftyp");
        bytes.extend_from_slice(b"isom\0\0\0\0");
        // largesize 接近 u64::MAX，不能回绕到文件开头
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(b"free");
        bytes.extend_from_slice(&(u64::MAX - 15).to_be_bytes());
        assert!(matches!(probe(&mut Cursor::new(bytes)), Err(ProbeError::Format(_))));
    }

    #[test]
    fn rejects_nested_box_size_overflow() {
        let mut moov = Vec::new();
        moov.extend_from_slice(&1u32.to_be_bytes());
        moov.extend_from_slice(b"trak");
        moov.extend_from_slice(&u64::MAX.to_be_bytes());
        let mut items = BoxIter::new(&moov);
        assert!(matches!(items.next(), Some(Err(_))));
        assert!(items.next().is_none());
    }

    #[test]
    fn rejects_truncated_boxes() {
        let mut bytes = fixture::build(1000, 5_000, Some((640, 360)));
        bytes.truncate(bytes.len() - 10);
        assert!(probe(&mut Cursor::new(bytes)).is_err());
    }
}
