/// Vocabulary readers.
///
/// Fixed-binary layout (all fields little-endian):
///
/// ```text
/// u32 max_token_length
/// repeated until EOF:
///     f32 score
///     i32 len
///     u8[len] token
/// ```
///
/// Rank layout: one `<base64 token> <rank>` pair per non-empty line, the
/// format tiktoken publishes its encodings in.
use std::str::FromStr;

use base64::Engine;
use log::debug;

use crate::error::{Error, Result};
use crate::queue::ScoreOrder;
use crate::vocab::Vocabulary;

const RECORD_HEADER: usize = 8; // f32 + i32

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocabFormat {
    FixedBinary,
    RankLines,
}

impl FromStr for VocabFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "binary" | "bin" => Ok(VocabFormat::FixedBinary),
            "rank" | "tiktoken" => Ok(VocabFormat::RankLines),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

impl Vocabulary {
    pub fn load(format: VocabFormat, data: &[u8]) -> Result<Self> {
        match format {
            VocabFormat::FixedBinary => Self::from_fixed_binary(data),
            VocabFormat::RankLines => Self::from_rank_lines(data),
        }
    }

    pub fn from_fixed_binary(data: &[u8]) -> Result<Self> {
        let max_token_length = read_u32(data, 0)?;
        let mut vocab = Vocabulary::new(ScoreOrder::Descending);
        vocab.set_max_token_length(max_token_length);

        let mut off = 4;
        while off < data.len() {
            let score = f32::from_bits(read_u32(data, off)?);
            let len = read_u32(data, off + 4)? as i32;
            if len < 0 {
                return Err(Error::InvalidLength { offset: off + 4, len });
            }
            off += RECORD_HEADER;
            let token = read_bytes(data, off, len as usize)?;
            off += token.len();
            vocab.add_entry(token, score as f64);
        }

        debug!(
            "loaded fixed-binary vocabulary: {} entries ({} shadowed), max token length {}",
            vocab.len(),
            vocab.duplicates(),
            max_token_length
        );
        Ok(vocab)
    }

    pub fn from_rank_lines(data: &[u8]) -> Result<Self> {
        let engine = base64::engine::general_purpose::STANDARD;
        let mut vocab = Vocabulary::new(ScoreOrder::Ascending);

        for (i, line) in data.split(|&b| b == b'\n').enumerate() {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.is_empty() {
                continue;
            }
            let lineno = i + 1;
            let sep = line
                .iter()
                .rposition(|&b| b == b' ')
                .ok_or_else(|| Error::MalformedLine {
                    line: lineno,
                    reason: "missing space separator".to_string(),
                })?;
            let token = engine
                .decode(&line[..sep])
                .map_err(|source| Error::Base64 { line: lineno, source })?;
            let rank = std::str::from_utf8(&line[sep + 1..])
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .ok_or_else(|| Error::MalformedLine {
                    line: lineno,
                    reason: format!("invalid rank {:?}", String::from_utf8_lossy(&line[sep + 1..])),
                })?;
            vocab.add_entry(token, rank as f64);
        }

        debug!(
            "loaded rank vocabulary: {} entries ({} shadowed)",
            vocab.len(),
            vocab.duplicates()
        );
        Ok(vocab)
    }
}

#[inline]
fn read_u32(data: &[u8], off: usize) -> Result<u32> {
    let b = read_bytes(data, off, 4)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

#[inline]
fn read_bytes(data: &[u8], off: usize, len: usize) -> Result<&[u8]> {
    data.get(off..off + len).ok_or_else(|| Error::Truncated {
        offset: off,
        needed: off + len - data.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(buf: &mut Vec<u8>, score: f32, token: &[u8]) {
        buf.extend_from_slice(&score.to_le_bytes());
        buf.extend_from_slice(&(token.len() as i32).to_le_bytes());
        buf.extend_from_slice(token);
    }

    #[test]
    fn fixed_binary_reads_records() {
        let mut buf = 7u32.to_le_bytes().to_vec();
        record(&mut buf, -1.5, b"a");
        record(&mut buf, 0.25, b"ab");
        record(&mut buf, 3.0, b"");

        let v = Vocabulary::from_fixed_binary(&buf).unwrap();
        assert_eq!(v.len(), 3);
        assert_eq!(v.max_token_length(), 7);
        assert_eq!(v.order(), ScoreOrder::Descending);
        assert_eq!(v.lookup(b"ab"), Some(1));
        assert_eq!(v.entry(0).unwrap().score, -1.5);
        assert_eq!(v.entry(2).unwrap().text, b"".to_vec());
    }

    #[test]
    fn fixed_binary_header_only_is_empty() {
        let v = Vocabulary::from_fixed_binary(&0u32.to_le_bytes()).unwrap();
        assert!(v.is_empty());
    }

    #[test]
    fn fixed_binary_rejects_truncation() {
        assert!(matches!(
            Vocabulary::from_fixed_binary(&[1, 0]),
            Err(Error::Truncated { offset: 0, needed: 2 })
        ));

        let mut buf = 4u32.to_le_bytes().to_vec();
        record(&mut buf, 1.0, b"abcd");
        buf.truncate(buf.len() - 1);
        assert!(matches!(
            Vocabulary::from_fixed_binary(&buf),
            Err(Error::Truncated { offset: 12, needed: 1 })
        ));

        // partial record header
        let mut buf = 4u32.to_le_bytes().to_vec();
        buf.extend_from_slice(&[0, 0, 0]);
        assert!(matches!(
            Vocabulary::from_fixed_binary(&buf),
            Err(Error::Truncated { .. })
        ));
    }

    #[test]
    fn fixed_binary_rejects_negative_length() {
        let mut buf = 4u32.to_le_bytes().to_vec();
        buf.extend_from_slice(&1.0f32.to_le_bytes());
        buf.extend_from_slice(&(-3i32).to_le_bytes());
        assert!(matches!(
            Vocabulary::from_fixed_binary(&buf),
            Err(Error::InvalidLength { offset: 8, len: -3 })
        ));
    }

    #[test]
    fn rank_lines_decode_tokens() {
        // "Hello" = SGVsbG8=, "World" = V29ybGQ=, "!" = IQ==
        let data = b"SGVsbG8= 0\r\n\nV29ybGQ= 1\nIQ== 2";
        let v = Vocabulary::from_rank_lines(data).unwrap();
        assert_eq!(v.len(), 3);
        assert_eq!(v.order(), ScoreOrder::Ascending);
        assert_eq!(v.lookup(b"Hello"), Some(0));
        assert_eq!(v.lookup(b"World"), Some(1));
        assert_eq!(v.score_of(b"!"), Some(2.0));
    }

    #[test]
    fn rank_lines_report_bad_lines() {
        assert!(matches!(
            Vocabulary::from_rank_lines(b"SGVsbG8= 0\nV29ybGQ=\n"),
            Err(Error::MalformedLine { line: 2, .. })
        ));
        assert!(matches!(
            Vocabulary::from_rank_lines(b"SGVsbG8= x"),
            Err(Error::MalformedLine { line: 1, .. })
        ));
        assert!(matches!(
            Vocabulary::from_rank_lines(b"\n!!!! 3"),
            Err(Error::Base64 { line: 2, .. })
        ));
    }

    #[test]
    fn format_names() {
        assert_eq!("bin".parse::<VocabFormat>().unwrap(), VocabFormat::FixedBinary);
        assert_eq!("tiktoken".parse::<VocabFormat>().unwrap(), VocabFormat::RankLines);
        assert!(matches!(
            "gguf".parse::<VocabFormat>(),
            Err(Error::UnknownFormat(s)) if s == "gguf"
        ));

        let v = Vocabulary::load(VocabFormat::RankLines, b"YQ== 0\n").unwrap();
        assert_eq!(v.lookup(b"a"), Some(0));
    }
}
