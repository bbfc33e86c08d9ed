use std::fmt;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::error::KeyError;

/// Number of leading bytes inspected by the magic-byte heuristic.
pub const MAGIC_LEN: usize = 4;

/// Container format of a key file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFileFormat {
    Pem,
    Der,
    Pkcs12,
    Jceks,
    Unknown,
}

impl KeyFileFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyFileFormat::Pem => "PEM",
            KeyFileFormat::Der => "DER",
            KeyFileFormat::Pkcs12 => "PKCS12",
            KeyFileFormat::Jceks => "JCEKS",
            KeyFileFormat::Unknown => "UNKNOWN",
        }
    }

    /// Guess from the file extension, case-insensitively.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pem" | "crt" | "p7b" | "p7c" => Some(KeyFileFormat::Pem),
            "der" => Some(KeyFileFormat::Der),
            _ => None,
        }
    }

    /// Best-effort guess from the first four bytes of the file.
    pub fn from_magic(head: &[u8; MAGIC_LEN]) -> Option<Self> {
        let magic = u32::from_be_bytes(*head);
        match magic {
            // JCEKS / JKS keystores
            0xCECE_CECE | 0xFEED_FEED => Some(KeyFileFormat::Jceks),
            // "----" or "CONN" (what s_client prints)
            0x2D2D_2D2D | 0x434F_4E4E => Some(KeyFileFormat::Pem),
            // ASN.1 SEQUENCE with a two byte length, either PKCS12 or X.509
            m if m & 0xFFFF_0000 == 0x3082_0000 => {
                if m & 0x0000_FF00 == 0x0000_0300 {
                    Some(KeyFileFormat::Der)
                } else {
                    Some(KeyFileFormat::Pkcs12)
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for KeyFileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyFileFormat {
    type Err = std::convert::Infallible;

    /// Hints are trusted as given; names we cannot act on map to `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "PEM" => KeyFileFormat::Pem,
            "DER" => KeyFileFormat::Der,
            "PKCS12" => KeyFileFormat::Pkcs12,
            "JCEKS" => KeyFileFormat::Jceks,
            _ => KeyFileFormat::Unknown,
        })
    }
}

/// Reader that can look at its first bytes without consuming them.
///
/// Peeked bytes are replayed by `read` before the inner reader is touched
/// again, so detection leaves the stream intact for extraction.
pub struct PeekReader<R> {
    inner: R,
    head: [u8; MAGIC_LEN],
    filled: usize,
    pos: usize,
}

impl<R: Read> PeekReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            head: [0; MAGIC_LEN],
            filled: 0,
            pos: 0,
        }
    }

    /// Returns the first `MAGIC_LEN` bytes of the stream.
    ///
    /// Fails with `UnexpectedEof` when the stream is shorter than that.
    pub fn peek(&mut self) -> io::Result<&[u8; MAGIC_LEN]> {
        if self.pos != 0 {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "cannot peek after reading",
            ));
        }
        while self.filled < MAGIC_LEN {
            match self.inner.read(&mut self.head[self.filled..]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "key file is too short to identify",
                    ));
                }
                Ok(n) => self.filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(&self.head)
    }
}

impl<R: Read> Read for PeekReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos < self.filled {
            let n = (self.filled - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.head[self.pos..self.pos + n]);
            self.pos += n;
            return Ok(n);
        }
        self.inner.read(buf)
    }
}

/// Works out the container format of a key file.
///
/// An explicit hint wins, then the filename extension, then the magic bytes
/// at the start of the stream.
pub fn detect_format<R: Read>(
    reader: &mut PeekReader<R>,
    filename: &Path,
    hint: Option<&str>,
) -> Result<KeyFileFormat, KeyError> {
    if let Some(hint) = hint.filter(|h| !h.is_empty()) {
        let format: KeyFileFormat = hint.parse().unwrap_or(KeyFileFormat::Unknown);
        debug!(file = %filename.display(), %format, "key format from hint");
        return Ok(format);
    }

    if let Some(format) = KeyFileFormat::from_extension(filename) {
        debug!(file = %filename.display(), %format, "key format from extension");
        return Ok(format);
    }

    let head = reader.peek()?;
    let format = KeyFileFormat::from_magic(head).ok_or(KeyError::UnrecognizedFormat)?;
    debug!(file = %filename.display(), %format, "key format from magic bytes");
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn detect(data: &[u8], filename: &str, hint: Option<&str>) -> Result<KeyFileFormat, KeyError> {
        let mut reader = PeekReader::new(Cursor::new(data.to_vec()));
        detect_format(&mut reader, Path::new(filename), hint)
    }

    #[test]
    fn hint_wins_over_extension_and_magic() {
        let format = detect(b"-----BEGIN", "key.der", Some("jceks")).unwrap();
        assert_eq!(format, KeyFileFormat::Jceks);
    }

    #[test]
    fn empty_hint_is_ignored() {
        let format = detect(b"garbage", "key.der", Some("")).unwrap();
        assert_eq!(format, KeyFileFormat::Der);
    }

    #[test]
    fn unknown_hint_maps_to_unknown() {
        let format = detect(b"-----BEGIN", "key.pem", Some("openssh")).unwrap();
        assert_eq!(format, KeyFileFormat::Unknown);
    }

    #[test]
    fn extension_is_case_insensitive() {
        for name in ["a.pem", "a.PEM", "a.Crt", "a.p7b", "a.P7C"] {
            assert_eq!(detect(b"\0\0\0\0", name, None).unwrap(), KeyFileFormat::Pem, "{name}");
        }
        assert_eq!(detect(b"arbitrary", "a.DER", None).unwrap(), KeyFileFormat::Der);
    }

    #[test]
    fn pem_detected_by_magic_regardless_of_extension() {
        assert_eq!(detect(b"-----BEGIN RSA", "key.bin", None).unwrap(), KeyFileFormat::Pem);
        assert_eq!(detect(b"CONNECTED(00000003)", "out.txt", None).unwrap(), KeyFileFormat::Pem);
    }

    #[test]
    fn keystore_magic_detected_without_extension() {
        assert_eq!(detect(&[0xCE, 0xCE, 0xCE, 0xCE, 0], "keystore", None).unwrap(), KeyFileFormat::Jceks);
        assert_eq!(detect(&[0xFE, 0xED, 0xFE, 0xED], "keystore", None).unwrap(), KeyFileFormat::Jceks);
    }

    #[test]
    fn asn1_sequence_splits_on_third_byte() {
        assert_eq!(detect(&[0x30, 0x82, 0x03, 0x10], "key", None).unwrap(), KeyFileFormat::Der);
        assert_eq!(detect(&[0x30, 0x82, 0x02, 0x5d], "key", None).unwrap(), KeyFileFormat::Pkcs12);
    }

    #[test]
    fn unknown_magic_is_rejected() {
        let err = detect(b"PK\x03\x04", "archive", None).unwrap_err();
        assert!(matches!(err, KeyError::UnrecognizedFormat));
    }

    #[test]
    fn short_stream_is_an_io_error() {
        let err = detect(b"--", "key", None).unwrap_err();
        assert!(matches!(err, KeyError::Io(_)));
    }

    #[test]
    fn peeked_bytes_are_replayed() {
        let mut reader = PeekReader::new(Cursor::new(b"-----BEGIN X-----".to_vec()));
        assert_eq!(reader.peek().unwrap(), b"----");
        let mut all = String::new();
        reader.read_to_string(&mut all).unwrap();
        assert_eq!(all, "-----BEGIN X-----");
    }
}
