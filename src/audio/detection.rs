//! Byte-level format sniffing
//!
//! Classification looks only at the first four bytes of a file, never at
//! its extension, so renamed files are still routed correctly.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Input format as classified from the file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Flac,
    Mp3,
    Unrecognized,
}

const FLAC_MAGIC: &[u8; 4] = b"fLaC";
const ID3_MAGIC: &[u8; 3] = b"ID3";

/// Sniff a file's format from its first four bytes
///
/// Unreadable or too-short files classify as `Unrecognized` rather than
/// failing the scan.
pub fn detect_format(path: &Path) -> AudioFormat {
    match File::open(path) {
        Ok(file) => sniff_reader(file),
        Err(_) => AudioFormat::Unrecognized,
    }
}

/// Fill the header buffer until full or EOF; a single `read` call may
/// legally return fewer bytes than are available.
fn sniff_reader<R: Read>(mut reader: R) -> AudioFormat {
    let mut header = [0u8; 4];
    let mut filled = 0;
    while filled < header.len() {
        match reader.read(&mut header[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(_) => return AudioFormat::Unrecognized,
        }
    }
    classify_header(&header[..filled])
}

fn classify_header(header: &[u8]) -> AudioFormat {
    if header.len() >= 4 && &header[..4] == FLAC_MAGIC {
        return AudioFormat::Flac;
    }
    if header.len() >= 3 && &header[..3] == ID3_MAGIC {
        return AudioFormat::Mp3;
    }
    // MPEG frame sync for the common bitrate/version combos
    if header.len() >= 2 && matches!(&header[..2], [0xFF, 0xFB] | [0xFF, 0xF3] | [0xFF, 0xF2]) {
        return AudioFormat::Mp3;
    }
    AudioFormat::Unrecognized
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn file_with_bytes(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn test_flac_magic_detected() {
        assert_eq!(classify_header(b"fLaC"), AudioFormat::Flac);
        assert_eq!(classify_header(b"fLaC\x00\x00"), AudioFormat::Flac);
    }

    #[test]
    fn test_id3_tag_detected_as_mp3() {
        assert_eq!(classify_header(b"ID3\x04"), AudioFormat::Mp3);
    }

    #[test]
    fn test_mpeg_frame_sync_detected_as_mp3() {
        assert_eq!(classify_header(&[0xFF, 0xFB, 0x90, 0x00]), AudioFormat::Mp3);
        assert_eq!(classify_header(&[0xFF, 0xF3, 0x00, 0x00]), AudioFormat::Mp3);
        assert_eq!(classify_header(&[0xFF, 0xF2, 0x00, 0x00]), AudioFormat::Mp3);
    }

    #[test]
    fn test_other_sync_bytes_not_mp3() {
        assert_eq!(classify_header(&[0xFF, 0xFA, 0x00, 0x00]), AudioFormat::Unrecognized);
    }

    #[test]
    fn test_unrelated_header_unrecognized() {
        assert_eq!(classify_header(b"RIFF"), AudioFormat::Unrecognized);
        assert_eq!(classify_header(b"OggS"), AudioFormat::Unrecognized);
    }

    #[test]
    fn test_short_and_empty_headers_unrecognized() {
        assert_eq!(classify_header(b""), AudioFormat::Unrecognized);
        assert_eq!(classify_header(b"fL"), AudioFormat::Unrecognized);
        assert_eq!(classify_header(b"ID"), AudioFormat::Unrecognized);
    }

    #[test]
    fn test_detect_format_reads_real_files() {
        let dir = tempfile::tempdir().unwrap();

        let flac = file_with_bytes(&dir, "a.flac", b"fLaC\x00\x00\x00\x22");
        assert_eq!(detect_format(&flac), AudioFormat::Flac);

        let mp3 = file_with_bytes(&dir, "b.mp3", b"ID3\x04\x00");
        assert_eq!(detect_format(&mp3), AudioFormat::Mp3);

        let text = file_with_bytes(&dir, "c.txt", b"hello world");
        assert_eq!(detect_format(&text), AudioFormat::Unrecognized);
    }

    #[test]
    fn test_detect_format_never_fails_on_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let empty = file_with_bytes(&dir, "empty", b"");
        assert_eq!(detect_format(&empty), AudioFormat::Unrecognized);
    }

    /// A reader that hands out one byte per `read` call, the way a
    /// pipe or a slow filesystem may.
    struct OneByteReader<'a> {
        data: &'a [u8],
    }

    impl Read for OneByteReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.data.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.data[0];
            self.data = &self.data[1..];
            Ok(1)
        }
    }

    #[test]
    fn test_sniff_survives_short_reads() {
        let flac = OneByteReader { data: b"fLaC\x00\x00" };
        assert_eq!(sniff_reader(flac), AudioFormat::Flac);

        let mp3 = OneByteReader { data: b"ID3\x04" };
        assert_eq!(sniff_reader(mp3), AudioFormat::Mp3);

        let short = OneByteReader { data: b"fL" };
        assert_eq!(sniff_reader(short), AudioFormat::Unrecognized);
    }

    #[test]
    fn test_detect_format_missing_file_unrecognized() {
        assert_eq!(
            detect_format(Path::new("/nonexistent/file.flac")),
            AudioFormat::Unrecognized
        );
    }
}
