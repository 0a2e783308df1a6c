//! Fixtures shared by unit tests.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;

/// Write `data` to `path` as a single gzip member.
pub fn write_gz_bytes(path: &Path, data: &[u8]) {
    let mut encoder = GzEncoder::new(File::create(path).unwrap(), Compression::fast());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap();
}

/// Write newline-terminated `lines` to `path`, gzip-compressed.
pub fn write_gz(path: &Path, lines: &[&str]) {
    let mut data = Vec::new();
    for line in lines {
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');
    }
    write_gz_bytes(path, &data);
}

/// Write newline-terminated `lines` to `path` uncompressed.
pub fn write_plain(path: &Path, lines: &[&str]) {
    let mut data = String::new();
    for line in lines {
        data.push_str(line);
        data.push('\n');
    }
    std::fs::write(path, data).unwrap();
}

/// Read `path` and split it into lines.
pub fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}
