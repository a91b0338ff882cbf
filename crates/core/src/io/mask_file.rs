//! Convective mask persistence
//!
//! Masks are stored as a whitespace-separated text matrix, one grid row per
//! line. Writing emits `0`/`1`; reading accepts any numeric token and treats
//! non-zero as `true`, so matrices saved by numpy (`1.000000000000000000e+00`)
//! load unchanged. Paths ending in `.gz` are gzip-compressed.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{Result, WrlrError};
use crate::grid::ConvectiveMask;

/// Directory component holding raw products
pub const RADAR_DIR: &str = "Radar";
/// Directory component that replaces [`RADAR_DIR`] for masks
pub const STEINER_DIR: &str = "Steiner";

const RAW_SUFFIX: &str = "raw.gz";
const MASK_SUFFIX: &str = "npy.gz";

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Serialize a mask as a text matrix
///
/// # Errors
///
/// Returns an I/O error if writing fails.
pub fn write_mask<W: Write>(mut writer: W, mask: &ConvectiveMask) -> Result<()> {
    let cols = mask.cols();
    if cols > 0 {
        for row in mask.as_slice().chunks(cols) {
            let line: Vec<&str> = row.iter().map(|&v| if v { "1" } else { "0" }).collect();
            writeln!(writer, "{}", line.join(" "))?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Parse a text matrix into a mask
///
/// Blank lines are skipped.
///
/// # Errors
///
/// Returns [`WrlrError::Malformed`] for non-numeric tokens or ragged rows.
pub fn read_mask<R: BufRead>(reader: R) -> Result<ConvectiveMask> {
    let mut data = Vec::new();
    let mut rows = 0;
    let mut cols = None;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let before = data.len();
        for token in line.split_whitespace() {
            let value: f64 = token.parse().map_err(|_| WrlrError::Malformed {
                line: index + 1,
                message: format!("not a number: '{token}'"),
            })?;
            data.push(value != 0.0);
        }
        let width = data.len() - before;
        match cols {
            None => cols = Some(width),
            Some(expected) if expected != width => {
                return Err(WrlrError::Malformed {
                    line: index + 1,
                    message: format!("expected {expected} values, found {width}"),
                });
            }
            Some(_) => {}
        }
        rows += 1;
    }

    ConvectiveMask::from_vec(data, rows, cols.unwrap_or(0))
}

/// Write a mask to `path`, compressing when it ends in `.gz`
///
/// # Errors
///
/// Returns an I/O error if the file cannot be created or written.
pub fn save_mask<P: AsRef<Path>>(path: P, mask: &ConvectiveMask) -> Result<()> {
    let path = path.as_ref();
    let file = BufWriter::new(File::create(path)?);
    if is_gzip(path) {
        let mut encoder = GzEncoder::new(file, Compression::default());
        write_mask(&mut encoder, mask)?;
        encoder.finish()?.flush()?;
    } else {
        write_mask(file, mask)?;
    }
    Ok(())
}

/// Load a mask from `path`, decompressing when it ends in `.gz`
///
/// # Errors
///
/// Returns an I/O error or [`WrlrError::Malformed`] for bad content.
pub fn load_mask<P: AsRef<Path>>(path: P) -> Result<ConvectiveMask> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let reader: Box<dyn Read> = if is_gzip(path) {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    read_mask(BufReader::new(reader))
}

/// Load the mask at `path` if the file exists
///
/// # Errors
///
/// Same as [`load_mask`] for an existing file.
pub fn load_mask_if_present<P: AsRef<Path>>(path: P) -> Result<Option<ConvectiveMask>> {
    let path = path.as_ref();
    if path.is_file() {
        load_mask(path).map(Some)
    } else {
        Ok(None)
    }
}

/// Counterpart of a raw product path in the mask tree
///
/// Every `Radar` directory component becomes `Steiner`, and a trailing
/// `raw.gz` in the file name becomes `npy.gz`.
pub fn steiner_path(raw: &Path) -> PathBuf {
    let mut out: PathBuf = raw
        .components()
        .map(|component| match component {
            Component::Normal(name) if name == RADAR_DIR => Component::Normal(STEINER_DIR.as_ref()),
            other => other,
        })
        .collect();

    if let Some(name) = raw.file_name().and_then(|n| n.to_str()) {
        if let Some(stem) = name.strip_suffix(RAW_SUFFIX) {
            out.set_file_name(OsString::from(format!("{stem}{MASK_SUFFIX}")));
        }
    }
    out
}

/// Create the mask-tree counterpart of every directory under `root`
///
/// Returns the number of directories ensured.
///
/// # Errors
///
/// Returns an I/O error if a directory cannot be listed or created.
pub fn mirror_dirs<P: AsRef<Path>>(root: P) -> Result<usize> {
    let mut pending = vec![root.as_ref().to_path_buf()];
    let mut created = 0;
    while let Some(dir) = pending.pop() {
        fs::create_dir_all(steiner_path(&dir))?;
        created += 1;
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                pending.push(entry.path());
            }
        }
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_mask() -> ConvectiveMask {
        let mut mask = ConvectiveMask::new(3, 4);
        mask.set(0, 1, true);
        mask.set(2, 3, true);
        mask
    }

    #[test]
    fn test_text_format() {
        let mut out = Vec::new();
        write_mask(&mut out, &sample_mask()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0 1 0 0\n0 0 0 0\n0 0 0 1\n");
    }

    #[test]
    fn test_reads_numpy_savetxt_output() {
        let text = "0.000000000000000000e+00 1.000000000000000000e+00\n\
                    1.000000000000000000e+00 0.000000000000000000e+00\n";
        let mask = read_mask(text.as_bytes()).unwrap();
        assert_eq!(mask.shape(), (2, 2));
        assert_eq!(mask.as_slice(), &[false, true, true, false]);
    }

    #[test]
    fn test_rejects_ragged_and_garbage() {
        assert!(matches!(
            read_mask("0 1\n0\n".as_bytes()),
            Err(WrlrError::Malformed { line: 2, .. })
        ));
        assert!(matches!(
            read_mask("0 x\n".as_bytes()),
            Err(WrlrError::Malformed { line: 1, .. })
        ));
    }

    #[test]
    fn test_gz_and_plain_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["mask.txt", "mask.npy.gz"] {
            let path = dir.path().join(name);
            save_mask(&path, &sample_mask()).unwrap();
            assert_eq!(load_mask(&path).unwrap(), sample_mask());
        }

        let raw = fs::read(dir.path().join("mask.npy.gz")).unwrap();
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn test_missing_mask_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_mask_if_present(dir.path().join("absent.npy.gz"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_steiner_path() {
        let raw = Path::new("/data/Radar/BR_PP/2014/06/BRU_20140601120700.raw.gz");
        assert_eq!(
            steiner_path(raw),
            PathBuf::from("/data/Steiner/BR_PP/2014/06/BRU_20140601120700.npy.gz")
        );
        // Only whole components are renamed
        assert_eq!(
            steiner_path(Path::new("RadarData/x.raw.gz")),
            PathBuf::from("RadarData/x.npy.gz")
        );
    }

    #[test]
    fn test_mirror_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let radar = dir.path().join("Radar");
        fs::create_dir_all(radar.join("2014/06")).unwrap();
        fs::create_dir_all(radar.join("2014/07")).unwrap();

        assert_eq!(mirror_dirs(&radar).unwrap(), 4);
        assert!(dir.path().join("Steiner/2014/06").is_dir());
        assert!(dir.path().join("Steiner/2014/07").is_dir());
    }
}
