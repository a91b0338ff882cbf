//! Raw CAPPI product decoding
//!
//! Each product is a gzip stream whose first `rows * cols * 4` bytes are a
//! row-major grid of little-endian `f32` reflectivities. Anything after that
//! payload is ignored.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::debug;

use crate::error::{Result, WrlrError};
use crate::grid::ReflectivityGrid;
use crate::sites::Site;

/// Returns below this reflectivity are treated as noise (dBZ)
pub const NOISE_FLOOR_DBZ: f32 = -15.0;

/// Timestamp layout embedded in product names (`..._20140601120700.raw.gz`)
pub const SCAN_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// One decoded product
#[derive(Debug, Clone)]
pub struct CappiScan {
    pub path: PathBuf,
    pub scanned_at: NaiveDateTime,
    pub grid: ReflectivityGrid,
}

/// Parse the scan time from a product name
///
/// The timestamp is the text after the last `_` and before the first `.`.
///
/// # Errors
///
/// Returns [`WrlrError::InvalidTimestamp`] if the name carries no timestamp.
pub fn parse_scan_time(path: &Path) -> Result<NaiveDateTime> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| WrlrError::InvalidTimestamp(path.display().to_string()))?;
    let stamp = name
        .rsplit('_')
        .next()
        .and_then(|tail| tail.split('.').next())
        .unwrap_or_default();
    NaiveDateTime::parse_from_str(stamp, SCAN_TIME_FORMAT)
        .map_err(|_| WrlrError::InvalidTimestamp(name.to_string()))
}

/// Decode a raw product stream on the site's full grid
///
/// The sentinel is read from the reference cell; NaN and sub-noise values are
/// replaced by it. Rows and columns are flipped according to the site
/// orientation so that row 0 is the southern edge.
///
/// # Errors
///
/// Returns [`WrlrError::TruncatedPayload`] if the stream ends before the grid
/// is complete, or an I/O error from decompression.
pub fn decode<R: Read>(reader: R, site: &Site, path: &Path) -> Result<ReflectivityGrid> {
    let (rows, cols) = site.shape;
    let expected = site.raw_byte_len();

    let mut bytes = Vec::with_capacity(expected);
    GzDecoder::new(reader)
        .take(expected as u64)
        .read_to_end(&mut bytes)?;
    if bytes.len() < expected {
        return Err(WrlrError::TruncatedPayload {
            path: path.to_path_buf(),
            expected,
            found: bytes.len(),
        });
    }

    let values: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    let mut grid = ReflectivityGrid::from_raw(values, rows, cols, NOISE_FLOOR_DBZ)?;
    grid.orient(site.y_direction, site.x_direction);
    Ok(grid)
}

/// Open and decode one product file
///
/// With `crop` set, the oriented grid is reduced to the site's inner box.
///
/// # Errors
///
/// Fails on I/O errors, a truncated payload, or a name without a timestamp.
pub fn read_scan<P: AsRef<Path>>(path: P, site: &Site, crop: bool) -> Result<CappiScan> {
    let path = path.as_ref();
    let scanned_at = parse_scan_time(path)?;
    let file = File::open(path)?;
    let mut grid = decode(BufReader::new(file), site, path)?;

    if crop {
        let (r0, c0) = site.box_ul;
        let (r1, c1) = site.box_lr;
        grid = grid.crop(r0, r1, c0, c1)?;
    }

    debug!(
        path = %path.display(),
        valid = grid.valid_count(),
        "Decoded CAPPI scan"
    );

    Ok(CappiScan {
        path: path.to_path_buf(),
        scanned_at,
        grid,
    })
}

/// Write row-major values as a gzip-compressed raw product
///
/// # Errors
///
/// Returns an I/O error if the file cannot be written.
pub fn write_raw<P: AsRef<Path>>(path: P, values: &[f32]) -> Result<()> {
    let file = File::create(path)?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    for value in values {
        encoder.write_all(&value.to_le_bytes())?;
    }
    encoder.finish()?.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scan_time() {
        let path = Path::new("/data/Radar/BR_PP/2014/06/BRU_CAPPI_20140601120700.raw.gz");
        let time = parse_scan_time(path).unwrap();
        assert_eq!(time.to_string(), "2014-06-01 12:07:00");

        assert!(matches!(
            parse_scan_time(Path::new("notes.txt")),
            Err(WrlrError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_truncated_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("PC_20140101000100.raw.gz");
        write_raw(&path, &[1.0; 1000]).unwrap();

        let err = read_scan(&path, &Site::pico_do_couto(), false).unwrap_err();
        match err {
            WrlrError::TruncatedPayload {
                expected, found, ..
            } => {
                assert_eq!(expected, 500 * 500 * 4);
                assert_eq!(found, 4000);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_replaces_noise_and_flips() {
        let site = Site::bauru();
        let (rows, cols) = site.shape;
        let mut values = vec![10.0_f32; rows * cols];
        values[2 * cols + 2] = -9999.0;
        values[cols + 7] = f32::NAN;
        values[5] = -20.0;
        // Last stored row becomes row 0 after the flip
        values[(rows - 1) * cols] = 33.0;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("BRU_20140601120700.raw.gz");
        write_raw(&path, &values).unwrap();

        let scan = read_scan(&path, &site, false).unwrap();
        let grid = &scan.grid;
        assert_eq!(grid.sentinel(), -9999.0);
        assert_eq!(grid.get(0, 0), 33.0);
        assert!(grid.is_invalid(rows - 1, 5));
        assert!(grid.is_invalid(rows - 2, 7));
        assert!(grid.is_invalid(rows - 3, 2));
        assert_eq!(grid.valid_count(), rows * cols - 3);
    }

    #[test]
    fn test_crop_to_inner_box() {
        let site = Site::sao_roque();
        let (rows, cols) = site.shape;
        let mut values = vec![-9999.0_f32; rows * cols];
        values[150 * cols + 150] = 42.0;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SR_20140101001100.raw.gz");
        write_raw(&path, &values).unwrap();

        let scan = read_scan(&path, &site, true).unwrap();
        assert_eq!(scan.grid.shape(), (200, 200));
        assert_eq!(scan.grid.get(0, 0), 42.0);
        assert_eq!(scan.grid.valid_count(), 1);
    }
}
