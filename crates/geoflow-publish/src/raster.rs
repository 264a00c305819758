//! GeoTIFF reading: first band values, bounds and declared EPSG code.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

use crate::error::{PublishError, PublishResult};

/// ProjectedCSTypeGeoKey.
const PROJECTED_CS_KEY: u16 = 3072;
/// GeographicTypeGeoKey.
const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
/// Marks a user-defined (non-EPSG) value.
const USER_DEFINED: u16 = 32767;

/// What the publisher needs to know about a raster.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterInfo {
    pub width: u32,
    pub height: u32,
    /// First band, row-major.
    pub values: Vec<f64>,
    /// `[minx, miny, maxx, maxy]` in the raster's own CRS, when georeferenced.
    pub bounds: Option<[f64; 4]>,
    /// EPSG code from the GeoKey directory, if declared.
    pub epsg: Option<i32>,
}

/// Read a GeoTIFF from disk.
pub fn read(path: &Path) -> PublishResult<RasterInfo> {
    let file = File::open(path)?;
    let mut decoder = Decoder::new(BufReader::new(file))?;
    let (width, height) = decoder.dimensions()?;

    let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag).ok();
    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag).ok();
    let geokeys = decoder.get_tag_u16_vec(Tag::GeoKeyDirectoryTag).ok();

    let samples = to_f64(decoder.read_image()?);
    let pixels = (width as usize) * (height as usize);
    if pixels == 0 || samples.len() < pixels {
        return Err(PublishError::Raster(format!(
            "{} samples for a {width}x{height} image",
            samples.len()
        )));
    }
    let per_pixel = samples.len() / pixels;
    let values = samples.into_iter().step_by(per_pixel).take(pixels).collect();

    Ok(RasterInfo {
        width,
        height,
        values,
        bounds: bounds(width, height, scale.as_deref(), tiepoint.as_deref()),
        epsg: geokeys.as_deref().and_then(epsg_from_geokeys),
    })
}

fn to_f64(result: DecodingResult) -> Vec<f64> {
    match result {
        DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::F64(v) => v,
    }
}

/// Bounds from the tiepoint and pixel scale tags.
fn bounds(
    width: u32,
    height: u32,
    scale: Option<&[f64]>,
    tiepoint: Option<&[f64]>,
) -> Option<[f64; 4]> {
    let (w, h) = (f64::from(width), f64::from(height));
    match (scale?, tiepoint?) {
        ([sx, sy, ..], [i, j, _, x, y, ..]) => {
            let minx = x - i * sx;
            let maxy = y + j * sy;
            Some([minx, maxy - h * sy, minx + w * sx, maxy])
        }
        _ => None,
    }
}

/// Projected CRS first, then geographic.
fn epsg_from_geokeys(directory: &[u16]) -> Option<i32> {
    let entries: Vec<&[u16]> = directory.get(4..)?.chunks_exact(4).collect();
    let lookup = |key: u16| {
        entries
            .iter()
            .find(|e| e[0] == key && e[1] == 0 && e[3] != USER_DEFINED)
            .map(|e| i32::from(e[3]))
    };
    lookup(PROJECTED_CS_KEY).or_else(|| lookup(GEOGRAPHIC_TYPE_KEY))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tiff::encoder::{colortype, TiffEncoder};

    /// Encode a single-band float GeoTIFF.
    fn geotiff(width: u32, height: u32, values: &[f32], epsg: Option<u16>) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut buffer).unwrap();
            let mut image = encoder
                .new_image::<colortype::Gray32Float>(width, height)
                .unwrap();
            image
                .encoder()
                .write_tag(Tag::ModelPixelScaleTag, &[30.0f64, 30.0, 0.0][..])
                .unwrap();
            image
                .encoder()
                .write_tag(
                    Tag::ModelTiepointTag,
                    &[0.0f64, 0.0, 0.0, 500_000.0, 9_900_000.0, 0.0][..],
                )
                .unwrap();
            if let Some(code) = epsg {
                image
                    .encoder()
                    .write_tag(
                        Tag::GeoKeyDirectoryTag,
                        &[1u16, 1, 0, 2, 1024, 0, 1, 1, PROJECTED_CS_KEY, 0, 1, code][..],
                    )
                    .unwrap();
            }
            image.write_data(values).unwrap();
        }
        buffer.into_inner()
    }

    #[test]
    fn test_read_geotiff() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dem.tif");
        let values: Vec<f32> = (0..6).map(|v| v as f32).collect();
        std::fs::write(&path, geotiff(3, 2, &values, Some(32736))).unwrap();

        let info = read(&path).unwrap();
        assert_eq!((info.width, info.height), (3, 2));
        assert_eq!(info.values, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(
            info.bounds,
            Some([500_000.0, 9_899_940.0, 500_090.0, 9_900_000.0])
        );
        assert_eq!(info.epsg, Some(32736));
    }

    #[test]
    fn test_read_without_geokeys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.tif");
        std::fs::write(&path, geotiff(1, 1, &[7.0], None)).unwrap();

        let info = read(&path).unwrap();
        assert_eq!(info.epsg, None);
    }

    #[test]
    fn test_read_without_georeference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.tif");
        let mut buffer = Cursor::new(Vec::new());
        TiffEncoder::new(&mut buffer)
            .unwrap()
            .write_image::<colortype::Gray32Float>(2, 1, &[1.0, 2.0])
            .unwrap();
        std::fs::write(&path, buffer.into_inner()).unwrap();

        let info = read(&path).unwrap();
        assert_eq!(info.values, vec![1.0, 2.0]);
        assert_eq!(info.bounds, None);
    }

    #[test]
    fn test_bounds_need_both_tags() {
        let scale = [30.0, 30.0, 0.0];
        let tiepoint = [0.0, 0.0, 0.0, 100.0, 200.0, 0.0];
        assert_eq!(bounds(2, 2, Some(&scale), None), None);
        assert_eq!(bounds(2, 2, None, Some(&tiepoint)), None);
        assert_eq!(bounds(2, 2, Some(&scale[..1]), Some(&tiepoint)), None);
        assert_eq!(
            bounds(2, 2, Some(&scale), Some(&tiepoint)),
            Some([100.0, 140.0, 160.0, 200.0])
        );
    }

    #[test]
    fn test_not_a_tiff() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.tif");
        std::fs::write(&path, b"<html>not found</html>").unwrap();
        assert!(matches!(read(&path), Err(PublishError::Raster(_))));
    }

    #[test]
    fn test_geokey_lookup_prefers_projected() {
        let directory = [1u16, 1, 0, 2, GEOGRAPHIC_TYPE_KEY, 0, 1, 4326, PROJECTED_CS_KEY, 0, 1, 32636];
        assert_eq!(epsg_from_geokeys(&directory), Some(32636));

        let user_defined = [1u16, 1, 0, 1, PROJECTED_CS_KEY, 0, 1, USER_DEFINED];
        assert_eq!(epsg_from_geokeys(&user_defined), None);
    }
}
