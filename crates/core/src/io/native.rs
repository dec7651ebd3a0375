//! Native GeoTIFF reading/writing via the `tiff` crate
//!
//! Reads pixel-interleaved (chunky) images with any number of samples per
//! pixel, which covers the usual RGB, RGBN and Gray products. Georeferencing
//! is limited to the pixel-scale + tiepoint tags.

use crate::error::{Error, Result};
use crate::raster::{ChangeMask, GeoTransform, MultiBandRaster, Raster};
use ndarray::Array3;
use num_traits::NumCast;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{Gray32Float, Gray8, RGB8};
use tiff::encoder::{colortype::ColorType, TiffEncoder};
use tiff::tags::Tag;

/// File-level description of a raster as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RasterInfo {
    pub width: usize,
    pub height: usize,
    pub bands: usize,
    /// Sample type in the file, before conversion to `f64`
    pub dtype: &'static str,
    pub nodata: Option<f64>,
    pub transform: GeoTransform,
}

/// Read a (multi-band) GeoTIFF file as `f64` bands
pub fn read_multiband_geotiff<P: AsRef<Path>>(path: P) -> Result<MultiBandRaster<f64>> {
    read_multiband_geotiff_with_info(path).map(|(raster, _)| raster)
}

/// Read a GeoTIFF file together with its on-disk description
pub fn read_multiband_geotiff_with_info<P: AsRef<Path>>(
    path: P,
) -> Result<(MultiBandRaster<f64>, RasterInfo)> {
    let file = File::open(path.as_ref())?;
    decode_multiband(BufReader::new(file))
}

/// Read a (multi-band) GeoTIFF from an in-memory buffer
pub fn read_multiband_geotiff_from_buffer(data: &[u8]) -> Result<MultiBandRaster<f64>> {
    decode_multiband(Cursor::new(data)).map(|(raster, _)| raster)
}

fn decode_multiband<R: Read + Seek>(reader: R) -> Result<(MultiBandRaster<f64>, RasterInfo)> {
    let mut decoder =
        Decoder::new(reader).map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {}", e)))?;
    let rows = height as usize;
    let cols = width as usize;

    let (samples, dtype) = match decoder
        .read_image()
        .map_err(|e| Error::Other(format!("Cannot read image data: {}", e)))?
    {
        DecodingResult::U8(buf) => (cast_all(&buf), "u8"),
        DecodingResult::U16(buf) => (cast_all(&buf), "u16"),
        DecodingResult::U32(buf) => (cast_all(&buf), "u32"),
        DecodingResult::I8(buf) => (cast_all(&buf), "i8"),
        DecodingResult::I16(buf) => (cast_all(&buf), "i16"),
        DecodingResult::I32(buf) => (cast_all(&buf), "i32"),
        DecodingResult::F32(buf) => (cast_all(&buf), "f32"),
        DecodingResult::F64(buf) => (buf, "f64"),
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    let pixels = rows * cols;
    if pixels == 0 || samples.len() % pixels != 0 {
        return Err(Error::InvalidDimensions {
            bands: 0,
            width: cols,
            height: rows,
        });
    }
    let bands = samples.len() / pixels;

    // Pixel-interleaved -> band-sequential
    let mut planar = vec![0.0; samples.len()];
    for (i, value) in samples.into_iter().enumerate() {
        let (pixel, band) = (i / bands, i % bands);
        planar[band * pixels + pixel] = value;
    }

    let nodata = read_nodata(&mut decoder);
    if let Some(nd) = nodata {
        for v in planar.iter_mut().filter(|v| **v == nd) {
            *v = f64::NAN;
        }
    }

    let mut raster = MultiBandRaster::from_vec(planar, bands, rows, cols)?
        .with_nodata(nodata.map(|_| f64::NAN));
    if let Some(transform) = read_geotransform(&mut decoder) {
        raster = raster.with_transform(transform);
    }

    let info = RasterInfo {
        width: cols,
        height: rows,
        bands,
        dtype,
        nodata,
        transform: *raster.transform(),
    };

    tracing::debug!(bands, rows, cols, dtype, "decoded TIFF");
    Ok((raster, info))
}

fn cast_all<T: NumCast + Copy>(buf: &[T]) -> Vec<f64> {
    buf.iter()
        .map(|&v| num_traits::cast(v).unwrap_or(f64::NAN))
        .collect()
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag).ok()?;
    GeoTransform::from_tiepoint(&scale, &tiepoint)
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    decoder
        .get_tag_ascii_string(Tag::GdalNodata)
        .ok()
        .and_then(|s| s.trim_end_matches('\0').trim().parse::<f64>().ok())
}

/// Write a single-band raster (difference or index map) as 32-bit float GeoTIFF
pub fn write_geotiff<P: AsRef<Path>>(raster: &Raster<f64>, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    encode_f32(raster, BufWriter::new(file))
}

/// Write a single-band raster to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer(raster: &Raster<f64>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_f32(raster, Cursor::new(&mut buf))?;
    Ok(buf)
}

/// Write a change mask as an 8-bit GeoTIFF (0 = unchanged, 1 = changed)
pub fn write_mask_geotiff<P: AsRef<Path>>(mask: &ChangeMask, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    encode_mask(mask, BufWriter::new(file))
}

/// Write a change mask to an in-memory GeoTIFF buffer
pub fn write_mask_geotiff_to_buffer(mask: &ChangeMask) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_mask(mask, Cursor::new(&mut buf))?;
    Ok(buf)
}

/// Write a `(rows, cols, 3)` RGB composite in [0, 1] as an 8-bit RGB GeoTIFF
pub fn write_rgb_geotiff<P: AsRef<Path>>(
    rgb: &Array3<f64>,
    transform: &GeoTransform,
    path: P,
) -> Result<()> {
    let file = File::create(path.as_ref())?;
    encode_rgb(rgb, transform, BufWriter::new(file))
}

/// Write an RGB composite to an in-memory GeoTIFF buffer
pub fn write_rgb_geotiff_to_buffer(rgb: &Array3<f64>, transform: &GeoTransform) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_rgb(rgb, transform, Cursor::new(&mut buf))?;
    Ok(buf)
}

fn encode_rgb<W: Write + Seek>(rgb: &Array3<f64>, transform: &GeoTransform, writer: W) -> Result<()> {
    let (rows, cols, channels) = rgb.dim();
    if channels != 3 {
        return Err(Error::InvalidDimensions {
            bands: channels,
            width: cols,
            height: rows,
        });
    }
    // Standard layout iterates (row, col, channel), i.e. pixel-interleaved
    let data: Vec<u8> = rgb
        .iter()
        .map(|&v| if v.is_nan() { 0 } else { (v.clamp(0.0, 1.0) * 255.0).round() as u8 })
        .collect();
    encode::<RGB8, _>(writer, (rows, cols), transform, &data)
}

fn encode_f32<W: Write + Seek>(raster: &Raster<f64>, writer: W) -> Result<()> {
    let data: Vec<f32> = raster.data().iter().map(|&v| v as f32).collect();
    encode::<Gray32Float, _>(writer, raster.shape(), raster.transform(), &data)
}

fn encode_mask<W: Write + Seek>(mask: &ChangeMask, writer: W) -> Result<()> {
    let data: Vec<u8> = mask.view().iter().copied().collect();
    encode::<Gray8, _>(writer, mask.shape(), mask.transform(), &data)
}

fn encode<C, W>(
    writer: W,
    (rows, cols): (usize, usize),
    transform: &GeoTransform,
    data: &[C::Inner],
) -> Result<()>
where
    C: ColorType,
    [C::Inner]: tiff::encoder::TiffValue,
    W: Write + Seek,
{
    let mut encoder =
        TiffEncoder::new(writer).map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;

    let mut image = encoder
        .new_image::<C>(cols as u32, rows as u32)
        .map_err(|e| Error::Other(format!("Cannot create TIFF image: {}", e)))?;

    let scale = transform.pixel_scale();
    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, &scale[..])
        .map_err(|e| Error::Other(format!("Cannot write scale tag: {}", e)))?;

    let tiepoint = transform.tiepoint();
    image
        .encoder()
        .write_tag(Tag::ModelTiepointTag, &tiepoint[..])
        .map_err(|e| Error::Other(format!("Cannot write tiepoint tag: {}", e)))?;

    // Version 1.1.0 with GTModelType = Projected and GTRasterType = PixelIsArea
    let geokeys: [u16; 12] = [1, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, 1];
    image
        .encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, &geokeys[..])
        .map_err(|e| Error::Other(format!("Cannot write geokey tag: {}", e)))?;

    image
        .write_data(data)
        .map_err(|e| Error::Other(format!("Cannot write image data: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mask_roundtrip() {
        let mask = ChangeMask::from_bools(&array![[true, false], [false, true]])
            .with_transform(GeoTransform::new(100.0, 200.0, 10.0, -10.0));
        let buf = write_mask_geotiff_to_buffer(&mask).unwrap();

        let back = read_multiband_geotiff_from_buffer(&buf).unwrap();
        assert_eq!(back.bands(), 1);
        assert_eq!(back.band(0).unwrap(), array![[1.0, 0.0], [0.0, 1.0]]);
        assert_eq!(back.transform(), mask.transform());
    }

    #[test]
    fn test_float_roundtrip() {
        let raster = Raster::from_vec(vec![0.25, -0.5, 1.0, 0.0, 0.125, 0.75], 2, 3).unwrap();
        let buf = write_geotiff_to_buffer(&raster).unwrap();

        let back = read_multiband_geotiff_from_buffer(&buf).unwrap();
        assert_eq!(back.shape(), (2, 3));
        assert_eq!(back.band(0).unwrap(), raster.view());
    }

    #[test]
    fn test_interleaved_bands_are_split() {
        // 2x1 RGB image: pixel 0 = (1, 2, 3), pixel 1 = (4, 5, 6)
        let mut buf = Vec::new();
        {
            let mut encoder = TiffEncoder::new(Cursor::new(&mut buf)).unwrap();
            encoder.write_image::<RGB8>(2, 1, &[1, 2, 3, 4, 5, 6]).unwrap();
        }

        let raster = read_multiband_geotiff_from_buffer(&buf).unwrap();
        assert_eq!(raster.bands(), 3);
        assert_eq!(raster.band(0).unwrap(), array![[1.0, 4.0]]);
        assert_eq!(raster.band(1).unwrap(), array![[2.0, 5.0]]);
        assert_eq!(raster.band(2).unwrap(), array![[3.0, 6.0]]);
    }

    #[test]
    fn test_rgb_written_as_three_bands() {
        let mut rgb = Array3::<f64>::zeros((1, 2, 3));
        rgb[(0, 0, 0)] = 1.0;
        rgb[(0, 1, 1)] = 0.5;
        rgb[(0, 1, 2)] = 2.0;
        let buf = write_rgb_geotiff_to_buffer(&rgb, &GeoTransform::default()).unwrap();

        let back = read_multiband_geotiff_from_buffer(&buf).unwrap();
        assert_eq!(back.bands(), 3);
        assert_eq!(back.band(0).unwrap(), array![[255.0, 0.0]]);
        assert_eq!(back.band(1).unwrap(), array![[0.0, 128.0]]);
        assert_eq!(back.band(2).unwrap(), array![[0.0, 255.0]]);
    }

    #[test]
    fn test_info_reports_source_dtype() {
        let mask = ChangeMask::zeros(3, 4);
        let buf = write_mask_geotiff_to_buffer(&mask).unwrap();
        let (raster, info) = decode_multiband(Cursor::new(&buf[..])).unwrap();
        assert_eq!(info.dtype, "u8");
        assert_eq!((info.width, info.height, info.bands), (4, 3, 1));
        assert_eq!(info.nodata, None);
        assert_eq!(raster.shape(), (3, 4));
    }

    #[test]
    fn test_gdal_nodata_becomes_nan() {
        let mut buf = Vec::new();
        {
            let mut encoder = TiffEncoder::new(Cursor::new(&mut buf)).unwrap();
            let mut image = encoder.new_image::<Gray32Float>(3, 1).unwrap();
            image.encoder().write_tag(Tag::GdalNodata, "-9999").unwrap();
            image.write_data(&[-9999.0f32, 2.0, 4.0]).unwrap();
        }

        let (raster, info) = decode_multiband(Cursor::new(&buf[..])).unwrap();
        assert_eq!(info.nodata, Some(-9999.0));
        assert_eq!(info.dtype, "f32");
        let band = raster.band(0).unwrap();
        assert!(band[(0, 0)].is_nan());
        assert_eq!(band[(0, 1)], 2.0);
        assert_eq!(band[(0, 2)], 4.0);
    }

    #[test]
    fn test_transform_survives_float_roundtrip() {
        let transform = GeoTransform::new(500_000.0, 4_200_000.0, 30.0, -30.0);
        let raster = Raster::from_vec(vec![1.0, 2.0], 1, 2)
            .unwrap()
            .with_transform(transform);
        let buf = write_geotiff_to_buffer(&raster).unwrap();

        let (back, info) = decode_multiband(Cursor::new(&buf[..])).unwrap();
        assert_eq!(back.transform(), &transform);
        assert_eq!(info.transform, transform);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(read_multiband_geotiff_from_buffer(b"not a tiff").is_err());
    }
}
