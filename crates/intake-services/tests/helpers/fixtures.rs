use image::{ImageFormat, Rgb, RgbImage};
use intake_services::FilePayload;
use std::io::Cursor;

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    })
}

fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).expect("Failed to encode fixture");
    buf.into_inner()
}

/// A real PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient(width, height), ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient(width, height), ImageFormat::Jpeg)
}

/// Bytes sniffed as `application/pdf`, padded to `len`.
pub fn pdf_bytes(len: usize) -> Vec<u8> {
    let mut data = b"%PDF-1.4\n".to_vec();
    data.extend((0..len.saturating_sub(data.len())).map(|i| b'0' + (i % 10) as u8));
    data
}

pub fn text_bytes(len: usize) -> Vec<u8> {
    b"lorem ipsum dolor sit amet "
        .iter()
        .cycle()
        .take(len)
        .copied()
        .collect()
}

pub fn png_payload(name: &str, width: u32, height: u32) -> FilePayload {
    FilePayload::from_bytes(name, Some("image/png"), png_bytes(width, height))
}

pub fn pdf_payload(name: &str, len: usize) -> FilePayload {
    FilePayload::from_bytes(name, Some("application/pdf"), pdf_bytes(len))
}

pub fn text_payload(name: &str, len: usize) -> FilePayload {
    FilePayload::from_bytes(name, Some("text/plain"), text_bytes(len))
}
