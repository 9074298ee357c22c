//! String quoting and byte blobs.

use super::{plan, Plan};
use crate::options::Flags;
use crate::reflect::SliceInfo;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Whether an ASCII byte must be escaped.
#[inline]
fn needs_escape(b: u8, html: bool) -> bool {
    b < 0x20 || b == b'"' || b == b'\\' || (html && (b == b'<' || b == b'>' || b == b'&'))
}

fn push_escape(buf: &mut Vec<u8>, b: u8) {
    match b {
        b'"' => buf.extend_from_slice(b"\\\""),
        b'\\' => buf.extend_from_slice(b"\\\\"),
        b'\n' => buf.extend_from_slice(b"\\n"),
        b'\r' => buf.extend_from_slice(b"\\r"),
        b'\t' => buf.extend_from_slice(b"\\t"),
        0x08 => buf.extend_from_slice(b"\\b"),
        0x0c => buf.extend_from_slice(b"\\f"),
        _ => {
            buf.extend_from_slice(b"\\u00");
            buf.push(HEX[(b >> 4) as usize]);
            buf.push(HEX[(b & 0xf) as usize]);
        }
    }
}

/// Escapes `bytes` into `buf` without the surrounding quotes.
///
/// Bytes at or above 0x80 are copied verbatim except for the encodings of
/// U+2028 and U+2029 when `html` is set.
fn escape_into(buf: &mut Vec<u8>, bytes: &[u8], html: bool) {
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b < 0x80 {
            if needs_escape(b, html) {
                buf.extend_from_slice(&bytes[start..i]);
                push_escape(buf, b);
                start = i + 1;
            }
            i += 1;
            continue;
        }
        // U+2028 and U+2029 are E2 80 A8 and E2 80 A9.
        if html
            && b == 0xe2
            && i + 2 < bytes.len()
            && bytes[i + 1] == 0x80
            && bytes[i + 2] & 0xfe == 0xa8
        {
            buf.extend_from_slice(&bytes[start..i]);
            buf.extend_from_slice(b"\\u202");
            buf.push(if bytes[i + 2] == 0xa8 { b'8' } else { b'9' });
            i += 3;
            start = i;
            continue;
        }
        i += 1;
    }
    buf.extend_from_slice(&bytes[start..]);
}

/// Appends a quoted, escaped JSON string.
#[inline]
pub(crate) fn quote_str(buf: &mut Vec<u8>, s: &str, flags: Flags) {
    buf.reserve(s.len() + 2);
    buf.push(b'"');
    escape_into(buf, s.as_bytes(), flags.contains(Flags::ESCAPE_HTML));
    buf.push(b'"');
}

/// Appends text that arrived as raw bytes as a JSON string.
///
/// With [`Flags::VALIDATE_STRING`] every invalid UTF-8 sequence becomes
/// `\ufffd`; otherwise the bytes are copied as they are.
pub(crate) fn quote_bytes(buf: &mut Vec<u8>, bytes: &[u8], flags: Flags) {
    let html = flags.contains(Flags::ESCAPE_HTML);
    buf.reserve(bytes.len() + 2);
    buf.push(b'"');
    if flags.contains(Flags::VALIDATE_STRING) {
        for chunk in bytes.utf8_chunks() {
            escape_into(buf, chunk.valid().as_bytes(), html);
            if !chunk.invalid().is_empty() {
                buf.extend_from_slice(b"\\ufffd");
            }
        }
    } else {
        escape_into(buf, bytes, html);
    }
    buf.push(b'"');
}

/// Turns whatever was appended since `start` into a JSON string unless it
/// already is one. Nothing appended becomes `""`.
pub(crate) fn requote(buf: &mut Vec<u8>, start: usize, flags: Flags) {
    match buf.get(start) {
        Some(b'"') => {}
        None => buf.extend_from_slice(b"\"\""),
        Some(_) => {
            let text = buf.split_off(start);
            quote_bytes(buf, &text, flags);
        }
    }
}

pub(super) fn string_plan(flags: Flags) -> Plan {
    let omit = flags.contains(Flags::OMIT_EMPTY);
    plan(move |buf, ptr| {
        // SAFETY: string plans are only called with `String` pointers.
        let s = unsafe { ptr.deref::<String>() };
        if omit && s.is_empty() {
            return Ok(());
        }
        quote_str(buf, s, flags);
        Ok(())
    })
}

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Appends standard, padded base64.
pub(crate) fn append_base64(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.reserve(bytes.len().div_ceil(3) * 4);
    let mut chunks = bytes.chunks_exact(3);
    for chunk in &mut chunks {
        let n = u32::from(chunk[0]) << 16 | u32::from(chunk[1]) << 8 | u32::from(chunk[2]);
        buf.extend_from_slice(&[
            BASE64[(n >> 18) as usize & 63],
            BASE64[(n >> 12) as usize & 63],
            BASE64[(n >> 6) as usize & 63],
            BASE64[n as usize & 63],
        ]);
    }
    match *chunks.remainder() {
        [a] => {
            let n = u32::from(a) << 16;
            buf.extend_from_slice(&[
                BASE64[(n >> 18) as usize & 63],
                BASE64[(n >> 12) as usize & 63],
                b'=',
                b'=',
            ]);
        }
        [a, b] => {
            let n = u32::from(a) << 16 | u32::from(b) << 8;
            buf.extend_from_slice(&[
                BASE64[(n >> 18) as usize & 63],
                BASE64[(n >> 12) as usize & 63],
                BASE64[(n >> 6) as usize & 63],
                b'=',
            ]);
        }
        _ => {}
    }
}

/// Plan for a byte slice: a quoted base64 string.
pub(super) fn bytes_plan(slice: &'static SliceInfo, flags: Flags) -> Plan {
    let omit = flags.contains(Flags::OMIT_EMPTY);
    plan(move |buf, ptr| {
        // SAFETY: `slice` describes the type this plan was built for.
        let (data, len) = unsafe { slice.parts(ptr) };
        if omit && len == 0 {
            return Ok(());
        }
        // SAFETY: `data` points at `len` initialized bytes.
        let bytes = unsafe { std::slice::from_raw_parts(data.as_ptr(), len) };
        buf.push(b'"');
        append_base64(buf, bytes);
        buf.push(b'"');
        Ok(())
    })
}
