//! # jsonplan
//!
//! A type-driven JSON encoder. The first time a type is encoded under a set
//! of [`Flags`], its runtime descriptor is compiled into a plan: a tree of
//! closures that appends the type's JSON straight from the value's memory.
//! Plans are cached for the life of the process, so every later encode of the
//! same type skips all type inspection.
//!
//! ## Key Features
//!
//! - **Compiled plans**: per (type, flags) closures built once and reused
//! - **Struct tags**: rename, `omitempty`, `string` and `-`, with Go-style
//!   flattening of embedded structs
//! - **Capabilities**: types can supply their own JSON or text through
//!   [`AppendJson`], [`MarshalJson`] and [`MarshalText`]
//! - **Custom encoders**: [`register_encoder`] overrides any type
//! - **Structural hashing**: [`hash`] digests a value independently of map
//!   iteration order
//!
//! ## Quick Start
//!
//! ```rust
//! use jsonplan::{reflect_struct, to_string, to_string_pretty};
//!
//! struct User {
//!     id: u32,
//!     name: String,
//!     email: Option<String>,
//! }
//!
//! reflect_struct!(User {
//!     id: u32,
//!     name: String,
//!     email: Option<String> = "email,omitempty",
//! });
//!
//! let user = User { id: 123, name: "Alice".to_string(), email: None };
//!
//! // Struct fields are emitted in name order.
//! assert_eq!(to_string(&user).unwrap(), r#"{"id":123,"name":"Alice"}"#);
//! assert_eq!(
//!     to_string_pretty(&user).unwrap(),
//!     "{\n\t\"id\": 123,\n\t\"name\": \"Alice\"\n}"
//! );
//! ```
//!
//! ### Presets
//!
//! The standard preset ([`Flags::STANDARD`]) sorts map keys, escapes HTML
//! characters and validates capability output. [`Flags::FASTEST`] does none
//! of that. [`EncodeOptions`] builds anything in between.
//!
//! ```rust
//! use jsonplan::{to_vec_with_options, EncodeOptions};
//! use std::collections::BTreeMap;
//!
//! let mut map = BTreeMap::new();
//! map.insert("tag".to_string(), "<b>".to_string());
//!
//! let fast = to_vec_with_options(&map, &EncodeOptions::fastest()).unwrap();
//! assert_eq!(fast, br#"{"tag":"<b>"}"#);
//! ```
//!
//! ### Dynamic Values with the json! Macro
//!
//! ```rust
//! use jsonplan::{json, Value};
//!
//! let data = json!({
//!     "name": "Alice",
//!     "tags": ["rust", "json"]
//! });
//!
//! if let Value::Object(obj) = &data {
//!     assert_eq!(obj.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! }
//! assert_eq!(jsonplan::to_string(&data).unwrap(), r#"{"name":"Alice","tags":["rust","json"]}"#);
//! ```
//!
//! ## Performance Characteristics
//!
//! - **Compilation**: once per (type, flags, nesting depth, addressability)
//! - **Encoding**: O(n) in the size of the value, no intermediate tree
//! - **Memory**: output is appended to one buffer; sorted maps and the writer
//!   API use pooled scratch buffers
//!
//! ## Logging
//!
//! Plan compilation and custom encoder registration emit `tracing` events at
//! `debug` level. The crate never installs a subscriber.
//!
//! ## Examples
//!
//! See the `demos/` directory:
//!
//! - **`simple.rs`** - Describing structs and encoding them
//! - **`dynamic_values.rs`** - Working with [`Value`] and `Box<dyn Reflect>`
//! - **`custom_encoders.rs`** - Capabilities and registered encoders
//!
//! Run any example with: `cargo run --example <name>`

mod encode;
pub mod error;
mod hash;
pub mod macros;
pub mod map;
pub mod options;
mod pool;
pub mod ptr;
pub mod reflect;
pub mod value;

pub use encode::EncoderFn;
pub use error::{Error, Result};
pub use hash::hash;
pub use map::Map;
pub use options::{EncodeOptions, Flags};
pub use ptr::Ptr;
pub use reflect::{
    AppendJson, Capabilities, MarshalJson, MarshalText, Receiver, Reflect, TypeInfo, Typed,
};
pub use value::{Number, RawNumber, Value};

use std::io;

/// Appends the JSON for `value` to `buf` under `flags`.
///
/// This is the core entry point; every other encoding function is a preset
/// over it. On error `buf` is truncated back to its original length.
///
/// # Examples
///
/// ```rust
/// use jsonplan::{encode, Flags};
///
/// let mut buf = b"x=".to_vec();
/// encode(&mut buf, &vec![1u8, 2], Flags::STANDARD).unwrap();
/// assert_eq!(buf, b"x=\"AQI=\"");
/// ```
///
/// # Errors
///
/// Returns an error if a capability or registered encoder fails, or if a
/// [`RawNumber`] holds invalid text.
pub fn encode<T: Typed>(buf: &mut Vec<u8>, value: &T, flags: Flags) -> Result<()> {
    let start = buf.len();
    encode::encode_value(buf, value, flags).inspect_err(|_| buf.truncate(start))
}

/// Appends the JSON for `value` to `buf` with the standard preset.
///
/// # Errors
///
/// See [`encode`].
pub fn append<T: Typed>(buf: &mut Vec<u8>, value: &T) -> Result<()> {
    encode(buf, value, Flags::STANDARD)
}

/// Encodes `value` with the standard preset.
///
/// # Examples
///
/// ```rust
/// use std::collections::HashMap;
///
/// let map: HashMap<String, i32> = [("b".to_string(), 2), ("a".to_string(), 1)].into();
/// assert_eq!(jsonplan::to_vec(&map).unwrap(), br#"{"a":1,"b":2}"#);
/// ```
///
/// # Errors
///
/// See [`encode`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_vec<T: Typed>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(128);
    encode(&mut buf, value, Flags::STANDARD)?;
    Ok(buf)
}

/// Encodes `value` with the standard preset, tab-indented.
///
/// # Errors
///
/// See [`encode`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_vec_pretty<T: Typed>(value: &T) -> Result<Vec<u8>> {
    to_vec_with_options(value, &EncodeOptions::pretty())
}

/// Encodes `value` with custom options.
///
/// # Errors
///
/// See [`encode`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_vec_with_options<T: Typed>(value: &T, options: &EncodeOptions) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(128);
    encode(&mut buf, value, options.flags())?;
    Ok(buf)
}

/// Encodes `value` with the standard preset into a `String`.
///
/// # Errors
///
/// See [`encode`]. Also fails if a capability produced invalid UTF-8 while
/// string validation was off.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T: Typed>(value: &T) -> Result<String> {
    into_string(to_vec(value)?)
}

/// Encodes `value` with the standard preset into a tab-indented `String`.
///
/// # Errors
///
/// See [`to_string`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_pretty<T: Typed>(value: &T) -> Result<String> {
    into_string(to_vec_pretty(value)?)
}

/// Encodes `value` with custom options into a `String`.
///
/// # Errors
///
/// See [`to_string`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options<T: Typed>(value: &T, options: &EncodeOptions) -> Result<String> {
    into_string(to_vec_with_options(value, options)?)
}

fn into_string(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(Error::custom)
}

/// Writes the JSON for `value` to `writer` with the standard preset.
///
/// # Examples
///
/// ```rust
/// let mut out = Vec::new();
/// jsonplan::to_writer(&mut out, &Some(true)).unwrap();
/// assert_eq!(out, b"true");
/// ```
///
/// # Errors
///
/// Returns an error if encoding fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: Typed,
{
    to_writer_with_options(writer, value, &EncodeOptions::default())
}

/// Writes the JSON for `value` to `writer` with custom options.
///
/// # Errors
///
/// Returns an error if encoding fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer_with_options<W, T>(mut writer: W, value: &T, options: &EncodeOptions) -> Result<()>
where
    W: io::Write,
    T: Typed,
{
    let mut buf = pool::bytes();
    encode(&mut buf, value, options.flags())?;
    writer.write_all(&buf)?;
    Ok(())
}

/// Writes a stream of JSON documents, one per line.
///
/// # Examples
///
/// ```rust
/// use jsonplan::{EncodeOptions, Encoder};
///
/// let mut encoder = Encoder::new(Vec::new());
/// encoder.encode(&1u8).unwrap();
/// encoder.encode(&"two".to_string()).unwrap();
/// assert_eq!(encoder.into_inner(), b"1\n\"two\"\n");
///
/// let encoder = Encoder::with_options(Vec::new(), &EncodeOptions::fastest());
/// assert!(encoder.get_ref().is_empty());
/// ```
pub struct Encoder<W> {
    writer: W,
    flags: Flags,
}

impl<W: io::Write> Encoder<W> {
    /// Creates an encoder with the standard preset.
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, &EncodeOptions::default())
    }

    pub fn with_options(writer: W, options: &EncodeOptions) -> Self {
        Encoder {
            writer,
            flags: options.flags(),
        }
    }

    /// Encodes one document followed by a newline.
    ///
    /// Nothing is written when encoding fails.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or writing to the writer fails.
    pub fn encode<T: Typed>(&mut self, value: &T) -> Result<()> {
        let mut buf = pool::bytes();
        encode(&mut buf, value, self.flags)?;
        buf.push(b'\n');
        self.writer.write_all(&buf)?;
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Installs a custom encoder for `T`.
///
/// `factory` is called once per flag set that `T` is compiled under and
/// returns the encoder used for that set. Registered encoders take
/// precedence over well-known types, capabilities and structural encoding;
/// the most recent registration for a type wins.
///
/// Plans that were compiled for `T` before the call keep their old encoder,
/// so register encoders before the first encode that reaches `T`.
///
/// # Examples
///
/// ```rust
/// use jsonplan::{register_encoder, Flags};
/// use std::sync::Arc;
///
/// #[derive(Clone, Copy)]
/// #[repr(transparent)]
/// struct Cents(i64);
///
/// unsafe impl jsonplan::Typed for Cents {
///     fn type_info() -> &'static jsonplan::TypeInfo {
///         static CELL: jsonplan::reflect::TypeInfoCell = jsonplan::reflect::TypeInfoCell::new();
///         CELL.get_or_init(|| jsonplan::TypeInfo::new::<Cents>(jsonplan::reflect::Kind::I64))
///     }
/// }
///
/// register_encoder::<Cents, _>(|flags: Flags| {
///     Arc::new(move |buf: &mut Vec<u8>, c: &Cents| {
///         jsonplan::append_string(buf, &format!("{}.{:02}", c.0 / 100, c.0 % 100), flags);
///         Ok(())
///     })
/// });
/// assert_eq!(jsonplan::to_string(&vec![Cents(1250)]).unwrap(), r#"["12.50"]"#);
/// ```
pub fn register_encoder<T, F>(factory: F)
where
    T: Typed,
    F: Fn(Flags) -> EncoderFn<T> + Send + Sync + 'static,
{
    encode::register::<T, F>(factory);
}

/// Appends `text` as a quoted, escaped JSON string.
///
/// Honors [`Flags::ESCAPE_HTML`]; with [`Flags::VALIDATE_STRING`] invalid
/// UTF-8 sequences are replaced with U+FFFD. Intended for custom encoders.
///
/// ```rust
/// use jsonplan::{append_string, Flags};
///
/// let mut buf = Vec::new();
/// append_string(&mut buf, "a\"b", Flags::FASTEST);
/// assert_eq!(buf, br#""a\"b""#);
/// ```
pub fn append_string<S: AsRef<[u8]> + ?Sized>(buf: &mut Vec<u8>, text: &S, flags: Flags) {
    encode::quote_bytes(buf, text.as_ref(), flags);
}

/// Appends a signed integer in decimal.
pub fn append_int(buf: &mut Vec<u8>, value: i64) {
    encode::append_i64(buf, value);
}

/// Appends an unsigned integer in decimal.
pub fn append_uint(buf: &mut Vec<u8>, value: u64) {
    encode::append_u64(buf, value);
}

/// Appends the shortest decimal form of a float; non-finite values append
/// `null`.
pub fn append_float(buf: &mut Vec<u8>, value: f64) {
    encode::append_f64(buf, value);
}
