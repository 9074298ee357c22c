//! Encoder flags and configuration options.
//!
//! This module provides:
//!
//! - [`Flags`]: the bitmask every compiled plan is specialized for
//! - [`EncodeOptions`]: a builder over [`Flags`] used by the crate-level
//!   functions
//!
//! ## Examples
//!
//! ```rust
//! use jsonplan::{to_vec_with_options, EncodeOptions};
//! use std::collections::BTreeMap;
//!
//! let mut data = BTreeMap::new();
//! data.insert("tag".to_string(), "<b>".to_string());
//!
//! // Standard: sorted maps, HTML escaping, validation
//! let json = to_vec_with_options(&data, &EncodeOptions::standard()).unwrap();
//! assert_eq!(json, br#"{"tag":"\u003cb\u003e"}"#);
//!
//! // Fastest: none of the above
//! let json = to_vec_with_options(&data, &EncodeOptions::fastest()).unwrap();
//! assert_eq!(json, br#"{"tag":"<b>"}"#);
//! ```

use bitflags::bitflags;

bitflags! {
    /// Behavior switches a compiled plan is specialized for.
    ///
    /// `OMIT_EMPTY` and `NEED_QUOTES` describe the slot a value sits in (a
    /// struct field or a map key) and are recomputed at every level of the
    /// plan tree; the other flags are inherited unchanged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u32 {
        /// Emit map entries ordered by their rendered key bytes.
        const SORT_MAP_KEYS = 1;
        /// Escape `<`, `>`, `&`, U+2028 and U+2029 inside strings.
        const ESCAPE_HTML = 1 << 1;
        /// Replace invalid UTF-8 in byte-sourced text with U+FFFD.
        const VALIDATE_STRING = 1 << 2;
        /// Check that capability output is a single valid JSON value.
        const VALIDATE_MARSHALERS = 1 << 3;
        /// Append nothing when the value is empty.
        const OMIT_EMPTY = 1 << 4;
        /// Render scalars as JSON strings (map keys, `string` tag option).
        const NEED_QUOTES = 1 << 5;
        /// Indent nested values with one tab per level.
        const PRETTY = 1 << 6;

        const STANDARD = Self::SORT_MAP_KEYS.bits()
            | Self::ESCAPE_HTML.bits()
            | Self::VALIDATE_STRING.bits()
            | Self::VALIDATE_MARSHALERS.bits();
        const FASTEST = 0;
    }
}

impl Flags {
    /// Flags that belong to a single slot and must not leak into children.
    pub(crate) const SLOT: Flags = Flags::OMIT_EMPTY.union(Flags::NEED_QUOTES);

    /// The flags a nested value inherits from its container.
    #[inline]
    pub(crate) fn inherited(self) -> Flags {
        self.difference(Flags::SLOT)
    }
}

impl Default for Flags {
    fn default() -> Self {
        Flags::STANDARD
    }
}

/// Configuration for the crate-level encoding functions.
///
/// # Examples
///
/// ```rust
/// use jsonplan::{EncodeOptions, Flags};
///
/// // Standard preset
/// let options = EncodeOptions::new();
/// assert!(options.flags().contains(Flags::SORT_MAP_KEYS));
///
/// // Fastest preset, pretty-printed
/// let options = EncodeOptions::fastest().with_pretty(true);
/// assert_eq!(options.flags(), Flags::PRETTY);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct EncodeOptions {
    pub sort_map_keys: bool,
    pub escape_html: bool,
    pub validate_strings: bool,
    pub validate_marshalers: bool,
    pub pretty: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions::standard()
    }
}

impl EncodeOptions {
    /// Creates the standard options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorted maps, HTML escaping and validation; compact output.
    #[must_use]
    pub fn standard() -> Self {
        EncodeOptions {
            sort_map_keys: true,
            escape_html: true,
            validate_strings: true,
            validate_marshalers: true,
            pretty: false,
        }
    }

    /// No sorting, escaping beyond JSON's requirements, or validation.
    #[must_use]
    pub fn fastest() -> Self {
        EncodeOptions {
            sort_map_keys: false,
            escape_html: false,
            validate_strings: false,
            validate_marshalers: false,
            pretty: false,
        }
    }

    /// Standard options with tab-indented output.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsonplan::EncodeOptions;
    ///
    /// let options = EncodeOptions::pretty();
    /// assert!(options.pretty);
    /// assert!(options.sort_map_keys);
    /// ```
    #[must_use]
    pub fn pretty() -> Self {
        EncodeOptions {
            pretty: true,
            ..Self::standard()
        }
    }

    #[must_use]
    pub fn with_sort_map_keys(mut self, enabled: bool) -> Self {
        self.sort_map_keys = enabled;
        self
    }

    #[must_use]
    pub fn with_escape_html(mut self, enabled: bool) -> Self {
        self.escape_html = enabled;
        self
    }

    #[must_use]
    pub fn with_validate_strings(mut self, enabled: bool) -> Self {
        self.validate_strings = enabled;
        self
    }

    #[must_use]
    pub fn with_validate_marshalers(mut self, enabled: bool) -> Self {
        self.validate_marshalers = enabled;
        self
    }

    #[must_use]
    pub fn with_pretty(mut self, enabled: bool) -> Self {
        self.pretty = enabled;
        self
    }

    /// The flag set plans are compiled for.
    #[must_use]
    pub fn flags(&self) -> Flags {
        let mut flags = Flags::empty();
        flags.set(Flags::SORT_MAP_KEYS, self.sort_map_keys);
        flags.set(Flags::ESCAPE_HTML, self.escape_html);
        flags.set(Flags::VALIDATE_STRING, self.validate_strings);
        flags.set(Flags::VALIDATE_MARSHALERS, self.validate_marshalers);
        flags.set(Flags::PRETTY, self.pretty);
        flags
    }
}

impl From<&EncodeOptions> for Flags {
    fn from(options: &EncodeOptions) -> Self {
        options.flags()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(EncodeOptions::standard().flags(), Flags::STANDARD);
        assert_eq!(EncodeOptions::fastest().flags(), Flags::FASTEST);
        assert_eq!(
            EncodeOptions::pretty().flags(),
            Flags::STANDARD | Flags::PRETTY
        );
    }

    #[test]
    fn test_slot_flags_are_not_inherited() {
        let flags = Flags::STANDARD | Flags::OMIT_EMPTY | Flags::NEED_QUOTES;
        assert_eq!(flags.inherited(), Flags::STANDARD);
    }

    #[test]
    fn test_builder_toggles() {
        let options = EncodeOptions::standard()
            .with_escape_html(false)
            .with_pretty(true);
        assert!(!options.flags().contains(Flags::ESCAPE_HTML));
        assert!(options.flags().contains(Flags::PRETTY));
    }
}
