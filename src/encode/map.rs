//! Maps.
//!
//! Keys are always rendered as JSON strings: they are compiled with
//! `NEED_QUOTES`, and any key form that still does not start with a quote is
//! re-quoted. Values are not addressable.
//!
//! With `SORT_MAP_KEYS` each entry is rendered into a pooled scratch buffer,
//! the entries are ordered by their rendered key text and copied back.
//! Otherwise entries stream straight into the output in the map's own order.

use super::string::requote;
use super::{indent, plan, plan_for, Plan, Site};
use crate::options::Flags;
use crate::pool;
use crate::ptr::Ptr;
use crate::reflect::MapInfo;
use crate::Result;

struct Entries {
    key: Plan,
    value: Plan,
    key_flags: Flags,
    pretty: bool,
    indent: u16,
}

/// Byte offsets of one rendered entry.
struct Span {
    start: usize,
    key_start: usize,
    key_end: usize,
    end: usize,
}

impl Entries {
    /// Renders `key: value`. Returns `None` and leaves `buf` untouched when
    /// the value appends nothing.
    fn write(&self, buf: &mut Vec<u8>, key: Ptr<'_>, value: Ptr<'_>) -> Result<Option<Span>> {
        let start = buf.len();
        if self.pretty {
            indent(buf, self.indent + 1);
        }
        let key_start = buf.len();
        (self.key)(buf, key)?;
        requote(buf, key_start, self.key_flags);
        let key_end = buf.len();
        buf.extend_from_slice(if self.pretty { &b": "[..] } else { &b":"[..] });
        let value_start = buf.len();
        (self.value)(buf, value)?;
        if buf.len() == value_start {
            buf.truncate(start);
            return Ok(None);
        }
        Ok(Some(Span {
            start,
            key_start,
            key_end,
            end: buf.len(),
        }))
    }

    fn close(&self, buf: &mut Vec<u8>, open: usize) {
        if self.pretty && buf.len() > open {
            indent(buf, self.indent);
        }
        buf.push(b'}');
    }
}

pub(super) fn map_plan(map: &'static MapInfo, site: Site) -> Plan {
    let flags = site.flags;
    let key_flags = flags.inherited() | Flags::NEED_QUOTES;

    let mut key_site = site.child(key_flags);
    key_site.addressable = false;
    let mut value_site = site.child(flags.inherited());
    value_site.addressable = false;

    let entries = Entries {
        key: plan_for(map.key(), key_site),
        value: plan_for(map.value(), value_site),
        key_flags,
        pretty: flags.contains(Flags::PRETTY),
        indent: site.indent,
    };
    let omit = flags.contains(Flags::OMIT_EMPTY);
    let sort = flags.contains(Flags::SORT_MAP_KEYS);

    plan(move |buf, ptr| {
        // SAFETY: `map` describes the type this plan was compiled for.
        let len = unsafe { map.len(ptr) };
        if omit && len == 0 {
            return Ok(());
        }
        buf.push(b'{');
        let open = buf.len();
        if sort && len > 1 {
            write_sorted(&entries, map, buf, ptr, len)?;
        } else {
            // SAFETY: as above.
            unsafe {
                map.visit(ptr, &mut |k, v| {
                    if entries.write(buf, k, v)?.is_some() {
                        buf.push(b',');
                    }
                    Ok(())
                })?;
            }
            if buf.len() > open {
                buf.pop();
            }
        }
        entries.close(buf, open);
        Ok(())
    })
}

fn write_sorted(
    entries: &Entries,
    map: &MapInfo,
    buf: &mut Vec<u8>,
    ptr: Ptr<'_>,
    len: usize,
) -> Result<()> {
    let mut scratch = pool::bytes();
    let mut spans = Vec::with_capacity(len);
    // SAFETY: `ptr` points at a map of the type `map` describes.
    unsafe {
        map.visit(ptr, &mut |k, v| {
            spans.extend(entries.write(&mut scratch, k, v)?);
            Ok(())
        })?;
    }
    // Order by the key text between the quotes.
    let text = |span: &Span| &scratch[span.key_start + 1..span.key_end - 1];
    spans.sort_unstable_by(|a, b| text(a).cmp(text(b)));

    for (i, span) in spans.iter().enumerate() {
        if i > 0 {
            buf.push(b',');
        }
        buf.extend_from_slice(&scratch[span.start..span.end]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::encode_value;
    use crate::options::Flags;
    use crate::Typed;
    use indexmap::IndexMap;
    use std::collections::{BTreeMap, HashMap};

    fn encode<T: Typed>(value: &T, flags: Flags) -> String {
        let mut buf = Vec::new();
        encode_value(&mut buf, value, flags).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_sorted_by_rendered_key() {
        let mut map = HashMap::new();
        map.insert(10u32, "ten".to_string());
        map.insert(9u32, "nine".to_string());
        map.insert(100u32, "hundred".to_string());
        assert_eq!(
            encode(&map, Flags::SORT_MAP_KEYS),
            r#"{"10":"ten","100":"hundred","9":"nine"}"#
        );
    }

    #[test]
    fn test_unsorted_keeps_native_order() {
        let mut map = IndexMap::new();
        map.insert("b".to_string(), 2i64);
        map.insert("a".to_string(), 1i64);
        assert_eq!(encode(&map, Flags::FASTEST), r#"{"b":2,"a":1}"#);
        assert_eq!(encode(&map, Flags::STANDARD), r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn test_empty_and_pretty_maps() {
        let empty: BTreeMap<String, u8> = BTreeMap::new();
        assert_eq!(encode(&empty, Flags::STANDARD | Flags::PRETTY), "{}");

        let mut map = BTreeMap::new();
        map.insert("k".to_string(), vec![true]);
        assert_eq!(
            encode(&map, Flags::STANDARD | Flags::PRETTY),
            "{\n\t\"k\": [\n\t\ttrue\n\t]\n}"
        );
    }

    #[test]
    fn test_keys_are_quoted_scalars() {
        let mut map = BTreeMap::new();
        map.insert(true, 1u8);
        map.insert(false, 0u8);
        assert_eq!(encode(&map, Flags::STANDARD), r#"{"false":0,"true":1}"#);

        let mut map = HashMap::new();
        map.insert("<k>".to_string(), 1u8);
        assert_eq!(encode(&map, Flags::FASTEST), r#"{"<k>":1}"#);
    }
}
