//! Struct field sets and the struct plan.
//!
//! The visible field set of a struct is computed once per type and shared by
//! the encoder and the hasher:
//!
//! - a tag of exactly `"-"` drops the field
//! - private fields are dropped unless they are flattened
//! - embedded structs without a custom encoder or capability, and without an
//!   explicit tag name, are flattened into the parent (through any number of
//!   pointer levels)
//! - on a name clash the shallowest field wins; among equally shallow fields
//!   a single tagged one wins, otherwise the name is dropped altogether
//!
//! The result is ordered by JSON name.

use super::string::quote_str;
use super::{indent, is_registered, plan, plan_for, Plan, Site};
use crate::options::Flags;
use crate::ptr::Ptr;
use crate::reflect::{DerefFn, Kind, TypeInfo};

/// One hop from a struct to one of its (possibly promoted) fields.
#[derive(Clone, Copy)]
pub(crate) enum Step {
    Offset(usize),
    Deref(DerefFn),
}

/// A field of the visible field set.
pub(crate) struct Field {
    pub(crate) name: &'static str,
    pub(crate) info: &'static TypeInfo,
    pub(crate) omit_empty: bool,
    /// The `string` option on a field whose kind can be quoted.
    pub(crate) quoted: bool,
    path: Vec<Step>,
    level: usize,
    tagged: bool,
}

impl Field {
    /// Resolves the field inside the struct at `base`. `None` when the field
    /// was promoted through a nil pointer.
    ///
    /// # Safety
    ///
    /// `base` must point at the struct the field set was collected for.
    #[inline]
    pub(crate) unsafe fn locate<'a>(&self, base: Ptr<'a>) -> Option<Ptr<'a>> {
        unsafe { locate(&self.path, base) }
    }

    /// Whether reaching the field goes through a pointer.
    pub(crate) fn is_indirect(&self) -> bool {
        self.path.iter().any(|step| matches!(step, Step::Deref(_)))
    }
}

#[inline]
unsafe fn locate<'a>(path: &[Step], base: Ptr<'a>) -> Option<Ptr<'a>> {
    let mut ptr = base;
    for step in path {
        ptr = match *step {
            // SAFETY: offsets come from `offset_of!` on the enclosing struct.
            Step::Offset(offset) => unsafe { ptr.byte_add(offset) },
            // SAFETY: the deref function belongs to the pointer type found at
            // this position.
            Step::Deref(deref) => unsafe { deref(ptr) }?,
        };
    }
    Some(ptr)
}

/// The parsed form of a `name,option,option` annotation.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Tag<'t> {
    pub(crate) name: &'t str,
    pub(crate) omit_empty: bool,
    pub(crate) string: bool,
}

/// Parses a field tag; `None` when the field is dropped.
pub(crate) fn parse_tag(tag: &str) -> Option<Tag<'_>> {
    if tag == "-" {
        return None;
    }
    let mut parts = tag.split(',');
    let mut parsed = Tag {
        name: parts.next().unwrap_or_default(),
        ..Tag::default()
    };
    for option in parts {
        match option {
            "omitempty" => parsed.omit_empty = true,
            "string" => parsed.string = true,
            _ => {}
        }
    }
    Some(parsed)
}

/// Collects the visible fields of `info`, flattening at most `budget` levels
/// of embedding.
pub(crate) fn collect_fields(info: &'static TypeInfo, budget: u8) -> Vec<Field> {
    let mut fields = Vec::new();
    walk(info, &[], 0, budget, &mut fields);

    fields.sort_by(|a, b| {
        a.name
            .cmp(b.name)
            .then(a.level.cmp(&b.level))
            .then(b.tagged.cmp(&a.tagged))
    });
    let mut visible: Vec<Field> = Vec::with_capacity(fields.len());
    let mut rest = fields.into_iter().peekable();
    while let Some(first) = rest.next() {
        let mut clash = false;
        while let Some(other) = rest.next_if(|f| f.name == first.name) {
            clash |= other.level == first.level && other.tagged == first.tagged;
        }
        if !clash {
            visible.push(first);
        }
    }
    visible
}

fn walk(info: &'static TypeInfo, prefix: &[Step], level: usize, budget: u8, out: &mut Vec<Field>) {
    let Kind::Struct(structure) = info.kind() else {
        return;
    };
    for field in structure.fields() {
        let Some(tag) = parse_tag(field.tag()) else {
            continue;
        };
        let mut path = prefix.to_vec();
        push_offset(&mut path, field.offset());
        let ty = field.type_info();

        if field.is_embedded() && tag.name.is_empty() {
            let mut target = ty;
            let mut through = path.clone();
            while let Kind::Pointer(pointer) = target.kind() {
                through.push(Step::Deref(pointer.deref_fn()));
                target = pointer.pointee();
            }
            if is_flattenable(target) {
                if budget > 0 {
                    walk(target, &through, level + 1, budget - 1, out);
                }
                continue;
            }
        }
        if !field.is_exported() {
            continue;
        }

        out.push(Field {
            name: if tag.name.is_empty() {
                field.name()
            } else {
                tag.name
            },
            info: ty,
            omit_empty: tag.omit_empty,
            quoted: tag.string && is_quotable(ty),
            path,
            level,
            tagged: !tag.name.is_empty(),
        });
    }
}

fn push_offset(path: &mut Vec<Step>, offset: usize) {
    match path.last_mut() {
        Some(Step::Offset(last)) => *last += offset,
        _ => path.push(Step::Offset(offset)),
    }
}

fn is_flattenable(info: &TypeInfo) -> bool {
    matches!(info.kind(), Kind::Struct(_))
        && info.capabilities().is_empty()
        && !is_registered(info.type_id())
}

/// Scalars, possibly behind pointers, may carry the `string` option.
fn is_quotable(mut info: &'static TypeInfo) -> bool {
    while let Kind::Pointer(pointer) = info.kind() {
        info = pointer.pointee();
    }
    info.kind().is_quotable_scalar()
}

struct Entry {
    /// `"name":`, or a newline, indentation and `"name": ` when pretty.
    key: Box<[u8]>,
    path: Box<[Step]>,
    plan: Plan,
}

pub(super) fn struct_plan(info: &'static TypeInfo, site: Site) -> Plan {
    let Site {
        flags,
        depth,
        indent: level,
        ..
    } = site;
    let pretty = flags.contains(Flags::PRETTY);
    let inherited = flags.inherited();

    let entries: Box<[Entry]> = collect_fields(info, super::MAX_DEPTH.saturating_sub(depth))
        .into_iter()
        .map(|field| {
            let mut field_flags = inherited;
            field_flags.set(Flags::OMIT_EMPTY, field.omit_empty);
            field_flags.set(Flags::NEED_QUOTES, field.quoted);
            let mut child = site.child(field_flags);
            child.addressable |= field.is_indirect();

            let mut key = Vec::with_capacity(field.name.len() + 4 + usize::from(level));
            if pretty {
                indent(&mut key, level + 1);
            }
            quote_str(&mut key, field.name, inherited);
            key.extend_from_slice(if pretty { &b": "[..] } else { &b":"[..] });

            Entry {
                key: key.into_boxed_slice(),
                plan: plan_for(field.info, child),
                path: field.path.into_boxed_slice(),
            }
        })
        .collect();

    plan(move |buf, ptr| {
        buf.push(b'{');
        let open = buf.len();
        for entry in entries.iter() {
            // SAFETY: the paths were collected from this struct's descriptor.
            let Some(field) = (unsafe { locate(&entry.path, ptr) }) else {
                continue;
            };
            let mark = buf.len();
            buf.extend_from_slice(&entry.key);
            let value_start = buf.len();
            (entry.plan)(buf, field)?;
            if buf.len() == value_start {
                buf.truncate(mark);
                continue;
            }
            buf.push(b',');
        }
        if buf.len() > open {
            buf.pop();
            if pretty {
                indent(buf, level);
            }
        }
        buf.push(b'}');
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{reflect_struct, Typed};

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag(""), Some(Tag::default()));
        assert_eq!(parse_tag("-"), None);
        assert_eq!(
            parse_tag("-,"),
            Some(Tag {
                name: "-",
                ..Tag::default()
            })
        );
        assert_eq!(
            parse_tag("id,omitempty,string"),
            Some(Tag {
                name: "id",
                omit_empty: true,
                string: true
            })
        );
        assert_eq!(
            parse_tag(",string,unknown"),
            Some(Tag {
                name: "",
                omit_empty: false,
                string: true
            })
        );
    }

    #[allow(dead_code)]
    struct Deep {
        name: String,
        z: u8,
    }

    #[allow(dead_code)]
    struct Middle {
        deep: Deep,
        name: String,
        tagged: u8,
    }

    #[allow(dead_code)]
    struct Other {
        tagged: u8,
        untagged: u8,
    }

    #[allow(dead_code)]
    struct Top {
        middle: Middle,
        other: Other,
        untagged: u8,
        hidden: u8,
    }

    reflect_struct!(Deep { name: String, z: u8 });
    reflect_struct!(Middle {
        #[embedded]
        deep: Deep,
        name: String,
        tagged: u8,
    });
    reflect_struct!(Other {
        tagged: u8 = "tagged",
        untagged: u8 = "twin",
    });
    reflect_struct!(Top {
        #[embedded]
        middle: Middle,
        #[embedded]
        #[private]
        other: Other,
        untagged: u8 = "twin",
        #[private]
        hidden: u8,
    });

    #[test]
    fn test_conflict_resolution() {
        let fields = collect_fields(Top::type_info(), 8);
        let names: Vec<_> = fields.iter().map(|f| f.name).collect();
        // `name`: Middle's (level 1) shadows Deep's (level 2).
        // `tagged`: Other's is tagged, Middle's is not, both level 1.
        // `twin`: Top's (level 0) shadows Other's.
        assert_eq!(names, ["name", "tagged", "twin", "z"]);

        let name = &fields[0];
        assert!(name.info.is::<String>());
        let tagged = &fields[1];
        let top = Top {
            middle: Middle {
                deep: Deep {
                    name: "deep".into(),
                    z: 9,
                },
                name: "middle".into(),
                tagged: 1,
            },
            other: Other {
                tagged: 2,
                untagged: 3,
            },
            untagged: 4,
            hidden: 5,
        };
        let value = |field: &Field| unsafe { *field.locate(Ptr::from_ref(&top)).unwrap().deref::<u8>() };
        assert_eq!(value(tagged), 2);
        assert_eq!(value(&fields[2]), 4);
        assert_eq!(value(&fields[3]), 9);
    }

    #[test]
    fn test_flattening_respects_budget() {
        let names: Vec<_> = collect_fields(Top::type_info(), 1)
            .iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, ["name", "tagged", "twin"]);
    }
}
