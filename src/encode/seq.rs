//! Slices and arrays.

use super::string::bytes_plan;
use super::{indent, is_registered, plan, plan_for, Plan, Site};
use crate::options::Flags;
use crate::ptr::Ptr;
use crate::reflect::{ArrayInfo, SliceInfo, TypeInfo};
use crate::Result;

/// Byte elements without an encoder of their own are rendered as base64.
fn is_plain_byte(elem: &TypeInfo) -> bool {
    elem.is::<u8>() && elem.capabilities().is_empty() && !is_registered(elem.type_id())
}

pub(super) fn slice_plan(slice: &'static SliceInfo, site: Site) -> Plan {
    let elem = slice.elem();
    if is_plain_byte(elem) {
        return bytes_plan(slice, site.flags);
    }
    let mut child = site.child(site.flags.inherited());
    child.addressable = true;
    let elements = Elements {
        plan: plan_for(elem, child),
        stride: elem.size(),
        pretty: site.flags.contains(Flags::PRETTY),
        indent: site.indent,
    };
    let omit = site.flags.contains(Flags::OMIT_EMPTY);
    plan(move |buf, ptr| {
        // SAFETY: `slice` describes the type this plan was compiled for.
        let (data, len) = unsafe { slice.parts(ptr) };
        if omit && len == 0 {
            return Ok(());
        }
        elements.write(buf, data, len)
    })
}

pub(super) fn array_plan(array: &'static ArrayInfo, site: Site) -> Plan {
    let elem = array.elem();
    let elements = Elements {
        plan: plan_for(elem, site.child(site.flags.inherited())),
        stride: elem.size(),
        pretty: site.flags.contains(Flags::PRETTY),
        indent: site.indent,
    };
    let len = array.len();
    let omit = site.flags.contains(Flags::OMIT_EMPTY);
    plan(move |buf, ptr| {
        if omit && len == 0 {
            return Ok(());
        }
        elements.write(buf, ptr, len)
    })
}

struct Elements {
    plan: Plan,
    stride: usize,
    pretty: bool,
    indent: u16,
}

impl Elements {
    /// Writes `[e0,e1,...]`. Elements that append nothing leave no separator
    /// behind.
    fn write(&self, buf: &mut Vec<u8>, data: Ptr<'_>, len: usize) -> Result<()> {
        buf.push(b'[');
        let open = buf.len();
        for i in 0..len {
            let mark = buf.len();
            if self.pretty {
                indent(buf, self.indent + 1);
            }
            let start = buf.len();
            // SAFETY: `i < len`, so the element lies inside the sequence.
            (self.plan)(buf, unsafe { data.byte_add(i * self.stride) })?;
            if buf.len() == start {
                buf.truncate(mark);
                continue;
            }
            buf.push(b',');
        }
        if buf.len() > open {
            buf.pop();
            if self.pretty {
                indent(buf, self.indent);
            }
        }
        buf.push(b']');
        Ok(())
    }
}
