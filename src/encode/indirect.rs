//! Pointers and dynamic values.

use super::{plan, plan_for, Plan, Site};
use crate::options::Flags;
use crate::reflect::{InterfaceInfo, PointerInfo};

/// What a nil pointer renders as in its slot.
fn nil_literal(flags: Flags) -> &'static [u8] {
    if flags.contains(Flags::OMIT_EMPTY) {
        b""
    } else if flags.contains(Flags::NEED_QUOTES) {
        b"\"\""
    } else {
        b"null"
    }
}

/// Follows one level of indirection. Emptiness belongs to the pointer slot,
/// so the pointee is compiled without `OMIT_EMPTY`.
pub(super) fn pointer_plan(pointer: &'static PointerInfo, site: Site) -> Plan {
    let pointee = plan_for(
        pointer.pointee(),
        Site {
            flags: site.flags - Flags::OMIT_EMPTY,
            depth: site.depth,
            indent: site.indent,
            addressable: true,
        },
    );
    let nil = nil_literal(site.flags);
    plan(move |buf, ptr| {
        // SAFETY: `pointer` describes the type this plan was compiled for.
        match unsafe { pointer.deref(ptr) } {
            Some(target) => pointee(buf, target),
            None => {
                buf.extend_from_slice(nil);
                Ok(())
            }
        }
    })
}

/// Resolves the concrete type on every call and encodes through the plan
/// cache at this slot's indentation. Resolved values are not addressable.
pub(super) fn interface_plan(iface: &'static InterfaceInfo, site: Site) -> Plan {
    let inner = site.payload(site.flags - Flags::OMIT_EMPTY);
    let nil: &'static [u8] = if site.flags.contains(Flags::OMIT_EMPTY) {
        b""
    } else {
        b"null"
    };
    plan(move |buf, ptr| {
        // SAFETY: `iface` describes the type this plan was compiled for.
        match unsafe { iface.resolve(ptr) } {
            Some((info, value)) => plan_for(info, inner)(buf, value),
            None => {
                buf.extend_from_slice(nil);
                Ok(())
            }
        }
    })
}
