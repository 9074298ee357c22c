//! Capabilities and registered encoders.
//!
//! Run with: cargo run --example custom_encoders

use jsonplan::reflect::{Kind, TypeInfoCell};
use jsonplan::{
    reflect_struct, register_encoder, to_string, Error, Flags, MarshalText, Receiver, Result,
    TypeInfo, Typed,
};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
struct Level(u8);

impl MarshalText for Level {
    fn marshal_text(&self) -> Result<Vec<u8>> {
        match self.0 {
            0 => Ok(b"debug".to_vec()),
            1 => Ok(b"info".to_vec()),
            2 => Ok(b"warn".to_vec()),
            n => Err(Error::custom(format!("unknown level {n}"))),
        }
    }
}

unsafe impl Typed for Level {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::new::<Level>(Kind::U8).with_marshal_text::<Level>(Receiver::Value)
        })
    }
}

#[derive(Clone, Copy)]
#[repr(transparent)]
struct Cents(i64);

unsafe impl Typed for Cents {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::new::<Cents>(Kind::I64))
    }
}

struct Invoice {
    level: Level,
    amount: Cents,
    by_level: BTreeMap<Level, u32>,
}

reflect_struct!(Invoice {
    level: Level,
    amount: Cents,
    by_level: BTreeMap<Level, u32> = "by_level,omitempty",
});

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Registered before the first encode that reaches Cents.
    register_encoder::<Cents, _>(|flags: Flags| {
        Arc::new(move |buf: &mut Vec<u8>, c: &Cents| {
            jsonplan::append_string(buf, &format!("{}.{:02}", c.0 / 100, c.0 % 100), flags);
            Ok(())
        })
    });

    let invoice = Invoice {
        level: Level(1),
        amount: Cents(1999),
        by_level: [(Level(2), 3), (Level(0), 7)].into_iter().collect(),
    };
    println!("{}", to_string(&invoice)?);

    match to_string(&vec![Level(9)]) {
        Err(err) => println!("Error from a failing capability: {}", err),
        Ok(json) => println!("Unexpected success: {}", json),
    }

    Ok(())
}
