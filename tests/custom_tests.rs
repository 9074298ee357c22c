use jsonplan::reflect::{Kind, TypeInfoCell};
use jsonplan::{
    encode, reflect_struct, register_encoder, to_string, AppendJson, EncodeOptions, Error, Flags,
    MarshalJson, MarshalText, Receiver, Reflect, Result, TypeInfo, Typed,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

fn encode_with(value: &impl Typed, flags: Flags) -> Result<String> {
    let mut buf = Vec::new();
    encode(&mut buf, value, flags)?;
    Ok(String::from_utf8(buf).unwrap())
}

/// A text-marshaling key type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
struct Color(u8);

impl MarshalText for Color {
    fn marshal_text(&self) -> Result<Vec<u8>> {
        match self.0 {
            0 => Ok(b"red".to_vec()),
            1 => Ok(b"green".to_vec()),
            n => Err(Error::custom(format!("unknown color {n}"))),
        }
    }
}

unsafe impl Typed for Color {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::new::<Color>(Kind::U8).with_marshal_text::<Color>(Receiver::Value)
        })
    }
}

#[test]
fn test_marshal_text_as_value_and_key() {
    assert_eq!(to_string(&Color(1)).unwrap(), r#""green""#);

    let mut map = BTreeMap::new();
    map.insert(Color(1), 2u8);
    map.insert(Color(0), 1u8);
    assert_eq!(to_string(&map).unwrap(), r#"{"green":2,"red":1}"#);
}

#[test]
fn test_capability_error_is_wrapped() {
    let err = to_string(&vec![Color(0), Color(9)]).unwrap_err();
    match err {
        Error::Marshaler {
            type_name,
            method,
            msg,
        } => {
            assert!(type_name.ends_with("Color"));
            assert_eq!(method, "marshal_text");
            assert!(msg.contains("unknown color 9"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

/// Appends its JSON only through a pointer receiver.
#[repr(transparent)]
struct Counter(u32);

impl AppendJson for Counter {
    fn append_json(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.extend_from_slice(format!("{{\"count\":{}}}", self.0).as_bytes());
        Ok(())
    }
}

unsafe impl Typed for Counter {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::new::<Counter>(Kind::U32).with_append_json::<Counter>(Receiver::Pointer)
        })
    }
}

#[test]
fn test_pointer_receiver_needs_an_address() {
    // Elements and top-level values are addressable.
    assert_eq!(to_string(&Counter(1)).unwrap(), r#"{"count":1}"#);
    assert_eq!(
        to_string(&vec![Counter(1), Counter(2)]).unwrap(),
        r#"[{"count":1},{"count":2}]"#
    );

    // Map values are not, so the entry contributes nothing.
    let mut map = HashMap::new();
    map.insert("c".to_string(), Counter(3));
    assert_eq!(to_string(&map).unwrap(), "{}");

    // Neither are values held by a dynamic value.
    let values: Vec<Box<dyn Reflect>> = vec![Box::new(Counter(4)), Box::new(5u8)];
    assert_eq!(to_string(&values).unwrap(), "[5]");

    // A pointer restores addressability.
    let mut map = HashMap::new();
    map.insert("c".to_string(), Box::new(Counter(6)));
    assert_eq!(to_string(&map).unwrap(), r#"{"c":{"count":6}}"#);
}

/// Emits whatever JSON text it holds.
#[repr(transparent)]
struct Verbatim(String);

impl MarshalJson for Verbatim {
    fn marshal_json(&self) -> Result<Vec<u8>> {
        Ok(self.0.clone().into_bytes())
    }
}

unsafe impl Typed for Verbatim {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::new::<Verbatim>(Kind::String).with_marshal_json::<Verbatim>(Receiver::Value)
        })
    }
}

#[test]
fn test_marshal_json_validation() {
    let good = Verbatim(r#"{"a": [1, 2]}"#.to_string());
    assert_eq!(to_string(&good).unwrap(), r#"{"a": [1, 2]}"#);

    let bad = Verbatim("{oops".to_string());
    assert!(matches!(
        to_string(&bad),
        Err(Error::InvalidJson { .. })
    ));
    assert_eq!(encode_with(&bad, Flags::FASTEST).unwrap(), "{oops");
}

#[test]
fn test_capability_output_requoted_as_key() {
    let mut map = BTreeMap::new();
    map.insert(Verbatim("12".to_string()), true);
    assert_eq!(to_string(&map).unwrap(), r#"{"12":true}"#);
}

impl PartialEq for Verbatim {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for Verbatim {}
impl PartialOrd for Verbatim {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Verbatim {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

struct Labels {
    color: Color,
    optional: Verbatim,
}

reflect_struct!(Labels {
    color: Color,
    optional: Verbatim = "opt,omitempty",
});

#[test]
fn test_capability_honors_omit_empty_by_kind() {
    let labels = Labels {
        color: Color(0),
        optional: Verbatim(String::new()),
    };
    assert_eq!(to_string(&labels).unwrap(), r#"{"color":"red"}"#);

    let labels = Labels {
        color: Color(0),
        optional: Verbatim("1".to_string()),
    };
    assert_eq!(to_string(&labels).unwrap(), r#"{"color":"red","opt":1}"#);
}

/// Gets its encoder from the registry.
#[derive(Clone, Copy)]
#[repr(transparent)]
struct Celsius(f64);

unsafe impl Typed for Celsius {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::new::<Celsius>(Kind::F64))
    }
}

#[test]
fn test_registered_encoder() {
    register_encoder::<Celsius, _>(|flags: Flags| {
        let quote = flags.contains(Flags::NEED_QUOTES);
        Arc::new(move |buf: &mut Vec<u8>, c: &Celsius| {
            if c.0 < -273.15 {
                return Err(Error::custom("below absolute zero"));
            }
            let text = format!("{}C", c.0);
            if quote {
                jsonplan::append_string(buf, &text, flags);
            } else {
                jsonplan::append_string(buf, &text, Flags::FASTEST);
            }
            Ok(())
        })
    });

    assert_eq!(to_string(&vec![Celsius(21.5)]).unwrap(), r#"["21.5C"]"#);

    let err = to_string(&Celsius(-300.0)).unwrap_err();
    assert!(matches!(
        err,
        Error::Marshaler {
            method: "registered encoder",
            ..
        }
    ));
}

/// Declares a capability that a registered encoder overrides.
#[repr(transparent)]
struct Overridden(u8);

impl MarshalText for Overridden {
    fn marshal_text(&self) -> Result<Vec<u8>> {
        Ok(b"capability".to_vec())
    }
}

unsafe impl Typed for Overridden {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::new::<Overridden>(Kind::U8).with_marshal_text::<Overridden>(Receiver::Value)
        })
    }
}

#[test]
fn test_registry_precedes_capabilities_and_last_wins() {
    register_encoder::<Overridden, _>(|_| {
        Arc::new(|buf: &mut Vec<u8>, _: &Overridden| {
            buf.extend_from_slice(b"1");
            Ok(())
        })
    });
    register_encoder::<Overridden, _>(|_| {
        Arc::new(|buf: &mut Vec<u8>, v: &Overridden| {
            jsonplan::append_uint(buf, u64::from(v.0) * 10);
            Ok(())
        })
    });
    let options = EncodeOptions::fastest().with_pretty(true);
    let json = jsonplan::to_string_with_options(&Overridden(4), &options).unwrap();
    assert_eq!(json, "40");
}
