/// Implements [`Typed`](crate::Typed) for a struct from its field list.
///
/// Each field is written as `name: Type`, optionally followed by `= "tag"`
/// (`"rename,omitempty,string"`, or `"-"` to drop the field) and preceded by
/// `#[embedded]` and/or `#[private]` markers. Capabilities implemented by the
/// struct are declared with `#[capabilities(marshal_json(Value), ...)]`.
///
/// ```rust
/// use jsonplan::reflect_struct;
///
/// struct Base {
///     id: u64,
/// }
///
/// struct User {
///     base: Base,
///     name: String,
///     nick: String,
/// }
///
/// reflect_struct!(Base { id: u64 = "id" });
/// reflect_struct!(User {
///     #[embedded]
///     base: Base,
///     name: String,
///     nick: String = "nick,omitempty",
/// });
///
/// let user = User { base: Base { id: 7 }, name: "Ann".into(), nick: String::new() };
/// assert_eq!(jsonplan::to_string(&user).unwrap(), r#"{"id":7,"name":"Ann"}"#);
/// ```
#[macro_export]
macro_rules! reflect_struct {
    (
        $(#[capabilities($($cap:ident($recv:ident)),* $(,)?)])?
        $name:ident {
            $( $(#[$marker:ident])* $field:ident : $ty:ty $(= $tag:literal)? ),* $(,)?
        }
    ) => {
        unsafe impl $crate::Typed for $name {
            fn type_info() -> &'static $crate::TypeInfo {
                static CELL: $crate::reflect::TypeInfoCell = $crate::reflect::TypeInfoCell::new();
                CELL.get_or_init(|| {
                    $( let _: fn(&$name) -> &$ty = |value| &value.$field; )*
                    #[allow(unused_mut)]
                    let mut info = $crate::TypeInfo::structure::<$name>(::std::vec![
                        $(
                            $crate::reflect::FieldInfo::new::<$ty>(
                                ::core::stringify!($field),
                                ::core::mem::offset_of!($name, $field),
                            )
                            $(.with_tag($tag))?
                            $(.$marker())*
                        ),*
                    ]);
                    $($(
                        info = $crate::reflect_struct!(@cap info, $name, $cap($recv));
                    )*)?
                    info
                })
            }
        }
    };

    (@cap $info:ident, $name:ident, append_json($recv:ident)) => {
        $info.with_append_json::<$name>($crate::Receiver::$recv)
    };
    (@cap $info:ident, $name:ident, marshal_json($recv:ident)) => {
        $info.with_marshal_json::<$name>($crate::Receiver::$recv)
    };
    (@cap $info:ident, $name:ident, marshal_text($recv:ident)) => {
        $info.with_marshal_text::<$name>($crate::Receiver::$recv)
    };
}

#[cfg(test)]
mod tests {
    use crate::reflect::Kind;
    use crate::{MarshalText, Receiver, Result, Typed};

    #[allow(dead_code)]
    struct Inner {
        flag: bool,
    }

    #[allow(dead_code)]
    struct Outer {
        inner: Inner,
        label: String,
        skipped: u8,
        count: Option<u32>,
    }

    struct Code(u16);

    impl MarshalText for Code {
        fn marshal_text(&self) -> Result<Vec<u8>> {
            Ok(format!("C{}", self.0).into_bytes())
        }
    }

    reflect_struct!(Inner { flag: bool });
    reflect_struct!(Outer {
        #[embedded]
        #[private]
        inner: Inner,
        label: String = "name,omitempty",
        skipped: u8 = "-",
        count: Option<u32>,
    });

    unsafe impl Typed for Code {
        fn type_info() -> &'static crate::TypeInfo {
            static CELL: crate::reflect::TypeInfoCell = crate::reflect::TypeInfoCell::new();
            CELL.get_or_init(|| {
                crate::TypeInfo::new::<Code>(Kind::U16).with_marshal_text::<Code>(Receiver::Value)
            })
        }
    }

    #[allow(dead_code)]
    struct Labelled {
        code: u16,
    }

    impl MarshalText for Labelled {
        fn marshal_text(&self) -> Result<Vec<u8>> {
            Ok(self.code.to_string().into_bytes())
        }
    }

    reflect_struct!(
        #[capabilities(marshal_text(Pointer))]
        Labelled { code: u16 }
    );

    #[test]
    fn test_struct_fields_in_declaration_order() {
        let Kind::Struct(info) = Outer::type_info().kind() else {
            panic!("expected struct kind");
        };
        let names: Vec<_> = info.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, ["inner", "label", "skipped", "count"]);

        let inner = &info.fields()[0];
        assert!(inner.is_embedded());
        assert!(!inner.is_exported());
        assert!(inner.type_info().is::<Inner>());
        assert_eq!(inner.offset(), std::mem::offset_of!(Outer, inner));

        assert_eq!(info.fields()[1].tag(), "name,omitempty");
        assert_eq!(info.fields()[2].tag(), "-");
        assert!(matches!(info.fields()[3].type_info().kind(), Kind::Pointer(_)));
    }

    #[test]
    fn test_declared_capabilities() {
        assert_eq!(
            Labelled::type_info().capabilities().marshal_text(),
            Some(Receiver::Pointer)
        );
        assert_eq!(Code::type_info().capabilities().marshal_text(), Some(Receiver::Value));
        assert!(Outer::type_info().capabilities().is_empty());
    }
}
