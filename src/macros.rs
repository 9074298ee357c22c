/// Builds a [`Value`](crate::Value) from JSON-like syntax.
///
/// Object keys must be string literals; any other leaf is converted with
/// `Value::from`.
///
/// ```rust
/// use jsonplan::{json, Value};
///
/// let value = json!({ "ok": true, "items": [1, "two", null] });
/// assert_eq!(value.as_object().map(|o| o.len()), Some(2));
/// assert_eq!(json!(null), Value::Null);
/// ```
#[macro_export]
macro_rules! json {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![$($crate::json!($elem)),*])
    };

    ({}) => {
        $crate::Value::Object($crate::Map::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::Map::new();
        $(
            object.insert($key.to_string(), $crate::json!($value));
        )*
        $crate::Value::Object(object)
    }};

    // Any other expression, including negative numbers and variables.
    ($s:expr) => {
        $crate::Value::from($s)
    };
}
