/// Builds an [`Element`](crate::Element) from a literal.
///
/// `null` is the empty element, `[...]` a list and `{"key": ...}` a
/// dictionary; anything else goes through [`to_element`](crate::to_element)
/// and falls back to the empty element if it cannot be converted.
///
/// ```rust
/// use bearml::{element, Element};
///
/// let limits = element!({"cpu": 2, "tags": ["a", null]});
/// let map = limits.as_dictionary().unwrap();
/// assert_eq!(map.get("cpu"), Some(&Element::from("2")));
/// assert_eq!(
///     map.get("tags"),
///     Some(&Element::List(vec![Element::from("a"), Element::Empty]))
/// );
/// ```
#[macro_export]
macro_rules! element {
    (null) => {
        $crate::Element::Empty
    };

    ([]) => {
        $crate::Element::List(vec![])
    };

    ([ $($item:tt),* $(,)? ]) => {
        $crate::Element::List(vec![$($crate::element!($item)),*])
    };

    ({}) => {
        $crate::Element::Dictionary($crate::ElementMap::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut map = $crate::ElementMap::new();
        $(
            map.insert($key.to_string(), $crate::element!($value));
        )*
        $crate::Element::Dictionary(map)
    }};

    ($other:expr) => {
        $crate::to_element(&$other).unwrap_or($crate::Element::Empty)
    };
}
