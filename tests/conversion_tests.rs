use bearml::{from_element, from_str, to_element, to_string, Document, Element, Error};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Tls {
    cert: String,
    verify: bool,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
enum Mode {
    Fast,
    Limit(u32),
    Window { from: u8, to: u8 },
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Server {
    host: String,
    port: u16,
    tls: Option<Tls>,
    tags: Vec<String>,
    mode: Mode,
    #[serde(skip)]
    cache_hits: u32,
}

fn server() -> Server {
    Server {
        host: "example.org".to_string(),
        port: 443,
        tls: Some(Tls {
            cert: "/etc/cert.pem".to_string(),
            verify: true,
        }),
        tags: vec!["edge".to_string(), "eu-west".to_string()],
        mode: Mode::Window { from: 1, to: 9 },
        cache_hits: 0,
    }
}

#[test]
fn test_simple_struct_text() {
    let tls = Tls {
        cert: "/c".to_string(),
        verify: true,
    };
    let text = to_string(&tls).unwrap();
    assert_eq!(text, "$\n  cert: /c\n  verify: true");
    assert_eq!(from_str::<Tls>(&text).unwrap(), tls);
}

#[test]
fn test_nested_struct_through_document() {
    let mut doc = Document::new();
    doc.add_key_value(&[], "server", &server()).unwrap();

    let reparsed = Document::parse(&doc.to_string()).unwrap();
    assert_eq!(reparsed.get_value::<Server>(&[], "server").unwrap(), server());
}

#[test]
fn test_skipped_field_is_not_written() {
    let mut value = server();
    value.cache_hits = 7;
    let element = to_element(&value).unwrap();
    let map = element.as_dictionary().unwrap();
    assert!(!map.contains_key("cache_hits"));
    assert_eq!(map.len(), 5);

    let back: Server = from_element(&element).unwrap();
    assert_eq!(back.cache_hits, 0);
}

#[test]
fn test_enum_variants() {
    for mode in [Mode::Fast, Mode::Limit(3), Mode::Window { from: 2, to: 4 }] {
        let text = to_string(&mode).unwrap();
        assert_eq!(from_str::<Mode>(&text).unwrap(), mode);
    }
    assert_eq!(to_string(&Mode::Fast).unwrap(), "Fast");
}

#[test]
fn test_awkward_strings() {
    let samples = [
        "a: b # c",
        " leading",
        "trailing ",
        "",
        "@",
        "$",
        "two\nlines",
        "back\\slash",
        "[not a list",
        "- dash",
    ];
    for sample in samples {
        let text = to_string(sample).unwrap();
        assert_eq!(from_str::<String>(&text).unwrap(), sample, "{text:?}");

        let mut doc = Document::new();
        doc.add_key_value(&[], "k", sample).unwrap();
        let reparsed = Document::parse(&doc.to_string()).unwrap();
        assert_eq!(reparsed.get_value::<String>(&[], "k").unwrap(), sample);
    }
}

#[test]
fn test_collections() {
    let nested = vec![vec![1u8, 2], vec![], vec![3]];
    let text = to_string(&nested).unwrap();
    assert_eq!(from_str::<Vec<Vec<u8>>>(&text).unwrap(), nested);

    let mut scores = HashMap::new();
    scores.insert("alice".to_string(), 3u32);
    scores.insert("bob".to_string(), 5u32);
    let text = to_string(&scores).unwrap();
    assert_eq!(from_str::<HashMap<String, u32>>(&text).unwrap(), scores);

    let tuple = (7u8, "seven".to_string(), false);
    let text = to_string(&tuple).unwrap();
    assert_eq!(from_str::<(u8, String, bool)>(&text).unwrap(), tuple);

    let servers = vec![server(), server()];
    let text = to_string(&servers).unwrap();
    assert_eq!(from_str::<Vec<Server>>(&text).unwrap(), servers);
}

#[test]
fn test_large_lists_collapse() {
    let numbers: Vec<i32> = (-10..10).collect();
    let text = to_string(&numbers).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert_eq!(from_str::<Vec<i32>>(&text).unwrap(), numbers);
}

#[test]
fn test_conversion_errors() {
    assert!(matches!(
        from_str::<Tls>("$\n  cert: /c"),
        Err(Error::FieldNotFound(f)) if f == "verify"
    ));
    assert!(matches!(
        from_str::<u8>("256"),
        Err(Error::TypeMismatch { .. })
    ));
    assert!(matches!(
        from_element::<Tls>(&Element::from("x")),
        Err(Error::TypeMismatch { .. })
    ));
    assert!(matches!(
        from_str::<i32>("1\n2"),
        Err(Error::InvalidFormat { line: 1, .. })
    ));
}
