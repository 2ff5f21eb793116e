use bearml::{Document, Element, Error, FileStore, MemoryStore};
use pretty_assertions::assert_eq;
use std::fs;

#[test]
fn test_file_backed_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("service.bml");

    let mut doc = Document::open_path(&path).unwrap();
    assert!(path.exists());
    assert!(doc.keys(&[]).unwrap().is_empty());

    doc.add_key_value(&[], "name", "demo").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "name: demo\n");

    doc.add_empty_block(&[], "srv").unwrap();
    doc.change_block_comment(&["srv"], "web").unwrap();
    doc.add_key_value(&["srv"], "port", &8080).unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "name: demo\n\n#web\n>> srv <<\n  port: 8080\n"
    );

    let reopened = Document::open(FileStore::new(&path)).unwrap();
    assert_eq!(reopened.get_block_comment(&["srv"]).unwrap(), Some("web"));
    assert_eq!(reopened.get_value::<u16>(&["srv"], "port").unwrap(), 8080);
}

#[test]
fn test_block_metadata() {
    let mut doc = Document::parse("# old\n>> srv <<\n  a: 1\n").unwrap();
    assert_eq!(doc.get_block_comment(&["srv"]).unwrap(), Some(" old"));

    doc.change_block_name(&["srv"], "web").unwrap();
    assert!(!doc.contains_block(&["srv"]));
    assert!(doc.contains_block(&["web"]));
    assert_eq!(doc.to_string(), "# old\n>> web <<\n  a: 1\n");

    doc.remove_block_comment(&["web"]).unwrap();
    assert_eq!(doc.get_block_comment(&["web"]).unwrap(), None);
    assert_eq!(doc.to_string(), ">> web <<\n  a: 1\n");
}

#[test]
fn test_key_metadata() {
    let mut doc = Document::parse("# note\nport: 80\n").unwrap();

    doc.change_key_aliases(&[], "port", &["p", "@listen"]).unwrap();
    assert_eq!(doc.get_key_aliases(&[], "p").unwrap(), ["p", "@listen"]);
    assert_eq!(doc.get_value::<u16>(&[], "@listen").unwrap(), 80);
    assert_eq!(doc.to_string(), "# note\n[p|@listen]\nport: 80\n");

    doc.remove_comment(&[], "p").unwrap();
    assert_eq!(doc.get_comment(&[], "port").unwrap(), None);
    assert_eq!(doc.to_string(), "[p|@listen]\nport: 80\n");

    doc.remove_key_aliases(&[], "port").unwrap();
    assert!(!doc.contains_key(&[], "p"));
    assert_eq!(doc.to_string(), "port: 80\n");
}

#[test]
fn test_lookup_errors() {
    let doc = Document::parse("a: 1\n\n>> b <<\n  c: 2\n").unwrap();

    assert!(matches!(doc.get_element(&[], "zz"), Err(Error::KeyNotFound(k)) if k == "zz"));
    assert!(matches!(
        doc.get_element(&["b", "nope"], "c"),
        Err(Error::BlockNotFound(b)) if b == "nope"
    ));
    assert!(matches!(
        doc.get_value::<Vec<u8>>(&[], "a"),
        Err(Error::TypeMismatch { .. })
    ));
    assert_eq!(doc.try_get_value::<u8>(&["b"], "c"), Some(2));
    assert_eq!(doc.try_get_value::<u8>(&["b"], "missing"), None);
    assert!(doc.contains_key(&["b"], "c"));
    assert!(!doc.contains_key(&["missing"], "c"));
}

#[test]
fn test_invalid_names_change_nothing() {
    let mut doc = Document::parse("a: 1\n").unwrap();
    assert!(matches!(
        doc.change_key_name(&[], "a", "  "),
        Err(Error::InvalidName(_))
    ));
    assert!(matches!(
        doc.add_key_value(&[], "a", "again"),
        Err(Error::DuplicateKey(k)) if k == "a"
    ));
    assert!(matches!(
        doc.add_empty_block(&[], ""),
        Err(Error::InvalidName(_))
    ));
    assert_eq!(doc.to_string(), "a: 1\n");
}

#[test]
fn test_remove_key_returns_value() {
    let mut doc = Document::parse("a: 1\nb:\n  - x\n").unwrap();
    let removed = doc.remove_key(&[], "b").unwrap();
    assert_eq!(removed, Element::List(vec![Element::from("x")]));
    assert_eq!(doc.to_string(), "a: 1\n");
}

#[test]
fn test_auto_format_regenerates_on_write() {
    let store = MemoryStore::from_text("a:    1\n\n\nb:  2\n");
    let mut doc = Document::open(store.clone()).unwrap();
    doc.set_auto_format(true);
    doc.save().unwrap();
    assert_eq!(store.text(), "a: 1\n\nb: 2\n");
}

#[test]
fn test_parse_error_is_reported() {
    let err = Document::parse("ok: 1\n\n>> b <<\n  oops\n").unwrap_err();
    match err {
        Error::InvalidFormat {
            line,
            column,
            message,
            ..
        } => {
            assert_eq!((line, column), (3, 2));
            assert_eq!(message, "Invalid line.");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_debug_output() {
    let doc = Document::new();
    let debug = format!("{doc:?}");
    assert!(debug.contains("Document"));
    assert!(debug.contains("has_sink: false"));
}
