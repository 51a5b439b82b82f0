use std::io::Write;
use tempfile::NamedTempFile;
use vic3txt::{DefaultVic3Txt, Entry, Scalar, Tree, Value, Vic3Txt};

fn tree_from_file(data: &str) -> Tree {
    let mut file = NamedTempFile::new().expect("TempFile");
    write!(file, "{}", data).expect("Write");
    DefaultVic3Txt::parse_file(file.path()).expect("Parse")
}

#[test]
fn test_state_region_block() {
    let data = "\u{feff}STATE_SVEALAND = {\n    id = 1\n    subsistence_building = \"building_subsistence_farms\"\n    provinces = { \"x0A0B0C\" \"x1A1B1C\" }\n    arable_land = 36\n}\n";
    let tree = tree_from_file(data);
    assert_eq!(tree.len(), 1);

    let body = tree
        .get("STATE_SVEALAND")
        .and_then(Value::as_block)
        .expect("block");
    assert_eq!(body.get("id").and_then(Value::as_scalar), Some(&Scalar::bare("1")));

    let provinces: Vec<_> = body
        .get("provinces")
        .and_then(Value::as_block)
        .expect("provinces")
        .items()
        .collect();
    assert_eq!(provinces.len(), 2);
    assert!(provinces[0].is_quoted());
    assert_eq!(provinces[1].text(), "x1A1B1C");
}

#[test]
fn test_repeated_keys_keep_order() {
    let tree = tree_from_file("create_pop = { size = 1 }\nfoo = bar\ncreate_pop = { size = 2 }\n");
    let sizes: Vec<_> = tree
        .get_all("create_pop")
        .filter_map(Value::as_block)
        .filter_map(|b| b.get("size"))
        .filter_map(Value::as_scalar)
        .map(|s| s.text().to_string())
        .collect();
    assert_eq!(sizes, vec!["1", "2"]);
    assert!(matches!(tree.entries[1], Entry::Pair { ref key, .. } if key == "foo"));
}

#[test]
fn test_empty_file() {
    let tree = tree_from_file("# nothing here\n");
    assert!(tree.is_empty());
}

#[test]
fn test_unbalanced_file_fails() {
    let mut file = NamedTempFile::new().expect("TempFile");
    write!(file, "a = {{ b = c").expect("Write");
    assert!(DefaultVic3Txt::parse_file(file.path()).is_err());
}

#[test]
fn test_json_dump() {
    let tree = tree_from_file("city = \"x1\"\n");
    let json = serde_json::to_string(&tree).expect("json");
    assert!(json.contains("\"text\":\"x1\""));
    assert!(json.contains("\"quoted\":true"));
}
