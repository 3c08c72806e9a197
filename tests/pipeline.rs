/*!
 * Integration test driving repoxml through its public API only
 */

use std::fs::{self, File};
use std::io::Write;

use quick_xml::events::Event;
use quick_xml::Reader;
use tempfile::tempdir;

use repoxml::compression::expand;
use repoxml::writer::unescape_text;
use repoxml::{Config, Processor, RepoXmlError, XmlWriter};

#[test]
fn test_json_config_end_to_end() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::create_dir_all(root.join("vendor/lib")).unwrap();

    let big = "fn main() { println!(\"hi\"); }\n".repeat(40);
    File::create(root.join("src/main.rs"))
        .unwrap()
        .write_all(big.as_bytes())
        .unwrap();
    File::create(root.join("src/a & b.rs"))
        .unwrap()
        .write_all(b"// small")
        .unwrap();
    File::create(root.join("vendor/lib/dep.rs"))
        .unwrap()
        .write_all(b"// vendored")
        .unwrap();
    File::create(root.join("notes.txt"))
        .unwrap()
        .write_all(b"not included")
        .unwrap();

    let config = Config::from_json_str(
        r#"{
            "excludeDirs": ["vendor"],
            "includeFiles": ["*.rs"],
            "compressContent": true,
            "compressionThreshold": 256
        }"#,
    )
    .unwrap();

    let result = Processor::new(config).unwrap().process(root).unwrap();
    assert_eq!(result.stats.total_files, 2);
    assert_eq!(result.stats.skipped_files, 1);

    let xml = XmlWriter::new(true).encode(&result).unwrap();

    let mut reader = Reader::from_str(&xml);
    let mut current = String::new();
    let mut paths = Vec::new();
    let mut compressed_contents = Vec::new();
    let mut content_compressed = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                current = String::from_utf8(e.name().as_ref().to_vec()).unwrap();
                if current == "content" {
                    content_compressed = e
                        .attributes()
                        .filter_map(Result::ok)
                        .any(|a| a.key.as_ref() == b"compressed" && a.value.as_ref() == b"true");
                }
            }
            Ok(Event::Text(t)) if current == "path" => {
                let raw = String::from_utf8(t.to_vec()).unwrap();
                paths.push(unescape_text(&raw).unwrap().into_owned());
            }
            Ok(Event::CData(data)) if current == "content" && content_compressed => {
                compressed_contents.push(String::from_utf8(data.to_vec()).unwrap());
            }
            Ok(Event::End(_)) => current.clear(),
            Ok(Event::Eof) => break,
            Err(e) => panic!("Error parsing XML: {}", e),
            _ => (),
        }
    }

    assert_eq!(paths, vec!["src/a & b.rs", "src/main.rs"]);
    assert_eq!(compressed_contents.len(), 1);
    assert_eq!(expand(&compressed_contents[0]).unwrap(), big);
}

#[test]
fn test_fatal_errors_before_traversal() {
    let err = Config::from_json_str(r#"{ "excludeDirs": "node_modules" }"#).unwrap_err();
    assert!(matches!(err, RepoXmlError::Json(_)));

    let temp_dir = tempdir().unwrap();
    let file = temp_dir.path().join("file.txt");
    File::create(&file).unwrap();

    let processor = Processor::new(Config::default()).unwrap();
    assert!(matches!(
        processor.process(&file).unwrap_err(),
        RepoXmlError::NotADirectory(_)
    ));
    assert!(matches!(
        processor.process(&temp_dir.path().join("missing")).unwrap_err(),
        RepoXmlError::PathNotFound(_)
    ));
}
