use std::fs;
use std::io::Write;
use tempfile::TempDir;

use localrag_core::chunker::DocumentSplitter;
use localrag_core::cleaner::DocumentCleaner;
use localrag_core::convert::ConverterSet;
use localrag_core::sources::collect_sources;
use localrag_core::traits::Converter;
use localrag_core::Error;

#[test]
fn directory_sources_are_sorted_and_filtered() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("nested")).unwrap();
    fs::write(dir.join("b.txt"), "bravo").unwrap();
    fs::write(dir.join("nested/a.txt"), "alpha").unwrap();
    fs::write(dir.join("skip.png"), [0u8, 1, 2]).unwrap();

    let sources = collect_sources(&[dir.to_path_buf()], &ConverterSet::default()).expect("collect");
    let names: Vec<_> = sources.iter().map(|p| p.file_name().unwrap().to_string_lossy().to_string()).collect();
    assert_eq!(names, vec!["b.txt", "a.txt"], "sorted by full path, png skipped");
}

#[test]
fn missing_input_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let err = collect_sources(&[tmp.path().join("nope.pdf")], &ConverterSet::default()).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn convert_clean_split_single_small_file() {
    let tmp = TempDir::new().unwrap();
    let file_path = tmp.path().join("a.txt");
    let mut f = fs::File::create(&file_path).unwrap();
    writeln!(f, "Short   text.\n\n\nSecond line.").unwrap();

    let raw = ConverterSet::default().convert(&file_path).expect("convert");
    let doc = DocumentCleaner::default().clean(&raw);
    let chunks = DocumentSplitter::new(250, 50, true).unwrap().split(&doc);

    assert_eq!(chunks.len(), 1, "one small document becomes one chunk");
    assert_eq!(chunks[0].text, "Short text.\nSecond line.");
    assert_eq!(chunks[0].doc_id, doc.id);
    assert_eq!(chunks[0].meta.get("file_name").map(String::as_str), Some("a.txt"));
}
