use localrag_core::traits::KeywordStore;
use localrag_core::types::{IndexedRecord, Meta};
use localrag_text::TantivyKeywordStore;

fn record(doc: &str, ordinal: usize, text: &str) -> IndexedRecord {
    let mut meta = Meta::new();
    meta.insert("file_name".into(), format!("{doc}.pdf"));
    IndexedRecord { id: format!("{doc}:{ordinal}"), doc_id: doc.into(), ordinal, text: text.into(), vector: None, meta }
}

fn profile() -> Vec<IndexedRecord> {
    vec![
        record("p", 0, "My name is Alex, and I am an AI Engineer looking for opportunities in Germany."),
        record("p", 1, "I specialize in Python, Haystack 2.x, and building RAG pipelines."),
        record("p", 2, "I have strong knowledge of GDPR data privacy and local model deployment."),
        record("p", 3, "I am currently based in Berlin and available to start immediately."),
        record("p", 4, "My GitHub handle is AlexCoder99 and my reference ID is REF-2024-DE."),
    ]
}

#[tokio::test]
async fn keyword_branch_finds_exact_reference_id() {
    let store = TantivyKeywordStore::in_memory().expect("store");
    store.write(&profile()).await.expect("write");

    let hits = store.query("What is the reference ID?", 3).await.expect("query");
    assert_eq!(hits[0].record.id, "p:4");
    assert_eq!(hits[0].record.meta.get("file_name").map(String::as_str), Some("p.pdf"));
    assert_eq!(hits[0].record.ordinal, 4);
    assert!(hits[0].score > 0.0);

    let hits = store.query("REF-2024-DE", 3).await.expect("query");
    assert_eq!(hits.len(), 1);
    assert!(hits[0].record.text.contains("REF-2024-DE"));
}

#[tokio::test]
async fn results_are_ranked_by_descending_bm25() {
    let store = TantivyKeywordStore::in_memory().expect("store");
    store.write(&profile()).await.expect("write");
    let hits = store.query("Alex Berlin Germany", 5).await.expect("query");
    assert!(hits.len() >= 2);
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn rewriting_an_id_does_not_duplicate() {
    let store = TantivyKeywordStore::in_memory().expect("store");
    store.write(&profile()).await.expect("write");
    store.write(&profile()).await.expect("rewrite");
    assert_eq!(store.count().await.expect("count"), 5);
}

#[tokio::test]
async fn stop_word_only_query_returns_nothing() {
    let store = TantivyKeywordStore::in_memory().expect("store");
    store.write(&profile()).await.expect("write");
    assert!(store.query("what is the", 5).await.expect("query").is_empty());
    assert!(store.query("Alex", 0).await.expect("query").is_empty());
}

#[tokio::test]
async fn delete_document_and_reset_remove_records() {
    let store = TantivyKeywordStore::in_memory().expect("store");
    store.write(&profile()).await.expect("write");
    store.write(&[record("q", 0, "Berlin weather report")]).await.expect("write");
    store.delete_document("p").await.expect("delete");
    assert_eq!(store.count().await.expect("count"), 1);
    store.reset().await.expect("reset");
    assert_eq!(store.count().await.expect("count"), 0);
}

#[tokio::test]
async fn on_disk_index_survives_reopen() {
    let tmp = tempfile::TempDir::new().expect("tmp");
    {
        let store = TantivyKeywordStore::open(tmp.path(), 50_000_000).expect("open");
        store.write(&profile()).await.expect("write");
    }
    let store = TantivyKeywordStore::open(tmp.path(), 50_000_000).expect("reopen");
    assert_eq!(store.count().await.expect("count"), 5);
    let hits = store.query("GDPR privacy", 1).await.expect("query");
    assert_eq!(hits[0].record.id, "p:2");
}

#[tokio::test]
async fn replace_document_drops_chunks_the_new_split_lacks() {
    let store = TantivyKeywordStore::in_memory().expect("store");
    store.write(&profile()).await.expect("write");
    store.write(&[record("q", 0, "Berlin weather report")]).await.expect("write");
    store.replace_document("p", &[record("p", 0, "Alex now lives in Munich.")]).await.expect("replace");
    assert_eq!(store.count().await.expect("count"), 2);
    assert!(store.query("REF-2024-DE", 3).await.expect("query").is_empty());
    assert_eq!(store.query("Munich", 3).await.expect("query")[0].record.id, "p:0");

    assert!(store.replace_document("p", &[record("q", 1, "foreign chunk")]).await.is_err());
    assert_eq!(store.count().await.expect("count"), 2);
}
