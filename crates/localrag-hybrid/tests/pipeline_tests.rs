use localrag_core::config::{Config, KeywordBackend, Settings, VectorBackend};
use localrag_core::error::Error;
use localrag_hybrid::Services;

fn memory_settings() -> Settings {
    let mut settings = Settings::default();
    settings.embedding.fake = true;
    settings.embedding.dimension = 32;
    settings.vector_store.backend = VectorBackend::Memory;
    settings.keyword_store.backend = KeywordBackend::Memory;
    settings
}

#[tokio::test]
async fn services_wire_a_working_ingest_and_retrieve_path() {
    let services = Services::from_settings(memory_settings()).await.expect("services");
    let tmp = tempfile::TempDir::new().expect("tmp");
    let path = tmp.path().join("paper.txt");
    std::fs::write(&path, "Sparse retrieval with BM25 complements dense embeddings.\n\nHybrid search joins both.").expect("write");
    let report = services.ingest_pipeline().expect("ingest").ingest_file(&path).await.expect("ingest file");
    assert_eq!(report.chunks, 1);
    let ctx = services.query_pipeline().expect("query").retrieve("BM25 retrieval").await.expect("retrieve");
    assert_eq!(ctx.len(), 1);
    assert!(ctx.records[0].in_both());
    services.reset().await.expect("reset");
    assert_eq!(services.vector.count().await.expect("count"), 0);
    assert_eq!(services.keyword.count().await.expect("count"), 0);
}

#[tokio::test]
async fn on_disk_stores_from_config_file() {
    let tmp = tempfile::TempDir::new().expect("tmp");
    std::fs::write(
        tmp.path().join("config.toml"),
        "[embedding]\nfake = true\ndimension = 16\n\n[vector_store]\nuri = \"data/lancedb\"\ntable = \"papers\"\n\n[keyword_store]\nindex_dir = \"data/tantivy\"\n",
    )
    .expect("config");
    let settings = Config::load_from(tmp.path()).expect("config").settings().expect("settings");
    assert_eq!(settings.vector_store.uri, tmp.path().join("data/lancedb"));
    let services = Services::from_settings(settings).await.expect("services");
    let ingest = services.ingest_pipeline().expect("ingest");
    let path = tmp.path().join("note.txt");
    std::fs::write(&path, "Reference code QX-12 marks the final draft.").expect("write");
    ingest.ingest_file(&path).await.expect("ingest");
    assert_eq!(services.vector.count().await.expect("count"), 1);
    assert!(tmp.path().join("data/tantivy").is_dir());
}

#[tokio::test]
async fn invalid_split_settings_fail_fast() {
    let mut settings = memory_settings();
    settings.splitter.split_overlap = settings.splitter.split_length;
    let err = Services::from_settings(settings).await.err().expect("invalid settings");
    assert!(matches!(err, Error::NonTerminatingSplit { .. }));
}

#[tokio::test]
async fn recreate_only_wipes_when_opened_for_ingest() {
    let tmp = tempfile::TempDir::new().expect("tmp");
    let mut settings = memory_settings();
    settings.vector_store.backend = VectorBackend::Lance;
    settings.vector_store.uri = tmp.path().join("lancedb");
    settings.keyword_store.backend = KeywordBackend::Tantivy;
    settings.keyword_store.index_dir = tmp.path().join("tantivy");
    let path = tmp.path().join("note.txt");
    std::fs::write(&path, "Reference code QX-12 marks the final draft.").expect("write");
    {
        let services = Services::for_ingest(settings.clone()).await.expect("services");
        services.ingest_pipeline().expect("ingest").ingest_file(&path).await.expect("ingest");
    }

    settings.vector_store.recreate = true;
    {
        let reader = Services::from_settings(settings.clone()).await.expect("reader");
        assert_eq!(reader.vector.count().await.expect("count"), 1);
        assert_eq!(reader.keyword.count().await.expect("count"), 1);
    }

    let writer = Services::for_ingest(settings).await.expect("writer");
    assert_eq!(writer.vector.count().await.expect("count"), 0);
    assert_eq!(writer.keyword.count().await.expect("count"), 0);
}
