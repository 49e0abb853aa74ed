use docrag_core::splitter::RecursiveSplitter;
use docrag_core::traits::{Embedder, VectorIndex};
use docrag_core::types::{Chunk, Document};
use docrag_core::Error;
use docrag_embed::FakeEmbedder;
use docrag_vector::VectorStore;
use tempfile::TempDir;

fn chunks_for(docs: &[(&str, &str)]) -> Vec<Chunk> {
    let docs: Vec<Document> = docs.iter().map(|(source, text)| Document::new(*text, *source)).collect();
    RecursiveSplitter::new(300, 100).unwrap().split_documents(&docs)
}

fn embed(embedder: &FakeEmbedder, chunks: &[Chunk]) -> Vec<Vec<f32>> {
    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    embedder.embed_batch(&texts).expect("embed")
}

#[test]
fn build_then_search_ranks_matching_chunk_first() {
    let embedder = FakeEmbedder::new(384);
    let chunks = chunks_for(&[
        ("books/geography.md", "The capital of France is Paris."),
        ("books/fruit.md", "Bananas ripen quickly in warm kitchens."),
        ("books/animals.md", "Zebras migrate across the Serengeti every year."),
    ]);
    let tmp = TempDir::new().expect("tmp");
    let dir = tmp.path().join("index");

    let store = VectorStore::build(&dir, &chunks, &embed(&embedder, &chunks), embedder.embedder_id()).expect("build");
    assert_eq!(store.count().unwrap(), 3);
    assert_eq!(store.meta().embedder_id.as_deref(), Some(embedder.embedder_id()));
    assert_eq!(store.meta().dim, Some(384));
    assert_eq!(store.meta().chunk_count, Some(3));

    let q = embedder.embed_query("What is the capital of France?").unwrap();
    let hits = store.search(&q, 3).expect("search");
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].chunk.source(), "books/geography.md");
    assert_eq!(hits[0].chunk.content, "The capital of France is Paris.");
    assert!(hits[0].score > 0.5);
    for pair in hits.windows(2) { assert!(pair[0].score >= pair[1].score); }
    for h in &hits { assert!((0.0..=1.0).contains(&h.score)); }
}

#[test]
fn reopened_index_keeps_chunk_metadata() {
    let embedder = FakeEmbedder::new(64);
    let text = "Lighthouses guide ships along rocky coasts. ".repeat(20);
    let chunks = chunks_for(&[("books/coast.md", text.as_str())]);
    let tmp = TempDir::new().expect("tmp");
    let dir = tmp.path().join("index");
    VectorStore::build(&dir, &chunks, &embed(&embedder, &chunks), embedder.embedder_id()).expect("build");

    let store = VectorStore::open(&dir).expect("open");
    assert_eq!(store.count().unwrap(), chunks.len());
    assert_eq!(VectorIndex::embedder_id(&store), Some(embedder.embedder_id()));

    let q = embedder.embed_query("lighthouses ships").unwrap();
    let hits = store.search_vec(&q, chunks.len()).expect("search");
    assert_eq!(hits.len(), chunks.len());
    for hit in &hits {
        let original = chunks.iter().find(|c| c.id == hit.chunk.id).expect("known id");
        assert_eq!(&hit.chunk, original);
    }
}

#[test]
fn rebuild_replaces_previous_index() {
    let embedder = FakeEmbedder::new(384);
    let tmp = TempDir::new().expect("tmp");
    let dir = tmp.path().join("index");

    let old = chunks_for(&[("books/zebra.md", "Zebra herds migrate north when the rains end.")]);
    VectorStore::build(&dir, &old, &embed(&embedder, &old), embedder.embedder_id()).expect("first build");

    let new = chunks_for(&[("books/geography.md", "The capital of France is Paris.")]);
    drop(VectorStore::build(&dir, &new, &embed(&embedder, &new), embedder.embedder_id()).expect("rebuild"));

    let store = VectorStore::open(&dir).expect("open");
    assert_eq!(store.count().unwrap(), 1);
    let q = embedder.embed_query("zebra herds migrate").unwrap();
    let hits = store.search(&q, 5).expect("search");
    assert!(hits.iter().all(|h| h.chunk.source() != "books/zebra.md"));
    assert!(hits.iter().all(|h| !h.chunk.content.contains("Zebra")));
}

#[test]
fn open_without_index_reports_index_missing() {
    let tmp = TempDir::new().expect("tmp");

    let err = VectorStore::open(&tmp.path().join("absent")).err().expect("missing dir");
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::IndexMissing(_))));

    let err = VectorStore::open(tmp.path()).err().expect("empty dir");
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::IndexMissing(_))));
}

#[test]
fn build_rejects_mismatched_embeddings() {
    let embedder = FakeEmbedder::new(16);
    let chunks = chunks_for(&[("a.md", "one"), ("b.md", "two")]);
    let tmp = TempDir::new().expect("tmp");
    let mut vectors = embed(&embedder, &chunks);
    vectors.pop();

    let err = VectorStore::build(&tmp.path().join("index"), &chunks, &vectors, embedder.embedder_id())
        .err()
        .expect("mismatch");
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Operation(_))));
}

#[test]
fn rejected_rebuild_keeps_previous_index() {
    let embedder = FakeEmbedder::new(16);
    let chunks = chunks_for(&[("a.md", "alpha text"), ("b.md", "beta text")]);
    let tmp = TempDir::new().expect("tmp");
    let dir = tmp.path().join("index");
    drop(VectorStore::build(&dir, &chunks, &embed(&embedder, &chunks), embedder.embedder_id()).expect("build"));

    let mut short = embed(&embedder, &chunks);
    short.pop();
    let err = VectorStore::build(&dir, &chunks, &short, embedder.embedder_id()).err().expect("mismatch");
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Operation(_))));

    let mut ragged = embed(&embedder, &chunks);
    ragged[1].push(0.5);
    assert!(VectorStore::build(&dir, &chunks, &ragged, embedder.embedder_id()).is_err());
    assert!(VectorStore::build(&dir, &[], &[], embedder.embedder_id()).is_err());

    let store = VectorStore::open(&dir).expect("previous index survives");
    assert_eq!(store.count().unwrap(), 2);
}
