//! Tests for `ChunkRetriever`: ordering, payload defaults, and fail-open
//! behavior when the embedder or index misbehaves.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use labor_rag::{
    ChunkRetriever, Embedder, HitPayload, IndexHit, InMemoryVectorIndex, RagError,
    RetrievalOutcome, RetrievalStatus, UnavailableReason, VectorIndex,
};
use proptest::prelude::*;

use common::{
    FailingEmbedder, FixedEmbedder, HashEmbedder, StalledIndex, StaticIndex, UnreachableIndex, hit,
    point,
};

const TIMEOUT: Duration = Duration::from_secs(10);

fn retriever(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> ChunkRetriever {
    ChunkRetriever::new(embedder, index, "laws", TIMEOUT)
}

/// *For any* populated collection and `top_k >= 1`, the result holds at most
/// `top_k` chunks with non-increasing scores.
mod prop_retrieval_bounded_and_ordered {
    use super::*;

    const DIM: usize = 8;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn bounded_by_top_k_and_sorted(
            vectors in proptest::collection::vec(
                proptest::collection::vec(0.01f32..1.0f32, DIM),
                0..15,
            ),
            query in proptest::collection::vec(0.01f32..1.0f32, DIM),
            top_k in 1usize..20,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let chunks = rt.block_on(async {
                let index = Arc::new(InMemoryVectorIndex::new());
                index.create_collection("laws", DIM).await.unwrap();
                let points: Vec<_> = vectors
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| point(i as u64, v, &format!("Article {i}")))
                    .collect();
                index.upsert("laws", &points).await.unwrap();

                retriever(Arc::new(FixedEmbedder::new(query)), index)
                    .retrieve("overtime pay", top_k)
                    .await
                    .unwrap()
            });

            prop_assert!(chunks.len() <= top_k);
            for pair in chunks.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
        }
    }
}

#[tokio::test]
async fn stored_chunk_round_trips_through_search() {
    let index = Arc::new(InMemoryVectorIndex::new());
    index.create_collection("laws", 4).await.unwrap();
    index
        .upsert(
            "laws",
            &[
                point(42, vec![1.0, 0.0, 0.0, 0.0], "Article 109: annual leave of 21 days"),
                point(7, vec![0.0, 1.0, 0.0, 0.0], "Article 84: end of service award"),
            ],
        )
        .await
        .unwrap();

    let chunks = retriever(Arc::new(FixedEmbedder::new(vec![1.0, 0.0, 0.0, 0.0])), index)
        .retrieve("annual leave", 1)
        .await
        .unwrap();

    assert_eq!(chunks.len(), 1);
    let top = &chunks[0];
    assert_eq!(top.chunk_id, 42);
    assert_eq!(top.text, "Article 109: annual leave of 21 days");
    assert_eq!(top.source_file, "labor_law.txt");
    assert_eq!(top.page, 4);
    assert!((top.score - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn empty_collection_is_a_miss_not_an_error() {
    let index = Arc::new(InMemoryVectorIndex::new());
    index.create_collection("laws", 4).await.unwrap();
    let retriever = retriever(Arc::new(HashEmbedder::new(4)), index);

    assert!(retriever.retrieve("probation period", 5).await.unwrap().is_empty());
    let outcome = retriever.retrieve_outcome("probation period", 5).await.unwrap();
    assert_eq!(outcome, RetrievalOutcome::NoMatch);
    assert_eq!(outcome.status(), RetrievalStatus::NoMatch);
}

#[tokio::test]
async fn unreachable_index_fails_open() {
    let retriever = retriever(Arc::new(HashEmbedder::new(4)), Arc::new(UnreachableIndex));

    assert!(retriever.retrieve("termination notice", 5).await.unwrap().is_empty());
    let outcome = retriever.retrieve_outcome("termination notice", 5).await.unwrap();
    assert_eq!(outcome, RetrievalOutcome::Unavailable(UnavailableReason::Search));
}

#[tokio::test]
async fn embedder_failure_fails_open() {
    let index = Arc::new(StaticIndex::new(vec![hit(1, 0.9, "text", "a.txt", 1)]));
    let retriever = retriever(Arc::new(FailingEmbedder), index);

    let outcome = retriever.retrieve_outcome("sick leave", 5).await.unwrap();
    assert_eq!(outcome, RetrievalOutcome::Unavailable(UnavailableReason::Embedding));
    assert!(outcome.chunks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stalled_search_times_out() {
    let retriever = ChunkRetriever::new(
        Arc::new(HashEmbedder::new(4)),
        Arc::new(StalledIndex),
        "laws",
        Duration::from_millis(250),
    );

    let outcome = retriever.retrieve_outcome("maternity leave", 3).await.unwrap();
    assert_eq!(outcome, RetrievalOutcome::Unavailable(UnavailableReason::Timeout));
    assert_eq!(outcome.status(), RetrievalStatus::Unavailable);
}

#[tokio::test]
async fn missing_payload_fields_get_defaults() {
    let index = Arc::new(StaticIndex::new(vec![IndexHit {
        point_id: Some(17),
        score: 0.5,
        payload: HitPayload { text: Some("Article 75".into()), ..HitPayload::default() },
    }]));

    let chunks = retriever(Arc::new(HashEmbedder::new(4)), index)
        .retrieve("notice period", 5)
        .await
        .unwrap();

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].source_file, "unknown");
    assert_eq!(chunks[0].page, 0);
    assert_eq!(chunks[0].chunk_id, 17);
}

#[tokio::test]
async fn hits_without_text_are_dropped() {
    let index = Arc::new(StaticIndex::new(vec![
        IndexHit { point_id: Some(1), score: 0.9, payload: HitPayload::default() },
        hit(2, 0.8, "   ", "a.txt", 0),
        hit(3, 0.7, "Article 80: dismissal without notice", "a.txt", 12),
    ]));

    let outcome = retriever(Arc::new(HashEmbedder::new(4)), index)
        .retrieve_outcome("dismissal", 5)
        .await
        .unwrap();

    let chunks = outcome.chunks();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].chunk_id, 3);
}

#[tokio::test]
async fn result_never_exceeds_top_k_even_if_backend_over_returns() {
    struct GreedyIndex(StaticIndex);

    #[async_trait::async_trait]
    impl VectorIndex for GreedyIndex {
        async fn create_collection(&self, name: &str, dims: usize) -> labor_rag::Result<()> {
            self.0.create_collection(name, dims).await
        }
        async fn upsert(
            &self,
            collection: &str,
            points: &[labor_rag::IndexedPoint],
        ) -> labor_rag::Result<()> {
            self.0.upsert(collection, points).await
        }
        async fn search(
            &self,
            _collection: &str,
            _embedding: &[f32],
            _top_k: usize,
        ) -> labor_rag::Result<Vec<IndexHit>> {
            Ok(self.0.hits.clone())
        }
        async fn collection_stats(
            &self,
            collection: &str,
        ) -> labor_rag::Result<labor_rag::CollectionStats> {
            self.0.collection_stats(collection).await
        }
    }

    let hits = (0..10).map(|i| hit(i, 1.0 - i as f32 * 0.05, "text", "a.txt", 0)).collect();
    let index = Arc::new(GreedyIndex(StaticIndex::new(hits)));
    let chunks = retriever(Arc::new(HashEmbedder::new(4)), index)
        .retrieve("wages", 3)
        .await
        .unwrap();
    assert_eq!(chunks.iter().map(|c| c.chunk_id).collect::<Vec<_>>(), vec![0, 1, 2]);
}

#[tokio::test]
async fn invalid_requests_are_rejected_before_embedding() {
    let embedder = Arc::new(HashEmbedder::new(4));
    let retriever = retriever(embedder.clone(), Arc::new(StaticIndex::new(Vec::new())));

    let blank = retriever.retrieve("   ", 5).await;
    assert!(matches!(blank, Err(RagError::InvalidQuery(_))));

    let zero = retriever.retrieve("wages", 0).await;
    assert!(matches!(zero, Err(RagError::InvalidQuery(_))));

    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}
