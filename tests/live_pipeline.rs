//! End-to-end tests for the transcript → chunk → translation → ledger flow,
//! using a mock translation client in place of the remote model.

use parley::config::FlushConfig;
use parley::lang::{Language, SourceMode};
use parley::ledger::SessionLedger;
use parley::live::accumulator::TranscriptAccumulator;
use parley::live::event::LiveEvent;
use parley::translate::{MockTranslationClient, TranslationWorker, WorkerConfig};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, mpsc, watch};

fn fragment(text: &str) -> LiveEvent {
    LiveEvent::Fragment(text.to_string())
}

fn worker(mode: SourceMode, client: Arc<MockTranslationClient>) -> TranslationWorker {
    TranslationWorker::new(
        WorkerConfig {
            mode,
            min_chunk_chars: 5,
            context_pairs: 5,
        },
        client,
    )
}

#[tokio::test]
async fn accumulated_chunks_flow_through_to_the_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(Mutex::new(SessionLedger::create(dir.path()).unwrap()));
    let client = Arc::new(MockTranslationClient::new("번역 결과"));

    let mode = SourceMode::Bilingual(Language::English);
    let start = Instant::now();
    let mut accumulator = TranscriptAccumulator::new_at(mode, &FlushConfig::default(), start);

    let (chunk_tx, chunk_rx) = mpsc::channel(8);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    // Two sentences, each past the bilingual 3s minimum
    for (text, at) in [
        ("The first sentence ", 2),
        ("ends here.", 4),
        ("And the second ", 6),
        ("one follows.", 8),
    ] {
        if let Some(chunk) = accumulator.absorb_at(&fragment(text), start + Duration::from_secs(at))
        {
            chunk_tx.send(chunk).await.unwrap();
        }
    }
    drop(chunk_tx);

    worker(mode, client.clone())
        .run(chunk_rx, shutdown_rx, ledger.clone())
        .await;

    let ledger = ledger.lock().await;
    assert_eq!(ledger.len(), 2);
    let pairs = ledger.context(10);
    assert_eq!(pairs[0].chunk, 1);
    assert_eq!(pairs[0].input, "The first sentence ends here.");
    assert_eq!(pairs[1].chunk, 2);
    assert_eq!(pairs[1].input, "And the second one follows.");
    assert!(pairs.iter().all(|p| p.output == "번역 결과"));
}

#[tokio::test]
async fn sequence_numbers_continue_across_reconnects() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(Mutex::new(SessionLedger::create(dir.path()).unwrap()));
    let client = Arc::new(MockTranslationClient::new("이어짐"));
    let mode = SourceMode::Bilingual(Language::English);

    // Two consecutive connections share one ledger, the way the supervisor
    // carries it across a session-timeout boundary
    for connection in 0..2 {
        let start = Instant::now();
        let mut accumulator = TranscriptAccumulator::new_at(mode, &FlushConfig::default(), start);
        let (chunk_tx, chunk_rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let text = format!("Connection number {} says hello.", connection);
        if let Some(chunk) =
            accumulator.absorb_at(&fragment(&text), start + Duration::from_secs(4))
        {
            chunk_tx.send(chunk).await.unwrap();
        }
        drop(chunk_tx);

        worker(mode, client.clone())
            .run(chunk_rx, shutdown_rx, ledger.clone())
            .await;
    }

    let ledger = ledger.lock().await;
    let chunks: Vec<u64> = ledger.context(10).iter().map(|p| p.chunk).collect();
    assert_eq!(chunks, vec![1, 2], "sequence must not reset on reconnect");
}

#[tokio::test]
async fn residual_flush_on_teardown_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(Mutex::new(SessionLedger::create(dir.path()).unwrap()));
    let client = Arc::new(MockTranslationClient::new("잔여분"));
    let mode = SourceMode::Bilingual(Language::English);

    let start = Instant::now();
    let mut accumulator = TranscriptAccumulator::new_at(mode, &FlushConfig::default(), start);
    let (chunk_tx, chunk_rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Mid-utterance text that never hit a flush condition
    accumulator.absorb_at(
        &fragment("interrupted mid stream"),
        start + Duration::from_secs(1),
    );

    // Teardown order: flush residue into the queue, close it, signal stop
    let residue = accumulator.flush_residual().expect("residue expected");
    chunk_tx.send(residue).await.unwrap();
    drop(chunk_tx);
    shutdown_tx.send(true).unwrap();

    worker(mode, client)
        .run(chunk_rx, shutdown_rx, ledger.clone())
        .await;

    let ledger = ledger.lock().await;
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.context(1)[0].input, "interrupted mid stream");
}

#[tokio::test]
async fn short_and_whitespace_chunks_never_reach_the_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(Mutex::new(SessionLedger::create(dir.path()).unwrap()));
    let client = Arc::new(MockTranslationClient::new("무시됨"));
    let mode = SourceMode::Mixed;

    let (chunk_tx, chunk_rx) = mpsc::channel(8);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    chunk_tx
        .send(parley::live::Chunk {
            text: "ok".to_string(),
        })
        .await
        .unwrap();
    chunk_tx
        .send(parley::live::Chunk {
            text: "      ".to_string(),
        })
        .await
        .unwrap();
    drop(chunk_tx);

    worker(mode, client.clone())
        .run(chunk_rx, shutdown_rx, ledger.clone())
        .await;

    assert!(ledger.lock().await.is_empty());
    assert!(client.prompts().is_empty());
}

#[tokio::test]
async fn translation_context_accumulates_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(Mutex::new(SessionLedger::create(dir.path()).unwrap()));
    let client = Arc::new(MockTranslationClient::new("순서대로"));
    let mode = SourceMode::Bilingual(Language::English);

    let (chunk_tx, chunk_rx) = mpsc::channel(8);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    for text in ["First utterance.", "Second utterance.", "Third utterance."] {
        chunk_tx
            .send(parley::live::Chunk {
                text: text.to_string(),
            })
            .await
            .unwrap();
    }
    drop(chunk_tx);

    worker(mode, client.clone())
        .run(chunk_rx, shutdown_rx, ledger.clone())
        .await;

    let prompts = client.prompts();
    assert_eq!(prompts.len(), 3);
    // First call has no context; the third sees both prior pairs in order
    assert!(!prompts[0].contains("Previous translations"));
    assert!(prompts[2].contains("- First utterance. -> 순서대로"));
    assert!(prompts[2].contains("- Second utterance. -> 순서대로"));
    let first_pos = prompts[2].find("First utterance").unwrap();
    let second_pos = prompts[2].find("Second utterance").unwrap();
    assert!(first_pos < second_pos);
}
