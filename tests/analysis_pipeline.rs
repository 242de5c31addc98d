// Analysis pipeline integration tests
//
// Drives WalletAnalyzer end to end against an in-memory ledger: endpoint
// rotation, retry exhaustion, mock fallback and cancellation.
//
// Run with:
//   cargo test --test analysis_pipeline

mod helpers;

use helpers::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use wallet_pnl::analysis::AnalyzerConfig;
use wallet_pnl::chain::FetchConfig;
use wallet_pnl::utils::CancelSignal;
use wallet_pnl::{AnalysisError, DataSource, LedgerError};

fn rate_limited() -> LedgerError {
    LedgerError::RateLimited("HTTP status client error (429 Too Many Requests)".to_string())
}

fn refused() -> LedgerError {
    LedgerError::Transport("connection refused".to_string())
}

#[tokio::test(start_paused = true)]
async fn test_real_analysis_from_healthy_ledger() {
    let ledger = Arc::new(FakeLedger::new(three_trade_history()));
    let analyzer = analyzer(Arc::clone(&ledger));

    let analysis = analyzer
        .analyze(WALLET, None, &CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(analysis.data_source, DataSource::Real);
    assert_eq!(analysis.wallet, WALLET);
    assert_eq!(analysis.transaction_count, Some(3));
    assert_eq!(analysis.current_balance, Some(2.5));
    assert_eq!(analysis.stats.total_trades, 3);
    assert_eq!(analysis.stats.wins, 1);
    assert_eq!(analysis.stats.losses, 2);
    assert!((analysis.stats.total_volume - 0.9).abs() < 1e-9);
    assert!((analysis.stats.total_pnl + 0.100015).abs() < 1e-9);

    // Everything served by the primary
    assert_eq!(ledger.calls_to(BACKUP), 0);
    assert_eq!(ledger.calls_of("get_balance"), 1);
    assert_eq!(ledger.calls_of("get_signatures"), 1);
    assert_eq!(ledger.calls_of("get_transactions"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_primary_rotates_to_backup() {
    let ledger = Arc::new(FakeLedger::new(three_trade_history()).fail_always(PRIMARY, rate_limited()));
    let analyzer = analyzer(Arc::clone(&ledger));

    let started = Instant::now();
    let analysis = analyzer
        .analyze(WALLET, None, &CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(analysis.data_source, DataSource::Real);
    assert_eq!(analysis.stats.total_trades, 3);

    // One failed call on the primary, everything after on the backup
    assert_eq!(ledger.calls_to(PRIMARY), 1);
    assert_eq!(ledger.calls_to(BACKUP), 3);
    assert_eq!(analyzer.fetcher().pool().current(), BACKUP);

    // One linear backoff step of 1000ms before the retry
    assert!(started.elapsed() >= Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_transport_errors_do_not_rotate() {
    let ledger = Arc::new(
        FakeLedger::new(three_trade_history()).fail_times(PRIMARY, refused(), 2),
    );
    let analyzer = analyzer(Arc::clone(&ledger));

    let started = Instant::now();
    let analysis = analyzer
        .analyze(WALLET, None, &CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(analysis.data_source, DataSource::Real);
    assert_eq!(ledger.calls_to(BACKUP), 0);
    assert_eq!(ledger.calls_of("get_balance"), 3);
    // 1000ms after the first failure, 2000ms after the second
    assert!(started.elapsed() >= Duration::from_millis(3000));
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_ledger_falls_back_to_mock() {
    let ledger = Arc::new(
        FakeLedger::new(three_trade_history())
            .fail_always(PRIMARY, refused())
            .fail_always(BACKUP, refused()),
    );
    let analyzer = analyzer(Arc::clone(&ledger));

    let analysis = analyzer
        .analyze(WALLET, None, &CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(analysis.data_source, DataSource::Mock);
    assert!(analysis.note.is_some());
    assert_eq!(analysis.transaction_count, None);
    assert_eq!(ledger.calls_of("get_balance"), 3);
    assert_eq!(ledger.calls_of("get_signatures"), 0);

    let response = analyzer.respond(WALLET, None, &CancelSignal::new()).await;
    assert!(response.success);
    let meta = response.meta.unwrap();
    assert_eq!(meta.status, "demo_mode");
    assert_eq!(meta.data_source, DataSource::Mock);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_everywhere_cycles_endpoints_then_falls_back() {
    let ledger = Arc::new(
        FakeLedger::new(three_trade_history())
            .fail_always(PRIMARY, rate_limited())
            .fail_always(BACKUP, rate_limited()),
    );
    let analyzer = analyzer(Arc::clone(&ledger));

    let analysis = analyzer
        .analyze(WALLET, None, &CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(analysis.data_source, DataSource::Mock);
    let endpoints: Vec<String> = ledger.calls().into_iter().map(|(_, e)| e).collect();
    assert_eq!(endpoints, vec![PRIMARY, BACKUP, PRIMARY]);
}

#[tokio::test(start_paused = true)]
async fn test_fallback_disabled_surfaces_exhaustion() {
    let ledger = Arc::new(FakeLedger::new(Vec::new()).fail_always(PRIMARY, refused()));
    let analyzer = analyzer_with(
        Arc::clone(&ledger),
        &[PRIMARY],
        FetchConfig::default(),
        AnalyzerConfig {
            enable_fallback: false,
            ..Default::default()
        },
    );

    let err = analyzer
        .analyze(WALLET, None, &CancelSignal::new())
        .await
        .unwrap_err();

    match err {
        AnalysisError::FetchExhausted { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("expected FetchExhausted, got {other:?}"),
    }

    let response = analyzer.respond(WALLET, None, &CancelSignal::new()).await;
    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("Wallet analysis failed"));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_request_is_not_replaced_by_mock() {
    let ledger = Arc::new(FakeLedger::new(three_trade_history()));
    let analyzer = analyzer(Arc::clone(&ledger));

    let cancel = CancelSignal::new();
    cancel.cancel();

    let err = analyzer.analyze(WALLET, None, &cancel).await.unwrap_err();
    assert!(matches!(err, AnalysisError::Cancelled(_)));
    assert!(ledger.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_deadline_interrupts_backoff() {
    let ledger = Arc::new(
        FakeLedger::new(three_trade_history())
            .fail_always(PRIMARY, refused())
            .fail_always(BACKUP, refused()),
    );
    let analyzer = analyzer(Arc::clone(&ledger));

    // Attempt 1 at 0ms, attempt 2 at 1000ms, then a 2000ms backoff that
    // overruns the deadline
    let cancel = CancelSignal::new().with_timeout(Duration::from_millis(1500));
    let started = Instant::now();
    let err = analyzer.analyze(WALLET, None, &cancel).await.unwrap_err();

    assert!(matches!(err, AnalysisError::Cancelled(_)));
    assert_eq!(ledger.calls_of("get_balance"), 2);
    assert!(started.elapsed() < Duration::from_millis(3000));
}

#[tokio::test(start_paused = true)]
async fn test_deadline_during_final_attempt_is_not_replaced_by_mock() {
    let ledger = Arc::new(
        FakeLedger::new(three_trade_history())
            .fail_always(PRIMARY, refused())
            .fail_always(BACKUP, refused())
            .with_latency(Duration::from_millis(1500)),
    );
    let analyzer = analyzer(Arc::clone(&ledger));

    // Attempts run 0-1.5s, 2.5-4s and 6-7.5s; the deadline lands inside the last
    let cancel = CancelSignal::new().with_timeout(Duration::from_millis(7000));
    let started = Instant::now();
    let err = analyzer.analyze(WALLET, None, &cancel).await.unwrap_err();

    assert!(matches!(err, AnalysisError::Cancelled(_)));
    assert_eq!(started.elapsed(), Duration::from_millis(7000));
    assert_eq!(ledger.calls_of("get_balance"), 2);

    let response = analyzer
        .respond(WALLET, None, &CancelSignal::new().with_timeout(Duration::from_millis(7000)))
        .await;
    assert!(!response.success);
    assert!(response.data.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_invalid_address_makes_no_calls() {
    let ledger = Arc::new(FakeLedger::new(three_trade_history()));
    let analyzer = analyzer(Arc::clone(&ledger));

    let err = analyzer
        .analyze("not-a-wallet", None, &CancelSignal::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::InvalidAddress(_)));
    assert!(ledger.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_pagination_and_batching() {
    let history: Vec<_> = (0..7u64)
        .rev()
        .map(|i| record(&format!("sig{i}"), 1_000_000_000, 1_000_000_000 + i * 10_000_000, 5000))
        .collect();
    let ledger = Arc::new(FakeLedger::new(history));
    let fetch = FetchConfig {
        page_size: 2,
        batch_size: 2,
        ..Default::default()
    };
    let analyzer = analyzer_with(Arc::clone(&ledger), &[PRIMARY], fetch, AnalyzerConfig::default());

    let started = Instant::now();
    let analysis = analyzer
        .analyze(WALLET, Some(5), &CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(analysis.transaction_count, Some(5));
    // Pages of 2, 2, 1
    assert_eq!(ledger.calls_of("get_signatures"), 3);
    // Batches of 2, 2, 1 with two 100ms pauses between them
    assert_eq!(ledger.calls_of("get_transactions"), 3);
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn test_empty_history_yields_zero_stats() {
    let ledger = Arc::new(FakeLedger::new(Vec::new()));
    let analyzer = analyzer(Arc::clone(&ledger));

    let analysis = analyzer
        .analyze(WALLET, None, &CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(analysis.data_source, DataSource::Real);
    assert_eq!(analysis.transaction_count, Some(0));
    assert_eq!(analysis.stats.total_trades, 0);
    assert_eq!(analysis.stats.win_rate, 0.0);
    assert_eq!(ledger.calls_of("get_transactions"), 0);
}
