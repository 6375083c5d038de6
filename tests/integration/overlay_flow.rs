//! End-to-end overlay flows against scripted pages.

use std::sync::Arc;
use tokio::sync::mpsc;

use callsight::engine::Engine;
use callsight::inject::{popup, Overlay, CELL_MARK, HEADER_MARK};
use callsight::page::html::parse_document;
use callsight::page::locator::find_calls_table;
use callsight::page::extract;
use callsight::roi;
use callsight::storage::delete_summary;
use callsight::types::{CallsightError, PayoutFrequency, Underlying};
use callsight::watch::{PageEvent, WatchSettings};

use crate::doubles::{options_page, snapshot, temp_store, ScriptedPage, StaticProvider};

const AAPL_PATH: &str = "/quote/AAPL/options";
const MSFT_PATH: &str = "/quote/MSFT/options";
const JAN: &str = "1705622400";
const FEB: &str = "1708300800";

/// One contract at the worked-example numbers: price 100, premium 2,
/// annualized dividend 4, strike 105.
fn aapl_rows() -> Vec<(&'static str, f64, f64, f64)> {
    vec![("AAPL240119C00105000", 105.0, 1.9, 2.1)]
}

fn fast_settings() -> WatchSettings {
    WatchSettings {
        table_poll_attempts: 3,
        table_poll_ms: 10,
        mutation_debounce_ms: 50,
        location_poll_ms: 100,
    }
}

fn engine_with(
    page: ScriptedPage,
    provider: StaticProvider,
) -> (Engine, String, Arc<std::sync::Mutex<Vec<String>>>) {
    let calls = provider.calls();
    let (store, path) = temp_store();
    let engine = Engine::new(
        Arc::new(page),
        Arc::new(provider),
        store,
        fast_settings(),
    );
    (engine, path, calls)
}

#[tokio::test(start_paused = true)]
async fn full_run_injects_overlay_and_persists_summary() {
    let html = options_page("Calls", JAN, &aapl_rows());
    let page = ScriptedPage::repeating(snapshot(AAPL_PATH, html.clone()));
    let provider = StaticProvider::new(&[("AAPL", 100.0)], 1.0);
    let (store, path) = temp_store();
    let mut updates = store.subscribe();
    let mut engine = Engine::new(
        Arc::new(page),
        Arc::new(provider),
        store,
        fast_settings(),
    );

    engine
        .refresh(snapshot(AAPL_PATH, html), true)
        .await
        .unwrap();

    // Worked example: 0% scenario 6.00, +10% capped at the strike 11.00.
    let results = engine.results_handle();
    let results = results.read().unwrap().clone().unwrap();
    assert_eq!(results.ticker, "AAPL");
    assert!((results.rows[0].scenarios[1].roi_percent - 6.00).abs() < 1e-10);
    assert!((results.rows[0].scenarios[2].roi_percent - 11.00).abs() < 1e-10);

    // Overlay present in the owned document.
    let dom = engine.current_dom().unwrap();
    assert_eq!(dom.nodes_with_class(HEADER_MARK).len(), 3);
    assert_eq!(dom.nodes_with_class(CELL_MARK).len(), 3);

    // Summary persisted with inferred quarterly cadence, and broadcast.
    let saved = callsight::storage::load_summary(Some(&path)).unwrap().unwrap();
    assert_eq!(saved.ticker, "AAPL");
    assert_eq!(saved.frequency, PayoutFrequency::Quarterly);
    assert!((saved.dividend - 4.0).abs() < 1e-10);
    assert_eq!(saved.last_dividend, Some(1.0));
    assert_eq!(updates.recv().await.unwrap().ticker, "AAPL");

    delete_summary(Some(&path)).unwrap();
}

#[tokio::test(start_paused = true)]
async fn rerender_reinjects_cached_results_without_refetch() {
    let html = options_page("Calls", JAN, &aapl_rows());
    let page = ScriptedPage::repeating(snapshot(AAPL_PATH, html.clone()));
    let provider = StaticProvider::new(&[("AAPL", 100.0)], 1.0);
    let (mut engine, path, calls) = engine_with(page, provider);

    engine
        .refresh(snapshot(AAPL_PATH, html.clone()), true)
        .await
        .unwrap();
    let first_table = engine.overlay().injected_table().unwrap();

    // The host replaces the table with an equivalent render.
    engine
        .handle_mutation(snapshot(AAPL_PATH, html))
        .await
        .unwrap();

    let second_table = engine.overlay().injected_table().unwrap();
    assert_ne!(first_table, second_table);
    let dom = engine.current_dom().unwrap();
    assert_eq!(dom.nodes_with_class(HEADER_MARK).len(), 3);
    assert_eq!(dom.nodes_with_class(CELL_MARK).len(), 3);

    // Cached results were reused — exactly one provider round trip.
    assert_eq!(calls.lock().unwrap().as_slice(), ["AAPL"]);

    delete_summary(Some(&path)).unwrap();
}

#[tokio::test(start_paused = true)]
async fn ticker_navigation_recomputes_through_event_stream() {
    let aapl = options_page("Calls", JAN, &aapl_rows());
    let msft = options_page("Calls", JAN, &[("MSFT240119C00420000", 420.0, 3.0, 5.0)]);
    // The engine re-fetches while waiting for each ticker's table.
    let page = ScriptedPage::new(vec![
        snapshot(AAPL_PATH, aapl.clone()),
        snapshot(MSFT_PATH, msft.clone()),
    ]);
    let provider = StaticProvider::new(&[("AAPL", 100.0), ("MSFT", 400.0)], 1.0);
    let (mut engine, path, calls) = engine_with(page, provider);

    let (tx, mut rx) = mpsc::channel(8);
    tx.send(PageEvent::Navigated(snapshot(AAPL_PATH, aapl)))
        .await
        .unwrap();
    tx.send(PageEvent::Navigated(snapshot(MSFT_PATH, msft)))
        .await
        .unwrap();
    drop(tx);

    engine.run_events(&mut rx).await;

    // Each navigation triggered a full recomputation.
    assert_eq!(calls.lock().unwrap().as_slice(), ["AAPL", "MSFT"]);
    let results = engine.results_handle();
    let results = results.read().unwrap().clone().unwrap();
    assert_eq!(results.ticker, "MSFT");
    assert_eq!(engine.context().unwrap().ticker, "MSFT");

    delete_summary(Some(&path)).unwrap();
}

#[tokio::test(start_paused = true)]
async fn mutation_through_event_stream_reuses_cache() {
    let html = options_page("Calls", JAN, &aapl_rows());
    let page = ScriptedPage::repeating(snapshot(AAPL_PATH, html.clone()));
    let provider = StaticProvider::new(&[("AAPL", 100.0)], 1.0);
    let (mut engine, path, calls) = engine_with(page, provider);

    let (tx, mut rx) = mpsc::channel(8);
    tx.send(PageEvent::Navigated(snapshot(AAPL_PATH, html.clone())))
        .await
        .unwrap();
    tx.send(PageEvent::Mutated(snapshot(AAPL_PATH, html)))
        .await
        .unwrap();
    drop(tx);

    engine.run_events(&mut rx).await;

    // The mutation settled against the cache; one provider round trip.
    assert_eq!(calls.lock().unwrap().as_slice(), ["AAPL"]);
    let dom = engine.current_dom().unwrap();
    assert_eq!(dom.nodes_with_class(HEADER_MARK).len(), 3);

    delete_summary(Some(&path)).unwrap();
}

#[tokio::test(start_paused = true)]
async fn expiration_change_recomputes() {
    let january = options_page("Calls", JAN, &aapl_rows());
    let february = options_page("Calls", FEB, &aapl_rows());
    // January is live for the first run; February after the selection.
    let page = ScriptedPage::new(vec![
        snapshot(AAPL_PATH, january.clone()),
        snapshot(AAPL_PATH, february.clone()),
    ]);
    let provider = StaticProvider::new(&[("AAPL", 100.0)], 1.0);
    let (mut engine, path, calls) = engine_with(page, provider);

    engine
        .refresh(snapshot(AAPL_PATH, january), true)
        .await
        .unwrap();
    engine
        .handle_mutation(snapshot(AAPL_PATH, february))
        .await
        .unwrap();

    assert_eq!(calls.lock().unwrap().as_slice(), ["AAPL", "AAPL"]);
    assert_eq!(engine.context().unwrap().expiration.as_deref(), Some(FEB));

    delete_summary(Some(&path)).unwrap();
}

#[tokio::test(start_paused = true)]
async fn puts_only_page_aborts_without_injection() {
    let puts = options_page("Puts", JAN, &[("AAPL240119P00105000", 105.0, 1.0, 1.4)]);
    let page = ScriptedPage::repeating(snapshot(AAPL_PATH, puts.clone()));
    let provider = StaticProvider::new(&[("AAPL", 100.0)], 1.0);
    let (mut engine, path, _calls) = engine_with(page, provider);

    let err = engine
        .refresh(snapshot(AAPL_PATH, puts), true)
        .await
        .expect_err("a puts-only page must never be injected");
    assert!(matches!(
        err.downcast_ref::<CallsightError>(),
        Some(CallsightError::TableNotFound { .. })
    ));
    assert!(engine.results_handle().read().unwrap().is_none());

    // The summary still reflects the fetch that did succeed.
    let saved = callsight::storage::load_summary(Some(&path)).unwrap().unwrap();
    assert_eq!(saved.ticker, "AAPL");

    delete_summary(Some(&path)).unwrap();
}

#[tokio::test]
async fn scrape_compute_inject_activate_chain() {
    // The hosting-environment flow without the engine: snapshot markup →
    // locate → extract → project → inject → select a cell.
    let html = options_page("Calls", JAN, &aapl_rows());
    let mut dom = parse_document(&html);
    let table = find_calls_table(&dom).expect("calls table present");

    let rows = extract::contract_rows(&dom, table);
    let results = roi::project_rows(
        &rows,
        &Underlying {
            price: 100.0,
            annualized_dividend: 4.0,
        },
        "AAPL",
        Some(JAN.to_string()),
    );

    let mut overlay = Overlay::new();
    overlay.inject(&mut dom, table, &results, "AAPL");
    overlay.inject(&mut dom, table, &results, "AAPL");
    assert_eq!(dom.nodes_with_class(HEADER_MARK).len(), 3);
    assert_eq!(dom.nodes_with_class(CELL_MARK).len(), 3);

    // Selecting the +10% cell opens exactly one detail popup.
    let cells = dom.nodes_with_class(CELL_MARK);
    overlay.activate_cell(&mut dom, cells[2], &results).unwrap();
    overlay.activate_cell(&mut dom, cells[0], &results).unwrap();
    let popups = dom.nodes_with_class(popup::POPUP_MARK);
    assert_eq!(popups.len(), 1);
    assert!(dom
        .text_content(popups[0])
        .contains("ROI Breakdown @ -10% (AAPL)"));

    // Cleanup tears the whole overlay down.
    overlay.cleanup(&mut dom);
    assert!(dom.nodes_with_class(HEADER_MARK).is_empty());
    assert!(dom.nodes_with_class(CELL_MARK).is_empty());
    assert!(dom.nodes_with_class(popup::POPUP_MARK).is_empty());
}
