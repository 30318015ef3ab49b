// src/main.rs
mod metrics;

use anyhow::{anyhow, Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::{
    fs,
    net::SocketAddr,
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use depthline::{
    analytics::{self, Spread},
    book::OrderBook,
    depth::{self, DepthProfile, OrderEntry, Side},
    feed::{Candle, MockFeed},
    policy::SymbolPolicy,
    wire,
};

use crate::metrics::Metrics;

// Tuning constants
const CHANNEL_BUFFER_SIZE: usize = 1024;
const WS_PING_INTERVAL_SECS: u64 = 15;
const DEFAULT_BASE_PRICE: f64 = 50_000.0;
const CANDLE_HISTORY: usize = 100;

#[derive(Parser, Debug)]
#[command(name = "depthline", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Serve mock trading-view data over HTTP/WebSocket.
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        http_bind: SocketAddr,
        /// Comma-separated symbol list; each gets its own feed task.
        #[arg(long, default_value = "BTC/USDT")]
        symbols: String,
        /// JSON file with an array of symbol policies; symbols without an
        /// entry fall back to the default policy.
        #[arg(long)]
        policy: Option<PathBuf>,
        /// Depth levels kept per side in published frames. 0 means full depth.
        #[arg(long, default_value_t = 20)]
        depth: usize,
        /// Raw levels generated per side per snapshot.
        #[arg(long, default_value_t = 20)]
        levels: usize,
        /// Snapshot interval in milliseconds.
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
        /// Feed RNG seed (per-symbol feeds offset from it).
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Aggregate a raw order file offline and write the depth profile.
    Aggregate {
        #[arg(long)]
        file: PathBuf,
        #[arg(long, default_value = "depth.json")]
        out: PathBuf,
        /// Depth=0 means full depth (all price levels)
        #[arg(long, default_value_t = 0)]
        depth: usize,
    },
}

#[derive(Clone)]
struct AppState {
    metrics: Arc<Metrics>,
    latest: Arc<DashMap<String, SymbolSnapshot>>,
    depth_tx: watch::Sender<Bytes>,
    depth_rx: watch::Receiver<Bytes>,
    bbo_tx: watch::Sender<Bytes>,
    bbo_rx: watch::Receiver<Bytes>,
    ws_depth_clients: Arc<AtomicUsize>,
    ws_bbo_clients: Arc<AtomicUsize>,
}

#[derive(Clone)]
struct SymbolSnapshot {
    policy: SymbolPolicy,
    profile: DepthProfile,
    spread: Spread,
    vwap: Decimal,
    candles: Arc<[Candle]>,
    update_id: u64,
    ts_ms: u64,
}

#[derive(Debug)]
enum PubEvent {
    /// Already-encoded frames (Bytes is ref-counted). Keep publisher lean.
    Depth(Bytes),
    Bbo(Bytes),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Aggregate { file, out, depth } => aggregate_file(file, out, depth).await,
        Cmd::Serve {
            http_bind,
            symbols,
            policy,
            depth,
            levels,
            interval_ms,
            seed,
        } => serve(http_bind, symbols, policy, depth, levels, interval_ms, seed).await,
    }
}

#[derive(Deserialize)]
struct RawEntry {
    price: String,
    quantity: String,
}

#[derive(Deserialize)]
struct RawBook {
    bids: Vec<RawEntry>,
    asks: Vec<RawEntry>,
}

fn parse_side(raw: &[RawEntry], side: &str) -> Result<Vec<OrderEntry>> {
    raw.iter()
        .enumerate()
        .map(|(i, e)| {
            OrderEntry::from_strs(&e.price, &e.quantity)
                .map_err(|err| anyhow!("{side}[{i}]: {err}"))
        })
        .collect()
}

async fn aggregate_file(file: PathBuf, out: PathBuf, depth: usize) -> Result<()> {
    let raw = fs::read_to_string(&file).with_context(|| format!("open {:?}", file))?;
    let book: RawBook =
        serde_json::from_str(&raw).with_context(|| format!("parse {:?}", file))?;

    let bids = parse_side(&book.bids, "bids")?;
    let asks = parse_side(&book.asks, "asks")?;

    let profile = depth::aggregate_top(&bids, &asks, depth);
    let spread = analytics::spread(&bids, &asks);
    let mut all = bids;
    all.extend(asks);
    let vwap = analytics::vwap(&all);

    let final_text = json!({
        "type": "final",
        "bids": profile.bids,
        "asks": profile.asks,
        "spread": spread,
        "vwap": vwap,
    })
    .to_string();

    fs::write(&out, final_text).with_context(|| format!("write {:?}", out))?;
    info!("wrote depth profile to {:?}", out);
    Ok(())
}

fn load_policies(path: Option<&PathBuf>) -> Result<Vec<SymbolPolicy>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let raw = fs::read_to_string(path).with_context(|| format!("open policy file {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("parse policy file {:?}", path))
}

fn policy_for(symbol: &str, policies: &[SymbolPolicy]) -> SymbolPolicy {
    policies
        .iter()
        .find(|p| p.symbol == symbol)
        .cloned()
        .unwrap_or_else(|| SymbolPolicy {
            symbol: symbol.to_owned(),
            ..SymbolPolicy::default()
        })
}

async fn serve(
    http_bind: SocketAddr,
    symbols: String,
    policy_file: Option<PathBuf>,
    depth: usize,
    levels: usize,
    interval_ms: u64,
    seed: u64,
) -> Result<()> {
    let symbols: Vec<String> = symbols
        .split(',')
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect();
    if symbols.is_empty() {
        return Err(anyhow!("need at least one symbol"));
    }
    let policies = load_policies(policy_file.as_ref())?;

    info!("serve: symbols={symbols:?} depth={depth} interval={interval_ms}ms");

    let metrics = Arc::new(Metrics::new());
    let latest = Arc::new(DashMap::<String, SymbolSnapshot>::new());

    let (depth_tx, depth_rx) = watch::channel(Bytes::from_static(b""));
    let (bbo_tx, bbo_rx) = watch::channel(Bytes::from_static(b""));

    let state = AppState {
        metrics: metrics.clone(),
        latest: latest.clone(),
        depth_tx,
        depth_rx,
        bbo_tx,
        bbo_rx,
        ws_depth_clients: Arc::new(AtomicUsize::new(0)),
        ws_bbo_clients: Arc::new(AtomicUsize::new(0)),
    };

    let http_task = {
        let st = state.clone();
        tokio::spawn(async move {
            info!("http: listening on {http_bind}");
            let listener = tokio::net::TcpListener::bind(http_bind).await?;
            axum::serve(listener, build_api(st)).await?;
            Ok::<(), anyhow::Error>(())
        })
    };

    let (pub_tx, pub_rx) = mpsc::channel::<PubEvent>(CHANNEL_BUFFER_SIZE);
    let pub_task = tokio::spawn(publisher_loop(state.clone(), pub_rx));

    let mut feed_tasks = Vec::with_capacity(symbols.len());
    for (i, symbol) in symbols.iter().enumerate() {
        let policy = policy_for(symbol, &policies);
        feed_tasks.push(tokio::spawn(feed_loop(
            symbol.clone(),
            policy,
            latest.clone(),
            pub_tx.clone(),
            metrics.clone(),
            depth,
            levels,
            interval_ms,
            seed.wrapping_add(i as u64),
        )));
    }

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    for t in feed_tasks {
        t.abort();
    }
    pub_task.abort();
    http_task.abort();
    Ok(())
}

async fn feed_loop(
    symbol: String,
    policy: SymbolPolicy,
    latest: Arc<DashMap<String, SymbolSnapshot>>,
    pub_tx: mpsc::Sender<PubEvent>,
    metrics: Arc<Metrics>,
    depth: usize,
    levels: usize,
    interval_ms: u64,
    seed: u64,
) {
    let mut feed = MockFeed::new(policy.clone(), levels, DEFAULT_BASE_PRICE, seed);
    let mut book = OrderBook::new();
    let candles: Arc<[Candle]> = feed.candles(CANDLE_HISTORY, now_ms()).into();
    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));

    loop {
        ticker.tick().await;
        let snap = feed.next_snapshot();

        // The feed honors the policy by construction, but its output goes
        // through the same gate as any external source would.
        let keep = |entries: Vec<OrderEntry>| -> Vec<OrderEntry> {
            entries
                .into_iter()
                .filter(|e| {
                    let v = policy
                        .validate_entry(&e.price.to_string(), &e.quantity.to_string());
                    if !v.is_valid() {
                        metrics.inc_rejected();
                    }
                    v.is_valid()
                })
                .collect()
        };
        let bids = keep(snap.bids);
        let asks = keep(snap.asks);

        let t0 = Instant::now();
        let bbo_changed = book.replace(&bids, &asks, snap.update_id);
        let top_bids = book.levels(Side::Bid, depth);
        let top_asks = book.levels(Side::Ask, depth);
        let profile = depth::aggregate(&top_bids, &top_asks);
        let spread = analytics::spread(&top_bids, &top_asks);
        let mut all = top_bids;
        all.extend(top_asks);
        let vwap = analytics::vwap(&all);
        metrics.record_aggregation(t0.elapsed());

        if book.is_crossed() {
            metrics.inc_crossed();
        }

        let ts_ms = now_ms();
        latest.insert(
            symbol.clone(),
            SymbolSnapshot {
                policy: policy.clone(),
                profile: profile.clone(),
                spread,
                vwap,
                candles: candles.clone(),
                update_id: book.last_update_id(),
                ts_ms,
            },
        );

        let depth_frame = wire::encode_depth(&symbol, ts_ms, &profile, &spread, &policy);
        if pub_tx.try_send(PubEvent::Depth(depth_frame)).is_err() {
            warn!("publisher backlogged, dropping depth frame for {symbol}");
        }

        if bbo_changed {
            let frame = wire::encode_bbo(&symbol, ts_ms, &book.bbo(), &policy);
            let _ = pub_tx.try_send(PubEvent::Bbo(frame));
        }

        metrics.inc_snapshots();
    }
}

async fn publisher_loop(st: AppState, mut rx: mpsc::Receiver<PubEvent>) -> Result<()> {
    while let Some(ev) = rx.recv().await {
        match ev {
            PubEvent::Depth(frame) => {
                if st.ws_depth_clients.load(Ordering::Relaxed) != 0 {
                    let _ = st.depth_tx.send_replace(frame);
                }
                st.metrics.inc_pub_depth();
            }
            PubEvent::Bbo(frame) => {
                if st.ws_bbo_clients.load(Ordering::Relaxed) != 0 {
                    let _ = st.bbo_tx.send_replace(frame);
                }
                st.metrics.inc_pub_bbo();
            }
        }
    }
    Ok(())
}

fn build_api(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/symbols", get(symbols_handler))
        .route("/book", get(book_handler))
        .route("/candles", get(candles_handler))
        .route("/ws/depth", get(ws_depth_handler))
        .route("/ws/bbo", get(ws_bbo_handler))
        .with_state(state)
}

async fn metrics_handler(State(st): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, st.metrics.prometheus_text())
}

async fn symbols_handler(State(st): State<AppState>) -> impl IntoResponse {
    let out: Vec<SymbolPolicy> = st.latest.iter().map(|e| e.value().policy.clone()).collect();
    (StatusCode::OK, axum::Json(out))
}

#[derive(Deserialize)]
struct SymbolQuery {
    symbol: Option<String>,
}

async fn book_handler(
    State(st): State<AppState>,
    Query(q): Query<SymbolQuery>,
) -> impl IntoResponse {
    // Build on-demand; the hot publish path never rebuilds JSON for HTTP.
    if let Some(sym) = q.symbol {
        if let Some(v) = st.latest.get(&sym) {
            let frame = wire::encode_depth(&sym, v.ts_ms, &v.profile, &v.spread, &v.policy);
            return (StatusCode::OK, frame);
        }
        return (StatusCode::NOT_FOUND, Bytes::from_static(b"{}"));
    }

    let mut symbols = serde_json::Map::new();
    for e in st.latest.iter() {
        let v = e.value();
        symbols.insert(
            e.key().clone(),
            json!({
                "update_id": v.update_id,
                "ts_ms": v.ts_ms,
                "spread": v.spread,
                "vwap": v.vwap,
                "bids": v.profile.bids,
                "asks": v.profile.asks,
            }),
        );
    }
    let payload = json!({ "type": "books", "symbols": symbols }).to_string();
    (StatusCode::OK, Bytes::from(payload))
}

async fn candles_handler(
    State(st): State<AppState>,
    Query(q): Query<SymbolQuery>,
) -> impl IntoResponse {
    let Some(sym) = q.symbol else {
        return (StatusCode::BAD_REQUEST, Bytes::from_static(b"{}"));
    };
    match st.latest.get(&sym) {
        Some(v) => (StatusCode::OK, wire::encode_candles(&sym, &v.candles)),
        None => (StatusCode::NOT_FOUND, Bytes::from_static(b"{}")),
    }
}

async fn ws_depth_handler(ws: WebSocketUpgrade, State(st): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        ws_watch_loop(socket, st.depth_rx.clone(), st.ws_depth_clients.clone())
    })
}

async fn ws_bbo_handler(ws: WebSocketUpgrade, State(st): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_watch_loop(socket, st.bbo_rx.clone(), st.ws_bbo_clients.clone()))
}

async fn ws_watch_loop(
    mut socket: WebSocket,
    mut rx: watch::Receiver<Bytes>,
    clients: Arc<AtomicUsize>,
) {
    clients.fetch_add(1, Ordering::Relaxed);
    let cur = rx.borrow().clone();
    if !cur.is_empty() {
        let _ = socket.send(Message::Binary(cur.to_vec())).await;
    }

    loop {
        tokio::select! {
            r = rx.changed() => {
                if r.is_err() { break; }
                let msg = rx.borrow().clone();
                if msg.is_empty() { continue; }
                if socket.send(Message::Binary(msg.to_vec())).await.is_err() { break; }
            }
            _ = tokio::time::sleep(Duration::from_secs(WS_PING_INTERVAL_SECS)) => {
                if socket.send(Message::Ping(vec![])).await.is_err() { break; }
            }
        }
    }

    clients.fetch_sub(1, Ordering::Relaxed);
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
