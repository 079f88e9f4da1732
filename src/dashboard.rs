//! Dashboard snapshot sources, server-side HTML rendering, and HTTP routes.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};

use crate::snapshot::{read_snapshot, summarize_table, CombinedSnapshot, SnapshotError, TableSummary};
use crate::timeseries::{
    average_growth, entity_names, growth_series, market_share, trend, FollowerRecord, Performer,
    PerformanceHistory,
};

/// Shared-string gate, matching the original dashboard's client-side check.
/// This is access friction, not security.
pub const DEFAULT_DASHBOARD_PASSWORD: &str = "flockboard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardOptions {
    pub password: String,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            password: DEFAULT_DASHBOARD_PASSWORD.to_string(),
        }
    }
}

impl DashboardOptions {
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Ok(password) = std::env::var("FLOCKBOARD_DASHBOARD_PASSWORD") {
            let trimmed = password.trim();
            if !trimmed.is_empty() {
                options.password = trimmed.to_string();
            }
        }
        options
    }
}

pub trait SnapshotSource: Send + Sync + 'static {
    fn snapshot(&self) -> CombinedSnapshot;
}

#[derive(Clone)]
pub struct InMemorySnapshotSource {
    inner: Arc<RwLock<CombinedSnapshot>>,
}

impl InMemorySnapshotSource {
    pub fn new(snapshot: CombinedSnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(snapshot)),
        }
    }

    pub fn demo() -> Self {
        Self::new(demo_snapshot())
    }

    pub fn replace_snapshot(&self, snapshot: CombinedSnapshot) {
        let mut guard = self
            .inner
            .write()
            .expect("in-memory snapshot lock should not be poisoned");
        *guard = snapshot;
    }
}

impl SnapshotSource for InMemorySnapshotSource {
    fn snapshot(&self) -> CombinedSnapshot {
        self.inner
            .read()
            .expect("in-memory snapshot lock should not be poisoned")
            .clone()
    }
}

/// Serves the snapshot file `sheets_sync` writes. The file is re-read on
/// every request; if a refresh is mid-write or the file vanishes, the last
/// good snapshot keeps the dashboard rendering.
pub struct FileSnapshotSource {
    path: PathBuf,
    last_good: Mutex<CombinedSnapshot>,
}

impl FileSnapshotSource {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SnapshotError> {
        let path = path.into();
        let initial = read_snapshot(&path)?;
        Ok(Self {
            path,
            last_good: Mutex::new(initial),
        })
    }
}

impl SnapshotSource for FileSnapshotSource {
    fn snapshot(&self) -> CombinedSnapshot {
        match read_snapshot(&self.path) {
            Ok(snapshot) => {
                let mut guard = self
                    .last_good
                    .lock()
                    .expect("file snapshot lock should not be poisoned");
                *guard = snapshot.clone();
                snapshot
            }
            Err(err) => {
                warn!(
                    component = "dashboard",
                    event = "snapshot.reload_failed",
                    path = %self.path.display(),
                    error = %err
                );
                self.last_good
                    .lock()
                    .expect("file snapshot lock should not be poisoned")
                    .clone()
            }
        }
    }
}

pub fn dashboard_router(source: Arc<dyn SnapshotSource>, options: DashboardOptions) -> Router {
    Router::new()
        .route("/dashboard", get(get_dashboard_html))
        .route("/dashboard/snapshot", get(get_dashboard_snapshot))
        .with_state(DashboardAppState {
            source,
            options: Arc::new(options),
        })
}

#[derive(Clone)]
struct DashboardAppState {
    source: Arc<dyn SnapshotSource>,
    options: Arc<DashboardOptions>,
}

async fn get_dashboard_html(State(state): State<DashboardAppState>) -> impl IntoResponse {
    let snapshot = state.source.snapshot();
    Html(render_dashboard_html(&snapshot, &state.options))
}

async fn get_dashboard_snapshot(State(state): State<DashboardAppState>) -> impl IntoResponse {
    let snapshot = state.source.snapshot();
    info!(
        component = "dashboard",
        event = "http.snapshot.request",
        client_periods = snapshot.clients.data.len(),
        competitor_periods = snapshot.competitors.data.len()
    );
    Json(snapshot)
}

pub fn render_dashboard_html(snapshot: &CombinedSnapshot, options: &DashboardOptions) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str("<title>Flockboard</title>\n");
    out.push_str("<style>:root{--bg:#f4f6f8;--card:#ffffff;--ink:#1c2733;--muted:#62707e;--line:#dbe2e8;--head:#16324a;--accent:#0b6e8f;--good:#0f9d58;--bad:#d93025;--gate:#10212f}*{box-sizing:border-box}body{margin:0;color:var(--ink);font-family:\"Segoe UI\",\"Avenir Next\",sans-serif;background:var(--bg);min-height:100vh}.shell{max-width:1300px;margin:0 auto;padding:24px 18px}.hero{background:linear-gradient(135deg,#16324a,#0b6e8f);color:#f4f9fb;border-radius:14px;padding:18px 20px}.hero h1{margin:0 0 6px;font-size:1.5rem}.hero-meta{display:flex;gap:16px;flex-wrap:wrap;align-items:center;font-size:.9rem;color:#d4e5ec}.tabs{margin:16px 0 0;display:flex;gap:8px}.tab-btn{border:1px solid var(--line);background:var(--card);color:var(--ink);padding:8px 16px;border-radius:9px;font-weight:600;cursor:pointer}.tab-btn.active{background:var(--accent);border-color:var(--accent);color:#fff}.card{margin-top:14px;background:var(--card);border:1px solid var(--line);border-radius:14px;padding:14px 16px}.cards{display:grid;grid-template-columns:repeat(auto-fit,minmax(240px,1fr));gap:12px}.perf h3{margin:0 0 6px;font-size:.95rem;color:var(--muted);text-transform:uppercase;letter-spacing:.04em}.perf .name{font-size:1.3rem;font-weight:700}.up{color:var(--good)}.down{color:var(--bad)}table{width:100%;border-collapse:collapse;margin-top:8px}th{background:var(--head);color:#eef5f9;font-size:.78rem;text-transform:uppercase;letter-spacing:.04em;padding:8px 9px;text-align:left}td{font-size:.86rem;padding:8px 9px;border-bottom:1px solid var(--line);white-space:nowrap}tr:nth-child(even) td{background:#f8fafc}.table-wrap{overflow:auto}.hidden{display:none}.overlay{position:fixed;inset:0;background:var(--gate);display:flex;align-items:center;justify-content:center;z-index:10}.gate{background:var(--card);border-radius:12px;padding:24px;width:320px}.gate h2{margin:0 0 12px}.gate input{width:100%;padding:9px;border:1px solid var(--line);border-radius:8px;margin-bottom:10px}.gate button{width:100%;background:var(--accent);color:#fff;border:none;padding:10px;border-radius:8px;font-weight:700;cursor:pointer}.gate .error{color:var(--bad);font-size:.85rem;margin:0 0 8px}.logout{background:none;border:1px solid #d4e5ec;color:#d4e5ec;border-radius:8px;padding:6px 12px;cursor:pointer}</style>\n");
    out.push_str("</head><body>\n");

    out.push_str("<div id=\"login-overlay\" class=\"overlay\"><div class=\"gate\"><h2>Dashboard Login</h2><p id=\"login-error\" class=\"error hidden\">Incorrect password.</p><form id=\"login-form\"><input id=\"password\" type=\"password\" placeholder=\"Enter dashboard password\" required><button type=\"submit\">Login</button></form></div></div>\n");

    out.push_str("<main id=\"dashboard-shell\" class=\"shell hidden\">\n");
    out.push_str("<section class=\"hero\"><h1>Flockboard Follower Analytics</h1><div class=\"hero-meta\">");
    out.push_str(&format!(
        "<span>Last updated: {}</span>",
        escape_html(&format_last_updated(&snapshot.last_updated))
    ));
    out.push_str(&format!(
        "<span>Client periods: {}</span><span>Competitor periods: {}</span>",
        snapshot.clients.data.len(),
        snapshot.competitors.data.len()
    ));
    out.push_str("<button id=\"logout-btn\" class=\"logout\" type=\"button\">Log out</button>");
    out.push_str("</div></section>\n");

    out.push_str("<nav class=\"tabs\"><button id=\"tab-clients\" class=\"tab-btn active\" type=\"button\">Clients</button><button id=\"tab-competitors\" class=\"tab-btn\" type=\"button\">Competitors</button></nav>\n");

    render_table_section(&mut out, "clients", "Client Accounts", &snapshot.clients, false);
    render_table_section(
        &mut out,
        "competitors",
        "Competitor Accounts",
        &snapshot.competitors,
        true,
    );

    out.push_str("</main>\n");
    out.push_str(&gate_script(&options.password));
    out.push_str("</body></html>\n");
    out
}

fn render_table_section(
    out: &mut String,
    id: &str,
    title: &str,
    table: &TableSummary,
    include_market_share: bool,
) {
    let hidden = if id == "clients" { "" } else { " hidden" };
    out.push_str(&format!("<section id=\"view-{id}\" class=\"view{hidden}\">\n"));

    out.push_str("<div class=\"card cards\">");
    render_performer_card(
        out,
        "Best Performer",
        table.performers.best.as_ref(),
        &table.performance_history,
        true,
    );
    render_performer_card(
        out,
        "Needs Attention",
        table.performers.worst.as_ref(),
        &table.performance_history,
        false,
    );
    out.push_str("</div>\n");

    out.push_str(&format!(
        "<section class=\"card\"><h2>{}</h2><div class=\"table-wrap\"><table>",
        escape_html(title)
    ));
    out.push_str("<thead><tr><th>Account</th><th>Followers</th><th>Latest Growth</th><th>Avg Growth</th><th>Trend</th><th>Times Best</th><th>Times Worst</th>");
    if include_market_share {
        out.push_str("<th>Market Share</th>");
    }
    out.push_str("</tr></thead><tbody>\n");

    let accounts = entity_names(&table.data);
    let latest = table.data.last();
    let shares = latest.map(market_share).unwrap_or_default();
    for account in &accounts {
        let followers = latest.and_then(|record| record.value(account));
        let latest_growth = if table.data.len() > 1 {
            growth_series(&table.data, account).last().copied().flatten()
        } else {
            None
        };
        let avg = average_growth(&table.data, account);

        out.push_str("<tr>");
        out.push_str(&format!("<td>{}</td>", escape_html(account)));
        out.push_str(&format!("<td>{}</td>", format_followers_opt(followers)));
        out.push_str(&growth_cell(latest_growth));
        out.push_str(&growth_cell(avg));
        out.push_str(&growth_cell(trend(&table.data, account)));
        out.push_str(&format!(
            "<td>{}</td><td>{}</td>",
            table.performance_history.times_best(account),
            table.performance_history.times_worst(account)
        ));
        if include_market_share {
            match shares.get(account) {
                Some(share) => out.push_str(&format!("<td>{share:.2}%</td>")),
                None => out.push_str("<td>-</td>"),
            }
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody></table></div></section>\n");

    render_growth_matrix(out, table, &accounts);
    out.push_str("</section>\n");
}

fn render_performer_card(
    out: &mut String,
    title: &str,
    performer: Option<&Performer>,
    history: &PerformanceHistory,
    best: bool,
) {
    out.push_str("<div class=\"perf\">");
    out.push_str(&format!("<h3>{}</h3>", escape_html(title)));
    match performer {
        Some(performer) => {
            let count = if best {
                history.times_best(&performer.account)
            } else {
                history.times_worst(&performer.account)
            };
            out.push_str(&format!(
                "<p class=\"name\">{}</p>",
                escape_html(&performer.account)
            ));
            out.push_str(&format!(
                "<p>Growth: {}</p>",
                growth_span(Some(performer.growth))
            ));
            out.push_str(&format!(
                "<p>Current followers: {}</p>",
                format_followers(performer.current_followers)
            ));
            out.push_str(&format!("<p>Periods in this spot: {count}</p>"));
        }
        None => out.push_str("<p class=\"name\">Insufficient data</p>"),
    }
    out.push_str("</div>");
}

/// Period-by-account growth table; the server-side stand-in for the growth
/// comparison chart.
fn render_growth_matrix(out: &mut String, table: &TableSummary, accounts: &[String]) {
    if table.data.is_empty() || accounts.is_empty() {
        return;
    }

    let series: Vec<Vec<Option<f64>>> = accounts
        .iter()
        .map(|account| growth_series(&table.data, account))
        .collect();

    out.push_str("<section class=\"card\"><h2>Growth by Period</h2><div class=\"table-wrap\"><table><thead><tr><th>Date</th>");
    for account in accounts {
        out.push_str(&format!("<th>{}</th>", escape_html(account)));
    }
    out.push_str("</tr></thead><tbody>\n");

    for (idx, record) in table.data.iter().enumerate() {
        out.push_str(&format!("<tr><td>{}</td>", record.date.format("%b %Y")));
        for per_account in &series {
            out.push_str(&growth_cell(per_account[idx]));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody></table></div></section>\n");
}

fn gate_script(password: &str) -> String {
    let escaped = serde_json::to_string(password).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "<script>(function(){{\
const PASSWORD={escaped};\
const overlay=document.getElementById('login-overlay');\
const shell=document.getElementById('dashboard-shell');\
const error=document.getElementById('login-error');\
function show(auth){{overlay.classList.toggle('hidden',auth);shell.classList.toggle('hidden',!auth);}}\
show(sessionStorage.getItem('flockboardAuth')==='true');\
document.getElementById('login-form').addEventListener('submit',function(e){{\
e.preventDefault();\
const value=document.getElementById('password').value;\
if(value===PASSWORD){{sessionStorage.setItem('flockboardAuth','true');error.classList.add('hidden');show(true);}}\
else{{error.classList.remove('hidden');document.getElementById('password').value='';}}\
}});\
document.getElementById('logout-btn').addEventListener('click',function(){{\
sessionStorage.removeItem('flockboardAuth');show(false);\
}});\
function tab(which){{\
document.getElementById('tab-clients').classList.toggle('active',which==='clients');\
document.getElementById('tab-competitors').classList.toggle('active',which==='competitors');\
document.getElementById('view-clients').classList.toggle('hidden',which!=='clients');\
document.getElementById('view-competitors').classList.toggle('hidden',which!=='competitors');\
}}\
document.getElementById('tab-clients').addEventListener('click',function(){{tab('clients');}});\
document.getElementById('tab-competitors').addEventListener('click',function(){{tab('competitors');}});\
}})();</script>"
    )
}

pub fn demo_snapshot() -> CombinedSnapshot {
    let clients = demo_table(&[
        (
            "Aurora Fitness",
            &[12400.0, 13100.0, 13900.0, 15200.0, 15800.0, 17100.0],
        ),
        (
            "Bluebird Cafe",
            &[8600.0, 8800.0, 8700.0, 9000.0, 9400.0, 9300.0],
        ),
        (
            "Cedar Outdoors",
            &[21000.0, 21300.0, 21250.0, 21900.0, 22400.0, 23100.0],
        ),
    ]);
    let competitors = demo_table(&[
        (
            "FitNation",
            &[45200.0, 46100.0, 47000.0, 48900.0, 50100.0, 51400.0],
        ),
        (
            "PeakPulse",
            &[30800.0, 31000.0, 30700.0, 31200.0, 31100.0, 31500.0],
        ),
        (
            "UrbanTrail",
            &[18900.0, 19600.0, 20800.0, 21500.0, 22900.0, 24100.0],
        ),
    ]);

    CombinedSnapshot {
        clients,
        competitors,
        last_updated: Utc::now().to_rfc3339(),
    }
}

fn demo_table(accounts: &[(&str, &[f64; 6])]) -> TableSummary {
    let records = (0..6)
        .map(|month| {
            let date = NaiveDate::from_ymd_opt(2024, month as u32 + 1, 1)
                .unwrap_or_else(|| Utc::now().date_naive());
            let mut record = FollowerRecord::new(date);
            for (account, counts) in accounts {
                record = record.with_value(*account, counts[month]);
            }
            record
        })
        .collect();
    summarize_table(records)
}

fn growth_cell(growth: Option<f64>) -> String {
    format!("<td>{}</td>", growth_span(growth))
}

fn growth_span(growth: Option<f64>) -> String {
    match growth {
        Some(value) => {
            let class = if value >= 0.0 { "up" } else { "down" };
            format!("<span class=\"{class}\">{value:+.2}%</span>")
        }
        None => "-".to_string(),
    }
}

fn format_followers_opt(count: Option<f64>) -> String {
    count.map(format_followers).unwrap_or_else(|| "-".to_string())
}

fn format_followers(count: f64) -> String {
    let whole = count.round() as i64;
    let digits = whole.abs().to_string();
    let mut grouped = String::new();
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if whole < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn format_last_updated(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(stamp) => stamp
            .with_timezone(&Utc)
            .format("%B %-d, %Y %H:%M UTC")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
