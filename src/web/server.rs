use axum::{
    routing::{get, put},
    Router,
    response::Html,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use super::{api, AppState};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Dashboard page
        .route("/", get(serve_dashboard))
        // API endpoints
        .route("/api/health", get(api::health_check))
        .route("/api/snapshot", get(api::get_snapshot))
        // Config endpoints
        .route("/api/config", get(api::get_config))
        .route("/api/config/filter", put(api::put_filter_settings))
        .route("/api/config/display", put(api::put_display_settings))
        // WebSocket
        .route("/ws", get(api::websocket_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_dashboard_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Dashboard server starting on http://localhost:{}", port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

const DASHBOARD_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Trade Monitor</title>
    <script src="https://cdn.jsdelivr.net/npm/chart.js"></script>
    <script src="https://cdn.jsdelivr.net/npm/chartjs-adapter-date-fns"></script>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif;
            background: #0f1419;
            color: #e7e9ea;
            min-height: 100vh;
        }
        .header {
            background: #16202a;
            padding: 1rem 2rem;
            border-bottom: 1px solid #2f3336;
            display: flex;
            justify-content: space-between;
            align-items: center;
            gap: 2rem;
            flex-wrap: wrap;
        }
        .header h1 { font-size: 1.5rem; color: #1da1f2; }
        .header .caption { color: #71767b; font-size: 0.875rem; }
        .status { display: flex; align-items: center; gap: 0.5rem; color: #71767b; font-size: 0.875rem; }
        .status-dot {
            width: 10px; height: 10px; border-radius: 50%;
            background: #00ba7c; animation: pulse 2s infinite;
        }
        .status-dot.disconnected { background: #f4212e; animation: none; }
        @keyframes pulse { 0%, 100% { opacity: 1; } 50% { opacity: 0.5; } }

        .container { padding: 1.5rem; max-width: 1600px; margin: 0 auto; }

        .grid { display: grid; gap: 1.5rem; }
        .grid-4 { grid-template-columns: repeat(4, 1fr); }
        .grid-2 { grid-template-columns: repeat(2, 1fr); }

        @media (max-width: 1200px) { .grid-4 { grid-template-columns: repeat(2, 1fr); } }
        @media (max-width: 768px) { .grid-4, .grid-2 { grid-template-columns: 1fr; } }

        .card {
            background: #16202a;
            border-radius: 12px;
            padding: 1.5rem;
            border: 1px solid #2f3336;
        }
        .card-title {
            font-size: 0.875rem;
            color: #71767b;
            text-transform: uppercase;
            letter-spacing: 0.5px;
            margin-bottom: 0.75rem;
        }
        .card-value { font-size: 2rem; font-weight: 700; }

        .positive { color: #00ba7c; }
        .negative { color: #f4212e; }
        .neutral { color: #71767b; }

        .chart-container { height: 300px; position: relative; }
        .chart-container.large { height: 400px; }

        .table-container { overflow-x: auto; max-height: 400px; }
        table { width: 100%; border-collapse: collapse; }
        th, td { padding: 0.75rem; text-align: left; border-bottom: 1px solid #2f3336; }
        th { color: #71767b; font-weight: 500; font-size: 0.75rem; text-transform: uppercase; position: sticky; top: 0; background: #16202a; }
        td { font-size: 0.875rem; }
        tr:hover { background: #1c2732; }

        .section-title { font-size: 1.25rem; font-weight: 600; margin-bottom: 1rem; }
        .mt-1 { margin-top: 1.5rem; }

        .banner {
            padding: 1.5rem;
            border-radius: 12px;
            border: 1px solid #2f3336;
            background: #16202a;
            font-size: 1rem;
        }
        .banner.error { border-color: #f4212e; color: #f4212e; }
        .hidden { display: none; }
    </style>
</head>
<body>
    <div class="header">
        <div>
            <h1 id="title">Trade Monitor</h1>
            <div class="caption" id="caption"></div>
        </div>
        <div class="status">
            <div class="status-dot" id="status-dot"></div>
            <span id="status-text">Connecting...</span>
        </div>
    </div>

    <div class="container">
        <div id="banner" class="banner hidden"></div>

        <div id="dashboard" class="hidden">
            <div class="grid grid-4">
                <div class="card">
                    <div class="card-title">Net Profit</div>
                    <div class="card-value" id="net-profit">-</div>
                </div>
                <div class="card">
                    <div class="card-title">Win Rate</div>
                    <div class="card-value" id="win-rate">-</div>
                </div>
                <div class="card">
                    <div class="card-title">Profit Factor</div>
                    <div class="card-value" id="profit-factor">-</div>
                </div>
                <div class="card">
                    <div class="card-title">Total Trades</div>
                    <div class="card-value" id="total-trades">-</div>
                </div>
            </div>

            <div class="card mt-1" id="equity-card">
                <div class="section-title">The Compounding Curve</div>
                <div class="chart-container large"><canvas id="equity-chart"></canvas></div>
            </div>

            <div class="grid grid-2 mt-1">
                <div class="card" id="pnl-card">
                    <div class="section-title">Win/Loss Distribution</div>
                    <div class="chart-container"><canvas id="pnl-chart"></canvas></div>
                </div>
                <div class="card">
                    <div class="section-title">Recent Activity</div>
                    <div class="table-container">
                        <table>
                            <thead id="recent-head"></thead>
                            <tbody id="recent-body"></tbody>
                        </table>
                    </div>
                </div>
            </div>
        </div>
    </div>

    <script>
        let equityChart = null;
        let pnlChart = null;

        const num = (v) => Number(v);
        const money = (v) => (num(v) < 0 ? '-$' : '$') + Math.abs(num(v)).toFixed(2);

        function showBanner(text, isError) {
            const banner = document.getElementById('banner');
            banner.textContent = text;
            banner.className = 'banner' + (isError ? ' error' : '');
            document.getElementById('dashboard').className = 'hidden';
        }

        function render(data) {
            document.getElementById('title').textContent = data.title;
            document.title = data.title;
            const refreshed = data.refreshed_at ? new Date(data.refreshed_at).toLocaleTimeString() : 'never';
            document.getElementById('caption').textContent = 'Last refresh: ' + refreshed + ' | cycle ' + data.cycles;

            const view = data.view;
            if (view.state === 'starting') {
                showBanner('Starting up...', false);
                return;
            }
            if (view.state === 'waiting') {
                showBanner('Waiting for data... ' + view.source + ' has no trades yet.', false);
                return;
            }
            if (view.state === 'unavailable') {
                showBanner('Cannot read ' + view.source + ': ' + view.message, true);
                return;
            }

            document.getElementById('banner').className = 'banner hidden';
            document.getElementById('dashboard').className = '';
            renderSnapshot(view.snapshot);
        }

        function renderSnapshot(s) {
            const net = document.getElementById('net-profit');
            if (s.net_profit === null) {
                net.textContent = 'n/a';
                net.className = 'card-value neutral';
            } else {
                net.textContent = money(s.net_profit);
                net.className = 'card-value ' + (num(s.net_profit) >= 0 ? 'positive' : 'negative');
            }
            const hasPnl = s.capabilities.pnl_stats;
            document.getElementById('win-rate').textContent =
                hasPnl ? num(s.stats.win_rate).toFixed(1) + '%' : 'n/a';
            const noLosses = num(s.stats.gross_loss) === 0 && s.stats.winning_trades > 0;
            document.getElementById('profit-factor').textContent =
                !hasPnl || noLosses ? 'n/a' : num(s.stats.profit_factor).toFixed(2);
            document.getElementById('total-trades').textContent = hasPnl ? s.stats.total_trades : 'n/a';

            document.getElementById('equity-card').className =
                'card mt-1' + (s.capabilities.equity_curve ? '' : ' hidden');
            renderEquity(s.equity_curve);
            document.getElementById('pnl-card').className = 'card' + (hasPnl ? '' : ' hidden');
            renderHistogram(s.pnl_histogram);
            renderRecent(s.recent_events);
        }

        function renderEquity(points) {
            const data = points.map(p => ({ x: p.time, y: num(p.running) }));
            if (equityChart) {
                equityChart.data.datasets[0].data = data;
                equityChart.update('none');
                return;
            }
            equityChart = new Chart(document.getElementById('equity-chart'), {
                type: 'line',
                data: { datasets: [{
                    label: 'Balance ($)',
                    data,
                    borderColor: '#00FF7F',
                    backgroundColor: 'rgba(0, 255, 127, 0.2)',
                    fill: true,
                    pointRadius: 0,
                }]},
                options: {
                    responsive: true,
                    maintainAspectRatio: false,
                    scales: { x: { type: 'time' }, y: { title: { display: true, text: 'Profit ($)' } } },
                    plugins: { legend: { display: false } },
                },
            });
        }

        function renderHistogram(buckets) {
            const labels = buckets.map(b => b.label);
            const counts = buckets.map(b => b.count);
            if (pnlChart) {
                pnlChart.data.labels = labels;
                pnlChart.data.datasets[0].data = counts;
                pnlChart.update('none');
                return;
            }
            pnlChart = new Chart(document.getElementById('pnl-chart'), {
                type: 'bar',
                data: { labels, datasets: [{ label: 'Trades', data: counts, backgroundColor: '#636EFA' }] },
                options: {
                    responsive: true,
                    maintainAspectRatio: false,
                    plugins: { legend: { display: false } },
                },
            });
        }

        function renderRecent(recent) {
            const head = document.getElementById('recent-head');
            const body = document.getElementById('recent-body');
            head.innerHTML = '';
            body.innerHTML = '';

            const headRow = document.createElement('tr');
            recent.columns.forEach(c => {
                const th = document.createElement('th');
                th.textContent = c;
                headRow.appendChild(th);
            });
            head.appendChild(headRow);

            recent.rows.forEach(r => {
                const tr = document.createElement('tr');
                r.values.forEach(v => {
                    const td = document.createElement('td');
                    td.textContent = v;
                    tr.appendChild(td);
                });
                body.appendChild(tr);
            });
        }

        function setConnected(connected) {
            document.getElementById('status-dot').className = 'status-dot' + (connected ? '' : ' disconnected');
            document.getElementById('status-text').textContent = connected ? 'Live' : 'Disconnected';
        }

        async function loadSnapshot() {
            try {
                const resp = await fetch('/api/snapshot');
                render(await resp.json());
            } catch (e) {
                showBanner('Dashboard server unreachable: ' + e, true);
            }
        }

        function connect() {
            const proto = location.protocol === 'https:' ? 'wss' : 'ws';
            const ws = new WebSocket(proto + '://' + location.host + '/ws');
            ws.onopen = () => setConnected(true);
            ws.onmessage = (msg) => {
                const event = JSON.parse(msg.data);
                if (event.type === 'Refresh') {
                    render(event);
                }
            };
            ws.onclose = () => {
                setConnected(false);
                setTimeout(connect, 5000);
            };
        }

        loadSnapshot();
        connect();
    </script>
</body>
</html>
"##;
