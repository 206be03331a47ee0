//! Embedded dashboard page.
//!
//! Single self-contained HTML document; charts are drawn by CDN-loaded
//! plotly against the JSON endpoints. The selected symbol and the chart
//! toggle are plain client-side state.

use axum::response::Html;

pub async fn dashboard_handler() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Stock Market Analysis Dashboard</title>
<script src="https://cdn.plot.ly/plotly-2.35.2.min.js"></script>
<style>
  :root {
    --bg: #1a1a1a;
    --card: #2d2d2d;
    --accent: #3498db;
    --text: #ecf0f1;
    --muted: #95a5a6;
  }
  body {
    background: var(--bg);
    color: var(--text);
    font-family: "Segoe UI", sans-serif;
    margin: 0;
  }
  .container { max-width: 1400px; margin: 0 auto; padding: 20px; }
  .header {
    background: linear-gradient(135deg, #2c3e50, var(--accent));
    padding: 18px 24px;
    border-radius: 12px;
    display: flex;
    justify-content: space-between;
    align-items: center;
  }
  .header h1 { margin: 0; font-size: 1.6em; }
  .export-button {
    background: var(--accent);
    color: white;
    border: none;
    padding: 10px 18px;
    border-radius: 6px;
    cursor: pointer;
    font-size: 1em;
  }
  .export-button:hover { background: #2980b9; }
  .metrics { display: grid; grid-template-columns: repeat(auto-fit, minmax(240px, 1fr)); gap: 16px; margin: 20px 0; }
  .metric-card { background: var(--card); border-radius: 12px; padding: 20px; }
  .metric-card h3 { margin: 0; color: var(--muted); font-size: 0.9em; font-weight: 500; }
  .metric-card p { margin: 6px 0 0; font-size: 1.6em; font-weight: 600; }
  .panel { background: var(--card); border-radius: 12px; padding: 16px; margin-bottom: 20px; }
  select {
    background: var(--bg); color: var(--text);
    border: 1px solid var(--accent); border-radius: 6px;
    padding: 8px 12px; font-size: 1em; min-width: 320px;
  }
  .toggle button {
    background: var(--bg); color: var(--muted); border: 1px solid var(--muted);
    padding: 6px 14px; border-radius: 6px; cursor: pointer; margin-left: 6px;
  }
  .toggle button.active { color: var(--text); border-color: var(--accent); }
  table { width: 100%; border-collapse: collapse; }
  th, td { padding: 8px 10px; text-align: left; border-bottom: 1px solid rgba(255,255,255,0.08); }
  th { color: var(--muted); font-weight: 500; }
  .pos { color: #2ecc71; }
  .neg { color: #e74c3c; }
  .row { display: flex; gap: 16px; align-items: center; justify-content: space-between; flex-wrap: wrap; }
</style>
</head>
<body>
<div class="container">
  <div class="header">
    <h1>Stock Market Analysis Dashboard</h1>
    <a href="/api/report.pdf"><button class="export-button">Export Report (PDF)</button></a>
  </div>

  <div class="metrics" id="metric-cards"></div>

  <div class="panel">
    <div class="row">
      <label>Select Stock:
        <select id="symbol-selector"></select>
      </label>
      <span class="toggle">
        <button id="btn-price" class="active" onclick="setChart('price')">Price</button>
        <button id="btn-volume" onclick="setChart('volume')">Volume</button>
      </span>
    </div>
    <div id="chart" style="height:440px"></div>
    <div id="snapshot-table"></div>
  </div>

  <div class="panel">
    <h3>Top Gainers</h3>
    <table id="gainers-table"></table>
  </div>

  <div class="panel">
    <h3>Sector Analysis</h3>
    <table id="sector-table"></table>
  </div>
</div>

<script>
let currentSymbol = null;
let currentChart = 'price';
let currentDetail = null;

const fmt = (v, d = 2) => (v === null || v === undefined) ? '-' : Number(v).toFixed(d);
const changeCell = (v) =>
  v === null || v === undefined ? '<td>-</td>'
    : `<td class="${v >= 0 ? 'pos' : 'neg'}">${fmt(v)}%</td>`;

async function getJson(url) {
  const resp = await fetch(url);
  if (!resp.ok) throw new Error(`${url}: ${resp.status}`);
  return resp.json();
}

function renderOverview(overview) {
  const cards = [
    ['Total Market Cap', overview.total_market_cap.toLocaleString()],
    ['Average P/E', fmt(overview.average_pe)],
    ['Market Breadth', overview.market_breadth === undefined ? '-' : (overview.market_breadth * 100).toFixed(1) + '%'],
    ['Symbols Analyzed', overview.symbol_count],
  ];
  document.getElementById('metric-cards').innerHTML = cards
    .map(([title, value]) => `<div class="metric-card"><h3>${title}</h3><p>${value}</p></div>`)
    .join('');

  document.getElementById('gainers-table').innerHTML =
    '<tr><th>Symbol</th><th>Company</th><th>Price</th><th>Change %</th><th>Volume</th></tr>' +
    overview.top_gainers.map(g =>
      `<tr><td>${g.ticker}</td><td>${g.name}</td><td>${fmt(g.last_close)}</td>` +
      changeCell(g.daily_change_pct) + `<td>${g.last_volume.toLocaleString()}</td></tr>`
    ).join('');
}

function renderSectors(sectors) {
  document.getElementById('sector-table').innerHTML =
    '<tr><th>Sector</th><th>Symbols</th><th>Market Cap</th><th>Avg P/E</th><th>Avg Change %</th></tr>' +
    sectors.map(s =>
      `<tr><td>${s.sector}</td><td>${s.symbol_count}</td><td>${s.total_market_cap.toLocaleString()}</td>` +
      `<td>${fmt(s.average_pe)}</td>` + changeCell(s.average_daily_change_pct) + '</tr>'
    ).join('');
}

function renderChart() {
  if (!currentDetail) return;
  const series = currentDetail.series;
  const dates = series.map(p => p.date);
  const layout = {
    template: 'plotly_dark',
    paper_bgcolor: '#2d2d2d',
    plot_bgcolor: '#2d2d2d',
    font: { color: '#ecf0f1' },
    margin: { t: 40, r: 20 },
    title: currentChart === 'price'
      ? `${currentSymbol} Price Movement`
      : `${currentSymbol} Trading Volume`,
  };

  let traces;
  if (currentChart === 'price') {
    traces = [{
      type: 'candlestick',
      x: dates,
      open: series.map(p => p.open),
      high: series.map(p => p.high),
      low: series.map(p => p.low),
      close: series.map(p => p.close),
      name: 'Price',
    }];
    if (series.some(p => p.sma20 !== undefined)) {
      traces.push({ type: 'scatter', x: dates, y: series.map(p => p.sma20), name: '20-day MA', line: { color: 'orange' } });
    }
    if (series.some(p => p.sma50 !== undefined)) {
      traces.push({ type: 'scatter', x: dates, y: series.map(p => p.sma50), name: '50-day MA', line: { color: '#9b59b6' } });
    }
  } else {
    traces = [{ type: 'bar', x: dates, y: series.map(p => p.volume), name: 'Volume', marker: { color: '#3498db' } }];
  }
  Plotly.newPlot('chart', traces, layout, { responsive: true });
}

function renderSnapshot(snapshot) {
  const rows = [
    ['Daily Change %', fmt(snapshot.daily_change_pct)],
    ['SMA 20', fmt(snapshot.sma20)],
    ['SMA 50', fmt(snapshot.sma50)],
    ['SMA 200', fmt(snapshot.sma200)],
    ['RSI 14', fmt(snapshot.rsi14, 1)],
    ['MACD', fmt(snapshot.macd, 3)],
    ['Signal', snapshot.signal ?? '-'],
    ['P/E', fmt(snapshot.pe_ratio)],
    ['P/E vs Sector', fmt(snapshot.pe_vs_sector)],
    ['52W High', fmt(snapshot.fifty_two_week_high)],
    ['52W Low', fmt(snapshot.fifty_two_week_low)],
  ];
  document.getElementById('snapshot-table').innerHTML =
    '<table><tr>' + rows.map(([k]) => `<th>${k}</th>`).join('') + '</tr>' +
    '<tr>' + rows.map(([, v]) => `<td>${v}</td>`).join('') + '</tr></table>';
}

function setChart(kind) {
  currentChart = kind;
  document.getElementById('btn-price').classList.toggle('active', kind === 'price');
  document.getElementById('btn-volume').classList.toggle('active', kind === 'volume');
  renderChart();
}

async function selectSymbol(ticker) {
  currentSymbol = ticker;
  currentDetail = await getJson(`/api/symbols/${ticker}`);
  renderSnapshot(currentDetail.snapshot);
  renderChart();
}

async function init() {
  const [overview, sectors, symbols] = await Promise.all([
    getJson('/api/overview'),
    getJson('/api/sectors'),
    getJson('/api/symbols'),
  ]);
  renderOverview(overview);
  renderSectors(sectors);

  const selector = document.getElementById('symbol-selector');
  selector.innerHTML = symbols
    .map(s => `<option value="${s.ticker}">${s.name} (${s.ticker})</option>`)
    .join('');
  selector.onchange = () => selectSymbol(selector.value);
  if (symbols.length > 0) await selectSymbol(symbols[0].ticker);
}

init().catch(err => {
  document.getElementById('metric-cards').innerHTML =
    `<div class="metric-card"><h3>Error</h3><p>${err.message}</p></div>`;
});
</script>
</body>
</html>
"#;
