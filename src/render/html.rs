use crate::model::ReportData;

/// Benchmark summary page: run totals plus sortable per-input, per-step and
/// runtime tables, with the report data inlined at `__DATA__`.
pub fn render_html_report(data: &ReportData) -> anyhow::Result<String> {
    // `</` inside a string literal would close the script element early.
    let json = serde_json::to_string(data)?.replace("</", "<\\/");

    const TEMPLATE: &str = r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Workflow Benchmarks</title>
<style>
  body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 0; }
  header { padding: 12px 16px; border-bottom: 1px solid #ddd; }
  main { padding: 12px 16px; }
  section { margin-bottom: 28px; }

  .summary { display: flex; gap: 16px; flex-wrap: wrap; font-size: 14px; color: #333; }
  .pill { padding: 4px 8px; border: 1px solid #ddd; border-radius: 999px; background: #fafafa; }
  .muted { color: #777; font-size: 12px; }

  table { border-collapse: collapse; width: 100%; margin-top: 8px; }
  th, td { border-bottom: 1px solid #eee; padding: 6px 8px; text-align: left; font-size: 14px; }
  th { position: sticky; top: 0; background: white; border-bottom: 1px solid #ddd; cursor: pointer; user-select: none; }
  th:hover { background: #f3f3f3; }
  .num { text-align: right; font-variant-numeric: tabular-nums; }
  code { font-family: ui-monospace, SFMono-Regular, Menlo, Consolas, monospace; font-size: 13px; }
</style>
</head>
<body>
<header>
  <div class="summary" id="summary"></div>
</header>

<main>
  <section>
    <h2>Per input</h2>
    <div class="muted">peak memory: max over steps; allocations and time: summed over steps</div>
    <table id="inputs"></table>
  </section>

  <section>
    <h2>Per step</h2>
    <div class="muted">peak memory: summed over inputs; time: slowest input</div>
    <table id="steps"></table>
  </section>

  <section>
    <h2>Runtime per input and step (s)</h2>
    <table id="runtime"></table>
  </section>
</main>

<script>
// Embedded report data (JSON object literal)
const DATA = __DATA__;

function fmt(x, digits) {
  if (x === null || x === undefined) return "";
  return Number(x).toFixed(digits);
}

function escapeHtml(s) {
  return String(s)
    .replaceAll("&", "&amp;")
    .replaceAll("<", "&lt;")
    .replaceAll(">", "&gt;")
    .replaceAll('"', "&quot;")
    .replaceAll("'", "&#39;");
}

function renderSummary() {
  const t = DATA.totals;
  const el = document.getElementById("summary");
  el.innerHTML = `
    <span class="pill">records: <b>${t.records}</b></span>
    <span class="pill">inputs: <b>${t.inputs}</b></span>
    <span class="pill">steps: <b>${t.steps}</b></span>
    <span class="pill">total run time: <b>${fmt(t.total_runtime_min, 2)} min</b></span>
    <span class="pill">peak memory: <b>${fmt(t.peak_memory, 2)} MB</b></span>
  `;
}

// columns: [{ key, label, num, digits }]; rows: array of objects.
function renderTable(id, columns, rows) {
  const tbl = document.getElementById(id);
  const state = { key: null, desc: false };

  function draw() {
    const sorted = rows.slice();
    if (state.key !== null) {
      sorted.sort((a, b) => {
        const x = a[state.key], y = b[state.key];
        if (x === y) return 0;
        if (x === null || x === undefined) return 1;
        if (y === null || y === undefined) return -1;
        const c = x < y ? -1 : 1;
        return state.desc ? -c : c;
      });
    }

    const head = columns.map((c, i) => {
      const arrow = state.key === c.key ? (state.desc ? " ▾" : " ▴") : "";
      return `<th data-i="${i}" class="${c.num ? "num" : ""}">${escapeHtml(c.label)}${arrow}</th>`;
    }).join("");

    const body = sorted.map((r) => "<tr>" + columns.map((c) => {
      const v = r[c.key];
      return c.num
        ? `<td class="num">${fmt(v, c.digits)}</td>`
        : `<td><code>${escapeHtml(v)}</code></td>`;
    }).join("") + "</tr>").join("");

    tbl.innerHTML = `<thead><tr>${head}</tr></thead><tbody>${body}</tbody>`;
    for (const th of tbl.querySelectorAll("th")) {
      th.onclick = () => {
        const key = columns[Number(th.dataset.i)].key;
        if (state.key === key) state.desc = !state.desc;
        else { state.key = key; state.desc = false; }
        draw();
      };
    }
  }

  draw();
}

renderSummary();

renderTable("inputs", [
  { key: "input_name", label: "input" },
  { key: "file_size", label: "file size (MB)", num: true, digits: 3 },
  { key: "peak_memory", label: "peak memory (MB)", num: true, digits: 2 },
  { key: "total_allocation", label: "allocations", num: true, digits: 0 },
  { key: "time_duration", label: "time (s)", num: true, digits: 2 },
], DATA.inputs);

renderTable("steps", [
  { key: "process_name", label: "step" },
  { key: "peak_memory", label: "peak memory (MB)", num: true, digits: 2 },
  { key: "time_duration", label: "time (s)", num: true, digits: 2 },
], DATA.steps);

const runtimeColumns = [{ key: "input_name", label: "input" }]
  .concat(DATA.runtime.steps.map((s, i) => ({ key: "s" + i, label: s, num: true, digits: 2 })))
  .concat([{ key: "file_size", label: "file size (MB)", num: true, digits: 3 }]);
const runtimeRows = DATA.runtime.rows.map((r) => {
  const out = { input_name: r.input_name, file_size: r.file_size };
  r.durations.forEach((d, i) => { out["s" + i] = d; });
  return out;
});
renderTable("runtime", runtimeColumns, runtimeRows);
</script>
</body>
</html>
"#;

    Ok(TEMPLATE.replace("__DATA__", &json))
}
