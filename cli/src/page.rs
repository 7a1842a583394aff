use std::collections::HashMap;
use std::fmt::Write as _;

use chrono::Utc;

use frond_core::catalog::{group_by_category, image_candidates};
use frond_core::guide::{category_heading, escape_html};
use frond_core::humidity::infer_humidity;
use frond_core::models::Plant;
use frond_core::schedule::{DueStatus, ScheduleState, ScheduleView};

/// Shown wherever schedule controls would be when no store is configured.
const STORE_HINT: &str = "Connect the watering store (set SUPABASE_URL and \
                          SUPABASE_ANON_KEY) to enable watering schedules.";

/// Render the full catalog page. `views` is joined to `plants` by name;
/// a plant without a view gets a local placeholder so the page never
/// renders half a card.
pub(crate) fn render(
    plants: &[Plant],
    views: &[ScheduleView],
    store_available: bool,
    cute_mode: bool,
) -> String {
    let by_name: HashMap<&str, &ScheduleView> =
        views.iter().map(|v| (v.plant_name.as_str(), v)).collect();

    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n");
    let _ = writeln!(
        out,
        "<html lang=\"en\"{}>",
        if cute_mode { " class=\"cute\"" } else { "" }
    );
    out.push_str("<head>\n");
    out.push_str("<meta charset=\"UTF-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    out.push_str("<title>Frond</title>\n");
    out.push_str("<style>");
    out.push_str(STYLE);
    out.push_str("</style>\n");
    out.push_str("</head>\n<body>\n");

    out.push_str("<header>\n");
    out.push_str("  <span class=\"brand\">🌿 Frond</span>\n");
    out.push_str("  <span class=\"tagline\">know when to water.</span>\n");
    let _ = writeln!(
        out,
        "  <button id=\"cute-toggle\" type=\"button\" title=\"Toggle Super Cute Mode\" \
         aria-pressed=\"{cute_mode}\">{}</button>",
        cute_button_text(cute_mode)
    );
    out.push_str("</header>\n<main>\n");

    if !store_available {
        let _ = writeln!(out, "<div class=\"notice\">{STORE_HINT}</div>");
    }

    if plants.is_empty() {
        out.push_str("<p class=\"empty\">The catalog is empty.</p>\n");
    }

    for (category, members) in &group_by_category(plants) {
        let _ = writeln!(out, "<section>\n<h2>{}</h2>", escape_html(&category_heading(category)));
        out.push_str("<div class=\"grid\">\n");
        for plant in members {
            match by_name.get(plant.name.as_str()) {
                Some(view) => push_card(&mut out, plant, view, store_available),
                None => {
                    let state = ScheduleState::placeholder(&plant.name, &plant.category);
                    let view = ScheduleView::build(&state, &plant.notes, Utc::now());
                    push_card(&mut out, plant, &view, store_available);
                }
            }
        }
        out.push_str("</div>\n</section>\n");
    }

    out.push_str("</main>\n<script>");
    out.push_str(SCRIPT);
    out.push_str("</script>\n</body>\n</html>\n");
    out
}

pub(crate) fn cute_button_text(cute_mode: bool) -> &'static str {
    if cute_mode { "✨ Super Cute On" } else { "✨ Super Cute" }
}

/// CSS/JS token for a status, matching the serde kebab-case rendering of
/// [`DueStatus`] so server-rendered chips and script-applied chips agree.
fn status_class(status: DueStatus) -> &'static str {
    match status {
        DueStatus::NoSchedule => "no-schedule",
        DueStatus::Overdue => "overdue",
        DueStatus::Soon => "soon",
        DueStatus::Scheduled => "scheduled",
    }
}

fn push_card(out: &mut String, plant: &Plant, view: &ScheduleView, store_available: bool) {
    let name = escape_html(&plant.name);
    let _ = writeln!(out, "<article class=\"card\" data-plant=\"{name}\">");

    out.push_str("  <div class=\"photo\">\n");
    out.push_str("    <div class=\"glyph\">🌱</div>\n");
    let candidates = image_candidates(plant);
    if let Some(first) = candidates.first() {
        let _ = writeln!(
            out,
            "    <img src=\"/{}\" alt=\"{name}\" data-candidates=\"{}\" data-index=\"0\" \
             onerror=\"nextImage(this)\">",
            escape_html(first),
            escape_html(&candidates.join("|"))
        );
    }
    out.push_str("  </div>\n");

    out.push_str("  <div class=\"body\">\n");
    let _ = writeln!(out, "    <h3>{name}</h3>");
    out.push_str("    <ul class=\"care\">\n");
    let _ = writeln!(out, "      <li>☀️ <strong>Light:</strong> {}</li>", escape_html(&plant.light));
    let _ = writeln!(out, "      <li>💧 <strong>Water:</strong> {}</li>", escape_html(&plant.water));
    if !plant.notes.is_empty() {
        let _ = writeln!(out, "      <li>🌱 <strong>Notes:</strong> {}</li>", escape_html(&plant.notes));
    }
    let humidity = infer_humidity(&plant.notes, &plant.category);
    let _ = writeln!(
        out,
        "      <li>💨 <strong>Humidity:</strong> <span class=\"chip chip-{}\">{}</span></li>",
        humidity.label(),
        humidity.display_label()
    );
    out.push_str("    </ul>\n");

    out.push_str("    <div class=\"watering\">\n");
    let _ = writeln!(
        out,
        "      <div class=\"head\"><strong>Watering</strong> \
         <span class=\"status status-{}\" data-role=\"status\">{}</span></div>",
        status_class(view.status),
        view.status_label
    );
    if store_available {
        out.push_str("      <div class=\"summary\">\n");
        let _ = writeln!(
            out,
            "        <span data-role=\"interval-label\">Interval: {}d</span>",
            view.interval_days
        );
        let _ = writeln!(
            out,
            "        <span data-role=\"last\">Last: {}</span>",
            view.last_watered_display
        );
        let _ = writeln!(
            out,
            "        <span data-role=\"next\"{}>Next: {}</span>",
            if view.overdue { " class=\"overdue\"" } else { "" },
            view.next_due_display
        );
        out.push_str("      </div>\n");
        out.push_str("      <div class=\"controls\">\n");
        let _ = writeln!(
            out,
            "        <label>Interval</label> <input type=\"number\" min=\"1\" value=\"{}\" \
             data-role=\"interval\">",
            view.interval_days
        );
        out.push_str("        <button type=\"button\" class=\"water\" data-role=\"water\">Mark watered</button>\n");
        out.push_str("        <button type=\"button\" class=\"snooze\" data-role=\"snooze\">Snooze 2d</button>\n");
        out.push_str("      </div>\n");
        let _ = writeln!(
            out,
            "      <div class=\"error\" data-role=\"error\">{}</div>",
            escape_html(view.load_error.as_deref().unwrap_or(""))
        );
    } else {
        let _ = writeln!(out, "      <p class=\"muted\">{STORE_HINT}</p>");
    }
    out.push_str("    </div>\n");
    out.push_str("  </div>\n");
    out.push_str("</article>\n");
}

const STYLE: &str = r##"
* { box-sizing: border-box; }
body {
  margin: 0; padding: 0 0 48px;
  font-family: "Segoe UI", system-ui, sans-serif;
  background: #f0f7f2; color: #1f2937;
}
header {
  position: sticky; top: 0; z-index: 10;
  display: flex; align-items: baseline; gap: 12px;
  padding: 12px 24px;
  background: rgba(255, 255, 255, 0.85); backdrop-filter: blur(6px);
  border-bottom: 1px solid #d1fae5;
}
header .brand { font-size: 1.3rem; font-weight: 700; color: #047857; }
header .tagline { font-size: 0.8rem; color: #6b7280; }
#cute-toggle {
  margin-left: auto; border: none; cursor: pointer;
  padding: 6px 14px; border-radius: 999px;
  background: #d1fae5; color: #065f46; font-size: 0.9rem;
}
main { max-width: 1200px; margin: 0 auto; padding: 24px; }
.notice {
  background: #fef3c7; border: 1px solid #fcd34d; color: #92400e;
  border-radius: 8px; padding: 10px 14px; margin-bottom: 24px;
}
h2 {
  color: #047857; border-bottom: 1px solid #a7f3d0;
  padding-bottom: 8px; margin: 32px 0 16px;
}
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(280px, 1fr)); gap: 20px; }
.card {
  background: #fff; border: 1px solid #e5e7eb; border-radius: 12px;
  overflow: hidden; display: flex; flex-direction: column;
}
.photo { position: relative; aspect-ratio: 3 / 4; background: #f8fafc; }
.photo .glyph {
  position: absolute; inset: 0; display: flex;
  align-items: center; justify-content: center; font-size: 3rem;
}
.photo img {
  position: absolute; inset: 0; width: 100%; height: 100%;
  object-fit: contain; padding: 4px; background: #fff;
}
.card .body { padding: 14px; display: flex; flex-direction: column; gap: 10px; flex: 1; }
.card h3 { margin: 0; color: #065f46; }
.care { list-style: none; margin: 0; padding: 0; font-size: 0.88rem; }
.care li { margin-bottom: 4px; }
.chip {
  padding: 2px 8px; border-radius: 999px; font-size: 0.72rem;
  border: 1px solid #a7f3d0; background: #ecfdf5; color: #047857;
}
.chip-moderate { background: #dcfce7; color: #166534; }
.chip-high { background: #fce7f3; border-color: #fbcfe8; color: #be185d; }
.watering {
  margin-top: auto; border: 1px solid #e5e7eb; border-radius: 8px;
  padding: 10px; background: #fff; font-size: 0.85rem;
}
.watering .head { display: flex; align-items: center; justify-content: space-between; margin-bottom: 8px; }
.status {
  padding: 2px 8px; border-radius: 999px; font-size: 0.7rem;
  background: #fef3c7; color: #92400e;
}
.status-overdue { background: #ffe4e6; color: #9f1239; }
.status-soon { background: #fef9c3; color: #854d0e; }
.status-scheduled { background: #d1fae5; color: #065f46; }
.summary { display: grid; grid-template-columns: 1fr 1fr; gap: 4px; margin-bottom: 8px; }
.summary .overdue { color: #be123c; font-weight: 600; }
.controls { display: flex; align-items: center; gap: 8px; }
.controls label { color: #6b7280; }
.controls input { width: 64px; padding: 4px 6px; border: 1px solid #d1d5db; border-radius: 6px; }
.controls .water {
  margin-left: auto; border: none; cursor: pointer;
  background: #047857; color: #fff; padding: 6px 10px; border-radius: 6px; font-size: 0.78rem;
}
.controls .water:disabled { opacity: 0.6; }
.controls .snooze {
  border: 1px solid #d1d5db; background: #fff; cursor: pointer;
  padding: 6px 10px; border-radius: 6px; font-size: 0.78rem;
}
.error { color: #be123c; font-size: 0.78rem; margin-top: 6px; }
.error:empty { display: none; }
.muted { color: #6b7280; font-size: 0.8rem; margin: 0; }
.empty { color: #6b7280; text-align: center; padding: 48px 0; }
html.cute body { background: #fdf2f8; }
html.cute header { background: rgba(253, 242, 248, 0.9); border-bottom-color: #fbcfe8; }
html.cute #cute-toggle { background: #fbcfe8; color: #9d174d; }
html.cute h2 { color: #be185d; border-bottom-color: #fbcfe8; }
html.cute .card {
  border-color: #fbcfe8; border-radius: 18px;
  box-shadow: 0 4px 12px rgba(236, 72, 153, 0.12);
}
html.cute .photo { background: #fdf2f8; }
"##;

const SCRIPT: &str = r##"
function nextImage(img) {
  var list = (img.dataset.candidates || "").split("|").filter(Boolean);
  var next = Number(img.dataset.index || "0") + 1;
  if (next < list.length) {
    img.dataset.index = String(next);
    img.src = "/" + list[next];
  } else {
    img.style.display = "none";
  }
}

async function api(path, options) {
  var res = await fetch(path, options);
  var body = await res.json().catch(function () { return {}; });
  if (!res.ok) {
    throw new Error(body.error || "Request failed");
  }
  return body;
}

function setError(card, message) {
  card.querySelector('[data-role="error"]').textContent = message || "";
}

function applyView(card, view) {
  var chip = card.querySelector('[data-role="status"]');
  chip.textContent = view.status_label;
  chip.className = "status status-" + view.status;
  card.querySelector('[data-role="interval-label"]').textContent =
    "Interval: " + view.interval_days + "d";
  card.querySelector('[data-role="last"]').textContent = "Last: " + view.last_watered_display;
  var next = card.querySelector('[data-role="next"]');
  next.textContent = "Next: " + view.next_due_display;
  next.classList.toggle("overdue", view.overdue);
  card.querySelector('[data-role="interval"]').value = view.interval_days;
}

document.querySelectorAll(".card").forEach(function (card) {
  var water = card.querySelector('[data-role="water"]');
  if (!water) {
    return;
  }
  var plant = encodeURIComponent(card.dataset.plant);
  water.addEventListener("click", async function () {
    setError(card, "");
    water.disabled = true;
    water.textContent = "Saving…";
    try {
      applyView(card, await api("/api/waterings/" + plant + "/water", { method: "POST" }));
    } catch (e) {
      setError(card, e.message);
    } finally {
      water.disabled = false;
      water.textContent = "Mark watered";
    }
  });
  card.querySelector('[data-role="snooze"]').addEventListener("click", async function () {
    setError(card, "");
    try {
      applyView(card, await api("/api/waterings/" + plant + "/snooze", { method: "POST" }));
    } catch (e) {
      setError(card, e.message);
    }
  });
  var interval = card.querySelector('[data-role="interval"]');
  interval.addEventListener("change", async function () {
    var days = parseInt(interval.value, 10);
    if (!Number.isFinite(days) || days <= 0) {
      setError(card, "Interval days must be greater than 0");
      return;
    }
    setError(card, "");
    try {
      applyView(card, await api("/api/waterings/" + plant + "/interval", {
        method: "PUT",
        headers: { "content-type": "application/json" },
        body: JSON.stringify({ interval_days: days }),
      }));
    } catch (e) {
      setError(card, e.message);
    }
  });
});

var toggle = document.getElementById("cute-toggle");
toggle.addEventListener("click", async function () {
  var next = !document.documentElement.classList.contains("cute");
  try {
    var saved = await api("/api/settings", {
      method: "PUT",
      headers: { "content-type": "application/json" },
      body: JSON.stringify({ cute_mode: next }),
    });
    document.documentElement.classList.toggle("cute", saved.cute_mode);
    toggle.setAttribute("aria-pressed", String(saved.cute_mode));
    toggle.textContent = saved.cute_mode ? "✨ Super Cute On" : "✨ Super Cute";
  } catch (e) {
    // toggle failures leave the page as it was
  }
});
"##;
