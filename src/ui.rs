use crate::state::{Status, Tab};
use chrono::{DateTime, NaiveDateTime};

pub fn render_page(active: Tab, status: Option<&Status>, body: &str) -> String {
    let (status_text, status_class, status_timeout) = match status {
        Some(status) => (
            escape(&status.message),
            format!("small show {}", status.severity.class()),
            status.severity.dismiss_after_ms(),
        ),
        None => (String::new(), "small".to_string(), 0),
    };

    fill(
        PAGE_HTML,
        &[
            ("{{TABS}}", &render_tabs(active)),
            ("{{STATUS_CLASS}}", status_class.trim_end()),
            ("{{STATUS_TIMEOUT}}", &status_timeout.to_string()),
            ("{{STATUS}}", &status_text),
            ("{{VIEW}}", body),
        ],
    )
}

/// Single pass over the template so that slot-like text inside inserted values is
/// never expanded.
fn fill(template: &str, slots: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match slots.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push_str("{{");
                rest = &tail[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn render_tabs(active: Tab) -> String {
    Tab::ALL
        .iter()
        .map(|tab| {
            let class = if *tab == active { "tab active" } else { "tab" };
            format!(
                r#"<form method="post" action="/tab/{slug}"><button class="{class}" type="submit" aria-label="{label}"><span class="ico" aria-hidden="true">{icon}</span><span class="lbl">{label}</span></button></form>"#,
                slug = tab.slug(),
                label = tab.label(),
                icon = tab.icon(),
            )
        })
        .collect()
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

pub fn multiline(text: &str) -> String {
    escape(text).replace('\n', "<br>")
}

pub fn preview(text: &str, limit: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(limit).collect();
    if chars.next().is_some() {
        format!("{}…", escape(&head))
    } else {
        escape(&head)
    }
}

pub fn notice(message: &str) -> String {
    format!(r#"<p class="muted">{}</p>"#, escape(message))
}

pub fn timestamp(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return String::new();
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }
    escape(raw)
}

pub fn go_button(tab: Tab, label: &str, primary: bool) -> String {
    let class = if primary { "btn primary" } else { "btn" };
    format!(
        r#"<form method="post" action="/tab/{}" class="inline"><button class="{class}" type="submit">{}</button></form>"#,
        tab.slug(),
        escape(label)
    )
}

pub fn post_button(action: &str, label: &str, class: &str) -> String {
    format!(
        r#"<form method="post" action="{}" class="inline"><button class="{class}" type="submit">{}</button></form>"#,
        escape(action),
        escape(label)
    )
}

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Secrets of Decoupage</title>
  <style>
    :root {
      --bg: #fbf6ef;
      --ink: #2d2926;
      --muted: #7a716a;
      --accent: #b5651d;
      --accent-2: #6d4c41;
      --line: rgba(109, 76, 65, 0.16);
      --card: rgba(255, 255, 255, 0.92);
      --danger: #b3261e;
      --success: #2e7d32;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      padding: 18px 14px 96px;
    }

    main {
      width: min(760px, 100%);
      margin: 0 auto;
      background: var(--card);
      border-radius: 22px;
      border: 1px solid var(--line);
      padding: 22px;
    }

    h2, h3 {
      font-family: "Georgia", serif;
      margin: 0 0 10px;
    }

    .list, .grid {
      display: grid;
      gap: 12px;
    }

    .item {
      border: 1px solid var(--line);
      border-radius: 16px;
      padding: 14px;
      margin-bottom: 12px;
      background: white;
    }

    .item.highlight {
      border-color: var(--accent);
      box-shadow: 0 0 0 3px rgba(181, 101, 29, 0.18);
    }

    .meta, .row {
      display: flex;
      justify-content: space-between;
      align-items: center;
      gap: 10px;
      flex-wrap: wrap;
    }

    .pill {
      border-radius: 999px;
      padding: 3px 10px;
      font-size: 0.8rem;
      background: rgba(109, 76, 65, 0.1);
    }

    .small {
      font-size: 0.85rem;
    }

    .muted {
      color: var(--muted);
    }

    form.inline {
      display: inline;
    }

    input, textarea, select {
      width: 100%;
      border: 1px solid var(--line);
      border-radius: 12px;
      padding: 10px;
      font: inherit;
      margin-bottom: 8px;
    }

    .btn {
      appearance: none;
      border: 1px solid var(--line);
      border-radius: 999px;
      padding: 9px 16px;
      background: white;
      font: inherit;
      cursor: pointer;
      text-decoration: none;
      color: var(--ink);
    }

    .btn.primary {
      background: var(--accent);
      border-color: var(--accent);
      color: white;
    }

    .btn.danger {
      border-color: var(--danger);
      color: var(--danger);
    }

    .code {
      font-family: ui-monospace, Menlo, Consolas, monospace;
    }

    #statusBar {
      position: fixed;
      left: 50%;
      bottom: 84px;
      transform: translateX(-50%);
      background: var(--ink);
      color: white;
      border-radius: 14px;
      padding: 10px 16px;
      opacity: 0;
      transition: opacity 200ms ease;
      pointer-events: none;
    }

    #statusBar.show {
      opacity: 1;
    }

    #statusBar.danger {
      background: var(--danger);
    }

    #statusBar.success {
      background: var(--success);
    }

    nav#tabs {
      position: fixed;
      left: 0;
      right: 0;
      bottom: 0;
      display: flex;
      justify-content: space-around;
      background: white;
      border-top: 1px solid var(--line);
      padding: 6px 4px;
    }

    .tab {
      appearance: none;
      border: none;
      background: none;
      display: grid;
      justify-items: center;
      font: inherit;
      font-size: 0.8rem;
      color: var(--muted);
      cursor: pointer;
    }

    .tab.active {
      color: var(--accent);
      font-weight: 600;
    }

    .tab .ico {
      font-size: 1.3rem;
    }
  </style>
</head>
<body>
  <main id="view">
{{VIEW}}
  </main>
  <div id="statusBar" class="{{STATUS_CLASS}}" data-timeout="{{STATUS_TIMEOUT}}" role="status">{{STATUS}}</div>
  <nav id="tabs">{{TABS}}</nav>
  <script>
    const statusEl = document.getElementById('statusBar');
    const timeout = Number(statusEl.dataset.timeout || 0);
    if (timeout > 0) {
      setTimeout(() => statusEl.classList.remove('show'), timeout);
    }

    const focused = document.querySelector('[data-focus]');
    if (focused) {
      setTimeout(() => focused.scrollIntoView({ behavior: 'smooth', block: 'start' }), 80);
    }
  </script>
</body>
</html>
"#;
