use super::TipsData;
use crate::models::Tip;
use crate::state::{Focus, ViewState};
use crate::ui::{escape, multiline, notice, post_button, timestamp};

pub fn render(view: &ViewState, data: &TipsData, focus: Option<&Focus>) -> String {
    let search = view.trick_search.trim();
    let focused = match focus {
        Some(Focus::Tip(id)) => Some(id.as_str()),
        _ => None,
    };

    let (list, no_match) = match &data.tips {
        Err(_) => (notice("Couldn't load tips right now."), false),
        Ok(tips) => {
            let shown: Vec<&Tip> = tips.iter().filter(|tip| tip.matches(search)).collect();
            let items: String = shown
                .iter()
                .map(|tip| tip_item(tip, focused, view.is_admin()))
                .collect();
            (items, !search.is_empty() && shown.is_empty())
        }
    };

    let mut html = format!(
        r#"<h2>Tips</h2>
<p>Quick techniques, glue tips, surface prep, and "what went wrong".</p>
<div class="item">
<h3>Q&amp;A (search + ask)</h3>
<form method="post" action="/tips/search"><input name="q" placeholder="Search tips or type your question…" value="{value}"><button class="btn" type="submit">Search</button></form>
<div class="row">{clear}{ask}</div>
<p class="small muted">If you can't find an answer, tap <b>Ask</b>. Your question stays in Community so others (and we) can answer.</p>
{hint}
</div>
<div class="list">{list}</div>
"#,
        value = escape(&view.trick_search),
        clear = post_button("/tips/search/clear", "Clear", "btn"),
        ask = post_button("/tips/ask", "Ask in Community", "btn primary"),
        hint = if no_match {
            r#"<p class="muted">No matching tips. Tap <b>Ask in Community</b> to post this question.</p>"#
        } else {
            ""
        },
    );

    if view.is_admin() {
        html.push_str(
            r#"<div class="item" id="new-tip">
<h3>Add tip (Admin)</h3>
<form method="post" action="/tips">
<input name="title" placeholder="Title">
<textarea name="body" placeholder="Body"></textarea>
<input name="media_url" placeholder="Media URL (optional)">
<div class="row"><label class="small"><input type="checkbox" name="is_vip" value="on" style="width:auto"> VIP only</label><button class="btn primary" type="submit">Publish</button></div>
</form>
</div>
"#,
        );
    } else if view.me.is_none() {
        html.push_str(r#"<p class="small">Log in to see VIP tips (if your account is VIP).</p>"#);
    }
    html
}

fn tip_item(tip: &Tip, focused: Option<&str>, admin: bool) -> String {
    let id = tip.id.to_string();
    let is_focused = focused == Some(id.as_str());
    let media = tip
        .media_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .map(|url| format!(r#"<a class="link" rel="noreferrer" href="{}">Open media</a>"#, escape(url)))
        .unwrap_or_default();
    let delete = if admin {
        post_button(&format!("/tips/{id}/delete"), "Delete", "btn danger")
    } else {
        String::new()
    };
    format!(
        r#"<div class="item{highlight}" id="trick-{anchor}"{focus}>
<div class="meta"><div><b>{title}</b>{vip}</div><div class="small">{when}</div></div>
<p>{body}</p>
{media}{delete}
</div>
"#,
        highlight = if is_focused { " highlight" } else { "" },
        anchor = escape(&id),
        focus = if is_focused { " data-focus" } else { "" },
        title = escape(&tip.title),
        vip = if tip.is_vip { r#" <span class="pill">VIP</span>"# } else { "" },
        when = timestamp(tip.created_at.as_deref()),
        body = multiline(&tip.body),
    )
}
