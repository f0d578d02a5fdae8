use super::HomeData;
use crate::classify::PostKind;
use crate::models::{Post, Tip};
use crate::state::{Tab, ViewState};
use crate::ui::{escape, go_button, notice, post_button, preview};

const TIPS_FAILED: &str = "Couldn't load tips right now.";
const POSTS_FAILED: &str = "Couldn't load community posts right now.";
const PREVIEW_CHARS: usize = 160;

pub fn render(view: &ViewState, data: &HomeData) -> String {
    let mut html = String::from(
        "<h2>Secrets of Decoupage</h2>\n<p>Your daily dose of decoupage: tips, projects and our community.</p>\n",
    );

    html.push_str(&tip_of_day(data));
    html.push_str(&latest_tips(view, data));
    html.push_str(&highlights(view, data));
    html.push_str(&questions(view, data));
    if view.me.is_none() {
        html.push_str(&gallery(data));
    }
    html
}

fn title_or<'a>(title: &'a str, fallback: &'a str) -> &'a str {
    if title.trim().is_empty() { fallback } else { title }
}

fn tip_of_day(data: &HomeData) -> String {
    let content = match (&data.tips, &data.tip_of_day) {
        (Err(_), _) => notice(TIPS_FAILED),
        (Ok(_), None) => notice("No tips yet."),
        (Ok(_), Some(tip)) => format!(
            r#"<div><b>{title}</b>{vip}</div>
<p>{body}</p>
<div class="row">{open}{refresh}</div>"#,
            title = escape(title_or(&tip.title, "Tip")),
            vip = if tip.is_vip { r#" <span class="pill">VIP</span>"# } else { "" },
            body = preview(&tip.body, PREVIEW_CHARS),
            open = post_button(&format!("/tips/{}/open", tip.id), "Read tip", "btn primary"),
            refresh = post_button("/tip-of-day/refresh", "Another tip", "btn"),
        ),
    };
    format!(
        r#"<div class="item" id="tip-of-day">
<div class="meta"><div><b>Tip of the day</b></div><span class="pill">Today</span></div>
{content}
</div>
"#
    )
}

fn latest_tips(view: &ViewState, data: &HomeData) -> String {
    let content = match &data.tips {
        Err(_) => notice(TIPS_FAILED),
        Ok(tips) => {
            let list = if tips.is_empty() {
                notice("No tips yet.")
            } else {
                let items: String = tips.iter().take(4).map(tip_row).collect();
                format!(r#"<div class="list">{items}</div>"#)
            };
            let add = if view.is_admin() {
                go_button(Tab::Tips, "Add tip", true)
            } else {
                String::new()
            };
            format!(
                r#"{list}<div class="row">{all}{add}</div>"#,
                all = go_button(Tab::Tips, "See all tips", false),
            )
        }
    };
    format!(
        r#"<div class="item">
<div class="meta"><div><b>Latest tips</b></div></div>
{content}
</div>
"#
    )
}

fn tip_row(tip: &Tip) -> String {
    format!(
        r#"<div class="item"><div class="meta"><div><b>{title}</b>{vip}</div>{open}</div></div>"#,
        title = escape(title_or(&tip.title, "Tip")),
        vip = if tip.is_vip { r#" <span class="small muted">VIP</span>"# } else { "" },
        open = post_button(&format!("/tips/{}/open", tip.id), "Open", "btn"),
    )
}

fn highlights(view: &ViewState, data: &HomeData) -> String {
    let content = match &data.posts {
        Err(_) => notice(POSTS_FAILED),
        Ok(posts) => {
            let list = if posts.is_empty() {
                notice("No posts yet. Be the first to share a project!")
            } else {
                let items: String = posts.iter().take(2).map(highlight_row).collect();
                format!(r#"<div class="list">{items}</div>"#)
            };
            let share = if view.me.is_some() {
                post_button("/community/compose/work", "Add your work", "btn primary")
            } else {
                go_button(Tab::Account, "Log in to share", true)
            };
            format!(
                r#"{list}<div class="row">{open}{share}</div>"#,
                open = post_button("/community/browse/works", "Open community", "btn"),
            )
        }
    };
    let pill = match &data.posts {
        Ok(posts) if !posts.is_empty() => "New",
        _ => "—",
    };
    format!(
        r#"<div class="item" id="highlights">
<div class="meta"><div><b>Community highlights</b></div><span class="pill">{pill}</span></div>
{content}
</div>
"#
    )
}

fn highlight_row(post: &Post) -> String {
    let image = post
        .image_url
        .as_deref()
        .map(|url| {
            format!(
                r#"<div><a href="{}" target="_blank" rel="noreferrer">View image</a></div>"#,
                escape(url)
            )
        })
        .unwrap_or_default();
    format!(
        r#"<div class="item"><div class="small muted">{author}</div><div>{text}</div>{image}</div>"#,
        author = escape(post.author()),
        text = preview(post.display_text(), PREVIEW_CHARS),
    )
}

fn questions(view: &ViewState, data: &HomeData) -> String {
    let content = match &data.posts {
        Err(_) => notice(POSTS_FAILED),
        Ok(posts) => {
            let asked: Vec<&Post> = posts
                .iter()
                .filter(|post| post.kind() == PostKind::Question)
                .take(5)
                .collect();
            let list = if asked.is_empty() {
                notice("No questions yet. Ask something and others can help.")
            } else {
                let items: String = asked.into_iter().map(question_row).collect();
                format!(r#"<div class="list">{items}</div>"#)
            };
            let ask = if view.me.is_some() {
                post_button("/community/compose/question", "Ask a question", "btn primary")
            } else {
                go_button(Tab::Account, "Log in to ask", true)
            };
            format!(
                r#"{list}<div class="row">{browse}{ask}</div>"#,
                browse = post_button("/community/browse/questions", "Browse questions", "btn"),
            )
        }
    };
    format!(
        r#"<div class="item" id="questions">
<div class="meta"><div><b>Questions &amp; Answers</b></div></div>
{content}
</div>
"#
    )
}

fn question_row(post: &Post) -> String {
    let text = post.display_text().trim();
    format!(
        r#"<div class="item"><div class="small muted">{author}</div><div>{text}</div><div class="row">{open}</div></div>"#,
        author = escape(post.author()),
        text = preview(if text.is_empty() { "Question" } else { text }, PREVIEW_CHARS),
        open = post_button(
            &format!("/community/posts/{}/answers/open", post.id),
            "Open answers",
            "btn"
        ),
    )
}

fn gallery(data: &HomeData) -> String {
    let content = match &data.posts {
        Err(_) => notice(POSTS_FAILED),
        Ok(posts) => {
            let pictures: Vec<&Post> = posts
                .iter()
                .filter(|post| post.kind() == PostKind::Work)
                .filter(|post| post.image_url.as_deref().is_some_and(|url| !url.trim().is_empty()))
                .take(6)
                .collect();
            let grid = if pictures.is_empty() {
                notice("No photos in the community yet. Be the first to share your work!")
            } else {
                let cells: String = pictures
                    .iter()
                    .map(|post| {
                        let url = escape(post.image_url.as_deref().unwrap_or_default());
                        format!(
                            r#"<a class="item" href="{url}" target="_blank" rel="noreferrer"><img src="{url}" alt="" style="width:100%;height:120px;object-fit:cover;"><div class="small">{}</div></a>"#,
                            escape(post.author())
                        )
                    })
                    .collect();
                format!(r#"<div class="grid" style="grid-template-columns:repeat(3,1fr);">{cells}</div>"#)
            };
            format!(
                "{grid}<div class=\"row\">{}</div>",
                go_button(Tab::Community, "Open Community", false)
            )
        }
    };
    format!(
        r#"<div class="item" id="gallery">
<div class="meta"><div><b>Your work</b></div></div>
{content}
</div>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::fixtures::{post, profile, tip};

    fn section<'a>(html: &'a str, id: &str) -> &'a str {
        let start = html
            .find(&format!(r#"id="{id}""#))
            .expect("section present");
        let rest = &html[start..];
        let end = rest.find("\n</div>\n").expect("section closed");
        &rest[..end]
    }

    #[test]
    fn failed_tips_only_blank_the_tip_sections() {
        let data = HomeData {
            tips: Err("boom".into()),
            posts: Ok(vec![
                post(1, "Q: which glue?", None),
                post(2, "WORK: my tray", Some("https://img/2.jpg")),
            ]),
            tip_of_day: None,
        };
        let html = render(&ViewState::default(), &data);

        assert!(section(&html, "tip-of-day").contains(&escape(TIPS_FAILED)));
        assert!(section(&html, "highlights").contains("which glue?"));
        assert!(!section(&html, "highlights").contains("Q: which"));
        assert!(!section(&html, "highlights").contains(&escape(POSTS_FAILED)));
        assert!(section(&html, "gallery").contains("https://img/2.jpg"));
        assert!(section(&html, "questions").contains("/community/posts/1/answers/open"));
        assert_eq!(html.matches(escape(TIPS_FAILED).as_str()).count(), 2);
    }

    #[test]
    fn failed_posts_keep_tips_visible() {
        let data = HomeData {
            tips: Ok(vec![tip(1, "Glass"), tip(2, "Wood")]),
            posts: Err("boom".into()),
            tip_of_day: Some(tip(2, "Wood")),
        };
        let html = render(&ViewState::default(), &data);

        assert!(section(&html, "tip-of-day").contains("Wood"));
        assert!(section(&html, "tip-of-day").contains("/tips/2/open"));
        assert!(section(&html, "highlights").contains(&escape(POSTS_FAILED)));
        assert!(!html.contains(&escape(TIPS_FAILED)));
    }

    #[test]
    fn gallery_skips_questions_and_blank_images() {
        let data = HomeData {
            tips: Ok(Vec::new()),
            posts: Ok(vec![
                post(1, "Q: is this glue ok?", Some("https://img/question.jpg")),
                post(2, "Finished box", Some("")),
                post(3, "Finished tray", Some("https://img/tray.jpg")),
            ]),
            tip_of_day: None,
        };
        let html = render(&ViewState::default(), &data);
        let gallery = section(&html, "gallery");
        assert!(gallery.contains("https://img/tray.jpg"));
        assert!(!gallery.contains("https://img/question.jpg"));
        assert!(!gallery.contains(r#"src="""#));
    }

    #[test]
    fn question_section_offers_compose_only_when_signed_in() {
        let data = HomeData {
            tips: Ok(Vec::new()),
            posts: Ok(vec![post(4, "Q: rice paper tears", None), post(5, "Tray", None)]),
            tip_of_day: None,
        };
        let anonymous = render(&ViewState::default(), &data);
        let asked = section(&anonymous, "questions");
        assert!(asked.contains("rice paper tears"));
        assert!(!asked.contains("Q: rice"));
        assert!(!asked.contains("/community/posts/5/answers/open"));
        assert!(asked.contains("Log in to ask"));
        assert!(!asked.contains("/community/compose/question"));

        let mut view = ViewState::default();
        view.me = Some(profile(false, false));
        let html = render(&view, &data);
        assert!(section(&html, "questions").contains("/community/compose/question"));
        assert!(section(&html, "highlights").contains("/community/compose/work"));
    }

    #[test]
    fn admins_get_an_add_tip_shortcut_and_no_gallery() {
        let mut view = ViewState::default();
        view.me = Some(profile(true, false));
        let data = HomeData {
            tips: Ok(vec![tip(1, "Glass")]),
            posts: Ok(Vec::new()),
            tip_of_day: Some(tip(1, "Glass")),
        };
        let html = render(&view, &data);
        assert!(html.contains("Add tip"));
        assert!(!html.contains(r#"id="gallery""#));
    }
}
