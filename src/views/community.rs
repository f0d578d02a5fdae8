use super::CommunityData;
use crate::classify::{CommunityFilter, PostKind};
use crate::models::{Comment, Post};
use crate::state::{Focus, ViewState};
use crate::ui::{escape, multiline, notice, post_button, timestamp};

pub fn render(view: &ViewState, data: &CommunityData, focus: Option<&Focus>) -> String {
    let mut html = String::from(
        "<h2>Community</h2>\n<p>Ask questions and share finished projects. Add a photo from your phone (JPG/PNG) or paste a URL.</p>\n",
    );
    html.push_str(&filter_bar(view.community_filter));

    if view.me.is_some() {
        let compose = match focus {
            Some(Focus::Compose(kind)) => Some(*kind),
            _ => None,
        };
        html.push_str(&new_post_form(compose));
    } else {
        html.push_str(r#"<p class="small">Log in to create posts and comments.</p>"#);
    }

    match &data.posts {
        Err(_) => html.push_str(&notice("Couldn't load community posts right now.")),
        Ok(posts) => {
            let shown: Vec<&Post> = posts
                .iter()
                .filter(|post| view.community_filter.admits(post.kind()))
                .collect();
            if shown.is_empty() {
                html.push_str(&notice("No posts here yet."));
            }
            html.push_str(r#"<div class="list">"#);
            for post in shown {
                html.push_str(&post_item(view, post, data));
            }
            html.push_str("</div>\n");
        }
    }
    html
}

fn filter_bar(active: CommunityFilter) -> String {
    let buttons: String = [
        (CommunityFilter::All, "All"),
        (CommunityFilter::Questions, "Questions"),
        (CommunityFilter::Works, "Works"),
    ]
    .iter()
    .map(|(filter, label)| {
        let class = if *filter == active { "btn primary" } else { "btn" };
        format!(
            r#"<form method="post" action="/community/filter" class="inline"><input type="hidden" name="filter" value="{}"><button class="{class}" type="submit">{label}</button></form>"#,
            filter.as_str()
        )
    })
    .collect();
    format!("<div class=\"row\" id=\"filters\">{buttons}</div>\n")
}

/// The composer; a compose deep link preselects its kind and takes the focus.
fn new_post_form(compose: Option<PostKind>) -> String {
    let kind = compose.unwrap_or(PostKind::Work);
    let checked = |option: PostKind| if option == kind { " checked" } else { "" };
    let (focus, autofocus) = match compose {
        Some(_) => (" data-focus", " autofocus"),
        None => ("", ""),
    };
    format!(
        r#"<div class="item" id="new-post"{focus}>
<h3>New post</h3>
<form method="post" action="/community/posts" enctype="multipart/form-data">
<div class="row">
<label class="small"><input type="radio" name="kind" value="question" style="width:auto"{question}> Question</label>
<label class="small"><input type="radio" name="kind" value="work" style="width:auto"{work}> My work</label>
</div>
<textarea name="text" placeholder="What did you make? Or what would you like to ask?"{autofocus}></textarea>
<input name="file" type="file" accept="image/*">
<input name="image_url" placeholder="Image URL (optional)">
<button class="btn primary" type="submit">Post</button>
</form>
</div>
"#,
        question = checked(PostKind::Question),
        work = checked(PostKind::Work),
    )
}

fn post_item(view: &ViewState, post: &Post, data: &CommunityData) -> String {
    let id = post.id.to_string();
    let image = post
        .image_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .map(|url| format!(r#"<a class="link" rel="noreferrer" href="{}">Open image</a>"#, escape(url)))
        .unwrap_or_default();
    let kind = post.kind().label();

    let expanded = data
        .comments
        .as_ref()
        .filter(|(post_id, _)| *post_id == id)
        .map(|(_, comments)| comments_block(view, &id, comments))
        .unwrap_or_default();
    let focus = if expanded.is_empty() { "" } else { " data-focus" };

    format!(
        r#"<div class="item" id="post-{anchor}"{focus}>
<div class="meta"><div><span class="pill">{author}</span> <span class="pill">{kind}</span></div><div class="small">{when}</div></div>
<p>{text}</p>
{image}
<div>{toggle}</div>
{expanded}</div>
"#,
        anchor = escape(&id),
        author = escape(post.author()),
        when = timestamp(post.created_at.as_deref()),
        text = multiline(post.display_text()),
        toggle = post_button(&format!("/community/posts/{id}/comments/open"), "Comments", "btn"),
    )
}

fn comments_block(view: &ViewState, post_id: &str, comments: &Result<Vec<Comment>, String>) -> String {
    let mut html = String::from(r#"<div class="comments">"#);
    match comments {
        Err(_) => html.push_str(&notice("Couldn't load comments right now.")),
        Ok(comments) if comments.is_empty() => html.push_str(&notice("No comments yet.")),
        Ok(comments) => {
            html.push_str(r#"<div class="list">"#);
            for comment in comments {
                html.push_str(&format!(
                    r#"<div class="item"><div class="meta"><span class="pill">{who}</span><span class="small">{when}</span></div><p>{text}</p></div>"#,
                    who = escape(comment.author_display_name.as_deref().unwrap_or("Comment")),
                    when = timestamp(comment.created_at.as_deref()),
                    text = multiline(&comment.text),
                ));
            }
            html.push_str("</div>");
        }
    }

    if view.me.is_some() {
        html.push_str(&format!(
            r#"<form method="post" action="/community/posts/{id}/comments" class="item"><textarea name="text" placeholder="Write a comment..."></textarea><button class="btn primary" type="submit">Send</button></form>"#,
            id = escape(post_id)
        ));
    }

    let has_answers = comments.as_ref().is_ok_and(|c| !c.is_empty());
    if view.is_admin() && has_answers {
        html.push_str(&format!(
            r#"<div class="row">{}</div><p class="small muted">Creates a public tip from the latest comment.</p>"#,
            post_button(
                &format!("/community/posts/{post_id}/save-tip"),
                "Save answer as tip",
                "btn"
            )
        ));
    }
    html.push_str("</div>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RemoteId;
    use crate::views::fixtures::{post, profile};

    fn sample() -> CommunityData {
        CommunityData {
            posts: Ok(vec![
                post(1, "Q: which glue for glass?", None),
                post(2, "Finished my tray", Some("https://img/tray.jpg")),
            ]),
            comments: None,
        }
    }

    #[test]
    fn filter_hides_other_kinds() {
        let mut view = ViewState::default();
        view.community_filter = CommunityFilter::Questions;
        let html = render(&view, &sample(), None);
        assert!(html.contains("which glue for glass?"));
        assert!(!html.contains("Finished my tray"));

        view.community_filter = CommunityFilter::Works;
        let html = render(&view, &sample(), None);
        assert!(!html.contains("which glue"));
        assert!(html.contains("https://img/tray.jpg"));
    }

    #[test]
    fn text_is_shown_without_prefix() {
        let html = render(&ViewState::default(), &sample(), None);
        assert!(html.contains("<p>which glue for glass?</p>"));
        assert!(!html.contains("Q: which"));
    }

    #[test]
    fn anonymous_users_get_no_forms() {
        let mut data = sample();
        data.comments = Some(("1".into(), Ok(Vec::new())));
        let html = render(&ViewState::default(), &data, None);
        assert!(!html.contains(r#"id="new-post""#));
        assert!(!html.contains("Write a comment"));
        assert!(html.contains("No comments yet."));
    }

    #[test]
    fn expanded_post_shows_comments_and_admin_save() {
        let mut view = ViewState::default();
        view.me = Some(profile(true, false));
        let mut data = sample();
        data.comments = Some((
            "1".into(),
            Ok(vec![Comment {
                id: RemoteId::Number(9),
                text: "Use decoupage glue".into(),
                author_display_name: None,
                created_at: None,
            }]),
        ));
        let html = render(&view, &data, None);
        assert!(html.contains(r#"id="post-1" data-focus"#));
        assert!(html.contains("Use decoupage glue"));
        assert!(html.contains("/community/posts/1/save-tip"));
        assert!(html.contains(r#"action="/community/posts/1/comments""#));
        assert!(!html.contains("/community/posts/2/save-tip"));
    }

    #[test]
    fn compose_focus_preselects_kind() {
        let mut view = ViewState::default();
        view.me = Some(profile(false, false));

        let html = render(&view, &sample(), Some(&Focus::Compose(PostKind::Question)));
        assert!(html.contains(r#"id="new-post" data-focus"#));
        assert!(html.contains(r#"value="question" style="width:auto" checked"#));
        assert!(!html.contains(r#"value="work" style="width:auto" checked"#));
        assert!(html.contains("autofocus"));

        let plain = render(&view, &sample(), None);
        assert!(plain.contains(r#"id="new-post">"#));
        assert!(plain.contains(r#"value="work" style="width:auto" checked"#));
        assert!(!plain.contains("autofocus"));
    }

    #[test]
    fn failed_comments_do_not_hide_posts() {
        let mut data = sample();
        data.comments = Some(("2".into(), Err("boom".into())));
        let html = render(&ViewState::default(), &data, None);
        assert!(html.contains("Finished my tray"));
        assert!(html.contains(&escape("Couldn't load comments right now.")));
    }
}
