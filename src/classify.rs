use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Question,
    #[serde(alias = "showcase")]
    Work,
}

impl PostKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "question" | "questions" | "q" => Some(Self::Question),
            "work" | "works" | "showcase" => Some(Self::Work),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Work => "work",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Question => "Question",
            Self::Work => "Work",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommunityFilter {
    #[default]
    All,
    Questions,
    Works,
}

impl CommunityFilter {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "questions" | "question" => Self::Questions,
            "works" | "work" | "showcase" => Self::Works,
            _ => Self::All,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Questions => "questions",
            Self::Works => "works",
        }
    }

    pub fn admits(self, kind: PostKind) -> bool {
        match self {
            Self::All => true,
            Self::Questions => kind == PostKind::Question,
            Self::Works => kind == PostKind::Work,
        }
    }
}

static PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(q|work):|\[(q|question|work|showcase)\])\s*").expect("static prefix pattern")
});

fn leading(text: &str) -> Option<(PostKind, usize)> {
    let caps = PREFIX.captures(text)?;
    let end = caps.get(0)?.end();
    let tag = caps.get(1).or_else(|| caps.get(2))?.as_str();
    PostKind::parse(tag).map(|kind| (kind, end))
}

pub fn detect(text: &str) -> Option<PostKind> {
    leading(text).map(|(kind, _)| kind)
}

/// Posts without a recognised prefix are treated as finished work.
pub fn classify(text: &str) -> PostKind {
    detect(text).unwrap_or(PostKind::Work)
}

pub fn strip(text: &str) -> &str {
    let mut rest = text;
    while let Some((_, end)) = leading(rest) {
        rest = &rest[end..];
    }
    rest
}

pub fn apply_prefix(kind: PostKind, text: &str) -> String {
    if detect(text).is_some() {
        return text.to_string();
    }
    match kind {
        PostKind::Question => format!("Q: {text}"),
        PostKind::Work => format!("WORK: {text}"),
    }
}
