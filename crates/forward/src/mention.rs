//! Mention markup rewriting.
//!
//! Mentions arrive as `<at id="..."/>` elements. Platform ids mean nothing in
//! another platform's channel, so relayed content replaces them with a plain
//! `@name` looked up in the source guild's member directory.

use std::sync::LazyLock;

use {crosslink_channels::MemberDirectory, regex::Regex};

static AT_ELEMENT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"<at\s+(?:[^>]*?\s)?id="([^"]*)"[^>]*?/>"#).ok());

pub fn has_mentions(content: &str) -> bool {
    AT_ELEMENT.as_ref().is_some_and(|re| re.is_match(content))
}

/// Replace each resolvable mention with `@name`. Unknown ids keep their markup.
pub fn rewrite_mentions(content: &str, directory: &MemberDirectory) -> String {
    let Some(re) = AT_ELEMENT.as_ref() else {
        return content.to_string();
    };
    re.replace_all(content, |caps: &regex::Captures<'_>| {
        match directory.get(&caps[1]) {
            Some(name) => format!("@{name}"),
            None => caps[0].to_string(),
        }
    })
    .into_owned()
}
