//! Template source discovery.
//!
//! Finds `<script type="text/hashview" data-mount="ID">...</script>` blocks
//! in page markup. The scan is lexical: tag and attribute names are matched
//! case-insensitively, attribute values may be double-quoted, single-quoted
//! or bare, and script bodies are taken verbatim up to `</script>`.

use serde::Serialize;

use crate::config::LoaderConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateSource {
    /// Surface the first component is mounted on.
    pub mount: String,
    pub source: String,
    /// 1-based line of the page where the body starts.
    pub line: usize,
}

pub fn discover_template_sources(page: &str, config: &LoaderConfig) -> Vec<TemplateSource> {
    let lower = page.to_ascii_lowercase();
    let mut sources = Vec::new();
    let mut from = 0;

    while let Some(found) = lower[from..].find("<script") {
        let tag_start = from + found;
        let attrs_start = tag_start + "<script".len();
        let Some(tag_len) = page[attrs_start..].find('>') else {
            break;
        };
        let body_start = attrs_start + tag_len + 1;
        let Some(body_len) = lower[body_start..].find("</script") else {
            break;
        };
        let body_end = body_start + body_len;
        from = body_end;

        let attrs = parse_attributes(&page[attrs_start..attrs_start + tag_len]);
        let is_template = attrs
            .iter()
            .any(|(name, value)| name == "type" && value.trim() == config.script_type);
        if !is_template {
            continue;
        }
        let mount = attrs
            .iter()
            .find(|(name, _)| name == "data-mount")
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| config.default_mount.clone());

        sources.push(TemplateSource {
            mount,
            source: page[body_start..body_end].to_string(),
            line: page[..body_start].matches('\n').count() + 1,
        });
    }

    tracing::debug!(count = sources.len(), "Discovered template sources");
    sources
}

/// `name="v" name='v' name=v flag`, names lower-cased.
fn parse_attributes(raw: &str) -> Vec<(String, String)> {
    let raw = raw.trim_end_matches('/');
    let mut attrs = Vec::new();
    let mut rest = raw.trim_start();

    while !rest.is_empty() {
        let name_len = rest
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(rest.len());
        let name = rest[..name_len].to_ascii_lowercase();
        rest = rest[name_len..].trim_start();

        let mut value = String::new();
        if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let (parsed, remaining) = match after_eq.chars().next() {
                Some(q @ ('"' | '\'')) => {
                    let inner = &after_eq[1..];
                    match inner.find(q) {
                        Some(end) => (&inner[..end], &inner[end + 1..]),
                        None => (inner, ""),
                    }
                }
                _ => {
                    let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
                    (&after_eq[..end], &after_eq[end..])
                }
            };
            value = parsed.to_string();
            rest = remaining.trim_start();
        }
        if !name.is_empty() {
            attrs.push((name, value));
        }
    }
    attrs
}
