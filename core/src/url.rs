//! Resolve a path template plus parameters into an absolute URL.
//!
//! `:name` tokens (a letter followed by letters or digits) are replaced with
//! the percent-encoded value from the path parameters. Query pairs are
//! appended in the order given; `None` values are skipped and repeated keys
//! are kept. Absolute `http(s)://` templates are external addresses and are
//! never scanned for tokens.

use std::collections::HashMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::ConfigError;

/// Everything but the unreserved characters of RFC 3986.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// True when `path` carries its own `http://` or `https://` scheme.
pub fn is_absolute(path: &str) -> bool {
    let lower = path.get(..8).unwrap_or(path).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Build the final URL for a request.
///
/// Absolute templates are used verbatim apart from the appended query;
/// relative ones have their tokens substituted and are joined to `base_url`.
pub fn compose(
    base_url: &str,
    template: &str,
    params: &HashMap<String, String>,
    query: &[(String, Option<String>)],
) -> Result<String, ConfigError> {
    let mut url = if is_absolute(template) {
        template.to_string()
    } else {
        let path = substitute(template, params, template)?;
        match (base_url.is_empty(), path.starts_with('/')) {
            (true, _) => path,
            (false, true) => format!("{base_url}{path}"),
            (false, false) => format!("{base_url}/{path}"),
        }
    };
    append_query(&mut url, query);
    Ok(url)
}

fn substitute(
    path: &str,
    params: &HashMap<String, String>,
    template: &str,
) -> Result<String, ConfigError> {
    // Tokens only live in the path; a literal query or fragment is left alone.
    let (path, tail) = path.split_at(path.find(['?', '#']).unwrap_or(path.len()));
    let mut out = String::with_capacity(path.len() + tail.len());
    let mut rest = path;
    while let Some(colon) = rest.find(':') {
        out.push_str(&rest[..colon]);
        let after = &rest[colon + 1..];
        let starts_with_letter = after.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
        if !starts_with_letter {
            out.push(':');
            rest = after;
            continue;
        }
        let len = after
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(after.len());
        let name = &after[..len];
        let value = params.get(name).ok_or_else(|| ConfigError::MissingParameter {
            name: name.to_string(),
            template: template.to_string(),
        })?;
        out.push_str(&encode_component(value));
        rest = &after[len..];
    }
    out.push_str(rest);
    out.push_str(tail);
    Ok(out)
}

fn append_query(url: &mut String, query: &[(String, Option<String>)]) {
    let mut separator = if url.contains('?') { '&' } else { '?' };
    for (key, value) in query {
        let Some(value) = value else { continue };
        url.push(separator);
        url.push_str(&encode_component(key));
        url.push('=');
        url.push_str(&encode_component(value));
        separator = '&';
    }
}
