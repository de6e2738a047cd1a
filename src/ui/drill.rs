use std::borrow::Cow;

use serde::Serialize;

use crate::query::types::{Field, NavigationLink, Row};
use crate::tree::arena::{GroupTree, NodeId};

/// Screen position a drill menu is opened at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Anchor {
    pub x: f64,
    pub y: f64,
}

/// Host capability that presents drill links to the user.
pub trait DrillSink {
    fn open_drill_menu(&mut self, links: &[NavigationLink], anchor: Anchor);
}

/// Keeps every opened menu in memory (tests, CLI reporting).
#[derive(Debug, Default)]
pub struct RecordedDrills {
    pub opened: Vec<(Vec<NavigationLink>, Anchor)>,
}

impl DrillSink for RecordedDrills {
    fn open_drill_menu(&mut self, links: &[NavigationLink], anchor: Anchor) {
        self.opened.push((links.to_vec(), anchor));
    }
}

/// A URL split into path, raw query pairs and fragment.
#[derive(Debug, Clone, PartialEq)]
struct DrillUrl<'a> {
    path: &'a str,
    params: Vec<(&'a str, Option<&'a str>)>,
    fragment: Option<&'a str>,
}

impl<'a> DrillUrl<'a> {
    fn parse(url: &'a str) -> Self {
        let (rest, fragment) = match url.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (url, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, query),
            None => (rest, ""),
        };
        let params = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (pair, None),
            })
            .collect();
        Self {
            path,
            params,
            fragment,
        }
    }

    /// Pairs match on their decoded text, so `a%20b` and `a+b` are equal.
    /// A bare key never matches `key=`.
    fn has_param(&self, &(key, value): &(&str, Option<&str>)) -> bool {
        let key = decode_component(key);
        let value = value.map(decode_component);
        self.params
            .iter()
            .any(|&(k, v)| decode_component(k) == key && v.map(decode_component) == value)
    }

    fn to_url(&self) -> String {
        let mut url = String::from(self.path);
        for (i, (key, value)) in self.params.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            if let Some(value) = value {
                url.push('=');
                url.push_str(value);
            }
        }
        if let Some(fragment) = self.fragment {
            url.push('#');
            url.push_str(fragment);
        }
        url
    }
}

/// Decode `%XX` escapes and `+` in one query key or value.
/// Malformed escapes are kept as written.
fn decode_component(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['%', '+']) {
        return Cow::Borrowed(raw);
    }
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                match hex {
                    Some(byte) => {
                        out.push(byte);
                        i += 2;
                    }
                    None => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    Cow::Owned(String::from_utf8_lossy(&out).into_owned())
}

/// Combine several drill URLs into the filter set they all share.
/// The path comes from the first URL.
fn intersect_urls(urls: &[&str]) -> String {
    let parsed: Vec<DrillUrl> = urls.iter().map(|u| DrillUrl::parse(u)).collect();
    let Some((seed, others)) = parsed.split_first() else {
        return String::new();
    };

    let params = seed
        .params
        .iter()
        .filter(|param| others.iter().all(|other| other.has_param(param)))
        .copied()
        .collect();
    let fragment = seed
        .fragment
        .filter(|f| others.iter().all(|other| other.fragment == Some(*f)));

    DrillUrl {
        path: seed.path,
        params,
        fragment,
    }
    .to_url()
}

/// Drill link for a node: the intersection of the links on its leaves'
/// primary cells. `None` when no leaf carries a link.
pub fn resolve_drill(
    tree: &GroupTree,
    rows: &[Row],
    node: NodeId,
    primary: &Field,
) -> Option<NavigationLink> {
    let links: Vec<&NavigationLink> = tree
        .leaves(node)
        .into_iter()
        .filter_map(|leaf| tree.get(leaf).row())
        .filter_map(|row| rows.get(row))
        .flat_map(|row| row.links(&primary.name))
        .collect();

    match links.as_slice() {
        [] => None,
        [only] => Some((*only).clone()),
        [first, ..] => {
            let urls: Vec<&str> = links.iter().map(|l| l.url.as_str()).collect();
            let url = intersect_urls(&urls);
            tracing::debug!("Combined {} drill links into {}", links.len(), url);
            Some(NavigationLink {
                label: tree.get(node).display_key(),
                link_type: first.link_type.clone(),
                type_label: first.type_label.clone(),
                url,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::types::Cell;
    use crate::tree::arena::IdGenerator;
    use crate::tree::build_hierarchy;

    fn rows(entries: &[(&str, &str, &[&str])]) -> Vec<Row> {
        entries
            .iter()
            .map(|(group, item, urls)| {
                let mut cell = Cell::new(1.0);
                for url in urls.iter() {
                    cell = cell.with_link(NavigationLink::new(item, url));
                }
                Row::from_cells([
                    ("group", Cell::new(*group)),
                    ("item", Cell::new(*item)),
                    ("m", cell),
                ])
            })
            .collect()
    }

    fn resolve_top(rows: &[Row]) -> Option<NavigationLink> {
        let mut ids = IdGenerator::new();
        let tree = build_hierarchy(
            rows,
            &[Field::dimension("group"), Field::dimension("item")],
            &mut ids,
        );
        let top = tree.children(tree.root).next().unwrap();
        resolve_drill(&tree, rows, top, &Field::measure("m"))
    }

    #[test]
    fn shared_pairs_survive() {
        let rows = rows(&[("g", "a", &["A?x=1&y=2"]), ("g", "b", &["A?x=1&y=3"])]);
        let link = resolve_top(&rows).unwrap();
        assert_eq!(link.url, "A?x=1");
        assert_eq!(link.label, "g");
        assert_eq!(link.link_type, "drill");
    }

    #[test]
    fn order_does_not_change_the_filter_set() {
        let forward = rows(&[("g", "a", &["A?x=1&y=2&z=5"]), ("g", "b", &["A?z=5&x=1"])]);
        let backward = rows(&[("g", "b", &["A?z=5&x=1"]), ("g", "a", &["A?x=1&y=2&z=5"])]);
        let forward = resolve_top(&forward).unwrap().url;
        let backward = resolve_top(&backward).unwrap().url;
        let mut f = DrillUrl::parse(&forward).params;
        let mut b = DrillUrl::parse(&backward).params;
        f.sort_unstable();
        b.sort_unstable();
        assert_eq!(f, b);
        assert_eq!(f, vec![("x", Some("1")), ("z", Some("5"))]);
    }

    #[test]
    fn single_link_is_returned_unchanged() {
        let rows = rows(&[("g", "a", &["/explore/sales?f=1#vis"])]);
        let link = resolve_top(&rows).unwrap();
        assert_eq!(link, NavigationLink::new("a", "/explore/sales?f=1#vis"));
    }

    #[test]
    fn no_links_resolves_to_none() {
        let rows = rows(&[("g", "a", &[]), ("g", "b", &[])]);
        assert!(resolve_top(&rows).is_none());
    }

    #[test]
    fn fragment_kept_only_when_shared() {
        assert_eq!(intersect_urls(&["p?a=1#f", "p?a=1#f"]), "p?a=1#f");
        assert_eq!(intersect_urls(&["p?a=1#f", "p?a=1#g"]), "p?a=1");
        assert_eq!(intersect_urls(&["p?a=1#f", "p?a=1"]), "p?a=1");
    }

    #[test]
    fn keys_without_values_must_match_exactly() {
        assert_eq!(intersect_urls(&["p?flag&a=1", "p?flag&a=2"]), "p?flag");
        assert_eq!(intersect_urls(&["p?flag", "p?flag="]), "p");
    }

    #[test]
    fn encoded_forms_of_the_same_value_match() {
        assert_eq!(intersect_urls(&["p?x=a%20b&y=1", "p?x=a+b&y=2"]), "p?x=a%20b");
        assert_eq!(intersect_urls(&["p?r%C3%A9gion=W", "p?région=W"]), "p?r%C3%A9gion=W");
        assert_eq!(intersect_urls(&["p?x=100%", "p?x=100%25"]), "p?x=100%");
        assert_eq!(intersect_urls(&["p?x=a+b", "p?x=a%2Bb"]), "p");
    }

    #[test]
    fn decoding_leaves_plain_text_borrowed() {
        assert!(matches!(decode_component("plain"), Cow::Borrowed("plain")));
        assert_eq!(decode_component("%zz%4"), "%zz%4");
    }
}
