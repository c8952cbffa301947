//! HTML pages

use fula_sharing::{encode_path, Breadcrumb, Listing};
use fula_storage::ListItem;
use std::fmt::Write;

const STYLE: &str = "body{font-family:sans-serif;margin:2em auto;max-width:60em;color:#222}\
a{color:#0b63c6;text-decoration:none}table{width:100%;border-collapse:collapse}\
td{padding:.3em .5em;border-bottom:1px solid #eee}td.size{text-align:right;color:#666}";

/// Escape text for HTML element content and attribute values
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

/// Human readable size in base-10 units
pub fn format_size(size: u64) -> String {
    const UNITS: [(&str, f64); 6] = [
        ("EB", 1e18),
        ("PB", 1e15),
        ("TB", 1e12),
        ("GB", 1e9),
        ("MB", 1e6),
        ("KB", 1e3),
    ];

    let value = size as f64;
    for (unit, scale) in UNITS {
        if value >= scale * 2.0 / 3.0 {
            return format!("{:.1} {}", value / scale, unit);
        }
    }
    format!("{} B", size)
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(title),
        STYLE,
        body
    )
}

/// Page shown for a single shared object
pub fn object_page(key: &str, size: u64) -> String {
    let name = key.rsplit('/').next().unwrap_or(key);
    let body = format!(
        "<h1>{}</h1>\n<p>Size: {}</p>\n\
         <p><a href=\"?view\">View</a> | <a href=\"?download\">Download</a></p>\n",
        escape_html(name),
        format_size(size)
    );
    page(key, &body)
}

/// Prefix listing page
///
/// Entry names are shown relative to the listed prefix.
pub fn listing_page(listing: &Listing, items: &[ListItem]) -> String {
    let mut body = String::new();

    let crumbs: Vec<String> = listing
        .breadcrumbs()
        .iter()
        .map(|Breadcrumb { prefix, url }| {
            format!("<a href=\"{}\">{}</a>", escape_html(url), escape_html(prefix))
        })
        .collect();
    let _ = writeln!(body, "<h1>{}</h1>", escape_html(&listing.title));
    let _ = writeln!(body, "<nav>{}</nav>", crumbs.join(" / "));

    body.push_str("<table>\n");
    for item in items {
        let name = item.key.strip_prefix(&listing.prefix).unwrap_or(&item.key);
        let size = if item.is_prefix {
            String::new()
        } else {
            format_size(item.size)
        };
        let _ = writeln!(
            body,
            "<tr><td><a href=\"{}\">{}</a></td><td class=\"size\">{}</td></tr>",
            escape_html(&encode_path(name)),
            escape_html(name),
            size
        );
    }
    if items.is_empty() {
        body.push_str("<tr><td>This folder is empty.</td><td></td></tr>\n");
    }
    body.push_str("</table>\n");

    page(&listing.title, &body)
}

/// Not found page
pub fn not_found_page(message: &str) -> String {
    page("Not Found", &format!("<h1>{}</h1>\n", escape_html(message)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "0 B")]
    #[case(12, "12 B")]
    #[case(666, "666 B")]
    #[case(667, "0.7 KB")]
    #[case(1_000, "1.0 KB")]
    #[case(1_536, "1.5 KB")]
    #[case(2_500_000, "2.5 MB")]
    #[case(7_000_000_000, "7.0 GB")]
    #[case(u64::MAX, "18.4 EB")]
    fn test_format_size(#[case] size: u64, #[case] expected: &str) {
        assert_eq!(format_size(size), expected);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_listing_page() {
        let listing = Listing {
            title: "photos".to_string(),
            root: Breadcrumb {
                prefix: "photos".to_string(),
                url: "/ACCESS/photos/".to_string(),
            },
            prefix: "album/".to_string(),
            visible_prefix: "album/".to_string(),
        };
        let items = vec![
            ListItem {
                key: "album/2024/".to_string(),
                is_prefix: true,
                size: 0,
            },
            ListItem {
                key: "album/<cat>.jpg".to_string(),
                is_prefix: false,
                size: 2_048,
            },
        ];

        let html = listing_page(&listing, &items);
        assert!(html.contains("<title>photos</title>"));
        assert!(html.contains("<a href=\"/ACCESS/photos/\">photos</a>"));
        assert!(html.contains("<a href=\"/ACCESS/photos/album/\">album</a>"));
        assert!(html.contains("<a href=\"2024/\">2024/</a>"));
        assert!(html.contains("<a href=\"%3Ccat%3E.jpg\">&lt;cat&gt;.jpg</a>"));
        assert!(html.contains("2.0 KB"));
        assert!(!html.contains("This folder is empty."));
    }

    #[test]
    fn test_object_page() {
        let html = object_page("docs/report.pdf", 1_500_000);
        assert!(html.contains("<h1>report.pdf</h1>"));
        assert!(html.contains("1.5 MB"));
        assert!(html.contains("?download"));
    }

    #[test]
    fn test_not_found_page() {
        let html = not_found_page("Oops! Object not found.");
        assert!(html.contains("<h1>Oops! Object not found.</h1>"));
    }
}
