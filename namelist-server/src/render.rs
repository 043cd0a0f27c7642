//! Index page rendering
//!
//! Pure mapping from a listing outcome to HTML. Errors are embedded in the
//! page; rendering itself cannot fail.

use crate::db::{Page, Record, PAGE_SIZE};
use crate::error::ListingError;

/// Everything the index page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    pub records: Vec<Record>,
    pub total: i64,
    pub page_size: i64,
    pub error: Option<String>,
}

impl ViewModel {
    /// Build the view for one request. A failed listing shows no records and
    /// a zero total alongside the error text.
    pub fn from_outcome(outcome: Result<Page, ListingError>) -> Self {
        match outcome {
            Ok(page) => Self {
                records: page.records,
                total: page.total,
                page_size: PAGE_SIZE,
                error: None,
            },
            Err(err) => Self {
                records: Vec::new(),
                total: 0,
                page_size: PAGE_SIZE,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Render the index page.
pub fn render_page(view: &ViewModel) -> String {
    let mut html = String::with_capacity(1024 + view.records.len() * 64);

    html.push_str(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>Customers</title>\n\
         <style>\n\
         body { font-family: sans-serif; margin: 2em; }\n\
         table { border-collapse: collapse; }\n\
         td, th { border: 1px solid #ccc; padding: 0.3em 0.8em; text-align: left; }\n\
         .error { color: #b00020; }\n\
         </style>\n\
         </head>\n\
         <body>\n\
         <h1>Customers</h1>\n",
    );

    if let Some(error) = &view.error {
        html.push_str(&format!(
            "<p class=\"error\">Error: {}</p>\n",
            escape_html(error)
        ));
    }

    html.push_str(&format!(
        "<p class=\"summary\">Showing {} of {} (page size {})</p>\n",
        view.records.len(),
        view.total,
        view.page_size
    ));

    html.push_str("<table>\n<thead><tr><th>#</th><th>Name</th></tr></thead>\n<tbody>\n");
    for (i, record) in view.records.iter().enumerate() {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>\n",
            i + 1,
            escape_html(&record.name)
        ));
    }
    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");

    html
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Cause;

    fn records(names: &[&str]) -> Vec<Record> {
        names
            .iter()
            .map(|n| Record {
                name: n.to_string(),
            })
            .collect()
    }

    #[test]
    fn success_carries_rows_and_total() {
        let view = ViewModel::from_outcome(Ok(Page {
            records: records(&["Alice", "Bob"]),
            total: 42,
        }));
        assert_eq!(view.records.len(), 2);
        assert_eq!(view.total, 42);
        assert_eq!(view.page_size, 15);
        assert!(view.error.is_none());

        let html = render_page(&view);
        assert!(html.contains("Showing 2 of 42 (page size 15)"));
        assert!(html.contains("<td>1</td><td>Alice</td>"));
        assert!(html.contains("<td>2</td><td>Bob</td>"));
        assert!(!html.contains("class=\"error\""));
    }

    #[test]
    fn failure_has_no_data_and_embeds_error() {
        let view =
            ViewModel::from_outcome(Err(ListingError::Connection(Cause::DeadlineExceeded)));
        assert!(view.records.is_empty());
        assert_eq!(view.total, 0);
        assert_eq!(
            view.error.as_deref(),
            Some("failed to get connection: context deadline exceeded")
        );

        let html = render_page(&view);
        assert!(html.contains("Error: failed to get connection: context deadline exceeded"));
        assert!(html.contains("Showing 0 of 0"));
    }

    #[test]
    fn dynamic_text_is_escaped() {
        let view = ViewModel {
            records: records(&["<script>alert('x')</script>"]),
            total: 1,
            page_size: PAGE_SIZE,
            error: Some("bad \"quote\" & <tag>".into()),
        };
        let html = render_page(&view);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(html.contains("bad &quot;quote&quot; &amp; &lt;tag&gt;"));
    }

    #[test]
    fn empty_store_renders_empty_table() {
        let html = render_page(&ViewModel::from_outcome(Ok(Page::default())));
        assert!(html.contains("Showing 0 of 0"));
        assert!(html.contains("<tbody>\n</tbody>"));
    }
}
