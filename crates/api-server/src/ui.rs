//! Server-rendered HTML pages: a product picker and the recommendation list.

use axum::extract::{Query, State};
use axum::response::Html;
use std::fmt::Write as _;

use crate::rest::{AppState, RecommendQuery};

pub const NOT_FOUND_MESSAGE: &str = "Product not found or insufficient data.";

const STYLE: &str = "body{font-family:sans-serif;max-width:42rem;margin:2rem auto;padding:0 1rem}\
.success{background:#e6f4ea;border-left:4px solid #1e8e3e;padding:.75rem}\
.warning{background:#fef7e0;border-left:4px solid #f9ab00;padding:.75rem}\
select,button,input{font-size:1rem;margin:.25rem 0}";

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <h1>Shopper Spectrum</h1>\n{body}</body>\n</html>\n",
        title = escape_html(title),
    ))
}

fn product_form(state: &AppState, selected: Option<&str>, count: usize) -> String {
    let mut form = String::from(
        "<form action=\"/recommendations\" method=\"get\">\n\
         <label for=\"product\">Choose a product</label><br>\n\
         <select id=\"product\" name=\"product\">\n",
    );
    for product in state.engine.products() {
        let escaped = escape_html(product);
        let marker = if selected == Some(product.as_str()) { " selected" } else { "" };
        let _ = writeln!(form, "<option value=\"{escaped}\"{marker}>{escaped}</option>");
    }
    let _ = write!(
        form,
        "</select><br>\n\
         <label for=\"n\">How many</label>\n\
         <input id=\"n\" name=\"n\" type=\"number\" min=\"1\" max=\"{max}\" value=\"{count}\"><br>\n\
         <button type=\"submit\">Get Recommendations</button>\n</form>\n",
        max = state.max_count,
    );
    form
}

/// GET /: product picker.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let body = product_form(&state, None, state.default_count);
    page("Product Recommendations", &body)
}

/// GET /recommendations: numbered list of similar products, or a warning
/// when the lookup comes back empty.
pub async fn recommendations_page(
    State(state): State<AppState>,
    Query(query): Query<RecommendQuery>,
) -> Html<String> {
    let response = state.lookup(&query.product, query.n);

    let mut body = product_form(&state, Some(query.product.as_str()), state.resolve_count(query.n));
    if response.recommendations.is_empty() {
        let _ = writeln!(body, "<p class=\"warning\">{NOT_FOUND_MESSAGE}</p>");
    } else {
        let _ = writeln!(
            body,
            "<p class=\"success\">Top {} Recommended Products:</p>\n<ol>",
            response.recommendations.len()
        );
        for rec in &response.recommendations {
            let _ = writeln!(body, "<li>{}</li>", escape_html(&rec.product));
        }
        body.push_str("</ol>\n");
    }

    page("Recommendations", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html("<b>\"FAIRY\" & 'CAKE'</b>"),
            "&lt;b&gt;&quot;FAIRY&quot; &amp; &#39;CAKE&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("PLAIN TEXT"), "PLAIN TEXT");
    }
}
