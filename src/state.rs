//! Request-state serialization for client hydration.
//!
//! Emits two script blocks: one assigning `pathParams`, `queryParams`, and
//! `state` onto `Vue.prototype.$server`, and one that HTML-decodes the two
//! param strings client-side (scratch textarea) and `JSON.parse`s them in
//! place. The param JSON is HTML-escaped so hostile values cannot break out
//! of the surrounding markup; the state value is embedded as a bare JSON
//! object literal and is deliberately not escaped.

use crate::{PageError, RequestContext, StateFn};

/// Escape exactly the characters that can break out of HTML context.
///
/// This is not general JSON escaping — only `< > & " ' /` are rewritten,
/// everything else passes through untouched so the client decode is a
/// lossless inverse.
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            c => out.push(c),
        }
    }
    out
}

/// HTML-escape a JSON string and double its backslashes. The doubling is
/// required because the result is embedded inside a template literal in the
/// emitted script and must survive that second layer of interpretation.
fn escape_param_json(json: &str) -> String {
    html_escape(json).replace('\\', "\\\\")
}

/// Build the serialized-state script blocks for one render.
///
/// `explicit_state` wins when given; otherwise `state_fn` computes the page
/// state from the request context.
pub fn serialize_state(
    ctx: &RequestContext,
    explicit_state: Option<serde_json::Value>,
    state_fn: &StateFn,
) -> Result<String, PageError> {
    let path_params = escape_param_json(&serde_json::to_string(&ctx.path_params)?);
    let query_params = escape_param_json(&serde_json::to_string(&ctx.query_params)?);
    let state = explicit_state.unwrap_or_else(|| state_fn(ctx));
    let state_json = serde_json::to_string(&state)?;

    let assignment = format!(
        "\n<script>\n    Vue.prototype.$server = {{\n        pathParams: `{path_params}`,\n        queryParams: `{query_params}`,\n        state: {state_json}\n    }}\n</script>\n"
    );
    Ok(format!("{assignment}{}", decode_script()))
}

/// The client-side inverse: decode the HTML-escaped param strings with a
/// scratch textarea, then parse them back into objects in place.
fn decode_script() -> &'static str {
    concat!(
        "\n<script>\n",
        "    function ____decode(string) { // used for decoding HTML encoded params\n",
        "        let textArea = document.createElement(\"textarea\");\n",
        "        textArea.innerHTML = string;\n",
        "        return textArea.value;\n",
        "    }\n",
        "    [\"queryParams\", \"pathParams\"].forEach((key) => {\n",
        "        Vue.prototype.$server[key] = JSON.parse(____decode(Vue.prototype.$server[key]));\n",
        "    });\n",
        "</script>\n",
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
