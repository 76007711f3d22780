//! JavaScript snippets evaluated in the page.
//!
//! Selectors and text are always embedded as JSON string literals so any
//! quoting in them survives.

use crate::{
    error::{BrowserError, Result},
    state::StorageEntry,
};

fn js_string(value: &str) -> Result<String> {
    serde_json::to_string(value).map_err(|e| BrowserError::JsEvalFailed(e.to_string()))
}

/// Evaluates to `"absent" | "hidden" | "visible" | "invalid"`.
pub fn probe_element(selector: &str) -> Result<String> {
    let selector = js_string(selector)?;
    Ok(format!(
        r#"(() => {{
    let el;
    try {{
        el = document.querySelector({selector});
    }} catch (e) {{
        return 'invalid';
    }}
    if (!el) return 'absent';
    const rect = el.getBoundingClientRect();
    const style = getComputedStyle(el);
    const visible =
        rect.width > 0 &&
        rect.height > 0 &&
        style.visibility !== 'hidden' &&
        style.display !== 'none';
    return visible ? 'visible' : 'hidden';
}})()"#
    ))
}

/// Scrolls the element into view; evaluates to `{ found, x, y }` with the
/// viewport coordinates of its center.
pub fn element_center(selector: &str) -> Result<String> {
    let selector = js_string(selector)?;
    Ok(format!(
        r#"(() => {{
    const el = document.querySelector({selector});
    if (!el) return {{ found: false, x: 0, y: 0 }};
    el.scrollIntoView({{ block: 'center', inline: 'center' }});
    const rect = el.getBoundingClientRect();
    return {{ found: true, x: rect.left + rect.width / 2, y: rect.top + rect.height / 2 }};
}})()"#
    ))
}

/// Focuses the element (or its editable child) and selects its content.
/// With `clear`, the selection is deleted too. Evaluates to a bool.
pub fn focus_and_select(selector: &str, clear: bool) -> Result<String> {
    let selector = js_string(selector)?;
    Ok(format!(
        r#"(() => {{
    const el = document.querySelector({selector});
    if (!el) return false;
    el.scrollIntoView({{ block: 'center', inline: 'center' }});
    if (el instanceof HTMLInputElement || el instanceof HTMLTextAreaElement) {{
        el.focus();
        el.select();
    }} else {{
        const target = el.isContentEditable
            ? el
            : (el.querySelector('[contenteditable="true"]') || el);
        target.focus();
        const range = document.createRange();
        range.selectNodeContents(target);
        const selection = window.getSelection();
        selection.removeAllRanges();
        selection.addRange(range);
    }}
    if ({clear}) document.execCommand('delete');
    return true;
}})()"#
    ))
}

/// Evaluates to `{ origin, entries: [[name, value], …] }`.
pub const DUMP_LOCAL_STORAGE: &str = r#"(() => {
    const entries = [];
    for (let i = 0; i < localStorage.length; i++) {
        const name = localStorage.key(i);
        entries.push([name, localStorage.getItem(name)]);
    }
    return { origin: location.origin, entries };
})()"#;

/// Script installed before any page script runs: writes `entries` into
/// local storage once per tab when the document belongs to `origin`.
pub fn seed_local_storage(origin: &str, entries: &[StorageEntry]) -> Result<String> {
    let origin = js_string(origin.trim_end_matches('/'))?;
    let pairs: Vec<(&str, &str)> = entries
        .iter()
        .map(|e| (e.name.as_str(), e.value.as_str()))
        .collect();
    let pairs = serde_json::to_string(&pairs).map_err(|e| BrowserError::Storage(e.to_string()))?;
    Ok(format!(
        r#"(() => {{
    if (location.origin !== {origin}) return;
    if (sessionStorage.getItem('__whatsend_seeded') === '1') return;
    for (const [name, value] of {pairs}) {{
        localStorage.setItem(name, value);
    }}
    sessionStorage.setItem('__whatsend_seeded', '1');
}})()"#
    ))
}
