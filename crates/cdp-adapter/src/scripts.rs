//! Page-side script fragments.
//!
//! Every page operation is one `Runtime.evaluate` of `wrap(body, args)`. The wrapper installs a
//! node registry on `window.__fastfillNodes` that maps numeric handles to elements, so handles
//! survive across calls without touching page attributes. Bodies return through `ok(..)` or
//! `detached()`; the Rust side decodes the envelope.

use serde_json::Value;

const PRELUDE: &str = r#"
const reg = window.__fastfillNodes || (window.__fastfillNodes = { next: 1, byId: new Map(), ids: new WeakMap() });
const put = (el) => {
  let id = reg.ids.get(el);
  if (id === undefined) { id = reg.next++; reg.ids.set(el, id); reg.byId.set(id, el); }
  return id;
};
const get = (id) => {
  const el = reg.byId.get(id);
  if (!el || !el.isConnected) { reg.byId.delete(id); return null; }
  return el;
};
const ok = (value) => ({ status: 'ok', value: value === undefined ? null : value });
const detached = () => ({ status: 'detached' });
"#;

/// Wraps `body` into a self-contained expression receiving `args`.
pub fn wrap(body: &str, args: &Value) -> String {
    format!(
        "(function(args) {{ try {{ {PRELUDE}\n{body}\n }} catch (e) {{ return {{ status: 'error', message: String(e && e.message || e) }}; }} }})({args})"
    )
}

pub const QUERY_ALL: &str = r#"
const root = args.scope === null ? document : get(args.scope);
if (!root) return detached();
return ok(Array.from(root.querySelectorAll(args.selector)).map(put));
"#;

/// Element operations resolve `args.node` first and report stale handles.
macro_rules! element_op {
    ($name:ident, $body:literal) => {
        pub const $name: &str = concat!(
            "const el = get(args.node); if (!el) return detached();\n",
            $body
        );
    };
}

element_op!(TAG_NAME, "return ok(el.tagName.toLowerCase());");
element_op!(ATTRIBUTE, "return ok(el.getAttribute(args.name));");
element_op!(
    INPUT_TYPE,
    r#"const tag = el.tagName.toLowerCase();
return ok(['input', 'select', 'textarea'].includes(tag) ? String(el.type || 'text').toLowerCase() : tag);"#
);
element_op!(VALUE, "return ok(el.value === undefined ? '' : String(el.value));");
element_op!(TEXT_CONTENT, "return ok(el.textContent || '');");
element_op!(
    PARENT,
    "return ok(el.parentElement ? put(el.parentElement) : null);"
);
element_op!(
    NEXT_SIBLING,
    "return ok(el.nextElementSibling ? put(el.nextElementSibling) : null);"
);
element_op!(
    CLOSEST,
    "const found = el.closest(args.selector); return ok(found ? put(found) : null);"
);
element_op!(
    OPTIONS,
    r#"if (!el.options) return ok([]);
return ok(Array.from(el.options).map((o) => ({ text: o.text.replace(/\s+/g, ' ').trim(), value: o.value })));"#
);
element_op!(
    SET_VALUE,
    r#"const proto = el instanceof HTMLSelectElement ? HTMLSelectElement.prototype
  : el instanceof HTMLTextAreaElement ? HTMLTextAreaElement.prototype
  : HTMLInputElement.prototype;
const descriptor = Object.getOwnPropertyDescriptor(proto, 'value');
if (descriptor && descriptor.set) { descriptor.set.call(el, args.value); } else { el.value = args.value; }
return ok(null);"#
);
element_op!(
    REMOVE_ATTRIBUTE,
    "el.removeAttribute(args.name); return ok(null);"
);
element_op!(SET_CHECKED, "el.checked = !!args.checked; return ok(null);");
element_op!(
    DISPATCH_EVENT,
    r#"const event = args.kind === 'click'
  ? new MouseEvent('click', { bubbles: true, cancelable: true, view: window })
  : new Event(args.kind, { bubbles: true });
el.dispatchEvent(event);
return ok(null);"#
);
element_op!(
    CLICK,
    r#"for (const type of ['mousedown', 'mouseup']) {
  el.dispatchEvent(new MouseEvent(type, { bubbles: true, cancelable: true, view: window }));
}
el.click();
return ok(null);"#
);
element_op!(FOCUS, "el.focus(); return ok(null);");

pub const CLICK_BODY: &str = "document.body.click(); return ok(null);";

pub const SHOW_NOTIFICATION: &str = r#"
const previous = document.getElementById(args.id);
if (previous) previous.remove();
const banner = document.createElement('div');
banner.id = args.id;
banner.textContent = args.message;
banner.style.cssText = [
  'position: fixed', 'top: 20px', 'right: 20px', 'z-index: 2147483647',
  'padding: 12px 20px', 'border-radius: 8px', 'color: #fff',
  'font: 600 14px/1.4 system-ui, sans-serif', 'box-shadow: 0 4px 12px rgba(0,0,0,.15)',
  'background: ' + args.background,
].join(';');
document.body.appendChild(banner);
return ok(null);
"#;

pub const DISMISS_NOTIFICATION: &str = r#"
const banner = document.getElementById(args.id);
if (banner) banner.remove();
return ok(null);
"#;

pub const LOCATION: &str = "return ok(window.location.href);";

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wrap_embeds_arguments_as_json() {
        let script = wrap(QUERY_ALL, &json!({ "scope": null, "selector": "input[name=\"a\"]" }));
        assert!(script.starts_with("(function(args)"));
        assert!(script.ends_with(r#"({"scope":null,"selector":"input[name=\"a\"]"})"#));
        assert!(script.contains("window.__fastfillNodes"));
    }

    #[test]
    fn element_ops_check_liveness_first() {
        for body in [TAG_NAME, ATTRIBUTE, SET_VALUE, DISPATCH_EVENT, CLICK] {
            assert!(body.starts_with("const el = get(args.node); if (!el) return detached();"));
        }
    }
}
