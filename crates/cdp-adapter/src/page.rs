use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use page_dom::{
    DomError, EventKind, NodeId, Notification, PageDom, Scope, SelectOption, Selector,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::timeout;
use tracing::{instrument, trace};

use crate::error::{AdapterError, AdapterErrorKind};
use crate::scripts;

/// Result envelope produced by every page-side script.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum Envelope {
    Ok {
        #[serde(default)]
        value: Value,
    },
    Detached,
    Error {
        message: String,
    },
}

/// A Chromium tab driven over the DevTools protocol.
#[derive(Clone, Debug)]
pub struct CdpPage {
    page: Page,
    deadline: Duration,
}

impl CdpPage {
    pub fn new(page: Page, deadline: Duration) -> Self {
        Self { page, deadline }
    }

    pub fn inner(&self) -> &Page {
        &self.page
    }

    /// URL of the document currently loaded in the tab.
    pub async fn current_url(&self) -> Result<String, AdapterError> {
        let value = self.eval(scripts::LOCATION, json!({}), None).await?;
        serde_json::from_value(value).map_err(|err| {
            AdapterError::new(AdapterErrorKind::Script).with_hint(err.to_string())
        })
    }

    async fn eval(
        &self,
        body: &str,
        args: Value,
        node: Option<NodeId>,
    ) -> Result<Value, AdapterError> {
        let expression = scripts::wrap(body, &args);
        let evaluated = timeout(self.deadline, self.page.evaluate(expression))
            .await
            .map_err(|_| {
                AdapterError::new(AdapterErrorKind::Timeout)
                    .with_hint(format!("page call exceeded {}ms", self.deadline.as_millis()))
                    .retriable(true)
            })??;
        let raw: Value = evaluated.into_value().map_err(|err| {
            AdapterError::new(AdapterErrorKind::Script)
                .with_hint(format!("undecodable script result: {err}"))
        })?;
        let envelope: Envelope = serde_json::from_value(raw).map_err(|err| {
            AdapterError::new(AdapterErrorKind::Script)
                .with_hint(format!("unexpected script envelope: {err}"))
        })?;
        match envelope {
            Envelope::Ok { value } => Ok(value),
            Envelope::Detached => Err(AdapterError::new(AdapterErrorKind::Script)
                .with_hint(format!("detached:{}", node.map(|n| n.0).unwrap_or_default()))),
            Envelope::Error { message } => {
                Err(AdapterError::new(AdapterErrorKind::Script).with_hint(message))
            }
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        body: &str,
        args: Value,
        node: Option<NodeId>,
    ) -> Result<T, DomError> {
        trace!(?node, "page call");
        let value = match self.eval(body, args, node).await {
            Ok(value) => value,
            Err(err) => return Err(classify(err, node)),
        };
        serde_json::from_value(value).map_err(|err| DomError::Script(err.to_string()))
    }

    async fn on_node<T: DeserializeOwned>(
        &self,
        body: &str,
        node: NodeId,
        extra: Value,
    ) -> Result<T, DomError> {
        let mut args = json!({ "node": node.0 });
        if let (Value::Object(target), Value::Object(extra)) = (&mut args, extra) {
            target.extend(extra);
        }
        self.call(body, args, Some(node)).await
    }
}

/// Maps the page-side "detached" envelope onto the stale-handle error.
fn classify(err: AdapterError, node: Option<NodeId>) -> DomError {
    let detached = err
        .hint
        .as_deref()
        .is_some_and(|hint| hint.starts_with("detached:"));
    match (detached, node) {
        (true, Some(node)) => DomError::Detached(node),
        _ => err.into(),
    }
}

fn handles(ids: Vec<u64>) -> Vec<NodeId> {
    ids.into_iter().map(NodeId).collect()
}

#[async_trait]
impl PageDom for CdpPage {
    #[instrument(level = "trace", skip(self, selector), fields(selector = %selector))]
    async fn query_all(&self, scope: Scope, selector: &Selector) -> Result<Vec<NodeId>, DomError> {
        let (root, node) = match scope {
            Scope::Document => (Value::Null, None),
            Scope::Element(node) => (json!(node.0), Some(node)),
        };
        let args = json!({ "scope": root, "selector": selector.to_string() });
        let ids: Vec<u64> = self.call(scripts::QUERY_ALL, args, node).await?;
        Ok(handles(ids))
    }

    async fn tag_name(&self, node: NodeId) -> Result<String, DomError> {
        self.on_node(scripts::TAG_NAME, node, json!({})).await
    }

    async fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>, DomError> {
        self.on_node(scripts::ATTRIBUTE, node, json!({ "name": name }))
            .await
    }

    async fn input_type(&self, node: NodeId) -> Result<String, DomError> {
        self.on_node(scripts::INPUT_TYPE, node, json!({})).await
    }

    async fn value(&self, node: NodeId) -> Result<String, DomError> {
        self.on_node(scripts::VALUE, node, json!({})).await
    }

    async fn text_content(&self, node: NodeId) -> Result<String, DomError> {
        self.on_node(scripts::TEXT_CONTENT, node, json!({})).await
    }

    async fn parent(&self, node: NodeId) -> Result<Option<NodeId>, DomError> {
        let id: Option<u64> = self.on_node(scripts::PARENT, node, json!({})).await?;
        Ok(id.map(NodeId))
    }

    async fn next_element_sibling(&self, node: NodeId) -> Result<Option<NodeId>, DomError> {
        let id: Option<u64> = self.on_node(scripts::NEXT_SIBLING, node, json!({})).await?;
        Ok(id.map(NodeId))
    }

    async fn closest(&self, node: NodeId, selector: &Selector) -> Result<Option<NodeId>, DomError> {
        let args = json!({ "selector": selector.to_string() });
        let id: Option<u64> = self.on_node(scripts::CLOSEST, node, args).await?;
        Ok(id.map(NodeId))
    }

    async fn options(&self, node: NodeId) -> Result<Vec<SelectOption>, DomError> {
        self.on_node(scripts::OPTIONS, node, json!({})).await
    }

    async fn set_value(&self, node: NodeId, value: &str) -> Result<(), DomError> {
        let _: Value = self
            .on_node(scripts::SET_VALUE, node, json!({ "value": value }))
            .await?;
        Ok(())
    }

    async fn remove_attribute(&self, node: NodeId, name: &str) -> Result<(), DomError> {
        let _: Value = self
            .on_node(scripts::REMOVE_ATTRIBUTE, node, json!({ "name": name }))
            .await?;
        Ok(())
    }

    async fn set_checked(&self, node: NodeId, checked: bool) -> Result<(), DomError> {
        let _: Value = self
            .on_node(scripts::SET_CHECKED, node, json!({ "checked": checked }))
            .await?;
        Ok(())
    }

    async fn dispatch_event(&self, node: NodeId, kind: EventKind) -> Result<(), DomError> {
        let _: Value = self
            .on_node(scripts::DISPATCH_EVENT, node, json!({ "kind": kind.as_str() }))
            .await?;
        Ok(())
    }

    async fn click(&self, node: NodeId) -> Result<(), DomError> {
        let _: Value = self.on_node(scripts::CLICK, node, json!({})).await?;
        Ok(())
    }

    async fn focus(&self, node: NodeId) -> Result<(), DomError> {
        let _: Value = self.on_node(scripts::FOCUS, node, json!({})).await?;
        Ok(())
    }

    async fn click_body(&self) -> Result<(), DomError> {
        let _: Value = self.call(scripts::CLICK_BODY, json!({}), None).await?;
        Ok(())
    }

    async fn show_notification(&self, notification: &Notification) -> Result<(), DomError> {
        let args = json!({
            "id": Notification::ELEMENT_ID,
            "message": notification.message,
            "background": notification.tone.background(),
        });
        let _: Value = self.call(scripts::SHOW_NOTIFICATION, args, None).await?;
        Ok(())
    }

    async fn dismiss_notification(&self) -> Result<(), DomError> {
        let args = json!({ "id": Notification::ELEMENT_ID });
        let _: Value = self.call(scripts::DISMISS_NOTIFICATION, args, None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelopes_decode_by_status() {
        let ok: Envelope = serde_json::from_value(json!({ "status": "ok", "value": [1, 2] })).unwrap();
        assert!(matches!(ok, Envelope::Ok { value } if value == json!([1, 2])));
        let gone: Envelope = serde_json::from_value(json!({ "status": "detached" })).unwrap();
        assert!(matches!(gone, Envelope::Detached));
        let failed: Envelope =
            serde_json::from_value(json!({ "status": "error", "message": "SyntaxError" })).unwrap();
        assert!(matches!(failed, Envelope::Error { message } if message == "SyntaxError"));
    }

    #[test]
    fn detached_envelope_becomes_stale_handle() {
        let err = AdapterError::new(AdapterErrorKind::Script).with_hint("detached:7");
        assert_eq!(classify(err, Some(NodeId(7))), DomError::Detached(NodeId(7)));
        let other = AdapterError::new(AdapterErrorKind::Timeout);
        assert!(matches!(classify(other, Some(NodeId(7))), DomError::Script(_)));
    }
}
