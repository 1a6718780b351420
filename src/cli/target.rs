use std::sync::Arc;

use anyhow::{Context, Result};
use cdp_adapter::{CdpBrowser, CdpPage};
use page_dom::PageDom;
use tracing::{info, warn};

use super::context::CliContext;
use crate::errors::HostError;

/// The tab a command works on, plus the browser that owns it.
pub struct BrowserTarget {
    browser: CdpBrowser,
    page: CdpPage,
}

impl BrowserTarget {
    pub async fn open(ctx: &CliContext) -> Result<Self> {
        let browser = CdpBrowser::start(&ctx.browser_config())
            .await
            .context("starting browser")?;
        let page = match &ctx.target().url {
            Some(url) => browser
                .open_page(url.as_str())
                .await
                .with_context(|| format!("opening {url}"))?,
            None => browser.active_page().await.context("finding an open tab")?,
        };
        Ok(Self { browser, page })
    }

    pub fn page(&self) -> Arc<dyn PageDom> {
        Arc::new(self.page.clone())
    }

    /// Refuses pages outside the allowed booking sites unless `--force` was given.
    pub async fn ensure_allowed(&self, ctx: &CliContext) -> Result<String> {
        let url = self.page.current_url().await.context("reading page url")?;
        if ctx.target().force {
            warn!(%url, "domain guard bypassed");
        } else if !ctx.config().is_allowed(&url) {
            return Err(HostError::DomainNotAllowed { url }.into());
        }
        Ok(url)
    }

    /// With `hold`, a launched browser stays up until Ctrl-C so the user can review and submit
    /// the form. An attached browser is only detached.
    pub async fn release(self, hold: bool) -> Result<()> {
        if hold && self.browser.owns_process() {
            info!("form left open in the launched browser; press Ctrl-C to close it");
            tokio::signal::ctrl_c()
                .await
                .context("waiting for Ctrl-C")?;
        }
        self.browser.close().await.context("closing browser")
    }
}
