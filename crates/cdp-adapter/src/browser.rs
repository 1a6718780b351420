use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig, Handler};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, instrument, trace, warn};

use crate::config::CdpConfig;
use crate::error::{AdapterError, AdapterErrorKind};
use crate::page::CdpPage;

const LAUNCH_TIMEOUT: Duration = Duration::from_secs(30);
const TARGET_SETTLE: Duration = Duration::from_millis(100);

const LAUNCH_ARGS: &[&str] = &[
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-default-apps",
    "--disable-popup-blocking",
];

/// A launched or attached Chromium instance plus its event pump.
pub struct CdpBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
    deadline: Duration,
    owned: bool,
}

impl CdpBrowser {
    /// Attaches when `websocket_url` is set, launches otherwise.
    pub async fn start(cfg: &CdpConfig) -> Result<Self, AdapterError> {
        match cfg.websocket_url.as_deref() {
            Some(url) => Self::connect(url, cfg.deadline()).await,
            None => Self::launch(cfg).await,
        }
    }

    #[instrument(skip_all, fields(headless = cfg.headless))]
    pub async fn launch(cfg: &CdpConfig) -> Result<Self, AdapterError> {
        let executable = cfg.resolve_executable().ok_or_else(|| {
            AdapterError::new(AdapterErrorKind::Launch)
                .with_hint("no Chrome/Chromium executable found; set FASTFILL_CHROME")
        })?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(executable)
            .user_data_dir(&cfg.user_data_dir)
            .request_timeout(cfg.deadline())
            .viewport(None);
        if !cfg.headless {
            builder = builder.with_head();
        }
        for arg in LAUNCH_ARGS {
            builder = builder.arg(*arg);
        }
        let config = builder.build().map_err(|err| {
            AdapterError::new(AdapterErrorKind::Launch).with_hint(err)
        })?;

        let (browser, handler) = timeout(LAUNCH_TIMEOUT, Browser::launch(config))
            .await
            .map_err(|_| {
                AdapterError::new(AdapterErrorKind::Launch)
                    .with_hint(format!("browser did not start within {}s", LAUNCH_TIMEOUT.as_secs()))
                    .retriable(true)
            })?
            .map_err(|err| AdapterError::new(AdapterErrorKind::Launch).with_hint(err.to_string()))?;

        info!("browser launched");
        Ok(Self::assemble(browser, handler, cfg.deadline(), true))
    }

    #[instrument(skip(deadline))]
    pub async fn connect(ws_url: &str, deadline: Duration) -> Result<Self, AdapterError> {
        let (mut browser, handler) = Browser::connect(ws_url).await?;
        let attached = Self::spawn_handler(handler);
        // Tabs opened before attach are only listed after an explicit target fetch.
        if let Err(err) = browser.fetch_targets().await {
            debug!(error = %err, "target fetch failed");
        }
        tokio::time::sleep(TARGET_SETTLE).await;
        info!("attached to running browser");
        Ok(Self {
            browser,
            handler: attached,
            deadline,
            owned: false,
        })
    }

    fn assemble(browser: Browser, handler: Handler, deadline: Duration, owned: bool) -> Self {
        Self {
            browser,
            handler: Self::spawn_handler(handler),
            deadline,
            owned,
        }
    }

    fn spawn_handler(handler: Handler) -> JoinHandle<()> {
        tokio::spawn(handler_loop(handler))
    }

    /// Whether closing this handle ends the browser process.
    pub fn owns_process(&self) -> bool {
        self.owned
    }

    /// Opens a new tab on `url`.
    pub async fn open_page(&self, url: &str) -> Result<CdpPage, AdapterError> {
        let page = self.browser.new_page(url).await?;
        if let Err(err) = page.wait_for_navigation().await {
            warn!(%url, error = %err, "navigation did not settle");
        }
        Ok(CdpPage::new(page, self.deadline))
    }

    /// The first open tab, which is the one the user is looking at after attach.
    pub async fn active_page(&self) -> Result<CdpPage, AdapterError> {
        let pages = self.browser.pages().await?;
        debug!(count = pages.len(), "open pages");
        pages
            .into_iter()
            .next()
            .map(|page| CdpPage::new(page, self.deadline))
            .ok_or_else(|| AdapterError::new(AdapterErrorKind::NoPage))
    }

    /// Closes a launched browser; an attached one is only detached.
    pub async fn close(mut self) -> Result<(), AdapterError> {
        if self.owned {
            self.browser.close().await?;
            if let Err(err) = self.browser.wait().await {
                warn!(error = %err, "browser process did not exit cleanly");
            }
        }
        self.handler.abort();
        Ok(())
    }
}

async fn handler_loop(mut handler: Handler) {
    while let Some(event) = handler.next().await {
        if let Err(err) = event {
            trace!(error = %err, "handler stream ended");
            break;
        }
    }
}
