//! Chromium backend for the fastfill page port.
//!
//! [`CdpBrowser`] launches or attaches to a browser; [`CdpPage`] implements
//! [`page_dom::PageDom`] on one of its tabs by evaluating small scripts over the DevTools protocol.

pub mod browser;
pub mod config;
pub mod error;
pub mod page;
mod scripts;

pub use browser::CdpBrowser;
pub use config::{detect_chrome_executable, CdpConfig};
pub use error::{AdapterError, AdapterErrorKind};
pub use page::CdpPage;
