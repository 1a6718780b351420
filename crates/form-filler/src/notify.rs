//! On-page status banner. Purely cosmetic: failures are logged and swallowed.

use page_dom::{Notification, Tone};
use tracing::warn;

use crate::session::FillContext;

/// Shows `message` and schedules its dismissal on the session.
pub async fn announce(ctx: &FillContext, message: impl Into<String>, tone: Tone) {
    if !ctx.policy.show_notifications {
        return;
    }
    let notification = Notification::new(message, tone);
    if let Err(err) = ctx.page.show_notification(&notification).await {
        warn!(error = %err, "failed to show notification");
        return;
    }
    let page = ctx.page.clone();
    ctx.session.spawn_after(
        ctx.policy.timings.notification(),
        "dismiss-notification",
        async move {
            if let Err(err) = page.dismiss_notification().await {
                warn!(error = %err, "failed to dismiss notification");
            }
            Ok(0)
        },
    );
}

pub fn filled_message(count: u32, duration_ms: u64) -> String {
    format!("✓ Filled {count} fields in {duration_ms}ms")
}

pub fn group_message(members: usize) -> String {
    format!("✓ Filling {members} pilgrims...")
}

pub const FAILED_MESSAGE: &str = "❌ Autofill failed";
