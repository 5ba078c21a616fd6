use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;

use super::Finalizer;

/// Run the deadline sweep on `period` for the lifetime of the server.
///
/// Ticks that fall due while a sweep is still running are skipped, so at most
/// one sweep is in flight.
pub fn spawn_deadline_sweep(finalizer: Arc<Finalizer>, period: Duration) {
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            log::debug!("Running deadline sweep");
            match finalizer.finalize_due_deadlines(Utc::now()).await {
                Ok(report) if !report.finalized.is_empty() || report.contended > 0 || !report.is_clean() => {
                    log::info!(
                        "Deadline sweep: {} finalized, {} failed, {} contended, {} not due",
                        report.finalized.len(),
                        report.failed.len(),
                        report.contended,
                        report.not_due
                    );
                }
                Ok(_) => {}
                Err(e) => log::error!("Deadline sweep failed: {}", e),
            }
        }
    });
}
