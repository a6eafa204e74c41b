use tracing::{debug, info};

use crate::scheduler::Scheduler;
use crate::store::ShadowStore;

/// Register the recurring eviction sweep. The job holds only a store
/// handle; locking stays inside `ShadowStore`.
pub async fn register_sweep(
    scheduler: &Scheduler,
    store: ShadowStore,
    cron_expr: &str,
) -> anyhow::Result<()> {
    scheduler
        .every(cron_expr, "shadow-sweep", move || {
            let store = store.clone();
            async move {
                let evicted = store.sweep().await;
                if evicted > 0 {
                    info!(
                        "Evicted {} expired message(s), {} retained",
                        evicted,
                        store.count().await
                    );
                } else {
                    debug!("Sweep found nothing older than {}h", store.ttl().num_hours());
                }
            }
        })
        .await
}
