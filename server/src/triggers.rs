// Ticket change triggers
//
// Side effects that fire when a ticket is updated. The KPI counter is
// driven purely by the (before, after) pair so the rule stays testable
// without a database.

use std::sync::Arc;

use tracing::info;
use upkeep_shared::{is_terminal_status, Ticket};

use crate::store::{Store, StoreResult};

/// Amount to add to the org's closed-ticket counter for one update.
///
/// Counts only entries into a terminal status. A ticket moving between
/// `resolved` and `closed` stays counted once, and reopening never
/// subtracts.
pub fn closed_delta(before: &Ticket, after: &Ticket) -> i64 {
    if !is_terminal_status(&before.status) && is_terminal_status(&after.status) {
        1
    } else {
        0
    }
}

pub struct TicketChangeHandler {
    store: Arc<dyn Store>,
}

impl TicketChangeHandler {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Applies counter changes for an already-committed ticket update.
    pub async fn on_ticket_updated(&self, before: &Ticket, after: &Ticket) -> StoreResult<()> {
        if closed_delta(before, after) > 0 {
            self.store.increment_tickets_closed(after.org_id).await?;
            info!(
                "Ticket {} entered terminal status {}; closed counter bumped for org {}",
                after.id, after.status, after.org_id
            );
        }
        Ok(())
    }
}
