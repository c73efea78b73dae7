//! Diagnostic rendering of a carrier chain.

use std::fmt;

use crate::carrier::Carrier;
use crate::persistent::Persistent;

/// Displays a declaration's lifecycle followed by one line per stored carrier.
#[derive(Debug)]
pub struct HistoryDump<'decl, C> {
    persistent: &'decl Persistent<C>,
}

impl<'decl, C: Carrier> HistoryDump<'decl, C> {
    pub(crate) const fn new(persistent: &'decl Persistent<C>) -> Self {
        Self { persistent }
    }
}

impl<C: Carrier> fmt::Display for HistoryDump<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lifecycle = self.persistent.lifecycle();
        writeln!(
            f,
            "created {}, modified {}, lowered {}, removed {}",
            lifecycle.created_on, lifecycle.last_modified, lifecycle.lowered_up_to, lifecycle.removed_on
        )?;

        let head = lifecycle.last_modified;
        for stage in self.persistent.carrier_stages() {
            if stage == head {
                writeln!(f, "  {stage} (head)")?;
            } else {
                writeln!(f, "  {stage}")?;
            }
        }
        Ok(())
    }
}
