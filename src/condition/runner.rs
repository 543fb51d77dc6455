// src/condition/runner.rs
use futures::future::try_join_all;
use std::collections::BTreeMap;
use tracing::debug;

use super::{CallError, Condition};
use crate::check::Check;

/// Checks grouped by condition name, in deterministic name order.
pub type CheckMap = BTreeMap<String, Vec<Check>>;

/// Run every call of every condition concurrently and collect the checks by
/// condition name (fan-out/fan-in).
///
/// The first call error aborts the whole run; dropping the returned future
/// cancels the in-flight calls. Checks that carry no observable fields are
/// filtered out, so a no-signal condition contributes nothing to the map.
pub async fn run_conditions(conditions: &[Condition]) -> Result<CheckMap, CallError> {
    let mut pending = Vec::new();
    for condition in conditions {
        for call in condition.calls() {
            let name = condition.name.clone();
            let call = call.clone();
            pending.push(async move {
                let check = call.evaluate().await?;
                Ok::<_, CallError>((name, check))
            });
        }
    }

    let results = try_join_all(pending).await?;

    let mut map = CheckMap::new();
    for (name, check) in results {
        if check.is_empty() {
            debug!(condition = %name, "check carried no fields, dropped");
            continue;
        }
        debug!(
            condition = %name,
            status = check.status.as_deref().unwrap_or("pass"),
            "collected check"
        );
        map.entry(name).or_default().push(check);
    }
    Ok(map)
}
