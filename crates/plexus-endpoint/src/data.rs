// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decode-and-forward of inbound DATALIST / DATA messages.
//!
//! Shared by plugin endpoints and the host data bridge so both apply the
//! same malformed-payload policy.

use plexus_core::codec::{decode_data_list, decode_data_update};
use plexus_core::{ComponentAddress, DataReceiver, Kind, Message};
use tracing::{debug, warn};

use crate::Dispatch;

/// Decode `msg` and hand the result to `receiver`.
///
/// Bad DATALIST lines are dropped individually; a DATA payload without `=`
/// drops the whole message. Neither is fatal.
pub async fn forward_data(
    component: &ComponentAddress,
    receiver: &dyn DataReceiver,
    msg: &Message,
) -> Dispatch {
    let csv = match msg.csv() {
        Ok(csv) => csv,
        Err(e) => {
            warn!(component = %component, sender = %msg.sender, error = %e, "dropping data message");
            return Dispatch::Rejected(msg.kind);
        }
    };

    match msg.kind {
        Kind::DataList => {
            let decoded = decode_data_list(csv);
            for err in &decoded.rejected {
                warn!(component = %component, sender = %msg.sender, error = %err, "dropping data list line");
            }
            debug!(
                component = %component,
                records = decoded.records.len(),
                rejected = decoded.rejected.len(),
                "data list received"
            );
            match receiver.on_data_list(decoded.records).await {
                Ok(()) => Dispatch::Handled(Kind::DataList),
                Err(e) => {
                    warn!(component = %component, error = %e, "data list handler failed");
                    Dispatch::Failed(Kind::DataList)
                }
            }
        }
        Kind::Data => match decode_data_update(csv) {
            Ok((key, value)) => match receiver.on_data_update(&key, &value).await {
                Ok(()) => Dispatch::Handled(Kind::Data),
                Err(e) => {
                    warn!(component = %component, key = %key, error = %e, "data update handler failed");
                    Dispatch::Failed(Kind::Data)
                }
            },
            Err(e) => {
                warn!(component = %component, sender = %msg.sender, error = %e, "dropping data update");
                Dispatch::Rejected(Kind::Data)
            }
        },
        other => Dispatch::Ignored(other),
    }
}
