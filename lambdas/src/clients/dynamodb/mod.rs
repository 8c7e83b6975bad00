mod connections;
mod job_history;

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;

use crate::clients::StartKey;

pub use connections::DynamoConnectionStore;
pub use job_history::{DynamoJobHistoryStore, MODEL_JOB_TYPE_INDEX, TO_FILE_TYPE_INDEX};

/// Keeps the string attributes of a last-evaluated key. Every key attribute
/// of the job history table and its indexes is a string.
pub(crate) fn start_key_from_item(item: &HashMap<String, AttributeValue>) -> StartKey {
    item.iter()
        .filter_map(|(name, value)| match value {
            AttributeValue::S(value) => Some((name.clone(), value.clone())),
            _ => {
                tracing::warn!(attribute = %name, "dropping non-string key attribute");
                None
            }
        })
        .collect()
}

pub(crate) fn item_from_start_key(key: &StartKey) -> HashMap<String, AttributeValue> {
    key.iter()
        .map(|(name, value)| (name.clone(), AttributeValue::S(value.clone())))
        .collect()
}
