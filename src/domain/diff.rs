use super::audit::FieldChange;
use super::entity::{FieldMap, FieldValue};
use std::collections::BTreeMap;

/// Compares two field maps and returns the fields whose values differ.
///
/// Fields present on only one side are compared against `Null`. Reference
/// fields are compared by identity because `FieldValue::Reference` carries
/// only the referenced id.
pub fn diff_fields(old: &FieldMap, new: &FieldMap) -> BTreeMap<String, FieldChange> {
    let mut changes = BTreeMap::new();
    for name in old.keys().chain(new.keys()) {
        if changes.contains_key(*name) {
            continue;
        }
        let before = old.get(name).unwrap_or(&FieldValue::Null);
        let after = new.get(name).unwrap_or(&FieldValue::Null);
        if before != after {
            changes.insert(
                name.to_string(),
                FieldChange {
                    old: before.to_json(),
                    new: after.to_json(),
                },
            );
        }
    }
    changes
}
