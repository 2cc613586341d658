use serde::Serialize;
use serde_json::Value;

/// Reports whether the observed object drifted from the desired one. The
/// desired document has to be a structural subset of the observed document —
/// the server defaults fields the forge never sets, and those must not count
/// as drift.
pub fn requires_update<T: Serialize>(desired: &T, observed: &T) -> Result<bool, serde_json::Error> {
    let desired = serde_json::to_value(desired)?;
    let observed = serde_json::to_value(observed)?;

    Ok(!is_subset(&desired, &observed))
}

fn is_subset(desired: &Value, observed: &Value) -> bool {
    match (desired, observed) {
        (Value::Object(desired), Value::Object(observed)) => {
            desired.iter().all(|(key, desired_value)| {
                if desired_value.is_null() {
                    return true;
                }

                observed
                    .get(key)
                    .map(|observed_value| is_subset(desired_value, observed_value))
                    .unwrap_or(false)
            })
        }
        (Value::Array(desired), Value::Array(observed)) => {
            desired.len() <= observed.len()
                && desired
                    .iter()
                    .zip(observed)
                    .all(|(desired_value, observed_value)| {
                        is_subset(desired_value, observed_value)
                    })
        }
        (desired, observed) => desired == observed,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::requires_update;

    #[test]
    fn identical_documents_require_no_update() {
        let desired = json!({ "spec": { "replicas": 1 } });

        assert!(!requires_update(&desired, &desired.clone()).unwrap());
    }

    #[test]
    fn server_defaulted_fields_are_not_drift() {
        let desired = json!({ "spec": { "replicas": 1 } });
        let observed = json!({
            "spec": {
                "replicas": 1,
                "progressDeadlineSeconds": 600,
                "strategy": { "type": "RollingUpdate" }
            },
            "status": { "readyReplicas": 1 }
        });

        assert!(!requires_update(&desired, &observed).unwrap());
    }

    #[test]
    fn changed_scalars_are_drift() {
        let desired = json!({ "spec": { "replicas": 3 } });
        let observed = json!({ "spec": { "replicas": 1 } });

        assert!(requires_update(&desired, &observed).unwrap());
    }

    #[test]
    fn missing_desired_fields_are_drift() {
        let desired = json!({ "spec": { "replicas": 1, "paused": false } });
        let observed = json!({ "spec": { "replicas": 1 } });

        assert!(requires_update(&desired, &observed).unwrap());
    }

    #[test]
    fn null_desired_fields_are_ignored() {
        let desired = json!({ "spec": { "replicas": 1, "paused": null } });
        let observed = json!({ "spec": { "replicas": 1 } });

        assert!(!requires_update(&desired, &observed).unwrap());
    }

    #[test]
    fn arrays_are_compared_positionally() {
        let desired = json!({ "env": [{ "name": "A", "value": "1" }] });
        let observed = json!({ "env": [{ "name": "A", "value": "2" }] });

        assert!(requires_update(&desired, &observed).unwrap());
    }

    #[test]
    fn trailing_observed_array_entries_are_not_drift() {
        let desired = json!({ "env": [{ "name": "A", "value": "1" }] });
        let observed = json!({
            "env": [
                { "name": "A", "value": "1" },
                { "name": "INJECTED", "value": "by-webhook" }
            ]
        });

        assert!(!requires_update(&desired, &observed).unwrap());
    }
}
