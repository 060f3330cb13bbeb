use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Uniform `{success, message, data}` wrapper returned by every backend route.
///
/// A missing `success` field deserializes as `false`, so anything short of an
/// explicit `success: true` is treated as a failure.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ApiEnvelope {
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Decodes `data` into `T`; `None` when the payload is absent, `null`, an
    /// empty object, or does not fit the target shape.
    pub fn data_as<T>(&self) -> Option<T>
    where
        T: DeserializeOwned,
    {
        match &self.data {
            None | Some(Value::Null) => None,
            Some(Value::Object(fields)) if fields.is_empty() => None,
            Some(value) => serde_json::from_value(value.clone()).ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ApiEnvelope;
    use crate::domain::license::LicenseRecord;

    #[test]
    fn missing_success_flag_is_failure() {
        let envelope: ApiEnvelope =
            serde_json::from_value(json!({ "message": "ok", "data": {} })).expect("envelope");

        assert!(!envelope.is_success());
    }

    #[test]
    fn data_decodes_into_license_record() {
        let envelope: ApiEnvelope = serde_json::from_value(json!({
            "success": true,
            "message": "Driving license retrieved successfully",
            "data": { "licenseNumber": "DL123456789", "firstName": "Jane", "lastName": "Doe" }
        }))
        .expect("envelope");

        let record: LicenseRecord = envelope.data_as().expect("record");
        assert_eq!(record.license_number.as_deref(), Some("DL123456789"));
        assert_eq!(record.full_name(), "Jane Doe");
    }

    #[test]
    fn null_data_yields_none() {
        let envelope: ApiEnvelope =
            serde_json::from_value(json!({ "success": true, "data": null })).expect("envelope");

        assert!(envelope.data_as::<LicenseRecord>().is_none());
    }

    #[test]
    fn empty_object_data_yields_none() {
        let envelope: ApiEnvelope =
            serde_json::from_value(json!({ "success": true, "message": "ok", "data": {} }))
                .expect("envelope");

        assert!(envelope.is_success());
        assert!(envelope.data_as::<LicenseRecord>().is_none());
    }
}
