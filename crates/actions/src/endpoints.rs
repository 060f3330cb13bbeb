use thiserror::Error;

use dlassist_core::ApplicationError;

pub const CREATE_LICENSE: &str = "create_license";
pub const GET_LICENSE_DETAILS: &str = "get_license_details";
pub const UPDATE_LICENSE_STATUS: &str = "update_license_status";
pub const CHANGE_ADDRESS: &str = "change_address";
pub const RENEW_LICENSE: &str = "renew_license";
pub const DUPLICATE_LICENSE: &str = "duplicate_license";
pub const ADD_VEHICLE_TYPE: &str = "add_vehicle_type";
pub const REMOVE_VEHICLE_TYPE: &str = "remove_vehicle_type";
pub const UPDATE_CONTACT: &str = "update_contact";

const ENDPOINTS: &[(&str, &str)] = &[
    (CREATE_LICENSE, "/drivingLicense/create"),
    (GET_LICENSE_DETAILS, "/drivingLicense/getLicenseDetails"),
    (UPDATE_LICENSE_STATUS, "/drivingLicense/updateStatus"),
    (CHANGE_ADDRESS, "/drivingLicense/changeAddress"),
    (RENEW_LICENSE, "/drivingLicense/renewLicense"),
    (DUPLICATE_LICENSE, "/drivingLicense/requestDuplicate"),
    (ADD_VEHICLE_TYPE, "/drivingLicense/addVehicleType"),
    (REMOVE_VEHICLE_TYPE, "/drivingLicense/removeVehicleType"),
    (UPDATE_CONTACT, "/drivingLicense/updateContact"),
];

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown backend endpoint `{0}`")]
pub struct UnknownEndpoint(pub String);

impl From<UnknownEndpoint> for ApplicationError {
    fn from(error: UnknownEndpoint) -> Self {
        ApplicationError::Configuration(error.to_string())
    }
}

/// Maps symbolic operation names onto URLs under the configured backend base.
#[derive(Clone, Debug)]
pub struct EndpointResolver {
    base_url: String,
}

impl EndpointResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self { base_url: base_url.trim_end_matches('/').to_string() }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn resolve(&self, key: &str) -> Result<String, UnknownEndpoint> {
        ENDPOINTS
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, path)| format!("{}{path}", self.base_url))
            .ok_or_else(|| UnknownEndpoint(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use dlassist_core::ApplicationError;

    use super::{EndpointResolver, UnknownEndpoint, ENDPOINTS, GET_LICENSE_DETAILS, UPDATE_CONTACT};

    #[test]
    fn resolves_known_keys_without_doubling_slashes() {
        let resolver = EndpointResolver::new("http://localhost:7500/");

        assert_eq!(
            resolver.resolve(GET_LICENSE_DETAILS),
            Ok("http://localhost:7500/drivingLicense/getLicenseDetails".to_string())
        );
        assert_eq!(
            resolver.resolve(UPDATE_CONTACT),
            Ok("http://localhost:7500/drivingLicense/updateContact".to_string())
        );
    }

    #[test]
    fn unknown_key_is_a_configuration_error() {
        let resolver = EndpointResolver::new("http://localhost:7500");

        let error = resolver.resolve("delete_everything").expect_err("unknown key");
        assert_eq!(error, UnknownEndpoint("delete_everything".to_string()));

        let application: ApplicationError = error.into();
        assert_eq!(application.error_class(), "configuration");
    }

    #[test]
    fn every_key_resolves() {
        let resolver = EndpointResolver::new("http://backend");
        assert_eq!(ENDPOINTS.len(), 9);
        for (key, _) in ENDPOINTS {
            assert!(resolver.resolve(key).is_ok(), "{key} should resolve");
        }
    }
}
