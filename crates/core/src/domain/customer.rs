use serde::{Deserialize, Serialize};

/// Contact and delivery details collected at the customer-info stage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub notes: Option<String>,
}

impl CustomerDetails {
    /// Names of the required fields that are empty or whitespace-only.
    /// Notes are optional and never reported.
    pub fn missing_fields(&self) -> Vec<String> {
        let required = [
            ("name", &self.name),
            ("phone", &self.phone),
            ("email", &self.email),
            ("address", &self.address),
        ];
        required
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| field.to_owned())
            .collect()
    }
}
