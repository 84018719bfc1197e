use serde::{Deserialize, Serialize};

use shared_models::auth::Role;

/// Reference data used to label slots and appointments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Professional {
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default = "professional_role")]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
}

fn professional_role() -> Role {
    Role::Professional
}

impl Professional {
    pub fn display_name(&self) -> String {
        if !self.full_name.trim().is_empty() {
            return self.full_name.clone();
        }

        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_name_falls_back_to_parts() {
        let professional: Professional = serde_json::from_value(json!({
            "id": "p-1",
            "firstName": "Ana",
            "lastName": "Ruiz",
            "specialty": "Psicología"
        }))
        .unwrap();

        assert_eq!(professional.role, Role::Professional);
        assert_eq!(professional.display_name(), "Ana Ruiz");
    }
}
