use std::collections::BTreeMap;
use std::str::FromStr;

use domaris_application::{CreateResourceInput, UpdateMode, UpdateResourceInput};
use domaris_core::{AppError, PrincipalId};
use domaris_domain::{OwnershipKind, ResourceRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Incoming payload for resource creation.
///
/// `relations` maps relation names (`agent`, `owner`, ...) to principal ids.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-resource-request.ts"
)]
pub struct CreateResourceRequest {
    pub display_name: String,
    #[serde(default = "empty_object")]
    #[ts(type = "Record<string, unknown>")]
    pub attributes: Value,
    #[serde(default)]
    #[ts(type = "Record<string, number>")]
    pub relations: BTreeMap<String, i64>,
}

impl TryFrom<CreateResourceRequest> for CreateResourceInput {
    type Error = AppError;

    fn try_from(value: CreateResourceRequest) -> Result<Self, Self::Error> {
        let relations = value
            .relations
            .into_iter()
            .map(|(kind, principal_id)| {
                OwnershipKind::from_str(kind.as_str())
                    .map(|kind| (kind, PrincipalId::new(principal_id)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            display_name: value.display_name,
            attributes: value.attributes,
            relations,
        })
    }
}

/// Incoming payload for resource updates (`PUT` replaces, `PATCH` merges).
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-resource-request.ts"
)]
pub struct UpdateResourceRequest {
    pub display_name: Option<String>,
    #[ts(type = "Record<string, unknown> | null")]
    pub attributes: Option<Value>,
}

impl UpdateResourceRequest {
    pub fn into_input(self, mode: UpdateMode) -> UpdateResourceInput {
        UpdateResourceInput {
            display_name: self.display_name,
            attributes: self.attributes,
            mode,
        }
    }
}

/// API representation of a collaborator resource.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/resource-response.ts"
)]
pub struct ResourceResponse {
    #[ts(type = "number")]
    pub id: i64,
    pub resource_type: String,
    pub display_name: String,
    #[ts(type = "Record<string, number | null>")]
    pub relations: BTreeMap<String, Option<i64>>,
    #[ts(type = "Record<string, unknown>")]
    pub attributes: Value,
}

impl From<ResourceRecord> for ResourceResponse {
    fn from(value: ResourceRecord) -> Self {
        let relations = value
            .resource_type()
            .ownership_kinds()
            .iter()
            .filter_map(|kind| {
                value.ownership().relation(*kind).map(|principal_id| {
                    (
                        kind.as_str().to_owned(),
                        principal_id.map(|principal_id| principal_id.as_i64()),
                    )
                })
            })
            .collect();

        Self {
            id: value.id(),
            resource_type: value.resource_type().as_str().to_owned(),
            display_name: value.display_name().to_owned(),
            relations,
            attributes: value.attributes().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use domaris_application::CreateResourceInput;
    use domaris_core::PrincipalId;
    use domaris_domain::OwnershipKind;
    use serde_json::json;

    use super::CreateResourceRequest;

    #[test]
    fn relation_names_map_to_ownership_kinds() {
        let input = CreateResourceInput::try_from(CreateResourceRequest {
            display_name: "Harbor Loft".to_owned(),
            attributes: json!({}),
            relations: BTreeMap::from([("owner".to_owned(), 7)]),
        });

        let Ok(input) = input else {
            panic!("known relation should parse");
        };
        assert_eq!(
            input.relations,
            vec![(OwnershipKind::Owner, PrincipalId::new(7))]
        );
    }

    #[test]
    fn unknown_relation_names_are_rejected() {
        let input = CreateResourceInput::try_from(CreateResourceRequest {
            display_name: "Harbor Loft".to_owned(),
            attributes: json!({}),
            relations: BTreeMap::from([("landlord".to_owned(), 7)]),
        });
        assert!(input.is_err());
    }
}
