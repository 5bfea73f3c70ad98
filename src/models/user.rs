use serde::{Deserialize, Serialize};

/// The signed-in account. Passed explicitly into the services that need it;
/// nothing in this crate reads ambient session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: i64,
    pub display_name: String,
}
