use serde::{Deserialize, Serialize};

/// User record, restricted to the fields the payment core owns.
///
/// `is_pro` flips false -> true exactly once in the normal flow; there is no
/// downgrade path. `pro_expires_at` stays NULL in this product (perpetual
/// PRO) but the column is kept for forward compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub is_pro: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pro_expires_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
}
