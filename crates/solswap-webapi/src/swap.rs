// ----- standard library imports
// ----- extra library imports
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
// ----- local imports

// ----- end imports

/// Amount in the smallest unit of the input mint.
/// Sent as a decimal string so values above 2^53 survive JSON parsers,
/// a plain JSON integer is accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum Amount {
    Text(String),
    Integer(u64),
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Amount::Text(text) => write!(f, "{text}"),
            Amount::Integer(value) => write!(f, "{value}"),
        }
    }
}

impl std::convert::From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount::Text(value.to_string())
    }
}

///--------------------------- Swap transaction
/// every field is optional on the wire so that a missing one is reported
/// as an invalid request instead of a framework rejection
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwapTransactionRequest {
    #[serde(alias = "inputAsset", skip_serializing_if = "Option::is_none")]
    pub input_mint: Option<String>,
    #[serde(alias = "outputAsset", skip_serializing_if = "Option::is_none")]
    pub output_mint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_public_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SwapTransactionResponse {
    /// base64 encoded unsigned transaction
    pub transaction: String,
}

///--------------------------- Errors
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

///--------------------------- Service info
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub fee_numerator: u64,
    pub fee_denominator: u64,
    pub slippage_bps: u16,
    pub fee_recipient: String,
}
