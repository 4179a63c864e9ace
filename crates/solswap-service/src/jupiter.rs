// ----- standard library imports
use std::time::Duration;
// ----- extra library imports
use anyhow::{Context, Result as AnyResult};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use serde_with::{serde_as, DisplayFromStr};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
// ----- local imports
use crate::route::{RouteQuery, RouteQuote};
use crate::service::RouteFinder;

// ----- end imports

pub const DEFAULT_ROUTING_TIMEOUT: Duration = Duration::from_secs(10);

fn default_timeout() -> Duration {
    DEFAULT_ROUTING_TIMEOUT
}

#[serde_as]
#[derive(Debug, Clone, serde::Deserialize)]
pub struct JupiterClientConfig {
    pub base_url: reqwest::Url,
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
}

/// Jupiter aggregator, quote plus swap-instructions endpoints.
#[derive(Debug, Clone)]
pub struct JupiterClient {
    cl: reqwest::Client,
    base: reqwest::Url,
}

impl JupiterClient {
    pub fn new(cfg: &JupiterClientConfig) -> AnyResult<Self> {
        let mut base = cfg.base_url.clone();
        // join() would drop the last path segment otherwise
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let cl = reqwest::Client::builder().timeout(cfg.timeout).build()?;
        Ok(Self { cl, base })
    }

    async fn quote(&self, query: &RouteQuery) -> AnyResult<Option<serde_json::Value>> {
        let url = self.base.join("quote")?;
        let params = QuoteParams {
            input_mint: query.input_mint.to_string(),
            output_mint: query.output_mint.to_string(),
            amount: query.amount,
            slippage_bps: query.slippage_bps,
            as_legacy_transaction: true,
        };
        let mut request = self.cl.get(url).query(&params);
        if query.force_fetch {
            request = request.header(reqwest::header::CACHE_CONTROL, "no-cache");
        }
        let res = request.send().await?;
        let status = res.status();
        if status.is_success() {
            let quote = res.json::<serde_json::Value>().await?;
            return Ok(Some(quote));
        }
        let body = res.text().await.unwrap_or_default();
        if is_no_route_answer(status, &body) {
            tracing::debug!("jupiter knows no route: {body}");
            return Ok(None);
        }
        anyhow::bail!("jupiter quote failed with {status}: {body}")
    }

    async fn swap_instructions(
        &self,
        quote: &serde_json::Value,
        user: &Pubkey,
    ) -> AnyResult<SwapInstructionsResponse> {
        let url = self.base.join("swap-instructions")?;
        let body = SwapInstructionsRequest {
            quote_response: quote,
            user_public_key: user.to_string(),
            wrap_and_unwrap_sol: true,
            as_legacy_transaction: true,
        };
        let res = self.cl.post(url).json(&body).send().await?;
        let response = res
            .error_for_status()?
            .json::<SwapInstructionsResponse>()
            .await?;
        Ok(response)
    }
}

#[async_trait]
impl RouteFinder for JupiterClient {
    async fn find_routes(&self, query: &RouteQuery) -> AnyResult<Option<Vec<RouteQuote>>> {
        let Some(quote) = self.quote(query).await? else {
            return Ok(None);
        };
        let summary: QuoteSummary =
            serde_json::from_value(quote.clone()).context("jupiter quote response")?;
        let instructions = self.swap_instructions(&quote, &query.user).await?;
        let route = into_route_quote(summary, instructions)?;
        Ok(Some(vec![route]))
    }
}

/// `errorCode` values of a /quote answer meaning no path exists
const NO_ROUTE_ERROR_CODES: [&str; 2] = ["COULD_NOT_FIND_ANY_ROUTE", "ROUTE_NOT_FOUND"];

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteErrorBody {
    #[serde(default)]
    error_code: Option<String>,
}

/// rate limits, auth failures and other rejections stay errors
fn is_no_route_answer(status: reqwest::StatusCode, body: &str) -> bool {
    if status != reqwest::StatusCode::BAD_REQUEST && status != reqwest::StatusCode::NOT_FOUND {
        return false;
    }
    serde_json::from_str::<QuoteErrorBody>(body)
        .ok()
        .and_then(|b| b.error_code)
        .is_some_and(|code| NO_ROUTE_ERROR_CODES.contains(&code.as_str()))
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct QuoteParams {
    input_mint: String,
    output_mint: String,
    amount: u64,
    slippage_bps: u16,
    as_legacy_transaction: bool,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct SwapInstructionsRequest<'a> {
    quote_response: &'a serde_json::Value,
    user_public_key: String,
    wrap_and_unwrap_sol: bool,
    as_legacy_transaction: bool,
}

#[serde_as]
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummary {
    #[serde_as(as = "DisplayFromStr")]
    in_amount: u64,
    #[serde_as(as = "DisplayFromStr")]
    out_amount: u64,
    #[serde(default)]
    route_plan: Vec<RoutePlanStep>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoutePlanStep {
    swap_info: SwapInfo,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapInfo {
    amm_key: String,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapInstructionsResponse {
    #[serde(default)]
    compute_budget_instructions: Vec<WireInstruction>,
    #[serde(default)]
    setup_instructions: Vec<WireInstruction>,
    swap_instruction: WireInstruction,
    #[serde(default)]
    cleanup_instruction: Option<WireInstruction>,
    #[serde(default)]
    address_lookup_table_addresses: Vec<String>,
}

#[serde_as]
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireInstruction {
    #[serde_as(as = "DisplayFromStr")]
    program_id: Pubkey,
    accounts: Vec<WireAccount>,
    data: String,
}

#[serde_as]
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAccount {
    #[serde_as(as = "DisplayFromStr")]
    pubkey: Pubkey,
    is_signer: bool,
    is_writable: bool,
}

impl std::convert::TryFrom<WireInstruction> for Instruction {
    type Error = anyhow::Error;

    fn try_from(wire: WireInstruction) -> AnyResult<Self> {
        let data = B64
            .decode(&wire.data)
            .with_context(|| format!("instruction data for {}", wire.program_id))?;
        let accounts = wire
            .accounts
            .into_iter()
            .map(|acc| AccountMeta {
                pubkey: acc.pubkey,
                is_signer: acc.is_signer,
                is_writable: acc.is_writable,
            })
            .collect();
        Ok(Instruction {
            program_id: wire.program_id,
            accounts,
            data,
        })
    }
}

fn into_route_quote(
    summary: QuoteSummary,
    response: SwapInstructionsResponse,
) -> AnyResult<RouteQuote> {
    anyhow::ensure!(
        response.address_lookup_table_addresses.is_empty(),
        "route requires {} address lookup tables",
        response.address_lookup_table_addresses.len()
    );
    let SwapInstructionsResponse {
        compute_budget_instructions,
        setup_instructions,
        swap_instruction,
        cleanup_instruction,
        ..
    } = response;
    let instructions = compute_budget_instructions
        .into_iter()
        .chain(setup_instructions)
        .chain(std::iter::once(swap_instruction))
        .chain(cleanup_instruction)
        .map(Instruction::try_from)
        .collect::<AnyResult<Vec<_>>>()?;

    let route_id = if summary.route_plan.is_empty() {
        String::from("jupiter")
    } else {
        summary
            .route_plan
            .iter()
            .map(|step| step.swap_info.amm_key.as_str())
            .collect::<Vec<_>>()
            .join("-")
    };
    Ok(RouteQuote {
        route_id,
        net_amount_in: summary.in_amount,
        amount_out: summary.out_amount,
        instructions,
    })
}
