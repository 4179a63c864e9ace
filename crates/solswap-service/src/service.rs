// ----- standard library imports
use std::str::FromStr;
use std::time::Duration;
// ----- extra library imports
use anyhow::Result as AnyResult;
use async_trait::async_trait;
use solana_sdk::{hash::Hash, pubkey::Pubkey};
use solswap_webapi::swap as web_swap;
// ----- local imports
use crate::compose;
use crate::error::{Error, Result};
use crate::fees::{self, FeeBreakdown, FeeRate};
use crate::route::{RouteQuery, RouteQuote, SelectionPolicy};

// ----- end imports

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouteFinder: Send + Sync {
    /// candidates ordered best first, None when the service knows no path
    async fn find_routes(&self, query: &RouteQuery) -> AnyResult<Option<Vec<RouteQuote>>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FreshnessSource: Send + Sync {
    async fn latest_blockhash(&self) -> AnyResult<Hash>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapRequest {
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
    pub gross_amount: u64,
    pub payer: Pubkey,
}

fn parse_pubkey(field: &str, value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value).map_err(|e| Error::InvalidRequest(format!("{field}: {e}")))
}

impl std::convert::TryFrom<web_swap::SwapTransactionRequest> for SwapRequest {
    type Error = Error;

    fn try_from(request: web_swap::SwapTransactionRequest) -> Result<Self> {
        let web_swap::SwapTransactionRequest {
            input_mint,
            output_mint,
            amount,
            user_public_key,
        } = request;
        let present = |field: Option<String>| field.filter(|f| !f.trim().is_empty());
        let input_mint = present(input_mint);
        let output_mint = present(output_mint);
        let user_public_key = present(user_public_key);
        let amount = amount.filter(|a| match a {
            web_swap::Amount::Text(text) => !text.trim().is_empty(),
            web_swap::Amount::Integer(_) => true,
        });

        let mut missing = Vec::new();
        if input_mint.is_none() {
            missing.push("inputMint");
        }
        if output_mint.is_none() {
            missing.push("outputMint");
        }
        if amount.is_none() {
            missing.push("amount");
        }
        if user_public_key.is_none() {
            missing.push("userPublicKey");
        }
        let (Some(input_mint), Some(output_mint), Some(amount), Some(user_public_key)) =
            (input_mint, output_mint, amount, user_public_key)
        else {
            return Err(Error::InvalidRequest(format!(
                "Missing parameters: {}",
                missing.join(", ")
            )));
        };

        let gross_amount = match amount {
            web_swap::Amount::Text(text) => fees::parse_amount(&text)?,
            web_swap::Amount::Integer(value) => value,
        };
        if gross_amount == 0 {
            return Err(Error::InvalidAmount(String::from(
                "amount must be greater than zero",
            )));
        }
        Ok(Self {
            input_mint: parse_pubkey("inputMint", input_mint.trim())?,
            output_mint: parse_pubkey("outputMint", output_mint.trim())?,
            gross_amount,
            payer: parse_pubkey("userPublicKey", user_public_key.trim())?,
        })
    }
}

/// Process-wide constants, fixed at startup.
#[derive(Debug, Clone)]
pub struct SwapPolicy {
    pub fee_rate: FeeRate,
    pub fee_recipient: Pubkey,
    pub slippage_bps: u16,
    pub selection: SelectionPolicy,
    pub routing_timeout: Duration,
    pub freshness_timeout: Duration,
}

#[derive(Clone)]
pub struct Service<Routes, Ledger> {
    pub routes: Routes,
    pub ledger: Ledger,
    pub policy: SwapPolicy,
}

impl<Routes, Ledger> Service<Routes, Ledger> {
    pub fn compute_fee(&self, gross_amount: u64) -> Result<FeeBreakdown> {
        self.policy.fee_rate.compute_fee(gross_amount)
    }

    pub fn service_info(&self) -> web_swap::ServiceInfo {
        web_swap::ServiceInfo {
            fee_numerator: self.policy.fee_rate.numerator(),
            fee_denominator: self.policy.fee_rate.denominator(),
            slippage_bps: self.policy.slippage_bps,
            fee_recipient: self.policy.fee_recipient.to_string(),
        }
    }
}

impl<Routes, Ledger> Service<Routes, Ledger>
where
    Routes: RouteFinder,
{
    pub async fn select_route(
        &self,
        input_mint: Pubkey,
        output_mint: Pubkey,
        net_amount: u64,
        slippage_bps: u16,
        user: Pubkey,
    ) -> Result<RouteQuote> {
        let query = RouteQuery {
            input_mint,
            output_mint,
            amount: net_amount,
            slippage_bps,
            force_fetch: true,
            user,
        };
        let timeout = self.policy.routing_timeout;
        let candidates = tokio::time::timeout(timeout, self.routes.find_routes(&query))
            .await
            .map_err(|_| {
                Error::RoutingServiceUnavailable(anyhow::anyhow!(
                    "no answer within {timeout:?}"
                ))
            })?
            .map_err(Error::RoutingServiceUnavailable)?;
        tracing::debug!(
            "{} candidate routes for {net_amount}",
            candidates.as_ref().map_or(0, Vec::len)
        );
        let route = self.policy.selection.pick(candidates)?;
        if route.net_amount_in != net_amount {
            tracing::warn!(
                "route {} quotes input {} for requested {}",
                route.route_id,
                route.net_amount_in,
                net_amount
            );
        }
        Ok(route)
    }
}

impl<Routes, Ledger> Service<Routes, Ledger>
where
    Ledger: FreshnessSource,
{
    pub async fn fetch_blockhash(&self) -> Result<Hash> {
        let timeout = self.policy.freshness_timeout;
        tokio::time::timeout(timeout, self.ledger.latest_blockhash())
            .await
            .map_err(|_| {
                Error::FreshnessUnavailable(anyhow::anyhow!("no answer within {timeout:?}"))
            })?
            .map_err(Error::FreshnessUnavailable)
    }
}

impl<Routes, Ledger> Service<Routes, Ledger>
where
    Routes: RouteFinder,
    Ledger: FreshnessSource,
{
    /// Returns the base64 encoded unsigned transaction.
    #[tracing::instrument(skip_all, fields(input = %request.input_mint, output = %request.output_mint, amount = request.gross_amount))]
    pub async fn swap_transaction(&self, request: &SwapRequest) -> Result<String> {
        let fee = self.compute_fee(request.gross_amount)?;
        tracing::debug!(
            "fee {} net {} for gross {}",
            fee.fee_amount,
            fee.net_amount,
            fee.gross_amount
        );
        let route = self
            .select_route(
                request.input_mint,
                request.output_mint,
                fee.net_amount,
                self.policy.slippage_bps,
                request.payer,
            )
            .await?;
        let recent_blockhash = self.fetch_blockhash().await?;
        let composed = compose::compose_transaction(
            &fee,
            &request.payer,
            &self.policy.fee_recipient,
            &route,
            recent_blockhash,
        )?;
        let encoded = composed.to_base64()?;
        tracing::info!(
            "composed swap transaction via route {} with {} instructions",
            route.route_id,
            composed.instructions.len()
        );
        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils;
    use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
    use solana_sdk::transaction::Transaction;

    fn policy() -> SwapPolicy {
        SwapPolicy {
            fee_rate: FeeRate::default(),
            fee_recipient: utils::fee_recipient(),
            slippage_bps: crate::route::DEFAULT_SLIPPAGE_BPS,
            selection: SelectionPolicy::First,
            routing_timeout: Duration::from_secs(10),
            freshness_timeout: Duration::from_secs(5),
        }
    }

    fn request(gross_amount: u64) -> SwapRequest {
        SwapRequest {
            input_mint: utils::input_mint(),
            output_mint: utils::output_mint(),
            gross_amount,
            payer: utils::payer(),
        }
    }

    fn decode(encoded: &str) -> Transaction {
        let bytes = B64.decode(encoded).expect("base64");
        bincode::deserialize(&bytes).expect("transaction")
    }

    #[tokio::test]
    async fn swap_transaction_one_million() {
        let mut routes = MockRouteFinder::new();
        routes
            .expect_find_routes()
            .withf(|q| {
                q.amount == 999_700
                    && q.slippage_bps == 50
                    && q.force_fetch
                    && q.input_mint == utils::input_mint()
                    && q.output_mint == utils::output_mint()
                    && q.user == utils::payer()
            })
            .times(1)
            .returning(|q| Ok(Some(vec![utils::generate_route(q.amount, 2)])));
        let mut ledger = MockFreshnessSource::new();
        ledger
            .expect_latest_blockhash()
            .times(1)
            .returning(|| Ok(utils::blockhash()));
        let srvc = Service {
            routes,
            ledger,
            policy: policy(),
        };

        let encoded = srvc.swap_transaction(&request(1_000_000)).await.unwrap();
        let tx = decode(&encoded);
        assert_eq!(tx.message.instructions.len(), 3);
        assert_eq!(tx.message.account_keys[0], utils::payer());
        assert_ne!(tx.message.recent_blockhash, Hash::default());
        let fee_ix = &tx.message.instructions[0];
        assert_eq!(
            tx.message.account_keys[usize::from(fee_ix.program_id_index)],
            solana_system_interface::program::ID
        );
        assert_eq!(&fee_ix.data[4..], 300u64.to_le_bytes().as_slice());
    }

    #[tokio::test]
    async fn swap_transaction_fee_rounds_to_zero() {
        let mut routes = MockRouteFinder::new();
        routes
            .expect_find_routes()
            .withf(|q| q.amount == 100)
            .returning(|q| Ok(Some(vec![utils::generate_route(q.amount, 2)])));
        let mut ledger = MockFreshnessSource::new();
        ledger
            .expect_latest_blockhash()
            .returning(|| Ok(utils::blockhash()));
        let srvc = Service {
            routes,
            ledger,
            policy: policy(),
        };

        let encoded = srvc.swap_transaction(&request(100)).await.unwrap();
        let tx = decode(&encoded);
        assert_eq!(tx.message.instructions.len(), 3);
        assert_eq!(
            &tx.message.instructions[0].data[4..],
            0u64.to_le_bytes().as_slice()
        );
    }

    #[tokio::test]
    async fn swap_transaction_is_idempotent() {
        let mut routes = MockRouteFinder::new();
        routes
            .expect_find_routes()
            .times(2)
            .returning(|q| Ok(Some(vec![utils::generate_route(q.amount, 3)])));
        let mut ledger = MockFreshnessSource::new();
        ledger
            .expect_latest_blockhash()
            .times(2)
            .returning(|| Ok(utils::blockhash()));
        let srvc = Service {
            routes,
            ledger,
            policy: policy(),
        };

        let first = srvc.swap_transaction(&request(42_000)).await.unwrap();
        let second = srvc.swap_transaction(&request(42_000)).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn swap_transaction_zero_amount() {
        let mut routes = MockRouteFinder::new();
        routes.expect_find_routes().times(0);
        let mut ledger = MockFreshnessSource::new();
        ledger.expect_latest_blockhash().times(0);
        let srvc = Service {
            routes,
            ledger,
            policy: policy(),
        };

        let r = srvc.swap_transaction(&request(0)).await;
        assert!(matches!(r.unwrap_err(), Error::InvalidAmount(_)));
    }

    #[tokio::test]
    async fn swap_transaction_empty_candidates() {
        let mut routes = MockRouteFinder::new();
        routes
            .expect_find_routes()
            .times(1)
            .returning(|_| Ok(Some(vec![])));
        let mut ledger = MockFreshnessSource::new();
        ledger.expect_latest_blockhash().times(0);
        let srvc = Service {
            routes,
            ledger,
            policy: policy(),
        };

        let r = srvc.swap_transaction(&request(1_000_000)).await;
        assert!(matches!(r.unwrap_err(), Error::NoRouteFound));
    }

    #[tokio::test]
    async fn swap_transaction_absent_candidates() {
        let mut routes = MockRouteFinder::new();
        routes.expect_find_routes().returning(|_| Ok(None));
        let mut ledger = MockFreshnessSource::new();
        ledger.expect_latest_blockhash().times(0);
        let srvc = Service {
            routes,
            ledger,
            policy: policy(),
        };

        let r = srvc.swap_transaction(&request(1_000_000)).await;
        assert!(matches!(r.unwrap_err(), Error::NoRouteFound));
    }

    #[tokio::test]
    async fn swap_transaction_routing_failure() {
        let mut routes = MockRouteFinder::new();
        routes
            .expect_find_routes()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("connection refused")));
        let mut ledger = MockFreshnessSource::new();
        ledger.expect_latest_blockhash().times(0);
        let srvc = Service {
            routes,
            ledger,
            policy: policy(),
        };

        let r = srvc.swap_transaction(&request(1_000_000)).await;
        assert!(matches!(
            r.unwrap_err(),
            Error::RoutingServiceUnavailable(_)
        ));
    }

    #[derive(Clone)]
    struct StalledRoutes;
    #[async_trait]
    impl RouteFinder for StalledRoutes {
        async fn find_routes(&self, _query: &RouteQuery) -> AnyResult<Option<Vec<RouteQuote>>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(None)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn swap_transaction_routing_timeout() {
        let mut ledger = MockFreshnessSource::new();
        ledger.expect_latest_blockhash().times(0);
        let srvc = Service {
            routes: StalledRoutes,
            ledger,
            policy: policy(),
        };

        let r = srvc.swap_transaction(&request(1_000_000)).await;
        assert!(matches!(
            r.unwrap_err(),
            Error::RoutingServiceUnavailable(_)
        ));
    }

    #[derive(Clone)]
    struct StalledLedger;
    #[async_trait]
    impl FreshnessSource for StalledLedger {
        async fn latest_blockhash(&self) -> AnyResult<Hash> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(utils::blockhash())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn swap_transaction_ledger_timeout() {
        let mut routes = MockRouteFinder::new();
        routes
            .expect_find_routes()
            .times(1)
            .returning(|q| Ok(Some(vec![utils::generate_route(q.amount, 2)])));
        let srvc = Service {
            routes,
            ledger: StalledLedger,
            policy: policy(),
        };

        let r = srvc.swap_transaction(&request(1_000_000)).await;
        assert!(matches!(r.unwrap_err(), Error::FreshnessUnavailable(_)));
    }

    #[tokio::test]
    async fn swap_transaction_ledger_failure() {
        let mut routes = MockRouteFinder::new();
        routes
            .expect_find_routes()
            .returning(|q| Ok(Some(vec![utils::generate_route(q.amount, 2)])));
        let mut ledger = MockFreshnessSource::new();
        ledger
            .expect_latest_blockhash()
            .times(1)
            .returning(|| Err(anyhow::anyhow!("rpc 503")));
        let srvc = Service {
            routes,
            ledger,
            policy: policy(),
        };

        let r = srvc.swap_transaction(&request(1_000_000)).await;
        assert!(matches!(r.unwrap_err(), Error::FreshnessUnavailable(_)));
    }

    #[tokio::test]
    async fn swap_transaction_route_without_instructions() {
        let mut routes = MockRouteFinder::new();
        routes
            .expect_find_routes()
            .returning(|q| Ok(Some(vec![utils::generate_route(q.amount, 0)])));
        let mut ledger = MockFreshnessSource::new();
        ledger
            .expect_latest_blockhash()
            .returning(|| Ok(utils::blockhash()));
        let srvc = Service {
            routes,
            ledger,
            policy: policy(),
        };

        let r = srvc.swap_transaction(&request(1_000_000)).await;
        assert!(matches!(r.unwrap_err(), Error::CompositionFailed(_)));
    }

    #[tokio::test]
    async fn select_route_max_output_policy() {
        let mut routes = MockRouteFinder::new();
        routes.expect_find_routes().returning(|q| {
            let mut worse = utils::generate_route(q.amount, 2);
            worse.route_id = String::from("worse");
            worse.amount_out = 10;
            let mut better = utils::generate_route(q.amount, 2);
            better.route_id = String::from("better");
            better.amount_out = 20;
            Ok(Some(vec![worse, better]))
        });
        let mut policy = policy();
        policy.selection = SelectionPolicy::MaxOutput;
        let srvc = Service {
            routes,
            ledger: MockFreshnessSource::new(),
            policy,
        };

        let route = srvc
            .select_route(
                utils::input_mint(),
                utils::output_mint(),
                1_000,
                50,
                utils::payer(),
            )
            .await
            .unwrap();
        assert_eq!(route.route_id, "better");
    }

    #[test]
    fn info_exposes_policy() {
        let srvc = Service {
            routes: MockRouteFinder::new(),
            ledger: MockFreshnessSource::new(),
            policy: policy(),
        };
        let info = srvc.service_info();
        assert_eq!(info.fee_numerator, 3);
        assert_eq!(info.fee_denominator, 10_000);
        assert_eq!(info.slippage_bps, 50);
        assert_eq!(info.fee_recipient, utils::fee_recipient().to_string());
    }

    fn wire_request() -> web_swap::SwapTransactionRequest {
        web_swap::SwapTransactionRequest {
            input_mint: Some(utils::input_mint().to_string()),
            output_mint: Some(utils::output_mint().to_string()),
            amount: Some(web_swap::Amount::Text(String::from("1000000"))),
            user_public_key: Some(utils::payer().to_string()),
        }
    }

    #[test]
    fn swap_request_from_wire() {
        let request = SwapRequest::try_from(wire_request()).unwrap();
        assert_eq!(request.input_mint, utils::input_mint());
        assert_eq!(request.output_mint, utils::output_mint());
        assert_eq!(request.gross_amount, 1_000_000);
        assert_eq!(request.payer, utils::payer());
    }

    #[test]
    fn swap_request_missing_output_mint() {
        let mut wire = wire_request();
        wire.output_mint = None;
        let e = SwapRequest::try_from(wire).unwrap_err();
        assert!(matches!(e, Error::InvalidRequest(ref msg) if msg.contains("outputMint")));

        let mut wire = wire_request();
        wire.output_mint = Some(String::from("  "));
        let e = SwapRequest::try_from(wire).unwrap_err();
        assert!(matches!(e, Error::InvalidRequest(_)));
    }

    #[test]
    fn swap_request_blank_amount_is_missing() {
        let mut wire = wire_request();
        wire.amount = Some(web_swap::Amount::Text(String::from(" ")));
        let e = SwapRequest::try_from(wire).unwrap_err();
        assert!(matches!(e, Error::InvalidRequest(ref msg) if msg.contains("amount")));
    }

    #[test]
    fn swap_request_bad_pubkey() {
        let mut wire = wire_request();
        wire.user_public_key = Some(String::from("not-a-key"));
        let e = SwapRequest::try_from(wire).unwrap_err();
        assert!(matches!(e, Error::InvalidRequest(_)));
    }

    #[test]
    fn swap_request_bad_amounts() {
        for text in ["0", "-1", "2.5", "99999999999999999999999"] {
            let mut wire = wire_request();
            wire.amount = Some(web_swap::Amount::Text(String::from(text)));
            let e = SwapRequest::try_from(wire).unwrap_err();
            assert!(matches!(e, Error::InvalidAmount(_)), "{text}");
        }
        let mut wire = wire_request();
        wire.amount = Some(web_swap::Amount::Integer(0));
        let e = SwapRequest::try_from(wire).unwrap_err();
        assert!(matches!(e, Error::InvalidAmount(_)));
    }
}
