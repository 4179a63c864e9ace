// ----- standard library imports
// ----- extra library imports
use anyhow::Result as AnyResult;
use axum::extract::FromRef;
use axum::routing::{get, post};
use axum::Router;
use serde_with::{serde_as, DisplayFromStr};
use solana_sdk::pubkey::Pubkey;
use solswap_webapi::swap as web_swap;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
// ----- local modules
mod compose;
mod error;
mod fees;
mod jupiter;
mod ledger;
mod route;
mod service;
#[cfg(any(test, feature = "test-utils"))]
mod utils;
mod web;
// ----- local imports
pub use error::{Error, Result};
pub use fees::{FeeBreakdown, FeeRate};
pub use route::{RouteQuery, RouteQuote, SelectionPolicy};
pub use service::{FreshnessSource, RouteFinder, SwapPolicy, SwapRequest};

// ----- end imports

type ProdRouteFinder = jupiter::JupiterClient;
type ProdFreshnessSource = ledger::RpcLedger;
type ProdSwapService = service::Service<ProdRouteFinder, ProdFreshnessSource>;

fn default_fee_numerator() -> u64 {
    fees::DEFAULT_FEE_NUMERATOR
}
fn default_fee_denominator() -> u64 {
    fees::DEFAULT_FEE_DENOMINATOR
}
fn default_slippage_bps() -> u16 {
    route::DEFAULT_SLIPPAGE_BPS
}

#[serde_as]
#[derive(Clone, Debug, serde::Deserialize)]
pub struct AppConfig {
    #[serde_as(as = "DisplayFromStr")]
    fee_recipient: Pubkey,
    #[serde(default = "default_fee_numerator")]
    fee_numerator: u64,
    #[serde(default = "default_fee_denominator")]
    fee_denominator: u64,
    #[serde(default = "default_slippage_bps")]
    slippage_bps: u16,
    /// the Jupiter adapter yields one candidate per quote, so `max_output`
    /// only re-ranks when a route finder returns several
    #[serde(default)]
    selection: SelectionPolicy,
    routing: jupiter::JupiterClientConfig,
    ledger: ledger::LedgerClientConfig,
}

impl AppConfig {
    fn policy(&self) -> AnyResult<SwapPolicy> {
        anyhow::ensure!(
            self.slippage_bps <= 10_000,
            "slippage {} bps above 100%",
            self.slippage_bps
        );
        Ok(SwapPolicy {
            fee_rate: FeeRate::new(self.fee_numerator, self.fee_denominator)?,
            fee_recipient: self.fee_recipient,
            slippage_bps: self.slippage_bps,
            selection: self.selection,
            routing_timeout: self.routing.timeout,
            freshness_timeout: self.ledger.timeout,
        })
    }
}

#[derive(Clone, FromRef)]
pub struct AppController {
    swap: ProdSwapService,
}

impl AppController {
    pub fn new(cfg: AppConfig) -> AnyResult<Self> {
        let policy = cfg.policy()?;
        let routes = ProdRouteFinder::new(&cfg.routing)?;
        let ledger = ProdFreshnessSource::new(&cfg.ledger);
        tracing::info!(
            "fee {}/{} to {}, slippage {} bps, routing via {}",
            policy.fee_rate.numerator(),
            policy.fee_rate.denominator(),
            policy.fee_recipient,
            policy.slippage_bps,
            cfg.routing.base_url
        );
        let srv = ProdSwapService {
            routes,
            ledger,
            policy,
        };
        Ok(Self { swap: srv })
    }
}

pub fn routes(ctrl: AppController) -> Router {
    build_router::<_, ProdRouteFinder, ProdFreshnessSource>(ctrl)
}

fn build_router<Cntrlr, Routes, Ledger>(ctrl: Cntrlr) -> Router
where
    Routes: service::RouteFinder + Clone + 'static,
    Ledger: service::FreshnessSource + Clone + 'static,
    service::Service<Routes, Ledger>: FromRef<Cntrlr>,
    Cntrlr: Send + Sync + Clone + 'static,
{
    let swagger = utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi());
    let web = Router::new()
        .route("/", get(web::health))
        .route(
            "/v1/swap/transaction",
            post(web::swap_transaction::<Routes, Ledger>),
        )
        // path used by existing front ends
        .route(
            "/getSwapTransaction",
            post(web::swap_transaction::<Routes, Ledger>),
        )
        .route("/v1/info", get(web::service_info::<Routes, Ledger>))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any)
                .expose_headers(Any),
        );

    Router::new()
        .merge(web)
        .with_state(ctrl)
        .merge(swagger)
        .layer(TraceLayer::new_for_http())
}

#[derive(utoipa::OpenApi)]
#[openapi(
    components(schemas(
        web_swap::Amount,
        web_swap::SwapTransactionRequest,
        web_swap::SwapTransactionResponse,
        web_swap::ErrorResponse,
        web_swap::ServiceInfo,
    )),
    paths(web::health, web::swap_transaction, web::service_info)
)]
struct ApiDoc;

#[cfg(feature = "test-utils")]
pub mod test_utils {
    // ----- standard library imports
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    // ----- extra library imports
    use async_trait::async_trait;
    use solana_sdk::hash::Hash;
    // ----- local imports
    use super::*;
    pub use crate::utils::{blockhash, fee_recipient, input_mint, output_mint, payer};

    // ----- end imports

    /// output mint for which the test routing service knows no path
    pub fn unroutable_mint() -> Pubkey {
        Pubkey::new_from_array([99u8; 32])
    }

    #[derive(Debug, Default, Clone)]
    pub struct CallCounter(Arc<AtomicUsize>);
    impl CallCounter {
        pub fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
        fn hit(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Answers every query with one route of `instructions` generated instructions.
    #[derive(Debug, Clone)]
    pub struct TestRouteFinder {
        pub calls: CallCounter,
        pub instructions: usize,
    }
    #[async_trait]
    impl RouteFinder for TestRouteFinder {
        async fn find_routes(
            &self,
            query: &RouteQuery,
        ) -> AnyResult<Option<Vec<RouteQuote>>> {
            self.calls.hit();
            if query.output_mint == unroutable_mint() {
                return Ok(Some(Vec::new()));
            }
            Ok(Some(vec![crate::utils::generate_route(
                query.amount,
                self.instructions,
            )]))
        }
    }

    #[derive(Debug, Default, Clone)]
    pub struct TestFreshnessSource {
        pub calls: CallCounter,
    }
    #[async_trait]
    impl FreshnessSource for TestFreshnessSource {
        async fn latest_blockhash(&self) -> AnyResult<Hash> {
            self.calls.hit();
            Ok(blockhash())
        }
    }

    type TestSwapService = service::Service<TestRouteFinder, TestFreshnessSource>;

    #[derive(Clone, FromRef)]
    pub struct AppController {
        swap: TestSwapService,
    }

    /// call counters of the collaborators behind a test server
    #[derive(Debug, Clone)]
    pub struct TestCounters {
        pub routes: CallCounter,
        pub ledger: CallCounter,
    }

    impl AppController {
        pub fn new() -> (Self, TestCounters) {
            let routes = TestRouteFinder {
                calls: CallCounter::default(),
                instructions: 2,
            };
            let ledger = TestFreshnessSource::default();
            let counters = TestCounters {
                routes: routes.calls.clone(),
                ledger: ledger.calls.clone(),
            };
            let policy = SwapPolicy {
                fee_rate: FeeRate::default(),
                fee_recipient: fee_recipient(),
                slippage_bps: route::DEFAULT_SLIPPAGE_BPS,
                selection: SelectionPolicy::First,
                routing_timeout: Duration::from_secs(1),
                freshness_timeout: Duration::from_secs(1),
            };
            let srv = TestSwapService {
                routes,
                ledger,
                policy,
            };
            (Self { swap: srv }, counters)
        }
    }

    pub fn build_test_server() -> (axum_test::TestServer, TestCounters) {
        let cfg = axum_test::TestServerConfig {
            transport: Some(axum_test::Transport::HttpRandomPort),
            ..Default::default()
        };
        let (cntrl, counters) = AppController::new();
        let server = axum_test::TestServer::new_with_config(
            build_router::<_, TestRouteFinder, TestFreshnessSource>(cntrl),
            cfg,
        )
        .expect("failed to start test server");
        (server, counters)
    }
}
