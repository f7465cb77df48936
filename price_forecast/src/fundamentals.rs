//! Point-in-time company fundamentals attached as constant feature columns.

use crate::error::Result;
use crate::features::FeatureFrame;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const MARKET_CAP: &str = "marketCap";
pub const TRAILING_PE: &str = "trailingPE";
pub const FORWARD_PE: &str = "forwardPE";
pub const PRICE_TO_BOOK: &str = "priceToBook";
pub const DIVIDEND_YIELD: &str = "dividendYield";
pub const BETA: &str = "beta";

/// Fundamental columns in the order they are attached
pub const FUNDAMENTAL_COLUMNS: [&str; 6] = [
    MARKET_CAP,
    TRAILING_PE,
    FORWARD_PE,
    PRICE_TO_BOOK,
    DIVIDEND_YIELD,
    BETA,
];

/// Fundamentals of one symbol. Missing metrics are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalsSnapshot {
    #[serde(rename = "marketCap", default)]
    pub market_cap: Option<f64>,
    #[serde(rename = "trailingPE", default)]
    pub trailing_pe: Option<f64>,
    #[serde(rename = "forwardPE", default)]
    pub forward_pe: Option<f64>,
    #[serde(rename = "priceToBook", default)]
    pub price_to_book: Option<f64>,
    #[serde(rename = "dividendYield", default)]
    pub dividend_yield: Option<f64>,
    #[serde(default)]
    pub beta: Option<f64>,
}

impl FundamentalsSnapshot {
    /// Snapshot with every metric undefined
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// `(column, value)` pairs in attachment order
    pub fn values(&self) -> [(&'static str, Option<f64>); 6] {
        [
            (MARKET_CAP, self.market_cap),
            (TRAILING_PE, self.trailing_pe),
            (FORWARD_PE, self.forward_pe),
            (PRICE_TO_BOOK, self.price_to_book),
            (DIVIDEND_YIELD, self.dividend_yield),
            (BETA, self.beta),
        ]
    }

    /// Write every metric as a constant column of the frame
    pub fn attach_to(&self, frame: &mut FeatureFrame) {
        for (name, value) in self.values() {
            frame.insert_constant(name, value);
        }
    }
}

/// Capability that looks up fundamentals for a symbol
pub trait FundamentalsSource: Send + Sync {
    fn fetch_fundamentals(&self, symbol: &str) -> Result<FundamentalsSnapshot>;
}

/// How often fundamentals are fetched during one forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundamentalsPolicy {
    /// Fetch once per forecast call and reuse the snapshot for every step
    #[default]
    FetchOnce,
    /// Fetch again on every recursive step
    FetchPerStep,
}

/// Attaches fundamentals to frames for the duration of one forecast call.
///
/// Fetch failures never propagate: the frame receives undefined values.
pub struct FundamentalsAttacher<'a, S: FundamentalsSource + ?Sized> {
    source: &'a S,
    symbol: &'a str,
    policy: FundamentalsPolicy,
    cached: Option<FundamentalsSnapshot>,
    fetches: usize,
}

impl<'a, S: FundamentalsSource + ?Sized> FundamentalsAttacher<'a, S> {
    pub fn new(source: &'a S, symbol: &'a str, policy: FundamentalsPolicy) -> Self {
        Self {
            source,
            symbol,
            policy,
            cached: None,
            fetches: 0,
        }
    }

    /// The snapshot to use for the next frame, fetching as the policy requires
    pub fn snapshot(&mut self) -> FundamentalsSnapshot {
        if self.policy == FundamentalsPolicy::FetchOnce {
            if let Some(snapshot) = &self.cached {
                return snapshot.clone();
            }
        }

        self.fetches += 1;
        let snapshot = match self.source.fetch_fundamentals(self.symbol) {
            Ok(snapshot) => {
                debug!(symbol = self.symbol, "fetched fundamentals");
                snapshot
            }
            Err(e) => {
                warn!(symbol = self.symbol, error = %e, "fundamentals unavailable, using undefined values");
                FundamentalsSnapshot::unavailable()
            }
        };
        self.cached = Some(snapshot.clone());
        snapshot
    }

    /// Attach the current snapshot to a frame
    pub fn attach(&mut self, frame: &mut FeatureFrame) {
        self.snapshot().attach_to(frame);
    }

    /// Number of fetches issued so far
    pub fn fetches(&self) -> usize {
        self.fetches
    }
}
