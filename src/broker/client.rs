// =============================================================================
// Broker adapter — local TCP gateway client
// =============================================================================
//
// Single-threaded API wrapped around an external brokerage gateway reachable
// over a local TCP socket with an authenticated client ID (the same shape as
// a TWS/IB-Gateway-style connection). All calls serialize through an
// internal mutex since the underlying socket has no concurrent-request
// multiplexing.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use parking_lot::Mutex as SyncMutex;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::broker::protocol::{read_frame, write_frame, Request, Response};
use crate::types::{Action, OrderType};

const MAX_CONNECT_RETRIES: u32 = 3;
const CONNECT_RETRY_BASE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub symbol: String,
    pub exchange: String,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Executed,
    Pending,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order_id: String,
    pub status: OrderStatus,
}

#[derive(Debug, Clone)]
pub struct BrokerPosition {
    pub symbol: String,
    pub size: i64,
    pub avg_cost: f64,
}

#[derive(Debug, Clone, Default)]
pub struct AccountSummary {
    pub net_liquidation: f64,
    pub available_funds: f64,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct OpenOrder {
    pub symbol: String,
    pub side: Action,
    pub qty: f64,
    pub order_type: OrderType,
    pub limit_price: Option<f64>,
    pub order_id: String,
    pub status: String,
    pub remaining: f64,
}

pub struct BrokerClient {
    host: String,
    port: u16,
    client_id: u32,
    stream: Mutex<Option<TcpStream>>,
    contract_cache: SyncMutex<HashMap<String, Contract>>,
}

impl BrokerClient {
    pub fn new(host: impl Into<String>, port: u16, client_id: u32) -> Self {
        Self {
            host: host.into(),
            port,
            client_id,
            stream: Mutex::new(None),
            contract_cache: SyncMutex::new(HashMap::new()),
        }
    }

    /// Idempotent: returns `true` immediately if already connected, otherwise
    /// retries the TCP connect + handshake up to `MAX_CONNECT_RETRIES` times.
    #[instrument(skip(self), fields(host = %self.host, port = self.port, client_id = self.client_id))]
    pub async fn connect(&self) -> bool {
        if self.stream.lock().await.is_some() {
            return true;
        }

        for attempt in 1..=MAX_CONNECT_RETRIES {
            match self.try_connect().await {
                Ok(stream) => {
                    *self.stream.lock().await = Some(stream);
                    info!("broker connected");
                    return true;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "broker connect attempt failed");
                    tokio::time::sleep(CONNECT_RETRY_BASE * attempt).await;
                }
            }
        }
        false
    }

    async fn try_connect(&self) -> Result<TcpStream> {
        let mut stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .context("failed to open broker TCP connection")?;
        write_frame(&mut stream, &Request::Handshake { client_id: self.client_id }).await?;
        let resp: Response = read_frame(&mut stream).await?;
        match resp {
            Response::Ok { .. } => Ok(stream),
            Response::Err { message } => bail!("broker handshake rejected: {message}"),
        }
    }

    pub async fn disconnect(&self) {
        *self.stream.lock().await = None;
        debug!("broker disconnected");
    }

    async fn call(&self, req: Request) -> Result<serde_json::Value> {
        if self.stream.lock().await.is_none() && !self.connect().await {
            bail!("broker is not connected");
        }

        let mut guard = self.stream.lock().await;
        let stream = guard.as_mut().context("broker connection lost between check and call")?;
        write_frame(stream, &req).await?;
        let resp: Response = read_frame(stream).await?;
        match resp {
            Response::Ok { payload } => Ok(payload),
            Response::Err { message } => bail!("broker rejected request: {message}"),
        }
    }

    /// Resolve and cache a concrete contract for `symbol`.
    pub async fn qualify(&self, symbol: &str) -> Result<Contract> {
        if let Some(c) = self.contract_cache.lock().get(symbol).cloned() {
            return Ok(c);
        }
        let payload = self.call(Request::Qualify { symbol: symbol.to_string() }).await?;
        let contract: Contract = serde_json::from_value(payload).context("malformed qualify response")?;
        self.contract_cache.lock().insert(symbol.to_string(), contract.clone());
        Ok(contract)
    }

    pub async fn place_order(
        &self,
        symbol: &str,
        side: Action,
        qty: f64,
        order_type: OrderType,
        price: Option<f64>,
    ) -> Result<PlacedOrder> {
        if order_type == OrderType::Lmt && price.is_none() {
            bail!("LMT order requires a price");
        }
        let side_str = match side {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
        };
        let order_type_str = match order_type {
            OrderType::Mkt => "MKT",
            OrderType::Lmt => "LMT",
        };
        let payload = self
            .call(Request::PlaceOrder {
                symbol: symbol.to_string(),
                side: side_str.to_string(),
                qty,
                order_type: order_type_str.to_string(),
                price,
            })
            .await?;

        #[derive(Deserialize)]
        struct Wire {
            order_id: String,
            status: String,
        }
        let wire: Wire = serde_json::from_value(payload).context("malformed place_order response")?;
        let status = match wire.status.as_str() {
            "Filled" => OrderStatus::Executed,
            "Cancelled" => OrderStatus::Cancelled,
            "Inactive" => OrderStatus::Failed,
            _ => OrderStatus::Pending,
        };
        Ok(PlacedOrder { order_id: wire.order_id, status })
    }

    pub async fn positions(&self) -> Result<Vec<BrokerPosition>> {
        let payload = self.call(Request::Positions).await?;
        serde_json::from_value(payload).context("malformed positions response")
    }

    pub async fn account_summary(&self) -> Result<AccountSummary> {
        let payload = self.call(Request::AccountSummary).await?;
        serde_json::from_value(payload).context("malformed account_summary response")
    }

    pub async fn open_orders(&self, symbol: Option<&str>) -> Result<Vec<OpenOrder>> {
        let payload = self
            .call(Request::OpenOrders { symbol: symbol.map(str::to_string) })
            .await?;

        #[derive(Deserialize)]
        struct Wire {
            symbol: String,
            side: String,
            qty: f64,
            order_type: String,
            limit_price: Option<f64>,
            order_id: String,
            status: String,
            remaining: f64,
        }
        let wires: Vec<Wire> = serde_json::from_value(payload).context("malformed open_orders response")?;
        Ok(wires
            .into_iter()
            .filter_map(|w| {
                let side = match w.side.as_str() {
                    "BUY" => Action::Buy,
                    "SELL" => Action::Sell,
                    _ => return None,
                };
                let order_type = match w.order_type.as_str() {
                    "MKT" => OrderType::Mkt,
                    "LMT" => OrderType::Lmt,
                    _ => return None,
                };
                Some(OpenOrder {
                    symbol: w.symbol,
                    side,
                    qty: w.qty,
                    order_type,
                    limit_price: w.limit_price,
                    order_id: w.order_id,
                    status: w.status,
                    remaining: w.remaining,
                })
            })
            .collect())
    }

    /// True iff an open order matches `side`, quantity within `tol * qty`,
    /// and (for LMT) limit price within `tol * price`.
    pub async fn has_active_order(&self, symbol: &str, side: Action, qty: f64, price: Option<f64>, tol: f64) -> Result<bool> {
        let orders = self.open_orders(Some(symbol)).await?;
        for order in orders {
            if order.symbol != symbol || order.side != side {
                continue;
            }
            if (order.qty - qty).abs() > tol * qty {
                continue;
            }
            if let (Some(target_price), Some(limit_price)) = (price, order.limit_price) {
                if (limit_price - target_price).abs() > tol * target_price {
                    continue;
                }
            }
            return Ok(true);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_mapping_matches_fixed_table() {
        assert_eq!(
            match "Filled" {
                "Filled" => OrderStatus::Executed,
                "Cancelled" => OrderStatus::Cancelled,
                "Inactive" => OrderStatus::Failed,
                _ => OrderStatus::Pending,
            },
            OrderStatus::Executed
        );
    }
}
