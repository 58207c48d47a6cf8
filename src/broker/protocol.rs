// =============================================================================
// Broker wire protocol — length-prefixed JSON frames over TCP
// =============================================================================
//
// Each frame is a 4-byte big-endian length prefix followed by that many bytes
// of UTF-8 JSON. This mirrors the framing used by local gateway-style broker
// sockets (an authenticated TCP client-id handshake, request/response pairs)
// without depending on any specific vendor's client library.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const MAX_FRAME_BYTES: u32 = 16 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Handshake { client_id: u32 },
    Qualify { symbol: String },
    PlaceOrder { symbol: String, side: String, qty: f64, order_type: String, price: Option<f64> },
    Positions,
    AccountSummary,
    OpenOrders { symbol: Option<String> },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Ok { payload: serde_json::Value },
    Err { message: String },
}

pub async fn write_frame(stream: &mut TcpStream, value: &impl Serialize) -> Result<()> {
    let bytes = serde_json::to_vec(value).context("failed to encode broker frame")?;
    let len = u32::try_from(bytes.len()).context("broker frame too large to encode")?;
    stream.write_all(&len.to_be_bytes()).await.context("failed to write frame length")?;
    stream.write_all(&bytes).await.context("failed to write frame body")?;
    stream.flush().await.context("failed to flush broker stream")?;
    Ok(())
}

pub async fn read_frame<T: for<'de> Deserialize<'de>>(stream: &mut TcpStream) -> Result<T> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await.context("failed to read frame length")?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_BYTES {
        bail!("broker frame of {len} bytes exceeds the {MAX_FRAME_BYTES}-byte limit");
    }
    let mut body = vec![0u8; len as usize];
    stream.read_exact(&mut body).await.context("failed to read frame body")?;
    serde_json::from_slice(&body).context("failed to decode broker frame")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trips_through_json() {
        let req = Request::PlaceOrder {
            symbol: "AAPL".into(),
            side: "BUY".into(),
            qty: 10.0,
            order_type: "MKT".into(),
            price: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        let back: Request = serde_json::from_str(&json).unwrap();
        match back {
            Request::PlaceOrder { symbol, .. } => assert_eq!(symbol, "AAPL"),
            _ => panic!("wrong variant"),
        }
    }
}
