use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use common::{OrderId, ProductId};

use crate::error::{GatewayError, Result};
use crate::gateway::{ReservationGateway, ReservationStatus};

/// Header carrying the shared internal credential on every request.
pub const INTERNAL_AUTH_HEADER: &str = "X-Internal-Auth";

/// A hung warehouse call must not hold the local transaction open
/// indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct ReserveStockRequest {
    product_id: ProductId,
    quantity: i64,
    order_id: OrderId,
}

#[derive(Serialize)]
struct UpdateReservationRequest {
    status: ReservationStatus,
}

/// HTTP implementation of the reservation gateway.
#[derive(Clone)]
pub struct HttpReservationGateway {
    client: reqwest::Client,
    base_url: String,
    internal_auth: String,
}

impl HttpReservationGateway {
    /// Creates a gateway talking to the warehouse service at `base_url`,
    /// authenticating with the shared internal header credential.
    pub fn new(base_url: impl Into<String>, internal_auth: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            internal_auth: internal_auth.into(),
        })
    }

    async fn check_response(
        &self,
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<()> {
        let status = response.status();
        if !status.is_success() {
            tracing::error!(%status, operation, "warehouse service rejected request");
            return Err(GatewayError::UnexpectedStatus { operation, status });
        }

        // The warehouse service always answers with a JSON body; an
        // undecodable body counts as a failed call even on 2xx.
        response.json::<serde_json::Value>().await?;
        Ok(())
    }
}

#[async_trait]
impl ReservationGateway for HttpReservationGateway {
    #[tracing::instrument(skip(self))]
    async fn reserve(
        &self,
        product_id: ProductId,
        quantity: i64,
        order_id: OrderId,
    ) -> Result<()> {
        let url = format!("{}/internal/warehouse-service/reserved-stocks", self.base_url);
        let body = ReserveStockRequest {
            product_id,
            quantity,
            order_id,
        };

        let response = self
            .client
            .post(&url)
            .header(INTERNAL_AUTH_HEADER, &self.internal_auth)
            .json(&body)
            .send()
            .await?;

        self.check_response(response, "reserve").await
    }

    #[tracing::instrument(skip(self))]
    async fn set_status(&self, order_id: OrderId, status: ReservationStatus) -> Result<()> {
        let url = format!(
            "{}/internal/warehouse-service/orders/{}/reserved-stocks/status",
            self.base_url, order_id
        );
        let body = UpdateReservationRequest { status };

        let response = self
            .client
            .patch(&url)
            .header(INTERNAL_AUTH_HEADER, &self.internal_auth)
            .json(&body)
            .send()
            .await?;

        self.check_response(response, "set_status").await
    }
}
