//! Payment provider webhook handling.

use axum::{body::Bytes, Extension, Json};
use serde::Serialize;
use service::{command, Command as _};

use crate::{error, Error, Service};

/// Name of the header carrying the webhook signature.
const SIGNATURE_HEADER: &str = "stripe-signature";

/// Response body acknowledging a processed webhook delivery.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Received {
    /// Always `true`.
    pub received: bool,
}

/// Handles the `POST /webhook/payment` operation.
///
/// A missing or invalid signature rejects the delivery with a 400 before
/// any state mutation. Once the signature has been verified, the delivery
/// is acknowledged even if processing fails downstream, so the provider
/// doesn't retry a payment that is already durable on its side.
pub async fn payment(
    Extension(service): Extension<Service>,
    headers: http::HeaderMap,
    payload: Bytes,
) -> Result<Json<Received>, Error> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error {
            code: "INVALID_SIGNATURE",
            status_code: http::StatusCode::BAD_REQUEST,
            message: "Missing webhook signature".to_owned(),
            backtrace: None,
        })?
        .to_owned();

    match service
        .execute(command::ConfirmPayment {
            payload: payload.to_vec(),
            signature,
        })
        .await
    {
        Ok(_) => Ok(Json(Received { received: true })),
        Err(e) => {
            let error = error::log(e);
            if matches!(error.code, "INVALID_SIGNATURE" | "CONFIGURATION") {
                Err(error)
            } else {
                // Verified but unprocessable: acknowledged anyway.
                Ok(Json(Received { received: true }))
            }
        }
    }
}
