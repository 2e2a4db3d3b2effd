use axum::Router;
use axum::extract::{Json, State};
use axum::response::IntoResponse;
use axum::routing::post;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Utc;
use tracing::instrument;
use validator::Validate;

use crate::AppState;
use crate::db::CourseExt;
use crate::dtos::{
    CheckSubscriptionDto, CheckSubscriptionResponseDto, CreateOrderDto, CreateOrderResponseDto,
    VerifyPaymentDto, VerifyPaymentResponseDto,
};
use crate::error::{ErrorMessage, HttpError};

/// Cookie binding the buyer email after a verified payment, so later
/// subscription checks from the same browser can omit the email.
const SUBSCRIBER_COOKIE: &str = "course_subscriber_email";
const SUBSCRIBER_COOKIE_DAYS: i64 = 365;

/// Orders are priced in INR minor units (paise).
const ORDER_CURRENCY: &str = "INR";

/// Gateway amount for a course price: base currency units to minor units.
fn amount_in_minor_units(price: f64) -> i64 {
    (price * 100.0).round() as i64
}

pub fn payment_handler() -> Router<AppState> {
    Router::new()
        .route("/payment/create-order", post(create_order))
        .route("/payment/verify", post(verify_payment))
        .route("/check-subscription", post(check_subscription))
}

#[instrument(skip(app_state, body), fields(course_id = %body.course_id, email = %body.email))]
pub async fn create_order(
    State(app_state): State<AppState>,
    Json(body): Json<CreateOrderDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let course = app_state
        .db_client
        .get_course(body.course_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting course: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Course not found"))?;

    // Credentials are checked before talking to the gateway so a misconfigured
    // deployment fails fast with a generic message.
    let key_id = app_state.gateway.key_id()?.to_string();

    let amount_minor = amount_in_minor_units(course.price);
    let receipt = format!("course_{}_{}", course.id, Utc::now().timestamp());
    let notes = serde_json::json!({
        "course_id": course.id,
        "course_title": &course.title,
        "email": &body.email,
        "name": &body.name,
    });

    let order = app_state
        .gateway
        .create_order(amount_minor, ORDER_CURRENCY, &receipt, notes)
        .await?;

    app_state
        .db_client
        .create_subscription(
            course.id,
            &body.email,
            &body.name,
            body.phone.as_deref(),
            &order.id,
            course.price,
            ORDER_CURRENCY,
        )
        .await
        .map_err(|e| {
            tracing::error!("DB error, recording subscription: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tracing::info!(order_id = %order.id, "Created payment order");

    Ok(Json(CreateOrderResponseDto {
        status: "success".to_string(),
        order_id: order.id,
        amount: amount_minor,
        currency: ORDER_CURRENCY.to_string(),
        key_id,
    }))
}

#[instrument(skip(app_state, jar, body), fields(order_id = %body.order_id))]
pub async fn verify_payment(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<VerifyPaymentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let subscription = app_state
        .db_client
        .get_subscription_by_order(&body.order_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting subscription: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found("Subscription not found"))?;

    let valid =
        app_state
            .gateway
            .verify_signature(&body.order_id, &body.payment_id, &body.signature)?;

    if !valid {
        // Record the forged/garbled callback before reporting it.
        app_state
            .db_client
            .mark_subscription_failed(&body.order_id)
            .await
            .map_err(|e| {
                tracing::error!("DB error, marking subscription failed: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            })?;

        tracing::warn!(order_id = %body.order_id, "Payment signature mismatch");
        return Err(HttpError::bad_request(
            ErrorMessage::PaymentVerificationFailed.to_string(),
        ));
    }

    let subscription = app_state
        .db_client
        .mark_subscription_completed(
            &body.order_id,
            &body.payment_id,
            body.payment_method.as_deref(),
        )
        .await
        .map_err(|e| {
            tracing::error!("DB error, marking subscription completed: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tracing::info!(
        order_id = %body.order_id,
        status = subscription.status.to_str(),
        "Payment verified"
    );

    let cookie = Cookie::build((SUBSCRIBER_COOKIE, subscription.email.clone()))
        .path("/")
        .max_age(time::Duration::days(SUBSCRIBER_COOKIE_DAYS))
        .build();

    Ok((
        jar.add(cookie),
        Json(VerifyPaymentResponseDto {
            status: "success".to_string(),
            message: "Payment verified".to_string(),
            email: subscription.email,
        }),
    ))
}

/// True iff a completed subscription exists for the (course, email) pair.
/// The email may come from the request body or, failing that, from the
/// cookie set at verification time.
pub async fn check_subscription(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<CheckSubscriptionDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let email = body
        .email
        .clone()
        .or_else(|| jar.get(SUBSCRIBER_COOKIE).map(|c| c.value().to_string()))
        .ok_or_else(|| HttpError::bad_request("Email is required"))?;

    let subscribed = app_state
        .db_client
        .has_completed_subscription(body.course_id, &email)
        .await
        .map_err(|e| {
            tracing::error!("DB error, checking subscription: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    Ok(Json(CheckSubscriptionResponseDto {
        status: "success".to_string(),
        subscribed,
    }))
}
