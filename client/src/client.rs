//! HTTP client for the PalPay API
//!
//! Every mutation returns the entity the server created, so callers can
//! merge it into a `LedgerCache` instead of refetching.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ClientError;
use crate::models::{
    Activity, AuditLog, BalanceEntry, Expense, Health, NetBalance, NewActivity, NewExpense,
    NewPayment, NewUser, Payment, SettlementStrategy, Settlements, User,
};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Largest amount the server accepts, in whole currency units
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Most decimal places the server accepts on an amount
pub const MAX_AMOUNT_SCALE: u32 = 4;

/// HTTP client for communicating with the PalPay API
#[derive(Clone)]
pub struct PalPayClient {
    client: reqwest::Client,
    base_url: String,
}

impl PalPayClient {
    /// Create a client from `PALPAY_API_URL`, falling back to the local default
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url =
            std::env::var("PALPAY_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(&base_url)
    }

    /// Create a new client with explicit configuration
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<Health, ClientError> {
        self.get("/health").await
    }

    // --- Users ---

    pub async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        self.get("/users/").await
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, ClientError> {
        self.get(&format!("/users/{}", id)).await
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<User, ClientError> {
        self.post("/users/", user).await
    }

    // --- Activities ---

    pub async fn list_activities(&self) -> Result<Vec<Activity>, ClientError> {
        self.get("/activities/").await
    }

    pub async fn get_activity(&self, id: Uuid) -> Result<Activity, ClientError> {
        self.get(&format!("/activities/{}", id)).await
    }

    pub async fn create_activity(&self, activity: &NewActivity) -> Result<Activity, ClientError> {
        self.post("/activities/", activity).await
    }

    // --- Expenses ---

    pub async fn list_expenses(&self) -> Result<Vec<Expense>, ClientError> {
        self.get("/expenses/").await
    }

    pub async fn get_expense(&self, id: Uuid) -> Result<Expense, ClientError> {
        self.get(&format!("/expenses/{}", id)).await
    }

    /// Record an expense. Obviously bad input is rejected before any request
    /// is sent, with the same error the server would give.
    pub async fn create_expense(&self, expense: &NewExpense) -> Result<Expense, ClientError> {
        check_amount(expense.amount)?;
        if expense.participants.is_empty() {
            return Err(ClientError::InvalidExpense(
                "An expense needs at least one participant".to_string(),
            ));
        }

        self.post("/expenses/", expense).await
    }

    // --- Payments ---

    pub async fn list_payments(&self) -> Result<Vec<Payment>, ClientError> {
        self.get("/payments/").await
    }

    pub async fn get_payment(&self, id: Uuid) -> Result<Payment, ClientError> {
        self.get(&format!("/payments/{}", id)).await
    }

    pub async fn create_payment(&self, payment: &NewPayment) -> Result<Payment, ClientError> {
        check_amount(payment.amount)?;

        self.post("/payments/", payment).await
    }

    // --- Derived views ---

    pub async fn balances(
        &self,
        strategy: SettlementStrategy,
    ) -> Result<Vec<BalanceEntry>, ClientError> {
        self.get(&format!("/balances/?strategy={}", strategy.as_str())).await
    }

    pub async fn net_balances(&self) -> Result<Vec<NetBalance>, ClientError> {
        self.get("/balances/net").await
    }

    /// Settle one activity on its own, payments excluded
    pub async fn settlements(&self, activity_id: Uuid) -> Result<Settlements, ClientError> {
        self.get(&format!("/settlements/{}", activity_id)).await
    }

    /// Newest audit entries first
    pub async fn audit_logs(&self, limit: u64) -> Result<Vec<AuditLog>, ClientError> {
        self.get(&format!("/audit-logs/?limit={}", limit)).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "GET");

        let response = self.client.get(&url).send().await?;

        handle_response(response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "POST");

        let response = self.client.post(&url).json(body).send().await?;

        handle_response(response).await
    }
}

fn check_amount(amount: Decimal) -> Result<(), ClientError> {
    let reason = if amount <= Decimal::ZERO {
        "amounts must be greater than zero".to_string()
    } else if amount > Decimal::from(MAX_AMOUNT) {
        format!("amounts must not exceed {}", MAX_AMOUNT)
    } else if amount.normalize().scale() > MAX_AMOUNT_SCALE {
        format!("amounts may have at most {} decimal places", MAX_AMOUNT_SCALE)
    } else {
        return Ok(());
    };

    Err(ClientError::InvalidAmount(format!(
        "Invalid amount {}: {}",
        amount, reason
    )))
}

async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ClientError::from_status(status.as_u16(), &body));
    }

    serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    // Nothing listens here; tests using it must fail before sending
    const DEAD_URL: &str = "http://127.0.0.1:9";

    #[test]
    fn test_client_new() {
        let client = PalPayClient::new("https://pay.example.com").unwrap();
        assert_eq!(client.base_url(), "https://pay.example.com");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = PalPayClient::new("https://pay.example.com/").unwrap();
        assert_eq!(client.base_url(), "https://pay.example.com");
    }

    #[tokio::test]
    async fn zero_amount_expense_rejected_locally() {
        let client = PalPayClient::new(DEAD_URL).unwrap();

        let result = client
            .create_expense(&NewExpense {
                amount: dec!(0),
                paid_by_user_id: Uuid::new_v4(),
                activity_id: Uuid::new_v4(),
                participants: vec![Uuid::new_v4()],
                description: None,
            })
            .await;

        assert!(matches!(result, Err(ClientError::InvalidAmount(_))));
    }

    #[tokio::test]
    async fn expense_without_participants_rejected_locally() {
        let client = PalPayClient::new(DEAD_URL).unwrap();

        let result = client
            .create_expense(&NewExpense {
                amount: dec!(10),
                paid_by_user_id: Uuid::new_v4(),
                activity_id: Uuid::new_v4(),
                participants: vec![],
                description: None,
            })
            .await;

        assert!(matches!(result, Err(ClientError::InvalidExpense(_))));
    }

    #[tokio::test]
    async fn negative_payment_rejected_locally() {
        let client = PalPayClient::new(DEAD_URL).unwrap();

        let result = client
            .create_payment(&NewPayment {
                amount: dec!(-1),
                from_user_id: Uuid::new_v4(),
                to_user_id: Uuid::new_v4(),
            })
            .await;

        assert!(matches!(result, Err(ClientError::InvalidAmount(_))));
    }

    #[test]
    fn amount_limits_match_the_server() {
        assert!(check_amount(dec!(0.0001)).is_ok());
        assert!(check_amount(dec!(1000000000000)).is_ok());
        assert!(check_amount(dec!(12.3400000)).is_ok());

        for amount in [dec!(1000000000000.01), dec!(0.00001), dec!(-1)] {
            assert!(matches!(
                check_amount(amount),
                Err(ClientError::InvalidAmount(_))
            ));
        }
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let client = PalPayClient::new(DEAD_URL).unwrap();

        let result = client.list_users().await;

        assert!(matches!(result, Err(ClientError::Transport(_))));
    }
}
