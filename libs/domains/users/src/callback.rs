//! Outbound delivery of lookup results.

use amqp_worker::ProcessingError;
use async_trait::async_trait;
use std::time::Duration;

use crate::models::UserResponse;

#[async_trait]
pub trait CallbackClient: Send + Sync {
    /// POST `payload` as JSON to `url`. Only a 2xx response is success.
    async fn deliver(&self, url: &str, payload: &UserResponse) -> Result<(), ProcessingError>;
}

/// `reqwest` client with a hard per-request deadline, so a hung callback
/// endpoint cannot stall a consumer forever.
#[derive(Clone, Debug)]
pub struct HttpCallbackClient {
    client: reqwest::Client,
}

impl HttpCallbackClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CallbackClient for HttpCallbackClient {
    async fn deliver(&self, url: &str, payload: &UserResponse) -> Result<(), ProcessingError> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| ProcessingError::downstream(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProcessingError::downstream(
                url,
                format!("callback returned {status}"),
            ));
        }

        tracing::debug!(callback_url = %url, %status, "Callback delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};
    use chrono::Utc;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn payload() -> UserResponse {
        let now = Utc::now();
        UserResponse {
            id: 1,
            name: "Ada".to_string(),
            age: 36,
            md: json!({}),
            email: "ada@example.com".to_string(),
            created_date: now,
            modify_date: now,
        }
    }

    /// Serve `router` on an ephemeral port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_deliver_posts_json_payload() {
        let received = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&received);
        let base = serve(Router::new().route(
            "/cb",
            post(move |Json(body): Json<serde_json::Value>| {
                let sink = Arc::clone(&sink);
                async move {
                    *sink.lock().unwrap() = Some(body);
                    StatusCode::OK
                }
            }),
        ))
        .await;

        let client = HttpCallbackClient::new(Duration::from_secs(5)).unwrap();
        client.deliver(&format!("{base}/cb"), &payload()).await.unwrap();

        let body = received.lock().unwrap().clone().unwrap();
        assert_eq!(body["id"], 1);
        assert_eq!(body["email"], "ada@example.com");
        assert!(body["created_date"].is_string());
    }

    #[tokio::test]
    async fn test_non_2xx_is_downstream_failure() {
        let base = serve(Router::new().route(
            "/cb",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        ))
        .await;
        let url = format!("{base}/cb");

        let client = HttpCallbackClient::new(Duration::from_secs(5)).unwrap();
        let err = client.deliver(&url, &payload()).await.unwrap_err();

        assert!(matches!(err, ProcessingError::Downstream { ref target, .. } if *target == url));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_downstream_failure() {
        let client = HttpCallbackClient::new(Duration::from_secs(2)).unwrap();
        let err = client
            .deliver("http://127.0.0.1:1/cb", &payload())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "downstream");
    }

    #[tokio::test]
    async fn test_hung_endpoint_times_out() {
        let base = serve(Router::new().route(
            "/cb",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                StatusCode::OK
            }),
        ))
        .await;

        let client = HttpCallbackClient::new(Duration::from_millis(200)).unwrap();
        let started = std::time::Instant::now();
        let err = client
            .deliver(&format!("{base}/cb"), &payload())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "downstream");
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
