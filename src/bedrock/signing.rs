//! SigV4 request signing for the managed service APIs
//!
//! Every call to the retrieval, prompt, function and (unless an API key is
//! configured) model APIs must carry an `AWS4-HMAC-SHA256` signature made
//! with the function role's credentials.
//!
//! # How a request gets signed
//!
//! ```text
//! credentials provider ──► Credentials ──► Identity
//!                                              │
//! method + url + headers + body bytes ─► SignableRequest
//!                                              │
//!                    SigningParams (region, service name, time)
//!                                              ▼
//!                                   sign() ─► SigningInstructions
//!                                              │
//!                  authorization, x-amz-date, x-amz-security-token headers
//! ```
//!
//! Credentials come from the default provider chain (environment variables
//! inside a function, profile files or instance metadata elsewhere). The
//! chain is resolved on the first signed request, not when the client is
//! built, so building a client never does I/O and handlers that never call
//! a service never need credentials.
//!
//! The signature covers the exact body bytes, so callers serialize the body
//! once and send those same bytes.

use std::sync::Arc;
use std::time::SystemTime;

use aws_config::BehaviorVersion;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{sign, SignableBody, SignableRequest, SigningParams, SigningSettings};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use tokio::sync::OnceCell;

use super::client::ServiceError;

/// Signs requests with credentials from a lazily resolved provider
#[derive(Clone, Default)]
pub struct RequestSigner {
    provider: Arc<OnceCell<Option<SharedCredentialsProvider>>>,
}

impl RequestSigner {
    /// Signer backed by the default credential chain
    pub fn from_default_chain() -> Self {
        Self::default()
    }

    /// Signer backed by an explicit provider (static keys, tests)
    pub fn with_provider(provider: SharedCredentialsProvider) -> Self {
        Self {
            provider: Arc::new(OnceCell::new_with(Some(Some(provider)))),
        }
    }

    async fn provider(&self) -> Option<&SharedCredentialsProvider> {
        self.provider
            .get_or_init(|| async {
                let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
                let provider = config.credentials_provider();
                if provider.is_none() {
                    tracing::warn!("No AWS credentials provider found; signed calls will fail");
                }
                provider
            })
            .await
            .as_ref()
    }

    /// Headers to add so the request carries a valid signature
    ///
    /// # Arguments
    /// * `service` - Signing name, e.g. "lambda" or "bedrock"
    /// * `region` - Region the request is sent to
    /// * `headers` - Headers that will be sent and must be signed
    /// * `body` - Exact body bytes
    pub async fn sign(
        &self,
        service: &str,
        region: &str,
        method: &str,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<Vec<(String, String)>, ServiceError> {
        let provider = self
            .provider()
            .await
            .ok_or_else(|| ServiceError::Signing("no AWS credentials available".to_string()))?;
        let credentials = provider
            .provide_credentials()
            .await
            .map_err(|e| ServiceError::Signing(format!("could not load credentials: {}", e)))?;

        signature_headers(
            credentials,
            service,
            region,
            method,
            url,
            headers,
            body,
            SystemTime::now(),
        )
    }
}

/// Compute the signature headers for one request at `time`
#[allow(clippy::too_many_arguments)]
pub fn signature_headers(
    credentials: Credentials,
    service: &str,
    region: &str,
    method: &str,
    url: &str,
    headers: &[(&str, &str)],
    body: &[u8],
    time: SystemTime,
) -> Result<Vec<(String, String)>, ServiceError> {
    let identity: Identity = credentials.into();
    let params: SigningParams<'_> = v4::SigningParams::builder()
        .identity(&identity)
        .region(region)
        .name(service)
        .time(time)
        .settings(SigningSettings::default())
        .build()
        .map_err(|e| ServiceError::Signing(e.to_string()))?
        .into();

    let signable = SignableRequest::new(
        method,
        url,
        headers.iter().copied(),
        SignableBody::Bytes(body),
    )
    .map_err(|e| ServiceError::Signing(e.to_string()))?;

    let (instructions, _signature) = sign(signable, &params)
        .map_err(|e| ServiceError::Signing(e.to_string()))?
        .into_parts();

    Ok(instructions
        .headers()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at_2024_01_01() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_704_067_200)
    }

    fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_signature_scope_and_date() {
        let credentials = Credentials::new("AKIDEXAMPLE", "secret", None, None, "test");
        let headers = signature_headers(
            credentials,
            "lambda",
            "us-east-1",
            "POST",
            "https://lambda.us-east-1.amazonaws.com/2015-03-31/functions/kb/invocations",
            &[("content-type", "application/json")],
            br#"{"body":"{}"}"#,
            at_2024_01_01(),
        )
        .unwrap();

        let authorization = header(&headers, "authorization").unwrap();
        assert!(authorization.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240101/us-east-1/lambda/aws4_request"
        ));
        assert!(authorization.contains("SignedHeaders="));
        assert!(authorization.contains("content-type"));
        assert_eq!(header(&headers, "x-amz-date"), Some("20240101T000000Z"));
        assert!(header(&headers, "x-amz-security-token").is_none());
    }

    #[test]
    fn test_session_token_is_sent() {
        let credentials =
            Credentials::new("AKID", "secret", Some("session".to_string()), None, "test");
        let headers = signature_headers(
            credentials,
            "bedrock",
            "eu-west-1",
            "GET",
            "https://bedrock-agent.eu-west-1.amazonaws.com/prompts/P1",
            &[],
            b"",
            at_2024_01_01(),
        )
        .unwrap();

        assert_eq!(header(&headers, "x-amz-security-token"), Some("session"));
        assert!(header(&headers, "authorization")
            .unwrap()
            .contains("/eu-west-1/bedrock/aws4_request"));
    }

    #[test]
    fn test_body_changes_signature() {
        let sign_body = |body: &[u8]| {
            let credentials = Credentials::new("AKID", "secret", None, None, "test");
            let headers = signature_headers(
                credentials,
                "bedrock",
                "us-east-1",
                "POST",
                "https://bedrock-runtime.us-east-1.amazonaws.com/model/m/converse",
                &[],
                body,
                at_2024_01_01(),
            )
            .unwrap();
            header(&headers, "authorization").unwrap().to_string()
        };

        assert_ne!(sign_body(b"{}"), sign_body(b"{\"a\":1}"));
    }

    #[tokio::test]
    async fn test_explicit_provider_signs() {
        let signer = RequestSigner::with_provider(SharedCredentialsProvider::new(
            Credentials::new("AKID", "secret", None, None, "test"),
        ));
        let headers = signer
            .sign("lambda", "us-east-1", "POST", "http://127.0.0.1:9/x", &[], b"{}")
            .await
            .unwrap();

        assert!(header(&headers, "authorization")
            .unwrap()
            .starts_with("AWS4-HMAC-SHA256 "));
    }
}
