//! CORS gate middleware.
//!
//! Runs in front of the image route. Only allow-listed methods get through;
//! everything else is refused before the handler (and so before any file is
//! opened). Preflight requests are answered here and never reach the handler.
//!
//! The gate only ever adds headers to the handler's response. Status and body
//! are left alone.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::CorsConfig;
use crate::http::request::RequestIdExt;
use crate::http::response::ApiError;
use crate::observability::metrics;

/// Which origins get an `Access-Control-Allow-Origin` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<HeaderValue>),
}

/// What the gate decided for a request that passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOutcome {
    /// Answer right away with 204 and these headers.
    Preflight(HeaderMap),
    /// Hand the request to the route, then add this origin header if any.
    Forward { allow_origin: Option<HeaderValue> },
}

/// Compiled form of [`CorsConfig`].
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    enabled: bool,
    allowed_methods: Vec<Method>,
    allow_methods_header: HeaderValue,
    allowed_origins: AllowedOrigins,
    max_age: Option<HeaderValue>,
}

impl CorsPolicy {
    /// Build the policy. Entries that do not parse are skipped; validation
    /// has already reported them for loaded configs.
    pub fn from_config(config: &CorsConfig) -> Self {
        let allowed_methods: Vec<Method> = config
            .allowed_methods
            .iter()
            .filter_map(|m| Method::from_bytes(m.to_ascii_uppercase().as_bytes()).ok())
            .collect();

        let joined = allowed_methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let allow_methods_header =
            HeaderValue::from_str(&joined).unwrap_or_else(|_| HeaderValue::from_static("GET"));

        let allowed_origins = if config.allowed_origins.iter().any(|o| o == "*") {
            AllowedOrigins::Any
        } else {
            AllowedOrigins::List(
                config
                    .allowed_origins
                    .iter()
                    .filter_map(|o| HeaderValue::from_str(o).ok())
                    .collect(),
            )
        };

        Self {
            enabled: config.enabled,
            allowed_methods,
            allow_methods_header,
            allowed_origins,
            max_age: config.max_age_secs.map(HeaderValue::from),
        }
    }

    /// Whether the gate does anything at all.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Whether `method` is on the allow-list.
    pub fn allows(&self, method: &Method) -> bool {
        self.allowed_methods.contains(method)
    }

    /// Decide what happens to a request, without running anything.
    pub fn check(&self, method: &Method, headers: &HeaderMap) -> Result<CorsOutcome, ApiError> {
        let allow_origin = self.allow_origin(headers.get(header::ORIGIN));

        // A preflight is answered here even when OPTIONS itself is allowed.
        if *method == Method::OPTIONS {
            if let Some(requested) = headers.get(header::ACCESS_CONTROL_REQUEST_METHOD) {
                let requested = Method::from_bytes(requested.as_bytes())
                    .map_err(|_| ApiError::InvalidRequest("Invalid preflight method".into()))?;
                if !self.allows(&requested) {
                    return Err(self.reject(requested));
                }
                return Ok(CorsOutcome::Preflight(self.preflight_headers(
                    allow_origin,
                    headers.get(header::ACCESS_CONTROL_REQUEST_HEADERS),
                )));
            }
        }

        if !self.allows(method) {
            return Err(self.reject(method.clone()));
        }

        Ok(CorsOutcome::Forward { allow_origin })
    }

    fn reject(&self, method: Method) -> ApiError {
        ApiError::MethodNotAllowed {
            method,
            allowed: self.allow_methods_header.clone(),
        }
    }

    fn allow_origin(&self, origin: Option<&HeaderValue>) -> Option<HeaderValue> {
        let origin = origin?;
        match &self.allowed_origins {
            AllowedOrigins::Any => Some(HeaderValue::from_static("*")),
            AllowedOrigins::List(list) => list.contains(origin).then(|| origin.clone()),
        }
    }

    fn preflight_headers(
        &self,
        allow_origin: Option<HeaderValue>,
        requested_headers: Option<&HeaderValue>,
    ) -> HeaderMap {
        let mut headers = HeaderMap::new();
        self.decorate(&mut headers, allow_origin);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            self.allow_methods_header.clone(),
        );
        if let Some(requested) = requested_headers {
            headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
        }
        if let Some(max_age) = &self.max_age {
            headers.insert(header::ACCESS_CONTROL_MAX_AGE, max_age.clone());
        }
        headers
    }

    /// Add the origin headers to an outgoing response.
    pub fn decorate(&self, headers: &mut HeaderMap, allow_origin: Option<HeaderValue>) {
        if let AllowedOrigins::List(_) = self.allowed_origins {
            headers.append(header::VARY, HeaderValue::from_static("Origin"));
        }
        if let Some(origin) = allow_origin {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        }
    }
}

/// Middleware applying a [`CorsPolicy`].
pub async fn cors_gate(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    if !policy.enabled() {
        return next.run(request).await;
    }

    match policy.check(request.method(), request.headers()) {
        Ok(CorsOutcome::Forward { allow_origin }) => {
            let mut response = next.run(request).await;
            policy.decorate(response.headers_mut(), allow_origin);
            response
        }
        Ok(CorsOutcome::Preflight(headers)) => {
            tracing::debug!(request_id = %request.request_id(), "Answered CORS preflight");
            (StatusCode::NO_CONTENT, headers).into_response()
        }
        Err(err) => {
            tracing::warn!(
                request_id = %request.request_id(),
                method = %request.method(),
                uri = %request.uri(),
                "Request refused by CORS gate"
            );
            metrics::record_cors_rejection(request.method().as_str());
            err.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> CorsPolicy {
        CorsPolicy::from_config(&CorsConfig::default())
    }

    fn headers(pairs: &[(header::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_get_is_forwarded() {
        let outcome = policy().check(&Method::GET, &HeaderMap::new()).unwrap();
        assert_eq!(outcome, CorsOutcome::Forward { allow_origin: None });
    }

    #[test]
    fn test_cross_origin_get_gets_wildcard() {
        let outcome = policy()
            .check(&Method::GET, &headers(&[(header::ORIGIN, "https://a.example")]))
            .unwrap();
        assert_eq!(
            outcome,
            CorsOutcome::Forward {
                allow_origin: Some(HeaderValue::from_static("*"))
            }
        );
    }

    #[test]
    fn test_post_is_rejected() {
        let err = policy().check(&Method::POST, &HeaderMap::new()).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(err.to_string(), "Method POST not allowed");
    }

    #[test]
    fn test_preflight_for_get() {
        let outcome = policy()
            .check(
                &Method::OPTIONS,
                &headers(&[
                    (header::ORIGIN, "https://a.example"),
                    (header::ACCESS_CONTROL_REQUEST_METHOD, "GET"),
                    (header::ACCESS_CONTROL_REQUEST_HEADERS, "x-trace"),
                ]),
            )
            .unwrap();

        let CorsOutcome::Preflight(h) = outcome else {
            panic!("expected preflight, got {outcome:?}");
        };
        assert_eq!(h[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(h[header::ACCESS_CONTROL_ALLOW_METHODS], "GET");
        assert_eq!(h[header::ACCESS_CONTROL_ALLOW_HEADERS], "x-trace");
        assert!(h.get(header::ACCESS_CONTROL_MAX_AGE).is_none());
    }

    #[test]
    fn test_preflight_for_delete_is_rejected() {
        let err = policy()
            .check(
                &Method::OPTIONS,
                &headers(&[(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")]),
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "Method DELETE not allowed");
    }

    #[test]
    fn test_preflight_answered_when_options_allowed() {
        let policy = CorsPolicy::from_config(&CorsConfig {
            allowed_methods: vec!["GET".into(), "OPTIONS".into()],
            ..CorsConfig::default()
        });

        let outcome = policy
            .check(
                &Method::OPTIONS,
                &headers(&[(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")]),
            )
            .unwrap();
        let CorsOutcome::Preflight(h) = outcome else {
            panic!("expected preflight, got {outcome:?}");
        };
        assert_eq!(h[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, OPTIONS");

        let bare = policy.check(&Method::OPTIONS, &HeaderMap::new()).unwrap();
        assert_eq!(bare, CorsOutcome::Forward { allow_origin: None });
    }

    #[test]
    fn test_bare_options_is_rejected() {
        let err = policy().check(&Method::OPTIONS, &HeaderMap::new()).unwrap_err();
        assert_eq!(err.to_string(), "Method OPTIONS not allowed");
    }

    #[test]
    fn test_origin_list() {
        let policy = CorsPolicy::from_config(&CorsConfig {
            allowed_origins: vec!["https://docs.example".into()],
            max_age_secs: Some(600),
            ..CorsConfig::default()
        });

        let allowed = policy
            .check(&Method::GET, &headers(&[(header::ORIGIN, "https://docs.example")]))
            .unwrap();
        assert_eq!(
            allowed,
            CorsOutcome::Forward {
                allow_origin: Some(HeaderValue::from_static("https://docs.example"))
            }
        );

        let other = policy
            .check(&Method::GET, &headers(&[(header::ORIGIN, "https://evil.example")]))
            .unwrap();
        assert_eq!(other, CorsOutcome::Forward { allow_origin: None });

        let mut response_headers = HeaderMap::new();
        policy.decorate(&mut response_headers, None);
        assert_eq!(response_headers[header::VARY], "Origin");
    }

    #[test]
    fn test_lowercase_methods_in_config() {
        let policy = CorsPolicy::from_config(&CorsConfig {
            allowed_methods: vec!["get".into(), "head".into()],
            ..CorsConfig::default()
        });
        assert!(policy.allows(&Method::GET));
        assert!(policy.allows(&Method::HEAD));
        assert!(!policy.allows(&Method::POST));
    }
}
