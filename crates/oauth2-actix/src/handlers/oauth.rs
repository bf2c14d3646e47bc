use actix_web::http::{header, Method, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse, Result};
use std::collections::{HashMap, HashSet};
use url::form_urlencoded;

use oauth2_core::{OAuth2Error, OAuthResponse, ServerError};
use oauth2_grants::{
    AuthorizationRequest, GrantOverride, GrantType, RevocationRequest, TokenRequest,
};
use oauth2_observability::Metrics;

use super::Endpoints;

fn ensure_no_duplicate_query_params(req: &HttpRequest) -> Result<(), OAuth2Error> {
    let mut seen: HashSet<String> = HashSet::new();
    for (k, _v) in form_urlencoded::parse(req.query_string().as_bytes()) {
        let key = k.into_owned();
        if !seen.insert(key) {
            return Err(OAuth2Error::invalid_request(
                "Duplicate query parameters are not allowed",
            ));
        }
    }
    Ok(())
}

pub(crate) fn parse_form_no_dupes(body: &[u8]) -> Result<HashMap<String, String>, OAuth2Error> {
    let mut map: HashMap<String, String> = HashMap::new();
    for (k, v) in form_urlencoded::parse(body) {
        let key = k.into_owned();
        let val = v.into_owned();
        if map.contains_key(&key) {
            return Err(OAuth2Error::invalid_request(
                "Duplicate form parameters are not allowed",
            ));
        }
        map.insert(key, val);
    }
    Ok(map)
}

fn token_params(req: &HttpRequest, body: &[u8]) -> Result<HashMap<String, String>, OAuth2Error> {
    ensure_no_duplicate_query_params(req)?;
    parse_form_no_dupes(body)
}

/// Copy an engine envelope onto an actix response.
pub fn into_http_response(response: OAuthResponse) -> HttpResponse {
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = HttpResponse::build(status);
    for (name, value) in &response.headers {
        builder.insert_header((name.as_str(), value.as_str()));
    }

    match response.body {
        serde_json::Value::Null => builder.finish(),
        body => builder.body(body.to_string()),
    }
}

fn grant_label(params: &HashMap<String, String>) -> &'static str {
    params
        .get("grant_type")
        .and_then(|g| g.parse::<GrantType>().ok())
        .map(|g| g.as_str())
        .unwrap_or("unsupported")
}

async fn run_grant(
    req: &HttpRequest,
    body: &[u8],
    endpoints: &Endpoints,
    metrics: &Metrics,
    grant_override: Option<&dyn GrantOverride>,
    label: Option<&'static str>,
) -> Result<HttpResponse, ServerError> {
    let params = match token_params(req, body) {
        Ok(params) => params,
        Err(err) => return Ok(into_http_response(OAuthResponse::error(&err))),
    };
    let label = label.unwrap_or_else(|| grant_label(&params));

    let result = match TokenRequest::from_params(&params) {
        Ok(request) => {
            endpoints
                .grants
                .dispatch_with(&request, grant_override)
                .await
        }
        Err(err) => Ok(OAuthResponse::error(&err)),
    };

    match result {
        Ok(response) => {
            metrics.record_grant(label, &response);
            Ok(into_http_response(response))
        }
        Err(err) => {
            metrics.record_server_fault("token");
            Err(err)
        }
    }
}

/// OAuth2 token endpoint (RFC 6749 §3.2)
/// Dispatches password, refresh_token and social_login grants
pub async fn token(
    req: HttpRequest,
    body: web::Bytes,
    endpoints: web::Data<Endpoints>,
    metrics: web::Data<Metrics>,
) -> Result<HttpResponse, ServerError> {
    run_grant(&req, &body, &endpoints, &metrics, None, None).await
}

/// Token endpoint whose grant handling is replaced by an injected override.
///
/// Register one route per override type, with the override in app data:
/// `web::post().to(custom_token::<MyGrant>)`.
pub async fn custom_token<O: GrantOverride + 'static>(
    req: HttpRequest,
    body: web::Bytes,
    endpoints: web::Data<Endpoints>,
    grant_override: web::Data<O>,
    metrics: web::Data<Metrics>,
) -> Result<HttpResponse, ServerError> {
    let grant_override: &O = &grant_override;
    run_grant(
        &req,
        &body,
        &endpoints,
        &metrics,
        Some(grant_override),
        Some("custom"),
    )
    .await
}

/// OAuth2 token revocation (RFC 7009)
pub async fn revoke(
    req: HttpRequest,
    body: web::Bytes,
    endpoints: web::Data<Endpoints>,
    metrics: web::Data<Metrics>,
) -> Result<HttpResponse, ServerError> {
    let request =
        token_params(&req, &body).and_then(|params| RevocationRequest::from_params(&params));
    let request = match request {
        Ok(request) => request,
        Err(err) => return Ok(into_http_response(OAuthResponse::error(&err))),
    };

    match endpoints.revocation.revoke(&request).await {
        Ok(response) => {
            metrics.record_revocation();
            Ok(into_http_response(response))
        }
        Err(err) => {
            metrics.record_server_fault("revoke");
            Err(err)
        }
    }
}

fn auth_response_security_headers(mut resp: HttpResponse) -> HttpResponse {
    let headers = resp.headers_mut();
    headers.insert(
        header::REFERRER_POLICY,
        header::HeaderValue::from_static("no-referrer"),
    );
    headers.insert(
        header::X_FRAME_OPTIONS,
        header::HeaderValue::from_static("DENY"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        header::HeaderValue::from_static("frame-ancestors 'none'"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );
    resp
}

/// OAuth2 authorization endpoint
/// Reads the query string on GET and the form body on POST
pub async fn authorize(
    req: HttpRequest,
    body: web::Bytes,
    endpoints: web::Data<Endpoints>,
    metrics: web::Data<Metrics>,
) -> Result<HttpResponse, ServerError> {
    let params = if req.method() == Method::POST {
        token_params(&req, &body)
    } else {
        ensure_no_duplicate_query_params(&req)
            .and_then(|()| parse_form_no_dupes(req.query_string().as_bytes()))
    };

    let response = match params {
        Ok(params) => {
            let request = AuthorizationRequest::from_params(&params);
            match endpoints.authorization.authorize(&request).await {
                Ok(response) => response,
                Err(err) => {
                    metrics.record_server_fault("authorize");
                    return Err(err);
                }
            }
        }
        Err(err) => OAuthResponse::error(&err),
    };

    Ok(auth_response_security_headers(into_http_response(response)))
}
