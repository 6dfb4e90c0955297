use crate::error::AuditError;
use crate::handler::error::ApiError;
use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use bytes::Bytes;
use serde::Deserialize;

/// Parameters of an audit request.
///
/// Read from a JSON body when the request says `application/json`, from a
/// urlencoded form body otherwise. The `domain` query parameter is used when
/// the body does not carry one. The body is read for every method, GET
/// included.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct AuditParams {
    #[serde(default)]
    pub domain: Option<String>,
}

impl<S> FromRequest<S> for AuditParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let query_domain = req
            .uri()
            .query()
            .and_then(|query| form_field(query.as_bytes(), "domain"));
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(is_json_content_type);

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AuditError::MalformedRequest(rejection.body_text()))?;

        let body_domain = if body.iter().all(u8::is_ascii_whitespace) {
            None
        } else if is_json {
            serde_json::from_slice::<AuditParams>(&body)
                .map_err(|e| AuditError::MalformedRequest(e.to_string()))?
                .domain
        } else {
            form_field(&body, "domain")
        };

        Ok(Self {
            domain: body_domain.or(query_domain),
        })
    }
}

fn is_json_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}

fn form_field(input: &[u8], name: &str) -> Option<String> {
    url::form_urlencoded::parse(input)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
