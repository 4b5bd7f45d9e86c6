//! Extractor rejections
//! Mission: Turn axum's body and query rejections into stable client messages

use axum::extract::rejection::{JsonRejection, QueryRejection};
use tracing::debug;

/// Client-facing text for a rejected JSON body. The serde detail is logged, not returned.
pub fn json_rejection_message(rejection: &JsonRejection) -> &'static str {
    debug!("Rejected JSON body: {}", rejection.body_text());
    match rejection {
        JsonRejection::JsonDataError(_) => "Request body has missing or invalid fields",
        JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON",
        JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body",
        _ => "Request body could not be read",
    }
}

pub fn query_rejection_message(rejection: &QueryRejection) -> &'static str {
    debug!("Rejected query string: {}", rejection.body_text());
    "Query string has invalid parameters"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        extract::{FromRequest, Query},
        http::{header, Request, Uri},
        Json,
    };
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Counter {
        #[allow(dead_code)]
        count: u32,
    }

    async fn reject_json(content_type: Option<&str>, body: &str) -> JsonRejection {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();
        Json::<Counter>::from_request(req, &()).await.unwrap_err()
    }

    #[tokio::test]
    async fn test_json_rejections_map_to_fixed_messages() {
        let wrong_type = reject_json(Some("application/json"), r#"{"count":"many"}"#).await;
        assert_eq!(
            json_rejection_message(&wrong_type),
            "Request body has missing or invalid fields"
        );

        let broken = reject_json(Some("application/json"), "{not json").await;
        assert_eq!(json_rejection_message(&broken), "Request body is not valid JSON");

        let no_type = reject_json(None, r#"{"count":1}"#).await;
        assert_eq!(json_rejection_message(&no_type), "Expected a JSON request body");
    }

    #[test]
    fn test_query_rejection_message_hides_serde_detail() {
        let uri: Uri = "/?count=lots".parse().unwrap();
        let rejection = Query::<Counter>::try_from_uri(&uri).unwrap_err();
        assert_eq!(
            query_rejection_message(&rejection),
            "Query string has invalid parameters"
        );
    }
}
