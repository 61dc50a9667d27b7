use std::sync::Arc;
use std::sync::Mutex;

use graphql_http::Configuration;
use graphql_http::Context;
use graphql_http::GraphQlHttpHandler;
use graphql_http::WebGraphQlRequest;
use graphql_http::WebGraphQlResponse;
use graphql_http::axum_factory::graphql_route;
use graphql_http::graphql;
use graphql_http::services::body;
use graphql_http::services::body::Body;
use graphql_http::services::is_legacy_graphql_content_type;
use graphql_http::services::select_response_media_type;
use http::HeaderMap;
use http::HeaderValue;
use http::Method;
use http::StatusCode;
use http::header::ACCEPT;
use http::header::CONTENT_TYPE;
use http::header::COOKIE;
use serde_json_bytes::json;
use test_log::test;
use tower::BoxError;
use tower::ServiceExt;
use tower::service_fn;

type Recorded = Arc<Mutex<Vec<WebGraphQlRequest>>>;

/// A handler answering with the operation name, and the requests it was given.
fn handler(configuration: Configuration) -> (GraphQlHttpHandler, Recorded) {
    let recorded = Recorded::default();
    let seen = recorded.clone();
    let handler = GraphQlHttpHandler::with_configuration(
        service_fn(move |request: WebGraphQlRequest| {
            let seen = seen.clone();
            async move {
                let response = graphql::Response::builder()
                    .data(json!({ "operationName": request.operation_name() }))
                    .build();
                seen.lock().unwrap().push(request);
                Ok::<_, BoxError>(WebGraphQlResponse::from(response))
            }
        }),
        configuration,
    );
    (handler, recorded)
}

fn post(path: &str, content_type: &'static str, body: &'static str) -> http::Request<Body> {
    http::Request::builder()
        .method(Method::POST)
        .uri(format!("http://localhost{path}"))
        .header(CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: http::Response<Body>) -> serde_json::Value {
    let bytes = body::into_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[test(tokio::test)]
async fn serves_graphql_on_the_configured_path() {
    let configuration = Configuration::from_yaml("graphql:\n  path: /api/graphql\n").unwrap();
    let (handler, recorded) = handler(configuration);
    let router = graphql_route(handler);

    let response = router
        .clone()
        .oneshot(post(
            "/api/graphql",
            "application/json",
            r#"{"query":"query Me { me }","operationName":"Me"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "application/json"
    );
    insta::assert_json_snapshot!(json_body(response).await, @r###"
    {
      "data": {
        "operationName": "Me"
      }
    }
    "###);
    assert_eq!(recorded.lock().unwrap().len(), 1);

    let response = router
        .oneshot(post(
            "/graphql",
            "application/json",
            r#"{"query":"{ me }"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(recorded.lock().unwrap().len(), 1);
}

#[test(tokio::test)]
async fn only_post_is_routed() {
    let (handler, recorded) = handler(Configuration::default());

    let response = graphql_route(handler)
        .oneshot(
            http::Request::builder()
                .method(Method::GET)
                .uri("http://localhost/graphql?query=%7Bme%7D")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(recorded.lock().unwrap().is_empty());
}

#[test(tokio::test)]
async fn negotiates_the_response_content_type() {
    let (handler, _) = handler(Configuration::default());
    let router = graphql_route(handler);

    for (accept, expected) in [
        (
            "application/graphql-response+json, application/json",
            "application/graphql-response+json",
        ),
        (
            "application/json, application/graphql-response+json",
            "application/json",
        ),
        ("text/html, application/graphql", "application/graphql"),
        ("text/html", "application/json"),
    ] {
        let mut request = post("/graphql", "application/json", r#"{"query":"{ me }"}"#);
        request
            .headers_mut()
            .insert(ACCEPT, HeaderValue::from_static(accept));

        let response = router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            expected,
            "Accept: {accept}"
        );
    }
}

#[test(tokio::test)]
async fn rejects_unsupported_content_types() {
    let (handler, recorded) = handler(Configuration::default());

    let response = graphql_route(handler)
        .oneshot(post("/graphql", "text/plain", r#"{"query":"{ me }"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    insta::assert_json_snapshot!(json_body(response).await, @r###"
    {
      "errors": [
        {
          "message": "content type 'text/plain' not supported, expected 'application/json'",
          "extensions": {
            "code": "INVALID_CONTENT_TYPE_HEADER"
          }
        }
      ]
    }
    "###);
    assert!(recorded.lock().unwrap().is_empty());
}

#[test(tokio::test)]
async fn accepts_json_sent_as_application_graphql() {
    let (handler, recorded) = handler(Configuration::default());
    let router = graphql_route(handler);

    let response = router
        .clone()
        .oneshot(post(
            "/graphql",
            "application/graphql",
            r#"{"query":"query Legacy { me }","operationName":"Legacy"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({ "data": { "operationName": "Legacy" } })
    );

    let response = router
        .oneshot(post("/graphql", "application/graphql", "query Legacy { me }"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(recorded.lock().unwrap().len(), 1);
}

#[test(tokio::test)]
async fn rejects_bodies_over_the_limit() {
    let configuration = Configuration::builder()
        .max_request_body_bytes(8)
        .build()
        .unwrap();
    let (handler, recorded) = handler(configuration);

    let response = graphql_route(handler)
        .oneshot(post("/graphql", "application/json", r#"{"query":"{ me }"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["errors"][0]["extensions"]["code"],
        "INPUT_STREAM_ERROR"
    );
    assert!(recorded.lock().unwrap().is_empty());
}

#[test(tokio::test)]
async fn execution_failures_are_server_errors() {
    let handler = GraphQlHttpHandler::new(service_fn(|_: WebGraphQlRequest| async {
        tokio::task::yield_now().await;
        Err::<WebGraphQlResponse, BoxError>("collaborator unavailable".into())
    }));

    let response = graphql_route(handler)
        .oneshot(post("/graphql", "application/json", r#"{"query":"{ me }"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    insta::assert_json_snapshot!(json_body(response).await, @r###"
    {
      "errors": [
        {
          "message": "request handling failed: collaborator unavailable",
          "extensions": {
            "code": "REQUEST_HANDLING_FAILED"
          }
        }
      ]
    }
    "###);
}

#[test(tokio::test)]
async fn passes_cookies_and_attributes_to_the_collaborator() {
    let (handler, recorded) = handler(Configuration::default());

    let mut request = post("/graphql", "application/json", r#"{"query":"{ me }"}"#);
    request
        .headers_mut()
        .append(COOKIE, HeaderValue::from_static("a=1; b=2; a=3"));
    let attributes = Context::new();
    attributes.insert("user", "ada".to_string()).unwrap();
    request.extensions_mut().insert(attributes);

    let response = handler.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let recorded = recorded.lock().unwrap();
    let request = &recorded[0];
    let values = |name: &str| {
        request.cookies()[name]
            .iter()
            .map(|cookie| cookie.value().to_string())
            .collect::<Vec<_>>()
    };
    assert_eq!(values("a"), vec!["1", "3"]);
    assert_eq!(values("b"), vec!["2"]);
    assert_eq!(
        request.attributes().get::<_, String>("user").unwrap(),
        Some("ada".to_string())
    );
}

#[test]
fn media_type_helpers_are_public() {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/graphql"));
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/graphql; charset=utf-8"),
    );

    assert_eq!(select_response_media_type(&headers), "application/graphql");
    assert!(is_legacy_graphql_content_type(&headers));
}
