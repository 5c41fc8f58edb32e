//! Client stubs: URL construction, bodies and loopback calls.

use super::support::{TestContext, greet, say_hi};
use crate::{
    ApiServer, ClientError, ClientReply, Declaration, FormData, MemoryExchange, Method, Router,
    ServerConfig, Shape, StaticContext, StubNode, Transport, TransportBody, TransportRequest,
    client, json, procedure,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

type Recorded = Arc<Mutex<Vec<TransportRequest>>>;

fn recording(reply: &'static str) -> (Arc<dyn Transport>, Recorded) {
    let recorded: Recorded = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&recorded);
    let transport: Arc<dyn Transport> = Arc::new(move |request: TransportRequest| {
        sink.lock().unwrap().push(request);
        async move { Ok::<_, ClientError>(reply.to_string()) }
    });
    (transport, recorded)
}

fn shape() -> Shape {
    serde_json::from_str(
        r#"{"testGET":"GET","testPOST":"POST","multipleMethods":["GET","POST"],"experiment":["GET",{"aa":"GET"}],"admin":{"users":"DELETE"}}"#,
    )
    .unwrap()
}

#[test]
fn test_stub_tree_mirrors_shape() {
    let (transport, _) = recording("");
    let api = client::build(&shape(), "/api/", transport);

    let keys: Vec<_> = api.keys().collect();
    assert_eq!(
        keys,
        vec!["testGET", "testPOST", "multipleMethods", "experiment", "admin"]
    );
    assert_eq!(api.endpoint("testGET", Method::Get).unwrap().url(), "/api/testGET");
    assert_eq!(
        api.endpoint("experiment/aa", Method::Get).unwrap().url(),
        "/api/experiment/aa"
    );
    assert_eq!(
        api.endpoint("admin/users", Method::Delete).unwrap().method(),
        Method::Delete
    );
    assert!(api.endpoint("testGET", Method::Post).is_none());
    assert!(api.endpoint("admin", Method::Get).is_none());

    let methods: Vec<_> = api
        .get("multipleMethods")
        .and_then(StubNode::as_methods)
        .unwrap()
        .methods()
        .collect();
    assert_eq!(methods, vec![Method::Get, Method::Post]);
}

#[test]
fn test_base_path_without_trailing_slash() {
    let (transport, _) = recording("");
    let api = client::build(&shape(), "https://example.com/rpc", transport);
    assert_eq!(
        api.endpoint("testPOST", Method::Post).unwrap().url(),
        "https://example.com/rpc/testPOST"
    );
}

#[tokio::test]
async fn test_get_calls_drop_their_input() {
    let (transport, recorded) = recording("hi");
    let api = client::build(&shape(), "/api/", transport);

    let reply = api
        .endpoint("testGET", Method::Get)
        .unwrap()
        .call(Some(json!("ignored")))
        .await
        .unwrap();
    assert_eq!(reply.as_text(), Some("hi"));

    let requests = recorded.lock().unwrap();
    assert_eq!(
        *requests,
        vec![TransportRequest {
            url: "/api/testGET".into(),
            method: Method::Get,
            body: None,
        }]
    );
}

#[tokio::test]
async fn test_calls_serialize_json_and_forms() {
    let (transport, recorded) = recording(r#"{"status":true}"#);
    let api = client::build(&shape(), "/api/", transport);
    let post = api.endpoint("multipleMethods", Method::Post).unwrap();

    let reply = post.call(Some(json!({"name": "Pepa"}))).await.unwrap();
    assert_eq!(reply, ClientReply::Json(json!({"status": true})));

    let form: FormData = [("name", "Patrik")].into_iter().collect();
    post.call_form(form.clone()).await.unwrap();

    let requests = recorded.lock().unwrap();
    assert_eq!(
        requests[0].body,
        Some(TransportBody::Json(r#"{"name":"Pepa"}"#.into()))
    );
    assert_eq!(requests[1].body, Some(TransportBody::Form(form)));
    assert!(requests.iter().all(|r| r.url == "/api/multipleMethods"));
}

#[tokio::test]
async fn test_transport_errors_propagate() {
    let transport: Arc<dyn Transport> = Arc::new(|_request: TransportRequest| async {
        Err::<String, _>(ClientError::Transport("connection refused".into()))
    });
    let api = client::build(&shape(), "/api/", transport);
    let result = api.endpoint("testGET", Method::Get).unwrap().call(None).await;
    assert!(matches!(result, Err(ClientError::Transport(_))));
}

#[tokio::test]
async fn test_loopback_against_server() {
    let base = procedure::<TestContext>();
    let router = Router::new(
        Declaration::new()
            .procedure("testGET", base.get().query(say_hi))
            .procedure("testPOST", base.post().input(json::<String>()).unwrap().query(greet)),
    )
    .unwrap();
    let server = Arc::new(
        ApiServer::new(
            router,
            StaticContext(TestContext::default()),
            ServerConfig::default(),
        )
        .unwrap(),
    );

    let loopback = Arc::clone(&server);
    let transport: Arc<dyn Transport> = Arc::new(move |request: TransportRequest| {
        let server = Arc::clone(&loopback);
        async move {
            let mut exchange = MemoryExchange::new(request.method.as_str(), request.url);
            match request.body {
                Some(TransportBody::Json(body)) => exchange = exchange.with_body(body),
                Some(TransportBody::Form(form)) => exchange = exchange.with_form(form),
                None => {}
            }
            Ok::<_, ClientError>(server.handle(exchange.shared()).await.body)
        }
    });

    let payload = serde_json::to_string(server.hydrate()).unwrap();
    let shape: Shape = serde_json::from_str(&payload).unwrap();
    let api = client::build(&shape, server.api_path(), transport);

    let reply = api
        .endpoint("testPOST", Method::Post)
        .unwrap()
        .call(Some(json!("Pepa")))
        .await
        .unwrap();
    assert_eq!(reply.as_text(), Some("Hello Pepa"));

    let reply = api
        .endpoint("testPOST", Method::Post)
        .unwrap()
        .call(Some(json!(42)))
        .await
        .unwrap();
    let error = reply.error().unwrap();
    assert_eq!(error.code, 400);

    let reply = api
        .endpoint("testGET", Method::Get)
        .unwrap()
        .call(None)
        .await
        .unwrap();
    assert_eq!(reply.as_text(), Some("hi"));
}
