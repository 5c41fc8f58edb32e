//! Demo application
//!
//! Serves the reference route set through an in-memory exchange: a server
//! rendering load, the hydration payload, a form action and a client that
//! calls back into the server through a loopback transport.

pub mod rpc;

use procedure_rpc::{TransportBody, TransportRequest, client};
use rpc::*;
use serde_json::json;
use std::error::Error;
use tracing::info;

const ORIGIN: &str = "http://localhost:5173";

/// Build the API server of the application.
pub fn create_server(config: ServerConfig) -> Result<Arc<ApiServer<AppContext>>, Box<dyn Error>> {
    let router = create_router()?;
    Ok(Arc::new(ApiServer::new(router, create_context, config)?))
}

fn page_request(user: Option<&str>) -> SharedExchange {
    let exchange = MemoryExchange::new("GET", format!("{}/", ORIGIN));
    let exchange = match user {
        Some(user) => exchange.with_cookie(SESSION_COOKIE, user),
        None => exchange,
    };
    exchange.shared()
}

/// Calls a page load would make during server rendering.
pub async fn load(server: &Arc<ApiServer<AppContext>>) -> Vec<(&'static str, ApiResponse)> {
    let ssr = server.ssr();
    let anonymous = page_request(None);
    let signed_in = page_request(Some("patrick115"));
    let form: FormData = [("name", "Patrik"), ("password", "coolPaSSw0rD")]
        .into_iter()
        .collect();

    let calls: Vec<(&'static str, &str, Method, SharedExchange, Option<Input>)> = vec![
        ("protected (anonymous)", "protected", Method::Get, anonymous.clone(), None),
        ("protected (signed in)", "protected", Method::Get, signed_in, None),
        ("testGET", "testGET", Method::Get, anonymous.clone(), None),
        ("testPOST", "testPOST", Method::Post, anonymous.clone(), Some(json!("Pepa").into())),
        ("multipleMethods GET", "multipleMethods", Method::Get, anonymous.clone(), None),
        (
            "multipleMethods POST",
            "multipleMethods",
            Method::Post,
            anonymous.clone(),
            Some(json!("POST").into()),
        ),
        ("formData", "formData", Method::Put, anonymous, Some(form.into())),
    ];

    let mut results = Vec::with_capacity(calls.len());
    for (label, path, method, exchange, input) in calls {
        let response = match ssr.endpoint(path, method) {
            Some(endpoint) => endpoint.call(exchange, input).await,
            None => ErrorResponse::not_found().into(),
        };
        results.push((label, response));
    }
    results
}

/// Client stubs that send every request straight into `server`.
pub fn loopback_client(
    server: &Arc<ApiServer<AppContext>>,
    user: Option<&str>,
) -> Result<StubTree<RemoteProcedure>, Box<dyn Error>> {
    let payload = serde_json::to_string(server.hydrate())?;
    let shape: Shape = serde_json::from_str(&payload)?;

    let target = Arc::clone(server);
    let user = user.map(str::to_string);
    let transport: Arc<dyn Transport> = Arc::new(move |request: TransportRequest| {
        let server = Arc::clone(&target);
        let user = user.clone();
        async move {
            let mut exchange = MemoryExchange::new(request.method.as_str(), request.url);
            if let Some(user) = user {
                exchange = exchange.with_cookie(SESSION_COOKIE, user);
            }
            exchange = match request.body {
                Some(TransportBody::Json(body)) => exchange.with_body(body),
                Some(TransportBody::Form(form)) => exchange.with_form(form),
                None => exchange,
            };
            Ok::<_, ClientError>(server.handle(exchange.shared()).await.body)
        }
    });

    let base = format!("{}{}", ORIGIN, server.api_path());
    Ok(client::build(&shape, &base, transport))
}

/// Run the whole demo, logging every result.
pub async fn run() -> Result<(), Box<dyn Error>> {
    let server = create_server(ServerConfig::default())?;

    info!(payload = %serde_json::to_string(server.hydrate())?, "Hydration payload");

    for (label, response) in load(&server).await {
        info!(call = label, response = %response.to_value(), "Server render");
    }

    let ssr = server.ssr();
    if let Some(form) = ssr.endpoint("form", Method::Post) {
        for (username, password) in [("admin", "admin"), ("admin", "guess")] {
            let submitted: FormData = [("username", username), ("password", password)]
                .into_iter()
                .collect();
            let exchange = MemoryExchange::new("POST", format!("{}/", ORIGIN))
                .with_form(submitted)
                .shared();
            let response = form.action(exchange).await;
            info!(username, response = %response.to_value(), "Form action");
        }
    }

    let api = loopback_client(&server, Some("patrick115"))?;
    for (path, method, input) in [
        ("testGET", Method::Get, None),
        ("testPOST", Method::Post, Some(json!("Pepa"))),
        ("experiment", Method::Get, None),
        ("experiment/aa", Method::Get, None),
        ("protected", Method::Get, None),
        ("missing", Method::Get, None),
    ] {
        match api.endpoint(path, method) {
            Some(endpoint) => {
                let reply = endpoint.call(input).await?;
                info!(path, url = endpoint.url(), reply = ?reply, "Client call");
            }
            None => info!(path, "No such endpoint in the hydration payload"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_matches_expected_results() {
        let server = create_server(ServerConfig::default()).unwrap();
        let results: Vec<_> = load(&server)
            .await
            .into_iter()
            .map(|(label, response)| (label, response.to_value()))
            .collect();

        assert_eq!(
            results,
            vec![
                (
                    "protected (anonymous)",
                    json!({"status": false, "code": 401, "message": "Unauthorized"})
                ),
                ("protected (signed in)", json!("OK")),
                ("testGET", json!("Hello from GET")),
                ("testPOST", json!("Hello Pepa")),
                ("multipleMethods GET", json!("GET")),
                ("multipleMethods POST", json!("POST")),
                (
                    "formData",
                    json!({"name": "Patrik", "password": "coolPaSSw0rD"})
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_loopback_client() {
        let server = create_server(ServerConfig::default()).unwrap();
        let api = loopback_client(&server, None).unwrap();

        let endpoint = api.endpoint("experiment/aa", Method::Get).unwrap();
        assert_eq!(endpoint.url(), "http://localhost:5173/api/experiment/aa");
        assert_eq!(endpoint.call(None).await.unwrap().as_text(), Some("test2"));

        let reply = api
            .endpoint("protected", Method::Get)
            .unwrap()
            .call(None)
            .await
            .unwrap();
        assert_eq!(reply.error().map(|e| e.code), Some(401));
    }
}
