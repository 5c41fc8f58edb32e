//! RPC handlers and router definition

use super::context::{AppContext, protected};
use procedure_rpc::prelude::*;
use serde_json::{Value, json};

// =============================================================================
// Simple Handlers
// =============================================================================

async fn test_get(_ctx: Context<AppContext>, _ex: SharedExchange) -> RpcResult<&'static str> {
    Ok("Hello from GET")
}

async fn test_post(
    _ctx: Context<AppContext>,
    name: String,
    _ex: SharedExchange,
) -> RpcResult<String> {
    Ok(format!("Hello {}", name))
}

async fn multiple_get(_ctx: Context<AppContext>, _ex: SharedExchange) -> RpcResult<&'static str> {
    Ok("GET")
}

async fn multiple_post(
    _ctx: Context<AppContext>,
    input: String,
    _ex: SharedExchange,
) -> RpcResult<String> {
    Ok(input)
}

// =============================================================================
// Form Handlers
// =============================================================================

async fn form_data(
    _ctx: Context<AppContext>,
    form: FormData,
    _ex: SharedExchange,
) -> RpcResult<Value> {
    Ok(form.to_json())
}

async fn login(_ctx: Context<AppContext>, form: FormData, _ex: SharedExchange) -> RpcResult<Value> {
    let status =
        form.get_text("username") == Some("admin") && form.get_text("password") == Some("admin");
    tracing::info!(status, "Login attempt");
    Ok(json!({ "status": status }))
}

// =============================================================================
// Guarded and Nested Handlers
// =============================================================================

async fn protected_ok(_ctx: Context<AppContext>, _ex: SharedExchange) -> RpcResult<&'static str> {
    Ok("OK")
}

async fn experiment(_ctx: Context<AppContext>, _ex: SharedExchange) -> RpcResult<&'static str> {
    Ok("test1")
}

async fn experiment_aa(_ctx: Context<AppContext>, _ex: SharedExchange) -> RpcResult<&'static str> {
    Ok("test2")
}

// =============================================================================
// Router
// =============================================================================

/// Declare the application's routes.
pub fn create_routes() -> Result<Declaration<AppContext>, RouterError> {
    let base = procedure::<AppContext>();
    let guarded = base.use_middleware(from_fn(protected));

    Ok(Declaration::new()
        .procedure("testGET", base.get().query(test_get))
        .procedure("testPOST", base.post().input(json::<String>())?.query(test_post))
        .group(
            "multipleMethods",
            vec![
                base.get().query(multiple_get).into(),
                base.post()
                    .input(json::<String>())?
                    .query(multiple_post)
                    .into(),
            ],
        )
        .procedure("formData", base.put().input(AnyFormData)?.query(form_data))
        .procedure("protected", guarded.get().query(protected_ok))
        .group(
            "experiment",
            vec![
                base.get().query(experiment).into(),
                Declaration::new()
                    .procedure("aa", base.get().query(experiment_aa))
                    .into(),
            ],
        )
        .procedure("form", base.post().input(AnyFormData)?.query(login)))
}

/// Compile the application's router.
pub fn create_router() -> Result<Router<AppContext>, RouterError> {
    Router::new(create_routes()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::create_context;
    use proptest::prelude::*;

    fn server() -> ApiServer<AppContext> {
        ApiServer::new(create_router().unwrap(), create_context, ServerConfig::default()).unwrap()
    }

    #[test]
    fn test_hydration_payload() {
        let payload = serde_json::to_value(server().hydrate()).unwrap();
        assert_eq!(
            payload,
            json!({
                "testGET": "GET",
                "testPOST": "POST",
                "multipleMethods": ["GET", "POST"],
                "formData": "PUT",
                "protected": "GET",
                "experiment": ["GET", {"aa": "GET"}],
                "form": "POST"
            })
        );
    }

    #[tokio::test]
    async fn test_protected_requires_allowed_user() {
        let server = server();
        let denied = server
            .respond(
                MemoryExchange::new("GET", "/api/protected")
                    .with_cookie("name", "someone")
                    .shared(),
            )
            .await;
        assert_eq!(denied, ErrorResponse::new(401, "Unauthorized").into());

        let allowed = server
            .respond(
                MemoryExchange::new("GET", "/api/protected")
                    .with_cookie("name", "patrick115")
                    .shared(),
            )
            .await;
        assert_eq!(allowed, ApiResponse::Text("OK".into()));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_test_post_greets_any_name(name in "[A-Za-z]{1,12}") {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let response = rt.block_on(
                server().respond(
                    MemoryExchange::new("POST", "/api/testPOST")
                        .with_json(&json!(name.clone()))
                        .shared(),
                ),
            );
            prop_assert_eq!(response, ApiResponse::Text(format!("Hello {}", name)));
        }
    }
}
