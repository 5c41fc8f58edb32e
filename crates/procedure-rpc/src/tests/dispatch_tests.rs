//! Dispatch pipeline tests: resolution, validation, handler results.

use super::support::{TestContext, dispatcher, error_code, exchange, greet, say_hi};
use crate::{
    ApiResponse, Context, Declaration, ErrorMessage, ErrorResponse, FieldError, Input, Method,
    Router, RpcError, RpcResult, SharedExchange, Validate, ValidationResult, ValidationRules,
    json, procedure, validated,
};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

fn hello_router() -> Router<TestContext> {
    let base = procedure::<TestContext>();
    Router::new(
        Declaration::new()
            .procedure("hello", base.get().query(say_hi))
            .procedure("echo", base.post().input(json::<String>()).unwrap().query(greet)),
    )
    .unwrap()
}

#[tokio::test]
async fn test_hello_get_returns_text() {
    let dispatcher = dispatcher(hello_router(), TestContext::default());
    let response = dispatcher
        .dispatch("hello", Method::Get, None, exchange())
        .await;
    assert_eq!(response, ApiResponse::Text("hi".into()));
}

#[tokio::test]
async fn test_hello_post_is_method_not_supported() {
    let dispatcher = dispatcher(hello_router(), TestContext::default());
    let response = dispatcher
        .dispatch("hello", Method::Post, None, exchange())
        .await;
    assert_eq!(response, ErrorResponse::method_not_supported().into());
}

#[tokio::test]
async fn test_echo_greets_valid_input() {
    let dispatcher = dispatcher(hello_router(), TestContext::default());
    let response = dispatcher
        .dispatch("echo", Method::Post, Some(json!("Pepa").into()), exchange())
        .await;
    assert_eq!(response.as_text(), Some("Hello Pepa"));
}

#[tokio::test]
async fn test_echo_rejects_schema_mismatch() {
    let dispatcher = dispatcher(hello_router(), TestContext::default());
    let response = dispatcher
        .dispatch("echo", Method::Post, Some(json!(42).into()), exchange())
        .await;
    assert_eq!(response, ErrorResponse::invalid_input("Invalid input").into());
}

#[tokio::test]
async fn test_typed_procedure_without_input_validates_null() {
    let dispatcher = dispatcher(hello_router(), TestContext::default());
    let response = dispatcher
        .dispatch("echo", Method::Post, None, exchange())
        .await;
    assert_eq!(error_code(&response), Some(400));
}

#[tokio::test]
async fn test_unknown_path_is_not_found_for_every_method() {
    let dispatcher = dispatcher(hello_router(), TestContext::default());
    for method in Method::ALL {
        let response = dispatcher
            .dispatch("unknown/path", method, None, exchange())
            .await;
        assert_eq!(response, ErrorResponse::not_found().into());
    }
}

#[test]
fn test_resolve_rejects_unsupported_method_name() {
    let dispatcher = dispatcher(hello_router(), TestContext::default());
    assert_eq!(
        dispatcher.resolve("hello", None).unwrap_err(),
        ErrorResponse::method_not_supported()
    );
    assert_eq!(
        dispatcher.resolve("nope", None).unwrap_err(),
        ErrorResponse::not_found()
    );
}

#[tokio::test]
async fn test_untyped_non_get_procedure_is_unreachable() {
    let base = procedure::<TestContext>();
    let router = Router::new(Declaration::new().procedure("drop", base.delete().query(say_hi)))
        .unwrap();
    let dispatcher = dispatcher(router, TestContext::default());
    let response = dispatcher
        .dispatch("drop", Method::Delete, None, exchange())
        .await;
    assert_eq!(response, ErrorResponse::method_not_supported().into());
}

#[derive(Debug, Serialize)]
struct Profile {
    name: String,
    age: u8,
}

async fn profile(_ctx: Context<TestContext>, _ex: SharedExchange) -> RpcResult<Profile> {
    Ok(Profile {
        name: "Pepa".into(),
        age: 30,
    })
}

async fn nothing(_ctx: Context<TestContext>, _ex: SharedExchange) -> RpcResult<()> {
    Ok(())
}

async fn number(_ctx: Context<TestContext>, _ex: SharedExchange) -> RpcResult<u32> {
    Ok(7)
}

async fn missing(_ctx: Context<TestContext>, _ex: SharedExchange) -> RpcResult<String> {
    Err(RpcError::not_found("User not found"))
}

async fn broken(_ctx: Context<TestContext>, _ex: SharedExchange) -> RpcResult<String> {
    Err(RpcError::internal("database unreachable"))
}

fn results_router() -> Router<TestContext> {
    let base = procedure::<TestContext>();
    Router::new(
        Declaration::new()
            .procedure("profile", base.get().query(profile))
            .procedure("nothing", base.get().query(nothing))
            .procedure("number", base.get().query(number))
            .procedure("missing", base.get().query(missing))
            .procedure("broken", base.get().query(broken)),
    )
    .unwrap()
}

#[tokio::test]
async fn test_result_shaping() {
    let dispatcher = dispatcher(results_router(), TestContext::default());

    let response = dispatcher
        .dispatch("profile", Method::Get, None, exchange())
        .await;
    assert_eq!(response, ApiResponse::Json(json!({"name": "Pepa", "age": 30})));

    let response = dispatcher
        .dispatch("nothing", Method::Get, None, exchange())
        .await;
    assert_eq!(response, ApiResponse::Empty);

    let response = dispatcher
        .dispatch("number", Method::Get, None, exchange())
        .await;
    assert_eq!(response, ErrorResponse::internal().into());
}

#[tokio::test]
async fn test_handler_errors_keep_client_status() {
    let dispatcher = dispatcher(results_router(), TestContext::default());
    let response = dispatcher
        .dispatch("missing", Method::Get, None, exchange())
        .await;
    assert_eq!(response, ErrorResponse::new(404, "User not found").into());
}

#[tokio::test]
async fn test_server_errors_are_sanitized_unless_exposed() {
    let hidden = dispatcher(results_router(), TestContext::default());
    let response = hidden.dispatch("broken", Method::Get, None, exchange()).await;
    assert_eq!(response, ErrorResponse::internal().into());

    let exposed = dispatcher(results_router(), TestContext::default()).expose_internal_errors(true);
    let response = exposed.dispatch("broken", Method::Get, None, exchange()).await;
    assert_eq!(response, ErrorResponse::new(500, "database unreachable").into());
}

#[derive(Debug, Deserialize)]
struct SignUp {
    name: String,
    email: String,
}

impl Validate for SignUp {
    fn validate(&self) -> ValidationResult {
        ValidationRules::new()
            .required("name", &self.name)
            .email("email", &self.email)
            .build()
    }
}

async fn sign_up(_ctx: Context<TestContext>, input: SignUp, _ex: SharedExchange) -> RpcResult<Value> {
    Ok(json!({"welcome": input.name}))
}

#[tokio::test]
async fn test_field_errors_are_listed() {
    let base = procedure::<TestContext>();
    let router = Router::new(
        Declaration::new().procedure(
            "signUp",
            base.post().input(validated::<SignUp>()).unwrap().query(sign_up),
        ),
    )
    .unwrap();
    let dispatcher = dispatcher(router, TestContext::default());

    let response = dispatcher
        .dispatch(
            "signUp",
            Method::Post,
            Some(json!({"name": "", "email": "nope"}).into()),
            exchange(),
        )
        .await;
    let error = response.error().unwrap();
    assert_eq!(error.code, 400);
    assert_eq!(
        error.message,
        ErrorMessage::Many(vec![
            FieldError::required("name").message,
            FieldError::email("email").message,
        ])
    );

    let response = dispatcher
        .dispatch(
            "signUp",
            Method::Post,
            Some(json!({"name": "Pepa", "email": "pepa@example.com"}).into()),
            exchange(),
        )
        .await;
    assert_eq!(response, ApiResponse::Json(json!({"welcome": "Pepa"})));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Identical requests against pure handlers yield identical responses.
    #[test]
    fn prop_dispatch_is_deterministic(name in "[a-zA-Z ]{0,20}") {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let dispatcher = dispatcher(hello_router(), TestContext::default());
        let input: Input = json!(name.clone()).into();

        let first = rt.block_on(dispatcher.dispatch("echo", Method::Post, Some(input.clone()), exchange()));
        let second = rt.block_on(dispatcher.dispatch("echo", Method::Post, Some(input), exchange()));

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first, ApiResponse::Text(format!("Hello {}", name)));
    }
}
