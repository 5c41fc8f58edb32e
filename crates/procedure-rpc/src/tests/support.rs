//! Shared fixtures for the unit tests.

use crate::{
    ApiResponse, Context, Dispatcher, MemoryExchange, Router, RpcResult,
    SharedExchange, StaticContext,
};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestContext {
    pub name: Option<String>,
    pub trail: Vec<String>,
}

impl TestContext {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            trail: Vec::new(),
        }
    }
}

pub async fn say_hi(_ctx: Context<TestContext>, _ex: SharedExchange) -> RpcResult<&'static str> {
    Ok("hi")
}

pub async fn say_ok(_ctx: Context<TestContext>, _ex: SharedExchange) -> RpcResult<&'static str> {
    Ok("OK")
}

pub async fn greet(
    _ctx: Context<TestContext>,
    name: String,
    _ex: SharedExchange,
) -> RpcResult<String> {
    Ok(format!("Hello {}", name))
}

pub async fn trail(ctx: Context<TestContext>, _ex: SharedExchange) -> RpcResult<Vec<String>> {
    Ok(ctx.trail.clone())
}

pub fn exchange() -> SharedExchange {
    MemoryExchange::new("GET", "http://localhost/api/").shared()
}

pub fn dispatcher(router: Router<TestContext>, ctx: TestContext) -> Dispatcher<TestContext> {
    Dispatcher::new(Arc::new(router), StaticContext(ctx))
}

pub fn error_code(response: &ApiResponse) -> Option<u16> {
    response.error().map(|e| e.code)
}
