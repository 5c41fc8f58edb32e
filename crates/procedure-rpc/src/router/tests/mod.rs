//! Router compilation tests


use crate::{Context, Procedure, RpcResult, SharedExchange, json, procedure};

#[derive(Clone, Default, Debug)]
pub(super) struct Ctx;

pub(super) async fn ok(_ctx: Context<Ctx>, _ex: SharedExchange) -> RpcResult<&'static str> {
    Ok("ok")
}

async fn echo(_ctx: Context<Ctx>, input: String, _ex: SharedExchange) -> RpcResult<String> {
    Ok(input)
}

pub(super) fn get() -> Procedure<Ctx> {
    procedure::<Ctx>().get().query(ok)
}

pub(super) fn post() -> Procedure<Ctx> {
    procedure::<Ctx>().post().input(json::<String>()).unwrap().query(echo)
}
