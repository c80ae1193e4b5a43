//! `paypal`: payment operations through the host payment gateway.

use ember_runtime::convert::{to_json, to_lua};
use ember_runtime::{host, CapabilityModule, HostContext};
use mlua::{Lua, Value};
use std::sync::Arc;

pub fn module() -> CapabilityModule {
    CapabilityModule::namespace("paypal")
        .function("createPayment", |lua, payment: Value| {
            let host = enabled_host(lua)?;
            let payment = to_json(lua, payment)?;
            let created = host.payments()?.create_payment(&payment)?;
            to_lua(lua, &created)
        })
        .function("paymentInformation", |lua, payment_id: String| {
            let host = enabled_host(lua)?;
            let payment = host.payments()?.payment_information(&payment_id)?;
            to_lua(lua, &payment)
        })
        .function(
            "executePayment",
            |lua, (payment_id, payer_id): (String, String)| {
                let host = enabled_host(lua)?;
                let payment = host.payments()?.execute_payment(&payment_id, &payer_id)?;
                to_lua(lua, &payment)
            },
        )
}

fn enabled_host(lua: &Lua) -> mlua::Result<Arc<HostContext>> {
    let host = host(lua)?;
    if !host.config().paypal.enabled {
        return Err(mlua::Error::runtime("PayPal is disabled in the configuration"));
    }
    Ok(host)
}
