//! `mail`: outbound mail through the host mailer.

use ember_runtime::services::Mail;
use ember_runtime::{host, CapabilityModule};
use mlua::Value;
use tracing::info;

pub fn module() -> CapabilityModule {
    CapabilityModule::namespace("mail").function(
        "send",
        |lua, (to, subject, body): (Value, String, String)| {
            let host = host(lua)?;
            if !host.config().mail.enabled {
                return Err(mlua::Error::runtime("mail is disabled in the configuration"));
            }

            let mail = Mail {
                to: recipients(to)?,
                subject,
                body,
            };
            host.mailer()?.send(&mail)?;
            info!(recipients = mail.to.len(), subject = %mail.subject, "Mail sent");
            Ok(())
        },
    )
}

/// A single address or a list of addresses.
fn recipients(to: Value) -> mlua::Result<Vec<String>> {
    let recipients = match to {
        Value::String(address) => vec![address.to_str()?.to_string()],
        Value::Table(list) => list
            .sequence_values::<String>()
            .collect::<mlua::Result<Vec<_>>>()?,
        _ => return Err(mlua::Error::runtime("mail: expected an address or a list of addresses")),
    };
    if recipients.is_empty() {
        return Err(mlua::Error::runtime("mail: no recipients"));
    }
    Ok(recipients)
}
