//! `captcha`: captcha checks for forms.
//!
//! When captcha is disabled in the configuration every verification passes.

use ember_runtime::{host, with_exchange, CapabilityModule};
use tracing::debug;

pub fn module() -> CapabilityModule {
    CapabilityModule::namespace("captcha")
        .function("isEnabled", |lua, ()| Ok(host(lua)?.config().captcha.enabled))
        .function("verify", |lua, response: String| {
            let host = host(lua)?;
            let settings = &host.config().captcha;
            if !settings.enabled {
                debug!("Captcha disabled, skipping verification");
                return Ok(true);
            }

            let remote_addr = with_exchange(lua, |ex| ex.request.remote_addr.clone())?;
            let verified = host.captcha()?.verify(
                &settings.secret_key,
                &response,
                remote_addr.as_deref(),
            )?;
            Ok(verified)
        })
}
