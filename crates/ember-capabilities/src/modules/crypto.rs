//! `crypto`: hashing, random tokens and two-factor secrets.

use crate::otp;
use ember_runtime::CapabilityModule;
use rand::distr::{Alphanumeric, SampleString};
use sha1::{Digest, Sha1};
use url::Url;

pub fn module() -> CapabilityModule {
    CapabilityModule::namespace("crypto")
        .function("sha1", |_, input: mlua::String| {
            Ok(hex::encode(Sha1::digest(&*input.as_bytes())))
        })
        .function("randomString", |_, length: usize| {
            Ok(Alphanumeric.sample_string(&mut rand::rng(), length))
        })
        .function("qrKey", |_, ()| Ok(otp::generate_secret()))
        .function(
            "qr",
            |_, (secret, account, issuer): (String, String, Option<String>)| {
                totp_uri(&secret, &account, issuer.as_deref()).map_err(mlua::Error::external)
            },
        )
}

/// Provisioning URI for authenticator apps.
fn totp_uri(secret: &str, account: &str, issuer: Option<&str>) -> Result<String, url::ParseError> {
    let label = match issuer {
        Some(issuer) => format!("{issuer}:{account}"),
        None => account.to_string(),
    };

    let mut uri = Url::parse("otpauth://totp/")?;
    uri.set_path(&label);
    {
        let mut query = uri.query_pairs_mut();
        query.append_pair("secret", secret);
        if let Some(issuer) = issuer {
            query.append_pair("issuer", issuer);
        }
    }
    Ok(uri.into())
}
