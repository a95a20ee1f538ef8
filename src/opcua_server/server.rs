use opcua::server::prelude::*;

use crate::config::ServerSettings;
use crate::error::SimulatorError;

/// Endpoint id of the single no-security endpoint.
pub const NONE_ENDPOINT_ID: &str = "none";

/// Build an OPC UA server exposing one anonymous, unsecured endpoint.
pub fn build_server(settings: &ServerSettings) -> Result<Server, SimulatorError> {
    tracing::info!(
        "Building OPC UA server {} on port {}",
        settings.application_name,
        settings.port
    );

    let user_token_ids = vec![ANONYMOUS_USER_TOKEN_ID.to_string()];

    let server = ServerBuilder::new()
        .application_name(settings.application_name.clone())
        .application_uri(settings.application_uri.clone())
        .product_uri(settings.product_uri.clone())
        .create_sample_keypair(settings.create_sample_keypair)
        .pki_dir(settings.pki_dir.clone())
        .discovery_server_url(None)
        .host_and_port(settings.host.clone(), settings.port)
        .discovery_urls(vec![settings.endpoint_path.clone()])
        .endpoint(
            NONE_ENDPOINT_ID,
            ServerEndpoint::new_none(settings.endpoint_path.clone(), &user_token_ids),
        )
        .server()
        .ok_or(SimulatorError::ServerConfig)?;

    tracing::info!(
        "Security policy None, mode None, anonymous access, secure token lifetime {} ms",
        settings.secure_token_lifetime_ms
    );

    Ok(server)
}
