use std::net::IpAddr;

use crate::config::DiagnosticsSettings;

pub fn local_hostname() -> Option<String> {
    hostname::get().ok().and_then(|h| h.into_string().ok())
}

pub async fn resolve_host(host: &str) -> std::io::Result<Vec<IpAddr>> {
    let mut addresses: Vec<IpAddr> = tokio::net::lookup_host((host, 0))
        .await?
        .map(|addr| addr.ip())
        .collect();
    addresses.sort();
    addresses.dedup();
    Ok(addresses)
}

async fn log_resolution(host: &str) {
    match resolve_host(host).await {
        Ok(addresses) if addresses.is_empty() => {
            tracing::warn!("No address found for {}", host);
        }
        Ok(addresses) => {
            for address in addresses {
                tracing::info!("The IP address of {} is {}", host, address);
            }
        }
        Err(e) => tracing::warn!("Failed to resolve {}: {}", host, e),
    }
}

/// Log the addresses of the local machine and of the configured peer hosts.
pub async fn log_host_addresses(settings: &DiagnosticsSettings) {
    if settings.resolve_local_host {
        match local_hostname() {
            Some(host) => log_resolution(&host).await,
            None => tracing::warn!("Failed to read local hostname"),
        }
    }

    for host in &settings.peer_hosts {
        log_resolution(host).await;
    }
}
