/**
 * RELAIS AGRÉGATEURS - Renvoi brut des phrases acceptées en UDP
 *
 * Chaque phrase acceptée (après dédup, qu'elle se décode ou non) part telle quelle
 * vers chaque agrégateur configuré. Une erreur d'envoi est loggée pour cette cible
 * seulement ; pas de retry.
 */

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{lookup_host, UdpSocket};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("invalid aggregator format for '{0}', expected host/ip:port")]
    InvalidAddress(String),
    #[error("failed to resolve aggregator '{addr}': {source}")]
    Resolve {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open UDP socket for aggregator '{addr}': {source}")]
    Socket {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Découpe la liste `host:port,host:port` en vérifiant chaque entrée.
pub fn parse_aggregator_list(list: &str) -> Result<Vec<String>, RelayError> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (host, port) = entry
                .rsplit_once(':')
                .ok_or_else(|| RelayError::InvalidAddress(entry.to_string()))?;
            if host.is_empty() || port.parse::<u16>().is_err() {
                return Err(RelayError::InvalidAddress(entry.to_string()));
            }
            Ok(entry.to_string())
        })
        .collect()
}

struct AggregatorTarget {
    label: String,
    socket: UdpSocket,
}

#[derive(Clone, Default)]
pub struct AggregatorRelay {
    targets: Arc<Vec<AggregatorTarget>>,
}

impl AggregatorRelay {
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Résout et "connecte" une socket UDP par agrégateur. Toute erreur est fatale au démarrage.
    pub async fn connect(addrs: &[String]) -> Result<Self, RelayError> {
        let mut targets = Vec::with_capacity(addrs.len());
        for addr in addrs {
            let remote = resolve(addr).await?;
            let local: SocketAddr = if remote.is_ipv4() {
                ([0, 0, 0, 0], 0).into()
            } else {
                ([0u16; 8], 0).into()
            };
            let socket_err = |source| RelayError::Socket {
                addr: addr.clone(),
                source,
            };
            let socket = UdpSocket::bind(local).await.map_err(socket_err)?;
            socket.connect(remote).await.map_err(socket_err)?;
            info!("connected to aggregator at {remote}");
            targets.push(AggregatorTarget {
                label: addr.clone(),
                socket,
            });
        }
        Ok(Self {
            targets: Arc::new(targets),
        })
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Envoie `raw` à chaque cible ; retourne le nombre d'envois réussis.
    pub async fn forward(&self, raw: &str) -> usize {
        let mut sent = 0;
        for target in self.targets.iter() {
            match target.socket.send(raw.as_bytes()).await {
                Ok(_) => sent += 1,
                Err(e) => warn!(aggregator = %target.label, "error sending raw sentence to aggregator: {e}"),
            }
        }
        sent
    }
}

async fn resolve(addr: &str) -> Result<SocketAddr, RelayError> {
    let mut found = lookup_host(addr).await.map_err(|source| RelayError::Resolve {
        addr: addr.to_string(),
        source,
    })?;
    found.next().ok_or_else(|| RelayError::Resolve {
        addr: addr.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no address found"),
    })
}
