/**
 * ADAPTATEURS D'INGESTION - UDP et port série
 *
 * RÔLE :
 * Lisent des lignes sur le transport et les passent au moteur, une par une.
 * Chaque source garde son propre codec (réassemblage des fragments par émetteur).
 *
 * FONCTIONNEMENT :
 * - UDP : un datagramme peut contenir plusieurs phrases séparées par des fins de ligne ;
 *   la source est l'adresse de l'émetteur
 * - Série : port ouvert en lecture, passé en mode brut au débit demandé, lu ligne à ligne
 * - Les erreurs par message sont loggées ici et ne remontent jamais
 */

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Instant;

use nix::sys::termios::{self, BaudRate, ControlFlags, SetArg, SpecialCharacterIndices};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::codec::ais::AisCodec;
use crate::codec::{CodecError, SentenceCodec};
use crate::engine::{Engine, EngineError};

pub const SERIAL_SOURCE: &str = "Serial";

const MAX_DATAGRAM_SIZE: usize = 2048;

/// Émetteurs UDP gardant un réassemblage en cours au même moment.
pub const MAX_UDP_PEERS: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to bind UDP port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open serial port {path}: {source}")]
    SerialOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to configure serial port {path}: {source}")]
    SerialConfig {
        path: PathBuf,
        #[source]
        source: nix::Error,
    },
    #[error("unsupported baud rate {0}")]
    UnsupportedBaud(u32),
}

/// Passe une ligne au moteur et logge l'éventuelle erreur.
pub async fn ingest_line(engine: &Engine, codec: &mut dyn SentenceCodec, line: &str, source: &str) {
    match engine.ingest(codec, line, source).await {
        Ok(_) => {}
        Err(EngineError::Codec(e @ CodecError::Unsupported(_))) => debug!(source, "{e}"),
        Err(e) => warn!(source, "error processing sentence: {e}"),
    }
}

pub async fn bind_udp(port: u16) -> Result<UdpSocket, IngestError> {
    let socket = UdpSocket::bind(("0.0.0.0", port))
        .await
        .map_err(|source| IngestError::Bind { port, source })?;
    info!(port, local_addr = ?socket.local_addr().ok(), "UDP listener started");
    Ok(socket)
}

/// Un codec par émetteur UDP, gardé seulement tant qu'il a des fragments en attente.
pub struct PeerCodecs {
    codecs: HashMap<SocketAddr, AisCodec>,
    max_peers: usize,
}

impl Default for PeerCodecs {
    fn default() -> Self {
        Self::with_max_peers(MAX_UDP_PEERS)
    }
}

impl PeerCodecs {
    pub fn with_max_peers(max_peers: usize) -> Self {
        Self {
            codecs: HashMap::new(),
            max_peers: max_peers.max(1),
        }
    }

    pub fn codec_for(&mut self, peer: SocketAddr, now: Instant) -> &mut AisCodec {
        if !self.codecs.contains_key(&peer) && self.codecs.len() >= self.max_peers {
            self.prune(now);
            if self.codecs.len() >= self.max_peers {
                warn!(
                    peers = self.codecs.len(),
                    "too many UDP peers with pending fragments, dropping them"
                );
                self.codecs.clear();
            }
        }
        self.codecs.entry(peer).or_default()
    }

    /// Après un datagramme : rend le codec de `peer` s'il n'attend plus rien.
    pub fn release(&mut self, peer: SocketAddr) {
        if self
            .codecs
            .get(&peer)
            .is_some_and(|codec| codec.pending_len() == 0)
        {
            self.codecs.remove(&peer);
        }
    }

    /// Oublie les fragments périmés et les émetteurs devenus inactifs.
    pub fn prune(&mut self, now: Instant) {
        self.codecs.retain(|_, codec| {
            codec.prune(now);
            codec.pending_len() > 0
        });
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

pub fn spawn_udp_listener(engine: Engine, socket: UdpSocket) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut peers = PeerCodecs::default();
        let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];
        loop {
            let (len, peer) = match socket.recv_from(&mut buffer).await {
                Ok(received) => received,
                Err(e) => {
                    warn!("error reading UDP datagram: {e}");
                    continue;
                }
            };
            let text = String::from_utf8_lossy(&buffer[..len]).into_owned();
            let source = peer.to_string();
            let codec = peers.codec_for(peer, Instant::now());
            for line in text.lines().filter(|l| !l.trim().is_empty()) {
                ingest_line(&engine, codec, line, &source).await;
            }
            peers.release(peer);
        }
    })
}

fn baud_rate(baud: u32) -> Result<BaudRate, IngestError> {
    match baud {
        4800 => Ok(BaudRate::B4800),
        9600 => Ok(BaudRate::B9600),
        19200 => Ok(BaudRate::B19200),
        38400 => Ok(BaudRate::B38400),
        57600 => Ok(BaudRate::B57600),
        115200 => Ok(BaudRate::B115200),
        230400 => Ok(BaudRate::B230400),
        other => Err(IngestError::UnsupportedBaud(other)),
    }
}

/// Ouvre le port en lecture et le configure en mode brut 8N1 au débit donné.
pub fn open_serial(path: &Path, baud: u32) -> Result<tokio::fs::File, IngestError> {
    let speed = baud_rate(baud)?;
    let file = std::fs::OpenOptions::new()
        .read(true)
        .open(path)
        .map_err(|source| IngestError::SerialOpen {
            path: path.to_path_buf(),
            source,
        })?;

    let config_err = |source| IngestError::SerialConfig {
        path: path.to_path_buf(),
        source,
    };
    let mut tio = termios::tcgetattr(&file).map_err(config_err)?;
    termios::cfmakeraw(&mut tio);
    termios::cfsetspeed(&mut tio, speed).map_err(config_err)?;
    tio.control_flags |= ControlFlags::CLOCAL | ControlFlags::CREAD;
    tio.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
    tio.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
    termios::tcsetattr(&file, SetArg::TCSANOW, &tio).map_err(config_err)?;

    info!("opened serial port {} at {baud} baud", path.display());
    Ok(tokio::fs::File::from_std(file))
}

/// Lit `reader` ligne à ligne jusqu'à la fin du flux ou une erreur de lecture.
pub async fn read_lines<R>(engine: &Engine, reader: R, source: &str)
where
    R: AsyncRead + Unpin,
{
    let mut codec = AisCodec::new();
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => {
                warn!(source, "input closed");
                break;
            }
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                ingest_line(engine, &mut codec, &text, source).await;
            }
            Err(e) => {
                error!(source, "error reading line: {e}");
                break;
            }
        }
    }
}

pub fn spawn_serial_reader(engine: Engine, port: tokio::fs::File) -> JoinHandle<()> {
    tokio::spawn(async move {
        read_lines(&engine, port, SERIAL_SOURCE).await;
    })
}
