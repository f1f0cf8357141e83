use crate::error::ProbeError;
use chrono::{DateTime, Utc};
use rustls::{ClientConfig, RootCertStore, pki_types::ServerName};
use socket2::{SockRef, TcpKeepalive};
use std::{
    sync::{Arc, LazyLock, OnceLock},
    time::Duration,
};
use tokio::{net::TcpStream, time};
use tokio_rustls::TlsConnector;
use x509_parser::prelude::{FromDer, X509Certificate};

/// Certificates are always inspected on the HTTPS port.
pub const TLS_PORT: u16 = 443;

/// Budget for the TCP connect, and separately for the handshake.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(8);

const KEEPALIVE_TIME: Duration = Duration::from_secs(30);

static CRYPTO_PROVIDER_INIT: OnceLock<()> = OnceLock::new();

/// Ensure the rustls crypto provider is initialized
///
/// This should be called before any TLS operations. It's safe to call
/// multiple times as initialization only happens once.
pub fn ensure_crypto_provider() {
    CRYPTO_PROVIDER_INIT.get_or_init(|| {
        if let Err(err) = rustls::crypto::ring::default_provider().install_default() {
            eprintln!("failed to install ring crypto provider: {err:?}");
            std::process::exit(1);
        }
    });
}

// One connector for the whole process: the webpki root store is parsed once.
static CONNECTOR: LazyLock<TlsConnector> = LazyLock::new(|| {
    ensure_crypto_provider();
    let root_store: RootCertStore = webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
});

/// Open a TLS connection to `host:443`, with `host` as the SNI value, and
/// return the leaf certificate's `notAfter` timestamp. The chain is verified
/// against the webpki root store; the connection is closed on every exit
/// path.
///
/// # Errors
///
/// Returns an error when the connection or handshake fails, times out, the
/// peer presents no certificate, or the leaf certificate does not parse.
pub async fn probe_certificate(host: &str) -> Result<DateTime<Utc>, ProbeError> {
    let server_name =
        ServerName::try_from(host.to_string()).map_err(|_| ProbeError::InvalidHostname {
            host: host.to_string(),
        })?;

    let stream = match time::timeout(CONNECT_TIMEOUT, TcpStream::connect((host, TLS_PORT))).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            return Err(ProbeError::Connect {
                host: host.to_string(),
                reason: e.to_string(),
            });
        }
        Err(_) => {
            return Err(ProbeError::Timeout {
                host: host.to_string(),
                seconds: CONNECT_TIMEOUT.as_secs(),
            });
        }
    };

    // keep-alive failure is not a probe failure
    let keepalive = TcpKeepalive::new().with_time(KEEPALIVE_TIME);
    let _ = SockRef::from(&stream).set_tcp_keepalive(&keepalive);

    let tls_stream =
        match time::timeout(CONNECT_TIMEOUT, CONNECTOR.connect(server_name, stream)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(ProbeError::Handshake {
                    host: host.to_string(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                return Err(ProbeError::Timeout {
                    host: host.to_string(),
                    seconds: CONNECT_TIMEOUT.as_secs(),
                });
            }
        };

    let (_, connection) = tls_stream.get_ref();
    let leaf = connection
        .peer_certificates()
        .and_then(|certs| certs.first())
        .ok_or_else(|| ProbeError::NoCertificate {
            host: host.to_string(),
        })?;

    leaf_not_after(host, leaf.as_ref())
}

fn leaf_not_after(host: &str, cert_der: &[u8]) -> Result<DateTime<Utc>, ProbeError> {
    let (_, cert) = X509Certificate::from_der(cert_der).map_err(|e| ProbeError::BadCertificate {
        host: host.to_string(),
        reason: e.to_string(),
    })?;

    let raw = cert.validity().not_after.to_datetime();
    DateTime::<Utc>::from_timestamp(raw.unix_timestamp(), raw.nanosecond()).ok_or_else(|| {
        ProbeError::BadCertificate {
            host: host.to_string(),
            reason: "invalid expiry timestamp".to_string(),
        }
    })
}
