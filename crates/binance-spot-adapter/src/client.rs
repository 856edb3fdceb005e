/*
[INPUT]:  Optional API credentials and REST/stream configuration
[OUTPUT]: One handle exposing the spot REST client and the stream manager
[POS]:    Crate root - collaborator facade
[UPDATE]: When adding new API families or changing startup
*/

use crate::http::{ClientConfig, Credentials, Result, SpotClient};
use crate::ws::{SpotWebSocket, WsConfig};

/// Entry point bundling the spot REST client and stream manager.
///
/// Signed calls need a synchronized clock, so call [`BinanceClient::init`]
/// once before using any account or trade endpoint.
#[derive(Debug)]
pub struct BinanceClient {
    spot: SpotClient,
    websockets: SpotWebSocket,
}

impl BinanceClient {
    pub fn new(credentials: Option<Credentials>) -> Result<Self> {
        Self::with_configs(credentials, ClientConfig::default(), WsConfig::default())
    }

    pub fn with_configs(
        credentials: Option<Credentials>,
        rest: ClientConfig,
        stream: WsConfig,
    ) -> Result<Self> {
        Ok(Self {
            spot: SpotClient::with_config(rest)?.with_credentials(credentials),
            websockets: SpotWebSocket::with_config(stream),
        })
    }

    /// Synchronize the clock with the exchange
    pub async fn init(&self) -> Result<()> {
        self.spot.sync_time().await?;
        Ok(())
    }

    pub fn spot(&self) -> &SpotClient {
        &self.spot
    }

    pub fn spot_websockets(&self) -> &SpotWebSocket {
        &self.websockets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_init_synchronizes_clock() {
        let server = MockServer::start().await;
        let server_time = chrono::Utc::now().timestamp_millis() + 5_000;
        Mock::given(method("GET"))
            .and(path("/api/v3/time"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "serverTime": server_time })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let rest = ClientConfig {
            base_url: server.uri(),
            ..ClientConfig::default()
        };
        let client = BinanceClient::with_configs(None, rest, WsConfig::default()).unwrap();
        assert!(!client.spot().clock().is_synced());

        client.init().await.unwrap();

        let offset = client.spot().clock().offset().unwrap();
        assert!((4_000..=5_000).contains(&offset), "offset {offset}");
    }
}
