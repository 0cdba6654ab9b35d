use std::time::Duration;

use rumqttc::{AsyncClient, Event, Incoming, LastWill, MqttOptions, Outgoing, QoS};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, warn};

use rtsp_mic_common::{
    announce_topic, availability_topic, status_topic, Broker, BrokerSettings, CollaboratorError,
    CollaboratorResult, AVAILABILITY_OFFLINE, AVAILABILITY_ONLINE,
};

const CLIENT_ID: &str = "rtsp-mic-device";
const KEEP_ALIVE: Duration = Duration::from_secs(30);
const CLOSE_DRAIN: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub enum BrokerCommand {
    Reconnect {
        settings: BrokerSettings,
        force: bool,
    },
    Status(String),
    Announce(String),
}

pub struct MqttBroker {
    commands: mpsc::UnboundedSender<BrokerCommand>,
}

impl MqttBroker {
    pub fn spawn() -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run_broker_task(receiver));
        Self { commands }
    }

    fn send(&self, command: BrokerCommand) -> CollaboratorResult<()> {
        self.commands
            .send(command)
            .map_err(|_| CollaboratorError::Failed("broker task stopped".to_string()))
    }
}

impl Broker for MqttBroker {
    fn request_reconnect(
        &mut self,
        settings: &BrokerSettings,
        force: bool,
    ) -> CollaboratorResult<()> {
        self.send(BrokerCommand::Reconnect {
            settings: settings.clone(),
            force,
        })
    }

    fn announce(&mut self, status_json: &str) -> CollaboratorResult<()> {
        self.send(BrokerCommand::Announce(status_json.to_string()))
    }

    fn publish_status(&mut self, status_json: &str) -> CollaboratorResult<()> {
        self.send(BrokerCommand::Status(status_json.to_string()))
    }
}

struct Connection {
    client: AsyncClient,
    settings: BrokerSettings,
    eventloop: JoinHandle<()>,
}

impl Connection {
    fn open(settings: BrokerSettings) -> Self {
        let mut options = MqttOptions::new(CLIENT_ID, settings.host.clone(), settings.port);
        options.set_keep_alive(KEEP_ALIVE);
        if !settings.user.is_empty() {
            options.set_credentials(settings.user.clone(), settings.pass.clone());
        }
        options.set_last_will(LastWill::new(
            availability_topic(&settings.topic),
            AVAILABILITY_OFFLINE,
            QoS::AtLeastOnce,
            true,
        ));

        let (client, mut eventloop) = AsyncClient::new(options, 16);
        let online_client = client.clone();
        let availability = availability_topic(&settings.topic);
        let eventloop = tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                        info!("mqtt connected");
                        if let Err(err) = online_client
                            .publish(&availability, QoS::AtLeastOnce, true, AVAILABILITY_ONLINE)
                            .await
                        {
                            warn!("availability publish failed: {err}");
                        }
                    }
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        warn!("mqtt poll error: {err}");
                        tokio::time::sleep(Duration::from_secs(2)).await;
                    }
                }
            }
        });

        Self {
            client,
            settings,
            eventloop,
        }
    }

    async fn close(mut self) {
        let offline = self.client.publish(
            availability_topic(&self.settings.topic),
            QoS::AtLeastOnce,
            true,
            AVAILABILITY_OFFLINE,
        );
        match tokio::time::timeout(CLOSE_DRAIN, offline).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!("offline availability publish failed: {err}"),
            Err(_) => warn!("offline availability publish timed out"),
        }
        if let Err(err) = self.client.try_disconnect() {
            warn!("mqtt disconnect failed: {err}");
        }
        // The event loop exits once the disconnect goes out.
        if tokio::time::timeout(CLOSE_DRAIN, &mut self.eventloop)
            .await
            .is_err()
        {
            warn!("mqtt event loop still busy after disconnect; aborting");
            self.eventloop.abort();
        }
    }
}

async fn run_broker_task(mut commands: mpsc::UnboundedReceiver<BrokerCommand>) {
    let mut connection: Option<Connection> = None;

    while let Some(command) = commands.recv().await {
        match command {
            BrokerCommand::Reconnect { settings, force } => {
                let unchanged = connection
                    .as_ref()
                    .is_some_and(|active| active.settings == settings);
                if unchanged && !force {
                    continue;
                }
                if let Some(active) = connection.take() {
                    active.close().await;
                }
                if settings.enabled {
                    info!(
                        "mqtt connecting to {}:{} (topic {})",
                        settings.host, settings.port, settings.topic
                    );
                    connection = Some(Connection::open(settings));
                } else {
                    info!("mqtt disabled");
                }
            }
            BrokerCommand::Status(payload) => {
                if let Some(active) = &connection {
                    publish(active, status_topic(&active.settings.topic), true, payload).await;
                }
            }
            BrokerCommand::Announce(payload) => {
                if let Some(active) = &connection {
                    publish(active, announce_topic(&active.settings.topic), false, payload).await;
                }
            }
        }
    }

    if let Some(active) = connection.take() {
        active.close().await;
    }
}

async fn publish(connection: &Connection, topic: String, retain: bool, payload: String) {
    if let Err(err) = connection
        .client
        .publish(&topic, QoS::AtLeastOnce, retain, payload)
        .await
    {
        warn!("mqtt publish to {topic} failed: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn close_is_bounded_when_broker_is_unreachable() {
        let settings = BrokerSettings {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 1,
            ..BrokerSettings::default()
        };
        let connection = Connection::open(settings);

        let closed = tokio::time::timeout(Duration::from_secs(3), connection.close()).await;
        assert!(closed.is_ok());
    }
}
